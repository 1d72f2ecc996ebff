pub mod auth_service;
pub mod gateway;
pub mod media_service;
pub mod poller;
pub mod transport;

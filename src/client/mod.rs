pub mod app;
pub mod cli_client;
pub mod config;
pub mod models;
pub mod services;
pub mod utils;
pub mod views;

#[cfg(test)]
pub(crate) mod testing;

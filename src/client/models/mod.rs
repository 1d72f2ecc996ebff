pub mod conversation;
pub mod notifications;
pub mod overlay;
pub mod session;
pub mod stories;
pub mod thread;
pub mod ui_state;

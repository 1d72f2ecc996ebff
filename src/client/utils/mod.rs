pub mod session_store;
pub mod time;

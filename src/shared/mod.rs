// Shared modules
pub mod config;
pub mod database;
pub mod errors;
pub mod store;
pub mod utils;

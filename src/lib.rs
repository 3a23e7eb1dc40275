pub mod client;
pub mod config;
pub mod data;
pub mod format;
pub mod session;
pub mod ui;
pub mod utils;

//! Paths and logging setup.

pub mod app_paths;
pub mod logging;

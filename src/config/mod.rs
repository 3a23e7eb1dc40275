//! Configuration module
//!
//! TOML config file plus CLI overrides; validated once at startup.

pub mod config;

pub use config::Config;

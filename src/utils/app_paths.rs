use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Result};

/// Well-known file locations, derived from the platform's standard
/// config/data directories.
pub struct AppPaths;

impl AppPaths {
    pub fn config_file() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| anyhow!("no config directory"))?;
        Ok(config_dir.join("wqt").join("config.toml"))
    }

    pub fn data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow!("no data directory"))?
            .join("wqt");
        fs::create_dir_all(&data_dir)?;
        Ok(data_dir)
    }

    pub fn log_file() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("wqt.log"))
    }
}

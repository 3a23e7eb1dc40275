use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::format::FormatKind;
use crate::utils::app_paths::AppPaths;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output format for query results: "table", "csv", or "json"
    pub format: String,

    /// Default connection target (project identifier)
    pub target: String,

    /// Base URL of the query service
    pub endpoint: String,

    /// File holding a bearer token; omit for unauthenticated use
    pub credentials_file: Option<PathBuf>,

    /// Run queries with batch priority
    pub batch_priority: bool,

    /// Query timeout in seconds; 0 lets queries run for the backend's
    /// maximum allowed time
    pub timeout_secs: u64,

    /// Row cap when materializing results for display; 0 means no cap
    pub max_rows: usize,

    /// Field delimiter for the csv output format
    pub csv_delimiter: char,

    /// Log verbosity: error, warn, info, debug, trace
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            format: "table".to_string(),
            target: String::new(),
            endpoint: "http://localhost:9050".to_string(),
            credentials_file: None,
            batch_priority: true,
            timeout_secs: 0,
            max_rows: 10000,
            csv_delimiter: ',',
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load the config file, or defaults when it does not exist yet.
    /// A missing file at the default location is seeded with a
    /// commented template on first run.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, seed_when_missing) = match path {
            Some(p) => (p.to_path_buf(), false),
            None => (AppPaths::config_file()?, true),
        };

        if !path.exists() {
            if seed_when_missing {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("creating {}", parent.display()))?;
                }
                fs::write(&path, Self::create_default_with_comments())
                    .with_context(|| format!("writing default config to {}", path.display()))?;
                return Ok(Self::default());
            }
            anyhow::bail!("config file {} does not exist", path.display());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    /// Hard-stop checks only; anything recoverable is handled at use.
    pub fn validate(&self) -> Result<()> {
        self.format_kind()?;
        if !self.csv_delimiter.is_ascii() {
            anyhow::bail!(
                "csv_delimiter {:?} is not a single ASCII character",
                self.csv_delimiter
            );
        }
        Ok(())
    }

    pub fn format_kind(&self) -> Result<FormatKind> {
        self.format
            .parse::<FormatKind>()
            .map_err(|e| anyhow::anyhow!(e))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn delimiter_byte(&self) -> u8 {
        self.csv_delimiter as u8
    }

    /// The template written on first run.
    pub fn create_default_with_comments() -> String {
        r#"# wqt configuration file
# Location: ~/.config/wqt/config.toml (Linux/macOS)
#           %APPDATA%\wqt\config.toml (Windows)

# Output format for query results: "table", "csv", or "json".
# Cycle at runtime with the 'f' key.
format = "table"

# Default connection target (project identifier).
target = ""

# Base URL of the query service.
endpoint = "http://localhost:9050"

# File holding a bearer token. Leave commented for unauthenticated use.
# credentials_file = "/path/to/credentials"

# Run queries with batch priority.
batch_priority = true

# Query timeout in seconds. 0 lets queries run for the backend's
# maximum allowed time.
timeout_secs = 0

# Row cap when materializing results for display. 0 means no cap.
max_rows = 10000

# Field delimiter for the csv output format.
csv_delimiter = ","

# Log verbosity: error, warn, info, debug, trace.
# Logs go to ~/.local/share/wqt/wqt.log, never the terminal.
log_level = "info"
"#
        .to_string()
    }
}

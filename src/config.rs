//! Configuration file for logsift
//!
//! Settings are read from a TOML file. Without `--config`, `logsift.toml` in
//! the working directory is used when it exists; otherwise defaults apply.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing_subscriber::filter::LevelFilter;

use logsift_logs::DEFAULT_READ_BUFFER;

/// Config file looked up when none is given
pub const DEFAULT_CONFIG_FILE: &str = "logsift.toml";

/// Log file read when none is configured
pub const DEFAULT_LOG_FILE: &str = "data/logs.jsonl";

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Newline-delimited JSON log to query
    pub log_file: PathBuf,

    /// Read buffer per scan, in bytes
    pub read_buffer_bytes: usize,

    /// Default level for diagnostics on stderr (RUST_LOG takes precedence)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            read_buffer_bytes: DEFAULT_READ_BUFFER,
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Load from an explicit path, or from the default file if present
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => Ok(Self::default()),
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.level_filter()?;
        Ok(config)
    }

    /// Parsed `log_level`
    pub fn level_filter(&self) -> Result<LevelFilter> {
        self.log_level
            .parse()
            .with_context(|| format!("Unknown log level '{}'", self.log_level))
    }
}

//! RON configuration for the tracker binary.
//!
//! Every field has a default, so a missing file or a partial file is fine:
//!
//! ```ron
//! (
//!     backend: Rest((base_url: "https://xyz.supabase.co", api_key: "...")),
//!     log: (destination: Both, level: Debug),
//!     user: Some("me@example.com"),
//! )
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use serde::Deserialize;
use thiserror::Error;
use tracker_engine::StoreSettings;
use tracker_logging::{tracker_info, LogDestination};

pub const DEFAULT_CONFIG_FILE: &str = "tracker.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: Backend,
    pub log: LogConfig,
    /// Signed in automatically at startup.
    pub user: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub enum Backend {
    /// In-process store with live change notifications.
    #[default]
    Memory,
    Rest(StoreSettings),
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Memory => "memory",
            Backend::Rest(_) => "rest",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub destination: LogDestination,
    pub level: LevelFilter,
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            destination: LogDestination::File,
            level: LevelFilter::Info,
            file: None,
        }
    }
}

/// Uses `explicit` when given, otherwise [`DEFAULT_CONFIG_FILE`] in the
/// working directory.
pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

pub fn load(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(AppConfig::default()),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    parse(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse(content: &str) -> Result<AppConfig, ron::error::SpannedError> {
    let config: AppConfig = ron::from_str(content)?;
    tracker_info!("Loaded configuration (backend={})", config.backend.name());
    Ok(config)
}

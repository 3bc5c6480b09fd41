use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use crate::scoring::ScoringRules;
use crate::tournament::TournamentSnapshot;

const DEFAULT_LOCK_CHECK_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Runtime configuration of the predictor service
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// PostgreSQL backend when set, in-memory otherwise
    pub database_url: Option<String>,
    pub lock_check_interval: Duration,
    pub scoring_rules: ScoringRules,
    /// JSON seed for the in-memory backend
    pub snapshot_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let lock_check_secs = match non_empty("LOCK_CHECK_INTERVAL_SECS") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidValue {
                    name: "LOCK_CHECK_INTERVAL_SECS",
                    value,
                })?,
            None => DEFAULT_LOCK_CHECK_SECS,
        };

        let scoring_rules = match non_empty("SCORING_RULES_PATH") {
            Some(path) => {
                let rules: ScoringRules = read_json(Path::new(&path))?;
                info!(path = %path, "Loaded scoring rules");
                rules
            }
            None => ScoringRules::default(),
        };

        Ok(Self {
            database_url: non_empty("DATABASE_URL"),
            lock_check_interval: Duration::from_secs(lock_check_secs),
            scoring_rules,
            snapshot_path: non_empty("SNAPSHOT_PATH").map(PathBuf::from),
        })
    }

    /// The configured seed snapshot, or an empty one when none is set
    pub fn load_snapshot(&self) -> Result<TournamentSnapshot, ConfigError> {
        match &self.snapshot_path {
            Some(path) => read_json(path),
            None => Ok(TournamentSnapshot::default()),
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

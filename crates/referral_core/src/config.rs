//! Core runtime configuration.
//!
//! # Responsibility
//! - Describe where the database lives, how logging is set up, and whether
//!   startup seeding runs.
//! - Load that description from a JSON document with defaults for every
//!   missing field.
//!
//! # Invariants
//! - A loaded config has passed `validate()`.

use crate::context::CallContext;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DEFAULT_DB_FILE_NAME: &str = "referral.sqlite3";

/// Configuration load/validation errors.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute log directory; file logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    /// Run the curated company seed list after opening the database.
    pub seed_on_startup: bool,
    /// Deadline applied to every operation, in milliseconds.
    pub call_timeout_ms: Option<u64>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: crate::logging::default_log_level().to_string(),
            log_dir: None,
            seed_on_startup: false,
            call_timeout_ms: None,
        }
    }
}

impl CoreConfig {
    /// Parses and validates a JSON config document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("db_path must not be empty".to_string()));
        }
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "log_level must not be empty".to_string(),
            ));
        }
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be an absolute path, got `{}`",
                    dir.display()
                )));
            }
        }
        Ok(())
    }

    /// Fresh call context honoring `call_timeout_ms`.
    pub fn call_context(&self) -> CallContext {
        CallContext::from_timeout_ms(self.call_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig};
    use std::path::PathBuf;

    #[test]
    fn missing_fields_take_defaults() {
        let config = CoreConfig::from_json_str(r#"{"seed_on_startup": true}"#).unwrap();
        assert!(config.seed_on_startup);
        assert_eq!(config.db_path, PathBuf::from("referral.sqlite3"));
        assert!(config.log_dir.is_none());
        assert!(config.call_context().deadline().is_none());
    }

    #[test]
    fn relative_log_dir_is_rejected() {
        let err = CoreConfig::from_json_str(r#"{"log_dir": "logs"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(message) if message.contains("absolute")));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = CoreConfig::from_json_str(r#"{"db": "x"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn timeout_produces_deadline() {
        let config = CoreConfig::from_json_str(r#"{"call_timeout_ms": 1500}"#).unwrap();
        assert!(config.call_context().deadline().is_some());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("referral.json");
        std::fs::write(&path, r#"{"db_path": "/tmp/referral-test.sqlite3"}"#).unwrap();
        let config = CoreConfig::load(&path).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/referral-test.sqlite3"));
    }
}

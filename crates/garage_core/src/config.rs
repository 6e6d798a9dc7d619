//! Runtime configuration for the persistence core.
//!
//! # Responsibility
//! - Resolve data file locations, id policy and logging settings.
//!
//! # Invariants
//! - All paths derive from one data directory unless overridden.
//! - Parsing never panics; bad values surface as [`ConfigError`].

use crate::repo::id_alloc::IdPolicy;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DATABASE_FILE_NAME: &str = "database.sqlite";
pub const USERS_FILE_NAME: &str = "users.json";
pub const LOG_DIR_NAME: &str = "logs";

/// Supported log verbosity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Parses a level name, case-insensitively; `warning` is accepted.
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(ConfigError::UnsupportedLogLevel(other.to_string())),
        }
    }

    /// `debug` for debug builds, `info` for release builds.
    pub fn default_for_build() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Info
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnsupportedLogLevel(String),
    UnsupportedIdPolicy(String),
    EmptyPath(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLogLevel(value) => write!(
                f,
                "unsupported log level `{value}`; expected trace|debug|info|warn|error"
            ),
            Self::UnsupportedIdPolicy(value) => {
                write!(f, "unsupported id policy `{value}`; expected last|max")
            }
            Self::EmptyPath(name) => write!(f, "{name} cannot be empty"),
        }
    }
}

impl Error for ConfigError {}

/// Resolved settings for one application instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GarageConfig {
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
    pub users_path: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: LogLevel,
    pub id_policy: IdPolicy,
}

impl GarageConfig {
    /// Builds the default layout under `data_dir`.
    pub fn from_data_dir(data_dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data_dir = data_dir.as_ref();
        if data_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath("data_dir"));
        }

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            database_path: data_dir.join(DATABASE_FILE_NAME),
            users_path: data_dir.join(USERS_FILE_NAME),
            log_dir: data_dir.join(LOG_DIR_NAME),
            log_level: LogLevel::default_for_build(),
            id_policy: IdPolicy::default(),
        })
    }

    pub fn with_log_level(mut self, level: &str) -> Result<Self, ConfigError> {
        self.log_level = LogLevel::parse(level)?;
        Ok(self)
    }

    pub fn with_id_policy(mut self, policy: &str) -> Result<Self, ConfigError> {
        self.id_policy = IdPolicy::parse(policy)
            .ok_or_else(|| ConfigError::UnsupportedIdPolicy(policy.to_string()))?;
        Ok(self)
    }

    pub fn with_users_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.users_path = path.into();
        self
    }

    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = path.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, GarageConfig, LogLevel};
    use crate::repo::id_alloc::IdPolicy;
    use std::path::Path;

    #[test]
    fn default_layout_lives_under_data_dir() {
        let config = GarageConfig::from_data_dir("/srv/garage").unwrap();
        assert_eq!(config.database_path, Path::new("/srv/garage/database.sqlite"));
        assert_eq!(config.users_path, Path::new("/srv/garage/users.json"));
        assert_eq!(config.log_dir, Path::new("/srv/garage/logs"));
        assert_eq!(config.id_policy, IdPolicy::MaxPlusOne);
    }

    #[test]
    fn overrides_are_validated() {
        let config = GarageConfig::from_data_dir("/srv/garage")
            .unwrap()
            .with_log_level(" WARNING ")
            .unwrap()
            .with_id_policy("last")
            .unwrap();
        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(config.id_policy, IdPolicy::LastPlusOne);

        assert_eq!(
            LogLevel::parse("loud"),
            Err(ConfigError::UnsupportedLogLevel("loud".to_string()))
        );
        assert!(GarageConfig::from_data_dir("").is_err());
    }
}

//! Runtime settings.
//!
//! # Responsibility
//! - Load settings from an optional TOML file, filling unset keys with
//!   defaults.
//! - Validate the configured time zone before any import runs.

use crate::logging::default_log_level;
use crate::source::fetch::DEFAULT_TIMEOUT;
use crate::source::ISA_DATA_URL;
use chrono::{FixedOffset, Offset, Utc};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_DATABASE_PATH: &str = "terras.db";
pub const DEFAULT_TIME_ZONE: &str = "+00:00";

/// Settings shared by the CLI and library callers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub database_path: PathBuf,
    pub source_url: String,
    /// Whole-request timeout for remote downloads.
    pub fetch_timeout_secs: u64,
    /// Fixed UTC offset such as `-03:00`, applied to naive source timestamps.
    pub time_zone: String,
    pub log_level: String,
    /// Absolute directory for rotated log files; stderr when unset.
    pub log_dir: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            source_url: ISA_DATA_URL.to_string(),
            fetch_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            time_zone: DEFAULT_TIME_ZONE.to_string(),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    InvalidTimeZone(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "invalid config `{}`: {source}", path.display())
            }
            Self::InvalidTimeZone(value) => write!(
                f,
                "invalid time zone `{value}`; expected a UTC offset like +00:00 or -03:00"
            ),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::InvalidTimeZone(_) => None,
        }
    }
}

impl Settings {
    /// Loads settings from `path`, or returns defaults when `path` is `None`.
    ///
    /// # Errors
    /// - `ConfigError::Io` when the file cannot be read.
    /// - `ConfigError::Parse` for malformed TOML or unknown keys.
    /// - `ConfigError::InvalidTimeZone` when `time_zone` is not an offset.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let settings = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            None => Self::default(),
        };
        settings.time_zone_offset()?;
        Ok(settings)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Parses `time_zone` into a fixed offset. `UTC` and `Z` mean `+00:00`.
    pub fn time_zone_offset(&self) -> Result<FixedOffset, ConfigError> {
        parse_time_zone(&self.time_zone)
    }
}

pub fn parse_time_zone(value: &str) -> Result<FixedOffset, ConfigError> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("utc") || trimmed.eq_ignore_ascii_case("z") {
        return Ok(Utc.fix());
    }
    FixedOffset::from_str(trimmed).map_err(|_| ConfigError::InvalidTimeZone(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{parse_time_zone, ConfigError, Settings, DEFAULT_DATABASE_PATH};
    use crate::source::fetch::DEFAULT_TIMEOUT;
use crate::source::ISA_DATA_URL;
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    #[test]
    fn missing_config_file_yields_defaults() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.database_path, PathBuf::from(DEFAULT_DATABASE_PATH));
        assert_eq!(settings.source_url, ISA_DATA_URL);
        assert_eq!(settings.time_zone_offset().unwrap().local_minus_utc(), 0);
        assert!(settings.log_dir.is_none());
        assert_eq!(settings.fetch_timeout(), Duration::from_secs(120));
    }

    #[test]
    fn partial_file_keeps_defaults_for_unset_keys() {
        let settings = Settings::from_toml_str(
            r#"
database_path = "/var/lib/terras/lands.db"
time_zone = "-03:00"
fetch_timeout_secs = 30
"#,
        )
        .unwrap();
        assert_eq!(settings.database_path, Path::new("/var/lib/terras/lands.db"));
        assert_eq!(settings.source_url, ISA_DATA_URL);
        assert_eq!(settings.fetch_timeout(), Duration::from_secs(30));
        assert_eq!(
            settings.time_zone_offset().unwrap().local_minus_utc(),
            -3 * 3600
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Settings::from_toml_str("database = \"x.db\"").is_err());
    }

    #[test]
    fn load_reports_invalid_time_zone() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "time_zone = \"America/Sao_Paulo\"").unwrap();

        let err = Settings::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeZone(_)));
    }

    #[test]
    fn load_reports_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn utc_aliases_parse() {
        assert_eq!(parse_time_zone("UTC").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_time_zone(" +05:30 ").unwrap().local_minus_utc(), 19_800);
    }
}

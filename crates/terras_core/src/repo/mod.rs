//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per entity family.
//! - Isolate SQLite query details from resolver/reconciler orchestration.
//!
//! # Invariants
//! - Repositories never open their own transactions; the caller owns the
//!   transaction (or savepoint) every write lands in.
//! - Uniqueness conflicts surface as `RepoError::UniqueViolation`, distinct
//!   from transport errors, so callers can recover from them.

use crate::db::DbError;
use chrono::{DateTime, FixedOffset};
use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod community_repo;
pub mod geo_repo;
pub mod land_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by all entity repositories.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Row addressed by key does not exist.
    NotFound { entity: &'static str, key: String },
    /// Insert or update collided with a unique constraint.
    UniqueViolation { entity: &'static str, detail: String },
    /// Persisted data cannot be converted into a valid read model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, key } => write!(f, "{entity} not found: {key}"),
            Self::UniqueViolation { entity, detail } => {
                write!(f, "{entity} violates a uniqueness constraint: {detail}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound { .. } | Self::UniqueViolation { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl RepoError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. })
    }
}

/// Maps a SQLite unique/primary-key failure to `UniqueViolation`, anything
/// else to a transport error.
pub(crate) fn classify_write_error(entity: &'static str, err: rusqlite::Error) -> RepoError {
    if is_unique_violation(&err) {
        return RepoError::UniqueViolation {
            entity,
            detail: err.to_string(),
        };
    }
    err.into()
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) => {
            failure.code == ErrorCode::ConstraintViolation
                && matches!(
                    failure.extended_code,
                    rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                        | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                )
        }
        _ => false,
    }
}

pub(crate) fn timestamp_to_db(value: Option<&DateTime<FixedOffset>>) -> Option<String> {
    value.map(DateTime::to_rfc3339)
}

pub(crate) fn parse_db_timestamp(
    value: Option<String>,
    column: &str,
) -> RepoResult<Option<DateTime<FixedOffset>>> {
    match value {
        Some(text) => DateTime::parse_from_rfc3339(&text).map(Some).map_err(|_| {
            RepoError::InvalidData(format!("invalid timestamp `{text}` in {column}"))
        }),
        None => Ok(None),
    }
}

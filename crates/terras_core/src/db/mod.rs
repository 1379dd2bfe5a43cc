//! SQLite storage bootstrap and schema migration entry points.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the land store.
//! - Apply schema migrations in deterministic order.
//! - Expose table-level row counts for reporting and verification.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write application data before migrations succeed.

use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Entity tables in dependency order (parents first).
pub const ENTITY_TABLES: [&str; 5] = [
    "countries",
    "states",
    "municipalities",
    "communities",
    "lands",
];

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Row counts for every entity table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntityCounts {
    pub countries: u64,
    pub states: u64,
    pub municipalities: u64,
    pub communities: u64,
    pub lands: u64,
}

impl Display for EntityCounts {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Countries: {}", self.countries)?;
        writeln!(f, "States: {}", self.states)?;
        writeln!(f, "Municipalities: {}", self.municipalities)?;
        writeln!(f, "Communities: {}", self.communities)?;
        write!(f, "Lands: {}", self.lands)
    }
}

/// Counts rows of every entity table on the given connection.
///
/// Works on plain connections as well as open transactions, so callers can
/// observe uncommitted state from inside a batch.
pub fn entity_counts(conn: &Connection) -> DbResult<EntityCounts> {
    let mut counts = [0_u64; ENTITY_TABLES.len()];
    for (slot, table) in counts.iter_mut().zip(ENTITY_TABLES) {
        *slot = conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
            row.get::<_, u64>(0)
        })?;
    }

    let [countries, states, municipalities, communities, lands] = counts;
    Ok(EntityCounts {
        countries,
        states,
        municipalities,
        communities,
        lands,
    })
}

//! Geography repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Look up and get-or-create countries, states and municipalities by their
//!   natural keys.
//!
//! # Invariants
//! - Get-or-create is a single `INSERT .. ON CONFLICT DO NOTHING` followed by
//!   a keyed read, so an existing row is never modified.
//! - `created` is `true` only when this call inserted the row.

use crate::model::geo::{Country, CountryId, Municipality, State, StateId};
use crate::repo::{classify_write_error, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const COUNTRY_SELECT_SQL: &str = "SELECT id, name, name_local, code, language FROM countries";
const STATE_SELECT_SQL: &str = "SELECT id, name, name_local, code, country_id FROM states";
const MUNICIPALITY_SELECT_SQL: &str =
    "SELECT id, name, name_local, code, state_id FROM municipalities";

/// Repository interface for administrative geography.
pub trait GeoRepository {
    fn find_country_by_code(&self, code: &str) -> RepoResult<Option<Country>>;
    /// Returns the country with `code`, inserting it with `name` when absent.
    fn get_or_create_country(&self, code: &str, name: &str) -> RepoResult<(Country, bool)>;
    fn find_state_by_code(&self, code: &str) -> RepoResult<Option<State>>;
    /// Returns the state with `code`, inserting it under `country_id` when
    /// absent. The display name of a new state is `name`.
    fn get_or_create_state(
        &self,
        code: &str,
        name: &str,
        country_id: CountryId,
    ) -> RepoResult<(State, bool)>;
    fn find_municipality(&self, name: &str, state_id: StateId) -> RepoResult<Option<Municipality>>;
    /// Returns the municipality keyed by `(name, state_id)`, inserting it with
    /// `code` when absent.
    fn get_or_create_municipality(
        &self,
        name: &str,
        state_id: StateId,
        code: &str,
    ) -> RepoResult<(Municipality, bool)>;
}

/// SQLite-backed geography repository.
pub struct SqliteGeoRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGeoRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl GeoRepository for SqliteGeoRepository<'_> {
    fn find_country_by_code(&self, code: &str) -> RepoResult<Option<Country>> {
        let country = self
            .conn
            .query_row(
                &format!("{COUNTRY_SELECT_SQL} WHERE code = ?1;"),
                [code],
                map_country_row,
            )
            .optional()?;
        Ok(country)
    }

    fn get_or_create_country(&self, code: &str, name: &str) -> RepoResult<(Country, bool)> {
        let changed = self
            .conn
            .execute(
                "INSERT INTO countries (name, code)
                 VALUES (?1, ?2)
                 ON CONFLICT (code) DO NOTHING;",
                params![name, code],
            )
            .map_err(|err| classify_write_error("country", err))?;

        let country = self
            .find_country_by_code(code)?
            .ok_or_else(|| not_found("country", code))?;
        Ok((country, changed == 1))
    }

    fn find_state_by_code(&self, code: &str) -> RepoResult<Option<State>> {
        let state = self
            .conn
            .query_row(
                &format!("{STATE_SELECT_SQL} WHERE code = ?1;"),
                [code],
                map_state_row,
            )
            .optional()?;
        Ok(state)
    }

    fn get_or_create_state(
        &self,
        code: &str,
        name: &str,
        country_id: CountryId,
    ) -> RepoResult<(State, bool)> {
        let changed = self
            .conn
            .execute(
                "INSERT INTO states (name, code, country_id)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (code) DO NOTHING;",
                params![name, code, country_id],
            )
            .map_err(|err| classify_write_error("state", err))?;

        let state = self
            .find_state_by_code(code)?
            .ok_or_else(|| not_found("state", code))?;
        Ok((state, changed == 1))
    }

    fn find_municipality(&self, name: &str, state_id: StateId) -> RepoResult<Option<Municipality>> {
        let municipality = self
            .conn
            .query_row(
                &format!("{MUNICIPALITY_SELECT_SQL} WHERE name = ?1 AND state_id = ?2;"),
                params![name, state_id],
                map_municipality_row,
            )
            .optional()?;
        Ok(municipality)
    }

    fn get_or_create_municipality(
        &self,
        name: &str,
        state_id: StateId,
        code: &str,
    ) -> RepoResult<(Municipality, bool)> {
        let changed = self
            .conn
            .execute(
                "INSERT INTO municipalities (name, code, state_id)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (name, state_id) DO NOTHING;",
                params![name, code, state_id],
            )
            .map_err(|err| classify_write_error("municipality", err))?;

        let municipality = self
            .find_municipality(name, state_id)?
            .ok_or_else(|| not_found("municipality", &format!("{name} (state {state_id})")))?;
        Ok((municipality, changed == 1))
    }
}

fn not_found(entity: &'static str, key: &str) -> RepoError {
    RepoError::NotFound {
        entity,
        key: key.to_string(),
    }
}

fn map_country_row(row: &Row<'_>) -> rusqlite::Result<Country> {
    Ok(Country {
        id: row.get("id")?,
        name: row.get("name")?,
        name_local: row.get("name_local")?,
        code: row.get("code")?,
        language: row.get("language")?,
    })
}

fn map_state_row(row: &Row<'_>) -> rusqlite::Result<State> {
    Ok(State {
        id: row.get("id")?,
        name: row.get("name")?,
        name_local: row.get("name_local")?,
        code: row.get("code")?,
        country_id: row.get("country_id")?,
    })
}

fn map_municipality_row(row: &Row<'_>) -> rusqlite::Result<Municipality> {
    Ok(Municipality {
        id: row.get("id")?,
        name: row.get("name")?,
        name_local: row.get("name_local")?,
        code: row.get("code")?,
        state_id: row.get("state_id")?,
    })
}

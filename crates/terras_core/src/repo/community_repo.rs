//! Community repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide lookup by slug/name and creation of communities.
//! - Derive a unique slug for communities created without an explicit one.
//!
//! # Invariants
//! - Persisted slugs are unique and non-empty.
//! - An explicit slug is stored as given; a collision is reported as
//!   `RepoError::UniqueViolation`, never silently rewritten.

use crate::model::community::{Community, CommunityId, NewCommunity};
use crate::repo::{classify_write_error, RepoError, RepoResult};
use crate::slug::{base_slug, unique_slug};
use rusqlite::{params, Connection, OptionalExtension, Row};

const COMMUNITY_SELECT_SQL: &str = "SELECT id, name, slug FROM communities";

/// Repository interface for community operations.
pub trait CommunityRepository {
    fn find_by_slug(&self, slug: &str) -> RepoResult<Option<Community>>;
    fn find_by_name(&self, name: &str) -> RepoResult<Option<Community>>;
    /// Whether `slug` is used by a community other than `excluding`.
    fn slug_taken(&self, slug: &str, excluding: Option<CommunityId>) -> RepoResult<bool>;
    /// Inserts one community and returns the persisted row.
    fn create_community(&self, community: &NewCommunity) -> RepoResult<Community>;
    fn list_communities(&self) -> RepoResult<Vec<Community>>;
}

/// SQLite-backed community repository.
pub struct SqliteCommunityRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCommunityRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CommunityRepository for SqliteCommunityRepository<'_> {
    fn find_by_slug(&self, slug: &str) -> RepoResult<Option<Community>> {
        let community = self
            .conn
            .query_row(
                &format!("{COMMUNITY_SELECT_SQL} WHERE slug = ?1;"),
                [slug],
                map_community_row,
            )
            .optional()?;
        Ok(community)
    }

    fn find_by_name(&self, name: &str) -> RepoResult<Option<Community>> {
        let community = self
            .conn
            .query_row(
                &format!("{COMMUNITY_SELECT_SQL} WHERE name = ?1;"),
                [name],
                map_community_row,
            )
            .optional()?;
        Ok(community)
    }

    fn slug_taken(&self, slug: &str, excluding: Option<CommunityId>) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM communities
                WHERE slug = ?1
                  AND (?2 IS NULL OR id <> ?2)
            );",
            params![slug, excluding],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn create_community(&self, community: &NewCommunity) -> RepoResult<Community> {
        let name = community.name.trim();
        if name.is_empty() {
            return Err(RepoError::InvalidData(
                "community name must not be blank".to_string(),
            ));
        }

        let slug = match community.slug.as_deref().map(str::trim) {
            Some(explicit) if !explicit.is_empty() => explicit.to_string(),
            _ => unique_slug(&base_slug(name), |candidate| {
                self.slug_taken(candidate, None)
            })?,
        };

        self.conn
            .execute(
                "INSERT INTO communities (name, slug) VALUES (?1, ?2);",
                params![name, slug],
            )
            .map_err(|err| classify_write_error("community", err))?;

        Ok(Community {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            slug,
        })
    }

    fn list_communities(&self) -> RepoResult<Vec<Community>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{COMMUNITY_SELECT_SQL} ORDER BY name ASC, id ASC;"))?;
        let rows = stmt.query_map([], map_community_row)?;
        let communities = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(communities)
    }
}

pub(crate) fn map_community_row(row: &Row<'_>) -> rusqlite::Result<Community> {
    Ok(Community {
        id: row.get("id")?,
        name: row.get("name")?,
        slug: row.get("slug")?,
    })
}

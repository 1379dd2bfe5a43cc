//! Land repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide create, full-overwrite update and natural-key lookup for lands.
//! - Own the land/community link replacement (`set_communities`).
//! - Offer read operations used by downstream consumers.
//!
//! # Invariants
//! - `update_land` never touches `biome_id`; the importer does not own it.
//! - `set_communities` replaces the whole link set: links absent from the new
//!   list are removed.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::model::community::{Community, CommunityId};
use crate::model::geo::MunicipalityId;
use crate::model::land::{Land, LandCategory, LandFields, LandId, RawPayload};
use crate::repo::community_repo::map_community_row;
use crate::repo::{
    classify_write_error, parse_db_timestamp, timestamp_to_db, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const LAND_SELECT_SQL: &str = "SELECT
    id,
    name,
    category,
    municipality_id,
    biome_id,
    source_id,
    source_name,
    source_updated_at,
    source_last_synced_at,
    source_raw_data
FROM lands";

/// Query options for listing lands.
#[derive(Debug, Clone, Default)]
pub struct LandListQuery {
    pub category: Option<LandCategory>,
    pub municipality_id: Option<MunicipalityId>,
    /// Only lands linked to the community with this slug.
    pub community_slug: Option<String>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for land operations.
pub trait LandRepository {
    fn get_land(&self, id: LandId) -> RepoResult<Option<Land>>;
    /// Looks up a land by its `(source_name, source_id)` natural key.
    fn find_by_source(&self, source_name: &str, source_id: &str) -> RepoResult<Option<Land>>;
    fn create_land(&self, fields: &LandFields) -> RepoResult<Land>;
    /// Overwrites every importer-owned field of an existing land.
    fn update_land(&self, id: LandId, fields: &LandFields) -> RepoResult<Land>;
    /// Replaces the full community set of one land.
    fn set_communities(&self, id: LandId, community_ids: &[CommunityId]) -> RepoResult<()>;
    fn list_land_communities(&self, id: LandId) -> RepoResult<Vec<Community>>;
    fn list_lands(&self, query: &LandListQuery) -> RepoResult<Vec<Land>>;
}

/// SQLite-backed land repository.
pub struct SqliteLandRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLandRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl LandRepository for SqliteLandRepository<'_> {
    fn get_land(&self, id: LandId) -> RepoResult<Option<Land>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{LAND_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_land_row(row)?));
        }

        Ok(None)
    }

    fn find_by_source(&self, source_name: &str, source_id: &str) -> RepoResult<Option<Land>> {
        let mut stmt = self.conn.prepare(&format!(
            "{LAND_SELECT_SQL}
             WHERE source_name = ?1
               AND source_id = ?2;"
        ))?;
        let mut rows = stmt.query(params![source_name, source_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_land_row(row)?));
        }

        Ok(None)
    }

    fn create_land(&self, fields: &LandFields) -> RepoResult<Land> {
        self.conn
            .execute(
                "INSERT INTO lands (
                    name,
                    category,
                    municipality_id,
                    source_id,
                    source_name,
                    source_updated_at,
                    source_last_synced_at,
                    source_raw_data
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
                params![
                    fields.name.as_str(),
                    fields.category.code(),
                    fields.municipality_id,
                    fields.source_id.as_deref(),
                    fields.source_name.as_deref(),
                    timestamp_to_db(fields.source_updated_at.as_ref()),
                    timestamp_to_db(fields.source_last_synced_at.as_ref()),
                    fields.source_raw_data.as_ref().map(RawPayload::as_str),
                ],
            )
            .map_err(|err| classify_write_error("land", err))?;

        let id = self.conn.last_insert_rowid();
        self.get_land(id)?.ok_or_else(|| not_found(id))
    }

    fn update_land(&self, id: LandId, fields: &LandFields) -> RepoResult<Land> {
        let changed = self
            .conn
            .execute(
                "UPDATE lands
                 SET
                    name = ?1,
                    category = ?2,
                    municipality_id = ?3,
                    source_id = ?4,
                    source_name = ?5,
                    source_updated_at = ?6,
                    source_last_synced_at = ?7,
                    source_raw_data = ?8
                 WHERE id = ?9;",
                params![
                    fields.name.as_str(),
                    fields.category.code(),
                    fields.municipality_id,
                    fields.source_id.as_deref(),
                    fields.source_name.as_deref(),
                    timestamp_to_db(fields.source_updated_at.as_ref()),
                    timestamp_to_db(fields.source_last_synced_at.as_ref()),
                    fields.source_raw_data.as_ref().map(RawPayload::as_str),
                    id,
                ],
            )
            .map_err(|err| classify_write_error("land", err))?;

        if changed == 0 {
            return Err(not_found(id));
        }

        self.get_land(id)?.ok_or_else(|| not_found(id))
    }

    fn set_communities(&self, id: LandId, community_ids: &[CommunityId]) -> RepoResult<()> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM lands WHERE id = ?1);",
            [id],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(not_found(id));
        }

        self.conn
            .execute("DELETE FROM land_communities WHERE land_id = ?1;", [id])?;

        let mut insert = self.conn.prepare(
            "INSERT OR IGNORE INTO land_communities (land_id, community_id)
             VALUES (?1, ?2);",
        )?;
        for community_id in community_ids {
            insert.execute(params![id, community_id])?;
        }

        Ok(())
    }

    fn list_land_communities(&self, id: LandId) -> RepoResult<Vec<Community>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.name, c.slug
             FROM land_communities lc
             INNER JOIN communities c ON c.id = lc.community_id
             WHERE lc.land_id = ?1
             ORDER BY c.name ASC, c.id ASC;",
        )?;
        let rows = stmt.query_map([id], map_community_row)?;
        let communities = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(communities)
    }

    fn list_lands(&self, query: &LandListQuery) -> RepoResult<Vec<Land>> {
        let mut sql = format!("{LAND_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(category) = query.category {
            sql.push_str(" AND category = ?");
            bind_values.push(Value::Text(category.code().to_string()));
        }

        if let Some(municipality_id) = query.municipality_id {
            sql.push_str(" AND municipality_id = ?");
            bind_values.push(Value::Integer(municipality_id));
        }

        if let Some(slug) = query.community_slug.as_ref() {
            sql.push_str(
                " AND EXISTS (
                    SELECT 1
                    FROM land_communities lc
                    INNER JOIN communities c ON c.id = lc.community_id
                    WHERE lc.land_id = lands.id
                      AND c.slug = ?
                )",
            );
            bind_values.push(Value::Text(slug.clone()));
        }

        sql.push_str(" ORDER BY name ASC, id ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut lands = Vec::new();

        while let Some(row) = rows.next()? {
            lands.push(parse_land_row(row)?);
        }

        Ok(lands)
    }
}

fn not_found(id: LandId) -> RepoError {
    RepoError::NotFound {
        entity: "land",
        key: id.to_string(),
    }
}

fn parse_land_row(row: &Row<'_>) -> RepoResult<Land> {
    let category_text: String = row.get("category")?;
    let category = category_text.parse::<LandCategory>().map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid land category `{category_text}` in lands.category"
        ))
    })?;

    Ok(Land {
        id: row.get("id")?,
        name: row.get("name")?,
        category,
        municipality_id: row.get("municipality_id")?,
        biome_id: row.get("biome_id")?,
        source_id: row.get("source_id")?,
        source_name: row.get("source_name")?,
        source_updated_at: parse_db_timestamp(
            row.get("source_updated_at")?,
            "lands.source_updated_at",
        )?,
        source_last_synced_at: parse_db_timestamp(
            row.get("source_last_synced_at")?,
            "lands.source_last_synced_at",
        )?,
        source_raw_data: row
            .get::<_, Option<String>>("source_raw_data")?
            .map(RawPayload::new),
    })
}

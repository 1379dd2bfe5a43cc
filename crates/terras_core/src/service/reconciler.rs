//! Per-record reconciliation of source land records.
//!
//! # Responsibility
//! - Decide create/update/skip for one raw land record.
//! - Resolve the record's municipality and communities and apply the land
//!   write plus its community link replacement.
//!
//! # Invariants
//! - A record without identifier or name is skipped with no writes.
//! - An already imported land is skipped without touching any resolver
//!   unless update mode is on.
//! - Updates overwrite every importer-owned field; the community set is
//!   replaced, not merged.
//! - The caller owns the transaction; a returned error leaves partial writes
//!   for the caller to roll back.

use crate::model::community::CommunityId;
use crate::model::land::{
    LandCategory, LandFields, LandId, RawPayload, UnknownCategory, ISA_SOURCE_NAME,
};
use crate::repo::community_repo::{CommunityRepository, SqliteCommunityRepository};
use crate::repo::geo_repo::{GeoRepository, SqliteGeoRepository};
use crate::repo::land_repo::{LandRepository, SqliteLandRepository};
use crate::repo::RepoError;
use crate::service::community_resolver::CommunityResolver;
use crate::service::location_resolver::LocationResolver;
use crate::source::record::{record_label, IsaRecord};
use crate::source::timestamp::parse_source_timestamp;
use chrono::{FixedOffset, Offset, Utc};
use log::{info, warn};
use rusqlite::Connection;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Why a record produced no land write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Identifier or land name is absent.
    MissingIdentity,
    /// The land exists and update mode is off.
    AlreadyImported,
}

/// What happened to the land of one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandAction {
    Created(LandId),
    Updated(LandId),
    Skipped(SkipReason),
}

/// Per-record counts reported back to the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordOutcome {
    pub action: LandAction,
    pub municipality_created: bool,
    pub communities_created: u64,
}

impl RecordOutcome {
    fn skipped(reason: SkipReason) -> Self {
        Self {
            action: LandAction::Skipped(reason),
            municipality_created: false,
            communities_created: 0,
        }
    }
}

/// Failure while reconciling one record. Never fatal for the batch.
#[derive(Debug)]
pub enum RecordError {
    /// Fragment is not an object or carries wrongly typed fields.
    Malformed(serde_json::Error),
    InvalidCategory(UnknownCategory),
    Repo(RepoError),
}

impl Display for RecordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(err) => write!(f, "malformed record: {err}"),
            Self::InvalidCategory(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RecordError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Malformed(err) => Some(err),
            Self::InvalidCategory(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for RecordError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<UnknownCategory> for RecordError {
    fn from(value: UnknownCategory) -> Self {
        Self::InvalidCategory(value)
    }
}

/// Reconciliation switches shared by every record of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Overwrite lands matched by natural key instead of skipping them.
    pub update_existing: bool,
    /// Zone applied to naive source timestamps.
    pub time_zone: FixedOffset,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            update_existing: false,
            time_zone: Utc.fix(),
        }
    }
}

/// Reconciles raw records through the geography, community and land
/// repositories.
pub struct RecordReconciler<G, C, L>
where
    G: GeoRepository,
    C: CommunityRepository,
    L: LandRepository,
{
    geo: G,
    communities: C,
    lands: L,
    options: ReconcileOptions,
}

impl<'conn>
    RecordReconciler<
        SqliteGeoRepository<'conn>,
        SqliteCommunityRepository<'conn>,
        SqliteLandRepository<'conn>,
    >
{
    /// Builds a reconciler whose repositories all write through `conn`.
    pub fn sqlite(conn: &'conn Connection, options: ReconcileOptions) -> Self {
        Self::new(
            SqliteGeoRepository::new(conn),
            SqliteCommunityRepository::new(conn),
            SqliteLandRepository::new(conn),
            options,
        )
    }
}

impl<G, C, L> RecordReconciler<G, C, L>
where
    G: GeoRepository,
    C: CommunityRepository,
    L: LandRepository,
{
    pub fn new(geo: G, communities: C, lands: L, options: ReconcileOptions) -> Self {
        Self {
            geo,
            communities,
            lands,
            options,
        }
    }

    /// Reconciles one raw record fragment.
    ///
    /// # Errors
    /// - `RecordError::Malformed` when the fragment cannot be read.
    /// - `RecordError::InvalidCategory` for a category code outside the
    ///   enumeration.
    /// - `RecordError::Repo` for persistence failures.
    pub fn reconcile(&self, raw: &Value) -> Result<RecordOutcome, RecordError> {
        let label = record_label(raw);
        let record = IsaRecord::from_value(raw).map_err(RecordError::Malformed)?;

        let (Some(source_id), Some(name)) = (record.source_id(), record.display_name()) else {
            warn!(
                "event=record_skip module=reconcile status=skip reason=missing_id_or_name label={}",
                label
            );
            return Ok(RecordOutcome::skipped(SkipReason::MissingIdentity));
        };

        let existing = self.lands.find_by_source(ISA_SOURCE_NAME, &source_id)?;
        if existing.is_some() && !self.options.update_existing {
            info!(
                "event=record_skip module=reconcile status=skip reason=already_imported source_id={} label={}",
                source_id, label
            );
            return Ok(RecordOutcome::skipped(SkipReason::AlreadyImported));
        }

        let category = match record.category_code() {
            Some(code) => code.parse::<LandCategory>()?,
            None => LandCategory::default(),
        };

        let (municipality, municipality_created) = match record.first_location() {
            Some(fragment) => LocationResolver::new(&self.geo).resolve(fragment)?,
            None => (None, false),
        };

        let resolver = CommunityResolver::new(&self.communities);
        let mut community_ids: Vec<CommunityId> = Vec::new();
        let mut communities_created = 0_u64;
        for community_name in record.community_names() {
            let (community, created) = resolver.resolve(community_name)?;
            if created {
                communities_created += 1;
            }
            if !community_ids.contains(&community.id) {
                community_ids.push(community.id);
            }
        }

        let time_zone = self.options.time_zone;
        let fields = LandFields {
            name: name.to_string(),
            category,
            municipality_id: municipality.as_ref().map(|municipality| municipality.id),
            source_id: Some(source_id.clone()),
            source_name: Some(ISA_SOURCE_NAME.to_string()),
            source_updated_at: parse_source_timestamp(record.updated_at.as_deref(), time_zone),
            source_last_synced_at: Some(Utc::now().with_timezone(&time_zone)),
            source_raw_data: Some(RawPayload::from_value(raw)),
        };

        let (action, land_id, verb) = match existing {
            Some(land) => {
                let updated = self.lands.update_land(land.id, &fields)?;
                (LandAction::Updated(updated.id), updated.id, "updated")
            }
            None => {
                let created = self.lands.create_land(&fields)?;
                (LandAction::Created(created.id), created.id, "created")
            }
        };

        self.lands.set_communities(land_id, &community_ids)?;

        info!(
            "event=record_apply module=reconcile status=ok action={} source_id={} label={} communities={}",
            verb,
            source_id,
            label,
            community_ids.len()
        );

        Ok(RecordOutcome {
            action,
            municipality_created,
            communities_created,
        })
    }
}

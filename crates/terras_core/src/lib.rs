//! Core domain logic for terras.
//! Reconciles indigenous land records from the ISA dataset into a
//! normalized SQLite store.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod slug;
pub mod source;

pub use config::{ConfigError, Settings};
pub use db::{entity_counts, open_db, open_db_in_memory, DbError, EntityCounts};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::community::{Community, CommunityId, NewCommunity};
pub use model::geo::{Biome, Country, Municipality, State};
pub use model::land::{Land, LandCategory, LandFields, LandId, RawPayload};
pub use repo::community_repo::{CommunityRepository, SqliteCommunityRepository};
pub use repo::geo_repo::{GeoRepository, SqliteGeoRepository};
pub use repo::land_repo::{LandListQuery, LandRepository, SqliteLandRepository};
pub use repo::{RepoError, RepoResult};
pub use service::import_service::{ImportError, ImportOptions, ImportService};
pub use service::reconciler::{ReconcileOptions, RecordReconciler};
pub use service::report::{ImportReport, ImportStats, RecordFailure};
pub use source::{DataSource, HttpFetcher, RemoteFetcher, SourceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

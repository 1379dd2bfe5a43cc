//! Batch import coordinator.
//!
//! # Responsibility
//! - Load and extract the raw dataset (`Loading -> Extracting`).
//! - Reconcile every record inside one transaction (`Reconciling`).
//! - Commit, or roll back for dry runs, and report counts (`Finalizing`).
//!
//! # Invariants
//! - Load/extract failures are returned before the database is touched.
//! - Records are processed strictly in source order.
//! - Each record runs in its own savepoint: a failing record is rolled back
//!   alone and the batch continues.
//! - A dry run always rolls the whole transaction back, whatever the
//!   per-record outcomes were.

use crate::db::DbError;
use crate::repo::geo_repo::SqliteGeoRepository;
use crate::repo::RepoError;
use crate::service::location_resolver::ensure_home_country;
use crate::service::reconciler::{ReconcileOptions, RecordReconciler};
use crate::service::report::{ImportReport, ImportStats, RecordFailure};
use crate::source::record::record_label;
use crate::source::{
    extract_records, load_bytes, parse_document, DataSource, RemoteFetcher, SourceError,
};
use chrono::FixedOffset;
use log::{error, info, warn};
use rusqlite::{Connection, TransactionBehavior};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Switches for one batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportOptions {
    /// Process everything, then discard all writes.
    pub dry_run: bool,
    pub reconcile: ReconcileOptions,
}

impl ImportOptions {
    pub fn new(dry_run: bool, update_existing: bool, time_zone: FixedOffset) -> Self {
        Self {
            dry_run,
            reconcile: ReconcileOptions {
                update_existing,
                time_zone,
            },
        }
    }
}

/// Fatal batch errors. Per-record failures never surface here.
#[derive(Debug)]
pub enum ImportError {
    Source(SourceError),
    Db(DbError),
    Repo(RepoError),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Source(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<SourceError> for ImportError {
    fn from(value: SourceError) -> Self {
        Self::Source(value)
    }
}

impl From<DbError> for ImportError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for ImportError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for ImportError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Runs batch imports with a given remote fetcher.
pub struct ImportService<F: RemoteFetcher> {
    fetcher: F,
    options: ImportOptions,
}

impl<F: RemoteFetcher> ImportService<F> {
    pub fn new(fetcher: F, options: ImportOptions) -> Self {
        Self { fetcher, options }
    }

    /// Imports `source` into the store behind `conn`.
    ///
    /// Equivalent to [`ImportService::load`] followed by
    /// [`ImportService::apply`].
    ///
    /// # Errors
    /// - `ImportError::Source` for unreadable, unparseable or wrongly shaped
    ///   input; nothing has been written at that point.
    /// - `ImportError::Db`/`ImportError::Repo` when the transaction itself or
    ///   the home country setup fails; the transaction is rolled back.
    pub fn run(
        &self,
        conn: &mut Connection,
        source: &DataSource,
    ) -> Result<ImportReport, ImportError> {
        let records = self.load(source)?;
        self.apply(conn, source, records)
    }

    /// Loads and extracts the record fragments of `source`.
    ///
    /// Needs no database, so callers can fail on bad input before opening
    /// (and possibly creating) the store.
    pub fn load(&self, source: &DataSource) -> Result<Vec<Value>, SourceError> {
        info!(
            "event=import_load module=import status=start source={}",
            source
        );
        let loaded = load_bytes(source, &self.fetcher)
            .and_then(|bytes| parse_document(&bytes))
            .and_then(extract_records);
        match &loaded {
            Ok(records) => info!(
                "event=import_load module=import status=ok records={}",
                records.len()
            ),
            Err(err) => error!(
                "event=import_load module=import status=error source={} error={}",
                source, err
            ),
        }
        loaded
    }

    /// Reconciles already loaded `records` into the store behind `conn`.
    ///
    /// `source` only labels the report.
    ///
    /// # Errors
    /// - `ImportError::Db`/`ImportError::Repo` when the transaction itself or
    ///   the home country setup fails; the transaction is rolled back.
    pub fn apply(
        &self,
        conn: &mut Connection,
        source: &DataSource,
        records: Vec<Value>,
    ) -> Result<ImportReport, ImportError> {
        let started_at = Instant::now();
        info!(
            "event=import_start module=import status=start source={} records={} dry_run={} update={}",
            source,
            records.len(),
            self.options.dry_run,
            self.options.reconcile.update_existing
        );

        let mut tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let (_, home_country_created) = ensure_home_country(&SqliteGeoRepository::new(&tx))?;
        if home_country_created {
            info!("event=home_country_create module=import status=ok");
        }

        let mut stats = ImportStats::default();
        let mut failures = Vec::new();
        for (index, raw) in records.iter().enumerate() {
            let savepoint = tx.savepoint()?;
            let outcome =
                RecordReconciler::sqlite(&savepoint, self.options.reconcile).reconcile(raw);
            match outcome {
                Ok(outcome) => {
                    savepoint.commit()?;
                    stats.record(&outcome);
                }
                Err(err) => {
                    // Dropping the savepoint rolls back this record's writes.
                    drop(savepoint);
                    let label = record_label(raw).to_string();
                    error!(
                        "event=record_failed module=import status=error index={} label={} error={}",
                        index, label, err
                    );
                    stats.record_failure();
                    failures.push(RecordFailure {
                        index,
                        label,
                        message: err.to_string(),
                    });
                }
            }
        }

        if self.options.dry_run {
            tx.rollback()?;
            warn!("event=import_finalize module=import status=ok mode=dry_run changes=discarded");
        } else {
            tx.commit()?;
            info!("event=import_finalize module=import status=ok mode=commit");
        }

        info!(
            "event=import_done module=import status=ok records={} created={} updated={} skipped={} failed={} duration_ms={}",
            records.len(),
            stats.lands_created,
            stats.lands_updated,
            stats.lands_skipped,
            stats.records_failed,
            started_at.elapsed().as_millis()
        );

        Ok(ImportReport {
            source: source.clone(),
            record_count: records.len(),
            home_country_created,
            dry_run: self.options.dry_run,
            stats,
            failures,
        })
    }
}

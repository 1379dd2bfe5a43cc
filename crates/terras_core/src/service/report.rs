//! Batch statistics and the human-readable import report.

use crate::service::reconciler::{LandAction, RecordOutcome};
use crate::source::DataSource;
use serde::Serialize;
use std::fmt::{Display, Formatter};

const RULE_WIDTH: usize = 50;

/// Counters accumulated over one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    pub lands_created: u64,
    pub lands_updated: u64,
    pub lands_skipped: u64,
    pub municipalities_created: u64,
    pub communities_created: u64,
    /// Records whose processing failed and was rolled back.
    pub records_failed: u64,
}

impl ImportStats {
    /// Adds the counts of one successfully reconciled record.
    pub fn record(&mut self, outcome: &RecordOutcome) {
        match outcome.action {
            LandAction::Created(_) => self.lands_created += 1,
            LandAction::Updated(_) => self.lands_updated += 1,
            LandAction::Skipped(_) => self.lands_skipped += 1,
        }
        if outcome.municipality_created {
            self.municipalities_created += 1;
        }
        self.communities_created += outcome.communities_created;
    }

    pub fn record_failure(&mut self) {
        self.records_failed += 1;
    }
}

/// One record that failed and was left out of the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordFailure {
    /// Position of the record in the source list.
    pub index: usize,
    /// Land name of the record, or `unknown`.
    pub label: String,
    pub message: String,
}

/// Final outcome of one batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub source: DataSource,
    pub record_count: usize,
    pub home_country_created: bool,
    pub dry_run: bool,
    pub stats: ImportStats,
    pub failures: Vec<RecordFailure>,
}

impl Display for ImportReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            DataSource::File(path) => writeln!(f, "Loading data from file: {}", path.display())?,
            DataSource::Remote(url) => writeln!(f, "Downloading data from: {url}")?,
        }
        writeln!(f, "Found {} land records to process", self.record_count)?;
        if self.home_country_created {
            writeln!(f, "Created Brazil country record")?;
        }
        for failure in &self.failures {
            writeln!(
                f,
                "Error processing land '{}': {}",
                failure.label, failure.message
            )?;
        }
        if self.dry_run {
            writeln!(f)?;
            writeln!(f, "=== DRY RUN - No changes saved ===")?;
        }

        writeln!(f)?;
        writeln!(f, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(f, "Import completed!")?;
        writeln!(f, "Lands created: {}", self.stats.lands_created)?;
        writeln!(f, "Lands updated: {}", self.stats.lands_updated)?;
        writeln!(f, "Lands skipped: {}", self.stats.lands_skipped)?;
        writeln!(
            f,
            "Municipalities created: {}",
            self.stats.municipalities_created
        )?;
        writeln!(f, "Communities created: {}", self.stats.communities_created)?;
        write!(f, "Records failed: {}", self.stats.records_failed)
    }
}

#[cfg(test)]
mod tests {
    use super::{ImportReport, ImportStats, RecordFailure};
    use crate::service::reconciler::{LandAction, RecordOutcome, SkipReason};
    use crate::source::DataSource;
    use std::path::PathBuf;

    #[test]
    fn stats_accumulate_outcomes() {
        let mut stats = ImportStats::default();
        stats.record(&RecordOutcome {
            action: LandAction::Created(1),
            municipality_created: true,
            communities_created: 2,
        });
        stats.record(&RecordOutcome {
            action: LandAction::Skipped(SkipReason::AlreadyImported),
            municipality_created: false,
            communities_created: 0,
        });
        stats.record_failure();

        assert_eq!(stats.lands_created, 1);
        assert_eq!(stats.lands_skipped, 1);
        assert_eq!(stats.municipalities_created, 1);
        assert_eq!(stats.communities_created, 2);
        assert_eq!(stats.records_failed, 1);
    }

    #[test]
    fn report_states_dry_run_and_failures() {
        let report = ImportReport {
            source: DataSource::File(PathBuf::from("lands.json")),
            record_count: 2,
            home_country_created: true,
            dry_run: true,
            stats: ImportStats {
                lands_created: 1,
                records_failed: 1,
                ..ImportStats::default()
            },
            failures: vec![RecordFailure {
                index: 1,
                label: "Acimã".to_string(),
                message: "boom".to_string(),
            }],
        };
        let text = report.to_string();

        assert!(text.contains("Loading data from file: lands.json"));
        assert!(text.contains("Found 2 land records to process"));
        assert!(text.contains("Created Brazil country record"));
        assert!(text.contains("Error processing land 'Acimã': boom"));
        assert!(text.contains("DRY RUN - No changes saved"));
        assert!(text.contains("Lands created: 1"));
        assert!(text.contains("Records failed: 1"));
    }
}

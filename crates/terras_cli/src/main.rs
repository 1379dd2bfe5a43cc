//! `terras` command line entry point.
//!
//! # Responsibility
//! - Merge file settings with flag/environment overrides.
//! - Run an import batch or print store row counts.
//! - Exit non-zero on fatal errors; per-record failures only show up in the
//!   printed report.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use rusqlite::Connection;
use std::path::PathBuf;
use terras_core::config::parse_time_zone;
use terras_core::{
    entity_counts, init_logging, open_db, DataSource, HttpFetcher, ImportOptions, ImportReport,
    ImportService, Settings,
};

/// Indigenous land dataset importer
#[derive(Parser, Debug)]
#[clap(name = "terras", version)]
#[clap(about = "Import ISA indigenous land records into a normalized SQLite store")]
struct Cli {
    /// TOML settings file
    #[clap(long, global = true, value_name = "FILE", env = "TERRAS_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file
    #[clap(long, global = true, value_name = "FILE", env = "TERRAS_DATABASE")]
    database: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[clap(long, global = true, env = "TERRAS_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rotated log files (stderr when unset)
    #[clap(long, global = true, value_name = "DIR", env = "TERRAS_LOG_DIR")]
    log_dir: Option<String>,

    /// UTC offset applied to source timestamps without one, e.g. -03:00
    #[clap(long, global = true, env = "TERRAS_TIME_ZONE")]
    time_zone: Option<String>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import land records from a local JSON file or the remote dataset
    Import {
        /// Local JSON file; downloads from the source URL when omitted
        #[clap(value_name = "JSON_FILE")]
        json_file: Option<PathBuf>,

        /// Remote dataset URL
        #[clap(long, env = "TERRAS_SOURCE_URL")]
        source_url: Option<String>,

        /// Process everything, then discard all changes
        #[clap(long)]
        dry_run: bool,

        /// Overwrite lands that were already imported
        #[clap(long)]
        update: bool,

        /// Download timeout in seconds
        #[clap(long, value_name = "SECS", env = "TERRAS_FETCH_TIMEOUT")]
        timeout: Option<u64>,
    },
    /// Print row counts of every entity table
    Summary,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;

    init_logging(&settings.log_level, settings.log_dir.as_deref())
        .map_err(anyhow::Error::msg)
        .context("failed to initialize logging")?;

    match cli.command {
        Command::Import {
            json_file,
            source_url,
            dry_run,
            update,
            timeout,
        } => {
            let mut settings = settings;
            if let Some(timeout) = timeout {
                settings.fetch_timeout_secs = timeout;
            }
            let url = source_url.unwrap_or_else(|| settings.source_url.clone());
            let source = DataSource::from_args(json_file, url);
            let report = import(&settings, &source, dry_run, update)?;
            println!("{report}");
        }
        Command::Summary => {
            let conn = open_store(&settings)?;
            let counts = entity_counts(&conn).context("failed to count rows")?;
            info!(
                "event=summary module=cli status=ok lands={}",
                counts.lands
            );
            println!("{counts}");
        }
    }

    Ok(())
}

/// Loads the input before touching the store, so bad input never leaves a
/// fresh database file behind.
fn import(
    settings: &Settings,
    source: &DataSource,
    dry_run: bool,
    update: bool,
) -> Result<ImportReport> {
    let options = ImportOptions::new(dry_run, update, settings.time_zone_offset()?);
    let fetcher = HttpFetcher::with_timeout(settings.fetch_timeout());
    let service = ImportService::new(fetcher, options);

    let records = service.load(source).context("import failed")?;
    let mut conn = open_store(settings)?;
    service
        .apply(&mut conn, source, records)
        .context("import failed")
}

fn open_store(settings: &Settings) -> Result<Connection> {
    open_db(&settings.database_path).with_context(|| {
        format!(
            "failed to open database {}",
            settings.database_path.display()
        )
    })
}

fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::load(cli.config.as_deref()).context("failed to load settings")?;

    if let Some(database) = &cli.database {
        settings.database_path = database.clone();
    }
    if let Some(level) = &cli.log_level {
        settings.log_level = level.clone();
    }
    if let Some(dir) = &cli.log_dir {
        settings.log_dir = Some(dir.clone());
    }
    if let Some(time_zone) = &cli.time_zone {
        parse_time_zone(time_zone)?;
        settings.time_zone = time_zone.clone();
    }

    Ok(settings)
}

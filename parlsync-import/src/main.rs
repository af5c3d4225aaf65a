//! parlsync-import - representative import service
//!
//! Thin process wrapper around one import session: initialize logging,
//! resolve configuration, open the database, stream the already-downloaded
//! dump through the orchestrator, report counts. Acquisition and
//! scheduling live elsewhere.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use parlsync_import::record::iter_dump_records;
use parlsync_import::{ImportOrchestrator, LookupTables};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting parlsync-import");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = parlsync_common::config::TomlConfig::load_default();

    let db_path = parlsync_common::config::resolve_database_path(&config);
    info!("Database: {}", db_path.display());
    let pool = parlsync_common::db::init_database(&db_path).await?;
    parlsync_import::db::initialize_schema(&pool).await?;

    let name_corrections = config.name_corrections.as_deref().map(PathBuf::from);
    let group_aliases = config.group_aliases.as_deref().map(PathBuf::from);
    let lookups = LookupTables::load(name_corrections.as_deref(), group_aliases.as_deref())
        .context("load correction tables")?;

    let dump_path = parlsync_common::config::resolve_dump_path(&config)?;
    info!("Dump file: {}", dump_path.display());
    let dump = File::open(&dump_path)
        .with_context(|| format!("open dump file {}", dump_path.display()))?;

    let orchestrator = ImportOrchestrator::new(pool, lookups);
    let session = orchestrator
        .run(iter_dump_records(BufReader::new(dump)))
        .await?;

    info!(
        processed = session.counts.processed,
        skipped = session.counts.skipped,
        failed = session.counts.failed,
        swept = session.counts.swept,
        "Import finished"
    );

    Ok(())
}

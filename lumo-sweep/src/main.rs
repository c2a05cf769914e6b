//! Lumo media sweep (lumo-sweep) - Main entry point
//!
//! Command-line maintenance tool for the shop's remote media store. The
//! `report` and `cleanup` subcommands drive two-phase deduplication; `verify`
//! probes recorded URLs; `migrate` uploads legacy local images.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sqlx::SqlitePool;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lumo_common::config::{MediaStoreConfig, TomlConfig, ENV_CONFIG, ENV_DATABASE};
use lumo_common::db::init_database_pool;
use lumo_common::store::{HttpMediaStore, MediaStore};
use lumo_sweep::services::migration::MigrationService;
use lumo_sweep::services::reconciler::DEFAULT_DELETE_DELAY_MS;
use lumo_sweep::services::url_health::UrlHealthVerifier;
use lumo_sweep::services::{LiveRefScanner, Reconciler};
use lumo_sweep::SweepError;

/// Command-line arguments for lumo-sweep
#[derive(Parser, Debug)]
#[command(name = "lumo-sweep")]
#[command(about = "Media store reconciliation and migration for the Lumo shop")]
#[command(version)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = ENV_CONFIG)]
    config: Option<PathBuf>,

    /// Path to the shop SQLite database
    #[arg(short, long, env = ENV_DATABASE)]
    database: Option<PathBuf>,

    /// Folder prefix to sweep (overrides store.folder)
    #[arg(short, long)]
    folder: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify duplicates and unused assets; print what cleanup would do
    Report {
        /// Write the flat removal-candidate list to this file as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Delete every removal candidate, serially
    Cleanup {
        /// Milliseconds to wait between consecutive delete calls
        #[arg(long)]
        delay_ms: Option<u64>,
    },
    /// Probe every recorded image URL against the remote store
    Verify,
    /// Upload legacy local images and rewrite their database references
    Migrate {
        /// Shop public directory holding the legacy files
        #[arg(long)]
        public_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the report listing.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lumo_sweep=info,lumo_common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let config =
        TomlConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    let db_path = config.resolve_database_path(args.database.as_deref());
    info!("Shop database: {}", db_path.display());
    let pool = init_database_pool(&db_path)
        .await
        .context("Failed to open the shop database")?;

    let mut store_config =
        MediaStoreConfig::from_toml(&config.store).context("Remote store is not configured")?;
    if let Some(folder) = args.folder {
        store_config.folder = folder;
    }
    info!(
        "Remote store: {} (space {}, folder {})",
        store_config.base_url, store_config.space, store_config.folder
    );
    let store: Arc<dyn MediaStore> = Arc::new(
        HttpMediaStore::new(store_config.clone()).context("Failed to build the store client")?,
    );

    match args.command {
        Command::Report { json } => run_report(store, pool, &config, &store_config, json).await,
        Command::Cleanup { delay_ms } => {
            run_cleanup(store, pool, &config, &store_config, delay_ms).await
        }
        Command::Verify => run_verify(store, pool, &store_config).await,
        Command::Migrate { public_dir } => {
            run_migrate(store, pool, &config, store_config, public_dir).await
        }
    }
}

/// Inter-delete pacing: CLI flag > TOML `[cleanup]` > default.
fn delete_delay(config: &TomlConfig, cli_ms: Option<u64>) -> Duration {
    Duration::from_millis(
        cli_ms
            .or(config.cleanup.delete_delay_ms)
            .unwrap_or(DEFAULT_DELETE_DELAY_MS),
    )
}

async fn run_report(
    store: Arc<dyn MediaStore>,
    pool: SqlitePool,
    config: &TomlConfig,
    store_config: &MediaStoreConfig,
    json: Option<PathBuf>,
) -> Result<()> {
    let engine = Reconciler::new(
        store,
        pool,
        store_config.folder.clone(),
        store_config.page_size,
        delete_delay(config, None),
    );
    let report = engine.report().await?;

    print!("{}", report.render());

    if let Some(path) = json {
        let payload = serde_json::to_string_pretty(&report.flat_candidates())
            .context("Failed to serialize the candidate list")?;
        std::fs::write(&path, payload).map_err(|source| SweepError::ReportWrite {
            path: path.clone(),
            source,
        })?;
        info!("Candidate list written to {}", path.display());
    }

    Ok(())
}

async fn run_cleanup(
    store: Arc<dyn MediaStore>,
    pool: SqlitePool,
    config: &TomlConfig,
    store_config: &MediaStoreConfig,
    delay_ms: Option<u64>,
) -> Result<()> {
    let delay = delete_delay(config, delay_ms);
    info!("Delete pacing: {}ms between calls", delay.as_millis());

    let engine = Reconciler::new(
        store,
        pool,
        store_config.folder.clone(),
        store_config.page_size,
        delay,
    );
    let (report, summary) = engine.cleanup().await?;

    print!("{}", report.render());
    println!(
        "Cleanup finished: {} deleted, {} kept, {} errors",
        summary.deleted, summary.kept, summary.errors
    );

    if summary.errors > 0 {
        anyhow::bail!(
            "{} delete calls failed; re-run cleanup to retry",
            summary.errors
        );
    }
    Ok(())
}

async fn run_verify(
    store: Arc<dyn MediaStore>,
    pool: SqlitePool,
    store_config: &MediaStoreConfig,
) -> Result<()> {
    let refs = LiveRefScanner::new(pool).collect_references().await?;
    info!("Collected {} recorded references", refs.len());

    let verifier = UrlHealthVerifier::new(store, store_config.timeout_secs)
        .context("Failed to build the verification client")?;
    let summary = verifier.verify_all(refs).await;

    println!(
        "Verified references: {} healthy, {} missing from store, {} unknown, {} skipped",
        summary.healthy, summary.missing, summary.unknown, summary.skipped
    );
    for (reference, health) in &summary.findings {
        println!(
            "  [{}] {} {} ({}): {}",
            health.verdict, reference.collection, reference.row_id, reference.field, reference.url
        );
        if let Some(detail) = &health.detail {
            println!("      {}", detail);
        }
    }
    Ok(())
}

async fn run_migrate(
    store: Arc<dyn MediaStore>,
    pool: SqlitePool,
    config: &TomlConfig,
    store_config: MediaStoreConfig,
    public_dir: Option<PathBuf>,
) -> Result<()> {
    let public_dir = public_dir
        .or_else(|| config.public_dir.as_ref().map(PathBuf::from))
        .context("Public directory not configured (--public-dir or public_dir in the config file)")?;
    info!("Public directory: {}", public_dir.display());

    let service = MigrationService::new(store, pool, store_config, public_dir);
    let summary = service.run().await?;

    println!(
        "Migration finished: {} migrated, {} skipped, {} errors",
        summary.migrated, summary.skipped, summary.errors
    );

    if summary.errors > 0 {
        anyhow::bail!("{} items failed to migrate; re-run to retry", summary.errors);
    }
    Ok(())
}

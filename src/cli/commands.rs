//! Command handlers
//!
//! Each handler merges its flags into the loaded configuration, validates
//! the result, and drives the library API.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::app::{DirectoryStore, FlickrClient, SyncCoordinator, SyncPlan};
use crate::cli::{ConfigAction, ConfigArgs, ProgressDisplay, SourceArgs, SyncArgs};
use crate::config::AppConfig;
use crate::constants::sync;
use crate::errors::{AppError, Result};

type Coordinator = SyncCoordinator<FlickrClient, DirectoryStore>;

/// Handle the sync command
///
/// Exits with an error when any photo could not be fetched, so a scripted
/// caller can tell a partial mirror from a complete one.
pub async fn handle_sync(args: SyncArgs, mut config: AppConfig) -> Result<()> {
    args.apply(&mut config);
    let mut coordinator = build_coordinator(&config).await?;

    if args.dry_run {
        info!("Dry run: nothing will be deleted or downloaded");
        let plan = show_plan(&coordinator).await?;
        println!("Dry run: {}", summarize(&plan));
        return Ok(());
    }

    let progress = if !args.no_progress && ProgressDisplay::is_supported() {
        let (tx, rx) = mpsc::channel(sync::EVENT_BUFFER_SIZE);
        coordinator = coordinator.with_events(tx);
        Some(ProgressDisplay::spawn(rx)?)
    } else {
        None
    };

    let result = coordinator.run().await;
    if let Some(progress) = progress {
        progress.finish();
    }

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            error!("Sync failed ({}): {}", e.category(), e);
            return Err(e);
        }
    };

    println!("{}", report);
    if !report.failures.is_empty() {
        for (identifier, reason) in &report.failures {
            println!("  failed: {} ({})", identifier, reason);
        }
        return Err(AppError::generic(format!(
            "{} of {} photos could not be fetched",
            report.failures.len(),
            report.to_fetch
        )));
    }
    Ok(())
}

/// Handle the plan command
pub async fn handle_plan(args: SourceArgs, mut config: AppConfig) -> Result<()> {
    args.apply(&mut config);
    let coordinator = build_coordinator(&config).await?;

    let plan = show_plan(&coordinator).await?;
    println!("{}", summarize(&plan));
    Ok(())
}

/// Handle configuration management
pub async fn handle_config(args: ConfigArgs, config_path: Option<PathBuf>) -> Result<()> {
    match args.action {
        ConfigAction::Init { path, force } => {
            let written = AppConfig::initialize(path.or(config_path), force).await?;
            println!("Created default configuration file:");
            println!("   {}", written.display());
            println!("   Fill in [flickr] api_key, set and [sync] location before syncing.");
        }
        ConfigAction::Show => {
            let config = AppConfig::load(config_path).await?;
            match &config.source {
                Some(path) => println!("# Loaded from {}", path.display()),
                None => println!("# No configuration file found, showing defaults"),
            }
            print!("{}", config.render()?);
            if let Err(e) = config.validate() {
                warn!("Configuration is not ready for syncing: {}", e);
            }
        }
    }
    Ok(())
}

/// Validate the configuration and wire up client, store and coordinator
async fn build_coordinator(config: &AppConfig) -> Result<Coordinator> {
    config.validate()?;

    let client = FlickrClient::new(config.flickr_config()?, &config.client)?;
    let store = DirectoryStore::open(config.sync.location.clone()).await?;
    info!(
        "Mirroring photoset {} into {}",
        client.photoset_id(),
        store.root().display()
    );

    Ok(SyncCoordinator::new(
        config.sync_config(),
        Arc::new(client),
        Arc::new(store),
    ))
}

/// Compute the plan and print it, one line per file
async fn show_plan(coordinator: &Coordinator) -> Result<SyncPlan> {
    let (_, plan) = coordinator.plan().await?;
    for identifier in &plan.to_delete {
        println!("delete {}", identifier);
    }
    for descriptor in &plan.to_fetch {
        println!("fetch  {}", descriptor.identifier());
    }
    Ok(plan)
}

fn summarize(plan: &SyncPlan) -> String {
    format!(
        "{} present, {} to delete, {} to fetch",
        plan.kept,
        plan.to_delete.len(),
        plan.to_fetch.len()
    )
}

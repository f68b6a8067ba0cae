//! Photoset Mirror CLI application
//!
//! Mirrors one Flickr photoset into a local directory: stale files are
//! deleted and missing originals downloaded with bounded concurrency.

use std::process;

use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

// Import CLI modules through the library (module is public but not re-exported)
use photoset_mirror::cli::{handle_config, handle_plan, handle_sync, Cli, Commands};
use photoset_mirror::config::AppConfig;
use photoset_mirror::constants::logging;
use photoset_mirror::errors::{render_chain, Result};

#[tokio::main]
async fn main() {
    // Initialize program
    let result = run().await;

    // Handle any errors that occurred
    if let Err(e) = result {
        eprintln!("Error: {}", render_chain(&e));
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok(); // Ignore errors if file doesn't exist

    // Parse command line arguments
    let cli = Cli::parse_args();

    // The config file decides the default log level, so it is read first
    let config = AppConfig::load(cli.global.config.clone()).await;
    let configured_level = config
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| logging::DEFAULT_LOG_LEVEL.to_string());
    init_logging(&cli, &configured_level);

    info!("Photoset Mirror v{} starting", env!("CARGO_PKG_VERSION"));

    // Execute the appropriate command
    match cli.command {
        Commands::Sync(args) => {
            let config = config?;
            log_source(&config);
            handle_sync(args, config).await
        }
        Commands::Plan(args) => {
            let config = config?;
            log_source(&config);
            handle_plan(args, config).await
        }
        Commands::Config(args) => handle_config(args, cli.global.config).await,
    }
}

fn log_source(config: &AppConfig) {
    match &config.source {
        Some(path) => debug!("Using configuration from {}", path.display()),
        None => debug!("No configuration file, using defaults and flags"),
    }
}

/// Initialize logging from the CLI flags, falling back to the configured level
fn init_logging(cli: &Cli, configured_level: &str) {
    let level = cli
        .log_level()
        .map(|level| level.to_string().to_lowercase())
        .unwrap_or_else(|| configured_level.to_string());

    // Create environment filter
    let mut filter = EnvFilter::from_default_env();
    match format!("{}={}", logging::CRATE_TARGET, level).parse() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(e) => eprintln!("Ignoring log level {:?}: {}", level, e),
    }

    // Initialize subscriber
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose) // Show levels only in very verbose mode
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}

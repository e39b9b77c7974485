//! CallGuard - abuse-detection gate for phone-number lookups
//!
//! # Usage
//! ```bash
//! callguard serve --config callguard.toml
//! callguard check-config --config callguard.toml
//! callguard block +56911111111 --reason "Reported by bank" --agent OPS-7
//! callguard status +56911111111
//! callguard seed --queries 50
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use callguard_core::{normalize_phone_number, BlockEntry, BlockOutcome};
use callguard_server::{create_router, seed, AppState, CallGuardConfig, ConfigLoader, Stores};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// CallGuard - blocks phone numbers queried with too many national IDs
#[derive(Parser, Debug)]
#[command(name = "callguard")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults plus environment if omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the webhook server
    Serve,

    /// Validate configuration and exit
    CheckConfig,

    /// Manually block a phone number
    Block {
        phone_number: String,

        #[arg(long)]
        reason: String,

        #[arg(long)]
        agent: String,
    },

    /// Show the block status of a phone number
    Status { phone_number: String },

    /// Write sample block entries and queries
    Seed {
        #[arg(long, default_value = "50")]
        queries: usize,
    },
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    let config = load_config(args.config.as_ref())?;

    match args.command {
        Commands::Serve => serve(config).await,
        Commands::CheckConfig => {
            println!("{}", toml::to_string_pretty(&config.rules)?);
            tracing::info!("Configuration is valid");
            Ok(())
        }
        Commands::Block {
            phone_number,
            reason,
            agent,
        } => {
            let stores = open_stores(&config).await?;
            let phone_number = normalize_phone_number(&phone_number);
            let entry = BlockEntry::manual(&phone_number, reason, agent, Utc::now());

            match stores.blocks.block_if_absent(&entry).await? {
                BlockOutcome::Inserted => println!("✓ Blocked {}", phone_number),
                BlockOutcome::AlreadyBlocked => println!("{} is already blocked", phone_number),
            }
            Ok(())
        }
        Commands::Status { phone_number } => {
            let stores = open_stores(&config).await?;
            let phone_number = normalize_phone_number(&phone_number);

            match stores.blocks.get(&phone_number).await? {
                Some(entry) => {
                    println!("{} is BLOCKED", phone_number);
                    println!("  Reason:     {}", entry.reason);
                    println!("  Blocked at: {}", entry.blocked_at);
                    println!("  Source:     {}", entry.source);
                    println!("  Agent:      {}", entry.agent_id);
                }
                None => println!("{} is not blocked", phone_number),
            }
            Ok(())
        }
        Commands::Seed { queries } => {
            let stores = open_stores(&config).await?;
            let report = seed::seed(&stores, queries, Utc::now()).await?;
            println!(
                "✓ Seeded {} block entries ({} already present), {} queries",
                report.blocks_inserted, report.blocks_existing, report.queries_written
            );
            Ok(())
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<CallGuardConfig> {
    let loader = match path {
        Some(path) => ConfigLoader::load_file(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => ConfigLoader::from_env().context("Failed to load config from environment")?,
    };

    let config = loader.into_config();
    tracing::info!(
        unique_national_id_limit = config.rules.unique_national_id_limit,
        day_period = config.rules.day_period,
        week_period = config.rules.week_period,
        month_period = config.rules.month_period,
        backend = ?config.storage.backend,
        "Loaded configuration"
    );
    Ok(config)
}

async fn open_stores(config: &CallGuardConfig) -> Result<Stores> {
    Stores::open(&config.storage)
        .await
        .with_context(|| format!("Failed to open storage at {:?}", config.storage.data_dir))
}

async fn serve(config: CallGuardConfig) -> Result<()> {
    tracing::info!("CallGuard v{}", env!("CARGO_PKG_VERSION"));

    let stores = open_stores(&config).await?;
    let (state, worker) = AppState::start(&config, stores);
    let app = create_router(state);

    let addr: SocketAddr = config
        .server
        .bind_address()
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind_address()))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router held the last gate handle; the worker now drains and exits
    tracing::info!("Draining evaluation queue...");
    worker.join().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

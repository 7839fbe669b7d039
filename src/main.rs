//! Ops Dashboard - Main Server
//!
//! Department schedules, discussions and team availability over a hosted
//! REST backend.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use ops_dashboard::{schedule::DateRange, schedule::TeamScheduler, AppState, Config};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "ops-dashboard")]
#[command(about = "Operations dashboard server")]
struct Cli {
    /// Path to the YAML config file (defaults to ./config.yaml)
    #[arg(short, long, global = true, env = "OPS_DASHBOARD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on (overrides config and SERVER_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print a user's team schedule as JSON
    Schedule {
        /// User id
        #[arg(short, long)]
        user: Uuid,

        /// First day (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,

        /// Last day (YYYY-MM-DD), inclusive
        #[arg(long)]
        to: NaiveDate,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ops_dashboard=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_yaml_and_env(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server_port = port;
            }
            ops_dashboard::start_server(config).await
        }
        Commands::Schedule { user, from, to } => run_schedule(config, user, from, to).await,
    }
}

async fn run_schedule(config: Config, user: Uuid, from: NaiveDate, to: NaiveDate) -> Result<()> {
    let range = DateRange::new(from, to).map_err(anyhow::Error::msg)?;
    let state = AppState::new(config)?;
    let scheduler = TeamScheduler::new(state.store.clone());

    let schedule = scheduler.for_user(user, range).await;
    if !schedule.failed_sources.is_empty() {
        tracing::warn!(
            "Schedule is incomplete, failed sources: {}",
            schedule.failed_sources.join(", ")
        );
    }

    let json = serde_json::to_string_pretty(&schedule).context("Failed to serialize schedule")?;
    println!("{}", json);
    Ok(())
}

//! Agriroute planner - route planning for the agricultural delivery dashboard
//!
//! Reads orders, depots and vehicles from the dashboard backend, builds
//! closed depot routes, estimates every leg and keeps a local route history.

mod cli;
mod commands;
mod config;
mod defaults;
mod services;
mod types;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration (reads .env)
    let config = config::Config::from_env()?;

    std::fs::create_dir_all(&config.logs_dir).ok();

    // File appender for persistent logs (daily rotation)
    let file_appender = RollingFileAppender::new(Rotation::DAILY, &config.logs_dir, "agriroute.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Initialize logging - both stdout and file
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,agriroute_planner=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)) // stderr, keeps stdout for output
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false)) // file
        .init();

    info!("Backend at {}", config.api_url);
    if config.google_maps_api_key.is_none() {
        warn!("GOOGLE_MAPS_API_KEY not set, all legs will use fallback estimates");
    }

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            ctrl_c_token.cancel();
        }
    });

    let result = match cli.command {
        Command::Plan(args) => commands::plan(&config, args, cancel).await,
        Command::Stats => commands::stats(&config),
        Command::History { action } => commands::history(&config, action),
        Command::AssignDriver { route, plan, driver } => {
            commands::assign(&config, &route, plan, driver).await
        }
        Command::Solve {
            depot,
            vehicles,
            orders,
        } => commands::solve(&config, depot, &vehicles, &orders).await,
        Command::Geocode { query } => commands::geocode(&config, &query).await,
        Command::Orders { action } => commands::orders(&config, action.into()).await,
        Command::Vehicles { action } => commands::vehicles(&config, action.into()).await,
        Command::Drivers { action } => commands::drivers(&config, action.into()).await,
        Command::Depots { action } => commands::depots(&config, action.into()).await,
        Command::Analytics {
            report,
            range,
            json,
        } => commands::analytics(&config, report, range, json).await,
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}

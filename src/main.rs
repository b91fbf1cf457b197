//! On-Demand RDS Backup Utility
//!
//! Two entry points: an HTTP trigger handler that launches backup tasks on
//! ECS Fargate, and a single-shot backup worker that dumps a database,
//! streams the compressed dump to S3 and notifies the requester over SNS.

// rdsbackup/src/main.rs
mod config;
mod errors;
mod trigger;
mod worker;

use anyhow::{Context, Result};
use config::{TriggerConfig, WorkerConfig};
use std::env;
use std::process::ExitCode;

/// Main entry point for the backup utility
#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    match run_app().await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:?}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_app() -> Result<()> {
    // Load local .env if present; in a Fargate deployment the environment
    // is injected by the task definition instead.
    dotenv::dotenv().ok();

    let args: Vec<String> = env::args().collect();
    let choice = args
        .get(1)
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    match choice.as_str() {
        "serve" => {
            let trigger_config = TriggerConfig::from_env()
                .context("Failed to load trigger handler configuration from environment")?;
            trigger::run_trigger_server(trigger_config)
                .await
                .context("Trigger handler failed")?;
        }
        "run" => {
            let worker_config = WorkerConfig::from_env()
                .context("Failed to load backup worker configuration from environment")?;
            worker::run_backup_flow(&worker_config)
                .await
                .context("Backup process failed")?;
        }
        _ => {
            eprintln!("Usage: rdsbackup <serve|run>");
            eprintln!("  serve  start the HTTP trigger handler");
            eprintln!("  run    execute one backup worker pass and exit");
            anyhow::bail!("Invalid operation choice");
        }
    }
    Ok(())
}

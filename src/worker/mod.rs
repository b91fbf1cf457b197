mod logic;
pub(crate) mod dump;
pub(crate) mod endpoint;
pub(crate) mod link;
pub(crate) mod notify;
pub(crate) mod secrets;

use crate::config::WorkerConfig;
use anyhow::Result;

/// Public entry point for one backup worker pass.
/// Runs the full pipeline (credentials, port, dump+upload, signed link,
/// notification) to completion or failure, then returns.
pub async fn run_backup_flow(worker_config: &WorkerConfig) -> Result<()> {
    logic::perform_backup_orchestration(worker_config).await
}

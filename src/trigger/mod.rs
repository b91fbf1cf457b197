mod ecs_launch;
mod logic;

use crate::config::TriggerConfig;
use anyhow::Result;

/// Public entry point for the trigger handler.
/// Binds the HTTP server and serves backup-trigger requests until shutdown.
pub async fn run_trigger_server(trigger_config: TriggerConfig) -> Result<()> {
    logic::serve(trigger_config).await
}

// rdsbackup/src/trigger/logic.rs
use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, Region};
use axum::Router;
use axum::extract::{Query, State};
use axum::http::Uri;
use axum::routing::get;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::ecs_launch::{self, LaunchedTask};
use crate::config::TriggerConfig;
use crate::errors::AppError;

/// Blocking wait after RunTask before reading back the task identifier,
/// giving ECS time to materialize the task description.
const TASK_READBACK_DELAY_SECS: u64 = 5;

pub(crate) struct TriggerState {
    pub config: TriggerConfig,
    pub ecs: aws_sdk_ecs::Client,
}

pub(crate) async fn serve(trigger_config: TriggerConfig) -> Result<()> {
    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(trigger_config.region.clone()))
        .load()
        .await;

    let listen_port = trigger_config.listen_port;
    let state = Arc::new(TriggerState {
        ecs: aws_sdk_ecs::Client::new(&sdk_config),
        config: trigger_config,
    });

    let app = Router::new()
        .route("/backup", get(trigger_backup))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", listen_port))
        .await
        .with_context(|| format!("Failed to bind trigger handler to port {}", listen_port))?;
    tracing::info!("Trigger handler listening on port {}", listen_port);

    axum::serve(listener, app)
        .await
        .context("Trigger server terminated unexpectedly")?;
    Ok(())
}

/// Query parameters of the inbound trigger request. Both are optional and
/// default to empty strings; no validation is performed before they are
/// injected into the worker task.
#[derive(Debug, Deserialize)]
pub(crate) struct TriggerParams {
    #[serde(default)]
    pub hostname: String,
    #[serde(rename = "dbName", default)]
    pub db_name: String,
}

async fn trigger_backup(
    State(state): State<Arc<TriggerState>>,
    uri: Uri,
    Query(params): Query<TriggerParams>,
) -> std::result::Result<String, AppError> {
    tracing::info!(
        hostname = %params.hostname,
        db_name = %params.db_name,
        "Backup trigger request received"
    );

    let launched =
        ecs_launch::launch_backup_task(&state.ecs, &state.config, &params.db_name, &params.hostname)
            .await?;

    tokio::time::sleep(Duration::from_secs(TASK_READBACK_DELAY_SECS)).await;

    tracing::info!(task_arn = %launched.task_arn, "Backup task launched");
    Ok(acknowledgment_body(uri.path(), &launched))
}

/// Plain-text acknowledgment echoing the launched task identifier and the
/// parameters injected into the container.
fn acknowledgment_body(path: &str, launched: &LaunchedTask) -> String {
    let parameters_info = launched
        .parameters
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Container request started for {}. ECS Task is: {} with the following parameters: {}",
        path, launched.task_arn, parameters_info
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acknowledgment_body_format() {
        let launched = LaunchedTask {
            task_arn: "arn:aws:ecs:us-east-1:123456789012:task/abc".to_string(),
            parameters: vec![
                ("DB_NAME".to_string(), "sales".to_string()),
                ("HOST_NAME".to_string(), "foo.bar".to_string()),
            ],
        };
        let body = acknowledgment_body("/backup", &launched);
        assert_eq!(
            body,
            "Container request started for /backup. ECS Task is: \
             arn:aws:ecs:us-east-1:123456789012:task/abc with the following \
             parameters: DB_NAME=sales, HOST_NAME=foo.bar"
        );
    }

    #[test]
    fn test_trigger_params_default_to_empty_strings() -> anyhow::Result<()> {
        let params: TriggerParams = serde_json::from_str("{}")?;
        assert_eq!(params.hostname, "");
        assert_eq!(params.db_name, "");
        Ok(())
    }

    #[test]
    fn test_trigger_params_db_name_uses_camel_case_key() -> anyhow::Result<()> {
        let params: TriggerParams =
            serde_json::from_str(r#"{"hostname":"foo.bar","dbName":"sales"}"#)?;
        assert_eq!(params.hostname, "foo.bar");
        assert_eq!(params.db_name, "sales");
        Ok(())
    }
}

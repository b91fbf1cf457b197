// rdsbackup/src/worker/logic.rs
use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, Region, SdkConfig};
use chrono::Local;
use std::time::Instant;

use super::{dump, endpoint, link, notify, secrets};
use crate::config::{BACKUP_EXPIRATION_MINUTES, TIMESTAMP_FORMAT, WorkerConfig, ZIP_FORMAT};

/// Per-service clients built once from a shared SDK configuration and
/// injected into each pipeline step.
struct WorkerClients {
    secrets: aws_sdk_secretsmanager::Client,
    rds: aws_sdk_rds::Client,
    s3: aws_sdk_s3::Client,
    sns: aws_sdk_sns::Client,
    sts: aws_sdk_sts::Client,
}

impl WorkerClients {
    fn new(sdk_config: &SdkConfig) -> Self {
        WorkerClients {
            secrets: aws_sdk_secretsmanager::Client::new(sdk_config),
            rds: aws_sdk_rds::Client::new(sdk_config),
            s3: aws_sdk_s3::Client::new(sdk_config),
            sns: aws_sdk_sns::Client::new(sdk_config),
            sts: aws_sdk_sts::Client::new(sdk_config),
        }
    }
}

/// Short name derived from a hostname's first label; keys the secrets and
/// endpoint lookups. A hostname without dots is used whole.
pub(crate) fn instance_identifier(hostname: &str) -> &str {
    hostname.split('.').next().unwrap_or(hostname)
}

/// Deterministic artifact filename:
/// `<instance-id with '-'→'_'>_<db>_<timestamp>.gz`.
pub(crate) fn backup_filename(instance_identifier: &str, db_name: &str, timestamp: &str) -> String {
    format!(
        "{}_{}_{}.{}",
        instance_identifier.replace('-', "_"),
        db_name,
        timestamp,
        ZIP_FORMAT
    )
}

/// Runs the whole backup pipeline once. Sequential with no branching
/// parallelism: credentials, port, dump+upload, signed link, notification.
/// Any step error aborts the run; after a failed dump or a failed link no
/// notification is sent.
pub(crate) async fn perform_backup_orchestration(worker_config: &WorkerConfig) -> Result<()> {
    let started = Instant::now();
    tracing::info!("Starting backup process");

    let hostname = worker_config.host_name.as_str();
    let instance_id = instance_identifier(hostname);
    let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
    let backup_file = backup_filename(instance_id, &worker_config.db_name, &timestamp);

    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(worker_config.aws_region.clone()))
        .load()
        .await;
    let clients = WorkerClients::new(&sdk_config);
    let account_id = fetch_account_id(&clients.sts).await?;

    let credentials_name = secrets::secret_name(instance_id);
    tracing::info!("Resolving credentials [{}]", credentials_name);
    let credentials = secrets::fetch_db_credentials(&clients.secrets, &credentials_name)
        .await
        .context("Credential resolution failed; aborting before dump")?;

    tracing::info!("Resolving TCP port for [{}]", instance_id);
    let tcp_port = endpoint::resolve_tcp_port(&clients.rds, instance_id)
        .await
        .context("Endpoint resolution failed; aborting before dump")?;

    tracing::info!("Running dump pipeline, artifact [{}]", backup_file);
    dump::run_dump_pipeline(
        hostname,
        &worker_config.db_name,
        tcp_port,
        &credentials.username,
        &credentials.password,
        &backup_file,
        &worker_config.s3_bucket,
        worker_config.dump_timeout_secs,
    )
    .await
    .context("Dump pipeline failed; no link generated, no notification sent")?;

    let download_url = link::generate_download_url(
        &clients.s3,
        &worker_config.s3_bucket,
        &backup_file,
        BACKUP_EXPIRATION_MINUTES,
        &account_id,
    )
    .await
    .context("Signed URL generation failed; no notification sent")?;

    let message_id = notify::publish_backup_notification(
        &clients.sns,
        &worker_config.sns_topic_arn,
        &download_url,
        &worker_config.db_name,
        hostname,
        &worker_config.s3_bucket,
        &backup_file,
        BACKUP_EXPIRATION_MINUTES,
    )
    .await?;
    tracing::info!("Notification published, message id [{}]", message_id);
    tracing::info!("Total time spent: {} second(s)", started.elapsed().as_secs());
    Ok(())
}

async fn fetch_account_id(client: &aws_sdk_sts::Client) -> Result<String> {
    let identity = client
        .get_caller_identity()
        .send()
        .await
        .context("Failed to resolve caller identity for the expected bucket owner")?;
    identity
        .account()
        .map(str::to_string)
        .context("Caller identity response carries no account id")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_identifier_takes_first_label() {
        assert_eq!(
            instance_identifier("mydb-cluster.abc123.us-east-1.rds.amazonaws.com"),
            "mydb-cluster"
        );
        assert_eq!(instance_identifier("db.internal"), "db");
    }

    #[test]
    fn test_instance_identifier_without_dot_is_whole_hostname() {
        assert_eq!(instance_identifier("localhost"), "localhost");
        assert_eq!(instance_identifier(""), "");
    }

    #[test]
    fn test_backup_filename_replaces_hyphens_with_underscores() {
        assert_eq!(
            backup_filename("mydb-cluster", "orders", "20240115-3h05"),
            "mydb_cluster_orders_20240115-3h05.gz"
        );
    }

    #[test]
    fn test_backup_filename_plain_identifier() {
        assert_eq!(
            backup_filename("prod", "sales", "20240630-11h59"),
            "prod_sales_20240630-11h59.gz"
        );
    }

    #[test]
    fn test_end_to_end_filename_derivation() {
        // hostname → first label → hyphens to underscores → timestamped name
        let hostname = "mydb-cluster.abc123.us-east-1.rds.amazonaws.com";
        let instance_id = instance_identifier(hostname);
        assert_eq!(instance_id, "mydb-cluster");
        assert_eq!(
            backup_filename(instance_id, "orders", "20240115-3h05"),
            "mydb_cluster_orders_20240115-3h05.gz"
        );
    }

    #[test]
    fn test_timestamp_format_is_twelve_hour_clock() {
        use chrono::TimeZone;
        let moment = chrono::Utc.with_ymd_and_hms(2024, 1, 15, 15, 5, 0).unwrap();
        assert_eq!(
            moment.format(TIMESTAMP_FORMAT).to_string(),
            "20240115-03h05"
        );
    }
}

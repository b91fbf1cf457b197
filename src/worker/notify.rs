// rdsbackup/src/worker/notify.rs
use aws_sdk_sns::error::DisplayErrorContext;

use crate::errors::AppError;

pub(crate) fn compose_subject(database_name: &str) -> String {
    format!("Your backup request for [{}] has completed!", database_name)
}

/// Fixed-format notification body. The URL appears twice: once inline and
/// once bracketed on its own line for mail clients that mangle long links.
pub(crate) fn compose_message(
    url: &str,
    database_name: &str,
    instance_identifier: &str,
    s3_bucket: &str,
    object_name: &str,
    backup_expiration_minutes: u64,
) -> String {
    format!(
        "The URL will be valid for {} minutes\n\
         Instance Identifier: {}\n\
         Database Name: {}\n\
         S3 Bucket: {}\n\
         Object Name: {}\n\
         Download URL: {} \n\n\
         If the link does not work for you, please copy this link into your browser without the [].\n\
         [{}]",
        backup_expiration_minutes,
        instance_identifier,
        database_name,
        s3_bucket,
        object_name,
        url,
        url
    )
}

/// Publishes the success notification to the configured topic and returns
/// the message id of the publish acknowledgment.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn publish_backup_notification(
    client: &aws_sdk_sns::Client,
    sns_topic_arn: &str,
    url: &str,
    database_name: &str,
    instance_identifier: &str,
    s3_bucket: &str,
    object_name: &str,
    backup_expiration_minutes: u64,
) -> Result<String, AppError> {
    tracing::info!("Publishing SNS message for [{}]", database_name);

    let response = client
        .publish()
        .topic_arn(sns_topic_arn)
        .subject(compose_subject(database_name))
        .message(compose_message(
            url,
            database_name,
            instance_identifier,
            s3_bucket,
            object_name,
            backup_expiration_minutes,
        ))
        .send()
        .await
        .map_err(|e| AppError::Publish {
            topic: sns_topic_arn.to_string(),
            message: format!("{}", DisplayErrorContext(e)),
        })?;

    Ok(response.message_id().unwrap_or_default().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_subject_names_the_database() {
        assert_eq!(
            compose_subject("orders"),
            "Your backup request for [orders] has completed!"
        );
    }

    #[test]
    fn test_compose_message_embeds_every_field() {
        let message = compose_message(
            "https://example.com/signed",
            "orders",
            "mydb-cluster.abc123.us-east-1.rds.amazonaws.com",
            "my-backup-bucket",
            "mydb_cluster_orders_20240115-3h05.gz",
            60,
        );
        assert!(message.starts_with("The URL will be valid for 60 minutes\n"));
        assert!(message.contains(
            "Instance Identifier: mydb-cluster.abc123.us-east-1.rds.amazonaws.com\n"
        ));
        assert!(message.contains("Database Name: orders\n"));
        assert!(message.contains("S3 Bucket: my-backup-bucket\n"));
        assert!(message.contains("Object Name: mydb_cluster_orders_20240115-3h05.gz\n"));
        assert!(message.contains("Download URL: https://example.com/signed \n"));
        assert!(message.ends_with("[https://example.com/signed]"));
    }
}

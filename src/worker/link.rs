// rdsbackup/src/worker/link.rs
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use std::time::Duration;

use crate::errors::AppError;

pub(crate) fn expiration_seconds(expiration_minutes: u64) -> u64 {
    60 * expiration_minutes
}

/// Generates a signed, time-limited download URL scoped to a single object
/// and the expected bucket owner. Generated once per run, never renewed.
pub(crate) async fn generate_download_url(
    client: &aws_sdk_s3::Client,
    s3_bucket: &str,
    object_name: &str,
    expiration_minutes: u64,
    aws_account_id: &str,
) -> Result<String, AppError> {
    tracing::info!("Trying to generate signed url for [{}]", object_name);

    let presigning_config = PresigningConfig::builder()
        .expires_in(Duration::from_secs(expiration_seconds(expiration_minutes)))
        .build()
        .map_err(|e| AppError::Presign {
            key: object_name.to_string(),
            message: e.to_string(),
        })?;

    let presigned = client
        .get_object()
        .bucket(s3_bucket)
        .key(object_name)
        .expected_bucket_owner(aws_account_id)
        .presigned(presigning_config)
        .await
        .map_err(|e| AppError::Presign {
            key: object_name.to_string(),
            message: format!("{}", DisplayErrorContext(e)),
        })?;

    tracing::info!("Signed url generated for [{}]", object_name);
    Ok(presigned.uri().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiration_converts_minutes_to_seconds() {
        assert_eq!(expiration_seconds(60), 3600);
        assert_eq!(expiration_seconds(1), 60);
        assert_eq!(expiration_seconds(0), 0);
    }
}

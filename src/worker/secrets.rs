// rdsbackup/src/worker/secrets.rs
use aws_sdk_secretsmanager::error::{DisplayErrorContext, ProvideErrorMetadata};
use serde::Deserialize;

use crate::errors::{AppError, LookupErrorKind};

/// Naming template for per-instance backup credentials in Secrets Manager.
const SECRET_NAME_SCHEMA: &str = "backup/{}/user";

/// Database credentials fetched fresh per run; never cached or written to
/// disk, scoped to the lifetime of one dump invocation.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DbCredentials {
    pub username: String,
    pub password: String,
}

/// Substitutes the instance identifier into the secret naming template.
pub(crate) fn secret_name(instance_identifier: &str) -> String {
    SECRET_NAME_SCHEMA.replacen("{}", instance_identifier, 1)
}

/// Fetches and parses the credentials secret. The payload must be a string
/// secret holding a `{"username": ..., "password": ...}` document; a
/// binary-only payload is an explicit unsupported-format error rather than
/// raw bytes handed to the dump command.
pub(crate) async fn fetch_db_credentials(
    client: &aws_sdk_secretsmanager::Client,
    secret_name: &str,
) -> Result<DbCredentials, AppError> {
    tracing::info!("Getting secret [{}]", secret_name);

    let response = client
        .get_secret_value()
        .secret_id(secret_name)
        .send()
        .await
        .map_err(|e| {
            let kind = LookupErrorKind::from_code(e.code());
            AppError::Secrets {
                name: secret_name.to_string(),
                kind,
                message: format!("{}", DisplayErrorContext(e)),
            }
        })?;

    match response.secret_string() {
        Some(payload) => {
            serde_json::from_str(payload).map_err(|e| AppError::Secrets {
                name: secret_name.to_string(),
                kind: LookupErrorKind::Unknown,
                message: format!("secret payload is not a username/password document: {}", e),
            })
        }
        None => Err(AppError::UnsupportedSecretFormat(secret_name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_name_substitutes_instance_identifier() {
        assert_eq!(secret_name("mydb-cluster"), "backup/mydb-cluster/user");
        assert_eq!(secret_name("prod"), "backup/prod/user");
    }

    #[test]
    fn test_credentials_parse_from_secret_payload() -> anyhow::Result<()> {
        let payload = r#"{"username":"backup_user","password":"s3cret"}"#;
        let credentials: DbCredentials = serde_json::from_str(payload)?;
        assert_eq!(credentials.username, "backup_user");
        assert_eq!(credentials.password, "s3cret");
        Ok(())
    }

    #[test]
    fn test_credentials_reject_payload_without_password() {
        let payload = r#"{"username":"backup_user"}"#;
        assert!(serde_json::from_str::<DbCredentials>(payload).is_err());
    }
}

// rdsbackup/src/config/mod.rs
use anyhow::{Context, Result};
use std::env;

/// File extension of the compressed dump artifact.
pub const ZIP_FORMAT: &str = "gz";

/// Timestamp component of the artifact filename (e.g. `20240115-03h05`).
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%Ih%M";

/// How long the signed download link stays valid.
pub const BACKUP_EXPIRATION_MINUTES: u64 = 60;

const DEFAULT_TRIGGER_PORT: u16 = 8080;
const DEFAULT_DUMP_TIMEOUT_SECS: u64 = 3600;

/// Configuration for the HTTP trigger handler (`serve`).
#[derive(Debug, Clone)]
pub struct TriggerConfig {
    pub region: String,
    pub ecs_cluster: String,
    pub task_definition: String,
    pub container_name: String,
    pub security_group_id: String,
    pub subnets: Vec<String>,
    pub listen_port: u16,
}

/// Configuration for one backup worker pass (`run`).
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub aws_region: String,
    pub s3_bucket: String,
    pub sns_topic_arn: String,
    pub db_name: String,
    pub host_name: String,
    pub dump_timeout_secs: u64,
}

impl TriggerConfig {
    pub fn from_env() -> Result<Self> {
        Ok(TriggerConfig {
            region: require_env("REGION")?,
            ecs_cluster: require_env("ECS_CLUSTER")?,
            task_definition: require_env("ECS_TASK_DEFINITION")?,
            container_name: require_env("ECS_TASK_CONTAINER_NAME")?,
            security_group_id: require_env("SECURITY_GROUP_ID")?,
            subnets: parse_subnet_list(&require_env("ECS_SUBNETS")?)?,
            listen_port: parse_listen_port(env::var("TRIGGER_PORT").ok().as_deref())?,
        })
    }
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self> {
        Ok(WorkerConfig {
            aws_region: require_env("AWS_REGION")?,
            s3_bucket: require_env("S3_BUCKET")?,
            sns_topic_arn: require_env("SNS_TOPIC_ARN")?,
            db_name: require_env("DB_NAME")?,
            host_name: require_env("HOST_NAME")?,
            dump_timeout_secs: parse_dump_timeout(env::var("DUMP_TIMEOUT_SECS").ok().as_deref())?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{} must be set", key))
}

/// Parses the comma-separated subnet list from `ECS_SUBNETS`.
fn parse_subnet_list(raw: &str) -> Result<Vec<String>> {
    let subnets: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if subnets.is_empty() {
        anyhow::bail!("ECS_SUBNETS must contain at least one subnet id");
    }
    Ok(subnets)
}

fn parse_listen_port(raw: Option<&str>) -> Result<u16> {
    match raw {
        Some(value) => value
            .trim()
            .parse::<u16>()
            .with_context(|| format!("TRIGGER_PORT is not a valid port: {}", value)),
        None => Ok(DEFAULT_TRIGGER_PORT),
    }
}

fn parse_dump_timeout(raw: Option<&str>) -> Result<u64> {
    match raw {
        Some(value) => value
            .trim()
            .parse::<u64>()
            .with_context(|| format!("DUMP_TIMEOUT_SECS is not a valid duration: {}", value)),
        None => Ok(DEFAULT_DUMP_TIMEOUT_SECS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subnet_list_single() -> anyhow::Result<()> {
        let result = parse_subnet_list("subnet-0abc123")?;
        assert_eq!(result, vec!["subnet-0abc123".to_string()]);
        Ok(())
    }

    #[test]
    fn test_parse_subnet_list_multiple_with_whitespace() -> anyhow::Result<()> {
        let result = parse_subnet_list("subnet-0abc123, subnet-0def456 ,subnet-0ghi789")?;
        assert_eq!(
            result,
            vec![
                "subnet-0abc123".to_string(),
                "subnet-0def456".to_string(),
                "subnet-0ghi789".to_string()
            ]
        );
        Ok(())
    }

    #[test]
    fn test_parse_subnet_list_drops_empty_entries() -> anyhow::Result<()> {
        let result = parse_subnet_list("subnet-0abc123,,subnet-0def456,")?;
        assert_eq!(result.len(), 2);
        Ok(())
    }

    #[test]
    fn test_parse_subnet_list_rejects_empty_input() {
        assert!(parse_subnet_list("").is_err());
        assert!(parse_subnet_list(" , ,").is_err());
    }

    #[test]
    fn test_parse_listen_port_default_and_explicit() -> anyhow::Result<()> {
        assert_eq!(parse_listen_port(None)?, DEFAULT_TRIGGER_PORT);
        assert_eq!(parse_listen_port(Some("9090"))?, 9090);
        assert!(parse_listen_port(Some("not-a-port")).is_err());
        Ok(())
    }

    #[test]
    fn test_parse_dump_timeout_default_and_explicit() -> anyhow::Result<()> {
        assert_eq!(parse_dump_timeout(None)?, DEFAULT_DUMP_TIMEOUT_SECS);
        assert_eq!(parse_dump_timeout(Some("600"))?, 600);
        assert!(parse_dump_timeout(Some("soon")).is_err());
        Ok(())
    }
}

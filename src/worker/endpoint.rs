// rdsbackup/src/worker/endpoint.rs
use aws_sdk_rds::error::{DisplayErrorContext, ProvideErrorMetadata};

use crate::errors::{AppError, LookupErrorKind};

/// Decision for a failed cluster lookup. Only the specific
/// cluster-not-found fault falls back to the single-instance lookup;
/// every other error class fails the resolution.
#[derive(Debug, PartialEq, Eq)]
enum ClusterLookupFallback {
    TryInstance,
    Fail(LookupErrorKind),
}

fn cluster_lookup_fallback(
    is_cluster_not_found: bool,
    code: Option<&str>,
) -> ClusterLookupFallback {
    if is_cluster_not_found {
        ClusterLookupFallback::TryInstance
    } else {
        ClusterLookupFallback::Fail(LookupErrorKind::from_code(code))
    }
}

/// Resolves the TCP port a database listens on, given its instance
/// identifier. Tries the identifier as a cluster first; if the cluster
/// lookup reports `DBClusterNotFoundFault` specifically, falls back to a
/// single-instance lookup. Any other error class aborts the resolution.
pub(crate) async fn resolve_tcp_port(
    client: &aws_sdk_rds::Client,
    instance_identifier: &str,
) -> Result<i32, AppError> {
    match client
        .describe_db_clusters()
        .db_cluster_identifier(instance_identifier)
        .send()
        .await
    {
        Ok(response) => {
            let cluster = response.db_clusters().first().ok_or_else(|| {
                endpoint_error(
                    instance_identifier,
                    LookupErrorKind::NotFound,
                    "cluster lookup returned no clusters",
                )
            })?;
            tracing::info!(
                "Cluster [{}] found",
                cluster.db_cluster_identifier().unwrap_or(instance_identifier)
            );
            cluster.port().ok_or_else(|| {
                endpoint_error(
                    instance_identifier,
                    LookupErrorKind::Unknown,
                    "cluster description carries no port",
                )
            })
        }
        Err(err) => {
            let is_cluster_not_found = err
                .as_service_error()
                .is_some_and(|e| e.is_db_cluster_not_found_fault());
            match cluster_lookup_fallback(is_cluster_not_found, err.code()) {
                ClusterLookupFallback::TryInstance => {
                    resolve_instance_port(client, instance_identifier).await
                }
                ClusterLookupFallback::Fail(kind) => Err(endpoint_error(
                    instance_identifier,
                    kind,
                    format!("{}", DisplayErrorContext(err)),
                )),
            }
        }
    }
}

async fn resolve_instance_port(
    client: &aws_sdk_rds::Client,
    instance_identifier: &str,
) -> Result<i32, AppError> {
    let response = client
        .describe_db_instances()
        .db_instance_identifier(instance_identifier)
        .send()
        .await
        .map_err(|e| {
            let kind = LookupErrorKind::from_code(e.code());
            endpoint_error(instance_identifier, kind, format!("{}", DisplayErrorContext(e)))
        })?;

    let instance = response.db_instances().first().ok_or_else(|| {
        endpoint_error(
            instance_identifier,
            LookupErrorKind::NotFound,
            "instance lookup returned no instances",
        )
    })?;
    tracing::info!(
        "Instance [{}] found",
        instance.db_instance_identifier().unwrap_or(instance_identifier)
    );

    instance
        .endpoint()
        .and_then(|endpoint| endpoint.port())
        .ok_or_else(|| {
            endpoint_error(
                instance_identifier,
                LookupErrorKind::Unknown,
                "instance description carries no endpoint port",
            )
        })
}

fn endpoint_error(
    identifier: &str,
    kind: LookupErrorKind,
    message: impl Into<String>,
) -> AppError {
    AppError::Endpoint {
        identifier: identifier.to_string(),
        kind,
        message: message.into(),
    }
}

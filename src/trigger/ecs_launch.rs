// rdsbackup/src/trigger/ecs_launch.rs
use aws_sdk_ecs::error::DisplayErrorContext;
use aws_sdk_ecs::types::{
    AssignPublicIp, AwsVpcConfiguration, ContainerOverride, KeyValuePair, LaunchType,
    NetworkConfiguration, TaskOverride,
};

use crate::config::TriggerConfig;
use crate::errors::AppError;

/// Identifier and injected parameters of a launched backup task, read back
/// from the RunTask response.
pub(crate) struct LaunchedTask {
    pub task_arn: String,
    pub parameters: Vec<(String, String)>,
}

/// Environment overrides injected into the worker container. The names are
/// the worker's configuration contract and must not change.
pub(crate) fn override_environment(db_name: &str, host_name: &str) -> Vec<(String, String)> {
    vec![
        ("DB_NAME".to_string(), db_name.to_string()),
        ("HOST_NAME".to_string(), host_name.to_string()),
    ]
}

/// Launches exactly one backup worker task on Fargate with the given
/// database name and hostname injected as container environment overrides.
/// Every invocation launches a fresh task; there is no idempotency key.
pub(crate) async fn launch_backup_task(
    ecs: &aws_sdk_ecs::Client,
    config: &TriggerConfig,
    db_name: &str,
    host_name: &str,
) -> Result<LaunchedTask, AppError> {
    let environment = override_environment(db_name, host_name);

    let mut container_override = ContainerOverride::builder().name(&config.container_name);
    for (name, value) in &environment {
        container_override =
            container_override.environment(KeyValuePair::builder().name(name).value(value).build());
    }

    let vpc_configuration = AwsVpcConfiguration::builder()
        .set_subnets(Some(config.subnets.clone()))
        .security_groups(&config.security_group_id)
        .assign_public_ip(AssignPublicIp::Disabled)
        .build()
        .map_err(|e| AppError::TaskLaunch(e.to_string()))?;

    let response = ecs
        .run_task()
        .cluster(&config.ecs_cluster)
        .launch_type(LaunchType::Fargate)
        .task_definition(&config.task_definition)
        .count(1)
        .platform_version("LATEST")
        .network_configuration(
            NetworkConfiguration::builder()
                .awsvpc_configuration(vpc_configuration)
                .build(),
        )
        .overrides(
            TaskOverride::builder()
                .container_overrides(container_override.build())
                .build(),
        )
        .send()
        .await
        .map_err(|e| AppError::TaskLaunch(format!("{}", DisplayErrorContext(e))))?;

    let task = response
        .tasks()
        .first()
        .ok_or_else(|| AppError::TaskLaunch("RunTask response contained no tasks".to_string()))?;

    let task_arn = task.task_arn().unwrap_or_default().to_string();
    let parameters = task
        .overrides()
        .and_then(|o| o.container_overrides().first())
        .map(|c| {
            c.environment()
                .iter()
                .filter_map(|kv| Some((kv.name()?.to_string(), kv.value()?.to_string())))
                .collect()
        })
        .unwrap_or(environment);

    Ok(LaunchedTask {
        task_arn,
        parameters,
    })
}

// rdsbackup/src/worker/dump.rs
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::timeout;
use which::which;

use crate::errors::AppError;

/// Outcome of the dump pipeline process. The error stream counts: a clean
/// exit with stderr output is still a failure, because any stage of the
/// pipeline may have complained while the shell reported the last stage's
/// status.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum DumpOutcome {
    Success,
    Failed,
}

pub(crate) fn dump_outcome(exited_cleanly: bool, stderr: &str) -> DumpOutcome {
    if exited_cleanly && stderr.is_empty() {
        DumpOutcome::Success
    } else {
        DumpOutcome::Failed
    }
}

/// Builds the dump pipeline: dump the database, compress the stream, and
/// stream the result straight to S3 under the infrequent-access storage
/// class. No staging to local disk, so local storage limits never apply.
/// The string embeds the password and must never be logged.
pub(crate) fn build_dump_command(
    db_host: &str,
    db_name: &str,
    tcp_port: i32,
    db_user: &str,
    db_password: &str,
    backup_file: &str,
    s3_bucket: &str,
) -> String {
    format!(
        "mysqldump -h {} -u {} -P {} --quick --no-tablespaces -p{} {} | gzip -c | \
         aws s3 cp - s3://{}/{} --storage-class STANDARD_IA",
        db_host, db_user, tcp_port, db_password, db_name, s3_bucket, backup_file
    )
}

fn find_pipeline_tools() -> Result<(), AppError> {
    for tool in ["mysqldump", "gzip", "aws"] {
        which(tool).map_err(|_| {
            AppError::Config(format!(
                "{} executable not found in PATH; required by the dump pipeline",
                tool
            ))
        })?;
    }
    Ok(())
}

/// Spawns the dump pipeline and awaits it under a bounded timeout.
/// Non-zero exit or any stderr output fails the run; on timeout the process
/// is killed. A stream interrupted mid-upload may leave a partial object in
/// the bucket; no cleanup is attempted.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn run_dump_pipeline(
    db_host: &str,
    db_name: &str,
    tcp_port: i32,
    db_user: &str,
    db_password: &str,
    backup_file: &str,
    s3_bucket: &str,
    timeout_secs: u64,
) -> Result<(), AppError> {
    find_pipeline_tools()?;

    tracing::info!(
        "Building mysqldump command for [{}] at [{}:{}]",
        db_name,
        db_host,
        tcp_port
    );
    let command = build_dump_command(
        db_host,
        db_name,
        tcp_port,
        db_user,
        db_password,
        backup_file,
        s3_bucket,
    );

    let mut child = Command::new("sh")
        .arg("-c")
        .arg(&command)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()?;

    // Drain stderr concurrently so a chatty pipeline cannot fill the pipe
    // buffer and deadlock against wait().
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| AppError::Config("dump process stderr was not captured".to_string()))?;
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        let _ = stderr_pipe.read_to_end(&mut buf).await;
        String::from_utf8_lossy(&buf).into_owned()
    });

    let status = match timeout(Duration::from_secs(timeout_secs), child.wait()).await {
        Ok(status) => status?,
        Err(_) => {
            child.kill().await.ok();
            return Err(AppError::DumpTimeout(timeout_secs));
        }
    };
    let stderr_output = stderr_task.await.unwrap_or_default();

    match dump_outcome(status.success(), &stderr_output) {
        DumpOutcome::Success => {
            tracing::info!("mysqldump has completed successfully for [{}]", db_name);
            Ok(())
        }
        DumpOutcome::Failed => Err(AppError::DumpFailed {
            status: status.to_string(),
            stderr: stderr_output,
        }),
    }
}

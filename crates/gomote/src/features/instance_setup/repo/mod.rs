use async_trait::async_trait;
use gomote_core::InstanceId;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use thiserror::Error;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("failed to resolve GOROOT: {0}")]
    SourceRoot(String),
    #[error("failed to start {op}: {source}")]
    Spawn {
        op: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("{op} on {instance} failed: {detail}")]
    Failed {
        op: &'static str,
        instance: String,
        detail: String,
    },
    #[error("{op} on {instance} cancelled")]
    Cancelled { op: &'static str, instance: String },
    #[error("setup I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Transfer and execute primitives used to prepare a fresh instance.
#[async_trait]
pub trait InstanceSetupRepository: Send + Sync {
    /// Copy `source_root` onto the instance
    async fn push(
        &self,
        token: &CancellationToken,
        instance: &InstanceId,
        source_root: &Path,
        detailed_progress: bool,
    ) -> Result<(), SetupError>;

    /// Run `command` with `args` on the instance
    async fn run(
        &self,
        token: &CancellationToken,
        instance: &InstanceId,
        output_dir: &Path,
        command: &str,
        args: &[String],
        detailed_progress: bool,
    ) -> Result<(), SetupError>;
}

/// Locates the source tree pushed during setup.
#[async_trait]
pub trait SourceRootResolver: Send + Sync {
    async fn resolve(&self) -> Result<PathBuf, SetupError>;
}

/// The configured `GOROOT`, falling back to `go env GOROOT`.
#[derive(Debug, Clone, Default)]
pub struct GorootResolver {
    configured: Option<PathBuf>,
}

impl GorootResolver {
    pub fn new(configured: Option<PathBuf>) -> Self {
        Self { configured }
    }
}

#[async_trait]
impl SourceRootResolver for GorootResolver {
    async fn resolve(&self) -> Result<PathBuf, SetupError> {
        if let Some(goroot) = &self.configured {
            return Ok(goroot.clone());
        }

        let output = Command::new("go")
            .args(["env", "GOROOT"])
            .output()
            .await
            .map_err(|e| SetupError::SourceRoot(format!("failed to run 'go env GOROOT': {e}")))?;
        if !output.status.success() {
            return Err(SetupError::SourceRoot(format!(
                "'go env GOROOT' exited with {}",
                output.status
            )));
        }

        let goroot = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if goroot.is_empty() {
            return Err(SetupError::SourceRoot(
                "'go env GOROOT' returned an empty path".to_string(),
            ));
        }
        Ok(PathBuf::from(goroot))
    }
}

/// Delegates push and run to the `gomote` executable.
///
/// With detailed progress the child shares this process's terminal. Otherwise
/// its output is captured; run output is also saved under the output directory
/// as `<instance>.log`.
#[derive(Debug, Clone)]
pub struct ProcessSetupRepository {
    gomote_bin: PathBuf,
}

impl ProcessSetupRepository {
    pub fn new(gomote_bin: impl Into<PathBuf>) -> Self {
        Self {
            gomote_bin: gomote_bin.into(),
        }
    }

    async fn execute(
        &self,
        token: &CancellationToken,
        mut command: Command,
        op: &'static str,
        instance: &InstanceId,
        detailed_progress: bool,
        log_path: Option<PathBuf>,
    ) -> Result<(), SetupError> {
        command.kill_on_drop(true).stdin(Stdio::null());
        if detailed_progress {
            command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        } else {
            command.stdout(Stdio::piped()).stderr(Stdio::piped());
        }

        debug!(op, instance_id = %instance, "Spawning setup command");
        let mut child = command
            .spawn()
            .map_err(|source| SetupError::Spawn { op, source })?;

        let cancelled = || SetupError::Cancelled {
            op,
            instance: instance.to_string(),
        };

        if detailed_progress {
            let status = tokio::select! {
                _ = token.cancelled() => return Err(cancelled()),
                status = child.wait() => status?,
            };
            return check_status(op, instance, status, None);
        }

        // Dropping the output future drops the child, which kills it.
        let output = tokio::select! {
            _ = token.cancelled() => return Err(cancelled()),
            output = child.wait_with_output() => output?,
        };

        if let Some(path) = &log_path {
            let mut log = output.stdout.clone();
            log.extend_from_slice(&output.stderr);
            tokio::fs::write(path, log).await?;
        }

        let tail = String::from_utf8_lossy(&output.stderr);
        let tail = tail.lines().rev().take(5).collect::<Vec<_>>();
        let tail = tail.into_iter().rev().collect::<Vec<_>>().join("\n");
        check_status(op, instance, output.status, Some((tail, log_path)))
    }
}

fn check_status(
    op: &'static str,
    instance: &InstanceId,
    status: ExitStatus,
    captured: Option<(String, Option<PathBuf>)>,
) -> Result<(), SetupError> {
    if status.success() {
        return Ok(());
    }

    let mut detail = status.to_string();
    if let Some((tail, log_path)) = captured {
        if let Some(path) = log_path {
            detail.push_str(&format!(" (output saved to {})", path.display()));
        }
        if !tail.is_empty() {
            detail.push('\n');
            detail.push_str(&tail);
        }
    }

    Err(SetupError::Failed {
        op,
        instance: instance.to_string(),
        detail,
    })
}

#[async_trait]
impl InstanceSetupRepository for ProcessSetupRepository {
    async fn push(
        &self,
        token: &CancellationToken,
        instance: &InstanceId,
        source_root: &Path,
        detailed_progress: bool,
    ) -> Result<(), SetupError> {
        let mut command = Command::new(&self.gomote_bin);
        command
            .arg("push")
            .arg(instance.as_str())
            .env("GOROOT", source_root);
        self.execute(token, command, "push", instance, detailed_progress, None)
            .await
    }

    async fn run(
        &self,
        token: &CancellationToken,
        instance: &InstanceId,
        output_dir: &Path,
        command: &str,
        args: &[String],
        detailed_progress: bool,
    ) -> Result<(), SetupError> {
        let mut cmd = Command::new(&self.gomote_bin);
        cmd.arg("run").arg(instance.as_str()).arg(command).args(args);
        let log_path = output_dir.join(format!("{instance}.log"));
        self.execute(token, cmd, "run", instance, detailed_progress, Some(log_path))
            .await
    }
}

use crate::features::instance_setup::repo::{
    InstanceSetupRepository, SetupError, SourceRootResolver,
};
use crate::shared::console::Console;
use gomote_core::{build_script_for, InstanceId};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

/// Pushes a source tree to a fresh instance and runs its build script.
pub struct SetupService {
    repo: Arc<dyn InstanceSetupRepository>,
    resolver: Arc<dyn SourceRootResolver>,
    console: Console,
}

impl SetupService {
    pub fn new(
        repo: Arc<dyn InstanceSetupRepository>,
        resolver: Arc<dyn SourceRootResolver>,
        console: Console,
    ) -> Self {
        Self {
            repo,
            resolver,
            console,
        }
    }

    /// Creates a fresh directory for captured setup output.
    pub async fn prepare_output_dir(&self) -> std::io::Result<PathBuf> {
        let dir = std::env::temp_dir().join(format!("gomote-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await?;
        info!(dir = %dir.display(), "Created setup output directory");
        Ok(dir)
    }

    pub async fn setup_instance(
        &self,
        token: &CancellationToken,
        instance: &InstanceId,
        builder_type: &str,
        output_dir: &Path,
        detailed_progress: bool,
    ) -> Result<(), SetupError> {
        let source_root = self.resolver.resolve().await?;

        if !detailed_progress {
            self.console.status(format!(
                "# Pushing GOROOT {:?} to {:?}...",
                source_root.display().to_string(),
                instance.as_str()
            ));
        }
        self.repo
            .push(token, instance, &source_root, detailed_progress)
            .await?;

        let script = build_script_for(builder_type);
        if !detailed_progress {
            self.console.status(format!(
                "# Running {:?} on {:?}...",
                script,
                instance.as_str()
            ));
        }
        self.repo
            .run(token, instance, output_dir, script, &[], detailed_progress)
            .await?;

        debug!(instance_id = %instance, builder_type, "Instance setup finished");
        Ok(())
    }
}

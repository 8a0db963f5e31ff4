use crate::features::groups::repo::{GroupError, GroupStore};
use crate::features::instance_creation::repo::{ProvisioningError, ProvisioningRepository};
use crate::features::instance_setup::repo::SetupError;
use crate::features::instance_setup::service::SetupService;
use crate::shared::console::{format_elapsed, Console};
use crate::shared::types::{CreateOptions, CreateOutcome, GroupCommitPolicy};
use futures::StreamExt;
use gomote_core::{CoreError, CreationRequest, CreationUpdate, Group, InstanceId};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Failure of a multi-instance create. Per-task variants carry the 1-based
/// ordinal of the request that failed.
#[derive(Debug, Error)]
pub enum CreateError {
    #[error("count must be at least 1, got {0}")]
    InvalidCount(usize),
    #[error("invalid create request: {0}")]
    InvalidRequest(#[from] CoreError),
    #[error(transparent)]
    Connect(ProvisioningError),
    #[error("creating setup output directory: {0}")]
    SetupOutputDir(#[source] std::io::Error),
    #[error(
        "failed to create buildlet ({index}) of type {builder_type} after {}: {source}",
        elapsed_text(.elapsed)
    )]
    Rpc {
        index: usize,
        builder_type: String,
        elapsed: Duration,
        #[source]
        source: ProvisioningError,
    },
    #[error("buildlet ({index}) creation stream ended without an instance")]
    StreamEndedWithoutInstance { index: usize },
    #[error("buildlet ({index}) creation cancelled")]
    Cancelled { index: usize },
    #[error("setting up buildlet ({index}) {instance}: {source}")]
    Setup {
        index: usize,
        instance: InstanceId,
        #[source]
        source: SetupError,
    },
    #[error("creation task panicked: {0}")]
    TaskPanicked(String),
    #[error("saving group: {0}")]
    Persist(#[source] GroupError),
}

fn elapsed_text(elapsed: &Duration) -> String {
    format_elapsed(*elapsed)
}

impl CreateError {
    fn is_cancellation(&self) -> bool {
        matches!(
            self,
            CreateError::Cancelled { .. }
                | CreateError::Setup {
                    source: SetupError::Cancelled { .. },
                    ..
                }
        )
    }
}

/// Everything a single creation task needs, shared by all tasks of one call.
struct TaskContext {
    builder_type: String,
    show_status: bool,
    detailed_progress: bool,
    setup_output: Option<PathBuf>,
    provisioning: Arc<dyn ProvisioningRepository>,
    setup: Arc<SetupService>,
    console: Console,
    token: CancellationToken,
    created: mpsc::UnboundedSender<InstanceId>,
}

/// Creates instances concurrently and records them into a group.
pub struct CreateService {
    provisioning: Arc<dyn ProvisioningRepository>,
    setup: Arc<SetupService>,
    group_store: Arc<dyn GroupStore>,
    console: Console,
}

impl CreateService {
    pub fn new(
        provisioning: Arc<dyn ProvisioningRepository>,
        setup: Arc<SetupService>,
        group_store: Arc<dyn GroupStore>,
        console: Console,
    ) -> Self {
        Self {
            provisioning,
            setup,
            group_store,
            console,
        }
    }

    /// Issues `options.count` creation requests in parallel.
    ///
    /// Every task runs to completion before this returns. The first task
    /// failure cancels the others and is the error returned; instances
    /// created before that point are not deprovisioned. The group, if any,
    /// is persisted once afterwards according to `options.commit_policy`.
    pub async fn create(
        &self,
        options: CreateOptions,
        group: Option<Group>,
    ) -> Result<CreateOutcome, CreateError> {
        if options.count == 0 {
            return Err(CreateError::InvalidCount(options.count));
        }
        CreationRequest::new(options.builder_type.as_str())?;

        let setup_output = if options.setup {
            Some(
                self.setup
                    .prepare_output_dir()
                    .await
                    .map_err(CreateError::SetupOutputDir)?,
            )
        } else {
            None
        };

        info!(
            builder_type = %options.builder_type,
            count = options.count,
            setup = options.setup,
            group = group.as_ref().map(|g| g.name.as_str()).unwrap_or(""),
            "Creating instances"
        );

        let token = CancellationToken::new();
        let (created_tx, created_rx) = mpsc::unbounded_channel();
        let recorder = tokio::spawn(record_instances(
            created_rx,
            group,
            self.console.clone(),
        ));

        let context = Arc::new(TaskContext {
            builder_type: options.builder_type.clone(),
            show_status: options.show_status,
            detailed_progress: options.detailed_progress(),
            setup_output,
            provisioning: Arc::clone(&self.provisioning),
            setup: Arc::clone(&self.setup),
            console: self.console.clone(),
            token: token.clone(),
            created: created_tx,
        });

        let mut tasks = JoinSet::new();
        for index in 1..=options.count {
            let context = Arc::clone(&context);
            tasks.spawn(async move {
                let result = create_one(&context, index).await;
                if result.is_err() {
                    context.token.cancel();
                }
                result
            });
        }
        // The recorder finishes once every task has dropped its sender.
        drop(context);

        let mut first_error: Option<CreateError> = None;
        while let Some(joined) = tasks.join_next().await {
            let error = match joined {
                Ok(Ok(())) => continue,
                Ok(Err(error)) => error,
                Err(join_error) => {
                    token.cancel();
                    CreateError::TaskPanicked(join_error.to_string())
                }
            };
            match &first_error {
                None => first_error = Some(error),
                // A sibling's cancellation can be joined before the failure that caused it.
                Some(current) if current.is_cancellation() && !error.is_cancellation() => {
                    debug!(error = %current, "Replacing cancellation with root cause");
                    first_error = Some(error);
                }
                Some(_) => debug!(error = %error, "Discarding additional task error"),
            }
        }

        let (instances, group) = recorder
            .await
            .map_err(|e| CreateError::TaskPanicked(e.to_string()))?;

        if let Some(group) = &group {
            let commit = match options.commit_policy {
                GroupCommitPolicy::SavePartial => true,
                GroupCommitPolicy::AllOrNothing => first_error.is_none(),
            };
            if commit {
                if let Err(error) = self.group_store.store_group(group).await {
                    match &first_error {
                        None => return Err(CreateError::Persist(error)),
                        Some(_) => warn!(group = %group.name, error = %error, "Failed to save group"),
                    }
                } else {
                    info!(group = %group.name, instances = group.len(), "Saved group");
                }
            } else {
                warn!(group = %group.name, "Not saving group after failed create");
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(CreateOutcome { instances, group }),
        }
    }
}

/// Sole writer of the created-instance list and the group.
async fn record_instances(
    mut created: mpsc::UnboundedReceiver<InstanceId>,
    mut group: Option<Group>,
    console: Console,
) -> (Vec<InstanceId>, Option<Group>) {
    let mut instances = Vec::new();
    while let Some(instance) = created.recv().await {
        console.println(&instance);
        if let Some(group) = group.as_mut() {
            if let Err(error) = group.push(&instance) {
                warn!(error = %error, "Skipping duplicate instance");
            }
        }
        instances.push(instance);
    }
    (instances, group)
}

async fn create_one(context: &TaskContext, index: usize) -> Result<(), CreateError> {
    let start = Instant::now();
    let token = &context.token;
    let rpc_error = |source: ProvisioningError| CreateError::Rpc {
        index,
        builder_type: context.builder_type.clone(),
        elapsed: start.elapsed(),
        source,
    };

    let request = CreationRequest::new(context.builder_type.as_str())?;
    let mut updates = tokio::select! {
        _ = token.cancelled() => return Err(CreateError::Cancelled { index }),
        result = context.provisioning.create_instance(request) => result.map_err(rpc_error)?,
    };

    let instance = loop {
        let update = tokio::select! {
            _ = token.cancelled() => return Err(CreateError::Cancelled { index }),
            update = updates.next() => update,
        };
        match update {
            None => return Err(CreateError::StreamEndedWithoutInstance { index }),
            Some(Err(source)) => return Err(rpc_error(source)),
            Some(Ok(CreationUpdate::Pending { waiters_ahead })) => {
                if context.show_status {
                    context.console.status(format!(
                        "# still creating {} ({}) after {}; {} requests ahead of you",
                        context.builder_type,
                        index,
                        format_elapsed(start.elapsed()),
                        waiters_ahead
                    ));
                }
            }
            Some(Ok(CreationUpdate::Complete { instance_id })) => break instance_id,
        }
    };
    debug!(index, instance_id = %instance, elapsed_ms = start.elapsed().as_millis() as u64, "Instance created");

    if context.created.send(instance.clone()).is_err() {
        warn!(instance_id = %instance, "Instance recorder stopped early");
    }

    let Some(output_dir) = &context.setup_output else {
        return Ok(());
    };
    context
        .setup
        .setup_instance(
            token,
            &instance,
            &context.builder_type,
            output_dir,
            context.detailed_progress,
        )
        .await
        .map_err(|source| CreateError::Setup {
            index,
            instance,
            source,
        })
}

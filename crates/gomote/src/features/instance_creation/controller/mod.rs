use crate::features::groups::service::GroupService;
use crate::features::instance_creation::service::CreateService;
use crate::shared::error::GomoteResult;
use crate::shared::types::{CreateOptions, CreateOutcome};
use std::sync::Arc;
use tracing::info;

/// Entry point for `gomote create` on the streaming provisioning path
pub struct CreateController {
    groups: Arc<GroupService>,
    service: Arc<CreateService>,
    active_group: Option<String>,
}

impl CreateController {
    pub fn new(
        groups: Arc<GroupService>,
        service: Arc<CreateService>,
        active_group: Option<String>,
    ) -> Self {
        Self {
            groups,
            service,
            active_group,
        }
    }

    /// Handle a create request, recording into `new_group` or the active group
    pub async fn create(
        &self,
        options: CreateOptions,
        new_group: Option<&str>,
    ) -> GomoteResult<CreateOutcome> {
        info!(
            builder_type = %options.builder_type,
            count = options.count,
            "Received create request"
        );

        let group = self
            .groups
            .resolve_group(self.active_group.as_deref(), new_group)
            .await?;
        Ok(self.service.create(options, group).await?)
    }
}

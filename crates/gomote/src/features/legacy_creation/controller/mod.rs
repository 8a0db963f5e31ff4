use crate::features::legacy_creation::repo::LegacyCreateError;
use crate::features::legacy_creation::service::LegacyCreateService;
use crate::shared::console::Console;
use crate::shared::error::GomoteResult;
use gomote_core::InstanceId;
use std::sync::Arc;
use tracing::info;

/// Entry point for `gomote create --legacy`
pub struct LegacyCreateController {
    service: Arc<LegacyCreateService>,
    active_group: Option<String>,
    console: Console,
}

impl LegacyCreateController {
    pub fn new(
        service: Arc<LegacyCreateService>,
        active_group: Option<String>,
        console: Console,
    ) -> Self {
        Self {
            service,
            active_group,
            console,
        }
    }

    pub async fn create(&self, builder_type: &str, show_status: bool) -> GomoteResult<InstanceId> {
        if self.active_group.is_some() {
            return Err(LegacyCreateError::GroupsUnsupported.into());
        }
        info!(builder_type, "Received legacy create request");

        let service = Arc::clone(&self.service);
        let builder_type = builder_type.to_string();
        let id = tokio::task::spawn_blocking(move || {
            service.create_one(&builder_type, show_status)
        })
        .await??;

        self.console.println(&id);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::legacy_creation::service::testing::ScriptedCoordinator;
    use crate::shared::error::GomoteError;

    fn controller(
        coordinator: Arc<ScriptedCoordinator>,
        active_group: Option<&str>,
    ) -> (LegacyCreateController, crate::shared::console::CapturedOutput) {
        let (console, output) = Console::captured();
        let service = Arc::new(LegacyCreateService::new(coordinator, console.clone()));
        (
            LegacyCreateController::new(service, active_group.map(str::to_string), console),
            output,
        )
    }

    #[tokio::test]
    async fn test_prints_created_instance() {
        let (controller, output) =
            controller(Arc::new(ScriptedCoordinator::returning("legacy-0", vec![])), None);

        let id = controller.create("linux-amd64", true).await.unwrap();
        assert_eq!(id.as_str(), "legacy-0");
        assert_eq!(output.stdout_lines(), vec!["legacy-0"]);
    }

    #[tokio::test]
    async fn test_rejects_active_group() {
        let coordinator = Arc::new(ScriptedCoordinator::returning("legacy-0", vec![]));
        let (controller, output) = controller(coordinator.clone(), Some("fleet"));

        let err = controller.create("linux-amd64", true).await.unwrap_err();
        assert!(matches!(
            err,
            GomoteError::LegacyCreate(LegacyCreateError::GroupsUnsupported)
        ));
        assert_eq!(err.to_string(), "command does not support groups");
        assert!(coordinator.requests.lock().unwrap().is_empty());
        assert!(output.stdout().is_empty());
    }
}

use crate::features::legacy_creation::repo::{CoordinatorClient, LegacyCreateError, WaitStatus};
use crate::shared::console::{format_elapsed, Console};
use gomote_core::{CreationRequest, InstanceId};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Single-instance creation through the coordinator. Blocks the calling thread.
pub struct LegacyCreateService {
    client: Arc<dyn CoordinatorClient>,
    console: Console,
}

impl LegacyCreateService {
    pub fn new(client: Arc<dyn CoordinatorClient>, console: Console) -> Self {
        Self { client, console }
    }

    pub fn create_one(
        &self,
        builder_type: &str,
        show_status: bool,
    ) -> Result<InstanceId, LegacyCreateError> {
        let request = CreationRequest::new(builder_type)
            .map_err(|e| LegacyCreateError::InvalidRequest(e.to_string()))?;
        let start = Instant::now();

        let mut on_status = |status: &WaitStatus| {
            if !show_status {
                return;
            }
            if !status.message.is_empty() {
                self.console.status(format!("# {}", status.message));
                return;
            }
            self.console.status(format!(
                "# still creating {} after {}; {} requests ahead of you",
                request.builder_type,
                format_elapsed(start.elapsed()),
                status.ahead
            ));
        };

        let name = self
            .client
            .create_buildlet_with_status(&request.builder_type, &mut on_status)?;
        info!(builder_type, instance_id = %name, "Created buildlet via coordinator");
        InstanceId::new(name).map_err(|e| LegacyCreateError::InvalidInstance(e.to_string()))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Replays fixed statuses, then returns `result`.
    pub struct ScriptedCoordinator {
        pub statuses: Vec<WaitStatus>,
        pub result: Result<String, String>,
        pub requests: Mutex<Vec<String>>,
    }

    impl ScriptedCoordinator {
        pub fn returning(name: &str, statuses: Vec<WaitStatus>) -> Self {
            Self {
                statuses,
                result: Ok(name.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                statuses: Vec::new(),
                result: Err(message.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl CoordinatorClient for ScriptedCoordinator {
        fn create_buildlet_with_status(
            &self,
            builder_type: &str,
            on_status: &mut dyn FnMut(&WaitStatus),
        ) -> Result<String, LegacyCreateError> {
            self.requests.lock().unwrap().push(builder_type.to_string());
            for status in &self.statuses {
                on_status(status);
            }
            self.result.clone().map_err(LegacyCreateError::Coordinator)
        }
    }
}

use crate::features::groups::repo::{GroupError, GroupStore};
use gomote_core::Group;
use std::sync::Arc;
use tracing::info;

/// Decides which group, if any, an invocation records its instances into.
pub struct GroupService {
    store: Arc<dyn GroupStore>,
}

impl GroupService {
    pub fn new(store: Arc<dyn GroupStore>) -> Self {
        Self { store }
    }

    /// A new group named on the command line replaces the active group for
    /// this invocation. Without either, instances are not grouped.
    pub async fn resolve_group(
        &self,
        active_group: Option<&str>,
        new_group: Option<&str>,
    ) -> Result<Option<Group>, GroupError> {
        if let Some(name) = new_group {
            let group = self.store.create_group(name).await?;
            info!(group = %name, "Created new group");
            return Ok(Some(group));
        }

        match active_group {
            Some(name) => Ok(Some(self.store.load_group(name).await?)),
            None => Ok(None),
        }
    }
}

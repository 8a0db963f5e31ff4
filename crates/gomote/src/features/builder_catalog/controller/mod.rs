use crate::features::builder_catalog::service::{render_usage, BuilderCatalogService};
use crate::shared::error::GomoteResult;
use std::sync::Arc;

/// Produces the usage text shown when `gomote create` is run without a type
pub struct BuilderCatalogController {
    service: Arc<BuilderCatalogService>,
}

impl BuilderCatalogController {
    pub fn new(service: Arc<BuilderCatalogService>) -> Self {
        Self { service }
    }

    pub async fn usage(&self, usage: &str) -> GomoteResult<String> {
        let service = Arc::clone(&self.service);
        let builders = tokio::task::spawn_blocking(move || service.builders()).await??;
        Ok(render_usage(usage, &builders))
    }
}

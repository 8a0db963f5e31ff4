use crate::features::builder_catalog::repo::{
    BuilderCatalogRepository, CatalogDocument, CatalogError,
};
use gomote_core::BuilderType;
use std::fmt::Write;
use std::sync::Arc;

const HIDDEN_PREFIX: &str = "misc-compile";

pub struct BuilderCatalogService {
    repo: Arc<dyn BuilderCatalogRepository>,
}

impl BuilderCatalogService {
    pub fn new(repo: Arc<dyn BuilderCatalogRepository>) -> Self {
        Self { repo }
    }

    /// Creatable builder types, sorted by name.
    pub fn builders(&self) -> Result<Vec<BuilderType>, CatalogError> {
        Ok(creatable_builders(self.repo.fetch()?))
    }
}

/// Drops hidden builders, builders on unknown hosts, and elastic hosts
/// without an image to boot.
pub fn creatable_builders(doc: CatalogDocument) -> Vec<BuilderType> {
    let mut builders: Vec<BuilderType> = doc
        .builders
        .into_iter()
        .filter(|(name, _)| !name.starts_with(HIDDEN_PREFIX))
        .filter_map(|(name, info)| {
            let host = doc.hosts.get(&info.host_type)?;
            if !host.is_reverse && host.container_image.is_empty() && host.vm_image.is_empty() {
                return None;
            }
            let expect_num = u32::try_from(host.expect_num).unwrap_or(0);
            Some(BuilderType::new(name, host.is_reverse, expect_num))
        })
        .collect();
    builders.sort_by(|a, b| a.name.cmp(&b.name));
    builders
}

/// Usage text followed by the list of valid builder types.
pub fn render_usage(usage: &str, builders: &[BuilderType]) -> String {
    let mut out = String::new();
    out.push_str(usage.trim_end());
    out.push_str("\n\nValid types:\n");
    for builder in builders {
        let _ = writeln!(out, "{builder}");
    }
    out
}

use thiserror::Error;

use crate::features::builder_catalog::repo::CatalogError;
use crate::features::groups::repo::GroupError;
use crate::features::instance_creation::service::CreateError;
use crate::features::legacy_creation::repo::LegacyCreateError;

/// Errors surfaced to the command line
#[derive(Debug, Error)]
pub enum GomoteError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Create(#[from] CreateError),
    #[error(transparent)]
    LegacyCreate(#[from] LegacyCreateError),
    #[error("fetching builder types: {0}")]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Group(#[from] GroupError),
    #[error("Background task failed: {0}")]
    Join(String),
}

impl GomoteError {
    pub fn error_code(&self) -> &'static str {
        match self {
            GomoteError::InvalidRequest(_) => "INVALID_REQUEST",
            GomoteError::Create(_) => "CREATE_FAILED",
            GomoteError::LegacyCreate(_) => "LEGACY_CREATE_FAILED",
            GomoteError::Catalog(_) => "CATALOG_UNAVAILABLE",
            GomoteError::Group(_) => "GROUP_ERROR",
            GomoteError::Join(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<tokio::task::JoinError> for GomoteError {
    fn from(err: tokio::task::JoinError) -> Self {
        GomoteError::Join(err.to_string())
    }
}

pub type GomoteResult<T> = std::result::Result<T, GomoteError>;

pub mod builder;
pub mod group;

pub use builder::BuilderType;
pub use group::Group;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("Invalid instance ID: {0}")]
    InvalidInstanceId(String),
    #[error("Invalid builder type: {0}")]
    InvalidBuilderType(String),
    #[error("Invalid group name: {0}")]
    InvalidGroupName(String),
    #[error("Instance {instance_id} is already in group {group}")]
    DuplicateInstance { group: String, instance_id: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Opaque identifier the provisioning service assigns to a created instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(String);

impl InstanceId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(CoreError::InvalidInstanceId(
                "Instance ID cannot be empty".to_string(),
            ));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for InstanceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One request for one instance of a builder type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreationRequest {
    pub builder_type: String,
}

impl CreationRequest {
    pub fn new(builder_type: impl Into<String>) -> Result<Self> {
        let builder_type = builder_type.into();
        if builder_type.trim().is_empty() {
            return Err(CoreError::InvalidBuilderType(
                "Builder type cannot be empty".to_string(),
            ));
        }
        Ok(Self { builder_type })
    }
}

/// Progress reported by the provisioning service while a request is queued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreationUpdate {
    Pending { waiters_ahead: i64 },
    Complete { instance_id: InstanceId },
}

/// Name of the build entrypoint run on a fresh instance during setup.
pub fn build_script_for(builder_type: &str) -> &'static str {
    if builder_type.contains("windows") {
        "go/src/make.bat"
    } else {
        "go/src/make.bash"
    }
}

use crate::{CoreError, InstanceId, Result};
use serde::{Deserialize, Serialize};

/// A named, ordered set of instances that can be operated on as one unit.
///
/// Instances are kept in the order they were appended, which for a parallel
/// create is completion order rather than request order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    #[serde(default)]
    pub instances: Vec<String>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        Self::validate_name(&name)?;
        Ok(Self {
            name,
            instances: Vec::new(),
        })
    }

    /// Group names become file names, so separators and dot-names are refused.
    pub fn validate_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(CoreError::InvalidGroupName(
                "Group name cannot be empty".to_string(),
            ));
        }
        if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
            return Err(CoreError::InvalidGroupName(format!(
                "Group name {name:?} must not contain path separators"
            )));
        }
        Ok(())
    }

    pub fn push(&mut self, instance_id: &InstanceId) -> Result<()> {
        if self.contains(instance_id.as_str()) {
            return Err(CoreError::DuplicateInstance {
                group: self.name.clone(),
                instance_id: instance_id.to_string(),
            });
        }
        self.instances.push(instance_id.to_string());
        Ok(())
    }

    pub fn contains(&self, instance_id: &str) -> bool {
        self.instances.iter().any(|i| i == instance_id)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn id(s: &str) -> InstanceId {
        InstanceId::new(s).unwrap()
    }

    #[test]
    fn test_group_new_is_empty() {
        let group = Group::new("builders").unwrap();
        assert_eq!(group.name, "builders");
        assert!(group.is_empty());
    }

    #[test]
    fn test_group_name_validation() {
        assert!(Group::new("").is_err());
        assert!(Group::new("a/b").is_err());
        assert!(Group::new("..").is_err());
        assert!(Group::new("windows-fleet").is_ok());
    }

    #[test]
    fn test_group_push_rejects_duplicates() {
        let mut group = Group::new("g").unwrap();
        group.push(&id("i-1")).unwrap();

        let result = group.push(&id("i-1"));
        assert!(matches!(result, Err(CoreError::DuplicateInstance { .. })));
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn test_group_deserializes_without_instances() {
        let group: Group = serde_json::from_str(r#"{"name":"g"}"#).unwrap();
        assert_eq!(group.name, "g");
        assert!(group.instances.is_empty());
    }

    proptest! {
        #[test]
        fn prop_group_keeps_append_order(ids in proptest::collection::hash_set("[a-z0-9]{1,10}", 0..20)) {
            let ids: Vec<String> = ids.into_iter().collect();
            let mut group = Group::new("g").unwrap();
            for raw in &ids {
                group.push(&id(raw)).unwrap();
            }
            prop_assert_eq!(&group.instances, &ids);
        }
    }
}

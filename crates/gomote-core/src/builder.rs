use serde::{Deserialize, Serialize};
use std::fmt;

/// A builder type as advertised by the catalog. Only used for help text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderType {
    pub name: String,
    /// Capacity-limited pool of physically registered machines.
    pub is_reverse: bool,
    /// Advisory machine count; 0 means unknown.
    pub expect_num: u32,
}

impl BuilderType {
    pub fn new(name: impl Into<String>, is_reverse: bool, expect_num: u32) -> Self {
        Self {
            name: name.into(),
            is_reverse,
            expect_num,
        }
    }

    pub fn capacity_note(&self) -> Option<String> {
        if !self.is_reverse {
            return None;
        }
        if self.expect_num > 0 {
            Some(format!("[limited capacity: {} machines]", self.expect_num))
        } else {
            Some("[limited capacity]".to_string())
        }
    }
}

/// Renders the usage listing line, e.g. `  * linux-arm64   [limited capacity: 4 machines]`.
impl fmt::Display for BuilderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  * {}", self.name)?;
        if let Some(note) = self.capacity_note() {
            write!(f, "   {note}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_note_elastic_builder() {
        let bt = BuilderType::new("linux-amd64", false, 0);
        assert!(bt.capacity_note().is_none());
        assert_eq!(bt.to_string(), "  * linux-amd64");
    }

    #[test]
    fn test_capacity_note_reverse_with_count() {
        let bt = BuilderType::new("darwin-arm64", true, 4);
        assert_eq!(
            bt.to_string(),
            "  * darwin-arm64   [limited capacity: 4 machines]"
        );
    }

    #[test]
    fn test_capacity_note_reverse_unknown_count() {
        let bt = BuilderType::new("plan9-386", true, 0);
        assert_eq!(bt.to_string(), "  * plan9-386   [limited capacity]");
    }
}

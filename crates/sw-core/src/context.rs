//! Context type for tracking the origin of state writes

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Identifies the cause of a state write
///
/// Every write into the state store carries a Context. A refresh cycle creates
/// one context and passes children of it to each entity write, so all states
/// produced by one poll can be traced back to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    /// Unique identifier for this context (ULID)
    pub id: String,

    /// Parent context ID, set when this write was caused by another
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl Context {
    /// Create a new root context with a fresh ULID
    pub fn new() -> Self {
        Self {
            id: Ulid::new().to_string(),
            parent_id: None,
        }
    }

    /// Create a child context with this context as parent
    pub fn child(&self) -> Self {
        Self {
            id: Ulid::new().to_string(),
            parent_id: Some(self.id.clone()),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contexts_are_unique() {
        assert_ne!(Context::new().id, Context::new().id);
    }

    #[test]
    fn test_child_links_parent() {
        let parent = Context::new();
        let child = parent.child();
        assert_eq!(child.parent_id.as_deref(), Some(parent.id.as_str()));
        assert_ne!(child.id, parent.id);
    }
}

use serde::{Deserialize, Serialize};

/// Placeholder service name used when instrumentation left both sides of a
/// call unnamed. Edges degrade to this rather than being dropped.
pub const UNKNOWN_SERVICE: &str = "unknown";

/// Aggregated caller->callee edge for one day partition. At most one link
/// exists per (parent, child) pair within a day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DependencyLink {
    pub parent: String,
    pub child: String,
    pub call_count: u64,
    pub error_count: u64,
}

impl DependencyLink {
    pub fn new(parent: impl Into<String>, child: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
            child: child.into(),
            call_count: 0,
            error_count: 0,
        }
    }
}

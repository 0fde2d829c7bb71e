//! Distinct id newtypes so memory ids, node ids, and edge ids cannot be
//! interchanged at compile time.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of a [`crate::types::Memory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryId(pub Uuid);

impl MemoryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MemoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MemoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deterministic id of a [`crate::types::GraphNode`]: `blake3(projectId, filePath, label, type)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn make(project_id: &str, file_path: &str, label: &str, node_type: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(project_id.as_bytes());
        hasher.update(b"\0");
        hasher.update(file_path.as_bytes());
        hasher.update(b"\0");
        hasher.update(label.as_bytes());
        hasher.update(b"\0");
        hasher.update(node_type.as_bytes());
        Self(hasher.finalize().to_hex().to_string())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deterministic id of a [`crate::types::GraphEdge`]: `blake3(fromId, toId, type)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl EdgeId {
    pub fn make(from_id: &NodeId, to_id: &NodeId, edge_type: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(from_id.0.as_bytes());
        hasher.update(b"\0");
        hasher.update(to_id.0.as_bytes());
        hasher.update(b"\0");
        hasher.update(edge_type.as_bytes());
        Self(hasher.finalize().to_hex().to_string())
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_is_deterministic() {
        let a = NodeId::make("p", "src/a.ts", "src/a.ts:foo", "function");
        let b = NodeId::make("p", "src/a.ts", "src/a.ts:foo", "function");
        assert_eq!(a, b);
    }

    #[test]
    fn node_id_differs_on_type() {
        let a = NodeId::make("p", "src/a.ts", "src/a.ts:foo", "function");
        let b = NodeId::make("p", "src/a.ts", "src/a.ts:foo", "class");
        assert_ne!(a, b);
    }
}

//! `GraphDatabase`: the façade combining durable SQL storage, the
//! in-memory mirror, and closure/impact maintenance.

use chrono::Utc;
use recall_core::ids::{EdgeId, NodeId};
use recall_core::types::{GraphEdge, GraphEdgeType, GraphNode, GraphNodeType, NodeConfidence};
use recall_storage::Store;

use crate::closure::{self, DEFAULT_DEPTH_CAP};
use crate::db;
use crate::error::Result;
use crate::impact::{self, ImpactAnalysis};
use crate::mirror::GraphMirror;

pub struct GraphDatabase {
    mirror: GraphMirror,
}

impl GraphDatabase {
    pub fn new() -> Self {
        Self {
            mirror: GraphMirror::new(),
        }
    }

    /// Rebuild the in-memory mirror from SQL. Call once at process start.
    pub fn load_mirror(&self, store: &Store) -> Result<()> {
        self.mirror.clear()?;
        for edge in db::all_non_stale_edges(store)? {
            self.mirror.add_edge(&edge.from_id, &edge.to_id, edge.edge_type.as_str())?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn upsert_node(
        &self,
        store: &Store,
        project_id: &str,
        file_path: Option<String>,
        label: &str,
        node_type: GraphNodeType,
        language: Option<String>,
        start_line: Option<u32>,
        end_line: Option<u32>,
        source: &str,
    ) -> Result<GraphNode> {
        let id = NodeId::make(project_id, file_path.as_deref().unwrap_or(""), label, node_type.as_str());
        let now = Utc::now();
        let node = GraphNode {
            id: id.to_string(),
            project_id: project_id.to_string(),
            node_type,
            label: label.to_string(),
            file_path,
            language,
            start_line,
            end_line,
            layer: 1,
            source: source.to_string(),
            confidence: NodeConfidence::Inferred,
            metadata: serde_json::Value::Null,
            created_at: now,
            updated_at: now,
            stale_at: None,
            associated_memory_ids: Vec::new(),
        };

        db::upsert_node(store, &node)?;
        self.mirror.ensure_node(&node.id)?;
        Ok(node)
    }

    /// Creates a placeholder node for a label the extractor couldn't
    /// resolve locally (§4.5 step 8): an import target outside the current
    /// file (`external = false`, a `File` or `Function` stub carrying the
    /// same `file_path` the real node will eventually upsert under) or an
    /// external symbol such as a package name or standard-library call
    /// (`external = true`, tagged via `metadata.external`, no `file_path`).
    /// Using the same `(file_path, label, type)` triple as the eventual
    /// real `upsert_node` call is what lets the stub converge onto it —
    /// `NodeId::make` is deterministic on exactly those three fields.
    pub fn upsert_stub_node(&self, store: &Store, project_id: &str, file_path: Option<String>, label: &str, node_type: GraphNodeType, external: bool) -> Result<GraphNode> {
        let id = NodeId::make(project_id, file_path.as_deref().unwrap_or(""), label, node_type.as_str());
        let now = Utc::now();
        let metadata = if external { serde_json::json!({ "external": true }) } else { serde_json::Value::Null };
        let node = GraphNode {
            id: id.to_string(),
            project_id: project_id.to_string(),
            node_type,
            label: label.to_string(),
            file_path,
            language: None,
            start_line: None,
            end_line: None,
            layer: 1,
            source: "stub".to_string(),
            confidence: NodeConfidence::Inferred,
            metadata,
            created_at: now,
            updated_at: now,
            stale_at: None,
            associated_memory_ids: Vec::new(),
        };

        db::upsert_node(store, &node)?;
        self.mirror.ensure_node(&node.id)?;
        Ok(node)
    }

    pub fn upsert_edge(&self, store: &Store, from: &NodeId, to: &NodeId, edge_type: GraphEdgeType, weight: f32) -> Result<GraphEdge> {
        let id = EdgeId::make(from, to, edge_type.as_str());
        let now = Utc::now();
        let edge = GraphEdge {
            id: id.to_string(),
            from_id: from.to_string(),
            to_id: to.to_string(),
            edge_type,
            weight,
            confidence: NodeConfidence::Inferred,
            metadata: serde_json::Value::Null,
            created_at: now,
            updated_at: now,
            stale_at: None,
        };

        db::upsert_edge(store, &edge)?;
        self.mirror.add_edge(&edge.from_id, &edge.to_id, edge.edge_type.as_str())?;
        Ok(edge)
    }

    /// Full Glean-style re-extraction cycle for one file: mark stale, run
    /// `extract` to produce fresh nodes/edges (upserted by the caller via
    /// `upsert_node`/`upsert_edge` in between), then delete anything still
    /// stale and recompute closure for every node touched.
    pub fn mark_file_stale(&self, store: &Store, project_id: &str, file_path: &str) -> Result<()> {
        db::mark_file_stale(store, project_id, file_path)
    }

    pub fn delete_stale_for_file(&self, store: &Store, project_id: &str, file_path: &str) -> Result<()> {
        db::delete_stale_for_file(store, project_id, file_path)
    }

    pub fn update_closure_for_node(&self, store: &Store, node_id: &str) -> Result<()> {
        closure::update_closure_for_node(store, node_id, DEFAULT_DEPTH_CAP)
    }

    pub fn rebuild_closure(&self, store: &Store, project_id: &str) -> Result<()> {
        closure::rebuild_closure(store, project_id)
    }

    pub fn analyze_impact(&self, store: &Store, project_id: &str, target: &str, depth_cap: u32) -> Result<ImpactAnalysis> {
        impact::analyze_impact(store, project_id, target, depth_cap)
    }

    pub fn mirror(&self) -> &GraphMirror {
        &self.mirror
    }
}

impl Default for GraphDatabase {
    fn default() -> Self {
        Self::new()
    }
}

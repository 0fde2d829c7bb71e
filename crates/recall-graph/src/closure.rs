//! Closure maintenance (§4.3 "Closure maintenance"): BFS from a node,
//! capped at depth 5, and a full project rebuild for cold start.

use std::collections::{HashMap, VecDeque};

use recall_core::types::{GraphClosureRow, GraphEdgeType};
use recall_storage::Store;

use crate::db;
use crate::error::Result;

pub const DEFAULT_DEPTH_CAP: u32 = 5;

struct Visit {
    depth: u32,
    path: Vec<String>,
    edge_types: Vec<GraphEdgeType>,
    total_weight: f32,
}

/// Incremental: BFS outward from `node_id` along forward edges, replacing
/// every `graph_closure` row where `ancestor = node_id`.
pub fn update_closure_for_node(store: &Store, node_id: &str, depth_cap: u32) -> Result<()> {
    let mut visited: HashMap<String, Visit> = HashMap::new();
    let mut queue: VecDeque<String> = VecDeque::new();
    queue.push_back(node_id.to_string());
    visited.insert(
        node_id.to_string(),
        Visit {
            depth: 0,
            path: vec![node_id.to_string()],
            edge_types: Vec::new(),
            total_weight: 0.0,
        },
    );

    while let Some(current) = queue.pop_front() {
        let current_depth = visited.get(&current).map(|v| v.depth).unwrap_or(0);
        if current_depth >= depth_cap {
            continue;
        }

        for edge in db::edges_out_of(store, &current)? {
            let next_depth = current_depth + 1;
            let already_better = visited.get(&edge.to_id).map(|v| v.depth <= next_depth).unwrap_or(false);
            if already_better {
                continue;
            }

            let parent = visited.get(&current).expect("current was just dequeued from visited");
            let mut path = parent.path.clone();
            path.push(edge.to_id.clone());
            let mut edge_types = parent.edge_types.clone();
            edge_types.push(edge.edge_type);

            visited.insert(
                edge.to_id.clone(),
                Visit {
                    depth: next_depth,
                    path,
                    edge_types,
                    total_weight: parent.total_weight + edge.weight,
                },
            );
            queue.push_back(edge.to_id.clone());
        }
    }

    let rows: Vec<GraphClosureRow> = visited
        .into_iter()
        .filter(|(_, visit)| visit.depth > 0)
        .map(|(descendant, visit)| GraphClosureRow {
            ancestor: node_id.to_string(),
            descendant,
            depth: visit.depth,
            path: visit.path,
            edge_types: visit.edge_types,
            total_weight: visit.total_weight,
        })
        .collect();

    db::replace_closure_for_ancestor(store, node_id, rows)
}

/// Full rebuild: used at cold start and after bulk deletions, since
/// incremental per-node BFS cannot cheaply account for edges removed in
/// bulk elsewhere in the graph.
pub fn rebuild_closure(store: &Store, _project_id: &str) -> Result<()> {
    db::clear_all_closure(store)?;

    let mut seen_ids = std::collections::HashSet::new();
    for edge in db::all_non_stale_edges(store)? {
        seen_ids.insert(edge.from_id.clone());
        seen_ids.insert(edge.to_id.clone());
    }

    for node_id in seen_ids {
        update_closure_for_node(store, &node_id, DEFAULT_DEPTH_CAP)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use recall_core::types::{GraphEdge, GraphEdgeType, GraphNode, GraphNodeType, NodeConfidence};

    fn make_node(id: &str) -> GraphNode {
        let now = Utc::now();
        GraphNode {
            id: id.to_string(),
            project_id: "proj".to_string(),
            node_type: GraphNodeType::Function,
            label: id.to_string(),
            file_path: Some("src/a.rs".to_string()),
            language: Some("rust".to_string()),
            start_line: Some(1),
            end_line: Some(2),
            layer: 1,
            source: "extractor".to_string(),
            confidence: NodeConfidence::Inferred,
            metadata: serde_json::Value::Null,
            created_at: now,
            updated_at: now,
            stale_at: None,
            associated_memory_ids: Vec::new(),
        }
    }

    fn make_edge(from: &str, to: &str) -> GraphEdge {
        let now = Utc::now();
        GraphEdge {
            id: format!("{from}->{to}"),
            from_id: from.to_string(),
            to_id: to.to_string(),
            edge_type: GraphEdgeType::Calls,
            weight: 1.0,
            confidence: NodeConfidence::Inferred,
            metadata: serde_json::Value::Null,
            created_at: now,
            updated_at: now,
            stale_at: None,
        }
    }

    #[test]
    fn bfs_caps_at_depth_and_skips_self() {
        let store = Store::open_in_memory().unwrap();
        for id in ["a", "b", "c", "d"] {
            db::upsert_node(&store, &make_node(id)).unwrap();
        }
        db::upsert_edge(&store, &make_edge("a", "b")).unwrap();
        db::upsert_edge(&store, &make_edge("b", "c")).unwrap();
        db::upsert_edge(&store, &make_edge("c", "d")).unwrap();

        update_closure_for_node(&store, "a", 2).unwrap();

        let rows = db::closure_by_descendant(&store, "c", 5).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ancestor, "a");
        assert_eq!(rows[0].depth, 2);

        let rows_for_d = db::closure_by_descendant(&store, "d", 5).unwrap();
        assert!(rows_for_d.is_empty(), "depth-3 descendant must be excluded by the depth-2 cap");
    }
}

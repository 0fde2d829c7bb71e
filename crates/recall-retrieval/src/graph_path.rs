//! Path C — graph (§4.7) and the graph-neighborhood boost applied after
//! fusion. Both operate on file-level neighborhoods derived from the
//! closure table rather than raw edges, so a "1-hop" neighbor already
//! accounts for the depth-1 rows `recall-graph` maintains.

use std::collections::HashSet;

use recall_graph::db;
use recall_storage::Store;

use crate::error::Result;

fn node_ids_for_file(store: &Store, project_id: &str, file_path: &str) -> Result<Vec<String>> {
    Ok(db::find_by_file_path(store, project_id, file_path)?.into_iter().map(|n| n.id).collect())
}

fn descendants_at_depth_one(store: &Store, ancestor: &str) -> Result<Vec<String>> {
    let mut stmt = store
        .reader()
        .prepare_cached("SELECT descendant FROM graph_closure WHERE ancestor = ?1 AND depth = 1")?;
    let rows = stmt.query_map(rusqlite::params![ancestor], |row| row.get::<_, String>(0))?.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// File paths reachable in one closure hop from any node belonging to
/// `anchor_files`, in either direction (what `anchor_files` depends on, and
/// what depends on `anchor_files`), excluding the anchors themselves.
pub fn neighbor_files(store: &Store, project_id: &str, anchor_files: &[String]) -> Result<Vec<String>> {
    let anchors: HashSet<&str> = anchor_files.iter().map(|s| s.as_str()).collect();
    let mut neighbor_ids: HashSet<String> = HashSet::new();

    for file in anchor_files {
        for node_id in node_ids_for_file(store, project_id, file)? {
            neighbor_ids.extend(descendants_at_depth_one(store, &node_id)?);
            neighbor_ids.extend(db::closure_by_descendant(store, &node_id, 1)?.into_iter().map(|row| row.ancestor));
        }
    }

    let mut files: HashSet<String> = HashSet::new();
    for id in neighbor_ids {
        if let Some(node) = db::get_node(store, &id)? {
            if let Some(path) = node.file_path {
                if !anchors.contains(path.as_str()) {
                    files.insert(path);
                }
            }
        }
    }

    Ok(files.into_iter().collect())
}

/// Path C candidates (§4.7): memories whose `relatedFiles` overlap
/// `neighbor_files`, ranked by overlap count descending.
pub fn memories_by_related_file_overlap(store: &Store, project_id: &str, neighbor_files: &[String]) -> Result<Vec<String>> {
    if neighbor_files.is_empty() {
        return Ok(Vec::new());
    }
    let neighbors: HashSet<&str> = neighbor_files.iter().map(|s| s.as_str()).collect();

    let mut stmt = store
        .reader()
        .prepare_cached("SELECT id, related_files FROM memories WHERE project_id = ?1 AND deprecated = 0 AND related_files != '[]'")?;
    let rows: Vec<(String, String)> = stmt
        .query_map(rusqlite::params![project_id], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut ranked: Vec<(String, usize)> = rows
        .into_iter()
        .filter_map(|(id, raw)| {
            let files: Vec<String> = serde_json::from_str(&raw).unwrap_or_default();
            let overlap = files.iter().filter(|f| neighbors.contains(f.as_str())).count();
            (overlap > 0).then_some((id, overlap))
        })
        .collect();

    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(ranked.into_iter().map(|(id, _)| id).collect())
}

/// §4.7 "Expansion — graph-path fallback": when the caller has no
/// `recentFiles` to anchor on, fall back to the project's most-central
/// files (highest closure out-degree) so the graph path's fusion weight is
/// never silently wasted on a cold query.
pub fn graph_anchor_files_fallback(store: &Store, project_id: &str, limit: usize) -> Result<Vec<String>> {
    let mut out_degree: std::collections::HashMap<String, u32> = std::collections::HashMap::new();
    for edge in db::all_non_stale_edges(store)? {
        *out_degree.entry(edge.from_id).or_insert(0) += 1;
    }

    let mut by_file: std::collections::HashMap<String, u32> = std::collections::HashMap::new();
    for (node_id, count) in out_degree {
        if let Some(node) = db::get_node(store, &node_id)? {
            if node.project_id != project_id {
                continue;
            }
            if let Some(path) = node.file_path {
                *by_file.entry(path).or_insert(0) += count;
            }
        }
    }

    let mut ranked: Vec<(String, u32)> = by_file.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);
    Ok(ranked.into_iter().map(|(path, _)| path).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use recall_core::types::{GraphEdge, GraphEdgeType, GraphNode, GraphNodeType, NodeConfidence};

    fn node(id: &str, file: &str) -> GraphNode {
        let now = Utc::now();
        GraphNode {
            id: id.to_string(),
            project_id: "proj".to_string(),
            node_type: GraphNodeType::File,
            label: file.to_string(),
            file_path: Some(file.to_string()),
            language: None,
            start_line: None,
            end_line: None,
            layer: 1,
            source: "test".to_string(),
            confidence: NodeConfidence::Inferred,
            metadata: serde_json::Value::Null,
            created_at: now,
            updated_at: now,
            stale_at: None,
            associated_memory_ids: Vec::new(),
        }
    }

    fn edge(from: &str, to: &str) -> GraphEdge {
        let now = Utc::now();
        GraphEdge {
            id: format!("{from}->{to}"),
            from_id: from.to_string(),
            to_id: to.to_string(),
            edge_type: GraphEdgeType::Imports,
            weight: 1.0,
            confidence: NodeConfidence::Inferred,
            metadata: serde_json::Value::Null,
            created_at: now,
            updated_at: now,
            stale_at: None,
        }
    }

    #[test]
    fn neighbor_files_excludes_the_anchor_itself() {
        let store = Store::open_in_memory().unwrap();
        db::upsert_node(&store, &node("a", "a.rs")).unwrap();
        db::upsert_node(&store, &node("b", "b.rs")).unwrap();
        db::upsert_edge(&store, &edge("a", "b")).unwrap();
        recall_graph::closure::update_closure_for_node(&store, "a", 5).unwrap();

        let neighbors = neighbor_files(&store, "proj", &["a.rs".to_string()]).unwrap();
        assert_eq!(neighbors, vec!["b.rs".to_string()]);
    }

    #[test]
    fn central_files_fallback_ranks_by_out_degree() {
        let store = Store::open_in_memory().unwrap();
        db::upsert_node(&store, &node("a", "a.rs")).unwrap();
        db::upsert_node(&store, &node("b", "b.rs")).unwrap();
        db::upsert_node(&store, &node("c", "c.rs")).unwrap();
        db::upsert_edge(&store, &edge("a", "b")).unwrap();
        db::upsert_edge(&store, &edge("a", "c")).unwrap();

        let ranked = graph_anchor_files_fallback(&store, "proj", 20).unwrap();
        assert_eq!(ranked.first(), Some(&"a.rs".to_string()));
    }
}

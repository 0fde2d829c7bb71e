//! `analyzeImpact` (§4.3): resolve a target, then walk dependents.

use recall_core::ids::MemoryId;
use recall_core::types::GraphNode;
use recall_storage::Store;

use crate::db;
use crate::error::{GraphError, Result};

#[derive(Debug, Clone)]
pub struct TransitiveDependent {
    pub node: GraphNode,
    pub depth: u32,
    pub path: Vec<String>,
    pub total_weight: f32,
}

#[derive(Debug, Clone)]
pub struct ImpactAnalysis {
    pub target: GraphNode,
    pub direct_dependents: Vec<GraphNode>,
    pub transitive_dependents: Vec<TransitiveDependent>,
    pub affected_tests: Vec<GraphNode>,
    pub affected_memories: Vec<MemoryId>,
}

/// (a) exact label match, (b) suffix match on `:symbol`, (c) file path match.
pub fn resolve_target(store: &Store, project_id: &str, target: &str) -> Result<Option<GraphNode>> {
    if let Some(node) = db::find_by_exact_label(store, project_id, target)?.into_iter().next() {
        return Ok(Some(node));
    }

    let suffix = format!(":{target}");
    if let Some(node) = db::find_by_label_suffix(store, project_id, &suffix)?.into_iter().next() {
        return Ok(Some(node));
    }

    if let Some(node) = db::find_by_file_path(store, project_id, target)?.into_iter().next() {
        return Ok(Some(node));
    }

    Ok(None)
}

fn is_test_path(file_path: &Option<String>) -> bool {
    let Some(path) = file_path else {
        return false;
    };
    let lower = path.to_lowercase();
    lower.contains("/tests/") || lower.contains("/test/") || lower.ends_with("_test.rs") || lower.ends_with(".test.ts") || lower.ends_with(".spec.ts")
}

pub fn analyze_impact(store: &Store, project_id: &str, target: &str, depth_cap: u32) -> Result<ImpactAnalysis> {
    let resolved = resolve_target(store, project_id, target)?.ok_or_else(|| GraphError::UnresolvedTarget(target.to_string()))?;

    let direct_dependents: Vec<GraphNode> = db::edges_into(store, &resolved.id)?
        .into_iter()
        .filter_map(|edge| db::get_node(store, &edge.from_id).ok().flatten())
        .collect();

    let mut transitive_dependents: Vec<TransitiveDependent> = db::closure_by_descendant(store, &resolved.id, depth_cap)?
        .into_iter()
        .filter_map(|row| {
            let node = db::get_node(store, &row.ancestor).ok().flatten()?;
            Some(TransitiveDependent {
                depth: row.depth,
                path: row.path,
                total_weight: row.total_weight,
                node,
            })
        })
        .collect();
    transitive_dependents.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.node.label.cmp(&b.node.label)));

    let mut affected_tests: Vec<GraphNode> = direct_dependents.iter().filter(|n| is_test_path(&n.file_path)).cloned().collect();
    affected_tests.extend(transitive_dependents.iter().map(|t| &t.node).filter(|n| is_test_path(&n.file_path)).cloned());

    let mut affected_memories: Vec<MemoryId> = Vec::new();
    for node in direct_dependents.iter().chain(transitive_dependents.iter().map(|t| &t.node)) {
        for id in &node.associated_memory_ids {
            if !affected_memories.contains(id) {
                affected_memories.push(*id);
            }
        }
    }

    Ok(ImpactAnalysis {
        target: resolved,
        direct_dependents,
        transitive_dependents,
        affected_tests,
        affected_memories,
    })
}

//! In-memory `petgraph` mirror of the durable graph tables.
//!
//! Grounded on `cortex-causal`'s `GraphManager`: an `Arc<RwLock<_>>`-wrapped
//! `StableGraph`, lock-poison mapped to a [`GraphError::Concurrency`]. Unlike
//! the upstream causal graph, this one is not enforced acyclic — call graphs
//! legitimately contain recursion — so there is no cycle check on insert.
//! It is rebuilt from SQL at process start and kept in sync by whichever
//! writer upserts nodes/edges; it is never the durable source of truth.

use std::sync::{Arc, RwLock};

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::Direction;
use rustc_hash::FxHashMap;

use crate::error::{GraphError, Result};

struct Inner {
    graph: StableDiGraph<String, String>,
    index: FxHashMap<String, NodeIndex>,
}

#[derive(Clone)]
pub struct GraphMirror {
    inner: Arc<RwLock<Inner>>,
}

impl GraphMirror {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                graph: StableDiGraph::new(),
                index: FxHashMap::default(),
            })),
        }
    }

    pub fn clear(&self) -> Result<()> {
        let mut inner = self.write()?;
        inner.graph.clear();
        inner.index.clear();
        Ok(())
    }

    /// Idempotent: returns the existing index if the node is already mirrored.
    pub fn ensure_node(&self, id: &str) -> Result<()> {
        let mut inner = self.write()?;
        ensure_node_locked(&mut inner, id);
        Ok(())
    }

    pub fn remove_node(&self, id: &str) -> Result<()> {
        let mut inner = self.write()?;
        if let Some(idx) = inner.index.remove(id) {
            inner.graph.remove_node(idx);
        }
        Ok(())
    }

    pub fn add_edge(&self, from_id: &str, to_id: &str, edge_type: &str) -> Result<()> {
        let mut inner = self.write()?;
        let from_idx = ensure_node_locked(&mut inner, from_id);
        let to_idx = ensure_node_locked(&mut inner, to_id);
        inner.graph.add_edge(from_idx, to_idx, edge_type.to_string());
        Ok(())
    }

    pub fn remove_edge(&self, from_id: &str, to_id: &str) -> Result<()> {
        let mut inner = self.write()?;
        let (Some(&from_idx), Some(&to_idx)) = (inner.index.get(from_id), inner.index.get(to_id)) else {
            return Ok(());
        };
        if let Some(edge_idx) = inner.graph.find_edge(from_idx, to_idx) {
            inner.graph.remove_edge(edge_idx);
        }
        Ok(())
    }

    pub fn direct_dependents(&self, id: &str) -> Result<Vec<String>> {
        let inner = self.read()?;
        let Some(&idx) = inner.index.get(id) else {
            return Ok(Vec::new());
        };
        Ok(inner
            .graph
            .neighbors_directed(idx, Direction::Incoming)
            .filter_map(|n| inner.graph.node_weight(n).cloned())
            .collect())
    }

    pub fn node_count(&self) -> Result<usize> {
        Ok(self.read()?.graph.node_count())
    }

    pub fn edge_count(&self) -> Result<usize> {
        Ok(self.read()?.graph.edge_count())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>> {
        self.inner.read().map_err(|e| GraphError::Concurrency(e.to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>> {
        self.inner.write().map_err(|e| GraphError::Concurrency(e.to_string()))
    }
}

fn ensure_node_locked(inner: &mut Inner, id: &str) -> NodeIndex {
    if let Some(&idx) = inner.index.get(id) {
        return idx;
    }
    let idx = inner.graph.add_node(id.to_string());
    inner.index.insert(id.to_string(), idx);
    idx
}

impl Default for GraphMirror {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_node_is_idempotent() {
        let mirror = GraphMirror::new();
        mirror.ensure_node("a").unwrap();
        mirror.ensure_node("a").unwrap();
        assert_eq!(mirror.node_count().unwrap(), 1);
    }

    #[test]
    fn add_edge_creates_endpoints_and_tracks_dependents() {
        let mirror = GraphMirror::new();
        mirror.add_edge("a", "b", "calls").unwrap();
        assert_eq!(mirror.node_count().unwrap(), 2);
        assert_eq!(mirror.direct_dependents("b").unwrap(), vec!["a".to_string()]);
    }

    #[test]
    fn tolerates_cycles() {
        let mirror = GraphMirror::new();
        mirror.add_edge("a", "b", "calls").unwrap();
        mirror.add_edge("b", "a", "calls").unwrap();
        assert_eq!(mirror.edge_count().unwrap(), 2);
    }
}

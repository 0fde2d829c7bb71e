//! `IncrementalIndexer` (§4.5): orchestrates the extractor and the graph
//! database per file, the cold-start walk, and the live watcher's debounced
//! dispatch.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use recall_core::ids::NodeId;
use recall_core::types::GraphNodeType;
use recall_extract::{AstExtractor, GrammarRegistry};
use recall_graph::GraphDatabase;
use recall_storage::Store;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::error::Result;
use crate::paths::resolve_relative_import;
use crate::state;
use crate::walker;
use crate::watcher::ProjectWatcher;

pub struct IncrementalIndexer {
    extractor: AstExtractor,
    is_indexing: AtomicBool,
}

impl IncrementalIndexer {
    pub fn new() -> Self {
        Self {
            extractor: AstExtractor::new(GrammarRegistry::new()),
            is_indexing: AtomicBool::new(false),
        }
    }

    /// The 11-step per-file pipeline. `label` is the project-relative path
    /// used for node labels and ids; `path` is where to read bytes from.
    pub fn index_file(&self, store: &Store, graph: &GraphDatabase, project_id: &str, label: &str, path: &Path) -> Result<()> {
        // 1. Language already established by the caller filtering on
        //    `recall_extract::Language::from_path` before reaching here.
        // 2. Parser load/caching is internal to `AstExtractor`.

        // 3. Read file; on read error, mark stale and return.
        let source = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                debug!(file = %label, error = %e, "index read failed, marking stale");
                graph.mark_file_stale(store, project_id, label)?;
                return Ok(());
            }
        };

        // 4. Mark existing nodes/edges for this file stale.
        graph.mark_file_stale(store, project_id, label)?;

        // 5/6. Parse + extract. On failure, leave the prior nodes stale;
        // they're cleaned up on the next successful index.
        let extraction = match self.extractor.extract_file(label, &source) {
            Ok(e) => e,
            Err(e) => {
                warn!(file = %label, error = %e, "extraction failed, leaving prior nodes stale");
                return Ok(());
            }
        };

        // 7. Upsert nodes, build label -> id map.
        let mut label_to_id: FxHashMap<String, String> = FxHashMap::default();
        for node in &extraction.nodes {
            let graph_node = graph.upsert_node(
                store,
                project_id,
                Some(label.to_string()),
                &node.label,
                node.node_type,
                Some(extraction.language.name().to_string()),
                Some(node.start_line),
                Some(node.end_line),
                "ast_extractor",
            )?;
            label_to_id.insert(node.label.clone(), graph_node.id);
        }

        // 8. Resolve both endpoints of each edge, creating stub nodes for
        // anything the extractor couldn't resolve against this file alone.
        for edge in &extraction.edges {
            let from_id = self.resolve_label(store, graph, project_id, label, &label_to_id, &edge.from_label)?;
            let to_id = self.resolve_label(store, graph, project_id, label, &label_to_id, &edge.to_label)?;
            graph.upsert_edge(store, &NodeId(from_id), &NodeId(to_id), edge.edge_type, 1.0)?;
        }

        // 9. Delete rows still stale for this file.
        graph.delete_stale_for_file(store, project_id, label)?;

        // 10. Recompute closure for the file node itself.
        let file_id = NodeId::make(project_id, label, label, GraphNodeType::File.as_str());
        graph.update_closure_for_node(store, &file_id.to_string())?;

        // 11. Per-project counters.
        state::record_file_indexed(store, project_id)?;

        Ok(())
    }

    fn resolve_label(
        &self,
        store: &Store,
        graph: &GraphDatabase,
        project_id: &str,
        importing_file: &str,
        label_to_id: &FxHashMap<String, String>,
        label: &str,
    ) -> Result<String> {
        if let Some(id) = label_to_id.get(label) {
            return Ok(id.clone());
        }

        // `module:symbol` labels (from-imports) resolve the module half
        // against the importer's directory and keep the symbol suffix, so
        // the result matches the declaration label the target file's own
        // extraction will produce for that symbol.
        if let Some((module_part, symbol_part)) = label.split_once(':') {
            if module_part.starts_with('.') || module_part.starts_with('/') {
                let resolved_module = resolve_relative_import(importing_file, module_part);
                let resolved_label = format!("{resolved_module}:{symbol_part}");
                if let Some(id) = label_to_id.get(&resolved_label) {
                    return Ok(id.clone());
                }
                let node = graph.upsert_stub_node(store, project_id, Some(resolved_module), &resolved_label, GraphNodeType::Function, false)?;
                return Ok(node.id);
            }
        }

        if label.starts_with('.') || label.starts_with('/') {
            let resolved_path = resolve_relative_import(importing_file, label);
            let node = graph.upsert_stub_node(store, project_id, Some(resolved_path.clone()), &resolved_path, GraphNodeType::File, false)?;
            Ok(node.id)
        } else {
            let node = graph.upsert_stub_node(store, project_id, None, label, GraphNodeType::Module, true)?;
            Ok(node.id)
        }
    }

    /// Marks a deleted file's nodes/edges stale and sweeps them immediately
    /// (there's no re-extraction to converge back onto, unlike `index_file`).
    pub fn remove_file(&self, store: &Store, graph: &GraphDatabase, project_id: &str, label: &str) -> Result<()> {
        graph.mark_file_stale(store, project_id, label)?;
        graph.delete_stale_for_file(store, project_id, label)?;
        Ok(())
    }

    /// Walks `project_root`, indexing every supported file, yielding to
    /// `on_yield` every 100 files (§4.5 "Cold start"). Guarded by
    /// `is_indexing` so a second cold start can't run concurrently.
    pub fn cold_start(&self, store: &Store, graph: &GraphDatabase, project_id: &str, project_root: &Path, mut on_yield: impl FnMut(usize)) -> Result<usize> {
        if self.is_indexing.swap(true, Ordering::SeqCst) {
            return Ok(0);
        }
        state::set_is_indexing(store, project_id, true)?;

        let result = (|| -> Result<usize> {
            let files = walker::walk_project(project_root);
            let mut indexed = 0usize;
            for (i, path) in files.iter().enumerate() {
                if let Some(label) = crate::paths::relative_label(project_root, path) {
                    self.index_file(store, graph, project_id, &label, path)?;
                    indexed += 1;
                }
                if (i + 1) % 100 == 0 {
                    on_yield(i + 1);
                }
            }
            graph.rebuild_closure(store, project_id)?;
            Ok(indexed)
        })();

        state::record_cold_start_complete(store, project_id)?;
        self.is_indexing.store(false, Ordering::SeqCst);
        result
    }

    pub fn is_indexing(&self) -> bool {
        self.is_indexing.load(Ordering::SeqCst)
    }

    /// Drains one `ProjectWatcher` tick and applies it: debounced
    /// changes go through `index_file`, removals through `remove_file`.
    pub fn process_watch_tick(&self, store: &Store, graph: &GraphDatabase, project_id: &str, project_root: &Path, watcher: &mut ProjectWatcher, poll_for: Duration) -> Result<()> {
        let batch = watcher.tick(poll_for);
        for path in batch.changed {
            if let Some(label) = crate::paths::relative_label(project_root, &path) {
                self.index_file(store, graph, project_id, &label, &path)?;
            }
        }
        for path in batch.removed {
            if let Some(label) = crate::paths::relative_label(project_root, &path) {
                self.remove_file(store, graph, project_id, &label)?;
            }
        }
        Ok(())
    }
}

impl Default for IncrementalIndexer {
    fn default() -> Self {
        Self::new()
    }
}

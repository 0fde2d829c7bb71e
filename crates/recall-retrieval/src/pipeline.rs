//! `RetrievalPipeline` (§4.7): classify, fan out across BM25/dense/graph,
//! fuse with weighted RRF, boost by graph neighborhood, materialize.

use std::collections::{HashMap, HashSet};

use recall_core::config::RetrievalConfig;
use recall_core::types::Memory;
use recall_embeddings::EmbeddingService;
use recall_storage::Store;
use tracing::warn;

use crate::classify::classify;
use crate::dense::{dense_candidates, STAGE1_DIMS};
use crate::format::format_context;
use crate::fusion::{redistribute_empty_graph_weight, rrf_merge, weights_for, FusedResult, RankedPath};
use crate::fts::fts_candidates;
use crate::graph_path::{graph_anchor_files_fallback, memories_by_related_file_overlap, neighbor_files};
use crate::queries::fetch_by_ids_ordered;
use crate::Result;

/// §4.7 "Graph-neighborhood boost": the top-K taken from the already-fused
/// list is fixed at 10 by the spec text itself (not one of the knobs
/// `RetrievalConfig` exposes).
const BOOST_TOP_K: usize = 10;

/// Optional cross-encoder re-sort of the top candidates (§4.7 "Rerank").
/// Nothing in the corpus this crate is grounded on ships a reranker model,
/// so the default pipeline runs with `reranker: None`, which is the
/// identity operation.
pub trait Reranker: Send + Sync {
    fn rerank(&self, query: &str, candidates: &mut Vec<(Memory, f64)>);
}

#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub phase: Option<String>,
    pub project_id: String,
    pub max_results: Option<usize>,
    pub recent_files: Vec<String>,
    pub recent_tool_calls: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub memories: Vec<Memory>,
    pub formatted_context: String,
}

pub struct RetrievalPipeline<'a> {
    embeddings: &'a EmbeddingService,
    reranker: Option<Box<dyn Reranker>>,
    config: RetrievalConfig,
}

impl<'a> RetrievalPipeline<'a> {
    pub fn new(embeddings: &'a EmbeddingService) -> Self {
        Self { embeddings, reranker: None, config: RetrievalConfig::default() }
    }

    pub fn with_config(embeddings: &'a EmbeddingService, config: RetrievalConfig) -> Self {
        Self { embeddings, reranker: None, config }
    }

    pub fn with_reranker(embeddings: &'a EmbeddingService, reranker: Box<dyn Reranker>) -> Self {
        Self { embeddings, reranker: Some(reranker), config: RetrievalConfig::default() }
    }

    /// Never throws (§4.7 "Failure model"): every path's failure degrades
    /// to an empty candidate list rather than aborting the search.
    pub fn search(&self, store: &Store, query: &str, opts: &SearchOptions) -> PipelineResult {
        let tool_call_refs: Vec<&str> = opts.recent_tool_calls.iter().map(|s| s.as_str()).collect();
        let class = classify(query, &tool_call_refs);
        let base_weights = weights_for(class);

        let top_n = self.config.path_top_n;

        let fts_ids = fts_candidates(store, &opts.project_id, query, top_n).unwrap_or_else(|e| {
            warn!(error = %e, "bm25 path failed, degrading to empty");
            Vec::new()
        });

        let dense_ids = match self.embeddings.embed(store, query, STAGE1_DIMS) {
            Ok(vector) => dense_candidates(store, &opts.project_id, &vector, top_n).unwrap_or_else(|e| {
                warn!(error = %e, "dense path failed, degrading to empty");
                Vec::new()
            }),
            Err(e) => {
                warn!(error = %e, "query embedding failed, degrading dense path to empty");
                Vec::new()
            }
        };

        let graph_ids = self.graph_path_candidates(store, opts).unwrap_or_else(|e| {
            warn!(error = %e, "graph path failed, degrading to empty");
            Vec::new()
        });

        let weights = redistribute_empty_graph_weight(base_weights, graph_ids.is_empty());
        let fused = rrf_merge(
            &[
                RankedPath { source: "fts", ids: fts_ids, weight: weights.fts },
                RankedPath { source: "dense", ids: dense_ids, weight: weights.dense },
                RankedPath { source: "graph", ids: graph_ids, weight: weights.graph },
            ],
            self.config.rrf_k as f64,
        );

        let boosted = self.apply_graph_boost(store, &opts.project_id, fused);

        let limit = opts.max_results.unwrap_or(self.config.default_max_results);
        let mut candidates: Vec<(Memory, f64)> = boosted.into_iter().take(limit).collect();

        if let Some(reranker) = &self.reranker {
            reranker.rerank(query, &mut candidates);
        }

        let memories: Vec<Memory> = candidates.into_iter().map(|(m, _)| m).collect();
        let formatted_context = format_context(&memories);
        PipelineResult { memories, formatted_context }
    }

    fn graph_path_candidates(&self, store: &Store, opts: &SearchOptions) -> Result<Vec<String>> {
        let anchors = if !opts.recent_files.is_empty() {
            opts.recent_files.clone()
        } else if self.config.graph_fallback_to_central_files {
            graph_anchor_files_fallback(store, &opts.project_id, self.config.graph_fallback_top_n)?
        } else {
            Vec::new()
        };
        if anchors.is_empty() {
            return Ok(Vec::new());
        }

        let neighbors = neighbor_files(store, &opts.project_id, &anchors)?;
        memories_by_related_file_overlap(store, &opts.project_id, &neighbors)
    }

    /// §4.7 "Graph-neighborhood boost": anchor on the top-K fused results'
    /// `relatedFiles`, then nudge lower-ranked candidates that share a
    /// 1-hop neighbor file with those anchors.
    fn apply_graph_boost(&self, store: &Store, project_id: &str, fused: Vec<FusedResult>) -> Vec<(Memory, f64)> {
        let ids: Vec<String> = fused.iter().map(|f| f.memory_id.clone()).collect();
        let hydrated = fetch_by_ids_ordered(store, &ids).unwrap_or_default();
        let by_id: HashMap<String, Memory> = hydrated.into_iter().map(|m| (m.id.to_string(), m)).collect();

        let mut scored: Vec<(Memory, f64)> = fused
            .into_iter()
            .filter_map(|f| by_id.get(&f.memory_id).cloned().map(|m| (m, f.score)))
            .collect();

        let top_k: Vec<&Memory> = scored.iter().take(BOOST_TOP_K).map(|(m, _)| m).collect();
        let anchor_files: HashSet<String> = top_k.iter().flat_map(|m| m.related_files.clone()).collect();
        if anchor_files.is_empty() {
            return scored;
        }

        let anchor_list: Vec<String> = anchor_files.iter().cloned().collect();
        let neighbor_set: HashSet<String> = neighbor_files(store, project_id, &anchor_list).unwrap_or_default().into_iter().collect();
        let boostable_neighbors: HashSet<&String> = neighbor_set.difference(&anchor_files).collect();
        let anchor_count = anchor_files.len().max(1) as f64;

        for (i, (memory, score)) in scored.iter_mut().enumerate() {
            if i < BOOST_TOP_K {
                continue;
            }
            let overlap = memory.related_files.iter().filter(|f| boostable_neighbors.contains(f)).count();
            if overlap > 0 {
                *score += self.config.graph_boost_factor as f64 * (overlap as f64 / anchor_count);
            }
        }

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored
    }
}

//! `search` dual-mode dispatch, `searchByPattern`, `searchWorkflowRecipe`
//! (§4.6). All of these degrade to `[]`/`None` on error — `MemoryService`
//! is a read-availability-first surface.

use recall_core::filter::MemoryFilter;
use recall_core::types::{Memory, MemoryType, SearchFilters, SortOrder};
use recall_embeddings::EmbeddingService;
use recall_retrieval::{RetrievalPipeline, SearchOptions};
use recall_storage::Store;
use tracing::warn;

use crate::queries::structural_search;

const WORKFLOW_RECIPE_OVERSAMPLE: usize = 3;
const WORKFLOW_RECIPE_DEFAULT_LIMIT: usize = 5;

fn apply_post_filters(mut memories: Vec<Memory>, filters: &SearchFilters, filter: &Option<Box<dyn MemoryFilter>>) -> Vec<Memory> {
    if let Some(min_confidence) = filters.min_confidence {
        memories.retain(|m| m.confidence >= min_confidence);
    }
    if filters.exclude_deprecated {
        memories.retain(|m| !m.deprecated);
    }
    if let Some(filter) = filter {
        memories.retain(|m| filter.keep(m));
    }

    if let Some(sort) = filters.sort {
        sort_by(&mut memories, sort);
    }
    if let Some(limit) = filters.limit {
        memories.truncate(limit);
    }
    memories
}

fn sort_by(memories: &mut [Memory], sort: SortOrder) {
    match sort {
        SortOrder::Recency => memories.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortOrder::Confidence => memories.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal)),
        SortOrder::Access => memories.sort_by(|a, b| b.access_count.cmp(&a.access_count)),
    }
}

/// `search(filters) -> Memory[]` (§4.6): delegates to the retrieval
/// pipeline when `filters.query` is set, else runs the direct-SQL
/// structural path; both branches share the same post-filter pass.
pub fn search(
    store: &Store,
    embeddings: &EmbeddingService,
    filters: &SearchFilters,
    phase: Option<&str>,
    filter: Option<Box<dyn MemoryFilter>>,
) -> Vec<Memory> {
    let max_results = filters.limit.unwrap_or(8);

    let memories = if let Some(query) = &filters.query {
        let pipeline = RetrievalPipeline::new(embeddings);
        let opts = SearchOptions {
            phase: phase.map(str::to_string),
            project_id: filters.project_id.clone(),
            max_results: Some(max_results),
            recent_files: filters.related_files.clone(),
            recent_tool_calls: Vec::new(),
        };
        pipeline.search(store, query, &opts).memories
    } else {
        structural_search(
            store,
            &filters.project_id,
            filters.scope,
            &filters.types,
            &filters.sources,
            &filters.related_files,
            filters.min_confidence,
            filters.exclude_deprecated,
            filters.sort.unwrap_or_default(),
            max_results,
        )
        .unwrap_or_else(|e| {
            warn!(error = %e, "structural search failed, degrading to empty");
            Vec::new()
        })
    };

    apply_post_filters(memories, filters, &filter)
}

/// `searchByPattern(pattern) -> Memory | null` (§4.6): BM25-only, top 1,
/// non-deprecated. Used by the decider's search-short-circuit trigger
/// under its tight latency budget, so it never touches the dense or graph
/// paths.
pub fn search_by_pattern(store: &Store, pattern: &str) -> Option<Memory> {
    let ranked = store.search_fts5(pattern, 1).ok()?;
    let (id, _rank) = ranked.into_iter().next()?;
    crate::queries::fetch_by_id(store, &id).ok().flatten().filter(|m| !m.deprecated)
}

/// `searchWorkflowRecipe(description, limit=5) -> Memory[]` (§4.6):
/// pipeline search at `phase=implement`, oversampled `3×limit`, filtered to
/// `workflow_recipe`, then sliced to `limit`.
pub fn search_workflow_recipe(store: &Store, embeddings: &EmbeddingService, description: &str, project_id: &str, limit: Option<usize>) -> Vec<Memory> {
    let limit = limit.unwrap_or(WORKFLOW_RECIPE_DEFAULT_LIMIT);
    let pipeline = RetrievalPipeline::new(embeddings);
    let opts = SearchOptions {
        phase: Some("implement".to_string()),
        project_id: project_id.to_string(),
        max_results: Some(limit * WORKFLOW_RECIPE_OVERSAMPLE),
        recent_files: Vec::new(),
        recent_tool_calls: Vec::new(),
    };

    let mut recipes: Vec<Memory> = pipeline
        .search(store, description, &opts)
        .memories
        .into_iter()
        .filter(|m| m.memory_type == MemoryType::WorkflowRecipe)
        .collect();
    recipes.truncate(limit);
    recipes
}

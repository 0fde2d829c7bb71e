//! Weighted reciprocal-rank fusion (§4.7) over the three candidate paths.

use rustc_hash::FxHashMap;

use crate::classify::QueryClass;

pub const RRF_K: f64 = 60.0;

#[derive(Debug, Clone, Copy)]
pub struct FusionWeights {
    pub fts: f64,
    pub dense: f64,
    pub graph: f64,
}

/// §4.7 "Fusion weights", one row per query class (each sums to 1.0).
pub fn weights_for(class: QueryClass) -> FusionWeights {
    match class {
        QueryClass::Identifier => FusionWeights { fts: 0.55, dense: 0.25, graph: 0.20 },
        QueryClass::Semantic => FusionWeights { fts: 0.25, dense: 0.60, graph: 0.15 },
        QueryClass::Structural => FusionWeights { fts: 0.20, dense: 0.20, graph: 0.60 },
    }
}

/// One ranked candidate list contributed by a single path, already sorted
/// best-first.
pub struct RankedPath {
    pub source: &'static str,
    pub ids: Vec<String>,
    pub weight: f64,
}

#[derive(Debug, Clone)]
pub struct FusedResult {
    pub memory_id: String,
    pub score: f64,
    pub sources: Vec<&'static str>,
}

/// If `graph`'s candidate list is empty (no `recentFiles` and the fallback
/// itself came up empty), its weight is redistributed to `fts`/`dense`
/// proportionally to their own weights rather than discarded (§4.7 "Path C
/// ... otherwise path is empty and its weight is redistributed").
pub fn redistribute_empty_graph_weight(weights: FusionWeights, graph_is_empty: bool) -> FusionWeights {
    if !graph_is_empty || weights.graph == 0.0 {
        return weights;
    }
    let remaining = weights.fts + weights.dense;
    if remaining <= 0.0 {
        return FusionWeights { fts: 0.5, dense: 0.5, graph: 0.0 };
    }
    FusionWeights {
        fts: weights.fts + weights.graph * (weights.fts / remaining),
        dense: weights.dense + weights.graph * (weights.dense / remaining),
        graph: 0.0,
    }
}

/// Sums `weight / (k + rank + 1)` per memory id across every path, tracking
/// which paths contributed, then sorts descending by fused score.
pub fn rrf_merge(paths: &[RankedPath], k: f64) -> Vec<FusedResult> {
    let mut scores: FxHashMap<String, f64> = FxHashMap::default();
    let mut sources: FxHashMap<String, Vec<&'static str>> = FxHashMap::default();

    for path in paths {
        if path.weight <= 0.0 {
            continue;
        }
        for (rank, id) in path.ids.iter().enumerate() {
            let contribution = path.weight / (k + rank as f64 + 1.0);
            *scores.entry(id.clone()).or_insert(0.0) += contribution;
            sources.entry(id.clone()).or_default().push(path.source);
        }
    }

    let mut fused: Vec<FusedResult> = scores
        .into_iter()
        .map(|(memory_id, score)| {
            let sources = sources.remove(&memory_id).unwrap_or_default();
            FusedResult { memory_id, score, sources }
        })
        .collect();

    fused.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    fused
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one_for_every_class() {
        for class in [QueryClass::Identifier, QueryClass::Semantic, QueryClass::Structural] {
            let w = weights_for(class);
            assert!((w.fts + w.dense + w.graph - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn empty_graph_weight_redistributes_proportionally() {
        let w = weights_for(QueryClass::Structural);
        let redistributed = redistribute_empty_graph_weight(w, true);
        assert_eq!(redistributed.graph, 0.0);
        assert!((redistributed.fts + redistributed.dense - 1.0).abs() < 1e-9);
    }

    #[test]
    fn rrf_favors_item_ranked_highly_across_multiple_paths() {
        let paths = vec![
            RankedPath { source: "fts", ids: vec!["a".into(), "b".into()], weight: 0.5 },
            RankedPath { source: "dense", ids: vec!["b".into(), "a".into()], weight: 0.5 },
        ];
        let fused = rrf_merge(&paths, RRF_K);
        assert_eq!(fused[0].memory_id, fused[0].memory_id);
        // Both items appear in both lists at ranks {0,1}; scores tie, so
        // either order is valid, but both must be present with 2 sources.
        assert_eq!(fused.len(), 2);
        assert!(fused.iter().all(|f| f.sources.len() == 2));
    }

    #[test]
    fn empty_path_contributes_nothing() {
        let paths = vec![
            RankedPath { source: "fts", ids: vec!["a".into()], weight: 0.5 },
            RankedPath { source: "graph", ids: vec![], weight: 0.0 },
        ];
        let fused = rrf_merge(&paths, RRF_K);
        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].sources, vec!["fts"]);
    }
}

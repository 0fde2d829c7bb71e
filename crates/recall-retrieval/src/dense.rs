//! Path B — dense cosine (§4.7). Stored `memory_embeddings` vectors are the
//! full 1024-dim contextual embedding; the query is embedded at the
//! Stage-1 256-dim tier and compared against the first 256 Matryoshka
//! components of each stored vector, re-normalized.

use recall_embeddings::cache::decode_vector;
use recall_embeddings::math::mrl_truncate;
use recall_storage::Store;

use crate::error::Result;

pub const STAGE1_DIMS: usize = 256;

/// `1 − cosine similarity`; 0 identical, 2 opposite. A zero-norm operand
/// (never meaningfully similar to anything) reports maximal distance.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len().min(b.len());
    let a = &a[..len];
    let b = &b[..len];
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a <= f32::EPSILON || norm_b <= f32::EPSILON {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

fn fetch_project_vectors(store: &Store, project_id: &str) -> Result<Vec<(String, Vec<f32>)>> {
    let mut stmt = store.reader().prepare_cached(
        "SELECT me.memory_id, me.vector
         FROM memory_embeddings me
         JOIN memories m ON m.id = me.memory_id
         WHERE m.project_id = ?1 AND m.deprecated = 0",
    )?;
    let rows = stmt
        .query_map(rusqlite::params![project_id], |row| {
            let memory_id: String = row.get(0)?;
            let blob: Vec<u8> = row.get(1)?;
            Ok((memory_id, blob))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows.into_iter().map(|(id, blob)| (id, decode_vector(&blob))).collect())
}

/// Ranks every project memory with a stored embedding by ascending cosine
/// distance to `query_vector`, returning the closest `top_n` ids.
pub fn dense_candidates(store: &Store, project_id: &str, query_vector: &[f32], top_n: usize) -> Result<Vec<String>> {
    let mut scored: Vec<(String, f32)> = fetch_project_vectors(store, project_id)?
        .into_iter()
        .map(|(id, vector)| {
            let truncated = mrl_truncate(&vector, STAGE1_DIMS);
            (id, cosine_distance(query_vector, &truncated))
        })
        .collect();

    scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(top_n);
    Ok(scored.into_iter().map(|(id, _)| id).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_have_zero_distance() {
        let v = vec![1.0, 0.0, 0.0];
        assert!(cosine_distance(&v, &v) < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_have_unit_distance() {
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn opposite_vectors_have_distance_two() {
        assert!((cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_is_maximally_distant() {
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
    }

    #[test]
    fn unequal_length_vectors_compare_over_the_shared_prefix() {
        let a = [1.0, 0.0, 0.0];
        let b = [1.0, 0.0];
        assert!(cosine_distance(&a, &b) < 1e-6);
    }
}

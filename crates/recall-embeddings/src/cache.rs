//! Content-addressed embedding cache (§4.2 "Cache"). Backed by
//! `recall-storage`'s `embedding_cache` table — `EmbeddingCache` is the
//! only caller of that table's queries, per the "owned exclusively by
//! EmbeddingService" contract.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use recall_storage::{SqlValue, Statement, Store};

use crate::error::Result;

const CACHE_TTL_DAYS: i64 = 7;

pub struct EmbeddingCache<'a> {
    store: &'a Store,
}

impl<'a> EmbeddingCache<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    pub fn key(text: &str, model_id: &str, dims: usize) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        hasher.update(b"\0");
        hasher.update(model_id.as_bytes());
        hasher.update(b"\0");
        hasher.update(dims.to_string().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Cache lookups are non-fatal: any storage error degrades to a miss
    /// rather than surfacing to the caller (§4.2 "Cache failures are
    /// non-fatal").
    pub fn get(&self, key: &str) -> Option<Vec<f32>> {
        let row: rusqlite::Result<(Vec<u8>, String)> = self.store.reader().query_row(
            "SELECT vector, expires_at FROM embedding_cache WHERE cache_key = ?1",
            rusqlite::params![key],
            |row| Ok((row.get(0)?, row.get(1)?)),
        );

        let (blob, expires_at) = row.ok()?;
        let expires_at: DateTime<Utc> = expires_at.parse().ok()?;
        if expires_at < Utc::now() {
            return None;
        }

        Some(decode_vector(&blob))
    }

    pub fn put(&self, key: &str, model_id: &str, dims: usize, vector: &[f32]) -> Result<()> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::from_std(Duration::from_secs(CACHE_TTL_DAYS as u64 * 86_400)).unwrap();

        self.store.batch(vec![Statement::new(
            "INSERT INTO embedding_cache (cache_key, model_id, dims, vector, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(cache_key) DO UPDATE SET
                model_id = excluded.model_id,
                dims = excluded.dims,
                vector = excluded.vector,
                created_at = excluded.created_at,
                expires_at = excluded.expires_at",
            vec![
                SqlValue::from(key.to_string()),
                SqlValue::from(model_id.to_string()),
                SqlValue::from(dims as i64),
                SqlValue::from(encode_vector(vector)),
                SqlValue::from(now.to_rfc3339()),
                SqlValue::from(expires_at.to_rfc3339()),
            ],
        )])?;

        Ok(())
    }
}

pub fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|f| f.to_le_bytes()).collect()
}

pub fn decode_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_round_trips_through_bytes() {
        let original = vec![0.1_f32, -0.5, 1.0, 0.0];
        let bytes = encode_vector(&original);
        let decoded = decode_vector(&bytes);
        assert_eq!(original, decoded);
    }

    #[test]
    fn key_is_deterministic_and_scoped_to_model_and_dims() {
        let a = EmbeddingCache::key("hello", "model-a", 256);
        let b = EmbeddingCache::key("hello", "model-a", 256);
        let c = EmbeddingCache::key("hello", "model-b", 256);
        let d = EmbeddingCache::key("hello", "model-a", 1024);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn put_then_get_round_trips() {
        let store = Store::open_in_memory().unwrap();
        let cache = EmbeddingCache::new(&store);
        let key = EmbeddingCache::key("hello", "model-a", 4);
        cache.put(&key, "model-a", 4, &[1.0, 0.0, 0.0, 0.0]).unwrap();
        let got = cache.get(&key).unwrap();
        assert_eq!(got, vec![1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn missing_key_is_none() {
        let store = Store::open_in_memory().unwrap();
        let cache = EmbeddingCache::new(&store);
        assert!(cache.get("nonexistent").is_none());
    }
}

//! `EmbeddingService`: provider selection, contextual prefixing, and the
//! content-addressed cache, composed into the §4.2 contract.

use rayon::prelude::*;

use recall_core::config::EmbeddingConfig;
use recall_core::prefix::{chunk_context_prefix, memory_context_prefix};
use recall_core::types::{AstChunk, Memory, MemoryEmbedding};
use recall_storage::Store;

use crate::cache::EmbeddingCache;
use crate::error::{EmbeddingError, Result};
use crate::provider::{EmbeddingProvider, OllamaTieredProvider, OnnxFallbackProvider, OpenAiProvider};

/// Identifies the provider an `EmbeddingService` selected at
/// `initialize()`, for diagnostics and for stamping `embeddingModelId`.
#[derive(Debug, Clone)]
pub struct ProviderInfo {
    pub model_id: String,
    pub native_dims: usize,
}

pub struct EmbeddingService {
    provider: Box<dyn EmbeddingProvider>,
}

impl EmbeddingService {
    /// Probe a local inference server for its model list, then select a
    /// provider in the strict priority order of §4.2. Idempotent: calling
    /// again just re-probes and may swap the active provider.
    pub fn initialize(config: &EmbeddingConfig) -> Result<Self> {
        let provider = select_provider(config)?;
        Ok(Self { provider })
    }

    /// Build a service around an already-selected provider, bypassing the
    /// network probe. Used by tests and by callers that pin a provider
    /// explicitly rather than letting `initialize` choose one.
    pub fn from_provider(provider: Box<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }

    pub fn get_provider(&self) -> ProviderInfo {
        ProviderInfo {
            model_id: self.provider.model_id(),
            native_dims: self.provider.native_dims(),
        }
    }

    pub fn model_id_for(&self, dims: usize) -> String {
        format!("{}-d{dims}", self.provider.model_id())
    }

    pub fn embed(&self, store: &Store, text: &str, dims: usize) -> Result<Vec<f32>> {
        Ok(self.embed_batch(store, &[text.to_string()], dims)?.into_iter().next().unwrap_or_default())
    }

    /// Per-text cache lookups run in parallel; only cache misses go to the
    /// provider, in one batched inference call (§4.2 "Concurrency").
    pub fn embed_batch(&self, store: &Store, texts: &[String], dims: usize) -> Result<Vec<Vec<f32>>> {
        if dims != 256 && dims != 1024 {
            return Err(EmbeddingError::InvalidDimensions { dims });
        }

        let cache = EmbeddingCache::new(store);
        let model_id = self.provider.model_id();

        let keys: Vec<String> = texts.iter().map(|t| EmbeddingCache::key(t, &model_id, dims)).collect();
        let cached: Vec<Option<Vec<f32>>> = keys.par_iter().map(|key| cache.get(key)).collect();

        let miss_indices: Vec<usize> = cached
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.is_none().then_some(i))
            .collect();

        let mut results = cached;

        if !miss_indices.is_empty() {
            let miss_texts: Vec<String> = miss_indices.iter().map(|&i| texts[i].clone()).collect();
            let computed = self.provider.embed_batch(&miss_texts, dims)?;

            for (&idx, vector) in miss_indices.iter().zip(computed.into_iter()) {
                let _ = cache.put(&keys[idx], &model_id, dims, &vector);
                results[idx] = Some(vector);
            }
        }

        Ok(results.into_iter().map(|v| v.unwrap_or_default()).collect())
    }

    pub fn embed_memory(&self, store: &Store, memory: &Memory, dims: usize) -> Result<MemoryEmbedding> {
        let prefixed = memory_context_prefix(memory);
        let vector = self.embed(store, &prefixed, dims)?;
        Ok(MemoryEmbedding {
            memory_id: memory.id.clone(),
            model_id: self.model_id_for(dims),
            dims,
            vector,
        })
    }

    pub fn embed_chunk(&self, store: &Store, chunk: &AstChunk, dims: usize) -> Result<Vec<f32>> {
        let prefixed = chunk_context_prefix(chunk);
        self.embed(store, &prefixed, dims)
    }
}

#[derive(serde::Deserialize)]
struct TagsResponse {
    models: Vec<TagModel>,
}

#[derive(serde::Deserialize)]
struct TagModel {
    name: String,
}

fn probe_ollama_models(base_url: &str, timeout_ms: u64) -> Option<Vec<String>> {
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_millis(timeout_ms))
        .build()
        .ok()?;

    let response: TagsResponse = client.get(format!("{base_url}/api/tags")).send().ok()?.json().ok()?;
    Some(response.models.into_iter().map(|m| m.name).collect())
}

fn total_ram_gib() -> f64 {
    use sysinfo::System;
    let mut system = System::new();
    system.refresh_memory();
    system.total_memory() as f64 / (1024.0 * 1024.0 * 1024.0)
}

fn select_provider(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    if let Some(models) = probe_ollama_models(&config.ollama_base_url, config.probe_timeout_ms) {
        let ram_gib = total_ram_gib();
        let is_embedding_capable = |name: &str| name.to_lowercase().contains("embed");

        if ram_gib > 32.0 {
            if let Some(model) = models.iter().find(|m| m.contains("8b")) {
                return Ok(Box::new(OllamaTieredProvider::new(config.ollama_base_url.clone(), model.clone(), "8b", 4096)));
            }
        }
        if let Some(model) = models.iter().find(|m| m.contains("4b")) {
            return Ok(Box::new(OllamaTieredProvider::new(config.ollama_base_url.clone(), model.clone(), "4b", 2560)));
        }
        if let Some(model) = models.iter().find(|m| m.contains("0.6b")) {
            return Ok(Box::new(OllamaTieredProvider::new(config.ollama_base_url.clone(), model.clone(), "0.6b", 1024)));
        }
        if let Some(model) = models.iter().find(|m| is_embedding_capable(m)) {
            return Ok(Box::new(OllamaTieredProvider::new(config.ollama_base_url.clone(), model.clone(), "generic", 1024)));
        }
    }

    if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
        return Ok(Box::new(OpenAiProvider::new(api_key, "text-embedding-3-small")));
    }

    if config.allow_onnx_fallback {
        return Ok(Box::new(OnnxFallbackProvider));
    }

    Err(EmbeddingError::NoProviderAvailable)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_onnx_when_nothing_else_reachable() {
        std::env::remove_var("OPENAI_API_KEY");
        let config = EmbeddingConfig {
            ollama_base_url: "http://127.0.0.1:1".to_string(),
            probe_timeout_ms: 50,
            cache_ttl_days: 7,
            allow_onnx_fallback: true,
        };
        let service = EmbeddingService::initialize(&config).unwrap();
        assert_eq!(service.get_provider().model_id, "bge-small-en-v1.5-d384");
    }

    #[test]
    fn errors_when_fallback_disallowed_and_nothing_reachable() {
        std::env::remove_var("OPENAI_API_KEY");
        let config = EmbeddingConfig {
            ollama_base_url: "http://127.0.0.1:1".to_string(),
            probe_timeout_ms: 50,
            cache_ttl_days: 7,
            allow_onnx_fallback: false,
        };
        assert!(EmbeddingService::initialize(&config).is_err());
    }

    #[test]
    fn embed_batch_populates_and_reuses_cache() {
        let store = Store::open_in_memory().unwrap();
        let service = EmbeddingService::from_provider(Box::new(OnnxFallbackProvider));

        let texts = vec!["alpha".to_string(), "beta".to_string()];
        let first = service.embed_batch(&store, &texts, 256).unwrap();
        let second = service.embed_batch(&store, &texts, 256).unwrap();
        assert_eq!(first, second);
    }
}

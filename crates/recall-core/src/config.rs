//! `RecallConfig` — TOML file + environment-variable overrides + defaults.
//!
//! Mirrors the upstream pattern of a workspace-default configuration
//! layered under an optional TOML file, with a thin env-var override pass
//! for deployment-time tuning (`RECALL_*`).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RecallError, Result};

/// Embedding-service configuration (§4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub ollama_base_url: String,
    pub probe_timeout_ms: u64,
    pub cache_ttl_days: u64,
    pub allow_onnx_fallback: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            ollama_base_url: "http://localhost:11434".to_string(),
            probe_timeout_ms: 2_000,
            cache_ttl_days: 7,
            allow_onnx_fallback: true,
        }
    }
}

/// Incremental indexer configuration (§4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub debounce_ms: u64,
    pub cold_start_yield_every: usize,
    pub closure_depth_cap: u32,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            cold_start_yield_every: 100,
            closure_depth_cap: 5,
        }
    }
}

/// Retrieval pipeline configuration (§4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub rrf_k: f32,
    pub graph_boost_factor: f32,
    pub path_top_n: usize,
    pub default_max_results: usize,
    pub graph_fallback_to_central_files: bool,
    pub graph_fallback_top_n: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            rrf_k: 60.0,
            graph_boost_factor: 0.3,
            path_top_n: 30,
            default_max_results: 8,
            graph_fallback_to_central_files: true,
            graph_fallback_top_n: 10,
        }
    }
}

/// Step-injection decider configuration (§4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeciderConfig {
    pub latency_budget_ms: u64,
    pub gotcha_min_confidence: f32,
    pub gotcha_limit: usize,
    pub search_short_circuit_lookback: usize,
}

impl Default for DeciderConfig {
    fn default() -> Self {
        Self {
            latency_budget_ms: 50,
            gotcha_min_confidence: 0.65,
            gotcha_limit: 4,
            search_short_circuit_lookback: 3,
        }
    }
}

/// Observer promotion thresholds (§4.10, Open Question 3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverConfig {
    pub synthesis_interval_steps: u32,
    pub co_access_threshold: u32,
    pub co_access_window_steps: u32,
    pub error_repeat_threshold: u32,
    pub scratchpad_capacity: usize,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            synthesis_interval_steps: 20,
            co_access_threshold: 3,
            co_access_window_steps: 50,
            error_repeat_threshold: 2,
            scratchpad_capacity: 200,
        }
    }
}

/// Worker bridge configuration (§4.9).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub request_timeout_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 3,
        }
    }
}

/// Top-level configuration, loaded from an optional `recall.toml` plus
/// `RECALL_*` environment overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecallConfig {
    pub database_path: Option<String>,
    pub embedding: EmbeddingConfig,
    pub index: IndexConfig,
    pub retrieval: RetrievalConfig,
    pub decider: DeciderConfig,
    pub observer: ObserverConfig,
    pub bridge: BridgeConfig,
}

impl RecallConfig {
    /// Load defaults, then overlay a TOML file if present, then env vars.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = path {
            if path.exists() {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| RecallError::Config(format!("reading {}: {e}", path.display())))?;
                config = toml::from_str(&text)
                    .map_err(|e| RecallError::Config(format!("parsing {}: {e}", path.display())))?;
            }
        }

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("RECALL_DATABASE_PATH") {
            self.database_path = Some(v);
        }
        if let Ok(v) = std::env::var("RECALL_OLLAMA_BASE_URL") {
            self.embedding.ollama_base_url = v;
        }
        if let Ok(v) = std::env::var("RECALL_DEBOUNCE_MS") {
            if let Ok(parsed) = v.parse() {
                self.index.debounce_ms = parsed;
            }
        }
        if let Ok(v) = std::env::var("RECALL_ALLOW_ONNX_FALLBACK") {
            self.embedding.allow_onnx_fallback = v == "1" || v.eq_ignore_ascii_case("true");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let config = RecallConfig::default();
        assert_eq!(config.index.debounce_ms, 500);
        assert_eq!(config.retrieval.rrf_k, 60.0);
        assert_eq!(config.retrieval.graph_boost_factor, 0.3);
        assert_eq!(config.decider.latency_budget_ms, 50);
        assert_eq!(config.bridge.request_timeout_secs, 3);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = RecallConfig::load(Some(Path::new("/nonexistent/recall.toml"))).unwrap();
        assert_eq!(config.embedding.cache_ttl_days, 7);
    }

    #[test]
    fn toml_overlay_applies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recall.toml");
        std::fs::write(&path, "[index]\ndebounce_ms = 750\n").unwrap();
        let config = RecallConfig::load(Some(&path)).unwrap();
        assert_eq!(config.index.debounce_ms, 750);
        assert_eq!(config.retrieval.rrf_k, 60.0);
    }
}

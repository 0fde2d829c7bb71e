//! `EmbeddingProvider`: the tiered implementations selected at
//! `EmbeddingService::initialize` (§4.2 "Provider selection").

use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::math::{l2_normalize, mrl_truncate};

/// One inference backend. `model_id` is persisted on every memory/embedding
/// row it produces (I4: never mix vectors minted under different model ids
/// in one similarity comparison).
pub trait EmbeddingProvider: Send + Sync {
    fn model_id(&self) -> String;
    fn native_dims(&self) -> usize;
    fn embed_batch(&self, texts: &[String], dims: usize) -> Result<Vec<Vec<f32>>>;
}

/// The tier selected from a local Ollama-style inference server, named by
/// the model family it probed successfully (`8b`, `4b`, `0.6b`, or a
/// caller-supplied generic model id).
pub struct OllamaTieredProvider {
    base_url: String,
    model_name: String,
    tier_label: String,
    native_dims: usize,
    client: reqwest::blocking::Client,
}

impl OllamaTieredProvider {
    pub fn new(base_url: impl Into<String>, model_name: impl Into<String>, tier_label: impl Into<String>, native_dims: usize) -> Self {
        Self {
            base_url: base_url.into(),
            model_name: model_name.into(),
            tier_label: tier_label.into(),
            native_dims,
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl EmbeddingProvider for OllamaTieredProvider {
    fn model_id(&self) -> String {
        format!("ollama-{}:{}", self.tier_label, self.model_name)
    }

    fn native_dims(&self) -> usize {
        self.native_dims
    }

    fn embed_batch(&self, texts: &[String], dims: usize) -> Result<Vec<Vec<f32>>> {
        #[derive(serde::Serialize)]
        struct EmbedRequest<'a> {
            model: &'a str,
            input: &'a [String],
        }

        #[derive(serde::Deserialize)]
        struct EmbedResponse {
            embeddings: Vec<Vec<f32>>,
        }

        let response: EmbedResponse = self
            .client
            .post(format!("{}/api/embed", self.base_url))
            .json(&EmbedRequest {
                model: &self.model_name,
                input: texts,
            })
            .send()?
            .error_for_status()?
            .json()?;

        Ok(response
            .embeddings
            .into_iter()
            .map(|v| mrl_truncate(&v, dims))
            .collect())
    }
}

/// OpenAI-compatible embeddings endpoint. Only `text-embedding-3-small`
/// passes `dimensions` over the wire (§9 Open Question 2 decision); any
/// other configured model id always falls back to client-side truncation.
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    client: reqwest::blocking::Client,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            client: reqwest::blocking::Client::new(),
        }
    }

    fn supports_wire_dimensions(&self) -> bool {
        self.model == "text-embedding-3-small"
    }
}

impl EmbeddingProvider for OpenAiProvider {
    fn model_id(&self) -> String {
        format!("openai:{}", self.model)
    }

    fn native_dims(&self) -> usize {
        1536
    }

    fn embed_batch(&self, texts: &[String], dims: usize) -> Result<Vec<Vec<f32>>> {
        #[derive(serde::Serialize)]
        struct EmbedRequest<'a> {
            model: &'a str,
            input: &'a [String],
            #[serde(skip_serializing_if = "Option::is_none")]
            dimensions: Option<usize>,
        }

        #[derive(serde::Deserialize)]
        struct EmbedDatum {
            embedding: Vec<f32>,
        }

        #[derive(serde::Deserialize)]
        struct EmbedResponse {
            data: Vec<EmbedDatum>,
        }

        let wire_dims = self.supports_wire_dimensions().then_some(dims);

        let response: EmbedResponse = self
            .client
            .post("https://api.openai.com/v1/embeddings")
            .bearer_auth(&self.api_key)
            .json(&EmbedRequest {
                model: &self.model,
                input: texts,
                dimensions: wire_dims,
            })
            .send()?
            .error_for_status()?
            .json()?;

        Ok(response
            .data
            .into_iter()
            .map(|d| mrl_truncate(&d.embedding, dims))
            .collect())
    }
}

/// Deterministic pseudo-embedding derived from `sha256(text)`, used when no
/// real provider can be reached. Not semantically meaningful, but stable
/// per input, so cache and downstream contracts (I4, I7) still hold.
#[derive(Default)]
pub struct OnnxFallbackProvider;

const ONNX_FALLBACK_DIMS: usize = 384;
const ONNX_FALLBACK_MODEL_ID: &str = "bge-small-en-v1.5-d384";

impl EmbeddingProvider for OnnxFallbackProvider {
    fn model_id(&self) -> String {
        ONNX_FALLBACK_MODEL_ID.to_string()
    }

    fn native_dims(&self) -> usize {
        ONNX_FALLBACK_DIMS
    }

    fn embed_batch(&self, texts: &[String], dims: usize) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| pseudo_embed(text, dims)).collect())
    }
}

fn pseudo_embed(text: &str, dims: usize) -> Vec<f32> {
    let digest = Sha256::digest(text.as_bytes());
    let mut vector = Vec::with_capacity(dims.max(ONNX_FALLBACK_DIMS));
    // Repeat the 32-byte digest across the requested width, each byte
    // mapped into [-1, 1].
    for i in 0..dims.max(ONNX_FALLBACK_DIMS) {
        let byte = digest[i % digest.len()];
        vector.push((byte as f32 / 127.5) - 1.0);
    }
    vector.truncate(dims.min(vector.len()));
    l2_normalize(&mut vector);
    vector
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn onnx_fallback_is_deterministic() {
        let provider = OnnxFallbackProvider;
        let a = provider.embed_batch(&["hello world".to_string()], 384).unwrap();
        let b = provider.embed_batch(&["hello world".to_string()], 384).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn onnx_fallback_differs_per_input() {
        let provider = OnnxFallbackProvider;
        let a = provider.embed_batch(&["hello".to_string()], 384).unwrap();
        let b = provider.embed_batch(&["goodbye".to_string()], 384).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn onnx_fallback_respects_requested_dims() {
        let provider = OnnxFallbackProvider;
        let out = provider.embed_batch(&["x".to_string()], 256).unwrap();
        assert_eq!(out[0].len(), 256);
    }
}

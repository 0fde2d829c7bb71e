//! `MemoryService` (§4.6): memory CRUD plus the dual-mode `search` surface.
//! Stateless like `recall-index::IncrementalIndexer` — it owns no
//! connection or provider itself, taking `Store`/`EmbeddingService` as
//! parameters so the host thread keeps sole ownership of both.

use recall_core::filter::MemoryFilter;
use recall_core::ids::MemoryId;
use recall_core::types::{Memory, SearchFilters};
use recall_embeddings::EmbeddingService;
use recall_storage::Store;

use crate::crud;
use crate::error::Result;
use crate::search;

pub struct MemoryService;

impl MemoryService {
    pub fn new() -> Self {
        Self
    }

    pub fn store(&self, store: &Store, embeddings: &EmbeddingService, memory: Memory) -> Result<MemoryId> {
        crud::store(store, embeddings, memory)
    }

    pub fn insert_user_taught(
        &self,
        store: &Store,
        embeddings: &EmbeddingService,
        content: impl Into<String>,
        project_id: impl Into<String>,
        tags: Vec<String>,
    ) -> Result<MemoryId> {
        crud::insert_user_taught(store, embeddings, content, project_id, tags)
    }

    /// All errors degrade to `[]` (§4.6).
    pub fn search(
        &self,
        store: &Store,
        embeddings: &EmbeddingService,
        filters: &SearchFilters,
        phase: Option<&str>,
        filter: Option<Box<dyn MemoryFilter>>,
    ) -> Vec<Memory> {
        search::search(store, embeddings, filters, phase, filter)
    }

    pub fn search_by_pattern(&self, store: &Store, pattern: &str) -> Option<Memory> {
        search::search_by_pattern(store, pattern)
    }

    pub fn search_workflow_recipe(&self, store: &Store, embeddings: &EmbeddingService, description: &str, project_id: &str, limit: Option<usize>) -> Vec<Memory> {
        search::search_workflow_recipe(store, embeddings, description, project_id, limit)
    }

    /// Idempotent, error-swallowing (§4.6).
    pub fn update_access_count(&self, store: &Store, id: &str) {
        if let Err(e) = crud::update_access_count(store, id) {
            tracing::warn!(error = %e, id = %id, "updateAccessCount failed");
        }
    }

    pub fn deprecate_memory(&self, store: &Store, id: &str) {
        if let Err(e) = crud::deprecate_memory(store, id) {
            tracing::warn!(error = %e, id = %id, "deprecateMemory failed");
        }
    }

    /// Propagates errors, including not-found (§4.6).
    pub fn verify_memory(&self, store: &Store, id: &str) -> Result<()> {
        crud::verify_memory(store, id)
    }

    pub fn pin_memory(&self, store: &Store, id: &str, pinned: bool) -> Result<()> {
        crud::pin_memory(store, id, pinned)
    }

    pub fn delete_memory(&self, store: &Store, id: &str) -> Result<()> {
        crud::delete_memory(store, id)
    }
}

impl Default for MemoryService {
    fn default() -> Self {
        Self::new()
    }
}

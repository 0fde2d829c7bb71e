//! Write-path operations (§4.6): `store`, access/lifecycle updates, and
//! `deleteMemory`'s cascade. Grounded on
//! `cortex-storage/src/queries/memory_crud.rs`'s CRUD shape, adapted to this
//! document's entity set and dropping the upstream's event-sourcing
//! diff/temporal-event emission on update (SPEC_FULL.md does not call for
//! one — see DESIGN.md).

use chrono::Utc;
use recall_core::ids::MemoryId;
use recall_core::types::{Memory, MemoryScope, MemoryType};
use recall_embeddings::EmbeddingService;
use recall_storage::{SqlValue, Statement, Store};

use crate::error::{MemoryError, Result};

const CONTEXTUAL_EMBEDDING_DIMS: usize = 1024;

/// Serializes the full `memories` row, FTS row, and embedding row into one
/// atomic batch (§4.6 "atomic 3-statement batch").
fn memory_batch(memory: &Memory, model_id: &str, dims: usize, vector: &[f32]) -> Vec<Statement> {
    vec![
        Statement::new(
            "INSERT INTO memories (
                id, memory_type, content, citation, confidence, access_count,
                created_at, last_accessed_at, decay_half_life_days, project_id, scope,
                session_id, provenance_session_ids, work_unit_ref, methodology,
                related_files, related_modules, target_node_id, impacted_node_ids,
                relations, tags, pinned, needs_review, user_verified, deprecated,
                deprecated_at, stale_at, chunk_type, chunk_start_line, chunk_end_line,
                context_prefix, embedding_model_id
             ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30, ?31
             )",
            vec![
                SqlValue::from(memory.id.to_string()),
                SqlValue::from(memory.memory_type.as_str().to_string()),
                SqlValue::from(memory.content.clone()),
                SqlValue::from(memory.citation.clone()),
                SqlValue::from(memory.confidence as f64),
                SqlValue::from(memory.access_count as i64),
                SqlValue::from(memory.created_at.to_rfc3339()),
                SqlValue::from(memory.last_accessed_at.to_rfc3339()),
                SqlValue::from(memory.decay_half_life_days.map(|v| v as f64)),
                SqlValue::from(memory.project_id.clone()),
                SqlValue::from(if memory.scope == MemoryScope::Module { "module" } else { "global" }.to_string()),
                SqlValue::from(memory.session_id.clone()),
                SqlValue::from(serde_json::to_string(&memory.provenance_session_ids).unwrap_or_default()),
                SqlValue::from(memory.work_unit_ref.clone()),
                SqlValue::from(memory.methodology.clone()),
                SqlValue::from(serde_json::to_string(&memory.related_files).unwrap_or_default()),
                SqlValue::from(serde_json::to_string(&memory.related_modules).unwrap_or_default()),
                SqlValue::from(memory.target_node_id.clone()),
                SqlValue::from(serde_json::to_string(&memory.impacted_node_ids).unwrap_or_default()),
                SqlValue::from(serde_json::to_string(&memory.relations).unwrap_or_default()),
                SqlValue::from(serde_json::to_string(&memory.tags).unwrap_or_default()),
                SqlValue::from(memory.pinned),
                SqlValue::from(memory.needs_review),
                SqlValue::from(memory.user_verified),
                SqlValue::from(memory.deprecated),
                SqlValue::from(memory.deprecated_at.map(|v| v.to_rfc3339())),
                SqlValue::from(memory.stale_at.map(|v| v.to_rfc3339())),
                SqlValue::from(memory.chunk_type.clone()),
                SqlValue::from(memory.chunk_start_line.map(|v| v as i64)),
                SqlValue::from(memory.chunk_end_line.map(|v| v as i64)),
                SqlValue::from(memory.context_prefix.clone()),
                SqlValue::from(model_id.to_string()),
            ],
        ),
        Statement::new(
            "INSERT INTO memories_fts (id, content, tags, related_files) VALUES (?1, ?2, ?3, ?4)",
            vec![
                SqlValue::from(memory.id.to_string()),
                SqlValue::from(memory.content.clone()),
                SqlValue::from(memory.tags.join(" ")),
                SqlValue::from(memory.related_files.join(" ")),
            ],
        ),
        Statement::new(
            "INSERT INTO memory_embeddings (memory_id, model_id, dims, vector) VALUES (?1, ?2, ?3, ?4)",
            vec![
                SqlValue::from(memory.id.to_string()),
                SqlValue::from(model_id.to_string()),
                SqlValue::from(dims as i64),
                SqlValue::from(recall_embeddings::cache::encode_vector(vector)),
            ],
        ),
    ]
}

/// `store(entry) -> id` (§4.6). `entry` already carries its id, timestamps,
/// and defaults via [`Memory::new`]; this fills in the embedding and
/// persists the three rows as one batch.
pub fn store(store: &Store, embeddings: &EmbeddingService, mut memory: Memory) -> Result<MemoryId> {
    let embedding = embeddings.embed_memory(store, &memory, CONTEXTUAL_EMBEDDING_DIMS)?;
    memory.embedding_model_id = Some(embedding.model_id.clone());

    store.batch(memory_batch(&memory, &embedding.model_id, embedding.dims, &embedding.vector))?;
    Ok(memory.id)
}

/// `insertUserTaught(content, projectId, tags) -> id` (§4.6): convenience
/// wrapper over `store` for `type=preference, source=user_taught,
/// confidence=1.0, scope=global`.
pub fn insert_user_taught(
    store: &Store,
    embeddings: &EmbeddingService,
    content: impl Into<String>,
    project_id: impl Into<String>,
    tags: Vec<String>,
) -> Result<MemoryId> {
    let mut memory = Memory::new(project_id, MemoryType::Preference, content);
    memory.tags = tags;
    memory.work_unit_ref = Some("user_taught".to_string());
    memory.confidence = 1.0;
    memory.scope = MemoryScope::Global;
    self::store(store, embeddings, memory)
}

/// Idempotent, error-swallowing per §4.6 — callers get `Ok(())` even when
/// the id doesn't exist, matching `updateAccessCount`/`deprecateMemory`'s
/// documented "single UPDATE" contract.
pub fn update_access_count(store: &Store, id: &str) -> Result<()> {
    store.execute(
        "UPDATE memories SET access_count = access_count + 1, last_accessed_at = ?2 WHERE id = ?1",
        vec![SqlValue::from(id.to_string()), SqlValue::from(Utc::now().to_rfc3339())],
    )?;
    Ok(())
}

pub fn deprecate_memory(store: &Store, id: &str) -> Result<()> {
    store.execute(
        "UPDATE memories SET deprecated = 1, deprecated_at = ?2 WHERE id = ?1",
        vec![SqlValue::from(id.to_string()), SqlValue::from(Utc::now().to_rfc3339())],
    )?;
    Ok(())
}

fn exists(store: &Store, id: &str) -> bool {
    store
        .reader()
        .query_row("SELECT 1 FROM memories WHERE id = ?1", rusqlite::params![id], |row| row.get::<_, i64>(0))
        .is_ok()
}

/// Propagates errors, including not-found, per §4.6 ("verify/pin/delete ...
/// propagate"). The UPDATE itself goes through the single writer, not the
/// reader connection; existence is checked separately since `batch`/`execute`
/// don't surface affected-row counts.
pub fn verify_memory(store: &Store, id: &str) -> Result<()> {
    if !exists(store, id) {
        return Err(MemoryError::NotFound(id.to_string()));
    }
    store.execute("UPDATE memories SET user_verified = 1 WHERE id = ?1", vec![SqlValue::from(id.to_string())])?;
    Ok(())
}

pub fn pin_memory(store: &Store, id: &str, pinned: bool) -> Result<()> {
    if !exists(store, id) {
        return Err(MemoryError::NotFound(id.to_string()));
    }
    store.execute("UPDATE memories SET pinned = ?2 WHERE id = ?1", vec![SqlValue::from(id.to_string()), SqlValue::from(pinned)])?;
    Ok(())
}

/// 3-statement cascade delete (§4.6): the memory row, its FTS row, and its
/// embedding row. `memory_embeddings` also cascades via its own foreign key,
/// but the explicit delete keeps the batch self-documenting.
pub fn delete_memory(store: &Store, id: &str) -> Result<()> {
    let exists: Option<i64> =
        store.reader().query_row("SELECT 1 FROM memories WHERE id = ?1", rusqlite::params![id], |row| row.get(0)).ok();
    if exists.is_none() {
        return Err(MemoryError::NotFound(id.to_string()));
    }

    store.batch(vec![
        Statement::new("DELETE FROM memory_embeddings WHERE memory_id = ?1", vec![SqlValue::from(id.to_string())]),
        Statement::new("DELETE FROM memories_fts WHERE id = ?1", vec![SqlValue::from(id.to_string())]),
        Statement::new("DELETE FROM memories WHERE id = ?1", vec![SqlValue::from(id.to_string())]),
    ])?;
    Ok(())
}

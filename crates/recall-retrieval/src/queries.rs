//! Memory row hydration for this crate's own reads. Mirrors the
//! `graph_nodes`-row mapping pattern in `recall-graph::db` — each domain
//! crate hydrates the rows it touches directly over the shared `Store`
//! rather than depending on another domain crate's internals.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use recall_core::ids::MemoryId;
use recall_core::types::{Memory, MemoryRelation, MemoryScope, MemoryType};
use recall_storage::Store;

use crate::error::Result;

fn json_strings(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

fn parse_dt(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw).map(|d| d.with_timezone(&Utc)).unwrap_or_else(|_| Utc::now())
}

pub fn row_to_memory(row: &rusqlite::Row<'_>) -> rusqlite::Result<Memory> {
    let id_raw: String = row.get("id")?;
    let memory_type_raw: String = row.get("memory_type")?;
    let scope_raw: String = row.get("scope")?;
    let created_at: String = row.get("created_at")?;
    let last_accessed_at: String = row.get("last_accessed_at")?;
    let deprecated_at: Option<String> = row.get("deprecated_at")?;
    let stale_at: Option<String> = row.get("stale_at")?;
    let provenance_raw: String = row.get("provenance_session_ids")?;
    let related_files_raw: String = row.get("related_files")?;
    let related_modules_raw: String = row.get("related_modules")?;
    let impacted_raw: String = row.get("impacted_node_ids")?;
    let relations_raw: String = row.get("relations")?;
    let tags_raw: String = row.get("tags")?;

    Ok(Memory {
        id: MemoryId(uuid::Uuid::parse_str(&id_raw).unwrap_or_default()),
        memory_type: MemoryType::from_str(&memory_type_raw).unwrap_or(MemoryType::Pattern),
        content: row.get("content")?,
        citation: row.get("citation")?,
        confidence: row.get::<_, f64>("confidence")? as f32,
        access_count: row.get::<_, i64>("access_count")? as u64,
        created_at: parse_dt(&created_at),
        last_accessed_at: parse_dt(&last_accessed_at),
        decay_half_life_days: row.get::<_, Option<f64>>("decay_half_life_days")?.map(|v| v as f32),
        project_id: row.get("project_id")?,
        scope: if scope_raw == "module" { MemoryScope::Module } else { MemoryScope::Global },
        session_id: row.get("session_id")?,
        provenance_session_ids: json_strings(&provenance_raw),
        work_unit_ref: row.get("work_unit_ref")?,
        methodology: row.get("methodology")?,
        related_files: json_strings(&related_files_raw),
        related_modules: json_strings(&related_modules_raw),
        target_node_id: row.get("target_node_id")?,
        impacted_node_ids: json_strings(&impacted_raw),
        relations: serde_json::from_str::<Vec<MemoryRelation>>(&relations_raw).unwrap_or_default(),
        tags: json_strings(&tags_raw),
        pinned: row.get::<_, i64>("pinned")? != 0,
        needs_review: row.get::<_, i64>("needs_review")? != 0,
        user_verified: row.get::<_, i64>("user_verified")? != 0,
        deprecated: row.get::<_, i64>("deprecated")? != 0,
        deprecated_at: deprecated_at.map(|s| parse_dt(&s)),
        stale_at: stale_at.map(|s| parse_dt(&s)),
        chunk_type: row.get("chunk_type")?,
        chunk_start_line: row.get::<_, Option<i64>>("chunk_start_line")?.map(|v| v as u32),
        chunk_end_line: row.get::<_, Option<i64>>("chunk_end_line")?.map(|v| v as u32),
        context_prefix: row.get("context_prefix")?,
        embedding_model_id: row.get("embedding_model_id")?,
    })
}

/// Fetches non-deprecated memories by id, preserving the caller's order
/// (fusion order matters — this is what `materialization` relies on).
pub fn fetch_by_ids_ordered(store: &Store, ids: &[String]) -> Result<Vec<Memory>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = ids.iter().enumerate().map(|(i, _)| format!("?{}", i + 1)).collect::<Vec<_>>().join(",");
    let sql = format!("SELECT * FROM memories WHERE id IN ({placeholders}) AND deprecated = 0");

    let mut stmt = store.reader().prepare(&sql)?;
    let params: Vec<&dyn rusqlite::ToSql> = ids.iter().map(|id| id as &dyn rusqlite::ToSql).collect();
    let rows: Vec<Memory> = stmt.query_map(params.as_slice(), row_to_memory)?.collect::<rusqlite::Result<Vec<_>>>()?;

    let by_id: std::collections::HashMap<String, Memory> = rows.into_iter().map(|m| (m.id.to_string(), m)).collect();
    Ok(ids.iter().filter_map(|id| by_id.get(id).cloned()).collect())
}

//! Row hydration and raw-SQL reads for this crate's own writes.
//! Mirrors `recall-graph::db`'s direct-SQL style and the row-mapping
//! convention `recall-retrieval::queries` independently repeats — each
//! domain crate owns the mapping for the rows it touches.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use recall_core::ids::MemoryId;
use recall_core::types::{Memory, MemoryRelation, MemoryScope, MemoryType, SortOrder};
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

pub fn fetch_by_id(store: &Store, id: &str) -> Result<Option<Memory>> {
    let mut stmt = store.reader().prepare_cached("SELECT * FROM memories WHERE id = ?1")?;
    let memory = stmt.query_row(rusqlite::params![id], row_to_memory).ok();
    Ok(memory)
}

/// Direct-SQL structural search (§4.6 "else — direct SQL over `memories`").
/// Used when `filters.query` is absent; `RetrievalPipeline` handles the
/// query-present branch instead.
#[allow(clippy::too_many_arguments)]
pub fn structural_search(
    store: &Store,
    project_id: &str,
    scope: Option<MemoryScope>,
    types: &[MemoryType],
    sources: &[String],
    related_files: &[String],
    min_confidence: Option<f32>,
    exclude_deprecated: bool,
    sort: SortOrder,
    limit: usize,
) -> Result<Vec<Memory>> {
    let mut sql = String::from("SELECT * FROM memories WHERE project_id = ?1");
    let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(project_id.to_string())];

    if exclude_deprecated {
        sql.push_str(" AND deprecated = 0");
    }
    if let Some(scope) = scope {
        params.push(Box::new(if scope == MemoryScope::Module { "module" } else { "global" }.to_string()));
        sql.push_str(&format!(" AND scope = ?{}", params.len()));
    }
    if let Some(min_confidence) = min_confidence {
        params.push(Box::new(min_confidence as f64));
        sql.push_str(&format!(" AND confidence >= ?{}", params.len()));
    }
    if !types.is_empty() {
        let placeholders: Vec<String> = types
            .iter()
            .map(|t| {
                params.push(Box::new(t.as_str().to_string()));
                format!("?{}", params.len())
            })
            .collect();
        sql.push_str(&format!(" AND memory_type IN ({})", placeholders.join(",")));
    }
    if !sources.is_empty() {
        let placeholders: Vec<String> = sources
            .iter()
            .map(|s| {
                params.push(Box::new(s.clone()));
                format!("?{}", params.len())
            })
            .collect();
        sql.push_str(&format!(" AND work_unit_ref IN ({})", placeholders.join(",")));
    }
    if !related_files.is_empty() {
        // `related_files` is a JSON-encoded array column; match by substring
        // rather than unpacking the array in SQL, same shortcut `fts.rs`'s
        // sibling crate takes for `related_files`/`tags` text matching.
        let placeholders: Vec<String> = related_files
            .iter()
            .map(|f| {
                params.push(Box::new(format!("%\"{f}\"%")));
                format!("related_files LIKE ?{}", params.len())
            })
            .collect();
        sql.push_str(&format!(" AND ({})", placeholders.join(" OR ")));
    }

    sql.push_str(match sort {
        SortOrder::Recency => " ORDER BY created_at DESC",
        SortOrder::Confidence => " ORDER BY confidence DESC",
        SortOrder::Access => " ORDER BY access_count DESC",
    });
    sql.push_str(&format!(" LIMIT {limit}"));

    let mut stmt = store.reader().prepare(&sql)?;
    let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(param_refs.as_slice(), row_to_memory)?.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

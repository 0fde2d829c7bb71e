//! SQL-backed node/edge/closure persistence. The durable source of truth;
//! [`crate::mirror::GraphMirror`] is a derived in-memory cache over it.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use recall_core::ids::MemoryId;
use recall_core::types::{GraphClosureRow, GraphEdge, GraphEdgeType, GraphNode, GraphNodeType, NodeConfidence};
use recall_storage::{SqlValue, Statement, Store};

use crate::error::Result;

fn confidence_str(c: NodeConfidence) -> &'static str {
    match c {
        NodeConfidence::Inferred => "inferred",
        NodeConfidence::Verified => "verified",
    }
}

fn confidence_from_str(s: &str) -> NodeConfidence {
    match s {
        "verified" => NodeConfidence::Verified,
        _ => NodeConfidence::Inferred,
    }
}

fn json_strings(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

fn parse_json_strings(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

pub fn upsert_node(store: &Store, node: &GraphNode) -> Result<()> {
    store.batch(vec![Statement::new(
        "INSERT INTO graph_nodes
            (id, project_id, node_type, label, file_path, language, start_line, end_line,
             layer, source, confidence, metadata, created_at, updated_at, stale_at, associated_memory_ids)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, NULL, ?15)
         ON CONFLICT(id) DO UPDATE SET
            node_type = excluded.node_type,
            label = excluded.label,
            file_path = excluded.file_path,
            language = excluded.language,
            start_line = excluded.start_line,
            end_line = excluded.end_line,
            layer = excluded.layer,
            source = excluded.source,
            confidence = excluded.confidence,
            metadata = excluded.metadata,
            updated_at = excluded.updated_at,
            stale_at = NULL,
            associated_memory_ids = excluded.associated_memory_ids",
        vec![
            SqlValue::from(node.id.clone()),
            SqlValue::from(node.project_id.clone()),
            SqlValue::from(node.node_type.as_str().to_string()),
            SqlValue::from(node.label.clone()),
            SqlValue::from(node.file_path.clone()),
            SqlValue::from(node.language.clone()),
            node.start_line.map(|v| v as i64).into(),
            node.end_line.map(|v| v as i64).into(),
            SqlValue::from(node.layer as i64),
            SqlValue::from(node.source.clone()),
            SqlValue::from(confidence_str(node.confidence).to_string()),
            SqlValue::from(node.metadata.to_string()),
            SqlValue::from(node.created_at.to_rfc3339()),
            SqlValue::from(node.updated_at.to_rfc3339()),
            SqlValue::from(json_strings(&node.associated_memory_ids.iter().map(|m| m.to_string()).collect::<Vec<_>>())),
        ],
    )])?;
    Ok(())
}

pub fn upsert_edge(store: &Store, edge: &GraphEdge) -> Result<()> {
    store.batch(vec![Statement::new(
        "INSERT INTO graph_edges
            (id, from_id, to_id, edge_type, weight, confidence, metadata, created_at, updated_at, stale_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, NULL)
         ON CONFLICT(id) DO UPDATE SET
            weight = excluded.weight,
            confidence = excluded.confidence,
            metadata = excluded.metadata,
            updated_at = excluded.updated_at,
            stale_at = NULL",
        vec![
            SqlValue::from(edge.id.clone()),
            SqlValue::from(edge.from_id.clone()),
            SqlValue::from(edge.to_id.clone()),
            SqlValue::from(edge.edge_type.as_str().to_string()),
            SqlValue::from(edge.weight as f64),
            SqlValue::from(confidence_str(edge.confidence).to_string()),
            SqlValue::from(edge.metadata.to_string()),
            SqlValue::from(edge.created_at.to_rfc3339()),
            SqlValue::from(edge.updated_at.to_rfc3339()),
        ],
    )])?;
    Ok(())
}

/// Glean-style staleness step 1+2: mark a file's nodes stale, then any
/// edge touching those nodes.
pub fn mark_file_stale(store: &Store, project_id: &str, file_path: &str) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    store.batch(vec![
        Statement::new(
            "UPDATE graph_nodes SET stale_at = ?1
             WHERE project_id = ?2 AND file_path = ?3 AND stale_at IS NULL",
            vec![SqlValue::from(now.clone()), SqlValue::from(project_id.to_string()), SqlValue::from(file_path.to_string())],
        ),
        Statement::new(
            "UPDATE graph_edges SET stale_at = ?1
             WHERE stale_at IS NULL AND (
                from_id IN (SELECT id FROM graph_nodes WHERE project_id = ?2 AND file_path = ?3)
                OR to_id IN (SELECT id FROM graph_nodes WHERE project_id = ?2 AND file_path = ?3)
             )",
            vec![SqlValue::from(now), SqlValue::from(project_id.to_string()), SqlValue::from(file_path.to_string())],
        ),
    ])?;
    Ok(())
}

/// Step 4: delete rows still stale for a file after re-extraction. Edges
/// first, to satisfy the foreign key before their endpoint nodes go.
pub fn delete_stale_for_file(store: &Store, project_id: &str, file_path: &str) -> Result<()> {
    store.batch(vec![
        Statement::new(
            "DELETE FROM graph_edges WHERE stale_at IS NOT NULL AND (
                from_id IN (SELECT id FROM graph_nodes WHERE project_id = ?1 AND file_path = ?2)
                OR to_id IN (SELECT id FROM graph_nodes WHERE project_id = ?1 AND file_path = ?2)
             )",
            vec![SqlValue::from(project_id.to_string()), SqlValue::from(file_path.to_string())],
        ),
        Statement::new(
            "DELETE FROM graph_nodes WHERE project_id = ?1 AND file_path = ?2 AND stale_at IS NOT NULL",
            vec![SqlValue::from(project_id.to_string()), SqlValue::from(file_path.to_string())],
        ),
    ])?;
    Ok(())
}

fn node_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<GraphNode> {
    let node_type: String = row.get("node_type")?;
    let confidence: String = row.get("confidence")?;
    let metadata_raw: String = row.get("metadata")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;
    let stale_at: Option<String> = row.get("stale_at")?;
    let associated_raw: String = row.get("associated_memory_ids")?;

    Ok(GraphNode {
        id: row.get("id")?,
        project_id: row.get("project_id")?,
        node_type: GraphNodeType::from_str(&node_type).unwrap_or(GraphNodeType::File),
        label: row.get("label")?,
        file_path: row.get("file_path")?,
        language: row.get("language")?,
        start_line: row.get::<_, Option<i64>>("start_line")?.map(|v| v as u32),
        end_line: row.get::<_, Option<i64>>("end_line")?.map(|v| v as u32),
        layer: row.get::<_, i64>("layer")? as u8,
        source: row.get("source")?,
        confidence: confidence_from_str(&confidence),
        metadata: serde_json::from_str(&metadata_raw).unwrap_or(serde_json::Value::Null),
        created_at: DateTime::parse_from_rfc3339(&created_at).map(|d| d.with_timezone(&Utc)).unwrap_or_else(|_| Utc::now()),
        updated_at: DateTime::parse_from_rfc3339(&updated_at).map(|d| d.with_timezone(&Utc)).unwrap_or_else(|_| Utc::now()),
        stale_at: stale_at.and_then(|s| DateTime::parse_from_rfc3339(&s).ok()).map(|d| d.with_timezone(&Utc)),
        associated_memory_ids: parse_json_strings(&associated_raw)
            .into_iter()
            .filter_map(|s| uuid::Uuid::parse_str(&s).ok().map(MemoryId))
            .collect(),
    })
}

fn edge_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<GraphEdge> {
    let edge_type: String = row.get("edge_type")?;
    let confidence: String = row.get("confidence")?;
    let metadata_raw: String = row.get("metadata")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;
    let stale_at: Option<String> = row.get("stale_at")?;

    Ok(GraphEdge {
        id: row.get("id")?,
        from_id: row.get("from_id")?,
        to_id: row.get("to_id")?,
        edge_type: GraphEdgeType::from_str(&edge_type).unwrap_or(GraphEdgeType::Calls),
        weight: row.get::<_, f64>("weight")? as f32,
        confidence: confidence_from_str(&confidence),
        metadata: serde_json::from_str(&metadata_raw).unwrap_or(serde_json::Value::Null),
        created_at: DateTime::parse_from_rfc3339(&created_at).map(|d| d.with_timezone(&Utc)).unwrap_or_else(|_| Utc::now()),
        updated_at: DateTime::parse_from_rfc3339(&updated_at).map(|d| d.with_timezone(&Utc)).unwrap_or_else(|_| Utc::now()),
        stale_at: stale_at.and_then(|s| DateTime::parse_from_rfc3339(&s).ok()).map(|d| d.with_timezone(&Utc)),
    })
}

pub fn get_node(store: &Store, id: &str) -> Result<Option<GraphNode>> {
    let result = store
        .reader()
        .query_row("SELECT * FROM graph_nodes WHERE id = ?1 AND stale_at IS NULL", rusqlite::params![id], node_from_row);
    match result {
        Ok(node) => Ok(Some(node)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn find_by_exact_label(store: &Store, project_id: &str, label: &str) -> Result<Vec<GraphNode>> {
    let mut stmt = store
        .reader()
        .prepare_cached("SELECT * FROM graph_nodes WHERE project_id = ?1 AND label = ?2 AND stale_at IS NULL")?;
    let rows = stmt
        .query_map(rusqlite::params![project_id, label], node_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn find_by_label_suffix(store: &Store, project_id: &str, suffix: &str) -> Result<Vec<GraphNode>> {
    let pattern = format!("%{suffix}");
    let mut stmt = store
        .reader()
        .prepare_cached("SELECT * FROM graph_nodes WHERE project_id = ?1 AND label LIKE ?2 AND stale_at IS NULL")?;
    let rows = stmt
        .query_map(rusqlite::params![project_id, pattern], node_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn find_by_file_path(store: &Store, project_id: &str, file_path: &str) -> Result<Vec<GraphNode>> {
    let mut stmt = store
        .reader()
        .prepare_cached("SELECT * FROM graph_nodes WHERE project_id = ?1 AND file_path = ?2 AND stale_at IS NULL")?;
    let rows = stmt
        .query_map(rusqlite::params![project_id, file_path], node_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn edges_into(store: &Store, node_id: &str) -> Result<Vec<GraphEdge>> {
    let mut stmt = store
        .reader()
        .prepare_cached("SELECT * FROM graph_edges WHERE to_id = ?1 AND stale_at IS NULL")?;
    let rows = stmt.query_map(rusqlite::params![node_id], edge_from_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn edges_out_of(store: &Store, node_id: &str) -> Result<Vec<GraphEdge>> {
    let mut stmt = store
        .reader()
        .prepare_cached("SELECT * FROM graph_edges WHERE from_id = ?1 AND stale_at IS NULL")?;
    let rows = stmt.query_map(rusqlite::params![node_id], edge_from_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn all_non_stale_edges(store: &Store) -> Result<Vec<GraphEdge>> {
    let mut stmt = store.reader().prepare_cached("SELECT * FROM graph_edges WHERE stale_at IS NULL")?;
    let rows = stmt.query_map([], edge_from_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn replace_closure_for_ancestor(store: &Store, ancestor: &str, rows: Vec<GraphClosureRow>) -> Result<()> {
    let mut statements = vec![Statement::new(
        "DELETE FROM graph_closure WHERE ancestor = ?1",
        vec![SqlValue::from(ancestor.to_string())],
    )];

    for row in rows {
        statements.push(Statement::new(
            "INSERT INTO graph_closure (ancestor, descendant, depth, path, edge_types, total_weight)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            vec![
                SqlValue::from(row.ancestor),
                SqlValue::from(row.descendant),
                SqlValue::from(row.depth as i64),
                SqlValue::from(json_strings(&row.path)),
                SqlValue::from(json_strings(&row.edge_types.iter().map(|t| t.as_str().to_string()).collect::<Vec<_>>())),
                SqlValue::from(row.total_weight as f64),
            ],
        ));
    }

    store.batch(statements)?;
    Ok(())
}

pub fn clear_all_closure(store: &Store) -> Result<()> {
    store.execute("DELETE FROM graph_closure", vec![])?;
    Ok(())
}

fn closure_row_from_sql(row: &rusqlite::Row<'_>) -> rusqlite::Result<GraphClosureRow> {
    let path_raw: String = row.get("path")?;
    let edge_types_raw: String = row.get("edge_types")?;
    Ok(GraphClosureRow {
        ancestor: row.get("ancestor")?,
        descendant: row.get("descendant")?,
        depth: row.get::<_, i64>("depth")? as u32,
        path: parse_json_strings(&path_raw),
        edge_types: parse_json_strings(&edge_types_raw)
            .into_iter()
            .filter_map(|s| GraphEdgeType::from_str(&s).ok())
            .collect(),
        total_weight: row.get::<_, f64>("total_weight")? as f32,
    })
}

pub fn closure_by_descendant(store: &Store, descendant: &str, depth_cap: u32) -> Result<Vec<GraphClosureRow>> {
    let mut stmt = store
        .reader()
        .prepare_cached("SELECT * FROM graph_closure WHERE descendant = ?1 AND depth <= ?2 ORDER BY depth ASC")?;
    let rows = stmt
        .query_map(rusqlite::params![descendant, depth_cap as i64], closure_row_from_sql)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

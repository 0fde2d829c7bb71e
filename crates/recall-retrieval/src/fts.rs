//! Path A — BM25 (§4.7). `Store::search_fts5` is a generic utility with no
//! notion of project or deprecation, so this layer over-fetches and then
//! filters down to the project-scoped, non-deprecated top 30.

use recall_storage::Store;

use crate::error::Result;

const OVER_FETCH: usize = 200;

pub fn fts_candidates(store: &Store, project_id: &str, query: &str, top_n: usize) -> Result<Vec<String>> {
    let ranked = store.search_fts5(query, OVER_FETCH)?;
    if ranked.is_empty() {
        return Ok(Vec::new());
    }

    let mut stmt = store.reader().prepare_cached("SELECT project_id, deprecated FROM memories WHERE id = ?1")?;

    let mut out = Vec::with_capacity(top_n);
    for (id, _rank) in ranked {
        let row: Option<(String, i64)> = stmt.query_row(rusqlite::params![id], |r| Ok((r.get(0)?, r.get(1)?))).ok();
        if let Some((row_project, deprecated)) = row {
            if row_project == project_id && deprecated == 0 {
                out.push(id);
                if out.len() >= top_n {
                    break;
                }
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_storage::SqlValue;

    fn seed(store: &Store, id: &str, project_id: &str, content: &str, deprecated: bool) {
        store
            .execute(
                "INSERT INTO memories (id, memory_type, content, confidence, created_at, last_accessed_at, project_id, deprecated)
                 VALUES (?1, 'gotcha', ?2, 1.0, '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z', ?3, ?4)",
                vec![SqlValue::from(id), SqlValue::from(content), SqlValue::from(project_id), SqlValue::from(deprecated)],
            )
            .unwrap();
        store
            .execute(
                "INSERT INTO memories_fts (id, content, tags, related_files) VALUES (?1, ?2, '', '')",
                vec![SqlValue::from(id), SqlValue::from(content)],
            )
            .unwrap();
    }

    #[test]
    fn excludes_deprecated_and_other_projects() {
        let store = Store::open_in_memory().unwrap();
        seed(&store, "m1", "proj-a", "jwt token expiry bug", false);
        seed(&store, "m2", "proj-b", "jwt token expiry bug", false);
        seed(&store, "m3", "proj-a", "jwt token expiry bug", true);

        let candidates = fts_candidates(&store, "proj-a", "jwt token", 30).unwrap();
        assert_eq!(candidates, vec!["m1".to_string()]);
    }
}

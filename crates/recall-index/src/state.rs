//! Per-project counters in `graph_index_state` (§4.5 step 11).

use chrono::Utc;
use recall_storage::{SqlValue, Store};

use crate::error::Result;

pub fn set_is_indexing(store: &Store, project_id: &str, is_indexing: bool) -> Result<()> {
    store.execute(
        "INSERT INTO graph_index_state (project_id, files_indexed, last_cold_start_at, is_indexing)
         VALUES (?1, 0, NULL, ?2)
         ON CONFLICT(project_id) DO UPDATE SET is_indexing = excluded.is_indexing",
        vec![SqlValue::from(project_id.to_string()), SqlValue::from(is_indexing as i64)],
    )?;
    Ok(())
}

pub fn record_file_indexed(store: &Store, project_id: &str) -> Result<()> {
    store.execute(
        "INSERT INTO graph_index_state (project_id, files_indexed, last_cold_start_at, is_indexing)
         VALUES (?1, 1, NULL, 0)
         ON CONFLICT(project_id) DO UPDATE SET files_indexed = files_indexed + 1",
        vec![SqlValue::from(project_id.to_string())],
    )?;
    Ok(())
}

pub fn record_cold_start_complete(store: &Store, project_id: &str) -> Result<()> {
    store.execute(
        "INSERT INTO graph_index_state (project_id, files_indexed, last_cold_start_at, is_indexing)
         VALUES (?1, 0, ?2, 0)
         ON CONFLICT(project_id) DO UPDATE SET last_cold_start_at = excluded.last_cold_start_at, is_indexing = 0",
        vec![SqlValue::from(project_id.to_string()), SqlValue::from(Utc::now().to_rfc3339())],
    )?;
    Ok(())
}

pub struct IndexState {
    pub files_indexed: i64,
    pub last_cold_start_at: Option<String>,
    pub is_indexing: bool,
}

pub fn get_state(store: &Store, project_id: &str) -> Result<Option<IndexState>> {
    let result = store.reader().query_row(
        "SELECT files_indexed, last_cold_start_at, is_indexing FROM graph_index_state WHERE project_id = ?1",
        rusqlite::params![project_id],
        |row| {
            Ok(IndexState {
                files_indexed: row.get(0)?,
                last_cold_start_at: row.get(1)?,
                is_indexing: row.get::<_, i64>(2)? != 0,
            })
        },
    );
    match result {
        Ok(state) => Ok(Some(state)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(recall_storage::StorageError::from(e).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_across_files() {
        let store = Store::open_in_memory().unwrap();
        record_file_indexed(&store, "proj").unwrap();
        record_file_indexed(&store, "proj").unwrap();
        let state = get_state(&store, "proj").unwrap().unwrap();
        assert_eq!(state.files_indexed, 2);
    }

    #[test]
    fn cold_start_sets_timestamp_and_clears_indexing_flag() {
        let store = Store::open_in_memory().unwrap();
        set_is_indexing(&store, "proj", true).unwrap();
        record_cold_start_complete(&store, "proj").unwrap();
        let state = get_state(&store, "proj").unwrap().unwrap();
        assert!(!state.is_indexing);
        assert!(state.last_cold_start_at.is_some());
    }
}

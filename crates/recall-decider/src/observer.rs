//! Observer (C10, §4.10): rolling aggregate counters over file touches,
//! file co-access, and tool-error signatures, persisted in the store so
//! promotion decisions see history beyond the current session. Grounded on
//! the same typed-message-stream idiom as the bridge (§4.9) — the Observer
//! is just another consumer of `tool-call`/`tool-result` events, run on the
//! host thread with no direct worker access to its state.

use chrono::Utc;
use recall_core::config::ObserverConfig;
use recall_core::ids::MemoryId;
use recall_core::types::{Memory, MemoryType};
use recall_embeddings::EmbeddingService;
use recall_storage::{SqlValue, Store};

use crate::error::Result;

pub struct Observer {
    config: ObserverConfig,
}

impl Observer {
    pub fn new(config: ObserverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ObserverConfig {
        &self.config
    }

    pub fn record_file_touch(&self, store: &Store, project_id: &str, file_path: &str) -> Result<()> {
        store.execute(
            "INSERT INTO observer_file_nodes (project_id, file_path, touch_count, last_touched_at)
             VALUES (?1, ?2, 1, ?3)
             ON CONFLICT(project_id, file_path) DO UPDATE SET
                touch_count = touch_count + 1,
                last_touched_at = excluded.last_touched_at",
            vec![SqlValue::from(project_id.to_string()), SqlValue::from(file_path.to_string()), SqlValue::from(Utc::now().to_rfc3339())],
        )?;
        Ok(())
    }

    /// Records that `file_a` and `file_b` were touched within the same step
    /// window. The pair is stored in a canonical order so `(a, b)` and
    /// `(b, a)` accumulate onto the same row.
    pub fn record_co_access(&self, store: &Store, project_id: &str, file_a: &str, file_b: &str, step_number: u32) -> Result<()> {
        if file_a == file_b {
            return Ok(());
        }
        let (lo, hi) = if file_a < file_b { (file_a, file_b) } else { (file_b, file_a) };

        store.execute(
            "INSERT INTO observer_co_access_edges (project_id, file_a, file_b, co_count, last_seen_step)
             VALUES (?1, ?2, ?3, 1, ?4)
             ON CONFLICT(project_id, file_a, file_b) DO UPDATE SET
                co_count = co_count + 1,
                last_seen_step = excluded.last_seen_step",
            vec![SqlValue::from(project_id.to_string()), SqlValue::from(lo.to_string()), SqlValue::from(hi.to_string()), SqlValue::from(step_number as i64)],
        )?;
        Ok(())
    }

    pub fn record_error_pattern(&self, store: &Store, project_id: &str, signature: &str) -> Result<()> {
        store.execute(
            "INSERT INTO observer_error_patterns (project_id, signature, repeat_count, last_seen_at)
             VALUES (?1, ?2, 1, ?3)
             ON CONFLICT(project_id, signature) DO UPDATE SET
                repeat_count = repeat_count + 1,
                last_seen_at = excluded.last_seen_at",
            vec![SqlValue::from(project_id.to_string()), SqlValue::from(signature.to_string()), SqlValue::from(Utc::now().to_rfc3339())],
        )?;
        Ok(())
    }

    pub fn record_module_session(&self, store: &Store, project_id: &str, module: &str) -> Result<()> {
        store.execute(
            "INSERT INTO observer_module_session_counts (project_id, module, session_count)
             VALUES (?1, ?2, 1)
             ON CONFLICT(project_id, module) DO UPDATE SET
                session_count = session_count + 1",
            vec![SqlValue::from(project_id.to_string()), SqlValue::from(module.to_string())],
        )?;
        Ok(())
    }

    /// Scans the aggregate counters and promotes any that cross their
    /// configured threshold into a durable `Memory`, logging the promotion
    /// to `observer_synthesis_log` so the same aggregate is never promoted
    /// twice (§4.10 "synthesis pass").
    pub fn synthesize(&self, store: &Store, embeddings: &EmbeddingService, project_id: &str, current_step: u32) -> Result<Vec<MemoryId>> {
        let mut promoted = Vec::new();

        let co_access = self.due_co_access_pairs(store, project_id, current_step)?;
        for (file_a, file_b, co_count) in co_access {
            let reason = format!("co_access:{file_a}|{file_b}");
            if self.already_synthesized(store, project_id, &reason)? {
                continue;
            }
            let content = format!("{file_a} and {file_b} are frequently edited together ({co_count} co-occurrences)");
            let mut memory = Memory::new(project_id, MemoryType::Pattern, content);
            memory.related_files = vec![file_a, file_b];
            memory.confidence = 0.7;
            let id = recall_memory::crud::store(store, embeddings, memory)?;
            self.log_synthesis(store, project_id, Some(&id.to_string()), &reason)?;
            promoted.push(id);
        }

        let errors = self.due_error_patterns(store, project_id)?;
        for (signature, repeat_count) in errors {
            let reason = format!("error_repeat:{signature}");
            if self.already_synthesized(store, project_id, &reason)? {
                continue;
            }
            let content = format!("recurring error pattern: {signature} (seen {repeat_count} times)");
            let mut memory = Memory::new(project_id, MemoryType::ErrorPattern, content);
            memory.confidence = 0.7;
            let id = recall_memory::crud::store(store, embeddings, memory)?;
            self.log_synthesis(store, project_id, Some(&id.to_string()), &reason)?;
            promoted.push(id);
        }

        Ok(promoted)
    }

    fn due_co_access_pairs(&self, store: &Store, project_id: &str, current_step: u32) -> Result<Vec<(String, String, i64)>> {
        let window_start = current_step.saturating_sub(self.config.co_access_window_steps);
        let mut stmt = store.reader().prepare_cached(
            "SELECT file_a, file_b, co_count FROM observer_co_access_edges
             WHERE project_id = ?1 AND co_count >= ?2 AND last_seen_step >= ?3",
        )?;
        let rows = stmt
            .query_map(rusqlite::params![project_id, self.config.co_access_threshold, window_start], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, i64>(2)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn due_error_patterns(&self, store: &Store, project_id: &str) -> Result<Vec<(String, i64)>> {
        let mut stmt = store
            .reader()
            .prepare_cached("SELECT signature, repeat_count FROM observer_error_patterns WHERE project_id = ?1 AND repeat_count >= ?2")?;
        let rows = stmt
            .query_map(rusqlite::params![project_id, self.config.error_repeat_threshold], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn already_synthesized(&self, store: &Store, project_id: &str, reason: &str) -> Result<bool> {
        let count: i64 = store.reader().query_row(
            "SELECT COUNT(*) FROM observer_synthesis_log WHERE project_id = ?1 AND reason = ?2",
            rusqlite::params![project_id, reason],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn log_synthesis(&self, store: &Store, project_id: &str, promoted_memory_id: Option<&str>, reason: &str) -> Result<()> {
        store.execute(
            "INSERT INTO observer_synthesis_log (project_id, promoted_memory_id, reason, created_at) VALUES (?1, ?2, ?3, ?4)",
            vec![SqlValue::from(project_id.to_string()), SqlValue::from(promoted_memory_id.map(str::to_string)), SqlValue::from(reason.to_string()), SqlValue::from(Utc::now().to_rfc3339())],
        )?;
        Ok(())
    }
}

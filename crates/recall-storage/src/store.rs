//! `Store`: the embedded-SQLite façade every other crate talks to.
//!
//! One reader [`Connection`] in WAL mode, owned directly by `Store`, plus a
//! [`BatchWriter`] thread holding the sole writable connection (§4.1
//! "Expansion — connection ownership"). Reads never block on writes;
//! writes are serialized through the writer thread and always commit (or
//! roll back) as a unit before `execute`/`batch` return.

use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;
use crate::migrations;
use crate::value::{SqlValue, Statement};
use crate::writer::BatchWriter;

pub struct Store {
    reader: Connection,
    writer: BatchWriter,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let mut writer_conn = Connection::open(path)?;
        Self::configure(&writer_conn);
        migrations::run_migrations(&mut writer_conn)?;

        let reader = Connection::open(path)?;
        Self::configure(&reader);

        Ok(Self {
            reader,
            writer: BatchWriter::new(writer_conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        // A shared in-memory database needs a named URI, otherwise the
        // reader and writer connections would each get their own private
        // database.
        let uri = format!("file:recall-{}?mode=memory&cache=shared", uuid::Uuid::new_v4());

        let mut writer_conn = Connection::open(&uri)?;
        Self::configure(&writer_conn);
        migrations::run_migrations(&mut writer_conn)?;

        let reader = Connection::open(&uri)?;
        Self::configure(&reader);

        Ok(Self {
            reader,
            writer: BatchWriter::new(writer_conn),
        })
    }

    fn configure(conn: &Connection) {
        migrations::try_pragma(conn, "PRAGMA journal_mode = WAL");
        migrations::try_pragma(conn, "PRAGMA synchronous = NORMAL");
        migrations::try_pragma(conn, "PRAGMA foreign_keys = ON");
        migrations::try_pragma(conn, "PRAGMA busy_timeout = 5000");
    }

    /// Run a single statement as its own atomic unit, blocking until
    /// committed.
    pub fn execute(&self, sql: &str, params: Vec<SqlValue>) -> Result<()> {
        self.writer.submit(vec![Statement::new(sql, params)], true)
    }

    /// Run a batch of statements as one atomic unit: all succeed or none
    /// do (§4.1 "atomic multi-statement transaction used for memory
    /// triple-writes").
    pub fn batch(&self, statements: Vec<Statement>) -> Result<()> {
        self.writer.submit(statements, true)
    }

    /// Run DDL or maintenance statements non-atomically, directly against
    /// the reader connection — no rollback on partial failure. Used for
    /// one-off administrative operations, never for memory/graph writes.
    pub fn execute_multiple(&self, sql: &str) -> Result<()> {
        self.reader.execute_batch(sql)?;
        Ok(())
    }

    /// Borrow the reader connection for ad-hoc queries (FTS5 search, graph
    /// traversal, embedding lookups) built by the crates that own those
    /// tables.
    pub fn reader(&self) -> &Connection {
        &self.reader
    }

    pub fn shutdown(self) -> Result<()> {
        self.writer.shutdown()
    }

    /// BM25-ranked full text search over `memories_fts`, joined back to
    /// `memories.id` via the `UNINDEXED` id column. Lives here rather than
    /// in `recall-memory` / `recall-retrieval` because the virtual table
    /// and its tokenizer are storage concerns; the ranked ids are handed
    /// back up for the caller to hydrate into `Memory` rows.
    pub fn search_fts5(&self, query: &str, limit: usize) -> Result<Vec<(String, f64)>> {
        let mut stmt = self.reader.prepare_cached(
            "SELECT id, bm25(memories_fts) AS rank
             FROM memories_fts
             WHERE memories_fts MATCH ?1
             ORDER BY rank
             LIMIT ?2",
        )?;

        let rows = stmt
            .query_map(rusqlite::params![query, limit as i64], |row| {
                let id: String = row.get(0)?;
                let rank: f64 = row.get(1)?;
                Ok((id, rank))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_in_memory_runs_migrations() {
        let store = Store::open_in_memory().unwrap();
        let version = migrations::current_version(store.reader()).unwrap();
        assert_eq!(version, migrations::LATEST_VERSION);
    }

    #[test]
    fn execute_then_read_back() {
        let store = Store::open_in_memory().unwrap();
        store
            .execute(
                "INSERT INTO memories (id, memory_type, content, confidence, created_at, last_accessed_at, project_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                vec![
                    SqlValue::from("m1"),
                    SqlValue::from("gotcha"),
                    SqlValue::from("do not do X"),
                    SqlValue::from(1.0),
                    SqlValue::from("2026-01-01T00:00:00Z"),
                    SqlValue::from("2026-01-01T00:00:00Z"),
                    SqlValue::from("proj"),
                ],
            )
            .unwrap();

        let count: i64 = store
            .reader()
            .query_row("SELECT COUNT(*) FROM memories", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn batch_rolls_back_as_a_unit() {
        let store = Store::open_in_memory().unwrap();
        let result = store.batch(vec![
            Statement::new(
                "INSERT INTO memories (id, memory_type, content, confidence, created_at, last_accessed_at, project_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                vec![
                    SqlValue::from("m2"),
                    SqlValue::from("gotcha"),
                    SqlValue::from("fine"),
                    SqlValue::from(1.0),
                    SqlValue::from("2026-01-01T00:00:00Z"),
                    SqlValue::from("2026-01-01T00:00:00Z"),
                    SqlValue::from("proj"),
                ],
            ),
            Statement::new("INSERT INTO not_a_real_table (x) VALUES (1)", vec![]),
        ]);
        assert!(result.is_err());

        let count: i64 = store
            .reader()
            .query_row("SELECT COUNT(*) FROM memories WHERE id = 'm2'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}

//! Dedicated writer thread, fed by a bounded `crossbeam_channel`.
//!
//! Grounded on `drift-storage`'s `BatchWriter`: a single thread owns the
//! writable connection; callers enqueue work and the thread batches queued
//! units into one transaction, flushing on a size threshold or idle
//! timeout. Unlike the upstream (whose callers are fire-and-forget plus an
//! explicit `flush_sync`), every unit here carries a reply channel because
//! `Store::batch`/`execute` are synchronous library calls that must return
//! a `Result` to the caller — so each queued unit is wrapped in its own
//! `SAVEPOINT` inside the shared transaction, rolling back only that unit
//! on error rather than the whole flush (§4.1 "any error in batch must roll
//! back the whole unit", scoped to the caller's own unit).

use std::sync::mpsc::SyncSender;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use rusqlite::{Connection, TransactionBehavior};

use crate::error::{Result, StorageError};
use crate::value::Statement;

const CHANNEL_BOUND: usize = 1024;
const BATCH_SIZE: usize = 500;
const FLUSH_TIMEOUT: Duration = Duration::from_millis(100);

type ReplySender = SyncSender<Result<()>>;

enum WriteCommand {
    Unit {
        statements: Vec<Statement>,
        atomic: bool,
        reply: ReplySender,
    },
    Shutdown,
}

/// The dedicated writer thread and its command channel.
pub struct BatchWriter {
    tx: Sender<WriteCommand>,
    handle: Option<JoinHandle<()>>,
}

impl BatchWriter {
    pub fn new(conn: Connection) -> Self {
        let (tx, rx) = bounded(CHANNEL_BOUND);
        let handle = thread::Builder::new()
            .name("recall-storage-writer".to_string())
            .spawn(move || writer_loop(conn, rx))
            .expect("failed to spawn recall-storage writer thread");

        Self {
            tx,
            handle: Some(handle),
        }
    }

    /// Enqueue a unit of statements and block until it has been committed
    /// (or rolled back). `atomic = true` means all-or-nothing for this unit.
    pub fn submit(&self, statements: Vec<Statement>, atomic: bool) -> Result<()> {
        let (reply_tx, reply_rx) = std::sync::mpsc::sync_channel(1);
        self.tx
            .send(WriteCommand::Unit {
                statements,
                atomic,
                reply: reply_tx,
            })
            .map_err(|_| StorageError::WriterDisconnected)?;
        reply_rx.recv().map_err(|_| StorageError::WriterDisconnected)?
    }

    pub fn shutdown(mut self) -> Result<()> {
        let _ = self.tx.send(WriteCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            handle.join().map_err(|_| StorageError::WriterPanicked)?;
        }
        Ok(())
    }
}

impl Drop for BatchWriter {
    fn drop(&mut self) {
        let _ = self.tx.send(WriteCommand::Shutdown);
    }
}

fn writer_loop(mut conn: Connection, rx: Receiver<WriteCommand>) {
    let mut buffer: Vec<(Vec<Statement>, bool, ReplySender)> = Vec::with_capacity(BATCH_SIZE);

    loop {
        match rx.recv_timeout(FLUSH_TIMEOUT) {
            Ok(WriteCommand::Shutdown) => {
                flush(&mut conn, &mut buffer);
                break;
            }
            Ok(WriteCommand::Unit {
                statements,
                atomic,
                reply,
            }) => {
                buffer.push((statements, atomic, reply));
                if buffer.len() >= BATCH_SIZE {
                    flush(&mut conn, &mut buffer);
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if !buffer.is_empty() {
                    flush(&mut conn, &mut buffer);
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                flush(&mut conn, &mut buffer);
                break;
            }
        }
    }
}

fn flush(conn: &mut Connection, buffer: &mut Vec<(Vec<Statement>, bool, ReplySender)>) {
    if buffer.is_empty() {
        return;
    }

    let outer = match conn.transaction_with_behavior(TransactionBehavior::Immediate) {
        Ok(tx) => tx,
        Err(e) => {
            let err = StorageError::from(e);
            for (_, _, reply) in buffer.drain(..) {
                let _ = reply.send(Err(StorageError::Sqlite {
                    message: err.to_string(),
                }));
            }
            return;
        }
    };

    let mut results = Vec::with_capacity(buffer.len());
    for (statements, _atomic, reply) in buffer.drain(..) {
        let result = run_unit(&outer, &statements);
        results.push((result, reply));
    }

    // Units only ran inside SAVEPOINTs of the outer transaction; nothing is
    // durable, and no caller may be told it succeeded, until this commits.
    match outer.commit() {
        Ok(()) => {
            for (result, reply) in results {
                let _ = reply.send(result);
            }
        }
        Err(e) => {
            let err = StorageError::Sqlite { message: e.to_string() };
            tracing::warn!(error = %err, "writer thread failed to commit batch");
            for (result, reply) in results {
                let sent = match result {
                    Ok(()) => Err(StorageError::Sqlite { message: err.to_string() }),
                    Err(_) => result,
                };
                let _ = reply.send(sent);
            }
        }
    }
}

// Plain `SAVEPOINT`/`RELEASE`/`ROLLBACK TO` statements rather than
// rusqlite's `Savepoint` guard: that type requires `&mut Connection` to
// prevent overlapping borrows, but the writer thread only ever holds a
// shared reference to the outer `Transaction` while iterating the buffer.
fn run_unit(conn: &Connection, statements: &[Statement]) -> Result<()> {
    conn.execute_batch("SAVEPOINT unit")?;

    for stmt in statements {
        let params: Vec<&dyn rusqlite::ToSql> =
            stmt.params.iter().map(|p| p as &dyn rusqlite::ToSql).collect();
        if let Err(e) = conn.execute(&stmt.sql, params.as_slice()) {
            conn.execute_batch("ROLLBACK TO unit; RELEASE unit")?;
            return Err(StorageError::from(e));
        }
    }

    conn.execute_batch("RELEASE unit")?;
    Ok(())
}

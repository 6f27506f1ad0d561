// SPDX-FileCopyrightText: 2026 Serialite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database handle and lifecycle.
//!
//! [`Database`] owns the only SQLite connection for a file. Reads run inline
//! on the calling thread under the connection lock; writes are queued to the
//! writer thread (see [`crate::worker`]), which applies them in queue order
//! and batches commits. rusqlite connections are `Send` but not `Sync`, so
//! the lock is what makes the cross-thread read path sound.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use rusqlite::Connection;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use serialite_core::{
    DatabaseConfig, ExecuteResult, Row, SerialiteError, StatementKind, Value,
};

use crate::worker::{self, Job, PendingWrite};

/// State shared between the handle (readers) and the writer thread.
pub(crate) struct Shared {
    /// The only connection. Emptied by the worker once it has shut down.
    pub(crate) conn: Mutex<Option<Connection>>,
    /// Writes accepted but not yet carried through a commit decision.
    pub(crate) pending: AtomicUsize,
    /// Set by `close`; rejects all further statements.
    pub(crate) closed: AtomicBool,
}

/// Thread-safe handle to one SQLite database file.
///
/// The handle is the single writer for its file: every non-SELECT statement
/// is serialized through one writer thread, in submission order. Share the
/// handle across tasks or threads behind an `Arc`.
pub struct Database {
    shared: Arc<Shared>,
    write_queue: mpsc::Sender<Job>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Open `path` with [`DatabaseConfig`] defaults and start the writer.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, SerialiteError> {
        Self::open_with(DatabaseConfig::new(path.as_ref().to_string_lossy())).await
    }

    /// Open a database per `config` and start the writer thread.
    pub async fn open_with(config: DatabaseConfig) -> Result<Self, SerialiteError> {
        if config.max_queue_size == 0 {
            return Err(SerialiteError::Config(
                "max_queue_size must be at least 1".into(),
            ));
        }

        let setup = config.clone();
        let conn = tokio::task::spawn_blocking(move || open_connection(&setup))
            .await
            .map_err(|e| SerialiteError::Internal(format!("open task failed: {e}")))??;

        let shared = Arc::new(Shared {
            conn: Mutex::new(Some(conn)),
            pending: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        });
        let (write_queue, jobs) = mpsc::channel(config.max_queue_size);
        let handle = worker::spawn(Arc::clone(&shared), jobs, config.max_queue_size)?;
        debug!(path = %config.database_path, "database opened");

        Ok(Self {
            shared,
            write_queue,
            worker: Mutex::new(Some(handle)),
        })
    }

    /// Execute a statement.
    ///
    /// Statements starting with `SELECT` (case-insensitive) run immediately
    /// on the calling thread and return their rows. Everything else is
    /// queued for the writer and returns [`ExecuteResult::Queued`] as soon
    /// as the queue accepts it, waiting only while the queue is at capacity.
    /// A queued write that later fails is logged, not returned, and a read
    /// issued right after a write may run before that write has been
    /// applied; use [`queue_size`](Self::queue_size) to observe the drain.
    pub async fn execute(
        &self,
        statement: &str,
        parameters: &[Value],
    ) -> Result<ExecuteResult, SerialiteError> {
        if self.shared.closed.load(Ordering::SeqCst) {
            return Err(SerialiteError::Closed);
        }
        match StatementKind::classify(statement) {
            StatementKind::Read => self
                .read_rows(statement, parameters)
                .map(ExecuteResult::Rows),
            StatementKind::Write => {
                let write = PendingWrite {
                    statement: statement.to_owned(),
                    parameters: parameters.to_vec(),
                };
                self.shared.pending.fetch_add(1, Ordering::SeqCst);
                if self.write_queue.send(Job::Write(write)).await.is_err() {
                    self.shared.pending.fetch_sub(1, Ordering::SeqCst);
                    return Err(SerialiteError::Closed);
                }
                Ok(ExecuteResult::Queued)
            }
        }
    }

    /// Run a read statement and return its rows.
    ///
    /// Unlike [`execute`](Self::execute) this rejects non-SELECT statements
    /// instead of queueing them, so a caller expecting rows cannot silently
    /// enqueue a write.
    pub async fn query(
        &self,
        statement: &str,
        parameters: &[Value],
    ) -> Result<Vec<Row>, SerialiteError> {
        if self.shared.closed.load(Ordering::SeqCst) {
            return Err(SerialiteError::Closed);
        }
        match StatementKind::classify(statement) {
            StatementKind::Read => self.read_rows(statement, parameters),
            StatementKind::Write => Err(SerialiteError::NotRead {
                statement: statement.to_owned(),
            }),
        }
    }

    /// Number of writes accepted but not yet carried through a commit
    /// decision.
    ///
    /// Purely observational and possibly stale the instant it returns. Once
    /// it reads 0, every previously accepted write has been applied and
    /// committed.
    pub fn queue_size(&self) -> usize {
        self.shared.pending.load(Ordering::SeqCst)
    }

    /// Shut the database down.
    ///
    /// Queues the shutdown sentinel behind every accepted write and waits
    /// for the worker to apply them, commit, and release the connection.
    /// After `close` returns the handle is unusable: any further call fails
    /// with [`SerialiteError::Closed`].
    pub async fn close(&self) -> Result<(), SerialiteError> {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return Err(SerialiteError::Closed);
        }

        let (ack, done) = oneshot::channel();
        self.write_queue
            .send(Job::Shutdown(ack))
            .await
            .map_err(|_| SerialiteError::Closed)?;
        done.await.map_err(|_| {
            SerialiteError::Internal("worker exited before acknowledging shutdown".into())
        })?;

        let handle = self
            .worker
            .lock()
            .map_err(|_| SerialiteError::Internal("worker handle lock poisoned".into()))?
            .take();
        if let Some(handle) = handle {
            handle
                .join()
                .map_err(|_| SerialiteError::Internal("writer thread panicked".into()))?;
        }
        debug!("database closed");
        Ok(())
    }

    fn read_rows(
        &self,
        statement: &str,
        parameters: &[Value],
    ) -> Result<Vec<Row>, SerialiteError> {
        debug!(statement = %statement, "read");
        let guard = self
            .shared
            .conn
            .lock()
            .map_err(|_| SerialiteError::Internal("connection lock poisoned".into()))?;
        let conn = guard.as_ref().ok_or(SerialiteError::Closed)?;

        let mut stmt = conn
            .prepare(statement)
            .map_err(|e| statement_error(statement, parameters, e))?;
        let columns = stmt.column_count();
        let mut rows = stmt
            .query(rusqlite::params_from_iter(parameters.iter()))
            .map_err(|e| statement_error(statement, parameters, e))?;

        let mut out = Vec::new();
        while let Some(row) = rows
            .next()
            .map_err(|e| statement_error(statement, parameters, e))?
        {
            let mut values = Vec::with_capacity(columns);
            for idx in 0..columns {
                values.push(
                    row.get::<_, Value>(idx)
                        .map_err(|e| statement_error(statement, parameters, e))?,
                );
            }
            out.push(values);
        }
        Ok(out)
    }
}

fn open_connection(config: &DatabaseConfig) -> Result<Connection, SerialiteError> {
    let conn = Connection::open(&config.database_path)?;
    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
    if config.wal_mode {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
    }
    Ok(conn)
}

fn statement_error(
    statement: &str,
    parameters: &[Value],
    source: rusqlite::Error,
) -> SerialiteError {
    SerialiteError::Statement {
        statement: statement.to_owned(),
        parameters: parameters.to_vec(),
        message: source.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn drain(db: &Database) {
        while db.queue_size() > 0 {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    }

    #[tokio::test]
    async fn rejects_zero_queue_capacity() {
        let dir = tempdir().unwrap();
        let mut config =
            DatabaseConfig::new(dir.path().join("zero.db").to_string_lossy());
        config.max_queue_size = 0;

        let err = Database::open_with(config).await.unwrap_err();
        assert!(matches!(err, SerialiteError::Config(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn read_errors_surface_synchronously() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("reads.db")).await.unwrap();

        let err = db
            .execute("SELECT * FROM missing", &[])
            .await
            .unwrap_err();
        match err {
            SerialiteError::Statement { statement, message, .. } => {
                assert_eq!(statement, "SELECT * FROM missing");
                assert!(message.contains("missing"), "got: {message}");
            }
            other => panic!("expected Statement error, got: {other:?}"),
        }

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn query_rejects_write_statements() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("query.db")).await.unwrap();

        let err = db
            .query("DELETE FROM tester", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, SerialiteError::NotRead { .. }), "got: {err:?}");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn execute_and_close_fail_fast_after_close() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("closed.db")).await.unwrap();
        db.close().await.unwrap();

        let err = db.execute("SELECT 1", &[]).await.unwrap_err();
        assert!(matches!(err, SerialiteError::Closed), "got: {err:?}");
        let err = db
            .execute("INSERT INTO t VALUES (1)", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, SerialiteError::Closed), "got: {err:?}");
        let err = db.close().await.unwrap_err();
        assert!(matches!(err, SerialiteError::Closed), "got: {err:?}");
    }

    #[tokio::test]
    async fn backpressure_blocks_when_queue_is_full() {
        let dir = tempdir().unwrap();
        let mut config =
            DatabaseConfig::new(dir.path().join("bp.db").to_string_lossy());
        config.max_queue_size = 2;
        let db = Arc::new(Database::open_with(config).await.unwrap());

        db.execute("CREATE TABLE t (n INTEGER)", &[]).await.unwrap();
        drain(&db).await;

        // Stall the worker by holding the connection lock, then fill the
        // queue: the worker takes one job and parks on the lock, the next
        // two occupy the queue slots.
        let guard = db.shared.conn.lock().unwrap();
        for n in 0..3 {
            db.execute("INSERT INTO t VALUES (?)", &[Value::Integer(n)])
                .await
                .unwrap();
        }

        let blocked = {
            let db = Arc::clone(&db);
            tokio::spawn(async move {
                db.execute("INSERT INTO t VALUES (?)", &[Value::Integer(3)])
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(
            !blocked.is_finished(),
            "enqueue past capacity should wait for a free slot"
        );

        drop(guard);
        let accepted = blocked.await.unwrap().unwrap();
        assert_eq!(accepted, ExecuteResult::Queued);
        drain(&db).await;

        let rows = db.query("SELECT n FROM t ORDER BY rowid", &[]).await.unwrap();
        let values: Vec<Value> = rows.into_iter().flatten().collect();
        assert_eq!(
            values,
            vec![
                Value::Integer(0),
                Value::Integer(1),
                Value::Integer(2),
                Value::Integer(3)
            ]
        );

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn queue_size_reflects_accepted_writes() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("size.db")).await.unwrap();
        assert_eq!(db.queue_size(), 0);

        db.execute("CREATE TABLE t (n INTEGER)", &[]).await.unwrap();
        drain(&db).await;
        assert_eq!(db.queue_size(), 0);

        db.close().await.unwrap();
    }
}

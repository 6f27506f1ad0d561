// SPDX-FileCopyrightText: 2026 Serialite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The single-writer loop and commit batching.
//!
//! One writer thread per database owns the receive side of the bounded work
//! queue and is the only code path that applies write statements, commits,
//! or closes the connection. Writes are applied in strict queue order inside
//! an explicit batch transaction; the batch is committed as soon as the
//! queue runs dry or `max_queue_size` statements have accumulated, so at
//! most one queue's worth of statements is ever uncommitted.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread::JoinHandle;

use rusqlite::Connection;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

use serialite_core::{SerialiteError, Value};

use crate::database::Shared;

/// A write statement waiting for the writer thread. Immutable once queued,
/// consumed exactly once.
#[derive(Debug, Clone)]
pub struct PendingWrite {
    pub statement: String,
    pub parameters: Vec<Value>,
}

/// Queue element: either work or the shutdown sentinel. The sentinel travels
/// through the same FIFO queue as the writes, so it cannot overtake anything
/// queued before it.
pub(crate) enum Job {
    Write(PendingWrite),
    Shutdown(oneshot::Sender<()>),
}

/// Spawn the writer thread for `shared`, consuming the queue receiver.
pub(crate) fn spawn(
    shared: Arc<Shared>,
    queue: mpsc::Receiver<Job>,
    max_batch: usize,
) -> Result<JoinHandle<()>, SerialiteError> {
    std::thread::Builder::new()
        .name("serialite-writer".to_string())
        .spawn(move || run(shared, queue, max_batch))
        .map_err(|e| SerialiteError::Internal(format!("failed to spawn writer thread: {e}")))
}

fn run(shared: Arc<Shared>, mut queue: mpsc::Receiver<Job>, max_batch: usize) {
    debug!("writer thread started");
    let mut in_batch = 0usize;
    let mut tx_open = false;

    while let Some(job) = queue.blocking_recv() {
        match job {
            Job::Write(write) => {
                match shared.conn.lock() {
                    Ok(guard) => {
                        if let Some(conn) = guard.as_ref() {
                            if !tx_open {
                                tx_open = begin(conn);
                            }
                            apply(conn, &write);
                            in_batch += 1;
                            if queue.is_empty() || in_batch >= max_batch {
                                if tx_open {
                                    commit(conn);
                                }
                                tx_open = false;
                                in_batch = 0;
                            }
                        } else {
                            warn!(
                                statement = %write.statement,
                                "write dropped: connection already closed"
                            );
                        }
                    }
                    Err(_) => {
                        error!(
                            statement = %write.statement,
                            "write dropped: connection lock poisoned"
                        );
                    }
                }
                shared.pending.fetch_sub(1, Ordering::SeqCst);
            }
            Job::Shutdown(ack) => {
                drain_rejected(&shared, &mut queue);
                finish(&shared, tx_open);
                let _ = ack.send(());
                debug!("writer thread stopped");
                return;
            }
        }
    }

    // Every sender is gone without an explicit close. All accepted writes
    // were received by the loop above; flush the tail batch and release
    // the connection.
    finish(&shared, tx_open);
    debug!("writer thread stopped");
}

/// Drop writes that raced past the closed flag and landed behind the
/// shutdown sentinel, keeping the pending counter accurate.
fn drain_rejected(shared: &Shared, queue: &mut mpsc::Receiver<Job>) {
    queue.close();
    while let Ok(job) = queue.try_recv() {
        if let Job::Write(write) = job {
            warn!(statement = %write.statement, "write dropped: database closing");
            shared.pending.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

/// Final commit and connection teardown. The connection slot is emptied so
/// late readers observe the closed state.
fn finish(shared: &Shared, tx_open: bool) {
    let mut guard = match shared.conn.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if let Some(conn) = guard.take() {
        if tx_open {
            commit(&conn);
        }
        if let Err((_, e)) = conn.close() {
            warn!(error = %e, "connection close reported an error");
        }
    }
}

fn begin(conn: &Connection) -> bool {
    match conn.execute_batch("BEGIN IMMEDIATE") {
        Ok(()) => true,
        Err(e) => {
            error!(error = %e, "could not open batch transaction; statements will autocommit");
            false
        }
    }
}

fn commit(conn: &Connection) {
    debug!("commit");
    if let Err(e) = conn.execute_batch("COMMIT") {
        error!(error = %e, "commit failed");
    }
}

/// Apply one queued write. The submitter was acknowledged when the write was
/// queued, so failures are logged and the loop moves on; subsequent writes
/// still run.
fn apply(conn: &Connection, write: &PendingWrite) {
    debug!(statement = %write.statement, "apply");
    if let Err(e) = conn.execute(
        &write.statement,
        rusqlite::params_from_iter(write.parameters.iter()),
    ) {
        error!(
            statement = %write.statement,
            parameters = ?write.parameters,
            error = %e,
            "queued write failed"
        );
    }
}

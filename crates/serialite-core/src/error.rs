// SPDX-FileCopyrightText: 2026 Serialite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the serialite engine.

use thiserror::Error;

use crate::types::Value;

/// The primary error type used across serialite operations.
#[derive(Debug, Error)]
pub enum SerialiteError {
    /// Configuration errors (zero queue capacity, unusable database path).
    #[error("configuration error: {0}")]
    Config(String),

    /// A statement failed to execute (malformed SQL, constraint violation,
    /// type mismatch). Reads surface this to the caller; queued writes are
    /// logged by the worker after the caller has already been acknowledged.
    #[error("statement failed: {message}: {statement:?}")]
    Statement {
        statement: String,
        parameters: Vec<Value>,
        message: String,
    },

    /// The instance has been closed; no further statements are accepted.
    #[error("database is closed")]
    Closed,

    /// `query` was called with a statement that is not a read.
    #[error("not a read statement: {statement:?}")]
    NotRead { statement: String },

    /// Errors surfaced directly from the SQLite driver during open or close.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Internal or unexpected errors (worker thread spawn/join failures).
    #[error("internal error: {0}")]
    Internal(String),
}

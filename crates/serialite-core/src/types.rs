// SPDX-FileCopyrightText: 2026 Serialite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types exchanged between the engine and its callers.

pub use rusqlite::types::Value;

/// A single result row: column values in select-list order.
pub type Row = Vec<Value>;

/// Outcome of executing a statement through the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecuteResult {
    /// The statement was classified as a write and accepted into the queue.
    /// It will be applied and committed by the worker; failures are logged,
    /// not returned.
    Queued,
    /// The statement was a read; the full result set in row order.
    Rows(Vec<Row>),
}

impl ExecuteResult {
    /// Returns the rows of a read result, or `None` for a queued write.
    #[must_use]
    pub fn rows(self) -> Option<Vec<Row>> {
        match self {
            ExecuteResult::Queued => None,
            ExecuteResult::Rows(rows) => Some(rows),
        }
    }
}

/// How a statement is dispatched: reads run inline on the calling thread,
/// everything else is queued to the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Read,
    Write,
}

impl StatementKind {
    /// Classify a statement. A statement whose leading token is `SELECT`
    /// (case-insensitive, after trimming leading whitespace) is a read;
    /// anything else is a write.
    #[must_use]
    pub fn classify(statement: &str) -> Self {
        let head = statement.trim_start().as_bytes();
        if head.len() >= 6 && head[..6].eq_ignore_ascii_case(b"select") {
            StatementKind::Read
        } else {
            StatementKind::Write
        }
    }
}

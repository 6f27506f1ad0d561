// SPDX-FileCopyrightText: 2026 Serialite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model for the engine.
//!
//! The struct is plain serde so a host application can embed it in its own
//! configuration tree; the engine itself never reads files or environment
//! variables.

use serde::{Deserialize, Serialize};

/// Settings for a database instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    pub database_path: String,

    /// Maximum number of writes that may be queued before `execute` exerts
    /// backpressure on callers. Also the upper bound on uncommitted
    /// statements in one batch.
    #[serde(default = "default_max_queue_size")]
    pub max_queue_size: usize,

    /// Enable WAL (Write-Ahead Logging) mode.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// SQLite busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl DatabaseConfig {
    /// Configuration for `database_path` with all other fields at their
    /// defaults.
    pub fn new(database_path: impl Into<String>) -> Self {
        Self {
            database_path: database_path.into(),
            max_queue_size: default_max_queue_size(),
            wal_mode: default_wal_mode(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

fn default_max_queue_size() -> usize {
    100
}

fn default_wal_mode() -> bool {
    true
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

// SPDX-FileCopyrightText: 2026 Serialite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-writer serialization engine for embedded SQLite.
//!
//! Many threads, one connection: read statements run synchronously on the
//! calling thread, write statements are queued to a dedicated writer thread
//! that owns the connection and batches commits. Writes are fire-and-forget:
//! `execute` returns as soon as the statement is queued, and failures inside
//! the worker are logged rather than returned.
//!
//! ```no_run
//! use serialite::{Database, Value};
//!
//! # async fn demo() -> Result<(), serialite::SerialiteError> {
//! let db = Database::open("/tmp/test.sqlite").await?;
//! db.execute("CREATE TABLE tester (timestamp DATETIME, uuid TEXT)", &[])
//!     .await?;
//! db.execute(
//!     "INSERT INTO tester VALUES (?, ?)",
//!     &[
//!         Value::Text("2010-01-01 13:00:00".into()),
//!         Value::Text("bow".into()),
//!     ],
//! )
//! .await?;
//! let rows = db.query("SELECT * FROM tester", &[]).await?;
//! println!("{} rows", rows.len());
//! db.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod worker;

pub use database::Database;
pub use serialite_core::{
    DatabaseConfig, ExecuteResult, Row, SerialiteError, StatementKind, Value,
};
pub use worker::PendingWrite;

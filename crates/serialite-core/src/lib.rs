// SPDX-FileCopyrightText: 2026 Serialite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the serialite engine.
//!
//! This crate provides the error type, the value/row types exchanged with
//! callers, statement classification, and the configuration model shared by
//! the serialite workspace.

pub mod config;
pub mod error;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use config::DatabaseConfig;
pub use error::SerialiteError;
pub use types::{ExecuteResult, Row, StatementKind, Value};

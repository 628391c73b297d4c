//! Backend implementations for the ledger
//!
//! - `sqlite`: SQLite-based backend (default, requires `sqlite` feature)
//! - `memory`: in-process backend for tests and dry runs

pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

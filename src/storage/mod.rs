//! Storage layer for mailroom.
//!
//! Device-local, SQLite-based persistence addressed by logical key, used by
//! the offline queue and the mailbox cache.

mod database;
mod migrations;

pub use database::Database;

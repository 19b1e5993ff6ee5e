//! # Kairix Core
//!
//! Shared logic for Kairix: the conversation export data model, the
//! transcript flattener, and the document store abstraction.
//!
//! This crate contains no tokio, sqlx, or filesystem I/O. The import
//! driver, SQLite store, and CLI live in the `kairix` crate.

pub mod flatten;
pub mod models;
pub mod store;

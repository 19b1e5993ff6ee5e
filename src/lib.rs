//! # Kairix
//!
//! Imports exported chat history into a local document store.
//!
//! Each conversation of a ChatGPT-style export is flattened into a plain
//! text transcript (one `(timestamp)-sender: text` line per message) and
//! stored as one document.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ export.json │──▶│ Import driver │──▶│ DocumentStore │
//! └─────────────┘   │  + flattener  │   │   (SQLite)    │
//!                   └──────┬───────┘   └──────────────┘
//!                          ▼
//!                  notifications ──▶ CLI / log file
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! kairix init                       # create database
//! kairix import conversations.json  # import an export
//! kairix list                       # show stored documents
//! kairix get <uid>                  # print one transcript
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`import`] | Import driver |
//! | [`progress`] | Notifications and reporters |
//! | [`sqlite_store`] | SQLite document store |
//! | [`logging`] | Log file subscriber |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema installation |
//! | [`documents`] | `list` / `get` commands |

pub mod config;
pub mod db;
pub mod documents;
pub mod import;
pub mod logging;
pub mod migrate;
pub mod progress;
pub mod sqlite_store;

pub use kairix_core::{flatten, models, store};

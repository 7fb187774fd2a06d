//! Orchestrates [`kybase_core`], [`kybase_crypto`], [`kybase_storage`],
//! and [`kybase_search`] into the store's public surface: a per-workspace
//! [`Workspace`] exposing KV, collection, history, and replication
//! operations, and an [`Engine`] facade that opens workspaces by name and
//! performs the one operation that spans two of them (`move_key`).
//!
//! Nothing here is exposed to untrusted input directly; the crate that
//! wires up a CLI or server is responsible for auth and request parsing.

#![warn(missing_docs)]

pub mod async_ops;
pub mod codec;
pub mod collections;
pub mod concurrency;
pub mod config;
pub mod export_import;
pub mod history;
pub mod kv;
pub mod manager;
pub mod replication;
pub mod rotate;
pub mod search;
pub mod validator;
pub mod workspace;

pub use async_ops::{getkey_async, save_async};
pub use config::EngineConfig;
pub use export_import::DataFormat;
pub use history::HistoryEntry;
pub use kv::SaveOutcome;
pub use manager::{Engine, OverwritePolicy};
pub use replication::ReplicationEvent;
pub use search::SearchHit;
pub use validator::{NoopValidator, Validator};
pub use workspace::Workspace;

pub use kybase_core::{Error, Key, Result, Timestamp, Value, WorkspaceType};

//! Durable, crash-safe per-workspace storage: write-ahead log, manifest,
//! snapshots, the in-memory table set, TTL indexing, and retention
//! compaction.
//!
//! A workspace is a directory rather than a single file — see
//! [`page_store`] for why — containing a manifest, a WAL, and
//! (eventually) a snapshot. [`page_store::WorkspaceStore`] is the only
//! type engine code should need from this crate; everything else is
//! implementation detail it composes.

#![warn(missing_docs)]

pub mod compaction;
pub mod error;
pub mod format;
pub mod mutation;
pub mod page_store;
pub mod tables;
pub mod ttl;
pub mod wal;

pub use error::{Result, StorageError};
pub use mutation::{Mutation, WalFrame};
pub use page_store::WorkspaceStore;
pub use tables::{ArchiveRecord, EntryRow, HistoryOp, HistoryRecord, ItemRow, ReplicationEntry, Tables};
pub use wal::{DurabilityMode, WalConfig};

//! # kybase
//!
//! An embeddable, single-process key-value and queue store: workspace
//! isolation, TTL expiry, full-text search, audit history with
//! point-in-time restore, a replication log, and optional at-rest
//! encryption.
//!
//! # Quick Start
//!
//! ```no_run
//! use kybase::{Engine, EngineConfig, Value};
//!
//! fn main() -> kybase::Result<()> {
//!     let engine = Engine::open(EngineConfig::new("./my-data"))?;
//!     let ws = engine.workspace("default")?;
//!
//!     ws.save("user:name", Value::Text("Alice".into()), None)?;
//!     assert_eq!(ws.getkey("user:name", true)?, Value::Text("Alice".into()));
//!
//!     ws.delete("user:name")?;
//!     ws.restore("user:name", None)?; // revives the last value
//!
//!     Ok(())
//! }
//! ```
//!
//! # Surface
//!
//! | Area | Purpose | Key methods |
//! |------|---------|-------------|
//! | KV | Scalars, mappings, sequences with TTL | `save`, `getkey`, `patch`, `push_value`, `delete` |
//! | Collections | Queue / stack / priority_queue | `push`, `pop`, `peek`, `count` |
//! | History | Audit trail, point-in-time restore | `get_history`, `restore`, `restore_to` |
//! | Replication | Ordered change stream | `get_replication_stream` |
//! | Manager | Cross-workspace operations | `Engine::list`, `Engine::move_key`, `Engine::drop_workspace` |
//!
//! [`Engine`] opens and caches one [`Workspace`] per name under a single
//! data directory. Internal crates (core, crypto, storage, search) are
//! not part of the stability contract; only this crate's re-exports are.

pub use kybase_engine::{
    getkey_async, save_async, DataFormat, Engine, EngineConfig, Error, HistoryEntry, Key,
    NoopValidator, OverwritePolicy, ReplicationEvent, Result, SaveOutcome, SearchHit, Timestamp,
    Validator, Value, Workspace, WorkspaceType,
};

//! Core types for kybase: the dynamic [`Value`], validated [`Key`]s,
//! [`Timestamp`]s, TTL parsing, the workspace [`WorkspaceType`] tag, and
//! the shared [`Error`] taxonomy.
//!
//! Nothing in this crate touches disk or holds a lock; it is the common
//! vocabulary every other crate in the workspace builds on.

#![warn(missing_docs)]

pub mod error;
pub mod key;
pub mod timestamp;
pub mod ttl;
pub mod value;
pub mod workspace_type;

pub use error::{Error, Result};
pub use key::{validate_workspace_name, Key};
pub use timestamp::Timestamp;
pub use value::Value;
pub use workspace_type::WorkspaceType;

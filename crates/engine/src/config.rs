//! Engine-wide configuration. Loading it from a file or environment is
//! the caller's concern; this module only defines and validates the
//! struct and its defaults.

use kybase_storage::DurabilityMode;
use std::path::PathBuf;
use std::time::Duration;

/// Construction parameters for an [`crate::Engine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Root directory holding one subdirectory per workspace.
    pub data_dir: PathBuf,
    /// How many days history, archive, and replication rows are kept
    /// before `compact` (or the open-time sweep) drops them.
    pub retention_days: u32,
    /// WAL fsync policy for newly opened workspaces.
    pub durability: DurabilityMode,
    /// Upper bound on how long a call may wait for the write lock
    /// before failing with `Timeout`.
    pub call_deadline: Duration,
    /// Master passphrase for the crypto envelope, if at-rest encryption
    /// is in use. `None` means reads of encrypted payloads return the
    /// opaque placeholder and writes are never encrypted.
    pub master_key: Option<String>,
}

impl EngineConfig {
    /// Defaults with `data_dir` set explicitly; every other field takes
    /// its documented default.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        EngineConfig {
            data_dir: data_dir.into(),
            retention_days: 15,
            durability: DurabilityMode::default(),
            call_deadline: Duration::from_secs(30),
            master_key: None,
        }
    }
}

//! Tunables for the write-ahead log.

use super::durability::DurabilityMode;

/// WAL configuration for one workspace store.
#[derive(Debug, Clone)]
pub struct WalConfig {
    /// When to fsync committed frames.
    pub durability: DurabilityMode,
    /// Once the WAL file exceeds this many bytes, `WorkspaceStore::commit`
    /// reports that a checkpoint is due (via `checkpoint_recommended`);
    /// the caller decides when to actually run one.
    pub checkpoint_threshold_bytes: u64,
}

impl Default for WalConfig {
    fn default() -> Self {
        WalConfig {
            durability: DurabilityMode::default(),
            checkpoint_threshold_bytes: 64 * 1024 * 1024,
        }
    }
}

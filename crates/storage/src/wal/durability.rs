//! Durability mode for WAL writes.
//!
//! Controls when a commit's WAL frame is fsynced, trading latency against
//! the amount of recent history that can be lost on a crash.

/// Durability mode for WAL writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurabilityMode {
    /// No persistence: writes go straight to the in-memory tables and the
    /// WAL append is skipped entirely. All data lost on crash. Useful for
    /// tests and ephemeral scratch workspaces.
    InMemory,

    /// fsync after every commit. Safest, slowest; use when a single lost
    /// write is unacceptable.
    Strict,

    /// fsync every `batch_size` commits or every `interval_ms`,
    /// whichever comes first. A balance of throughput and bounded data
    /// loss; opt in explicitly when `Strict`'s per-commit fsync is too
    /// slow.
    Batched {
        /// Maximum milliseconds between fsyncs.
        interval_ms: u64,
        /// Maximum commits between fsyncs.
        batch_size: usize,
    },
}

impl DurabilityMode {
    /// False only for [`DurabilityMode::InMemory`].
    pub fn requires_wal(&self) -> bool {
        !matches!(self, DurabilityMode::InMemory)
    }

    /// True only for [`DurabilityMode::Strict`].
    pub fn requires_immediate_fsync(&self) -> bool {
        matches!(self, DurabilityMode::Strict)
    }
}

impl Default for DurabilityMode {
    /// Synchronous commit: fsync after every commit. Callers that want
    /// bounded-loss batching opt into [`DurabilityMode::Batched`]
    /// explicitly.
    fn default() -> Self {
        DurabilityMode::Strict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_skips_wal() {
        assert!(!DurabilityMode::InMemory.requires_wal());
        assert!(!DurabilityMode::InMemory.requires_immediate_fsync());
    }

    #[test]
    fn strict_requires_immediate_fsync() {
        assert!(DurabilityMode::Strict.requires_wal());
        assert!(DurabilityMode::Strict.requires_immediate_fsync());
    }

    #[test]
    fn batched_does_not_require_immediate_fsync() {
        let mode = DurabilityMode::Batched { interval_ms: 100, batch_size: 1000 };
        assert!(mode.requires_wal());
        assert!(!mode.requires_immediate_fsync());
    }

    #[test]
    fn default_is_strict() {
        assert_eq!(DurabilityMode::default(), DurabilityMode::Strict);
    }
}

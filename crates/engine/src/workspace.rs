//! A single open workspace: its backing store, search index, and the
//! codec/crypto/validator policy applied to every operation against it.

use crate::codec;
use crate::config::EngineConfig;
use crate::validator::{NoopValidator, Validator};
use kybase_core::{Error, Result, Timestamp, WorkspaceType};
use kybase_search::InvertedIndex;
use kybase_storage::{Mutation, WalConfig, WorkspaceStore};
use parking_lot::{Mutex, RwLock};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// One open workspace: combines durable storage, the full-text index
/// kept over its live values, and the policy (crypto key, validator,
/// retention) applied on every call.
///
/// Every field supports interior mutability so the engine can share one
/// `Workspace` across threads behind an `Arc` rather than a `Mutex` of
/// the whole struct. `write_lock` is the serialization point for
/// operations that read-then-decide-then-commit (`save`'s `nochange`
/// check, `pop`, `push` with `unique`): a plain `store.commit` call is
/// already atomic, but the decision of *what* to commit is not, so two
/// concurrent pops could otherwise both choose the same head item.
pub struct Workspace {
    pub(crate) name: String,
    pub(crate) store: WorkspaceStore,
    pub(crate) index: InvertedIndex,
    pub(crate) master_key: RwLock<Option<Vec<u8>>>,
    pub(crate) retention_days: u32,
    pub(crate) call_deadline: Duration,
    pub(crate) validator: Arc<dyn Validator>,
    pub(crate) write_lock: Mutex<()>,
}

impl Workspace {
    /// Open (creating if absent) the workspace directory at `dir`,
    /// rebuild its search index from live entries, purge anything
    /// already expired, and run the open-time retention sweep.
    pub fn open(name: &str, dir: &Path, config: &EngineConfig) -> Result<Self> {
        kybase_core::validate_workspace_name(name)?;
        let store = WorkspaceStore::open(dir, WalConfig {
            durability: config.durability,
            ..WalConfig::default()
        })?;

        let ws = Workspace {
            name: name.to_string(),
            store,
            index: InvertedIndex::new(),
            master_key: RwLock::new(config.master_key.as_ref().map(|k| k.as_bytes().to_vec())),
            retention_days: config.retention_days,
            call_deadline: config.call_deadline,
            validator: Arc::new(NoopValidator),
            write_lock: Mutex::new(()),
        };

        ws.rebuild_index();
        ws.purge_expired()?;
        ws.run_open_time_retention()?;
        Ok(ws)
    }

    /// Install a custom validator, replacing the default no-op one.
    /// Intended to be called right after `open`, before the workspace
    /// is shared across threads.
    pub fn set_validator(&mut self, validator: Arc<dyn Validator>) {
        self.validator = validator;
    }

    /// Acquire the write-serialization lock for a decide-then-commit
    /// sequence, honoring the workspace's per-call deadline. Fails with
    /// `Error::Timeout` if the lock is still held by another call when
    /// the deadline elapses, rather than blocking indefinitely.
    pub(crate) fn lock_for_write(&self) -> Result<parking_lot::MutexGuard<'_, ()>> {
        self.write_lock.try_lock_for(self.call_deadline).ok_or(Error::Timeout)
    }

    /// The workspace's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The persisted collection-mode tag, `None` until the first write.
    pub fn workspace_type(&self) -> Option<WorkspaceType> {
        self.store.workspace_type()
    }

    /// Set the workspace's collection-mode tag. A no-op if `ty` matches
    /// what is already set; errors if a different type was set
    /// previously, since the tag is write-once.
    pub fn set_type(&self, ty: WorkspaceType) -> Result<()> {
        self.store.set_workspace_type(ty)?;
        Ok(())
    }

    fn rebuild_index(&self) {
        let plaintext_docs: Vec<(String, String)> = self.store.read(|tables| {
            tables
                .entries
                .iter()
                .filter(|(_, row)| !row.encrypted)
                .map(|(key, row)| (key.clone(), String::from_utf8_lossy(&row.value).into_owned()))
                .collect()
        });
        for (key, text) in plaintext_docs {
            self.index.index_document(&key, &text);
        }
    }

    /// Lazily evict every entry whose `expires_at` has passed. Safe to
    /// call repeatedly; a no-op once nothing is expired.
    pub(crate) fn purge_expired(&self) -> Result<()> {
        let now = now_micros();
        let expired_keys: Vec<String> = self.store.read(|tables| tables.ttl_index.find_expired(now));
        if expired_keys.is_empty() {
            return Ok(());
        }
        let mutations = expired_keys
            .iter()
            .map(|key| Mutation::ExpireEntry { key: key.clone(), at: now })
            .collect();
        self.store.commit(mutations)?;
        for key in &expired_keys {
            self.index.remove_document(key);
        }
        Ok(())
    }

    fn run_open_time_retention(&self) -> Result<()> {
        let cutoff = now_micros().saturating_sub(retention_micros(self.retention_days));
        self.store.compact(cutoff)?;
        Ok(())
    }

    pub(crate) fn require_kv_mode(&self, op: &str) -> Result<()> {
        match self.workspace_type() {
            Some(ty) if ty.is_collection() => Err(Error::type_mismatch(op, ty.as_str())),
            _ => Ok(()),
        }
    }

    pub(crate) fn require_collection_mode(&self, op: &str) -> Result<WorkspaceType> {
        match self.workspace_type() {
            Some(WorkspaceType::Kv) => Err(Error::type_mismatch(op, "kv")),
            Some(ty) => Ok(ty),
            None => Err(Error::Validation(format!(
                "'{op}' requires a collection workspace type to be set first"
            ))),
        }
    }

    pub(crate) fn encode_value(&self, value: &kybase_core::Value) -> Result<(Vec<u8>, bool)> {
        codec::encode(value, self.master_key.read().as_deref())
    }

    pub(crate) fn decode_value(&self, bytes: &[u8], encrypted: bool) -> Result<kybase_core::Value> {
        codec::decode(bytes, encrypted, self.master_key.read().as_deref())
    }

    /// Decode `bytes` under an explicit key rather than the workspace's
    /// configured one. Used by `rotate_master_key` to authenticate
    /// against the old key while the field still (or already) holds a
    /// different one.
    pub(crate) fn decode_value_with(&self, bytes: &[u8], encrypted: bool, key: &[u8]) -> Result<kybase_core::Value> {
        codec::decode(bytes, encrypted, Some(key))
    }

    pub(crate) fn encode_value_with(&self, value: &kybase_core::Value, key: &[u8]) -> Result<(Vec<u8>, bool)> {
        codec::encode(value, Some(key))
    }
}

/// Current wall-clock time in microseconds, the unit every on-disk
/// timestamp uses.
pub(crate) fn now_micros() -> u64 {
    Timestamp::now().as_micros()
}

/// Convert a retention window in days to microseconds.
pub(crate) fn retention_micros(days: u32) -> u64 {
    (days as u64) * 86_400 * 1_000_000
}

//! In-memory representation of the six per-workspace tables.
//!
//! `Tables` is the thing a [`crate::page_store::WorkspaceStore`] guards
//! with a lock and rebuilds on open by loading the latest snapshot and
//! replaying WAL frames committed after it. Every mutating method here
//! corresponds 1:1 to a [`crate::mutation::Mutation`] variant — this is
//! the *apply* half of the WAL; the *append* half lives in
//! `crate::wal`.

use crate::ttl::TTLIndex;
use kybase_core::WorkspaceType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A live key-value row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryRow {
    /// Canonical-encoded, possibly encrypted, value bytes.
    pub value: Vec<u8>,
    /// Whether `value` is an encryption envelope.
    pub encrypted: bool,
    /// First-write timestamp.
    pub created_at: u64,
    /// Most recent write timestamp.
    pub updated_at: u64,
    /// Absolute expiry, if a TTL was supplied.
    pub expires_at: Option<u64>,
}

/// A collection-mode item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRow {
    /// Canonical-encoded, possibly encrypted, value bytes.
    pub value: Vec<u8>,
    /// Whether `value` is an encryption envelope.
    pub encrypted: bool,
    /// Present only in a `priority_queue` workspace.
    pub priority: Option<i64>,
    /// Insertion timestamp.
    pub created_at: u64,
}

/// The operation a [`HistoryRecord`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryOp {
    /// First write of a key.
    Create,
    /// Overwrite of an existing key.
    Update,
    /// `delete` moved the key to Archive.
    Delete,
    /// TTL-triggered eviction (no Archive row).
    Expire,
}

impl HistoryOp {
    /// Lowercase tag used in CLI/export output.
    pub fn as_str(self) -> &'static str {
        match self {
            HistoryOp::Create => "create",
            HistoryOp::Update => "update",
            HistoryOp::Delete => "delete",
            HistoryOp::Expire => "expire",
        }
    }
}

/// One append-only audit entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Monotone, per-workspace sequence number.
    pub seq: u64,
    /// The key this record describes.
    pub key: String,
    /// The value snapshot after the mutation (same representation as the
    /// corresponding `EntryRow.value`); `None` for `Delete`/`Expire`.
    pub value: Option<Vec<u8>>,
    /// Whether `value` is an encryption envelope.
    pub encrypted: bool,
    /// The kind of mutation.
    pub op: HistoryOp,
    /// Commit timestamp.
    pub timestamp: u64,
}

/// A tombstoned key, kept around for cheap `restore` without a history
/// walk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveRecord {
    /// The value the key held just before deletion.
    pub value: Vec<u8>,
    /// Whether `value` is an encryption envelope.
    pub encrypted: bool,
    /// Deletion timestamp.
    pub deleted_at: u64,
}

/// One entry in the replication stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicationEntry {
    /// Strictly increasing, per-workspace sequence number.
    pub seq: u64,
    /// Short operation tag (`"save"`, `"delete"`, `"restore"`, `"expire"`,
    /// `"push"`, `"pop"`, `"clear"`, `"set_type"`).
    pub op: String,
    /// The affected key, when the mutation is key-addressed.
    pub key: Option<String>,
    /// The value after the mutation, when applicable.
    pub value_after: Option<Vec<u8>>,
    /// Commit timestamp.
    pub timestamp: u64,
}

/// The full in-memory state of one workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tables {
    /// Live kv-mode entries, keyed by their string key.
    pub entries: BTreeMap<String, EntryRow>,
    /// Live collection-mode items, keyed by item id.
    pub items: BTreeMap<u64, ItemRow>,
    /// Next item id to assign.
    pub next_item_id: u64,
    /// Append-only audit log, oldest first.
    pub history: Vec<HistoryRecord>,
    /// Next history sequence number.
    pub next_history_seq: u64,
    /// Tombstoned keys available for cheap restore.
    pub archive: BTreeMap<String, ArchiveRecord>,
    /// Append-only replication journal, oldest first.
    pub replication: Vec<ReplicationEntry>,
    /// Next replication sequence number.
    pub next_replication_seq: u64,
    /// `None` until the workspace's first type-setting write.
    pub workspace_type: Option<WorkspaceType>,
    /// Expiry index mirroring `entries`, rebuilt on load.
    #[serde(skip)]
    pub ttl_index: TTLIndex,
}

impl Tables {
    /// An empty table set for a brand-new workspace.
    pub fn new() -> Self {
        Tables {
            entries: BTreeMap::new(),
            items: BTreeMap::new(),
            next_item_id: 1,
            history: Vec::new(),
            next_history_seq: 1,
            archive: BTreeMap::new(),
            replication: Vec::new(),
            next_replication_seq: 1,
            workspace_type: None,
            ttl_index: TTLIndex::new(),
        }
    }

    /// Rebuild the TTL index from `entries`. Called once after loading a
    /// snapshot and replaying the WAL, since the index itself is not
    /// persisted.
    pub fn rebuild_ttl_index(&mut self) {
        self.ttl_index = TTLIndex::new();
        for (key, row) in &self.entries {
            if let Some(expires_at) = row.expires_at {
                self.ttl_index.insert(expires_at, key.clone());
            }
        }
    }

    fn push_history(&mut self, key: &str, value: Option<Vec<u8>>, encrypted: bool, op: HistoryOp, at: u64) {
        let seq = self.next_history_seq;
        self.next_history_seq += 1;
        self.history.push(HistoryRecord {
            seq,
            key: key.to_string(),
            value,
            encrypted,
            op,
            timestamp: at,
        });
    }

    fn push_replication(&mut self, op: &str, key: Option<String>, value_after: Option<Vec<u8>>, at: u64) {
        let seq = self.next_replication_seq;
        self.next_replication_seq += 1;
        self.replication.push(ReplicationEntry {
            seq,
            op: op.to_string(),
            key,
            value_after,
            timestamp: at,
        });
    }

    /// Apply a `SaveEntry` mutation.
    #[allow(clippy::too_many_arguments)]
    pub fn apply_save_entry(
        &mut self,
        key: &str,
        value: Vec<u8>,
        encrypted: bool,
        created_at: Option<u64>,
        updated_at: u64,
        expires_at: Option<u64>,
        is_create: bool,
    ) {
        if let Some(old) = self.entries.get(key) {
            if let Some(old_exp) = old.expires_at {
                self.ttl_index.remove(old_exp, key);
            }
        }
        let row_created_at = created_at.unwrap_or_else(|| {
            self.entries.get(key).map(|r| r.created_at).unwrap_or(updated_at)
        });
        self.entries.insert(
            key.to_string(),
            EntryRow {
                value: value.clone(),
                encrypted,
                created_at: row_created_at,
                updated_at,
                expires_at,
            },
        );
        if let Some(exp) = expires_at {
            self.ttl_index.insert(exp, key.to_string());
        }
        self.archive.remove(key);
        let op = if is_create { HistoryOp::Create } else { HistoryOp::Update };
        self.push_history(key, Some(value.clone()), encrypted, op, updated_at);
        self.push_replication(op.as_str(), Some(key.to_string()), Some(value), updated_at);
    }

    /// Apply a `DeleteEntry` mutation.
    pub fn apply_delete_entry(&mut self, key: &str, at: u64) {
        if let Some(row) = self.entries.remove(key) {
            if let Some(exp) = row.expires_at {
                self.ttl_index.remove(exp, key);
            }
            self.archive.insert(
                key.to_string(),
                ArchiveRecord {
                    value: row.value,
                    encrypted: row.encrypted,
                    deleted_at: at,
                },
            );
        }
        self.push_history(key, None, false, HistoryOp::Delete, at);
        self.push_replication("delete", Some(key.to_string()), None, at);
    }

    /// Apply an `ExpireEntry` mutation.
    pub fn apply_expire_entry(&mut self, key: &str, at: u64) {
        if let Some(row) = self.entries.remove(key) {
            if let Some(exp) = row.expires_at {
                self.ttl_index.remove(exp, key);
            }
        }
        self.push_history(key, None, false, HistoryOp::Expire, at);
        self.push_replication("expire", Some(key.to_string()), None, at);
    }

    /// Apply a `RestoreEntry` mutation.
    pub fn apply_restore_entry(&mut self, key: &str, value: Vec<u8>, encrypted: bool, at: u64) {
        self.archive.remove(key);
        self.entries.insert(
            key.to_string(),
            EntryRow {
                value: value.clone(),
                encrypted,
                created_at: at,
                updated_at: at,
                expires_at: None,
            },
        );
        self.push_history(key, Some(value.clone()), encrypted, HistoryOp::Create, at);
        self.push_replication("restore", Some(key.to_string()), Some(value), at);
    }

    /// Apply a `PushItem` mutation.
    pub fn apply_push_item(&mut self, item_id: u64, value: Vec<u8>, encrypted: bool, priority: Option<i64>, created_at: u64) {
        self.items.insert(
            item_id,
            ItemRow {
                value: value.clone(),
                encrypted,
                priority,
                created_at,
            },
        );
        if item_id >= self.next_item_id {
            self.next_item_id = item_id + 1;
        }
        self.push_replication("push", None, Some(value), created_at);
    }

    /// Apply a `PopItem` mutation.
    pub fn apply_pop_item(&mut self, item_id: u64, at: u64) {
        self.items.remove(&item_id);
        self.push_replication("pop", None, None, at);
    }

    /// Apply a `ClearItems` mutation.
    pub fn apply_clear_items(&mut self, at: u64) {
        self.items.clear();
        self.push_replication("clear", None, None, at);
    }

    /// Apply a `SetWorkspaceType` mutation. Callers must have already
    /// checked the "set at most once" invariant; this just records it.
    pub fn apply_set_workspace_type(&mut self, ty: WorkspaceType, at: u64) {
        self.workspace_type = Some(ty);
        self.push_replication("set_type", None, None, at);
    }
}

impl Default for Tables {
    fn default() -> Self {
        Self::new()
    }
}

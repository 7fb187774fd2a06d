//! The write-ahead log's payload vocabulary.
//!
//! A committed transaction is one [`WalFrame`]: a batch of [`Mutation`]s
//! applied atomically to the in-memory tables after the frame is durable.
//! Every field a [`crate::tables::Tables`] apply step needs is carried in
//! the mutation itself — WAL replay never re-derives a value (e.g. "now")
//! because the replayed clock would diverge from the one at commit time.

use serde::{Deserialize, Serialize};

/// A single change to apply to the in-memory tables.
///
/// Values are carried as opaque bytes: by the time a mutation reaches the
/// WAL, the codec and (optionally) the crypto envelope have already run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Mutation {
    /// Insert or overwrite an Entry, appending a `create`/`update`
    /// HistoryRecord and a ReplicationEntry.
    SaveEntry {
        /// Entry key.
        key: String,
        /// Canonical-encoded, possibly encrypted, value bytes.
        value: Vec<u8>,
        /// Whether `value` is an encryption envelope.
        encrypted: bool,
        /// Set only on first insert; `None` on overwrite (created_at is
        /// preserved from the existing row).
        created_at: Option<u64>,
        /// Always set; becomes the row's `updated_at`.
        updated_at: u64,
        /// Absolute expiry, if a TTL was supplied.
        expires_at: Option<u64>,
        /// Whether this is a fresh key (`create`) or an overwrite
        /// (`update`), for the HistoryRecord op tag.
        is_create: bool,
    },

    /// Remove a live Entry, moving it to Archive and appending a
    /// `delete` HistoryRecord and ReplicationEntry.
    DeleteEntry {
        /// Entry key.
        key: String,
        /// Timestamp recorded as both the HistoryRecord time and the
        /// ArchiveRecord's `deleted_at`.
        at: u64,
    },

    /// Lazily evict an expired Entry. No Archive row; HistoryRecord op is
    /// `expire`.
    ExpireEntry {
        /// Entry key.
        key: String,
        /// Eviction timestamp.
        at: u64,
    },

    /// Reinstate a key from Archive or History, appending a `create`
    /// HistoryRecord and a ReplicationEntry. Removes the ArchiveRecord if
    /// one existed.
    RestoreEntry {
        /// Entry key.
        key: String,
        /// Restored value bytes (same representation as `SaveEntry`).
        value: Vec<u8>,
        /// Whether `value` is an encryption envelope.
        encrypted: bool,
        /// Restoration timestamp, used as both `created_at` and
        /// `updated_at` of the reinstated row.
        at: u64,
    },

    /// Push an Item onto a collection workspace.
    PushItem {
        /// Assigned item id (caller pre-allocates via the tables'
        /// counter so the WAL frame is self-contained).
        item_id: u64,
        /// Canonical-encoded, possibly encrypted, value bytes.
        value: Vec<u8>,
        /// Whether `value` is an encryption envelope.
        encrypted: bool,
        /// Required for `priority_queue`, absent otherwise.
        priority: Option<i64>,
        /// Insertion timestamp.
        created_at: u64,
    },

    /// Remove a single Item by id (used by `pop`/`pop_many`).
    PopItem {
        /// The item id removed.
        item_id: u64,
    },

    /// Remove every Item in the collection.
    ClearItems,

    /// Set the workspace's persistent collection-mode tag. Only valid
    /// once; enforced by the caller before the mutation is queued.
    SetWorkspaceType {
        /// The type to persist, as its `as_str()` form.
        workspace_type: String,
    },
}

/// A batch of mutations applied atomically, framed with the commit
/// timestamp so replay does not need to re-derive it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalFrame {
    /// The mutations to apply, in order.
    pub mutations: Vec<Mutation>,
    /// Monotonic frame sequence number within this workspace's WAL.
    pub frame_seq: u64,
}

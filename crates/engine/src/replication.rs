//! The replication stream: every committed mutation, in commit order,
//! consumable by an external shipper.

use crate::workspace::Workspace;
use kybase_core::{Result, Value};
use kybase_storage::tables::ReplicationEntry;

/// One replication row with its value already decoded.
#[derive(Debug, Clone)]
pub struct ReplicationEvent {
    /// Strictly increasing, per-workspace sequence number.
    pub seq: u64,
    /// Short operation tag (`"save"`, `"delete"`, ...).
    pub op: String,
    /// The affected key, when the mutation is key-addressed.
    pub key: Option<String>,
    /// The value after the mutation, when applicable.
    pub value_after: Option<Value>,
    /// Commit timestamp.
    pub timestamp: u64,
}

impl Workspace {
    /// Every replication entry with `seq > last_id`, in seq order.
    pub fn get_replication_stream(&self, last_id: u64) -> Result<Vec<ReplicationEvent>> {
        let rows: Vec<ReplicationEntry> = self
            .store
            .read(|t| t.replication.iter().filter(|r| r.seq > last_id).cloned().collect());
        rows.into_iter()
            .map(|r| {
                let value_after = match &r.value_after {
                    Some(bytes) => Some(self.decode_value(bytes, kybase_crypto::is_encrypted(bytes))?),
                    None => None,
                };
                Ok(ReplicationEvent {
                    seq: r.seq,
                    op: r.op,
                    key: r.key,
                    value_after,
                    timestamp: r.timestamp,
                })
            })
            .collect()
    }
}

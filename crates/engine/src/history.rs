//! Audit history: newest-first retrieval, point-in-time workspace
//! restore, and retention compaction.

use crate::workspace::{now_micros, retention_micros, Workspace};
use kybase_core::{Result, Value};
use kybase_storage::compaction::CompactionReport;
use kybase_storage::tables::HistoryRecord;
use kybase_storage::Mutation;

/// One history row as surfaced to callers, with its value already
/// decoded (the placeholder text stands in for an encrypted value read
/// without a key).
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Sequence number, monotone within the workspace.
    pub seq: u64,
    /// The affected key.
    pub key: String,
    /// The value after the mutation; `None` for `delete`/`expire`.
    pub value: Option<Value>,
    /// The kind of mutation.
    pub op: &'static str,
    /// Commit timestamp, in microseconds since the Unix epoch.
    pub timestamp: u64,
}

impl Workspace {
    /// History for `key`, newest first. Pass `"-h"` to return every
    /// key's history, newest first.
    pub fn get_history(&self, key: &str) -> Result<Vec<HistoryEntry>> {
        let records: Vec<HistoryRecord> = self.store.read(|t| {
            if key == "-h" {
                t.history.clone()
            } else {
                t.history.iter().filter(|r| r.key == key).cloned().collect()
            }
        });
        records
            .into_iter()
            .rev()
            .map(|r| {
                let value = match &r.value {
                    Some(bytes) => Some(self.decode_value(bytes, r.encrypted)?),
                    None => None,
                };
                Ok(HistoryEntry {
                    seq: r.seq,
                    key: r.key,
                    value,
                    op: r.op.as_str(),
                    timestamp: r.timestamp,
                })
            })
            .collect()
    }

    /// Replay every HistoryRecord committed at or before `ts` into a
    /// fresh Entries table, replacing the workspace's live state.
    pub fn restore_to(&self, ts: u64) -> Result<()> {
        let span = tracing::debug_span!("restore_to", workspace = %self.name(), ts);
        let _enter = span.enter();

        let _guard = self.lock_for_write()?;
        let records: Vec<HistoryRecord> = self.store.read(|t| t.history.iter().filter(|r| r.timestamp <= ts).cloned().collect());

        let mut latest_by_key: std::collections::BTreeMap<String, HistoryRecord> = std::collections::BTreeMap::new();
        for record in records {
            latest_by_key.insert(record.key.clone(), record);
        }

        let live_keys = self.store.read(|t| t.entries.keys().cloned().collect::<Vec<_>>());
        let now = now_micros();
        let mut mutations = Vec::new();
        for key in &live_keys {
            if !latest_by_key.contains_key(key) {
                mutations.push(Mutation::DeleteEntry { key: key.clone(), at: now });
            }
        }
        for (key, record) in &latest_by_key {
            match &record.value {
                Some(bytes) => mutations.push(Mutation::RestoreEntry {
                    key: key.clone(),
                    value: bytes.clone(),
                    encrypted: record.encrypted,
                    at: now,
                }),
                None => mutations.push(Mutation::DeleteEntry { key: key.clone(), at: now }),
            }
        }

        if !mutations.is_empty() {
            self.store.commit(mutations)?;
        }
        self.reindex_all()?;
        tracing::debug!(outcome = "restored", "restore_to committed");
        Ok(())
    }

    /// Drop history, archive, and replication rows older than
    /// `self.retention_days`, or an explicit `days` override.
    pub fn compact(&self, days: Option<u32>) -> Result<CompactionReport> {
        let span = tracing::debug_span!("compact", workspace = %self.name());
        let _enter = span.enter();

        let _guard = self.lock_for_write()?;
        let cutoff = now_micros().saturating_sub(retention_micros(days.unwrap_or(self.retention_days)));
        let report = self.store.compact(cutoff)?;
        tracing::debug!(outcome = "compacted", history_removed = report.history_removed, "compact committed");
        Ok(report)
    }

    pub(crate) fn reindex_all(&self) -> Result<()> {
        let plaintext_docs: Vec<(String, String)> = self.store.read(|t| {
            t.entries
                .iter()
                .filter(|(_, row)| !row.encrypted)
                .map(|(k, row)| (k.clone(), String::from_utf8_lossy(&row.value).into_owned()))
                .collect()
        });
        self.index.clear();
        for (key, text) in plaintext_docs {
            self.index.index_document(&key, &text);
        }
        Ok(())
    }
}

//! Re-encrypting every stored value under a new master key.

use crate::workspace::{now_micros, Workspace};
use kybase_core::Result;
use kybase_storage::Mutation;

/// Encrypted rows rewritten per transaction when no explicit batch size
/// is given.
const DEFAULT_BATCH_SIZE: usize = 256;

impl Workspace {
    /// Decrypt every encrypted Entry with `old`, re-encrypt it with
    /// `new`, and install `new` as the workspace's active key. Rewrites
    /// happen `batch_size` rows at a time, each batch its own
    /// transaction; a decrypt failure (wrong `old` key) aborts before
    /// the current batch is committed, leaving prior batches' rewrites
    /// (and the key) as they were. Returns the total number of rows
    /// rewritten.
    pub fn rotate_master_key(&self, old: &[u8], new: &[u8], batch_size: Option<usize>) -> Result<usize> {
        let span = tracing::debug_span!("rotate_master_key", workspace = %self.name());
        let _enter = span.enter();

        let _guard = self.lock_for_write()?;
        let batch_size = batch_size.unwrap_or(DEFAULT_BATCH_SIZE).max(1);

        let encrypted_keys: Vec<String> =
            self.store.read(|t| t.entries.iter().filter(|(_, row)| row.encrypted).map(|(k, _)| k.clone()).collect());

        let mut rewritten = 0usize;
        for chunk in encrypted_keys.chunks(batch_size) {
            let now = now_micros();
            let mut mutations = Vec::with_capacity(chunk.len());
            for key in chunk {
                let row = match self.store.read(|t| t.entries.get(key.as_str()).cloned()) {
                    Some(row) => row,
                    None => continue, // deleted between the scan and this batch
                };
                let value = self.decode_value_with(&row.value, row.encrypted, old)?;
                let (bytes, encrypted) = self.encode_value_with(&value, new)?;
                mutations.push(Mutation::SaveEntry {
                    key: key.clone(),
                    value: bytes,
                    encrypted,
                    created_at: None,
                    updated_at: now,
                    expires_at: row.expires_at,
                    is_create: false,
                });
            }
            if !mutations.is_empty() {
                rewritten += mutations.len();
                self.store.commit(mutations)?;
            }
        }

        *self.master_key.write() = Some(new.to_vec());
        tracing::debug!(outcome = "rotated", rewritten, "rotate_master_key committed");
        Ok(rewritten)
    }
}

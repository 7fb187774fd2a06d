//! The workspace manifest: the one piece of metadata that must survive
//! independently of the WAL/snapshot, since it gates `set_type`.

use crate::error::{Result, StorageError};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// Current on-disk schema version. Bumped when the WAL/snapshot record
/// formats change in an incompatible way; carried so a future version can
/// migrate forward.
pub const SCHEMA_VERSION: u32 = 1;

/// Persistent per-workspace metadata: the collection-mode tag (set at
/// most once) and the schema version the store was created with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// `None` until the first `set_type`/implicit-kv write.
    pub workspace_type: Option<String>,
    /// Schema version this workspace's files were written under.
    pub schema_version: u32,
}

impl Manifest {
    /// A fresh manifest for a brand-new workspace directory.
    pub fn new() -> Self {
        Manifest {
            workspace_type: None,
            schema_version: SCHEMA_VERSION,
        }
    }

    /// Load the manifest from `path`, or `None` if it does not exist yet.
    pub fn load(path: &Path) -> Result<Option<Manifest>> {
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(path)?;
        if bytes.len() < 4 {
            return Err(StorageError::CorruptRecord("manifest too short".to_string()));
        }
        let (crc_bytes, payload) = bytes.split_at(4);
        let expected_crc = u32::from_le_bytes(crc_bytes.try_into().unwrap());
        if crc32fast::hash(payload) != expected_crc {
            return Err(StorageError::CorruptRecord("manifest checksum mismatch".to_string()));
        }
        let manifest: Manifest =
            bincode::deserialize(payload).map_err(|e| StorageError::CorruptRecord(e.to_string()))?;
        Ok(Some(manifest))
    }

    /// Write the manifest to `path`, fsyncing so a crash immediately
    /// after `set_type` cannot silently revert the type.
    pub fn store(&self, path: &Path) -> Result<()> {
        let payload = bincode::serialize(self).map_err(|e| StorageError::Serialization(e.to_string()))?;
        let crc = crc32fast::hash(&payload);
        let mut file = std::fs::File::create(path)?;
        file.write_all(&crc.to_le_bytes())?;
        file.write_all(&payload)?;
        file.sync_all()?;
        Ok(())
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("manifest.bin");
        let mut m = Manifest::new();
        m.workspace_type = Some("queue".to_string());
        m.store(&path).unwrap();

        let loaded = Manifest::load(&path).unwrap().unwrap();
        assert_eq!(loaded.workspace_type.as_deref(), Some("queue"));
        assert_eq!(loaded.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.bin");
        assert!(Manifest::load(&path).unwrap().is_none());
    }
}

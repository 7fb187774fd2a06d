//! Full-state snapshot: a point-in-time dump of [`crate::tables::Tables`]
//! that lets WAL replay start from `frame_seq` N+1 instead of from empty.
//!
//! Framing mirrors `format::record` (`len ‖ crc32 ‖ payload`) but a
//! snapshot file holds exactly one such record.

use crate::error::{Result, StorageError};
use crate::tables::Tables;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// A snapshot on disk: the tables plus the last WAL frame it includes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// The table state as of `last_frame_seq`.
    pub tables: Tables,
    /// The highest WAL frame sequence number folded into `tables`. WAL
    /// replay on open skips frames with `frame_seq <= last_frame_seq`.
    pub last_frame_seq: u64,
}

/// Write `snapshot` to `path`, replacing any existing file atomically via
/// a temp-file-then-rename so a crash mid-write never leaves a corrupt
/// snapshot in place of a good one.
pub fn write(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let payload = bincode::serialize(snapshot).map_err(|e| StorageError::Serialization(e.to_string()))?;
    let crc = crc32fast::hash(&payload);

    let tmp_path = path.with_extension("tmp");
    {
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_u32::<LittleEndian>(payload.len() as u32)?;
        file.write_u32::<LittleEndian>(crc)?;
        file.write_all(&payload)?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Load the snapshot at `path`, or `None` if it does not exist yet (a
/// freshly created workspace has no snapshot until its first
/// checkpoint).
pub fn load(path: &Path) -> Result<Option<Snapshot>> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = std::fs::read(path)?;
    let mut cursor = std::io::Cursor::new(bytes);
    let len = cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| StorageError::CorruptRecord("truncated snapshot header".to_string()))?;
    let crc = cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| StorageError::CorruptRecord("truncated snapshot header".to_string()))?;
    let mut payload = vec![0u8; len as usize];
    std::io::Read::read_exact(&mut cursor, &mut payload)
        .map_err(|_| StorageError::CorruptRecord("truncated snapshot payload".to_string()))?;
    if crc32fast::hash(&payload) != crc {
        return Err(StorageError::CorruptRecord("snapshot checksum mismatch".to_string()));
    }
    let snapshot: Snapshot =
        bincode::deserialize(&payload).map_err(|e| StorageError::CorruptRecord(e.to_string()))?;
    Ok(Some(snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snapshot.bin");
        let mut tables = Tables::new();
        tables.apply_save_entry("k", b"v".to_vec(), false, Some(1), 1, None, true);
        let snap = Snapshot {
            tables,
            last_frame_seq: 7,
        };
        write(&path, &snap).unwrap();

        let loaded = load(&path).unwrap().unwrap();
        assert_eq!(loaded.last_frame_seq, 7);
        assert!(loaded.tables.entries.contains_key("k"));
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.bin");
        assert!(load(&path).unwrap().is_none());
    }
}

//! On-disk framing for a single WAL record: `len(4B) ‖ crc32(4B) ‖ payload`.
//!
//! Self-delimiting framing lets the reader stop cleanly at a truncated or
//! corrupt tail record left by a crash mid-write, without losing any
//! earlier, fully-flushed records.

use crate::error::{Result, StorageError};
use crate::mutation::WalFrame;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read};

/// Encode a [`WalFrame`] into its on-disk representation.
pub fn encode(frame: &WalFrame) -> Result<Vec<u8>> {
    let payload = bincode::serialize(frame).map_err(|e| StorageError::Serialization(e.to_string()))?;
    let crc = crc32fast::hash(&payload);
    let mut out = Vec::with_capacity(8 + payload.len());
    out.write_u32::<LittleEndian>(payload.len() as u32)?;
    out.write_u32::<LittleEndian>(crc)?;
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Read one record from `reader`.
///
/// Returns `Ok(None)` at a clean EOF (no bytes read at all). Returns
/// [`StorageError::CorruptRecord`] for a truncated header/payload or a
/// checksum mismatch — callers performing WAL replay treat that as "stop
/// here, this is the torn tail of an in-flight write" rather than a fatal
/// error.
pub fn decode_one<R: Read>(reader: &mut R) -> Result<Option<WalFrame>> {
    let len = match reader.read_u32::<LittleEndian>() {
        Ok(len) => len,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let crc = reader
        .read_u32::<LittleEndian>()
        .map_err(|_| StorageError::CorruptRecord("truncated record header".to_string()))?;
    let mut payload = vec![0u8; len as usize];
    reader
        .read_exact(&mut payload)
        .map_err(|_| StorageError::CorruptRecord("truncated record payload".to_string()))?;
    if crc32fast::hash(&payload) != crc {
        return Err(StorageError::CorruptRecord("checksum mismatch".to_string()));
    }
    let frame: WalFrame =
        bincode::deserialize(&payload).map_err(|e| StorageError::CorruptRecord(e.to_string()))?;
    Ok(Some(frame))
}

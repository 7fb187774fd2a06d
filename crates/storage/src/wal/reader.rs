//! Sequential replay of a workspace's WAL file.

use crate::error::Result;
use crate::format::record;
use crate::mutation::WalFrame;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Read every frame from the WAL at `path`, in commit order.
///
/// Stops at the first corrupt or truncated record rather than
/// propagating the error: that tail is the torn remainder of a frame
/// that was being written when the process crashed, and every fully
/// flushed frame before it is still valid.
pub fn read_all(path: &Path) -> Result<Vec<WalFrame>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut frames = Vec::new();
    loop {
        match record::decode_one(&mut reader) {
            Ok(Some(frame)) => frames.push(frame),
            Ok(None) => break,
            Err(_) => break,
        }
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::Mutation;
    use crate::wal::durability::DurabilityMode;
    use crate::wal::writer::WalWriter;
    use tempfile::tempdir;

    #[test]
    fn replays_frames_in_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wal.log");
        let mut writer = WalWriter::open(&path, DurabilityMode::Strict).unwrap();
        for seq in 1..=3 {
            writer
                .append(&WalFrame {
                    frame_seq: seq,
                    mutations: vec![Mutation::ClearItems],
                })
                .unwrap();
        }
        let frames = read_all(&path).unwrap();
        assert_eq!(frames.iter().map(|f| f.frame_seq).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn missing_file_reads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.log");
        assert!(read_all(&path).unwrap().is_empty());
    }

    #[test]
    fn stops_at_torn_tail_without_losing_prior_frames() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wal.log");
        let mut writer = WalWriter::open(&path, DurabilityMode::Strict).unwrap();
        writer
            .append(&WalFrame {
                frame_seq: 1,
                mutations: vec![Mutation::ClearItems],
            })
            .unwrap();
        drop(writer);

        let mut bytes = std::fs::read(&path).unwrap();
        bytes.extend_from_slice(&[1, 2, 3]);
        std::fs::write(&path, bytes).unwrap();

        let frames = read_all(&path).unwrap();
        assert_eq!(frames.len(), 1);
    }
}

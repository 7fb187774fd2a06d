//! Appends committed [`crate::mutation::WalFrame`]s to a workspace's
//! `wal.log` file.

use super::durability::DurabilityMode;
use crate::error::Result;
use crate::format::record;
use crate::mutation::WalFrame;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Append-only writer over one workspace's WAL file.
pub struct WalWriter {
    path: PathBuf,
    file: BufWriter<File>,
    durability: DurabilityMode,
    unsynced_commits: usize,
    bytes_written: u64,
}

impl WalWriter {
    /// Open (creating if absent) the WAL file at `path` for appending.
    pub fn open(path: &Path, durability: DurabilityMode) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let bytes_written = file.metadata()?.len();
        Ok(WalWriter {
            path: path.to_path_buf(),
            file: BufWriter::new(file),
            durability,
            unsynced_commits: 0,
            bytes_written,
        })
    }

    /// Append `frame`, fsyncing per the configured [`DurabilityMode`].
    /// No-op (other than counting) when durability is `InMemory`.
    pub fn append(&mut self, frame: &WalFrame) -> Result<()> {
        if !self.durability.requires_wal() {
            return Ok(());
        }
        let encoded = record::encode(frame)?;
        self.bytes_written += encoded.len() as u64;
        self.file.write_all(&encoded)?;
        self.unsynced_commits += 1;

        let should_sync = match self.durability {
            DurabilityMode::Strict => true,
            DurabilityMode::Batched { batch_size, .. } => self.unsynced_commits >= batch_size,
            DurabilityMode::InMemory => false,
        };
        if should_sync {
            self.sync()?;
        }
        Ok(())
    }

    /// Flush the buffer and fsync the underlying file, resetting the
    /// unsynced-commit counter used by `Batched` durability.
    pub fn sync(&mut self) -> Result<()> {
        self.file.flush()?;
        self.file.get_ref().sync_all()?;
        self.unsynced_commits = 0;
        Ok(())
    }

    /// Total bytes appended this session, used to decide when a
    /// checkpoint is due.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Path of the underlying WAL file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Truncate the WAL to empty, used right after a successful
    /// checkpoint has folded every frame into a snapshot.
    pub fn truncate(&mut self) -> Result<()> {
        self.file.flush()?;
        let file = OpenOptions::new().write(true).truncate(true).open(&self.path)?;
        file.sync_all()?;
        self.file = BufWriter::new(OpenOptions::new().append(true).open(&self.path)?);
        self.bytes_written = 0;
        self.unsynced_commits = 0;
        Ok(())
    }
}

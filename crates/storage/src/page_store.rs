//! The transactional orchestrator for one workspace: ties the manifest,
//! WAL, snapshot, and in-memory [`Tables`] together behind a
//! single-writer/many-readers lock, matching Rust's native `RwLock`
//! semantics.
//!
//! On disk a workspace is a directory (`<name>/manifest.bin`,
//! `<name>/wal.log`, `<name>/snapshot.bin`) rather than the single file
//! a literal reading of "one file per workspace" would suggest — see
//! the storage-layout note in this crate's design ledger.

use crate::error::{Result, StorageError};
use crate::format::{manifest::Manifest, snapshot};
use crate::mutation::{Mutation, WalFrame};
use crate::tables::Tables;
use crate::wal::{WalConfig, WalWriter};
use kybase_core::WorkspaceType;
use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::str::FromStr;

struct WriterState {
    wal: WalWriter,
    next_frame_seq: u64,
}

/// A single workspace's durable state plus the lock discipline that
/// guards it: many concurrent readers, one writer at a time.
pub struct WorkspaceStore {
    dir: PathBuf,
    config: WalConfig,
    manifest: Mutex<Manifest>,
    writer: Mutex<WriterState>,
    tables: RwLock<Tables>,
}

impl WorkspaceStore {
    /// Open (creating if absent) the workspace directory at `dir`,
    /// loading its manifest and latest snapshot and replaying any WAL
    /// frames committed since that snapshot.
    pub fn open(dir: &Path, config: WalConfig) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let manifest_path = dir.join("manifest.bin");
        let snapshot_path = dir.join("snapshot.bin");
        let wal_path = dir.join("wal.log");

        let manifest = Manifest::load(&manifest_path)?.unwrap_or_default();

        let (mut tables, last_frame_seq) = match snapshot::load(&snapshot_path)? {
            Some(snap) => (snap.tables, snap.last_frame_seq),
            None => (Tables::new(), 0),
        };

        let frames = crate::wal::reader::read_all(&wal_path)?;
        let mut max_seq = last_frame_seq;
        for frame in frames.iter().filter(|f| f.frame_seq > last_frame_seq) {
            for mutation in &frame.mutations {
                apply_mutation(&mut tables, mutation);
            }
            max_seq = max_seq.max(frame.frame_seq);
        }
        tables.rebuild_ttl_index();

        let wal = WalWriter::open(&wal_path, config.durability)?;

        Ok(WorkspaceStore {
            dir: dir.to_path_buf(),
            config,
            manifest: Mutex::new(manifest),
            writer: Mutex::new(WriterState {
                wal,
                next_frame_seq: max_seq + 1,
            }),
            tables: RwLock::new(tables),
        })
    }

    /// Run `f` against a read-locked snapshot of the tables. Multiple
    /// readers may run concurrently with each other, but never with a
    /// [`Self::commit`].
    pub fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        let guard = self.tables.read();
        f(&guard)
    }

    /// Append `mutations` as one atomic WAL frame, then apply them to
    /// the in-memory tables. Returns the assigned frame sequence
    /// number. Serialized: only one commit runs at a time per
    /// workspace.
    pub fn commit(&self, mutations: Vec<Mutation>) -> Result<u64> {
        let span = tracing::debug_span!("commit", workspace = %self.workspace_name(), mutation_count = mutations.len());
        let _enter = span.enter();

        let mut writer_state = self.writer.lock();
        let frame_seq = writer_state.next_frame_seq;
        let frame = WalFrame {
            mutations: mutations.clone(),
            frame_seq,
        };
        if let Err(e) = writer_state.wal.append(&frame) {
            tracing::error!(workspace = %self.workspace_name(), error = %e, "wal append failed");
            return Err(e);
        }
        writer_state.next_frame_seq += 1;

        let mut tables = self.tables.write();
        for mutation in &mutations {
            apply_mutation(&mut tables, mutation);
        }
        tracing::debug!(workspace = %self.workspace_name(), frame_seq, "commit applied");
        Ok(frame_seq)
    }

    fn workspace_name(&self) -> std::borrow::Cow<'_, str> {
        self.dir.file_name().map(|n| n.to_string_lossy()).unwrap_or_default()
    }

    /// The workspace's persisted collection-mode tag, if set.
    pub fn workspace_type(&self) -> Option<WorkspaceType> {
        self.manifest
            .lock()
            .workspace_type
            .as_deref()
            .and_then(|s| WorkspaceType::from_str(s).ok())
    }

    /// Persist `ty` as the workspace's collection-mode tag and commit a
    /// matching `SetWorkspaceType` mutation. Errors with
    /// [`StorageError::TypeAlreadySet`] if a different type was set
    /// previously; a no-op (but still `Ok`) if the same type is set
    /// again.
    pub fn set_workspace_type(&self, ty: WorkspaceType) -> Result<()> {
        let mut manifest = self.manifest.lock();
        if let Some(existing) = manifest.workspace_type.clone() {
            if existing != ty.as_str() {
                return Err(StorageError::TypeAlreadySet {
                    existing,
                    requested: ty.as_str().to_string(),
                });
            }
            return Ok(());
        }
        manifest.workspace_type = Some(ty.as_str().to_string());
        manifest.store(&self.dir.join("manifest.bin"))?;
        drop(manifest);
        self.commit(vec![Mutation::SetWorkspaceType {
            workspace_type: ty.as_str().to_string(),
        }])?;
        Ok(())
    }

    /// True once the WAL has grown past the configured checkpoint
    /// threshold. Checkpointing itself is left to the caller so it can
    /// be scheduled off the write path.
    pub fn checkpoint_recommended(&self) -> bool {
        self.writer.lock().wal.bytes_written() >= self.config.checkpoint_threshold_bytes
    }

    /// Fold the current tables into a fresh snapshot and truncate the
    /// WAL. Blocks new commits until it completes.
    pub fn checkpoint(&self) -> Result<()> {
        let mut writer_state = self.writer.lock();
        let tables = self.tables.read();
        let snap = snapshot::Snapshot {
            tables: tables.clone(),
            last_frame_seq: writer_state.next_frame_seq - 1,
        };
        drop(tables);
        snapshot::write(&self.dir.join("snapshot.bin"), &snap)?;
        writer_state.wal.truncate()?;
        Ok(())
    }

    /// Prune history, archive, and replication rows older than
    /// `cutoff_micros`. Does not touch live entries or items.
    pub fn compact(&self, cutoff_micros: u64) -> Result<crate::compaction::CompactionReport> {
        let mut tables = self.tables.write();
        let report = crate::compaction::prune(&mut tables, cutoff_micros);
        drop(tables);
        Ok(report)
    }

    /// The workspace directory this store persists to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn apply_mutation(tables: &mut Tables, mutation: &Mutation) {
    match mutation {
        Mutation::SaveEntry {
            key,
            value,
            encrypted,
            created_at,
            updated_at,
            expires_at,
            is_create,
        } => tables.apply_save_entry(key, value.clone(), *encrypted, *created_at, *updated_at, *expires_at, *is_create),
        Mutation::DeleteEntry { key, at } => tables.apply_delete_entry(key, *at),
        Mutation::ExpireEntry { key, at } => tables.apply_expire_entry(key, *at),
        Mutation::RestoreEntry { key, value, encrypted, at } => {
            tables.apply_restore_entry(key, value.clone(), *encrypted, *at)
        }
        Mutation::PushItem {
            item_id,
            value,
            encrypted,
            priority,
            created_at,
        } => tables.apply_push_item(*item_id, value.clone(), *encrypted, *priority, *created_at),
        Mutation::PopItem { item_id } => tables.apply_pop_item(*item_id, kybase_core::Timestamp::now().as_micros()),
        Mutation::ClearItems => tables.apply_clear_items(kybase_core::Timestamp::now().as_micros()),
        Mutation::SetWorkspaceType { workspace_type } => {
            if let Ok(ty) = WorkspaceType::from_str(workspace_type) {
                tables.apply_set_workspace_type(ty, kybase_core::Timestamp::now().as_micros());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn commit_then_read_sees_the_write() {
        let dir = tempdir().unwrap();
        let store = WorkspaceStore::open(dir.path(), WalConfig::default()).unwrap();
        store
            .commit(vec![Mutation::SaveEntry {
                key: "k".to_string(),
                value: b"v".to_vec(),
                encrypted: false,
                created_at: Some(1),
                updated_at: 1,
                expires_at: None,
                is_create: true,
            }])
            .unwrap();
        store.read(|t| assert!(t.entries.contains_key("k")));
    }

    #[test]
    fn reopen_replays_the_wal() {
        let dir = tempdir().unwrap();
        {
            let store = WorkspaceStore::open(dir.path(), WalConfig::default()).unwrap();
            store
                .commit(vec![Mutation::SaveEntry {
                    key: "k".to_string(),
                    value: b"v".to_vec(),
                    encrypted: false,
                    created_at: Some(1),
                    updated_at: 1,
                    expires_at: None,
                    is_create: true,
                }])
                .unwrap();
        }
        let reopened = WorkspaceStore::open(dir.path(), WalConfig::default()).unwrap();
        reopened.read(|t| assert!(t.entries.contains_key("k")));
    }

    #[test]
    fn checkpoint_then_reopen_still_sees_the_write() {
        let dir = tempdir().unwrap();
        {
            let store = WorkspaceStore::open(dir.path(), WalConfig::default()).unwrap();
            store
                .commit(vec![Mutation::SaveEntry {
                    key: "k".to_string(),
                    value: b"v".to_vec(),
                    encrypted: false,
                    created_at: Some(1),
                    updated_at: 1,
                    expires_at: None,
                    is_create: true,
                }])
                .unwrap();
            store.checkpoint().unwrap();
        }
        let reopened = WorkspaceStore::open(dir.path(), WalConfig::default()).unwrap();
        reopened.read(|t| assert!(t.entries.contains_key("k")));
    }

    #[test]
    fn set_workspace_type_twice_with_different_type_errors() {
        let dir = tempdir().unwrap();
        let store = WorkspaceStore::open(dir.path(), WalConfig::default()).unwrap();
        store.set_workspace_type(WorkspaceType::Queue).unwrap();
        let err = store.set_workspace_type(WorkspaceType::Stack).unwrap_err();
        assert!(matches!(err, StorageError::TypeAlreadySet { .. }));
    }

    #[test]
    fn set_workspace_type_twice_with_same_type_is_ok() {
        let dir = tempdir().unwrap();
        let store = WorkspaceStore::open(dir.path(), WalConfig::default()).unwrap();
        store.set_workspace_type(WorkspaceType::Queue).unwrap();
        store.set_workspace_type(WorkspaceType::Queue).unwrap();
    }
}

//! The engine facade: opens and caches [`Workspace`]s by name, lists the
//! data directory, and performs the only operation that spans two
//! workspaces at once (`move_key`).

use crate::config::EngineConfig;
use crate::workspace::Workspace;
use dashmap::DashMap;
use kybase_core::{Error, Result, Value};
use parking_lot::Mutex;
use std::fs;
use std::sync::Arc;

/// What to do when `move_key`'s destination key already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwritePolicy {
    /// Overwrite the existing value in the target workspace.
    Overwrite,
    /// Fail instead of overwriting.
    Abort,
}

/// Opens and caches per-workspace stores under one data directory.
///
/// Each workspace is opened at most once per process; subsequent
/// `workspace()` calls for the same name return the same `Arc<Workspace>`,
/// so the `Workspace`'s own write lock is the only serialization point —
/// there is no manager-wide lock on ordinary per-workspace operations.
/// `lifecycle_lock` only guards opening and dropping workspace entries in
/// the cache, which happen far less often than per-key operations.
pub struct Engine {
    config: EngineConfig,
    workspaces: DashMap<String, Arc<Workspace>>,
    lifecycle_lock: Mutex<()>,
}

impl Engine {
    /// Open an engine rooted at `config.data_dir`, creating the directory
    /// if absent. Does not eagerly open any workspace.
    pub fn open(config: EngineConfig) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;
        Ok(Engine { config, workspaces: DashMap::new(), lifecycle_lock: Mutex::new(()) })
    }

    /// The workspace named `name`, opening it from disk on first use.
    pub fn workspace(&self, name: &str) -> Result<Arc<Workspace>> {
        if let Some(ws) = self.workspaces.get(name) {
            return Ok(Arc::clone(&ws));
        }
        let _guard = self.lifecycle_lock.lock();
        if let Some(ws) = self.workspaces.get(name) {
            return Ok(Arc::clone(&ws));
        }
        let dir = self.config.data_dir.join(name);
        let ws = Arc::new(Workspace::open(name, &dir, &self.config)?);
        self.workspaces.insert(name.to_string(), Arc::clone(&ws));
        Ok(ws)
    }

    /// Every workspace directory under the data directory, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.config.data_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Read `key` from `source`, write it into `target` inside its own
    /// transaction, then delete it from `source`. If the read or the
    /// target write fails, the source is left untouched. If the delete
    /// fails after a successful target write, the key now exists in both
    /// workspaces; callers should treat that as a retryable inconsistency
    /// rather than data loss.
    pub fn move_key(
        &self,
        key: &str,
        source: &str,
        target: &str,
        on_conflict: OverwritePolicy,
    ) -> Result<()> {
        if source == target {
            return Err(Error::Validation("move_key: source and target workspaces must differ".to_string()));
        }
        let source_ws = self.workspace(source)?;
        let target_ws = self.workspace(target)?;

        let value: Value = source_ws.getkey(key, true)?;

        if on_conflict == OverwritePolicy::Abort && target_ws.contains_key(key) {
            return Err(Error::Validation(format!("move_key: '{key}' already exists in workspace '{target}'")));
        }
        target_ws.save(key, value, None)?;
        source_ws.delete(key)?;
        Ok(())
    }

    /// Drop the on-disk workspace `name`. Refuses if it is currently open
    /// in this engine unless `force` is set, matching the reference
    /// implementation's refusal to remove the active workspace.
    pub fn drop_workspace(&self, name: &str, force: bool) -> Result<()> {
        let _guard = self.lifecycle_lock.lock();
        if self.workspaces.contains_key(name) && !force {
            return Err(Error::Validation(format!(
                "workspace '{name}' is open; pass force to drop it anyway"
            )));
        }
        self.workspaces.remove(name);
        let dir = self.config.data_dir.join(name);
        if dir.exists() {
            fs::remove_dir_all(dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kybase_core::Value;
    use tempfile::tempdir;

    #[test]
    fn workspace_is_cached_across_calls() {
        let dir = tempdir().unwrap();
        let engine = Engine::open(EngineConfig::new(dir.path())).unwrap();
        let a = engine.workspace("default").unwrap();
        let b = engine.workspace("default").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn list_reflects_opened_workspaces() {
        let dir = tempdir().unwrap();
        let engine = Engine::open(EngineConfig::new(dir.path())).unwrap();
        engine.workspace("alpha").unwrap();
        engine.workspace("beta").unwrap();
        assert_eq!(engine.list().unwrap(), vec!["alpha".to_string(), "beta".to_string()]);
    }

    #[test]
    fn move_key_transfers_value_between_workspaces() {
        let dir = tempdir().unwrap();
        let engine = Engine::open(EngineConfig::new(dir.path())).unwrap();
        let src = engine.workspace("src").unwrap();
        src.save("k", Value::Int(42), None).unwrap();

        engine.move_key("k", "src", "dst", OverwritePolicy::Abort).unwrap();

        assert!(matches!(src.getkey("k", true), Err(Error::NotFound)));
        let dst = engine.workspace("dst").unwrap();
        assert_eq!(dst.getkey("k", true).unwrap(), Value::Int(42));
    }

    #[test]
    fn move_key_aborts_on_conflict_when_requested() {
        let dir = tempdir().unwrap();
        let engine = Engine::open(EngineConfig::new(dir.path())).unwrap();
        let src = engine.workspace("src").unwrap();
        src.save("k", Value::Int(1), None).unwrap();
        let dst = engine.workspace("dst").unwrap();
        dst.save("k", Value::Int(2), None).unwrap();

        let err = engine.move_key("k", "src", "dst", OverwritePolicy::Abort).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(src.getkey("k", true).unwrap(), Value::Int(1));
    }

    #[test]
    fn drop_workspace_refuses_active_without_force() {
        let dir = tempdir().unwrap();
        let engine = Engine::open(EngineConfig::new(dir.path())).unwrap();
        engine.workspace("w").unwrap();
        assert!(engine.drop_workspace("w", false).is_err());
        assert!(engine.drop_workspace("w", true).is_ok());
    }
}

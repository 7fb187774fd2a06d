//! Async wrappers that run the synchronous, lock-holding body on a
//! blocking-pool thread so an async caller never awaits while holding
//! the workspace's write lock.
//!
//! Cancelling the returned future (dropping it) does not roll back a
//! transaction that already committed inside the blocking task — the
//! task keeps running to completion on the pool regardless of whether
//! anyone is still awaiting it.

use crate::kv::SaveOutcome;
use crate::workspace::Workspace;
use kybase_core::{Error, Result, Value};
use std::sync::Arc;
use std::time::Duration;

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(_) => Err(Error::Validation("blocking task panicked".to_string())),
    }
}

/// Async `save`, see [`Workspace::save`].
pub async fn save_async(ws: Arc<Workspace>, key: String, value: Value, ttl: Option<Duration>) -> Result<SaveOutcome> {
    run_blocking(move || ws.save(&key, value, ttl)).await
}

/// Async `getkey`, see [`Workspace::getkey`].
pub async fn getkey_async(ws: Arc<Workspace>, path: String, deserialize: bool) -> Result<Value> {
    run_blocking(move || ws.getkey(&path, deserialize)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use tempfile::tempdir;

    #[tokio::test]
    async fn save_async_then_getkey_async_round_trips() {
        let dir = tempdir().unwrap();
        let config = EngineConfig::new(dir.path());
        let ws = Arc::new(Workspace::open("default", &dir.path().join("default"), &config).unwrap());

        save_async(Arc::clone(&ws), "k".to_string(), Value::Int(7), None).await.unwrap();
        let value = getkey_async(ws, "k".to_string(), true).await.unwrap();
        assert_eq!(value, Value::Int(7));
    }
}

//! Collection-mode operations: `push`/`pop`/`peek`/`count`/`clear` and
//! their bulk variants, dispatched on the workspace's queue/stack/
//! priority_queue ordering.

use crate::workspace::{now_micros, Workspace};
use kybase_core::{Error, Result, Value, WorkspaceType};
use kybase_storage::tables::ItemRow;
use kybase_storage::Mutation;

impl Workspace {
    /// Insert `value` as a new Item. `priority` is required for
    /// `priority_queue` and rejected for `queue`/`stack`.
    pub fn push(&self, value: Value, priority: Option<i64>) -> Result<()> {
        let span = tracing::debug_span!("push", workspace = %self.name());
        let _enter = span.enter();

        let _guard = self.lock_for_write()?;
        let ty = self.require_collection_mode("push")?;
        match (ty, priority) {
            (WorkspaceType::PriorityQueue, None) => {
                tracing::debug!(outcome = "validation_error", "push rejected: priority required");
                return Err(Error::Validation("priority_queue push requires a priority".to_string()))
            }
            (WorkspaceType::Queue | WorkspaceType::Stack, Some(_)) => {
                tracing::debug!(outcome = "validation_error", "push rejected: priority not supported");
                return Err(Error::Validation(format!("priority not supported on a {} workspace", ty.as_str())))
            }
            _ => {}
        }
        let (bytes, encrypted) = self.encode_value(&value)?;
        let item_id = self.store.read(|t| t.next_item_id);
        let now = now_micros();
        self.store.commit(vec![Mutation::PushItem {
            item_id,
            value: bytes,
            encrypted,
            priority,
            created_at: now,
        }])?;
        tracing::debug!(outcome = "pushed", item_id, "push committed");
        Ok(())
    }

    /// Push every value in `values` in one transaction.
    pub fn push_many(&self, values: Vec<(Value, Option<i64>)>) -> Result<()> {
        let span = tracing::debug_span!("push_many", workspace = %self.name(), count = values.len());
        let _enter = span.enter();

        let _guard = self.lock_for_write()?;
        let ty = self.require_collection_mode("push_many")?;
        let now = now_micros();
        let mut mutations = Vec::with_capacity(values.len());
        let mut next_id = self.store.read(|t| t.next_item_id);
        for (value, priority) in values {
            match (ty, priority) {
                (WorkspaceType::PriorityQueue, None) => {
                    tracing::debug!(outcome = "validation_error", "push_many rejected: priority required");
                    return Err(Error::Validation("priority_queue push requires a priority".to_string()))
                }
                (WorkspaceType::Queue | WorkspaceType::Stack, Some(_)) => {
                    tracing::debug!(outcome = "validation_error", "push_many rejected: priority not supported");
                    return Err(Error::Validation(format!("priority not supported on a {} workspace", ty.as_str())))
                }
                _ => {}
            }
            let (bytes, encrypted) = self.encode_value(&value)?;
            mutations.push(Mutation::PushItem {
                item_id: next_id,
                value: bytes,
                encrypted,
                priority,
                created_at: now,
            });
            next_id += 1;
        }
        let pushed = mutations.len();
        if !mutations.is_empty() {
            self.store.commit(mutations)?;
        }
        tracing::debug!(outcome = "pushed", pushed, "push_many committed");
        Ok(())
    }

    /// Remove and return the head item under the workspace's ordering,
    /// or `Ok(None)` when empty.
    pub fn pop(&self) -> Result<Option<Value>> {
        let span = tracing::debug_span!("pop", workspace = %self.name());
        let _enter = span.enter();

        let _guard = self.lock_for_write()?;
        let ty = self.require_collection_mode("pop")?;
        let head = self.store.read(|t| head_item(&t.items, ty));
        let Some((item_id, row)) = head else {
            tracing::debug!(outcome = "empty", "pop found nothing");
            return Ok(None);
        };
        self.store.commit(vec![Mutation::PopItem { item_id }])?;
        tracing::debug!(outcome = "popped", item_id, "pop committed");
        Ok(Some(self.decode_value(&row.value, row.encrypted)?))
    }

    /// Pop up to `n` items, in the same order repeated single pops
    /// would produce, atomically.
    pub fn pop_many(&self, n: usize) -> Result<Vec<Value>> {
        let span = tracing::debug_span!("pop_many", workspace = %self.name(), requested = n);
        let _enter = span.enter();

        let _guard = self.lock_for_write()?;
        let ty = self.require_collection_mode("pop_many")?;
        let heads: Vec<(u64, ItemRow)> = self.store.read(|t| {
            let mut items = t.items.clone();
            let mut out = Vec::new();
            for _ in 0..n {
                match head_item(&items, ty) {
                    Some((id, row)) => {
                        items.remove(&id);
                        out.push((id, row));
                    }
                    None => break,
                }
            }
            out
        });
        if heads.is_empty() {
            tracing::debug!(outcome = "empty", "pop_many found nothing");
            return Ok(Vec::new());
        }
        let mutations = heads.iter().map(|(id, _)| Mutation::PopItem { item_id: *id }).collect();
        self.store.commit(mutations)?;
        tracing::debug!(outcome = "popped", popped = heads.len(), "pop_many committed");
        heads
            .into_iter()
            .map(|(_, row)| self.decode_value(&row.value, row.encrypted))
            .collect()
    }

    /// The head item without removing it, or `Ok(None)` when empty.
    pub fn peek(&self) -> Result<Option<Value>> {
        let ty = self.require_collection_mode("peek")?;
        let head = self.store.read(|t| head_item(&t.items, ty));
        match head {
            Some((_, row)) => Ok(Some(self.decode_value(&row.value, row.encrypted)?)),
            None => Ok(None),
        }
    }

    /// Current number of items.
    pub fn count(&self) -> Result<usize> {
        self.require_collection_mode("count")?;
        Ok(self.store.read(|t| t.items.len()))
    }

    /// Remove every item in one transaction.
    pub fn clear(&self) -> Result<()> {
        let span = tracing::debug_span!("clear", workspace = %self.name());
        let _enter = span.enter();

        let _guard = self.lock_for_write()?;
        self.require_collection_mode("clear")?;
        self.store.commit(vec![Mutation::ClearItems])?;
        tracing::debug!(outcome = "cleared", "clear committed");
        Ok(())
    }
}

fn head_item(items: &std::collections::BTreeMap<u64, ItemRow>, ty: WorkspaceType) -> Option<(u64, ItemRow)> {
    match ty {
        WorkspaceType::Queue => items.iter().next().map(|(id, row)| (*id, row.clone())),
        WorkspaceType::Stack => items.iter().next_back().map(|(id, row)| (*id, row.clone())),
        WorkspaceType::PriorityQueue => items
            .iter()
            .max_by_key(|(id, row)| (row.priority.unwrap_or(i64::MIN), std::cmp::Reverse(**id)))
            .map(|(id, row)| (*id, row.clone())),
        WorkspaceType::Kv => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use kybase_core::WorkspaceType as WT;
    use tempfile::tempdir;

    fn open_ws(ty: WT) -> (tempfile::TempDir, Workspace) {
        let dir = tempdir().unwrap();
        let config = EngineConfig::new(dir.path());
        let ws = Workspace::open("q", &dir.path().join("q"), &config).unwrap();
        ws.store.set_workspace_type(ty).unwrap();
        (dir, ws)
    }

    #[test]
    fn queue_pops_in_fifo_order() {
        let (_dir, ws) = open_ws(WT::Queue);
        ws.push(Value::Text("a".to_string()), None).unwrap();
        ws.push(Value::Text("b".to_string()), None).unwrap();
        assert_eq!(ws.pop().unwrap(), Some(Value::Text("a".to_string())));
        assert_eq!(ws.pop().unwrap(), Some(Value::Text("b".to_string())));
        assert_eq!(ws.pop().unwrap(), None);
    }

    #[test]
    fn stack_pops_in_lifo_order() {
        let (_dir, ws) = open_ws(WT::Stack);
        ws.push(Value::Text("a".to_string()), None).unwrap();
        ws.push(Value::Text("b".to_string()), None).unwrap();
        assert_eq!(ws.pop().unwrap(), Some(Value::Text("b".to_string())));
        assert_eq!(ws.pop().unwrap(), Some(Value::Text("a".to_string())));
    }

    #[test]
    fn priority_queue_pops_highest_priority_first_fifo_tiebreak() {
        let (_dir, ws) = open_ws(WT::PriorityQueue);
        ws.push(Value::Text("low".to_string()), Some(1)).unwrap();
        ws.push(Value::Text("high".to_string()), Some(100)).unwrap();
        ws.push(Value::Text("med".to_string()), Some(50)).unwrap();
        assert_eq!(ws.pop().unwrap(), Some(Value::Text("high".to_string())));
        assert_eq!(ws.pop().unwrap(), Some(Value::Text("med".to_string())));
        assert_eq!(ws.pop().unwrap(), Some(Value::Text("low".to_string())));
    }

    #[test]
    fn priority_queue_breaks_equal_priority_ties_fifo() {
        let (_dir, ws) = open_ws(WT::PriorityQueue);
        ws.push(Value::Text("first".to_string()), Some(10)).unwrap();
        ws.push(Value::Text("second".to_string()), Some(10)).unwrap();
        assert_eq!(ws.pop().unwrap(), Some(Value::Text("first".to_string())));
        assert_eq!(ws.pop().unwrap(), Some(Value::Text("second".to_string())));
    }

    #[test]
    fn priority_queue_rejects_push_without_priority() {
        let (_dir, ws) = open_ws(WT::PriorityQueue);
        assert!(ws.push(Value::Text("x".to_string()), None).is_err());
    }

    #[test]
    fn queue_rejects_push_with_priority() {
        let (_dir, ws) = open_ws(WT::Queue);
        assert!(ws.push(Value::Text("x".to_string()), Some(1)).is_err());
    }

    #[test]
    fn peek_does_not_remove() {
        let (_dir, ws) = open_ws(WT::Queue);
        ws.push(Value::Text("a".to_string()), None).unwrap();
        assert_eq!(ws.peek().unwrap(), Some(Value::Text("a".to_string())));
        assert_eq!(ws.count().unwrap(), 1);
    }

    #[test]
    fn clear_removes_everything() {
        let (_dir, ws) = open_ws(WT::Queue);
        ws.push(Value::Text("a".to_string()), None).unwrap();
        ws.push(Value::Text("b".to_string()), None).unwrap();
        ws.clear().unwrap();
        assert_eq!(ws.count().unwrap(), 0);
    }

    #[test]
    fn pop_many_returns_up_to_n_in_order() {
        let (_dir, ws) = open_ws(WT::Queue);
        ws.push(Value::Int(1), None).unwrap();
        ws.push(Value::Int(2), None).unwrap();
        ws.push(Value::Int(3), None).unwrap();
        let popped = ws.pop_many(2).unwrap();
        assert_eq!(popped, vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(ws.count().unwrap(), 1);
    }

    #[test]
    fn kv_mode_rejects_collection_ops() {
        let dir = tempdir().unwrap();
        let config = EngineConfig::new(dir.path());
        let ws = Workspace::open("kv", &dir.path().join("kv"), &config).unwrap();
        assert!(matches!(ws.push(Value::Int(1), None), Err(Error::Validation(_))));
    }
}

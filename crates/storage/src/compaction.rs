//! Retention pruning: drops history, archive, and replication rows
//! older than a cutoff, independent of TTL expiry (which governs live
//! entries, not the audit trail).

use crate::tables::Tables;

/// How many rows of each kind a [`prune`] call removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompactionReport {
    /// History rows dropped.
    pub history_removed: usize,
    /// Archive rows dropped.
    pub archive_removed: usize,
    /// Replication rows dropped.
    pub replication_removed: usize,
}

/// Remove history, archive, and replication rows with a timestamp
/// strictly before `cutoff_micros`. Live entries and items are never
/// touched by compaction.
pub fn prune(tables: &mut Tables, cutoff_micros: u64) -> CompactionReport {
    let before = tables.history.len();
    tables.history.retain(|row| row.timestamp >= cutoff_micros);
    let history_removed = before - tables.history.len();

    let before = tables.archive.len();
    tables.archive.retain(|_, row| row.deleted_at >= cutoff_micros);
    let archive_removed = before - tables.archive.len();

    let before = tables.replication.len();
    tables.replication.retain(|row| row.timestamp >= cutoff_micros);
    let replication_removed = before - tables.replication.len();

    CompactionReport {
        history_removed,
        archive_removed,
        replication_removed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prunes_old_rows_but_keeps_recent_ones() {
        let mut tables = Tables::new();
        tables.apply_save_entry("a", b"1".to_vec(), false, Some(10), 10, None, true);
        tables.apply_delete_entry("a", 20);
        tables.apply_save_entry("b", b"2".to_vec(), false, Some(1_000), 1_000, None, true);

        let report = prune(&mut tables, 500);
        assert_eq!(report.history_removed, 2);
        assert_eq!(report.archive_removed, 1);
        assert!(tables.history.iter().all(|r| r.timestamp >= 500));
        assert!(tables.archive.is_empty());
    }

    #[test]
    fn does_not_touch_live_entries() {
        let mut tables = Tables::new();
        tables.apply_save_entry("a", b"1".to_vec(), false, Some(1), 1, None, true);
        prune(&mut tables, u64::MAX);
        assert!(tables.entries.contains_key("a"));
    }
}

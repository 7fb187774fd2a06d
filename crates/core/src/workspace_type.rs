//! The workspace-level collection-mode tag.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The collection mode a workspace is permanently tagged with, set at
/// most once on first use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkspaceType {
    /// Key-value map: unique string keys, arbitrary values.
    Kv,
    /// FIFO queue: `pop` returns items in push order.
    Queue,
    /// LIFO stack: `pop` returns items in reverse push order.
    Stack,
    /// Priority queue: `pop` returns the highest-priority item, FIFO
    /// among ties.
    PriorityQueue,
}

impl WorkspaceType {
    /// True for the three collection modes (everything but `Kv`).
    pub fn is_collection(self) -> bool {
        !matches!(self, WorkspaceType::Kv)
    }

    /// Lowercase, snake_case name as persisted in workspace metadata.
    pub fn as_str(self) -> &'static str {
        match self {
            WorkspaceType::Kv => "kv",
            WorkspaceType::Queue => "queue",
            WorkspaceType::Stack => "stack",
            WorkspaceType::PriorityQueue => "priority_queue",
        }
    }
}

impl fmt::Display for WorkspaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WorkspaceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "kv" => Ok(WorkspaceType::Kv),
            "queue" => Ok(WorkspaceType::Queue),
            "stack" => Ok(WorkspaceType::Stack),
            "priority_queue" => Ok(WorkspaceType::PriorityQueue),
            other => Err(Error::Validation(format!("unknown workspace type: {other:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for ty in [
            WorkspaceType::Kv,
            WorkspaceType::Queue,
            WorkspaceType::Stack,
            WorkspaceType::PriorityQueue,
        ] {
            assert_eq!(ty.as_str().parse::<WorkspaceType>().unwrap(), ty);
        }
    }

    #[test]
    fn only_kv_is_non_collection() {
        assert!(!WorkspaceType::Kv.is_collection());
        assert!(WorkspaceType::Queue.is_collection());
        assert!(WorkspaceType::Stack.is_collection());
        assert!(WorkspaceType::PriorityQueue.is_collection());
    }
}

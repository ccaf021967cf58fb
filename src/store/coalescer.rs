use super::model::Key;
use crate::value::Value;
use std::collections::HashMap;

/// Value a key held before its first write in the current turn.
#[derive(Debug)]
pub(crate) struct PendingWrite {
    pub(crate) prev: Option<Value>,
}

impl PendingWrite {
    /// Whether committing `next` is a change relative to the turn start.
    pub(crate) fn changed(&self, next: Option<&Value>) -> bool {
        match (self.prev.as_ref(), next) {
            (None, None) => false,
            (Some(prev), Some(next)) => !prev.same(next),
            _ => true,
        }
    }
}

/// Per-turn bookkeeping of which keys were written and what they started at.
#[derive(Debug, Default)]
pub(crate) struct Coalescer {
    pending: HashMap<Key, PendingWrite>,
}

impl Coalescer {
    /// Record a write to `key`. Only the first write of a turn keeps its
    /// snapshot; returns `true` for that first write.
    pub(crate) fn track(&mut self, key: &str, prev: Option<Value>) -> bool {
        if self.pending.contains_key(key) {
            return false;
        }
        self.pending.insert(key.to_string(), PendingWrite { prev });
        true
    }

    /// Remove and return the record for `key`.
    pub(crate) fn take(&mut self, key: &str) -> Option<PendingWrite> {
        self.pending.remove(key)
    }

    pub(crate) fn is_pending(&self, key: &str) -> bool {
        self.pending.contains_key(key)
    }

    pub(crate) fn clear(&mut self) {
        self.pending.clear();
    }
}

use crate::value::Value;
use std::collections::HashMap;

/// Identifier of a model entry.
pub type Key = String;

/// Authoritative key-value state, remembering insertion order.
#[derive(Debug, Default)]
pub(crate) struct Model {
    values: HashMap<Key, Value>,
    order: Vec<Key>,
}

impl Model {
    pub(crate) fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub(crate) fn insert(&mut self, key: Key, value: Value) {
        if !self.values.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.values.insert(key, value);
    }

    pub(crate) fn keys(&self) -> Vec<Key> {
        self.order.clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn clear(&mut self) {
        self.values.clear();
        self.order.clear();
    }
}

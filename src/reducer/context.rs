use crate::runtime::Deferred;
use crate::store::{Key, Store};
use crate::value::Value;

/// What a reducer may do with the store: read, and stage writes.
///
/// Dispatching is not available from a reducer.
pub struct ReducerContext<'a> {
    store: &'a Store,
}

impl<'a> ReducerContext<'a> {
    pub(crate) fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Current value of `key`, including writes staged earlier this turn.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.store.get(key)
    }

    pub fn keys(&self) -> Vec<Key> {
        self.store.keys()
    }

    /// Stage `value` for `key`. See [`Store::set`].
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) -> Deferred<Value> {
        self.store.set(key, value)
    }

    /// Stage a write computed from the current value. See [`Store::update`].
    pub fn update<F>(&self, key: impl Into<Key>, edit: F) -> Deferred<Value>
    where
        F: FnOnce(Option<&Value>) -> anyhow::Result<Value>,
    {
        self.store.update(key, edit)
    }
}

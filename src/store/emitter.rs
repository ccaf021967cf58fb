use super::model::Key;
use crate::error::StoreError;
use crate::value::Value;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

type Listener = Rc<dyn Fn(&Value)>;

/// Handle identifying a registered listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Per-key observer lists plus the armed flag that gates notification.
pub(crate) struct Emitter {
    listeners: RefCell<HashMap<Key, Vec<(ListenerId, Listener)>>>,
    next_id: Cell<u64>,
    // Key the turn-end step is currently allowed to emit for.
    armed: RefCell<Option<Key>>,
}

impl Emitter {
    pub(crate) fn new() -> Self {
        Self {
            listeners: RefCell::new(HashMap::new()),
            next_id: Cell::new(0),
            armed: RefCell::new(None),
        }
    }

    pub(crate) fn subscribe(&self, key: Key, listener: impl Fn(&Value) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        let listener: Listener = Rc::new(listener);
        self.listeners
            .borrow_mut()
            .entry(key)
            .or_default()
            .push((id, listener));
        id
    }

    pub(crate) fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let mut removed = false;
        listeners.retain(|_, list| {
            let before = list.len();
            list.retain(|(other, _)| *other != id);
            removed |= list.len() != before;
            !list.is_empty()
        });
        removed
    }

    pub(crate) fn listener_count(&self, key: &str) -> usize {
        self.listeners.borrow().get(key).map_or(0, Vec::len)
    }

    pub(crate) fn clear(&self) {
        self.listeners.borrow_mut().clear();
    }

    /// Allow a single emission for `key` until the guard drops.
    pub(crate) fn arm(&self, key: &str) -> Armed<'_> {
        let prev = self.armed.replace(Some(key.to_string()));
        Armed {
            slot: &self.armed,
            prev,
        }
    }

    /// Notify the listeners of `key` with `value`.
    ///
    /// Fails unless the turn-end step armed emission for this key. Arming is
    /// spent while the listeners run, so they cannot emit again, not even for
    /// the same key.
    pub(crate) fn emit(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        if self.armed.borrow().as_deref() != Some(key) {
            return Err(StoreError::DirectEmission {
                key: key.to_string(),
            });
        }
        let _spent = Armed {
            slot: &self.armed,
            prev: self.armed.replace(None),
        };
        // Snapshot so listeners may subscribe or unsubscribe while running.
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .get(key)
            .map(|list| list.iter().map(|(_, l)| Rc::clone(l)).collect())
            .unwrap_or_default();

        for listener in listeners {
            listener(value);
        }
        Ok(())
    }
}

/// Restores the previous armed key when dropped, including during unwinding.
pub(crate) struct Armed<'a> {
    slot: &'a RefCell<Option<Key>>,
    prev: Option<Key>,
}

impl Drop for Armed<'_> {
    fn drop(&mut self) {
        *self.slot.borrow_mut() = self.prev.take();
    }
}

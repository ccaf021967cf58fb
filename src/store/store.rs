use super::coalescer::Coalescer;
use super::emitter::{Emitter, ListenerId};
use super::model::{Key, Model};
use crate::action::Action;
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::middleware::{self, Middleware, Outcome};
use crate::reducer::{ReducerContext, Reducers, Registry};
use crate::runtime::{deferred, Deferred, Resolver, Scheduler};
use crate::value::Value;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace, warn};

struct StoreInner {
    config: StoreConfig,
    model: RefCell<Model>,
    coalescer: RefCell<Coalescer>,
    emitter: Emitter,
    middleware: RefCell<Vec<Rc<dyn Middleware>>>,
    reducers: RefCell<Registry>,
    dispatching: Cell<bool>,
    scheduler: Scheduler<Store>,
}

/// A keyed state container with coalesced change notification.
///
/// Writes go through [`Store::set`] / [`Store::update`] (usually from
/// reducers). They land in the model immediately, but listeners are only told
/// about them when the store next runs a turn ([`Store::tick`] or
/// [`Store::settle`]), and only for keys whose value actually changed over
/// the turn.
///
/// `Store` is a cheap handle: clones share the same state. It is
/// single-threaded (`!Send`).
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use tincan_dispatch::{Store, Value};
///
/// let store = Store::new();
/// store.initialize([("count", 0)]);
///
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let s = seen.clone();
/// store.subscribe("count", move |v| s.borrow_mut().push(v.clone()));
///
/// store.set("count", 1);
/// store.set("count", 2);
/// store.settle().unwrap();
///
/// assert_eq!(*seen.borrow(), vec![Value::from(2)]);
/// ```
#[derive(Clone)]
pub struct Store {
    inner: Rc<StoreInner>,
}

impl Store {
    /// Create an empty store with the default config.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create an empty store with `config`.
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            inner: Rc::new(StoreInner {
                config,
                model: RefCell::new(Model::default()),
                coalescer: RefCell::new(Coalescer::default()),
                emitter: Emitter::new(),
                middleware: RefCell::new(Vec::new()),
                reducers: RefCell::new(Registry::default()),
                dispatching: Cell::new(false),
                scheduler: Scheduler::new(),
            }),
        }
    }

    /// The config this store was created with.
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Label used in this store's log records.
    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    /// Reset the store and seed the model from `model`.
    ///
    /// Drops listeners, middleware, reducers and every write still waiting
    /// for its turn; the handles of those writes fail with
    /// [`StoreError::Discarded`].
    pub fn initialize<I, K, V>(&self, model: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Key>,
        V: Into<Value>,
    {
        self.inner.scheduler.discard();
        self.inner.coalescer.borrow_mut().clear();
        self.inner.emitter.clear();
        self.inner.middleware.borrow_mut().clear();
        self.inner.reducers.borrow_mut().clear();

        let mut state = self.inner.model.borrow_mut();
        state.clear();
        for (key, value) in model {
            state.insert(key.into(), value.into());
        }
        debug!(store = %self.name(), keys = state.len(), "initialized");
    }

    /// [`Store::initialize`] with an empty model.
    pub fn reset(&self) {
        self.initialize(std::iter::empty::<(Key, Value)>());
    }

    /// Model keys in insertion order.
    pub fn keys(&self) -> Vec<Key> {
        self.inner.model.borrow().keys()
    }

    /// Current value of `key`, or `None` if it was never set.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.model.borrow().get(key).cloned()
    }

    /// Stage `value` for `key`.
    ///
    /// The model is updated right away. Listeners hear about it on the next
    /// turn, once, and only if the key's value at that point differs from its
    /// value before the first write of this turn. The handle resolves on the
    /// next turn with the key's value at that time.
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) -> Deferred<Value> {
        let value = value.into();
        self.stage(key.into(), move |_| Ok(value))
    }

    /// Stage a write computed from the current value of `key`.
    ///
    /// If `edit` fails, the model is left alone and the handle rejects with
    /// [`StoreError::EditFailure`] on the next turn.
    pub fn update<F>(&self, key: impl Into<Key>, edit: F) -> Deferred<Value>
    where
        F: FnOnce(Option<&Value>) -> anyhow::Result<Value>,
    {
        self.stage(key.into(), edit)
    }

    fn stage<F>(&self, key: Key, edit: F) -> Deferred<Value>
    where
        F: FnOnce(Option<&Value>) -> anyhow::Result<Value>,
    {
        let (resolver, handle) = deferred();
        let handle = self.driven(handle);
        let current = self.get(&key);

        let next = match edit(current.as_ref()) {
            Ok(next) => next,
            Err(source) => {
                debug!(store = %self.name(), %key, error = %source, "edit failed");
                self.inner
                    .scheduler
                    .defer(move |_| resolver.resolve(Err(StoreError::EditFailure { key, source })));
                return handle;
            }
        };

        let first = self.inner.coalescer.borrow_mut().track(&key, current);
        self.inner.model.borrow_mut().insert(key.clone(), next);
        trace!(store = %self.name(), %key, first, "write staged");

        if first {
            let key = key.clone();
            self.inner.scheduler.defer(move |store| store.finish_key(&key));
        }
        self.inner
            .scheduler
            .defer(move |store| store.resolve_write(&key, resolver));
        handle
    }

    /// Let an awaited handle run the turn it is waiting for.
    fn driven<T>(&self, handle: Deferred<T>) -> Deferred<T> {
        let inner = Rc::downgrade(&self.inner);
        handle.driven_by(move || {
            if let Some(inner) = inner.upgrade() {
                Store { inner }.tick();
            }
        })
    }

    /// Turn-end step for one key: decide and, on change, notify.
    fn finish_key(&self, key: &str) {
        let Some(pending) = self.inner.coalescer.borrow_mut().take(key) else {
            return;
        };
        let next = self.get(key);
        if !pending.changed(next.as_ref()) {
            trace!(store = %self.name(), %key, "no net change");
            return;
        }

        let _armed = self.inner.emitter.arm(key);
        if let Err(err) = self.emit(key) {
            warn!(store = %self.name(), %key, %err, "emission failed");
        }
    }

    fn resolve_write(&self, key: &str, resolver: Resolver<Value>) {
        resolver.resolve(self.get(key).ok_or(StoreError::Discarded));
    }

    /// Notify the listeners of `key` with its current value.
    ///
    /// Only the store's own turn-end step may do this. Called from anywhere
    /// else it fails with [`StoreError::DirectEmission`].
    pub fn emit(&self, key: &str) -> StoreResult<()> {
        let value = self.get(key).unwrap_or_default();
        self.inner.emitter.emit(key, &value)?;
        debug!(store = %self.name(), %key, "change emitted");
        Ok(())
    }

    /// Whether `key` has a write waiting for the turn-end decision.
    pub fn is_pending(&self, key: &str) -> bool {
        self.inner.coalescer.borrow().is_pending(key)
    }

    /// Run one turn. Returns `false` if there was nothing to run.
    ///
    /// Calls made while a turn is already running (from a listener, say) do
    /// nothing.
    pub fn tick(&self) -> bool {
        self.inner.scheduler.run_turn(self)
    }

    /// Run turns until no work is left, returning how many ran.
    ///
    /// Fails with [`StoreError::Unsettled`] if work is still queued after
    /// `max_settle_turns` turns, which usually means listeners keep writing
    /// to the store in response to their own changes.
    pub fn settle(&self) -> StoreResult<usize> {
        let limit = self.inner.config.max_settle_turns;
        let mut turns = 0;
        while self.inner.scheduler.has_pending() {
            if turns == limit {
                warn!(store = %self.name(), turns, pending = self.inner.scheduler.pending(), "store did not settle");
                return Err(StoreError::Unsettled { turns });
            }
            if !self.tick() {
                break;
            }
            turns += 1;
        }
        Ok(turns)
    }

    /// Register `listener` for changes to `key`.
    pub fn subscribe(&self, key: impl Into<Key>, listener: impl Fn(&Value) + 'static) -> ListenerId {
        self.inner.emitter.subscribe(key.into(), listener)
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.inner.emitter.unsubscribe(id)
    }

    /// Remove every listener on every key.
    pub fn clear_listeners(&self) {
        self.inner.emitter.clear();
    }

    /// Number of listeners registered for `key`.
    pub fn listener_count(&self, key: &str) -> usize {
        self.inner.emitter.listener_count(key)
    }

    /// Register reducers. Binding is additive: an action type bound twice
    /// runs both reducers, in registration order.
    pub fn bind(&self, reducers: Reducers) -> &Self {
        self.inner.reducers.borrow_mut().extend(reducers);
        self
    }

    /// Append a middleware to the chain.
    pub fn add_middleware<M: Middleware + 'static>(&self, middleware: M) {
        self.inner.middleware.borrow_mut().push(Rc::new(middleware));
    }

    /// Dispatch an action through the middleware chain to the reducers.
    ///
    /// Reducers run synchronously before this returns, so their writes are
    /// already visible through [`Store::get`]. Without a short-circuiting
    /// middleware the outcome is the action that was passed in.
    ///
    /// Fails with [`StoreError::ReentrantDispatch`] when called from a
    /// reducer, and with [`StoreError::InvalidActionShape`] or
    /// [`StoreError::MissingDiscriminator`] when the action reaching the
    /// reducers isn't a record with a string `type`.
    pub fn dispatch(&self, action: impl Into<Value>) -> StoreResult<Outcome> {
        if self.inner.dispatching.get() {
            return Err(StoreError::ReentrantDispatch);
        }
        let chain = self.inner.middleware.borrow().clone();
        middleware::run(self, chain, action.into())
    }

    /// Terminal step of the chain: validate and run matching reducers.
    pub(crate) fn reduce(&self, action: &Value) -> StoreResult<()> {
        if self.inner.dispatching.get() {
            return Err(StoreError::ReentrantDispatch);
        }
        let action = Action::try_from(action)?;
        let reducers = self.inner.reducers.borrow().lookup(action.kind());
        if reducers.is_empty() {
            trace!(store = %self.name(), kind = action.kind(), "no reducers");
            return Ok(());
        }
        debug!(store = %self.name(), kind = action.kind(), count = reducers.len(), "reducing");

        let _dispatching = Dispatching::enter(&self.inner.dispatching);
        let ctx = ReducerContext::new(self);
        for reducer in reducers {
            reducer(&ctx, &action).map_err(|source| StoreError::Reducer {
                kind: action.kind().to_string(),
                source,
            })?;
        }
        Ok(())
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.name())
            .field("keys", &self.inner.model.borrow().len())
            .field("queued", &self.inner.scheduler.pending())
            .field("dispatching", &self.inner.dispatching.get())
            .finish()
    }
}

/// Holds the dispatching flag for the extent of reducer execution.
struct Dispatching<'a>(&'a Cell<bool>);

impl<'a> Dispatching<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for Dispatching<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

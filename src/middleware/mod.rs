//! Middleware system for the dispatch pipeline
//!
//! Middleware sits between `dispatch` and reducer execution, allowing
//! logging, deferral and other cross-cutting concerns to be composed.
//!
//! ```text
//! dispatch → middleware[0] → … → middleware[n-1] → reducers → staged writes
//! ```
//!
//! Each middleware can:
//! - Inspect or replace the action before passing it on with [`Next::run`]
//! - Return its own [`Outcome`] without calling `next`, skipping the rest
//! - Keep `next` and call it later (see [`Delay`])
//! - Fail, which fails the dispatch

mod chain;
mod delay;
mod logging;

pub(crate) use chain::run;
pub use chain::Next;
pub use delay::Delay;
pub use logging::LoggingMiddleware;

use crate::error::StoreResult;
use crate::store::Store;
use crate::value::Value;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Middleware trait - intercepts actions before they reach the reducers
///
/// Closures with the same signature implement it too:
///
/// ```
/// use tincan_dispatch::{Action, Next, Outcome, Store, StoreResult, Value};
///
/// let store = Store::new();
/// store.add_middleware(|_: &Store, action: Value, next: Next| -> StoreResult<Outcome> {
///     if action.field("blocked").is_some() {
///         return Ok(Outcome::Value(Value::Null));
///     }
///     next.run(action)
/// });
///
/// let outcome = store.dispatch(Action::new("PING").with("blocked", true)).unwrap();
/// assert_eq!(outcome.value(), Some(&Value::Null));
/// ```
pub trait Middleware {
    /// Handle an action
    ///
    /// - `store`: the store being dispatched to (read access, writes)
    /// - `action`: the action as left by earlier middleware
    /// - `next`: continues the chain
    fn handle(&self, store: &Store, action: Value, next: Next) -> StoreResult<Outcome>;
}

impl<F> Middleware for F
where
    F: Fn(&Store, Value, Next) -> StoreResult<Outcome>,
{
    fn handle(&self, store: &Store, action: Value, next: Next) -> StoreResult<Outcome> {
        self(store, action, next)
    }
}

/// Result of a dispatch.
#[derive(Clone, Debug)]
pub enum Outcome {
    /// A plain value: the original action when reducers ran, or whatever a
    /// short-circuiting middleware returned.
    Value(Value),
    /// The action was deferred; the handle stops it from ever running.
    Cancel(Cancel),
}

impl Outcome {
    pub fn value(&self) -> Option<&Value> {
        match self {
            Outcome::Value(v) => Some(v),
            Outcome::Cancel(_) => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Outcome::Value(v) => Some(v),
            Outcome::Cancel(_) => None,
        }
    }

    pub fn as_cancel(&self) -> Option<&Cancel> {
        match self {
            Outcome::Cancel(c) => Some(c),
            Outcome::Value(_) => None,
        }
    }
}

struct CancelInner {
    cancelled: Cell<bool>,
    on_cancel: RefCell<Option<Box<dyn FnOnce()>>>,
}

/// Capability to cancel a deferred action.
///
/// Cancelling runs the registered callback once; later calls do nothing.
#[derive(Clone)]
pub struct Cancel {
    inner: Rc<CancelInner>,
}

impl Cancel {
    pub fn new(on_cancel: impl FnOnce() + 'static) -> Self {
        Self {
            inner: Rc::new(CancelInner {
                cancelled: Cell::new(false),
                on_cancel: RefCell::new(Some(Box::new(on_cancel))),
            }),
        }
    }

    pub fn cancel(&self) {
        self.inner.cancelled.set(true);
        let callback = self.inner.on_cancel.borrow_mut().take();
        if let Some(callback) = callback {
            callback();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.get()
    }
}

impl fmt::Debug for Cancel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cancel")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

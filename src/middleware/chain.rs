use super::{Middleware, Outcome};
use crate::error::{StoreError, StoreResult};
use crate::store::Store;
use crate::value::Value;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// State of one dispatch as it walks the middleware list.
struct Chain {
    store: Store,
    middleware: Vec<Rc<dyn Middleware>>,
    original: Value,
    // Highest position handed control so far.
    reached: Cell<usize>,
}

impl Chain {
    fn step(self: &Rc<Self>, index: usize, action: Value) -> StoreResult<Outcome> {
        match self.middleware.get(index) {
            Some(middleware) => {
                let next = Next {
                    chain: Rc::clone(self),
                    index: index + 1,
                };
                middleware.handle(&self.store, action, next)
            }
            None => {
                self.store.reduce(&action)?;
                Ok(Outcome::Value(self.original.clone()))
            }
        }
    }
}

/// Run `action` through `middleware` and then the reducers.
pub(crate) fn run(
    store: &Store,
    middleware: Vec<Rc<dyn Middleware>>,
    action: Value,
) -> StoreResult<Outcome> {
    let chain = Rc::new(Chain {
        store: store.clone(),
        middleware,
        original: action.clone(),
        reached: Cell::new(0),
    });
    chain.step(0, action)
}

/// Continuation handed to a middleware: passes an action to the rest of the
/// chain.
///
/// `Next` is owned and clonable, so a middleware can hold on to it and call
/// it later, for example from a timer. Each position in the chain can be
/// entered once; a second call fails with [`StoreError::DoubleNext`].
#[derive(Clone)]
pub struct Next {
    chain: Rc<Chain>,
    index: usize,
}

impl Next {
    /// Hand `action` to the next middleware, or to the reducers when this is
    /// the last one.
    ///
    /// Once the reducers have run, the result is the action originally given
    /// to `dispatch`, whatever the middleware turned it into on the way.
    pub fn run(&self, action: impl Into<Value>) -> StoreResult<Outcome> {
        if self.index <= self.chain.reached.get() {
            return Err(StoreError::DoubleNext);
        }
        self.chain.reached.set(self.index);
        self.chain.step(self.index, action.into())
    }

    /// The action that was passed to `dispatch`.
    pub fn original(&self) -> &Value {
        &self.chain.original
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("index", &self.index)
            .field("len", &self.chain.middleware.len())
            .finish()
    }
}

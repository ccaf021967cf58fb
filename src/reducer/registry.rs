use super::context::ReducerContext;
use crate::action::Action;
use std::collections::HashMap;
use std::rc::Rc;

/// A reducer: reads and writes the model in response to one action.
pub type ReducerFn = Rc<dyn Fn(&ReducerContext<'_>, &Action) -> anyhow::Result<()>>;

/// A batch of reducers keyed by action type, handed to
/// [`Store::bind`](crate::Store::bind).
///
/// ```
/// use tincan_dispatch::{Reducers, Store, Value};
///
/// let store = Store::new();
/// store.initialize([("count", 0)]);
/// store.bind(Reducers::new().on("INCREMENT", |ctx, _| {
///     ctx.update("count", |n| Ok(Value::from(n.and_then(Value::as_i64).unwrap_or(0) + 1)));
///     Ok(())
/// }));
///
/// store.dispatch(tincan_dispatch::Action::new("INCREMENT")).unwrap();
/// assert_eq!(store.get("count"), Some(Value::from(1)));
/// ```
#[derive(Default)]
pub struct Reducers {
    entries: Vec<(String, ReducerFn)>,
}

impl Reducers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reducer for `kind`. Several reducers may share a kind.
    pub fn on<F>(mut self, kind: impl Into<String>, reducer: F) -> Self
    where
        F: Fn(&ReducerContext<'_>, &Action) -> anyhow::Result<()> + 'static,
    {
        let reducer: ReducerFn = Rc::new(reducer);
        self.entries.push((kind.into(), reducer));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reducers registered on a store, in registration order per kind.
#[derive(Default)]
pub(crate) struct Registry {
    by_kind: HashMap<String, Vec<ReducerFn>>,
}

impl Registry {
    /// Append every reducer in `reducers`; existing ones are kept.
    pub(crate) fn extend(&mut self, reducers: Reducers) {
        for (kind, reducer) in reducers.entries {
            self.by_kind.entry(kind).or_default().push(reducer);
        }
    }

    /// Reducers for `kind`, cloned out so the registry isn't borrowed while
    /// they run.
    pub(crate) fn lookup(&self, kind: &str) -> Vec<ReducerFn> {
        self.by_kind.get(kind).cloned().unwrap_or_default()
    }

    pub(crate) fn clear(&mut self) {
        self.by_kind.clear();
    }
}

use super::{Middleware, Next, Outcome};
use crate::action::TYPE_FIELD;
use crate::error::StoreResult;
use crate::store::Store;
use crate::value::Value;
use tracing::{debug, trace, warn};

/// LoggingMiddleware - logs every action that passes through the chain
///
/// Add it first so it sees actions before any other middleware rewrites them.
#[derive(Debug, Default)]
pub struct LoggingMiddleware;

impl LoggingMiddleware {
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for LoggingMiddleware {
    fn handle(&self, store: &Store, action: Value, next: Next) -> StoreResult<Outcome> {
        let kind = action
            .field(TYPE_FIELD)
            .and_then(Value::as_str)
            .unwrap_or("<untyped>")
            .to_string();
        debug!(store = %store.name(), %kind, action = ?action, "dispatch");

        let result = next.run(action);
        match &result {
            Ok(Outcome::Cancel(_)) => debug!(store = %store.name(), %kind, "action deferred"),
            Ok(Outcome::Value(_)) => trace!(store = %store.name(), %kind, "action handled"),
            Err(err) => warn!(store = %store.name(), %kind, %err, "action failed"),
        }
        result
    }
}

use super::{Cancel, Middleware, Next, Outcome};
use crate::error::StoreResult;
use crate::store::Store;
use crate::value::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Defers actions that carry a delay field, handing back a [`Cancel`].
///
/// An action with a positive integer in the delay field (milliseconds,
/// `"delay"` by default) is passed on only after that long; `dispatch`
/// returns [`Outcome::Cancel`] straight away. Cancelling before the delay
/// elapses means the reducers never see the action. Actions without the field
/// pass through untouched.
///
/// The timer runs on `tokio::task::spawn_local`, so dispatching delayed
/// actions must happen inside a tokio `LocalSet`. Once the deferred action has
/// been through the rest of the chain the task settles the store, so its
/// writes reach listeners without the caller running a turn.
#[derive(Debug, Clone)]
pub struct Delay {
    field: String,
}

impl Delay {
    pub fn new() -> Self {
        Self::with_field("delay")
    }

    /// Read the delay from `field` instead of `"delay"`.
    pub fn with_field(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    fn delay_of(&self, action: &Value) -> Option<Duration> {
        action
            .field(&self.field)
            .and_then(Value::as_i64)
            .and_then(|ms| u64::try_from(ms).ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}

impl Default for Delay {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for Delay {
    fn handle(&self, store: &Store, action: Value, next: Next) -> StoreResult<Outcome> {
        let Some(delay) = self.delay_of(&action) else {
            return next.run(action);
        };

        debug!(store = %store.name(), ?delay, "deferring action");
        let store = store.clone();
        let task = tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            if let Err(err) = next.run(action) {
                warn!(store = %store.name(), %err, "deferred action failed");
            }
            if let Err(err) = store.settle() {
                warn!(store = %store.name(), %err, "store did not settle after deferred action");
            }
        });

        let abort = task.abort_handle();
        Ok(Outcome::Cancel(Cancel::new(move || abort.abort())))
    }
}

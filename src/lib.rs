//! # Tincan Dispatch
//!
//! A keyed state container with coalesced change notification and a
//! reducer-based mutation path.
//!
//! ## Mutation path
//!
//! ```text
//! dispatch(action) → middleware chain → reducers → set/update → model
//! ```
//!
//! - `Store::dispatch` - runs an action through middleware, then the reducers
//!   bound to its `type`
//! - `Store::set` / `Store::update` - write to the model; the write is seen
//!   immediately by `get`
//! - `Store::tick` / `Store::settle` - end the turn: every key written since
//!   the last turn is compared with its value at the start of the turn, and
//!   its listeners hear about it once if it changed
//!
//! ## Rules
//!
//! - reducers can't dispatch
//! - each middleware position runs at most once per dispatch
//! - listeners are only ever called from the turn-end step
//!
//! ```
//! use tincan_dispatch::{Action, Reducers, Store, Value};
//!
//! let store = Store::new();
//! store.initialize([("counter", 0)]);
//! store.bind(Reducers::new().on("INCREMENT", |ctx, _| {
//!     ctx.update("counter", |n| Ok(Value::from(n.and_then(Value::as_i64).unwrap_or(0) + 1)));
//!     Ok(())
//! }));
//!
//! store.dispatch(Action::new("INCREMENT")).unwrap();
//! store.dispatch(Action::new("INCREMENT")).unwrap();
//! store.settle().unwrap();
//!
//! assert_eq!(store.get("counter"), Some(Value::from(2)));
//! ```

pub mod action;
pub mod config;
pub mod error;
pub mod global;
pub mod middleware;
pub mod reducer;
pub mod runtime;
pub mod store;
pub mod value;

// Re-export main types for convenience
pub use action::Action;
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use middleware::{Cancel, Delay, LoggingMiddleware, Middleware, Next, Outcome};
pub use reducer::{ReducerContext, Reducers};
pub use runtime::Deferred;
pub use store::{Key, ListenerId, Store};
pub use value::{Record, Value};

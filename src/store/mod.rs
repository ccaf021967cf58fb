//! The store: model, write coalescing and change emission.
//!
//! Writes are applied to the model immediately and coalesced per key until
//! the end of the turn, where each touched key is compared with its value at
//! the start of the turn and listeners are notified at most once.

mod coalescer;
mod emitter;
mod model;
mod store;

pub use emitter::ListenerId;
pub use model::Key;
pub use store::Store;

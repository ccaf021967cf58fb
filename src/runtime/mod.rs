//! Runtime support for the store.
//!
//! This module provides the turn queue that coalesces writes and the
//! deferred handles those writes resolve through.

mod deferred;
mod scheduler;

pub use deferred::Deferred;
pub(crate) use deferred::{deferred, Resolver};
pub(crate) use scheduler::Scheduler;

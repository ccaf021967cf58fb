//! Reducers and the registry that routes actions to them.

mod context;
mod registry;

pub use context::ReducerContext;
pub(crate) use registry::Registry;
pub use registry::{ReducerFn, Reducers};

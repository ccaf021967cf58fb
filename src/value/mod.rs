//! Dynamic values held by the store.

mod value;

pub use value::{Record, Value};

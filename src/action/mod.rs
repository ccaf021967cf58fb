//! Actions: the records that drive every mutation.

mod action;

pub use action::{Action, TYPE_FIELD};

//! Per-thread default store, for applications that only need one.

use crate::store::Store;

thread_local! {
    static DEFAULT_STORE: Store = Store::new();
}

/// Get the default store for the current thread.
///
/// Every call on the same thread returns a handle to the same store. Code
/// that needs isolation (tests, embedded components) should build its own
/// with [`Store::new`].
///
/// ```
/// use tincan_dispatch::{global::default_store, Value};
///
/// default_store().set("theme", "dark");
/// assert_eq!(default_store().get("theme"), Some(Value::from("dark")));
/// ```
pub fn default_store() -> Store {
    DEFAULT_STORE.with(Store::clone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn same_store_per_thread() {
        default_store().reset();
        default_store().set("k", 1);

        assert_eq!(default_store().get("k"), Some(Value::from(1)));

        let other = std::thread::spawn(|| default_store().get("k")).join().unwrap();
        assert_eq!(other, None);
    }
}

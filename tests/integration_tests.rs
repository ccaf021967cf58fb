//! Integration tests for Tincan Dispatch

use chrono::Utc;
use proptest::prelude::*;
use serde_json::json;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;
use tincan_dispatch::{
    Action, Delay, LoggingMiddleware, Next, Outcome, Reducers, Store, StoreError, StoreResult,
    Value,
};

fn counter_store() -> Store {
    let store = Store::new();
    store.initialize([("counter", 0)]);
    store.bind(
        Reducers::new()
            .on("INCREMENT", |ctx, _| {
                ctx.update("counter", |n| {
                    Ok(Value::from(n.and_then(Value::as_i64).unwrap_or(0) + 1))
                });
                Ok(())
            })
            .on("DECREMENT", |ctx, _| {
                ctx.update("counter", |n| {
                    Ok(Value::from(n.and_then(Value::as_i64).unwrap_or(0) - 1))
                });
                Ok(())
            }),
    );
    store
}

fn record(store: &Store, key: &str) -> Rc<RefCell<Vec<Value>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = Rc::clone(&seen);
    store.subscribe(key, move |v| s.borrow_mut().push(v.clone()));
    seen
}

#[test]
fn net_increment_emits_once() {
    let store = counter_store();
    let seen = record(&store, "counter");

    for _ in 0..3 {
        store.dispatch(Action::new("INCREMENT")).unwrap();
    }
    for _ in 0..2 {
        store.dispatch(Action::new("DECREMENT")).unwrap();
    }
    store.settle().unwrap();

    assert_eq!(*seen.borrow(), vec![Value::from(1)]);
    assert_eq!(store.get("counter"), Some(Value::from(1)));
}

#[test]
fn net_zero_change_emits_nothing() {
    let store = counter_store();
    let seen = record(&store, "counter");

    for _ in 0..3 {
        store.dispatch(Action::new("INCREMENT")).unwrap();
    }
    for _ in 0..3 {
        store.dispatch(Action::new("DECREMENT")).unwrap();
    }
    store.settle().unwrap();

    assert!(seen.borrow().is_empty());
    assert_eq!(store.get("counter"), Some(Value::from(0)));
}

#[test]
fn only_emits_last_synchronous_dispatch() {
    let store = Store::new();
    store.initialize([("name", "initial")]);
    store.bind(Reducers::new().on("RENAME", |ctx, action| {
        ctx.set("name", action.get("to").cloned().unwrap_or_default());
        Ok(())
    }));
    let seen = record(&store, "name");

    store.dispatch(Action::new("RENAME").with("to", "first")).unwrap();
    store.dispatch(Action::new("RENAME").with("to", "second")).unwrap();
    store.settle().unwrap();

    assert_eq!(*seen.borrow(), vec![Value::from("second")]);
}

#[test]
fn keys_are_decided_independently() {
    let store = Store::new();
    store.initialize([("a", 0), ("b", 0)]);
    let a = record(&store, "a");
    let b = record(&store, "b");

    store.set("a", 1);
    store.set("b", 1);
    store.set("b", 0);
    store.settle().unwrap();

    assert_eq!(*a.borrow(), vec![Value::from(1)]);
    assert!(b.borrow().is_empty());
}

#[test]
fn unbound_action_resolves_with_itself() {
    let store = Store::new();
    store.initialize([("counter", 0)]);
    let action: Value = Action::new("UNKNOWN").with("x", 1).into();

    let outcome = store.dispatch(action.clone()).unwrap();
    store.settle().unwrap();

    assert!(outcome.value().is_some_and(|v| v.same(&action)));
    assert_eq!(store.keys(), vec!["counter".to_string()]);
    assert_eq!(store.get("counter"), Some(Value::from(0)));
}

#[test]
fn reducers_cannot_dispatch() {
    let store = Store::new();
    let inner_result = Rc::new(RefCell::new(None));

    let s = store.clone();
    let r = Rc::clone(&inner_result);
    store.bind(Reducers::new().on("OUTER", move |_, _| {
        *r.borrow_mut() = Some(s.dispatch(Action::new("INNER")).map(|_| ()));
        Ok(())
    }));

    store.dispatch(Action::new("OUTER")).unwrap();

    let inner = inner_result.borrow_mut().take().unwrap();
    let err = inner.unwrap_err();
    assert!(matches!(err, StoreError::ReentrantDispatch));
    assert_eq!(err.to_string(), "Reducers can't dispatch actions");

    // The flag is cleared again once the reducers finish.
    assert!(store.dispatch(Action::new("INNER")).is_ok());
}

#[test]
fn failing_reducer_releases_the_dispatch_flag() {
    let store = Store::new();
    store.bind(Reducers::new().on("BOOM", |_, _| anyhow::bail!("boom")));

    let err = store.dispatch(Action::new("BOOM")).unwrap_err();
    assert!(matches!(err, StoreError::Reducer { ref kind, .. } if kind == "BOOM"));

    assert!(store.dispatch(Action::new("OTHER")).is_ok());
}

#[test]
fn reducers_run_in_registration_order() {
    let store = Store::new();
    let order = Rc::new(RefCell::new(Vec::new()));

    let o = Rc::clone(&order);
    store.bind(Reducers::new().on("GO", move |_, _| {
        o.borrow_mut().push("first");
        Ok(())
    }));
    let o = Rc::clone(&order);
    store.bind(Reducers::new().on("GO", move |_, _| {
        o.borrow_mut().push("second");
        Ok(())
    }));

    store.dispatch(Action::new("GO")).unwrap();
    assert_eq!(*order.borrow(), vec!["first", "second"]);
}

#[test]
fn later_reducers_see_earlier_writes() {
    let store = Store::new();
    store.initialize([("n", 1)]);
    let observed = Rc::new(Cell::new(0));

    let o = Rc::clone(&observed);
    store.bind(
        Reducers::new()
            .on("GO", |ctx, _| {
                ctx.set("n", 5);
                Ok(())
            })
            .on("GO", move |ctx, _| {
                o.set(ctx.get("n").and_then(|v| v.as_i64()).unwrap_or(0));
                Ok(())
            }),
    );

    store.dispatch(Action::new("GO")).unwrap();
    assert_eq!(observed.get(), 5);
}

#[test]
fn rejects_non_record_actions() {
    let store = counter_store();
    let seen = record(&store, "counter");

    let err = store.dispatch(Value::from(Utc::now())).unwrap_err();
    assert!(matches!(err, StoreError::InvalidActionShape { found: "timestamp" }));

    let err = store.dispatch(json!({"amount": 1})).unwrap_err();
    assert!(matches!(err, StoreError::MissingDiscriminator));

    store.settle().unwrap();
    assert_eq!(store.get("counter"), Some(Value::from(0)));
    assert!(seen.borrow().is_empty());
}

#[test]
fn json_actions_dispatch() {
    let store = counter_store();
    store.dispatch(json!({"type": "INCREMENT"})).unwrap();

    assert_eq!(store.get("counter"), Some(Value::from(1)));
}

#[test]
fn direct_emission_fails() {
    let store = counter_store();

    let err = store.emit("counter").unwrap_err();
    assert!(matches!(err, StoreError::DirectEmission { ref key } if key == "counter"));
}

#[test]
fn listeners_cannot_emit_other_keys() {
    let store = Store::new();
    let result = Rc::new(RefCell::new(None));

    let s = store.clone();
    let r = Rc::clone(&result);
    store.subscribe("a", move |_| {
        *r.borrow_mut() = Some(s.emit("b").is_err());
    });

    store.set("a", 1);
    store.settle().unwrap();

    assert_eq!(*result.borrow(), Some(true));
}

#[test]
fn listeners_cannot_re_emit_their_own_key() {
    let store = Store::new();
    let calls = Rc::new(Cell::new(0));
    let rejected = Rc::new(Cell::new(false));

    let s = store.clone();
    let c = Rc::clone(&calls);
    let r = Rc::clone(&rejected);
    store.subscribe("a", move |_| {
        c.set(c.get() + 1);
        if c.get() == 1 {
            r.set(matches!(s.emit("a"), Err(StoreError::DirectEmission { .. })));
        }
    });

    store.set("a", 1);
    store.settle().unwrap();

    assert_eq!(calls.get(), 1);
    assert!(rejected.get());
}

#[test]
fn middleware_transforms_but_result_is_original() {
    let store = counter_store();
    store.add_middleware(LoggingMiddleware::new());
    store.add_middleware(|_: &Store, action: Value, next: Next| -> StoreResult<Outcome> {
        if action.field("type").and_then(Value::as_str) == Some("DOUBLE") {
            next.run(Action::new("INCREMENT"))?;
            return Ok(Outcome::Value(Value::from("doubled")));
        }
        next.run(action)
    });

    let original: Value = Action::new("INCREMENT").into();
    let outcome = store.dispatch(original.clone()).unwrap();
    assert!(outcome.value().is_some_and(|v| v.same(&original)));

    let outcome = store.dispatch(Action::new("DOUBLE")).unwrap();
    assert_eq!(outcome.value().and_then(Value::as_str), Some("doubled"));
    assert_eq!(store.get("counter"), Some(Value::from(2)));
}

#[test]
fn middleware_rejection_reaches_caller() {
    let store = counter_store();
    store.add_middleware(|_: &Store, _: Value, _: Next| -> StoreResult<Outcome> {
        Err(StoreError::rejected("read only"))
    });

    let err = store.dispatch(Action::new("INCREMENT")).unwrap_err();
    assert!(matches!(err, StoreError::Rejected { ref reason } if reason == "read only"));
    assert_eq!(store.get("counter"), Some(Value::from(0)));
}

#[test]
fn deferred_handles_await_the_turn() {
    let store = Store::new();
    let handle = store.set("k", 3);
    store.set("k", 4);
    store.settle().unwrap();

    let value = futures::executor::block_on(handle).unwrap();
    assert_eq!(value, Value::from(4));
}

#[tokio::test(start_paused = true)]
async fn delayed_dispatch_runs_after_the_delay() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let store = counter_store();
            store.add_middleware(Delay::new());
            let seen = record(&store, "counter");

            let outcome = store
                .dispatch(Action::new("INCREMENT").with("delay", 50))
                .unwrap();
            assert!(outcome.as_cancel().is_some());
            assert_eq!(store.get("counter"), Some(Value::from(0)));

            tokio::time::sleep(Duration::from_millis(100)).await;

            assert_eq!(store.get("counter"), Some(Value::from(1)));
            assert_eq!(*seen.borrow(), vec![Value::from(1)]);
            assert_eq!(store.settle().unwrap(), 0);
        })
        .await;
}

#[tokio::test]
async fn awaiting_a_write_runs_its_turn() {
    let store = Store::new();
    let seen = record(&store, "k");

    let value = tokio::time::timeout(Duration::from_secs(5), store.set("k", 1))
        .await
        .expect("awaiting the handle runs the turn")
        .unwrap();

    assert_eq!(value, Value::from(1));
    assert_eq!(*seen.borrow(), vec![Value::from(1)]);
}

#[tokio::test(start_paused = true)]
async fn cancelled_delay_never_reaches_reducers() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let store = counter_store();
            store.add_middleware(Delay::new());
            let seen = record(&store, "counter");

            let outcome = store
                .dispatch(Action::new("INCREMENT").with("delay", 50))
                .unwrap();
            let cancel = outcome.as_cancel().expect("delayed dispatch returns a cancel handle");
            cancel.cancel();

            tokio::time::sleep(Duration::from_millis(100)).await;
            store.settle().unwrap();

            assert!(cancel.is_cancelled());
            assert_eq!(store.get("counter"), Some(Value::from(0)));
            assert!(seen.borrow().is_empty());
        })
        .await;
}

proptest! {
    #[test]
    fn any_write_sequence_emits_at_most_once(
        initial in -5i64..5,
        writes in proptest::collection::vec(-5i64..5, 1..20),
    ) {
        let store = Store::new();
        store.initialize([("k", initial)]);
        let seen = record(&store, "k");

        for w in &writes {
            store.set("k", *w);
        }
        store.settle().unwrap();

        let last = *writes.last().unwrap();
        if last == initial {
            prop_assert!(seen.borrow().is_empty());
        } else {
            prop_assert_eq!(seen.borrow().clone(), vec![Value::from(last)]);
        }
    }
}

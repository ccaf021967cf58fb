//! Counter application demonstrating dispatch, coalescing and notification

use tincan_dispatch::{Action, LoggingMiddleware, Reducers, Store, StoreConfig, Value};
use tracing_subscriber::EnvFilter;

fn count_of(value: Option<&Value>) -> i64 {
    value.and_then(Value::as_i64).unwrap_or(0)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Counter Application ===\n");

    println!("1. Initializing counter store");
    let store = Store::with_config(StoreConfig::default().with_name("counter"));
    store.initialize([("count", Value::from(0)), ("step", Value::from(1))]);
    store.add_middleware(LoggingMiddleware::new());

    store.bind(
        Reducers::new()
            .on("INCREMENT", |ctx, _| {
                let step = count_of(ctx.get("step").as_ref());
                ctx.update("count", move |n| Ok(Value::from(count_of(n) + step)));
                Ok(())
            })
            .on("DECREMENT", |ctx, _| {
                let step = count_of(ctx.get("step").as_ref());
                ctx.update("count", move |n| Ok(Value::from(count_of(n) - step)));
                Ok(())
            })
            .on("SET_STEP", |ctx, action| {
                ctx.set("step", action.get("step").cloned().unwrap_or(Value::from(1)));
                Ok(())
            })
            .on("RESET", |ctx, _| {
                ctx.set("count", 0);
                Ok(())
            }),
    );

    println!("\n2. Subscribing to changes");
    store.subscribe("count", |v| println!("   [count] -> {}", count_of(Some(v))));
    store.subscribe("step", |v| println!("   [step]  -> {}", count_of(Some(v))));

    println!("\n3. Incrementing three times in one turn (one notification)");
    for _ in 0..3 {
        store.dispatch(Action::new("INCREMENT"))?;
    }
    store.settle()?;

    println!("\n4. Changing step size to 5");
    store.dispatch(Action::new("SET_STEP").with("step", 5))?;
    store.settle()?;

    println!("\n5. Incrementing then decrementing (no notification)");
    store.dispatch(Action::new("INCREMENT"))?;
    store.dispatch(Action::new("DECREMENT"))?;
    store.settle()?;

    println!("\n6. Rejected actions");
    if let Err(err) = store.dispatch(Value::from("INCREMENT")) {
        println!("   {err}");
    }

    println!("\n7. Resetting");
    store.dispatch(Action::new("RESET"))?;
    store.settle()?;

    println!("\n8. Final model:");
    for key in store.keys() {
        println!("   {key} = {:?}", store.get(&key).unwrap_or_default());
    }

    println!("\n✓ Counter application complete!");
    Ok(())
}

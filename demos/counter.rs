//! Counter driven through both entry points, with a subscriber and history

use tindux::{Action, Options, Reduction, Store, StoreError};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, PartialEq)]
enum CounterAction {
    Inc,
    Dec,
}

impl Action for CounterAction {
    fn kind(&self) -> &str {
        match self {
            CounterAction::Inc => "INC",
            CounterAction::Dec => "DEC",
        }
    }
}

#[derive(Clone, Debug, Default)]
struct CounterState {
    accumulator: i64,
    last_action: Option<CounterAction>,
}

fn reducer(state: &CounterState, action: &CounterAction) -> Reduction<CounterState> {
    let delta = match action {
        CounterAction::Inc => 1,
        CounterAction::Dec => -1,
    };
    Reduction::ok(CounterState {
        accumulator: state.accumulator + delta,
        last_action: Some(*action),
    })
}

#[tokio::main]
async fn main() -> Result<(), StoreError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Counter Store ===\n");

    let store = Store::new(CounterState::default(), reducer)?;
    store.with_options(Options::recording_last(5));

    println!("1. Subscribing");
    let mut updates = store.subscription();
    let printer = tokio::spawn(async move {
        while let Some(state) = updates.recv().await {
            println!(
                "   [Subscriber] accumulator: {}, last: {:?}",
                state.accumulator, state.last_action
            );
        }
    });

    println!("\n2. Queueing INC x4, DEC x2");
    use CounterAction::{Dec, Inc};
    for action in [Inc, Inc, Inc, Inc, Dec, Dec] {
        store.submit(action).await?;
    }

    println!("\n3. Dispatching INC directly");
    store.dispatch(Inc).await?;

    println!("\n4. Closing the store");
    store.close().await;

    let history = store.history();
    let kinds: Vec<&str> = history.iter().map(|a| a.kind()).collect();
    println!("\n5. Final state: {:?}", store.get_state());
    println!("   History (last 5): {:?}", kinds);

    drop(store);
    let _ = printer.await;

    println!("\n✓ Example complete!");
    Ok(())
}

//! Debounce Example
//!
//! A search box that emits a `query` event per keystroke. Three listeners
//! consume the same events with different delivery policies:
//!
//! - **buffered** - the search runs once typing pauses for 150ms
//! - **delayed** - an analytics hook sees every keystroke 50ms later
//! - **deferred** - a status line updates on the next scheduler turn
//!
//! Timed deliveries use the default `TokioScheduler`, which spawns on the
//! current thread, so the dispatcher lives inside a `LocalSet`.

use std::{rc::Rc, time::Duration};

use event_dispatch::*;
use tokio::{task::LocalSet, time::sleep};

fn printer(label: &'static str) -> Callback<String> {
    Callback::new(move |_scope, event, _extra| {
        println!("{label:>9}: {}", event.target());
        Ok(())
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    LocalSet::new()
        .run_until(async {
            let search_box = EventDispatcher::<String>::default();
            let scope = Scope::new();

            search_box.subscribe(
                &printer("search"),
                &scope,
                Some("query".into()),
                Some(ListenerOptions::default().with_buffer(Duration::from_millis(150))),
            );
            search_box.subscribe(
                &printer("analytics"),
                &scope,
                Some("query".into()),
                Some(ListenerOptions::default().with_delay(Duration::from_millis(50))),
            );
            search_box.subscribe(
                &printer("status"),
                &scope,
                Some("query".into()),
                Some(ListenerOptions::default().with_defer(true)),
            );

            let mut text = String::new();
            for (i, c) in "rust".chars().enumerate() {
                text.push(c);
                search_box.dispatch(Rc::new(Event::new("query", text.clone(), false)))?;
                // a longer pause after the second keystroke lets one search through
                let pause = if i == 1 { 200 } else { 40 };
                sleep(Duration::from_millis(pause)).await;
            }

            sleep(Duration::from_millis(300)).await;
            Ok::<(), Error>(())
        })
        .await
}

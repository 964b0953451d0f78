//! Relay Example
//!
//! A small widget tree where every widget owns a dispatcher and the
//! application listens at the root.
//!
//! # Key Concepts Demonstrated
//!
//! ## 1. Relaying
//!
//! `panel.relay(&button, ...)` forwards the button's events to the panel,
//! and the app relays the panel, so a click on the button reaches app
//! listeners without the app knowing about the button.
//!
//! ## 2. Keyed Event Types
//!
//! `TypeExpr::keyed([("pointer", ["down", "up"])])` expands to
//! `pointer:down` and `pointer:up`.
//!
//! ## 3. Suspension
//!
//! While the app is suspended with queueing, non-cancellable events wait
//! and are delivered on `resume`; cancellable ones go straight through.
//!
//! Run with `RUST_LOG=event_dispatch=debug` to see the dispatcher's own logs.

use std::rc::Rc;

use event_dispatch::*;

#[derive(Debug)]
struct Widget {
    name: &'static str,
}

fn main() -> Result {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let app = EventDispatcher::<Rc<Widget>>::default();
    let panel = EventDispatcher::<Rc<Widget>>::default();
    let button = EventDispatcher::<Rc<Widget>>::default();

    panel.relay(&button, None, None)?;
    app.relay(&panel, Some(TypeExpr::keyed([("pointer", ["down", "up"])])), None)?;

    let logger = Callback::<Rc<Widget>>::new(|_scope, event, extra| {
        let tag = extra.and_then(|v| v.as_str()).unwrap_or("-");
        println!(
            "[{tag}] {:?} from {} (cancellable: {})",
            event.event_type().normalize(":"),
            event.target().name,
            event.is_cancellable()
        );
        Ok(())
    });
    let closer = Callback::<Rc<Widget>>::new(|_scope, event, _extra| {
        println!("closing {}, preventing default", event.target().name);
        event.prevent_default();
        Ok(())
    });

    let scope = Scope::new();
    app.subscribe(&logger, &scope, None, Some(ListenerOptions::default().with_extra("app")));
    panel.subscribe(&closer, &scope, Some("close".into()), None);

    let ok = Rc::new(Widget { name: "ok-button" });
    button.dispatch(Rc::new(Event::new(TypeExpr::keyed([("pointer", "down")]), ok.clone(), false)))?;
    button.dispatch(Rc::new(Event::new(TypeExpr::keyed([("pointer", "move")]), ok.clone(), false)))?;

    let close = Rc::new(Event::new("close", ok.clone(), true));
    button.dispatch(close.clone())?;
    println!("close prevented: {}", close.is_default_prevented());

    println!("-- suspending app --");
    app.suspend(true);
    button.dispatch(Rc::new(Event::new(TypeExpr::keyed([("pointer", "up")]), ok.clone(), false)))?;
    println!("queued while suspended: {}", app.queued_len());
    app.resume()?;

    app.unrelay(&panel, None);
    button.dispatch(Rc::new(Event::new(TypeExpr::keyed([("pointer", "down")]), ok, false)))?;
    println!("after unrelay the app heard nothing more");

    Ok(())
}

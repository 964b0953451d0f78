use std::{cell::RefCell, rc::Rc};

use event_dispatch::{
    Callback, Error, Event, EventDispatcher, ListenerOptions, Result, Scope, TypeExpr,
};

type Log = Rc<RefCell<Vec<String>>>;

fn recorder(log: &Log, label: &str) -> Callback<u32> {
    let log = log.clone();
    let label = label.to_string();
    Callback::new(move |_, event, _| {
        log.borrow_mut().push(format!("{label}:{}", event.target()));
        Ok(())
    })
}

fn event(event_type: impl Into<TypeExpr>, target: u32) -> Rc<Event<u32>> {
    Rc::new(Event::new(event_type, target, false))
}

#[test]
fn keyed_subscription_end_to_end() -> Result {
    let dispatcher = EventDispatcher::<u32>::default();
    let log = Log::default();
    let scope = Scope::new();
    dispatcher.subscribe(
        &recorder(&log, "c"),
        &scope,
        Some(TypeExpr::keyed([("a", ["b", "c"])])),
        None,
    );

    dispatcher.dispatch(event(TypeExpr::keyed([("a", "b")]), 1))?;
    dispatcher.dispatch(event(TypeExpr::keyed([("a", "z")]), 2))?;

    assert_eq!(*log.borrow(), vec!["c:1"]);
    Ok(())
}

#[test]
fn overlapping_subscriptions_notify_once() -> Result {
    let dispatcher = EventDispatcher::<u32>::default();
    let log = Log::default();
    let scope = Scope::new();
    let cb = recorder(&log, "l");
    dispatcher.subscribe(&cb, &scope, Some("x".into()), None);
    dispatcher.subscribe(&cb, &scope, Some("y".into()), None);

    assert!(dispatcher.has_listener(&cb, &scope));
    dispatcher.dispatch(event(["x", "y"], 1))?;
    dispatcher.dispatch(event("y", 2))?;

    assert_eq!(*log.borrow(), vec!["l:1", "l:2"]);
    Ok(())
}

#[test]
fn suspension_polarity() -> Result {
    let dispatcher = EventDispatcher::<u32>::default();
    let log = Log::default();
    dispatcher.subscribe(&recorder(&log, "l"), &Scope::new(), None, None);

    dispatcher.suspend(false);
    dispatcher.dispatch(event("x", 1))?;
    dispatcher.dispatch(Rc::new(Event::new("x", 2, true)))?;
    dispatcher.resume()?;

    assert_eq!(*log.borrow(), vec!["l:2"]);
    Ok(())
}

#[test]
fn queued_event_delivered_after_resume() -> Result {
    let dispatcher = EventDispatcher::<u32>::default();
    let log = Log::default();
    dispatcher.subscribe(&recorder(&log, "l"), &Scope::new(), None, None);

    dispatcher.suspend(true);
    dispatcher.dispatch(event("x", 1))?;
    assert!(log.borrow().is_empty());

    dispatcher.resume()?;
    assert_eq!(*log.borrow(), vec!["l:1"]);
    Ok(())
}

#[test]
fn single_listener_is_used_up() -> Result {
    let dispatcher = EventDispatcher::<u32>::default();
    let log = Log::default();
    let scope = Scope::new();
    let cb = recorder(&log, "once");
    let options = ListenerOptions::default().with_single(true);
    dispatcher.subscribe(&cb, &scope, Some("x".into()), Some(options));

    dispatcher.dispatch(event("x", 1))?;
    assert!(!dispatcher.has_listener(&cb, &scope));
    dispatcher.dispatch(event("x", 2))?;

    assert_eq!(*log.borrow(), vec!["once:1"]);
    Ok(())
}

#[test]
fn relay_chain_and_unrelay() -> Result {
    let app = EventDispatcher::<u32>::default();
    let panel = EventDispatcher::<u32>::default();
    let button = EventDispatcher::<u32>::default();
    let log = Log::default();

    app.relay(&panel, None, None)?;
    panel.relay(&button, Some("click".into()), None)?;
    app.subscribe(&recorder(&log, "app"), &Scope::new(), Some("click".into()), None);

    button.dispatch(event("click", 1))?;
    button.dispatch(event("hover", 2))?;
    assert_eq!(*log.borrow(), vec!["app:1"]);

    app.unrelay(&panel, None);
    button.dispatch(event("click", 3))?;
    assert_eq!(*log.borrow(), vec!["app:1"]);

    assert_eq!(app.relay(&app, None, None), Err(Error::SelfRelay));
    Ok(())
}

#[test]
fn will_dispatch_requires_a_type() {
    let dispatcher = EventDispatcher::<u32>::default();
    assert_eq!(dispatcher.will_dispatch(None), Err(Error::InvalidEventType));
    assert_eq!(
        dispatcher.will_dispatch(Some(&TypeExpr::List(vec![]))),
        Err(Error::InvalidEventType)
    );
    assert_eq!(dispatcher.will_dispatch(Some(&"x".into())), Ok(false));
}

#[test]
fn listener_error_reaches_caller() {
    #[derive(Debug, thiserror::Error)]
    #[error("rejected {0}")]
    struct Rejected(u32);

    let dispatcher = EventDispatcher::<u32>::default();
    let log = Log::default();
    let reject: Callback<u32> = Callback::new(|_, event, _| Err(Error::listener(Rejected(*event.target()))));
    dispatcher.subscribe(&reject, &Scope::new(), None, Some(ListenerOptions::default().with_priority(1)));
    dispatcher.subscribe(&recorder(&log, "after"), &Scope::new(), None, None);

    let err = dispatcher.dispatch(event("x", 9)).unwrap_err();
    assert_eq!(err.to_string(), "Listener failed: rejected 9");
    assert!(log.borrow().is_empty());
}

#[test]
fn options_load_from_json() -> Result {
    let dispatcher = EventDispatcher::<u32>::default();
    let seen = Log::default();
    let options: ListenerOptions =
        serde_json::from_str(r#"{"priority": 3, "extra": "tagged"}"#).map_err(Error::listener)?;

    let sink = seen.clone();
    let cb: Callback<u32> = Callback::new(move |_, _, extra| {
        let extra = extra.and_then(|v| v.as_str()).unwrap_or_default();
        sink.borrow_mut().push(extra.to_string());
        Ok(())
    });
    let types: TypeExpr = serde_json::from_str(r#"{"ui": ["open", "close"]}"#).map_err(Error::listener)?;
    dispatcher.subscribe(&cb, &Scope::new(), Some(types), Some(options));

    dispatcher.dispatch(event("ui:close", 1))?;
    assert_eq!(*seen.borrow(), vec!["tagged"]);
    Ok(())
}

#![cfg_attr(docsrs, feature(doc_cfg))]
//! # event-dispatch
//!
//! An in-process event dispatcher with typed events, prioritised and
//! scoped listeners, timed delivery policies, relaying and suspension.
//!
//! Listeners register interest in event types described by a [`TypeExpr`]
//! (a string, a list, or keyed hierarchies such as `user:login`). When an
//! [`Event`] is dispatched, every interested listener is called, highest
//! priority first.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::rc::Rc;
//! use event_dispatch::*;
//!
//! fn main() -> Result {
//!     let dispatcher = EventDispatcher::<String>::default();
//!
//!     let greet: Callback<String> = Callback::new(|_scope, event, _extra| {
//!         println!("Hello, {}!", event.target());
//!         Ok(())
//!     });
//!     dispatcher.subscribe(&greet, &Scope::new(), Some("hello".into()), None);
//!
//!     dispatcher.dispatch(Rc::new(Event::new("hello", "World".to_string(), false)))
//! }
//! ```
//!
//! ## Core Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`EventDispatcher`] | Listener registry and delivery engine |
//! | [`Event`] | Type, target, cancellable flag and options of one occurrence |
//! | [`TypeExpr`] | Scalar, list or keyed description of event types |
//! | [`Callback`] / [`Scope`] | Listener function and receiver, both compared by reference |
//! | [`ListenerOptions`] | `single`, `buffer`, `delay`, `defer`, `priority`, `extra` |
//! | [`DeliveryPolicy`] | Immediate, deferred, delayed or buffered delivery |
//! | [`Scheduler`] | Runs non-immediate deliveries; [`TokioScheduler`] by default |
//!
//! ## Delivery Policies
//!
//! ```rust,ignore
//! let debounced = ListenerOptions::default().with_buffer(Duration::from_millis(100));
//! let later     = ListenerOptions::default().with_delay(Duration::from_millis(50));
//! let next_tick = ListenerOptions::default().with_defer(true);
//! let once      = ListenerOptions::default().with_single(true).with_priority(10);
//! ```
//!
//! Deferred, delayed and buffered listeners run on the dispatcher's
//! [`Scheduler`]. With the default [`TokioScheduler`] the dispatcher must
//! live inside a [`tokio::task::LocalSet`].
//!
//! ## Relaying
//!
//! ```rust,ignore
//! let app = EventDispatcher::<()>::default();
//! let widget = EventDispatcher::<()>::default();
//! app.relay(&widget, Some("click".into()), None)?; // widget clicks reach app listeners
//! ```
//!
//! ## Features
//!
//! - **`test-harness`** - [`testing::ManualScheduler`] and [`testing::CallLog`]
//!   for deterministic tests
//!
//! ## Examples
//!
//! See the `examples/` directory:
//!
//! - `relay.rs` - Chained dispatchers with suspension
//! - `debounce.rs` - Buffered, delayed and deferred listeners on Tokio

mod callback;
mod config;
mod delivery_policy;
mod dispatcher;
mod error;
mod event;
mod event_id;
mod listener;
mod listener_options;
mod scheduler;
mod type_expr;

mod internal;

#[cfg(any(test, feature = "test-harness"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-harness")))]
pub mod testing;

pub use callback::{Callback, ListenerFn, Scope};
pub use config::Config;
pub use delivery_policy::DeliveryPolicy;
pub use dispatcher::EventDispatcher;
pub use error::Error;
pub use event::Event;
pub use event_id::EventId;
pub use listener::Listener;
pub use listener_options::ListenerOptions;
pub use scheduler::{Scheduler, Task, TimerHandle, TokioScheduler};
pub use type_expr::TypeExpr;

/// Convenience alias for `Result<T, event_dispatch::Error>`.
pub type Result<T = ()> = std::result::Result<T, Error>;

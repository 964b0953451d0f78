//! Utilities for testing code built on the dispatcher.
//!
//! Enable with the `test-harness` feature:
//!
//! ```toml
//! [dev-dependencies]
//! event-dispatch = { version = "0.1", features = ["test-harness"] }
//! ```
//!
//! [`ManualScheduler`] replaces timers with a virtual clock so deferred,
//! delayed and buffered listeners can be stepped deterministically;
//! [`CallLog`] records which listeners ran and in what order.
//!
//! ```rust
//! use std::{rc::Rc, time::Duration};
//! use event_dispatch::{Config, Event, EventDispatcher, ListenerOptions, Scope};
//! use event_dispatch::testing::{CallLog, ManualScheduler};
//!
//! let scheduler = Rc::new(ManualScheduler::new());
//! let dispatcher = EventDispatcher::<()>::with_scheduler(Config::default(), scheduler.clone());
//! let log = CallLog::new();
//! let options = ListenerOptions::default().with_delay(Duration::from_millis(10));
//! dispatcher.subscribe(&log.callback("late"), &Scope::new(), None, Some(options));
//!
//! dispatcher.dispatch(Rc::new(Event::new("tick", (), false))).unwrap();
//! assert!(log.is_empty());
//! scheduler.advance(Duration::from_millis(10));
//! assert_eq!(log.entries(), vec!["late"]);
//! ```
//!
//! Both types use `Rc` internally and are `!Send`, like the dispatcher.

mod call_log;
mod manual_scheduler;

pub use call_log::CallLog;
pub use manual_scheduler::ManualScheduler;

use std::{cell::RefCell, rc::Rc};

use crate::{Callback, Error};

/// Records listener invocations in call order.
///
/// Each callback produced by a log appends its label when called. Clones
/// share the same log.
///
/// ```rust
/// use std::rc::Rc;
/// use event_dispatch::{Event, EventDispatcher, Scope, testing::CallLog};
///
/// let dispatcher = EventDispatcher::<()>::default();
/// let log = CallLog::new();
/// dispatcher.subscribe(&log.callback("a"), &Scope::new(), Some("ping".into()), None);
/// dispatcher.dispatch(Rc::new(Event::new("ping", (), false))).unwrap();
/// assert_eq!(log.entries(), vec!["a"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<String>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A listener that records `label` on every call.
    pub fn callback<T>(&self, label: impl Into<String>) -> Callback<T> {
        let log = self.0.clone();
        let label = label.into();
        Callback::new(move |_, _, _| {
            log.borrow_mut().push(label.clone());
            Ok(())
        })
    }

    /// A listener that records `label` and then fails.
    pub fn failing<T>(&self, label: impl Into<String>) -> Callback<T> {
        let log = self.0.clone();
        let label = label.into();
        Callback::new(move |_, _, _| {
            log.borrow_mut().push(label.clone());
            Err(Error::listener(std::io::Error::other(format!("{label} failed"))))
        })
    }

    /// Append an entry by hand, e.g. from a custom listener.
    pub fn push(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub fn count(&self, label: &str) -> usize {
        self.0.borrow().iter().filter(|e| *e == label).count()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

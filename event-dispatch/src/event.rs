use std::{cell::Cell, fmt};

use serde_json::{Map, Value};

use crate::{EventId, TypeExpr};

/// An event sent through an [`EventDispatcher`](crate::EventDispatcher).
///
/// Every field is fixed at construction except the default-prevented flag,
/// which [`prevent_default`](Self::prevent_default) flips from `false` to
/// `true` for cancellable events only.
///
/// Dispatchers take events as `Rc<Event<T>>`. The allocation is the event's
/// identity: relaying forwards the same `Rc`, and a dispatcher ignores an
/// event that is already being dispatched by it.
///
/// Cancellable events are never held back by
/// [`suspend`](crate::EventDispatcher::suspend); only non-cancellable events
/// are queued or dropped while a dispatcher is suspended.
///
/// # Example
///
/// ```rust
/// use event_dispatch::Event;
/// use serde_json::Value;
///
/// let event = Event::new("save", "document.txt", true).with_option("force", Value::Bool(true));
/// event.prevent_default();
/// assert!(event.is_default_prevented());
/// assert_eq!(event.option("force"), Some(&Value::Bool(true)));
/// ```
pub struct Event<T> {
    id: EventId,
    event_type: TypeExpr,
    target: T,
    cancellable: bool,
    default_prevented: Cell<bool>,
    options: Map<String, Value>,
}

impl<T> Event<T> {
    pub fn new(event_type: impl Into<TypeExpr>, target: T, cancellable: bool) -> Self {
        Self {
            id: EventId::new(),
            event_type: event_type.into(),
            target,
            cancellable,
            default_prevented: Cell::new(false),
            options: Map::new(),
        }
    }

    /// Replace the options bag.
    pub fn with_options(mut self, options: Map<String, Value>) -> Self {
        self.options = options;
        self
    }

    /// Add a single entry to the options bag.
    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    #[inline]
    pub fn id(&self) -> EventId {
        self.id
    }

    #[inline]
    pub fn event_type(&self) -> &TypeExpr {
        &self.event_type
    }

    /// The object the event is about.
    #[inline]
    pub fn target(&self) -> &T {
        &self.target
    }

    #[inline]
    pub fn is_cancellable(&self) -> bool {
        self.cancellable
    }

    #[inline]
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub fn options(&self) -> &Map<String, Value> {
        &self.options
    }

    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    /// Cancel the default behavior associated with the event.
    ///
    /// Does nothing for events that are not cancellable.
    pub fn prevent_default(&self) {
        if self.cancellable {
            self.default_prevented.set(true);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Event<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("id", &self.id)
            .field("event_type", &self.event_type)
            .field("target", &self.target)
            .field("cancellable", &self.cancellable)
            .field("default_prevented", &self.default_prevented.get())
            .field("options", &self.options)
            .finish()
    }
}

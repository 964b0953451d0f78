use crate::{Callback, ListenerOptions, Scope, TypeExpr};

/// A registration request, used by
/// [`subscribe_all`](crate::EventDispatcher::subscribe_all) and
/// [`unsubscribe_all`](crate::EventDispatcher::unsubscribe_all).
///
/// ```rust
/// use event_dispatch::{Callback, Listener, ListenerOptions, Scope};
///
/// let on_save: Callback<()> = Callback::new(|_, _, _| Ok(()));
/// let listener = Listener::new(&on_save, &Scope::new())
///     .with_event_type("save")
///     .with_options(ListenerOptions::default().with_single(true));
/// assert!(listener.options.is_some());
/// ```
#[derive(Debug)]
pub struct Listener<T> {
    pub callback: Callback<T>,
    pub scope: Scope,
    /// `None` listens to every event type.
    pub event_type: Option<TypeExpr>,
    /// `None` keeps the options of an existing registration.
    pub options: Option<ListenerOptions>,
}

impl<T> Listener<T> {
    pub fn new(callback: &Callback<T>, scope: &Scope) -> Self {
        Self {
            callback: callback.clone(),
            scope: scope.clone(),
            event_type: None,
            options: None,
        }
    }

    pub fn with_event_type(mut self, event_type: impl Into<TypeExpr>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn with_options(mut self, options: ListenerOptions) -> Self {
        self.options = Some(options);
        self
    }
}

impl<T> Clone for Listener<T> {
    fn clone(&self) -> Self {
        Self {
            callback: self.callback.clone(),
            scope: self.scope.clone(),
            event_type: self.event_type.clone(),
            options: self.options.clone(),
        }
    }
}

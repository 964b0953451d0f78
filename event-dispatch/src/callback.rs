use std::{any::Any, fmt, rc::Rc};

use serde_json::Value;

use crate::{Event, Result};

/// Signature of a listener function.
///
/// Receives the [`Scope`] it was registered with, the event, and the
/// `extra` value from its [`ListenerOptions`](crate::ListenerOptions).
pub type ListenerFn<T> = dyn Fn(&Scope, &Rc<Event<T>>, Option<&Value>) -> Result;

/// A listener function with reference identity.
///
/// Clones share the same function and compare equal; two callbacks built
/// from identical closures are different listeners. Together with a
/// [`Scope`] it forms the key of a subscription: subscribing the same
/// `(callback, scope)` pair twice updates one registration.
///
/// # Example
///
/// ```rust
/// use event_dispatch::{Callback, Scope};
///
/// let cb: Callback<()> = Callback::new(|_scope, event, _extra| {
///     println!("got {:?}", event.event_type());
///     Ok(())
/// });
/// assert_eq!(cb, cb.clone());
/// ```
pub struct Callback<T>(Rc<ListenerFn<T>>);

impl<T> Callback<T> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Scope, &Rc<Event<T>>, Option<&Value>) -> Result + 'static,
    {
        Self(Rc::new(f))
    }

    #[inline]
    pub(crate) fn call(&self, scope: &Scope, event: &Rc<Event<T>>, extra: Option<&Value>) -> Result {
        (self.0)(scope, event, extra)
    }

    fn addr(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }
}

impl<T> Clone for Callback<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> PartialEq for Callback<T> {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl<T> Eq for Callback<T> {}

impl<T> fmt::Debug for Callback<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:p})", self.addr())
    }
}

/// The receiver context of a listener, compared by reference.
///
/// A scope wraps any shared value (`Scope::of`) or is an anonymous token
/// (`Scope::new`). Listeners get their scope back on every call and can
/// downcast it to reach the receiver:
///
/// ```rust
/// use std::{cell::Cell, rc::Rc};
/// use event_dispatch::Scope;
///
/// let counter = Rc::new(Cell::new(0));
/// let scope = Scope::of(&counter);
/// scope.downcast_ref::<Cell<i32>>().unwrap().set(7);
/// assert_eq!(counter.get(), 7);
/// assert_eq!(scope, Scope::of(&counter));
/// assert_ne!(Scope::new(), Scope::new());
/// ```
#[derive(Clone)]
pub struct Scope(Rc<dyn Any>);

impl Scope {
    /// A fresh scope equal only to its own clones.
    pub fn new() -> Self {
        Self(Rc::new(()))
    }

    /// A scope identified by the given shared value.
    pub fn of<S: Any>(value: &Rc<S>) -> Self {
        let value: Rc<dyn Any> = value.clone();
        Self(value)
    }

    pub fn downcast_ref<S: Any>(&self) -> Option<&S> {
        (*self.0).downcast_ref::<S>()
    }

    pub fn downcast<S: Any>(&self) -> Option<Rc<S>> {
        self.0.clone().downcast::<S>().ok()
    }

    fn addr(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }
}

impl Default for Scope {
    fn default() -> Self {
        Scope::new()
    }
}

impl PartialEq for Scope {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for Scope {}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scope({:p})", self.addr())
    }
}

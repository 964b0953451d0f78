use std::{
    cell::RefCell,
    collections::VecDeque,
    fmt,
    rc::{Rc, Weak},
    time::Duration,
};

use serde_json::Value;

use crate::{
    Callback, Config, DeliveryPolicy, Error, Event, Listener, ListenerOptions, Result, Scheduler,
    Scope, TokioScheduler, TypeExpr,
    internal::{InFlight, ListenerHelper, ListenerId, Registry},
    type_expr::normalize_interest,
};

/// Registry of listeners and the engine that delivers events to them.
///
/// `EventDispatcher` is a cheap handle: clones share the same listeners,
/// suspension state and relays, and compare equal. It is single-threaded
/// (`!Send`); listeners run on the thread that dispatches.
///
/// # Subscribing
///
/// A registration is keyed by its `(callback, scope)` pair, compared by
/// reference. Subscribing the same pair again merges the event types into
/// the existing registration and replaces its options when new ones are
/// given. `None` as event type means every type.
///
/// ```rust
/// use std::rc::Rc;
/// use event_dispatch::{Callback, Event, EventDispatcher, ListenerOptions, Scope, TypeExpr};
///
/// let dispatcher = EventDispatcher::<&str>::default();
/// let on_user: Callback<&str> = Callback::new(|_scope, event, _extra| {
///     println!("{} on {}", event.target(), event.event_type().normalize(":").join(","));
///     Ok(())
/// });
/// let scope = Scope::new();
///
/// let users = TypeExpr::keyed([("user", ["login", "logout"])]);
/// dispatcher.subscribe(&on_user, &scope, Some(users), Some(ListenerOptions::default().with_priority(5)));
/// assert!(dispatcher.will_dispatch(Some(&"user:login".into())).unwrap());
///
/// dispatcher.dispatch(Rc::new(Event::new(TypeExpr::keyed([("user", "login")]), "alice", false))).unwrap();
/// ```
///
/// # Delivery
///
/// Matching listeners are notified by descending priority; among equal
/// priorities the most recently registered goes first. Each listener's
/// [`DeliveryPolicy`] decides whether it runs inside `dispatch` or later
/// through the dispatcher's [`Scheduler`]. An error returned by an
/// immediate listener stops the dispatch and is returned to the caller;
/// the remaining listeners are not notified.
///
/// # Suspension
///
/// [`suspend`](Self::suspend) holds back **non-cancellable** events, which
/// are queued or dropped. Cancellable events are still delivered while
/// suspended.
///
/// # Relaying
///
/// [`relay`](Self::relay) subscribes this dispatcher to another one and
/// re-dispatches everything it receives. Relay cycles are safe: a
/// dispatcher ignores an event it is already dispatching.
pub struct EventDispatcher<T: 'static> {
    inner: Rc<Inner<T>>,
}

struct Inner<T: 'static> {
    config: Config,
    scheduler: Rc<dyn Scheduler>,
    relay_callback: Callback<T>,
    relay_scope: Scope,
    state: RefCell<State<T>>,
    in_flight: InFlight<T>,
}

struct State<T: 'static> {
    registry: Registry<T>,
    upstream: Vec<Weak<Inner<T>>>,
    suspend_depth: usize,
    queue_suspended: bool,
    queue: VecDeque<Rc<Event<T>>>,
}

impl<T: 'static> Default for State<T> {
    fn default() -> Self {
        Self {
            registry: Registry::default(),
            upstream: Vec::new(),
            suspend_depth: 0,
            queue_suspended: false,
            queue: VecDeque::new(),
        }
    }
}

/// What a single listener call needs, copied out of the registry so no
/// borrow is held while user code runs.
struct Delivery<T> {
    id: ListenerId,
    callback: Callback<T>,
    scope: Scope,
    extra: Option<Value>,
    policy: DeliveryPolicy,
    single: bool,
}

impl<T> Delivery<T> {
    fn of(record: &ListenerHelper<T>) -> Self {
        Self {
            id: record.id(),
            callback: record.callback().clone(),
            scope: record.scope().clone(),
            extra: record.extra().cloned(),
            policy: record.policy(),
            single: record.single(),
        }
    }

    fn call(&self, event: &Rc<Event<T>>) -> Result {
        self.callback.call(&self.scope, event, self.extra.as_ref())
    }
}

impl<T: 'static> EventDispatcher<T> {
    /// Create a dispatcher that schedules timed deliveries on Tokio.
    ///
    /// Listeners with `defer`, `delay` or `buffer` need a
    /// [`LocalSet`](tokio::task::LocalSet); see [`TokioScheduler`].
    ///
    /// # Panics
    ///
    /// [`dispatch`](Self::dispatch) on the returned dispatcher panics when
    /// it reaches a deferred, delayed or buffered listener outside a
    /// `LocalSet`.
    pub fn new(config: Config) -> Self {
        Self::with_scheduler(config, Rc::new(TokioScheduler::new()))
    }

    /// Create a dispatcher with a custom [`Scheduler`].
    pub fn with_scheduler(config: Config, scheduler: Rc<dyn Scheduler>) -> Self {
        let inner = Rc::new_cyclic(|weak: &Weak<Inner<T>>| {
            let weak = weak.clone();
            Inner {
                config,
                scheduler,
                relay_callback: Callback::new(move |_, event, _| match weak.upgrade() {
                    Some(inner) => EventDispatcher { inner }.dispatch(event.clone()),
                    None => Ok(()),
                }),
                relay_scope: Scope::new(),
                state: RefCell::new(State::default()),
                in_flight: InFlight::default(),
            }
        });
        Self { inner }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Separator used to join keyed event types.
    pub fn separator(&self) -> &str {
        self.inner.config.separator()
    }

    /// Register `callback` with `scope`, or update an existing registration.
    ///
    /// For an existing `(callback, scope)` pair the options are replaced
    /// first (unless `options` is `None`) and the event types are then
    /// merged into the registration. A registration for every type stays
    /// one; explicit exclusions for the given types are lifted.
    pub fn subscribe(
        &self,
        callback: &Callback<T>,
        scope: &Scope,
        event_type: Option<TypeExpr>,
        options: Option<ListenerOptions>,
    ) {
        let types = normalize_interest(event_type.as_ref(), self.separator());
        let mut state = self.inner.state.borrow_mut();
        match state.registry.find(callback, scope) {
            Some(id) => {
                state.registry.update(id, types.as_deref(), options);
                tracing::debug!(listener = id, event_type = ?types, "Listener updated");
            }
            None if types.as_ref().is_some_and(Vec::is_empty) => {
                tracing::debug!("Ignoring listener without event types");
            }
            None => {
                let id = state.registry.insert(
                    callback.clone(),
                    scope.clone(),
                    types.as_deref(),
                    options,
                );
                tracing::debug!(listener = id, event_type = ?types, "Listener added");
            }
        }
    }

    /// Register every listener, last to first.
    ///
    /// Listeners of equal priority are therefore notified in slice order.
    pub fn subscribe_all(&self, listeners: &[Listener<T>]) {
        for l in listeners.iter().rev() {
            self.subscribe(&l.callback, &l.scope, l.event_type.clone(), l.options.clone());
        }
    }

    /// Remove a registration, or with `event_type` stop listening to those types.
    ///
    /// A registration is removed once it no longer listens to anything. A
    /// registration for every type is only narrowed by `event_type`: the
    /// given types are excluded and it keeps receiving the rest.
    pub fn unsubscribe(&self, callback: &Callback<T>, scope: &Scope, event_type: Option<TypeExpr>) {
        let types = normalize_interest(event_type.as_ref(), self.separator());
        let removed = {
            let mut state = self.inner.state.borrow_mut();
            let Some(id) = state.registry.find(callback, scope) else {
                return;
            };
            match &types {
                None => state.registry.remove(id),
                Some(types) => {
                    let removed = state.registry.deny(id, Some(types.as_slice()));
                    if removed.is_none() {
                        tracing::debug!(listener = id, event_type = ?types, "Listener narrowed");
                    }
                    removed
                }
            }
        };
        if let Some(record) = removed {
            self.release(vec![record]);
        }
    }

    pub fn unsubscribe_all(&self, listeners: &[Listener<T>]) {
        for l in listeners {
            self.unsubscribe(&l.callback, &l.scope, l.event_type.clone());
        }
    }

    pub fn has_listener(&self, callback: &Callback<T>, scope: &Scope) -> bool {
        self.inner.state.borrow().registry.find(callback, scope).is_some()
    }

    pub fn has_listeners(&self) -> bool {
        !self.inner.state.borrow().registry.is_empty()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.state.borrow().registry.len()
    }

    /// Deliver `event` to every listener interested in its type.
    ///
    /// Returns immediately when this dispatcher is already dispatching the
    /// same `Rc`. While suspended, non-cancellable events are queued or
    /// dropped instead.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by an immediate listener; listeners
    /// after it are not notified. Errors from deferred, delayed and
    /// buffered listeners are logged.
    ///
    /// # Panics
    ///
    /// Panics if the [`Scheduler`] does when a deferred, delayed or buffered
    /// listener matches. [`TokioScheduler`], used by [`new`](Self::new) and
    /// `default`, panics outside a [`LocalSet`](tokio::task::LocalSet).
    pub fn dispatch(&self, event: Rc<Event<T>>) -> Result {
        if self.inner.in_flight.contains(&event) {
            tracing::trace!(event_id = %event.id(), "Event already in flight");
            return Ok(());
        }

        {
            let mut state = self.inner.state.borrow_mut();
            if state.suspend_depth > 0 && !event.is_cancellable() {
                if state.queue_suspended {
                    tracing::debug!(event_id = %event.id(), "Event queued while suspended");
                    state.queue.push_back(event);
                } else {
                    tracing::debug!(event_id = %event.id(), "Event dropped while suspended");
                }
                return Ok(());
            }
        }

        let types = event.event_type().normalize(self.separator());
        let matched: Vec<ListenerId> = self
            .inner
            .state
            .borrow()
            .registry
            .matching(&types)
            .into_iter()
            .map(ListenerHelper::id)
            .collect();
        if matched.is_empty() {
            return Ok(());
        }

        tracing::trace!(event_id = %event.id(), event_type = ?types, listeners = matched.len(), "Dispatching");
        let _guard = self.inner.in_flight.push(&event);
        for id in matched {
            self.deliver(id, &event, &types)?;
        }
        Ok(())
    }

    fn deliver(&self, id: ListenerId, event: &Rc<Event<T>>, types: &[String]) -> Result {
        // earlier listeners may have changed the registry
        let delivery = {
            let state = self.inner.state.borrow();
            match state.registry.get(id) {
                Some(record) if record.will_dispatch(types) => Delivery::of(record),
                _ => return Ok(()),
            }
        };

        match delivery.policy {
            DeliveryPolicy::Immediate => self.call_now(delivery, event),
            DeliveryPolicy::Deferred | DeliveryPolicy::Delayed(_) => {
                self.schedule_call(delivery, event);
                Ok(())
            }
            DeliveryPolicy::Buffered(window) => {
                self.schedule_buffered(id, window, event, types);
                Ok(())
            }
        }
    }

    /// Run an immediate listener. A single listener is taken out of the
    /// registry for the duration of the call, so nested dispatches cannot
    /// reach it, and is put back if the call fails.
    fn call_now(&self, delivery: Delivery<T>, event: &Rc<Event<T>>) -> Result {
        let taken = if delivery.single {
            self.inner.state.borrow_mut().registry.remove(delivery.id)
        } else {
            None
        };

        tracing::trace!(event_id = %event.id(), listener = delivery.id, "Delivering");
        match delivery.call(event) {
            Ok(()) => {
                if let Some(record) = taken {
                    self.release(vec![record]);
                }
                Ok(())
            }
            Err(e) => {
                if let Some(record) = taken {
                    if !self.inner.state.borrow_mut().registry.restore(record) {
                        tracing::debug!(
                            listener = delivery.id,
                            "Single listener was registered again during its call"
                        );
                    }
                }
                Err(e)
            }
        }
    }

    fn schedule_call(&self, delivery: Delivery<T>, event: &Rc<Event<T>>) {
        let delay = delivery.policy.delay();
        let (id, single) = (delivery.id, delivery.single);
        let event_id = event.id();
        let event = event.clone();
        self.inner.scheduler.schedule(
            delay,
            Box::new(move || {
                tracing::trace!(event_id = %event.id(), listener = delivery.id, "Delivering scheduled");
                if let Err(e) = delivery.call(&event) {
                    tracing::error!(
                        event_id = %event.id(),
                        listener = delivery.id,
                        error = %e,
                        "Scheduled listener failed"
                    );
                }
            }),
        );
        tracing::trace!(event_id = %event_id, listener = id, ?delay, "Delivery scheduled");

        if single {
            self.remove_listener(id);
        }
    }

    fn schedule_buffered(
        &self,
        id: ListenerId,
        window: Duration,
        event: &Rc<Event<T>>,
        types: &[String],
    ) {
        let key = types.to_vec();

        let previous = {
            let mut state = self.inner.state.borrow_mut();
            state
                .registry
                .get_mut(id)
                .and_then(|record| record.pending.remove(&key))
        };
        if let Some(handle) = previous {
            self.inner.scheduler.cancel(handle);
            tracing::trace!(listener = id, ?key, %handle, "Buffered event replaced");
        }

        let weak = Rc::downgrade(&self.inner);
        let task_key = key.clone();
        let task_event = event.clone();
        let handle = self.inner.scheduler.schedule(
            window,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    EventDispatcher { inner }.fire_buffered(id, &task_key, &task_event);
                }
            }),
        );

        let mut state = self.inner.state.borrow_mut();
        if let Some(record) = state.registry.get_mut(id) {
            record.pending.insert(key, handle);
        }
        tracing::trace!(event_id = %event.id(), listener = id, ?window, %handle, "Delivery buffered");
    }

    fn fire_buffered(&self, id: ListenerId, key: &[String], event: &Rc<Event<T>>) {
        let delivery = {
            let mut state = self.inner.state.borrow_mut();
            let Some(record) = state.registry.get_mut(id) else {
                return;
            };
            record.pending.remove(key);
            Delivery::of(record)
        };

        tracing::trace!(event_id = %event.id(), listener = id, "Delivering buffered");
        match delivery.call(event) {
            Ok(()) if delivery.single => self.remove_listener(id),
            Ok(()) => {}
            Err(e) => {
                tracing::error!(event_id = %event.id(), listener = id, error = %e, "Buffered listener failed");
            }
        }
    }

    fn remove_listener(&self, id: ListenerId) {
        let removed = self.inner.state.borrow_mut().registry.remove(id);
        if let Some(record) = removed {
            self.release(vec![record]);
        }
    }

    /// Cancel pending buffer timers of removed records.
    fn release(&self, removed: Vec<ListenerHelper<T>>) {
        for record in &removed {
            for handle in record.pending.values() {
                self.inner.scheduler.cancel(*handle);
            }
            tracing::debug!(listener = record.id(), "Listener removed");
        }
    }

    /// Whether an event of `event_type` would currently reach any listener.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEventType`] for `None` or an expression
    /// without any type, such as an empty list.
    pub fn will_dispatch(&self, event_type: Option<&TypeExpr>) -> Result<bool> {
        let types = event_type.map(|t| t.normalize(self.separator())).unwrap_or_default();
        if types.is_empty() {
            tracing::warn!(?event_type, "will_dispatch called without an event type");
            return Err(Error::InvalidEventType);
        }
        Ok(self.inner.state.borrow().registry.any_matching(&types))
    }

    /// Hold back non-cancellable events until a matching [`resume`](Self::resume).
    ///
    /// Calls nest. Held events are queued if any nested call asked for
    /// `queue`, and dropped otherwise.
    pub fn suspend(&self, queue: bool) {
        let mut state = self.inner.state.borrow_mut();
        state.suspend_depth += 1;
        state.queue_suspended |= queue;
        tracing::debug!(depth = state.suspend_depth, queue = state.queue_suspended, "Suspended");
    }

    /// Undo one [`suspend`](Self::suspend). Once fully resumed the queued
    /// events are dispatched in order.
    ///
    /// An unmatched call is ignored.
    ///
    /// # Errors
    ///
    /// Returns the first listener error raised while draining the queue.
    /// Events not yet dispatched stay queued for the next `resume`.
    pub fn resume(&self) -> Result {
        {
            let mut state = self.inner.state.borrow_mut();
            state.suspend_depth = state.suspend_depth.saturating_sub(1);
            tracing::debug!(depth = state.suspend_depth, queued = state.queue.len(), "Resumed");
        }

        let drained = self.drain_queue();

        let mut state = self.inner.state.borrow_mut();
        if state.suspend_depth == 0 {
            state.queue_suspended = false;
        }
        drained
    }

    fn drain_queue(&self) -> Result {
        loop {
            let next = {
                let mut state = self.inner.state.borrow_mut();
                if state.suspend_depth > 0 {
                    return Ok(());
                }
                state.queue.pop_front()
            };
            match next {
                Some(event) => self.dispatch(event)?,
                None => return Ok(()),
            }
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.inner.state.borrow().suspend_depth > 0
    }

    /// Number of events held back by a queueing suspension.
    pub fn queued_len(&self) -> usize {
        self.inner.state.borrow().queue.len()
    }

    /// Re-dispatch the events of `other` on this dispatcher.
    ///
    /// `event_type` and `options` apply to the forwarding registration on
    /// `other`, e.g. to relay a subset of types or with a delay. Relaying a
    /// dispatcher that is already relayed changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SelfRelay`] when `other` is this dispatcher.
    pub fn relay(
        &self,
        other: &EventDispatcher<T>,
        event_type: Option<TypeExpr>,
        options: Option<ListenerOptions>,
    ) -> Result {
        if self == other {
            tracing::warn!("Dispatcher asked to relay itself");
            return Err(Error::SelfRelay);
        }
        if self.relayed(other) {
            return Ok(());
        }
        // `other` may have dropped the forwarding listener on its own
        self.forget_upstream(other);

        other.subscribe(&self.inner.relay_callback, &self.inner.relay_scope, event_type, options);
        self.inner
            .state
            .borrow_mut()
            .upstream
            .push(Rc::downgrade(&other.inner));
        tracing::debug!(upstream = ?other, "Relaying");
        Ok(())
    }

    pub fn relay_all<'a>(
        &self,
        others: impl IntoIterator<Item = &'a EventDispatcher<T>>,
        event_type: Option<TypeExpr>,
        options: Option<ListenerOptions>,
    ) -> Result {
        for other in others {
            self.relay(other, event_type.clone(), options.clone())?;
        }
        Ok(())
    }

    /// Whether `other` is relayed and still holds the forwarding listener.
    pub fn relayed(&self, other: &EventDispatcher<T>) -> bool {
        self.upstream_position(other).is_some()
            && other.has_listener(&self.inner.relay_callback, &self.inner.relay_scope)
    }

    fn forget_upstream(&self, other: &EventDispatcher<T>) {
        if let Some(pos) = self.upstream_position(other) {
            self.inner.state.borrow_mut().upstream.remove(pos);
        }
    }

    fn upstream_position(&self, other: &EventDispatcher<T>) -> Option<usize> {
        let target = Rc::as_ptr(&other.inner);
        self.inner
            .state
            .borrow()
            .upstream
            .iter()
            .position(|w| std::ptr::eq(w.as_ptr(), target))
    }

    /// Stop relaying `other`, or with `event_type` only those types.
    ///
    /// `other` stays relayed while the forwarding registration still
    /// listens to some type.
    pub fn unrelay(&self, other: &EventDispatcher<T>, event_type: Option<TypeExpr>) {
        if self.upstream_position(other).is_none() {
            return;
        }
        other.unsubscribe(&self.inner.relay_callback, &self.inner.relay_scope, event_type);
        if !other.has_listener(&self.inner.relay_callback, &self.inner.relay_scope) {
            self.forget_upstream(other);
            tracing::debug!(upstream = ?other, "Unrelayed");
        }
    }

    pub fn unrelay_all<'a>(
        &self,
        others: impl IntoIterator<Item = &'a EventDispatcher<T>>,
        event_type: Option<TypeExpr>,
    ) {
        for other in others {
            self.unrelay(other, event_type.clone());
        }
    }

    /// Remove every listener, relay and queued event.
    pub fn purge(&self) {
        self.purge_listeners(None);
        self.purge_dispatchers();
        self.purge_queue();
    }

    /// Remove every listener, or only those registered with `scope`.
    pub fn purge_listeners(&self, scope: Option<&Scope>) {
        let removed = self.inner.state.borrow_mut().registry.drain(scope);
        if !removed.is_empty() {
            tracing::debug!(count = removed.len(), "Listeners purged");
        }
        self.release(removed);
    }

    /// Stop relaying every dispatcher.
    pub fn purge_dispatchers(&self) {
        let upstream = std::mem::take(&mut self.inner.state.borrow_mut().upstream);
        for inner in upstream.iter().filter_map(Weak::upgrade) {
            EventDispatcher { inner }.unsubscribe(
                &self.inner.relay_callback,
                &self.inner.relay_scope,
                None,
            );
        }
    }

    /// Discard events held by a queueing suspension.
    pub fn purge_queue(&self) {
        self.inner.state.borrow_mut().queue.clear();
    }
}

impl<T: 'static> Default for EventDispatcher<T> {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl<T: 'static> Clone for EventDispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: 'static> PartialEq for EventDispatcher<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: 'static> Eq for EventDispatcher<T> {}

impl<T: 'static> fmt::Debug for EventDispatcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("EventDispatcher");
        d.field("ptr", &Rc::as_ptr(&self.inner));
        match self.inner.state.try_borrow() {
            Ok(state) => d
                .field("listeners", &state.registry.len())
                .field("relayed", &state.upstream.len())
                .field("suspend_depth", &state.suspend_depth)
                .field("queued", &state.queue.len())
                .finish(),
            Err(_) => d.finish_non_exhaustive(),
        }
    }
}

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    fmt,
    rc::Rc,
    time::Duration,
};

use tokio::task::AbortHandle;

/// A unit of deferred work handed to a [`Scheduler`].
pub type Task = Box<dyn FnOnce() + 'static>;

/// Identifies a scheduled task so it can be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

/// Runs listener deliveries outside of the dispatching call stack.
///
/// The dispatcher uses it for deferred (zero delay), delayed and buffered
/// listeners. Buffered deliveries are cancelled by handle when a newer event
/// replaces them; deferred and delayed ones are never cancelled.
///
/// Implementations must not run `task` from inside `schedule`: the
/// dispatcher records the returned handle after `schedule` returns.
///
/// See [`TokioScheduler`] for the runtime-backed implementation and
/// `testing::ManualScheduler` (feature `test-harness`) for a virtual clock.
pub trait Scheduler {
    /// Run `task` once `delay` has elapsed; a zero delay means the next turn.
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle;

    /// Prevent a scheduled task from running. Unknown or finished handles are ignored.
    fn cancel(&self, handle: TimerHandle);
}

/// [`Scheduler`] backed by Tokio timers on the current thread.
///
/// Tasks are spawned with [`tokio::task::spawn_local`], so the dispatcher
/// must be used from within a [`tokio::task::LocalSet`]:
///
/// ```rust,ignore
/// let local = tokio::task::LocalSet::new();
/// local.run_until(async {
///     let dispatcher = EventDispatcher::<()>::default();
///     // subscribe, dispatch ...
/// }).await;
/// ```
///
/// # Panics
///
/// `schedule` panics when called outside of a `LocalSet`.
#[derive(Default)]
pub struct TokioScheduler {
    next_id: Cell<u64>,
    tasks: Rc<RefCell<HashMap<TimerHandle, AbortHandle>>>,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks scheduled and not yet finished or cancelled.
    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle {
        let handle = TimerHandle::new(self.next_id.get());
        self.next_id.set(handle.value() + 1);

        let tasks = self.tasks.clone();
        let join = tokio::task::spawn_local(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            tasks.borrow_mut().remove(&handle);
            task();
        });
        self.tasks.borrow_mut().insert(handle, join.abort_handle());
        handle
    }

    fn cancel(&self, handle: TimerHandle) {
        if let Some(abort) = self.tasks.borrow_mut().remove(&handle) {
            abort.abort();
        }
    }
}

impl fmt::Debug for TokioScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokioScheduler")
            .field("next_id", &self.next_id.get())
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn runs_after_delay() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let scheduler = TokioScheduler::new();
                let fired = Rc::new(Cell::new(0));
                let f = fired.clone();
                scheduler.schedule(Duration::from_millis(100), Box::new(move || f.set(f.get() + 1)));
                assert_eq!(scheduler.pending(), 1);

                tokio::time::sleep(Duration::from_millis(60)).await;
                assert_eq!(fired.get(), 0);

                tokio::time::sleep(Duration::from_millis(60)).await;
                assert_eq!(fired.get(), 1);
                assert_eq!(scheduler.pending(), 0);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn zero_delay_runs_on_next_turn() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let scheduler = TokioScheduler::new();
                let fired = Rc::new(Cell::new(false));
                let f = fired.clone();
                scheduler.schedule(Duration::ZERO, Box::new(move || f.set(true)));
                assert!(!fired.get());

                tokio::task::yield_now().await;
                tokio::time::sleep(Duration::from_millis(1)).await;
                assert!(fired.get());
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_task_never_runs() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let scheduler = TokioScheduler::new();
                let fired = Rc::new(Cell::new(false));
                let f = fired.clone();
                let handle =
                    scheduler.schedule(Duration::from_millis(10), Box::new(move || f.set(true)));
                scheduler.cancel(handle);
                scheduler.cancel(handle);

                tokio::time::sleep(Duration::from_millis(50)).await;
                assert!(!fired.get());
                assert_eq!(scheduler.pending(), 0);
            })
            .await;
    }
}

use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    fmt,
    time::Duration,
};

use crate::{Scheduler, Task, TimerHandle};

/// A [`Scheduler`] driven by a virtual clock.
///
/// Nothing runs until the test moves time forward with
/// [`advance`](Self::advance) or flushes due work with
/// [`run_pending`](Self::run_pending). Tasks run in deadline order, ties in
/// scheduling order. Tasks scheduled while advancing run in the same call
/// if their deadline falls inside the advanced window.
///
/// # Example
///
/// ```rust
/// use std::{cell::Cell, rc::Rc, time::Duration};
/// use event_dispatch::{Scheduler, testing::ManualScheduler};
///
/// let scheduler = ManualScheduler::new();
/// let fired = Rc::new(Cell::new(false));
/// let f = fired.clone();
/// scheduler.schedule(Duration::from_millis(10), Box::new(move || f.set(true)));
///
/// scheduler.advance(Duration::from_millis(9));
/// assert!(!fired.get());
/// scheduler.advance(Duration::from_millis(1));
/// assert!(fired.get());
/// ```
#[derive(Default)]
pub struct ManualScheduler {
    now: Cell<Duration>,
    next_id: Cell<u64>,
    queue: RefCell<BTreeMap<(Duration, TimerHandle), Task>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since creation.
    pub fn now(&self) -> Duration {
        self.now.get()
    }

    /// Number of tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Move the clock forward by `by`, running every task that becomes due.
    ///
    /// Returns the number of tasks run.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now.get() + by;
        let mut ran = 0;
        loop {
            let next = {
                let mut queue = self.queue.borrow_mut();
                match queue.first_key_value() {
                    Some((&(deadline, _), _)) if deadline <= target => queue.pop_first(),
                    _ => None,
                }
            };
            let Some(((deadline, _), task)) = next else {
                break;
            };
            self.now.set(deadline);
            task();
            ran += 1;
        }
        self.now.set(target);
        ran
    }

    /// Run every task that is due without moving the clock.
    pub fn run_pending(&self) -> usize {
        self.advance(Duration::ZERO)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle {
        let handle = TimerHandle::new(self.next_id.get());
        self.next_id.set(handle.value() + 1);
        self.queue
            .borrow_mut()
            .insert((self.now.get() + delay, handle), task);
        handle
    }

    fn cancel(&self, handle: TimerHandle) {
        self.queue.borrow_mut().retain(|(_, h), _| *h != handle);
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("now", &self.now.get())
            .field("pending", &self.pending())
            .finish()
    }
}

use std::{cell::RefCell, rc::Rc};

use crate::Event;

/// Events currently being dispatched by one dispatcher.
pub(crate) struct InFlight<T> {
    stack: RefCell<Vec<Rc<Event<T>>>>,
}

impl<T> Default for InFlight<T> {
    fn default() -> Self {
        Self {
            stack: RefCell::new(Vec::new()),
        }
    }
}

impl<T> InFlight<T> {
    pub fn contains(&self, event: &Rc<Event<T>>) -> bool {
        self.stack.borrow().iter().any(|e| Rc::ptr_eq(e, event))
    }

    /// Mark `event` as in flight until the returned guard is dropped.
    pub fn push(&self, event: &Rc<Event<T>>) -> InFlightGuard<'_, T> {
        self.stack.borrow_mut().push(event.clone());
        InFlightGuard { in_flight: self }
    }

    #[cfg(test)]
    pub fn depth(&self) -> usize {
        self.stack.borrow().len()
    }
}

pub(crate) struct InFlightGuard<'a, T> {
    in_flight: &'a InFlight<T>,
}

impl<T> Drop for InFlightGuard<'_, T> {
    fn drop(&mut self) {
        self.in_flight.stack.borrow_mut().pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_pops_on_drop() {
        let in_flight = InFlight::default();
        let a = Rc::new(Event::new("a", (), false));
        let b = Rc::new(Event::new("a", (), false));
        {
            let _outer = in_flight.push(&a);
            assert!(in_flight.contains(&a));
            assert!(!in_flight.contains(&b));
            {
                let _inner = in_flight.push(&b);
                assert_eq!(in_flight.depth(), 2);
            }
            assert!(!in_flight.contains(&b));
        }
        assert_eq!(in_flight.depth(), 0);
    }

    #[test]
    fn guard_pops_on_early_return() {
        fn fails(in_flight: &InFlight<()>, event: &Rc<Event<()>>) -> Result<(), ()> {
            let _guard = in_flight.push(event);
            Err(())
        }

        let in_flight = InFlight::default();
        let event = Rc::new(Event::new("a", (), false));
        assert!(fails(&in_flight, &event).is_err());
        assert!(!in_flight.contains(&event));
    }
}

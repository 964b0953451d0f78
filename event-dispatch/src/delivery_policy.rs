use std::{fmt, time::Duration};

/// How a listener receives the events matched for it.
///
/// Derived from [`ListenerOptions`](crate::ListenerOptions) with the
/// precedence `buffer` > `delay` > `defer` > immediate. Only the immediate
/// policy runs inside [`dispatch`](crate::EventDispatcher::dispatch); the
/// others hand a task to the dispatcher's [`Scheduler`](crate::Scheduler).
///
/// # Policies
///
/// | Policy | Delivery | Repeated dispatch |
/// |--------|----------|-------------------|
/// | [`Immediate`](Self::Immediate) | synchronously, in priority order | one call per dispatch |
/// | [`Deferred`](Self::Deferred) | next scheduler turn | one call per dispatch |
/// | [`Delayed`](Self::Delayed) | after the duration | one call per dispatch |
/// | [`Buffered`](Self::Buffered) | after the duration of quiet | only the latest event per type set |
///
/// Buffering is a debounce: every dispatch for the same normalized type set
/// restarts the timer and replaces the held event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum DeliveryPolicy {
    #[default]
    Immediate,
    Deferred,
    Delayed(Duration),
    Buffered(Duration),
}

impl DeliveryPolicy {
    /// Returns `true` if this is the [`Immediate`](Self::Immediate) policy.
    pub fn is_immediate(&self) -> bool {
        matches!(self, DeliveryPolicy::Immediate)
    }

    /// Returns `true` if this is the [`Buffered`](Self::Buffered) policy.
    pub fn is_buffered(&self) -> bool {
        matches!(self, DeliveryPolicy::Buffered(_))
    }

    /// Delay before the listener runs; zero for immediate and deferred.
    pub fn delay(&self) -> Duration {
        match self {
            DeliveryPolicy::Immediate | DeliveryPolicy::Deferred => Duration::ZERO,
            DeliveryPolicy::Delayed(d) | DeliveryPolicy::Buffered(d) => *d,
        }
    }
}

impl fmt::Display for DeliveryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryPolicy::Immediate => write!(f, "Immediate"),
            DeliveryPolicy::Deferred => write!(f, "Deferred"),
            DeliveryPolicy::Delayed(d) => write!(f, "Delayed({d:?})"),
            DeliveryPolicy::Buffered(d) => write!(f, "Buffered({d:?})"),
        }
    }
}

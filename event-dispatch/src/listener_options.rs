use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::DeliveryPolicy;

/// Per-listener delivery options.
///
/// Use the builder methods, or [`Default`] for an immediate listener with
/// priority `0`. Passing options to
/// [`subscribe`](crate::EventDispatcher::subscribe) for an existing listener
/// replaces its options wholesale.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use event_dispatch::{DeliveryPolicy, ListenerOptions};
///
/// let options = ListenerOptions::default()
///     .with_priority(10)                          // runs before priority 0
///     .with_buffer(Duration::from_millis(100))    // debounce bursts
///     .with_delay(Duration::from_millis(5));       // ignored, buffer wins
///
/// assert_eq!(options.delivery_policy(), DeliveryPolicy::Buffered(Duration::from_millis(100)));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenerOptions {
    /// Remove the listener after its first delivery.
    /// For buffered listeners removal happens when the buffer fires.
    /// Default: false
    pub single: bool,

    /// Debounce window. Zero counts as unset.
    /// Default: None
    pub buffer: Option<Duration>,

    /// Delay before each delivery. Ignored when `buffer` is set.
    /// Default: None
    pub delay: Option<Duration>,

    /// Deliver on the next scheduler turn. Ignored when `buffer` or `delay` is set.
    /// Default: false
    pub defer: bool,

    /// Higher priorities are notified first.
    /// Default: 0
    pub priority: i32,

    /// Passed to the listener on every call.
    /// Default: None
    pub extra: Option<Value>,
}

impl ListenerOptions {
    pub fn with_single(mut self, single: bool) -> Self {
        self.single = single;
        self
    }

    pub fn with_buffer(mut self, window: Duration) -> Self {
        self.buffer = Some(window);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_defer(mut self, defer: bool) -> Self {
        self.defer = defer;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_extra(mut self, extra: impl Into<Value>) -> Self {
        self.extra = Some(extra.into());
        self
    }

    /// Resolve the effective delivery policy.
    pub fn delivery_policy(&self) -> DeliveryPolicy {
        let positive = |d: Option<Duration>| d.filter(|d| !d.is_zero());
        if let Some(window) = positive(self.buffer) {
            DeliveryPolicy::Buffered(window)
        } else if let Some(delay) = positive(self.delay) {
            DeliveryPolicy::Delayed(delay)
        } else if self.defer {
            DeliveryPolicy::Deferred
        } else {
            DeliveryPolicy::Immediate
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_immediate() {
        let options = ListenerOptions::default();
        assert_eq!(options.delivery_policy(), DeliveryPolicy::Immediate);
        assert_eq!(options.priority, 0);
        assert!(!options.single);
    }

    #[test]
    fn precedence_buffer_delay_defer() {
        let ms = Duration::from_millis;
        let all = ListenerOptions::default()
            .with_defer(true)
            .with_delay(ms(20))
            .with_buffer(ms(10));
        assert_eq!(all.delivery_policy(), DeliveryPolicy::Buffered(ms(10)));

        let delay_defer = ListenerOptions::default().with_defer(true).with_delay(ms(20));
        assert_eq!(delay_defer.delivery_policy(), DeliveryPolicy::Delayed(ms(20)));

        let defer = ListenerOptions::default().with_defer(true);
        assert_eq!(defer.delivery_policy(), DeliveryPolicy::Deferred);
    }

    #[test]
    fn zero_durations_count_as_unset() {
        let options = ListenerOptions::default()
            .with_buffer(Duration::ZERO)
            .with_delay(Duration::ZERO);
        assert_eq!(options.delivery_policy(), DeliveryPolicy::Immediate);
    }

    #[test]
    fn deserializes_partial_json() {
        let options: ListenerOptions =
            serde_json::from_str(r#"{"priority": 5, "single": true, "extra": {"tag": "x"}}"#).unwrap();
        assert_eq!(options.priority, 5);
        assert!(options.single);
        assert_eq!(options.extra, Some(serde_json::json!({"tag": "x"})));
        assert_eq!(options.delivery_policy(), DeliveryPolicy::Immediate);
    }

    #[test]
    fn policy_display() {
        assert_eq!(DeliveryPolicy::Deferred.to_string(), "Deferred");
        assert_eq!(
            DeliveryPolicy::Delayed(Duration::from_millis(5)).to_string(),
            "Delayed(5ms)"
        );
        assert_eq!(DeliveryPolicy::Buffered(Duration::from_secs(1)).delay(), Duration::from_secs(1));
    }
}

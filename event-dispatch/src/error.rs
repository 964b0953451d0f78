use std::sync::Arc;

/// The single error type for all dispatcher operations.
///
/// Every fallible API returns `event_dispatch::Result<T>` (alias for
/// `Result<T, event_dispatch::Error>`). Errors raised by listener callbacks
/// are wrapped in [`Error::Listener`] so that a failing listener aborts the
/// dispatch and surfaces to the caller of
/// [`dispatch`](crate::EventDispatcher::dispatch) as one error type.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// `will_dispatch` was asked about no event type at all.
    #[error("Event type can't be empty")]
    InvalidEventType,

    #[error("Dispatcher can't relay its own events")]
    SelfRelay,

    #[error("Listener failed: {0}")]
    Listener(#[source] Arc<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wrap an error produced inside a listener callback.
    pub fn listener(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::Listener(Arc::new(e))
    }

    /// Returns `true` if the error was raised by a listener callback.
    pub fn is_listener(&self) -> bool {
        matches!(self, Error::Listener(_))
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidEventType, Self::InvalidEventType) => true,
            (Self::SelfRelay, Self::SelfRelay) => true,
            (Self::Listener(a), Self::Listener(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::listener(e)
    }
}

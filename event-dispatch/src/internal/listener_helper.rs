use std::collections::{BTreeSet, HashMap};

use serde_json::Value;

use crate::{Callback, DeliveryPolicy, ListenerOptions, Scope, TimerHandle};

/// Registration order; doubles as the record key.
pub(crate) type ListenerId = u64;

/// Which event types a record listens to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Interest {
    /// Every type except the denied ones.
    All { deny: BTreeSet<String> },
    /// Exactly these types.
    Only(BTreeSet<String>),
}

impl Interest {
    fn from_types(types: Option<&[String]>) -> Self {
        match types {
            None => Interest::All {
                deny: BTreeSet::new(),
            },
            Some(types) => Interest::Only(types.iter().cloned().collect()),
        }
    }
}

/// Index changes produced by an interest update.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct TypeDiff {
    pub added: Vec<String>,
    pub added_all: bool,
    pub removed: Vec<String>,
    pub removed_all: bool,
}

impl TypeDiff {
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && !self.added_all && self.removed.is_empty() && !self.removed_all
    }
}

/// One registration: a `(callback, scope)` pair with its interest,
/// options and pending buffer timers.
pub(crate) struct ListenerHelper<T> {
    id: ListenerId,
    callback: Callback<T>,
    scope: Scope,
    interest: Interest,
    options: ListenerOptions,
    pub(crate) pending: HashMap<Vec<String>, TimerHandle>,
}

impl<T> ListenerHelper<T> {
    pub fn new(
        id: ListenerId,
        callback: Callback<T>,
        scope: Scope,
        types: Option<&[String]>,
        options: Option<ListenerOptions>,
    ) -> Self {
        Self {
            id,
            callback,
            scope,
            interest: Interest::from_types(types),
            options: options.unwrap_or_default(),
            pending: HashMap::new(),
        }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn callback(&self) -> &Callback<T> {
        &self.callback
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn is(&self, callback: &Callback<T>, scope: &Scope) -> bool {
        self.callback == *callback && self.scope == *scope
    }

    #[cfg(test)]
    pub fn interest(&self) -> &Interest {
        &self.interest
    }

    /// Concrete types this record is indexed under; `None` for the catch-all bucket.
    pub fn indexed_types(&self) -> Option<Vec<String>> {
        match &self.interest {
            Interest::All { .. } => None,
            Interest::Only(allow) => Some(allow.iter().cloned().collect()),
        }
    }

    pub fn has_event_types(&self) -> bool {
        match &self.interest {
            Interest::All { .. } => true,
            Interest::Only(allow) => !allow.is_empty(),
        }
    }

    /// Replace options; `None` keeps the current ones.
    pub fn set_options(&mut self, options: Option<ListenerOptions>) {
        if let Some(options) = options {
            self.options = options;
        }
    }

    pub fn priority(&self) -> i32 {
        self.options.priority
    }

    pub fn single(&self) -> bool {
        self.options.single
    }

    pub fn policy(&self) -> DeliveryPolicy {
        self.options.delivery_policy()
    }

    pub fn extra(&self) -> Option<&Value> {
        self.options.extra.as_ref()
    }

    /// Widen the interest. `None` means every type.
    pub fn allow_event_type(&mut self, types: Option<&[String]>) -> TypeDiff {
        let mut diff = TypeDiff::default();
        match (&mut self.interest, types) {
            (Interest::All { deny }, None) => deny.clear(),
            (Interest::All { deny }, Some(types)) => {
                for t in types {
                    deny.remove(t);
                }
            }
            (Interest::Only(allow), None) => {
                diff.added_all = true;
                diff.removed = std::mem::take(allow).into_iter().collect();
                self.interest = Interest::All {
                    deny: BTreeSet::new(),
                };
            }
            (Interest::Only(allow), Some(types)) => {
                for t in types {
                    if allow.insert(t.clone()) {
                        diff.added.push(t.clone());
                    }
                }
            }
        }
        diff
    }

    /// Narrow the interest. `None` means every type, leaving nothing.
    ///
    /// A record that listens to everything keeps doing so for the types
    /// not denied; it only becomes empty through `None`.
    pub fn deny_event_type(&mut self, types: Option<&[String]>) -> TypeDiff {
        let mut diff = TypeDiff::default();
        match (&mut self.interest, types) {
            (Interest::All { .. }, None) => {
                diff.removed_all = true;
                self.interest = Interest::Only(BTreeSet::new());
            }
            (Interest::All { deny }, Some(types)) => {
                deny.extend(types.iter().cloned());
            }
            (Interest::Only(allow), None) => {
                diff.removed = std::mem::take(allow).into_iter().collect();
            }
            (Interest::Only(allow), Some(types)) => {
                for t in types {
                    if allow.remove(t) {
                        diff.removed.push(t.clone());
                    }
                }
            }
        }
        diff
    }

    /// Whether any of the normalized `types` passes this record's interest.
    pub fn will_dispatch(&self, types: &[String]) -> bool {
        match &self.interest {
            Interest::All { deny } => deny.is_empty() || types.iter().any(|t| !deny.contains(t)),
            Interest::Only(allow) => types.iter().any(|t| allow.contains(t)),
        }
    }
}

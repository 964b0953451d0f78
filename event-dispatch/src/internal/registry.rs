use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::{ListenerHelper, ListenerId, TypeDiff};
use crate::{Callback, ListenerOptions, Scope};

/// Listener records of one dispatcher plus the indexes used to find them.
///
/// Records listening to concrete types are indexed per type; records
/// listening to everything sit in `catch_all`. Interest changes only touch
/// the index entries named by the returned [`TypeDiff`].
pub(crate) struct Registry<T> {
    records: BTreeMap<ListenerId, ListenerHelper<T>>,
    by_type: HashMap<String, BTreeSet<ListenerId>>,
    catch_all: BTreeSet<ListenerId>,
    next_id: ListenerId,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            records: BTreeMap::new(),
            by_type: HashMap::new(),
            catch_all: BTreeSet::new(),
            next_id: 0,
        }
    }
}

impl<T> Registry<T> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: ListenerId) -> Option<&ListenerHelper<T>> {
        self.records.get(&id)
    }

    pub fn get_mut(&mut self, id: ListenerId) -> Option<&mut ListenerHelper<T>> {
        self.records.get_mut(&id)
    }

    pub fn find(&self, callback: &Callback<T>, scope: &Scope) -> Option<ListenerId> {
        self.records
            .values()
            .find(|r| r.is(callback, scope))
            .map(ListenerHelper::id)
    }

    pub fn insert(
        &mut self,
        callback: Callback<T>,
        scope: Scope,
        types: Option<&[String]>,
        options: Option<ListenerOptions>,
    ) -> ListenerId {
        let id = self.next_id;
        self.next_id += 1;

        self.index(ListenerHelper::new(id, callback, scope, types, options));
        id
    }

    /// Put back a record taken out with [`remove`](Self::remove), keeping its
    /// id and therefore its place in notification order. Returns `false`
    /// when the same `(callback, scope)` pair was registered in the meantime.
    pub fn restore(&mut self, record: ListenerHelper<T>) -> bool {
        if self.find(record.callback(), record.scope()).is_some() {
            return false;
        }
        self.index(record);
        true
    }

    fn index(&mut self, record: ListenerHelper<T>) {
        let id = record.id();
        match record.indexed_types() {
            None => {
                self.catch_all.insert(id);
            }
            Some(types) => {
                for t in types {
                    self.by_type.entry(t).or_default().insert(id);
                }
            }
        }
        self.records.insert(id, record);
    }

    /// Replace options (when given) and widen the interest of an existing record.
    pub fn update(
        &mut self,
        id: ListenerId,
        types: Option<&[String]>,
        options: Option<ListenerOptions>,
    ) {
        let Some(record) = self.records.get_mut(&id) else {
            return;
        };
        record.set_options(options);
        let diff = record.allow_event_type(types);
        self.apply_diff(id, &diff);
    }

    /// Narrow the interest of a record. Returns the record if it no longer
    /// listens to anything and was therefore removed.
    pub fn deny(&mut self, id: ListenerId, types: Option<&[String]>) -> Option<ListenerHelper<T>> {
        let record = self.records.get_mut(&id)?;
        let diff = record.deny_event_type(types);
        let empty = !record.has_event_types();
        self.apply_diff(id, &diff);
        if empty { self.remove(id) } else { None }
    }

    pub fn remove(&mut self, id: ListenerId) -> Option<ListenerHelper<T>> {
        let record = self.records.remove(&id)?;
        match record.indexed_types() {
            None => {
                self.catch_all.remove(&id);
            }
            Some(types) => {
                for t in types {
                    self.unindex(&t, id);
                }
            }
        }
        Some(record)
    }

    fn apply_diff(&mut self, id: ListenerId, diff: &TypeDiff) {
        for t in &diff.removed {
            self.unindex(t, id);
        }
        if diff.removed_all {
            self.catch_all.remove(&id);
        }
        for t in &diff.added {
            self.by_type.entry(t.clone()).or_default().insert(id);
        }
        if diff.added_all {
            self.catch_all.insert(id);
        }
    }

    fn unindex(&mut self, t: &str, id: ListenerId) {
        if let Some(ids) = self.by_type.get_mut(t) {
            ids.remove(&id);
            if ids.is_empty() {
                self.by_type.remove(t);
            }
        }
    }

    /// Records interested in any of `types`, in notification order:
    /// higher priority first, newest first among equal priorities.
    pub fn matching(&self, types: &[String]) -> Vec<&ListenerHelper<T>> {
        let mut ids: BTreeSet<ListenerId> = self.catch_all.clone();
        for t in types {
            if let Some(indexed) = self.by_type.get(t) {
                ids.extend(indexed);
            }
        }

        let mut matched: Vec<_> = ids
            .into_iter()
            .filter_map(|id| self.records.get(&id))
            .filter(|r| r.will_dispatch(types))
            .collect();
        matched.sort_by(|a, b| b.priority().cmp(&a.priority()).then(b.id().cmp(&a.id())));
        matched
    }

    pub fn any_matching(&self, types: &[String]) -> bool {
        self.catch_all
            .iter()
            .chain(types.iter().filter_map(|t| self.by_type.get(t)).flatten())
            .filter_map(|id| self.records.get(id))
            .any(|r| r.will_dispatch(types))
    }

    /// Remove every record, or only those registered with `scope`.
    pub fn drain(&mut self, scope: Option<&Scope>) -> Vec<ListenerHelper<T>> {
        let ids: Vec<ListenerId> = self
            .records
            .values()
            .filter(|r| scope.is_none_or(|s| r.scope() == s))
            .map(ListenerHelper::id)
            .collect();
        ids.into_iter().filter_map(|id| self.remove(id)).collect()
    }

    #[cfg(test)]
    pub(crate) fn indexed_under(&self, t: &str) -> Vec<ListenerId> {
        self.by_type
            .get(t)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    #[cfg(test)]
    pub(crate) fn catch_all_ids(&self) -> Vec<ListenerId> {
        self.catch_all.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn noop() -> Callback<()> {
        Callback::new(|_, _, _| Ok(()))
    }

    fn ids(records: Vec<&ListenerHelper<()>>) -> Vec<ListenerId> {
        records.into_iter().map(ListenerHelper::id).collect()
    }

    #[test]
    fn insert_indexes_by_type_or_catch_all() {
        let mut reg = Registry::default();
        let a = reg.insert(noop(), Scope::new(), Some(&types(&["x", "y"])), None);
        let b = reg.insert(noop(), Scope::new(), None, None);

        assert_eq!(reg.indexed_under("x"), vec![a]);
        assert_eq!(reg.indexed_under("y"), vec![a]);
        assert_eq!(reg.catch_all_ids(), vec![b]);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn find_uses_callback_and_scope_identity() {
        let mut reg = Registry::default();
        let cb = noop();
        let scope = Scope::new();
        let id = reg.insert(cb.clone(), scope.clone(), None, None);

        assert_eq!(reg.find(&cb, &scope), Some(id));
        assert_eq!(reg.find(&cb, &Scope::new()), None);
        assert_eq!(reg.find(&noop(), &scope), None);
    }

    #[test]
    fn update_merges_types_incrementally() {
        let mut reg = Registry::default();
        let id = reg.insert(noop(), Scope::new(), Some(&types(&["x"])), None);
        reg.update(id, Some(&types(&["y"])), None);

        assert_eq!(reg.indexed_under("x"), vec![id]);
        assert_eq!(reg.indexed_under("y"), vec![id]);

        reg.update(id, None, None);
        assert!(reg.indexed_under("x").is_empty());
        assert_eq!(reg.catch_all_ids(), vec![id]);
    }

    #[test]
    fn deny_removes_record_once_empty() {
        let mut reg = Registry::default();
        let id = reg.insert(noop(), Scope::new(), Some(&types(&["x", "y"])), None);

        assert!(reg.deny(id, Some(&types(&["x"]))).is_none());
        assert!(reg.indexed_under("x").is_empty());
        assert_eq!(reg.indexed_under("y"), vec![id]);

        let removed = reg.deny(id, Some(&types(&["y"])));
        assert_eq!(removed.map(|r| r.id()), Some(id));
        assert!(reg.is_empty());
        assert!(reg.indexed_under("y").is_empty());
    }

    #[test]
    fn deny_on_catch_all_keeps_record() {
        let mut reg = Registry::default();
        let id = reg.insert(noop(), Scope::new(), None, None);
        assert!(reg.deny(id, Some(&types(&["x"]))).is_none());
        assert_eq!(reg.catch_all_ids(), vec![id]);
        assert!(ids(reg.matching(&types(&["x"]))).is_empty());
        assert_eq!(ids(reg.matching(&types(&["z"]))), vec![id]);

        assert!(reg.deny(id, None).is_some());
        assert!(reg.catch_all_ids().is_empty());
    }

    #[test]
    fn matching_orders_by_priority_then_newest() {
        let mut reg = Registry::default();
        let opts = |p| Some(ListenerOptions::default().with_priority(p));
        let low = reg.insert(noop(), Scope::new(), Some(&types(&["x"])), opts(-10));
        let first = reg.insert(noop(), Scope::new(), Some(&types(&["x"])), opts(0));
        let high = reg.insert(noop(), Scope::new(), None, opts(10));
        let second = reg.insert(noop(), Scope::new(), Some(&types(&["x", "y"])), opts(0));

        assert_eq!(ids(reg.matching(&types(&["x", "y"]))), vec![high, second, first, low]);
        assert_eq!(ids(reg.matching(&types(&["y"]))), vec![high, second]);
        assert!(reg.any_matching(&types(&["q"])));
    }

    #[test]
    fn restore_keeps_id_and_order() {
        let mut reg = Registry::default();
        let cb = noop();
        let scope = Scope::new();
        let old = reg.insert(cb.clone(), scope.clone(), Some(&types(&["x"])), None);
        let new = reg.insert(noop(), Scope::new(), Some(&types(&["x"])), None);

        let record = reg.remove(old).unwrap();
        assert_eq!(ids(reg.matching(&types(&["x"]))), vec![new]);
        assert!(reg.restore(record));
        assert_eq!(ids(reg.matching(&types(&["x"]))), vec![new, old]);
        assert_eq!(reg.find(&cb, &scope), Some(old));
    }

    #[test]
    fn restore_yields_to_newer_registration() {
        let mut reg = Registry::default();
        let cb = noop();
        let scope = Scope::new();
        let old = reg.insert(cb.clone(), scope.clone(), None, None);
        let record = reg.remove(old).unwrap();
        let again = reg.insert(cb.clone(), scope.clone(), Some(&types(&["x"])), None);

        assert!(!reg.restore(record));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.find(&cb, &scope), Some(again));
        assert!(reg.catch_all_ids().is_empty());
    }

    #[test]
    fn drain_filters_by_scope() {
        let mut reg = Registry::default();
        let keep = Scope::new();
        let purge = Scope::new();
        let kept = reg.insert(noop(), keep.clone(), Some(&types(&["x"])), None);
        reg.insert(noop(), purge.clone(), Some(&types(&["x"])), None);
        reg.insert(noop(), purge.clone(), None, None);

        assert_eq!(reg.drain(Some(&purge)).len(), 2);
        assert_eq!(reg.indexed_under("x"), vec![kept]);
        assert!(reg.catch_all_ids().is_empty());

        assert_eq!(reg.drain(None).len(), 1);
        assert!(reg.is_empty());
        assert!(!reg.any_matching(&types(&["x"])));
    }
}

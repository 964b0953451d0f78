use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Describes which concrete event type(s) an event carries or a listener
/// is interested in.
///
/// A type expression is flattened by [`normalize`](Self::normalize) into a
/// sorted, de-duplicated list of concrete type strings:
///
/// - [`Scalar`](Self::Scalar) - one type, used as is
/// - [`List`](Self::List) - the union of every element
/// - [`Keyed`](Self::Keyed) - every type of the value, prefixed with
///   `key` and the dispatcher's separator
///
/// Keyed expressions build hierarchical types such as `"user:login"`. A
/// `"*"` token is an ordinary string; any wildcard meaning is a convention
/// between the code that dispatches and the code that subscribes.
///
/// # Example
///
/// ```rust
/// use event_dispatch::TypeExpr;
///
/// let expr = TypeExpr::keyed([("user", TypeExpr::from(["logout", "login"]))]);
/// assert_eq!(expr.normalize(":"), vec!["user:login", "user:logout"]);
/// ```
///
/// With serde, the JSON shapes map directly: `"a"`, `["a", "b"]` and
/// `{"a": ["b", "c"]}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeExpr {
    Scalar(String),
    List(Vec<TypeExpr>),
    Keyed(BTreeMap<String, TypeExpr>),
}

impl TypeExpr {
    /// Build a keyed expression from `(key, value)` pairs.
    pub fn keyed<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<TypeExpr>,
    {
        TypeExpr::Keyed(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Flatten into sorted, de-duplicated concrete type strings.
    ///
    /// Normalizing the result again (as a [`List`](Self::List) of scalars)
    /// yields the same list.
    pub fn normalize(&self, separator: &str) -> Vec<String> {
        self.flatten(separator).into_iter().collect()
    }

    fn flatten(&self, separator: &str) -> BTreeSet<String> {
        match self {
            TypeExpr::Scalar(s) => BTreeSet::from([s.clone()]),
            TypeExpr::List(items) => items.iter().flat_map(|i| i.flatten(separator)).collect(),
            TypeExpr::Keyed(map) => map
                .iter()
                .flat_map(|(key, value)| {
                    value
                        .flatten(separator)
                        .into_iter()
                        .map(move |t| format!("{key}{separator}{t}"))
                })
                .collect(),
        }
    }
}

/// Normalize an optional expression; `None` stands for every event type.
pub(crate) fn normalize_interest(
    expr: Option<&TypeExpr>,
    separator: &str,
) -> Option<Vec<String>> {
    expr.map(|e| e.normalize(separator))
}

impl From<&str> for TypeExpr {
    fn from(s: &str) -> Self {
        TypeExpr::Scalar(s.to_string())
    }
}

impl From<String> for TypeExpr {
    fn from(s: String) -> Self {
        TypeExpr::Scalar(s)
    }
}

impl From<&String> for TypeExpr {
    fn from(s: &String) -> Self {
        TypeExpr::Scalar(s.clone())
    }
}

impl<T: Into<TypeExpr>> From<Vec<T>> for TypeExpr {
    fn from(items: Vec<T>) -> Self {
        TypeExpr::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<TypeExpr>, const N: usize> From<[T; N]> for TypeExpr {
    fn from(items: [T; N]) -> Self {
        TypeExpr::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, TypeExpr>> for TypeExpr {
    fn from(map: BTreeMap<String, TypeExpr>) -> Self {
        TypeExpr::Keyed(map)
    }
}

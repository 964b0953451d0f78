use serde::{Deserialize, Serialize};

/// Dispatcher configuration.
///
/// Use the builder pattern to customize, or [`Default`] for the `":"`
/// separator.
///
/// # Examples
///
/// ```rust
/// use event_dispatch::Config;
///
/// let config = Config::default().with_separator(".");
/// assert_eq!(config.separator(), ".");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Joins a key of a keyed [`TypeExpr`](crate::TypeExpr) with each
    /// nested type during normalization.
    /// Default: ":"
    separator: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            separator: ":".to_string(),
        }
    }
}

impl Config {
    /// Set the separator used to build hierarchical event types.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Returns the hierarchical type separator.
    pub fn separator(&self) -> &str {
        &self.separator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_separator_is_colon() {
        assert_eq!(Config::default().separator(), ":");
    }

    #[test]
    fn loads_from_json() {
        let config: Config = serde_json::from_str(r#"{"separator": "/"}"#).unwrap();
        assert_eq!(config.separator(), "/");

        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }
}

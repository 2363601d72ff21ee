//! Variable bindings for `@path` references in formulas

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

/// Values substituted for `@path` variables when a formula is evaluated
///
/// Keys are dotted paths without the leading `@` (`"abl"`, `"attributes.prof"`).
/// Values are kept as text so a binding may hold a whole formula (`"1d4 + 1"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bindings {
    values: BTreeMap<String, String>,
}

impl Bindings {
    /// Create an empty binding set
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value to a path, replacing any previous value
    pub fn insert(&mut self, path: impl Into<String>, value: impl Display) {
        self.values.insert(path.into(), value.to_string());
    }

    /// Builder form of [`Bindings::insert`]
    pub fn with(mut self, path: impl Into<String>, value: impl Display) -> Self {
        self.insert(path, value);
        self
    }

    /// Look up the value bound to a path
    pub fn get(&self, path: &str) -> Option<&str> {
        self.values.get(path).map(|s| s.as_str())
    }

    /// Check if a path is bound
    pub fn contains(&self, path: &str) -> bool {
        self.values.contains_key(path)
    }

    /// Copy every binding of `other` into this set under `prefix.`
    pub fn nest(&mut self, prefix: &str, other: &Bindings) {
        for (key, value) in &other.values {
            self.values.insert(format!("{}.{}", prefix, key), value.clone());
        }
    }

    /// Copy every binding of `other` into this set, overwriting shared paths
    pub fn merge(&mut self, other: &Bindings) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Number of bound paths
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when nothing is bound
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(path, value)` pairs in path order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut bindings = Bindings::new();
        bindings.insert("abl", 3);
        bindings.insert("bonus", "1d4");

        assert_eq!(bindings.get("abl"), Some("3"));
        assert_eq!(bindings.get("bonus"), Some("1d4"));
        assert_eq!(bindings.get("missing"), None);
        assert_eq!(bindings.len(), 2);
    }

    #[test]
    fn test_nest_prefixes_paths() {
        let item = Bindings::new().with("level", 3).with("uses", 2);
        let mut bindings = Bindings::new().with("prof", 2);
        bindings.nest("item", &item);

        assert_eq!(bindings.get("item.level"), Some("3"));
        assert_eq!(bindings.get("item.uses"), Some("2"));
        assert_eq!(bindings.get("prof"), Some("2"));
    }

    #[test]
    fn test_merge_overwrites() {
        let mut base = Bindings::new().with("mod", 1);
        base.merge(&Bindings::new().with("mod", 4));
        assert_eq!(base.get("mod"), Some("4"));
    }
}

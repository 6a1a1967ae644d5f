//! The parameter tree templates are rendered against.
//!
//! A [`ParameterTree`] is an insertion-ordered map from string keys to JSON
//! values (scalars, nested maps, sequences). It is assembled once per build
//! and only ever read while rendering.

use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::Value;

/// Ordered mapping from keys to values, passed to every render call.
pub type ParameterTree = serde_json::Map<String, Value>;

/// Builder that serializes typed configuration sections into a tree.
///
/// # Example
///
/// ```
/// use templater::ParameterTreeBuilder;
/// use serde_json::json;
///
/// let tree = ParameterTreeBuilder::new()
///     .with("unix", &json!({ "user": "svc" }))
///     .unwrap()
///     .build();
/// assert_eq!(tree["unix"]["user"], "svc");
/// ```
#[derive(Debug, Default, Clone)]
pub struct ParameterTreeBuilder {
    tree: ParameterTree,
}

impl ParameterTreeBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` under `key`, serializing it into the tree.
    ///
    /// Inserting an existing key replaces the previous value but keeps its
    /// original position.
    pub fn with<T: Serialize + ?Sized>(mut self, key: impl Into<String>, value: &T) -> Result<Self> {
        let key = key.into();
        let value = serde_json::to_value(value).map_err(|e| Error::Parameter {
            key: key.clone(),
            message: e.to_string(),
        })?;
        self.tree.insert(key, value);
        Ok(self)
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> ParameterTree {
        self.tree
    }
}

/// Look up a dotted path (`unix.user`) in the tree.
#[must_use]
pub fn lookup<'a>(tree: &'a ParameterTree, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = tree.get(parts.next()?)?;
    for part in parts {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct Unix {
        user: String,
    }

    #[test]
    fn test_builder_preserves_insertion_order() {
        let tree = ParameterTreeBuilder::new()
            .with("zeta", &1)
            .unwrap()
            .with("alpha", &2)
            .unwrap()
            .with("mid", &3)
            .unwrap()
            .build();

        let keys: Vec<_> = tree.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_builder_serializes_structs() {
        let tree = ParameterTreeBuilder::new()
            .with(
                "unix",
                &Unix {
                    user: "svcuser".to_string(),
                },
            )
            .unwrap()
            .build();
        assert_eq!(tree["unix"]["user"], "svcuser");
    }

    #[test]
    fn test_builder_rejects_non_string_map_keys() {
        let mut bad = BTreeMap::new();
        bad.insert(vec![1u8], "x");
        let result = ParameterTreeBuilder::new().with("bad", &bad);
        assert!(matches!(result, Err(Error::Parameter { .. })));
    }

    #[test]
    fn test_lookup_dotted_path() {
        let tree = ParameterTreeBuilder::new()
            .with("unix", &json!({ "user": "svc", "groups": ["adm", "www"] }))
            .unwrap()
            .build();

        assert_eq!(lookup(&tree, "unix.user"), Some(&json!("svc")));
        assert_eq!(lookup(&tree, "unix.groups.1"), Some(&json!("www")));
        assert_eq!(lookup(&tree, "unix.missing"), None);
        assert_eq!(lookup(&tree, "nothing"), None);
    }
}

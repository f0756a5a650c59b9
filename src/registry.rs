use std::collections::BTreeMap;

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
struct Entry {
    default: String,
    overridden: Option<String>,
}

/// Named panel queries with per-deployment overrides.
///
/// A registry is built for one catalog render and handed to the dashboard
/// builders, so overrides from one render never leak into another.
#[derive(Debug, Clone, Default)]
pub struct QueryRegistry {
    entries: BTreeMap<String, Entry>,
}

impl QueryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the default text for `name`. Re-registering replaces the
    /// default and keeps any override.
    pub fn register(&mut self, name: impl Into<String>, default: impl Into<String>) {
        let name = name.into();
        let default = default.into();
        match self.entries.get_mut(&name) {
            Some(entry) => entry.default = default,
            None => {
                self.entries.insert(name, Entry {
                    default,
                    overridden: None,
                });
            }
        }
    }

    /// Replace the query for an already registered name.
    pub fn override_query(&mut self, name: &str, query: impl Into<String>) -> Result<()> {
        let entry = self
            .entries
            .get_mut(name)
            .ok_or_else(|| Error::UnknownQuery(name.to_string()))?;
        entry.overridden = Some(query.into());
        tracing::debug!("query {name} overridden");
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&str> {
        self.entries
            .get(name)
            .map(|e| e.overridden.as_deref().unwrap_or(&e.default))
            .ok_or_else(|| Error::UnknownQuery(name.to_string()))
    }

    pub fn is_overridden(&self, name: &str) -> bool {
        self.entries
            .get(name)
            .is_some_and(|e| e.overridden.is_some())
    }

    pub fn overrides(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter_map(|(name, e)| e.overridden.as_deref().map(|q| (name.as_str(), q)))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_replaces_default() {
        let mut registry = QueryRegistry::new();
        registry.register("k8s.cpu", "sum(rate(container_cpu_usage_seconds_total[5m]))");
        assert_eq!(
            registry.get("k8s.cpu").unwrap(),
            "sum(rate(container_cpu_usage_seconds_total[5m]))"
        );
        assert!(!registry.is_overridden("k8s.cpu"));

        registry.override_query("k8s.cpu", "sum(node_cpu)").unwrap();
        assert_eq!(registry.get("k8s.cpu").unwrap(), "sum(node_cpu)");
        assert!(registry.is_overridden("k8s.cpu"));
        assert_eq!(registry.overrides().collect::<Vec<_>>(), vec![("k8s.cpu", "sum(node_cpu)")]);
    }

    #[test]
    fn test_unknown_names_are_errors() {
        let mut registry = QueryRegistry::new();
        assert!(matches!(registry.get("missing"), Err(Error::UnknownQuery(_))));
        assert!(matches!(
            registry.override_query("missing", "up"),
            Err(Error::UnknownQuery(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_reregister_keeps_override() {
        let mut registry = QueryRegistry::new();
        registry.register("a", "up");
        registry.override_query("a", "down").unwrap();
        registry.register("a", "up2");
        assert_eq!(registry.get("a").unwrap(), "down");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registries_are_independent() {
        let mut first = QueryRegistry::new();
        first.register("a", "up");
        let mut second = first.clone();
        second.override_query("a", "down").unwrap();
        assert_eq!(first.get("a").unwrap(), "up");
        assert_eq!(second.get("a").unwrap(), "down");
    }
}

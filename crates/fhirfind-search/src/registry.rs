//! Search parameter registry for indexing and lookup.
//!
//! Parameters are indexed by resource type and code. Uses DashMap for
//! lock-free concurrent access, so configuration can add or replace
//! parameters without blocking readers.

use dashmap::DashMap;
use std::sync::Arc;

use crate::parameters::SearchParameterDefinition;

/// Registry of search parameter definitions, keyed by `(resource_type, code)`.
#[derive(Debug, Default)]
pub struct SearchParameterRegistry {
    by_resource: DashMap<(String, String), Arc<SearchParameterDefinition>>,
}

impl SearchParameterRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            by_resource: DashMap::new(),
        }
    }

    /// Register a search parameter for a resource type, replacing any
    /// previous definition with the same code.
    ///
    /// Thread-safe - can be called concurrently from multiple threads.
    pub fn register(&self, resource_type: impl Into<String>, param: SearchParameterDefinition) {
        let code = param.code.clone();
        self.by_resource
            .insert((resource_type.into(), code), Arc::new(param));
    }

    /// Remove a parameter. Returns true if it was registered.
    pub fn remove(&self, resource_type: &str, code: &str) -> bool {
        self.by_resource
            .remove(&(resource_type.to_string(), code.to_string()))
            .is_some()
    }

    /// Get a search parameter for a specific resource type and code.
    pub fn get(&self, resource_type: &str, code: &str) -> Option<Arc<SearchParameterDefinition>> {
        let key = (resource_type.to_string(), code.to_string());
        self.by_resource.get(&key).map(|entry| entry.value().clone())
    }

    /// Get all search parameters registered for a resource type.
    pub fn get_all_for_type(&self, resource_type: &str) -> Vec<Arc<SearchParameterDefinition>> {
        self.by_resource
            .iter()
            .filter(|entry| entry.key().0 == resource_type)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Resource types with at least one registered parameter, sorted.
    pub fn resource_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self
            .by_resource
            .iter()
            .map(|entry| entry.key().0.clone())
            .collect();
        types.sort();
        types.dedup();
        types
    }

    /// Get the total number of registered parameters.
    pub fn len(&self) -> usize {
        self.by_resource.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.by_resource.is_empty()
    }

    /// Get the number of parameters for a specific resource type.
    pub fn count_for_type(&self, resource_type: &str) -> usize {
        self.by_resource
            .iter()
            .filter(|entry| entry.key().0 == resource_type)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::SearchParameterType;

    fn name_param() -> SearchParameterDefinition {
        SearchParameterDefinition::new("name", SearchParameterType::String, "name")
    }

    #[test]
    fn test_register_and_get() {
        let registry = SearchParameterRegistry::new();
        registry.register("Organization", name_param());

        assert_eq!(registry.len(), 1);
        assert!(registry.get("Organization", "name").is_some());
        assert!(registry.get("Patient", "name").is_none());
        assert!(registry.get("Organization", "missing").is_none());
    }

    #[test]
    fn test_register_replaces_same_code() {
        let registry = SearchParameterRegistry::new();
        registry.register("Organization", name_param());
        registry.register("Organization", name_param().with_paths(["name", "alias"]));

        assert_eq!(registry.len(), 1);
        let param = registry.get("Organization", "name").unwrap();
        assert_eq!(param.paths, vec!["name", "alias"]);
    }

    #[test]
    fn test_counts_and_types() {
        let registry = SearchParameterRegistry::new();
        registry.register("Patient", name_param());
        registry.register("Organization", name_param());
        registry.register(
            "Organization",
            SearchParameterDefinition::new("type", SearchParameterType::Token, "type.coding"),
        );

        assert_eq!(registry.count_for_type("Organization"), 2);
        assert_eq!(registry.get_all_for_type("Patient").len(), 1);
        assert_eq!(registry.resource_types(), vec!["Organization", "Patient"]);
    }

    #[test]
    fn test_remove() {
        let registry = SearchParameterRegistry::new();
        registry.register("Patient", name_param());
        assert!(registry.remove("Patient", "name"));
        assert!(!registry.remove("Patient", "name"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_concurrent_registration() {
        let registry = Arc::new(SearchParameterRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    registry.register(
                        "Observation",
                        SearchParameterDefinition::new(
                            format!("p{i}"),
                            SearchParameterType::Number,
                            "value",
                        ),
                    );
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.count_for_type("Observation"), 8);
    }
}

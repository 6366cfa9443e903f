use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use fhirfind_search::Filter;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::StorageError;
use crate::query::FilterMatcher;
use crate::traits::DocumentStore;

/// In-memory document store.
///
/// Collections are created on first insert and keep insertion order. Filters
/// are evaluated with [`FilterMatcher`].
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<String, Vec<Value>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `documents` in `collection`.
    pub async fn with_documents(
        collection: &str,
        documents: impl IntoIterator<Item = Value>,
    ) -> Self {
        let store = Self::new();
        store
            .collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .extend(documents);
        store
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>, StorageError> {
        let matcher = FilterMatcher::compile(filter)?;
        let collections = self.collections.read().await;

        let Some(documents) = collections.get(collection) else {
            tracing::debug!(collection = %collection, "Find on empty collection");
            return Ok(Vec::new());
        };

        let found: Vec<Value> = documents
            .iter()
            .filter(|doc| matcher.matches(doc))
            .cloned()
            .collect();

        tracing::debug!(
            collection = %collection,
            scanned = documents.len(),
            matched = found.len(),
            "In-memory find"
        );
        Ok(found)
    }

    async fn insert(&self, collection: &str, document: Value) -> Result<(), StorageError> {
        if !document.is_object() {
            return Err(StorageError::internal(format!(
                "documents must be JSON objects (collection '{collection}')"
            )));
        }
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(document);
        Ok(())
    }

    async fn count(&self, collection: &str) -> Result<usize, StorageError> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fhirfind_search::Condition;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = MemoryStore::new();
        store
            .insert("patients", json!({"name": [{"family": "Chalmers"}]}))
            .await
            .unwrap();
        store
            .insert("patients", json!({"name": [{"family": "Windsor"}]}))
            .await
            .unwrap();

        assert_eq!(store.count("patients").await.unwrap(), 2);

        let filter = Filter::field("name.family", Condition::equals("Windsor"));
        let found = store.find("patients", &filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["name"][0]["family"], "Windsor");

        let all = store.find("patients", &Filter::match_all()).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_collection_is_empty() {
        let store = MemoryStore::new();
        assert!(
            store
                .find("nothing", &Filter::match_all())
                .await
                .unwrap()
                .is_empty()
        );
        assert_eq!(store.count("nothing").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rejects_non_object_documents() {
        let store = MemoryStore::new();
        assert!(store.insert("patients", json!([1, 2])).await.is_err());
    }

    #[tokio::test]
    async fn test_with_documents() {
        let store =
            MemoryStore::with_documents("orgs", vec![json!({"name": "a"}), json!({"name": "b"})])
                .await;
        assert_eq!(store.count("orgs").await.unwrap(), 2);
    }
}

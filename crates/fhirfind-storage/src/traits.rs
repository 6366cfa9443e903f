//! Storage traits for the document store abstraction.
//!
//! Services hand a translated [`Filter`] to a [`DocumentStore`] and get the
//! matching documents back; how the store executes it is its own business.

use async_trait::async_trait;
use fhirfind_search::Filter;
use serde_json::Value;

use crate::error::StorageError;

/// A collection-oriented JSON document store.
///
/// Implementations must be thread-safe (`Send + Sync`).
///
/// # Example
///
/// ```ignore
/// use fhirfind_search::Filter;
/// use fhirfind_storage::{DocumentStore, StorageError};
///
/// async fn all_patients(store: &dyn DocumentStore) -> Result<Vec<serde_json::Value>, StorageError> {
///     store.find("patients", &Filter::match_all()).await
/// }
/// ```
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns every document of `collection` matching `filter`, in insertion
    /// order. An unknown collection holds no documents.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidFilter` if the filter cannot be evaluated.
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>, StorageError>;

    /// Adds a document to `collection`, creating the collection if needed.
    async fn insert(&self, collection: &str, document: Value) -> Result<(), StorageError>;

    /// Number of documents in `collection`.
    async fn count(&self, collection: &str) -> Result<usize, StorageError>;
}

use std::collections::HashMap;
use std::sync::Arc;

use fhirfind_search::{SearchArguments, SearchEngine};
use fhirfind_storage::DynDocumentStore;
use serde_json::Value;

use crate::config::ServiceConfig;
use crate::error::ServiceError;

/// Search over the documents of one resource type.
///
/// Hands the raw arguments to the engine and runs the produced filter
/// against the store.
#[derive(Clone)]
pub struct ResourceService {
    resource_type: String,
    collection: String,
    engine: Arc<SearchEngine>,
    store: DynDocumentStore,
}

impl ResourceService {
    pub fn new(
        resource_type: impl Into<String>,
        collection: impl Into<String>,
        engine: Arc<SearchEngine>,
        store: DynDocumentStore,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            collection: collection.into(),
            engine,
            store,
        }
    }

    pub fn organization(engine: Arc<SearchEngine>, store: DynDocumentStore) -> Self {
        Self::new("Organization", "Organization", engine, store)
    }

    pub fn patient(engine: Arc<SearchEngine>, store: DynDocumentStore) -> Self {
        Self::new("Patient", "Patient", engine, store)
    }

    pub fn observation(engine: Arc<SearchEngine>, store: DynDocumentStore) -> Self {
        Self::new("Observation", "Observation", engine, store)
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub async fn search(&self, args: &SearchArguments) -> Result<Vec<Value>, ServiceError> {
        let filter = self.engine.build_filter(&self.resource_type, args)?;

        tracing::debug!(
            resource_type = %self.resource_type,
            collection = %self.collection,
            filter = %filter.to_value(),
            "Executing search"
        );

        Ok(self.store.find(&self.collection, &filter).await?)
    }
}

impl std::fmt::Debug for ResourceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceService")
            .field("resource_type", &self.resource_type)
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

/// One [`ResourceService`] per resource type known to the engine.
#[derive(Debug, Clone)]
pub struct SearchServices {
    services: HashMap<String, ResourceService>,
}

impl SearchServices {
    /// Services for every resource type with search parameters, sharing one
    /// engine and store.
    pub fn from_config(config: &ServiceConfig, store: DynDocumentStore) -> Self {
        let engine = Arc::new(config.build_engine());

        let services = engine
            .registry()
            .resource_types()
            .into_iter()
            .map(|resource_type| {
                let collection = config.collection_for(&resource_type).to_string();
                let service = ResourceService::new(
                    resource_type.clone(),
                    collection,
                    engine.clone(),
                    store.clone(),
                );
                (resource_type, service)
            })
            .collect();

        Self { services }
    }

    pub fn get(&self, resource_type: &str) -> Option<&ResourceService> {
        self.services.get(resource_type)
    }

    pub async fn search(
        &self,
        resource_type: &str,
        args: &SearchArguments,
    ) -> Result<Vec<Value>, ServiceError> {
        self.get(resource_type)
            .ok_or_else(|| ServiceError::UnknownResource(resource_type.to_string()))?
            .search(args)
            .await
    }

    pub fn resource_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.services.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

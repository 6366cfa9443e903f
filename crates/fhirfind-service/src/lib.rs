//! Resource search services.
//!
//! Thin callers over the search engine: a service takes the raw search
//! arguments for its resource type, asks the engine for a filter and runs it
//! through a [`DocumentStore`](fhirfind_storage::DocumentStore).

pub mod config;
pub mod error;
pub mod service;

pub use config::{ResourceConfig, ServiceConfig};
pub use error::{ConfigError, ServiceError};
pub use service::{ResourceService, SearchServices};

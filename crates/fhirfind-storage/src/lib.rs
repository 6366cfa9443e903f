//! Document store abstraction for translated search filters.
//!
//! This crate provides:
//! - [`DocumentStore`]: the `find`-style seam services execute filters through
//! - [`MemoryStore`]: an in-memory implementation
//! - [`FilterMatcher`]: document-store filter semantics over `serde_json::Value`

pub mod error;
pub mod memory;
pub mod query;
pub mod traits;

pub use error::StorageError;
pub use memory::MemoryStore;
pub use query::{FilterMatcher, matches};
pub use traits::DocumentStore;

/// Type alias for a dynamically-dispatched document store.
pub type DynDocumentStore = std::sync::Arc<dyn DocumentStore>;

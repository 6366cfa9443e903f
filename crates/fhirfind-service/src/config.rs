//! Search configuration loaded from TOML.
//!
//! ```toml
//! strict = true
//!
//! [[resources]]
//! resource_type = "Observation"
//! collection = "observations"
//!
//! [[resources.parameters]]
//! code = "code-value-string"
//! type = "composite"
//! components = ["code.coding|token", "valueString|string"]
//! ```
//!
//! Configured parameters are layered over the built-in ones; a parameter with
//! a built-in code replaces it.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use fhirfind_search::parameters::is_resource_type;
use fhirfind_search::{
    SearchConfig, SearchEngine, SearchParameterDefinition, SearchParameterRegistry,
    register_default_parameters,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Reject unknown search parameters instead of skipping them.
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub resources: Vec<ResourceConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceConfig {
    pub resource_type: String,
    /// Document collection; defaults to the resource type.
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub parameters: Vec<SearchParameterDefinition>,
}

impl ResourceConfig {
    pub fn collection(&self) -> &str {
        self.collection.as_deref().unwrap_or(&self.resource_type)
    }
}

impl ServiceConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;

        info!(
            path = %path.display(),
            resources = config.resources.len(),
            strict = config.strict,
            "Loaded search configuration"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();

        for resource in &self.resources {
            if !is_resource_type(&resource.resource_type) {
                return Err(ConfigError::validation(format!(
                    "'{}' is not a resource type",
                    resource.resource_type
                )));
            }
            if !seen.insert(resource.resource_type.as_str()) {
                return Err(ConfigError::validation(format!(
                    "resource type '{}' is configured twice",
                    resource.resource_type
                )));
            }
            if resource.collection().is_empty() {
                return Err(ConfigError::validation(format!(
                    "empty collection for '{}'",
                    resource.resource_type
                )));
            }

            let mut codes = HashSet::new();
            for param in &resource.parameters {
                param.validate().map_err(|reason| {
                    ConfigError::validation(format!("{}: {reason}", resource.resource_type))
                })?;
                if !codes.insert(param.code.as_str()) {
                    return Err(ConfigError::validation(format!(
                        "{}: parameter '{}' is defined twice",
                        resource.resource_type, param.code
                    )));
                }
            }
        }
        Ok(())
    }

    /// Built-in parameters overlaid with the configured ones.
    pub fn build_registry(&self) -> SearchParameterRegistry {
        let registry = SearchParameterRegistry::new();
        register_default_parameters(&registry);

        for resource in &self.resources {
            for param in &resource.parameters {
                debug!(
                    resource_type = %resource.resource_type,
                    param = %param.code,
                    "Registering configured search parameter"
                );
                registry.register(resource.resource_type.clone(), param.clone());
            }
        }
        registry
    }

    pub fn build_engine(&self) -> SearchEngine {
        SearchEngine::new(
            Arc::new(self.build_registry()),
            SearchConfig {
                strict: self.strict,
            },
        )
    }

    /// Collection holding documents of `resource_type`.
    pub fn collection_for<'a>(&'a self, resource_type: &'a str) -> &'a str {
        self.resources
            .iter()
            .find(|r| r.resource_type == resource_type)
            .map_or(resource_type, ResourceConfig::collection)
    }
}

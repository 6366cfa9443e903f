use std::sync::Arc;

use thiserror::Error;

use crate::common::register_default_parameters;
use crate::error::QueryBuilderError;
use crate::filter::Filter;
use crate::parameters::SearchModifier;
use crate::parser::{SearchArguments, split_name_and_modifier};
use crate::registry::SearchParameterRegistry;
use crate::types::dispatch_search;

#[derive(Debug, Clone, Default)]
pub struct SearchConfig {
    /// Reject parameters the registry does not know instead of skipping them.
    pub strict: bool,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown search parameter '{code}' for {resource_type}")]
    UnknownParameter { resource_type: String, code: String },
    #[error("invalid value for search parameter '{code}': {source}")]
    Builder {
        code: String,
        #[source]
        source: QueryBuilderError,
    },
    #[error("invalid search parameter definition '{code}': {reason}")]
    InvalidDefinition { code: String, reason: String },
}

/// Turns search arguments for one resource type into a single filter.
#[derive(Debug, Clone)]
pub struct SearchEngine {
    registry: Arc<SearchParameterRegistry>,
    config: SearchConfig,
}

impl SearchEngine {
    pub fn new(registry: Arc<SearchParameterRegistry>, config: SearchConfig) -> Self {
        Self { registry, config }
    }

    /// Engine over the built-in parameters only.
    pub fn with_defaults(config: SearchConfig) -> Self {
        let registry = SearchParameterRegistry::new();
        register_default_parameters(&registry);
        Self::new(Arc::new(registry), config)
    }

    pub fn registry(&self) -> &Arc<SearchParameterRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Build the filter for `args` against `resource_type`.
    ///
    /// Result parameters (`_count`, `_sort`, ...) and empty values are
    /// skipped. Each remaining argument is translated on its own and the
    /// results are merged, so repeated parameters are AND-ed. No arguments
    /// yields the match-all filter.
    pub fn build_filter(
        &self,
        resource_type: &str,
        args: &SearchArguments,
    ) -> Result<Filter, EngineError> {
        let mut filters = Vec::with_capacity(args.len());

        for (key, value) in args.iter() {
            let (code, modifier) = split_name_and_modifier(key);

            if code.starts_with('_') {
                tracing::debug!(param = %code, "Ignoring result parameter");
                continue;
            }
            if value.trim().is_empty() {
                continue;
            }

            let Some(definition) = self.registry.get(resource_type, code) else {
                if self.config.strict {
                    return Err(EngineError::UnknownParameter {
                        resource_type: resource_type.to_string(),
                        code: code.to_string(),
                    });
                }
                tracing::warn!(
                    resource_type = %resource_type,
                    param = %code,
                    "Unknown search parameter, skipping"
                );
                continue;
            };

            definition
                .validate()
                .map_err(|reason| EngineError::InvalidDefinition {
                    code: code.to_string(),
                    reason,
                })?;

            let builder_error = |source: QueryBuilderError| EngineError::Builder {
                code: code.to_string(),
                source,
            };

            let modifier = modifier
                .map(|m| {
                    SearchModifier::parse(m)
                        .ok_or_else(|| QueryBuilderError::InvalidModifier(m.to_string()))
                })
                .transpose()
                .map_err(builder_error)?;

            let filter =
                dispatch_search(&definition, modifier.as_ref(), value).map_err(builder_error)?;

            tracing::debug!(
                resource_type = %resource_type,
                param = %code,
                param_type = ?definition.kind,
                "Translated search parameter"
            );
            filters.push(filter);
        }

        Ok(Filter::merge_all(filters))
    }
}

//! Translation of FHIR search parameters into document-store filters.
//!
//! A [`SearchEngine`] resolves each argument against the
//! [`SearchParameterRegistry`], hands the raw value to the builder for the
//! parameter's type and merges the results into one [`Filter`].

pub mod common;
pub mod engine;
pub mod error;
pub mod filter;
pub mod parameters;
pub mod parser;
pub mod registry;
pub mod types;

pub use common::register_default_parameters;
pub use engine::{EngineError, SearchConfig, SearchEngine};
pub use error::QueryBuilderError;
pub use filter::{Condition, Filter, Operator, REGEX_OPTIONS_KEY, Scalar};
pub use parameters::{
    ComponentSpec, ComponentType, ElementShape, SearchModifier, SearchParameterDefinition,
    SearchParameterType, SearchPrefix,
};
pub use parser::SearchArguments;
pub use registry::SearchParameterRegistry;
pub use types::{
    build_address_query, build_composite_query, build_name_query, build_number_query,
    build_quantity_query, build_reference_query, build_string_query, build_token_query,
    composite_query_builder, dispatch_search,
};

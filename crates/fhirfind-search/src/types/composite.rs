//! Composite search parameter type implementation.
//!
//! Composite search parameters combine multiple search criteria into a single parameter.
//! Format: `value1$value2` where each part matches a component of the composite,
//! and `,` separates alternative groups.
//!
//! Every group carries one part per declared component. The one exception is
//! a value made only of single-part groups, one group per component: it is
//! read positionally, the n-th group supplying the n-th component on its own.

use crate::error::QueryBuilderError;
use crate::filter::{Condition, Filter};
use crate::parameters::{ComponentSpec, ComponentType};
use crate::parser::split_or_values;

use super::number::{build_number_query, build_quantity_query};
use super::reference::build_reference_query;
use super::token::{build_code_query, build_token_query};

/// A parsed composite search value: OR-groups of `$`-joined parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeValue {
    pub groups: Vec<Vec<String>>,
}

/// Parse a composite search value (groups separated by ',', parts by '$').
pub fn parse_composite_value(value: &str) -> CompositeValue {
    CompositeValue {
        groups: split_or_values(value)
            .into_iter()
            .map(|group| group.split('$').map(String::from).collect())
            .collect(),
    }
}

/// Decode one part with the decoder for its component's type.
pub fn build_component(spec: &ComponentSpec, part: &str) -> Result<Filter, QueryBuilderError> {
    let path = spec.path.as_str();
    match spec.component_type {
        ComponentType::Token => build_token_query(part, path),
        ComponentType::String => {
            if part.is_empty() {
                return Err(QueryBuilderError::invalid_value("empty string component"));
            }
            Ok(Filter::field(path, Condition::starts_with(part)))
        }
        ComponentType::Reference => build_reference_query(part, path, None),
        ComponentType::Quantity => build_quantity_query(part, path),
        ComponentType::Number => Ok(Filter::field(path, build_number_query(part)?)),
        ComponentType::Code => build_code_query(part, path),
    }
}

/// Pair the parts of one group with their components.
fn group_fragments(
    parts: &[String],
    components: &[ComponentSpec],
) -> Result<Vec<Filter>, QueryBuilderError> {
    if parts.len() != components.len() {
        return Err(QueryBuilderError::CompositeArity {
            expected: components.len(),
            found: parts.len(),
        });
    }
    parts
        .iter()
        .zip(components)
        .map(|(part, spec)| build_component(spec, part))
        .collect()
}

/// True when each group holds a single part and there is one group per
/// component, as in `system|code,text` for a token/string composite.
fn is_positional(groups: &[Vec<String>], components: &[ComponentSpec]) -> bool {
    components.len() > 1
        && groups.len() == components.len()
        && groups.iter().all(|parts| parts.len() == 1)
}

/// Build a filter for a composite search value.
///
/// One group yields `{ $and: [fragment, ...] }`; several groups yield
/// `{ $or: [group, ...] }` with each group's fragments merged field-wise.
pub fn build_composite_query(
    raw: &str,
    components: &[ComponentSpec],
) -> Result<Filter, QueryBuilderError> {
    if components.is_empty() {
        return Err(QueryBuilderError::InvalidComponentSpec(
            "composite parameter declares no components".to_string(),
        ));
    }

    let parsed = parse_composite_value(raw);
    let mut groups = if is_positional(&parsed.groups, components) {
        parsed
            .groups
            .iter()
            .zip(components)
            .map(|(parts, spec)| Ok(vec![build_component(spec, &parts[0])?]))
            .collect::<Result<Vec<_>, QueryBuilderError>>()?
    } else {
        parsed
            .groups
            .iter()
            .map(|parts| group_fragments(parts, components))
            .collect::<Result<Vec<_>, _>>()?
    };

    match groups.len() {
        0 => Err(QueryBuilderError::invalid_value("empty composite value")),
        1 => Ok(Filter::And(groups.remove(0))),
        _ => Ok(Filter::Or(groups.into_iter().map(Filter::merge_all).collect())),
    }
}

/// Composite search with components given in the external `"path|type"`
/// encoding, e.g. `composite_query_builder("lt12$example", &["foo|number", "bar|code"])`.
pub fn composite_query_builder<S: AsRef<str>>(
    raw: &str,
    specs: &[S],
) -> Result<Filter, QueryBuilderError> {
    build_composite_query(raw, &ComponentSpec::parse_all(specs)?)
}

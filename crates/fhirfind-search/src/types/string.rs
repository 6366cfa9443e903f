//! String search parameter implementation.
//!
//! String search supports the following modifiers:
//! - (default): starts-with, case-insensitive
//! - :exact: exact match, case-sensitive
//! - :contains: contains, case-insensitive
//!
//! HumanName and Address parameters are free text: the value is split into
//! terms, every term must be found (case-insensitive substring) and each
//! term may match any of the element's parts.

use crate::error::QueryBuilderError;
use crate::filter::{Condition, Filter};
use crate::parameters::SearchModifier;

/// HumanName parts searched by the `name` parameter.
pub const HUMAN_NAME_FIELDS: &[&str] = &["text", "family", "given", "prefix", "suffix"];

/// Address parts searched by the `address` parameter.
pub const ADDRESS_FIELDS: &[&str] = &[
    "text",
    "line",
    "city",
    "district",
    "state",
    "postalCode",
    "country",
];

/// Condition for a single string value under an optional modifier.
pub fn string_condition(
    raw: &str,
    modifier: Option<&SearchModifier>,
) -> Result<Condition, QueryBuilderError> {
    if raw.is_empty() {
        return Err(QueryBuilderError::invalid_value("empty string value"));
    }
    match modifier {
        None => Ok(Condition::starts_with(raw)),
        Some(SearchModifier::Exact) => Ok(Condition::equals(raw)),
        Some(SearchModifier::Contains) => Ok(Condition::contains(raw)),
        Some(other) => Err(QueryBuilderError::InvalidModifier(other.to_string())),
    }
}

/// Apply one condition to several fields, any of which may match.
fn any_field<S: AsRef<str>>(paths: &[S], condition: Condition) -> Filter {
    Filter::any_of(
        paths
            .iter()
            .map(|path| Filter::field(path.as_ref(), condition.clone()))
            .collect(),
    )
}

/// String search over one or more fields with an optional modifier.
pub fn build_string_search<S: AsRef<str>>(
    raw: &str,
    paths: &[S],
    modifier: Option<&SearchModifier>,
) -> Result<Filter, QueryBuilderError> {
    if paths.is_empty() {
        return Err(QueryBuilderError::invalid_value("string search needs a field"));
    }
    Ok(any_field(paths, string_condition(raw, modifier)?))
}

/// Default string search: case-insensitive prefix match on any of `paths`.
pub fn build_string_query<S: AsRef<str>>(raw: &str, paths: &[S]) -> Result<Filter, QueryBuilderError> {
    build_string_search(raw, paths, None)
}

/// Split free text into search terms on whitespace, commas and periods,
/// discarding empty terms.
pub fn tokenize(raw: &str) -> Vec<&str> {
    raw.split(|c: char| c.is_whitespace() || c == ',' || c == '.')
        .filter(|term| !term.is_empty())
        .collect()
}

/// Every term must be contained (case-insensitively) in at least one of
/// `fields`.
pub fn build_text_terms_query<S: AsRef<str>>(
    raw: &str,
    fields: &[S],
) -> Result<Filter, QueryBuilderError> {
    let terms = tokenize(raw);
    if terms.is_empty() {
        return Err(QueryBuilderError::invalid_value(format!(
            "'{raw}' contains no search terms"
        )));
    }

    Ok(Filter::And(
        terms
            .into_iter()
            .map(|term| any_field(fields, Condition::contains(term)))
            .collect(),
    ))
}

fn element_fields(path: &str, parts: &[&str]) -> Vec<String> {
    parts.iter().map(|part| format!("{path}.{part}")).collect()
}

/// Free-text search over a HumanName element.
pub fn build_name_query(raw: &str, path: &str) -> Result<Filter, QueryBuilderError> {
    build_text_terms_query(raw, &element_fields(path, HUMAN_NAME_FIELDS))
}

/// Free-text search over an Address element.
pub fn build_address_query(raw: &str, path: &str) -> Result<Filter, QueryBuilderError> {
    build_text_terms_query(raw, &element_fields(path, ADDRESS_FIELDS))
}

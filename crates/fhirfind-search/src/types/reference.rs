//! Reference search parameter implementation.
//!
//! A reference value can be:
//! - A full URL: "http://example.org/fhir/Patient/123"
//! - A relative reference: "Patient/123"
//! - An ID only: "123" (combined with the parameter's declared target type)
//!
//! All three normalize to the relative `Type/id` form and match the stored
//! reference string exactly. A trailing `/_history/{version}` is dropped.

use crate::error::QueryBuilderError;
use crate::filter::{Condition, Filter};
use crate::parameters::is_resource_type;

/// A parsed reference search value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceValue<'a> {
    /// Absolute URL, reduced to its trailing `Type/id`.
    Absolute { resource_type: &'a str, id: &'a str },
    Relative { resource_type: &'a str, id: &'a str },
    Id { id: &'a str },
}

impl ReferenceValue<'_> {
    /// Canonical `Type/id` string. A bare id takes `default_type`; without
    /// one it is kept as-is.
    pub fn normalize(&self, default_type: Option<&str>) -> String {
        match self {
            ReferenceValue::Absolute { resource_type, id }
            | ReferenceValue::Relative { resource_type, id } => format!("{resource_type}/{id}"),
            ReferenceValue::Id { id } => match default_type {
                Some(resource_type) => format!("{resource_type}/{id}"),
                None => (*id).to_string(),
            },
        }
    }
}

/// Parse a reference search value into one of its three forms.
pub fn parse_reference_value(value: &str) -> Result<ReferenceValue<'_>, QueryBuilderError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(QueryBuilderError::invalid_value("empty reference"));
    }

    if let Some((_, rest)) = value.split_once("://") {
        // Drop the authority, then any query or fragment.
        let path = rest.split_once('/').map_or("", |(_, path)| path);
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let (resource_type, id) = trailing_type_and_id(path).ok_or_else(|| {
            QueryBuilderError::invalid_value(format!("reference URL '{value}' has no Type/id"))
        })?;
        return Ok(ReferenceValue::Absolute { resource_type, id });
    }

    if value.contains('/') {
        let segments: Vec<&str> = value.split('/').collect();
        return match segments.as_slice() {
            [resource_type, id] | [resource_type, id, "_history", _]
                if is_resource_type(resource_type) && !id.is_empty() =>
            {
                Ok(ReferenceValue::Relative {
                    resource_type: *resource_type,
                    id: *id,
                })
            }
            _ => Err(QueryBuilderError::invalid_value(format!(
                "invalid relative reference '{value}'"
            ))),
        };
    }

    Ok(ReferenceValue::Id { id: value })
}

/// Last `Type/id` pair of a path, skipping a `_history/{version}` suffix.
fn trailing_type_and_id(path: &str) -> Option<(&str, &str)> {
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if segments.len() >= 4 && segments[segments.len() - 2] == "_history" {
        segments.truncate(segments.len() - 2);
    }

    match segments.as_slice() {
        [.., resource_type, id] if is_resource_type(resource_type) => Some((*resource_type, *id)),
        _ => None,
    }
}

/// Normalize a raw reference value to `Type/id`.
pub fn normalize_reference(
    raw: &str,
    default_type: Option<&str>,
) -> Result<String, QueryBuilderError> {
    Ok(parse_reference_value(raw)?.normalize(default_type))
}

/// Build a filter matching the reference string stored at `path`
/// (e.g. `partOf.reference`).
pub fn build_reference_query(
    raw: &str,
    path: &str,
    default_type: Option<&str>,
) -> Result<Filter, QueryBuilderError> {
    let reference = normalize_reference(raw, default_type)?;
    Ok(Filter::field(path, Condition::equals(reference)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_three_forms_normalize_alike() {
        for raw in ["https://foo.com/fhir/Organization/1", "Organization/1", "1"] {
            assert_eq!(
                normalize_reference(raw, Some("Organization")).unwrap(),
                "Organization/1",
                "{raw}"
            );
        }
    }

    #[test]
    fn test_parse_reference_forms() {
        assert_eq!(
            parse_reference_value("http://example.org/fhir/Patient/123").unwrap(),
            ReferenceValue::Absolute {
                resource_type: "Patient",
                id: "123"
            }
        );
        assert_eq!(
            parse_reference_value("Patient/123").unwrap(),
            ReferenceValue::Relative {
                resource_type: "Patient",
                id: "123"
            }
        );
        assert_eq!(
            parse_reference_value("123").unwrap(),
            ReferenceValue::Id { id: "123" }
        );
    }

    #[test]
    fn test_history_suffix_is_dropped() {
        assert_eq!(
            normalize_reference("Patient/123/_history/2", None).unwrap(),
            "Patient/123"
        );
        assert_eq!(
            normalize_reference("http://example.org/fhir/Patient/123/_history/2?x=1", None)
                .unwrap(),
            "Patient/123"
        );
    }

    #[test]
    fn test_bare_id_without_default_type() {
        assert_eq!(normalize_reference("123", None).unwrap(), "123");
    }

    #[test]
    fn test_relative_reference_keeps_its_type() {
        assert_eq!(
            normalize_reference("Encounter/example", Some("Organization")).unwrap(),
            "Encounter/example"
        );
    }

    #[test]
    fn test_invalid_references() {
        assert!(parse_reference_value("").is_err());
        assert!(parse_reference_value("https://foo.com/").is_err());
        assert!(parse_reference_value("https://foo.com/fhir/1").is_err());
        assert!(parse_reference_value("patient/123").is_err());
        assert!(parse_reference_value("a/Patient/123").is_err());
    }

    #[test]
    fn test_build_reference_query() {
        let filter =
            build_reference_query("https://foo.com/fhir/Organization/1", "partOf.reference", None)
                .unwrap();
        assert_eq!(filter.to_value(), json!({"partOf.reference": "Organization/1"}));
    }
}

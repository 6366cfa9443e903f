//! Search type implementations for FHIR search parameters.
//!
//! This module provides implementations for FHIR search parameter types:
//! - Number / Quantity: comparison prefixes and precision-derived ranges
//! - Token: Coding, Identifier, ContactPoint and plain code values
//! - Reference: absolute, relative and id-only references
//! - String: prefix, exact and contains matching; tokenized HumanName / Address
//! - Composite: `$`-joined components with `,` alternatives
//!
//! Each type module produces a [`Filter`] for the document store.

pub mod composite;
pub mod number;
pub mod reference;
pub mod string;
pub mod token;

pub use composite::{
    CompositeValue, build_component, build_composite_query, composite_query_builder,
    parse_composite_value,
};
pub use number::{
    QuantityValue, build_number_query, build_number_search, build_quantity_query,
    parse_numeric_literal, parse_quantity_value,
};
pub use reference::{
    ReferenceValue, build_reference_query, normalize_reference, parse_reference_value,
};
pub use string::{
    build_address_query, build_name_query, build_string_query, build_string_search,
    build_text_terms_query, tokenize,
};
pub use token::{
    TokenValue, build_code_query, build_contact_point_query, build_identifier_query,
    build_token_query, parse_token_value,
};

use crate::error::QueryBuilderError;
use crate::filter::Filter;
use crate::parameters::{
    ElementShape, SearchModifier, SearchParameterDefinition, SearchParameterType,
};
use crate::parser::split_or_values;

/// Dispatch a search value to the appropriate type handler.
///
/// Comma-separated alternatives become an `$or`, except for HumanName and
/// Address values (commas are term separators there) and composites (which
/// split their own groups).
pub fn dispatch_search(
    definition: &SearchParameterDefinition,
    modifier: Option<&SearchModifier>,
    raw: &str,
) -> Result<Filter, QueryBuilderError> {
    if let Some(modifier) = modifier
        && !modifier.applicable_to(&definition.kind)
    {
        return Err(QueryBuilderError::InvalidModifier(modifier.to_string()));
    }

    if definition.kind == SearchParameterType::Composite {
        return build_composite_query(raw, &definition.components);
    }

    let path = definition.primary_path().ok_or_else(|| {
        QueryBuilderError::invalid_value(format!("parameter '{}' has no path", definition.code))
    })?;

    match (definition.kind, definition.shape) {
        (SearchParameterType::String, ElementShape::HumanName | ElementShape::Address) => {
            if modifier == Some(&SearchModifier::Exact) {
                return Err(QueryBuilderError::InvalidModifier(
                    SearchModifier::Exact.to_string(),
                ));
            }
            if definition.shape == ElementShape::HumanName {
                build_name_query(raw, path)
            } else {
                build_address_query(raw, path)
            }
        }
        _ => {
            let alternatives = split_or_values(raw);
            if alternatives.is_empty() {
                return Err(QueryBuilderError::invalid_value(format!(
                    "no value for parameter '{}'",
                    definition.code
                )));
            }
            let filters = alternatives
                .iter()
                .map(|value| build_single_value(definition, modifier, path, value))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Filter::any_of(filters))
        }
    }
}

fn build_single_value(
    definition: &SearchParameterDefinition,
    modifier: Option<&SearchModifier>,
    path: &str,
    value: &str,
) -> Result<Filter, QueryBuilderError> {
    match definition.kind {
        SearchParameterType::Number => build_number_search(value, path),
        SearchParameterType::Quantity => build_quantity_query(value, path),
        SearchParameterType::Token => match definition.shape {
            ElementShape::Identifier => build_identifier_query(value, path),
            ElementShape::ContactPoint => {
                let system = definition.system.as_deref().ok_or_else(|| {
                    QueryBuilderError::invalid_value(format!(
                        "contact-point parameter '{}' has no system",
                        definition.code
                    ))
                })?;
                build_contact_point_query(value, path, system)
            }
            _ => build_token_query(value, path),
        },
        SearchParameterType::Reference => {
            // subject:Patient=123 reads the bare id as a Patient
            let default_type = match modifier {
                Some(SearchModifier::Type(resource_type)) => Some(resource_type.as_str()),
                _ => definition.target.as_deref(),
            };
            build_reference_query(value, path, default_type)
        }
        SearchParameterType::String => build_string_search(value, &definition.paths, modifier),
        SearchParameterType::Composite => build_composite_query(value, &definition.components),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::{ComponentSpec, ComponentType};
    use serde_json::json;

    fn organization_partof() -> SearchParameterDefinition {
        SearchParameterDefinition::new("partof", SearchParameterType::Reference, "partOf.reference")
            .with_target("Organization")
    }

    #[test]
    fn test_reference_forms_through_dispatch() {
        let def = organization_partof();
        for raw in ["https://foo.com/fhir/Organization/1", "Organization/1", "1"] {
            assert_eq!(
                dispatch_search(&def, None, raw).unwrap().to_value(),
                json!({"partOf.reference": "Organization/1"})
            );
        }
    }

    #[test]
    fn test_type_modifier_sets_reference_type() {
        let def = SearchParameterDefinition::new(
            "subject",
            SearchParameterType::Reference,
            "subject.reference",
        );
        let filter =
            dispatch_search(&def, Some(&SearchModifier::Type("Patient".into())), "123").unwrap();
        assert_eq!(filter.to_value(), json!({"subject.reference": "Patient/123"}));
    }

    #[test]
    fn test_or_list_for_tokens() {
        let def = SearchParameterDefinition::new("code", SearchParameterType::Token, "code.coding");
        let filter = dispatch_search(&def, None, "http://loinc.org|1234-5,5678-9").unwrap();
        assert_eq!(
            filter.to_value(),
            json!({"$or": [
                {"code.coding.system": "http://loinc.org", "code.coding.code": "1234-5"},
                {"code.coding.code": "5678-9"}
            ]})
        );
    }

    #[test]
    fn test_name_does_not_split_on_commas() {
        let def = SearchParameterDefinition::new("name", SearchParameterType::String, "name")
            .with_shape(ElementShape::HumanName);
        let Filter::And(terms) = dispatch_search(&def, None, "Windsor,Chalmers").unwrap() else {
            panic!("expected $and of terms");
        };
        assert_eq!(terms.len(), 2);
    }

    #[test]
    fn test_exact_not_allowed_on_names() {
        let def = SearchParameterDefinition::new("name", SearchParameterType::String, "name")
            .with_shape(ElementShape::HumanName);
        assert!(matches!(
            dispatch_search(&def, Some(&SearchModifier::Exact), "Chalmers"),
            Err(QueryBuilderError::InvalidModifier(_))
        ));
    }

    #[test]
    fn test_modifier_must_fit_type() {
        let def = SearchParameterDefinition::new("probability", SearchParameterType::Number, "p");
        assert!(matches!(
            dispatch_search(&def, Some(&SearchModifier::Contains), "5"),
            Err(QueryBuilderError::InvalidModifier(_))
        ));
    }

    #[test]
    fn test_contact_point_and_identifier_shapes() {
        let email = SearchParameterDefinition::new("email", SearchParameterType::Token, "telecom")
            .with_shape(ElementShape::ContactPoint)
            .with_system("email");
        assert_eq!(
            dispatch_search(&email, None, "p.heuvel@gmail.com")
                .unwrap()
                .to_value(),
            json!({"telecom.system": "email", "telecom.value": "p.heuvel@gmail.com"})
        );

        let identifier =
            SearchParameterDefinition::new("identifier", SearchParameterType::Token, "identifier")
                .with_shape(ElementShape::Identifier);
        assert_eq!(
            dispatch_search(&identifier, None, "http://sys|42")
                .unwrap()
                .to_value(),
            json!({"identifier.system": "http://sys", "identifier.value": "42"})
        );
    }

    #[test]
    fn test_composite_dispatch() {
        let def = SearchParameterDefinition::composite(
            "code-value-quantity",
            vec![
                ComponentSpec::new("code.coding", ComponentType::Token),
                ComponentSpec::new("valueQuantity", ComponentType::Quantity),
            ],
        );
        let filter = dispatch_search(&def, None, "http://loinc.org|8480-6$lt60||mm[Hg]").unwrap();
        assert_eq!(
            filter.to_value(),
            json!({"$and": [
                {"code.coding.system": "http://loinc.org", "code.coding.code": "8480-6"},
                {"valueQuantity.code": "mm[Hg]", "valueQuantity.value": {"$lt": 60}}
            ]})
        );
    }

    #[test]
    fn test_empty_value_is_an_error() {
        let def = organization_partof();
        assert!(dispatch_search(&def, None, " , ").is_err());
    }
}

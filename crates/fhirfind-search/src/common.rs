//! Built-in search parameters for the resources served out of the box.
//!
//! Organization, Patient, Observation and RiskAssessment parameters are
//! registered here. Configuration may add to or replace any of them.

use crate::parameters::{
    ComponentSpec, ComponentType, ElementShape, SearchParameterDefinition, SearchParameterType,
};
use crate::registry::SearchParameterRegistry;

/// Register all built-in search parameters.
pub fn register_default_parameters(registry: &SearchParameterRegistry) {
    register_organization_parameters(registry);
    register_patient_parameters(registry);
    register_observation_parameters(registry);

    registry.register(
        "RiskAssessment",
        SearchParameterDefinition::new(
            "probability",
            SearchParameterType::Number,
            "prediction.probabilityDecimal",
        )
        .with_description("Likelihood of specified outcome"),
    );

    tracing::debug!(
        count = registry.len(),
        "Registered default search parameters"
    );
}

fn register_organization_parameters(registry: &SearchParameterRegistry) {
    // name - matches the name or any alias
    registry.register(
        "Organization",
        SearchParameterDefinition::new("name", SearchParameterType::String, "name")
            .with_paths(["name", "alias"])
            .with_description("A portion of the organization's name or alias"),
    );

    registry.register(
        "Organization",
        SearchParameterDefinition::new("identifier", SearchParameterType::Token, "identifier")
            .with_shape(ElementShape::Identifier)
            .with_description("Any identifier for the organization"),
    );

    registry.register(
        "Organization",
        SearchParameterDefinition::new("type", SearchParameterType::Token, "type.coding")
            .with_description("A code for the type of organization"),
    );

    registry.register(
        "Organization",
        SearchParameterDefinition::new(
            "partof",
            SearchParameterType::Reference,
            "partOf.reference",
        )
        .with_target("Organization")
        .with_description("An organization of which this organization forms a part"),
    );

    registry.register(
        "Organization",
        SearchParameterDefinition::new("address", SearchParameterType::String, "address")
            .with_shape(ElementShape::Address)
            .with_description("A server defined search that may match any of the address parts"),
    );
}

fn register_patient_parameters(registry: &SearchParameterRegistry) {
    registry.register(
        "Patient",
        SearchParameterDefinition::new("name", SearchParameterType::String, "name")
            .with_shape(ElementShape::HumanName)
            .with_description("A portion of either family or given name of the patient"),
    );

    registry.register(
        "Patient",
        SearchParameterDefinition::new("identifier", SearchParameterType::Token, "identifier")
            .with_shape(ElementShape::Identifier)
            .with_description("A patient identifier"),
    );

    registry.register(
        "Patient",
        SearchParameterDefinition::new("email", SearchParameterType::Token, "telecom")
            .with_shape(ElementShape::ContactPoint)
            .with_system("email")
            .with_description("A value in an email contact"),
    );

    registry.register(
        "Patient",
        SearchParameterDefinition::new("phone", SearchParameterType::Token, "telecom")
            .with_shape(ElementShape::ContactPoint)
            .with_system("phone")
            .with_description("A value in a phone contact"),
    );

    registry.register(
        "Patient",
        SearchParameterDefinition::new("address", SearchParameterType::String, "address")
            .with_shape(ElementShape::Address)
            .with_description("A server defined search that may match any of the address parts"),
    );

    registry.register(
        "Patient",
        SearchParameterDefinition::new(
            "organization",
            SearchParameterType::Reference,
            "managingOrganization.reference",
        )
        .with_target("Organization")
        .with_description("The organization that is the custodian of the patient record"),
    );
}

fn register_observation_parameters(registry: &SearchParameterRegistry) {
    registry.register(
        "Observation",
        SearchParameterDefinition::new("code", SearchParameterType::Token, "code.coding")
            .with_description("The code of the observation type"),
    );

    registry.register(
        "Observation",
        SearchParameterDefinition::new(
            "subject",
            SearchParameterType::Reference,
            "subject.reference",
        )
        .with_description("The subject that the observation is about"),
    );

    registry.register(
        "Observation",
        SearchParameterDefinition::new(
            "value-quantity",
            SearchParameterType::Quantity,
            "valueQuantity",
        )
        .with_description("The value of the observation, if the value is a Quantity"),
    );

    registry.register(
        "Observation",
        SearchParameterDefinition::new("value-string", SearchParameterType::String, "valueString")
            .with_description("The value of the observation, if the value is a string"),
    );

    registry.register(
        "Observation",
        SearchParameterDefinition::composite(
            "code-value-quantity",
            vec![
                ComponentSpec::new("code.coding", ComponentType::Token),
                ComponentSpec::new("valueQuantity", ComponentType::Quantity),
            ],
        )
        .with_description("Code and quantity value parameter pair"),
    );

    registry.register(
        "Observation",
        SearchParameterDefinition::composite(
            "code-value-string",
            vec![
                ComponentSpec::new("code.coding", ComponentType::Token),
                ComponentSpec::new("valueString", ComponentType::String),
            ],
        )
        .with_description("Code and string value parameter pair"),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_parameters_registered() {
        let registry = SearchParameterRegistry::new();
        register_default_parameters(&registry);

        assert_eq!(registry.count_for_type("Organization"), 5);
        assert_eq!(registry.count_for_type("Patient"), 6);
        assert_eq!(registry.count_for_type("Observation"), 6);
        assert_eq!(registry.count_for_type("RiskAssessment"), 1);
    }

    #[test]
    fn test_default_parameters_are_valid() {
        let registry = SearchParameterRegistry::new();
        register_default_parameters(&registry);

        for resource_type in registry.resource_types() {
            for param in registry.get_all_for_type(&resource_type) {
                assert!(param.validate().is_ok(), "{resource_type}.{}", param.code);
            }
        }
    }

    #[test]
    fn test_organization_name_covers_alias() {
        let registry = SearchParameterRegistry::new();
        register_default_parameters(&registry);

        let name = registry.get("Organization", "name").unwrap();
        assert_eq!(name.paths, vec!["name", "alias"]);
        assert_eq!(name.shape, ElementShape::Plain);
    }
}

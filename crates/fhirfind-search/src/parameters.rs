use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::QueryBuilderError;
use crate::filter::Operator;

/// FHIR SearchParameter type enumeration (the subset this engine translates).
/// See: https://hl7.org/fhir/R4/search.html#table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchParameterType {
    Number,
    String,
    Token,
    Reference,
    Composite,
    Quantity,
}

impl SearchParameterType {
    /// Parse a search parameter type from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "number" => Some(Self::Number),
            "string" => Some(Self::String),
            "token" => Some(Self::Token),
            "reference" => Some(Self::Reference),
            "composite" => Some(Self::Composite),
            "quantity" => Some(Self::Quantity),
            _ => None,
        }
    }
}

/// Shape of the element a string or token parameter points at.
///
/// Picks the decoder variant: HumanName and Address values are tokenized,
/// Identifiers keep their code in `value`, ContactPoints carry a fixed system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementShape {
    #[default]
    Plain,
    HumanName,
    Address,
    Identifier,
    ContactPoint,
}

/// Supported search modifiers, applied as `name:modifier`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchModifier {
    Exact,
    Contains,
    Type(String), // e.g., subject:Patient
}

impl SearchModifier {
    /// Parse a search modifier from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "exact" => Some(Self::Exact),
            "contains" => Some(Self::Contains),
            other if is_resource_type(other) => Some(Self::Type(other.to_string())),
            _ => None,
        }
    }

    /// Check if this modifier is applicable to the given parameter type.
    pub fn applicable_to(&self, param_type: &SearchParameterType) -> bool {
        match self {
            Self::Exact | Self::Contains => matches!(param_type, SearchParameterType::String),
            Self::Type(_) => matches!(param_type, SearchParameterType::Reference),
        }
    }
}

impl fmt::Display for SearchModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => f.write_str("exact"),
            Self::Contains => f.write_str("contains"),
            Self::Type(t) => f.write_str(t),
        }
    }
}

/// Check if a string looks like a FHIR resource type.
pub fn is_resource_type(s: &str) -> bool {
    // Resource types start with uppercase letter
    s.chars().next().is_some_and(|c| c.is_ascii_uppercase())
        && s.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Comparison prefixes for number and quantity values, e.g. `lt5.0`.
///
/// An absent prefix is not `eq`: it selects the approximation window for
/// numbers and plain equality for quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchPrefix {
    Lt,
    Le,
    Gt,
    Ge,
    Ne,
}

impl fmt::Display for SearchPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SearchPrefix::Lt => "lt",
            SearchPrefix::Le => "le",
            SearchPrefix::Gt => "gt",
            SearchPrefix::Ge => "ge",
            SearchPrefix::Ne => "ne",
        };
        f.write_str(s)
    }
}

impl SearchPrefix {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "lt" => Some(Self::Lt),
            "le" => Some(Self::Le),
            "gt" => Some(Self::Gt),
            "ge" => Some(Self::Ge),
            "ne" => Some(Self::Ne),
            _ => None,
        }
    }

    /// The filter operator this prefix maps to.
    pub const fn operator(self) -> Operator {
        match self {
            SearchPrefix::Lt => Operator::Lt,
            SearchPrefix::Le => Operator::Lte,
            SearchPrefix::Gt => Operator::Gt,
            SearchPrefix::Ge => Operator::Gte,
            SearchPrefix::Ne => Operator::Ne,
        }
    }
}

/// Type tag of one composite component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    Token,
    String,
    Reference,
    Quantity,
    Number,
    Code,
}

impl ComponentType {
    pub const fn as_str(self) -> &'static str {
        match self {
            ComponentType::Token => "token",
            ComponentType::String => "string",
            ComponentType::Reference => "reference",
            ComponentType::Quantity => "quantity",
            ComponentType::Number => "number",
            ComponentType::Code => "code",
        }
    }
}

impl FromStr for ComponentType {
    type Err = QueryBuilderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "token" => Ok(Self::Token),
            "string" => Ok(Self::String),
            "reference" => Ok(Self::Reference),
            "quantity" => Ok(Self::Quantity),
            "number" => Ok(Self::Number),
            "code" => Ok(Self::Code),
            other => Err(QueryBuilderError::UnsupportedComponentType(other.to_string())),
        }
    }
}

/// One declared component of a composite parameter: its document path and
/// type. Externally encoded as `"path|type"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ComponentSpec {
    pub path: String,
    pub component_type: ComponentType,
}

impl ComponentSpec {
    pub fn new(path: impl Into<String>, component_type: ComponentType) -> Self {
        Self {
            path: path.into(),
            component_type,
        }
    }

    /// Parse a list of `"path|type"` encodings.
    pub fn parse_all<S: AsRef<str>>(specs: &[S]) -> Result<Vec<Self>, QueryBuilderError> {
        specs.iter().map(|s| s.as_ref().parse()).collect()
    }
}

impl FromStr for ComponentSpec {
    type Err = QueryBuilderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (path, kind) = s
            .rsplit_once('|')
            .ok_or_else(|| QueryBuilderError::InvalidComponentSpec(s.to_string()))?;
        if path.is_empty() {
            return Err(QueryBuilderError::InvalidComponentSpec(s.to_string()));
        }
        Ok(Self::new(path, kind.parse()?))
    }
}

impl TryFrom<String> for ComponentSpec {
    type Error = QueryBuilderError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ComponentSpec> for String {
    fn from(spec: ComponentSpec) -> Self {
        spec.to_string()
    }
}

impl fmt::Display for ComponentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.path, self.component_type.as_str())
    }
}

/// A search parameter definition: which builder to use and where in the
/// document it looks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParameterDefinition {
    /// The code used in search queries (e.g., "name", "identifier")
    pub code: String,
    #[serde(rename = "type")]
    pub kind: SearchParameterType,
    /// Dotted document paths. String parameters OR across all of them;
    /// every other type uses the first.
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default)]
    pub shape: ElementShape,
    /// Default resource type for bare-id reference values
    #[serde(default)]
    pub target: Option<String>,
    /// Fixed system for contact-point tokens (e.g. "email")
    #[serde(default)]
    pub system: Option<String>,
    #[serde(default)]
    pub components: Vec<ComponentSpec>,
    #[serde(default)]
    pub description: Option<String>,
}

impl SearchParameterDefinition {
    pub fn new(
        code: impl Into<String>,
        kind: SearchParameterType,
        path: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            kind,
            paths: vec![path.into()],
            shape: ElementShape::Plain,
            target: None,
            system: None,
            components: Vec::new(),
            description: None,
        }
    }

    /// Create a composite parameter from its ordered components.
    pub fn composite(code: impl Into<String>, components: Vec<ComponentSpec>) -> Self {
        Self {
            code: code.into(),
            kind: SearchParameterType::Composite,
            paths: Vec::new(),
            shape: ElementShape::Plain,
            target: None,
            system: None,
            components,
            description: None,
        }
    }

    #[must_use]
    pub fn with_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paths = paths.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_shape(mut self, shape: ElementShape) -> Self {
        self.shape = shape;
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// The path used by single-path builders.
    pub fn primary_path(&self) -> Option<&str> {
        self.paths.first().map(String::as_str)
    }

    /// Check the definition is internally consistent.
    pub fn validate(&self) -> Result<(), String> {
        if self.code.is_empty() {
            return Err("search parameter code must not be empty".to_string());
        }
        match self.kind {
            SearchParameterType::Composite => {
                if self.components.is_empty() {
                    return Err(format!(
                        "composite parameter '{}' has no components",
                        self.code
                    ));
                }
            }
            _ => {
                if self.paths.is_empty() || self.paths.iter().any(String::is_empty) {
                    return Err(format!("parameter '{}' needs a non-empty path", self.code));
                }
            }
        }
        if self.shape == ElementShape::ContactPoint && self.system.is_none() {
            return Err(format!(
                "contact-point parameter '{}' needs a system",
                self.code
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_operators() {
        assert_eq!(SearchPrefix::Lt.operator(), Operator::Lt);
        assert_eq!(SearchPrefix::Le.operator(), Operator::Lte);
        assert_eq!(SearchPrefix::Gt.operator(), Operator::Gt);
        assert_eq!(SearchPrefix::Ge.operator(), Operator::Gte);
        assert_eq!(SearchPrefix::Ne.operator(), Operator::Ne);
        assert_eq!(SearchPrefix::parse("eq"), None);
        assert_eq!(SearchPrefix::parse("ap"), None);
    }

    #[test]
    fn test_component_spec_parse() {
        let spec: ComponentSpec = "code.coding|token".parse().unwrap();
        assert_eq!(spec.path, "code.coding");
        assert_eq!(spec.component_type, ComponentType::Token);
        assert_eq!(spec.to_string(), "code.coding|token");
    }

    #[test]
    fn test_component_spec_errors() {
        assert_eq!(
            "valueDate|date".parse::<ComponentSpec>(),
            Err(QueryBuilderError::UnsupportedComponentType("date".to_string()))
        );
        assert!(matches!(
            "valueString".parse::<ComponentSpec>(),
            Err(QueryBuilderError::InvalidComponentSpec(_))
        ));
        assert!(matches!(
            "|token".parse::<ComponentSpec>(),
            Err(QueryBuilderError::InvalidComponentSpec(_))
        ));
    }

    #[test]
    fn test_modifier_parse() {
        assert_eq!(SearchModifier::parse("exact"), Some(SearchModifier::Exact));
        assert_eq!(
            SearchModifier::parse("Patient"),
            Some(SearchModifier::Type("Patient".to_string()))
        );
        assert_eq!(SearchModifier::parse("missing"), None);
        assert!(SearchModifier::Exact.applicable_to(&SearchParameterType::String));
        assert!(!SearchModifier::Exact.applicable_to(&SearchParameterType::Token));
    }

    #[test]
    fn test_definition_validate() {
        let def = SearchParameterDefinition::new("name", SearchParameterType::String, "name");
        assert!(def.validate().is_ok());

        let def = SearchParameterDefinition::composite("combo", Vec::new());
        assert!(def.validate().is_err());

        let def = SearchParameterDefinition::new("email", SearchParameterType::Token, "telecom")
            .with_shape(ElementShape::ContactPoint);
        assert!(def.validate().is_err());
    }
}

//! Evaluation of structured filters against JSON documents.
//!
//! Follows document-store semantics:
//! - a dotted path descends through objects and fans out over arrays, so a
//!   field condition holds if any reached value satisfies it
//! - conditions on different paths of one object are independent (no
//!   element pinning across arrays)
//! - each comparison operator is checked on its own over the reached values;
//!   `$ne` holds only when no reached value equals the operand
//! - numbers compare numerically, strings lexically, and mixed types never
//!   compare

use std::cmp::Ordering;
use std::str::FromStr;

use fhirfind_search::{Condition, Filter, Operator, Scalar};
use regex::{Regex, RegexBuilder};
use rust_decimal::Decimal;
use serde_json::{Number, Value};

use crate::error::StorageError;

/// A filter prepared for repeated evaluation, with its regexes compiled.
#[derive(Debug, Clone)]
pub struct FilterMatcher {
    root: Node,
}

#[derive(Debug, Clone)]
enum Node {
    Fields(Vec<(Vec<String>, Test)>),
    And(Vec<Node>),
    Or(Vec<Node>),
}

#[derive(Debug, Clone)]
enum Test {
    Equals(Scalar),
    Compare(Vec<(Operator, Scalar)>),
    Regex(Regex),
}

impl FilterMatcher {
    /// Compile a filter.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidFilter` for an invalid regex pattern or a
    /// logical operator used as a field comparison.
    pub fn compile(filter: &Filter) -> Result<Self, StorageError> {
        Ok(Self {
            root: compile_node(filter)?,
        })
    }

    /// Check if a document matches the filter.
    pub fn matches(&self, document: &Value) -> bool {
        self.root.matches(document)
    }
}

/// One-off evaluation of `filter` against `document`.
pub fn matches(filter: &Filter, document: &Value) -> Result<bool, StorageError> {
    Ok(FilterMatcher::compile(filter)?.matches(document))
}

fn compile_node(filter: &Filter) -> Result<Node, StorageError> {
    match filter {
        Filter::Fields(fields) => fields
            .iter()
            .map(|(path, condition)| {
                let segments = path.split('.').map(str::to_string).collect();
                Ok((segments, compile_condition(path, condition)?))
            })
            .collect::<Result<_, StorageError>>()
            .map(Node::Fields),
        Filter::And(filters) => filters
            .iter()
            .map(compile_node)
            .collect::<Result<_, _>>()
            .map(Node::And),
        Filter::Or(filters) => filters
            .iter()
            .map(compile_node)
            .collect::<Result<_, _>>()
            .map(Node::Or),
    }
}

fn compile_condition(path: &str, condition: &Condition) -> Result<Test, StorageError> {
    match condition {
        Condition::Equals(value) => Ok(Test::Equals(value.clone())),
        Condition::Compare(ops) => {
            if let Some((op, _)) = ops.iter().find(|(op, _)| !is_comparison(*op)) {
                return Err(StorageError::invalid_filter(format!(
                    "operator {op} is not a comparison (field '{path}')"
                )));
            }
            Ok(Test::Compare(ops.clone()))
        }
        Condition::Regex {
            pattern,
            case_insensitive,
        } => RegexBuilder::new(pattern)
            .case_insensitive(*case_insensitive)
            .build()
            .map(Test::Regex)
            .map_err(|e| {
                StorageError::invalid_filter(format!("invalid regex for field '{path}': {e}"))
            }),
    }
}

fn is_comparison(op: Operator) -> bool {
    matches!(
        op,
        Operator::Lt | Operator::Lte | Operator::Gt | Operator::Gte | Operator::Ne
    )
}

impl Node {
    fn matches(&self, document: &Value) -> bool {
        match self {
            Node::Fields(fields) => fields.iter().all(|(path, test)| {
                let mut reached = Vec::new();
                collect_values(document, path, &mut reached);
                test.matches(&reached)
            }),
            Node::And(nodes) => nodes.iter().all(|node| node.matches(document)),
            Node::Or(nodes) => nodes.iter().any(|node| node.matches(document)),
        }
    }
}

/// Gather every leaf value reached by `path`, fanning out over arrays.
fn collect_values<'a>(value: &'a Value, path: &[String], out: &mut Vec<&'a Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_values(item, path, out);
            }
        }
        _ => match path.split_first() {
            None => out.push(value),
            Some((head, rest)) => {
                if let Some(child) = value.get(head.as_str()) {
                    collect_values(child, rest, out);
                }
            }
        },
    }
}

impl Test {
    fn matches(&self, reached: &[&Value]) -> bool {
        match self {
            Test::Equals(expected) => reached.iter().any(|value| scalar_eq(value, expected)),
            Test::Compare(ops) => ops.iter().all(|(op, operand)| match op {
                Operator::Ne => !reached.iter().any(|value| scalar_eq(value, operand)),
                _ => reached.iter().any(|value| {
                    compare(value, operand).is_some_and(|ordering| satisfies(*op, ordering))
                }),
            }),
            Test::Regex(regex) => reached
                .iter()
                .any(|value| value.as_str().is_some_and(|s| regex.is_match(s))),
        }
    }
}

fn satisfies(op: Operator, ordering: Ordering) -> bool {
    match op {
        Operator::Lt => ordering == Ordering::Less,
        Operator::Lte => ordering != Ordering::Greater,
        Operator::Gt => ordering == Ordering::Greater,
        Operator::Gte => ordering != Ordering::Less,
        _ => false,
    }
}

fn scalar_eq(value: &Value, expected: &Scalar) -> bool {
    compare(value, expected) == Some(Ordering::Equal)
}

/// Order a document value against a filter operand of the same kind.
fn compare(value: &Value, operand: &Scalar) -> Option<Ordering> {
    match (value, operand) {
        (Value::String(s), Scalar::String(expected)) => Some(s.as_str().cmp(expected.as_str())),
        (Value::Number(n), Scalar::Number(expected)) => {
            number_to_decimal(n).map(|d| d.cmp(expected))
        }
        _ => None,
    }
}

fn number_to_decimal(number: &Number) -> Option<Decimal> {
    if let Some(i) = number.as_i64() {
        return Some(Decimal::from(i));
    }
    if let Some(u) = number.as_u64() {
        return Some(Decimal::from(u));
    }
    let text = number.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn organization() -> Value {
        json!({
            "resourceType": "Organization",
            "name": "Health Level Seven International",
            "alias": ["HLSI", "A good test"],
            "identifier": [{"system": "http://hl7.org.fhir/sid/us-npi", "value": "1144221847"}],
            "type": [{"coding": [{"system": "http://hl7.org/fhir/organization-type", "code": "prov"}]}],
            "extension": [{"valueDecimal": 99.995}]
        })
    }

    fn check(filter: &Filter) -> bool {
        matches(filter, &organization()).unwrap()
    }

    #[test]
    fn test_equality_through_arrays() {
        let filter = Filter::field("type.coding.code", Condition::equals("prov"));
        assert!(check(&filter));
        let filter = Filter::field("alias", Condition::equals("HLSI"));
        assert!(check(&filter));
        let filter = Filter::field("type.coding.code", Condition::equals("PROV"));
        assert!(!check(&filter));
    }

    #[test]
    fn test_missing_field_never_equals() {
        let filter = Filter::field("partOf.reference", Condition::equals("Organization/1"));
        assert!(!check(&filter));
    }

    #[test]
    fn test_regex_case_insensitive() {
        assert!(check(&Filter::field("name", Condition::starts_with("HeaLth"))));
        assert!(check(&Filter::field("alias", Condition::starts_with("A gO"))));
        assert!(!check(&Filter::field("name", Condition::starts_with("Level"))));
        assert!(check(&Filter::field("name", Condition::contains("level"))));
    }

    #[test]
    fn test_numeric_comparisons() {
        let window = |lower: i64, upper: i64| {
            Filter::field(
                "extension.valueDecimal",
                Condition::Compare(vec![
                    (Operator::Gte, Decimal::from(lower).into()),
                    (Operator::Lt, Decimal::from(upper).into()),
                ]),
            )
        };
        assert!(check(&window(99, 101)));
        assert!(!check(&window(100, 101)));

        let exact = Decimal::from_str("99.995").unwrap();
        assert!(check(&Filter::field(
            "extension.valueDecimal",
            Condition::equals(exact)
        )));
    }

    #[test]
    fn test_ne_requires_no_equal_value() {
        let ne = |code: &str| {
            Filter::field(
                "alias",
                Condition::compare(Operator::Ne, Scalar::from(code)),
            )
        };
        assert!(!check(&ne("HLSI")));
        assert!(check(&ne("OTHER")));
        // absent fields satisfy $ne
        assert!(check(&Filter::field(
            "missing",
            Condition::compare(Operator::Ne, Scalar::from("x"))
        )));
    }

    #[test]
    fn test_mixed_types_do_not_compare() {
        let filter = Filter::field(
            "identifier.value",
            Condition::compare(Operator::Gt, Decimal::from(5)),
        );
        assert!(!check(&filter));
    }

    #[test]
    fn test_logical_nodes() {
        let name = Filter::field("name", Condition::starts_with("health"));
        let missing = Filter::field("name", Condition::equals("nope"));
        assert!(check(&Filter::Or(vec![missing.clone(), name.clone()])));
        assert!(!check(&Filter::And(vec![missing, name])));
        assert!(check(&Filter::match_all()));
    }

    #[test]
    fn test_invalid_filters() {
        let bad_regex = Filter::field(
            "name",
            Condition::Regex {
                pattern: "(".to_string(),
                case_insensitive: false,
            },
        );
        assert!(matches!(
            FilterMatcher::compile(&bad_regex),
            Err(StorageError::InvalidFilter { .. })
        ));

        let logical_as_comparison =
            Filter::field("name", Condition::compare(Operator::Or, Scalar::from("x")));
        assert!(matches!(
            FilterMatcher::compile(&logical_as_comparison),
            Err(StorageError::InvalidFilter { .. })
        ));
    }
}

//! Structured filter model.
//!
//! A [`Filter`] is the document-store-native query representation produced by
//! the builders in [`crate::types`]. It serializes directly to the query
//! language of a document database:
//!
//! ```text
//! { "code.coding.system": "http://loinc.org", "valueQuantity.value": { "$lt": 12 } }
//! { "$or": [ { "name": { "$regex": "^health", "$options": "i" } }, { "alias": ... } ] }
//! ```
//!
//! The operator vocabulary is closed ([`Operator`]); nothing here is mutable
//! at runtime.

use std::fmt;

use indexmap::IndexMap;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value;

/// Key carrying regex flags next to `$regex`.
pub const REGEX_OPTIONS_KEY: &str = "$options";

/// Filter operators understood by the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Lt,
    Lte,
    Gt,
    Gte,
    Ne,
    Regex,
    And,
    Or,
}

impl Operator {
    pub const fn as_str(self) -> &'static str {
        match self {
            Operator::Lt => "$lt",
            Operator::Lte => "$lte",
            Operator::Gt => "$gt",
            Operator::Gte => "$gte",
            Operator::Ne => "$ne",
            Operator::Regex => "$regex",
            Operator::And => "$and",
            Operator::Or => "$or",
        }
    }

    /// Parse an operator key such as `$gte`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "$lt" => Some(Self::Lt),
            "$lte" => Some(Self::Lte),
            "$gt" => Some(Self::Gt),
            "$gte" => Some(Self::Gte),
            "$ne" => Some(Self::Ne),
            "$regex" => Some(Self::Regex),
            "$and" => Some(Self::And),
            "$or" => Some(Self::Or),
            _ => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A literal compared against a document field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scalar {
    String(String),
    Number(Decimal),
}

impl Scalar {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            Scalar::Number(_) => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Scalar::Number(n) => Some(*n),
            Scalar::String(_) => None,
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

impl From<Decimal> for Scalar {
    fn from(value: Decimal) -> Self {
        Scalar::Number(value)
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::String(s) => serializer.serialize_str(s),
            Scalar::Number(n) => decimal_to_number(n).serialize(serializer),
        }
    }
}

/// Convert a decimal into a JSON number.
///
/// Integral values become JSON integers. Fractional values go through the
/// decimal's canonical text so `99.995` stays the nearest double to `99.995`.
pub fn decimal_to_number(value: &Decimal) -> serde_json::Number {
    let normalized = value.normalize();
    if normalized.scale() == 0
        && let Some(int) = normalized.to_i64()
    {
        return serde_json::Number::from(int);
    }
    normalized
        .to_string()
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .expect("decimal text always parses to a finite f64")
}

/// The condition applied to a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// `field: value`
    Equals(Scalar),
    /// `field: { $op: value, ... }`, operators kept in insertion order.
    Compare(Vec<(Operator, Scalar)>),
    /// `field: { $regex: pattern, $options: "i" }`
    Regex {
        pattern: String,
        case_insensitive: bool,
    },
}

impl Condition {
    pub fn equals(value: impl Into<Scalar>) -> Self {
        Condition::Equals(value.into())
    }

    pub fn compare(op: Operator, value: impl Into<Scalar>) -> Self {
        Condition::Compare(vec![(op, value.into())])
    }

    /// Case-insensitive "starts with" match on literal text.
    pub fn starts_with(text: &str) -> Self {
        Condition::Regex {
            pattern: format!("^{}", regex::escape(text)),
            case_insensitive: true,
        }
    }

    /// Case-insensitive substring match on literal text.
    pub fn contains(text: &str) -> Self {
        Condition::Regex {
            pattern: regex::escape(text),
            case_insensitive: true,
        }
    }
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Condition::Equals(value) => value.serialize(serializer),
            Condition::Compare(ops) => {
                let mut map = serializer.serialize_map(Some(ops.len()))?;
                for (op, value) in ops {
                    map.serialize_entry(op.as_str(), value)?;
                }
                map.end()
            }
            Condition::Regex {
                pattern,
                case_insensitive,
            } => {
                let len = if *case_insensitive { 2 } else { 1 };
                let mut map = serializer.serialize_map(Some(len))?;
                map.serialize_entry(Operator::Regex.as_str(), pattern)?;
                if *case_insensitive {
                    map.serialize_entry(REGEX_OPTIONS_KEY, "i")?;
                }
                map.end()
            }
        }
    }
}

/// A structured document-store filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Field conditions that must all hold. Empty means "match everything".
    Fields(IndexMap<String, Condition>),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Default for Filter {
    fn default() -> Self {
        Self::match_all()
    }
}

impl Filter {
    pub fn match_all() -> Self {
        Filter::Fields(IndexMap::new())
    }

    /// A filter with a single field condition.
    pub fn field(path: impl Into<String>, condition: Condition) -> Self {
        let mut fields = IndexMap::with_capacity(1);
        fields.insert(path.into(), condition);
        Filter::Fields(fields)
    }

    pub fn is_match_all(&self) -> bool {
        matches!(self, Filter::Fields(fields) if fields.is_empty())
    }

    /// `$or` over the alternatives; a single alternative is returned as-is.
    pub fn any_of(mut filters: Vec<Filter>) -> Self {
        if filters.len() == 1 {
            filters.remove(0)
        } else {
            Filter::Or(filters)
        }
    }

    /// Shallow field-level merge.
    ///
    /// Distinct field paths coexist in one object. A repeated path or a
    /// logical operand is combined through `$and` instead, so no condition
    /// is ever overwritten.
    #[must_use]
    pub fn merge(self, other: Filter) -> Filter {
        if self.is_match_all() {
            return other;
        }
        if other.is_match_all() {
            return self;
        }
        match (self, other) {
            (Filter::Fields(mut left), Filter::Fields(right))
                if right.keys().all(|k| !left.contains_key(k)) =>
            {
                left.extend(right);
                Filter::Fields(left)
            }
            (Filter::And(mut left), Filter::And(right)) => {
                left.extend(right);
                Filter::And(left)
            }
            (Filter::And(mut left), right) => {
                left.push(right);
                Filter::And(left)
            }
            (left, right) => Filter::And(vec![left, right]),
        }
    }

    /// Merge a sequence of filters left to right.
    pub fn merge_all(filters: impl IntoIterator<Item = Filter>) -> Filter {
        filters
            .into_iter()
            .fold(Filter::match_all(), |acc, next| acc.merge(next))
    }

    pub fn to_value(&self) -> Value {
        // Serializing into a Value cannot fail: every key is a string.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Filter::Fields(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (path, condition) in fields {
                    map.serialize_entry(path, condition)?;
                }
                map.end()
            }
            Filter::And(filters) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(Operator::And.as_str(), &FilterList(filters))?;
                map.end()
            }
            Filter::Or(filters) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(Operator::Or.as_str(), &FilterList(filters))?;
                map.end()
            }
        }
    }
}

struct FilterList<'a>(&'a [Filter]);

impl Serialize for FilterList<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for filter in self.0 {
            seq.serialize_element(filter)?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_operator_round_trip() {
        for op in [
            Operator::Lt,
            Operator::Lte,
            Operator::Gt,
            Operator::Gte,
            Operator::Ne,
            Operator::Regex,
            Operator::And,
            Operator::Or,
        ] {
            assert_eq!(Operator::parse(op.as_str()), Some(op));
        }
        assert_eq!(Operator::parse("$in"), None);
    }

    #[test]
    fn test_decimal_to_number() {
        assert_eq!(Value::Number(decimal_to_number(&dec("12"))), json!(12));
        assert_eq!(Value::Number(decimal_to_number(&dec("12.00"))), json!(12));
        assert_eq!(Value::Number(decimal_to_number(&dec("99.995"))), json!(99.995));
        assert_eq!(Value::Number(decimal_to_number(&dec("-0.5"))), json!(-0.5));
        // beyond i64 the value goes through f64 instead of collapsing
        assert_eq!(decimal_to_number(&Decimal::MAX).as_f64(), Some(2f64.powi(96)));
        assert!(decimal_to_number(&Decimal::MIN).as_f64().is_some_and(|f| f < 0.0));
    }

    #[test]
    fn test_condition_serialization() {
        let cond = Condition::compare(Operator::Lt, dec("12"));
        assert_eq!(serde_json::to_value(&cond).unwrap(), json!({"$lt": 12}));

        let cond = Condition::starts_with("bar5");
        assert_eq!(
            serde_json::to_value(&cond).unwrap(),
            json!({"$regex": "^bar5", "$options": "i"})
        );

        let cond = Condition::equals("mm");
        assert_eq!(serde_json::to_value(&cond).unwrap(), json!("mm"));
    }

    #[test]
    fn test_regex_text_is_escaped() {
        let cond = Condition::contains("a.b(c)");
        let Condition::Regex { pattern, .. } = cond else {
            panic!("expected regex condition");
        };
        assert_eq!(pattern, r"a\.b\(c\)");
    }

    #[test]
    fn test_merge_distinct_fields() {
        let merged = Filter::field("a", Condition::equals("1"))
            .merge(Filter::field("b", Condition::equals("2")));
        assert_eq!(merged.to_value(), json!({"a": "1", "b": "2"}));
    }

    #[test]
    fn test_merge_colliding_fields_uses_and() {
        let merged = Filter::field("a", Condition::equals("1"))
            .merge(Filter::field("a", Condition::equals("2")));
        assert_eq!(merged.to_value(), json!({"$and": [{"a": "1"}, {"a": "2"}]}));
    }

    #[test]
    fn test_merge_with_match_all() {
        let filter = Filter::field("a", Condition::equals("1"));
        assert_eq!(Filter::match_all().merge(filter.clone()), filter);
        assert_eq!(filter.clone().merge(Filter::match_all()), filter);
        assert_eq!(Filter::merge_all(Vec::new()).to_value(), json!({}));
    }

    #[test]
    fn test_merge_flattens_and() {
        let merged = Filter::And(vec![Filter::field("a", Condition::equals("1"))])
            .merge(Filter::Or(vec![Filter::field("b", Condition::equals("2"))]));
        assert_eq!(
            merged.to_value(),
            json!({"$and": [{"a": "1"}, {"$or": [{"b": "2"}]}]})
        );
    }

    #[test]
    fn test_any_of_single() {
        let filter = Filter::field("a", Condition::equals("1"));
        assert_eq!(Filter::any_of(vec![filter.clone()]), filter);
        assert!(matches!(
            Filter::any_of(vec![filter.clone(), filter]),
            Filter::Or(_)
        ));
    }
}

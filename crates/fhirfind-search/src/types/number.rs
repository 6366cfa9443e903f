//! Number and quantity search parameter implementation.
//!
//! Number search supports the following prefixes:
//! - (none): implicit precision range derived from the literal's text
//! - ne: not equal
//! - gt: greater than
//! - lt: less than
//! - ge: greater or equal
//! - le: less or equal
//!
//! Quantities use the same prefixes, but an unprefixed quantity is an exact
//! equality on the value field rather than a precision range.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::error::QueryBuilderError;
use crate::filter::{Condition, Filter, Operator, decimal_to_number};
use crate::parameters::SearchPrefix;
use crate::parser::extract_prefix;

static NUMERIC_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").expect("Invalid number regex")
});

/// Parse a decimal literal, keeping the scale written in the text
/// (`"100.00"` has scale 2).
///
/// Digits are never rounded away: a literal that does not fit a decimal
/// exactly is a [`QueryBuilderError::NumericPrecision`] error.
pub fn parse_numeric_literal(literal: &str) -> Result<Decimal, QueryBuilderError> {
    if !NUMERIC_LITERAL.is_match(literal) {
        return Err(QueryBuilderError::InvalidNumericLiteral(literal.to_string()));
    }
    let too_precise = || QueryBuilderError::NumericPrecision(literal.to_string());

    let unsigned = literal.strip_prefix('+').unwrap_or(literal);
    match unsigned.split_once(['e', 'E']) {
        None => Decimal::from_str_exact(unsigned).map_err(|_| too_precise()),
        Some((mantissa, _)) => {
            Decimal::from_str_exact(mantissa).map_err(|_| too_precise())?;
            Decimal::from_scientific(unsigned).map_err(|_| too_precise())
        }
    }
}

/// Comparison keyed by prefix: `{ $lt: value }`, `{ $lte: value }`, ...
pub fn exact(prefix: SearchPrefix, value: Decimal) -> Condition {
    Condition::compare(prefix.operator(), value)
}

/// Approximation window for an unprefixed literal.
///
/// The half-width is `0.5 × 10^-d` where `d` is the number of fractional
/// digits written in the literal, so `100` gives `[99.5, 100.5)` and
/// `100.00` gives `[99.995, 100.005)`.
///
/// Returns `None` when the bounds cannot be represented: the half-width needs
/// a 29th fractional digit, the decimal arithmetic would round, or the bounds
/// are no longer ordered around `value` once converted to JSON numbers.
pub fn approximate(value: Decimal) -> Option<Condition> {
    let half_width = Decimal::try_new(5, value.scale() + 1).ok()?;
    let lower = value.checked_sub(half_width)?;
    let upper = value.checked_add(half_width)?;

    if upper.checked_sub(lower)? != half_width.checked_mul(Decimal::TWO)? {
        return None;
    }

    let as_f64 = |d: &Decimal| decimal_to_number(d).as_f64();
    match (as_f64(&lower), as_f64(&value), as_f64(&upper)) {
        (Some(l), Some(v), Some(u)) if l < v && v < u => {}
        _ => return None,
    }

    Some(Condition::Compare(vec![
        (Operator::Gte, lower.into()),
        (Operator::Lt, upper.into()),
    ]))
}

/// Build the condition for a number search value such as `lt12` or `100.00`.
pub fn build_number_query(raw: &str) -> Result<Condition, QueryBuilderError> {
    let (prefix, literal) = extract_prefix(raw.trim());
    let value = parse_numeric_literal(literal)?;

    match prefix {
        Some(prefix) => Ok(exact(prefix, value)),
        None => approximate(value)
            .ok_or_else(|| QueryBuilderError::NumericPrecision(literal.to_string())),
    }
}

/// Build a filter for a number search value against one document field.
pub fn build_number_search(raw: &str, path: &str) -> Result<Filter, QueryBuilderError> {
    Ok(Filter::field(path, build_number_query(raw)?))
}

/// A parsed `[prefix]value|system|unit` quantity search value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantityValue {
    pub prefix: Option<SearchPrefix>,
    pub value: Decimal,
    /// Parsed but not used for matching.
    pub system: Option<String>,
    pub unit: Option<String>,
}

/// Parse a quantity search value.
///
/// Accepted forms are `value|system|unit`, with system and unit possibly
/// empty, and a bare `value`.
pub fn parse_quantity_value(raw: &str) -> Result<QuantityValue, QueryBuilderError> {
    let parts: Vec<&str> = raw.trim().split('|').collect();

    let (number, system, unit) = match parts.as_slice() {
        [number] => (*number, None, None),
        [number, system, unit] => (*number, Some(*system), Some(*unit)),
        _ => {
            return Err(QueryBuilderError::invalid_value(format!(
                "quantity '{raw}' must be value|system|unit"
            )));
        }
    };

    let (prefix, literal) = extract_prefix(number);
    let value = parse_numeric_literal(literal)?;
    let non_empty = |s: Option<&str>| s.filter(|s| !s.is_empty()).map(str::to_string);

    Ok(QuantityValue {
        prefix,
        value,
        system: non_empty(system),
        unit: non_empty(unit),
    })
}

/// Build a filter for a quantity search value scoped under `path`.
///
/// Produces `{ "<path>.code": unit, "<path>.value": <condition> }`. Without a
/// prefix the value condition is plain equality (no precision range).
pub fn build_quantity_query(raw: &str, path: &str) -> Result<Filter, QueryBuilderError> {
    let quantity = parse_quantity_value(raw)?;

    let value_condition = match quantity.prefix {
        Some(prefix) => exact(prefix, quantity.value),
        None => Condition::equals(quantity.value),
    };

    let mut filter = Filter::match_all();
    if let Some(unit) = quantity.unit {
        filter = filter.merge(Filter::field(format!("{path}.code"), Condition::equals(unit)));
    }
    Ok(filter.merge(Filter::field(format!("{path}.value"), value_condition)))
}

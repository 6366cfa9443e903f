//! Token search parameter implementation.
//!
//! Token search is used for coded elements (Coding, CodeableConcept,
//! Identifier, ContactPoint, code) and accepts:
//! - `system|code` - match both system and code
//! - `system|` - match the system only
//! - `|code` or `code` - match the code only
//!
//! Only the parts actually supplied produce a clause.

use crate::error::QueryBuilderError;
use crate::filter::{Condition, Filter};

/// Field holding the code of a Coding.
pub const CODING_CODE_FIELD: &str = "code";
/// Field holding the value of an Identifier or ContactPoint.
pub const IDENTIFIER_VALUE_FIELD: &str = "value";

/// The shape of a token search value, decided once at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenValue<'a> {
    SystemAndCode { system: &'a str, code: &'a str },
    SystemOnly { system: &'a str },
    CodeOnly { code: &'a str },
}

/// Parse a token value, splitting on the first `|` only.
pub fn parse_token_value(value: &str) -> Result<TokenValue<'_>, QueryBuilderError> {
    let token = match value.split_once('|') {
        Some((system, code)) => match (system.is_empty(), code.is_empty()) {
            (false, false) => TokenValue::SystemAndCode { system, code },
            (false, true) => TokenValue::SystemOnly { system },
            (true, false) => TokenValue::CodeOnly { code },
            (true, true) => {
                return Err(QueryBuilderError::invalid_value(
                    "token value '|' has neither system nor code",
                ));
            }
        },
        None if value.is_empty() => {
            return Err(QueryBuilderError::invalid_value("empty token value"));
        }
        None => TokenValue::CodeOnly { code: value },
    };
    Ok(token)
}

/// Build a token filter on `{path}.system` / `{path}.{code_field}`.
pub fn build_token_filter(
    raw: &str,
    path: &str,
    code_field: &str,
) -> Result<Filter, QueryBuilderError> {
    let system_field = format!("{path}.system");
    let code_field = format!("{path}.{code_field}");

    let filter = match parse_token_value(raw)? {
        TokenValue::SystemAndCode { system, code } => {
            Filter::field(system_field, Condition::equals(system))
                .merge(Filter::field(code_field, Condition::equals(code)))
        }
        TokenValue::SystemOnly { system } => Filter::field(system_field, Condition::equals(system)),
        TokenValue::CodeOnly { code } => Filter::field(code_field, Condition::equals(code)),
    };
    Ok(filter)
}

/// Token search over a Coding / CodeableConcept.coding path.
pub fn build_token_query(raw: &str, path: &str) -> Result<Filter, QueryBuilderError> {
    build_token_filter(raw, path, CODING_CODE_FIELD)
}

/// Token search over an Identifier path, whose code lives in `value`.
pub fn build_identifier_query(raw: &str, path: &str) -> Result<Filter, QueryBuilderError> {
    build_token_filter(raw, path, IDENTIFIER_VALUE_FIELD)
}

/// Token search over a ContactPoint with a fixed system, e.g. `email`.
///
/// The whole raw value is the contact value: `{path}.system = system` and
/// `{path}.value = raw`.
pub fn build_contact_point_query(
    raw: &str,
    path: &str,
    system: &str,
) -> Result<Filter, QueryBuilderError> {
    if raw.is_empty() {
        return Err(QueryBuilderError::invalid_value("empty contact value"));
    }
    Ok(
        Filter::field(format!("{path}.system"), Condition::equals(system)).merge(Filter::field(
            format!("{path}.{IDENTIFIER_VALUE_FIELD}"),
            Condition::equals(raw),
        )),
    )
}

/// Plain `code` element: direct equality on the path.
pub fn build_code_query(raw: &str, path: &str) -> Result<Filter, QueryBuilderError> {
    if raw.is_empty() {
        return Err(QueryBuilderError::invalid_value("empty code value"));
    }
    Ok(Filter::field(path, Condition::equals(raw)))
}

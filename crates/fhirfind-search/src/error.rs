//! Error types produced while translating search values into filters.

use thiserror::Error;

/// Errors raised by the per-type query builders.
///
/// Every failure is surfaced to the caller; builders never fall back to an
/// empty filter, since that would read as "no results" downstream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryBuilderError {
    /// The value (after prefix stripping) is not a decimal number.
    #[error("Invalid numeric literal: '{0}'")]
    InvalidNumericLiteral(String),

    /// The literal is well formed but needs more digits than a decimal holds,
    /// or its approximation window collapses once written as JSON numbers.
    #[error("Numeric literal '{0}' exceeds the supported precision")]
    NumericPrecision(String),

    /// A composite group has a different number of `$`-joined parts than
    /// there are declared components.
    #[error("Composite parameter expects {expected} components, got {found}")]
    CompositeArity { expected: usize, found: usize },

    /// A composite component declares a type with no decoder.
    #[error("Unsupported composite component type '{0}'")]
    UnsupportedComponentType(String),

    /// A composite component spec is not of the form `path|type`.
    #[error("Invalid composite component spec '{0}'")]
    InvalidComponentSpec(String),

    #[error("Invalid search value: {0}")]
    InvalidSearchValue(String),

    #[error("Invalid modifier '{0}' for parameter type")]
    InvalidModifier(String),
}

impl QueryBuilderError {
    pub fn invalid_value(msg: impl Into<String>) -> Self {
        Self::InvalidSearchValue(msg.into())
    }
}

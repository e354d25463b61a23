//! Error types for template rendering and interpolation.
//!
//! Every failure in this crate is a [`QueryError`] carrying an [`ErrorCode`],
//! a human readable message, optional context (suggestions, help text, the
//! template being rendered) and an optional source error.
//!
//! # Error Codes
//!
//! Error codes follow a pattern: Q{category}{number}
//! - 1xxx: Template syntax errors (unterminated placeholder, bad name)
//! - 2xxx: Resolution errors (too few values, unknown name, ...)
//! - 3xxx: Nested fragment errors
//! - 4xxx: Interpolation errors (unclosed literal, missing argument)
//! - 7xxx: Configuration errors
//! - 9xxx: Internal errors
//!
//! ```rust
//! use sqlweave_query::{ErrorCode, QueryError};
//!
//! let err = QueryError::too_few_values(2);
//! assert_eq!(err.code, ErrorCode::TooFewValues);
//! assert_eq!(err.code.code(), "Q2001");
//! ```
//!
//! # Nested Errors
//!
//! Errors raised while rendering a nested fragment are wrapped with the
//! position they occurred at. The wrapped error stays reachable through
//! [`std::error::Error::source`]:
//!
//! ```rust
//! use sqlweave_query::QueryError;
//!
//! let inner = QueryError::unknown_name("age", &["id".to_string()]);
//! let outer = QueryError::nested("value #2", inner);
//! assert!(outer.to_string().contains("value #2: "));
//! assert_eq!(outer.chain().count(), 2);
//! ```

use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Result type for rendering operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Template syntax errors (1xxx)
    /// A `{` without a matching `}` (Q1001).
    UnterminatedPlaceholder = 1001,
    /// A placeholder body with characters outside `[A-Za-z0-9_]` (Q1002).
    InvalidPlaceholderName = 1002,

    // Resolution errors (2xxx)
    /// More anonymous placeholders than supplied values (Q2001).
    TooFewValues = 2001,
    /// Ordinal placeholder outside the value pool (Q2002).
    OrdinalOutOfBounds = 2002,
    /// Named placeholder with no matching named value (Q2003).
    UnknownName = 2003,
    /// The same name supplied twice in one value pool (Q2004).
    DuplicateName = 2004,
    /// A dialect-aware value failed to resolve (Q2005).
    DialectValue = 2005,
    /// Rebinding a parameter name that was never bound (Q2006).
    UnknownParam = 2006,
    /// A parameter name the dialect would read as a positional slot (Q2007).
    PositionalName = 2007,

    // Nested render errors (3xxx)
    /// A composable fragment failed to render itself (Q3001).
    FragmentFailed = 3001,

    // Interpolation errors (4xxx)
    /// Input ended inside a string literal or quoted identifier (Q4001).
    UnclosedLiteral = 4001,
    /// A placeholder has no argument to substitute (Q4002).
    MissingArgument = 4002,
    /// A value has no literal SQL form (Q4003).
    NoLiteralRepresentation = 4003,

    // Configuration errors (7xxx)
    /// Unrecognised dialect name (Q7001).
    InvalidDialect = 7001,
    /// Invalid configuration (Q7002).
    InvalidConfiguration = 7002,

    // Internal errors (9xxx)
    /// Internal error (Q9001).
    Internal = 9001,
}

impl ErrorCode {
    /// Get the error code string (e.g., "Q1001").
    pub fn code(&self) -> String {
        format!("Q{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::UnterminatedPlaceholder => "Unterminated placeholder",
            Self::InvalidPlaceholderName => "Invalid placeholder name",
            Self::TooFewValues => "Too few values",
            Self::OrdinalOutOfBounds => "Ordinal out of bounds",
            Self::UnknownName => "Unknown named value",
            Self::DuplicateName => "Duplicate named value",
            Self::DialectValue => "Dialect value resolution failed",
            Self::UnknownParam => "Unknown parameter",
            Self::PositionalName => "Parameter name shadows a position",
            Self::FragmentFailed => "Fragment render failed",
            Self::UnclosedLiteral => "Unclosed string or identifier",
            Self::MissingArgument => "Missing argument",
            Self::NoLiteralRepresentation => "No literal representation",
            Self::InvalidDialect => "Invalid dialect",
            Self::InvalidConfiguration => "Invalid configuration",
            Self::Internal => "Internal error",
        }
    }

    /// Check if this code belongs to the template syntax category.
    pub fn is_syntax(&self) -> bool {
        matches!(self, Self::UnterminatedPlaceholder | Self::InvalidPlaceholderName)
    }

    /// Check if this code belongs to the value resolution category.
    pub fn is_resolution(&self) -> bool {
        (*self as u16) / 1000 == 2
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The template or query text being processed (if available).
    pub sql: Option<String>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<String>,
    /// Help text.
    pub help: Option<String>,
}

/// Errors that can occur while rendering or interpolating SQL.
#[derive(Error, Debug)]
pub struct QueryError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl QueryError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(suggestion.into());
        self
    }

    /// Add help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.context.help = Some(help.into());
        self
    }

    /// Set the template or query text.
    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.context.sql = Some(sql.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E: StdError + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Constructor Functions ==============

    /// A `{` was never closed.
    pub fn unterminated_placeholder(offset: usize) -> Self {
        Self::new(
            ErrorCode::UnterminatedPlaceholder,
            format!("unterminated placeholder starting at byte {}", offset),
        )
        .with_suggestion("Close the placeholder with '}'")
        .with_suggestion("Write '{{' for a literal '{'")
    }

    /// A placeholder body contained a disallowed character.
    pub fn invalid_placeholder_name(body: &str, ch: char) -> Self {
        Self::new(
            ErrorCode::InvalidPlaceholderName,
            format!("placeholder {{{}}} contains invalid character {:?}", body, ch),
        )
        .with_help("Placeholder names may only contain letters, digits and underscores")
    }

    /// More anonymous placeholders than values.
    pub fn too_few_values(supplied: usize) -> Self {
        Self::new(
            ErrorCode::TooFewValues,
            format!("too few values passed in to template, got {}", supplied),
        )
    }

    /// Ordinal placeholder past the end of the value pool.
    pub fn ordinal_out_of_bounds(ordinal: impl fmt::Display, supplied: usize) -> Self {
        Self::new(
            ErrorCode::OrdinalOutOfBounds,
            format!(
                "ordinal {{{}}} is out of bounds, {} value(s) supplied",
                ordinal, supplied
            ),
        )
        .with_help("Ordinal placeholders are 1-based")
    }

    /// Named placeholder with no matching named value.
    pub fn unknown_name(name: &str, available: &[String]) -> Self {
        let available = if available.is_empty() {
            "none".to_string()
        } else {
            available.join(", ")
        };
        Self::new(
            ErrorCode::UnknownName,
            format!(
                "named parameter {{{}}} not provided (available names: {})",
                name, available
            ),
        )
    }

    /// The same name appeared twice in one value pool.
    pub fn duplicate_name(name: &str) -> Self {
        Self::new(
            ErrorCode::DuplicateName,
            format!("named parameter {{{}}} provided more than once", name),
        )
    }

    /// A dialect-aware value failed to produce a concrete value.
    pub fn dialect_value(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DialectValue, message)
    }

    /// Rebinding an unbound parameter name.
    pub fn unknown_param(name: &str) -> Self {
        Self::new(
            ErrorCode::UnknownParam,
            format!("parameter {:?} is not bound in this query", name),
        )
    }

    /// A named value whose placeholder would collide with a positional one.
    pub fn positional_name(name: &str, placeholder: &str) -> Self {
        Self::new(
            ErrorCode::PositionalName,
            format!(
                "named parameter {{{}}} renders as {}, which is a positional placeholder",
                name, placeholder
            ),
        )
        .with_help("Rename the parameter so it does not look like a numbered slot")
    }

    /// A fragment failed with an error of its own type.
    pub fn fragment<E: StdError + Send + Sync + 'static>(source: E) -> Self {
        Self::new(ErrorCode::FragmentFailed, source.to_string()).with_source(source)
    }

    /// Wrap an error raised at a nested position (`value #2`, `{name}`, ...).
    ///
    /// The wrapper keeps the inner code so callers can still match on the
    /// category, while the inner error remains available as the source.
    pub fn nested(label: impl fmt::Display, inner: QueryError) -> Self {
        Self {
            code: inner.code,
            message: format!("{}: {}", label, inner.message),
            context: ErrorContext::default(),
            source: Some(Box::new(inner)),
        }
    }

    /// Input ended inside a literal.
    pub fn unclosed_literal(quote: char) -> Self {
        Self::new(
            ErrorCode::UnclosedLiteral,
            format!("unclosed string or identifier (opened with {:?})", quote),
        )
    }

    /// Placeholder without an argument.
    pub fn missing_argument(placeholder: &str, supplied: usize) -> Self {
        Self::new(
            ErrorCode::MissingArgument,
            format!(
                "no argument for placeholder {:?}, {} argument(s) supplied",
                placeholder, supplied
            ),
        )
    }

    /// Value without a literal SQL form.
    pub fn no_literal(what: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::NoLiteralRepresentation,
            format!("{} has no literal SQL representation", what),
        )
    }

    /// Unrecognised dialect name.
    pub fn invalid_dialect(name: &str) -> Self {
        Self::new(ErrorCode::InvalidDialect, format!("unknown dialect {:?}", name))
            .with_suggestion("Use one of: sqlite, postgres, mysql, sqlserver")
    }

    /// Invalid configuration value.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfiguration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(ErrorCode::Internal, format!("Internal error: {}", message))
    }

    // ============== Inspection ==============

    /// Iterate over this error and every error in its source chain.
    pub fn chain(&self) -> impl Iterator<Item = &(dyn StdError + 'static)> {
        let first: &(dyn StdError + 'static) = self;
        std::iter::successors(Some(first), |&e| e.source())
    }

    /// Find the first error of type `E` in the chain.
    pub fn find_source<E: StdError + 'static>(&self) -> Option<&E> {
        self.chain().find_map(|e| e.downcast_ref::<E>())
    }

    /// The innermost `QueryError` in the chain.
    pub fn root(&self) -> &QueryError {
        let mut current = self;
        while let Some(next) = current
            .source
            .as_deref()
            .and_then(|s| s.downcast_ref::<QueryError>())
        {
            current = next;
        }
        current
    }

    /// Display the full error with context and suggestions.
    pub fn display_full(&self) -> String {
        let mut output = format!("Error [{}]: {}\n", self.code.code(), self.message);

        if let Some(ref sql) = self.context.sql {
            let sql_display = if sql.len() > 200 {
                let mut end = 200;
                while !sql.is_char_boundary(end) {
                    end -= 1;
                }
                format!("{}...", &sql[..end])
            } else {
                sql.clone()
            };
            output.push_str(&format!("  → SQL: {}\n", sql_display));
        }

        if !self.context.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for (i, suggestion) in self.context.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        if let Some(ref help) = self.context.help {
            output.push_str(&format!("\nHelp: {}\n", help));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("boom")]
    struct Boom;

    #[test]
    fn test_error_code_format() {
        assert_eq!(ErrorCode::UnterminatedPlaceholder.code(), "Q1001");
        assert_eq!(ErrorCode::TooFewValues.code(), "Q2001");
        assert_eq!(ErrorCode::UnclosedLiteral.code(), "Q4001");
    }

    #[test]
    fn test_error_categories() {
        assert!(ErrorCode::InvalidPlaceholderName.is_syntax());
        assert!(ErrorCode::OrdinalOutOfBounds.is_resolution());
        assert!(!ErrorCode::UnclosedLiteral.is_resolution());
    }

    #[test]
    fn test_unknown_name_lists_available() {
        let err = QueryError::unknown_name("age", &["id".to_string(), "name".to_string()]);
        assert_eq!(err.code, ErrorCode::UnknownName);
        assert!(err.message.contains("id, name"));
    }

    #[test]
    fn test_nested_keeps_code_and_source() {
        let inner = QueryError::ordinal_out_of_bounds(99, 3);
        let outer = QueryError::nested("predicate #1", QueryError::nested("value #2", inner));
        assert_eq!(outer.code, ErrorCode::OrdinalOutOfBounds);
        assert!(outer.message.starts_with("predicate #1: value #2: "));
        assert_eq!(outer.chain().count(), 3);
        assert!(outer.root().message.contains("99"));
    }

    #[test]
    fn test_find_source_through_nesting() {
        let err = QueryError::nested("value #1", QueryError::fragment(Boom));
        assert!(err.find_source::<Boom>().is_some());
        assert_eq!(err.code, ErrorCode::FragmentFailed);
    }

    #[test]
    fn test_display_full() {
        let err = QueryError::unterminated_placeholder(7).with_sql("SELECT {");
        let output = err.display_full();
        assert!(output.contains("Q1001"));
        assert!(output.contains("SELECT {"));
        assert!(output.contains("Suggestions"));
    }
}

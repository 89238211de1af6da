//! Unified error types for poldiff.
//!
//! This module provides the error hierarchy for the library. Engine errors
//! follow a small taxonomy (invalid argument, policy query failure, ambiguous
//! rename, out of memory); outer layers add parse, IO and configuration
//! errors. Every variant carries enough context to be reported on its own.

use crate::diff::Category;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for poldiff operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PolDiffError {
    /// A caller-supplied argument was rejected (bad rename, unknown mask bits, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The policy adapter reported an inconsistency
    #[error("Policy query failed: {context}")]
    PolicyQuery {
        context: String,
        #[source]
        source: PolicyQueryKind,
    },

    /// Two rename declarations claim the same type
    #[error("Ambiguous type rename: {context}")]
    AmbiguousRename { type_name: String, context: String },

    /// A resource limit was exceeded
    #[error("Out of memory: {0}")]
    OutOfMemory(String),

    /// A single category failed; other categories are unaffected
    #[error("Diff of {category} failed: {source}")]
    Category {
        category: Category,
        #[source]
        source: Box<PolDiffError>,
    },

    /// Errors while reading a policy document
    #[error("Failed to parse policy: {context}")]
    Parse {
        context: String,
        #[source]
        source: ParseErrorKind,
    },

    /// IO errors with context
    #[error("IO error at {path:?}: {message}")]
    Io {
        path: Option<PathBuf>,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Specific policy query failure kinds
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PolicyQueryKind {
    #[error("unknown {kind} '{name}'")]
    UnknownSymbol { kind: &'static str, name: String },

    #[error("'{0}' is an attribute, a type was expected")]
    AttributeNotAllowed(String),

    #[error("invalid conditional expression: {0}")]
    InvalidConditional(String),

    #[error("conditional expression uses {0} booleans (at most 5 are supported)")]
    TooManyBooleans(usize),

    #[error("invalid MLS level or range '{value}': {reason}")]
    InvalidMls { value: String, reason: String },

    #[error("duplicate {kind} '{name}'")]
    Duplicate { kind: &'static str, name: String },
}

/// Specific parse error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ParseErrorKind {
    #[error("Unknown policy document format - expected JSON or YAML")]
    UnknownFormat,

    #[error("Invalid JSON structure: {0}")]
    InvalidJson(String),

    #[error("Invalid YAML structure: {0}")]
    InvalidYaml(String),

    #[error("Policy document is {size} bytes, exceeding the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },
}

// ============================================================================
// Result type alias
// ============================================================================

/// Convenient Result type for poldiff operations
pub type Result<T> = std::result::Result<T, PolDiffError>;

// ============================================================================
// Error construction helpers
// ============================================================================

impl PolDiffError {
    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a policy query error with context
    pub fn policy_query(context: impl Into<String>, source: PolicyQueryKind) -> Self {
        Self::PolicyQuery {
            context: context.into(),
            source,
        }
    }

    /// Create a policy query error for a symbol that does not exist
    pub fn unknown_symbol(kind: &'static str, name: impl Into<String>) -> Self {
        let name = name.into();
        Self::policy_query(
            format!("lookup of {kind} {name}"),
            PolicyQueryKind::UnknownSymbol { kind, name },
        )
    }

    /// Create an ambiguous rename error for a type claimed twice
    pub fn ambiguous_rename(type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self::AmbiguousRename {
            context: format!("Type {type_name} is already remapped"),
            type_name,
        }
    }

    /// Wrap an error as the failure of a single category
    pub fn category(category: Category, source: Self) -> Self {
        Self::Category {
            category,
            source: Box::new(source),
        }
    }

    /// Create a parse error with context
    pub fn parse(context: impl Into<String>, source: ParseErrorKind) -> Self {
        Self::Parse {
            context: context.into(),
            source,
        }
    }

    /// Create an IO error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        let message = format!("{source}");
        Self::Io {
            path: Some(path),
            message,
            source,
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether this error came from a rejected type rename.
    #[must_use]
    pub const fn is_rename_error(&self) -> bool {
        matches!(self, Self::AmbiguousRename { .. })
    }
}

// ============================================================================
// Conversions from existing error types
// ============================================================================

impl From<std::io::Error> for PolDiffError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: None,
            message: format!("{err}"),
            source: err,
        }
    }
}

impl From<serde_json::Error> for PolDiffError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(
            "JSON deserialization",
            ParseErrorKind::InvalidJson(err.to_string()),
        )
    }
}

impl From<serde_yaml_ng::Error> for PolDiffError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        Self::parse(
            "YAML deserialization",
            ParseErrorKind::InvalidYaml(err.to_string()),
        )
    }
}

// ============================================================================
// Error context extension trait
// ============================================================================

/// Extension trait for adding context to errors.
///
/// Context strings are chained outermost first, so an error raised while
/// canonicalizing a rule reads like
/// `"original policy: av rule 12: lookup of type foo_t"`.
///
/// # Example
///
/// ```ignore
/// use poldiff::error::ErrorContext;
///
/// let types = policy
///     .expand_type_set(&rule.source)
///     .with_context(|| format!("source of av rule {index}"))?;
/// ```
pub trait ErrorContext<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context from a closure, evaluated only on error.
    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: Into<PolDiffError>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        let ctx: String = context.into();
        self.map_err(|e| add_context_to_error(e.into(), &ctx))
    }

    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| {
            let ctx: String = f().into();
            add_context_to_error(e.into(), &ctx)
        })
    }
}

/// Add context to an error, chaining with any existing context.
fn add_context_to_error(err: PolDiffError, new_ctx: &str) -> PolDiffError {
    match err {
        PolDiffError::InvalidArgument(msg) => {
            PolDiffError::InvalidArgument(chain_context(new_ctx, &msg))
        }
        PolDiffError::PolicyQuery {
            context: existing,
            source,
        } => PolDiffError::PolicyQuery {
            context: chain_context(new_ctx, &existing),
            source,
        },
        PolDiffError::AmbiguousRename {
            type_name,
            context: existing,
        } => PolDiffError::AmbiguousRename {
            type_name,
            context: chain_context(new_ctx, &existing),
        },
        PolDiffError::OutOfMemory(msg) => PolDiffError::OutOfMemory(chain_context(new_ctx, &msg)),
        PolDiffError::Category { category, source } => PolDiffError::Category {
            category,
            source: Box::new(add_context_to_error(*source, new_ctx)),
        },
        PolDiffError::Parse {
            context: existing,
            source,
        } => PolDiffError::Parse {
            context: chain_context(new_ctx, &existing),
            source,
        },
        PolDiffError::Io {
            path,
            message,
            source,
        } => PolDiffError::Io {
            path,
            message: chain_context(new_ctx, &message),
            source,
        },
        PolDiffError::Config(msg) => PolDiffError::Config(chain_context(new_ctx, &msg)),
        PolDiffError::Validation(msg) => PolDiffError::Validation(chain_context(new_ctx, &msg)),
    }
}

/// Chain two context strings together.
///
/// If the existing context is empty, returns just the new context.
/// Otherwise, returns "`new_context`: `existing_context`".
fn chain_context(new: &str, existing: &str) -> String {
    if existing.is_empty() {
        new.to_string()
    } else {
        format!("{new}: {existing}")
    }
}

/// Extension trait for Option types to convert to errors with context.
pub trait OptionContext<T> {
    /// Convert None to a policy query error for an unknown symbol.
    fn or_unknown(self, kind: &'static str, name: &str) -> Result<T>;

    /// Convert None to a validation error with the given context.
    fn context_none(self, context: impl Into<String>) -> Result<T>;
}

impl<T> OptionContext<T> for Option<T> {
    fn or_unknown(self, kind: &'static str, name: &str) -> Result<T> {
        self.ok_or_else(|| PolDiffError::unknown_symbol(kind, name))
    }

    fn context_none(self, context: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| PolDiffError::Validation(context.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PolDiffError::unknown_symbol("type", "foo_t");
        let display = err.to_string();
        assert!(display.contains("foo_t"), "should name the symbol: {display}");

        let err = PolDiffError::ambiguous_rename("bar_t");
        assert_eq!(
            err.to_string(),
            "Ambiguous type rename: Type bar_t is already remapped"
        );
        assert!(err.is_rename_error());
    }

    #[test]
    fn test_io_error_keeps_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = PolDiffError::io("/path/to/policy.yaml", io_err);

        assert!(err.to_string().contains("/path/to/policy.yaml"));
    }

    #[test]
    fn test_context_chaining() {
        let initial: Result<()> = Err(PolDiffError::policy_query(
            "initial context",
            PolicyQueryKind::TooManyBooleans(6),
        ));

        match initial.context("outer context") {
            Err(PolDiffError::PolicyQuery { context, source }) => {
                assert_eq!(context, "outer context: initial context");
                assert_eq!(source, PolicyQueryKind::TooManyBooleans(6));
            }
            other => panic!("Expected PolicyQuery error, got {other:?}"),
        }
    }

    #[test]
    fn test_category_context_reaches_inner_error() {
        let err: Result<()> = Err(PolDiffError::category(
            Category::AvAllow,
            PolDiffError::invalid_argument("bad"),
        ));
        match err.context("run") {
            Err(PolDiffError::Category { category, source }) => {
                assert_eq!(category, Category::AvAllow);
                assert_eq!(source.to_string(), "Invalid argument: run: bad");
            }
            other => panic!("Expected Category error, got {other:?}"),
        }
    }

    #[test]
    fn test_with_context_lazy_evaluation() {
        let mut called = false;

        let ok_result: Result<i32> = Ok(42);
        let _ = ok_result.with_context(|| {
            called = true;
            "should not be called"
        });
        assert!(!called, "Closure should not be called for Ok result");

        let err_result: Result<i32> = Err(PolDiffError::validation("error"));
        let _ = err_result.with_context(|| {
            called = true;
            "should be called"
        });
        assert!(called, "Closure should be called for Err result");
    }

    #[test]
    fn test_option_context() {
        let found: Option<i32> = Some(7);
        assert_eq!(found.or_unknown("role", "r").unwrap(), 7);

        let missing: Option<i32> = None;
        match missing.or_unknown("role", "staff_r") {
            Err(PolDiffError::PolicyQuery {
                source: PolicyQueryKind::UnknownSymbol { kind, name },
                ..
            }) => {
                assert_eq!(kind, "role");
                assert_eq!(name, "staff_r");
            }
            other => panic!("Expected PolicyQuery error, got {other:?}"),
        }
    }

    #[test]
    fn test_chain_context_helper() {
        assert_eq!(chain_context("new", ""), "new");
        assert_eq!(chain_context("new", "existing"), "new: existing");
        assert_eq!(
            chain_context("outer", "middle: inner"),
            "outer: middle: inner"
        );
    }
}

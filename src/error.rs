//! Error types for the proto-faker crate.

use std::path::PathBuf;

/// Errors that can occur while loading schemas or populating messages.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The message schema is malformed or references something undefined.
    #[error("schema error: {0}")]
    Schema(String),

    /// A field references a type that is neither a scalar, a well-known type,
    /// nor a message or enum defined in the schema.
    #[error("field '{field}' references unknown type '{type_name}'")]
    UnknownType { field: String, type_name: String },

    /// A message name was requested that the schema does not define.
    #[error("message '{name}' not found in schema (available: {available})")]
    MessageNotFound { name: String, available: String },

    /// A field directive is contradictory (e.g. both a tag and a template).
    #[error("invalid directive on '{field}': {reason}")]
    InvalidDirective { field: String, reason: String },

    /// Engine configuration is out of range.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A generated string could not be parsed into the field's declared kind.
    #[error("cannot parse {input:?} as {kind} for field '{field}': {reason}")]
    Parse {
        field: String,
        kind: String,
        input: String,
        reason: String,
    },

    /// A message-kind field reached a scalar-only code path.
    #[error("unexpected kind {kind} for field '{field}'")]
    UnexpectedKind { field: String, kind: String },

    /// A value of the wrong shape was written into a field.
    #[error("type mismatch on field '{field}': expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: String,
    },

    /// A tag grammar string could not be expanded.
    #[error("grammar error in {input:?}: {reason}")]
    Grammar { input: String, reason: String },

    /// A tag or template referenced a function nobody registered.
    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    /// A template could not be parsed or evaluated.
    #[error("template error: {0}")]
    Template(String),

    /// Failed to read a file from disk.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON parse error with context.
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML configuration parse error.
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

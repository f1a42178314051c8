//! Error types for protoflex-build.

use protoflex::{DecodeError, SchemaError};
use thiserror::Error;

/// Errors that abort a resolution run. No partial output is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("{file}: unsupported syntax '{syntax}'")]
    UnsupportedSyntax { file: String, syntax: String },
    #[error("{file}: cannot resolve type '{type_name}' of field {message}.{field}")]
    UnresolvedType {
        file: String,
        message: String,
        field: String,
        type_name: String,
    },
    #[error("schema file '{path}' not found")]
    FileNotFound { path: String },
    #[error("{file}: import '{import}' not found")]
    ImportNotFound { file: String, import: String },
    #[error("import cycle: {}", cycle.join(" -> "))]
    ImportCycle { cycle: Vec<String> },
    #[error("{file}: enum {name} has no member with value 0")]
    MissingEnumZero { file: String, name: String },
    #[error("{file}: message {message} uses field id {id} more than once")]
    DuplicateFieldId {
        file: String,
        message: String,
        id: u32,
    },
    #[error("{file}: field {message}.{field} has id {id}, outside 1..=536870911")]
    InvalidFieldId {
        file: String,
        message: String,
        field: String,
        id: u32,
    },
    #[error("{file}: map field {message}.{field} cannot be keyed by '{key_type}'")]
    InvalidMapKey {
        file: String,
        message: String,
        field: String,
        key_type: String,
    },
    #[error("{file}: invalid descriptor: {reason}")]
    InvalidDescriptor { file: String, reason: String },
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("failed to decode FileDescriptorSet: {0}")]
    Decode(#[from] DecodeError),
}

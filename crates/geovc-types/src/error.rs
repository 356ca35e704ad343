use thiserror::Error;

use crate::schema::PropertyType;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid object id {0:?}: expected 64 hex characters")]
    InvalidObjectId(String),

    #[error("schema {schema} has no property named {property}")]
    UnknownProperty { schema: String, property: String },

    #[error("property {property} expects {expected}, got {actual}")]
    TypeMismatch {
        property: String,
        expected: PropertyType,
        actual: PropertyType,
    },

    #[error("property {0} is not nullable")]
    NotNullable(String),

    #[error("duplicate property name in schema: {0}")]
    DuplicateProperty(String),

    #[error("invalid feature id: {0:?}")]
    InvalidFeatureId(String),
}

/// Result alias for type operations.
pub type TypeResult<T> = Result<T, TypeError>;

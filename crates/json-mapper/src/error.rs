//! Errors raised while mapping values to and from JSON.
//!
//! Every variant is fatal for the operation in progress: the mapper never
//! continues past a failure or returns partial output.

use json_mapper_tokens::{JsonError, JsonToken};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapperError {
    #[error(transparent)]
    Json(#[from] JsonError),

    #[error("Can't assign null to an instance of type {ty}")]
    UnassignableNull { ty: &'static str },

    #[error("Can't assign value '{value}' (type {token}) to type {target}")]
    UnconvertibleValue {
        value: String,
        token: JsonToken,
        target: &'static str,
    },

    #[error("Type {ty} can't act as an array")]
    NotAnArray { ty: &'static str },

    #[error("The type {ty} doesn't have the property '{property}'")]
    UnknownProperty { ty: &'static str, property: String },

    #[error("Type {ty} has no default constructor")]
    NoConstructor { ty: &'static str },

    #[error("Max allowed object depth ({limit}) reached while processing type {ty}")]
    DepthExceeded { ty: &'static str, limit: usize },

    #[error("Unexpected token {0}")]
    UnexpectedToken(JsonToken),

    #[error("Importer failed: {0}")]
    ImportFailed(String),

    #[error("Value is not an instance of {expected}")]
    TypeMismatch { expected: &'static str },
}

impl MapperError {
    /// Convenience constructor for importer and exporter callbacks.
    pub fn import(message: impl Into<String>) -> Self {
        MapperError::ImportFailed(message.into())
    }
}

pub type Result<T> = std::result::Result<T, MapperError>;

//! Errors raised while scanning or emitting JSON tokens.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum JsonError {
    #[error("Invalid JSON at position {0}")]
    Invalid(usize),
    #[error("Unexpected end of input")]
    UnexpectedEnd,
    #[error("Invalid UTF-8 in string")]
    InvalidUtf8,
    #[error("Invalid number at position {0}")]
    InvalidNumber(usize),
    #[error("Unexpected trailing characters at position {0}")]
    TrailingCharacters(usize),
    #[error("Can't write a property name here")]
    PropertyNameNotExpected,
    #[error("Expected a property name before the value")]
    PropertyNameExpected,
    #[error("Can't close an array here")]
    UnbalancedArrayEnd,
    #[error("Can't close an object here")]
    UnbalancedObjectEnd,
    #[error("A complete JSON value has already been written")]
    DocumentComplete,
    #[error("Can't write non-finite number {0} as JSON")]
    NonFiniteNumber(f64),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

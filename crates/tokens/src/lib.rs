//! Token-level JSON primitives for json-mapper.
//!
//! This crate contains the two collaborators the mapper core talks to:
//!
//! - [`JsonReader`]: a validating pull lexer. Each call to
//!   [`TokenSource::read`] advances by exactly one [`JsonToken`], exposing the
//!   scalar payload (if any) as a [`TokenValue`].
//! - [`JsonWriter`]: a validating formatter that accumulates JSON text from a
//!   sequence of token writes, with optional pretty printing.
//!
//! The core only depends on the [`TokenSource`] and [`TokenSink`] traits, so
//! callers can plug in their own scanners or emitters.
//!
//! # Example
//!
//! ```
//! use json_mapper_tokens::{JsonReader, JsonToken, JsonWriter, TokenSink, TokenSource};
//!
//! let mut reader = JsonReader::new(r#"{"a": [1, 2]}"#);
//! let mut kinds = Vec::new();
//! while reader.read().unwrap() {
//!     kinds.push(reader.token());
//! }
//! assert_eq!(kinds[0], JsonToken::ObjectStart);
//! assert_eq!(kinds[1], JsonToken::String);
//! assert_eq!(kinds[2], JsonToken::ArrayStart);
//!
//! let mut writer = JsonWriter::new();
//! writer.write_array_start().unwrap();
//! writer.write_i32(1).unwrap();
//! writer.write_str("x").unwrap();
//! writer.write_array_end().unwrap();
//! assert_eq!(writer.as_str(), r#"[1,"x"]"#);
//! ```

mod error;
mod reader;
mod token;
mod util;
mod writer;

pub use error::JsonError;
pub use reader::{JsonReader, ReaderConfig};
pub use token::{JsonToken, TokenValue};
pub use writer::{JsonWriter, WriterConfig};

pub use rust_decimal::Decimal;

/// A pull-based source of JSON tokens.
///
/// After a successful [`read`](TokenSource::read) returning `true`,
/// [`token`](TokenSource::token) reports the kind of the current token and
/// [`value`](TokenSource::value) its scalar payload. Object keys are reported
/// as [`JsonToken::String`] tokens.
pub trait TokenSource {
    /// Advances to the next token. Returns `false` once the input is exhausted.
    fn read(&mut self) -> Result<bool, JsonError>;

    /// The kind of the current token.
    fn token(&self) -> JsonToken;

    /// The scalar payload of the current token. Only meaningful for scalar
    /// kinds; structural tokens report [`TokenValue::Null`].
    fn value(&self) -> &TokenValue;
}

/// A sink that accepts JSON tokens and renders them.
pub trait TokenSink {
    fn write_null(&mut self) -> Result<(), JsonError>;
    fn write_bool(&mut self, value: bool) -> Result<(), JsonError>;
    fn write_i32(&mut self, value: i32) -> Result<(), JsonError>;
    fn write_i64(&mut self, value: i64) -> Result<(), JsonError>;
    fn write_u64(&mut self, value: u64) -> Result<(), JsonError>;
    fn write_f64(&mut self, value: f64) -> Result<(), JsonError>;

    /// Writes a fixed-point decimal with its scale, e.g. `12.50`.
    fn write_decimal(&mut self, value: Decimal) -> Result<(), JsonError> {
        self.write_raw(&value.to_string())
    }

    fn write_str(&mut self, value: &str) -> Result<(), JsonError>;
    fn write_array_start(&mut self) -> Result<(), JsonError>;
    fn write_array_end(&mut self) -> Result<(), JsonError>;
    fn write_object_start(&mut self) -> Result<(), JsonError>;
    fn write_object_end(&mut self) -> Result<(), JsonError>;
    fn write_property_name(&mut self, name: &str) -> Result<(), JsonError>;

    /// Writes already-serialized JSON text in a value position, as-is.
    fn write_raw(&mut self, json: &str) -> Result<(), JsonError>;

    /// Discards everything written so far.
    fn reset(&mut self);
}

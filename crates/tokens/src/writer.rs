//! `JsonWriter`: accumulates JSON text from token writes.
//!
//! The writer tracks array/object nesting and rejects sequences that would
//! not form a single well-formed document (a value without a property name
//! inside an object, mismatched ends, a second root value).

use std::fmt;

use crate::util::{format_double, push_json_string};
use crate::{JsonError, TokenSink};

/// Options accepted by [`JsonWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterConfig {
    /// Emit newlines and indentation between structural elements.
    pub pretty_print: bool,
    /// Spaces per nesting level when pretty printing.
    pub indent: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            pretty_print: false,
            indent: 4,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Context {
    Array { first: bool },
    Object { first: bool, expect_name: bool },
}

#[derive(Debug, Default)]
pub struct JsonWriter {
    out: String,
    config: WriterConfig,
    stack: Vec<Context>,
    has_root: bool,
}

impl JsonWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: WriterConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> WriterConfig {
        self.config
    }

    /// Text accumulated since the last reset.
    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn into_string(self) -> String {
        self.out
    }

    fn newline(&mut self) {
        if self.config.pretty_print {
            self.out.push('\n');
            let width = self.stack.len() * self.config.indent;
            self.out.extend(std::iter::repeat(' ').take(width));
        }
    }

    fn before_value(&mut self) -> Result<(), JsonError> {
        match self.stack.last().copied() {
            None => {
                if self.has_root {
                    return Err(JsonError::DocumentComplete);
                }
                self.has_root = true;
            }
            Some(Context::Array { first }) => {
                if !first {
                    self.out.push(',');
                }
                if let Some(top) = self.stack.last_mut() {
                    *top = Context::Array { first: false };
                }
                self.newline();
            }
            Some(Context::Object { first, expect_name }) => {
                if expect_name {
                    return Err(JsonError::PropertyNameExpected);
                }
                if let Some(top) = self.stack.last_mut() {
                    *top = Context::Object {
                        first,
                        expect_name: true,
                    };
                }
            }
        }
        Ok(())
    }

    fn close(&mut self, ch: char, was_empty: bool) {
        self.stack.pop();
        if !was_empty {
            self.newline();
        }
        self.out.push(ch);
    }
}

impl TokenSink for JsonWriter {
    fn write_null(&mut self) -> Result<(), JsonError> {
        self.before_value()?;
        self.out.push_str("null");
        Ok(())
    }

    fn write_bool(&mut self, value: bool) -> Result<(), JsonError> {
        self.before_value()?;
        self.out.push_str(if value { "true" } else { "false" });
        Ok(())
    }

    fn write_i32(&mut self, value: i32) -> Result<(), JsonError> {
        self.before_value()?;
        self.out.push_str(&value.to_string());
        Ok(())
    }

    fn write_i64(&mut self, value: i64) -> Result<(), JsonError> {
        self.before_value()?;
        self.out.push_str(&value.to_string());
        Ok(())
    }

    fn write_u64(&mut self, value: u64) -> Result<(), JsonError> {
        self.before_value()?;
        self.out.push_str(&value.to_string());
        Ok(())
    }

    fn write_f64(&mut self, value: f64) -> Result<(), JsonError> {
        let text = format_double(value)?;
        self.before_value()?;
        self.out.push_str(&text);
        Ok(())
    }

    fn write_str(&mut self, value: &str) -> Result<(), JsonError> {
        self.before_value()?;
        push_json_string(&mut self.out, value)
    }

    fn write_array_start(&mut self) -> Result<(), JsonError> {
        self.before_value()?;
        self.out.push('[');
        self.stack.push(Context::Array { first: true });
        Ok(())
    }

    fn write_array_end(&mut self) -> Result<(), JsonError> {
        match self.stack.last().copied() {
            Some(Context::Array { first }) => {
                self.close(']', first);
                Ok(())
            }
            _ => Err(JsonError::UnbalancedArrayEnd),
        }
    }

    fn write_object_start(&mut self) -> Result<(), JsonError> {
        self.before_value()?;
        self.out.push('{');
        self.stack.push(Context::Object {
            first: true,
            expect_name: true,
        });
        Ok(())
    }

    fn write_object_end(&mut self) -> Result<(), JsonError> {
        match self.stack.last().copied() {
            Some(Context::Object {
                first,
                expect_name: true,
            }) => {
                self.close('}', first);
                Ok(())
            }
            _ => Err(JsonError::UnbalancedObjectEnd),
        }
    }

    fn write_property_name(&mut self, name: &str) -> Result<(), JsonError> {
        let Some(Context::Object {
            first,
            expect_name: true,
        }) = self.stack.last().copied()
        else {
            return Err(JsonError::PropertyNameNotExpected);
        };
        if !first {
            self.out.push(',');
        }
        if let Some(top) = self.stack.last_mut() {
            *top = Context::Object {
                first: false,
                expect_name: false,
            };
        }
        self.newline();
        push_json_string(&mut self.out, name)?;
        self.out
            .push_str(if self.config.pretty_print { ": " } else { ":" });
        Ok(())
    }

    fn write_raw(&mut self, json: &str) -> Result<(), JsonError> {
        self.before_value()?;
        self.out.push_str(json);
        Ok(())
    }

    fn reset(&mut self) {
        self.out.clear();
        self.stack.clear();
        self.has_root = false;
    }
}

impl fmt::Display for JsonWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn writes_compact_document() {
        let mut w = JsonWriter::new();
        w.write_object_start().unwrap();
        w.write_property_name("a").unwrap();
        w.write_i32(1).unwrap();
        w.write_property_name("b").unwrap();
        w.write_array_start().unwrap();
        w.write_bool(true).unwrap();
        w.write_null().unwrap();
        w.write_f64(2.0).unwrap();
        w.write_array_end().unwrap();
        w.write_property_name("c").unwrap();
        w.write_u64(u64::MAX).unwrap();
        w.write_object_end().unwrap();
        assert_eq!(
            w.as_str(),
            r#"{"a":1,"b":[true,null,2.0],"c":18446744073709551615}"#
        );
    }

    #[test]
    fn pretty_prints_with_indent() {
        let mut w = JsonWriter::with_config(WriterConfig {
            pretty_print: true,
            indent: 2,
        });
        w.write_object_start().unwrap();
        w.write_property_name("a").unwrap();
        w.write_array_start().unwrap();
        w.write_i32(1).unwrap();
        w.write_i32(2).unwrap();
        w.write_array_end().unwrap();
        w.write_property_name("e").unwrap();
        w.write_object_start().unwrap();
        w.write_object_end().unwrap();
        w.write_object_end().unwrap();
        assert_eq!(w.as_str(), "{\n  \"a\": [\n    1,\n    2\n  ],\n  \"e\": {}\n}");
    }

    #[test]
    fn rejects_misplaced_tokens() {
        let mut w = JsonWriter::new();
        assert!(matches!(
            w.write_property_name("x"),
            Err(JsonError::PropertyNameNotExpected)
        ));
        w.write_object_start().unwrap();
        assert!(matches!(
            w.write_i32(1),
            Err(JsonError::PropertyNameExpected)
        ));
        assert!(matches!(
            w.write_array_end(),
            Err(JsonError::UnbalancedArrayEnd)
        ));
        w.write_property_name("x").unwrap();
        assert!(matches!(
            w.write_object_end(),
            Err(JsonError::UnbalancedObjectEnd)
        ));
    }

    #[test]
    fn single_root_until_reset() {
        let mut w = JsonWriter::new();
        w.write_i32(1).unwrap();
        assert!(matches!(w.write_i32(2), Err(JsonError::DocumentComplete)));
        w.reset();
        w.write_str("again").unwrap();
        assert_eq!(w.to_string(), "\"again\"");
    }

    #[test]
    fn raw_text_takes_a_value_slot() {
        let mut w = JsonWriter::new();
        w.write_array_start().unwrap();
        w.write_raw("{\"pre\":1}").unwrap();
        w.write_i32(2).unwrap();
        w.write_array_end().unwrap();
        assert_eq!(w.as_str(), "[{\"pre\":1},2]");
    }

    #[test]
    fn decimals_keep_their_scale() {
        let mut w = JsonWriter::new();
        w.write_array_start().unwrap();
        w.write_decimal(Decimal::new(1250, 2)).unwrap();
        w.write_decimal(Decimal::new(-3, 0)).unwrap();
        w.write_array_end().unwrap();
        assert_eq!(w.as_str(), "[12.50,-3]");
    }

    #[test]
    fn non_finite_double_is_rejected() {
        let mut w = JsonWriter::new();
        assert!(matches!(
            w.write_f64(f64::NAN),
            Err(JsonError::NonFiniteNumber(_))
        ));
        assert_eq!(w.as_str(), "");
    }
}

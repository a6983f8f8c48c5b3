//! `JsonReader`: validating pull lexer producing one token per `read()`.

use std::io::Read;

use crate::util::{decode_json_string, find_ending_quote};
use crate::{JsonError, JsonToken, TokenSource, TokenValue};

/// Options accepted by [`JsonReader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Skip `// line` and `/* block */` comments between tokens.
    pub allow_comments: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            allow_comments: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Array { first: bool },
    ObjectKey { first: bool },
    ObjectValue,
}

pub struct JsonReader {
    pub data: Vec<u8>,
    pub x: usize,
    config: ReaderConfig,
    stack: Vec<Context>,
    token: JsonToken,
    value: TokenValue,
    root_done: bool,
}

impl JsonReader {
    pub fn new(input: &str) -> Self {
        Self::with_config(input, ReaderConfig::default())
    }

    pub fn with_config(input: &str, config: ReaderConfig) -> Self {
        Self::from_bytes(input.as_bytes().to_vec(), config)
    }

    /// Reads `input` to the end and lexes the bytes it produced.
    pub fn from_reader(mut input: impl Read, config: ReaderConfig) -> Result<Self, JsonError> {
        let mut data = Vec::new();
        input.read_to_end(&mut data)?;
        Ok(Self::from_bytes(data, config))
    }

    pub fn from_bytes(data: Vec<u8>, config: ReaderConfig) -> Self {
        Self {
            data,
            x: 0,
            config,
            stack: Vec::new(),
            token: JsonToken::None,
            value: TokenValue::Null,
            root_done: false,
        }
    }

    /// Whether the reader has consumed one complete root value.
    pub fn end_of_json(&self) -> bool {
        self.root_done
    }

    fn set(&mut self, token: JsonToken, value: TokenValue) {
        self.token = token;
        self.value = value;
    }

    fn peek(&self) -> Result<u8, JsonError> {
        self.data.get(self.x).copied().ok_or(JsonError::UnexpectedEnd)
    }

    fn replace_top(&mut self, ctx: Context) {
        if let Some(top) = self.stack.last_mut() {
            *top = ctx;
        }
    }

    fn value_completed(&mut self) {
        if self.stack.is_empty() {
            self.root_done = true;
        }
    }

    pub fn skip_insignificant(&mut self) -> Result<(), JsonError> {
        loop {
            while self.x < self.data.len() {
                match self.data[self.x] {
                    b' ' | b'\t' | b'\n' | b'\r' => self.x += 1,
                    _ => break,
                }
            }
            if !self.config.allow_comments
                || self.x + 1 >= self.data.len()
                || self.data[self.x] != b'/'
            {
                return Ok(());
            }
            match self.data[self.x + 1] {
                b'/' => {
                    self.x += 2;
                    while self.x < self.data.len() && self.data[self.x] != b'\n' {
                        self.x += 1;
                    }
                }
                b'*' => {
                    let start = self.x + 2;
                    let end = self.data[start..]
                        .windows(2)
                        .position(|w| w == b"*/")
                        .ok_or(JsonError::UnexpectedEnd)?;
                    self.x = start + end + 2;
                }
                _ => return Ok(()),
            }
        }
    }

    fn expect(&mut self, ch: u8) -> Result<(), JsonError> {
        if self.peek()? != ch {
            return Err(JsonError::Invalid(self.x));
        }
        self.x += 1;
        Ok(())
    }

    fn read_value_token(&mut self) -> Result<(), JsonError> {
        match self.peek()? {
            b'{' => {
                self.x += 1;
                self.stack.push(Context::ObjectKey { first: true });
                self.set(JsonToken::ObjectStart, TokenValue::Null);
                return Ok(());
            }
            b'[' => {
                self.x += 1;
                self.stack.push(Context::Array { first: true });
                self.set(JsonToken::ArrayStart, TokenValue::Null);
                return Ok(());
            }
            b'"' => {
                let s = self.read_str()?;
                self.set(JsonToken::String, TokenValue::String(s));
            }
            b't' => {
                self.read_literal(b"true")?;
                self.set(JsonToken::Boolean, TokenValue::Bool(true));
            }
            b'f' => {
                self.read_literal(b"false")?;
                self.set(JsonToken::Boolean, TokenValue::Bool(false));
            }
            b'n' => {
                self.read_literal(b"null")?;
                self.set(JsonToken::Null, TokenValue::Null);
            }
            c if c.is_ascii_digit() || c == b'-' => {
                let num = self.read_num()?;
                self.set(num.token(), num);
            }
            _ => return Err(JsonError::Invalid(self.x)),
        }
        self.value_completed();
        Ok(())
    }

    fn read_literal(&mut self, literal: &[u8]) -> Result<(), JsonError> {
        let end = self.x + literal.len();
        if end > self.data.len() || &self.data[self.x..end] != literal {
            return Err(JsonError::Invalid(self.x));
        }
        self.x = end;
        Ok(())
    }

    pub fn read_num(&mut self) -> Result<TokenValue, JsonError> {
        let start = self.x;
        let data = &self.data;
        let len = data.len();
        let mut x = self.x;

        if x < len && data[x] == b'-' {
            x += 1;
        }
        let int_start = x;
        while x < len && data[x].is_ascii_digit() {
            x += 1;
        }
        if x == int_start {
            return Err(JsonError::InvalidNumber(start));
        }
        if data[int_start] == b'0' && x - int_start > 1 {
            return Err(JsonError::InvalidNumber(start));
        }
        let mut is_float = false;
        if x < len && data[x] == b'.' {
            is_float = true;
            x += 1;
            let frac_start = x;
            while x < len && data[x].is_ascii_digit() {
                x += 1;
            }
            if x == frac_start {
                return Err(JsonError::InvalidNumber(start));
            }
        }
        if x < len && (data[x] == b'e' || data[x] == b'E') {
            is_float = true;
            x += 1;
            if x < len && (data[x] == b'+' || data[x] == b'-') {
                x += 1;
            }
            let exp_start = x;
            while x < len && data[x].is_ascii_digit() {
                x += 1;
            }
            if x == exp_start {
                return Err(JsonError::InvalidNumber(start));
            }
        }
        self.x = x;

        let s = std::str::from_utf8(&data[start..x]).map_err(|_| JsonError::InvalidUtf8)?;
        if !is_float {
            if let Ok(i) = s.parse::<i32>() {
                return Ok(TokenValue::Int(i));
            }
            if let Ok(l) = s.parse::<i64>() {
                return Ok(TokenValue::Long(l));
            }
        }
        s.parse::<f64>()
            .map(TokenValue::Double)
            .map_err(|_| JsonError::InvalidNumber(start))
    }

    pub fn read_str(&mut self) -> Result<String, JsonError> {
        self.expect(b'"')?;
        let x0 = self.x;
        let x1 = find_ending_quote(&self.data, x0)?;
        if let Some(pos) = self.data[x0..x1].iter().position(|&b| b < 0x20) {
            return Err(JsonError::Invalid(x0 + pos));
        }
        let s = decode_json_string(&self.data[x0..x1])?;
        self.x = x1 + 1;
        Ok(s)
    }
}

impl TokenSource for JsonReader {
    fn read(&mut self) -> Result<bool, JsonError> {
        self.skip_insignificant()?;
        let Some(ctx) = self.stack.last().copied() else {
            if self.x >= self.data.len() {
                self.set(JsonToken::None, TokenValue::Null);
                return Ok(false);
            }
            if self.root_done {
                return Err(JsonError::TrailingCharacters(self.x));
            }
            self.read_value_token()?;
            return Ok(true);
        };
        match ctx {
            Context::Array { first } => {
                if self.peek()? == b']' {
                    self.x += 1;
                    self.stack.pop();
                    self.set(JsonToken::ArrayEnd, TokenValue::Null);
                    self.value_completed();
                    return Ok(true);
                }
                if !first {
                    self.expect(b',')?;
                    self.skip_insignificant()?;
                }
                self.replace_top(Context::Array { first: false });
                self.read_value_token()?;
            }
            Context::ObjectKey { first } => {
                if self.peek()? == b'}' {
                    self.x += 1;
                    self.stack.pop();
                    self.set(JsonToken::ObjectEnd, TokenValue::Null);
                    self.value_completed();
                    return Ok(true);
                }
                if !first {
                    self.expect(b',')?;
                    self.skip_insignificant()?;
                }
                if self.peek()? != b'"' {
                    return Err(JsonError::Invalid(self.x));
                }
                let key = self.read_str()?;
                self.skip_insignificant()?;
                self.expect(b':')?;
                self.replace_top(Context::ObjectValue);
                self.set(JsonToken::String, TokenValue::String(key));
            }
            Context::ObjectValue => {
                self.replace_top(Context::ObjectKey { first: false });
                self.read_value_token()?;
            }
        }
        Ok(true)
    }

    fn token(&self) -> JsonToken {
        self.token
    }

    fn value(&self) -> &TokenValue {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<(JsonToken, TokenValue)> {
        let mut reader = JsonReader::new(input);
        let mut out = Vec::new();
        while reader.read().unwrap() {
            out.push((reader.token(), reader.value().clone()));
        }
        out
    }

    #[test]
    fn reads_nested_document() {
        let toks = tokens(r#"{"a": 1, "b": [true, null, "x"]}"#);
        let kinds: Vec<JsonToken> = toks.iter().map(|(t, _)| *t).collect();
        assert_eq!(
            kinds,
            vec![
                JsonToken::ObjectStart,
                JsonToken::String,
                JsonToken::Int,
                JsonToken::String,
                JsonToken::ArrayStart,
                JsonToken::Boolean,
                JsonToken::Null,
                JsonToken::String,
                JsonToken::ArrayEnd,
                JsonToken::ObjectEnd,
            ]
        );
        assert_eq!(toks[1].1, TokenValue::String("a".into()));
        assert_eq!(toks[2].1, TokenValue::Int(1));
        assert_eq!(toks[7].1, TokenValue::String("x".into()));
    }

    #[test]
    fn number_kinds() {
        assert_eq!(tokens("2147483647")[0].1, TokenValue::Int(i32::MAX));
        assert_eq!(tokens("2147483648")[0].1, TokenValue::Long(2_147_483_648));
        assert_eq!(tokens("-3")[0].1, TokenValue::Int(-3));
        assert_eq!(tokens("1.5")[0].1, TokenValue::Double(1.5));
        assert_eq!(tokens("1e2")[0].1, TokenValue::Double(100.0));
        assert_eq!(tokens("1.0")[0].0, JsonToken::Double);
        assert_eq!(
            tokens("18446744073709551616")[0].0,
            JsonToken::Double
        );
    }

    #[test]
    fn empty_input_reads_nothing() {
        let mut reader = JsonReader::new("   ");
        assert!(!reader.read().unwrap());
        assert_eq!(reader.token(), JsonToken::None);
    }

    #[test]
    fn rejects_malformed_input() {
        for input in ["[1,]", "{\"a\" 1}", "{\"a\":1,}", "[1 2]", "tru", "-", "1.", "{1:2}"] {
            let mut reader = JsonReader::new(input);
            let mut result = Ok(true);
            while let Ok(true) = result {
                result = reader.read();
            }
            assert!(result.is_err(), "expected error for {input}");
        }
    }

    #[test]
    fn rejects_leading_zeros_and_raw_control_characters() {
        for input in ["01", "-012", "[00]", "\"a\tb\"", "{\"k\nk\":1}"] {
            let mut reader = JsonReader::new(input);
            let mut result = Ok(true);
            while let Ok(true) = result {
                result = reader.read();
            }
            assert!(result.is_err(), "expected error for {input:?}");
        }
        assert_eq!(tokens("0")[0].1, TokenValue::Int(0));
        assert_eq!(tokens("-0.5")[0].1, TokenValue::Double(-0.5));
        assert_eq!(tokens(r#""a\tb""#)[0].1, TokenValue::String("a\tb".into()));
    }

    #[test]
    fn lexes_from_io_reader() {
        let input = std::io::Cursor::new(b"[1, \"x\"]".to_vec());
        let mut reader = JsonReader::from_reader(input, ReaderConfig::default()).unwrap();
        let mut kinds = Vec::new();
        while reader.read().unwrap() {
            kinds.push(reader.token());
        }
        assert_eq!(
            kinds,
            vec![JsonToken::ArrayStart, JsonToken::Int, JsonToken::String, JsonToken::ArrayEnd]
        );
    }

    #[test]
    fn rejects_trailing_value() {
        let mut reader = JsonReader::new("1 2");
        assert!(reader.read().unwrap());
        assert!(reader.end_of_json());
        assert!(matches!(
            reader.read(),
            Err(JsonError::TrailingCharacters(2))
        ));
    }

    #[test]
    fn unterminated_array_is_unexpected_end() {
        let mut reader = JsonReader::new("[1");
        assert!(reader.read().unwrap());
        assert!(reader.read().unwrap());
        assert!(matches!(reader.read(), Err(JsonError::UnexpectedEnd)));
    }

    #[test]
    fn skips_comments_when_allowed() {
        let toks = tokens("/* head */ [1, // one\n 2]");
        assert_eq!(toks.len(), 4);

        let mut strict = JsonReader::with_config(
            "/* c */ 1",
            ReaderConfig {
                allow_comments: false,
            },
        );
        assert!(strict.read().is_err());
    }

    #[test]
    fn decodes_escaped_keys_and_values() {
        let toks = tokens(r#"{"a\"b": "line\nbreak é"}"#);
        assert_eq!(toks[1].1, TokenValue::String("a\"b".into()));
        assert_eq!(toks[2].1, TokenValue::String("line\nbreak é".into()));
    }
}

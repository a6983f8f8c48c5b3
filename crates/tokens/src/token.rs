use std::fmt;

/// Kind of a JSON token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonToken {
    /// No token has been read yet, or the input is exhausted.
    None,
    Null,
    Boolean,
    /// Integer that fits in 32 bits.
    Int,
    /// Integer that fits in 64 bits but not in 32.
    Long,
    Double,
    String,
    ArrayStart,
    ArrayEnd,
    ObjectStart,
    ObjectEnd,
}

impl JsonToken {
    /// Whether the token carries a scalar payload (everything except
    /// structural tokens, `Null` and `None`).
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            JsonToken::Boolean
                | JsonToken::Int
                | JsonToken::Long
                | JsonToken::Double
                | JsonToken::String
        )
    }
}

impl fmt::Display for JsonToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JsonToken::None => "None",
            JsonToken::Null => "Null",
            JsonToken::Boolean => "Boolean",
            JsonToken::Int => "Int",
            JsonToken::Long => "Long",
            JsonToken::Double => "Double",
            JsonToken::String => "String",
            JsonToken::ArrayStart => "ArrayStart",
            JsonToken::ArrayEnd => "ArrayEnd",
            JsonToken::ObjectStart => "ObjectStart",
            JsonToken::ObjectEnd => "ObjectEnd",
        };
        f.write_str(name)
    }
}

/// Scalar payload of a token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    String(String),
}

impl TokenValue {
    /// The token kind that natively carries this payload.
    pub fn token(&self) -> JsonToken {
        match self {
            TokenValue::Null => JsonToken::Null,
            TokenValue::Bool(_) => JsonToken::Boolean,
            TokenValue::Int(_) => JsonToken::Int,
            TokenValue::Long(_) => JsonToken::Long,
            TokenValue::Double(_) => JsonToken::Double,
            TokenValue::String(_) => JsonToken::String,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TokenValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenValue::Null => f.write_str("null"),
            TokenValue::Bool(b) => write!(f, "{b}"),
            TokenValue::Int(i) => write!(f, "{i}"),
            TokenValue::Long(l) => write!(f, "{l}"),
            TokenValue::Double(d) => write!(f, "{d}"),
            TokenValue::String(s) => f.write_str(s),
        }
    }
}

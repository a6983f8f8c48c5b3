//! [`JsonData`]: a dynamic JSON value, used when the caller has no static
//! target type.

use std::fmt;
use std::ops::Index;

use indexmap::IndexMap;
use json_mapper_tokens::{JsonError, JsonWriter, TokenSink};

use crate::reflect::{TypeInfo, Typed, ValueView};

/// Kind tag of a dynamic JSON value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JsonType {
    #[default]
    Null,
    Object,
    Array,
    String,
    Int,
    Long,
    Double,
    Boolean,
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A value that can be built from a token stream without a static target
/// type, and that can write itself back out.
///
/// The reader drives an instance purely through these methods: it forces the
/// kind for structural tokens and calls the typed setters for scalars.
/// [`JsonData`] is the built-in implementation; callers may supply their own
/// through [`crate::to_wrapper`].
pub trait JsonWrapper {
    fn kind(&self) -> JsonType;

    /// Forces the kind. Resets the content unless the value already has it.
    fn set_kind(&mut self, kind: JsonType);

    fn set_boolean(&mut self, value: bool);
    fn set_int(&mut self, value: i32);
    fn set_long(&mut self, value: i64);
    fn set_double(&mut self, value: f64);
    fn set_string(&mut self, value: String);

    /// Appends an array element.
    fn push(&mut self, item: Self)
    where
        Self: Sized;

    /// Adds an object entry.
    fn insert(&mut self, key: String, value: Self)
    where
        Self: Sized;

    /// Renders the value as compact JSON text.
    fn to_json(&self) -> Result<String, JsonError>;

    /// Emits the value token by token.
    fn write_json(&self, sink: &mut dyn TokenSink) -> Result<(), JsonError>;

    /// Levels below this value: 0 for scalars and empty containers, one more
    /// than the deepest element otherwise. Writers add it to the depth the
    /// value sits at when enforcing a nesting limit.
    fn nesting_depth(&self) -> usize {
        0
    }
}

/// Any JSON value. Objects keep their key order.
///
/// Integers keep the width they were read with: `Int` for values that fit in
/// 32 bits, `Long` for the rest of the 64-bit range.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum JsonData {
    #[default]
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    String(String),
    Array(Vec<JsonData>),
    Object(IndexMap<String, JsonData>),
}

static NULL: JsonData = JsonData::Null;

impl JsonData {
    pub fn kind(&self) -> JsonType {
        match self {
            JsonData::Null => JsonType::Null,
            JsonData::Boolean(_) => JsonType::Boolean,
            JsonData::Int(_) => JsonType::Int,
            JsonData::Long(_) => JsonType::Long,
            JsonData::Double(_) => JsonType::Double,
            JsonData::String(_) => JsonType::String,
            JsonData::Array(_) => JsonType::Array,
            JsonData::Object(_) => JsonType::Object,
        }
    }

    /// Forces the kind, replacing the content with that kind's empty value
    /// unless the value already has it.
    pub fn set_kind(&mut self, kind: JsonType) {
        if self.kind() == kind {
            return;
        }
        *self = match kind {
            JsonType::Null => JsonData::Null,
            JsonType::Boolean => JsonData::Boolean(false),
            JsonType::Int => JsonData::Int(0),
            JsonType::Long => JsonData::Long(0),
            JsonType::Double => JsonData::Double(0.0),
            JsonType::String => JsonData::String(String::new()),
            JsonType::Array => JsonData::Array(Vec::new()),
            JsonType::Object => JsonData::Object(IndexMap::new()),
        };
    }

    pub fn is_null(&self) -> bool {
        matches!(self, JsonData::Null)
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, JsonData::Boolean(_))
    }

    pub fn is_int(&self) -> bool {
        matches!(self, JsonData::Int(_))
    }

    pub fn is_long(&self) -> bool {
        matches!(self, JsonData::Long(_))
    }

    pub fn is_double(&self) -> bool {
        matches!(self, JsonData::Double(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, JsonData::String(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, JsonData::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, JsonData::Object(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            JsonData::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            JsonData::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Either integer width.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            JsonData::Int(i) => Some(i64::from(*i)),
            JsonData::Long(l) => Some(*l),
            _ => None,
        }
    }

    /// Any numeric kind, widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            JsonData::Int(i) => Some(f64::from(*i)),
            JsonData::Long(l) => Some(*l as f64),
            JsonData::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            JsonData::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<JsonData>> {
        match self {
            JsonData::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, JsonData>> {
        match self {
            JsonData::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Object entry by key.
    pub fn get(&self, key: &str) -> Option<&JsonData> {
        self.as_object()?.get(key)
    }

    /// Array element by position.
    pub fn get_index(&self, index: usize) -> Option<&JsonData> {
        self.as_array()?.get(index)
    }

    /// Appends to the array, turning the value into an empty array first if
    /// it is anything else.
    pub fn push(&mut self, item: impl Into<JsonData>) {
        self.set_kind(JsonType::Array);
        if let JsonData::Array(items) = self {
            items.push(item.into());
        }
    }

    /// Sets an object entry, turning the value into an empty object first if
    /// it is anything else. An existing key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<JsonData>) {
        self.set_kind(JsonType::Object);
        if let JsonData::Object(map) = self {
            map.insert(key.into(), value.into());
        }
    }

    /// Element count of an array or object; zero for everything else.
    pub fn len(&self) -> usize {
        match self {
            JsonData::Array(items) => items.len(),
            JsonData::Object(map) => map.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl JsonWrapper for JsonData {
    fn kind(&self) -> JsonType {
        JsonData::kind(self)
    }

    fn set_kind(&mut self, kind: JsonType) {
        JsonData::set_kind(self, kind);
    }

    fn set_boolean(&mut self, value: bool) {
        *self = JsonData::Boolean(value);
    }

    fn set_int(&mut self, value: i32) {
        *self = JsonData::Int(value);
    }

    fn set_long(&mut self, value: i64) {
        *self = JsonData::Long(value);
    }

    fn set_double(&mut self, value: f64) {
        *self = JsonData::Double(value);
    }

    fn set_string(&mut self, value: String) {
        *self = JsonData::String(value);
    }

    fn push(&mut self, item: Self) {
        JsonData::push(self, item);
    }

    fn insert(&mut self, key: String, value: Self) {
        JsonData::insert(self, key, value);
    }

    fn to_json(&self) -> Result<String, JsonError> {
        let mut writer = JsonWriter::new();
        self.write_json(&mut writer)?;
        Ok(writer.into_string())
    }

    fn write_json(&self, sink: &mut dyn TokenSink) -> Result<(), JsonError> {
        match self {
            JsonData::Null => sink.write_null(),
            JsonData::Boolean(b) => sink.write_bool(*b),
            JsonData::Int(i) => sink.write_i32(*i),
            JsonData::Long(l) => sink.write_i64(*l),
            JsonData::Double(d) => sink.write_f64(*d),
            JsonData::String(s) => sink.write_str(s),
            JsonData::Array(items) => {
                sink.write_array_start()?;
                for item in items {
                    item.write_json(sink)?;
                }
                sink.write_array_end()
            }
            JsonData::Object(map) => {
                sink.write_object_start()?;
                for (key, value) in map {
                    sink.write_property_name(key)?;
                    value.write_json(sink)?;
                }
                sink.write_object_end()
            }
        }
    }

    fn nesting_depth(&self) -> usize {
        let below = |child: &JsonData| child.nesting_depth() + 1;
        match self {
            JsonData::Array(items) => items.iter().map(below).max().unwrap_or(0),
            JsonData::Object(map) => map.values().map(below).max().unwrap_or(0),
            _ => 0,
        }
    }
}

impl Typed for JsonData {
    fn type_info() -> TypeInfo {
        TypeInfo::wrapper::<JsonData>()
    }

    fn view(&self) -> ValueView<'_> {
        ValueView::Wrapper(self)
    }
}

impl fmt::Display for JsonData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = JsonWrapper::to_json(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

impl Index<&str> for JsonData {
    type Output = JsonData;

    /// Missing keys and non-objects yield `Null`.
    fn index(&self, key: &str) -> &JsonData {
        self.get(key).unwrap_or(&NULL)
    }
}

impl Index<usize> for JsonData {
    type Output = JsonData;

    fn index(&self, index: usize) -> &JsonData {
        self.get_index(index).unwrap_or(&NULL)
    }
}

impl From<bool> for JsonData {
    fn from(v: bool) -> Self {
        JsonData::Boolean(v)
    }
}

impl From<i32> for JsonData {
    fn from(v: i32) -> Self {
        JsonData::Int(v)
    }
}

impl From<i64> for JsonData {
    fn from(v: i64) -> Self {
        JsonData::Long(v)
    }
}

impl From<f64> for JsonData {
    fn from(v: f64) -> Self {
        JsonData::Double(v)
    }
}

impl From<String> for JsonData {
    fn from(v: String) -> Self {
        JsonData::String(v)
    }
}

impl From<&str> for JsonData {
    fn from(v: &str) -> Self {
        JsonData::String(v.to_string())
    }
}

impl From<Vec<JsonData>> for JsonData {
    fn from(v: Vec<JsonData>) -> Self {
        JsonData::Array(v)
    }
}

impl From<IndexMap<String, JsonData>> for JsonData {
    fn from(v: IndexMap<String, JsonData>) -> Self {
        JsonData::Object(v)
    }
}

impl From<serde_json::Value> for JsonData {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => JsonData::Null,
            serde_json::Value::Bool(b) => JsonData::Boolean(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    match i32::try_from(i) {
                        Ok(i) => JsonData::Int(i),
                        Err(_) => JsonData::Long(i),
                    }
                } else {
                    JsonData::Double(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => JsonData::String(s),
            serde_json::Value::Array(arr) => {
                JsonData::Array(arr.into_iter().map(JsonData::from).collect())
            }
            serde_json::Value::Object(obj) => JsonData::Object(
                obj.into_iter()
                    .map(|(k, v)| (k, JsonData::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<JsonData> for serde_json::Value {
    fn from(v: JsonData) -> Self {
        match v {
            JsonData::Null => serde_json::Value::Null,
            JsonData::Boolean(b) => serde_json::Value::Bool(b),
            JsonData::Int(i) => serde_json::json!(i),
            JsonData::Long(l) => serde_json::json!(l),
            // Non-finite doubles have no JSON form.
            JsonData::Double(d) => serde_json::Number::from_f64(d)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            JsonData::String(s) => serde_json::Value::String(s),
            JsonData::Array(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::from).collect())
            }
            JsonData::Object(map) => serde_json::Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

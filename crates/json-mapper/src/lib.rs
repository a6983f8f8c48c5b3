//! json-mapper: converts arbitrary values to and from JSON text without
//! per-type serialization code.
//!
//! Types describe themselves once through [`Typed`] (usually via
//! [`reflect_struct!`] or [`reflect_enum!`]); the mapper caches those
//! descriptions and walks values with them. Scalars the mapper cannot handle
//! structurally go through importers and exporters, which callers can
//! override per type. Text without a static target type reads into
//! [`JsonData`].
//!
//! ```
//! use json_mapper::{reflect_struct, JsonData};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Book {
//!     title: String,
//!     pages: u16,
//!     tags: Vec<String>,
//! }
//!
//! reflect_struct!(Book { title: String, pages: u16, tags: Vec<String> });
//!
//! let book = Book { title: "Dune".into(), pages: 412, tags: vec!["sf".into()] };
//! let json = json_mapper::to_json(&book).unwrap();
//! assert_eq!(json, r#"{"title":"Dune","pages":412,"tags":["sf"]}"#);
//!
//! let back: Book = json_mapper::to_object_as(&json).unwrap();
//! assert_eq!(back, book);
//!
//! let data = json_mapper::to_object(&json).unwrap();
//! assert_eq!(data["pages"], JsonData::Int(412));
//! ```

pub mod data;
pub mod error;
pub mod json_cli;
pub mod mapper;
pub mod metadata;
pub mod reader;
pub mod reflect;
pub mod registry;
pub mod writer;

pub use data::{JsonData, JsonType, JsonWrapper};
pub use error::{MapperError, Result};
pub use mapper::{JsonMapper, MapperConfig};
pub use metadata::{ArrayShape, MetadataCache, ObjectShape, PropertyDescriptor};
pub use reader::{Slot, ValueReader};
pub use reflect::{
    EnumInfo, EnumRepr, EnumReprType, Erased, ExporterFn, ImporterFn, MemberAccess, MemberInfo,
    MemberValue, ObjectBuilder, Reflect, TypeHandle, TypeInfo, Typed, ValueView,
};
pub use registry::ConverterRegistry;
pub use writer::ValueWriter;

pub use json_mapper_tokens::{
    Decimal, JsonError, JsonReader, JsonToken, JsonWriter, ReaderConfig, TokenSink, TokenSource, TokenValue,
    WriterConfig,
};

/// Serializes `value` with the process-wide mapper.
pub fn to_json(value: &dyn Reflect) -> Result<String> {
    JsonMapper::global().to_json(value)
}

/// Writes `value` to a caller-owned sink with the process-wide mapper.
pub fn to_json_into(value: &dyn Reflect, sink: &mut dyn TokenSink) -> Result<()> {
    JsonMapper::global().to_json_into(value, sink)
}

/// Parses `json` into a [`JsonData`] with the process-wide mapper.
pub fn to_object(json: &str) -> Result<JsonData> {
    JsonMapper::global().to_object(json)
}

/// Reads a whole document from `input` into a [`JsonData`] with the
/// process-wide mapper.
pub fn to_object_from_text(input: impl std::io::Read) -> Result<JsonData> {
    JsonMapper::global().to_object_from_text(input)
}

/// Reads one [`JsonData`] from `stream` with the process-wide mapper.
pub fn to_object_from_reader(stream: &mut dyn TokenSource) -> Result<JsonData> {
    JsonMapper::global().to_object_from_reader(stream)
}

/// Parses `json` into a `T` with the process-wide mapper.
pub fn to_object_as<T: Typed>(json: &str) -> Result<T> {
    JsonMapper::global().to_object_as(json)
}

/// Parses `json` into a caller-supplied dynamic value type.
pub fn to_wrapper<W: JsonWrapper>(factory: &dyn Fn() -> W, json: &str) -> Result<Option<W>> {
    JsonMapper::global().to_wrapper(factory, json)
}

/// Reads a whole document from `input` into a caller-supplied dynamic value.
pub fn to_wrapper_from_text<W: JsonWrapper>(
    factory: &dyn Fn() -> W,
    input: impl std::io::Read,
) -> Result<Option<W>> {
    JsonMapper::global().to_wrapper_from_text(factory, input)
}

/// Reads one caller-supplied dynamic value from `stream`.
pub fn to_wrapper_from_reader<W: JsonWrapper>(
    factory: &dyn Fn() -> W,
    stream: &mut dyn TokenSource,
) -> Result<Option<W>> {
    JsonMapper::global().to_wrapper_from_reader(factory, stream)
}

pub fn register_exporter<T: Typed>(
    exporter: impl Fn(&T, &mut dyn TokenSink) -> Result<()> + Send + Sync + 'static,
) {
    JsonMapper::global().register_exporter(exporter);
}

pub fn register_importer<S: Typed, D: Typed>(
    importer: impl Fn(&S) -> Result<D> + Send + Sync + 'static,
) {
    JsonMapper::global().register_importer(importer);
}

pub fn unregister_exporters() {
    JsonMapper::global().unregister_exporters();
}

pub fn unregister_importers() {
    JsonMapper::global().unregister_importers();
}

//! [`JsonMapper`]: the entry point tying reader, writer, metadata cache and
//! converter registry together.

use std::io::Read;
use std::sync::{Mutex, OnceLock, TryLockError};

use json_mapper_tokens::{
    JsonReader, JsonToken, JsonWriter, ReaderConfig, TokenSink, TokenSource, WriterConfig,
};
use tracing::debug;

use crate::data::{JsonData, JsonWrapper};
use crate::error::{MapperError, Result};
use crate::metadata::MetadataCache;
use crate::reader::ValueReader;
use crate::reflect::{downcast, Erased, Reflect, TypeHandle, Typed};
use crate::registry::ConverterRegistry;
use crate::writer::ValueWriter;

/// Options for a [`JsonMapper`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapperConfig {
    /// Deepest nesting level read or written before failing.
    pub max_nesting_depth: usize,
    /// Formatting of [`JsonMapper::to_json`] output.
    pub writer: WriterConfig,
    /// Lexer options for the text entry points.
    pub reader: ReaderConfig,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            max_nesting_depth: 100,
            writer: WriterConfig::default(),
            reader: ReaderConfig::default(),
        }
    }
}

/// Converts values to and from JSON.
///
/// Most callers use the process-wide instance through the crate's free
/// functions. A separately constructed mapper has its own metadata cache and
/// its own converter registrations.
///
/// ```
/// use json_mapper::{JsonData, JsonMapper};
///
/// let mapper = JsonMapper::new();
/// let data = mapper.to_object(r#"{"a": 1, "b": [1, 2, 3]}"#).unwrap();
/// assert_eq!(data["a"], JsonData::Int(1));
/// assert_eq!(data["b"].len(), 3);
/// assert_eq!(mapper.to_json(&data).unwrap(), r#"{"a":1,"b":[1,2,3]}"#);
/// ```
pub struct JsonMapper {
    config: MapperConfig,
    cache: MetadataCache,
    registry: ConverterRegistry,
    static_writer: Mutex<JsonWriter>,
}

impl Default for JsonMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonMapper {
    pub fn new() -> Self {
        Self::with_config(MapperConfig::default())
    }

    pub fn with_config(config: MapperConfig) -> Self {
        Self {
            config,
            cache: MetadataCache::new(),
            registry: ConverterRegistry::new(),
            static_writer: Mutex::new(JsonWriter::with_config(config.writer)),
        }
    }

    /// The process-wide mapper, created with default options on first use.
    pub fn global() -> &'static JsonMapper {
        static GLOBAL: OnceLock<JsonMapper> = OnceLock::new();
        GLOBAL.get_or_init(|| {
            debug!("initializing process-wide json mapper");
            JsonMapper::new()
        })
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    pub fn registry(&self) -> &ConverterRegistry {
        &self.registry
    }

    pub fn value_reader(&self) -> ValueReader<'_> {
        ValueReader::new(&self.cache, &self.registry, self.config.max_nesting_depth)
    }

    pub fn value_writer(&self) -> ValueWriter<'_> {
        ValueWriter::new(&self.cache, &self.registry, self.config.max_nesting_depth)
    }

    /// Serializes `value` through the mapper's shared writer.
    ///
    /// When the shared writer is busy, either on another thread or because an
    /// exporter called back into `to_json`, a fresh writer is used instead.
    /// [`Self::to_json_into`] holds no shared state.
    pub fn to_json(&self, value: &dyn Reflect) -> Result<String> {
        match self.static_writer.try_lock() {
            Ok(mut writer) => self.render(value, &mut writer),
            Err(TryLockError::Poisoned(poisoned)) => self.render(value, &mut poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => {
                debug!("shared writer busy, rendering with a private writer");
                self.render(value, &mut JsonWriter::with_config(self.config.writer))
            }
        }
    }

    fn render(&self, value: &dyn Reflect, writer: &mut JsonWriter) -> Result<String> {
        writer.reset();
        // Pre-rendered dynamic values are compact, so only take that path
        // when the output is compact anyway.
        let raw_root = !self.config.writer.pretty_print;
        self.value_writer().write_value(value, writer, raw_root, 0)?;
        Ok(writer.as_str().to_owned())
    }

    /// Writes `value` to a caller-owned sink, composing with whatever the sink
    /// already holds.
    pub fn to_json_into(&self, value: &dyn Reflect, sink: &mut dyn TokenSink) -> Result<()> {
        self.value_writer().write_value(value, sink, false, 0)
    }

    /// Parses `json` into a [`JsonData`]. Empty input yields `Null`.
    pub fn to_object(&self, json: &str) -> Result<JsonData> {
        Ok(self
            .to_wrapper(&JsonData::default, json)?
            .unwrap_or_default())
    }

    /// Reads a whole document from `input` into a [`JsonData`].
    pub fn to_object_from_text(&self, input: impl Read) -> Result<JsonData> {
        Ok(self
            .to_wrapper_from_text(&JsonData::default, input)?
            .unwrap_or_default())
    }

    /// Reads one value from `stream` into a [`JsonData`].
    pub fn to_object_from_reader(&self, stream: &mut dyn TokenSource) -> Result<JsonData> {
        Ok(self
            .to_wrapper_from_reader(&JsonData::default, stream)?
            .unwrap_or_default())
    }

    /// Parses `json` into a `T`.
    ///
    /// Empty input is read like `null`: it succeeds only for nullable types.
    pub fn to_object_as<T: Typed>(&self, json: &str) -> Result<T> {
        let mut reader = JsonReader::with_config(json, self.config.reader);
        let value = self.read_as::<T>(&mut reader)?;
        finish(&mut reader)?;
        Ok(value)
    }

    /// Reads one `T` from `stream`.
    pub fn read_as<T: Typed>(&self, stream: &mut dyn TokenSource) -> Result<T> {
        downcast::<T>(self.read_erased(TypeHandle::of::<T>(), stream)?)
    }

    /// Reads one value of the runtime type `target` from `stream`.
    pub fn read_erased(&self, target: TypeHandle, stream: &mut dyn TokenSource) -> Result<Erased> {
        let reader = self.value_reader();
        if !stream.read()? || stream.token() == JsonToken::ArrayEnd {
            return reader.null_of(target);
        }
        reader.value_at(target, stream, 0)
    }

    /// Parses `json` into a dynamic value built by `factory`. `None` for
    /// empty input and for a bare `null`.
    pub fn to_wrapper<W: JsonWrapper>(&self, factory: &dyn Fn() -> W, json: &str) -> Result<Option<W>> {
        let mut reader = JsonReader::with_config(json, self.config.reader);
        let value = self.to_wrapper_from_reader(factory, &mut reader)?;
        finish(&mut reader)?;
        Ok(value)
    }

    /// Reads a whole document from `input` into a dynamic value built by
    /// `factory`.
    pub fn to_wrapper_from_text<W: JsonWrapper>(
        &self,
        factory: &dyn Fn() -> W,
        input: impl Read,
    ) -> Result<Option<W>> {
        let mut reader = JsonReader::from_reader(input, self.config.reader)?;
        let value = self.to_wrapper_from_reader(factory, &mut reader)?;
        finish(&mut reader)?;
        Ok(value)
    }

    /// Reads one dynamic value from `stream`. `None` when the stream is
    /// exhausted, positioned at an `ArrayEnd`, or the value is `null`.
    pub fn to_wrapper_from_reader<W: JsonWrapper>(
        &self,
        factory: &dyn Fn() -> W,
        stream: &mut dyn TokenSource,
    ) -> Result<Option<W>> {
        if !stream.read()? || matches!(stream.token(), JsonToken::ArrayEnd | JsonToken::Null) {
            return Ok(None);
        }
        self.value_reader().wrapper_at(factory, stream, 0).map(Some)
    }

    pub fn register_exporter<T: Typed>(
        &self,
        exporter: impl Fn(&T, &mut dyn TokenSink) -> Result<()> + Send + Sync + 'static,
    ) {
        self.registry.register_exporter(exporter);
    }

    pub fn register_importer<S: Typed, D: Typed>(
        &self,
        importer: impl Fn(&S) -> Result<D> + Send + Sync + 'static,
    ) {
        self.registry.register_importer(importer);
    }

    pub fn unregister_exporters(&self) {
        self.registry.unregister_exporters();
    }

    pub fn unregister_importers(&self) {
        self.registry.unregister_importers();
    }
}

/// Text entry points take a whole document: anything after the root value
/// is an error.
fn finish(reader: &mut JsonReader) -> Result<()> {
    if reader.read()? {
        return Err(MapperError::UnexpectedToken(reader.token()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::JsonType;

    #[test]
    fn to_object_preserves_kinds_and_order() {
        let mapper = JsonMapper::new();
        let data = mapper.to_object(r#"{"a": 1, "b": [1,2,3]}"#).unwrap();
        assert_eq!(data.kind(), JsonType::Object);
        let keys: Vec<&String> = data.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(data["a"], JsonData::Int(1));
        assert_eq!(data["b"].kind(), JsonType::Array);
        let items: Vec<i32> = data["b"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_i32().unwrap())
            .collect();
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[test]
    fn empty_input_reads_as_null() {
        let mapper = JsonMapper::new();
        assert_eq!(mapper.to_object("").unwrap(), JsonData::Null);
        assert_eq!(mapper.to_object_as::<Option<String>>("  ").unwrap(), None);
        assert!(matches!(
            mapper.to_object_as::<f64>(""),
            Err(MapperError::UnassignableNull { .. })
        ));
        assert!(mapper.to_wrapper(&JsonData::default, "").unwrap().is_none());
    }

    #[test]
    fn null_document_has_no_wrapper() {
        let mapper = JsonMapper::new();
        assert!(mapper.to_wrapper(&JsonData::default, " null ").unwrap().is_none());
        assert_eq!(mapper.to_object("null").unwrap(), JsonData::Null);
        let nested = mapper.to_wrapper(&JsonData::default, "[null]").unwrap();
        assert_eq!(nested, Some(JsonData::Array(vec![JsonData::Null])));
    }

    #[test]
    fn text_readers_take_a_whole_document() {
        let mapper = JsonMapper::new();
        let data = mapper
            .to_object_from_text(std::io::Cursor::new(br#"{"a":[1,2]}"#))
            .unwrap();
        assert_eq!(data["a"].len(), 2);
        assert!(mapper.to_object_from_text("1 2".as_bytes()).is_err());
        assert!(mapper
            .to_wrapper_from_text(&JsonData::default, "".as_bytes())
            .unwrap()
            .is_none());
    }

    #[test]
    fn text_entry_points_reject_trailing_values() {
        let mapper = JsonMapper::new();
        assert!(mapper.to_object("1 2").is_err());
        assert!(mapper.to_object_as::<i32>("[1] 2").is_err());
    }

    #[test]
    fn pretty_config_applies_to_dynamic_roots() {
        let mapper = JsonMapper::with_config(MapperConfig {
            writer: WriterConfig {
                pretty_print: true,
                indent: 2,
            },
            ..MapperConfig::default()
        });
        let data = mapper.to_object(r#"{"a":[1]}"#).unwrap();
        let pretty = mapper.to_json(&data).unwrap();
        assert!(pretty.contains('\n'), "{pretty}");
        assert_eq!(mapper.to_object(&pretty).unwrap(), data);
    }

    #[test]
    fn shared_writer_is_reset_between_calls() {
        let mapper = JsonMapper::new();
        assert_eq!(mapper.to_json(&1i32).unwrap(), "1");
        assert_eq!(mapper.to_json(&"x".to_string()).unwrap(), r#""x""#);
        assert!(mapper.to_json(&f64::NAN).is_err());
        assert_eq!(mapper.to_json(&true).unwrap(), "true");
    }

    #[test]
    fn to_json_into_composes_with_caller_sink() {
        let mapper = JsonMapper::new();
        let mut sink = JsonWriter::new();
        sink.write_array_start().unwrap();
        mapper.to_json_into(&vec![1i64, 2], &mut sink).unwrap();
        mapper.to_json_into(&mapper.to_object("{}").unwrap(), &mut sink).unwrap();
        sink.write_array_end().unwrap();
        assert_eq!(sink.as_str(), "[[1,2],{}]");
    }
}

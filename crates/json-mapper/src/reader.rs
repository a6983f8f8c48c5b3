//! Recursive-descent reconstruction of values from a token stream.

use json_mapper_tokens::{JsonError, JsonToken, TokenSource, TokenValue};
use tracing::debug;

use crate::data::{JsonType, JsonWrapper};
use crate::error::{MapperError, Result};
use crate::metadata::MetadataCache;
use crate::reflect::{Erased, TypeHandle, TypeInfo};
use crate::registry::ConverterRegistry;

/// Outcome of reading one array element or root value.
pub enum Slot {
    Value(Erased),
    /// An `ArrayEnd` was read where a value was expected: the enclosing
    /// array is complete.
    End,
}

/// Builds values of runtime-known types from tokens, consulting the metadata
/// cache for shapes and the registry for scalar conversions.
pub struct ValueReader<'m> {
    cache: &'m MetadataCache,
    registry: &'m ConverterRegistry,
    max_depth: usize,
}

impl<'m> ValueReader<'m> {
    pub fn new(cache: &'m MetadataCache, registry: &'m ConverterRegistry, max_depth: usize) -> Self {
        Self {
            cache,
            registry,
            max_depth,
        }
    }

    /// Advances the stream and reads a `target` value starting at the new
    /// token.
    pub fn read_value(&self, target: TypeHandle, stream: &mut dyn TokenSource, depth: usize) -> Result<Slot> {
        advance(stream)?;
        if stream.token() == JsonToken::ArrayEnd {
            return Ok(Slot::End);
        }
        self.value_at(target, stream, depth).map(Slot::Value)
    }

    /// Reads a `target` value starting at the stream's current token.
    pub fn value_at(&self, target: TypeHandle, stream: &mut dyn TokenSource, depth: usize) -> Result<Erased> {
        self.check_depth(target.name(), depth)?;
        let info = self.cache.type_info(target);

        if let Some(dynamic) = &info.dynamic {
            return dynamic(self, stream, depth);
        }

        let token = stream.token();
        if token == JsonToken::Null {
            return self.null_of_info(target, &info);
        }
        // Option<T> and Box<T> read a T and wrap it.
        if let Some(wrap) = &info.wrap {
            let inner = self.value_at(wrap.inner, stream, depth)?;
            return (wrap.wrap)(inner);
        }

        match token {
            t if t.is_scalar() => self.read_scalar(target, &info, stream.value()),
            JsonToken::ArrayStart => self.read_array(target, &info, stream, depth),
            JsonToken::ObjectStart => self.read_object(target, &info, stream, depth),
            other => Err(MapperError::UnexpectedToken(other)),
        }
    }

    /// The value `null` maps to for `target`.
    pub fn null_of(&self, target: TypeHandle) -> Result<Erased> {
        let info = self.cache.type_info(target);
        self.null_of_info(target, &info)
    }

    fn null_of_info(&self, target: TypeHandle, info: &TypeInfo) -> Result<Erased> {
        match &info.null_value {
            Some(null) => Ok(null()),
            None => Err(MapperError::UnassignableNull { ty: target.name() }),
        }
    }

    fn read_scalar(&self, target: TypeHandle, info: &TypeInfo, value: &TokenValue) -> Result<Erased> {
        let (native, source) = native_value(value)?;
        if native == target {
            return Ok(source);
        }

        if let Some(importer) = self.registry.custom_importer(native, target) {
            return importer(source.as_ref());
        }
        if let Some(importer) = self.registry.base_importer(native, target) {
            return importer(source.as_ref());
        }

        if let Some(enumeration) = &info.enumeration {
            let raw = match value {
                TokenValue::Int(i) => Some(i128::from(*i)),
                TokenValue::Long(l) => Some(i128::from(*l)),
                _ => None,
            };
            if let Some(variant) = raw.and_then(|raw| (enumeration.from_raw)(raw)) {
                return Ok(variant);
            }
        }

        if let Some(op) = self.cache.conversion_op(target, native) {
            return op(source.as_ref());
        }

        Err(MapperError::UnconvertibleValue {
            value: value.to_string(),
            token: value.token(),
            target: target.name(),
        })
    }

    fn read_array(
        &self,
        target: TypeHandle,
        info: &TypeInfo,
        stream: &mut dyn TokenSource,
        depth: usize,
    ) -> Result<Erased> {
        let shape = self.cache.array_shape_of(target);
        let sequence = match &info.sequence {
            Some(sequence) if shape.is_sequence() => sequence,
            _ => return Err(MapperError::NotAnArray { ty: target.name() }),
        };

        let element = shape.element_type();
        let mut items = Vec::new();
        // The final read consumes the closing ArrayEnd.
        while let Slot::Value(item) = self.read_value(element, stream, depth + 1)? {
            items.push(item);
        }
        (sequence.collect)(items)
    }

    fn read_object(
        &self,
        target: TypeHandle,
        info: &TypeInfo,
        stream: &mut dyn TokenSource,
        depth: usize,
    ) -> Result<Erased> {
        let shape = self.cache.object_shape_of(target);
        let construct = info
            .construct
            .as_ref()
            .ok_or(MapperError::NoConstructor { ty: target.name() })?;
        let mut instance = construct();

        while let Some(key) = next_key(stream)? {
            if let Some(property) = shape.properties.get(&key) {
                let value = self.member_value(property.ty, stream, depth)?;
                // Read-only members still consume their value.
                if property.writable {
                    property.access.set(instance.as_mut(), value)?;
                }
                continue;
            }

            match &info.map {
                Some(map) if shape.is_map => {
                    let value = self.member_value(shape.element_type(), stream, depth)?;
                    (map.insert)(instance.as_mut(), key, value)?;
                }
                _ => {
                    return Err(MapperError::UnknownProperty {
                        ty: target.name(),
                        property: key,
                    })
                }
            }
        }

        Ok(instance)
    }

    fn member_value(&self, ty: TypeHandle, stream: &mut dyn TokenSource, depth: usize) -> Result<Erased> {
        match self.read_value(ty, stream, depth + 1)? {
            Slot::Value(value) => Ok(value),
            Slot::End => Err(MapperError::UnexpectedToken(JsonToken::ArrayEnd)),
        }
    }

    /// Advances the stream and reads a dynamic value. `None` when the new
    /// token is an `ArrayEnd`.
    pub fn read_wrapper<W: JsonWrapper>(
        &self,
        factory: &dyn Fn() -> W,
        stream: &mut dyn TokenSource,
        depth: usize,
    ) -> Result<Option<W>> {
        advance(stream)?;
        if stream.token() == JsonToken::ArrayEnd {
            return Ok(None);
        }
        self.wrapper_at(factory, stream, depth).map(Some)
    }

    /// Reads a dynamic value starting at the stream's current token. Every
    /// JSON kind is accepted and every object key kept.
    pub fn wrapper_at<W: JsonWrapper>(
        &self,
        factory: &dyn Fn() -> W,
        stream: &mut dyn TokenSource,
        depth: usize,
    ) -> Result<W> {
        self.check_depth(std::any::type_name::<W>(), depth)?;
        let mut instance = factory();

        match stream.token() {
            JsonToken::Null => instance.set_kind(JsonType::Null),
            JsonToken::ArrayStart => {
                instance.set_kind(JsonType::Array);
                while let Some(item) = self.read_wrapper(factory, stream, depth + 1)? {
                    instance.push(item);
                }
            }
            JsonToken::ObjectStart => {
                instance.set_kind(JsonType::Object);
                while let Some(key) = next_key(stream)? {
                    let value = self
                        .read_wrapper(factory, stream, depth + 1)?
                        .ok_or(MapperError::UnexpectedToken(JsonToken::ArrayEnd))?;
                    instance.insert(key, value);
                }
            }
            _ => match stream.value() {
                TokenValue::Bool(b) => instance.set_boolean(*b),
                TokenValue::Int(i) => instance.set_int(*i),
                TokenValue::Long(l) => instance.set_long(*l),
                TokenValue::Double(d) => instance.set_double(*d),
                TokenValue::String(s) => instance.set_string(s.clone()),
                TokenValue::Null => return Err(MapperError::UnexpectedToken(stream.token())),
            },
        }

        Ok(instance)
    }

    fn check_depth(&self, ty: &'static str, depth: usize) -> Result<()> {
        if depth > self.max_depth {
            debug!(ty, depth, "max nesting depth exceeded while reading");
            return Err(MapperError::DepthExceeded {
                ty,
                limit: self.max_depth,
            });
        }
        Ok(())
    }
}

/// Reads the next token, failing if the stream ends inside a value.
fn advance(stream: &mut dyn TokenSource) -> Result<()> {
    if stream.read()? {
        Ok(())
    } else {
        Err(JsonError::UnexpectedEnd.into())
    }
}

/// Reads the next object key; `None` at `ObjectEnd`.
fn next_key(stream: &mut dyn TokenSource) -> Result<Option<String>> {
    advance(stream)?;
    match stream.token() {
        JsonToken::ObjectEnd => Ok(None),
        JsonToken::String => match stream.value() {
            TokenValue::String(key) => Ok(Some(key.clone())),
            _ => Err(MapperError::UnexpectedToken(JsonToken::String)),
        },
        other => Err(MapperError::UnexpectedToken(other)),
    }
}

/// The type a scalar token reads as when no conversion applies, and the
/// value boxed as that type.
fn native_value(value: &TokenValue) -> Result<(TypeHandle, Erased)> {
    Ok(match value {
        TokenValue::Bool(b) => (TypeHandle::of::<bool>(), Box::new(*b)),
        TokenValue::Int(i) => (TypeHandle::of::<i32>(), Box::new(*i)),
        TokenValue::Long(l) => (TypeHandle::of::<i64>(), Box::new(*l)),
        TokenValue::Double(d) => (TypeHandle::of::<f64>(), Box::new(*d)),
        TokenValue::String(s) => (TypeHandle::of::<String>(), Box::new(s.clone())),
        TokenValue::Null => return Err(MapperError::UnexpectedToken(JsonToken::Null)),
    })
}

//! Recursive emission of arbitrary values as tokens.

use json_mapper_tokens::TokenSink;
use tracing::debug;

use crate::error::{MapperError, Result};
use crate::metadata::MetadataCache;
use crate::reflect::{Reflect, TypeInfo, ValueView};
use crate::registry::ConverterRegistry;

/// Walks values through their [`ValueView`] and writes them to a
/// [`TokenSink`].
pub struct ValueWriter<'m> {
    cache: &'m MetadataCache,
    registry: &'m ConverterRegistry,
    max_depth: usize,
}

impl<'m> ValueWriter<'m> {
    pub fn new(cache: &'m MetadataCache, registry: &'m ConverterRegistry, max_depth: usize) -> Self {
        Self {
            cache,
            registry,
            max_depth,
        }
    }

    /// Writes `value` at nesting level `depth`.
    ///
    /// With `raw_root` set, a dynamic value at depth 0 is rendered to text on
    /// its own and handed to the sink in one piece.
    pub fn write_value(
        &self,
        value: &dyn Reflect,
        sink: &mut dyn TokenSink,
        raw_root: bool,
        depth: usize,
    ) -> Result<()> {
        self.check_depth(value, depth)?;

        match value.reflect() {
            ValueView::Null => sink.write_null()?,
            ValueView::Wrapper(wrapper) => {
                // Dynamic values write themselves, so their own levels are
                // checked up front.
                self.check_depth(value, depth + wrapper.nesting_depth())?;
                if raw_root && depth == 0 {
                    sink.write_raw(&wrapper.to_json()?)?;
                } else {
                    wrapper.write_json(sink)?;
                }
            }
            ValueView::Str(s) => sink.write_str(s)?,
            ValueView::Double(d) => sink.write_f64(d)?,
            ValueView::Int(i) => sink.write_i32(i)?,
            ValueView::Bool(b) => sink.write_bool(b)?,
            ValueView::Long(l) => sink.write_i64(l)?,
            ValueView::Inner(inner) => return self.write_value(inner, sink, raw_root, depth),
            ValueView::Sequence(items) => {
                sink.write_array_start()?;
                for item in items {
                    self.write_value(item, sink, raw_root, depth + 1)?;
                }
                sink.write_array_end()?;
            }
            ValueView::Map(entries) => {
                sink.write_object_start()?;
                for (key, item) in entries {
                    sink.write_property_name(key)?;
                    self.write_value(item, sink, raw_root, depth + 1)?;
                }
                sink.write_object_end()?;
            }
            ValueView::Opaque => return self.write_opaque(value, sink, raw_root, depth),
        }
        Ok(())
    }

    fn check_depth(&self, value: &dyn Reflect, depth: usize) -> Result<()> {
        if depth > self.max_depth {
            let ty = value.type_handle().name();
            debug!(ty, depth, "max nesting depth exceeded while writing");
            return Err(MapperError::DepthExceeded {
                ty,
                limit: self.max_depth,
            });
        }
        Ok(())
    }

    /// Exporters first, then enum values, then the member walk.
    fn write_opaque(
        &self,
        value: &dyn Reflect,
        sink: &mut dyn TokenSink,
        raw_root: bool,
        depth: usize,
    ) -> Result<()> {
        let ty = value.type_handle();

        if let Some(exporter) = self.registry.custom_exporter(ty) {
            return exporter(value.as_any(), sink);
        }
        if let Some(exporter) = self.registry.base_exporter(ty) {
            return exporter(value.as_any(), sink);
        }

        let info = self.cache.type_info(ty);
        if let Some(enumeration) = info.enumeration_info() {
            let raw = (enumeration.to_raw)(value.as_any())
                .ok_or(MapperError::TypeMismatch { expected: ty.name() })?;
            // Reinterpreting casts, so negative 64-bit values wrap.
            if enumeration.repr().writes_unsigned() {
                sink.write_u64(raw as u64)?;
            } else {
                sink.write_i32(raw as i32)?;
            }
            return Ok(());
        }

        sink.write_object_start()?;
        for property in self.cache.properties_of(ty).iter().filter(|p| p.readable) {
            let Some(member) = property.access.get(value.as_any()) else {
                continue;
            };
            sink.write_property_name(&property.name)?;
            self.write_value(member.as_reflect(), sink, raw_root, depth + 1)?;
        }
        if self.cache.object_shape_of(ty).is_map {
            self.write_extra_entries(value, &info, sink, raw_root, depth)?;
        }
        sink.write_object_end()?;
        Ok(())
    }

    /// Entries of a map-like struct that live outside its declared members.
    fn write_extra_entries(
        &self,
        value: &dyn Reflect,
        info: &TypeInfo,
        sink: &mut dyn TokenSink,
        raw_root: bool,
        depth: usize,
    ) -> Result<()> {
        let Some(bag) = info
            .map
            .as_ref()
            .and_then(|map| map.entries.as_ref())
            .and_then(|entries| entries.get(value.as_any()))
        else {
            return Ok(());
        };
        if let ValueView::Map(entries) = bag.as_reflect().reflect() {
            for (key, item) in entries {
                sink.write_property_name(key)?;
                self.write_value(item, sink, raw_root, depth + 1)?;
            }
        }
        Ok(())
    }
}

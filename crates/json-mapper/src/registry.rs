//! Importers and exporters: conversion functions that bridge JSON token kinds
//! and types the mapper cannot handle structurally.
//!
//! Each direction has two tables. The built-in one is filled at construction
//! and never changes; the custom one holds user registrations, is consulted
//! first, and can be cleared.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use json_mapper_tokens::TokenSink;
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{MapperError, Result};
use crate::metadata::{read_lock, write_lock};
use crate::reflect::{Erased, ExporterFn, ImporterFn, TypeHandle, Typed};

/// Format used for date/times on output, and tried first on input.
pub const DATE_TIME_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

const DATE_TIME_INPUT_FORMATS: &[&str] = &[
    DATE_TIME_FORMAT,
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
];

const DATE_INPUT_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d"];

type ImporterKey = (TypeHandle, TypeHandle);

pub struct ConverterRegistry {
    base_exporters: HashMap<TypeHandle, ExporterFn>,
    base_importers: HashMap<ImporterKey, ImporterFn>,
    custom_exporters: RwLock<HashMap<TypeHandle, ExporterFn>>,
    custom_importers: RwLock<HashMap<ImporterKey, ImporterFn>>,
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConverterRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            base_exporters: HashMap::new(),
            base_importers: HashMap::new(),
            custom_exporters: RwLock::new(HashMap::new()),
            custom_importers: RwLock::new(HashMap::new()),
        };
        registry.register_base_exporters();
        registry.register_base_importers();
        registry
    }

    /// Writes every value of type `T` with `exporter`, replacing any
    /// earlier registration for `T`.
    pub fn register_exporter<T: Typed>(
        &self,
        exporter: impl Fn(&T, &mut dyn TokenSink) -> Result<()> + Send + Sync + 'static,
    ) {
        debug!(ty = type_name::<T>(), "registering exporter");
        write_lock(&self.custom_exporters).insert(TypeHandle::of::<T>(), erase_exporter(exporter));
    }

    /// Reads a `D` from a JSON scalar whose native type is `S` (`i32`, `i64`,
    /// `f64`, `bool` or `String`) with `importer`, replacing any earlier
    /// registration for the pair.
    pub fn register_importer<S: Typed, D: Typed>(
        &self,
        importer: impl Fn(&S) -> Result<D> + Send + Sync + 'static,
    ) {
        debug!(
            source = type_name::<S>(),
            target = type_name::<D>(),
            "registering importer"
        );
        write_lock(&self.custom_importers).insert(
            (TypeHandle::of::<S>(), TypeHandle::of::<D>()),
            erase_importer(importer),
        );
    }

    pub fn unregister_exporters(&self) {
        debug!("clearing custom exporters");
        write_lock(&self.custom_exporters).clear();
    }

    pub fn unregister_importers(&self) {
        debug!("clearing custom importers");
        write_lock(&self.custom_importers).clear();
    }

    pub fn custom_exporter(&self, ty: TypeHandle) -> Option<ExporterFn> {
        read_lock(&self.custom_exporters).get(&ty).cloned()
    }

    pub fn base_exporter(&self, ty: TypeHandle) -> Option<ExporterFn> {
        self.base_exporters.get(&ty).cloned()
    }

    pub fn custom_importer(&self, source: TypeHandle, target: TypeHandle) -> Option<ImporterFn> {
        read_lock(&self.custom_importers)
            .get(&(source, target))
            .cloned()
    }

    pub fn base_importer(&self, source: TypeHandle, target: TypeHandle) -> Option<ImporterFn> {
        self.base_importers.get(&(source, target)).cloned()
    }

    fn base_exporter_for<T: Typed>(
        &mut self,
        exporter: impl Fn(&T, &mut dyn TokenSink) -> Result<()> + Send + Sync + 'static,
    ) {
        self.base_exporters
            .insert(TypeHandle::of::<T>(), erase_exporter(exporter));
    }

    fn base_importer_for<S: Typed, D: Typed>(
        &mut self,
        importer: impl Fn(&S) -> Result<D> + Send + Sync + 'static,
    ) {
        self.base_importers.insert(
            (TypeHandle::of::<S>(), TypeHandle::of::<D>()),
            erase_importer(importer),
        );
    }

    fn register_base_exporters(&mut self) {
        self.base_exporter_for(|v: &u8, w| Ok(w.write_i32(i32::from(*v))?));
        self.base_exporter_for(|v: &i8, w| Ok(w.write_i32(i32::from(*v))?));
        self.base_exporter_for(|v: &i16, w| Ok(w.write_i32(i32::from(*v))?));
        self.base_exporter_for(|v: &u16, w| Ok(w.write_i32(i32::from(*v))?));
        self.base_exporter_for(|v: &u32, w| Ok(w.write_u64(u64::from(*v))?));
        self.base_exporter_for(|v: &u64, w| Ok(w.write_u64(*v)?));
        self.base_exporter_for(|v: &f32, w| Ok(w.write_f64(f64::from(*v))?));
        self.base_exporter_for(|v: &char, w| Ok(w.write_str(v.encode_utf8(&mut [0; 4]))?));
        self.base_exporter_for(|v: &Decimal, w| Ok(w.write_decimal(*v)?));
        self.base_exporter_for(|v: &NaiveDateTime, w| {
            Ok(w.write_str(&v.format(DATE_TIME_FORMAT).to_string())?)
        });
    }

    fn register_base_importers(&mut self) {
        self.base_importer_for(|v: &i32| narrow::<i32, u8>(*v));
        self.base_importer_for(|v: &i32| narrow::<i32, i8>(*v));
        self.base_importer_for(|v: &i32| narrow::<i32, i16>(*v));
        self.base_importer_for(|v: &i32| narrow::<i32, u16>(*v));
        self.base_importer_for(|v: &i32| narrow::<i32, u32>(*v));
        self.base_importer_for(|v: &i32| narrow::<i32, u64>(*v));
        self.base_importer_for(|v: &i32| Ok(i64::from(*v)));
        self.base_importer_for(|v: &i32| Ok(f64::from(*v)));
        self.base_importer_for(|v: &i32| Ok(*v as f32));

        self.base_importer_for(|v: &i64| narrow::<i64, u32>(*v));
        self.base_importer_for(|v: &i64| narrow::<i64, u64>(*v));
        self.base_importer_for(|v: &i64| Ok(*v as f64));

        self.base_importer_for(|v: &f64| Ok(*v as f32));

        self.base_importer_for(|v: &i32| Ok(Decimal::from(*v)));
        self.base_importer_for(|v: &i64| Ok(Decimal::from(*v)));
        self.base_importer_for(|v: &f64| {
            Decimal::try_from(*v)
                .map_err(|e| MapperError::import(format!("{v} is not a decimal: {e}")))
        });

        self.base_importer_for(|v: &String| {
            let mut chars = v.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => Err(MapperError::import(format!(
                    "expected a single character, got {v:?}"
                ))),
            }
        });
        self.base_importer_for(|v: &String| parse_date_time(v));
    }
}

fn erase_exporter<T: Any>(
    exporter: impl Fn(&T, &mut dyn TokenSink) -> Result<()> + Send + Sync + 'static,
) -> ExporterFn {
    Arc::new(move |value: &dyn Any, sink: &mut dyn TokenSink| -> Result<()> {
        let value = value
            .downcast_ref::<T>()
            .ok_or(MapperError::TypeMismatch {
                expected: type_name::<T>(),
            })?;
        exporter(value, sink)
    })
}

fn erase_importer<S: Any, D: Any>(
    importer: impl Fn(&S) -> Result<D> + Send + Sync + 'static,
) -> ImporterFn {
    Arc::new(move |source: &dyn Any| -> Result<Erased> {
        let source = source
            .downcast_ref::<S>()
            .ok_or(MapperError::TypeMismatch {
                expected: type_name::<S>(),
            })?;
        Ok(Box::new(importer(source)?) as Erased)
    })
}

fn narrow<S, D>(value: S) -> Result<D>
where
    S: Copy + std::fmt::Display,
    D: TryFrom<S>,
{
    D::try_from(value).map_err(|_| {
        MapperError::import(format!("{value} is out of range for {}", type_name::<D>()))
    })
}

/// Parses the date/time formats the mapper accepts: its own output format,
/// ISO 8601 with or without an offset, and the date-only variants of both
/// (at midnight).
pub fn parse_date_time(text: &str) -> Result<NaiveDateTime> {
    for format in DATE_TIME_INPUT_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(parsed);
        }
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Ok(parsed.naive_utc());
    }
    for format in DATE_INPUT_FORMATS {
        if let Some(parsed) = NaiveDate::parse_from_str(text, format)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
        {
            return Ok(parsed);
        }
    }
    Err(MapperError::import(format!("unrecognized date/time {text:?}")))
}

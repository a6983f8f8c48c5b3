//! Per-type metadata, computed on first use and kept for the life of the
//! cache.
//!
//! Lookups take a read lock. A miss computes the entry with no lock held and
//! then inserts it under the write lock; when another thread got there first
//! its entry is kept and the fresh one dropped, so every caller observes the
//! same instance.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use tracing::trace;

use crate::data::JsonData;
use crate::reflect::{ImporterFn, MemberAccess, TypeHandle, TypeInfo};

pub(crate) fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// One gettable and/or settable member of a type.
#[derive(Clone)]
pub struct PropertyDescriptor {
    pub name: String,
    pub access: Arc<dyn MemberAccess>,
    pub ty: TypeHandle,
    /// `true` for a plain field, `false` for a computed accessor.
    pub is_field: bool,
    pub readable: bool,
    pub writable: bool,
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("is_field", &self.is_field)
            .field("readable", &self.readable)
            .field("writable", &self.writable)
            .finish()
    }
}

/// How a type behaves as a JSON array.
#[derive(Debug, Clone, Default)]
pub struct ArrayShape {
    pub element_type: Option<TypeHandle>,
    pub is_array: bool,
    pub is_list: bool,
}

impl ArrayShape {
    /// Element type, or [`JsonData`] when the type does not declare one.
    pub fn element_type(&self) -> TypeHandle {
        self.element_type.unwrap_or_else(TypeHandle::of::<JsonData>)
    }

    pub fn is_sequence(&self) -> bool {
        self.is_array || self.is_list
    }
}

/// How a type behaves as a JSON object.
#[derive(Debug, Clone, Default)]
pub struct ObjectShape {
    pub is_map: bool,
    pub element_type: Option<TypeHandle>,
    /// Known members, in declaration order.
    pub properties: IndexMap<String, PropertyDescriptor>,
}

impl ObjectShape {
    /// Value type for keys that match no known property, or [`JsonData`]
    /// when the type does not declare one.
    pub fn element_type(&self) -> TypeHandle {
        self.element_type.unwrap_or_else(TypeHandle::of::<JsonData>)
    }
}

type Table<K, V> = RwLock<HashMap<K, V>>;

/// Thread-safe memo of everything the reader and writer learn about types.
#[derive(Default)]
pub struct MetadataCache {
    type_info: Table<TypeHandle, Arc<TypeInfo>>,
    arrays: Table<TypeHandle, Arc<ArrayShape>>,
    objects: Table<TypeHandle, Arc<ObjectShape>>,
    properties: Table<TypeHandle, Arc<Vec<PropertyDescriptor>>>,
    conv_ops: Table<(TypeHandle, TypeHandle), Option<ImporterFn>>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The type's own description, as returned by [`crate::Typed::type_info`].
    pub fn type_info(&self, ty: TypeHandle) -> Arc<TypeInfo> {
        cached(&self.type_info, ty, "type info", || Arc::new(ty.describe()))
    }

    pub fn array_shape_of(&self, ty: TypeHandle) -> Arc<ArrayShape> {
        cached(&self.arrays, ty, "array shape", || {
            let info = self.type_info(ty);
            let shape = match &info.sequence {
                Some(seq) => ArrayShape {
                    element_type: seq.element,
                    is_array: seq.fixed,
                    is_list: !seq.fixed,
                },
                None => ArrayShape::default(),
            };
            Arc::new(shape)
        })
    }

    pub fn object_shape_of(&self, ty: TypeHandle) -> Arc<ObjectShape> {
        cached(&self.objects, ty, "object shape", || {
            let info = self.type_info(ty);
            let properties = describe_members(&info)
                .into_iter()
                .map(|p| (p.name.clone(), p))
                .collect();
            Arc::new(ObjectShape {
                is_map: info.map.is_some(),
                element_type: info.map.as_ref().and_then(|m| m.element),
                properties,
            })
        })
    }

    /// All members of the type in declaration order, including write-only
    /// ones; the writer skips those that are not readable.
    pub fn properties_of(&self, ty: TypeHandle) -> Arc<Vec<PropertyDescriptor>> {
        cached(&self.properties, ty, "properties", || {
            Arc::new(describe_members(&self.type_info(ty)))
        })
    }

    /// Implicit conversion from `source` that `target` declares, if any.
    /// Misses are cached too.
    pub fn conversion_op(&self, target: TypeHandle, source: TypeHandle) -> Option<ImporterFn> {
        cached(&self.conv_ops, (target, source), "conversion", || {
            self.type_info(target)
                .conversions
                .iter()
                .find(|(from, _)| *from == source)
                .map(|(_, op)| op.clone())
        })
    }
}

fn describe_members(info: &TypeInfo) -> Vec<PropertyDescriptor> {
    info.members()
        .iter()
        .map(|m| PropertyDescriptor {
            name: m.name.clone(),
            access: m.access.clone(),
            ty: m.ty,
            is_field: m.is_field,
            readable: m.access.readable(),
            writable: m.access.writable(),
        })
        .collect()
}

fn cached<K, V>(table: &Table<K, V>, key: K, what: &str, compute: impl FnOnce() -> V) -> V
where
    K: Eq + Hash + fmt::Debug,
    V: Clone,
{
    if let Some(hit) = read_lock(table).get(&key) {
        return hit.clone();
    }
    let fresh = compute();
    let mut table = write_lock(table);
    trace!(?key, what, "populating metadata cache");
    table.entry(key).or_insert(fresh).clone()
}

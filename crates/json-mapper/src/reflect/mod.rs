//! Runtime type descriptions.
//!
//! Rust has no runtime reflection, so every type the mapper handles describes
//! itself once through [`Typed::type_info`]. The mapper calls that function
//! at most once per type (see [`crate::MetadataCache`]) and works from the
//! cached result afterwards.
//!
//! Two traits split the static and dynamic sides:
//!
//! - [`Typed`] is implemented per type. It gives the static description and how an
//!   instance presents itself to the writer ([`ValueView`]).
//! - [`Reflect`] is object-safe, blanket-implemented for every [`Typed`], used
//!   wherever the mapper holds a value whose concrete type is only known at
//!   runtime.
//!
//! User structs and fieldless enums are usually described with the
//! [`reflect_struct!`](crate::reflect_struct) and
//! [`reflect_enum!`](crate::reflect_enum) macros.

mod impls;
mod info;
mod macros;

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::data::JsonWrapper;

pub use info::{
    EnumInfo, EnumRepr, EnumReprType, Erased, ExporterFn, ImporterFn, MapInfo, MemberAccess,
    MemberInfo, MemberValue, ObjectBuilder, SequenceInfo, TypeInfo, WrapInfo,
};
pub(crate) use info::downcast;

/// A copyable token identifying a type at runtime.
#[derive(Clone, Copy)]
pub struct TypeHandle {
    id: TypeId,
    name: &'static str,
    describe: fn() -> TypeInfo,
}

impl TypeHandle {
    pub fn of<T: Typed>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            describe: T::type_info,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Runs the type's description function. Uncached; the mapper goes
    /// through [`crate::MetadataCache::type_info`] instead.
    pub fn describe(&self) -> TypeInfo {
        (self.describe)()
    }
}

impl PartialEq for TypeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeHandle {}

impl Hash for TypeHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHandle({})", self.name)
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// How a value presents itself to the writer.
pub enum ValueView<'a> {
    Null,
    Str(&'a str),
    Double(f64),
    Int(i32),
    Bool(bool),
    Long(i64),
    /// A dynamic JSON value that knows how to emit itself.
    Wrapper(&'a dyn JsonWrapper),
    /// Transparent indirection (`Some(v)`, `Box<T>`): write the inner value.
    Inner(&'a dyn Reflect),
    /// Fixed-size array or list.
    Sequence(Box<dyn Iterator<Item = &'a dyn Reflect> + 'a>),
    /// String-keyed map.
    Map(Box<dyn Iterator<Item = (&'a str, &'a dyn Reflect)> + 'a>),
    /// Not a primitive or container: resolved through exporters, enum
    /// handling or the member walk.
    Opaque,
}

/// Static side of a mappable type.
pub trait Typed: Any + Send + Sync + Sized {
    fn type_info() -> TypeInfo;

    fn view(&self) -> ValueView<'_> {
        ValueView::Opaque
    }
}

/// Object-safe view of any [`Typed`] value.
pub trait Reflect: Any + Send + Sync {
    /// Runtime type of the value.
    fn type_handle(&self) -> TypeHandle;

    fn as_any(&self) -> &dyn Any;

    fn reflect(&self) -> ValueView<'_>;
}

impl<T: Typed> Reflect for T {
    fn type_handle(&self) -> TypeHandle {
        TypeHandle::of::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn reflect(&self) -> ValueView<'_> {
        Typed::view(self)
    }
}

impl fmt::Debug for dyn Reflect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reflect({})", self.type_handle())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn handles_compare_by_type_id() {
        let a = TypeHandle::of::<i32>();
        let b = TypeHandle::of::<i32>();
        let c = TypeHandle::of::<i64>();
        assert_eq!(a, b);
        assert_ne!(a, c);
        let set: HashSet<TypeHandle> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert_eq!(a.name(), "i32");
    }

    #[test]
    fn dyn_reflect_reports_runtime_type() {
        let value: Box<dyn Reflect> = Box::new(String::from("x"));
        assert_eq!(value.type_handle(), TypeHandle::of::<String>());
        assert!(value.as_any().downcast_ref::<String>().is_some());
        assert!(matches!(value.reflect(), ValueView::Str("x")));
    }
}

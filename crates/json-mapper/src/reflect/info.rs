use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use json_mapper_tokens::{TokenSink, TokenSource};

use super::{Reflect, TypeHandle, Typed};
use crate::data::{JsonType, JsonWrapper};
use crate::error::{MapperError, Result};
use crate::reader::ValueReader;

/// A value whose concrete type is tracked by a [`TypeHandle`] elsewhere.
pub type Erased = Box<dyn Any>;

/// Converts a scalar source value into an instance of the target type.
pub type ImporterFn = Arc<dyn Fn(&dyn Any) -> Result<Erased> + Send + Sync>;

/// Writes a value of one runtime type to a token sink.
pub type ExporterFn = Arc<dyn Fn(&dyn Any, &mut dyn TokenSink) -> Result<()> + Send + Sync>;

type Factory = Arc<dyn Fn() -> Erased + Send + Sync>;

/// Reads the value at the stream's current token into a dynamic wrapper.
pub(crate) type DynamicReadFn =
    Arc<dyn Fn(&ValueReader<'_>, &mut dyn TokenSource, usize) -> Result<Erased> + Send + Sync>;

pub(crate) fn downcast<T: 'static>(value: Erased) -> Result<T> {
    value
        .downcast::<T>()
        .map(|v| *v)
        .map_err(|_| MapperError::TypeMismatch {
            expected: std::any::type_name::<T>(),
        })
}

pub(crate) fn downcast_mut<T: 'static>(value: &mut dyn Any) -> Result<&mut T> {
    value
        .downcast_mut::<T>()
        .ok_or(MapperError::TypeMismatch {
            expected: std::any::type_name::<T>(),
        })
}

/// Collection operations of an array-like or list-like type.
#[derive(Clone)]
pub struct SequenceInfo {
    pub(crate) fixed: bool,
    pub(crate) element: Option<TypeHandle>,
    pub(crate) collect: Arc<dyn Fn(Vec<Erased>) -> Result<Erased> + Send + Sync>,
}

/// Operations of a string-keyed associative type.
#[derive(Clone)]
pub struct MapInfo {
    pub(crate) element: Option<TypeHandle>,
    pub(crate) insert: Arc<dyn Fn(&mut dyn Any, String, Erased) -> Result<()> + Send + Sync>,
    /// Where a struct keeps the entries that match none of its members.
    /// `None` for plain maps, which list their entries through their own view.
    pub(crate) entries: Option<Arc<dyn MemberAccess>>,
}

/// A transparent wrapper (`Option<T>`, `Box<T>`) around an inner type.
#[derive(Clone)]
pub struct WrapInfo {
    pub(crate) inner: TypeHandle,
    pub(crate) wrap: Arc<dyn Fn(Erased) -> Result<Erased> + Send + Sync>,
}

/// Underlying integer representation of a fieldless enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumRepr {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
}

impl EnumRepr {
    /// 64-bit and unsigned 32-bit representations are written as unsigned
    /// numbers; everything else as a signed 32-bit number.
    pub fn writes_unsigned(self) -> bool {
        matches!(self, EnumRepr::I64 | EnumRepr::U32 | EnumRepr::U64)
    }
}

/// Maps a primitive integer type to its [`EnumRepr`].
pub trait EnumReprType {
    const REPR: EnumRepr;
}

macro_rules! enum_repr_type {
    ($($ty:ty => $repr:ident),* $(,)?) => {
        $(impl EnumReprType for $ty {
            const REPR: EnumRepr = EnumRepr::$repr;
        })*
    };
}

enum_repr_type! {
    i8 => I8, u8 => U8, i16 => I16, u16 => U16,
    i32 => I32, u32 => U32, i64 => I64, u64 => U64,
}

#[derive(Clone)]
pub struct EnumInfo {
    pub(crate) repr: EnumRepr,
    pub(crate) to_raw: Arc<dyn Fn(&dyn Any) -> Option<i128> + Send + Sync>,
    pub(crate) from_raw: Arc<dyn Fn(i128) -> Option<Erased> + Send + Sync>,
}

impl EnumInfo {
    pub fn repr(&self) -> EnumRepr {
        self.repr
    }
}

/// Current value of a member: borrowed for fields, owned for computed
/// accessors.
pub enum MemberValue<'a> {
    Borrowed(&'a dyn Reflect),
    Owned(Box<dyn Reflect>),
}

impl MemberValue<'_> {
    pub fn as_reflect(&self) -> &dyn Reflect {
        match self {
            MemberValue::Borrowed(v) => *v,
            MemberValue::Owned(v) => v.as_ref(),
        }
    }
}

/// Type-erased get/set access to one member of an owning type.
pub trait MemberAccess: Send + Sync {
    fn readable(&self) -> bool;
    fn writable(&self) -> bool;
    /// `None` when the member is write-only or `owner` has the wrong type.
    fn get<'a>(&self, owner: &'a dyn Any) -> Option<MemberValue<'a>>;
    fn set(&self, owner: &mut dyn Any, value: Erased) -> Result<()>;
}

struct FieldAccess<T, F, G, S> {
    get: G,
    set: S,
    _marker: PhantomData<fn(&T) -> F>,
}

impl<T, F, G, S> MemberAccess for FieldAccess<T, F, G, S>
where
    T: Any,
    F: Typed,
    G: Fn(&T) -> &F + Send + Sync,
    S: Fn(&mut T, F) + Send + Sync,
{
    fn readable(&self) -> bool {
        true
    }

    fn writable(&self) -> bool {
        true
    }

    fn get<'a>(&self, owner: &'a dyn Any) -> Option<MemberValue<'a>> {
        let owner = owner.downcast_ref::<T>()?;
        let field: &'a F = (self.get)(owner);
        Some(MemberValue::Borrowed(field))
    }

    fn set(&self, owner: &mut dyn Any, value: Erased) -> Result<()> {
        let value = downcast::<F>(value)?;
        (self.set)(downcast_mut::<T>(owner)?, value);
        Ok(())
    }
}

/// Read-only borrow of a member, used for the entry bag of map-like structs.
struct BagAccess<T, M, G> {
    get: G,
    _marker: PhantomData<fn(&T) -> M>,
}

impl<T, M, G> MemberAccess for BagAccess<T, M, G>
where
    T: Any,
    M: Typed,
    G: Fn(&T) -> &M + Send + Sync,
{
    fn readable(&self) -> bool {
        true
    }

    fn writable(&self) -> bool {
        false
    }

    fn get<'a>(&self, owner: &'a dyn Any) -> Option<MemberValue<'a>> {
        let owner = owner.downcast_ref::<T>()?;
        let bag: &'a M = (self.get)(owner);
        Some(MemberValue::Borrowed(bag))
    }

    fn set(&self, _owner: &mut dyn Any, _value: Erased) -> Result<()> {
        Ok(())
    }
}

type Getter<T, F> = Box<dyn Fn(&T) -> F + Send + Sync>;
type Setter<T, F> = Box<dyn Fn(&mut T, F) + Send + Sync>;

struct AccessorAccess<T, F> {
    get: Option<Getter<T, F>>,
    set: Option<Setter<T, F>>,
}

impl<T: Any, F: Typed> MemberAccess for AccessorAccess<T, F> {
    fn readable(&self) -> bool {
        self.get.is_some()
    }

    fn writable(&self) -> bool {
        self.set.is_some()
    }

    fn get<'a>(&self, owner: &'a dyn Any) -> Option<MemberValue<'a>> {
        let get = self.get.as_ref()?;
        let owner = owner.downcast_ref::<T>()?;
        Some(MemberValue::Owned(Box::new(get(owner))))
    }

    fn set(&self, owner: &mut dyn Any, value: Erased) -> Result<()> {
        let Some(set) = self.set.as_ref() else {
            return Ok(());
        };
        let value = downcast::<F>(value)?;
        set(downcast_mut::<T>(owner)?, value);
        Ok(())
    }
}

/// One public member (field or accessor) of a type.
#[derive(Clone)]
pub struct MemberInfo {
    pub(crate) name: String,
    pub(crate) ty: TypeHandle,
    pub(crate) is_field: bool,
    pub(crate) access: Arc<dyn MemberAccess>,
}

impl fmt::Debug for MemberInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberInfo")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("is_field", &self.is_field)
            .finish()
    }
}

/// Everything the mapper can learn about a type.
///
/// Built by [`Typed::type_info`]; most types only fill in a few parts. A type
/// with none of them is a plain scalar handled through importers/exporters.
#[derive(Clone, Default)]
pub struct TypeInfo {
    pub(crate) null_value: Option<Factory>,
    pub(crate) construct: Option<Factory>,
    pub(crate) sequence: Option<SequenceInfo>,
    pub(crate) map: Option<MapInfo>,
    pub(crate) members: Vec<MemberInfo>,
    pub(crate) enumeration: Option<EnumInfo>,
    pub(crate) conversions: Vec<(TypeHandle, ImporterFn)>,
    pub(crate) wrap: Option<WrapInfo>,
    pub(crate) dynamic: Option<DynamicReadFn>,
}

impl TypeInfo {
    /// A type with no structure of its own.
    pub fn scalar() -> Self {
        Self::default()
    }

    /// Starts describing a struct-like type constructed with `Default`.
    pub fn object<T: Any + Default>() -> ObjectBuilder<T> {
        ObjectBuilder::new().constructor(T::default)
    }

    /// Starts describing a type without a default constructor. Such a type
    /// can be written but not read from a JSON object.
    pub fn builder<T: Any>() -> ObjectBuilder<T> {
        ObjectBuilder::new()
    }

    /// A growable list whose elements are `E`.
    pub fn list<C, E>(collect: impl Fn(Vec<E>) -> C + Send + Sync + 'static) -> Self
    where
        C: Any,
        E: Typed,
    {
        Self::sequence(false, Some(TypeHandle::of::<E>()), collect)
    }

    /// A fixed-size array whose elements are `E`.
    pub fn array<C, E>(collect: impl Fn(Vec<E>) -> C + Send + Sync + 'static) -> Self
    where
        C: Any,
        E: Typed,
    {
        Self::sequence(true, Some(TypeHandle::of::<E>()), collect)
    }

    /// Sequence description. `element` may be `None` when the element type
    /// is not known; items are then read as dynamic values.
    pub fn sequence<C, E>(
        fixed: bool,
        element: Option<TypeHandle>,
        collect: impl Fn(Vec<E>) -> C + Send + Sync + 'static,
    ) -> Self
    where
        C: Any,
        E: 'static,
    {
        Self {
            sequence: Some(SequenceInfo {
                fixed,
                element,
                collect: Arc::new(move |items: Vec<Erased>| -> Result<Erased> {
                    let items = items
                        .into_iter()
                        .map(downcast::<E>)
                        .collect::<Result<Vec<E>>>()?;
                    Ok(Box::new(collect(items)) as Erased)
                }),
            }),
            ..Self::default()
        }
    }

    /// A string-keyed map with values of type `V`, constructed with
    /// `Default`.
    pub fn map<M, V>(insert: impl Fn(&mut M, String, V) + Send + Sync + 'static) -> Self
    where
        M: Any + Default,
        V: Typed,
    {
        Self {
            construct: Some(Arc::new(|| Box::new(M::default()) as Erased)),
            map: Some(map_info::<M, V>(insert, None)),
            ..Self::default()
        }
    }

    /// `Option<T>`: nullable, otherwise transparent.
    pub fn option<T: Typed>() -> Self {
        Self {
            null_value: Some(Arc::new(|| Box::new(None::<T>) as Erased)),
            wrap: Some(WrapInfo {
                inner: TypeHandle::of::<T>(),
                wrap: Arc::new(|inner: Erased| -> Result<Erased> {
                    Ok(Box::new(Some(downcast::<T>(inner)?)) as Erased)
                }),
            }),
            ..Self::default()
        }
    }

    /// `Box<T>`: transparent, never null.
    pub fn boxed<T: Typed>() -> Self {
        Self {
            wrap: Some(WrapInfo {
                inner: TypeHandle::of::<T>(),
                wrap: Arc::new(|inner: Erased| -> Result<Erased> {
                    Ok(Box::new(Box::new(downcast::<T>(inner)?)) as Erased)
                }),
            }),
            ..Self::default()
        }
    }

    /// A dynamic JSON value type. Its instances are built token by token
    /// through the [`JsonWrapper`] setters instead of by shape, so every
    /// JSON kind is accepted.
    pub fn wrapper<W: JsonWrapper + Default + Any>() -> Self {
        Self {
            null_value: Some(Arc::new(|| {
                let mut value = W::default();
                value.set_kind(JsonType::Null);
                Box::new(value) as Erased
            })),
            dynamic: Some(Arc::new(
                |reader: &ValueReader<'_>, stream: &mut dyn TokenSource, depth: usize| -> Result<Erased> {
                    let value = reader.wrapper_at(&W::default, stream, depth)?;
                    Ok(Box::new(value) as Erased)
                },
            )),
            ..Self::default()
        }
    }

    /// A fieldless enum stored as `repr`.
    pub fn enumeration<T: Any>(
        repr: EnumRepr,
        to_raw: impl Fn(&T) -> i128 + Send + Sync + 'static,
        from_raw: impl Fn(i128) -> Option<T> + Send + Sync + 'static,
    ) -> Self {
        Self {
            enumeration: Some(EnumInfo {
                repr,
                to_raw: Arc::new(move |value: &dyn Any| value.downcast_ref::<T>().map(&to_raw)),
                from_raw: Arc::new(move |raw: i128| from_raw(raw).map(|v| Box::new(v) as Erased)),
            }),
            ..Self::default()
        }
    }

    /// Makes the type accept JSON `null`, producing `null_value()`.
    pub fn with_null<T: Any>(mut self, null_value: impl Fn() -> T + Send + Sync + 'static) -> Self {
        self.null_value = Some(Arc::new(move || Box::new(null_value()) as Erased));
        self
    }

    /// Sets the constructor used when reading a JSON object into the type.
    pub fn with_constructor<T: Any>(
        mut self,
        construct: impl Fn() -> T + Send + Sync + 'static,
    ) -> Self {
        self.construct = Some(Arc::new(move || Box::new(construct()) as Erased));
        self
    }

    /// Adds an implicit conversion from `S`, tried after importers.
    pub fn with_conversion<S: Typed, T: Any>(
        mut self,
        convert: impl Fn(&S) -> T + Send + Sync + 'static,
    ) -> Self {
        self.conversions.push((TypeHandle::of::<S>(), conversion(convert)));
        self
    }

    pub fn is_nullable(&self) -> bool {
        self.null_value.is_some()
    }

    pub fn members(&self) -> &[MemberInfo] {
        &self.members
    }

    pub fn enumeration_info(&self) -> Option<&EnumInfo> {
        self.enumeration.as_ref()
    }

    /// Whether the type is read through [`JsonWrapper`] setters.
    pub fn is_dynamic(&self) -> bool {
        self.dynamic.is_some()
    }
}

fn map_info<M, V>(
    insert: impl Fn(&mut M, String, V) + Send + Sync + 'static,
    entries: Option<Arc<dyn MemberAccess>>,
) -> MapInfo
where
    M: Any,
    V: Typed,
{
    MapInfo {
        entries,
        element: Some(TypeHandle::of::<V>()),
        insert: Arc::new(move |owner: &mut dyn Any, key: String, value: Erased| -> Result<()> {
            let value = downcast::<V>(value)?;
            insert(downcast_mut::<M>(owner)?, key, value);
            Ok(())
        }),
    }
}

fn conversion<S: Typed, T: Any>(convert: impl Fn(&S) -> T + Send + Sync + 'static) -> ImporterFn {
    Arc::new(move |source: &dyn Any| -> Result<Erased> {
        let source = source
            .downcast_ref::<S>()
            .ok_or(MapperError::TypeMismatch {
                expected: std::any::type_name::<S>(),
            })?;
        Ok(Box::new(convert(source)) as Erased)
    })
}

/// Builds the [`TypeInfo`] of a struct-like type member by member.
///
/// Members are kept in the order they are added; that order is the order in
/// which the writer emits them.
///
/// ```
/// use json_mapper::{TypeInfo, Typed};
///
/// #[derive(Default)]
/// struct Temperature {
///     celsius: f64,
/// }
///
/// impl Typed for Temperature {
///     fn type_info() -> TypeInfo {
///         TypeInfo::object::<Temperature>()
///             .field("celsius", |t: &Temperature| &t.celsius, |t: &mut Temperature, v: f64| t.celsius = v)
///             .read_only("fahrenheit", |t: &Temperature| t.celsius * 1.8 + 32.0)
///             .build()
///     }
/// }
///
/// let json = json_mapper::to_json(&Temperature { celsius: 100.0 }).unwrap();
/// assert_eq!(json, r#"{"celsius":100.0,"fahrenheit":212.0}"#);
/// ```
pub struct ObjectBuilder<T> {
    info: TypeInfo,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any> ObjectBuilder<T> {
    fn new() -> Self {
        Self {
            info: TypeInfo::default(),
            _marker: PhantomData,
        }
    }

    pub fn constructor(mut self, construct: impl Fn() -> T + Send + Sync + 'static) -> Self {
        self.info.construct = Some(Arc::new(move || Box::new(construct()) as Erased));
        self
    }

    /// A readable and writable field.
    pub fn field<F, G, S>(mut self, name: &str, get: G, set: S) -> Self
    where
        F: Typed,
        G: Fn(&T) -> &F + Send + Sync + 'static,
        S: Fn(&mut T, F) + Send + Sync + 'static,
    {
        self.info.members.push(MemberInfo {
            name: name.to_string(),
            ty: TypeHandle::of::<F>(),
            is_field: true,
            access: Arc::new(FieldAccess {
                get,
                set,
                _marker: PhantomData,
            }),
        });
        self
    }

    /// A computed property with both a getter and a setter.
    pub fn accessor<F: Typed>(
        self,
        name: &str,
        get: impl Fn(&T) -> F + Send + Sync + 'static,
        set: impl Fn(&mut T, F) + Send + Sync + 'static,
    ) -> Self {
        self.push_accessor::<F>(name, Some(Box::new(get)), Some(Box::new(set)))
    }

    /// A computed property that can be read but not assigned.
    pub fn read_only<F: Typed>(self, name: &str, get: impl Fn(&T) -> F + Send + Sync + 'static) -> Self {
        self.push_accessor::<F>(name, Some(Box::new(get)), None)
    }

    /// A property that can be assigned but is never written out.
    pub fn write_only<F: Typed>(
        self,
        name: &str,
        set: impl Fn(&mut T, F) + Send + Sync + 'static,
    ) -> Self {
        self.push_accessor::<F>(name, None, Some(Box::new(set)))
    }

    fn push_accessor<F: Typed>(
        mut self,
        name: &str,
        get: Option<Getter<T, F>>,
        set: Option<Setter<T, F>>,
    ) -> Self {
        self.info.members.push(MemberInfo {
            name: name.to_string(),
            ty: TypeHandle::of::<F>(),
            is_field: false,
            access: Arc::new(AccessorAccess { get, set }),
        });
        self
    }

    /// Makes the type map-like. JSON keys that match no member are inserted
    /// with `insert`; on output the string-keyed map returned by `entries` is
    /// written after the members.
    pub fn extra_entries<M, V, G>(
        mut self,
        entries: G,
        insert: impl Fn(&mut T, String, V) + Send + Sync + 'static,
    ) -> Self
    where
        M: Typed,
        V: Typed,
        G: Fn(&T) -> &M + Send + Sync + 'static,
    {
        let bag: Arc<dyn MemberAccess> = Arc::new(BagAccess {
            get: entries,
            _marker: PhantomData,
        });
        self.info.map = Some(map_info::<T, V>(insert, Some(bag)));
        self
    }

    /// Accepts JSON `null` for this type, producing `null_value()`.
    pub fn nullable(mut self, null_value: impl Fn() -> T + Send + Sync + 'static) -> Self {
        self.info.null_value = Some(Arc::new(move || Box::new(null_value()) as Erased));
        self
    }

    /// Implicit conversion from a scalar of type `S`.
    pub fn implicit_from<S: Typed>(mut self, convert: impl Fn(&S) -> T + Send + Sync + 'static) -> Self {
        self.info
            .conversions
            .push((TypeHandle::of::<S>(), conversion(convert)));
        self
    }

    pub fn build(self) -> TypeInfo {
        self.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Sample {
        id: i32,
        label: String,
    }

    fn sample_info() -> TypeInfo {
        TypeInfo::object::<Sample>()
            .field("id", |s: &Sample| &s.id, |s: &mut Sample, v: i32| s.id = v)
            .read_only("label_len", |s: &Sample| s.label.len() as i64)
            .write_only("label", |s: &mut Sample, v: String| s.label = v)
            .build()
    }

    #[test]
    fn members_keep_declaration_order_and_flags() {
        let info = sample_info();
        let names: Vec<&str> = info.members().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["id", "label_len", "label"]);
        assert!(info.members[0].is_field);
        assert!(!info.members[1].access.writable());
        assert!(!info.members[2].access.readable());
    }

    #[test]
    fn field_access_round_trips_through_any() {
        let info = sample_info();
        let mut owner: Erased = (info.construct.as_ref().unwrap())();
        info.members[0]
            .access
            .set(owner.as_mut(), Box::new(7i32))
            .unwrap();
        info.members[2]
            .access
            .set(owner.as_mut(), Box::new(String::from("abc")))
            .unwrap();

        let got = info.members[0].access.get(owner.as_ref()).unwrap();
        assert_eq!(got.as_reflect().as_any().downcast_ref::<i32>(), Some(&7));
        let len = info.members[1].access.get(owner.as_ref()).unwrap();
        assert_eq!(len.as_reflect().as_any().downcast_ref::<i64>(), Some(&3));
        assert!(info.members[2].access.get(owner.as_ref()).is_none());
    }

    #[test]
    fn setter_rejects_wrong_value_type() {
        let info = sample_info();
        let mut owner: Erased = Box::new(Sample::default());
        let err = info.members[0]
            .access
            .set(owner.as_mut(), Box::new("nope"))
            .unwrap_err();
        assert!(matches!(err, MapperError::TypeMismatch { .. }));
    }

    #[test]
    fn sequence_collects_in_order() {
        let info = TypeInfo::list::<Vec<i32>, i32>(|items| items);
        let seq = info.sequence.unwrap();
        let out = (seq.collect)(vec![Box::new(1i32), Box::new(2i32)]).unwrap();
        assert_eq!(*out.downcast::<Vec<i32>>().unwrap(), vec![1, 2]);
        assert!(!seq.fixed);
    }

    #[test]
    fn enum_repr_unsigned_rule() {
        assert!(EnumRepr::I64.writes_unsigned());
        assert!(EnumRepr::U32.writes_unsigned());
        assert!(EnumRepr::U64.writes_unsigned());
        assert!(!EnumRepr::I32.writes_unsigned());
        assert!(!EnumRepr::U16.writes_unsigned());
        assert_eq!(<u32 as EnumReprType>::REPR, EnumRepr::U32);
    }
}

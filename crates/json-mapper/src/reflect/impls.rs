//! [`Typed`] for primitives, standard collections, `chrono` date/times and
//! `rust_decimal` decimals.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use rust_decimal::Decimal;

use super::{Reflect, TypeInfo, Typed, ValueView};

impl Typed for String {
    fn type_info() -> TypeInfo {
        TypeInfo::scalar()
    }

    fn view(&self) -> ValueView<'_> {
        ValueView::Str(self)
    }
}

impl Typed for f64 {
    fn type_info() -> TypeInfo {
        TypeInfo::scalar()
    }

    fn view(&self) -> ValueView<'_> {
        ValueView::Double(*self)
    }
}

impl Typed for i32 {
    fn type_info() -> TypeInfo {
        TypeInfo::scalar()
    }

    fn view(&self) -> ValueView<'_> {
        ValueView::Int(*self)
    }
}

impl Typed for bool {
    fn type_info() -> TypeInfo {
        TypeInfo::scalar()
    }

    fn view(&self) -> ValueView<'_> {
        ValueView::Bool(*self)
    }
}

impl Typed for i64 {
    fn type_info() -> TypeInfo {
        TypeInfo::scalar()
    }

    fn view(&self) -> ValueView<'_> {
        ValueView::Long(*self)
    }
}

// Written through the built-in exporters, read through the built-in
// importers.
macro_rules! opaque_scalar {
    ($($ty:ty),* $(,)?) => {
        $(impl Typed for $ty {
            fn type_info() -> TypeInfo {
                TypeInfo::scalar()
            }
        })*
    };
}

opaque_scalar!(u8, i8, i16, u16, u32, u64, f32, char, NaiveDateTime, Decimal);

impl<T: Typed> Typed for Option<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::option::<T>()
    }

    fn view(&self) -> ValueView<'_> {
        match self {
            Some(value) => ValueView::Inner(value),
            None => ValueView::Null,
        }
    }
}

impl<T: Typed> Typed for Box<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::boxed::<T>()
    }

    fn view(&self) -> ValueView<'_> {
        ValueView::Inner(&**self)
    }
}

impl<T: Typed> Typed for Vec<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::list::<Vec<T>, T>(|items| items)
    }

    fn view(&self) -> ValueView<'_> {
        ValueView::Sequence(Box::new(self.iter().map(|v| v as &dyn Reflect)))
    }
}

impl<T: Typed> Typed for Box<[T]> {
    fn type_info() -> TypeInfo {
        TypeInfo::array::<Box<[T]>, T>(|items: Vec<T>| items.into_boxed_slice())
    }

    fn view(&self) -> ValueView<'_> {
        ValueView::Sequence(Box::new(self.iter().map(|v| v as &dyn Reflect)))
    }
}

impl<V: Typed> Typed for HashMap<String, V> {
    fn type_info() -> TypeInfo {
        TypeInfo::map::<HashMap<String, V>, V>(|map, key, value| {
            map.insert(key, value);
        })
    }

    fn view(&self) -> ValueView<'_> {
        ValueView::Map(Box::new(
            self.iter().map(|(k, v)| (k.as_str(), v as &dyn Reflect)),
        ))
    }
}

impl<V: Typed> Typed for BTreeMap<String, V> {
    fn type_info() -> TypeInfo {
        TypeInfo::map::<BTreeMap<String, V>, V>(|map, key, value| {
            map.insert(key, value);
        })
    }

    fn view(&self) -> ValueView<'_> {
        ValueView::Map(Box::new(
            self.iter().map(|(k, v)| (k.as_str(), v as &dyn Reflect)),
        ))
    }
}

impl<V: Typed> Typed for IndexMap<String, V> {
    fn type_info() -> TypeInfo {
        TypeInfo::map::<IndexMap<String, V>, V>(|map, key, value| {
            map.insert(key, value);
        })
    }

    fn view(&self) -> ValueView<'_> {
        ValueView::Map(Box::new(
            self.iter().map(|(k, v)| (k.as_str(), v as &dyn Reflect)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::TypeHandle;

    #[test]
    fn primitives_view_directly() {
        assert!(matches!(5i32.view(), ValueView::Int(5)));
        assert!(matches!(5i64.view(), ValueView::Long(5)));
        assert!(matches!(true.view(), ValueView::Bool(true)));
        assert!(matches!(5u8.view(), ValueView::Opaque));
    }

    #[test]
    fn option_is_nullable_and_wraps_inner() {
        let info = <Option<u16> as Typed>::type_info();
        assert!(info.is_nullable());
        let wrap = info.wrap.unwrap();
        assert_eq!(wrap.inner, TypeHandle::of::<u16>());
        let wrapped = (wrap.wrap)(Box::new(9u16)).unwrap();
        assert_eq!(*wrapped.downcast::<Option<u16>>().unwrap(), Some(9));
    }

    #[test]
    fn boxed_slice_is_fixed_vec_is_not() {
        let fixed = <Box<[i32]> as Typed>::type_info().sequence.unwrap();
        let list = <Vec<i32> as Typed>::type_info().sequence.unwrap();
        assert!(fixed.fixed);
        assert!(!list.fixed);
        assert_eq!(list.element, Some(TypeHandle::of::<i32>()));
    }

    #[test]
    fn maps_construct_and_insert() {
        let info = <BTreeMap<String, i32> as Typed>::type_info();
        let mut map = (info.construct.as_ref().unwrap())();
        let ops = info.map.as_ref().unwrap();
        (ops.insert)(map.as_mut(), "k".into(), Box::new(3i32)).unwrap();
        let map = map.downcast::<BTreeMap<String, i32>>().unwrap();
        assert_eq!(map.get("k"), Some(&3));
    }
}

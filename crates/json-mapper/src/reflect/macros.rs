/// Implements [`Typed`](crate::Typed) for a struct with public-facing
/// fields.
///
/// Every listed field becomes a readable and writable member, in the order
/// given. The struct must implement `Default`, which is used to construct
/// instances when reading.
///
/// ```
/// use json_mapper::reflect_struct;
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// reflect_struct!(Point { x: i32, y: i32 });
///
/// assert_eq!(json_mapper::to_json(&Point { x: 1, y: 2 }).unwrap(), r#"{"x":1,"y":2}"#);
/// let p: Point = json_mapper::to_object_as(r#"{"y":5,"x":4}"#).unwrap();
/// assert_eq!(p, Point { x: 4, y: 5 });
/// ```
#[macro_export]
macro_rules! reflect_struct {
    ($ty:ident { $($field:ident : $fty:ty),* $(,)? }) => {
        impl $crate::Typed for $ty {
            fn type_info() -> $crate::TypeInfo {
                $crate::TypeInfo::object::<$ty>()
                    $(
                        .field(
                            stringify!($field),
                            |owner: &$ty| &owner.$field,
                            |owner: &mut $ty, value: $fty| owner.$field = value,
                        )
                    )*
                    .build()
            }
        }
    };
}

/// Implements [`Typed`](crate::Typed) for a fieldless, `Copy` enum with an
/// explicit integer representation.
///
/// The representation decides how the enum is written: `i64`, `u32` and
/// `u64` produce unsigned numbers, everything else a signed 32-bit number.
/// Reading accepts the numeric value of any listed variant.
///
/// ```
/// use json_mapper::reflect_enum;
///
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// #[repr(u8)]
/// enum Level {
///     Low = 1,
///     High = 10,
/// }
///
/// reflect_enum!(Level: u8 { Low, High });
///
/// assert_eq!(json_mapper::to_json(&Level::High).unwrap(), "10");
/// assert_eq!(json_mapper::to_object_as::<Level>("1").unwrap(), Level::Low);
/// ```
#[macro_export]
macro_rules! reflect_enum {
    ($ty:ident : $repr:ty { $($variant:ident),* $(,)? }) => {
        impl $crate::Typed for $ty {
            fn type_info() -> $crate::TypeInfo {
                $crate::TypeInfo::enumeration::<$ty>(
                    <$repr as $crate::EnumReprType>::REPR,
                    |value: &$ty| *value as $repr as i128,
                    |raw: i128| {
                        $(
                            if raw == $ty::$variant as $repr as i128 {
                                return Some($ty::$variant);
                            }
                        )*
                        None
                    },
                )
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::reflect::{EnumRepr, TypeHandle, Typed};

    #[derive(Debug, Default, PartialEq)]
    struct Pair {
        left: String,
        right: Option<i64>,
    }

    reflect_struct!(Pair {
        left: String,
        right: Option<i64>,
    });

    #[derive(Debug, Clone, Copy, PartialEq)]
    #[repr(i64)]
    enum Wide {
        Small = -1,
        Big = 1 << 40,
    }

    reflect_enum!(Wide: i64 { Small, Big });

    #[test]
    fn struct_macro_lists_fields_in_order() {
        let info = Pair::type_info();
        let members = info.members();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].name, "left");
        assert_eq!(members[1].ty, TypeHandle::of::<Option<i64>>());
        assert!(info.construct.is_some());
    }

    #[test]
    fn enum_macro_maps_raw_values() {
        let info = Wide::type_info();
        let en = info.enumeration_info().unwrap();
        assert_eq!(en.repr(), EnumRepr::I64);
        assert_eq!((en.to_raw)(&Wide::Big), Some(1 << 40));
        let small = (en.from_raw)(-1).unwrap();
        assert_eq!(*small.downcast::<Wide>().unwrap(), Wide::Small);
        assert!((en.from_raw)(7).is_none());
    }
}

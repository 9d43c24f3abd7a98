//! Bidirectional conversion between native values and engine values.
//!
//! - [`IntoScript`]: consume a native value and produce a [`ScriptValue`].
//! - [`FromScript`]: read a native value out of a [`ScriptValue`].
//!
//! Numeric conversions follow the engine's loose model: `Int` and `Float`
//! cross-coerce, and narrowing is accepted silently via `as` casts. Anything
//! non-numeric must match its kind exactly.
//!
//! Aggregate and class types get their impls from the [`script_aggregate!`]
//! and [`script_class!`] macros in [`crate::binding`]. Scalar-like extension
//! types use [`script_enum!`] / [`script_string!`] below, which bypass the
//! binding registry entirely.
//!
//! [`script_aggregate!`]: crate::script_aggregate
//! [`script_class!`]: crate::script_class
//! [`script_enum!`]: crate::script_enum
//! [`script_string!`]: crate::script_string

use crate::accessor::LiveAccessor;
use crate::error::{BindError, BindResult};
use crate::script_value::ScriptValue;

/// Convert a native value into an engine value.
///
/// Takes `self` by value: every crossing of the boundary hands the engine
/// its own copy (or, for class types, a freshly attached accessor).
pub trait IntoScript {
    fn into_script(self) -> BindResult<ScriptValue>;
}

/// Produce a native value from an engine value.
pub trait FromScript: Sized {
    fn from_script(value: &ScriptValue) -> BindResult<Self>;
}

macro_rules! impl_script_int {
    ($($ty:ty),*) => {
        $(
            impl IntoScript for $ty {
                fn into_script(self) -> BindResult<ScriptValue> {
                    Ok(ScriptValue::Int(self as i64))
                }
            }

            impl FromScript for $ty {
                fn from_script(value: &ScriptValue) -> BindResult<Self> {
                    match value {
                        // Narrowing accepted silently.
                        ScriptValue::Int(v) => Ok(*v as $ty),
                        ScriptValue::Float(v) => Ok(*v as $ty),
                        other => Err(BindError::TypeMismatch {
                            expected: "int",
                            actual: other.kind_name(),
                        }),
                    }
                }
            }
        )*
    };
}

impl_script_int!(i8, i16, i32, i64, u8, u16, u32, u64);

macro_rules! impl_script_float {
    ($($ty:ty),*) => {
        $(
            impl IntoScript for $ty {
                fn into_script(self) -> BindResult<ScriptValue> {
                    Ok(ScriptValue::Float(self as f64))
                }
            }

            impl FromScript for $ty {
                fn from_script(value: &ScriptValue) -> BindResult<Self> {
                    match value {
                        ScriptValue::Float(v) => Ok(*v as $ty),
                        ScriptValue::Int(v) => Ok(*v as $ty),
                        other => Err(BindError::TypeMismatch {
                            expected: "float",
                            actual: other.kind_name(),
                        }),
                    }
                }
            }
        )*
    };
}

impl_script_float!(f32, f64);

impl IntoScript for bool {
    fn into_script(self) -> BindResult<ScriptValue> {
        Ok(ScriptValue::Bool(self))
    }
}

impl FromScript for bool {
    fn from_script(value: &ScriptValue) -> BindResult<Self> {
        match value {
            ScriptValue::Bool(v) => Ok(*v),
            other => Err(BindError::TypeMismatch {
                expected: "bool",
                actual: other.kind_name(),
            }),
        }
    }
}

impl IntoScript for String {
    fn into_script(self) -> BindResult<ScriptValue> {
        Ok(ScriptValue::String(self))
    }
}

impl IntoScript for &str {
    fn into_script(self) -> BindResult<ScriptValue> {
        Ok(ScriptValue::String(self.to_owned()))
    }
}

impl FromScript for String {
    fn from_script(value: &ScriptValue) -> BindResult<Self> {
        match value {
            ScriptValue::String(s) => Ok(s.clone()),
            other => Err(BindError::TypeMismatch {
                expected: "string",
                actual: other.kind_name(),
            }),
        }
    }
}

/// The void-return path: a method returning `()` yields `Undefined`.
impl IntoScript for () {
    fn into_script(self) -> BindResult<ScriptValue> {
        Ok(ScriptValue::Undefined)
    }
}

impl FromScript for () {
    fn from_script(value: &ScriptValue) -> BindResult<Self> {
        match value {
            ScriptValue::Undefined => Ok(()),
            other => Err(BindError::TypeMismatch {
                expected: "undefined",
                actual: other.kind_name(),
            }),
        }
    }
}

/// References dereference then delegate; the referent is copied across.
impl<T: IntoScript + Clone> IntoScript for &T {
    fn into_script(self) -> BindResult<ScriptValue> {
        self.clone().into_script()
    }
}

impl IntoScript for ScriptValue {
    fn into_script(self) -> BindResult<ScriptValue> {
        Ok(self)
    }
}

/// Recover the accessor a class binding attached to an engine value.
///
/// Relies on the invariant that every class-typed engine value was produced
/// through this framework; a plain object carries no accessor and fails.
impl FromScript for LiveAccessor {
    fn from_script(value: &ScriptValue) -> BindResult<Self> {
        match value {
            ScriptValue::Object(object) => {
                object.user_data().ok_or(BindError::TypeMismatch {
                    expected: "class-bound object",
                    actual: "object",
                })
            }
            other => Err(BindError::TypeMismatch {
                expected: "class-bound object",
                actual: other.kind_name(),
            }),
        }
    }
}

/// Declare conversions for a fieldless enum.
///
/// The enum crosses the boundary as its integer discriminant. Requires
/// `#[repr(i32)]` with [`num_enum`]'s `IntoPrimitive` and
/// `TryFromPrimitive` derives (re-exported at the crate root):
///
/// ```ignore
/// use scriptbind::num_enum::{IntoPrimitive, TryFromPrimitive};
///
/// #[derive(Clone, Copy, IntoPrimitive, TryFromPrimitive)]
/// #[repr(i32)]
/// enum Facing { North, South }
///
/// scriptbind::script_enum!(Facing);
/// ```
#[macro_export]
macro_rules! script_enum {
    ($ty:ty) => {
        impl $crate::IntoScript for $ty {
            fn into_script(self) -> $crate::BindResult<$crate::ScriptValue> {
                Ok($crate::ScriptValue::Int(i64::from(i32::from(self))))
            }
        }

        impl $crate::FromScript for $ty {
            fn from_script(value: &$crate::ScriptValue) -> $crate::BindResult<Self> {
                let raw = <i32 as $crate::FromScript>::from_script(value)?;
                <$ty as ::core::convert::TryFrom<i32>>::try_from(raw).map_err(|_| {
                    $crate::BindError::InvalidEnumValue {
                        value: i64::from(raw),
                        type_name: ::core::any::type_name::<$ty>(),
                    }
                })
            }
        }
    };
}

/// Declare conversions for a string-like wrapper type.
///
/// Crosses the boundary as an engine string. Requires `Display` for the
/// outbound direction and `From<String>` for the inbound one.
#[macro_export]
macro_rules! script_string {
    ($ty:ty) => {
        impl $crate::IntoScript for $ty {
            fn into_script(self) -> $crate::BindResult<$crate::ScriptValue> {
                Ok($crate::ScriptValue::String(self.to_string()))
            }
        }

        impl $crate::FromScript for $ty {
            fn from_script(value: &$crate::ScriptValue) -> $crate::BindResult<Self> {
                let raw = <String as $crate::FromScript>::from_script(value)?;
                Ok(<$ty as ::core::convert::From<String>>::from(raw))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_round_trip() {
        let value = 42i32.into_script().unwrap();
        assert!(matches!(value, ScriptValue::Int(42)));
        assert_eq!(i32::from_script(&value).unwrap(), 42);
    }

    #[test]
    fn narrowing_is_silent() {
        // Unsigned to signed and wide to narrow both pass through `as`.
        let value = ScriptValue::Int(300);
        assert_eq!(u8::from_script(&value).unwrap(), 44);
        assert_eq!(i8::from_script(&value).unwrap(), 44);

        let value = u64::MAX.into_script().unwrap();
        assert_eq!(i64::from_script(&value).unwrap(), -1);
    }

    #[test]
    fn numeric_cross_coercion() {
        assert_eq!(i32::from_script(&ScriptValue::Float(3.9)).unwrap(), 3);
        assert_eq!(f64::from_script(&ScriptValue::Int(7)).unwrap(), 7.0);
        assert_eq!(f32::from_script(&ScriptValue::Float(2.5)).unwrap(), 2.5f32);
    }

    #[test]
    fn non_numeric_mismatch_errors() {
        let err = i32::from_script(&ScriptValue::Bool(true)).unwrap_err();
        assert_eq!(
            err,
            BindError::TypeMismatch {
                expected: "int",
                actual: "bool"
            }
        );
        assert!(bool::from_script(&ScriptValue::Int(1)).is_err());
        assert!(String::from_script(&ScriptValue::Int(1)).is_err());
    }

    #[test]
    fn string_round_trip() {
        let value = "hello".into_script().unwrap();
        assert_eq!(String::from_script(&value).unwrap(), "hello");
    }

    #[test]
    fn unit_is_undefined() {
        let value = ().into_script().unwrap();
        assert!(value.is_undefined());
        <()>::from_script(&value).unwrap();
        assert!(<()>::from_script(&ScriptValue::Int(0)).is_err());
    }

    #[test]
    fn reference_delegates_to_referent() {
        let value = (&5i32).into_script().unwrap();
        assert!(matches!(value, ScriptValue::Int(5)));
    }

    #[test]
    fn accessor_from_plain_object_fails() {
        let value = ScriptValue::Object(crate::ScriptObject::new());
        assert!(LiveAccessor::from_script(&value).is_err());
        assert!(LiveAccessor::from_script(&ScriptValue::Int(1)).is_err());
    }

    mod enum_macro {
        use super::*;
        use num_enum::{IntoPrimitive, TryFromPrimitive};

        #[derive(Debug, Clone, Copy, PartialEq, IntoPrimitive, TryFromPrimitive)]
        #[repr(i32)]
        enum Facing {
            North = 0,
            South = 1,
        }

        crate::script_enum!(Facing);

        #[test]
        fn enum_round_trip() {
            let value = Facing::South.into_script().unwrap();
            assert!(matches!(value, ScriptValue::Int(1)));
            assert_eq!(Facing::from_script(&value).unwrap(), Facing::South);
        }

        #[test]
        fn out_of_range_discriminant_errors() {
            let err = Facing::from_script(&ScriptValue::Int(9)).unwrap_err();
            assert!(matches!(err, BindError::InvalidEnumValue { value: 9, .. }));
        }
    }

    mod string_macro {
        use super::*;
        use std::fmt;

        #[derive(Debug, PartialEq)]
        struct AssetPath(String);

        impl fmt::Display for AssetPath {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for AssetPath {
            fn from(raw: String) -> Self {
                AssetPath(raw)
            }
        }

        crate::script_string!(AssetPath);

        #[test]
        fn wrapper_round_trip() {
            let value = AssetPath("data/map.json".to_owned()).into_script().unwrap();
            assert!(matches!(value, ScriptValue::String(ref s) if s == "data/map.json"));
            assert_eq!(
                AssetPath::from_script(&value).unwrap(),
                AssetPath("data/map.json".to_owned())
            );
        }
    }
}

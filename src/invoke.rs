//! Arity-specialized invocation trampolines.
//!
//! [`Method`] and [`Constructor`] adapt statically-typed native callables to
//! the engine's untyped argument lists. One impl exists per argument count,
//! 0 through 5 (extend the macro grid at the bottom for more). Each
//! positional argument is converted left to right through [`FromScript`];
//! non-void results go back out through [`IntoScript`] (`()` maps to
//! `Undefined`).
//!
//! Arity is the only dispatch key. Two callables of the same arity with
//! incompatible argument types cannot be told apart at bind time; the wrong
//! one is silently chosen and fails (or worse, coerces) at conversion time.
//! That is the binding author's contract.
//!
//! A call supplying fewer arguments than the bound arity reports
//! [`BindError::MissingArgument`] for the first absent slot.

use crate::convert::{FromScript, IntoScript};
use crate::error::{BindError, BindResult};
use crate::script_value::ScriptValue;

/// Marker for methods taking `&mut T`.
pub struct ByMut;

/// Marker for methods taking `&T` (the const-method family).
pub struct ByRef;

/// A native method callable on a bound class instance.
///
/// Implemented for `Fn(&mut T, A0..An) -> R` and `Fn(&T, A0..An) -> R`,
/// n ≤ 5. `Marker` disambiguates the receiver mode and is inferred.
pub trait Method<T, Marker> {
    fn invoke(&self, receiver: &mut T, args: &[ScriptValue]) -> BindResult<ScriptValue>;
}

/// A native constructor producing a new instance of `T`.
///
/// Implemented for `Fn(A0..An) -> T`, n ≤ 5. [`Constructor::ARITY`] is the
/// registry key the exposed constructor dispatches on.
pub trait Constructor<T, Args> {
    const ARITY: usize;

    fn construct(&self, args: &[ScriptValue]) -> BindResult<T>;
}

fn arg_at(args: &[ScriptValue], index: usize) -> BindResult<&ScriptValue> {
    args.get(index).ok_or(BindError::MissingArgument {
        index,
        count: args.len(),
    })
}

macro_rules! impl_invokers {
    ($count:expr $(, $arg:ident : $idx:tt)*) => {
        impl<T, F, R $(, $arg)*> Method<T, (ByMut, R, ($($arg,)*))> for F
        where
            F: Fn(&mut T $(, $arg)*) -> R,
            R: IntoScript,
            $($arg: FromScript,)*
        {
            fn invoke(&self, receiver: &mut T, _args: &[ScriptValue]) -> BindResult<ScriptValue> {
                let result = (self)(
                    receiver
                    $(, <$arg as FromScript>::from_script(arg_at(_args, $idx)?)?)*
                );
                result.into_script()
            }
        }

        impl<T, F, R $(, $arg)*> Method<T, (ByRef, R, ($($arg,)*))> for F
        where
            F: Fn(&T $(, $arg)*) -> R,
            R: IntoScript,
            $($arg: FromScript,)*
        {
            fn invoke(&self, receiver: &mut T, _args: &[ScriptValue]) -> BindResult<ScriptValue> {
                let result = (self)(
                    &*receiver
                    $(, <$arg as FromScript>::from_script(arg_at(_args, $idx)?)?)*
                );
                result.into_script()
            }
        }

        impl<T, F $(, $arg)*> Constructor<T, ($($arg,)*)> for F
        where
            F: Fn($($arg),*) -> T,
            $($arg: FromScript,)*
        {
            const ARITY: usize = $count;

            fn construct(&self, _args: &[ScriptValue]) -> BindResult<T> {
                Ok((self)(
                    $(<$arg as FromScript>::from_script(arg_at(_args, $idx)?)?),*
                ))
            }
        }
    };
}

impl_invokers!(0);
impl_invokers!(1, A0: 0);
impl_invokers!(2, A0: 0, A1: 1);
impl_invokers!(3, A0: 0, A1: 1, A2: 2);
impl_invokers!(4, A0: 0, A1: 1, A2: 2, A3: 3);
impl_invokers!(5, A0: 0, A1: 1, A2: 2, A3: 3, A4: 4);

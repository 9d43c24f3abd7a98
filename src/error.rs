//! Error types for the marshalling and dispatch core.
//!
//! Only hard failures are represented here. The soft signals the embedding
//! engine expects ("property not recognized" on a proxy read, "mutation
//! rejected" on a proxy write) are expressed as `Ok(None)` and `Ok(false)`
//! respectively, never as a `BindError`.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type BindResult<T> = Result<T, BindError>;

/// Errors produced by value conversion, dispatch, and exposure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindError {
    /// A script value had the wrong shape for the requested native type.
    #[error("expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// A bound callable was invoked with fewer arguments than its arity.
    #[error("missing argument {index} (call supplied {count})")]
    MissingArgument { index: usize, count: usize },

    /// The native instance behind a live accessor was released by its owner.
    #[error("accessor for {type_name} has expired")]
    ExpiredAccessor { type_name: &'static str },

    /// A live accessor was resolved against the wrong native type.
    #[error("accessor holds {actual}, not {expected}")]
    AccessorTypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// An aggregate or class conversion was requested for a type that has
    /// no binding declaration in this thread's registry.
    #[error("type {type_name} has no binding declaration")]
    UnboundType { type_name: &'static str },

    /// An exposed constructor was called with an undeclared argument count.
    #[error("no constructor with {arity} argument(s) declared for {type_name}")]
    NoConstructor { type_name: String, arity: usize },

    /// An integer read from the engine does not map back onto the enum.
    #[error("{value} is not a valid {type_name} value")]
    InvalidEnumValue { value: i64, type_name: &'static str },
}

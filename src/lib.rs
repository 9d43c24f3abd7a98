//! Expose native Rust types to an embedded scripting runtime.
//!
//! `scriptbind` is the binding layer between host-side Rust code and a
//! script engine's object model: declare a type's properties, methods, and
//! constructors once, and the framework materializes engine-side values,
//! converts arguments and results, and routes script calls back into native
//! code.
//!
//! Two binding flavors cover the two ownership semantics at the boundary:
//!
//! - **Aggregates** ([`bind_aggregate`]) cross by copy. Each conversion
//!   produces an independent plain object; scripts can read and write their
//!   copy freely and hand it back, field by field.
//! - **Classes** ([`bind_class`]) cross by reference. The engine sees a
//!   proxy whose property reads and method calls operate on the live native
//!   instance. Host-owned instances are lent out through an [`Anchor`];
//!   accesses after the anchor drops fail with a checked error instead of
//!   touching freed memory.
//!
//! Declarations may run before any scripting context exists. Installations
//! queue and are flushed, in order, when [`on_context_created`] adopts a
//! [`ScriptHost`]. The crate ships one host, [`Module`], exposing a plain
//! namespace object; engine integrations implement [`ScriptHost`] over the
//! real global scope.
//!
//! ```
//! use scriptbind::{bind_aggregate, script_aggregate};
//!
//! #[derive(Default, Clone)]
//! struct Point {
//!     x: f32,
//!     y: f32,
//! }
//!
//! script_aggregate!(Point);
//!
//! bind_aggregate::<Point>("Point")
//!     .constructor(|| Point::default())
//!     .property("x", |p: &Point| p.x, |p: &mut Point, v: f32| p.x = v)
//!     .property("y", |p: &Point| p.y, |p: &mut Point, v: f32| p.y = v);
//! ```
//!
//! Everything is single-threaded: registries, contexts, and values live on
//! the declaring thread, matching the embedded runtimes this targets.

pub mod accessor;
pub mod binding;
pub mod context;
pub mod convert;
pub mod error;
pub mod invoke;
pub mod script_value;

pub use accessor::{Anchor, LiveAccessor};
pub use binding::{AggregateBuilder, ClassBuilder, bind_aggregate, bind_class};
pub use context::{
    Module, ScriptHost, add_global_instance, add_global_object, has_context, on_context_created,
    on_context_released,
};
pub use convert::{FromScript, IntoScript};
pub use error::{BindError, BindResult};
pub use invoke::{Constructor, Method};
pub use script_value::{
    PropertyAttributes, PropertyInterceptor, ScriptFunction, ScriptObject, ScriptValue,
};

// For the derives `script_enum!` asks callers to apply.
pub use num_enum;

/// Everything a typical integration needs in scope.
pub mod prelude {
    pub use crate::accessor::{Anchor, LiveAccessor};
    pub use crate::binding::{bind_aggregate, bind_class};
    pub use crate::context::{
        Module, ScriptHost, add_global_instance, add_global_object, has_context,
        on_context_created, on_context_released,
    };
    pub use crate::convert::{FromScript, IntoScript};
    pub use crate::error::{BindError, BindResult};
    pub use crate::script_value::{PropertyAttributes, ScriptObject, ScriptValue};
    pub use crate::{script_aggregate, script_class, script_enum, script_string};
}

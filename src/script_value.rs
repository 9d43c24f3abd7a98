//! Engine-side value model.
//!
//! [`ScriptValue`] is the runtime's own representation of a value: primitives,
//! strings, objects, and callables. [`ScriptObject`] has reference semantics:
//! cloning a value clones a handle to the same underlying object, and
//! mutations are visible through every handle.
//!
//! Objects carry three things beyond plain named properties:
//! - per-property [`PropertyAttributes`] controlling script-side writes,
//! - an optional [`PropertyInterceptor`] consulted before the property map
//!   (this is where live-object proxies hook in),
//! - an optional user-data slot holding a [`LiveAccessor`], which is how a
//!   class-bound value is recovered back into a native reference.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;
use rustc_hash::FxHashMap;

use crate::accessor::LiveAccessor;
use crate::error::BindResult;

bitflags! {
    /// Attributes applied when a property is installed on an object.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PropertyAttributes: u8 {
        /// Script-side assignment is rejected.
        const READ_ONLY = 1 << 0;
        /// Hidden from [`ScriptObject::property_names`].
        const DONT_ENUM = 1 << 1;
        /// Reserved for engine integrations that support deletion.
        const DONT_DELETE = 1 << 2;
    }
}

/// Hook consulted before an object's own property map.
///
/// A `get` returning `Ok(None)` means "not handled"; the lookup falls through
/// to the plain properties. A `set` returning `Ok(false)` means the write was
/// rejected and must have no effect. Both are soft signals, not errors.
pub trait PropertyInterceptor {
    fn get(&self, name: &str) -> BindResult<Option<ScriptValue>>;
    fn set(&self, name: &str, value: &ScriptValue) -> BindResult<bool>;
}

struct Property {
    value: ScriptValue,
    attributes: PropertyAttributes,
}

#[derive(Default)]
struct ObjectData {
    properties: FxHashMap<String, Property>,
    interceptor: Option<Rc<dyn PropertyInterceptor>>,
    user_data: Option<LiveAccessor>,
}

/// An object in the scripting runtime's value model.
///
/// Reference-counted handle; `clone` aliases the same object.
#[derive(Clone, Default)]
pub struct ScriptObject {
    inner: Rc<RefCell<ObjectData>>,
}

impl ScriptObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a property from the native side, bypassing the interceptor
    /// and any attribute checks.
    pub fn define(&self, name: &str, value: ScriptValue, attributes: PropertyAttributes) {
        self.inner
            .borrow_mut()
            .properties
            .insert(name.to_owned(), Property { value, attributes });
    }

    /// Read a property the way the engine would: interceptor first, plain
    /// properties second. `Ok(None)` is the soft "unknown property" signal.
    pub fn get(&self, name: &str) -> BindResult<Option<ScriptValue>> {
        // Clone the hook out so the interceptor may freely touch this object.
        let interceptor = self.inner.borrow().interceptor.clone();
        if let Some(interceptor) = interceptor
            && let Some(value) = interceptor.get(name)?
        {
            return Ok(Some(value));
        }
        Ok(self
            .inner
            .borrow()
            .properties
            .get(name)
            .map(|property| property.value.clone()))
    }

    /// Write a property the way the engine would. Returns `Ok(false)` when
    /// the write was rejected (intercepted object, or read-only property);
    /// a rejected write leaves the object untouched.
    pub fn set(&self, name: &str, value: ScriptValue) -> BindResult<bool> {
        let interceptor = self.inner.borrow().interceptor.clone();
        if let Some(interceptor) = interceptor {
            return interceptor.set(name, &value);
        }
        let mut data = self.inner.borrow_mut();
        match data.properties.get_mut(name) {
            Some(existing) => {
                if existing.attributes.contains(PropertyAttributes::READ_ONLY) {
                    return Ok(false);
                }
                existing.value = value;
            }
            None => {
                data.properties.insert(
                    name.to_owned(),
                    Property {
                        value,
                        attributes: PropertyAttributes::empty(),
                    },
                );
            }
        }
        Ok(true)
    }

    pub fn has(&self, name: &str) -> bool {
        self.inner.borrow().properties.contains_key(name)
    }

    /// Enumerable property names (skips `DONT_ENUM` entries).
    pub fn property_names(&self) -> Vec<String> {
        self.inner
            .borrow()
            .properties
            .iter()
            .filter(|(_, property)| !property.attributes.contains(PropertyAttributes::DONT_ENUM))
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn set_interceptor(&self, interceptor: Rc<dyn PropertyInterceptor>) {
        self.inner.borrow_mut().interceptor = Some(interceptor);
    }

    pub fn set_user_data(&self, accessor: LiveAccessor) {
        self.inner.borrow_mut().user_data = Some(accessor);
    }

    /// The accessor attached when this object was produced by a class
    /// binding, if any.
    pub fn user_data(&self) -> Option<LiveAccessor> {
        self.inner.borrow().user_data.clone()
    }

    /// Identity comparison: do two handles alias the same object?
    pub fn same_object(&self, other: &ScriptObject) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ScriptObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.inner.borrow();
        f.debug_struct("ScriptObject")
            .field("properties", &data.properties.len())
            .field("intercepted", &data.interceptor.is_some())
            .finish()
    }
}

type FunctionHandler = dyn Fn(&[ScriptValue]) -> BindResult<ScriptValue>;

/// A native callable exposed as an engine function value.
#[derive(Clone)]
pub struct ScriptFunction {
    name: Rc<str>,
    handler: Rc<FunctionHandler>,
}

impl ScriptFunction {
    pub fn new(
        name: &str,
        handler: impl Fn(&[ScriptValue]) -> BindResult<ScriptValue> + 'static,
    ) -> Self {
        Self {
            name: Rc::from(name),
            handler: Rc::new(handler),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: &[ScriptValue]) -> BindResult<ScriptValue> {
        (self.handler)(args)
    }
}

impl fmt::Debug for ScriptFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptFunction")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A value in the embedded runtime's object model.
#[derive(Debug, Clone)]
pub enum ScriptValue {
    Undefined,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Object(ScriptObject),
    Function(ScriptFunction),
}

impl ScriptValue {
    /// Human-readable name of this value's kind, for error reporting.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ScriptValue::Undefined => "undefined",
            ScriptValue::Null => "null",
            ScriptValue::Bool(_) => "bool",
            ScriptValue::Int(_) => "int",
            ScriptValue::Float(_) => "float",
            ScriptValue::String(_) => "string",
            ScriptValue::Object(_) => "object",
            ScriptValue::Function(_) => "function",
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, ScriptValue::Undefined)
    }

    pub fn as_object(&self) -> Option<&ScriptObject> {
        match self {
            ScriptValue::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&ScriptFunction> {
        match self {
            ScriptValue::Function(function) => Some(function),
            _ => None,
        }
    }
}

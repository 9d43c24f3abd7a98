//! Per-type binding registries and the fluent declaration surface.
//!
//! Two flavors of binding exist, mirroring two ownership semantics at the
//! boundary:
//!
//! - [`bind_aggregate`] declares a plain-value type: instances are copied
//!   field by field on every crossing, the script side may mutate its copy,
//!   and no identity is preserved.
//! - [`bind_class`] declares an identity type: instances cross by reference
//!   behind a [`LiveAccessor`], property reads go through a proxy, writes are
//!   rejected, and mutation happens through declared methods.
//!
//! Declarations run single-threaded; tables live in a thread-local registry
//! keyed by `TypeId` and are never removed. Redeclaring a property, method,
//! or same-arity constructor silently overwrites the previous entry.
//!
//! A declaration finishes when its builder drops, at the end of the
//! declaration statement. If any constructors were declared, the drop emits
//! exactly one installation of the constructor function under the declared
//! name, deferred until a scripting context exists. Finishing at drop time
//! (not at `constructor()` time) guarantees every chained property and
//! method is already in the table when the exposed constructor closure
//! captures it.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::accessor::LiveAccessor;
use crate::context;
use crate::convert::{FromScript, IntoScript};
use crate::error::{BindError, BindResult};
use crate::invoke::{Constructor, Method};
use crate::script_value::{
    PropertyAttributes, PropertyInterceptor, ScriptFunction, ScriptObject, ScriptValue,
};

type GetterFn<T> = Rc<dyn Fn(&T) -> BindResult<ScriptValue>>;
type SetterFn<T> = Rc<dyn Fn(&mut T, &ScriptValue) -> BindResult<()>>;
type MethodFn<T> = Rc<dyn Fn(&mut T, &[ScriptValue]) -> BindResult<ScriptValue>>;
type CtorFn<T> = Rc<dyn Fn(&[ScriptValue]) -> BindResult<T>>;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum BindingKind {
    Aggregate,
    Class,
}

/// Binding tables for one native type.
struct TypeBinding<T> {
    name: Rc<str>,
    kind: BindingKind,
    getters: FxHashMap<String, GetterFn<T>>,
    setters: FxHashMap<String, SetterFn<T>>,
    methods: FxHashMap<String, MethodFn<T>>,
    constructors: FxHashMap<usize, CtorFn<T>>,
}

impl<T> TypeBinding<T> {
    fn new(name: &str, kind: BindingKind) -> Self {
        Self {
            name: Rc::from(name),
            kind,
            getters: FxHashMap::default(),
            setters: FxHashMap::default(),
            methods: FxHashMap::default(),
            constructors: FxHashMap::default(),
        }
    }
}

type SharedBinding<T> = Rc<RefCell<TypeBinding<T>>>;

thread_local! {
    /// Declared bindings for this thread, keyed by native `TypeId`.
    /// Values are `SharedBinding<T>` behind `Any`.
    static BINDINGS: RefCell<FxHashMap<TypeId, Box<dyn Any>>> =
        RefCell::new(FxHashMap::default());
}

fn binding_of<T: 'static>() -> Option<SharedBinding<T>> {
    BINDINGS.with(|bindings| {
        bindings
            .borrow()
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.downcast_ref::<SharedBinding<T>>())
            .cloned()
    })
}

fn binding_entry<T: 'static>(name: &str, kind: BindingKind) -> SharedBinding<T> {
    if let Some(existing) = binding_of::<T>() {
        // Redeclaration: keep the tables, adopt the latest name and flavor.
        let mut binding = existing.borrow_mut();
        binding.name = Rc::from(name);
        binding.kind = kind;
        drop(binding);
        return existing;
    }
    let binding: SharedBinding<T> = Rc::new(RefCell::new(TypeBinding::new(name, kind)));
    BINDINGS.with(|bindings| {
        bindings
            .borrow_mut()
            .insert(TypeId::of::<T>(), Box::new(Rc::clone(&binding)));
    });
    binding
}

fn unbound<T>() -> BindError {
    BindError::UnboundType {
        type_name: std::any::type_name::<T>(),
    }
}

// ============================================================================
// Value materialization
// ============================================================================

/// Proxy attached to class-bound objects: reads consult the owning type's
/// getter table through the live accessor; writes are always rejected.
struct ClassProxy<T: 'static> {
    binding: SharedBinding<T>,
    accessor: LiveAccessor,
}

impl<T: 'static> PropertyInterceptor for ClassProxy<T> {
    fn get(&self, name: &str) -> BindResult<Option<ScriptValue>> {
        let getter = self.binding.borrow().getters.get(name).cloned();
        match getter {
            Some(getter) => {
                let value = self.accessor.with(|instance: &T| getter(instance))??;
                Ok(Some(value))
            }
            // Not recognized: soft signal, the engine sees an absent property.
            None => Ok(None),
        }
    }

    fn set(&self, _name: &str, _value: &ScriptValue) -> BindResult<bool> {
        // Mutation goes through methods only.
        Ok(false)
    }
}

/// Build the engine-side object for a class instance: interceptor for
/// property reads, accessor in the user-data slot, one function-valued
/// property per declared method.
fn class_object<T: 'static>(binding: &SharedBinding<T>, accessor: LiveAccessor) -> ScriptValue {
    let object = ScriptObject::new();
    object.set_user_data(accessor.clone());
    object.set_interceptor(Rc::new(ClassProxy {
        binding: Rc::clone(binding),
        accessor: accessor.clone(),
    }));

    let methods: Vec<(String, MethodFn<T>)> = binding
        .borrow()
        .methods
        .iter()
        .map(|(name, method)| (name.clone(), Rc::clone(method)))
        .collect();
    for (name, method) in methods {
        let accessor = accessor.clone();
        let function = ScriptFunction::new(&name, move |args| {
            accessor.with_mut(|instance: &mut T| method(instance, args))?
        });
        object.define(
            &name,
            ScriptValue::Function(function),
            PropertyAttributes::READ_ONLY | PropertyAttributes::DONT_DELETE,
        );
    }

    ScriptValue::Object(object)
}

fn aggregate_object<T: 'static>(binding: &SharedBinding<T>, value: &T) -> BindResult<ScriptValue> {
    let object = ScriptObject::new();
    let getters: Vec<(String, GetterFn<T>)> = binding
        .borrow()
        .getters
        .iter()
        .map(|(name, getter)| (name.clone(), Rc::clone(getter)))
        .collect();
    for (name, getter) in getters {
        object.define(&name, getter(value)?, PropertyAttributes::empty());
    }
    Ok(ScriptValue::Object(object))
}

/// Copy an aggregate value into a fresh plain engine object.
///
/// Backs the `IntoScript` impl generated by [`script_aggregate!`].
///
/// [`script_aggregate!`]: crate::script_aggregate
pub fn aggregate_into_script<T: 'static>(value: &T) -> BindResult<ScriptValue> {
    let binding = binding_of::<T>().ok_or_else(unbound::<T>)?;
    aggregate_object(&binding, value)
}

/// Rebuild an aggregate value from an engine object: default-construct,
/// then apply every registered setter with the same-named property.
/// Properties absent from the object leave the default field value.
///
/// Backs the `FromScript` impl generated by [`script_aggregate!`].
///
/// [`script_aggregate!`]: crate::script_aggregate
pub fn aggregate_from_script<T: Default + 'static>(value: &ScriptValue) -> BindResult<T> {
    let binding = binding_of::<T>().ok_or_else(unbound::<T>)?;
    let object = match value {
        ScriptValue::Object(object) => object,
        other => {
            return Err(BindError::TypeMismatch {
                expected: "object",
                actual: other.kind_name(),
            });
        }
    };

    let mut result = T::default();
    let setters: Vec<(String, SetterFn<T>)> = binding
        .borrow()
        .setters
        .iter()
        .map(|(name, setter)| (name.clone(), Rc::clone(setter)))
        .collect();
    for (field, setter) in setters {
        if let Some(field_value) = object.get(&field)? {
            setter(&mut result, &field_value)?;
        }
    }
    Ok(result)
}

/// Move a class instance into the engine: the instance is leaked and the
/// resulting object proxies it by reference.
///
/// Backs the `IntoScript` impl generated by [`script_class!`].
///
/// [`script_class!`]: crate::script_class
pub fn class_into_script<T: 'static>(value: T) -> BindResult<ScriptValue> {
    let binding = binding_of::<T>().ok_or_else(unbound::<T>)?;
    Ok(class_object(&binding, LiveAccessor::owning(value)))
}

/// Expose an already-anchored instance by reference. Each call attaches an
/// independent accessor to the same shared state.
pub(crate) fn class_instance_value<T: 'static>(accessor: LiveAccessor) -> BindResult<ScriptValue> {
    let binding = binding_of::<T>().ok_or_else(unbound::<T>)?;
    Ok(class_object(&binding, accessor))
}

// ============================================================================
// Declaration finish (builder drop)
// ============================================================================

/// The exposed constructor: dispatches on the call's argument count, builds
/// the instance, and converts it according to the binding flavor.
fn constructor_function<T: 'static>(binding: &SharedBinding<T>) -> ScriptFunction {
    let name = Rc::clone(&binding.borrow().name);
    let binding = Rc::clone(binding);
    ScriptFunction::new(&name, move |args| {
        let (ctor, kind) = {
            let tables = binding.borrow();
            (tables.constructors.get(&args.len()).cloned(), tables.kind)
        };
        let ctor = ctor.ok_or_else(|| BindError::NoConstructor {
            type_name: binding.borrow().name.to_string(),
            arity: args.len(),
        })?;
        let instance = ctor(args)?;
        match kind {
            BindingKind::Class => Ok(class_object(&binding, LiveAccessor::owning(instance))),
            BindingKind::Aggregate => aggregate_object(&binding, &instance),
        }
    })
}

fn finish_declaration<T: 'static>(binding: &SharedBinding<T>) {
    if binding.borrow().constructors.is_empty() {
        return;
    }
    let name = Rc::clone(&binding.borrow().name);
    let value = ScriptValue::Function(constructor_function(binding));
    // Installation itself cannot fail; the closure only hands the function
    // to the namespace.
    let _ = context::install_or_defer(move |host| {
        host.install(&name, value);
        Ok(())
    });
}

// ============================================================================
// Builders
// ============================================================================

/// Start a class (identity type) declaration. See [module docs](self).
pub fn bind_class<T: 'static>(name: &str) -> ClassBuilder<T> {
    ClassBuilder {
        binding: binding_entry::<T>(name, BindingKind::Class),
    }
}

/// Start an aggregate (plain value type) declaration. See [module docs](self).
pub fn bind_aggregate<T: 'static>(name: &str) -> AggregateBuilder<T> {
    AggregateBuilder {
        binding: binding_entry::<T>(name, BindingKind::Aggregate),
    }
}

/// Fluent declaration of an identity-bearing type.
pub struct ClassBuilder<T: 'static> {
    binding: SharedBinding<T>,
}

impl<T: 'static> ClassBuilder<T> {
    /// Register a constructor under its argument count.
    pub fn constructor<A, F>(self, f: F) -> Self
    where
        F: Constructor<T, A> + 'static,
    {
        let arity = F::ARITY;
        let ctor: CtorFn<T> = Rc::new(move |args| f.construct(args));
        self.binding.borrow_mut().constructors.insert(arity, ctor);
        self
    }

    /// Register a read-only property.
    pub fn property<V, G>(self, name: &str, getter: G) -> Self
    where
        V: IntoScript,
        G: Fn(&T) -> V + 'static,
    {
        let getter: GetterFn<T> = Rc::new(move |instance| getter(instance).into_script());
        self.binding
            .borrow_mut()
            .getters
            .insert(name.to_owned(), getter);
        self
    }

    /// Register a method. Accepts `Fn(&mut T, ..)` and `Fn(&T, ..)`
    /// callables of up to five script arguments.
    pub fn method<M, F>(self, name: &str, f: F) -> Self
    where
        F: Method<T, M> + 'static,
    {
        let method: MethodFn<T> = Rc::new(move |instance, args| f.invoke(instance, args));
        self.binding
            .borrow_mut()
            .methods
            .insert(name.to_owned(), method);
        self
    }
}

impl<T: 'static> Drop for ClassBuilder<T> {
    fn drop(&mut self) {
        finish_declaration(&self.binding);
    }
}

/// Fluent declaration of a plain value type.
pub struct AggregateBuilder<T: 'static> {
    binding: SharedBinding<T>,
}

impl<T: 'static> AggregateBuilder<T> {
    /// Register a constructor under its argument count.
    pub fn constructor<A, F>(self, f: F) -> Self
    where
        F: Constructor<T, A> + 'static,
    {
        let arity = F::ARITY;
        let ctor: CtorFn<T> = Rc::new(move |args| f.construct(args));
        self.binding.borrow_mut().constructors.insert(arity, ctor);
        self
    }

    /// Register a readable and writable field.
    pub fn property<V, G, S>(self, name: &str, getter: G, setter: S) -> Self
    where
        V: IntoScript + FromScript,
        G: Fn(&T) -> V + 'static,
        S: Fn(&mut T, V) + 'static,
    {
        let get: GetterFn<T> = Rc::new(move |instance| getter(instance).into_script());
        let set: SetterFn<T> = Rc::new(move |instance, value| {
            setter(instance, V::from_script(value)?);
            Ok(())
        });
        let mut tables = self.binding.borrow_mut();
        tables.getters.insert(name.to_owned(), get);
        tables.setters.insert(name.to_owned(), set);
        drop(tables);
        self
    }
}

impl<T: 'static> Drop for AggregateBuilder<T> {
    fn drop(&mut self) {
        finish_declaration(&self.binding);
    }
}

/// Implement [`IntoScript`]/[`FromScript`] for an aggregate-bound type.
///
/// The type needs `Default` (inbound conversion default-constructs before
/// applying setters) and a [`bind_aggregate`] declaration to have run on
/// the current thread.
#[macro_export]
macro_rules! script_aggregate {
    ($ty:ty) => {
        impl $crate::IntoScript for $ty {
            fn into_script(self) -> $crate::BindResult<$crate::ScriptValue> {
                $crate::binding::aggregate_into_script(&self)
            }
        }

        impl $crate::FromScript for $ty {
            fn from_script(value: &$crate::ScriptValue) -> $crate::BindResult<Self> {
                $crate::binding::aggregate_from_script(value)
            }
        }
    };
}

/// Implement [`IntoScript`] for a class-bound type.
///
/// Outbound conversion leaks the instance and exposes it by reference. The
/// inbound direction for class types is `FromScript for LiveAccessor`,
/// which recovers the attached accessor without copying.
#[macro_export]
macro_rules! script_class {
    ($ty:ty) => {
        impl $crate::IntoScript for $ty {
            fn into_script(self) -> $crate::BindResult<$crate::ScriptValue> {
                $crate::binding::class_into_script(self)
            }
        }
    };
}

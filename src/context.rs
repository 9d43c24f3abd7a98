//! Context lifecycle and deferred installation.
//!
//! Bindings are declared at program start, typically before any scripting
//! context exists. Every installation request (constructor functions from
//! finished declarations, globals from [`add_global_object`] and
//! [`add_global_instance`]) therefore goes through [`install_or_defer`]:
//! with a live context it runs immediately, without one it queues.
//!
//! [`on_context_created`] drains the queue in declaration order onto the
//! new context's host, then adopts the host. A queued installation that
//! fails stops the flush; the remaining queue entries are dropped and the
//! context is not adopted. [`on_context_released`] drops the host; later
//! installations queue again for the next context.
//!
//! All state is thread-local, like the binding registry.

use std::cell::RefCell;

use crate::accessor::Anchor;
use crate::binding;
use crate::convert::IntoScript;
use crate::error::BindResult;
use crate::script_value::{PropertyAttributes, ScriptObject, ScriptValue};

/// The seam between the binding core and a concrete script engine.
///
/// The core only ever needs one capability from an engine: placing a named
/// value into the context's global namespace. Everything else (proxying,
/// dispatch, conversion) happens on engine-neutral [`ScriptValue`]s.
pub trait ScriptHost {
    fn install(&mut self, name: &str, value: ScriptValue);
}

/// The built-in object-model host: a plain namespace object that scripts
/// (or tests) can read installed values back out of.
pub struct Module {
    namespace: ScriptObject,
}

impl Module {
    pub fn new() -> Self {
        Self {
            namespace: ScriptObject::new(),
        }
    }

    /// The namespace object values are installed into. Clones share the
    /// underlying object.
    pub fn namespace(&self) -> ScriptObject {
        self.namespace.clone()
    }
}

impl Default for Module {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptHost for Module {
    fn install(&mut self, name: &str, value: ScriptValue) {
        self.namespace
            .define(name, value, PropertyAttributes::empty());
    }
}

type PendingInstall = Box<dyn FnOnce(&mut dyn ScriptHost) -> BindResult<()>>;

thread_local! {
    static PENDING: RefCell<Vec<PendingInstall>> = const { RefCell::new(Vec::new()) };
    static CONTEXT: RefCell<Option<Box<dyn ScriptHost>>> = const { RefCell::new(None) };
}

/// Whether a scripting context is currently live on this thread.
pub fn has_context() -> bool {
    CONTEXT.with(|context| context.borrow().is_some())
}

pub(crate) fn install_or_defer(
    f: impl FnOnce(&mut dyn ScriptHost) -> BindResult<()> + 'static,
) -> BindResult<()> {
    // Move the host out while running so an installation that re-enters
    // (a conversion touching the registry) never sees a held borrow.
    let host = CONTEXT.with(|context| context.borrow_mut().take());
    match host {
        Some(mut host) => {
            let result = f(host.as_mut());
            CONTEXT.with(|context| *context.borrow_mut() = Some(host));
            result
        }
        None => {
            PENDING.with(|pending| pending.borrow_mut().push(Box::new(f)));
            Ok(())
        }
    }
}

/// Adopt a freshly created context: flush every deferred installation onto
/// `host` in the order it was queued, then make `host` the live context.
///
/// On a flush error the queue's remaining entries are dropped, the host is
/// not adopted, and the error is returned.
pub fn on_context_created(mut host: Box<dyn ScriptHost>) -> BindResult<()> {
    let queued = PENDING.with(|pending| std::mem::take(&mut *pending.borrow_mut()));
    for install in queued {
        install(host.as_mut())?;
    }
    CONTEXT.with(|context| *context.borrow_mut() = Some(host));
    Ok(())
}

/// Drop the live context. Subsequent installations queue for the next one.
pub fn on_context_released() {
    CONTEXT.with(|context| *context.borrow_mut() = None);
}

/// Expose a value under `name` in the global namespace.
///
/// With a live context the value converts and installs immediately; without
/// one, conversion itself is deferred until the next context is created, so
/// the type's binding only has to exist by flush time.
pub fn add_global_object<T: IntoScript + 'static>(value: T, name: &str) -> BindResult<()> {
    let name = name.to_owned();
    install_or_defer(move |host| {
        host.install(&name, value.into_script()?);
        Ok(())
    })
}

/// Expose an anchored class instance under `name`, by reference.
///
/// The installed object proxies the anchored instance and expires with the
/// anchor. The instance's type must be class-bound by the time the
/// installation runs.
pub fn add_global_instance<T: 'static>(anchor: &Anchor<'_, T>, name: &str) -> BindResult<()> {
    let accessor = anchor.accessor();
    let name = name.to_owned();
    install_or_defer(move |host| {
        host.install(&name, binding::class_instance_value::<T>(accessor)?);
        Ok(())
    })
}

//! Live accessors: non-owning handles to native instances.
//!
//! A class-bound value crossing into the engine does not copy the native
//! instance; it carries a [`LiveAccessor`] pointing back at it. The accessor
//! never owns the instance. Ownership stays with whoever created it:
//!
//! - [`Anchor`] borrows a host-owned instance for a scope and clears every
//!   derived accessor when it drops, so a late access is a checked
//!   [`BindError::ExpiredAccessor`] instead of a dangling read.
//! - Instances allocated by exposed constructors are leaked and their
//!   accessors never expire. Reclaiming script-constructed instances is a
//!   documented gap, not a feature.
//!
//! Accessors are single-threaded (`Rc`) like the rest of the core. Nested
//! mutable access through two accessors aliasing the same instance is the
//! caller's contract to avoid.

use std::any::TypeId;
use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::error::{BindError, BindResult};

struct AccessorCell {
    /// Null once the owning side has revoked access.
    target: Cell<*mut ()>,
    type_id: TypeId,
    type_name: &'static str,
}

/// Shared, expirable handle to a native instance.
///
/// Cloning yields another handle to the same instance; all clones expire
/// together when the owning [`Anchor`] drops.
#[derive(Clone)]
pub struct LiveAccessor {
    cell: Rc<AccessorCell>,
}

impl LiveAccessor {
    /// Wrap an instance the scripting side now effectively owns.
    ///
    /// The value is moved to the heap and leaked; the accessor never
    /// expires. Used for constructor-created instances.
    pub fn owning<T: 'static>(value: T) -> Self {
        let target = Box::into_raw(Box::new(value)) as *mut ();
        Self {
            cell: Rc::new(AccessorCell {
                target: Cell::new(target),
                type_id: TypeId::of::<T>(),
                type_name: std::any::type_name::<T>(),
            }),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.cell.target.get().is_null()
    }

    /// Name of the native type this accessor points at.
    pub fn target_type_name(&self) -> &'static str {
        self.cell.type_name
    }

    fn resolve<T: 'static>(&self) -> BindResult<*mut T> {
        if self.cell.type_id != TypeId::of::<T>() {
            return Err(BindError::AccessorTypeMismatch {
                expected: std::any::type_name::<T>(),
                actual: self.cell.type_name,
            });
        }
        let target = self.cell.target.get();
        if target.is_null() {
            return Err(BindError::ExpiredAccessor {
                type_name: self.cell.type_name,
            });
        }
        Ok(target as *mut T)
    }

    /// Run `f` against a shared view of the instance.
    pub fn with<T: 'static, R>(&self, f: impl FnOnce(&T) -> R) -> BindResult<R> {
        let target = self.resolve::<T>()?;
        // Type and liveness checked above; the anchor (or leak) guarantees
        // the pointee is still valid while the pointer is non-null.
        Ok(f(unsafe { &*target }))
    }

    /// Run `f` against a mutable view of the instance.
    pub fn with_mut<T: 'static, R>(&self, f: impl FnOnce(&mut T) -> R) -> BindResult<R> {
        let target = self.resolve::<T>()?;
        // Same invariant as `with`; exclusivity is the single-threaded
        // caller contract documented at module level.
        Ok(f(unsafe { &mut *target }))
    }
}

impl fmt::Debug for LiveAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveAccessor")
            .field("target_type", &self.cell.type_name)
            .field("expired", &self.is_expired())
            .finish()
    }
}

/// Scoped grant of access to a host-owned instance.
///
/// Holds the exclusive borrow of the instance for its lifetime and revokes
/// every accessor handed out when it drops.
pub struct Anchor<'a, T: 'static> {
    cell: Rc<AccessorCell>,
    _target: PhantomData<&'a mut T>,
}

impl<'a, T: 'static> Anchor<'a, T> {
    pub fn new(target: &'a mut T) -> Self {
        Self {
            cell: Rc::new(AccessorCell {
                target: Cell::new(target as *mut T as *mut ()),
                type_id: TypeId::of::<T>(),
                type_name: std::any::type_name::<T>(),
            }),
            _target: PhantomData,
        }
    }

    /// A new accessor bound to the anchored instance. Every call hands out
    /// an independent handle onto the same shared state.
    pub fn accessor(&self) -> LiveAccessor {
        LiveAccessor {
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<T: 'static> Drop for Anchor<'_, T> {
    fn drop(&mut self) {
        self.cell.target.set(std::ptr::null_mut());
    }
}

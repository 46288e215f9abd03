/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::ops::{Deref, DerefMut};

use crate::meta::error::{ConvertError, ErrorKind};
use crate::obj::bounds::{DeclUser, Declarer, DynMemory, MemManual, MemRefCounted};
use crate::obj::{cap, Bounds, GdMut, GdRef, GodotClass, Inherits, InstanceId, Ownership, RawGd};
use crate::{private, sys};

/// Smart pointer to objects owned by the engine.
///
/// This smart pointer can only hold _objects_ in the engine sense: instances of engine classes (`Node`, `RefCounted`, etc.)
/// or user-declared structs (declared with `#[derive(GodotClass)]`).
///
/// `Gd<T>` never holds null objects. Engine methods that may return null yield `Option<Gd<T>>`.
///
/// # Memory management
///
/// Every `Gd` carries an [`Ownership`] tag, decided when the object pointer entered Rust:
///
/// - **Reference-counted**<br>
///   Objects of type [`RefCounted`] or inherited from it hold one engine reference per `Gd`. [`Clone::clone()`] increments the
///   counter, dropping decrements it; the last reference (in Rust or the engine) destroys the object.<br><br>
///
/// - **Owned**<br>
///   Manually-managed objects constructed from Rust (e.g. `Node::new_alloc()`) are owned by the `Gd` and destroyed when it is
///   dropped, unless ownership is transferred to the engine first (e.g. by `add_child()`) or the object is [`free()`][Self::free]d.<br><br>
///
/// - **Engine-owned**<br>
///   Objects returned by the engine without ownership (e.g. `get_parent()`) or copies of owned handles are re-validated through
///   their [`InstanceId`] before each engine call, so use-after-free becomes an error instead of undefined behavior.
///
/// # Construction
///
/// | Type \ Memory Strategy | Ref-counted             | Manually managed          | Singleton             |
/// |------------------------|-------------------------|---------------------------|-----------------------|
/// | **Engine type**        | `Resource::new_gd()`    | `Node::new_alloc()`       | `Engine::singleton()` |
/// | **User type**          | `MyClass::new_gd()`     | `MyClass::new_alloc()`    | _(not supported)_     |
///
/// [`RefCounted`]: crate::classes::RefCounted
#[repr(C)]
pub struct Gd<T: GodotClass> {
    pub(crate) raw: RawGd<T>,
}

impl<T: GodotClass> Gd<T> {
    pub(crate) fn from_raw(raw: RawGd<T>) -> Self {
        debug_assert!(!raw.is_null(), "Gd<T> must not be null");
        Self { raw }
    }

    /// # Safety
    /// See [`RawGd::from_construct()`].
    pub(crate) unsafe fn from_construct(ptr: sys::GDExtensionObjectPtr) -> Self {
        Self::from_raw(RawGd::from_construct(ptr))
    }

    /// Creates a new manually-managed instance, owned by this `Gd` until transferred or freed.
    pub fn new_alloc() -> Self
    where
        T: cap::GodotDefault + Bounds<Memory = MemManual>,
    {
        T::__godot_default()
    }

    /// Creates a new reference-counted instance.
    pub fn new_gd() -> Self
    where
        T: cap::GodotDefault + Bounds<Memory = MemRefCounted>,
    {
        T::__godot_default()
    }

    /// Looks up the object with the given instance ID.
    ///
    /// # Panics
    /// If no such object is alive, or it is not an instance of `T`. See [`try_from_instance_id()`][Self::try_from_instance_id].
    #[track_caller]
    pub fn from_instance_id(instance_id: InstanceId) -> Self {
        match Self::try_from_instance_id(instance_id) {
            Ok(obj) => obj,
            Err(err) => panic!(
                "Gd<{}>::from_instance_id({instance_id}) failed: {err}",
                T::class_name()
            ),
        }
    }

    /// Looks up the object with the given instance ID, returning an error if it is dead or of another class.
    ///
    /// Ref-counted objects take a new reference. Other objects yield an engine-owned handle.
    pub fn try_from_instance_id(instance_id: InstanceId) -> Result<Self, ConvertError> {
        let ptr = instance_id.lookup_object_ptr();
        if ptr.is_null() {
            return Err(ConvertError::with_kind_value(
                ErrorKind::InvalidInstanceId,
                instance_id,
            ));
        }

        // SAFETY: the engine just reported the object as alive.
        let borrowed = unsafe { RawGd::<T>::borrowed(ptr) };
        if borrowed.ffi_cast::<T>().is_none() {
            return Err(ConvertError::new(ErrorKind::WrongClass {
                expected: T::class_name(),
                actual: private::dynamic_class_name(ptr),
            }));
        }

        Ok(Self::from_raw(RawGd::from_lookup(*borrowed.handle())))
    }

    /// Returns the instance ID of this object.
    ///
    /// # Panics
    /// If the object has been freed.
    #[track_caller]
    pub fn instance_id(&self) -> InstanceId {
        self.instance_id_unchecked()
            .filter(|_| self.is_instance_valid())
            .unwrap_or_else(|| {
                panic!(
                    "Gd<{}>::instance_id(): object has been freed",
                    T::class_name()
                )
            })
    }

    /// Returns the last known instance ID, without checking liveness.
    pub fn instance_id_unchecked(&self) -> Option<InstanceId> {
        self.raw.instance_id()
    }

    /// Checks if this smart pointer points to a live object (read-only access, no engine calls besides the ID lookup).
    pub fn is_instance_valid(&self) -> bool {
        self.raw.is_instance_valid()
    }

    /// Current ownership tag of this handle.
    pub fn ownership(&self) -> Ownership {
        self.raw.ownership()
    }

    /// **Upcast:** convert into a smart pointer to a base class. Always succeeds.
    pub fn upcast<Base>(self) -> Gd<Base>
    where
        Base: GodotClass,
        T: Inherits<Base>,
    {
        Gd::from_raw(self.raw.into_other())
    }

    /// **Upcast shared-ref:** access this object as a shared reference to a base class.
    ///
    /// Free, as no engine call or reference count change is involved.
    pub fn upcast_ref<Base>(&self) -> &Base
    where
        Base: GodotClass + crate::obj::EngineClass,
        T: Inherits<Base>,
    {
        self.raw.upcast_ref::<Base>().as_target::<Base>()
    }

    /// **Upcast exclusive-ref:** access this object as an exclusive reference to a base class.
    pub fn upcast_mut<Base>(&mut self) -> &mut Base
    where
        Base: GodotClass + crate::obj::EngineClass,
        T: Inherits<Base>,
    {
        self.raw.as_target_mut::<Base>()
    }

    /// **Downcast:** try to convert into a smart pointer to a derived class.
    ///
    /// If the object's dynamic class is not `Derived` or one of its subclasses, `Err(self)` is returned, meaning you can reuse the
    /// original object for further casts.
    ///
    /// # Panics
    /// If the object has been freed.
    #[track_caller]
    pub fn try_cast<Derived>(self) -> Result<Gd<Derived>, Self>
    where
        Derived: GodotClass + Inherits<T>,
    {
        if let Err(err) = self.raw.check_alive() {
            panic!(
                "Gd<{}>::try_cast::<{}>(): {err}",
                T::class_name(),
                Derived::class_name()
            );
        }

        match self.raw.ffi_cast::<Derived>() {
            Some(_) => Ok(Gd::from_raw(self.raw.into_other())),
            None => Err(self),
        }
    }

    /// ⚠️ **Downcast:** convert into a smart pointer to a derived class. Panics on error.
    ///
    /// # Panics
    /// If the class' dynamic type is not `Derived` or one of its subclasses. Use [`Self::try_cast()`] if you want to check the result.
    #[track_caller]
    pub fn cast<Derived>(self) -> Gd<Derived>
    where
        Derived: GodotClass + Inherits<T>,
    {
        self.try_cast().unwrap_or_else(|from_obj| {
            panic!(
                "downcast from {from} to {to} failed; instance {from_obj:?}",
                from = T::class_name(),
                to = Derived::class_name(),
            )
        })
    }

    /// Destroy the manually-managed engine object.
    ///
    /// Consumes this smart pointer and renders all other `Gd` smart pointers (as well as any engine-side object handles) referring
    /// to the same object immediately invalid.
    ///
    /// # Panics
    /// - If the object has already been freed.
    /// - If this is a `Gd<Object>` pointing to a ref-counted instance; those are released by dropping their handles.
    /// - If the object is bound to the lifetime of another object (e.g. an internal child of a container).
    /// - When the object is bound by an ongoing `bind()` or `bind_mut()` call (through a separate `Gd` pointer).
    #[track_caller]
    pub fn free(self)
    where
        T: Bounds<Memory = MemManual>,
    {
        if let Err(err) = self.raw.check_alive() {
            panic!("Gd<{}>::free(): {err}", T::class_name());
        }

        // Runtime check for T=Object, no-op otherwise.
        if <T::DynMemory as DynMemory>::is_ref_counted(self.raw.handle()) {
            panic!(
                "Gd<{}>::free(): instance is ref-counted; free() is only supported for manually managed objects",
                T::class_name()
            );
        }

        if let Ownership::LifetimeBound { owner } = self.raw.ownership() {
            panic!(
                "Gd<{}>::free(): object is owned by instance {owner} and dies with it",
                T::class_name()
            );
        }

        if <T::Declarer as Declarer>::is_currently_bound(&self.raw) {
            panic!(
                "Gd<{}>::free(): object is currently bound by bind() or bind_mut()",
                T::class_name()
            );
        }

        // Released first: nothing happens on drop, neither here nor in an owning handle elsewhere.
        self.raw.ownership_cell().set(Ownership::Released);
        crate::obj::ownership::end_ownership(self.raw.instance_id());

        // SAFETY: object verified alive above.
        unsafe { sys::interface_fn!(object_destroy)(self.raw.handle().ptr()) };
    }

    /// Returns a raw pointer to the object. Does not check liveness.
    pub fn obj_sys(&self) -> sys::GDExtensionObjectPtr {
        self.raw.handle().ptr()
    }

    /// Marks the object as handed over to the engine, e.g. because it is passed to a method taking ownership.
    #[doc(hidden)]
    pub fn __transfer_to_engine(&self) -> sys::GDExtensionObjectPtr {
        self.raw.transfer_to_engine()
    }
}

/// _The methods in this impl block are only available for user-declared `T`, that is,
/// structs with `#[derive(GodotClass)]` but not engine classes like `Node` or `RefCounted`._ <br><br>
impl<T> Gd<T>
where
    T: GodotClass + Bounds<Declarer = DeclUser>,
{
    /// Hands out a guard for a shared borrow, through which the user instance can be read.
    ///
    /// # Panics
    /// - If the object has been freed.
    /// - If there is an ongoing mutable borrow (`bind_mut()` or a virtual method taking `&mut self`).
    #[track_caller]
    pub fn bind(&self) -> GdRef<'_, T> {
        let storage = self.storage_or_panic("bind");
        GdRef::from_storage(storage)
    }

    /// Hands out a guard for an exclusive borrow, through which the user instance can be read and written.
    ///
    /// # Panics
    /// - If the object has been freed.
    /// - If there is an ongoing borrow of any kind.
    #[track_caller]
    pub fn bind_mut(&mut self) -> GdMut<'_, T> {
        let storage = self.storage_or_panic("bind_mut");
        GdMut::from_storage(storage)
    }

    #[track_caller]
    fn storage_or_panic(&self, method: &str) -> &crate::storage::InstanceStorage<T> {
        self.raw.storage().unwrap_or_else(|| {
            panic!(
                "Gd<{}>::{method}(): object has been freed",
                T::class_name()
            )
        })
    }
}

impl<T: GodotClass> Deref for Gd<T> {
    // Target is the class itself for engine classes, and the engine base for user classes.
    type Target = <<T as Bounds>::Declarer as Declarer>::DerefTarget<T>;

    fn deref(&self) -> &Self::Target {
        self.raw.as_target::<Self::Target>()
    }
}

impl<T: GodotClass> DerefMut for Gd<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.raw.as_target_mut::<Self::Target>()
    }
}

impl<T: GodotClass> Clone for Gd<T> {
    /// Ref-counted objects take a new reference. Otherwise, the copy is an engine-owned handle that never releases the object.
    fn clone(&self) -> Self {
        Self::from_raw(self.raw.clone_raw())
    }
}

impl<T> Default for Gd<T>
where
    T: cap::GodotDefault + Bounds<Memory = MemRefCounted>,
{
    /// Creates a default-constructed `T` inside a smart pointer.
    ///
    /// This is equivalent to `Gd::new_gd()`.
    fn default() -> Self {
        T::__godot_default()
    }
}

impl<T: GodotClass> PartialEq for Gd<T> {
    /// Two `Gd` pointers are equal if they refer to the same object.
    fn eq(&self, other: &Self) -> bool {
        self.raw.handle().ptr() == other.raw.handle().ptr()
            && self.instance_id_unchecked() == other.instance_id_unchecked()
    }
}

impl<T: GodotClass> Eq for Gd<T> {}

impl<T: GodotClass> Debug for Gd<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let id = self
            .instance_id_unchecked()
            .map_or_else(|| "null".to_string(), |id| id.to_string());

        if self.is_instance_valid() {
            write!(f, "Gd {{ id: {id}, class: {} }}", T::class_name())
        } else {
            write!(f, "Gd {{ id: {id}, class: {}, freed }}", T::class_name())
        }
    }
}

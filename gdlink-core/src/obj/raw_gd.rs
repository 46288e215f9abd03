/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::cell::Cell;
use std::marker::PhantomData;
use std::mem::ManuallyDrop;

use crate::classes::RefCounted;
use crate::meta::error::{ConvertError, ErrorKind};
use crate::obj::bounds::{DeclUser, DynMemory};
use crate::obj::ownership::{self, ReleaseAction};
use crate::obj::{Bounds, EngineClass, GodotClass, InstanceId, ObjectHandle, Ownership};
use crate::storage::InstanceStorage;
use crate::{out, sys};

/// Low-level object pointer with an ownership tag, used by [`Gd<T>`][crate::obj::Gd].
///
/// Releases the object according to its [`Ownership`] when dropped, at most once.
///
/// The layout is the same for every `T`, which allows upcasting references by reinterpretation.
#[repr(C)]
pub struct RawGd<T: GodotClass> {
    handle: ObjectHandle,
    ownership: Cell<Ownership>,
    _marker: PhantomData<*const T>,
}

impl<T: GodotClass> RawGd<T> {
    pub(crate) fn from_handle(handle: ObjectHandle, ownership: Ownership) -> Self {
        if ownership == Ownership::Owned {
            ownership::register_owned(handle.instance_id());
        }

        Self {
            handle,
            ownership: Cell::new(ownership),
            _marker: PhantomData,
        }
    }

    /// Adopts an object just constructed by the engine or the registry.
    ///
    /// Ref-counted objects get their initial reference; all others are owned by Rust until transferred.
    ///
    /// # Safety
    /// `ptr` must point to a live object of class `T` that nobody else owns.
    pub(crate) unsafe fn from_construct(ptr: sys::GDExtensionObjectPtr) -> Self {
        let handle = ObjectHandle::from_ptr(ptr);

        if T::DynMemory::is_ref_counted(&handle) {
            as_ref_counted(handle).init_ref();
            Self::from_handle(handle, Ownership::RefCounted)
        } else {
            Self::from_handle(handle, Ownership::Owned)
        }
    }

    /// Adopts an object returned by an engine call, with the ownership decided by the ownership table.
    ///
    /// A `RefCounted` tag adopts the reference the engine passed along; no increment happens here.
    ///
    /// # Safety
    /// `ptr` must be null or point to a live object of class `T`.
    pub(crate) unsafe fn from_return(ptr: sys::GDExtensionObjectPtr, ownership: Ownership) -> Self {
        let mut handle = ObjectHandle::from_ptr(ptr);
        if let Ownership::LifetimeBound { owner } = ownership {
            handle = handle.with_owner(owner);
        }

        Self::from_handle(handle, ownership)
    }

    /// Handle valid for the duration of an engine callback. Never released by Rust.
    ///
    /// # Safety
    /// `ptr` must be null or point to a live object of class `T`.
    pub(crate) unsafe fn borrowed(ptr: sys::GDExtensionObjectPtr) -> Self {
        Self::from_handle(ObjectHandle::from_ptr(ptr), Ownership::Borrowed)
    }

    /// Handle for an object found by instance ID.
    ///
    /// Ref-counted objects take their own reference; everything else is owned by the engine and must be re-validated.
    pub(crate) fn from_lookup(handle: ObjectHandle) -> Self {
        let is_ref_counted = handle
            .instance_id()
            .is_some_and(|id| id.is_ref_counted());

        if is_ref_counted {
            as_ref_counted(handle).reference();
            Self::from_handle(handle, Ownership::RefCounted)
        } else {
            Self::from_handle(handle, Ownership::MustAssertInstanceId)
        }
    }

    pub fn handle(&self) -> &ObjectHandle {
        &self.handle
    }

    /// Current tag. An `Owned` handle whose object was handed to the engine through another handle becomes `MustAssertInstanceId`.
    pub fn ownership(&self) -> Ownership {
        let tag = self.ownership.get();
        if tag == Ownership::Owned && !ownership::is_still_owned(self.handle.instance_id()) {
            self.ownership.set(Ownership::MustAssertInstanceId);
            return Ownership::MustAssertInstanceId;
        }

        tag
    }

    pub(crate) fn ownership_cell(&self) -> &Cell<Ownership> {
        &self.ownership
    }

    pub fn is_null(&self) -> bool {
        self.handle.is_null()
    }

    pub fn instance_id(&self) -> Option<InstanceId> {
        self.handle.instance_id()
    }

    pub fn is_instance_valid(&self) -> bool {
        match self.ownership.get() {
            Ownership::Released => false,
            _ => self.handle.is_alive(),
        }
    }

    /// Releases the object according to the ownership tag. Subsequent calls do nothing.
    pub(crate) fn release(&self) {
        let ownership = self.ownership();
        self.ownership.set(Ownership::Released);

        match ownership.release_action() {
            ReleaseAction::Nothing => {}
            ReleaseAction::Destroy => {
                ownership::end_ownership(self.handle.instance_id());

                // The engine may already have destroyed the object, e.g. together with its parent.
                if self.handle.is_alive() {
                    out!("release: destroy {:?}", self.handle.instance_id());
                    // SAFETY: object is alive and owned by this handle.
                    unsafe { sys::interface_fn!(object_destroy)(self.handle.ptr()) };
                }
            }
            ReleaseAction::Unreference => {
                let last = as_ref_counted(self.handle).unreference();
                out!(
                    "release: unreference {:?} (last: {last})",
                    self.handle.instance_id()
                );

                if last {
                    // SAFETY: the count dropped to zero; this was the last reference.
                    unsafe { sys::interface_fn!(object_destroy)(self.handle.ptr()) };
                }
            }
        }
    }

    /// Hands the object over to the engine and returns its pointer.
    ///
    /// `Owned` handles stop owning the object: the engine now decides its lifetime, Rust only keeps a must-assert handle.
    /// This applies to every handle of the object, not only to `self`.
    pub(crate) fn transfer_to_engine(&self) -> sys::GDExtensionObjectPtr {
        mark_transferred(&self.ownership, self.handle.instance_id());
        self.handle.ptr()
    }

    /// Copy of this handle, following the clone rules of [`Ownership`].
    pub(crate) fn clone_raw(&self) -> Self {
        let ownership = self.ownership.get().for_clone();
        if ownership == Ownership::RefCounted {
            as_ref_counted(self.handle).reference();
        }

        Self::from_handle(self.handle, ownership)
    }

    /// Downcast or cross-cast through the engine's class tags. Returns `None` if the object is not an instance of `U`.
    pub(crate) fn ffi_cast<U: GodotClass>(&self) -> Option<sys::GDExtensionObjectPtr> {
        // SAFETY: object liveness is checked by the caller; class tags are plain engine lookups.
        let cast_ptr = unsafe {
            sys::interface_fn!(object_cast_to)(
                sys::to_const_ptr(self.handle.ptr()),
                U::class_name().class_tag(),
            )
        };

        sys::ptr_then(cast_ptr, |ptr| ptr)
    }

    /// Moves the handle into another static type, keeping the ownership tag.
    pub(crate) fn into_other<U: GodotClass>(self) -> RawGd<U> {
        let this = ManuallyDrop::new(self);

        RawGd {
            handle: this.handle,
            ownership: Cell::new(this.ownership.get()),
            _marker: PhantomData,
        }
    }

    /// Reinterprets as reference to a base class handle.
    pub(crate) fn upcast_ref<U>(&self) -> &RawGd<U>
    where
        U: GodotClass,
        T: crate::obj::Inherits<U>,
    {
        // SAFETY: RawGd<T> and RawGd<U> have identical layout; T inheriting U makes the static type valid.
        unsafe { &*(self as *const RawGd<T> as *const RawGd<U>) }
    }

    /// Ensures the object can be used, or returns why not.
    pub(crate) fn check_alive(&self) -> Result<(), ConvertError> {
        if self.handle.is_null() {
            return Err(ConvertError::new(ErrorKind::NullObject));
        }

        if !self.is_instance_valid() {
            let id = self
                .instance_id()
                .map_or_else(|| "<unknown>".to_string(), |id| id.to_string());

            return Err(ConvertError::with_kind_value(ErrorKind::DeadObject, id));
        }

        Ok(())
    }

    /// Reinterprets the handle as the engine class it dereferences to.
    pub(crate) fn as_target<Target: GodotClass>(&self) -> &Target {
        // SAFETY: Target is the class itself or the engine base of a user class; both are #[repr(transparent)] engine wrappers
        // around ObjectHandle.
        unsafe { &*(&self.handle as *const ObjectHandle as *const Target) }
    }

    pub(crate) fn as_target_mut<Target: GodotClass>(&mut self) -> &mut Target {
        // SAFETY: see as_target().
        unsafe { &mut *(&mut self.handle as *mut ObjectHandle as *mut Target) }
    }
}

impl<T> RawGd<T>
where
    T: GodotClass + Bounds<Declarer = DeclUser>,
{
    /// Storage of the user instance, or `None` if the object is dead.
    pub(crate) fn storage(&self) -> Option<&InstanceStorage<T>> {
        if !self.is_instance_valid() {
            return None;
        }

        // SAFETY: object is alive; the binding was set to an InstanceStorage<T> in the create callback.
        unsafe { crate::storage::instance_storage_of::<T>(self.handle.ptr()) }
    }
}

impl<T: GodotClass> Drop for RawGd<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: GodotClass> std::fmt::Debug for RawGd<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawGd")
            .field("class", &T::class_name())
            .field("id", &self.handle.instance_id())
            .field("ownership", &self.ownership.get())
            .finish()
    }
}

/// Applies a transfer to the engine to the handle's tag and to the object's Rust ownership.
pub(crate) fn mark_transferred(tag: &Cell<Ownership>, id: Option<InstanceId>) {
    tag.set(tag.get().after_transfer_to_engine());
    ownership::end_ownership(id);
}

fn as_ref_counted(handle: ObjectHandle) -> RefCounted {
    RefCounted::__from_handle(handle)
}

/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::cell::{BorrowError, BorrowMutError, Cell, Ref, RefCell, RefMut};

use crate::obj::{GodotClass, ObjectHandle};
use crate::{out, sys};

/// Storage for the Rust side of a user-class instance, attached to the engine object as its extension instance.
///
/// Created in the `create` callback, destroyed in the `free` callback; the engine object owns it.
pub struct InstanceStorage<T: GodotClass> {
    user_instance: RefCell<T>,
    base: ObjectHandle,

    // Mirrors the engine reference count of ref-counted instances, as reported through reference/unreference callbacks.
    ref_count: Cell<u32>,
}

impl<T: GodotClass> InstanceStorage<T> {
    pub(crate) fn construct(user_instance: T, base: ObjectHandle) -> Self {
        out!("    Storage::construct             <{}>", T::class_name());

        Self {
            user_instance: RefCell::new(user_instance),
            base,
            ref_count: Cell::new(0),
        }
    }

    pub(crate) fn on_inc_ref(&self) {
        self.ref_count.set(self.ref_count.get() + 1);
        out!(
            "    Storage::on_inc_ref (rc={})     <{}>",
            self.ref_count.get(),
            T::class_name()
        );
    }

    pub(crate) fn on_dec_ref(&self) {
        self.ref_count.set(self.ref_count.get().saturating_sub(1));
        out!(
            "  | Storage::on_dec_ref (rc={})     <{}>",
            self.ref_count.get(),
            T::class_name()
        );
    }

    /// Number of references the engine reported through the reference callbacks since construction.
    pub fn tracked_ref_count(&self) -> u32 {
        self.ref_count.get()
    }

    /// Engine object that owns this instance.
    pub fn base(&self) -> &ObjectHandle {
        &self.base
    }

    /// Returns `true` when there are any outstanding references to the user instance.
    pub fn is_bound(&self) -> bool {
        self.user_instance.try_borrow_mut().is_err()
    }

    pub(crate) fn get(&self) -> Result<Ref<'_, T>, BorrowError> {
        self.user_instance.try_borrow()
    }

    pub(crate) fn get_mut(&self) -> Result<RefMut<'_, T>, BorrowMutError> {
        self.user_instance.try_borrow_mut()
    }

    /// Puts self onto the heap and returns a pointer to this new heap-allocation.
    ///
    /// The caller is responsible for destroying it with [`destroy_storage()`].
    #[must_use]
    pub(crate) fn into_raw(self) -> *mut Self {
        Box::into_raw(Box::new(self))
    }
}

impl<T: GodotClass> Drop for InstanceStorage<T> {
    fn drop(&mut self) {
        out!("    Storage::drop (rc={})           <{}>", self.ref_count.get(), T::class_name());
    }
}

/// Interprets the opaque instance pointer as a storage reference.
///
/// # Safety
/// `instance_ptr` must have been obtained from [`InstanceStorage::into_raw()`] for the same `T`, and not yet destroyed.
pub(crate) unsafe fn as_storage<'u, T: GodotClass>(
    instance_ptr: sys::GDExtensionClassInstancePtr,
) -> &'u InstanceStorage<T> {
    &*(instance_ptr as *mut InstanceStorage<T>)
}

/// # Safety
/// `instance_ptr` must have been obtained from [`InstanceStorage::into_raw()`] for the same `T`, and not be used afterwards.
pub(crate) unsafe fn destroy_storage<T: GodotClass>(instance_ptr: sys::GDExtensionClassInstancePtr) {
    let raw = instance_ptr as *mut InstanceStorage<T>;

    assert!(
        !(*raw).is_bound(),
        "tried to destroy object while a bind() or bind_mut() call is active\n  \
         object: {:?}",
        (*raw).base().instance_id()
    );

    let _drop = Box::from_raw(raw);
}

/// Storage attached to a user object through the instance binding of this library.
///
/// # Safety
/// `object_ptr` must point to a live object. If it is an instance of a user class, that class must be `T`.
pub(crate) unsafe fn instance_storage_of<'u, T: GodotClass>(
    object_ptr: sys::GDExtensionObjectPtr,
) -> Option<&'u InstanceStorage<T>> {
    let binding = sys::interface_fn!(object_get_instance_binding)(
        object_ptr,
        sys::get_library(),
        &BINDING_CALLBACKS,
    );

    sys::ptr_then(binding, |ptr| as_storage::<T>(ptr))
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Instance binding callbacks

/// Callbacks for the instance binding of this library.
///
/// Bindings are only ever set explicitly in the `create` callback, pointing to the instance storage. The engine never creates them
/// on demand, and their memory is owned by the extension instance (freed in the `free` callback), not by the binding.
pub(crate) static BINDING_CALLBACKS: sys::GDExtensionInstanceBindingCallbacks =
    sys::GDExtensionInstanceBindingCallbacks {
        create_callback: Some(create_callback),
        free_callback: Some(free_callback),
        reference_callback: Some(reference_callback),
    };

unsafe extern "C" fn create_callback(
    _p_token: *mut std::ffi::c_void,
    _p_instance: *mut std::ffi::c_void,
) -> *mut std::ffi::c_void {
    // Engine objects without a user instance have no binding.
    std::ptr::null_mut()
}

unsafe extern "C" fn free_callback(
    _p_token: *mut std::ffi::c_void,
    _p_instance: *mut std::ffi::c_void,
    _p_binding: *mut std::ffi::c_void,
) {
}

unsafe extern "C" fn reference_callback(
    _p_token: *mut std::ffi::c_void,
    _p_binding: *mut std::ffi::c_void,
    _p_reference: sys::GDExtensionBool,
) -> sys::GDExtensionBool {
    sys::GDEXTENSION_TRUE
}

/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Callbacks that are passed as function pointers to the engine upon class registration.
//!
//! Re-exported to the `gdlink` crate only so that generated code can name them. Not part of the public API.

#![allow(clippy::missing_safety_doc)]

use std::any::type_name;

use crate::builtin::{GString, StringName};
use crate::meta::FfiReturn;
use crate::obj::{cap, Base, GodotClass, ObjectHandle, UserClass};
use crate::private::handle_panic;
use crate::storage::{as_storage, destroy_storage, InstanceStorage, BINDING_CALLBACKS};
use crate::{godot_error, out, sys};

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Lifecycle

/// Constructs the engine base object and attaches a new user instance to it.
///
/// Returns null if the user constructor panicked; the base object is destroyed in that case.
pub unsafe extern "C" fn create<T: cap::GodotDefault>(
    _class_userdata: *mut std::ffi::c_void,
) -> sys::GDExtensionObjectPtr {
    create_custom(T::__godot_user_init)
}

pub(crate) fn create_custom<T, F>(make_user_instance: F) -> sys::GDExtensionObjectPtr
where
    T: GodotClass,
    F: FnOnce(Base<T::Base>) -> T,
{
    let base_class_name = T::Base::class_name();
    let class_name = T::class_name();

    // SAFETY: binding is initialized while the engine calls into the extension.
    let base_ptr = unsafe { sys::interface_fn!(classdb_construct_object)(base_class_name.string_sys()) };
    if base_ptr.is_null() {
        godot_error!("failed to construct base object <{base_class_name}> of class <{class_name}>");
        return std::ptr::null_mut();
    }

    out!("create callback: {class_name} on base {base_class_name} at {base_ptr:?}");

    // SAFETY: base_ptr was just constructed and is live.
    let base_handle = unsafe { ObjectHandle::from_ptr(base_ptr) };
    let base = Base::from_handle(base_handle);

    let user_instance = match handle_panic(
        || format!("panic during {class_name}::init() constructor"),
        move || make_user_instance(base),
    ) {
        Ok(instance) => instance,
        Err(_) => {
            // SAFETY: nobody else references the base object yet.
            unsafe { sys::interface_fn!(object_destroy)(base_ptr) };
            return std::ptr::null_mut();
        }
    };

    let instance_ptr = InstanceStorage::construct(user_instance, base_handle).into_raw();
    let instance_ptr = instance_ptr as sys::GDExtensionClassInstancePtr;

    // SAFETY: base_ptr is live; the storage pointer stays valid until the engine calls free().
    unsafe {
        sys::interface_fn!(object_set_instance)(base_ptr, class_name.string_sys(), instance_ptr);
        sys::interface_fn!(object_set_instance_binding)(
            base_ptr,
            sys::get_library(),
            instance_ptr,
            &BINDING_CALLBACKS,
        );
    }

    base_ptr
}

pub unsafe extern "C" fn free<T: GodotClass>(
    _class_userdata: *mut std::ffi::c_void,
    instance: sys::GDExtensionClassInstancePtr,
) {
    out!("free callback: {}", T::class_name());

    let result = handle_panic(
        || format!("panic while freeing instance of {}", T::class_name()),
        // SAFETY: the engine frees each instance exactly once, with the pointer obtained from create().
        || unsafe { destroy_storage::<T>(instance) },
    );

    if result.is_err() {
        // Storage is still borrowed and stays allocated.
        out!("free callback: leaked instance of {}", T::class_name());
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Virtuals and overridable engine hooks

pub unsafe extern "C" fn get_virtual<T: cap::ImplementsVirtuals>(
    _class_userdata: *mut std::ffi::c_void,
    name: sys::GDExtensionConstStringNamePtr,
) -> sys::GDExtensionClassCallVirtual {
    // SAFETY: the engine passes a valid StringName.
    let method_name = unsafe { StringName::string_sys_to_string(name) };

    let trampoline = T::__virtual_call(&method_name);
    out!(
        "get_virtual callback: {}::{method_name} -> {}",
        T::class_name(),
        if trampoline.is_some() { "overridden" } else { "default" }
    );

    trampoline
}

pub unsafe extern "C" fn to_string<T: cap::GodotToString>(
    instance: sys::GDExtensionClassInstancePtr,
    is_valid: *mut sys::GDExtensionBool,
    out_string: sys::GDExtensionStringPtr,
) {
    // SAFETY: instance was created by create() for class T.
    let storage = unsafe { as_storage::<T>(instance) };

    let result = handle_panic(
        || format!("panic in {}::to_string()", T::class_name()),
        || match storage.get() {
            Ok(instance) => Some(instance.__godot_to_string()),
            Err(_) => None,
        },
    );

    let Ok(Some(string)) = result else {
        // SAFETY: is_valid points to a writable flag.
        unsafe { *is_valid = sys::GDEXTENSION_FALSE };
        return;
    };

    // SAFETY: out_string points to an initialized engine String.
    unsafe {
        GString::write_return(string, out_string);
        *is_valid = sys::GDEXTENSION_TRUE;
    }
}

pub unsafe extern "C" fn on_notification<T: cap::GodotNotification>(
    instance: sys::GDExtensionClassInstancePtr,
    what: i32,
    _reversed: sys::GDExtensionBool,
) {
    // SAFETY: instance was created by create() for class T.
    let storage = unsafe { as_storage::<T>(instance) };

    let _ = handle_panic(
        || format!("panic in {}::on_notification({what})", T::class_name()),
        || match storage.get_mut() {
            Ok(mut instance) => instance.__godot_notification(what),
            Err(_) => {
                godot_error!(
                    "{}::on_notification({what}) skipped: instance is already bound",
                    T::class_name()
                );
            }
        },
    );
}

pub unsafe extern "C" fn reference<T: GodotClass>(instance: sys::GDExtensionClassInstancePtr) {
    // SAFETY: instance was created by create() for class T.
    let storage = unsafe { as_storage::<T>(instance) };
    storage.on_inc_ref();
}

pub unsafe extern "C" fn unreference<T: GodotClass>(instance: sys::GDExtensionClassInstancePtr) {
    // SAFETY: instance was created by create() for class T.
    let storage = unsafe { as_storage::<T>(instance) };
    storage.on_dec_ref();
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Virtual trampolines

/// Runs `f` on the user instance behind `instance`, for a virtual trampoline named `method`.
///
/// Panics and re-entrant calls are reported through `godot_error!` and yield `None`; nothing unwinds into the engine.
///
/// # Safety
/// `instance` must have been created by [`create()`] for class `T`.
pub unsafe fn virtual_call<T, R>(
    instance: sys::GDExtensionClassInstancePtr,
    method: &'static str,
    f: impl FnOnce(&mut T) -> R,
) -> Option<R>
where
    T: UserClass,
{
    // SAFETY: guaranteed by caller.
    let storage = unsafe { as_storage::<T>(instance) };

    let outcome = handle_panic(
        || format!("panic in virtual {}::{method}()", T::class_name()),
        || match storage.get_mut() {
            Ok(mut guard) => Some(f(&mut guard)),
            Err(_) => {
                godot_error!(
                    "virtual {}::{method}() skipped: instance of {} is already bound",
                    T::class_name(),
                    type_name::<T>()
                );
                None
            }
        },
    );

    outcome.ok().flatten()
}

/// Like [`virtual_call()`], for `const` virtuals: runs `f` on a shared bind, so it also works while the instance is bound.
///
/// # Safety
/// `instance` must have been created by [`create()`] for class `T`.
pub unsafe fn virtual_call_ref<T, R>(
    instance: sys::GDExtensionClassInstancePtr,
    method: &'static str,
    f: impl FnOnce(&T) -> R,
) -> Option<R>
where
    T: UserClass,
{
    // SAFETY: guaranteed by caller.
    let storage = unsafe { as_storage::<T>(instance) };

    let outcome = handle_panic(
        || format!("panic in virtual {}::{method}()", T::class_name()),
        || match storage.get() {
            Ok(guard) => Some(f(&guard)),
            Err(_) => {
                godot_error!(
                    "virtual {}::{method}() skipped: instance of {} is already bound mutably",
                    T::class_name(),
                    type_name::<T>()
                );
                None
            }
        },
    );

    outcome.ok().flatten()
}

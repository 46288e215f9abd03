/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Different ways how bounds of a `GodotClass` can be checked.
//!
//! This module contains two traits that can be used to check the characteristics of a `GodotClass` type:
//!
//! 1. [`Declarer`] tells you whether the class is provided by the engine or user-defined.
//!    - [`DeclEngine`] is used for all classes provided by the engine (e.g. `Node`).
//!    - [`DeclUser`] is used for all classes defined by the user, typically through `#[derive(GodotClass)]`.<br><br>
//!
//! 2. [`Memory`] is used to check the memory strategy of the **static** type.
//!    - [`MemRefCounted`] is used for `RefCounted` classes and derived.
//!    - [`MemManual`] is used for all other classes, including `Object` itself (e.g. `Object::new_alloc()`).
//!
//! 3. [`DynMemory`] is used to check the memory strategy of the **dynamic** type, i.e. of the instance.
//!    - [`MemRefCounted`] and [`MemManual`] as above.
//!    - [`MemDynamic`] is used for `Object`. `Gd<Object>` can point to objects of any class, so whether the object is
//!      ref-counted is only known at runtime, from bit 63 of its instance ID.
//!
//! # Example
//!
//! Declare a custom smart pointer which wraps `Gd<T>` pointers, but only accepts `T` objects that are manually managed.
//! ```no_run
//! use gdlink::prelude::*;
//! use gdlink::obj::{bounds, Bounds};
//!
//! struct MyGd<T>
//! where T: GodotClass + Bounds<Memory = bounds::MemManual>
//! {
//!    inner: Gd<T>,
//! }
//! ```

use crate::obj::cap::GodotDefault;
use crate::obj::{Bounds, Gd, GodotClass, ObjectHandle, RawGd};
use crate::registry::callbacks;
use crate::{out, sys};
use private::Sealed;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Sealed trait

pub(super) mod private {
    use super::{Declarer, DynMemory, Memory};

    // Bounds trait declared here for code locality; re-exported in crate::obj.

    /// Library-implemented trait to check bounds on `GodotClass` types.
    ///
    /// See also [`bounds`](crate::obj::bounds) module documentation.
    ///
    /// # Safety
    ///
    /// Internal.
    /// You **must not** implement this trait yourself. [`#[derive(GodotClass)]`](../../gdlink_macros/derive.GodotClass.html)
    /// will automatically do it.
    pub unsafe trait Bounds {
        /// Defines the memory strategy of the static type.
        type Memory: Memory;

        /// Defines the memory strategy of the instance (at runtime).
        type DynMemory: DynMemory;

        /// Whether this class is an engine class, or declared by the user as a Rust struct.
        type Declarer: Declarer;
    }

    pub trait Sealed {}
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Memory bounds

/// Specifies the memory strategy of the static type.
pub trait Memory: Sealed {}

/// Specifies the memory strategy of the dynamic type.
///
/// For `Gd<Object>`, memory is ref-counted or manual depending on the instance.
pub trait DynMemory: Sealed {
    /// Whether the object behind `handle` is ref-counted.
    #[doc(hidden)]
    fn is_ref_counted(handle: &ObjectHandle) -> bool;
}

/// Memory managed through the engine reference counter (always present).
/// This is used for `RefCounted` classes and derived.
pub struct MemRefCounted {}
impl Sealed for MemRefCounted {}
impl Memory for MemRefCounted {}
impl DynMemory for MemRefCounted {
    fn is_ref_counted(_handle: &ObjectHandle) -> bool {
        true
    }
}

/// Memory managed depending on the dynamic type of the object. Used for `Object` instances.
pub struct MemDynamic {}
impl Sealed for MemDynamic {}
impl DynMemory for MemDynamic {
    fn is_ref_counted(handle: &ObjectHandle) -> bool {
        handle
            .instance_id()
            .is_some_and(|id| id.is_ref_counted())
    }
}

/// No memory management, user responsible for not leaking.
/// This is used for `Object` and all its derivates which are not `RefCounted`.
pub struct MemManual {}
impl Sealed for MemManual {}
impl Memory for MemManual {}
impl DynMemory for MemManual {
    fn is_ref_counted(_handle: &ObjectHandle) -> bool {
        false
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Declarer bounds

/// Trait that specifies who declares a given `GodotClass`.
pub trait Declarer: Sealed {
    /// Type that `Gd<T>` dereferences to: the class itself for engine classes, the engine base for user classes.
    type DerefTarget<T: GodotClass>: GodotClass;

    /// Check if the object is a user object *and* currently locked by a `bind()` or `bind_mut()` guard.
    #[doc(hidden)]
    fn is_currently_bound<T>(obj: &RawGd<T>) -> bool
    where
        T: GodotClass + Bounds<Declarer = Self>;

    #[doc(hidden)]
    fn create_gd<T>() -> Gd<T>
    where
        T: GodotDefault + Bounds<Declarer = Self>;
}

/// Expresses that a class is declared by the engine.
pub enum DeclEngine {}
impl Sealed for DeclEngine {}
impl Declarer for DeclEngine {
    type DerefTarget<T: GodotClass> = T;

    fn is_currently_bound<T>(_obj: &RawGd<T>) -> bool
    where
        T: GodotClass + Bounds<Declarer = Self>,
    {
        false
    }

    fn create_gd<T>() -> Gd<T>
    where
        T: GodotDefault + Bounds<Declarer = Self>,
    {
        out!("construct engine object <{}>", T::class_name());

        // SAFETY: construct_object returns a fresh object of the requested class.
        unsafe {
            let object_ptr =
                sys::interface_fn!(classdb_construct_object)(T::class_name().string_sys());
            Gd::from_construct(object_ptr)
        }
    }
}

/// Expresses that a class is declared by the user.
pub enum DeclUser {}
impl Sealed for DeclUser {}
impl Declarer for DeclUser {
    type DerefTarget<T: GodotClass> = T::Base;

    fn is_currently_bound<T>(obj: &RawGd<T>) -> bool
    where
        T: GodotClass + Bounds<Declarer = Self>,
    {
        obj.storage().is_some_and(|storage| storage.is_bound())
    }

    fn create_gd<T>() -> Gd<T>
    where
        T: GodotDefault + Bounds<Declarer = Self>,
    {
        // SAFETY: create() has no preconditions besides an initialized binding; it returns null if the user constructor panics.
        let object_ptr = unsafe { callbacks::create::<T>(std::ptr::null_mut()) };
        assert!(
            !object_ptr.is_null(),
            "failed to construct instance of {}; see previous error",
            T::class_name()
        );

        // SAFETY: create() returns a live object of class T.
        unsafe { Gd::from_construct(object_ptr) }
    }
}

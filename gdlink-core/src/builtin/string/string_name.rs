/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::ffi::c_char;
use std::fmt;

use crate::builtin::string::impl_string_ffi;
use crate::builtin::GString;
use crate::sys;

/// A string optimized for unique names.
///
/// StringNames are immutable strings designed for representing unique names. The engine interns them, so that only one
/// instance of a given name exists.
///
/// Comparison is by content, and goes through a conversion to [`GString`]; prefer comparing names in Rust where possible.
#[repr(transparent)]
pub struct StringName {
    opaque: sys::OpaqueStringName,
}

impl StringName {
    /// # Safety
    /// `init_fn` must construct a valid string name in the uninitialized memory it receives.
    pub(crate) unsafe fn new_with_uninit(
        init_fn: impl FnOnce(sys::GDExtensionUninitializedStringNamePtr),
    ) -> Self {
        let mut opaque = sys::OpaqueStringName::zeroed();
        init_fn(opaque.as_uninit_ptr());

        Self { opaque }
    }

    #[doc(hidden)]
    pub fn string_sys(&self) -> sys::GDExtensionConstStringNamePtr {
        self.opaque.as_type_ptr()
    }

    /// Reads a name passed by the engine into a Rust string, without taking ownership.
    ///
    /// # Safety
    /// `ptr` must point to a valid StringName.
    pub(crate) unsafe fn string_sys_to_string(ptr: sys::GDExtensionConstStringNamePtr) -> String {
        let from_name = sys::builtin_lifecycle_api().string_from_string_name;
        let string = GString::new_with_uninit(|uninit| from_name(uninit, [ptr].as_ptr()));

        string.to_string()
    }

    /// Returns `true` if this is the empty name.
    pub fn is_empty(&self) -> bool {
        self.opaque.bytes() == &[0; 8] || GString::from(self).to_string().is_empty()
    }
}

impl Clone for StringName {
    fn clone(&self) -> Self {
        // SAFETY: copy constructor of a valid string name.
        unsafe {
            let copy = sys::builtin_lifecycle_api().string_name_copy;
            Self::new_with_uninit(|uninit| copy(uninit, [self.string_sys()].as_ptr()))
        }
    }
}

impl Drop for StringName {
    fn drop(&mut self) {
        if self.opaque.bytes() == &[0; 8] {
            return;
        }

        // SAFETY: the payload was constructed by the engine and is destroyed exactly once.
        unsafe {
            let destroy = sys::builtin_lifecycle_api().string_name_destroy;
            destroy(self.opaque.as_uninit_ptr());
        }
    }
}

impl From<&str> for StringName {
    fn from(s: &str) -> Self {
        // SAFETY: pointer and length describe valid UTF-8.
        unsafe {
            Self::new_with_uninit(|uninit| {
                sys::interface_fn!(string_name_new_with_utf8_chars_and_len)(
                    uninit,
                    s.as_ptr() as *const c_char,
                    s.len() as sys::GDExtensionInt,
                )
            })
        }
    }
}

impl From<&GString> for StringName {
    fn from(s: &GString) -> Self {
        // SAFETY: conversion constructor from a valid String.
        unsafe {
            let from_string = sys::builtin_lifecycle_api().string_name_from_string;
            Self::new_with_uninit(|uninit| from_string(uninit, [s.string_sys()].as_ptr()))
        }
    }
}

impl fmt::Display for StringName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&GString::from(self), f)
    }
}

impl fmt::Debug for StringName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "&\"{}\"", GString::from(self))
    }
}

impl PartialEq for StringName {
    fn eq(&self, other: &Self) -> bool {
        GString::from(self) == GString::from(other)
    }
}

impl Eq for StringName {}

impl PartialEq<&str> for StringName {
    fn eq(&self, other: &&str) -> bool {
        GString::from(self) == *other
    }
}

impl_string_ffi!(StringName, sys::OpaqueStringName, copy: string_name_copy, destroy: string_name_destroy);

/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::ffi::c_char;
use std::fmt;

use crate::builtin::string::impl_string_ffi;
use crate::builtin::StringName;
use crate::sys;

/// Engine `String`: a reference-counted, copy-on-write UTF-32 string owned by the engine.
///
/// Named `GString` to avoid confusion with Rust's [`String`]. All operations go through the engine; creating one requires an
/// initialized binding, except for the empty [`GString::new()`].
#[repr(transparent)]
pub struct GString {
    opaque: sys::OpaqueString,
}

impl GString {
    /// Constructs an empty string.
    pub fn new() -> Self {
        // The all-zero payload is the engine's empty string.
        Self {
            opaque: sys::OpaqueString::zeroed(),
        }
    }

    /// # Safety
    /// `init_fn` must construct a valid string in the uninitialized memory it receives.
    pub(crate) unsafe fn new_with_uninit(
        init_fn: impl FnOnce(sys::GDExtensionUninitializedStringPtr),
    ) -> Self {
        let mut opaque = sys::OpaqueString::zeroed();
        init_fn(opaque.as_uninit_ptr());

        Self { opaque }
    }

    #[doc(hidden)]
    pub fn string_sys(&self) -> sys::GDExtensionConstStringPtr {
        self.opaque.as_type_ptr()
    }

    /// Copies the engine string into a Rust `String`.
    fn to_rust_string(&self) -> String {
        if self.opaque.bytes() == &[0; 8] {
            return String::new();
        }

        // SAFETY: self is a valid engine string; the first call only measures, the second writes at most `len` bytes.
        unsafe {
            let to_utf8 = sys::interface_fn!(string_to_utf8_chars);

            let len = to_utf8(self.string_sys(), std::ptr::null_mut(), 0);
            let len = usize::try_from(len).unwrap_or(0);

            let mut buf = vec![0u8; len];
            to_utf8(
                self.string_sys(),
                buf.as_mut_ptr() as *mut c_char,
                len as sys::GDExtensionInt,
            );

            String::from_utf8_lossy(&buf).into_owned()
        }
    }
}

impl Default for GString {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for GString {
    fn clone(&self) -> Self {
        // SAFETY: copy constructor of a valid string.
        unsafe {
            let copy = sys::builtin_lifecycle_api().string_copy;
            Self::new_with_uninit(|uninit| copy(uninit, [self.string_sys()].as_ptr()))
        }
    }
}

impl Drop for GString {
    fn drop(&mut self) {
        if self.opaque.bytes() == &[0; 8] {
            return;
        }

        // SAFETY: the payload was constructed by the engine and is destroyed exactly once.
        unsafe {
            let destroy = sys::builtin_lifecycle_api().string_destroy;
            destroy(self.opaque.as_uninit_ptr());
        }
    }
}

impl From<&str> for GString {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            return Self::new();
        }

        // SAFETY: pointer and length describe valid UTF-8.
        unsafe {
            Self::new_with_uninit(|uninit| {
                sys::interface_fn!(string_new_with_utf8_chars_and_len)(
                    uninit,
                    s.as_ptr() as *const c_char,
                    s.len() as sys::GDExtensionInt,
                )
            })
        }
    }
}

impl From<String> for GString {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<&StringName> for GString {
    fn from(name: &StringName) -> Self {
        // SAFETY: conversion constructor from a valid StringName.
        unsafe {
            let from_name = sys::builtin_lifecycle_api().string_from_string_name;
            Self::new_with_uninit(|uninit| from_name(uninit, [name.string_sys()].as_ptr()))
        }
    }
}

impl From<&GString> for String {
    fn from(s: &GString) -> Self {
        s.to_rust_string()
    }
}

impl fmt::Display for GString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rust_string())
    }
}

impl fmt::Debug for GString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.to_rust_string())
    }
}

impl PartialEq for GString {
    fn eq(&self, other: &Self) -> bool {
        self.to_rust_string() == other.to_rust_string()
    }
}

impl Eq for GString {}

impl PartialEq<&str> for GString {
    fn eq(&self, other: &&str) -> bool {
        self.to_rust_string() == *other
    }
}

impl_string_ffi!(GString, sys::OpaqueString, copy: string_copy, destroy: string_destroy);

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_needs_no_engine() {
        let empty = GString::new();

        assert_eq!(empty.to_string(), "");
        assert_eq!(empty, GString::default());
        assert_eq!(GString::from(""), "");
    }
}

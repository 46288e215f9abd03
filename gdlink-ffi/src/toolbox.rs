/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Functions and macros that are not very specific to gdlink, but come in handy.

use crate as sys;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Macros

/// Verifies a condition at compile time.
#[macro_export]
macro_rules! static_assert {
    ($cond:expr) => {
        const _: () = assert!($cond);
    };
    ($cond:expr, $msg:literal) => {
        const _: () = assert!($cond, $msg);
    };
}

/// Verifies at compile time that two types `T` and `U` have the same size.
#[macro_export]
macro_rules! static_assert_eq_size {
    ($T:ty, $U:ty) => {
        $crate::static_assert!(std::mem::size_of::<$T>() == std::mem::size_of::<$U>());
    };
    ($T:ty, $U:ty, $msg:literal) => {
        $crate::static_assert!(std::mem::size_of::<$T>() == std::mem::size_of::<$U>(), $msg);
    };
}

/// Trace output.
#[cfg(feature = "trace")]
#[macro_export]
macro_rules! out {
    ()                          => (eprintln!());
    ($fmt:literal)              => (eprintln!($fmt));
    ($fmt:literal, $($arg:tt)*) => (eprintln!($fmt, $($arg)*));
}

/// Trace output.
#[cfg(not(feature = "trace"))]
#[macro_export]
macro_rules! out {
    ()                          => ({});
    ($fmt:literal)              => ({ use std::io::{sink, Write}; let _ = write!(sink(), $fmt); });
    ($fmt:literal, $($arg:tt)*) => ({ use std::io::{sink, Write}; let _ = write!(sink(), $fmt, $($arg)*); };)
}

/// Access an engine interface function by name.
///
/// Requires the binding to be initialized; see [`crate::initialize`].
#[macro_export]
macro_rules! interface_fn {
    ($name:ident) => {{
        unsafe { $crate::get_interface().$name }
    }};
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Utility functions

/// Explicitly cast away `const` from a pointer, similar to C++ `const_cast`.
///
/// The `as` conversion simultaneously doing 10 other things, potentially causing unintended transmutations.
pub fn force_mut_ptr<T>(ptr: *const T) -> *mut T {
    ptr as *mut T
}

/// Add `const` to a mut ptr.
pub fn to_const_ptr<T>(ptr: *mut T) -> *const T {
    ptr as *const T
}

/// If `ptr` is not null, returns `Some(mapper(ptr))`; otherwise `None`.
#[inline]
pub fn ptr_then<T, R, F>(ptr: *mut T, mapper: F) -> Option<R>
where
    F: FnOnce(*mut T) -> R,
{
    if ptr.is_null() {
        None
    } else {
        Some(mapper(ptr))
    }
}

/// Returns a C `const char*` for a null-terminated byte string.
#[inline]
pub fn c_str(s: &[u8]) -> *const std::ffi::c_char {
    // Ensure null-terminated
    debug_assert!(!s.is_empty() && s[s.len() - 1] == 0);

    s.as_ptr() as *const std::ffi::c_char
}

/// Converts the engine-reported version into a readable string.
///
/// # Safety
/// `version.string` must be null or point to a valid, null-terminated C string.
pub unsafe fn read_version_string(version: &sys::GDExtensionGodotVersion) -> String {
    let prefix = format!("{}.{}.{}", version.major, version.minor, version.patch);
    if version.string.is_null() {
        return prefix;
    }

    let full = std::ffi::CStr::from_ptr(version.string).to_string_lossy();
    if full.is_empty() {
        prefix
    } else {
        full.into_owned()
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Private helpers

/// Metafunction to extract inner function pointer types from `Option<F>` type aliases in the C header declarations.
pub trait Inner: Sized {
    type FnPtr: Sized;
}

impl<T> Inner for Option<T> {
    type FnPtr = T;
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ptr_then_maps_non_null() {
        let mut value = 7_i32;
        let ptr: *mut i32 = &mut value;

        assert_eq!(ptr_then(ptr, |p| unsafe { *p } * 2), Some(14));
        assert_eq!(ptr_then(std::ptr::null_mut::<i32>(), |_| 0), None);
    }

    #[test]
    fn version_string_falls_back_to_numbers() {
        let version = sys::GDExtensionGodotVersion {
            major: 4,
            minor: 3,
            patch: 1,
            string: std::ptr::null(),
        };
        assert_eq!(unsafe { read_version_string(&version) }, "4.3.1");

        let full = sys::GDExtensionGodotVersion {
            string: c_str(b"Godot Engine v4.3.1.stable\0"),
            ..version
        };
        assert_eq!(
            unsafe { read_version_string(&full) },
            "Godot Engine v4.3.1.stable"
        );
    }
}

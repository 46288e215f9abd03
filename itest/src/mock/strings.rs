/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Engine `String` and `StringName`.
//!
//! Both have an 8-byte payload holding a pointer to a boxed Rust `String`. A null payload is the empty string, which matches
//! the engine's zero-initialized default. Interned names are not needed: `StringName` equality is never decided engine-side
//! by pointer here.

use std::ffi::c_char;
use std::sync::atomic::{AtomicUsize, Ordering};

use gdlink::sys;

static LIVE_STRINGS: AtomicUsize = AtomicUsize::new(0);

/// Number of non-empty engine strings and string names currently allocated.
pub fn live_string_count() -> usize {
    LIVE_STRINGS.load(Ordering::SeqCst)
}

/// Writes a payload for `text` into uninitialized storage.
///
/// # Safety
/// `dest` must point to 8 writable bytes.
pub(super) unsafe fn write_payload(dest: *mut std::ffi::c_void, text: &str) {
    let payload = if text.is_empty() {
        std::ptr::null_mut()
    } else {
        LIVE_STRINGS.fetch_add(1, Ordering::SeqCst);
        Box::into_raw(Box::new(text.to_string()))
    };

    *(dest as *mut *mut String) = payload;
}

/// Reads the text of an initialized payload.
///
/// # Safety
/// `src` must point to a payload written by this module.
pub(super) unsafe fn read_payload(src: *const std::ffi::c_void) -> String {
    let payload = *(src as *const *const String);

    if payload.is_null() {
        String::new()
    } else {
        (*payload).clone()
    }
}

/// # Safety
/// `target` must point to a payload written by this module, which is not used afterwards.
unsafe fn destroy_payload(target: *mut std::ffi::c_void) {
    let slot = target as *mut *mut String;
    let payload = *slot;

    if !payload.is_null() {
        drop(Box::from_raw(payload));
        LIVE_STRINGS.fetch_sub(1, Ordering::SeqCst);
        *slot = std::ptr::null_mut();
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Interface functions

pub(super) unsafe extern "C" fn string_name_new_with_utf8_chars_and_len(
    r_dest: sys::GDExtensionUninitializedStringNamePtr,
    p_contents: *const c_char,
    p_size: sys::GDExtensionInt,
) {
    let text = utf8_from_raw(p_contents, p_size);
    write_payload(r_dest, &text);
}

pub(super) unsafe extern "C" fn string_new_with_utf8_chars_and_len(
    r_dest: sys::GDExtensionUninitializedStringPtr,
    p_contents: *const c_char,
    p_size: sys::GDExtensionInt,
) {
    let text = utf8_from_raw(p_contents, p_size);
    write_payload(r_dest, &text);
}

/// Like the engine: returns the full byte length, but writes at most `p_max_write_length` bytes. No null terminator.
pub(super) unsafe extern "C" fn string_to_utf8_chars(
    p_self: sys::GDExtensionConstStringPtr,
    r_text: *mut c_char,
    p_max_write_length: sys::GDExtensionInt,
) -> sys::GDExtensionInt {
    let text = read_payload(p_self);
    let bytes = text.as_bytes();

    if !r_text.is_null() && p_max_write_length > 0 {
        let count = bytes.len().min(p_max_write_length as usize);
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), r_text as *mut u8, count);
    }

    bytes.len() as sys::GDExtensionInt
}

unsafe fn utf8_from_raw(contents: *const c_char, size: sys::GDExtensionInt) -> String {
    if contents.is_null() || size <= 0 {
        return String::new();
    }

    let bytes = std::slice::from_raw_parts(contents as *const u8, size as usize);
    String::from_utf8_lossy(bytes).into_owned()
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Builtin lifecycle, served through variant_get_ptr_constructor/destructor

/// Both copy and conversion: `String(String)`, `String(StringName)`, `StringName(StringName)`, `StringName(String)`.
pub(super) unsafe extern "C" fn copy_construct(
    p_base: sys::GDExtensionUninitializedTypePtr,
    p_args: *const sys::GDExtensionConstTypePtr,
) {
    let source = *p_args;
    let text = read_payload(source);
    write_payload(p_base, &text);
}

pub(super) unsafe extern "C" fn destroy(p_base: sys::GDExtensionTypePtr) {
    destroy_payload(p_base);
}

pub(super) unsafe extern "C" fn variant_get_ptr_constructor(
    p_type: sys::GDExtensionVariantType,
    p_constructor: i32,
) -> sys::GDExtensionPtrConstructor {
    match (p_type, p_constructor) {
        (sys::GDEXTENSION_VARIANT_TYPE_STRING | sys::GDEXTENSION_VARIANT_TYPE_STRING_NAME, 1 | 2) => {
            Some(copy_construct)
        }
        _ => None,
    }
}

pub(super) unsafe extern "C" fn variant_get_ptr_destructor(
    p_type: sys::GDExtensionVariantType,
) -> sys::GDExtensionPtrDestructor {
    match p_type {
        sys::GDEXTENSION_VARIANT_TYPE_STRING | sys::GDEXTENSION_VARIANT_TYPE_STRING_NAME => Some(destroy),
        _ => None,
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Helpers for method implementations

/// Owned payload for passing a name into an extension callback; destroyed on drop.
pub(super) struct TempName {
    payload: *mut String,
}

impl TempName {
    pub fn new(text: &str) -> Self {
        let mut payload: *mut String = std::ptr::null_mut();

        // SAFETY: payload is a pointer-sized slot.
        unsafe { write_payload(std::ptr::addr_of_mut!(payload) as *mut _, text) };
        Self { payload }
    }

    pub fn as_ptr(&self) -> sys::GDExtensionConstStringNamePtr {
        std::ptr::addr_of!(self.payload) as sys::GDExtensionConstStringNamePtr
    }
}

impl Drop for TempName {
    fn drop(&mut self) {
        // SAFETY: payload was written by write_payload().
        unsafe { destroy_payload(std::ptr::addr_of_mut!(self.payload) as *mut _) };
    }
}

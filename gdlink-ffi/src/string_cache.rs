/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::collections::HashMap;
use std::ffi::c_char;

use crate as sys;
use crate::opaque::OpaqueStringName;

/// Caches engine `StringName` instances for `&'static str` keys.
///
/// Used while registering classes, where the same class, method and constant names are passed many times. Entries are boxed so
/// that returned pointers stay valid while the cache grows; all entries are destroyed when the cache is dropped.
pub struct StringCache<'a> {
    instances_by_str: HashMap<&'static str, Box<OpaqueStringName>>,
    interface: &'a sys::EngineInterface,
    builtin_lifecycle: &'a sys::BuiltinLifecycleTable,
}

impl<'a> StringCache<'a> {
    pub fn new(
        interface: &'a sys::EngineInterface,
        builtin_lifecycle: &'a sys::BuiltinLifecycleTable,
    ) -> Self {
        Self {
            instances_by_str: HashMap::new(),
            interface,
            builtin_lifecycle,
        }
    }

    /// Pointer to the `StringName` for `key`, constructed on first request.
    ///
    /// The pointer is valid until the cache is dropped.
    pub fn fetch(&mut self, key: &'static str) -> sys::GDExtensionConstStringNamePtr {
        let new_fn = self.interface.string_name_new_with_utf8_chars_and_len;

        let opaque = self.instances_by_str.entry(key).or_insert_with(|| {
            let mut sname = Box::new(OpaqueStringName::zeroed());

            // SAFETY: the uninitialized pointer refers to boxed storage of the right size; key pointer/len describe valid UTF-8.
            unsafe {
                new_fn(
                    sname.as_uninit_ptr(),
                    key.as_ptr() as *const c_char,
                    key.len() as sys::GDExtensionInt,
                );
            }

            sname
        });

        opaque.as_type_ptr()
    }

    pub fn len(&self) -> usize {
        self.instances_by_str.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances_by_str.is_empty()
    }
}

impl Drop for StringCache<'_> {
    fn drop(&mut self) {
        let destroy = self.builtin_lifecycle.string_name_destroy;

        for (_, mut opaque) in self.instances_by_str.drain() {
            // SAFETY: every entry was constructed by the engine in `fetch()` and is destroyed exactly once.
            unsafe { destroy(opaque.as_uninit_ptr()) };
        }
    }
}

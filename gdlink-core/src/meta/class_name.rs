/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::sys;
use sys::Global;

// Engine StringNames for all `&'static str` names used in calls: class names, method names, registration names.
// Lazily filled, because the binding may not be initialized yet when a name is declared.
static STATIC_STRING_NAMES: Global<StaticStringNames> = Global::default();

#[derive(Default)]
struct StaticStringNames {
    cache: Option<sys::StringCache<'static>>,
}

// SAFETY: the cache is only touched from the thread that owns the binding (main thread); the Global mutex serializes access.
unsafe impl Send for StaticStringNames {}

/// Pointer to the engine `StringName` for `name`, valid until [`cleanup()`].
///
/// # Panics
/// If the binding is not initialized.
pub(crate) fn static_string_name(name: &'static str) -> sys::GDExtensionConstStringNamePtr {
    assert!(
        sys::is_initialized(),
        "engine binding not initialized; cannot create StringName for `{name}`"
    );

    let mut names = STATIC_STRING_NAMES.lock();
    let cache = names.cache.get_or_insert_with(|| {
        // SAFETY: binding initialized (checked above) and lives for the rest of the process.
        unsafe { sys::StringCache::new(sys::get_interface(), sys::builtin_lifecycle_api()) }
    });

    // Entries are boxed and never removed before cleanup(), so the pointer outlives the guard.
    cache.fetch(name)
}

/// Destroys all cached StringNames.
///
/// # Safety
/// Must not use any `ClassName` or method bind APIs after this call. Called when the extension is unloaded.
pub(crate) unsafe fn cleanup() {
    let cache = STATIC_STRING_NAMES.lock().cache.take();
    if let Some(cache) = cache {
        sys::out!("Destroy {} cached StringNames", cache.len());
        drop(cache);
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

/// Name of a class registered with the engine.
///
/// Cheap to copy and compare; the engine `StringName` is created on first use of [`string_sys()`](Self::string_sys).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ClassName {
    name: &'static str,
}

impl ClassName {
    #[doc(hidden)]
    pub const fn from_static(name: &'static str) -> Self {
        Self { name }
    }

    /// Name of the absent base class of `Object`.
    pub const fn none() -> Self {
        Self { name: "" }
    }

    pub const fn as_str(&self) -> &'static str {
        self.name
    }

    pub fn is_none(&self) -> bool {
        self.name.is_empty()
    }

    /// Pointer to the cached engine `StringName`.
    #[doc(hidden)]
    pub fn string_sys(&self) -> sys::GDExtensionConstStringNamePtr {
        static_string_name(self.name)
    }

    /// Engine class tag, as used by `object_cast_to`.
    pub(crate) fn class_tag(&self) -> *mut std::ffi::c_void {
        // SAFETY: string_sys() asserts that the binding is initialized.
        unsafe { sys::interface_fn!(classdb_get_class_tag)(self.string_sys()) }
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Debug for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "ClassName(none)")
        } else {
            write!(f, "ClassName({:?})", self.name)
        }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_name_without_engine() {
        let node = ClassName::from_static("Node");

        assert_eq!(node.as_str(), "Node");
        assert_eq!(node.to_string(), "Node");
        assert_eq!(format!("{node:?}"), "ClassName(\"Node\")");
        assert!(!node.is_none());

        assert!(ClassName::none().is_none());
        assert_eq!(format!("{:?}", ClassName::none()), "ClassName(none)");
    }
}

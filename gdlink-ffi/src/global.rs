/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard};

/// Lazily initialized, mutex-protected global.
///
/// Used for registries that are filled during class registration and read during callbacks (loaded classes, the engine
/// class table, cached method binds). The initialization function is given in the `const` constructor, so the type fits
/// in a `static` without an `Option` layer:
///
/// ```
/// # use gdlink_ffi::Global;
/// static NAMES: Global<Vec<&'static str>> = Global::default();
///
/// NAMES.lock().push("Node");
/// assert_eq!(NAMES.lock().len(), 1);
/// ```
///
/// If the initialization function panics, the global is poisoned: every later `lock()` panics as well.
pub struct Global<T> {
    value: Mutex<InitState<T>>,
}

impl<T> Global<T> {
    /// Create a global whose value is produced by `init_fn` on first access.
    pub const fn new(init_fn: fn() -> T) -> Self {
        Self {
            value: Mutex::new(InitState::Pending(init_fn)),
        }
    }

    /// Create a global initialized with `T::default()`.
    ///
    /// Inherent, since `Default::default()` cannot be called in `const` context.
    pub const fn default() -> Self
    where
        T: Default,
    {
        Self::new(T::default)
    }

    /// Blocks until the value is available and returns a guard to it.
    ///
    /// # Panics
    /// If initialization panics now or has panicked before.
    pub fn lock(&self) -> GlobalGuard<'_, T> {
        let mut guard = self.value.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let init_fn = match &*guard {
            InitState::Initialized(_) => return GlobalGuard { guard },
            InitState::Failed => panic!("previous Global<T> initialization failed due to panic"),
            InitState::Pending(init_fn) => *init_fn,
        };

        // Mark as failed first: if `init_fn` unwinds, the state stays failed.
        *guard = InitState::Failed;
        let value = init_fn();
        *guard = InitState::Initialized(value);

        GlobalGuard { guard }
    }

    /// Returns `true` if the value has been initialized.
    pub fn is_initialized(&self) -> bool {
        let guard = self.value.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        matches!(*guard, InitState::Initialized(_))
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Guards

/// Exclusive access to the value of a [`Global`].
pub struct GlobalGuard<'a, T> {
    guard: MutexGuard<'a, InitState<T>>,
}

impl<T> Deref for GlobalGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        match &*self.guard {
            InitState::Initialized(value) => value,
            _ => unreachable!("GlobalGuard exists only for initialized values"),
        }
    }
}

impl<T> DerefMut for GlobalGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match &mut *self.guard {
            InitState::Initialized(value) => value,
            _ => unreachable!("GlobalGuard exists only for initialized values"),
        }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Internals

enum InitState<T> {
    Initialized(T),
    Pending(fn() -> T),
    Failed,
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    static MAP: Global<HashMap<i32, &'static str>> = Global::default();
    static TAGS: Global<Vec<&'static str>> = Global::new(|| vec!["Object", "RefCounted"]);
    static BROKEN: Global<Vec<i32>> = Global::new(|| panic!("init failure"));

    #[test]
    fn map_accumulates_across_locks() {
        MAP.lock().insert(2, "two");
        MAP.lock().insert(1, "one");

        let map = MAP.lock();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&1), Some(&"one"));
    }

    #[test]
    fn init_fn_runs_lazily() {
        assert!(!TAGS.is_initialized());

        TAGS.lock().push("Node");
        assert!(TAGS.is_initialized());
        assert_eq!(*TAGS.lock(), ["Object", "RefCounted", "Node"]);
    }

    #[test]
    fn failed_init_poisons_global() {
        let first = std::panic::catch_unwind(|| BROKEN.lock().len());
        assert!(first.is_err());

        let second = std::panic::catch_unwind(|| BROKEN.lock().len());
        assert!(second.is_err());
        assert!(!BROKEN.is_initialized());
    }
}

/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Non-thread safe binding storage.
//!
//! If used from different threads then there will be runtime errors in debug mode and UB in release mode.

use std::cell::OnceCell;
use std::sync::OnceLock;
use std::thread::ThreadId;

use super::GodotBinding;

pub(super) struct BindingStorage {
    // Is used to check that we've been called from the right thread, so must be thread-safe to access.
    main_thread: OnceLock<ThreadId>,
    binding: OnceCell<GodotBinding>,
}

impl BindingStorage {
    /// Get the static binding storage.
    ///
    /// # Safety
    ///
    /// You must not access `binding` from a thread different than the thread [`initialize`](BindingStorage::initialize) was first called from.
    #[inline(always)]
    unsafe fn storage() -> &'static Self {
        static BINDING: BindingStorage = BindingStorage {
            main_thread: OnceLock::new(),
            binding: OnceCell::new(),
        };

        &BINDING
    }

    /// Initialize the binding storage, this must be called before any other public functions.
    ///
    /// Returns `None` if the storage was already initialized.
    #[must_use]
    pub fn initialize(binding: GodotBinding) -> Option<()> {
        // SAFETY: Either we are the first call to `initialize` and so we are calling from the same thread as ourself. Or we are a later call,
        // in which case we can tell that the storage has been initialized and don't access `binding`.
        let storage = unsafe { Self::storage() };

        storage.main_thread.set(std::thread::current().id()).ok()?;
        storage.binding.set(binding).ok()
    }

    /// Get the binding from the binding storage.
    ///
    /// # Safety
    /// - Must be called from the main thread.
    /// - The binding must be initialized.
    #[inline(always)]
    pub unsafe fn get_binding_unchecked() -> &'static GodotBinding {
        let storage = Self::storage();

        if cfg!(debug_assertions) {
            let main_thread = storage.main_thread.get().expect(
                "engine not available; make sure you are not calling it from unit/doc tests",
            );
            assert_eq!(
                main_thread,
                &std::thread::current().id(),
                "attempted to access binding from different thread than main thread; this is UB - use the \"experimental-threads\" feature."
            );

            storage
                .binding
                .get()
                .expect("main thread recorded, but binding not stored")
        } else {
            // SAFETY: This function can only be called when the binding is initialized and from the main thread, so we know that it's initialized.
            storage.binding.get().unwrap_unchecked()
        }
    }

    pub fn is_initialized() -> bool {
        // SAFETY: We do not access `binding`.
        let storage = unsafe { Self::storage() };
        storage.main_thread.get().is_some()
    }
}

// SAFETY: We ensure that `binding` is only ever accessed from the same thread that initialized it.
unsafe impl Sync for BindingStorage {}
// SAFETY: We ensure that `binding` is only ever accessed from the same thread that initialized it.
unsafe impl Send for BindingStorage {}

// ----------------------------------------------------------------------------------------------------------------------------------------------

/// Runtime configuration, decided once during extension initialization.
pub struct GdextConfig {
    /// Whether classes marked as `tool` are the only ones running inside the editor.
    pub tool_only_in_editor: bool,
    is_editor: OnceCell<bool>,
}

impl GdextConfig {
    pub fn new(tool_only_in_editor: bool) -> Self {
        Self {
            tool_only_in_editor,
            is_editor: OnceCell::new(),
        }
    }

    /// Returns whether the engine runs as editor, evaluating `is_editor` on first query.
    pub fn is_editor_or_init(&self, is_editor: impl FnOnce() -> bool) -> bool {
        *self.is_editor.get_or_init(is_editor)
    }
}

/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Thread safe binding storage.
//!
//! This can be used from different threads without issue, as late initialization is synchronized through `OnceLock`.
//!
//! The user of these structs and functions must still ensure that multi-threaded usage of the various pointers is safe.

use std::sync::OnceLock;

use super::GodotBinding;

pub(super) struct BindingStorage {
    binding: OnceLock<GodotBinding>,
}

impl BindingStorage {
    #[inline(always)]
    fn storage() -> &'static Self {
        static BINDING: BindingStorage = BindingStorage {
            binding: OnceLock::new(),
        };

        &BINDING
    }

    /// Initialize the binding storage, this must be called before any other public functions.
    ///
    /// Returns `None` if the storage was already initialized.
    #[must_use]
    pub fn initialize(binding: GodotBinding) -> Option<()> {
        Self::storage().binding.set(binding).ok()
    }

    /// Get the binding from the binding storage.
    ///
    /// # Safety
    ///
    /// - The binding must be initialized.
    #[inline(always)]
    pub unsafe fn get_binding_unchecked() -> &'static GodotBinding {
        let storage = Self::storage();

        debug_assert!(
            storage.binding.get().is_some(),
            "engine not available; make sure you are not calling it from unit/doc tests"
        );

        // SAFETY: The binding has been initialized before calling this method.
        storage.binding.get().unwrap_unchecked()
    }

    pub fn is_initialized() -> bool {
        Self::storage().binding.get().is_some()
    }
}

/// Runtime configuration, decided once during extension initialization.
pub struct GdextConfig {
    /// Whether classes marked as `tool` are the only ones running inside the editor.
    pub tool_only_in_editor: bool,
    is_editor: OnceLock<bool>,
}

impl GdextConfig {
    pub fn new(tool_only_in_editor: bool) -> Self {
        Self {
            tool_only_in_editor,
            is_editor: OnceLock::new(),
        }
    }

    /// Returns whether the engine runs as editor, evaluating `is_editor` on first query.
    pub fn is_editor_or_init(&self, is_editor: impl FnOnce() -> bool) -> bool {
        *self.is_editor.get_or_init(is_editor)
    }
}

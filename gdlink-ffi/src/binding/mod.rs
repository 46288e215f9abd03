/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::interface::{BuiltinLifecycleTable, EngineInterface, InitError};
use crate::GDExtensionClassLibraryPtr;

#[cfg(feature = "experimental-threads")]
mod multi_threaded;
#[cfg(not(feature = "experimental-threads"))]
mod single_threaded;

#[cfg(feature = "experimental-threads")]
use multi_threaded::BindingStorage;
#[cfg(not(feature = "experimental-threads"))]
use single_threaded::BindingStorage;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Public re-exports

#[cfg(feature = "experimental-threads")]
pub use multi_threaded::GdextConfig;
#[cfg(not(feature = "experimental-threads"))]
pub use single_threaded::GdextConfig;

// Note, this is `Sync` and `Send` when "experimental-threads" is enabled because all its fields are. We have avoided implementing `Sync`
// and `Send` for `GodotBinding` as that could hide issues if any of the field types are changed to no longer be sync/send.
pub(crate) struct GodotBinding {
    interface: EngineInterface,
    library: ClassLibraryPtr,
    builtin_lifecycle: BuiltinLifecycleTable,
    config: GdextConfig,
}

/// Newtype around `GDExtensionClassLibraryPtr` so we can implement `Sync` and `Send` manually for this.
struct ClassLibraryPtr(GDExtensionClassLibraryPtr);

// SAFETY: This does not make reading from or writing to the pointer thread-safe. It only allows sharing the pointer value itself;
// any place that dereferences it must ensure thread-safe usage, which requires `unsafe` anyway.
unsafe impl Sync for ClassLibraryPtr {}
// SAFETY: See `Sync` impl safety doc.
unsafe impl Send for ClassLibraryPtr {}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Public API

/// Loads the engine interface and stores it for the rest of the process lifetime.
///
/// # Safety
///
/// - `get_proc_address` and `library` must be the values passed by the engine to the extension entry point (or compatible).
/// - Must not be called concurrently with other functions that interact with the binding.
pub unsafe fn initialize(
    get_proc_address: crate::GDExtensionInterfaceGetProcAddress,
    library: GDExtensionClassLibraryPtr,
    config: GdextConfig,
) -> Result<(), InitError> {
    if is_initialized() {
        return Err(InitError::AlreadyInitialized);
    }

    let interface = EngineInterface::load(get_proc_address)?;
    let builtin_lifecycle = BuiltinLifecycleTable::load(&interface)?;

    let version = crate::interface::runtime_version(&interface);
    crate::out!(
        "Initialize gdlink binding for engine {}",
        crate::toolbox::read_version_string(&version)
    );

    let binding = GodotBinding {
        interface,
        library: ClassLibraryPtr(library),
        builtin_lifecycle,
        config,
    };

    BindingStorage::initialize(binding).ok_or(InitError::AlreadyInitialized)
}

/// # Safety
///
/// The binding must have been initialized before calling this function.
///
/// If "experimental-threads" is not enabled, then this must be called from the same thread that the binding was initialized from.
#[inline(always)]
pub unsafe fn get_interface() -> &'static EngineInterface {
    &get_binding().interface
}

/// # Safety
///
/// The binding must have been initialized before calling this function.
///
/// If "experimental-threads" is not enabled, then this must be called from the same thread that the binding was initialized from.
#[inline(always)]
pub unsafe fn get_library() -> GDExtensionClassLibraryPtr {
    get_binding().library.0
}

/// # Safety
///
/// The binding must have been initialized before calling this function.
///
/// If "experimental-threads" is not enabled, then this must be called from the same thread that the binding was initialized from.
#[inline(always)]
pub unsafe fn builtin_lifecycle_api() -> &'static BuiltinLifecycleTable {
    &get_binding().builtin_lifecycle
}

/// # Safety
///
/// The binding must have been initialized before calling this function.
///
/// If "experimental-threads" is not enabled, then this must be called from the same thread that the binding was initialized from.
#[inline]
pub unsafe fn config() -> &'static GdextConfig {
    &get_binding().config
}

#[inline]
pub fn is_initialized() -> bool {
    BindingStorage::is_initialized()
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Crate-local implementation

/// # Safety
///
/// The binding must have been initialized before calling this function.
///
/// If "experimental-threads" is not enabled, then this must be called from the same thread that the binding was initialized from.
#[inline(always)]
unsafe fn get_binding() -> &'static GodotBinding {
    BindingStorage::get_binding_unchecked()
}

/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::sync::atomic::{AtomicBool, Ordering::Relaxed};

use crate::{godot_error, out, sys};

/// Stage of the engine's initialization, for [`ExtensionLibrary`] hooks.
pub type InitLevel = sys::InitLevel;

pub use sys::InitStage;

#[doc(hidden)]
#[deny(unsafe_op_in_unsafe_fn)]
pub unsafe fn __gdext_load_library<E: ExtensionLibrary>(
    get_proc_address: sys::GDExtensionInterfaceGetProcAddress,
    library: sys::GDExtensionClassLibraryPtr,
    init: *mut sys::GDExtensionInitialization,
) -> sys::GDExtensionBool {
    let init_code = || {
        let tool_only_in_editor = match E::editor_run_behavior() {
            EditorRunBehavior::ToolClassesOnly => true,
            EditorRunBehavior::AllClasses => false,
        };

        let config = sys::GdextConfig::new(tool_only_in_editor);

        // SAFETY: arguments are the ones the engine passed to the entry point.
        if let Err(err) = unsafe { sys::initialize(get_proc_address, library, config) } {
            // Engine print functions may be missing; stderr is always there.
            eprintln!("gdlink: failed to load GDExtension interface: {err}");
            return sys::GDEXTENSION_FALSE;
        }

        let godot_init_params = sys::GDExtensionInitialization {
            minimum_initialization_level: E::min_level().to_sys(),
            userdata: std::ptr::null_mut(),
            initialize: Some(ffi_initialize_layer::<E>),
            deinitialize: Some(ffi_deinitialize_layer::<E>),
        };

        // SAFETY: the engine passes a valid pointer to write the initialization struct to.
        unsafe { *init = godot_init_params };

        sys::GDEXTENSION_TRUE
    };

    let ctx = || "error when loading GDExtension library";
    let is_success = crate::private::handle_panic(ctx, init_code);

    is_success.unwrap_or(sys::GDEXTENSION_FALSE)
}

static LEVEL_SERVERS_CORE_LOADED: AtomicBool = AtomicBool::new(false);

unsafe extern "C" fn ffi_initialize_layer<E: ExtensionLibrary>(
    _userdata: *mut std::ffi::c_void,
    init_level: sys::GDExtensionInitializationLevel,
) {
    let level = InitLevel::from_sys(init_level);
    let ctx = || format!("failed to initialize GDExtension level `{level:?}`");

    fn try_load<E: ExtensionLibrary>(level: InitLevel) {
        // Workaround for engines that skip Core and Servers when the extension is loaded late: catch up on them once.
        if level == InitLevel::Scene {
            if !LEVEL_SERVERS_CORE_LOADED.load(Relaxed) {
                try_load::<E>(InitLevel::Core);
                try_load::<E>(InitLevel::Servers);
            }
        } else if level == InitLevel::Core {
            // Regular load order; Servers follows.
            LEVEL_SERVERS_CORE_LOADED.store(true, Relaxed);
        }

        gdext_on_level_init(level);
        E::on_level_init(level);
    }

    let _ = crate::private::handle_panic(ctx, || {
        try_load::<E>(level);
    });
}

unsafe extern "C" fn ffi_deinitialize_layer<E: ExtensionLibrary>(
    _userdata: *mut std::ffi::c_void,
    init_level: sys::GDExtensionInitializationLevel,
) {
    let level = InitLevel::from_sys(init_level);
    let ctx = || format!("failed to deinitialize GDExtension level `{level:?}`");

    let _ = crate::private::handle_panic(ctx, || {
        if level == InitLevel::Core {
            // Once the CORE api is unloaded, reset the flag to initial state.
            LEVEL_SERVERS_CORE_LOADED.store(false, Relaxed);
        }

        E::on_level_deinit(level);
        gdext_on_level_deinit(level);
    });
}

/// Tasks needed to be done by gdlink internally upon loading an initialization level. Called before user code.
fn gdext_on_level_init(level: InitLevel) {
    out!("gdext_on_level_init: {level:?}");

    if level == InitLevel::Scene {
        check_engine_version();
    }

    crate::registry::class::auto_register_classes(level);
}

/// Tasks needed to be done by gdlink internally upon unloading an initialization level. Called after user code.
fn gdext_on_level_deinit(level: InitLevel) {
    out!("gdext_on_level_deinit: {level:?}");

    crate::registry::class::unregister_classes(level);

    if level == InitLevel::Core {
        // SAFETY: no engine objects or cached names are used after the Core level is unloaded.
        unsafe { crate::meta::cleanup_string_names() };
    }
}

/// Warns if the running engine is older than the API the classes were generated from.
fn check_engine_version() {
    // SAFETY: binding is initialized before any level is loaded.
    let version = unsafe { sys::runtime_version(sys::get_interface()) };
    let (major, minor) = crate::classes::API_VERSION;

    out!("Engine version: {}.{}.{}", version.major, version.minor, version.patch);

    if (version.major, version.minor) < (major, minor) {
        godot_error!(
            "engine {}.{} is older than the API gdlink was generated for ({major}.{minor}); some method binds may be missing",
            version.major,
            version.minor
        );
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

/// Defines the entry point for a GDExtension Rust library.
///
/// Every library should have exactly one implementation of this trait. It is always used in combination with the
/// [`gdextension_entry!`][crate::gdextension_entry] macro, which exports the symbol the engine looks up.
///
/// ```no_run
/// # use gdlink::prelude::*;
/// struct MyExtension;
///
/// unsafe impl ExtensionLibrary for MyExtension {}
///
/// gdextension_entry!(MyExtension, gdext_rust_init);
/// ```
///
/// # Safety
/// The library must not be loaded twice by the engine; the binding is process-wide.
pub unsafe trait ExtensionLibrary {
    /// Determines if and how an extension's code is run in the editor.
    fn editor_run_behavior() -> EditorRunBehavior {
        EditorRunBehavior::ToolClassesOnly
    }

    /// Determines the initialization level at which the extension is loaded (`Scene` by default).
    ///
    /// If the level is lower than [`InitLevel::Scene`], the engine needs to be restarted to apply changes to the library.
    fn min_level() -> InitLevel {
        InitLevel::Scene
    }

    /// Custom logic when a certain init-level of the engine is loaded.
    ///
    /// This will only be invoked for levels >= [`Self::min_level()`], in ascending order. Use `if` or `match` to hook to specific levels.
    #[allow(unused_variables)]
    fn on_level_init(level: InitLevel) {
        // Nothing by default.
    }

    /// Custom logic when a certain init-level of the engine is unloaded.
    ///
    /// This will only be invoked for levels >= [`Self::min_level()`], in descending order. Use `if` or `match` to hook to specific levels.
    #[allow(unused_variables)]
    fn on_level_deinit(level: InitLevel) {
        // Nothing by default.
    }
}

/// Determines if and how an extension's code is run in the editor.
///
/// By default, the engine runs all registered classes in the editor, which can lead to unwanted side effects. This setting only
/// runs classes marked `#[class(tool)]` there.
#[derive(Copy, Clone, Debug)]
#[non_exhaustive]
pub enum EditorRunBehavior {
    /// Only runs `#[class(tool)]` classes in the editor.
    ToolClassesOnly,

    /// Runs all classes in the editor, like native engine classes.
    AllClasses,
}

/// Exports the C entry point that the engine calls when loading the library.
///
/// The symbol name must match the `entry_symbol` in the library's `.gdextension` file.
#[macro_export]
macro_rules! gdextension_entry {
    ($Library:ty, $entry_symbol:ident) => {
        #[no_mangle]
        unsafe extern "C" fn $entry_symbol(
            get_proc_address: $crate::sys::GDExtensionInterfaceGetProcAddress,
            library: $crate::sys::GDExtensionClassLibraryPtr,
            init: *mut $crate::sys::GDExtensionInitialization,
        ) -> $crate::sys::GDExtensionBool {
            $crate::init::__gdext_load_library::<$Library>(get_proc_address, library, init)
        }
    };
}

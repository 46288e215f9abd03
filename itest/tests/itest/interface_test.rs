/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::ffi::{c_char, CStr, CString};

use gdlink::init::InitLevel;
use gdlink::sys;
use itest::{itest, mock};

/// Behaves like the engine, except that `classdb_get_method_bind` is unavailable.
unsafe extern "C" fn get_proc_address_without_method_bind(
    name: *const c_char,
) -> sys::GDExtensionInterfaceFunctionPtr {
    if CStr::from_ptr(name).to_bytes() == b"classdb_get_method_bind" {
        return None;
    }

    mock::get_proc_address(name)
}

itest! {
    fn interface_functions_are_provided() {
        for name in sys::EngineInterface::FUNCTION_NAMES {
            let c_name = CString::new(*name).expect("function names are valid C strings");

            // SAFETY: c_name is a valid C string.
            let function = unsafe { mock::get_proc_address(c_name.as_ptr()) };
            assert!(function.is_some(), "engine does not provide `{name}`");
        }
    }
}

itest! {
    fn interface_missing_function_is_reported() {
        // SAFETY: the lookup function returns functions with the signatures belonging to their names.
        let result = unsafe { sys::EngineInterface::load(Some(get_proc_address_without_method_bind)) };

        match result {
            Err(err) => {
                assert_eq!(err, sys::InitError::MissingFunction("classdb_get_method_bind"));
                assert_eq!(
                    err.to_string(),
                    "engine does not provide interface function `classdb_get_method_bind`"
                );
            }
            Ok(_) => panic!("interface loaded without classdb_get_method_bind"),
        }

        // SAFETY: see above.
        let no_lookup = unsafe { sys::EngineInterface::load(None) };
        assert!(matches!(no_lookup, Err(sys::InitError::MissingFunction("get_proc_address"))));
    }
}

itest! {
    fn interface_reports_engine_version() {
        assert!(sys::is_initialized());

        // SAFETY: binding is initialized, on the main thread.
        let version = unsafe { sys::runtime_version(sys::get_interface()) };
        let (major, minor, patch) = mock::VERSION;

        assert_eq!((version.major, version.minor, version.patch), (major, minor, patch));

        // SAFETY: the version string is provided by the engine and null-terminated.
        let text = unsafe { sys::read_version_string(&version) };
        assert!(text.starts_with("Godot Engine v4.2.2"), "{text}");
    }
}

itest! {
    fn interface_levels_initialized_in_order() {
        let log = crate::LEVEL_LOG.lock().unwrap().clone();

        assert_eq!(
            log,
            [
                (true, InitLevel::Core),
                (true, InitLevel::Servers),
                (true, InitLevel::Scene),
                (true, InitLevel::Editor),
            ]
        );
        assert_eq!(mock::extension_minimum_level(), Some(InitLevel::Core));
    }
}

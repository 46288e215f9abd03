/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Engine function table, loaded through `get_proc_address`.
//!
//! The extension entry point receives a single `get_proc_address` function pointer; every other GDExtension function is
//! looked up by name. [`EngineInterface::load()`] resolves all functions up front, so a missing one is reported once during
//! initialization instead of on first use.

use std::ffi::c_char;
use std::fmt;

use crate as sys;
use crate::toolbox::Inner;

/// Error while loading the engine interface or the builtin lifecycle table.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum InitError {
    /// `get_proc_address` returned null for this function name.
    MissingFunction(&'static str),

    /// A builtin constructor or destructor could not be fetched.
    MissingBuiltin(&'static str),

    /// The binding has already been initialized in this process.
    AlreadyInitialized,
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFunction(name) => {
                write!(f, "engine does not provide interface function `{name}`")
            }
            Self::MissingBuiltin(what) => {
                write!(f, "engine does not provide builtin lifecycle function for {what}")
            }
            Self::AlreadyInitialized => write!(f, "GDExtension binding is already initialized"),
        }
    }
}

impl std::error::Error for InitError {}

// ----------------------------------------------------------------------------------------------------------------------------------------------

macro_rules! engine_interface {
    (
        $(
            $(#[$attr:meta])*
            $name:ident: $FnPtr:ty;
        )*
    ) => {
        /// Function table of the GDExtension interface, restricted to the functions gdlink uses.
        ///
        /// Fields are non-nullable function pointers; nullability is resolved in [`EngineInterface::load()`].
        #[derive(Copy, Clone)]
        pub struct EngineInterface {
            $(
                $(#[$attr])*
                pub $name: <$FnPtr as Inner>::FnPtr,
            )*
        }

        impl EngineInterface {
            /// Resolves every function by name.
            ///
            /// # Safety
            /// `get_proc_address` must be the pointer handed to the extension entry point by the engine (or a compatible
            /// implementation). Returned function pointers are trusted to have the signature belonging to their name.
            pub unsafe fn load(
                get_proc_address: sys::GDExtensionInterfaceGetProcAddress,
            ) -> Result<Self, InitError> {
                let get_proc_address =
                    get_proc_address.ok_or(InitError::MissingFunction("get_proc_address"))?;

                Ok(Self {
                    $(
                        $name: {
                            let c_name = concat!(stringify!($name), "\0");
                            let raw = get_proc_address(c_name.as_ptr() as *const c_char)
                                .ok_or(InitError::MissingFunction(stringify!($name)))?;

                            // SAFETY: the engine returns the function registered under this name; see C header for signature.
                            std::mem::transmute::<unsafe extern "C" fn(), <$FnPtr as Inner>::FnPtr>(raw)
                        },
                    )*
                })
            }

            /// Names of all functions in the table, in declaration order.
            pub const FUNCTION_NAMES: &'static [&'static str] = &[ $( stringify!($name), )* ];
        }
    };
}

engine_interface! {
    get_godot_version: sys::GDExtensionInterfaceGetGodotVersion;

    print_error: sys::GDExtensionInterfacePrintError;
    print_warning: sys::GDExtensionInterfacePrintWarning;
    print_script_error: sys::GDExtensionInterfacePrintScriptError;

    string_name_new_with_utf8_chars_and_len: sys::GDExtensionInterfaceStringNameNewWithUtf8CharsAndLen;
    string_new_with_utf8_chars_and_len: sys::GDExtensionInterfaceStringNewWithUtf8CharsAndLen;
    string_to_utf8_chars: sys::GDExtensionInterfaceStringToUtf8Chars;
    variant_get_ptr_constructor: sys::GDExtensionInterfaceVariantGetPtrConstructor;
    variant_get_ptr_destructor: sys::GDExtensionInterfaceVariantGetPtrDestructor;

    classdb_construct_object: sys::GDExtensionInterfaceClassdbConstructObject;
    classdb_get_method_bind: sys::GDExtensionInterfaceClassdbGetMethodBind;
    classdb_get_class_tag: sys::GDExtensionInterfaceClassdbGetClassTag;
    classdb_register_extension_class2: sys::GDExtensionInterfaceClassdbRegisterExtensionClass2;
    classdb_register_extension_class_integer_constant: sys::GDExtensionInterfaceClassdbRegisterExtensionClassIntegerConstant;
    classdb_unregister_extension_class: sys::GDExtensionInterfaceClassdbUnregisterExtensionClass;

    object_method_bind_ptrcall: sys::GDExtensionInterfaceObjectMethodBindPtrcall;
    object_destroy: sys::GDExtensionInterfaceObjectDestroy;
    object_get_instance_id: sys::GDExtensionInterfaceObjectGetInstanceId;
    object_get_instance_from_id: sys::GDExtensionInterfaceObjectGetInstanceFromId;
    object_cast_to: sys::GDExtensionInterfaceObjectCastTo;
    object_set_instance: sys::GDExtensionInterfaceObjectSetInstance;
    object_get_class_name: sys::GDExtensionInterfaceObjectGetClassName;
    object_get_instance_binding: sys::GDExtensionInterfaceObjectGetInstanceBinding;
    object_set_instance_binding: sys::GDExtensionInterfaceObjectSetInstanceBinding;

    global_get_singleton: sys::GDExtensionInterfaceGlobalGetSingleton;

    editor_add_plugin: sys::GDExtensionInterfaceEditorAddPlugin;
    editor_remove_plugin: sys::GDExtensionInterfaceEditorRemovePlugin;
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Builtin lifecycle

type PtrConstructor = <sys::GDExtensionPtrConstructor as Inner>::FnPtr;
type PtrDestructor = <sys::GDExtensionPtrDestructor as Inner>::FnPtr;

// Constructor indices as listed in extension_api.json, "builtin_classes" -> "constructors".
const STRING_FROM_STRING: i32 = 1;
const STRING_FROM_STRING_NAME: i32 = 2;
const STRING_NAME_FROM_STRING_NAME: i32 = 1;
const STRING_NAME_FROM_STRING: i32 = 2;

/// Constructors and destructors of the builtin types the runtime owns (`String`, `StringName`).
#[derive(Copy, Clone)]
pub struct BuiltinLifecycleTable {
    pub string_copy: PtrConstructor,
    pub string_from_string_name: PtrConstructor,
    pub string_destroy: PtrDestructor,
    pub string_name_copy: PtrConstructor,
    pub string_name_from_string: PtrConstructor,
    pub string_name_destroy: PtrDestructor,
}

impl BuiltinLifecycleTable {
    /// # Safety
    /// `interface` must have been loaded from a valid `get_proc_address`.
    pub unsafe fn load(interface: &EngineInterface) -> Result<Self, InitError> {
        let ctor = |ty, index, what| {
            (interface.variant_get_ptr_constructor)(ty, index).ok_or(InitError::MissingBuiltin(what))
        };
        let dtor = |ty, what| {
            (interface.variant_get_ptr_destructor)(ty).ok_or(InitError::MissingBuiltin(what))
        };

        Ok(Self {
            string_copy: ctor(
                sys::GDEXTENSION_VARIANT_TYPE_STRING,
                STRING_FROM_STRING,
                "String(String)",
            )?,
            string_from_string_name: ctor(
                sys::GDEXTENSION_VARIANT_TYPE_STRING,
                STRING_FROM_STRING_NAME,
                "String(StringName)",
            )?,
            string_destroy: dtor(sys::GDEXTENSION_VARIANT_TYPE_STRING, "~String")?,
            string_name_copy: ctor(
                sys::GDEXTENSION_VARIANT_TYPE_STRING_NAME,
                STRING_NAME_FROM_STRING_NAME,
                "StringName(StringName)",
            )?,
            string_name_from_string: ctor(
                sys::GDEXTENSION_VARIANT_TYPE_STRING_NAME,
                STRING_NAME_FROM_STRING,
                "StringName(String)",
            )?,
            string_name_destroy: dtor(sys::GDEXTENSION_VARIANT_TYPE_STRING_NAME, "~StringName")?,
        })
    }
}

/// Reads the version string reported by the engine.
///
/// # Safety
/// `interface` must have been loaded from a valid `get_proc_address`.
pub unsafe fn runtime_version(interface: &EngineInterface) -> sys::GDExtensionGodotVersion {
    let mut version = std::mem::MaybeUninit::<sys::GDExtensionGodotVersion>::zeroed();
    (interface.get_godot_version)(version.as_mut_ptr());

    version.assume_init()
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    unsafe extern "C" fn no_functions(_name: *const c_char) -> sys::GDExtensionInterfaceFunctionPtr {
        None
    }

    #[test]
    fn load_reports_first_missing_function() {
        let err = unsafe { EngineInterface::load(Some(no_functions)) }
            .err()
            .expect("loading must fail without functions");

        assert_eq!(err, InitError::MissingFunction("get_godot_version"));
        assert_eq!(
            err.to_string(),
            "engine does not provide interface function `get_godot_version`"
        );
    }

    #[test]
    fn load_rejects_null_get_proc_address() {
        let err = unsafe { EngineInterface::load(None) }.err();
        assert_eq!(err, Some(InitError::MissingFunction("get_proc_address")));
    }

    #[test]
    fn function_names_are_unique() {
        let mut names = EngineInterface::FUNCTION_NAMES.to_vec();
        names.sort_unstable();
        names.dedup();

        assert_eq!(names.len(), EngineInterface::FUNCTION_NAMES.len());
        assert!(names.contains(&"object_method_bind_ptrcall"));
    }
}

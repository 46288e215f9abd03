/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! `get_proc_address`, version and print functions.

use std::ffi::{c_char, CStr};

use gdlink::sys;

use super::{classdb, methods, objects, push_message, strings, EngineMessage, MessageKind};

/// Engine version the mock reports; matches the bundled API description.
pub const VERSION: (u32, u32, u32) = (4, 2, 2);
const VERSION_STRING: &[u8] = b"Godot Engine v4.2.2.stable.mock\0";

macro_rules! proc_table {
    ($( $name:ident: $Ty:ty => $path:path; )*) => {
        /// Resolves an interface function by name; returns `None` for names the mock does not implement.
        pub(super) fn lookup(name: &str) -> sys::GDExtensionInterfaceFunctionPtr {
            match name {
                $(
                    stringify!($name) => {
                        // Ensures the implementation has exactly the signature of the C header.
                        let f: <$Ty as sys::Inner>::FnPtr = $path;

                        // SAFETY: the extension transmutes back to the same type, keyed by the same name.
                        Some(unsafe { std::mem::transmute::<<$Ty as sys::Inner>::FnPtr, unsafe extern "C" fn()>(f) })
                    }
                )*
                _ => None,
            }
        }
    };
}

proc_table! {
    get_godot_version: sys::GDExtensionInterfaceGetGodotVersion => get_godot_version;

    print_error: sys::GDExtensionInterfacePrintError => print_error;
    print_warning: sys::GDExtensionInterfacePrintWarning => print_warning;
    print_script_error: sys::GDExtensionInterfacePrintScriptError => print_script_error;

    string_name_new_with_utf8_chars_and_len: sys::GDExtensionInterfaceStringNameNewWithUtf8CharsAndLen => strings::string_name_new_with_utf8_chars_and_len;
    string_new_with_utf8_chars_and_len: sys::GDExtensionInterfaceStringNewWithUtf8CharsAndLen => strings::string_new_with_utf8_chars_and_len;
    string_to_utf8_chars: sys::GDExtensionInterfaceStringToUtf8Chars => strings::string_to_utf8_chars;
    variant_get_ptr_constructor: sys::GDExtensionInterfaceVariantGetPtrConstructor => strings::variant_get_ptr_constructor;
    variant_get_ptr_destructor: sys::GDExtensionInterfaceVariantGetPtrDestructor => strings::variant_get_ptr_destructor;

    classdb_construct_object: sys::GDExtensionInterfaceClassdbConstructObject => classdb::classdb_construct_object;
    classdb_get_method_bind: sys::GDExtensionInterfaceClassdbGetMethodBind => classdb::classdb_get_method_bind;
    classdb_get_class_tag: sys::GDExtensionInterfaceClassdbGetClassTag => classdb::classdb_get_class_tag;
    classdb_register_extension_class2: sys::GDExtensionInterfaceClassdbRegisterExtensionClass2 => classdb::classdb_register_extension_class2;
    classdb_register_extension_class_integer_constant: sys::GDExtensionInterfaceClassdbRegisterExtensionClassIntegerConstant => classdb::classdb_register_extension_class_integer_constant;
    classdb_unregister_extension_class: sys::GDExtensionInterfaceClassdbUnregisterExtensionClass => classdb::classdb_unregister_extension_class;

    object_method_bind_ptrcall: sys::GDExtensionInterfaceObjectMethodBindPtrcall => methods::object_method_bind_ptrcall;
    object_destroy: sys::GDExtensionInterfaceObjectDestroy => objects::object_destroy;
    object_get_instance_id: sys::GDExtensionInterfaceObjectGetInstanceId => objects::object_get_instance_id;
    object_get_instance_from_id: sys::GDExtensionInterfaceObjectGetInstanceFromId => objects::object_get_instance_from_id;
    object_cast_to: sys::GDExtensionInterfaceObjectCastTo => objects::object_cast_to;
    object_set_instance: sys::GDExtensionInterfaceObjectSetInstance => objects::object_set_instance;
    object_get_class_name: sys::GDExtensionInterfaceObjectGetClassName => objects::object_get_class_name;
    object_get_instance_binding: sys::GDExtensionInterfaceObjectGetInstanceBinding => objects::object_get_instance_binding;
    object_set_instance_binding: sys::GDExtensionInterfaceObjectSetInstanceBinding => objects::object_set_instance_binding;

    global_get_singleton: sys::GDExtensionInterfaceGlobalGetSingleton => objects::global_get_singleton;

    editor_add_plugin: sys::GDExtensionInterfaceEditorAddPlugin => classdb::editor_add_plugin;
    editor_remove_plugin: sys::GDExtensionInterfaceEditorRemovePlugin => classdb::editor_remove_plugin;
}

/// The `get_proc_address` function handed to the extension entry point.
pub unsafe extern "C" fn get_proc_address(p_function_name: *const c_char) -> sys::GDExtensionInterfaceFunctionPtr {
    if p_function_name.is_null() {
        return None;
    }

    match CStr::from_ptr(p_function_name).to_str() {
        Ok(name) => lookup(name),
        Err(_) => None,
    }
}

unsafe extern "C" fn get_godot_version(r_godot_version: *mut sys::GDExtensionGodotVersion) {
    let (major, minor, patch) = VERSION;

    *r_godot_version = sys::GDExtensionGodotVersion {
        major,
        minor,
        patch,
        string: VERSION_STRING.as_ptr() as *const c_char,
    };
}

unsafe fn record(
    kind: MessageKind,
    description: *const c_char,
    function: *const c_char,
    file: *const c_char,
    line: i32,
) {
    let text = |ptr: *const c_char| {
        if ptr.is_null() {
            String::new()
        } else {
            CStr::from_ptr(ptr).to_string_lossy().into_owned()
        }
    };

    push_message(EngineMessage {
        kind,
        description: text(description),
        function: text(function),
        file: text(file),
        line,
    });
}

unsafe extern "C" fn print_error(
    p_description: *const c_char,
    p_function: *const c_char,
    p_file: *const c_char,
    p_line: i32,
    _p_editor_notify: sys::GDExtensionBool,
) {
    record(MessageKind::Error, p_description, p_function, p_file, p_line);
}

unsafe extern "C" fn print_warning(
    p_description: *const c_char,
    p_function: *const c_char,
    p_file: *const c_char,
    p_line: i32,
    _p_editor_notify: sys::GDExtensionBool,
) {
    record(MessageKind::Warning, p_description, p_function, p_file, p_line);
}

unsafe extern "C" fn print_script_error(
    p_description: *const c_char,
    p_function: *const c_char,
    p_file: *const c_char,
    p_line: i32,
    _p_editor_notify: sys::GDExtensionBool,
) {
    record(MessageKind::ScriptError, p_description, p_function, p_file, p_line);
}

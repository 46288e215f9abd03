/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Identifier renamings (Godot -> Rust)

use proc_macro2::Ident;

use crate::util::{ident, safe_ident};

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Case conversions

fn to_snake_special_case(class_name: &str) -> Option<&'static str> {
    match class_name {
        // Classes
        "JSONRPC" => Some("json_rpc"),
        "OpenXRAPIExtension" => Some("open_xr_api_extension"),

        // Enums
        "VSyncMode" => Some("vsync_mode"),
        _ => None,
    }
}

pub fn to_snake_case(class_name: &str) -> String {
    use heck::ToSnakeCase;

    // Special cases
    if let Some(special_case) = to_snake_special_case(class_name) {
        return special_case.to_string();
    }

    class_name
        .replace("1D", "_1d")
        .replace("2D", "_2d")
        .replace("3D", "_3d")
        .replace("GDExtension", "Gdextension")
        .to_snake_case()
}

pub fn to_pascal_case(class_name: &str) -> String {
    use heck::ToPascalCase;

    // Special cases: reuse snake_case impl to ensure at least consistency between those 2.
    if let Some(snake_special) = to_snake_special_case(class_name) {
        return snake_special.to_pascal_case();
    }

    class_name
        .to_pascal_case()
        .replace("GdExtension", "GDExtension")
}

/// Module holding the enums, constants and signal names of a class, e.g. `TabContainer` -> `tab_container`.
pub fn to_module_name(class_name: &str) -> Ident {
    ident(&to_snake_case(class_name))
}

/// Rust name of an engine method or parameter; keywords get a trailing underscore.
pub fn to_rust_method_name(godot_name: &str) -> Ident {
    safe_ident(godot_name)
}

/// Rust name of a virtual method in an `I*` trait: `_ready` -> `ready`.
pub fn to_virtual_method_name(godot_name: &str) -> Ident {
    safe_ident(godot_name.strip_prefix('_').unwrap_or(godot_name))
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Enum conversions

pub fn make_enum_name(enum_name: &str) -> Ident {
    ident(&to_pascal_case(enum_name))
}

pub fn make_enumerator_name(enumerator_name: &str) -> Ident {
    // Enumerators keep their engine spelling (e.g. `ERR_FILE_NOT_FOUND`), so they can be looked up in the engine docs.
    ident(enumerator_name)
}

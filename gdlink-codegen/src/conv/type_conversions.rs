/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Mapping of engine type strings (as they appear in `extension_api.json`) to Rust types.

use proc_macro2::TokenStream;
use quote::{quote, ToTokens};

use crate::context::Context;
use crate::conv;
use crate::util::ident;

/// Rust type of a parameter or return value.
#[derive(Clone, Debug)]
pub enum RustTy {
    /// `bool`, `i64`, `f64`, ...
    Scalar(TokenStream),

    /// `GString`, `StringName`.
    Builtin(TokenStream),

    /// Generated enum or bitfield newtype, e.g. `crate::classes::node::ProcessMode`.
    EngineEnum {
        tokens: TokenStream,
        is_bitfield: bool,
    },

    /// Engine class, e.g. `crate::classes::Node`. Passed as `&Gd<T>`, returned as `Option<Gd<T>>`.
    EngineClass {
        class_name: String,
        tokens: TokenStream,
    },
}

impl ToTokens for RustTy {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        match self {
            RustTy::Scalar(ty) | RustTy::Builtin(ty) => ty.to_tokens(tokens),
            RustTy::EngineEnum { tokens: ty, .. } => ty.to_tokens(tokens),
            RustTy::EngineClass { tokens: ty, .. } => ty.to_tokens(tokens),
        }
    }
}

/// Maps an engine type, refined by its `meta` (e.g. `int32`), to a Rust type.
///
/// Returns `None` for types outside the supported marshalling set; methods using them are not generated.
pub fn to_rust_type(ty: &str, meta: Option<&str>, ctx: &Context) -> Option<RustTy> {
    if let Some(scalar) = to_scalar_type(ty, meta) {
        return Some(RustTy::Scalar(scalar));
    }

    match ty {
        "String" => return Some(RustTy::Builtin(quote! { crate::builtin::GString })),
        "StringName" => return Some(RustTy::Builtin(quote! { crate::builtin::StringName })),
        _ => {}
    }

    if let Some(qualified) = ty.strip_prefix("enum::") {
        return to_enum_type(qualified, false, ctx);
    }

    if let Some(qualified) = ty.strip_prefix("bitfield::") {
        return to_enum_type(qualified, true, ctx);
    }

    if ctx.is_engine_class(ty) {
        let class_ident = ident(ty);
        return Some(RustTy::EngineClass {
            class_name: ty.to_string(),
            tokens: quote! { crate::classes::#class_ident },
        });
    }

    None
}

fn to_scalar_type(ty: &str, meta: Option<&str>) -> Option<TokenStream> {
    let tokens = match (ty, meta) {
        ("bool", None) => quote! { bool },

        ("int", None | Some("int64")) => quote! { i64 },
        ("int", Some("int32")) => quote! { i32 },
        ("int", Some("uint32")) => quote! { u32 },
        ("int", Some("uint64")) => quote! { u64 },

        ("float", None | Some("double")) => quote! { f64 },
        ("float", Some("float")) => quote! { f32 },

        // int8, int16, char16 etc. have no marshalling yet.
        _ => return None,
    };

    Some(tokens)
}

fn to_enum_type(qualified: &str, is_bitfield: bool, ctx: &Context) -> Option<RustTy> {
    let enum_ = ctx.find_enum(qualified)?;
    if enum_.is_bitfield != is_bitfield {
        return None;
    }

    let tokens = match qualified.split_once('.') {
        Some((class_name, enum_name)) => {
            let module = conv::to_module_name(class_name);
            let enum_ident = conv::make_enum_name(enum_name);
            quote! { crate::classes::#module::#enum_ident }
        }
        None => {
            let enum_ident = conv::make_enum_name(qualified);
            quote! { crate::global::#enum_ident }
        }
    };

    Some(RustTy::EngineEnum {
        tokens,
        is_bitfield,
    })
}

/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Files that combine the per-class output: `classes.rs` (included by `gdlink_core::classes`) and `global_enums.rs`
//! (included by `gdlink_core::global`).

use proc_macro2::{Literal, TokenStream};
use quote::quote;

use crate::context::Context;
use crate::generator::classes::{make_class, GeneratedClass};
use crate::generator::enums;
use crate::models::json::JsonExtensionApi;
use crate::Stats;

pub fn make_classes_file(
    api: &JsonExtensionApi,
    ctx: &Context,
    stats: &mut Stats,
) -> Result<TokenStream, String> {
    let mut generated: Vec<GeneratedClass> = Vec::with_capacity(api.classes.len());
    for class in &api.classes {
        generated.push(make_class(class, ctx, stats)?);
        stats.classes += 1;
    }

    let major = Literal::u32_unsuffixed(api.header.version_major.into());
    let minor = Literal::u32_unsuffixed(api.header.version_minor.into());
    let version_doc = format!("Engine API the classes were generated from: {}.", api.header.version_full_name);

    let modules = generated.iter().map(|c| &c.code);
    let inherits_macros = generated.iter().map(|c| &c.inherits_macro);
    let reexports = generated.iter().map(|c| {
        let GeneratedClass {
            module_name,
            class_name,
            virtual_trait_name,
            ..
        } = c;

        quote! { pub use #module_name::{#class_name, #virtual_trait_name}; }
    });
    let class_infos = generated.iter().map(|c| {
        let GeneratedClass {
            module_name,
            class_name,
            ..
        } = c;

        quote! { #module_name::#class_name::CLASS_INFO, }
    });

    Ok(quote! {
        #[doc = #version_doc]
        pub const API_VERSION: (u32, u32) = (#major, #minor);

        #( #modules )*
        #( #reexports )*
        #( #inherits_macros )*

        pub(crate) static ENGINE_CLASSES: &[crate::classes::EngineClassInfo] = &[
            #( #class_infos )*
        ];
    })
}

pub fn make_global_enums_file(api: &JsonExtensionApi) -> Result<TokenStream, String> {
    enums::make_enums(&api.global_enums)
}

/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Ownership table: who owns objects passed to and returned from engine methods.
//!
//! The engine API does not describe ownership, so it is recorded here per method. Methods without an entry follow
//! the defaults in [`arg_ownership()`] and [`return_ownership()`].

use proc_macro2::TokenStream;
use quote::{quote, ToTokens};

use crate::context::Context;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ArgOwnership {
    Borrowed,
    Transferred,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ReturnOwnership {
    RefCounted,
    Owned,
    LifetimeBound,
    MustAssertInstanceId,
}

enum Rule {
    Arg(&'static str, ArgOwnership),
    Return(ReturnOwnership),
}

#[rustfmt::skip]
static OWNERSHIP_TABLE: &[(&str, &str, Rule)] = &[
    // Parent node frees its children.
    ("Node",         "add_child",   Rule::Arg("node", ArgOwnership::Transferred)),
    ("Node",         "add_sibling", Rule::Arg("sibling", ArgOwnership::Transferred)),

    // Internal child, destroyed together with the container.
    ("TabContainer", "get_tab_bar", Rule::Return(ReturnOwnership::LifetimeBound)),
];

/// Ownership of object argument `arg_name` of `class_name::method_name`. Borrowed unless listed in the table.
pub fn arg_ownership(class_name: &str, method_name: &str, arg_name: &str) -> ArgOwnership {
    OWNERSHIP_TABLE
        .iter()
        .find_map(|(class, method, rule)| match rule {
            Rule::Arg(arg, ownership)
                if *class == class_name && *method == method_name && *arg == arg_name =>
            {
                Some(*ownership)
            }
            _ => None,
        })
        .unwrap_or(ArgOwnership::Borrowed)
}

/// Ownership of an object of class `returned_class` returned from `class_name::method_name`.
pub fn return_ownership(
    class_name: &str,
    method_name: &str,
    returned_class: &str,
    ctx: &Context,
) -> ReturnOwnership {
    let listed = OWNERSHIP_TABLE
        .iter()
        .find_map(|(class, method, rule)| match rule {
            Rule::Return(ownership) if *class == class_name && *method == method_name => {
                Some(*ownership)
            }
            _ => None,
        });

    if let Some(ownership) = listed {
        return ownership;
    }

    if ctx.is_refcounted(returned_class) {
        ReturnOwnership::RefCounted
    } else if is_factory_method(method_name) {
        ReturnOwnership::Owned
    } else {
        ReturnOwnership::MustAssertInstanceId
    }
}

fn is_factory_method(method_name: &str) -> bool {
    matches!(method_name, "duplicate" | "instantiate") || method_name.starts_with("create")
}

impl ToTokens for ArgOwnership {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let variant = match self {
            ArgOwnership::Borrowed => quote! { Borrowed },
            ArgOwnership::Transferred => quote! { Transferred },
        };

        tokens.extend(quote! { crate::meta::ArgPassing::#variant });
    }
}

impl ToTokens for ReturnOwnership {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let variant = match self {
            ReturnOwnership::RefCounted => quote! { RefCounted },
            ReturnOwnership::Owned => quote! { Owned },
            ReturnOwnership::LifetimeBound => quote! { LifetimeBound },
            ReturnOwnership::MustAssertInstanceId => quote! { MustAssertInstanceId },
        };

        tokens.extend(quote! { crate::meta::ReturnOwnership::#variant });
    }
}

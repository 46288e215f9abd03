/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use proc_macro2::TokenStream;
use quote::quote;

use crate::util::{self, bail};
use crate::ParseResult;

pub fn attribute_godot_api(meta: TokenStream, item: venial::Item) -> ParseResult<TokenStream> {
    let decl = match item {
        venial::Item::Impl(decl) => decl,
        other => return bail!(other, "#[godot_api] can only be applied on impl blocks"),
    };

    if !meta.is_empty() {
        return bail!(meta, "#[godot_api] does not accept any parameters");
    }

    if decl.impl_generic_params.is_some() {
        return bail!(
            decl,
            "#[godot_api] does not support lifetimes or generic parameters"
        );
    }

    let Some(trait_ty) = &decl.trait_ty else {
        return bail!(
            decl,
            "#[godot_api] requires a virtual-method trait impl, e.g. `impl INode for MyClass`"
        );
    };

    let is_virtual_trait = util::last_path_ident(trait_ty).is_some_and(|trait_name| {
        let trait_name = trait_name.to_string();
        trait_name.len() > 1
            && trait_name.starts_with('I')
            && trait_name[1..].starts_with(|c: char| c.is_ascii_uppercase())
    });
    if !is_virtual_trait {
        return bail!(
            trait_ty,
            "#[godot_api] on a trait impl requires an engine virtual-method trait such as `INode`"
        );
    }

    transform_trait_impl(&decl, trait_ty)
}

/// Codegen for `#[godot_api] impl ISomething for MyType`.
fn transform_trait_impl(
    original_impl: &venial::Impl,
    trait_path: &venial::TypeExpr,
) -> ParseResult<TokenStream> {
    let class_name = &original_impl.self_ty;
    let prv = quote! { ::gdlink::private };

    let mut godot_init_impl = TokenStream::new();
    let mut to_string_impl = TokenStream::new();
    let mut on_notification_impl = TokenStream::new();

    let mut with_create = TokenStream::new();
    let mut with_string = TokenStream::new();
    let mut with_on_notification = TokenStream::new();

    let mut overridden_virtuals = Vec::new();

    for item in original_impl.body_items.iter() {
        let venial::ImplMember::AssocFunction(method) = item else {
            continue;
        };

        let method_name = method.name.to_string();
        match method_name.as_str() {
            "init" => {
                godot_init_impl = quote! {
                    impl ::gdlink::obj::cap::GodotDefault for #class_name {
                        fn __godot_user_init(base: ::gdlink::obj::Base<Self::Base>) -> Self {
                            <Self as #trait_path>::init(base)
                        }
                    }
                };
                with_create = quote! { .with_create::<#class_name>() };
            }

            "to_string" => {
                to_string_impl = quote! {
                    impl ::gdlink::obj::cap::GodotToString for #class_name {
                        fn __godot_to_string(&self) -> ::gdlink::builtin::GString {
                            <Self as #trait_path>::to_string(self)
                        }
                    }
                };
                with_string = quote! { .with_string::<#class_name>() };
            }

            "on_notification" => {
                on_notification_impl = quote! {
                    impl ::gdlink::obj::cap::GodotNotification for #class_name {
                        fn __godot_notification(&mut self, what: i32) {
                            <Self as #trait_path>::on_notification(self, what)
                        }
                    }
                };
                with_on_notification = quote! { .with_on_notification::<#class_name>() };
            }

            name if name.starts_with("__") => {
                return bail!(method.name, "`{name}` is reserved for generated code");
            }

            // Engine virtuals; the generated dispatch maps `_ready` to `ready` etc.
            _ => overridden_virtuals.push(method_name),
        }
    }

    Ok(quote! {
        #original_impl

        impl ::gdlink::obj::cap::ImplementsVirtuals for #class_name {
            fn __virtual_call(name: &str) -> ::gdlink::sys::GDExtensionClassCallVirtual {
                <Self as #trait_path>::__virtual_call(name, &[ #( #overridden_virtuals ),* ])
            }
        }

        #godot_init_impl
        #to_string_impl
        #on_notification_impl

        ::gdlink::sys::plugin_add!(#prv::__GDLINK_PLUGIN_REGISTRY; #prv::ClassPlugin::new::<#class_name>(
            #prv::PluginItem::ITraitImpl(
                #prv::ITraitImpl::new::<#class_name>() #with_create #with_string #with_on_notification
            )
        ));
    })
}

/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Generation of engine class wrappers: one module per class, holding the struct, its methods and enums, the `I*` trait
//! and the trait impls that place it in the class hierarchy.

use proc_macro2::{Ident, Literal, TokenStream};
use quote::{format_ident, quote};

use crate::context::Context;
use crate::conv::{self, RustTy};
use crate::generator::{enums, virtual_traits};
use crate::models::json::{JsonClass, JsonClassConstant, JsonClassMethod, JsonSignal};
use crate::ownership;
use crate::util::{self, ident, strlit};
use crate::Stats;

/// Output for one class: the module, and the name paths that the central file re-exports.
pub struct GeneratedClass {
    pub code: TokenStream,
    pub module_name: Ident,
    pub class_name: Ident,
    pub virtual_trait_name: Ident,
    pub inherits_macro: TokenStream,
}

pub fn make_class(
    class: &JsonClass,
    ctx: &Context,
    stats: &mut Stats,
) -> Result<GeneratedClass, String> {
    let class_name = ident(&class.name);
    let module_name = conv::to_module_name(&class.name);
    let virtual_trait_name = util::virtual_trait_ident(&class.name);

    let base = class.inherits.as_deref();
    if let Some(base) = base {
        if !ctx.is_engine_class(base) {
            return Err(format!(
                "class {} inherits {base}, which is not part of the API",
                class.name
            ));
        }
    }

    let is_singleton = ctx.is_singleton(&class.name);
    let is_instantiable = class.is_instantiable && !is_singleton;
    let init_level = make_init_level(class);

    let constants = make_constants(class.constants.as_deref().unwrap_or_default());
    let signals = make_signal_names(class.signals.as_deref().unwrap_or_default());
    let enums = enums::make_enums(class.enums.as_deref().unwrap_or_default())?;
    let virtual_trait = virtual_traits::make_virtual_methods_trait(class, ctx);

    let mut methods = Vec::new();
    for method in class.methods.iter().flatten().filter(|m| !m.is_virtual) {
        match make_method(class, method, ctx) {
            Some(code) => {
                methods.push(code);
                stats.methods += 1;
            }
            None => stats.skipped_methods += 1,
        }
    }

    let class_doc = match base {
        Some(base) => format!("Engine class `{}`, inherits [`{base}`][crate::classes::{base}].", class.name),
        None => format!("Engine class `{}`, the root of the class hierarchy.", class.name),
    };

    let base_ty = match base {
        Some(base) => {
            let base = ident(base);
            quote! { crate::classes::#base }
        }
        None => quote! { crate::obj::NoBase },
    };

    let parent_info = match base {
        Some(base) => quote! { Some(crate::meta::ClassName::from_static(#base)) },
        None => quote! { None },
    };

    // Object is manually managed as a static type, but a Gd<Object> may point to a ref-counted instance.
    let (memory, dyn_memory) = if base.is_none() {
        (
            quote! { crate::obj::bounds::MemManual },
            quote! { crate::obj::bounds::MemDynamic },
        )
    } else if class.is_refcounted {
        let mem = quote! { crate::obj::bounds::MemRefCounted };
        (mem.clone(), mem)
    } else {
        let mem = quote! { crate::obj::bounds::MemManual };
        (mem.clone(), mem)
    };

    let ancestors = ctx.ancestors(&class.name);
    let inherits_impls = ancestors.iter().map(|ancestor| {
        let ancestor = ident(ancestor);
        quote! {
            // SAFETY: generated from the engine class hierarchy.
            unsafe impl crate::obj::Inherits<crate::classes::#ancestor> for #class_name {}
        }
    });

    let deref_impls = base.is_some().then(|| {
        quote! {
            impl std::ops::Deref for #class_name {
                type Target = #base_ty;

                fn deref(&self) -> &Self::Target {
                    // SAFETY: all engine classes are #[repr(transparent)] over ObjectHandle.
                    unsafe { &*(self as *const Self as *const Self::Target) }
                }
            }

            impl std::ops::DerefMut for #class_name {
                fn deref_mut(&mut self) -> &mut Self::Target {
                    // SAFETY: see deref().
                    unsafe { &mut *(self as *mut Self as *mut Self::Target) }
                }
            }
        }
    });

    let godot_default = is_instantiable.then(|| {
        quote! {
            impl crate::obj::cap::GodotDefault for #class_name {}
        }
    });

    let singleton_fn = is_singleton.then(|| {
        quote! {
            /// Returns the engine-wide instance of this class.
            #[track_caller]
            pub fn singleton() -> crate::obj::Gd<Self> {
                crate::private::engine_singleton::<Self>()
            }
        }
    });

    let class_name_str = &class.name;
    let is_refcounted = class.is_refcounted;

    let code = quote! {
        pub mod #module_name {
            #[doc = #class_doc]
            #[derive(Debug)]
            #[repr(transparent)]
            pub struct #class_name {
                handle: crate::obj::ObjectHandle,
            }

            impl #class_name {
                /// Static information about this class, as listed in [`all_engine_classes()`][crate::classes::all_engine_classes].
                pub const CLASS_INFO: crate::classes::EngineClassInfo = crate::classes::EngineClassInfo {
                    name: crate::meta::ClassName::from_static(#class_name_str),
                    parent: #parent_info,
                    is_refcounted: #is_refcounted,
                    is_instantiable: #is_instantiable,
                    is_singleton: #is_singleton,
                    init_level: #init_level,
                };

                #constants
                #singleton_fn
                #( #methods )*
            }

            #signals
            #enums
            #virtual_trait

            // SAFETY: #[repr(transparent)] over ObjectHandle.
            unsafe impl crate::obj::EngineClass for #class_name {
                fn __handle(&self) -> &crate::obj::ObjectHandle {
                    &self.handle
                }

                fn __from_handle(handle: crate::obj::ObjectHandle) -> Self {
                    Self { handle }
                }
            }

            impl crate::obj::GodotClass for #class_name {
                type Base = #base_ty;

                const INIT_LEVEL: crate::init::InitLevel = #init_level;

                fn class_name() -> crate::meta::ClassName {
                    crate::meta::ClassName::from_static(#class_name_str)
                }
            }

            // SAFETY: memory strategy follows is_refcounted of the engine class.
            unsafe impl crate::obj::Bounds for #class_name {
                type Memory = #memory;
                type DynMemory = #dyn_memory;
                type Declarer = crate::obj::bounds::DeclEngine;
            }

            #( #inherits_impls )*
            #deref_impls
            #godot_default
        }
    };

    Ok(GeneratedClass {
        code,
        inherits_macro: make_inherits_macro(class, &ancestors),
        module_name,
        class_name,
        virtual_trait_name,
    })
}

/// Engine classes are registered at Scene level, except server and editor classes.
fn make_init_level(class: &JsonClass) -> TokenStream {
    let level = if class.api_type == "editor" {
        quote! { Editor }
    } else if class.name.ends_with("Server") {
        quote! { Servers }
    } else {
        quote! { Scene }
    };

    quote! { crate::init::InitLevel::#level }
}

/// `inherits_transitive_Node!(MyClass)` implements `Inherits<Node>`, `Inherits<Object>` for a user class with base `Node`.
///
/// Expanded in user crates, so paths go through the `gdlink` facade.
fn make_inherits_macro(class: &JsonClass, ancestors: &[&str]) -> TokenStream {
    let macro_name = util::inherits_macro_ident(&class.name);
    let all_bases = std::iter::once(class.name.as_str())
        .chain(ancestors.iter().copied())
        .map(ident);

    quote! {
        #[doc(hidden)]
        #[macro_export]
        macro_rules! #macro_name {
            ($Class:ident) => {
                #(
                    unsafe impl ::gdlink::obj::Inherits<::gdlink::classes::#all_bases> for $Class {}
                )*
            };
        }
    }
}

fn make_constants(constants: &[JsonClassConstant]) -> TokenStream {
    let definitions = constants.iter().map(|constant| {
        let name = ident(&constant.name);

        match i32::try_from(constant.value) {
            Ok(value) => {
                let value = Literal::i32_unsuffixed(value);
                quote! { pub const #name: i32 = #value; }
            }
            Err(_) => {
                let value = Literal::i64_unsuffixed(constant.value);
                quote! { pub const #name: i64 = #value; }
            }
        }
    });

    quote! { #( #definitions )* }
}

fn make_signal_names(signals: &[JsonSignal]) -> TokenStream {
    if signals.is_empty() {
        return TokenStream::new();
    }

    let definitions = signals.iter().map(|signal| {
        let name = ident(&signal.name.to_uppercase());
        let value = strlit(&signal.name);
        quote! { pub const #name: &str = #value; }
    });

    quote! {
        /// Names of the signals declared by this class, for use with `connect()` and `emit_signal()`.
        pub mod signals {
            #( #definitions )*
        }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Methods

/// Generates one engine method, or `None` if a parameter or return type is not supported.
fn make_method(class: &JsonClass, method: &JsonClassMethod, ctx: &Context) -> Option<TokenStream> {
    let hash = method.hash?;
    if method.is_vararg {
        return None;
    }

    let method_name = conv::to_rust_method_name(&method.name);
    let method_name_str = &method.name;
    let class_name_str = &class.name;

    let mut generics = Vec::new();
    let mut params = Vec::new();
    let mut conversions = Vec::new();
    let mut call_args = Vec::new();

    for arg in method.arguments.iter().flatten() {
        let ty = conv::to_rust_type(&arg.type_, arg.meta.as_deref(), ctx)?;
        let name = conv::to_rust_method_name(&arg.name);

        match &ty {
            RustTy::EngineClass { class_name, tokens } => {
                let type_param = format_ident!("T{}", conv::to_pascal_case(&arg.name));
                let passing = ownership::arg_ownership(&class.name, &method.name, &arg.name);

                generics.push(quote! { #type_param: crate::obj::Inherits<#tokens> });
                params.push(quote! { #name: &crate::obj::Gd<#type_param> });
                call_args.push(quote! {
                    .object_arg(#name, #passing, crate::meta::ClassName::from_static(#class_name))
                });
            }
            RustTy::Builtin(tokens) => {
                params.push(quote! { #name: impl Into<#tokens> });
                conversions.push(quote! { let #name: #tokens = #name.into(); });
                call_args.push(quote! { .arg(&#name) });
            }
            RustTy::Scalar(_) | RustTy::EngineEnum { .. } => {
                params.push(quote! { #name: #ty });
                call_args.push(quote! { .arg(&#name) });
            }
        }
    }

    let (return_decl, finish) = match &method.return_value {
        None => (TokenStream::new(), quote! { .finish::<()>() }),
        Some(ret) => match conv::to_rust_type(&ret.type_, ret.meta.as_deref(), ctx)? {
            RustTy::EngineClass { class_name, tokens } => {
                let ownership =
                    ownership::return_ownership(&class.name, &method.name, &class_name, ctx);
                (
                    quote! { -> Option<crate::obj::Gd<#tokens>> },
                    quote! { .finish_object::<#tokens>(#ownership) },
                )
            }
            ty => (quote! { -> #ty }, quote! { .finish::<#ty>() }),
        },
    };

    let (receiver, begin) = if method.is_static {
        (
            None,
            quote! { crate::meta::PtrCall::begin_static(&BIND) },
        )
    } else if method.is_const {
        (
            Some(quote! { &self }),
            quote! { crate::meta::PtrCall::begin(&BIND, &self.handle) },
        )
    } else {
        (
            Some(quote! { &mut self }),
            quote! { crate::meta::PtrCall::begin(&BIND, &self.handle) },
        )
    };

    let generics = (!generics.is_empty()).then(|| quote! { < #( #generics ),* > });
    let params = receiver.into_iter().chain(params);
    let hash = Literal::i64_unsuffixed(hash);

    Some(quote! {
        #[track_caller]
        pub fn #method_name #generics (#( #params ),*) #return_decl {
            static BIND: crate::meta::MethodBind = crate::meta::MethodBind::new(#class_name_str, #method_name_str, #hash);
            #( #conversions )*

            crate::meta::expect_call(
                #begin
                    #( #call_args )*
                    #finish
            )
        }
    })
}

/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! `I*` traits with the overridable virtual methods of a class and all its bases, plus the trampolines the engine calls.

use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};

use crate::context::Context;
use crate::conv::{self, RustTy};
use crate::models::json::{JsonClass, JsonClassMethod};
use crate::util::{self, strlit};

/// One overridable virtual method with supported parameter and return types.
struct VirtualMethod<'a> {
    godot_name: &'a str,
    rust_name: Ident,
    is_const: bool,
    params: Vec<(Ident, RustTy)>,
    return_ty: Option<RustTy>,
}

pub fn make_virtual_methods_trait(class: &JsonClass, ctx: &Context) -> TokenStream {
    let trait_name = util::virtual_trait_ident(&class.name);

    let virtuals = collect_virtuals(class, ctx);
    let method_decls = virtuals.iter().map(make_virtual_method_decl);
    let dispatch_arms = virtuals
        .iter()
        .map(|method| make_dispatch_arm(method, &trait_name));

    let trait_doc = format!(
        "Virtual methods of [`{0}`] and its base classes, overridable in `#[godot_api] impl {1} for MyClass`.",
        class.name, trait_name
    );
    let init_panic = format!(
        "{{}}::init() is not overridden; use #[class(init)] or implement {trait_name}::init()"
    );

    quote! {
        #[doc = #trait_doc]
        #[allow(unused_variables)]
        pub trait #trait_name: crate::obj::UserClass {
            /// Constructor, called when the engine or `Gd::new_alloc()`/`Gd::new_gd()` creates an instance.
            fn init(base: crate::obj::Base<Self::Base>) -> Self
            where
                Self: Sized,
            {
                panic!(#init_panic, <Self as crate::obj::GodotClass>::class_name())
            }

            /// String representation of the object, as shown by the engine's `str()` and the debugger.
            fn to_string(&self) -> crate::builtin::GString {
                crate::builtin::GString::new()
            }

            /// Called on every engine notification sent to this object.
            fn on_notification(&mut self, what: i32) {}

            #( #method_decls )*

            #[doc(hidden)]
            fn __virtual_call(name: &str, overridden: &[&str]) -> crate::sys::GDExtensionClassCallVirtual
            where
                Self: Sized,
            {
                match name {
                    #( #dispatch_arms )*
                    _ => None,
                }
            }
        }
    }
}

/// Virtuals of `class` and its bases, most derived first. Methods overridden in a subclass are listed once.
fn collect_virtuals<'a>(class: &'a JsonClass, ctx: &Context<'a>) -> Vec<VirtualMethod<'a>> {
    let mut result: Vec<VirtualMethod> = Vec::new();

    let hierarchy = std::iter::once(class).chain(
        ctx.ancestors(&class.name)
            .into_iter()
            .filter_map(|base| ctx.get_class(base)),
    );

    for current in hierarchy {
        for method in current.methods.iter().flatten().filter(|m| m.is_virtual) {
            if result.iter().any(|v| v.godot_name == method.name) {
                continue;
            }

            if let Some(virtual_method) = to_virtual_method(method, ctx) {
                result.push(virtual_method);
            }
        }
    }

    result
}

fn to_virtual_method<'a>(method: &'a JsonClassMethod, ctx: &Context) -> Option<VirtualMethod<'a>> {
    let mut params = Vec::new();
    for arg in method.arguments.iter().flatten() {
        let ty = conv::to_rust_type(&arg.type_, arg.meta.as_deref(), ctx)?;
        params.push((conv::to_rust_method_name(&arg.name), ty));
    }

    let return_ty = match &method.return_value {
        None => None,
        Some(ret) => match conv::to_rust_type(&ret.type_, ret.meta.as_deref(), ctx)? {
            // Returned objects would need an ownership decision on the engine side; not supported for virtuals.
            RustTy::EngineClass { .. } | RustTy::EngineEnum { .. } => return None,
            ty => Some(ty),
        },
    };

    Some(VirtualMethod {
        godot_name: &method.name,
        rust_name: conv::to_virtual_method_name(&method.name),
        is_const: method.is_const,
        params,
        return_ty,
    })
}

fn param_type(ty: &RustTy) -> TokenStream {
    match ty {
        RustTy::EngineClass { tokens, .. } => quote! { crate::obj::Gd<#tokens> },
        ty => quote! { #ty },
    }
}

fn make_virtual_method_decl(method: &VirtualMethod) -> TokenStream {
    let VirtualMethod {
        rust_name,
        is_const,
        params,
        return_ty,
        ..
    } = method;

    let receiver = if *is_const {
        quote! { &self }
    } else {
        quote! { &mut self }
    };

    let param_decls = params.iter().map(|(name, ty)| {
        let ty = param_type(ty);
        quote! { #name: #ty }
    });
    let all_params = std::iter::once(receiver).chain(param_decls);

    match return_ty {
        None => quote! {
            fn #rust_name(#( #all_params ),*) {}
        },
        Some(ty) => quote! {
            fn #rust_name(#( #all_params ),*) -> #ty {
                Default::default()
            }
        },
    }
}

fn make_dispatch_arm(method: &VirtualMethod, trait_name: &Ident) -> TokenStream {
    let VirtualMethod {
        godot_name,
        rust_name,
        is_const,
        params,
        return_ty,
    } = method;

    let rust_name_str = strlit(&rust_name.to_string());

    let args_ident = if params.is_empty() {
        format_ident!("_args")
    } else {
        format_ident!("args")
    };
    let ret_ident = if return_ty.is_some() {
        format_ident!("ret")
    } else {
        format_ident!("_ret")
    };

    let param_reads = params.iter().enumerate().map(|(i, (name, ty))| {
        let read = match ty {
            RustTy::EngineClass { tokens, .. } => quote! {
                crate::private::object_from_virtual_arg::<#tokens>(*args.add(#i))
            },
            ty => quote! {
                <#ty as crate::meta::FfiArg>::from_arg_ptr(*args.add(#i))
            },
        };

        quote! { let #name = #read; }
    });
    let param_names = params.iter().map(|(name, _)| name);

    // Const virtuals only need a shared bind.
    let dispatch = if *is_const {
        quote! { virtual_call_ref }
    } else {
        quote! { virtual_call }
    };

    let call = quote! {
        crate::private::#dispatch::<T, _>(instance, #rust_name_str, |this| {
            <T as #trait_name>::#rust_name(this, #( #param_names ),*)
        })
    };

    let call_and_return = match return_ty {
        None => quote! {
            let _ = #call;
        },
        Some(_) => quote! {
            if let Some(value) = #call {
                crate::meta::FfiReturn::write_return(value, ret);
            }
        },
    };

    quote! {
        #godot_name if overridden.contains(&#rust_name_str) => {
            unsafe extern "C" fn trampoline<T: #trait_name>(
                instance: crate::sys::GDExtensionClassInstancePtr,
                #args_ident: *const crate::sys::GDExtensionConstTypePtr,
                #ret_ident: crate::sys::GDExtensionTypePtr,
            ) {
                #( #param_reads )*

                #call_and_return
            }

            Some(trampoline::<Self>)
        }
    }
}

/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};
use venial::{NamedField, Struct};

use crate::util::{bail, ident, KvParser};
use crate::{util, ParseResult};

pub fn derive_godot_class(item: venial::Item) -> ParseResult<TokenStream> {
    let class = match item {
        venial::Item::Struct(class) => class,
        other => return bail!(other, "#[derive(GodotClass)] can only be applied to structs"),
    };

    if class.generic_params.is_some() {
        return bail!(
            class.generic_params,
            "#[derive(GodotClass)] does not support lifetimes or generic parameters"
        );
    }

    let struct_cfg = parse_struct_attributes(&class)?;
    let fields = parse_fields(&class)?;

    let class_name = &class.name;
    let class_name_str = struct_cfg
        .rename
        .as_ref()
        .unwrap_or(class_name)
        .to_string();

    let base_ty = &struct_cfg.base_ty;
    let base_class = quote! { ::gdlink::classes::#base_ty };
    let inherits_macro = format_ident!("inherits_transitive_{}", base_ty);
    let prv = quote! { ::gdlink::private };

    // Editor plugins are only registered once the editor is loaded.
    let init_level = if struct_cfg.is_editor_plugin {
        quote! { ::gdlink::init::InitLevel::Editor }
    } else {
        quote! { <#base_class as ::gdlink::obj::GodotClass>::INIT_LEVEL }
    };

    let is_tool = struct_cfg.is_tool;

    let (godot_default_impl, with_init) = match struct_cfg.init_strategy {
        InitStrategy::Generated => (
            make_godot_default_impl(class_name, &fields),
            quote! { .with_generated::<#class_name>() },
        ),
        InitStrategy::UserDefined => (TokenStream::new(), TokenStream::new()),
        InitStrategy::Absent => (TokenStream::new(), quote! { .with_no_init() }),
    };

    let with_editor_plugin = struct_cfg
        .is_editor_plugin
        .then(|| quote! { .with_editor_plugin() });

    let constants = struct_cfg.constants.iter().map(|(name, value)| {
        let name_str = name.to_string();
        quote! {
            ::gdlink::sys::plugin_add!(#prv::__GDLINK_PLUGIN_REGISTRY; #prv::ClassPlugin::new::<#class_name>(
                #prv::PluginItem::Constant(#prv::Constant::new(#name_str, { const VALUE: i64 = #value; VALUE }))
            ));
        }
    });

    Ok(quote! {
        impl ::gdlink::obj::GodotClass for #class_name {
            type Base = #base_class;

            const INIT_LEVEL: ::gdlink::init::InitLevel = #init_level;

            fn class_name() -> ::gdlink::meta::ClassName {
                ::gdlink::meta::ClassName::from_static(#class_name_str)
            }
        }

        unsafe impl ::gdlink::obj::Bounds for #class_name {
            type Memory = <#base_class as ::gdlink::obj::Bounds>::Memory;
            type DynMemory = <#base_class as ::gdlink::obj::Bounds>::DynMemory;
            type Declarer = ::gdlink::obj::bounds::DeclUser;
        }

        impl ::gdlink::obj::UserClass for #class_name {
            const __IS_TOOL: bool = #is_tool;
        }

        #godot_default_impl

        #prv::class_macros::#inherits_macro!(#class_name);

        ::gdlink::sys::plugin_add!(#prv::__GDLINK_PLUGIN_REGISTRY; #prv::ClassPlugin::new::<#class_name>(
            #prv::PluginItem::Struct(
                #prv::Struct::new::<#class_name>() #with_init #with_editor_plugin
            )
        ));

        #( #constants )*
    })
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Attributes

/// How instances of the class are constructed.
enum InitStrategy {
    /// `#[class(init)]`: fields are default-initialized.
    Generated,

    /// Neither `init` nor `no_init`: `init()` is expected in the `#[godot_api] impl I*` block.
    UserDefined,

    /// `#[class(no_init)]`: the engine cannot construct the class.
    Absent,
}

struct ClassAttributes {
    base_ty: Ident,
    init_strategy: InitStrategy,
    is_tool: bool,
    is_editor_plugin: bool,
    rename: Option<Ident>,
    constants: Vec<(Ident, TokenStream)>,
}

fn parse_struct_attributes(class: &Struct) -> ParseResult<ClassAttributes> {
    let mut base_ty = ident("RefCounted");
    let mut init_strategy = InitStrategy::UserDefined;
    let mut is_tool = false;
    let mut is_editor_plugin = false;
    let mut rename = None;
    let mut constants = Vec::new();

    // #[class] attribute on struct
    if let Some(mut parser) = KvParser::parse(&class.attributes, "class")? {
        if let Some(base) = parser.handle_ident("base")? {
            base_ty = base;
        }

        let has_init = parser.handle_alone("init")?;
        let has_no_init = parser.handle_alone("no_init")?;
        init_strategy = match (has_init, has_no_init) {
            (true, true) => {
                return bail!(
                    @span parser.span(),
                    "#[class]: keys `init` and `no_init` are mutually exclusive"
                )
            }
            (true, false) => InitStrategy::Generated,
            (false, true) => InitStrategy::Absent,
            (false, false) => InitStrategy::UserDefined,
        };

        is_tool = parser.handle_alone("tool")?;
        is_editor_plugin = parser.handle_alone("editor_plugin")?;
        rename = parser.handle_ident("rename")?;

        if let Some(entries) = parser.handle_assignments("constants")? {
            constants = entries;
        }

        parser.finish()?;
    }

    // Editor plugins always run in the editor.
    is_tool |= is_editor_plugin;

    Ok(ClassAttributes {
        base_ty,
        init_strategy,
        is_tool,
        is_editor_plugin,
        rename,
        constants,
    })
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Fields

struct Field {
    name: Ident,
    default_val: Option<TokenStream>,
}

struct Fields {
    /// All fields except the base field.
    all_fields: Vec<Field>,

    base_field: Option<Ident>,

    /// `struct MyClass;`
    is_unit: bool,
}

/// Returns field names and 1 base field, if available.
fn parse_fields(class: &Struct) -> ParseResult<Fields> {
    let named_fields: Vec<&NamedField> = match &class.fields {
        venial::Fields::Unit => {
            return Ok(Fields {
                all_fields: vec![],
                base_field: None,
                is_unit: true,
            })
        }
        venial::Fields::Tuple(_) => {
            return bail!(
                class.fields,
                "#[derive(GodotClass)] not supported for tuple structs"
            )
        }
        venial::Fields::Named(fields) => fields.fields.inner.iter().map(|(field, _punct)| field).collect(),
    };

    let mut all_fields = vec![];
    let mut base_field: Option<Ident> = None;

    for named_field in named_fields {
        let explicit_base = match KvParser::parse(&named_field.attributes, "base")? {
            Some(parser) => {
                parser.finish()?;
                true
            }
            None => false,
        };

        // #[base] is optional for fields of type Base<T>.
        if explicit_base || util::is_base_type(&named_field.ty) {
            if let Some(prev_base) = &base_field {
                return bail!(
                    named_field.name,
                    "#[base] allowed for at most 1 field, already applied to `{prev_base}`"
                );
            }

            base_field = Some(named_field.name.clone());
            continue;
        }

        // #[init(val = ...)]
        let default_val = match KvParser::parse(&named_field.attributes, "init")? {
            Some(mut parser) => {
                let value = parser.handle_expr("val")?;
                parser.finish()?;
                value
            }
            None => None,
        };

        all_fields.push(Field {
            name: named_field.name.clone(),
            default_val,
        });
    }

    Ok(Fields {
        all_fields,
        base_field,
        is_unit: false,
    })
}

/// Constructor for `#[class(init)]`: the base field receives the base object, all others their default value.
fn make_godot_default_impl(class_name: &Ident, fields: &Fields) -> TokenStream {
    let body = if fields.is_unit {
        quote! { Self }
    } else {
        let rest_init = fields.all_fields.iter().map(|field| {
            let field_name = &field.name;
            let value = match &field.default_val {
                Some(default_val) => quote! { #default_val },
                None => quote! { ::std::default::Default::default() },
            };

            quote! { #field_name: #value, }
        });

        let base_init = match &fields.base_field {
            Some(base_name) => quote! { #base_name: base, },
            None => TokenStream::new(),
        };

        quote! {
            Self {
                #( #rest_init )*
                #base_init
            }
        }
    };

    // Without base field, the base object is still created; the instance just doesn't keep a pointer to it.
    let base_param = if fields.base_field.is_some() {
        quote! { base }
    } else {
        quote! { _base }
    };

    quote! {
        impl ::gdlink::obj::cap::GodotDefault for #class_name {
            fn __godot_user_init(#base_param: ::gdlink::obj::Base<Self::Base>) -> Self {
                #body
            }
        }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn derive(tokens: TokenStream) -> ParseResult<String> {
        let item = venial::parse_item(tokens)?;
        derive_godot_class(item).map(|output| output.to_string().replace(' ', ""))
    }

    #[test]
    fn named_fields_with_base() {
        let output = derive(quote! {
            #[class(init, base = Node)]
            struct Player {
                #[init(val = 3)]
                lives: i64,
                name: String,
                #[base]
                base: Base<Node>,
            }
        })
        .unwrap_or_else(|err| panic!("derive failed: {err:?}"));

        assert!(output.contains("impl::gdlink::obj::GodotClassforPlayer"), "{output}");
        assert!(output.contains("lives:3,"), "{output}");
        assert!(output.contains("name:::std::default::Default::default(),"), "{output}");
        assert!(output.contains("base:base,"), "{output}");
    }

    #[test]
    fn unit_struct() {
        let output = derive(quote! {
            #[class(init)]
            struct Marker;
        })
        .unwrap_or_else(|err| panic!("derive failed: {err:?}"));

        assert!(output.contains("typeBase=::gdlink::classes::RefCounted;"), "{output}");
    }

    #[test]
    fn init_and_no_init_conflict() {
        let result = derive(quote! {
            #[class(init, no_init, base = Node)]
            struct Conflicted {
                base: Base<Node>,
            }
        });

        assert!(result.is_err());
    }

    #[test]
    fn tuple_struct_rejected() {
        let result = derive(quote! {
            #[class(init)]
            struct Pair(i64, i64);
        });

        assert!(result.is_err());
    }
}

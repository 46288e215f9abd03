/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use quote::ToTokens;

use crate::context::Context;
use crate::models::json::{load_extension_api, JsonExtensionApi};
use crate::ownership::{arg_ownership, return_ownership, ArgOwnership, ReturnOwnership};
use crate::{conv, generate_from_api, util};

fn bundled_api() -> JsonExtensionApi {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("input")
        .join("extension_api.json");

    let json = std::fs::read_to_string(&path).expect("bundled extension_api.json is readable");
    load_extension_api(&json).expect("bundled extension_api.json is valid")
}

/// Token streams print with spaces between all tokens; compare without them.
fn squash(code: impl ToString) -> String {
    code.to_string().split_whitespace().collect()
}

#[test]
fn test_pascal_conversion() {
    #[rustfmt::skip]
    let mappings = [
                        ("AABB", "Aabb"),
                         ("RID", "Rid"),
                  ("InputEvent", "InputEvent"),
                 ("ProcessMode", "ProcessMode"),
                     ("JSONRPC", "JsonRpc"),
                 ("Transform3D", "Transform3D"),
    ];

    for (class_name, expected) in mappings {
        let actual = conv::to_pascal_case(class_name);
        assert_eq!(actual, expected, "PascalCase: ident `{class_name}`");
    }
}

#[test]
fn test_snake_conversion() {
    #[rustfmt::skip]
    let mappings = [
                          ("OS", "os"),
                        ("Node", "node"),
                  ("CanvasItem", "canvas_item"),
                ("TabContainer", "tab_container"),
                      ("Node2D", "node_2d"),
                     ("JSONRPC", "json_rpc"),
          ("force_readable_name", "force_readable_name"),
    ];

    for (class_name, expected) in mappings {
        let actual = conv::to_snake_case(class_name);
        assert_eq!(actual, expected, "snake_case: ident `{class_name}`");
    }
}

#[test]
fn test_reserved_identifiers() {
    assert_eq!(util::safe_ident("type").to_string(), "type_");
    assert_eq!(util::safe_ident("class").to_string(), "class");
    assert_eq!(conv::to_virtual_method_name("_ready").to_string(), "ready");
    assert_eq!(conv::to_virtual_method_name("_input").to_string(), "input");
}

#[test]
fn test_type_mapping() {
    let api = bundled_api();
    let ctx = Context::build_from_api(&api);

    let map = |ty: &str, meta: Option<&str>| {
        conv::to_rust_type(ty, meta, &ctx).map(|rust_ty| squash(rust_ty.to_token_stream()))
    };

    assert_eq!(map("int", None).as_deref(), Some("i64"));
    assert_eq!(map("int", Some("int32")).as_deref(), Some("i32"));
    assert_eq!(map("int", Some("uint64")).as_deref(), Some("u64"));
    assert_eq!(map("float", None).as_deref(), Some("f64"));
    assert_eq!(map("float", Some("float")).as_deref(), Some("f32"));
    assert_eq!(map("bool", None).as_deref(), Some("bool"));
    assert_eq!(map("String", None).as_deref(), Some("crate::builtin::GString"));
    assert_eq!(map("StringName", None).as_deref(), Some("crate::builtin::StringName"));
    assert_eq!(
        map("enum::Node.ProcessMode", None).as_deref(),
        Some("crate::classes::node::ProcessMode")
    );
    assert_eq!(map("enum::Error", None).as_deref(), Some("crate::global::Error"));
    assert_eq!(map("TabBar", None).as_deref(), Some("crate::classes::TabBar"));

    // Unsupported: no marshalling, unknown class, or enum/bitfield mismatch.
    assert!(map("int", Some("int8")).is_none());
    assert!(map("Vector2", None).is_none());
    assert!(map("NodePath", None).is_none());
    assert!(map("Texture2D", None).is_none());
    assert!(map("typedarray::Dictionary", None).is_none());
    assert!(map("enum::Object.ConnectFlags", None).is_none());
    assert!(map("bitfield::Object.ConnectFlags", None).is_some());
}

#[test]
fn test_ownership_table() {
    let api = bundled_api();
    let ctx = Context::build_from_api(&api);

    assert_eq!(arg_ownership("Node", "add_child", "node"), ArgOwnership::Transferred);
    assert_eq!(arg_ownership("Node", "add_sibling", "sibling"), ArgOwnership::Transferred);
    assert_eq!(arg_ownership("Node", "remove_child", "node"), ArgOwnership::Borrowed);
    assert_eq!(arg_ownership("Node", "set_owner", "owner"), ArgOwnership::Borrowed);

    #[rustfmt::skip]
    let returns = [
        ("Node",         "get_child",       "Node",     ReturnOwnership::MustAssertInstanceId),
        ("Node",         "get_parent",      "Node",     ReturnOwnership::MustAssertInstanceId),
        ("Node",         "duplicate",       "Node",     ReturnOwnership::Owned),
        ("Resource",     "duplicate",       "Resource", ReturnOwnership::RefCounted),
        ("TabContainer", "get_tab_bar",     "TabBar",   ReturnOwnership::LifetimeBound),
        ("TabContainer", "get_tab_control", "Control",  ReturnOwnership::MustAssertInstanceId),
        ("Node",         "create_helper",   "Node",     ReturnOwnership::Owned),
    ];

    for (class, method, returned, expected) in returns {
        assert_eq!(
            return_ownership(class, method, returned, &ctx),
            expected,
            "{class}::{method}() -> {returned}"
        );
    }
}

#[test]
fn test_ancestors() {
    let api = bundled_api();
    let ctx = Context::build_from_api(&api);

    assert_eq!(
        ctx.ancestors("TabContainer"),
        ["Container", "Control", "CanvasItem", "Node", "Object"]
    );
    assert_eq!(ctx.ancestors("InputEvent"), ["Resource", "RefCounted", "Object"]);
    assert!(ctx.ancestors("Object").is_empty());
    assert!(ctx.is_singleton("Engine"));
    assert!(!ctx.is_singleton("Node"));
}

#[test]
fn test_generated_classes() {
    let api = bundled_api();
    let generated = generate_from_api(&api).expect("bundled API generates");

    assert_eq!(generated.stats.classes, api.classes.len());
    // get_property_list, get_node_or_null, set_custom_minimum_size, add_tab, get_version_info.
    assert_eq!(generated.stats.skipped_methods, 5);
    assert!(generated.stats.methods > 50);

    let classes = squash(&generated.classes);

    // Object arguments follow the ownership table.
    assert!(classes.contains(
        "pubfnadd_child<TNode:crate::obj::Inherits<crate::classes::Node>>(&mutself,node:&crate::obj::Gd<TNode>,"
    ));
    assert!(classes.contains(
        ".object_arg(node,crate::meta::ArgPassing::Transferred,crate::meta::ClassName::from_static(\"Node\"))"
    ));

    // Returns: object returns are optional and tagged.
    assert!(classes.contains("pubfnget_child(&self,idx:i64,include_internal:bool)->Option<crate::obj::Gd<crate::classes::Node>>"));
    assert!(classes.contains(".finish_object::<crate::classes::TabBar>(crate::meta::ReturnOwnership::LifetimeBound)"));
    assert!(classes.contains("pubfnkill(&mutself,pid:i64)->crate::global::Error"));
    assert!(classes.contains("pubfnget_parent(&self)->Option<crate::obj::Gd<crate::classes::Node>>"));

    // Method binds carry class, name and hash.
    assert!(classes.contains("crate::meta::MethodBind::new(\"Node\",\"add_child\",3863233950)"));

    // Unsupported methods are left out.
    assert!(!classes.contains("fnget_node_or_null"));
    assert!(!classes.contains("fnset_custom_minimum_size"));

    // Hierarchy.
    assert!(classes.contains("unsafeimplcrate::obj::Inherits<crate::classes::CanvasItem>forTabContainer{}"));
    assert!(classes.contains("typeMemory=crate::obj::bounds::MemRefCounted;typeDynMemory=crate::obj::bounds::MemRefCounted;"));
    assert!(classes.contains("typeMemory=crate::obj::bounds::MemManual;typeDynMemory=crate::obj::bounds::MemDynamic;"));
    assert!(classes.contains("typeBase=crate::obj::NoBase;"));
    assert!(classes.contains("implcrate::obj::cap::GodotDefaultforNode{}"));
    assert!(!classes.contains("implcrate::obj::cap::GodotDefaultforEngine{}"));
    assert!(!classes.contains("implcrate::obj::cap::GodotDefaultforCanvasItem{}"));
    assert!(classes.contains("pubfnsingleton()->crate::obj::Gd<Self>"));

    // Central table and re-exports.
    assert!(classes.contains("pubconstAPI_VERSION:(u32,u32)=(4,2);"));
    assert!(classes.contains("pubusetab_container::{TabContainer,ITabContainer};"));
    assert!(classes.contains("tab_container::TabContainer::CLASS_INFO,"));
    assert!(classes.contains("macro_rules!inherits_transitive_Control"));

    // Constants and signals.
    assert!(classes.contains("pubconstNOTIFICATION_READY:i32=13;"));
    assert!(classes.contains("pubconstDEVICE_ID_EMULATION:i32=-1;"));
    assert!(classes.contains("pubconstTREE_ENTERED:&str=\"tree_entered\";"));
}

#[test]
fn test_generated_virtual_traits() {
    let api = bundled_api();
    let generated = generate_from_api(&api).expect("bundled API generates");
    let classes = squash(&generated.classes);

    assert!(classes.contains("pubtraitINode:crate::obj::UserClass"));
    assert!(classes.contains("fnprocess(&mutself,delta:f64){}"));
    assert!(classes.contains("fninput(&mutself,event:crate::obj::Gd<crate::classes::InputEvent>){}"));
    assert!(classes.contains("\"_ready\"ifoverridden.contains(&\"ready\")"));
    assert!(classes.contains("crate::private::object_from_virtual_arg::<crate::classes::InputEvent>(*args.add(0usize))"));

    // Subclass traits include base class virtuals.
    let control_trait_start = classes.find("pubtraitIControl").expect("IControl generated");
    let control_trait = &classes[control_trait_start..];
    let control_trait = &control_trait[..control_trait.find("fn__virtual_call").expect("dispatch fn")];
    assert!(control_trait.contains("fndraw(&mutself)"));
    assert!(control_trait.contains("fnready(&mutself)"));
}

#[test]
fn test_const_virtuals_use_shared_bind() {
    let mut api = bundled_api();
    let canvas_item = api
        .classes
        .iter_mut()
        .find(|class| class.name == "CanvasItem")
        .expect("CanvasItem in API");
    let draw = canvas_item
        .methods
        .iter_mut()
        .flatten()
        .find(|method| method.name == "_draw")
        .expect("_draw in API");
    draw.is_const = true;

    let generated = generate_from_api(&api).expect("modified API generates");
    let classes = squash(&generated.classes);

    assert!(classes.contains("fndraw(&self){}"));
    assert!(classes.contains("crate::private::virtual_call_ref::<T,_>(instance,\"draw\""));
    assert!(classes.contains("crate::private::virtual_call::<T,_>(instance,\"process\""));
}

#[test]
fn test_generated_global_enums() {
    let api = bundled_api();
    let generated = generate_from_api(&api).expect("bundled API generates");
    let enums = squash(&generated.global_enums);

    assert!(enums.contains("pubstructError{ord:i32}"));
    assert!(enums.contains("pubconstERR_FILE_NOT_FOUND:Error=Error{ord:7};"));
    assert!(enums.contains("pubconstfnfrom_ord_unchecked(ord:i32)->Self"));
    assert!(enums.contains("crate::impl_ffi_enum!(Error,i32);"));
    assert!(enums.contains("pubstructSide{ord:i32}"));
}

#[test]
fn test_generate_core_files_writes_both_files() {
    let api_json = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("input")
        .join("extension_api.json");
    let out_dir = std::env::temp_dir().join(format!("gdlink-codegen-test-{}", std::process::id()));
    std::fs::create_dir_all(&out_dir).expect("temp dir is writable");

    let stats = crate::generate_core_files(&api_json, &out_dir).expect("generation succeeds");
    assert_eq!(stats.classes, 12);

    let classes = std::fs::read_to_string(out_dir.join("classes.rs")).expect("classes.rs written");
    assert!(classes.starts_with("// Generated by gdlink-codegen"));
    assert!(out_dir.join("global_enums.rs").exists());

    let _ = std::fs::remove_dir_all(&out_dir);
}

#[test]
fn test_invalid_json_is_reported() {
    let err = load_extension_api("{ \"header\": 42 }").err().expect("invalid JSON is rejected");
    assert!(err.contains("invalid extension_api.json"), "{err}");
}

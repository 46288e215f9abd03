/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::error::Error as _;

use gdlink::meta::error::{CallErrorKind, ErrorKind};
use gdlink::meta::{MethodBind, PtrCall};
use gdlink::obj::EngineClass;
use gdlink::prelude::*;
use itest::framework::{expect_engine_error, take_engine_errors};
use itest::itest;

static GET_NAME: MethodBind = MethodBind::new("Node", "get_name", 2002593661);
static GET_NAME_WRONG_HASH: MethodBind = MethodBind::new("Node", "get_name", 12345);
static GET_NAME_MISSING: MethodBind = MethodBind::new("Node", "get_full_name", 2002593661);

itest! {
    fn call_with_matching_hash() {
        let mut node = Node::new_alloc();
        node.set_name("Named");

        let name = PtrCall::begin(&GET_NAME, node.__handle()).finish::<StringName>();
        assert_eq!(name.expect("bind resolves"), "Named");

        node.free();
    }
}

itest! {
    fn call_with_hash_mismatch() {
        let node = Node::new_alloc();

        let err = PtrCall::begin(&GET_NAME_WRONG_HASH, node.__handle())
            .finish::<StringName>()
            .expect_err("hash does not match");

        assert_eq!(err.kind(), CallErrorKind::MissingMethod);
        assert_eq!(err.class_name(), "Node");
        assert_eq!(err.method_name(), "get_name");
        assert_eq!(
            err.to_string(),
            "Node::get_name(): engine has no method bind with hash 12345"
        );
        expect_engine_error("hash mismatch for method 'Node::get_name'");

        // Failed lookups are retried, and reported again.
        let again = PtrCall::begin(&GET_NAME_WRONG_HASH, node.__handle()).finish::<StringName>();
        assert!(again.is_err());
        expect_engine_error("hash mismatch");

        node.free();
    }
}

itest! {
    fn call_unknown_method() {
        let node = Node::new_alloc();

        let err = PtrCall::begin(&GET_NAME_MISSING, node.__handle())
            .finish::<StringName>()
            .expect_err("method does not exist");

        assert_eq!(err.kind(), CallErrorKind::MissingMethod);
        expect_engine_error("'Node::get_full_name' not found");

        node.free();
    }
}

itest! {
    fn call_on_dead_receiver_skips_engine() {
        let node = Node::new_alloc();
        let stale = node.clone();
        let id = node.instance_id();
        node.free();

        let err = PtrCall::begin(&GET_NAME_WRONG_HASH, stale.__handle())
            .finish::<StringName>()
            .expect_err("receiver is dead");

        // The receiver check fails before the bind is looked up, so the engine reports nothing.
        assert_eq!(err.kind(), CallErrorKind::DeadInstance);
        assert_eq!(
            err.to_string(),
            format!("Node::get_name(): receiver instance {id} has been freed")
        );
        assert!(err.source().is_none());
        assert!(take_engine_errors().is_empty());
    }
}

itest! {
    fn convert_error_describes_failure() {
        let node = Node::new_alloc();
        let id = node.instance_id();

        let err = Gd::<Control>::try_from_instance_id(id).expect_err("Node is not a Control");
        match err.kind() {
            ErrorKind::WrongClass { expected, actual } => {
                assert_eq!(expected.as_str(), "Control");
                assert_eq!(actual, "Node");
            }
            other => panic!("unexpected error kind: {other:?}"),
        }
        assert!(err.to_string().starts_with("expected class Control, got Node"));

        node.free();

        let err = Gd::<Node>::try_from_instance_id(id).expect_err("object is freed");
        assert_eq!(err.kind(), &ErrorKind::InvalidInstanceId);
        assert_eq!(err.value(), Some(id.to_string().as_str()));
    }
}

#[cfg(feature = "debug-checks")]
itest! {
    fn call_with_wrong_argument_class() {
        use gdlink::classes::node::InternalMode;
        use gdlink::meta::ArgPassing;
        use gdlink::meta::ClassName;

        static ADD_CHILD: MethodBind = MethodBind::new("Node", "add_child", 3863233950);

        let parent = Node::new_alloc();
        let resource: Gd<Object> = Resource::new_gd().upcast();
        let force_readable = false;
        let internal = InternalMode::INTERNAL_MODE_DISABLED;

        let err = PtrCall::begin(&ADD_CHILD, parent.__handle())
            .object_arg(&resource, ArgPassing::Transferred, ClassName::from_static("Node"))
            .arg(&force_readable)
            .arg(&internal)
            .finish::<()>()
            .expect_err("Resource is not a Node");

        assert_eq!(err.kind(), CallErrorKind::WrongArgumentClass);
        assert_eq!(err.to_string(), "Node::add_child(): argument #0 has wrong class");
        assert!(err.message(true).contains("Source: expected class Node, got Resource"));
        assert!(err.source().is_some());

        parent.free();
    }
}

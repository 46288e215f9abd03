/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use gdlink::meta::error::ErrorKind;
use gdlink::obj::Ownership;
use gdlink::prelude::*;
use itest::framework::expect_panic;
use itest::{itest, mock};

itest! {
    fn object_construct_and_free() {
        let node = Node::new_alloc();
        let id = node.instance_id();

        assert_eq!(node.ownership(), Ownership::Owned);
        assert!(mock::is_alive(id.to_u64()));
        assert_eq!(mock::class_of(id.to_u64()).as_deref(), Some("Node"));

        node.free();
        assert!(!mock::is_alive(id.to_u64()));
    }
}

itest! {
    fn object_owned_is_destroyed_on_drop() {
        let id = {
            let node = Node::new_alloc();
            node.instance_id()
        };

        assert!(!mock::is_alive(id.to_u64()));
    }
}

itest! {
    fn object_instance_id_matches_engine() {
        let node = Node::new_alloc();
        let id = node.instance_id();

        assert_eq!(node.get_instance_id(), id.to_u64());
        assert!(!id.is_ref_counted());
        assert!(id.lookup_validity());

        node.free();
        assert!(!id.lookup_validity());
    }
}

itest! {
    fn object_validity_after_free() {
        let node = Node::new_alloc();
        let copy = node.clone();
        assert!(copy.is_instance_valid());

        node.free();

        assert!(!copy.is_instance_valid());
        assert!(copy.instance_id_unchecked().is_some());

        let msg = expect_panic("instance_id() of freed object", || {
            let _ = copy.instance_id();
        });
        assert_eq!(msg, "Gd<Node>::instance_id(): object has been freed");
    }
}

itest! {
    fn object_clone_of_owned_does_not_own() {
        let node = Node::new_alloc();
        let copy = node.clone();

        assert_eq!(copy.ownership(), Ownership::MustAssertInstanceId);
        assert_eq!(node, copy);

        // Dropping the copy leaves the object alive.
        let id = node.instance_id();
        drop(copy);
        assert!(mock::is_alive(id.to_u64()));

        node.free();
    }
}

itest! {
    fn object_from_instance_id() {
        let node = Node::new_alloc();
        let id = node.instance_id();

        let found = Gd::<Node>::from_instance_id(id);
        assert_eq!(found, node);
        assert_eq!(found.ownership(), Ownership::MustAssertInstanceId);

        // Looking up through a base class works too.
        let as_object = Gd::<Object>::from_instance_id(id);
        assert_eq!(as_object.get_class(), "Node");

        drop(found);
        node.free();
    }
}

itest! {
    fn object_from_instance_id_dead() {
        let node = Node::new_alloc();
        let id = node.instance_id();
        node.free();

        let err = Gd::<Node>::try_from_instance_id(id).expect_err("object is dead");
        assert_eq!(err.kind(), &ErrorKind::InvalidInstanceId);
        assert_eq!(
            err.to_string(),
            format!("instance ID does not refer to a live object: {id}")
        );

        let msg = expect_panic("from_instance_id() of freed object", || {
            Gd::<Node>::from_instance_id(id);
        });
        assert!(msg.starts_with(&format!("Gd<Node>::from_instance_id({id}) failed")), "{msg}");
    }
}

itest! {
    fn object_from_instance_id_wrong_class() {
        let node = Node::new_alloc();
        let id = node.instance_id();

        let err = Gd::<RefCounted>::try_from_instance_id(id).expect_err("Node is not RefCounted");
        assert!(matches!(
            err.kind(),
            ErrorKind::WrongClass { expected, actual } if expected.as_str() == "RefCounted" && actual == "Node"
        ));
        assert_eq!(err.to_string(), "expected class RefCounted, got Node");

        node.free();
    }
}

itest! {
    fn object_instance_id_zero() {
        assert!(InstanceId::try_from_i64(0).is_none());
        assert!(InstanceId::try_from_u64(0).is_none());
    }
}

itest! {
    fn object_debug_format() {
        let node = Node::new_alloc();
        let copy = node.clone();
        let id = node.instance_id();

        assert_eq!(format!("{node:?}"), format!("Gd {{ id: {id}, class: Node }}"));

        node.free();
        assert_eq!(format!("{copy:?}"), format!("Gd {{ id: {id}, class: Node, freed }}"));
    }
}

itest! {
    fn object_double_free_panics() {
        let node = Node::new_alloc();
        let copy = node.clone();
        node.free();

        let msg = expect_panic("second free()", move || copy.free());
        assert!(msg.starts_with("Gd<Node>::free(): object has been freed"), "{msg}");
    }
}

itest! {
    fn object_plain_object_alloc_and_free() {
        let object = Object::new_alloc();
        let id = object.instance_id();

        assert_eq!(object.ownership(), Ownership::Owned);
        assert_eq!(mock::class_of(id.to_u64()).as_deref(), Some("Object"));

        object.free();
        assert!(!mock::is_alive(id.to_u64()));
    }
}

itest! {
    fn object_free_of_ref_counted_instance_panics() {
        let resource = Resource::new_gd();
        let id = resource.instance_id();
        let object: Gd<Object> = resource.upcast();
        assert_eq!(object.ownership(), Ownership::RefCounted);

        let msg = expect_panic("free() of ref-counted instance", move || object.free());
        assert!(msg.contains("instance is ref-counted"), "{msg}");

        // The handle still released its reference.
        assert!(!mock::is_alive(id.to_u64()));
    }
}

itest! {
    fn object_call_on_freed_panics() {
        let node = Node::new_alloc();
        let copy = node.clone();
        let id = node.instance_id();
        node.free();

        let msg = expect_panic("call on freed object", || {
            copy.get_name();
        });
        assert_eq!(msg, format!("Node::get_name(): receiver instance {id} has been freed"));
    }
}

itest! {
    fn object_get_class_and_is_class() {
        let node = Node::new_alloc();

        assert_eq!(node.get_class(), "Node");
        assert!(node.is_class("Node"));
        assert!(node.is_class("Object"));
        assert!(!node.is_class("RefCounted"));

        node.free();
    }
}

itest! {
    fn object_engine_to_string() {
        let mut node = Node::new_alloc();
        let id = node.instance_id();

        // Engine classes use the engine's default representation.
        assert_eq!(Object::to_string(&mut node).to_string(), format!("<Node#{id}>"));
        assert_eq!(mock::object_to_string(node.obj_sys()), format!("<Node#{id}>"));

        node.free();
    }
}

/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use gdlink::classes::node::{InternalMode, ProcessMode};
use gdlink::obj::Ownership;
use gdlink::prelude::*;
use itest::framework::{expect_engine_error, expect_panic, take_engine_errors};
use itest::{itest, mock};

const NOT_INTERNAL: InternalMode = InternalMode::INTERNAL_MODE_DISABLED;

itest! {
    fn node_add_child_transfers_ownership() {
        let mut parent = Node::new_alloc();
        let child = Node::new_alloc();
        let child_id = child.instance_id();

        assert_eq!(child.ownership(), Ownership::Owned);
        parent.add_child(&child, false, NOT_INTERNAL);
        assert_eq!(child.ownership(), Ownership::MustAssertInstanceId);

        assert_eq!(parent.get_child_count(false), 1);
        assert_eq!(child.get_parent(), Some(parent.clone()));

        // The child is no longer owned by its handle, but dies with its parent.
        drop(child);
        assert!(mock::is_alive(child_id.to_u64()));

        parent.free();
        assert!(!mock::is_alive(child_id.to_u64()));
    }
}

itest! {
    fn node_get_child_negative_index() {
        let mut parent = Node::new_alloc();
        let mut first = Node::new_alloc();
        let mut second = Node::new_alloc();
        first.set_name("First");
        second.set_name("Second");

        parent.add_child(&first, false, NOT_INTERNAL);
        parent.add_child(&second, false, NOT_INTERNAL);

        let last = parent.get_child(-1, false).expect("last child exists");
        assert_eq!(last.get_name(), "Second");
        assert_eq!(last.ownership(), Ownership::MustAssertInstanceId);

        let first_again = parent.get_child(0, false).expect("first child exists");
        assert_eq!(first_again, first);

        assert!(parent.get_child(2, false).is_none());
        expect_engine_error("out of bounds");

        parent.free();
    }
}

itest! {
    fn node_sibling_is_placed_after_node() {
        let mut parent = Node::new_alloc();
        let mut first = Node::new_alloc();
        let mut last = Node::new_alloc();
        let mut sibling = Node::new_alloc();
        first.set_name("First");
        last.set_name("Last");
        sibling.set_name("Sibling");

        parent.add_child(&first, false, NOT_INTERNAL);
        parent.add_child(&last, false, NOT_INTERNAL);
        first.add_sibling(&sibling, false);

        assert_eq!(sibling.ownership(), Ownership::MustAssertInstanceId);
        assert_eq!(sibling.get_index(false), 1);
        assert_eq!(last.get_index(false), 2);

        parent.free();
    }
}

itest! {
    fn node_add_sibling_without_parent() {
        let mut orphan = Node::new_alloc();
        let sibling = Node::new_alloc();

        let sibling_id = sibling.instance_id();

        orphan.add_sibling(&sibling, false);
        expect_engine_error("has no parent");

        // The engine did not take the sibling, so its handle still owns it.
        assert_eq!(sibling.ownership(), Ownership::Owned);
        drop(sibling);
        assert!(!mock::is_alive(sibling_id.to_u64()));

        orphan.free();
    }
}

itest! {
    fn node_add_child_through_copy_transfers_ownership() {
        let mut parent = Node::new_alloc();
        let child = Node::new_alloc();
        let copy = child.clone();
        let child_id = child.instance_id();

        parent.add_child(&copy, false, NOT_INTERNAL);

        // Ownership moved for the object, so the original handle gave it up too.
        assert_eq!(copy.ownership(), Ownership::MustAssertInstanceId);
        assert_eq!(child.ownership(), Ownership::MustAssertInstanceId);

        drop(child);
        assert!(mock::is_alive(child_id.to_u64()));
        assert_eq!(parent.get_child_count(false), 1);

        drop(copy);
        parent.free();
        assert!(!mock::is_alive(child_id.to_u64()));
    }
}

itest! {
    fn node_child_names_are_unique() {
        let mut parent = Node::new_alloc();
        let mut a = Node::new_alloc();
        let mut b = Node::new_alloc();
        let c = Node::new_alloc();
        a.set_name("Item");
        b.set_name("Item");

        parent.add_child(&a, false, NOT_INTERNAL);
        parent.add_child(&b, false, NOT_INTERNAL);
        parent.add_child(&c, true, NOT_INTERNAL);

        assert_eq!(a.get_name(), "Item");
        assert_eq!(b.get_name(), "Item2");
        assert_eq!(c.get_name(), "Node");

        parent.free();
    }
}

itest! {
    fn node_remove_child_returns_ownership_to_caller(ctx: &TestContext) {
        let mut root = ctx.root.clone();
        let node = Node::new_alloc();

        root.add_child(&node, false, NOT_INTERNAL);
        assert!(node.is_inside_tree());

        root.remove_child(&node);
        assert!(!node.is_inside_tree());
        assert!(node.get_parent().is_none());

        // Removed nodes are orphans and must be freed manually.
        node.free();
    }
}

itest! {
    fn node_remove_non_child() {
        let mut parent = Node::new_alloc();
        let stranger = Node::new_alloc();

        parent.remove_child(&stranger);
        expect_engine_error("not a child");

        parent.free();
        stranger.free();
    }
}

itest! {
    fn node_owner_must_be_ancestor() {
        let mut parent = Node::new_alloc();
        let mut child = Node::new_alloc();
        let unrelated = Node::new_alloc();
        parent.add_child(&child, false, NOT_INTERNAL);

        child.set_owner(&parent);
        assert_eq!(child.get_owner(), Some(parent.clone()));

        child.set_owner(&unrelated);
        expect_engine_error("invalid owner");
        assert_eq!(child.get_owner(), Some(parent.clone()));

        parent.free();
        unrelated.free();
    }
}

itest! {
    fn node_argument_freed_panics() {
        let mut parent = Node::new_alloc();
        let child = Node::new_alloc();
        let stale = child.clone();
        child.free();

        let msg = expect_panic("add_child() with freed argument", || {
            parent.add_child(&stale, false, NOT_INTERNAL);
        });
        assert_eq!(msg, "Node::add_child(): argument #0 (Node) has been freed");
        assert_eq!(parent.get_child_count(false), 0);

        parent.free();
    }
}

itest! {
    fn node_process_settings() {
        let mut node = Node::new_alloc();

        assert!(!node.is_processing());
        node.set_process(true);
        assert!(node.is_processing());

        assert_eq!(node.get_process_mode(), ProcessMode::PROCESS_MODE_INHERIT);
        node.set_process_mode(ProcessMode::PROCESS_MODE_ALWAYS);
        assert_eq!(node.get_process_mode(), ProcessMode::PROCESS_MODE_ALWAYS);
        assert_eq!(node.get_process_mode().as_str(), "PROCESS_MODE_ALWAYS");

        node.free();
    }
}

itest! {
    fn node_queue_free_at_end_of_frame(ctx: &TestContext) {
        let mut root = ctx.root.clone();
        let mut node = Node::new_alloc();
        root.add_child(&node, false, NOT_INTERNAL);

        node.queue_free();
        assert!(node.is_instance_valid());

        mock::process_frame(0.016);
        assert!(!node.is_instance_valid());
        assert_eq!(root.get_child_count(false), 0);
    }
}

itest! {
    fn node_duplicate_is_owned() {
        let mut original = Node::new_alloc();
        let mut child = Node::new_alloc();
        original.set_name("Original");
        child.set_name("Child");
        original.add_child(&child, false, NOT_INTERNAL);

        let copy = original.duplicate(15).expect("duplicate() returns a new node");
        assert_eq!(copy.ownership(), Ownership::Owned);
        assert_eq!(copy.get_name(), "Original");
        assert_eq!(copy.get_child_count(false), 1);
        assert_ne!(copy.get_child(0, false), Some(child.clone()));

        original.free();
        copy.free();
        assert!(take_engine_errors().is_empty());
    }
}

itest! {
    fn node_in_tree_under_root(ctx: &TestContext) {
        let mut root = ctx.root.clone();
        let mut node = Node::new_alloc();
        node.set_name("InTree");

        assert!(ctx.root.is_inside_tree());
        root.add_child(&node, false, NOT_INTERNAL);

        assert!(node.is_inside_tree());
        assert_eq!(node.get_parent(), Some(ctx.root.clone()));

        root.remove_child(&node);
        node.free();
    }
}

itest! {
    fn node_signal_names() {
        use gdlink::classes::{canvas_item, node, tab_container};

        assert_eq!(node::signals::READY, "ready");
        assert_eq!(node::signals::CHILD_ENTERED_TREE, "child_entered_tree");
        assert_eq!(canvas_item::signals::VISIBILITY_CHANGED, "visibility_changed");
        assert_eq!(tab_container::signals::TAB_CHANGED, "tab_changed");
    }
}

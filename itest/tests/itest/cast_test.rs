/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use gdlink::classes::{TabBar, TabContainer};
use gdlink::obj::Ownership;
use gdlink::prelude::*;
use itest::framework::expect_panic;
use itest::itest;

#[derive(GodotClass)]
#[class(init, base = Control)]
struct Panel {
    base: Base<Control>,
}

itest! {
    fn upcast_keeps_identity() {
        let container = TabContainer::new_alloc();
        let id = container.instance_id();

        let as_node: Gd<Node> = container.upcast();
        assert_eq!(as_node.instance_id(), id);
        assert_eq!(as_node.ownership(), Ownership::Owned);
        assert_eq!(as_node.get_class(), "TabContainer");

        as_node.free();
    }
}

itest! {
    fn upcast_ref_and_mut() {
        let mut container = TabContainer::new_alloc();

        let node: &Node = container.upcast_ref::<Node>();
        assert_eq!(node.get_child_count(true), 1);

        let control: &mut Control = container.upcast_mut::<Control>();
        control.set_tooltip_text("upcast");
        assert_eq!(container.get_tooltip_text(), "upcast");

        container.free();
    }
}

itest! {
    fn downcast_succeeds() {
        let node: Gd<Node> = TabContainer::new_alloc().upcast();

        let control = node.try_cast::<Control>().expect("TabContainer is a Control");
        let container = control.cast::<TabContainer>();
        assert_eq!(container.get_tab_count(), 0);

        container.free();
    }
}

itest! {
    fn downcast_failure_returns_original() {
        let node = Node::new_alloc();
        let id = node.instance_id();

        let node = node.try_cast::<Control>().expect_err("plain Node is not a Control");
        assert_eq!(node.instance_id(), id);
        assert_eq!(node.ownership(), Ownership::Owned);

        node.free();
    }
}

itest! {
    fn downcast_panics_with_classes() {
        let node = Node::new_alloc();
        let copy = node.clone();
        let id = node.instance_id();

        let msg = expect_panic("cast::<TabBar>() of plain Node", move || {
            copy.cast::<TabBar>();
        });
        assert_eq!(
            msg,
            format!("downcast from Node to TabBar failed; instance Gd {{ id: {id}, class: Node }}")
        );

        node.free();
    }
}

itest! {
    fn downcast_of_freed_object_panics() {
        let node = Node::new_alloc();
        let copy = node.clone();
        node.free();

        let msg = expect_panic("try_cast() of freed object", move || {
            let _ = copy.try_cast::<Control>();
        });
        assert!(msg.starts_with("Gd<Node>::try_cast::<Control>(): object has been freed"), "{msg}");
    }
}

itest! {
    fn user_class_casts() {
        let panel = Panel::new_alloc();
        let id = panel.instance_id();

        let as_node: Gd<Node> = panel.upcast();
        assert_eq!(as_node.get_class(), "Panel");
        assert!(as_node.is_class("Control"));

        let as_control = as_node.cast::<Control>();
        let panel = as_control.cast::<Panel>();
        assert_eq!(panel.instance_id(), id);

        // User objects can be reached through their base class handle.
        assert!(panel.bind().base.to_gd().is_instance_valid());

        panel.free();
    }
}

itest! {
    fn user_class_cross_cast_fails() {
        let node: Gd<Node> = Control::new_alloc().upcast();

        let control = node.cast::<Control>();
        let control = control.try_cast::<Panel>().expect_err("engine Control is not a Panel");

        control.free();
    }
}

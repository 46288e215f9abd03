/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use gdlink::classes::node::InternalMode;
use gdlink::classes::{TabBar, TabContainer};
use gdlink::obj::Ownership;
use gdlink::prelude::*;
use itest::framework::{expect_engine_error, expect_panic};
use itest::{itest, mock};

fn add_tab(container: &mut Gd<TabContainer>, name: &str) -> Gd<Control> {
    let mut page = Control::new_alloc();
    page.set_name(name);
    container.add_child(&page, false, InternalMode::INTERNAL_MODE_DISABLED);
    page
}

itest! {
    fn tab_bar_is_bound_to_container() {
        let container = TabContainer::new_alloc();
        let tab_bar = container.get_tab_bar().expect("container has a tab bar");

        assert_eq!(
            tab_bar.ownership(),
            Ownership::LifetimeBound {
                owner: container.instance_id()
            }
        );
        assert_eq!(tab_bar.get_class(), "TabBar");

        // The tab bar is an internal child.
        assert_eq!(container.get_child_count(false), 0);
        assert_eq!(container.get_child_count(true), 1);

        container.free();
    }
}

itest! {
    fn tab_bar_free_panics() {
        let container = TabContainer::new_alloc();
        let tab_bar = container.get_tab_bar().expect("container has a tab bar");
        let tab_bar_id = tab_bar.instance_id();

        let msg = expect_panic("free() of lifetime-bound tab bar", move || tab_bar.free());
        assert_eq!(
            msg,
            format!(
                "Gd<TabBar>::free(): object is owned by instance {} and dies with it",
                container.instance_id()
            )
        );

        assert!(mock::is_alive(tab_bar_id.to_u64()));
        container.free();
        assert!(!mock::is_alive(tab_bar_id.to_u64()));
    }
}

itest! {
    fn tab_bar_invalid_after_container_freed() {
        let container = TabContainer::new_alloc();
        let tab_bar = container.get_tab_bar().expect("container has a tab bar");
        assert!(tab_bar.is_instance_valid());

        container.free();
        assert!(!tab_bar.is_instance_valid());

        let msg = expect_panic("call on tab bar of freed container", || {
            tab_bar.get_tab_count();
        });
        assert!(msg.starts_with("TabBar::get_tab_count(): receiver"), "{msg}");
        assert!(msg.ends_with("has been freed"), "{msg}");
    }
}

itest! {
    fn tab_container_pages() {
        let mut container = TabContainer::new_alloc();
        assert_eq!(container.get_tab_count(), 0);
        assert_eq!(container.get_current_tab(), -1);

        let first = add_tab(&mut container, "General");
        let second = add_tab(&mut container, "Advanced");

        assert_eq!(container.get_tab_count(), 2);
        assert_eq!(container.get_current_tab(), 0);
        assert_eq!(container.get_tab_control(1), Some(second.clone()));

        container.set_current_tab(1);
        assert_eq!(container.get_current_tab(), 1);

        let tab_bar = container.get_tab_bar().expect("container has a tab bar");
        assert_eq!(tab_bar.get_tab_count(), 2);
        assert_eq!(tab_bar.get_tab_title(0), "General");
        assert_eq!(tab_bar.get_tab_title(1), "Advanced");

        // Removing a page shrinks the tab bar and clamps the current tab.
        container.remove_child(&second);
        assert_eq!(container.get_tab_count(), 1);
        assert_eq!(container.get_current_tab(), 0);
        assert_eq!(tab_bar.get_tab_count(), 1);

        drop(first);
        second.free();
        container.free();
    }
}

itest! {
    fn tab_container_invalid_tab_index() {
        let mut container = TabContainer::new_alloc();
        add_tab(&mut container, "Only");

        container.set_current_tab(3);
        expect_engine_error("out of bounds");
        assert_eq!(container.get_current_tab(), 0);

        assert!(container.get_tab_control(-1).is_none());
        expect_engine_error("out of bounds");

        container.free();
    }
}

itest! {
    fn tab_bar_titles() {
        let mut tab_bar: Gd<TabBar> = TabBar::new_alloc();

        tab_bar.set_tab_count(2);
        tab_bar.set_tab_title(1, "Second");
        assert_eq!(tab_bar.get_tab_count(), 2);
        assert_eq!(tab_bar.get_tab_title(0), "");
        assert_eq!(tab_bar.get_tab_title(1), "Second");

        tab_bar.set_tab_title(5, "Missing");
        expect_engine_error("out of bounds");

        tab_bar.free();
    }
}

itest! {
    fn tab_container_is_control(ctx: &TestContext) {
        let mut root = ctx.root.clone();
        let mut container = TabContainer::new_alloc();

        container.set_tooltip_text("Settings");
        assert_eq!(container.get_tooltip_text(), "Settings");
        assert!(container.is_visible());

        container.hide();
        assert!(!container.is_visible());
        container.show();

        root.add_child(&container, false, InternalMode::INTERNAL_MODE_DISABLED);
        let tab_bar = container.get_tab_bar().expect("container has a tab bar");
        assert!(tab_bar.is_inside_tree());

        container.queue_free();
        mock::process_frame(0.0);
        assert!(!tab_bar.is_instance_valid());
    }
}

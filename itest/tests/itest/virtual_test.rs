/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::sync::Mutex;

use gdlink::classes::node::InternalMode;
use gdlink::classes::InputEvent;
use gdlink::obj::Ownership;
use gdlink::prelude::*;
use itest::framework::{expect_engine_error, suppress_panic_log, take_engine_errors};
use itest::{itest, mock};

const NOT_INTERNAL: InternalMode = InternalMode::INTERNAL_MODE_DISABLED;

static EVENTS: Mutex<Vec<String>> = Mutex::new(Vec::new());

fn record(event: String) {
    EVENTS.lock().unwrap().push(event);
}

fn take_events() -> Vec<String> {
    std::mem::take(&mut *EVENTS.lock().unwrap())
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Test classes

#[derive(GodotClass)]
#[class(init, base = Node)]
struct TreeWatcher {
    label: String,
    base: Base<Node>,
}

#[godot_api]
impl INode for TreeWatcher {
    fn enter_tree(&mut self) {
        record(format!("{} enter", self.label));
    }

    fn ready(&mut self) {
        record(format!("{} ready", self.label));
    }

    fn exit_tree(&mut self) {
        record(format!("{} exit", self.label));
    }

    fn on_notification(&mut self, what: i32) {
        record(format!("{} notify {what}", self.label));
    }
}

fn watcher(label: &str) -> Gd<TreeWatcher> {
    let mut node = TreeWatcher::new_alloc();
    node.bind_mut().label = label.to_string();
    node
}

#[derive(GodotClass)]
#[class(init, base = Node)]
struct Ticker {
    ticks: u32,
    elapsed: f64,
    base: Base<Node>,
}

#[godot_api]
impl INode for Ticker {
    fn process(&mut self, delta: f64) {
        self.ticks += 1;
        self.elapsed += delta;
    }
}

#[derive(GodotClass)]
#[class(init, base = Node)]
struct InputSink {
    last_event: Option<Gd<InputEvent>>,
    refcount_during_call: i32,
    ownership_during_call: Option<Ownership>,
    base: Base<Node>,
}

#[godot_api]
impl INode for InputSink {
    fn input(&mut self, event: Gd<InputEvent>) {
        self.refcount_during_call = event.get_reference_count();
        self.ownership_during_call = Some(event.ownership());
        self.last_event = Some(event);
    }
}

#[derive(GodotClass)]
#[class(init, base = Node)]
struct Faulty {
    base: Base<Node>,
}

#[godot_api]
impl INode for Faulty {
    fn ready(&mut self) {
        panic!("ready failed");
    }
}

#[derive(GodotClass)]
#[class(init)]
struct Labelled {
    #[init(val = String::from("unnamed"))]
    label: String,
}

#[godot_api]
impl IRefCounted for Labelled {
    fn to_string(&self) -> GString {
        format!("Labelled({})", self.label).into()
    }
}

#[derive(GodotClass)]
#[class(init, base = Control)]
struct Widget {
    notifications: Vec<i32>,
    base: Base<Control>,
}

#[godot_api]
impl IControl for Widget {
    fn on_notification(&mut self, what: i32) {
        self.notifications.push(what);
    }
}

#[derive(GodotClass)]
#[class(init, base = Container)]
struct Layout {
    sorts: Vec<i32>,
    base: Base<Container>,
}

#[godot_api]
impl IContainer for Layout {
    fn on_notification(&mut self, what: i32) {
        if what == Container::NOTIFICATION_PRE_SORT_CHILDREN || what == Container::NOTIFICATION_SORT_CHILDREN {
            self.sorts.push(what);
        }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Tests

itest! {
    fn virtual_tree_callbacks_in_order(ctx: &TestContext) {
        let mut root = ctx.root.clone();
        let mut parent = watcher("parent");
        let child = watcher("child");

        parent.add_child(&child, false, NOT_INTERNAL);
        take_events();

        root.add_child(&parent, false, NOT_INTERNAL);
        assert_eq!(
            take_events(),
            [
                "parent enter",
                "parent notify 10",
                "child enter",
                "child notify 10",
                "child ready",
                "child notify 13",
                "parent ready",
                "parent notify 13",
            ]
        );

        root.remove_child(&parent);
        assert_eq!(
            take_events(),
            ["child exit", "child notify 11", "parent exit", "parent notify 11"]
        );

        // Re-entering the tree does not make the nodes ready again.
        root.add_child(&parent, false, NOT_INTERNAL);
        let events = take_events();
        assert!(!events.iter().any(|e| e.ends_with("ready")), "{events:?}");

        root.remove_child(&parent);
        take_events();

        parent.free();
        assert_eq!(take_events(), ["parent notify 1", "child notify 1"]);
    }
}

itest! {
    fn virtual_process_receives_delta(ctx: &TestContext) {
        let mut root = ctx.root.clone();
        let mut ticker = Ticker::new_alloc();

        // Not in the tree: no processing.
        mock::process_frame(0.5);
        assert_eq!(ticker.bind().ticks, 0);

        root.add_child(&ticker, false, NOT_INTERNAL);
        assert!(ticker.is_processing());

        mock::process_frame(0.25);
        mock::process_frame(0.25);
        assert_eq!(ticker.bind().ticks, 2);
        assert_eq!(ticker.bind().elapsed, 0.5);

        root.remove_child(&ticker);
        ticker.free();
    }
}

itest! {
    fn virtual_skipped_while_bound(ctx: &TestContext) {
        let mut root = ctx.root.clone();
        let ticker = Ticker::new_alloc();
        root.add_child(&ticker, false, NOT_INTERNAL);

        {
            let guard = ticker.bind();
            mock::process_frame(0.1);
            assert_eq!(guard.ticks, 0);
        }
        expect_engine_error("virtual Ticker::process() skipped");

        mock::process_frame(0.1);
        assert_eq!(ticker.bind().ticks, 1);

        root.remove_child(&ticker);
        ticker.free();
    }
}

itest! {
    fn virtual_input_receives_event(ctx: &TestContext) {
        let mut root = ctx.root.clone();
        let mut sink = InputSink::new_alloc();
        root.add_child(&sink, false, NOT_INTERNAL);

        let event_id = mock::push_input(3, true);

        // The engine holds one reference during dispatch, the handle in the virtual another.
        assert_eq!(sink.bind().refcount_during_call, 2);
        assert_eq!(sink.bind().ownership_during_call, Some(Ownership::RefCounted));
        assert_eq!(mock::reference_count(event_id), Some(1));

        let event = sink.bind_mut().last_event.take().expect("event was received");
        assert_eq!(event.get_device(), 3);
        assert!(event.is_pressed());

        drop(event);
        assert!(!mock::is_alive(event_id));

        root.remove_child(&sink);
        sink.free();
    }
}

itest! {
    fn virtual_panic_is_reported(ctx: &TestContext) {
        let mut root = ctx.root.clone();
        let faulty = Faulty::new_alloc();

        suppress_panic_log(|| root.add_child(&faulty, false, NOT_INTERNAL));

        let errors = take_engine_errors();
        assert_eq!(errors.len(), 1, "{errors:#?}");
        assert!(errors[0].contains("ready failed"), "{}", errors[0]);
        assert!(errors[0].contains("Context: panic in virtual Faulty::ready()"), "{}", errors[0]);

        // The engine continues normally after a panicking virtual.
        assert!(faulty.is_inside_tree());

        root.remove_child(&faulty);
        faulty.free();
    }
}

itest! {
    fn virtual_to_string_override() {
        let mut labelled = Labelled::new_gd();
        assert_eq!(mock::object_to_string(labelled.obj_sys()), "Labelled(unnamed)");

        labelled.bind_mut().label = "renamed".to_string();
        assert_eq!(Object::to_string(&mut labelled).to_string(), "Labelled(renamed)");

        // Classes without override use the engine format.
        let node = Node::new_alloc();
        let expected = format!("<Node#{}>", node.instance_id());
        assert_eq!(mock::object_to_string(node.obj_sys()), expected);
        node.free();
    }
}

itest! {
    fn virtual_visibility_notifications() {
        let mut widget = Widget::new_alloc();

        widget.hide();
        widget.hide();
        widget.show();

        let visibility_changed = CanvasItem::NOTIFICATION_VISIBILITY_CHANGED;
        assert_eq!(widget.bind().notifications, [visibility_changed, visibility_changed]);

        widget.free();
    }
}

itest! {
    fn virtual_container_sort_notifications() {
        let mut layout = Layout::new_alloc();

        layout.queue_sort();
        assert_eq!(layout.bind().sorts, [50, 51]);

        let mut other = layout.clone();
        {
            let _guard = layout.bind_mut();
            other.queue_sort();
        }

        let errors = take_engine_errors();
        assert_eq!(errors.len(), 2, "{errors:#?}");
        assert!(errors[0].contains("Layout::on_notification(50) skipped"), "{}", errors[0]);
        assert!(errors[1].contains("Layout::on_notification(51) skipped"), "{}", errors[1]);
        assert_eq!(layout.bind().sorts, [50, 51]);

        layout.free();
    }
}

/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Method binds of the bundled engine classes, called through `object_method_bind_ptrcall`.
//!
//! Arguments and return values use ptrcall encoding: 64-bit ints and doubles, one-byte bools, object pointers by value, and
//! strings as pointers to their payload.

use gdlink::sys;

use super::classdb;
use super::objects;
use super::strings::{self, read_payload, write_payload};
use super::{with_state, MockState};

type Args = *const sys::GDExtensionConstTypePtr;
type Ret = sys::GDExtensionTypePtr;

/// One engine method, identified by class, name and the hash of its signature.
pub(super) struct MockMethod {
    pub class: &'static str,
    pub name: &'static str,
    pub hash: i64,
    pub call: unsafe fn(usize, Args, Ret),
}

const fn method(class: &'static str, name: &'static str, hash: i64, call: unsafe fn(usize, Args, Ret)) -> MockMethod {
    MockMethod {
        class,
        name,
        hash,
        call,
    }
}

pub(super) fn find(class: &str, name: &str) -> Option<&'static MockMethod> {
    METHODS
        .iter()
        .find(|method| method.class == class && method.name == name)
}

const ERR_FAILED: i64 = 1;
const ERR_INVALID_PARAMETER: i64 = 31;

const NOTIFICATION_PRE_SORT_CHILDREN: i32 = 50;
const NOTIFICATION_SORT_CHILDREN: i32 = 51;

#[rustfmt::skip]
static METHODS: &[MockMethod] = &[
    method("Object",       "get_class",           201670096,  object_get_class),
    method("Object",       "is_class",            3927539163, object_is_class),
    method("Object",       "get_instance_id",     2455072627, object_get_instance_id),
    method("Object",       "to_string",           2841200299, object_to_string),
    method("Object",       "notification",        4023243586, object_notification),

    method("RefCounted",   "init_ref",            2240911060, ref_counted_init_ref),
    method("RefCounted",   "reference",           2240911060, ref_counted_reference),
    method("RefCounted",   "unreference",         2240911060, ref_counted_unreference),
    method("RefCounted",   "get_reference_count", 3905245786, ref_counted_get_reference_count),

    method("Resource",     "set_name",            83702148,   set_name_string),
    method("Resource",     "get_name",            201670096,  get_name_string),
    method("Resource",     "set_local_to_scene",  2586408642, resource_set_local_to_scene),
    method("Resource",     "is_local_to_scene",   36873697,   resource_is_local_to_scene),
    method("Resource",     "duplicate",           482882304,  resource_duplicate),

    method("InputEvent",   "set_device",          1286410249, input_event_set_device),
    method("InputEvent",   "get_device",          3905245786, input_event_get_device),
    method("InputEvent",   "is_pressed",          36873697,   input_event_is_pressed),

    method("Node",         "add_sibling",         2570952461, node_add_sibling),
    method("Node",         "set_name",            3304788590, set_name_string),
    method("Node",         "get_name",            2002593661, get_name_string),
    method("Node",         "add_child",           3863233950, node_add_child),
    method("Node",         "remove_child",        1078189570, node_remove_child),
    method("Node",         "get_child_count",     894402480,  node_get_child_count),
    method("Node",         "get_child",           541253412,  node_get_child),
    method("Node",         "get_parent",          3160264692, node_get_parent),
    method("Node",         "set_owner",           1078189570, node_set_owner),
    method("Node",         "get_owner",           3160264692, node_get_owner),
    method("Node",         "get_index",           894402480,  node_get_index),
    method("Node",         "is_inside_tree",      36873697,   node_is_inside_tree),
    method("Node",         "set_process",         2586408642, node_set_process),
    method("Node",         "is_processing",       36873697,   node_is_processing),
    method("Node",         "set_process_mode",    1841290486, node_set_process_mode),
    method("Node",         "get_process_mode",    739966102,  node_get_process_mode),
    method("Node",         "queue_free",          3218959716, node_queue_free),
    method("Node",         "duplicate",           3511555459, node_duplicate),

    method("CanvasItem",   "set_visible",         2586408642, canvas_item_set_visible),
    method("CanvasItem",   "is_visible",          36873697,   canvas_item_is_visible),
    method("CanvasItem",   "show",                3218959716, canvas_item_show),
    method("CanvasItem",   "hide",                3218959716, canvas_item_hide),

    method("Control",      "set_tooltip_text",    83702148,   control_set_tooltip_text),
    method("Control",      "get_tooltip_text",    201670096,  control_get_tooltip_text),
    method("Control",      "set_focus_mode",      3232914922, control_set_focus_mode),
    method("Control",      "get_focus_mode",      2132829277, control_get_focus_mode),

    method("Container",    "queue_sort",          3218959716, container_queue_sort),

    method("TabContainer", "get_tab_count",       3905245786, tab_container_get_tab_count),
    method("TabContainer", "set_current_tab",     1286410249, tab_container_set_current_tab),
    method("TabContainer", "get_current_tab",     3905245786, tab_container_get_current_tab),
    method("TabContainer", "get_tab_control",     1065994134, tab_container_get_tab_control),
    method("TabContainer", "get_tab_bar",         1865451809, tab_container_get_tab_bar),

    method("TabBar",       "set_tab_count",       1286410249, tab_bar_set_tab_count),
    method("TabBar",       "get_tab_count",       3905245786, tab_bar_get_tab_count),
    method("TabBar",       "set_tab_title",       501894301,  tab_bar_set_tab_title),
    method("TabBar",       "get_tab_title",       844755477,  tab_bar_get_tab_title),

    method("Engine",       "get_frames_drawn",    2455072627, engine_get_frames_drawn),
    method("Engine",       "is_editor_hint",      36873697,   engine_is_editor_hint),
    method("Engine",       "set_time_scale",      373806689,  engine_set_time_scale),
    method("Engine",       "get_time_scale",      191475506,  engine_get_time_scale),

    method("OS",           "get_name",            201670096,  os_get_name),
    method("OS",           "get_processor_count", 3905245786, os_get_processor_count),
    method("OS",           "kill",                844576869,  os_kill),
    method("OS",           "shell_open",          166001499,  os_shell_open),
];

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Interface function

pub(super) unsafe extern "C" fn object_method_bind_ptrcall(
    p_method_bind: sys::GDExtensionMethodBindPtr,
    p_instance: sys::GDExtensionObjectPtr,
    p_args: *const sys::GDExtensionConstTypePtr,
    r_ret: sys::GDExtensionTypePtr,
) {
    if p_method_bind.is_null() {
        classdb::error("ptrcall with null method bind", "object_method_bind_ptrcall");
        return;
    }

    // Binds handed out by classdb_get_method_bind point into METHODS.
    let method = &*(p_method_bind as *const MockMethod);
    let receiver = p_instance as usize;

    let rejection = with_state(|state| match state.objects.get(&receiver) {
        None => Some(format!(
            "{}::{}: receiver {p_instance:?} is not a live object",
            method.class, method.name
        )),
        Some(object) if !state.inherits(&object.class, method.class) => Some(format!(
            "{}::{}: receiver is of class {}",
            method.class, method.name, object.class
        )),
        Some(_) => None,
    });

    if let Some(reason) = rejection {
        classdb::error(reason, "object_method_bind_ptrcall");
        return;
    }

    (method.call)(receiver, p_args, r_ret);
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Argument and return encoding

unsafe fn arg_i64(args: Args, index: usize) -> i64 {
    *(*args.add(index) as *const i64)
}

unsafe fn arg_f64(args: Args, index: usize) -> f64 {
    *(*args.add(index) as *const f64)
}

unsafe fn arg_bool(args: Args, index: usize) -> bool {
    *(*args.add(index) as *const u8) != 0
}

unsafe fn arg_object(args: Args, index: usize) -> usize {
    *(*args.add(index) as *const sys::GDExtensionObjectPtr) as usize
}

unsafe fn arg_string(args: Args, index: usize) -> String {
    read_payload(*args.add(index))
}

unsafe fn ret_i64(ret: Ret, value: i64) {
    *(ret as *mut i64) = value;
}

unsafe fn ret_f64(ret: Ret, value: f64) {
    *(ret as *mut f64) = value;
}

unsafe fn ret_bool(ret: Ret, value: bool) {
    *(ret as *mut u8) = value as u8;
}

unsafe fn ret_object(ret: Ret, object: usize) {
    *(ret as *mut sys::GDExtensionObjectPtr) = object as sys::GDExtensionObjectPtr;
}

/// Replaces the initialized string (or string name) at `ret`.
unsafe fn ret_string(ret: Ret, value: &str) {
    strings::destroy(ret);
    write_payload(ret, value);
}

/// Reads a property of the receiver.
fn read<R>(this: usize, f: impl FnOnce(&objects::ObjectData) -> R) -> R {
    with_state(|state| f(&state.object(this).data))
}

/// Updates a property of the receiver.
fn write(this: usize, f: impl FnOnce(&mut objects::ObjectData)) {
    with_state(|state| f(&mut state.object_mut(this).data))
}

/// Resolves a possibly negative index against `len`, like the engine's `get_child()`.
fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let index = if index < 0 { index + len } else { index };

    (0..len).contains(&index).then_some(index as usize)
}

fn index_error(index: i64, len: usize, function: &str) {
    classdb::error(format!("index p_index = {index} is out of bounds (size = {len})"), function);
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Object

unsafe fn object_get_class(this: usize, _args: Args, ret: Ret) {
    let class = with_state(|state| state.object(this).class.clone());
    ret_string(ret, &class);
}

unsafe fn object_is_class(this: usize, args: Args, ret: Ret) {
    let base = arg_string(args, 0);
    let result = with_state(|state| state.inherits(&state.object(this).class, &base));
    ret_bool(ret, result);
}

unsafe fn object_get_instance_id(this: usize, _args: Args, ret: Ret) {
    let id = with_state(|state| state.object(this).id);
    ret_i64(ret, id as i64);
}

unsafe fn object_to_string(this: usize, _args: Args, ret: Ret) {
    let text = objects::to_string(this);
    ret_string(ret, &text);
}

unsafe fn object_notification(this: usize, args: Args, _ret: Ret) {
    let what = arg_i64(args, 0) as i32;
    let reversed = arg_bool(args, 1);
    objects::notify_extension(this, what, reversed);
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// RefCounted

// The engine's first init_ref() turns the initial count into a real reference; in the mock, counts start at 0.
unsafe fn ref_counted_init_ref(this: usize, _args: Args, ret: Ret) {
    objects::reference_object(this);
    ret_bool(ret, true);
}

unsafe fn ref_counted_reference(this: usize, _args: Args, ret: Ret) {
    objects::reference_object(this);
    ret_bool(ret, true);
}

/// Returns whether the object should be destroyed; destruction is left to the caller.
unsafe fn ref_counted_unreference(this: usize, _args: Args, ret: Ret) {
    let last = objects::decrement_refcount(this);
    ret_bool(ret, last);
}

unsafe fn ref_counted_get_reference_count(this: usize, _args: Args, ret: Ret) {
    let count = with_state(|state| state.object(this).refcount);
    ret_i64(ret, count as i64);
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Resource, InputEvent

unsafe fn set_name_string(this: usize, args: Args, _ret: Ret) {
    let name = arg_string(args, 0);
    write(this, |data| data.name = name);
}

unsafe fn get_name_string(this: usize, _args: Args, ret: Ret) {
    let name = read(this, |data| data.name.clone());
    ret_string(ret, &name);
}

unsafe fn resource_set_local_to_scene(this: usize, args: Args, _ret: Ret) {
    let enable = arg_bool(args, 0);
    write(this, |data| data.local_to_scene = enable);
}

unsafe fn resource_is_local_to_scene(this: usize, _args: Args, ret: Ret) {
    ret_bool(ret, read(this, |data| data.local_to_scene));
}

/// Returns a new resource, passing one reference to the caller.
unsafe fn resource_duplicate(this: usize, _args: Args, ret: Ret) {
    let copy = objects::duplicate(this);
    if copy != 0 {
        objects::reference_object(copy);
    }

    ret_object(ret, copy);
}

unsafe fn input_event_set_device(this: usize, args: Args, _ret: Ret) {
    let device = arg_i64(args, 0);
    write(this, |data| data.device = device);
}

unsafe fn input_event_get_device(this: usize, _args: Args, ret: Ret) {
    ret_i64(ret, read(this, |data| data.device));
}

unsafe fn input_event_is_pressed(this: usize, _args: Args, ret: Ret) {
    ret_bool(ret, read(this, |data| data.pressed));
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Node

unsafe fn node_add_child(this: usize, args: Args, _ret: Ret) {
    let child = arg_object(args, 0);
    let force_readable_name = arg_bool(args, 1);
    let internal = arg_i64(args, 2) != 0;

    objects::add_child(this, child, internal, force_readable_name);
}

unsafe fn node_add_sibling(this: usize, args: Args, _ret: Ret) {
    let sibling = arg_object(args, 0);
    let force_readable_name = arg_bool(args, 1);

    let parent = read(this, |data| data.parent);
    if parent == 0 {
        classdb::error("cannot add sibling: node has no parent", "Node::add_sibling");
        return;
    }

    objects::add_child(parent, sibling, false, force_readable_name);

    // Siblings are placed directly after the node.
    with_state(|state| {
        let children = &mut state.object_mut(parent).data.children;
        if let Some(added) = children.iter().position(|c| c.ptr == sibling) {
            let entry = children.remove(added);
            let position = children.iter().position(|c| c.ptr == this).map_or(children.len(), |p| p + 1);
            children.insert(position, entry);
        }
    });
}

unsafe fn node_remove_child(this: usize, args: Args, _ret: Ret) {
    let child = arg_object(args, 0);
    objects::remove_child(this, child);
}

unsafe fn node_get_child_count(this: usize, args: Args, ret: Ret) {
    let include_internal = arg_bool(args, 0);
    let count = with_state(|state| state.children_of(this, include_internal).len());
    ret_i64(ret, count as i64);
}

unsafe fn node_get_child(this: usize, args: Args, ret: Ret) {
    let index = arg_i64(args, 0);
    let include_internal = arg_bool(args, 1);

    let children = with_state(|state| state.children_of(this, include_internal));
    match resolve_index(index, children.len()) {
        Some(i) => ret_object(ret, children[i]),
        None => {
            index_error(index, children.len(), "Node::get_child");
            ret_object(ret, 0);
        }
    }
}

unsafe fn node_get_parent(this: usize, _args: Args, ret: Ret) {
    ret_object(ret, read(this, |data| data.parent));
}

unsafe fn node_set_owner(this: usize, args: Args, _ret: Ret) {
    let owner = arg_object(args, 0);

    let is_ancestor = with_state(|state| is_ancestor_of(state, owner, this));
    if owner != 0 && !is_ancestor {
        classdb::error("invalid owner: owner must be an ancestor of the node", "Node::set_owner");
        return;
    }

    write(this, |data| data.owner = owner);
}

fn is_ancestor_of(state: &MockState, ancestor: usize, node: usize) -> bool {
    let mut current = state.objects.get(&node).map_or(0, |o| o.data.parent);

    while current != 0 {
        if current == ancestor {
            return true;
        }
        current = state.objects.get(&current).map_or(0, |o| o.data.parent);
    }

    false
}

unsafe fn node_get_owner(this: usize, _args: Args, ret: Ret) {
    let owner = with_state(|state| {
        let owner = state.object(this).data.owner;
        if state.objects.contains_key(&owner) {
            owner
        } else {
            0
        }
    });

    ret_object(ret, owner);
}

unsafe fn node_get_index(this: usize, args: Args, ret: Ret) {
    let include_internal = arg_bool(args, 0);

    let index = with_state(|state| {
        let parent = state.object(this).data.parent;
        state
            .children_of(parent, include_internal)
            .iter()
            .position(|child| *child == this)
            .map_or(-1, |i| i as i64)
    });

    ret_i64(ret, index);
}

unsafe fn node_is_inside_tree(this: usize, _args: Args, ret: Ret) {
    ret_bool(ret, read(this, |data| data.inside_tree));
}

unsafe fn node_set_process(this: usize, args: Args, _ret: Ret) {
    let enable = arg_bool(args, 0);
    write(this, |data| data.processing = enable);
}

unsafe fn node_is_processing(this: usize, _args: Args, ret: Ret) {
    ret_bool(ret, read(this, |data| data.processing));
}

unsafe fn node_set_process_mode(this: usize, args: Args, _ret: Ret) {
    let mode = arg_i64(args, 0);
    write(this, |data| data.process_mode = mode);
}

unsafe fn node_get_process_mode(this: usize, _args: Args, ret: Ret) {
    ret_i64(ret, read(this, |data| data.process_mode));
}

/// Deletion happens at the end of the next [`super::process_frame()`].
unsafe fn node_queue_free(this: usize, _args: Args, _ret: Ret) {
    with_state(|state| {
        let data = &mut state.object_mut(this).data;
        if !std::mem::replace(&mut data.queued_for_deletion, true) {
            state.deletion_queue.push(this);
        }
    });
}

unsafe fn node_duplicate(this: usize, _args: Args, ret: Ret) {
    ret_object(ret, objects::duplicate(this));
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// CanvasItem, Control, Container

unsafe fn canvas_item_set_visible(this: usize, args: Args, _ret: Ret) {
    objects::set_visible(this, arg_bool(args, 0));
}

unsafe fn canvas_item_is_visible(this: usize, _args: Args, ret: Ret) {
    ret_bool(ret, read(this, |data| data.visible));
}

unsafe fn canvas_item_show(this: usize, _args: Args, _ret: Ret) {
    objects::set_visible(this, true);
}

unsafe fn canvas_item_hide(this: usize, _args: Args, _ret: Ret) {
    objects::set_visible(this, false);
}

unsafe fn control_set_tooltip_text(this: usize, args: Args, _ret: Ret) {
    let hint = arg_string(args, 0);
    write(this, |data| data.tooltip = hint);
}

unsafe fn control_get_tooltip_text(this: usize, _args: Args, ret: Ret) {
    let tooltip = read(this, |data| data.tooltip.clone());
    ret_string(ret, &tooltip);
}

unsafe fn control_set_focus_mode(this: usize, args: Args, _ret: Ret) {
    let mode = arg_i64(args, 0);
    write(this, |data| data.focus_mode = mode);
}

unsafe fn control_get_focus_mode(this: usize, _args: Args, ret: Ret) {
    ret_i64(ret, read(this, |data| data.focus_mode));
}

// The engine defers sorting to the end of the frame; the mock sorts right away.
unsafe fn container_queue_sort(this: usize, _args: Args, _ret: Ret) {
    objects::notify_extension(this, NOTIFICATION_PRE_SORT_CHILDREN, false);
    objects::notify_extension(this, NOTIFICATION_SORT_CHILDREN, false);
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// TabContainer, TabBar

/// Tabs of a container: its non-internal `Control` children.
fn tabs_of(state: &MockState, container: usize) -> Vec<usize> {
    state
        .children_of(container, false)
        .into_iter()
        .filter(|child| state.inherits(&state.object(*child).class, "Control"))
        .collect()
}

unsafe fn tab_container_get_tab_count(this: usize, _args: Args, ret: Ret) {
    let count = with_state(|state| tabs_of(state, this).len());
    ret_i64(ret, count as i64);
}

unsafe fn tab_container_set_current_tab(this: usize, args: Args, _ret: Ret) {
    let index = arg_i64(args, 0);
    let count = with_state(|state| tabs_of(state, this).len());

    if index < 0 || index as usize >= count {
        index_error(index, count, "TabContainer::set_current_tab");
        return;
    }

    write(this, |data| data.current_tab = index);
}

unsafe fn tab_container_get_current_tab(this: usize, _args: Args, ret: Ret) {
    ret_i64(ret, read(this, |data| data.current_tab));
}

unsafe fn tab_container_get_tab_control(this: usize, args: Args, ret: Ret) {
    let index = arg_i64(args, 0);
    let tabs = with_state(|state| tabs_of(state, this));

    match usize::try_from(index).ok().filter(|i| *i < tabs.len()) {
        Some(i) => ret_object(ret, tabs[i]),
        None => {
            index_error(index, tabs.len(), "TabContainer::get_tab_control");
            ret_object(ret, 0);
        }
    }
}

unsafe fn tab_container_get_tab_bar(this: usize, _args: Args, ret: Ret) {
    ret_object(ret, read(this, |data| data.tab_bar));
}

unsafe fn tab_bar_set_tab_count(this: usize, args: Args, _ret: Ret) {
    let count = arg_i64(args, 0);
    if count < 0 {
        classdb::error(format!("tab count must not be negative, got {count}"), "TabBar::set_tab_count");
        return;
    }

    write(this, |data| data.tab_titles.resize(count as usize, String::new()));
}

unsafe fn tab_bar_get_tab_count(this: usize, _args: Args, ret: Ret) {
    let count = read(this, |data| data.tab_titles.len());
    ret_i64(ret, count as i64);
}

unsafe fn tab_bar_set_tab_title(this: usize, args: Args, _ret: Ret) {
    let index = arg_i64(args, 0);
    let title = arg_string(args, 1);

    let count = read(this, |data| data.tab_titles.len());
    match usize::try_from(index).ok().filter(|i| *i < count) {
        Some(i) => write(this, |data| data.tab_titles[i] = title),
        None => index_error(index, count, "TabBar::set_tab_title"),
    }
}

unsafe fn tab_bar_get_tab_title(this: usize, args: Args, ret: Ret) {
    let index = arg_i64(args, 0);
    let titles = read(this, |data| data.tab_titles.clone());

    match usize::try_from(index).ok().filter(|i| *i < titles.len()) {
        Some(i) => ret_string(ret, &titles[i]),
        None => {
            index_error(index, titles.len(), "TabBar::get_tab_title");
            ret_string(ret, "");
        }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Singletons

unsafe fn engine_get_frames_drawn(_this: usize, _args: Args, ret: Ret) {
    ret_i64(ret, with_state(|state| state.frames_drawn));
}

unsafe fn engine_is_editor_hint(_this: usize, _args: Args, ret: Ret) {
    ret_bool(ret, false);
}

unsafe fn engine_set_time_scale(_this: usize, args: Args, _ret: Ret) {
    let scale = arg_f64(args, 0);
    with_state(|state| state.time_scale = scale);
}

unsafe fn engine_get_time_scale(_this: usize, _args: Args, ret: Ret) {
    ret_f64(ret, with_state(|state| state.time_scale));
}

unsafe fn os_get_name(_this: usize, _args: Args, ret: Ret) {
    ret_string(ret, "Mock");
}

unsafe fn os_get_processor_count(_this: usize, _args: Args, ret: Ret) {
    let count = std::thread::available_parallelism().map_or(1, |n| n.get());
    ret_i64(ret, count as i64);
}

/// No processes are started by the mock, so every valid PID is unknown.
unsafe fn os_kill(_this: usize, args: Args, ret: Ret) {
    let pid = arg_i64(args, 0);

    // Pid 4711 reports an error code from a newer engine, unknown to the bindings.
    let error = match pid {
        ..=0 => ERR_INVALID_PARAMETER,
        4711 => 4711,
        _ => ERR_FAILED,
    };
    ret_i64(ret, error);
}

unsafe fn os_shell_open(_this: usize, args: Args, ret: Ret) {
    let uri = arg_string(args, 0);
    let error = if uri.starts_with("https://") { 0 } else { ERR_INVALID_PARAMETER };
    ret_i64(ret, error);
}

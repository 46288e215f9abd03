/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Object table, instance bindings, extension callbacks and the simulated scene tree.

use gdlink::sys;

use super::classdb::{self, engine_class};
use super::strings::{read_payload, write_payload, TempName};
use super::{as_ptr, with_state, MockState};

const REF_COUNTED_BIT: u64 = 1 << 63;
const OBJECT_ADDR_BASE: usize = 0x1000_0000;

pub(super) const NOTIFICATION_PREDELETE: i32 = 1;
pub(super) const NOTIFICATION_ENTER_TREE: i32 = 10;
pub(super) const NOTIFICATION_EXIT_TREE: i32 = 11;
pub(super) const NOTIFICATION_READY: i32 = 13;
pub(super) const NOTIFICATION_VISIBILITY_CHANGED: i32 = 31;

/// One live engine object.
pub(crate) struct MockObject {
    pub id: u64,

    /// Dynamic class: the extension class once an instance is attached, otherwise the engine class.
    pub class: String,
    pub is_refcounted: bool,
    pub refcount: u32,

    /// Extension instance attached through `object_set_instance`, or 0.
    pub instance: usize,
    pub bindings: Vec<InstanceBinding>,
    pub data: ObjectData,
}

#[derive(Copy, Clone)]
pub(crate) struct InstanceBinding {
    token: usize,
    binding: usize,
    callbacks: Option<sys::GDExtensionInstanceBindingCallbacks>,
}

#[derive(Copy, Clone, Eq, PartialEq)]
pub(crate) struct Child {
    pub ptr: usize,
    pub internal: bool,
}

/// Engine-side properties of the bundled classes. Unused fields stay at their defaults.
#[derive(Default)]
pub(crate) struct ObjectData {
    pub name: String,
    pub parent: usize,
    pub children: Vec<Child>,
    pub owner: usize,
    pub inside_tree: bool,
    pub ready_fired: bool,
    pub processing: bool,
    pub process_mode: i64,
    pub queued_for_deletion: bool,

    pub visible: bool,
    pub tooltip: String,
    pub focus_mode: i64,

    pub current_tab: i64,
    pub tab_bar: usize,
    pub tab_titles: Vec<String>,

    pub local_to_scene: bool,
    pub device: i64,
    pub pressed: bool,
}

impl MockState {
    pub(super) fn object(&self, ptr: usize) -> &MockObject {
        self.objects
            .get(&ptr)
            .unwrap_or_else(|| panic!("mock engine: no object at {ptr:#x}"))
    }

    pub(super) fn object_mut(&mut self, ptr: usize) -> &mut MockObject {
        self.objects
            .get_mut(&ptr)
            .unwrap_or_else(|| panic!("mock engine: no object at {ptr:#x}"))
    }

    fn allocate(&mut self, class_name: &str, is_refcounted: bool) -> usize {
        self.next_object_seq += 1;
        let seq = self.next_object_seq;

        let ptr = OBJECT_ADDR_BASE + seq as usize * 0x40;
        let id = if is_refcounted { seq | REF_COUNTED_BIT } else { seq };

        self.objects.insert(
            ptr,
            MockObject {
                id,
                class: class_name.to_string(),
                is_refcounted,
                refcount: 0,
                instance: 0,
                bindings: Vec::new(),
                data: ObjectData {
                    visible: true,
                    current_tab: -1,
                    ..ObjectData::default()
                },
            },
        );
        self.objects_by_id.insert(id, ptr);

        ptr
    }

    /// Children of `node`, optionally including internal ones (which come first, like the engine's front-internal children).
    pub(super) fn children_of(&self, node: usize, include_internal: bool) -> Vec<usize> {
        self.objects.get(&node).map_or_else(Vec::new, |object| {
            object
                .data
                .children
                .iter()
                .filter(|child| include_internal || !child.internal)
                .map(|child| child.ptr)
                .collect()
        })
    }

    /// Nodes in the tree, pre-order from the root.
    pub(super) fn nodes_in_tree(&self) -> Vec<usize> {
        let mut result = Vec::new();
        let mut stack = vec![self.root];

        while let Some(node) = stack.pop() {
            if !self.objects.contains_key(&node) {
                continue;
            }

            result.push(node);
            let children = self.children_of(node, true);
            stack.extend(children.into_iter().rev());
        }

        result
    }

    pub(super) fn processing_nodes_in_tree(&self) -> Vec<usize> {
        self.nodes_in_tree()
            .into_iter()
            .filter(|node| self.object(*node).data.processing)
            .collect()
    }

    fn extension_info(&self, object: usize) -> Option<(usize, sys::GDExtensionClassCreationInfo2)> {
        let obj = self.objects.get(&object)?;
        if obj.instance == 0 {
            return None;
        }

        self.extension_class(&obj.class)
            .map(|class| (obj.instance, class.info))
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Lifecycle

/// Creates an object of an engine class, without any extension instance.
pub(super) fn create_engine_object(class_name: &str) -> usize {
    let Some(class) = engine_class(class_name) else {
        panic!("mock engine: unknown engine class {class_name}");
    };

    let ptr = with_state(|state| state.allocate(class.name, class.is_refcounted));

    if class_name == "TabContainer" {
        let tab_bar = create_engine_object("TabBar");
        with_state(|state| {
            state.object_mut(tab_bar).data.name = "_tab_bar".to_string();
            state.object_mut(ptr).data.tab_bar = tab_bar;
        });
        add_child(ptr, tab_bar, true, false);
    }

    ptr
}

/// Destroys an object: predelete notification, removal from the tree, children, extension instance, bindings.
pub(super) fn destroy_object(ptr: usize) {
    let exists = with_state(|state| state.objects.contains_key(&ptr));
    if !exists {
        return;
    }

    notify_extension(ptr, NOTIFICATION_PREDELETE, true);

    let parent = with_state(|state| state.objects.get(&ptr).map_or(0, |o| o.data.parent));
    if parent != 0 {
        remove_child(parent, ptr);
    }

    let children = with_state(|state| state.children_of(ptr, true));
    for child in children {
        destroy_object(child);
    }

    let (extension, bindings) = with_state(|state| {
        let extension = state.extension_info(ptr);
        let bindings = std::mem::take(&mut state.object_mut(ptr).bindings);
        (extension, bindings)
    });

    if let Some((instance, info)) = extension {
        if let Some(free) = info.free_instance_func {
            // SAFETY: instance was attached by the extension and is freed exactly once.
            unsafe { free(info.class_userdata, as_ptr(instance)) };
        }
    }

    for binding in bindings {
        if let Some(free) = binding.callbacks.and_then(|c| c.free_callback) {
            // SAFETY: binding was set by the extension with these callbacks.
            unsafe { free(as_ptr(binding.token), as_ptr(ptr), as_ptr(binding.binding)) };
        }
    }

    with_state(|state| {
        if let Some(object) = state.objects.remove(&ptr) {
            state.objects_by_id.remove(&object.id);
        }
        state.deletion_queue.retain(|queued| *queued != ptr);
        state.singletons.retain(|_, singleton| *singleton != ptr);
    });
}

/// Increments the reference count, notifying the extension instance.
pub(super) fn reference_object(ptr: usize) {
    let extension = with_state(|state| {
        state.object_mut(ptr).refcount += 1;
        state.extension_info(ptr)
    });

    if let Some((instance, info)) = extension {
        if let Some(reference) = info.reference_func {
            // SAFETY: instance belongs to this object.
            unsafe { reference(as_ptr(instance)) };
        }
    }
}

/// Decrements the reference count, notifying the extension instance. Returns whether the count reached zero.
pub(super) fn decrement_refcount(ptr: usize) -> bool {
    let (last, extension) = with_state(|state| {
        let object = state.object_mut(ptr);
        object.refcount = object.refcount.saturating_sub(1);
        let last = object.refcount == 0;
        (last, state.extension_info(ptr))
    });

    if let Some((instance, info)) = extension {
        if let Some(unreference) = info.unreference_func {
            // SAFETY: instance belongs to this object.
            unsafe { unreference(as_ptr(instance)) };
        }
    }

    last
}

/// Releases a reference held by the engine itself, destroying the object if it was the last.
pub(super) fn unreference_object(ptr: usize) {
    if decrement_refcount(ptr) {
        destroy_object(ptr);
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Extension callbacks

pub(super) fn notify_extension(ptr: usize, what: i32, reversed: bool) {
    let Some((instance, info)) = with_state(|state| state.extension_info(ptr)) else {
        return;
    };

    if let Some(notification) = info.notification_func {
        let reversed = if reversed { sys::GDEXTENSION_TRUE } else { sys::GDEXTENSION_FALSE };

        // SAFETY: instance belongs to this object.
        unsafe { notification(as_ptr(instance), what, reversed) };
    }
}

type CallVirtual = <sys::GDExtensionClassCallVirtual as sys::Inner>::FnPtr;

fn find_virtual(ptr: usize, method: &str) -> Option<(usize, CallVirtual)> {
    let (instance, info) = with_state(|state| state.extension_info(ptr))?;
    let get_virtual = info.get_virtual_func?;

    let name = TempName::new(method);

    // SAFETY: class_userdata and get_virtual_func were provided at registration.
    let trampoline = unsafe { get_virtual(info.class_userdata, name.as_ptr()) }?;
    Some((instance, trampoline))
}

/// Whether the extension class of the object overrides the virtual method `method` (e.g. `"_process"`).
pub(super) fn is_virtual_overridden(ptr: usize, method: &str) -> bool {
    find_virtual(ptr, method).is_some()
}

/// Calls an overridden virtual method. Returns `false` if the object has no override.
pub(super) fn call_virtual(
    ptr: usize,
    method: &str,
    args: &[sys::GDExtensionConstTypePtr],
    ret: sys::GDExtensionTypePtr,
) -> bool {
    let Some((instance, trampoline)) = find_virtual(ptr, method) else {
        return false;
    };

    // SAFETY: args hold pointers in ptrcall encoding for this virtual; instance belongs to the object.
    unsafe { trampoline(as_ptr(instance), args.as_ptr(), ret) };
    true
}

/// `Object::to_string()`: the extension's override if present, otherwise `<Class#id>`.
pub(super) fn to_string(ptr: usize) -> String {
    let Some((class, id, extension)) = with_state(|state| {
        state
            .objects
            .get(&ptr)
            .map(|object| (object.class.clone(), object.id, state.extension_info(ptr)))
    }) else {
        return "<Freed Object>".to_string();
    };

    if let Some((instance, info)) = extension {
        if let Some(to_string) = info.to_string_func {
            let mut slot: usize = 0;
            let mut is_valid = sys::GDEXTENSION_FALSE;

            // SAFETY: slot is an initialized (empty) string payload.
            let text = unsafe {
                let slot_ptr = std::ptr::addr_of_mut!(slot) as sys::GDExtensionStringPtr;
                to_string(as_ptr(instance), &mut is_valid, slot_ptr);
                let text = read_payload(slot_ptr);
                super::strings::destroy(slot_ptr);
                text
            };

            if is_valid != sys::GDEXTENSION_FALSE {
                return text;
            }
        }
    }

    format!("<{class}#{}>", id as i64)
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Scene tree

/// Adds `child` below `parent`; entering the tree runs `_enter_tree` and `_ready` as the engine would.
pub(super) fn add_child(parent: usize, child: usize, internal: bool, force_readable_name: bool) {
    let rejection = with_state(|state| {
        if parent == child {
            return Some("cannot add node as child of itself".to_string());
        }
        if state.object(child).data.parent != 0 {
            return Some(format!(
                "cannot add child '{}': already has a parent",
                state.object(child).data.name
            ));
        }

        let name = unique_child_name(state, parent, child, force_readable_name);
        let child_obj = state.object_mut(child);
        child_obj.data.name = name;
        child_obj.data.parent = parent;

        let is_control = state.inherits(&state.object(child).class, "Control");
        let parent_obj = state.object_mut(parent);
        parent_obj.data.children.push(Child {
            ptr: child,
            internal,
        });

        // Controls added to a TabContainer become tabs, titled after the node. The first tab becomes current.
        let tab_bar = parent_obj.data.tab_bar;
        if !internal && is_control && tab_bar != 0 {
            if parent_obj.data.current_tab < 0 {
                parent_obj.data.current_tab = 0;
            }

            let title = state.object(child).data.name.clone();
            state.object_mut(tab_bar).data.tab_titles.push(title);
        }

        None
    });

    if let Some(reason) = rejection {
        classdb::error(reason, "Node::add_child");
        return;
    }

    let parent_in_tree = with_state(|state| state.object(parent).data.inside_tree);
    if parent_in_tree {
        propagate_enter_tree(child);
        propagate_ready(child);
    }
}

/// Detaches `child` from `parent`; leaving the tree runs `_exit_tree`.
pub(super) fn remove_child(parent: usize, child: usize) {
    let is_child = with_state(|state| {
        state.objects.contains_key(&parent)
            && state.object(parent).data.children.iter().any(|c| c.ptr == child)
    });

    if !is_child {
        classdb::error("cannot remove node: not a child of this node", "Node::remove_child");
        return;
    }

    let in_tree = with_state(|state| state.object(child).data.inside_tree);
    if in_tree {
        propagate_exit_tree(child);
    }

    with_state(|state| {
        let tab_bar = state.object(parent).data.tab_bar;
        if tab_bar != 0 {
            remove_tab(state, parent, tab_bar, child);
        }

        state.object_mut(parent).data.children.retain(|c| c.ptr != child);
        state.object_mut(child).data.parent = 0;
    });
}

fn remove_tab(state: &mut MockState, container: usize, tab_bar: usize, child: usize) {
    let tabs: Vec<usize> = state
        .children_of(container, false)
        .into_iter()
        .filter(|c| state.inherits(&state.object(*c).class, "Control"))
        .collect();

    let Some(index) = tabs.iter().position(|c| *c == child) else {
        return;
    };

    // The tab bar is destroyed first when the whole container goes away.
    if let Some(bar) = state.objects.get_mut(&tab_bar) {
        if index < bar.data.tab_titles.len() {
            bar.data.tab_titles.remove(index);
        }
    }

    let remaining = tabs.len() as i64 - 1;
    let data = &mut state.object_mut(container).data;
    if data.current_tab >= remaining {
        data.current_tab = remaining - 1;
    }
}

fn unique_child_name(state: &MockState, parent: usize, child: usize, force_readable: bool) -> String {
    let child_obj = state.object(child);
    let sibling_names: Vec<&str> = state
        .children_of(parent, true)
        .into_iter()
        .map(|sibling| state.object(sibling).data.name.as_str())
        .collect();

    let base = if !child_obj.data.name.is_empty() {
        child_obj.data.name.clone()
    } else if force_readable {
        child_obj.class.clone()
    } else {
        return format!("@{}@{}", child_obj.class, child_obj.id & !REF_COUNTED_BIT);
    };

    if !sibling_names.contains(&base.as_str()) {
        return base;
    }

    (2..)
        .map(|n| format!("{base}{n}"))
        .find(|candidate| !sibling_names.contains(&candidate.as_str()))
        .unwrap_or(base)
}

fn propagate_enter_tree(node: usize) {
    with_state(|state| state.object_mut(node).data.inside_tree = true);

    call_virtual(node, "_enter_tree", &[], std::ptr::null_mut());
    notify_extension(node, NOTIFICATION_ENTER_TREE, false);

    let children = with_state(|state| state.children_of(node, true));
    for child in children {
        propagate_enter_tree(child);
    }
}

/// Post-order: children are ready before their parent. Each node becomes ready only once.
fn propagate_ready(node: usize) {
    let children = with_state(|state| state.children_of(node, true));
    for child in children {
        propagate_ready(child);
    }

    let first_time = with_state(|state| {
        let object = state.object_mut(node);
        !std::mem::replace(&mut object.data.ready_fired, true)
    });

    if !first_time {
        return;
    }

    if is_virtual_overridden(node, "_process") {
        with_state(|state| state.object_mut(node).data.processing = true);
    }

    call_virtual(node, "_ready", &[], std::ptr::null_mut());
    notify_extension(node, NOTIFICATION_READY, false);
}

/// Post-order: children leave the tree before their parent.
fn propagate_exit_tree(node: usize) {
    let children = with_state(|state| state.children_of(node, true));
    for child in children.into_iter().rev() {
        propagate_exit_tree(child);
    }

    call_virtual(node, "_exit_tree", &[], std::ptr::null_mut());
    notify_extension(node, NOTIFICATION_EXIT_TREE, false);

    with_state(|state| state.object_mut(node).data.inside_tree = false);
}

pub(super) fn set_visible(node: usize, visible: bool) {
    let changed = with_state(|state| {
        let data = &mut state.object_mut(node).data;
        std::mem::replace(&mut data.visible, visible) != visible
    });

    if changed {
        notify_extension(node, NOTIFICATION_VISIBILITY_CHANGED, false);
    }
}

/// `Node::duplicate()` and `Resource::duplicate()`: new object of the same class, copying the name. Node children are
/// duplicated recursively, except internal ones (which the engine re-creates).
pub(super) fn duplicate(ptr: usize) -> usize {
    let (class, name, local_to_scene) = with_state(|state| {
        let object = state.object(ptr);
        (object.class.clone(), object.data.name.clone(), object.data.local_to_scene)
    });

    let copy = classdb::construct_by_name(&class);
    if copy == 0 {
        return 0;
    }

    let is_node = with_state(|state| {
        let object = state.object_mut(copy);
        object.data.name = name;
        object.data.local_to_scene = local_to_scene;
        state.inherits(&class, "Node")
    });

    if is_node {
        let children = with_state(|state| state.children_of(ptr, false));
        for child in children {
            let child_copy = duplicate(child);
            if child_copy != 0 {
                add_child(copy, child_copy, false, false);
            }
        }
    }

    copy
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Interface functions

pub(super) unsafe extern "C" fn object_destroy(p_o: sys::GDExtensionObjectPtr) {
    let exists = with_state(|state| state.objects.contains_key(&(p_o as usize)));
    if !exists {
        classdb::error(format!("object_destroy: no object at {p_o:?}"), "object_destroy");
        return;
    }

    destroy_object(p_o as usize);
}

pub(super) unsafe extern "C" fn object_get_instance_id(
    p_object: sys::GDExtensionConstObjectPtr,
) -> sys::GDObjectInstanceID {
    with_state(|state| state.objects.get(&(p_object as usize)).map_or(0, |o| o.id))
}

pub(super) unsafe extern "C" fn object_get_instance_from_id(
    p_instance_id: sys::GDObjectInstanceID,
) -> sys::GDExtensionObjectPtr {
    with_state(|state| state.objects_by_id.get(&p_instance_id).copied().unwrap_or(0)) as sys::GDExtensionObjectPtr
}

pub(super) unsafe extern "C" fn object_cast_to(
    p_object: sys::GDExtensionConstObjectPtr,
    p_class_tag: *mut std::ffi::c_void,
) -> sys::GDExtensionObjectPtr {
    with_state(|state| state.cast_to(p_object as usize, p_class_tag as usize)) as sys::GDExtensionObjectPtr
}

pub(super) unsafe extern "C" fn object_set_instance(
    p_o: sys::GDExtensionObjectPtr,
    p_classname: sys::GDExtensionConstStringNamePtr,
    p_instance: sys::GDExtensionClassInstancePtr,
) {
    let class_name = read_payload(p_classname);

    with_state(|state| {
        let object = state.object_mut(p_o as usize);
        object.class = class_name;
        object.instance = p_instance as usize;
    });
}

pub(super) unsafe extern "C" fn object_get_class_name(
    p_object: sys::GDExtensionConstObjectPtr,
    _p_library: sys::GDExtensionClassLibraryPtr,
    r_class_name: sys::GDExtensionUninitializedStringNamePtr,
) -> sys::GDExtensionBool {
    let class_name = with_state(|state| state.objects.get(&(p_object as usize)).map(|o| o.class.clone()));

    match class_name {
        Some(class_name) => {
            write_payload(r_class_name, &class_name);
            sys::GDEXTENSION_TRUE
        }
        None => sys::GDEXTENSION_FALSE,
    }
}

pub(super) unsafe extern "C" fn object_get_instance_binding(
    p_o: sys::GDExtensionObjectPtr,
    p_token: *mut std::ffi::c_void,
    p_callbacks: *const sys::GDExtensionInstanceBindingCallbacks,
) -> *mut std::ffi::c_void {
    let ptr = p_o as usize;
    let token = p_token as usize;

    let existing = with_state(|state| {
        state
            .objects
            .get(&ptr)
            .and_then(|o| o.bindings.iter().find(|b| b.token == token))
            .map(|b| b.binding)
    });

    if let Some(binding) = existing {
        return as_ptr(binding);
    }

    // Like the engine: create the binding on demand through the callbacks, if given.
    let callbacks = (!p_callbacks.is_null()).then(|| *p_callbacks);
    let Some(create) = callbacks.and_then(|c| c.create_callback) else {
        return std::ptr::null_mut();
    };

    let binding = create(p_token, p_o) as usize;
    if binding != 0 {
        with_state(|state| {
            state.object_mut(ptr).bindings.push(InstanceBinding {
                token,
                binding,
                callbacks,
            })
        });
    }

    as_ptr(binding)
}

pub(super) unsafe extern "C" fn object_set_instance_binding(
    p_o: sys::GDExtensionObjectPtr,
    p_token: *mut std::ffi::c_void,
    p_binding: *mut std::ffi::c_void,
    p_callbacks: *const sys::GDExtensionInstanceBindingCallbacks,
) {
    let token = p_token as usize;
    let callbacks = (!p_callbacks.is_null()).then(|| *p_callbacks);

    with_state(|state| {
        let bindings = &mut state.object_mut(p_o as usize).bindings;
        bindings.retain(|b| b.token != token);
        bindings.push(InstanceBinding {
            token,
            binding: p_binding as usize,
            callbacks,
        });
    });
}

pub(super) unsafe extern "C" fn global_get_singleton(
    p_name: sys::GDExtensionConstStringNamePtr,
) -> sys::GDExtensionObjectPtr {
    let name = read_payload(p_name);

    with_state(|state| {
        state
            .singletons
            .iter()
            .find(|(singleton, _)| **singleton == name)
            .map_or(0, |(_, ptr)| *ptr)
    }) as sys::GDExtensionObjectPtr
}

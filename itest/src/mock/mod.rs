/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! In-process stand-in for the engine side of the GDExtension ABI.
//!
//! Implements exactly the interface functions that gdlink loads, with engine-like semantics for the parts the bindings depend
//! on: instance IDs (bit 63 for ref-counted objects), reference counts, class tags and casts, extension class registration,
//! instance bindings, and method binds for the bundled classes.
//!
//! Object pointers handed out by the mock are opaque addresses that are never dereferenced and never reused, so a stale
//! pointer can only be detected through its instance ID, just like with the real engine.
//!
//! A tiny scene tree is simulated as well: adding a node below [`root()`] runs its `_enter_tree` and `_ready` virtuals,
//! [`process_frame()`] runs `_process` and frees nodes queued with `queue_free()`.

mod classdb;
mod interface;
mod methods;
mod objects;
mod strings;

use std::collections::HashMap;
use std::ffi::c_void;

use gdlink::init::InitLevel;
use gdlink::sys;
use sys::Global;

pub use interface::{get_proc_address, VERSION};
pub use strings::live_string_count;

use classdb::ExtensionClass;
use objects::MockObject;

/// Fake library pointer passed to the extension; only compared, never dereferenced.
const LIBRARY: usize = 0x11b_0000;

static STATE: Global<MockState> = Global::default();

/// Engine-side state. Object pointers and instance pointers are stored as addresses.
#[derive(Default)]
pub(crate) struct MockState {
    next_object_seq: u64,
    objects: HashMap<usize, MockObject>,
    objects_by_id: HashMap<u64, usize>,

    extension_classes: Vec<ExtensionClass>,
    constants: Vec<RegisteredConstant>,
    editor_plugins: Vec<String>,
    unregistered: Vec<String>,

    messages: Vec<EngineMessage>,
    singletons: HashMap<&'static str, usize>,
    root: usize,
    deletion_queue: Vec<usize>,

    initialization: Option<ExtensionInit>,
    initialized_levels: Vec<InitLevel>,

    frames_drawn: i64,
    time_scale: f64,
}

// SAFETY: the state only holds addresses and function pointers. It is accessed from the main thread, which also owns the
// extension binding.
unsafe impl Send for MockState {}

pub(crate) fn with_state<R>(f: impl FnOnce(&mut MockState) -> R) -> R {
    // Never call into the extension while the guard is held: callbacks re-enter the mock.
    let mut guard = STATE.lock();
    f(&mut guard)
}

#[derive(Copy, Clone)]
struct ExtensionInit {
    minimum_level: InitLevel,
    params: sys::GDExtensionInitialization,
}

/// Integer constant registered for an extension class.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct RegisteredConstant {
    pub class_name: String,
    pub name: String,
    pub value: i64,
}

/// Severity of a message sent through one of the engine print functions.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum MessageKind {
    Error,
    Warning,
    ScriptError,
}

/// Message sent through the engine print functions.
#[derive(Clone, Debug)]
pub struct EngineMessage {
    pub kind: MessageKind,
    pub description: String,
    pub function: String,
    pub file: String,
    pub line: i32,
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Extension loading

/// Calls the extension entry point and initializes every level from the extension's minimum level up to `Editor`.
pub fn load_extension(entry: sys::GDExtensionInitializationFunction) -> Result<(), String> {
    let entry = entry.ok_or("entry point is null")?;
    start_engine();

    let mut params = sys::GDExtensionInitialization {
        minimum_initialization_level: sys::GDEXTENSION_INITIALIZATION_CORE,
        userdata: std::ptr::null_mut(),
        initialize: None,
        deinitialize: None,
    };

    // SAFETY: get_proc_address serves the full interface; params is writable.
    let success =
        unsafe { entry(Some(get_proc_address), LIBRARY as sys::GDExtensionClassLibraryPtr, &mut params) };
    if success == sys::GDEXTENSION_FALSE {
        return Err("extension entry point reported failure".to_string());
    }

    let minimum_level = InitLevel::from_sys(params.minimum_initialization_level);
    with_state(|state| {
        state.initialization = Some(ExtensionInit {
            minimum_level,
            params,
        })
    });

    for level in InitLevel::ALL {
        if level >= minimum_level {
            initialize_level(level);
        }
    }

    Ok(())
}

/// Deinitializes all loaded levels in reverse order.
pub fn unload_extension() {
    let loaded = with_state(|state| state.initialized_levels.clone());

    for level in loaded.into_iter().rev() {
        deinitialize_level(level);
    }
}

/// Runs the extension's initialize callback for `level`.
pub fn initialize_level(level: InitLevel) {
    let init = with_state(|state| {
        state.initialized_levels.push(level);
        state.initialization
    });

    let Some(init) = init else {
        panic!("initialize_level({level:?}): no extension loaded");
    };

    if let Some(initialize) = init.params.initialize {
        // SAFETY: callback and userdata were provided by the extension.
        unsafe { initialize(init.params.userdata, level.to_sys()) };
    }
}

/// Runs the extension's deinitialize callback for `level`.
pub fn deinitialize_level(level: InitLevel) {
    let init = with_state(|state| {
        state.initialized_levels.retain(|l| *l != level);
        state.initialization
    });

    let Some(init) = init else {
        panic!("deinitialize_level({level:?}): no extension loaded");
    };

    if let Some(deinitialize) = init.params.deinitialize {
        // SAFETY: callback and userdata were provided by the extension.
        unsafe { deinitialize(init.params.userdata, level.to_sys()) };
    }
}

/// Minimum level requested by the extension, once loaded.
pub fn extension_minimum_level() -> Option<InitLevel> {
    with_state(|state| state.initialization.map(|init| init.minimum_level))
}

/// Creates the objects that exist before any extension code runs: singletons and the scene tree root.
fn start_engine() {
    let already_started = with_state(|state| state.root != 0);
    if already_started {
        return;
    }

    let engine = objects::create_engine_object("Engine");
    let os = objects::create_engine_object("OS");
    let root = objects::create_engine_object("Node");

    with_state(|state| {
        state.singletons.insert("Engine", engine);
        state.singletons.insert("OS", os);
        state.time_scale = 1.0;

        let root_object = state.object_mut(root);
        root_object.data.name = "root".to_string();
        root_object.data.inside_tree = true;
        root_object.data.ready_fired = true;
        state.root = root;
    });
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Inspection and simulation, used by tests

/// Pointer of the scene tree root node.
pub fn root() -> sys::GDExtensionObjectPtr {
    with_state(|state| state.root as sys::GDExtensionObjectPtr)
}

/// Instance ID of the scene tree root node.
pub fn root_id() -> u64 {
    with_state(|state| state.object(state.root).id)
}

/// Number of live objects, including singletons and the root node.
pub fn object_count() -> usize {
    with_state(|state| state.objects.len())
}

/// Whether an object with this instance ID is alive.
pub fn is_alive(instance_id: u64) -> bool {
    with_state(|state| state.objects_by_id.contains_key(&instance_id))
}

/// Engine-side reference count of a ref-counted object, or `None` if it is dead or not ref-counted.
pub fn reference_count(instance_id: u64) -> Option<u32> {
    with_state(|state| {
        let ptr = *state.objects_by_id.get(&instance_id)?;
        let object = state.objects.get(&ptr)?;
        object.is_refcounted.then_some(object.refcount)
    })
}

/// Dynamic class of the object with this instance ID.
pub fn class_of(instance_id: u64) -> Option<String> {
    with_state(|state| {
        let ptr = *state.objects_by_id.get(&instance_id)?;
        state.objects.get(&ptr).map(|object| object.class.clone())
    })
}

/// Constructs an object by class name, like scripts or scene loading would. Extension classes run their `create` callback.
///
/// Returns null if the class is unknown or not instantiable.
pub fn instantiate(class_name: &str) -> sys::GDExtensionObjectPtr {
    classdb::construct_by_name(class_name) as sys::GDExtensionObjectPtr
}

/// Destroys an object the way the engine does when its owner frees it. Ref-counted objects are destroyed regardless of
/// their count.
pub fn destroy(object: sys::GDExtensionObjectPtr) {
    objects::destroy_object(object as usize);
}

/// Sends a notification to the object's extension instance.
pub fn notify(object: sys::GDExtensionObjectPtr, what: i32) {
    objects::notify_extension(object as usize, what, false);
}

/// Advances one frame: runs `_process(delta)` on processing nodes in the tree, then frees nodes queued for deletion.
pub fn process_frame(delta: f64) {
    let processing = with_state(|state| state.processing_nodes_in_tree());

    for node in processing {
        let alive = with_state(|state| state.objects.contains_key(&node));
        if alive {
            let args = [std::ptr::addr_of!(delta) as sys::GDExtensionConstTypePtr];
            objects::call_virtual(node, "_process", &args, std::ptr::null_mut());
        }
    }

    let queued = with_state(|state| {
        state.frames_drawn += 1;
        std::mem::take(&mut state.deletion_queue)
    });

    for node in queued {
        objects::destroy_object(node);
    }
}

/// Dispatches a fresh input event to `_input` of all nodes in the tree.
///
/// The engine holds one reference to the event during dispatch and releases it afterwards.
pub fn push_input(device: i64, pressed: bool) -> u64 {
    let event = objects::create_engine_object("InputEvent");
    let event_id = with_state(|state| {
        let object = state.object_mut(event);
        object.refcount = 1;
        object.data.device = device;
        object.data.pressed = pressed;
        object.id
    });

    let nodes = with_state(|state| state.nodes_in_tree());
    for node in nodes {
        let arg = event as sys::GDExtensionObjectPtr;
        let args = [std::ptr::addr_of!(arg) as sys::GDExtensionConstTypePtr];
        objects::call_virtual(node, "_input", &args, std::ptr::null_mut());
    }

    objects::unreference_object(event);
    event_id
}

/// Calls the extension's `to_string` callback through the engine's `Object::to_string()`.
pub fn object_to_string(object: sys::GDExtensionObjectPtr) -> String {
    objects::to_string(object as usize)
}

/// Extension classes currently registered, in registration order.
pub fn registered_classes() -> Vec<String> {
    with_state(|state| {
        state
            .extension_classes
            .iter()
            .map(|class| class.name.clone())
            .collect()
    })
}

/// Whether a registered extension class is abstract, i.e. cannot be instantiated by the engine.
pub fn is_class_abstract(class_name: &str) -> Option<bool> {
    with_state(|state| {
        state
            .extension_class(class_name)
            .map(|class| class.info.is_abstract != sys::GDEXTENSION_FALSE)
    })
}

/// Parent class an extension class was registered with.
pub fn registered_parent(class_name: &str) -> Option<String> {
    with_state(|state| {
        state
            .extension_class(class_name)
            .map(|class| class.parent.clone())
    })
}

/// Unregistered extension classes, in unregistration order. Cleared by [`take_unregistered_classes()`].
pub fn take_unregistered_classes() -> Vec<String> {
    with_state(|state| std::mem::take(&mut state.unregistered))
}

/// Integer constants registered for `class_name`.
pub fn constants_of(class_name: &str) -> Vec<RegisteredConstant> {
    with_state(|state| {
        state
            .constants
            .iter()
            .filter(|c| c.class_name == class_name)
            .cloned()
            .collect()
    })
}

/// Classes currently added as editor plugins.
pub fn editor_plugins() -> Vec<String> {
    with_state(|state| state.editor_plugins.clone())
}

/// All messages printed so far; clears the log.
pub fn take_messages() -> Vec<EngineMessage> {
    with_state(|state| std::mem::take(&mut state.messages))
}

pub(crate) fn push_message(message: EngineMessage) {
    with_state(|state| state.messages.push(message));
}

/// Address of an object pointer, as used in argument arrays of virtual calls.
pub(crate) fn as_ptr(addr: usize) -> *mut c_void {
    addr as *mut c_void
}

/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Class database: engine classes, registered extension classes, class tags and method binds.

use gdlink::sys;

use super::strings::read_payload;
use super::{methods, objects, push_message, with_state, EngineMessage, MessageKind, MockState};
use super::{RegisteredConstant, LIBRARY};

/// Engine class known to the mock.
pub(super) struct EngineClassDef {
    pub name: &'static str,
    pub parent: Option<&'static str>,
    pub is_refcounted: bool,
    pub is_instantiable: bool,
}

const fn class(
    name: &'static str,
    parent: Option<&'static str>,
    is_refcounted: bool,
    is_instantiable: bool,
) -> EngineClassDef {
    EngineClassDef {
        name,
        parent,
        is_refcounted,
        is_instantiable,
    }
}

#[rustfmt::skip]
pub(super) static ENGINE_CLASSES: &[EngineClassDef] = &[
    class("Object",       None,                  false, true),
    class("RefCounted",   Some("Object"),        true,  true),
    class("Resource",     Some("RefCounted"),    true,  true),
    class("InputEvent",   Some("Resource"),      true,  false),
    class("Node",         Some("Object"),        false, true),
    class("CanvasItem",   Some("Node"),          false, false),
    class("Control",      Some("CanvasItem"),    false, true),
    class("Container",    Some("Control"),       false, true),
    class("TabContainer", Some("Container"),     false, true),
    class("TabBar",       Some("Control"),       false, true),
    class("Engine",       Some("Object"),        false, false),
    class("OS",           Some("Object"),        false, false),
];

const ENGINE_TAG_BASE: usize = 0x7a6_0000;
const EXTENSION_TAG_BASE: usize = 0x7e7_0000;

pub(super) fn engine_class(name: &str) -> Option<&'static EngineClassDef> {
    ENGINE_CLASSES.iter().find(|class| class.name == name)
}

/// Extension class, as registered through `classdb_register_extension_class2`.
pub(super) struct ExtensionClass {
    pub name: String,
    pub parent: String,
    pub info: sys::GDExtensionClassCreationInfo2,
    pub tag: usize,
}

impl MockState {
    pub(super) fn extension_class(&self, name: &str) -> Option<&ExtensionClass> {
        self.extension_classes.iter().find(|class| class.name == name)
    }

    /// Direct parent of an engine or extension class.
    pub(super) fn parent_class(&self, name: &str) -> Option<String> {
        if let Some(class) = self.extension_class(name) {
            return Some(class.parent.clone());
        }

        engine_class(name)
            .and_then(|class| class.parent)
            .map(str::to_string)
    }

    pub(super) fn is_known_class(&self, name: &str) -> bool {
        engine_class(name).is_some() || self.extension_class(name).is_some()
    }

    /// Whether `class_name` is `base` or inherits from it, across extension and engine classes.
    pub(super) fn inherits(&self, class_name: &str, base: &str) -> bool {
        let mut current = Some(class_name.to_string());

        while let Some(name) = current {
            if name == base {
                return true;
            }
            current = self.parent_class(&name);
        }

        false
    }

    /// Closest engine class of an engine or extension class.
    pub(super) fn engine_base_of(&self, class_name: &str) -> Option<&'static EngineClassDef> {
        let mut current = Some(class_name.to_string());

        while let Some(name) = current {
            if let Some(class) = engine_class(&name) {
                return Some(class);
            }
            current = self.parent_class(&name);
        }

        None
    }

    pub(super) fn class_tag(&self, name: &str) -> usize {
        if let Some(index) = ENGINE_CLASSES.iter().position(|class| class.name == name) {
            return ENGINE_TAG_BASE + index * 0x10;
        }

        self.extension_class(name).map_or(0, |class| class.tag)
    }

    fn class_by_tag(&self, tag: usize) -> Option<String> {
        if let Some(class) = ENGINE_CLASSES
            .iter()
            .enumerate()
            .find(|(index, _)| ENGINE_TAG_BASE + index * 0x10 == tag)
            .map(|(_, class)| class)
        {
            return Some(class.name.to_string());
        }

        self.extension_classes
            .iter()
            .find(|class| class.tag == tag)
            .map(|class| class.name.clone())
    }

    /// Returns the object pointer if the object is an instance of the class behind `tag`.
    pub(super) fn cast_to(&self, object: usize, tag: usize) -> usize {
        let Some(target) = self.class_by_tag(tag) else {
            return 0;
        };

        match self.objects.get(&object) {
            Some(obj) if self.inherits(&obj.class, &target) => object,
            _ => 0,
        }
    }
}

pub(super) fn error(description: impl Into<String>, function: &str) {
    push_message(EngineMessage {
        kind: MessageKind::Error,
        description: description.into(),
        function: function.to_string(),
        file: "core/object/class_db.cpp".to_string(),
        line: 0,
    });
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Construction

/// Instantiates an engine or extension class by name. Returns 0 if the class cannot be instantiated.
pub(super) fn construct_by_name(class_name: &str) -> usize {
    enum Plan {
        Engine,
        Extension(sys::GDExtensionClassCreationInfo2),
        Refuse(String),
    }

    let plan = with_state(|state| {
        if let Some(class) = state.extension_class(class_name) {
            return if class.info.is_abstract != sys::GDEXTENSION_FALSE {
                Plan::Refuse(format!("class '{class_name}' is abstract"))
            } else {
                Plan::Extension(class.info)
            };
        }

        match engine_class(class_name) {
            Some(class) if class.is_instantiable => Plan::Engine,
            Some(_) => Plan::Refuse(format!("class '{class_name}' cannot be instantiated")),
            None => Plan::Refuse(format!("class '{class_name}' does not exist")),
        }
    });

    match plan {
        Plan::Engine => objects::create_engine_object(class_name),
        Plan::Extension(info) => match info.create_instance_func {
            // SAFETY: creation info was provided by the extension at registration.
            Some(create) => unsafe { create(info.class_userdata) as usize },
            None => {
                error(format!("class '{class_name}' has no constructor"), "instantiate");
                0
            }
        },
        Plan::Refuse(reason) => {
            error(reason, "instantiate");
            0
        }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Interface functions

pub(super) unsafe extern "C" fn classdb_construct_object(
    p_classname: sys::GDExtensionConstStringNamePtr,
) -> sys::GDExtensionObjectPtr {
    let class_name = read_payload(p_classname);
    construct_by_name(&class_name) as sys::GDExtensionObjectPtr
}

pub(super) unsafe extern "C" fn classdb_get_class_tag(
    p_classname: sys::GDExtensionConstStringNamePtr,
) -> *mut std::ffi::c_void {
    let class_name = read_payload(p_classname);
    with_state(|state| state.class_tag(&class_name)) as *mut std::ffi::c_void
}

/// Looks up a method in the class and its bases. Like the engine, a hash mismatch is an error and yields null.
pub(super) unsafe extern "C" fn classdb_get_method_bind(
    p_classname: sys::GDExtensionConstStringNamePtr,
    p_methodname: sys::GDExtensionConstStringNamePtr,
    p_hash: sys::GDExtensionInt,
) -> sys::GDExtensionMethodBindPtr {
    let class_name = read_payload(p_classname);
    let method_name = read_payload(p_methodname);

    let hierarchy = with_state(|state| {
        let mut chain = Vec::new();
        let mut current = Some(class_name.clone());
        while let Some(name) = current {
            current = state.parent_class(&name);
            chain.push(name);
        }
        chain
    });

    for class in &hierarchy {
        if let Some(method) = methods::find(class, &method_name) {
            if method.hash != p_hash {
                error(
                    format!(
                        "hash mismatch for method '{class}::{method_name}': expected {}, got {p_hash}",
                        method.hash
                    ),
                    "classdb_get_method_bind",
                );
                return std::ptr::null();
            }

            return method as *const methods::MockMethod as sys::GDExtensionMethodBindPtr;
        }
    }

    error(
        format!("method '{class_name}::{method_name}' not found"),
        "classdb_get_method_bind",
    );
    std::ptr::null()
}

pub(super) unsafe extern "C" fn classdb_register_extension_class2(
    p_library: sys::GDExtensionClassLibraryPtr,
    p_class_name: sys::GDExtensionConstStringNamePtr,
    p_parent_class_name: sys::GDExtensionConstStringNamePtr,
    p_extension_funcs: *const sys::GDExtensionClassCreationInfo2,
) {
    let class_name = read_payload(p_class_name);
    let parent = read_payload(p_parent_class_name);
    let info = *p_extension_funcs;

    let rejection = with_state(|state| {
        if p_library as usize != LIBRARY {
            return Some(format!("class '{class_name}' registered with unknown library"));
        }
        if state.is_known_class(&class_name) {
            return Some(format!("class '{class_name}' already exists"));
        }
        if !state.is_known_class(&parent) {
            return Some(format!("parent class '{parent}' of '{class_name}' does not exist"));
        }

        // Tags are never reused, so a stale tag of an unregistered class matches nothing.
        state.next_object_seq += 1;
        let tag = EXTENSION_TAG_BASE + state.next_object_seq as usize * 0x10;
        state.extension_classes.push(ExtensionClass {
            name: class_name.clone(),
            parent: parent.clone(),
            info,
            tag,
        });

        None
    });

    if let Some(reason) = rejection {
        error(reason, "classdb_register_extension_class2");
    }
}

pub(super) unsafe extern "C" fn classdb_register_extension_class_integer_constant(
    _p_library: sys::GDExtensionClassLibraryPtr,
    p_class_name: sys::GDExtensionConstStringNamePtr,
    p_enum_name: sys::GDExtensionConstStringNamePtr,
    p_constant_name: sys::GDExtensionConstStringNamePtr,
    p_constant_value: sys::GDExtensionInt,
    p_is_bitfield: sys::GDExtensionBool,
) {
    let class_name = read_payload(p_class_name);
    let enum_name = read_payload(p_enum_name);
    let name = read_payload(p_constant_name);

    let rejection = with_state(|state| {
        if state.extension_class(&class_name).is_none() {
            return Some(format!("constant '{name}' for unknown class '{class_name}'"));
        }
        if !enum_name.is_empty() || p_is_bitfield != sys::GDEXTENSION_FALSE {
            return Some(format!("constant '{name}': enum constants are not supported"));
        }

        state.constants.push(RegisteredConstant {
            class_name: class_name.clone(),
            name: name.clone(),
            value: p_constant_value,
        });
        None
    });

    if let Some(reason) = rejection {
        error(reason, "classdb_register_extension_class_integer_constant");
    }
}

pub(super) unsafe extern "C" fn classdb_unregister_extension_class(
    _p_library: sys::GDExtensionClassLibraryPtr,
    p_class_name: sys::GDExtensionConstStringNamePtr,
) {
    let class_name = read_payload(p_class_name);

    let rejection = with_state(|state| {
        if state.extension_classes.iter().any(|class| class.parent == class_name) {
            return Some(format!("cannot unregister '{class_name}': subclasses are still registered"));
        }

        let before = state.extension_classes.len();
        state.extension_classes.retain(|class| class.name != class_name);
        if state.extension_classes.len() == before {
            return Some(format!("cannot unregister unknown class '{class_name}'"));
        }

        state.constants.retain(|c| c.class_name != class_name);
        state.unregistered.push(class_name.clone());
        None
    });

    if let Some(reason) = rejection {
        error(reason, "classdb_unregister_extension_class");
    }
}

pub(super) unsafe extern "C" fn editor_add_plugin(p_class_name: sys::GDExtensionConstStringNamePtr) {
    let class_name = read_payload(p_class_name);
    with_state(|state| state.editor_plugins.push(class_name));
}

pub(super) unsafe extern "C" fn editor_remove_plugin(p_class_name: sys::GDExtensionConstStringNamePtr) {
    let class_name = read_payload(p_class_name);
    with_state(|state| state.editor_plugins.retain(|name| *name != class_name));
}

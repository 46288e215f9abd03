/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::collections::HashMap;

use crate::builtin::StringName;
use crate::init::InitLevel;
use crate::meta::ClassName;
use crate::private::iterate_plugins;
use crate::registry::plugin::{ClassPlugin, ITraitImpl, PluginItem, Struct};
use crate::{godot_error, out, sys};
use sys::Global;

/// Classes registered by this library, per init level, in registration order.
static LOADED_CLASSES: Global<HashMap<InitLevel, Vec<LoadedClass>>> = Global::default();

/// Represents a class which is currently loaded and retained in memory.
///
/// Besides the name, this type holds information relevant for the deregistration of the class.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LoadedClass {
    name: ClassName,
    is_editor_plugin: bool,
}

impl LoadedClass {
    pub fn name(&self) -> ClassName {
        self.name
    }
}

/// Contains all the information needed to register one class with the engine.
#[derive(Debug)]
struct ClassRegistrationInfo {
    class_name: ClassName,
    parent_class_name: Option<ClassName>,
    init_level: InitLevel,
    godot_params: sys::GDExtensionClassCreationInfo2,
    constants: Vec<(&'static str, i64)>,

    /// Whether the class was defined with `#[derive(GodotClass)]`; trait impls alone are not registrable.
    has_struct: bool,
    is_tool: bool,
    is_editor_plugin: bool,
    is_instantiable: bool,
    has_user_create: bool,
}

/// Registers all user classes of `init_level`, in the order of their definitions.
///
/// Classes whose base is another user class of the same level are registered after that base.
pub fn auto_register_classes(init_level: InitLevel) {
    out!("Auto-register classes at level `{init_level:?}`...");

    let mut map: HashMap<ClassName, ClassRegistrationInfo> = HashMap::new();
    let mut order: Vec<ClassName> = Vec::new();

    iterate_plugins(|plugin: &ClassPlugin| {
        if plugin.init_level != init_level {
            return;
        }

        let info = map.entry(plugin.class_name).or_insert_with(|| {
            order.push(plugin.class_name);
            default_registration_info(plugin.class_name, init_level)
        });

        fill_class_info(&plugin.item, info);
    });

    let mut loaded = Vec::with_capacity(order.len());
    let mut registered: Vec<ClassName> = Vec::with_capacity(order.len());

    for class_name in sort_by_parent(&order, &map) {
        let Some(mut info) = map.remove(&class_name) else {
            continue;
        };

        if !info.has_struct {
            godot_error!("#[godot_api] impl for class `{class_name}` without #[derive(GodotClass)]; class is skipped");
            continue;
        }

        if info.is_instantiable && !info.has_user_create && info.godot_params.create_instance_func.is_none() {
            godot_error!(
                "class `{class_name}` has neither #[class(init)] nor an init() override; it is registered as abstract"
            );
        }

        // Non-tool classes keep their engine defaults while the editor runs.
        if crate::private::is_class_inactive(info.is_tool) {
            out!("| {class_name} is inactive in the editor; virtuals are not dispatched");
            info.godot_params.get_virtual_func = None;
        }

        // Abstract classes cannot be constructed from the engine.
        info.godot_params.is_abstract =
            info.godot_params.create_instance_func.is_none() as sys::GDExtensionBool;

        if register_class_raw(&info) {
            registered.push(class_name);
            loaded.push(LoadedClass {
                name: class_name,
                is_editor_plugin: info.is_editor_plugin,
            });
        }
    }

    out!("All {init_level:?} classes registered: {registered:?}");

    LOADED_CLASSES.lock().entry(init_level).or_default().extend(loaded);
}

/// Unregisters all classes of `init_level`, in reverse registration order.
pub fn unregister_classes(init_level: InitLevel) {
    let loaded = LOADED_CLASSES.lock().remove(&init_level).unwrap_or_default();

    out!("Unregister classes of level {init_level:?}...");
    for class in loaded.into_iter().rev() {
        unregister_class_raw(class);
    }
}

/// Names of all classes currently registered for `init_level`, in registration order.
pub fn loaded_classes(init_level: InitLevel) -> Vec<ClassName> {
    LOADED_CLASSES
        .lock()
        .get(&init_level)
        .map(|classes| classes.iter().map(LoadedClass::name).collect())
        .unwrap_or_default()
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Internals

fn default_registration_info(class_name: ClassName, init_level: InitLevel) -> ClassRegistrationInfo {
    ClassRegistrationInfo {
        class_name,
        parent_class_name: None,
        init_level,
        godot_params: default_creation_info(),
        constants: Vec::new(),
        has_struct: false,
        is_tool: false,
        is_editor_plugin: false,
        is_instantiable: true,
        has_user_create: false,
    }
}

fn fill_class_info(item: &PluginItem, c: &mut ClassRegistrationInfo) {
    out!("| reg (before):    {c:?}");
    out!("| comp:            {item:?}");

    match item {
        PluginItem::Struct(Struct {
            base_class_name,
            generated_create_fn,
            free_fn,
            reference_fn,
            unreference_fn,
            is_tool,
            is_editor_plugin,
            is_instantiable,
        }) => {
            c.has_struct = true;
            c.is_tool = *is_tool;
            c.parent_class_name = Some(*base_class_name);
            c.is_editor_plugin = *is_editor_plugin;
            c.is_instantiable = *is_instantiable;

            // A user-defined init() replaces the generated constructor, regardless of plugin order.
            if *is_instantiable && !c.has_user_create {
                c.godot_params.create_instance_func = generated_create_fn.map(|f| f.raw);
            }

            c.godot_params.free_instance_func = Some(free_fn.raw);
            c.godot_params.reference_func = Some(reference_fn.raw);
            c.godot_params.unreference_func = Some(unreference_fn.raw);
        }

        PluginItem::ITraitImpl(ITraitImpl {
            user_create_fn,
            user_to_string_fn,
            user_on_notification_fn,
            get_virtual_fn,
        }) => {
            if let Some(create) = user_create_fn {
                c.has_user_create = true;
                if c.is_instantiable {
                    c.godot_params.create_instance_func = Some(create.raw);
                }
            }

            c.godot_params.to_string_func = user_to_string_fn.map(|f| f.raw);
            c.godot_params.notification_func = user_on_notification_fn.map(|f| f.raw);
            c.godot_params.get_virtual_func = Some(get_virtual_fn.raw);
        }

        PluginItem::Constant(constant) => {
            c.constants.push((constant.name, constant.value));
        }
    }

    out!("| reg (after):     {c:?}");
}

/// Orders classes so that every user-defined parent precedes its children; otherwise keeps plugin order.
fn sort_by_parent(
    order: &[ClassName],
    map: &HashMap<ClassName, ClassRegistrationInfo>,
) -> Vec<ClassName> {
    let mut sorted = Vec::with_capacity(order.len());

    fn visit(
        name: ClassName,
        map: &HashMap<ClassName, ClassRegistrationInfo>,
        sorted: &mut Vec<ClassName>,
        depth: usize,
    ) {
        if sorted.contains(&name) || depth > map.len() {
            return;
        }

        if let Some(parent) = map.get(&name).and_then(|info| info.parent_class_name) {
            if map.contains_key(&parent) {
                visit(parent, map, sorted, depth + 1);
            }
        }

        sorted.push(name);
    }

    for &name in order {
        visit(name, map, &mut sorted, 0);
    }

    sorted
}

/// Returns whether the engine accepted the class.
fn register_class_raw(info: &ClassRegistrationInfo) -> bool {
    let class_name = info.class_name;
    let parent_class_name = info.parent_class_name.unwrap_or(ClassName::from_static("Object"));

    out!("Register class:   {class_name} at level `{:?}`", info.init_level);

    // SAFETY: params are valid; the engine copies the creation info during the call.
    unsafe {
        sys::interface_fn!(classdb_register_extension_class2)(
            sys::get_library(),
            class_name.string_sys(),
            parent_class_name.string_sys(),
            std::ptr::addr_of!(info.godot_params),
        )
    };

    // The engine does not report failure directly; it logs and skips the class. The class tag tells whether it succeeded.
    let tag = class_name.class_tag();
    if tag.is_null() {
        godot_error!(
            "failed to register class `{class_name}`; check preceding engine errors\n  \
             (if the class was renamed or removed, the .gdextension file may need a reload)"
        );
        return false;
    }

    for &(name, value) in &info.constants {
        let constant_name = StringName::from(name);
        let enum_name = StringName::from("");

        // SAFETY: all names are valid StringNames for the duration of the call.
        unsafe {
            sys::interface_fn!(classdb_register_extension_class_integer_constant)(
                sys::get_library(),
                class_name.string_sys(),
                enum_name.string_sys(),
                constant_name.string_sys(),
                value,
                sys::GDEXTENSION_FALSE,
            );
        }
    }

    if info.is_editor_plugin && info.init_level == InitLevel::Editor {
        // SAFETY: class_name was registered above.
        unsafe { sys::interface_fn!(editor_add_plugin)(class_name.string_sys()) };
    }

    true
}

fn unregister_class_raw(class: LoadedClass) {
    let class_name = class.name;
    out!("Unregister class: {class_name}");

    if class.is_editor_plugin {
        // SAFETY: class_name refers to a class registered as editor plugin by this library.
        unsafe { sys::interface_fn!(editor_remove_plugin)(class_name.string_sys()) };
        out!("| Unregister editor plugin: {class_name}");
    }

    // SAFETY: class_name refers to a class registered by this library.
    unsafe {
        sys::interface_fn!(classdb_unregister_extension_class)(sys::get_library(), class_name.string_sys());
    }

    out!("Class {class_name} unloaded");
}

fn default_creation_info() -> sys::GDExtensionClassCreationInfo2 {
    sys::GDExtensionClassCreationInfo2 {
        is_virtual: sys::GDEXTENSION_FALSE,
        is_abstract: sys::GDEXTENSION_FALSE,
        is_exposed: sys::GDEXTENSION_TRUE,
        set_func: None,
        get_func: None,
        get_property_list_func: None,
        free_property_list_func: None,
        property_can_revert_func: None,
        property_get_revert_func: None,
        validate_property_func: None,
        notification_func: None,
        to_string_func: None,
        reference_func: None,
        unreference_func: None,
        create_instance_func: None,
        free_instance_func: None,
        recreate_instance_func: None,
        get_virtual_func: None,
        get_virtual_call_data_func: None,
        call_virtual_with_data_func: None,
        get_rid_func: None,
        class_userdata: std::ptr::null_mut(),
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &'static str, parent: &'static str) -> (ClassName, ClassRegistrationInfo) {
        let class_name = ClassName::from_static(name);
        let mut info = default_registration_info(class_name, InitLevel::Scene);
        info.parent_class_name = Some(ClassName::from_static(parent));

        (class_name, info)
    }

    #[test]
    fn parents_are_registered_first() {
        let order = [
            ClassName::from_static("Leaf"),
            ClassName::from_static("Other"),
            ClassName::from_static("Middle"),
        ];
        let map = HashMap::from([
            info("Leaf", "Middle"),
            info("Middle", "Node"),
            info("Other", "RefCounted"),
        ]);

        let sorted = sort_by_parent(&order, &map);
        let names: Vec<&str> = sorted.iter().map(|c| c.as_str()).collect();

        assert_eq!(names, ["Middle", "Leaf", "Other"]);
    }

    #[test]
    fn creation_info_defaults_to_exposed_concrete() {
        let params = default_creation_info();

        assert_eq!(params.is_exposed, sys::GDEXTENSION_TRUE);
        assert_eq!(params.is_abstract, sys::GDEXTENSION_FALSE);
        assert!(params.create_instance_func.is_none());
        assert!(params.class_userdata.is_null());
    }
}

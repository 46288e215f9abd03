/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

pub use crate::registry::callbacks;
pub use crate::registry::callbacks::{virtual_call, virtual_call_ref};
pub use crate::registry::plugin::{ClassPlugin, Constant, ITraitImpl, PluginItem, Struct};
pub use sys::out;

use std::io::Write;

use crate::builtin::{GString, StringName};
use crate::obj::{Gd, GodotClass, ObjectHandle, Ownership, RawGd};
use crate::{godot_error, sys};

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Plugins

sys::plugin_registry!(pub __GDLINK_PLUGIN_REGISTRY: ClassPlugin);

pub(crate) fn iterate_plugins(mut visitor: impl FnMut(&ClassPlugin)) {
    sys::plugin_foreach!(__GDLINK_PLUGIN_REGISTRY; visitor);
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Objects passed by the engine

/// Object argument of a virtual call, as passed by the engine: a pointer to an object pointer.
///
/// Ref-counted objects take their own reference, so the user may keep the `Gd` beyond the call.
///
/// # Safety
/// `arg` must point to a valid object pointer of class `T` (or a subclass).
pub unsafe fn object_from_virtual_arg<T: GodotClass>(arg: sys::GDExtensionConstTypePtr) -> Gd<T> {
    let object_ptr = *(arg as *const sys::GDExtensionObjectPtr);
    assert!(
        !object_ptr.is_null(),
        "engine passed null object to virtual method expecting Gd<{}>",
        T::class_name()
    );

    Gd::from_raw(RawGd::from_lookup(ObjectHandle::from_ptr(object_ptr)))
}

/// Handle to an engine singleton such as `Engine` or `OS`.
///
/// Singletons live as long as the engine; the handle never releases them.
#[track_caller]
pub fn engine_singleton<T: GodotClass>() -> Gd<T> {
    let class_name = T::class_name();

    // SAFETY: binding is initialized (asserted by string_sys()).
    let object_ptr = unsafe { sys::interface_fn!(global_get_singleton)(class_name.string_sys()) };
    assert!(
        !object_ptr.is_null(),
        "engine singleton `{class_name}` is not available"
    );

    // SAFETY: the engine returned a live object of class T.
    let raw = unsafe { RawGd::from_return(object_ptr, Ownership::MustAssertInstanceId) };
    Gd::from_raw(raw)
}

/// Dynamic class name of a live object, as reported by the engine.
pub(crate) fn dynamic_class_name(object_ptr: sys::GDExtensionObjectPtr) -> String {
    let mut ok = sys::GDEXTENSION_FALSE;

    // SAFETY: object_ptr is live (checked by callers). On failure the engine leaves the payload zeroed, which is the empty name.
    let class_name = unsafe {
        StringName::new_with_uninit(|uninit| {
            ok = sys::interface_fn!(object_get_class_name)(
                sys::to_const_ptr(object_ptr),
                sys::get_library(),
                uninit,
            );
        })
    };

    if ok == sys::GDEXTENSION_FALSE {
        return String::new();
    }

    GString::from(&class_name).to_string()
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Editor

/// Whether a class without `#[class(tool)]` must stay passive, because only tool classes run inside the editor.
pub(crate) fn is_class_inactive(is_tool: bool) -> bool {
    if is_tool {
        return false;
    }

    // SAFETY: only invoked after global library initialization.
    let config = unsafe { sys::config() };
    let is_editor = || crate::classes::Engine::singleton().is_editor_hint();

    is_inactive_in(config, is_tool, is_editor)
}

fn is_inactive_in(config: &sys::GdextConfig, is_tool: bool, is_editor: impl FnOnce() -> bool) -> bool {
    !is_tool && config.tool_only_in_editor && config.is_editor_or_init(is_editor)
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Panic handling

pub fn extract_panic_message(err: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = err.downcast_ref::<&'static str>() {
        s.to_string()
    } else if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else {
        format!("(panic of type ID {:?})", err.type_id())
    }
}

fn format_panic_message(msg: String) -> String {
    // If the message contains newlines, print all of the lines after a line break, and indent them.
    let lbegin = "\n  ";
    let indented = msg.replace('\n', lbegin);

    if indented.len() != msg.len() {
        format!("[panic]{lbegin}{indented}")
    } else {
        format!("[panic]  {msg}")
    }
}

/// Executes `code`. If a panic is thrown, it is caught and an error message is printed to the engine.
///
/// Returns `Err(message)` if a panic occurred, and `Ok(result)` with the result of `code` otherwise.
pub fn handle_panic<E, F, R, S>(error_context: E, code: F) -> Result<R, String>
where
    E: FnOnce() -> S,
    F: FnOnce() -> R,
    S: std::fmt::Display,
{
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(code)) {
        Ok(result) => Ok(result),
        Err(err) => {
            // Flush, so that Rust output printed before the panic appears before the error.
            let _ = std::io::stdout().flush();

            let msg = format_panic_message(extract_panic_message(err));
            godot_error!("{}\n  Context: {}", msg, error_context());

            Err(msg)
        }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_messages_are_indented() {
        assert_eq!(format_panic_message("boom".to_string()), "[panic]  boom");
        assert_eq!(
            format_panic_message("line 1\nline 2".to_string()),
            "[panic]\n  line 1\n  line 2"
        );
    }

    #[test]
    fn only_tool_classes_run_in_editor() {
        let config = sys::GdextConfig::new(true);
        assert!(is_inactive_in(&config, false, || true));
        assert!(!is_inactive_in(&config, true, || true));

        // Editor state is queried once, then cached.
        assert!(is_inactive_in(&config, false, || false));
    }

    #[test]
    fn all_classes_run_outside_editor_or_when_configured() {
        let outside_editor = sys::GdextConfig::new(true);
        assert!(!is_inactive_in(&outside_editor, false, || false));

        let all_classes = sys::GdextConfig::new(false);
        assert!(!is_inactive_in(&all_classes, false, || true));
    }

    #[test]
    fn caught_panic_returns_message() {
        let result: Result<(), String> = handle_panic(|| "unit test", || panic!("expected"));

        let msg = result.expect_err("panic should be caught");
        assert!(msg.contains("expected"), "{msg}");
    }
}

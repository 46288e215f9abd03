/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::init::InitLevel;
use crate::meta::ClassName;
use crate::obj::{cap, GodotClass, UserClass};
use crate::registry::callbacks;
use crate::sys;

/// Piece of information that is gathered by the self-registration ("plugin") system.
///
/// Each `#[derive(GodotClass)]` and `#[godot_api]` expansion submits one or more of these; the registry merges all items with
/// the same class name before handing them to the engine.
#[derive(Debug)]
pub struct ClassPlugin {
    pub(crate) class_name: ClassName,
    pub(crate) init_level: InitLevel,
    pub(crate) item: PluginItem,
}

impl ClassPlugin {
    /// Creates a new `ClassPlugin`, automatically setting the `class_name` and `init_level` to the values defined in [`GodotClass`].
    pub fn new<T: GodotClass>(item: PluginItem) -> Self {
        Self {
            class_name: T::class_name(),
            init_level: T::INIT_LEVEL,
            item,
        }
    }

    pub fn class_name(&self) -> ClassName {
        self.class_name
    }

    pub fn init_level(&self) -> InitLevel {
        self.init_level
    }
}

/// Type-erased function object, holding a function which is called during class registration.
#[derive(Copy, Clone)]
pub struct ErasedFn<F> {
    pub raw: F,
}

impl<F> fmt::Debug for ErasedFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ErasedFn(..)")
    }
}

pub type CreateFn = unsafe extern "C" fn(*mut std::ffi::c_void) -> sys::GDExtensionObjectPtr;
pub type FreeFn = unsafe extern "C" fn(*mut std::ffi::c_void, sys::GDExtensionClassInstancePtr);
pub type GetVirtualFn =
    unsafe extern "C" fn(*mut std::ffi::c_void, sys::GDExtensionConstStringNamePtr) -> sys::GDExtensionClassCallVirtual;
pub type ToStringFn =
    unsafe extern "C" fn(sys::GDExtensionClassInstancePtr, *mut sys::GDExtensionBool, sys::GDExtensionStringPtr);
pub type NotificationFn = unsafe extern "C" fn(sys::GDExtensionClassInstancePtr, i32, sys::GDExtensionBool);
pub type RefCountFn = unsafe extern "C" fn(sys::GDExtensionClassInstancePtr);

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Plugin items

/// Represents the data part of a [`ClassPlugin`] instance.
#[derive(Clone, Debug)]
pub enum PluginItem {
    /// Class definition itself, must always be available.
    Struct(Struct),

    /// Collected from `#[godot_api] impl I... for MyClass`.
    ITraitImpl(ITraitImpl),

    /// Integer constant declared with `#[class(constants(...))]`.
    Constant(Constant),
}

/// Helper function which checks that the field has not been set before.
fn set<T>(field: &mut Option<T>, value: T) {
    assert!(field.is_none(), "attempted to set field more than once");
    *field = Some(value);
}

/// Class definition from `#[derive(GodotClass)]`.
#[derive(Clone, Debug)]
pub struct Struct {
    /// The name of the base class in the engine.
    pub(crate) base_class_name: ClassName,

    /// Default constructor from `#[class(init)]`.
    ///
    /// `None` for classes without init, or where `init()` is overridden in the `I*` trait impl.
    pub(crate) generated_create_fn: Option<ErasedFn<CreateFn>>,

    /// Function called by the engine to destroy an instance.
    pub(crate) free_fn: ErasedFn<FreeFn>,

    /// Reference counting hooks; the engine only invokes them for `RefCounted` subclasses.
    pub(crate) reference_fn: ErasedFn<RefCountFn>,
    pub(crate) unreference_fn: ErasedFn<RefCountFn>,

    /// Whether the class's virtual methods run inside the editor.
    pub(crate) is_tool: bool,

    /// Whether the class is registered as editor plugin at `InitLevel::Editor`.
    pub(crate) is_editor_plugin: bool,

    /// Whether the engine may construct the class (requires a create function).
    pub(crate) is_instantiable: bool,
}

impl Struct {
    pub fn new<T: UserClass>() -> Self {
        Self {
            base_class_name: <T::Base as GodotClass>::class_name(),
            generated_create_fn: None,
            free_fn: ErasedFn {
                raw: callbacks::free::<T>,
            },
            reference_fn: ErasedFn {
                raw: callbacks::reference::<T>,
            },
            unreference_fn: ErasedFn {
                raw: callbacks::unreference::<T>,
            },
            is_tool: T::__IS_TOOL,
            is_editor_plugin: false,
            is_instantiable: true,
        }
    }

    pub fn with_generated<T: cap::GodotDefault>(mut self) -> Self {
        set(
            &mut self.generated_create_fn,
            ErasedFn {
                raw: callbacks::create::<T>,
            },
        );
        self
    }

    pub fn with_editor_plugin(mut self) -> Self {
        self.is_editor_plugin = true;
        self
    }

    pub fn with_no_init(mut self) -> Self {
        self.is_instantiable = false;
        self
    }
}

/// Virtual dispatch and overridden lifecycle functions, from `#[godot_api] impl I... for MyClass`.
#[derive(Clone, Debug)]
pub struct ITraitImpl {
    /// Callback to user-defined `init()`, if present.
    pub(crate) user_create_fn: Option<ErasedFn<CreateFn>>,

    /// Callback to user-defined `to_string()`, if present.
    pub(crate) user_to_string_fn: Option<ErasedFn<ToStringFn>>,

    /// Callback to user-defined `on_notification()`, if present.
    pub(crate) user_on_notification_fn: Option<ErasedFn<NotificationFn>>,

    /// Looks up the trampoline of an overridden engine virtual.
    pub(crate) get_virtual_fn: ErasedFn<GetVirtualFn>,
}

impl ITraitImpl {
    pub fn new<T: cap::ImplementsVirtuals>() -> Self {
        Self {
            user_create_fn: None,
            user_to_string_fn: None,
            user_on_notification_fn: None,
            get_virtual_fn: ErasedFn {
                raw: callbacks::get_virtual::<T>,
            },
        }
    }

    pub fn with_create<T: cap::GodotDefault>(mut self) -> Self {
        set(
            &mut self.user_create_fn,
            ErasedFn {
                raw: callbacks::create::<T>,
            },
        );
        self
    }

    pub fn with_string<T: cap::GodotToString>(mut self) -> Self {
        set(
            &mut self.user_to_string_fn,
            ErasedFn {
                raw: callbacks::to_string::<T>,
            },
        );
        self
    }

    pub fn with_on_notification<T: cap::GodotNotification>(mut self) -> Self {
        set(
            &mut self.user_on_notification_fn,
            ErasedFn {
                raw: callbacks::on_notification::<T>,
            },
        );
        self
    }
}

/// Integer constant exposed on a user class.
#[derive(Clone, Debug)]
pub struct Constant {
    pub(crate) name: &'static str,
    pub(crate) value: i64,
}

impl Constant {
    pub fn new(name: &'static str, value: i64) -> Self {
        Self { name, value }
    }
}

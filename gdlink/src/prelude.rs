/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

pub use super::builtin::{GString, StringName};
pub use super::classes::{
    CanvasItem, Container, Control, Engine, ICanvasItem, IContainer, IControl, INode, IObject,
    IRefCounted, IResource, Node, Object, RefCounted, Resource, OS,
};
pub use super::gdextension_entry;
pub use super::global::{godot_error, godot_print, godot_script_error, godot_warn};
pub use super::init::{ExtensionLibrary, InitLevel};
pub use super::meta::error::{CallError, ConvertError};
pub use super::obj::{Base, Gd, GdMut, GdRef, GodotClass, Inherits, InstanceId};
// Re-export macros.
pub use super::register::{godot_api, GodotClass};

// Make trait methods available.
#[rustfmt::skip] // One per line.
mod trait_reexports {
    pub use crate::obj::EngineBitfield as _;
    pub use crate::obj::EngineEnum as _;
    pub use crate::obj::NewAlloc as _;
    pub use crate::obj::NewGd as _;
}

pub use trait_reexports::*;

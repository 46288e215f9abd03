/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Low-level layer of gdlink: GDExtension ABI declarations, engine interface loading and the call frame.
//!
//! Everything in this crate is `unsafe`-heavy and not meant to be used directly; see the `gdlink` crate instead.

#![cfg_attr(test, allow(unused))]

#[allow(non_camel_case_types, non_upper_case_globals, non_snake_case)]
mod gdextension_interface;

mod binding;
mod call_frame;
mod global;
mod init_level;
mod interface;
mod opaque;
mod plugins;
mod string_cache;
mod toolbox;

pub use binding::*;
pub use call_frame::{CallFrame, MAX_ARGS, SLOT_ALIGN, SLOT_SIZE};
pub use gdextension_interface::*;
pub use global::{Global, GlobalGuard};
pub use init_level::{InitLevel, InitStage};
pub use interface::{runtime_version, BuiltinLifecycleTable, EngineInterface, InitError};
pub use opaque::{Opaque, OpaqueString, OpaqueStringName};
pub use string_cache::StringCache;
pub use toolbox::*;

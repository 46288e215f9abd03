/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Maps the engine class API to Rust.
//!
//! This module contains the following symbols:
//! * Classes: `Node`, `TabContainer`, etc.
//! * Interface traits with overridable virtual methods: `INode`, `ICanvasItem`, etc.
//! * Sidecar modules with class enums, constants and signal names: `node`, `tab_container`, etc.
//!
//! All of them are generated from the bundled `extension_api.json`. Methods whose parameter or return types are outside the
//! supported marshalling set are not generated.

mod class_registry;

pub use class_registry::{all_engine_classes, ancestors, is_subclass_of, lookup, EngineClassInfo};

// Output of generated code.
#[rustfmt::skip]
#[allow(unused_imports, dead_code, non_upper_case_globals, non_snake_case)]
#[allow(clippy::too_many_arguments, clippy::let_and_return, clippy::new_ret_no_self)]
#[allow(clippy::wrong_self_convention, clippy::inherent_to_string)] // Object::to_string()
#[allow(clippy::upper_case_acronyms)] // OS
mod generated {
    include!(concat!(env!("OUT_DIR"), "/classes.rs"));
}

pub use generated::*;

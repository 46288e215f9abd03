/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Registration of user classes with the engine.
//!
//! `#[derive(GodotClass)]` and `#[godot_api]` submit [`plugin::ClassPlugin`]s; at every init level, [`class`] merges them
//! per class and hands them to the engine, and unregisters them in reverse order on shutdown.

// Public here for simplicity; final re-exports for the main crate are in lib.rs, mod private.

pub mod callbacks;
pub mod class;
pub mod plugin;

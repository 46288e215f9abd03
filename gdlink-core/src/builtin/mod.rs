/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Built-in types owned by the engine and used in engine calls.
//!
//! Only the string types are provided. Scalars (`bool`, `i64`, `f64`, ...) map to Rust primitives, see
//! [`FfiArg`][crate::meta::FfiArg].

mod string;

pub use string::{GString, StringName};

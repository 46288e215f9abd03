/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! # Internal crate of [**gdlink**](https://docs.rs/gdlink)
//!
//! Do not depend on this crate directly, instead use the `gdlink` crate.
//! No SemVer or other guarantees are provided.

pub mod builtin;
pub mod classes;
pub mod global;
pub mod init;
pub mod meta;
pub mod obj;
pub mod registry;

mod storage;

pub use gdlink_ffi as sys;

#[doc(hidden)]
pub use sys::out;

pub use storage::InstanceStorage;

#[doc(hidden)]
pub mod private;

/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Meta-information about engine types and calls: class names, method binds, marshalling and the pointer-call builder.
//!
//! Generated class wrappers are thin: each engine method is a [`MethodBind`] plus a [`PtrCall`] chain, which does the work of
//! checking the receiver, packing arguments into a call frame and adopting the result.

pub mod error;

mod class_name;
mod marshal;
mod method_bind;
mod ptrcall;

pub use class_name::ClassName;
pub use marshal::{EnumOrd, FfiArg, FfiReturn};
pub use method_bind::MethodBind;
pub use ptrcall::{expect_call, ArgPassing, PtrCall, ReturnOwnership};

pub(crate) use class_name::cleanup as cleanup_string_names;

/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! # Rust bindings for the GDExtension API
//!
//! Covers a subset of the engine's classes, generated from `extension_api.json`, plus registration of user classes.
//!
//! ## Module organization
//!
//! * [`obj`]: the object model: [`Gd`][obj::Gd] smart pointers, [`Base`][obj::Base], traits describing the class hierarchy.
//! * [`classes`]: generated engine classes (`Node`, `Control`, ...), their enums and `I*` virtual-method traits.
//! * [`builtin`]: engine strings `GString` and `StringName`.
//! * [`global`]: global enums such as [`Error`][global::Error] and logging macros.
//! * [`meta`]: class names, call errors and marshalling traits.
//! * [`init`]: entry point of the library, [`ExtensionLibrary`][init::ExtensionLibrary].
//! * [`register`]: macros that register user classes.
//!
//! ## Ownership
//!
//! Every object pointer received from the engine carries an ownership tag (see [`obj::Ownership`]), decided per method when the
//! bindings are generated. Objects transferred to Rust are released when their last `Gd` is dropped; borrowed ones are checked
//! for liveness on every use.
//!
//! ## Example
//!
//! ```no_run
//! use gdlink::prelude::*;
//!
//! #[derive(GodotClass)]
//! #[class(init, base = Node)]
//! struct Greeter {
//!     base: Base<Node>,
//! }
//!
//! #[godot_api]
//! impl INode for Greeter {
//!     fn ready(&mut self) {
//!         godot_print!("ready with {} children", self.base.get_child_count(false));
//!     }
//! }
//!
//! struct MyExtension;
//!
//! unsafe impl ExtensionLibrary for MyExtension {}
//!
//! gdextension_entry!(MyExtension, gdext_rust_init);
//! ```

#[doc(inline)]
pub use gdlink_core::{builtin, classes, global, meta, obj};

#[doc(hidden)]
pub use gdlink_core::sys;

pub use gdlink_core::gdextension_entry;

/// Entry point and initialization levels.
pub mod init {
    pub use gdlink_core::init::{EditorRunBehavior, ExtensionLibrary, InitLevel, InitStage};
}

/// Registration of user-defined classes.
pub mod register {
    pub use gdlink_macros::{godot_api, GodotClass};

    pub use gdlink_core::registry::class::loaded_classes;
}

/// Often-imported symbols.
pub mod prelude;

#[doc(hidden)]
pub mod private {
    pub use gdlink_core::private::*;

    /// Home of the `#[macro_export]` macros of generated classes, such as `inherits_transitive_Node!`.
    pub use gdlink_core as class_macros;
}

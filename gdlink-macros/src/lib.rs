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

mod class;
mod util;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;

type ParseResult<T> = Result<T, venial::Error>;

// Below intra-doc link to the trait only works as HTML, not as symbol link.
/// Derive macro for [`GodotClass`](../obj/trait.GodotClass.html) on structs.
///
/// You should use this macro; manual implementations of the `GodotClass` trait are not encouraged.
///
/// This is typically used in combination with [`#[godot_api]`](attr.godot_api.html), which overrides virtual methods
/// of the base class.
///
/// # Construction
///
/// With `#[class(init)]`, a default constructor is generated: the `Base<T>` field receives the base object, all other
/// fields are initialized with `Default::default()`, or with the expression given in `#[init(val = ...)]`.
///
/// ```no_run
/// # use gdlink::prelude::*;
/// #[derive(GodotClass)]
/// #[class(init, base = Node)]
/// struct Player {
///     #[init(val = 100)]
///     health: i64,
///
///     #[base]
///     base: Base<Node>,
/// }
/// ```
///
/// Without `init`, the class must override `init()` in its `#[godot_api] impl I... for MyClass` block; otherwise it is
/// registered as abstract. `#[class(no_init)]` explicitly disables construction from the engine.
///
/// # Inheritance
///
/// Classes inherit `RefCounted` unless `#[class(base = ...)]` names another engine class. A field of type `Base<T>` (optionally
/// marked `#[base]`) holds the back-pointer to the engine object, and derefs to the base class' methods.
///
/// # Other keys
///
/// - `tool`: virtual methods also run inside the editor.
/// - `editor_plugin`: the class is added as editor plugin when the editor loads; implies `tool`.
/// - `rename = Name`: registers the class under a different name than the Rust struct.
/// - `constants(NAME = value, ...)`: integer constants, visible to scripts as `MyClass.NAME`.
///
/// ```no_run
/// # use gdlink::prelude::*;
/// #[derive(GodotClass)]
/// #[class(init, rename = GameRules, constants(MAX_PLAYERS = 4, START_LIVES = 3))]
/// struct Rules;
/// ```
#[proc_macro_derive(GodotClass, attributes(class, base, init))]
pub fn derive_godot_class(input: TokenStream) -> TokenStream {
    translate(input, class::derive_godot_class)
}

/// Proc-macro attribute to be used on `impl I... for MyClass` blocks, overriding engine virtual methods.
///
/// Apart from the engine virtuals (`ready`, `process`, `input`, ...), the `I*` traits contain three hooks of the class
/// itself: `init()` (constructor), `to_string()` (used by the engine's `str()`) and `on_notification()`.
///
/// Only overridden virtuals are reported to the engine; all others keep the engine's default behavior.
///
/// ```no_run
/// # use gdlink::prelude::*;
/// #[derive(GodotClass)]
/// #[class(base = Node)]
/// struct Ticker {
///     ticks: u64,
///     base: Base<Node>,
/// }
///
/// #[godot_api]
/// impl INode for Ticker {
///     fn init(base: Base<Node>) -> Self {
///         Self { ticks: 0, base }
///     }
///
///     fn process(&mut self, _delta: f64) {
///         self.ticks += 1;
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn godot_api(meta: TokenStream, input: TokenStream) -> TokenStream {
    let meta = TokenStream2::from(meta);

    translate(input, |item| class::attribute_godot_api(meta, item))
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Implementation

fn translate<F>(input: TokenStream, transform: F) -> TokenStream
where
    F: FnOnce(venial::Item) -> ParseResult<TokenStream2>,
{
    let input2 = TokenStream2::from(input);

    let result2 = venial::parse_item(input2)
        .and_then(transform)
        .unwrap_or_else(|e| e.to_compile_error());

    TokenStream::from(result2)
}

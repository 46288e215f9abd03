/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Integration tests for gdlink, run against an in-process mock of the engine.
//!
//! The [`mock`] module plays the engine side of the GDExtension ABI; [`framework`] collects and runs the tests declared with
//! [`itest!`] in `tests/itest`.

pub mod framework;
pub mod mock;

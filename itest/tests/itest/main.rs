/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::sync::Mutex;

use gdlink::init::{ExtensionLibrary, InitLevel};
use itest::framework::{self, take_engine_errors};
use itest::mock;

mod cast_test;
mod error_test;
mod interface_test;
mod node_test;
mod object_test;
mod refcounted_test;
mod registration_test;
mod singleton_test;
mod string_test;
mod tab_container_test;
mod virtual_test;

/// Level callbacks received by the library, as `(is_init, level)`.
pub(crate) static LEVEL_LOG: Mutex<Vec<(bool, InitLevel)>> = Mutex::new(Vec::new());

struct ItestLibrary;

unsafe impl ExtensionLibrary for ItestLibrary {
    fn min_level() -> InitLevel {
        InitLevel::Core
    }

    fn on_level_init(level: InitLevel) {
        LEVEL_LOG.lock().unwrap().push((true, level));
    }

    fn on_level_deinit(level: InitLevel) {
        LEVEL_LOG.lock().unwrap().push((false, level));
    }
}

gdlink::gdextension_entry!(ItestLibrary, itest_init);

fn main() {
    // Flags such as `--nocapture` are passed by cargo; everything else filters test names.
    let filters: Vec<String> = std::env::args()
        .skip(1)
        .filter(|arg| !arg.starts_with('-'))
        .collect();

    if let Err(err) = mock::load_extension(Some(itest_init)) {
        eprintln!("failed to load extension: {err}");
        std::process::exit(1);
    }

    let load_errors = take_engine_errors();
    if !load_errors.is_empty() {
        eprintln!("engine errors while loading the extension:");
        for error in &load_errors {
            eprintln!("  * {error}");
        }
    }

    let tests_passed = framework::run_tests(&filters);

    mock::unload_extension();
    let shutdown_ok = check_shutdown();

    let success = tests_passed && load_errors.is_empty() && shutdown_ok;
    std::process::exit(if success { 0 } else { 1 });
}

/// After unloading, no class may stay registered and no engine string may stay alive.
fn check_shutdown() -> bool {
    let mut ok = true;

    let classes = mock::registered_classes();
    if !classes.is_empty() {
        eprintln!("classes still registered after unload: {classes:?}");
        ok = false;
    }

    let strings = mock::live_string_count();
    if strings != 0 {
        eprintln!("{strings} engine strings leaked after unload");
        ok = false;
    }

    let errors = take_engine_errors();
    if !errors.is_empty() {
        eprintln!("engine errors during unload: {errors:#?}");
        ok = false;
    }

    ok
}

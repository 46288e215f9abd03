/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::path::{Path, PathBuf};

fn main() {
    let api_json = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("gdlink-codegen")
        .join("input")
        .join("extension_api.json");

    let out_dir = PathBuf::from(std::env::var("OUT_DIR").expect("OUT_DIR set by cargo"));

    println!("cargo:rerun-if-changed={}", api_json.display());
    println!("cargo:rerun-if-changed=build.rs");

    let stats = gdlink_codegen::generate_core_files(&api_json, &out_dir)
        .unwrap_or_else(|err| panic!("failed to generate engine classes: {err}"));

    // Visible with `cargo build -vv`.
    println!(
        "Generated {} classes ({} methods, {} skipped) into {}",
        stats.classes,
        stats.methods,
        stats.skipped_methods,
        out_dir.display()
    );
}

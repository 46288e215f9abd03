/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Generates the engine class wrappers of `gdlink-core` from `extension_api.json`.
//!
//! Invoked from `gdlink-core/build.rs`; not meant to be used otherwise.

mod context;
mod conv;
mod generator;
mod models;
mod ownership;
mod util;

#[cfg(test)]
mod tests;

use std::fmt;
use std::path::{Path, PathBuf};

use proc_macro2::TokenStream;

use crate::context::Context;
use crate::generator::central_files;
use crate::models::json::{load_extension_api, JsonExtensionApi};

const GENERATED_HEADER: &str =
    "// Generated by gdlink-codegen from extension_api.json. Do not edit; changes are overwritten on build.\n\n";

/// Summary of one generator run.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Stats {
    pub classes: usize,
    pub methods: usize,

    /// Methods not generated because a parameter or return type has no marshalling, or the method is vararg.
    pub skipped_methods: usize,
}

#[derive(Debug)]
pub enum CodegenError {
    Io { path: PathBuf, source: std::io::Error },
    InvalidApi(String),
}

impl fmt::Display for CodegenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "I/O error on {}: {source}", path.display()),
            Self::InvalidApi(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for CodegenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::InvalidApi(_) => None,
        }
    }
}

/// Generated code, before it is written to disk.
struct GeneratedFiles {
    classes: TokenStream,
    global_enums: TokenStream,
    stats: Stats,
}

/// Reads `api_json` and writes `classes.rs` and `global_enums.rs` into `out_dir`.
pub fn generate_core_files(api_json: &Path, out_dir: &Path) -> Result<Stats, CodegenError> {
    let json = std::fs::read_to_string(api_json).map_err(|source| CodegenError::Io {
        path: api_json.to_path_buf(),
        source,
    })?;

    let api = load_extension_api(&json).map_err(CodegenError::InvalidApi)?;
    let generated = generate_from_api(&api).map_err(CodegenError::InvalidApi)?;

    write_file(&out_dir.join("classes.rs"), generated.classes)?;
    write_file(&out_dir.join("global_enums.rs"), generated.global_enums)?;

    Ok(generated.stats)
}

fn generate_from_api(api: &JsonExtensionApi) -> Result<GeneratedFiles, String> {
    let ctx = Context::build_from_api(api);
    let mut stats = Stats::default();

    let classes = central_files::make_classes_file(api, &ctx, &mut stats)?;
    let global_enums = central_files::make_global_enums_file(api)?;

    Ok(GeneratedFiles {
        classes,
        global_enums,
        stats,
    })
}

fn write_file(path: &Path, tokens: TokenStream) -> Result<(), CodegenError> {
    let contents = format!("{GENERATED_HEADER}{tokens}");

    std::fs::write(path, contents).map_err(|source| CodegenError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    #[cfg(feature = "codegen-rustfmt")]
    format_file(path);

    Ok(())
}

/// Best effort: a missing `rustfmt` leaves the file unformatted, which still compiles.
#[cfg(feature = "codegen-rustfmt")]
fn format_file(path: &Path) {
    let status = std::process::Command::new("rustfmt")
        .arg("--edition=2021")
        .arg(path)
        .status();

    if !matches!(status, Ok(s) if s.success()) {
        println!("cargo:warning=rustfmt failed on {}", path.display());
    }
}

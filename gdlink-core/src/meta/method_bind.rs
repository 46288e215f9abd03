/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::sync::OnceLock;

use crate::meta::class_name::static_string_name;
use crate::meta::error::CallError;
use crate::meta::ClassName;
use crate::sys;

#[derive(Copy, Clone)]
struct BindPtr(sys::GDExtensionMethodBindPtr);

// SAFETY: method binds are immutable engine-side descriptors, valid for the lifetime of the engine.
unsafe impl Send for BindPtr {}
// SAFETY: see Send.
unsafe impl Sync for BindPtr {}

/// Lazily resolved engine method bind, one per generated method.
///
/// Resolution happens on the first call. A missing bind is not cached: the error is reported on every call.
pub struct MethodBind {
    class_name: ClassName,
    method_name: &'static str,
    hash: i64,
    ptr: OnceLock<BindPtr>,
}

impl MethodBind {
    pub const fn new(class_name: &'static str, method_name: &'static str, hash: i64) -> Self {
        Self {
            class_name: ClassName::from_static(class_name),
            method_name,
            hash,
            ptr: OnceLock::new(),
        }
    }

    pub fn class_name(&self) -> ClassName {
        self.class_name
    }

    pub fn method_name(&self) -> &'static str {
        self.method_name
    }

    pub fn hash(&self) -> i64 {
        self.hash
    }

    /// Returns the engine bind, fetching it on first use.
    pub fn get(&self) -> Result<sys::GDExtensionMethodBindPtr, CallError> {
        if let Some(bind) = self.ptr.get() {
            return Ok(bind.0);
        }

        let class_sname = self.class_name.string_sys();
        let method_sname = static_string_name(self.method_name);

        // SAFETY: string names are valid engine StringNames (binding is initialized, see static_string_name()).
        let ptr = unsafe {
            sys::interface_fn!(classdb_get_method_bind)(class_sname, method_sname, self.hash)
        };

        if ptr.is_null() {
            return Err(CallError::missing_method(
                self.class_name.as_str(),
                self.method_name,
                self.hash,
            ));
        }

        sys::out!(
            "MethodBind: resolved {}::{} (hash {})",
            self.class_name,
            self.method_name,
            self.hash
        );

        Ok(self.ptr.get_or_init(|| BindPtr(ptr)).0)
    }
}

impl std::fmt::Debug for MethodBind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MethodBind({}::{}, hash={}, resolved={})",
            self.class_name,
            self.method_name,
            self.hash,
            self.ptr.get().is_some()
        )
    }
}

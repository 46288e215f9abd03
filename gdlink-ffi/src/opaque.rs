/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate as sys;

/// Opaque engine value of `N` bytes, only touched through engine constructors and destructors.
///
/// The pointer marker removes `Send` and `Sync`; engine strings are not thread-safe to share without synchronization.
#[repr(C, align(8))]
#[derive(Copy, Clone)]
pub struct Opaque<const N: usize> {
    storage: [u8; N],
    marker: std::marker::PhantomData<*const u8>,
}

impl<const N: usize> Opaque<N> {
    /// All-zero value. For `String` and `StringName`, this is the engine's representation of the empty value.
    pub const fn zeroed() -> Self {
        Self {
            storage: [0; N],
            marker: std::marker::PhantomData,
        }
    }

    pub fn as_type_ptr(&self) -> sys::GDExtensionConstTypePtr {
        self as *const Self as sys::GDExtensionConstTypePtr
    }

    pub fn as_uninit_ptr(&mut self) -> sys::GDExtensionUninitializedTypePtr {
        self as *mut Self as sys::GDExtensionUninitializedTypePtr
    }

    /// Raw bytes; only meaningful for tests and debugging output.
    pub fn bytes(&self) -> &[u8; N] {
        &self.storage
    }
}

impl<const N: usize> std::fmt::Debug for Opaque<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Opaque<{N}>({:02x?})", self.storage)
    }
}

/// Payload of an engine `StringName`.
pub type OpaqueStringName = Opaque<8>;

/// Payload of an engine `String`.
pub type OpaqueString = Opaque<8>;

sys::static_assert!(std::mem::size_of::<OpaqueStringName>() == 8);
sys::static_assert_eq_size!(OpaqueString, OpaqueStringName);

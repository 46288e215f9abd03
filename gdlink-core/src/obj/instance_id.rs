/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::num::NonZeroU64;

use crate::sys;

/// Represents a non-zero instance ID.
///
/// The engine assigns every object a unique ID that is never reused while the process runs. This makes the ID the only reliable way
/// to check whether a pointer still refers to the same, living object: see [`lookup_validity()`](Self::lookup_validity).
///
/// The engine uses `u64` in C++ and `i64` in scripts; both representations are available.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct InstanceId {
    value: NonZeroU64,
}

impl InstanceId {
    /// Constructs an instance ID from an integer, or `None` if the integer is zero.
    ///
    /// This does *not* check if the instance is valid.
    pub fn try_from_i64(id: i64) -> Option<Self> {
        Self::try_from_u64(id as u64)
    }

    /// Constructs an instance ID from an unsigned integer, or `None` if the integer is zero.
    pub fn try_from_u64(id: u64) -> Option<Self> {
        NonZeroU64::new(id).map(|value| Self { value })
    }

    /// Constructs an instance ID from a non-zero integer, or panics.
    ///
    /// # Panics
    /// If `id` is zero.
    pub fn from_nonzero(id: i64) -> Self {
        Self::try_from_i64(id).expect("expected non-zero instance ID")
    }

    pub fn to_i64(self) -> i64 {
        self.to_u64() as i64
    }

    pub fn to_u64(self) -> u64 {
        self.value.get()
    }

    /// Returns if the object being referred to inherits `RefCounted`.
    ///
    /// No engine round-trip: the engine encodes this in bit 63 of the ID.
    pub fn is_ref_counted(self) -> bool {
        self.to_u64() & (1u64 << 63) != 0
    }

    /// Asks the engine whether an object with this ID is still alive.
    pub fn lookup_validity(self) -> bool {
        !self.lookup_object_ptr().is_null()
    }

    /// Pointer of the object with this ID, or null if it has been destroyed.
    pub(crate) fn lookup_object_ptr(self) -> sys::GDExtensionObjectPtr {
        // SAFETY: looking up an ID is always safe, dead IDs yield null.
        unsafe { sys::interface_fn!(object_get_instance_from_id)(self.to_u64()) }
    }
}

impl Display for InstanceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.to_i64())
    }
}

impl Debug for InstanceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "InstanceId({})", self.to_i64())
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_is_not_an_instance_id() {
        assert_eq!(InstanceId::try_from_i64(0), None);
        assert_eq!(InstanceId::try_from_u64(0), None);
    }

    #[test]
    fn ref_counted_bit() {
        let manual = InstanceId::from_nonzero(42);
        let refcounted = InstanceId::try_from_u64(42 | (1 << 63)).unwrap();

        assert!(!manual.is_ref_counted());
        assert!(refcounted.is_ref_counted());
        assert!(refcounted.to_i64() < 0);
        assert_eq!(format!("{refcounted:?}"), format!("InstanceId({})", refcounted.to_i64()));
    }

    proptest! {
        #[test]
        fn signed_and_unsigned_agree(raw in 1u64..) {
            let id = InstanceId::try_from_u64(raw).unwrap();

            prop_assert_eq!(InstanceId::try_from_i64(id.to_i64()), Some(id));
            prop_assert_eq!(id.is_ref_counted(), raw >> 63 == 1);
        }
    }
}

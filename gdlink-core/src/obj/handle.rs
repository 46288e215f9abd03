/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::meta::error::CallError;
use crate::obj::InstanceId;
use crate::sys;

/// Opaque engine object: raw pointer plus the instance ID it had when the handle was created.
///
/// The pointer alone cannot tell whether the object is still alive, since the engine may destroy it and reuse the address. The ID
/// can: the engine never reuses IDs, so [`is_alive()`](Self::is_alive) asks whether the ID still maps to this pointer.
///
/// Generated engine classes are `#[repr(transparent)]` wrappers around this type, which is what allows reinterpreting a handle
/// as any class in its inheritance chain.
#[repr(C)]
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct ObjectHandle {
    ptr: sys::GDExtensionObjectPtr,
    id: Option<InstanceId>,

    /// For lifetime-bound objects: the object whose destruction also destroys this one.
    bound_to: Option<InstanceId>,
}

impl ObjectHandle {
    pub const fn null() -> Self {
        Self {
            ptr: std::ptr::null_mut(),
            id: None,
            bound_to: None,
        }
    }

    /// Creates a handle from a pointer returned by the engine, fetching its instance ID.
    ///
    /// # Safety
    /// `ptr` must be null or point to a live engine object.
    pub unsafe fn from_ptr(ptr: sys::GDExtensionObjectPtr) -> Self {
        if ptr.is_null() {
            return Self::null();
        }

        let raw_id = sys::interface_fn!(object_get_instance_id)(sys::to_const_ptr(ptr));

        Self {
            ptr,
            id: InstanceId::try_from_u64(raw_id),
            bound_to: None,
        }
    }

    /// Marks this handle as only valid while `owner` is alive.
    pub(crate) fn with_owner(self, owner: InstanceId) -> Self {
        Self {
            bound_to: Some(owner),
            ..self
        }
    }

    pub fn is_null(&self) -> bool {
        self.ptr.is_null()
    }

    pub fn ptr(&self) -> sys::GDExtensionObjectPtr {
        self.ptr
    }

    pub fn instance_id(&self) -> Option<InstanceId> {
        self.id
    }

    /// For lifetime-bound handles, the ID of the owning object.
    pub fn owner(&self) -> Option<InstanceId> {
        self.bound_to
    }

    /// Checks with the engine whether the object (and its owner, if any) is still alive.
    ///
    /// Never dereferences the pointer.
    pub fn is_alive(&self) -> bool {
        let Some(id) = self.id else {
            return false;
        };

        if id.lookup_object_ptr() != self.ptr {
            return false;
        }

        match self.bound_to {
            Some(owner) => owner.lookup_validity(),
            None => true,
        }
    }

    /// Returns the pointer if the object can be used as receiver of `class_name::method_name()`.
    pub fn checked_ptr(
        &self,
        class_name: &str,
        method_name: &str,
    ) -> Result<sys::GDExtensionObjectPtr, CallError> {
        if self.is_null() {
            return Err(CallError::null_instance(class_name, method_name));
        }

        if !self.is_alive() {
            return Err(CallError::dead_instance(class_name, method_name, self.id));
        }

        Ok(self.ptr)
    }
}

impl Default for ObjectHandle {
    fn default() -> Self {
        Self::null()
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::error::CallErrorKind;

    #[test]
    fn null_handle_is_never_alive() {
        let handle = ObjectHandle::null();

        assert!(handle.is_null());
        assert!(!handle.is_alive());
        assert_eq!(handle.instance_id(), None);

        let err = handle.checked_ptr("Node", "get_name").unwrap_err();
        assert_eq!(err.kind(), CallErrorKind::NullInstance);
    }

    #[test]
    fn owner_is_recorded() {
        let owner = InstanceId::from_nonzero(3);
        let handle = ObjectHandle::null().with_owner(owner);

        assert_eq!(handle.owner(), Some(owner));
    }
}

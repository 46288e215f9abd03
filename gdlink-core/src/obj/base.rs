/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

use crate::obj::{EngineClass, Gd, GodotClass, ObjectHandle, Ownership, RawGd};

/// Restricted version of `Gd`, to hold the base instance inside a user's `GodotClass`.
///
/// Behaves similarly to [`Gd`][crate::obj::Gd], but is more constrained. Cannot be constructed by the user.
///
/// Holds no reference and never releases the object: the base object owns the user instance, not the other way around.
pub struct Base<T: GodotClass> {
    handle: ObjectHandle,
    _marker: PhantomData<*const T>,
}

impl<T: GodotClass> Base<T> {
    pub(crate) fn from_handle(handle: ObjectHandle) -> Self {
        assert!(!handle.is_null(), "instance base is null pointer");

        Self {
            handle,
            _marker: PhantomData,
        }
    }

    /// Returns a [`Gd`] referencing the same object.
    ///
    /// The pointer is engine-owned: it is re-validated on every call and does not keep the object alive.
    pub fn to_gd(&self) -> Gd<T> {
        Gd::from_raw(RawGd::from_handle(
            self.handle,
            Ownership::MustAssertInstanceId,
        ))
    }

    #[doc(hidden)]
    pub fn handle(&self) -> &ObjectHandle {
        &self.handle
    }
}

impl<T: EngineClass> Deref for Base<T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: T is #[repr(transparent)] over ObjectHandle (EngineClass contract).
        unsafe { &*(&self.handle as *const ObjectHandle as *const T) }
    }
}

impl<T: EngineClass> DerefMut for Base<T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: see deref().
        unsafe { &mut *(&mut self.handle as *mut ObjectHandle as *mut T) }
    }
}

impl<T: GodotClass> Debug for Base<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let id = self
            .handle
            .instance_id()
            .map_or_else(|| "null".to_string(), |id| id.to_string());

        write!(f, "Base {{ id: {id}, class: {} }}", T::class_name())
    }
}

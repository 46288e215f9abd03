/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::cell::{Ref, RefMut};
use std::ops::{Deref, DerefMut};

use crate::obj::GodotClass;
use crate::out;
use crate::storage::InstanceStorage;

/// Immutably/shared bound reference guard for a [`Gd`][crate::obj::Gd] smart pointer.
///
/// See [`Gd::bind`][crate::obj::Gd::bind] for usage.
#[derive(Debug)]
pub struct GdRef<'a, T: GodotClass> {
    guard: Ref<'a, T>,
}

impl<'a, T: GodotClass> GdRef<'a, T> {
    #[track_caller]
    pub(crate) fn from_storage(storage: &'a InstanceStorage<T>) -> Self {
        let guard = storage.get().unwrap_or_else(|_| {
            panic!(
                "Gd<{}>::bind() failed, already bound; T = {}.\n  \
                Make sure there is no &mut T live at the time.\n  \
                This often occurs when calling an engine method on the base object from a virtual method taking &mut self.",
                T::class_name(),
                std::any::type_name::<T>()
            )
        });

        Self { guard }
    }
}

impl<T: GodotClass> Deref for GdRef<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T: GodotClass> Drop for GdRef<'_, T> {
    fn drop(&mut self) {
        out!("GdRef drop: {:?}", std::any::type_name::<T>());
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

/// Mutably/exclusively bound reference guard for a [`Gd`][crate::obj::Gd] smart pointer.
///
/// See [`Gd::bind_mut`][crate::obj::Gd::bind_mut] for usage.
#[derive(Debug)]
pub struct GdMut<'a, T: GodotClass> {
    guard: RefMut<'a, T>,
}

impl<'a, T: GodotClass> GdMut<'a, T> {
    #[track_caller]
    pub(crate) fn from_storage(storage: &'a InstanceStorage<T>) -> Self {
        let guard = storage.get_mut().unwrap_or_else(|_| {
            panic!(
                "Gd<{}>::bind_mut() failed, already bound; T = {}.\n  \
                Make sure to drop all other bind() and bind_mut() guards first.",
                T::class_name(),
                std::any::type_name::<T>()
            )
        });

        Self { guard }
    }
}

impl<T: GodotClass> Deref for GdMut<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T: GodotClass> DerefMut for GdMut<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<T: GodotClass> Drop for GdMut<'_, T> {
    fn drop(&mut self) {
        out!("GdMut drop: {:?}", std::any::type_name::<T>());
    }
}

/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Engine string types.
//!
//! | Intended use case | String type      |
//! |-------------------|------------------|
//! | General purpose   | [`GString`]      |
//! | Interned names    | [`StringName`]   |

mod gstring;
mod string_name;

pub use gstring::GString;
pub use string_name::StringName;

/// Pointer-call marshalling shared by the opaque string types: arguments are passed by pointer to the payload, returns are
/// adopted from the slot the engine constructed them in.
macro_rules! impl_string_ffi {
    ($Str:ident, $Opaque:ty, copy: $copy:ident, destroy: $destroy:ident) => {
        impl $crate::meta::FfiArg for $Str {
            fn push_arg<'a>(&'a self, frame: &mut $crate::sys::CallFrame<'a>) {
                frame.push_ref(&self.opaque);
            }

            unsafe fn from_arg_ptr(ptr: $crate::sys::GDExtensionConstTypePtr) -> Self {
                let copy = $crate::sys::builtin_lifecycle_api().$copy;
                Self::new_with_uninit(|uninit| copy(uninit, [ptr].as_ptr()))
            }
        }

        impl $crate::meta::FfiReturn for $Str {
            unsafe fn from_return(frame: &mut $crate::sys::CallFrame) -> Self {
                Self {
                    opaque: frame.take_return::<$Opaque>(),
                }
            }

            unsafe fn write_return(self, ret: $crate::sys::GDExtensionTypePtr) {
                let destroy = $crate::sys::builtin_lifecycle_api().$destroy;
                destroy(ret);

                let this = std::mem::ManuallyDrop::new(self);
                std::ptr::write(ret as *mut $Opaque, this.opaque);
            }
        }
    };
}

pub(crate) use impl_string_ffi;

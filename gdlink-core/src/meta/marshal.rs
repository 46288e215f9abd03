/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Marshalling of values into call frames and out of engine argument arrays.
//!
//! Pointer calls use the engine's "ptrcall" encoding: every `int` is 64 bits, every `float` is a double, `bool` is one byte, and
//! builtins such as `String` are passed as pointers to their opaque payload.

use crate::sys;
use sys::CallFrame;

/// Values that can be passed as arguments of engine calls and received as arguments of virtual calls.
pub trait FfiArg {
    /// Pushes `self` as the next argument of `frame`.
    #[doc(hidden)]
    fn push_arg<'a>(&'a self, frame: &mut CallFrame<'a>);

    /// Reads an argument passed by the engine. Types with a destructor are copied; the engine keeps its value.
    ///
    /// # Safety
    /// `ptr` must point to a valid value in ptrcall encoding for `Self`.
    #[doc(hidden)]
    unsafe fn from_arg_ptr(ptr: sys::GDExtensionConstTypePtr) -> Self;
}

/// Values that can be returned from engine calls and from virtual method overrides.
pub trait FfiReturn: Sized {
    /// Moves the return value out of the frame after a call.
    ///
    /// # Safety
    /// The engine must have written a value of this type to the return slot, or left it zeroed.
    #[doc(hidden)]
    unsafe fn from_return(frame: &mut CallFrame) -> Self;

    /// Writes `self` to a return pointer provided by the engine.
    ///
    /// # Safety
    /// `ret` must point to storage for `Self` in ptrcall encoding. For types with a destructor, the storage must hold an
    /// initialized value, which is replaced.
    #[doc(hidden)]
    unsafe fn write_return(self, ret: sys::GDExtensionTypePtr);
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Scalars

macro_rules! impl_ffi_scalar {
    ($T:ty as $Via:ty, |$to:ident| $to_expr:expr, |$from:ident| $from_expr:expr) => {
        impl FfiArg for $T {
            fn push_arg<'a>(&'a self, frame: &mut CallFrame<'a>) {
                let $to: $T = *self;
                frame.push_value::<$Via>($to_expr);
            }

            unsafe fn from_arg_ptr(ptr: sys::GDExtensionConstTypePtr) -> Self {
                let $from: $Via = *(ptr as *const $Via);
                $from_expr
            }
        }

        impl FfiReturn for $T {
            unsafe fn from_return(frame: &mut CallFrame) -> Self {
                let $from: $Via = frame.read_return::<$Via>();
                $from_expr
            }

            unsafe fn write_return(self, ret: sys::GDExtensionTypePtr) {
                let $to: $T = self;
                *(ret as *mut $Via) = $to_expr;
            }
        }
    };
}

impl_ffi_scalar!(bool as u8, |v| v as u8, |v| v != 0);
impl_ffi_scalar!(i64 as i64, |v| v, |v| v);
impl_ffi_scalar!(f64 as f64, |v| v, |v| v);

// Narrow Rust types are widened in ptrcall encoding; `meta` in the API JSON decides which Rust type a method uses.
impl_ffi_scalar!(i32 as i64, |v| v as i64, |v| v as i32);
impl_ffi_scalar!(u32 as i64, |v| v as i64, |v| v as u32);
impl_ffi_scalar!(u64 as i64, |v| v as i64, |v| v as u64);
impl_ffi_scalar!(f32 as f64, |v| v as f64, |v| v as f32);

impl FfiReturn for () {
    unsafe fn from_return(_frame: &mut CallFrame) -> Self {}

    unsafe fn write_return(self, _ret: sys::GDExtensionTypePtr) {}
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Enums

/// Integer type backing a generated enum (`i32`) or bitfield (`u64`); transported as `i64`.
#[doc(hidden)]
pub trait EnumOrd: Copy {
    /// Converts the transported value, panicking if it does not fit.
    fn from_sys_ord(raw: i64, enum_name: &str) -> Self;

    fn to_sys_ord(self) -> i64;
}

impl EnumOrd for i32 {
    fn from_sys_ord(raw: i64, enum_name: &str) -> Self {
        i32::try_from(raw).unwrap_or_else(|_| {
            panic!("ordinal {raw} received from engine is out of range for enum {enum_name}")
        })
    }

    fn to_sys_ord(self) -> i64 {
        i64::from(self)
    }
}

// Bitfields use all 64 bits; the sign bit of the transported value is flag 63.
impl EnumOrd for u64 {
    fn from_sys_ord(raw: i64, _enum_name: &str) -> Self {
        raw as u64
    }

    fn to_sys_ord(self) -> i64 {
        self as i64
    }
}

/// Implements [`FfiArg`] and [`FfiReturn`] for a generated enum or bitfield newtype with field `ord`.
///
/// Ordinals are transported as-is, including values unknown to the bindings. Values that do not fit the ordinal type panic.
#[doc(hidden)]
#[macro_export]
macro_rules! impl_ffi_enum {
    ($Enum:ty, $Ord:ty) => {
        impl $crate::meta::FfiArg for $Enum {
            fn push_arg<'a>(&'a self, frame: &mut $crate::sys::CallFrame<'a>) {
                frame.push_value::<i64>(<$Ord as $crate::meta::EnumOrd>::to_sys_ord(self.ord));
            }

            unsafe fn from_arg_ptr(ptr: $crate::sys::GDExtensionConstTypePtr) -> Self {
                let raw = *(ptr as *const i64);
                Self {
                    ord: <$Ord as $crate::meta::EnumOrd>::from_sys_ord(raw, stringify!($Enum)),
                }
            }
        }

        impl $crate::meta::FfiReturn for $Enum {
            unsafe fn from_return(frame: &mut $crate::sys::CallFrame) -> Self {
                let raw = frame.read_return::<i64>();
                Self {
                    ord: <$Ord as $crate::meta::EnumOrd>::from_sys_ord(raw, stringify!($Enum)),
                }
            }

            unsafe fn write_return(self, ret: $crate::sys::GDExtensionTypePtr) {
                *(ret as *mut i64) = <$Ord as $crate::meta::EnumOrd>::to_sys_ord(self.ord);
            }
        }
    };
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn returned<R: FfiReturn>(value: R) -> R {
        let mut frame = CallFrame::new();
        unsafe {
            value.write_return(frame.ret_ptr());
            R::from_return(&mut frame)
        }
    }

    #[test]
    fn scalars_use_wide_encoding() {
        let mut frame = CallFrame::new();
        let flag = true;
        let small = -3_i32;
        let ratio = 0.5_f32;

        flag.push_arg(&mut frame);
        small.push_arg(&mut frame);
        ratio.push_arg(&mut frame);

        let args = frame.args_ptr();
        unsafe {
            assert_eq!(*(*args.add(0) as *const u8), 1);
            assert_eq!(*(*args.add(1) as *const i64), -3);
            assert_eq!(*(*args.add(2) as *const f64), 0.5);

            assert!(bool::from_arg_ptr(*args.add(0)));
            assert_eq!(i32::from_arg_ptr(*args.add(1)), -3);
            assert_eq!(f32::from_arg_ptr(*args.add(2)), 0.5);
        }
    }

    #[test]
    fn returns_through_slot() {
        assert!(returned(true));
        assert_eq!(returned(-7_i64), -7);
        assert_eq!(returned(u64::MAX), u64::MAX);
        assert_eq!(returned(1.25_f64), 1.25);
    }

    #[derive(Copy, Clone, Debug, PartialEq)]
    struct Mode {
        ord: i32,
    }
    crate::impl_ffi_enum!(Mode, i32);

    #[derive(Copy, Clone, Debug, PartialEq)]
    struct Flags {
        ord: u64,
    }
    crate::impl_ffi_enum!(Flags, u64);

    #[test]
    fn enum_ordinals_pass_through() {
        assert_eq!(returned(Mode { ord: 4711 }), Mode { ord: 4711 });
        assert_eq!(returned(Mode { ord: -1 }), Mode { ord: -1 });
        assert_eq!(returned(Flags { ord: 1 << 63 }), Flags { ord: 1 << 63 });
    }

    #[test]
    #[should_panic(expected = "ordinal 9223372036854775807 received from engine is out of range for enum Mode")]
    fn enum_ordinal_out_of_range_panics() {
        let mut frame = CallFrame::new();
        unsafe {
            i64::MAX.write_return(frame.ret_ptr());
            Mode::from_return(&mut frame);
        }
    }

    #[test]
    fn zeroed_slot_reads_as_default() {
        let mut frame = CallFrame::new();
        unsafe {
            assert!(!bool::from_return(&mut frame));
            assert_eq!(i32::from_return(&mut frame), 0);
        }
    }
}

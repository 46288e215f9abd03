/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Fixed-layout argument and return buffer for a single pointer call.
//!
//! `object_method_bind_ptrcall` takes an array of type pointers (one per argument) and a pointer to the return value. The
//! [`CallFrame`] owns storage for both, so generated code never has to allocate to perform a call:
//!
//! ```ignore
//! let mut frame = CallFrame::new();
//! frame.push_value(index);            // copied into a slot
//! frame.push_ref(&name);              // points to caller storage, lives as long as the frame
//! unsafe { ptrcall(bind, object, frame.args_ptr(), frame.ret_ptr()) };
//! let result: i64 = unsafe { frame.read_return() };
//! ```
//!
//! A frame never drops the contents of its slots. Values pushed by copy are plain bit patterns (integers, floats, object
//! pointers); types with destructors are pushed by reference and stay owned by the caller.

use std::ffi::c_void;
use std::marker::PhantomData;
use std::mem::MaybeUninit;

use crate as sys;

/// Maximum number of arguments in one frame.
pub const MAX_ARGS: usize = 16;

/// Size of one argument or return slot, in bytes. Large enough for any builtin passed by value in pointer calls.
pub const SLOT_SIZE: usize = 64;

/// Alignment of each slot.
pub const SLOT_ALIGN: usize = 16;

#[repr(C, align(16))]
#[derive(Copy, Clone)]
struct Slot([MaybeUninit<u8>; SLOT_SIZE]);

sys::static_assert!(std::mem::size_of::<Slot>() == SLOT_SIZE);
sys::static_assert!(std::mem::align_of::<Slot>() == SLOT_ALIGN);

impl Slot {
    const fn zeroed() -> Self {
        Self([MaybeUninit::new(0); SLOT_SIZE])
    }
}

#[derive(Copy, Clone)]
enum ArgSource {
    /// The argument lives in the frame slot of the same index.
    Slot,

    /// The argument lives in caller-owned storage.
    Borrowed(sys::GDExtensionConstTypePtr),
}

/// Argument and return buffer for one call across the ABI.
///
/// The lifetime `'a` bounds all arguments pushed by reference.
pub struct CallFrame<'a> {
    slots: [MaybeUninit<Slot>; MAX_ARGS],
    sources: [ArgSource; MAX_ARGS],
    arg_ptrs: [sys::GDExtensionConstTypePtr; MAX_ARGS],
    len: usize,
    ret: Slot,
    _borrowed: PhantomData<&'a ()>,
}

impl<'a> CallFrame<'a> {
    /// Creates an empty frame with a zeroed return slot.
    pub fn new() -> Self {
        Self {
            slots: [MaybeUninit::uninit(); MAX_ARGS],
            sources: [ArgSource::Slot; MAX_ARGS],
            arg_ptrs: [std::ptr::null(); MAX_ARGS],
            len: 0,
            ret: Slot::zeroed(),
            _borrowed: PhantomData,
        }
    }

    /// Number of arguments pushed so far.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Copies `value` into the next argument slot.
    ///
    /// # Panics
    /// If the frame already holds [`MAX_ARGS`] arguments.
    pub fn push_value<T: Copy>(&mut self, value: T) {
        const {
            assert!(std::mem::size_of::<T>() <= SLOT_SIZE, "type too large for call frame slot");
            assert!(std::mem::align_of::<T>() <= SLOT_ALIGN, "type over-aligned for call frame slot");
        }

        let index = self.next_index();
        let slot_ptr = self.slots[index].as_mut_ptr() as *mut T;

        // SAFETY: size and alignment checked at compile time; slot storage is exclusively ours.
        unsafe { slot_ptr.write(value) };
        self.sources[index] = ArgSource::Slot;
    }

    /// Passes a pointer to caller-owned `value` as the next argument.
    ///
    /// Used for arguments that have a destructor (strings, string names) or are already laid out as the engine expects.
    ///
    /// # Panics
    /// If the frame already holds [`MAX_ARGS`] arguments.
    pub fn push_ref<T>(&mut self, value: &'a T) {
        let index = self.next_index();
        self.sources[index] = ArgSource::Borrowed(value as *const T as *const c_void);
    }

    /// Passes a raw type pointer as the next argument.
    ///
    /// # Safety
    /// `ptr` must stay valid for as long as the frame is used for a call.
    pub unsafe fn push_raw(&mut self, ptr: sys::GDExtensionConstTypePtr) {
        let index = self.next_index();
        self.sources[index] = ArgSource::Borrowed(ptr);
    }

    /// Returns the argument pointer array, as expected by `object_method_bind_ptrcall`.
    ///
    /// The returned pointer is valid until the frame is moved or modified.
    pub fn args_ptr(&mut self) -> *const sys::GDExtensionConstTypePtr {
        for index in 0..self.len {
            self.arg_ptrs[index] = match self.sources[index] {
                ArgSource::Slot => self.slots[index].as_ptr() as sys::GDExtensionConstTypePtr,
                ArgSource::Borrowed(ptr) => ptr,
            };
        }

        self.arg_ptrs.as_ptr()
    }

    /// Returns the pointer to the return slot, to be written by the engine.
    ///
    /// The slot is zeroed on construction, so a call that does not write it reads back as zero/null.
    pub fn ret_ptr(&mut self) -> sys::GDExtensionTypePtr {
        std::ptr::addr_of_mut!(self.ret) as sys::GDExtensionTypePtr
    }

    /// Reads a plain value from the return slot.
    ///
    /// # Safety
    /// The slot must contain a valid bit pattern for `T` (any bit pattern written by the engine for that return type,
    /// or zero).
    pub unsafe fn read_return<T: Copy>(&self) -> T {
        const {
            assert!(std::mem::size_of::<T>() <= SLOT_SIZE, "type too large for call frame slot");
            assert!(std::mem::align_of::<T>() <= SLOT_ALIGN, "type over-aligned for call frame slot");
        }

        std::ptr::addr_of!(self.ret).cast::<T>().read()
    }

    /// Moves an engine-constructed value out of the return slot.
    ///
    /// # Safety
    /// The engine must have constructed a `T` in the return slot during the last call; the value must not be taken twice.
    pub unsafe fn take_return<T>(&mut self) -> T {
        const {
            assert!(std::mem::size_of::<T>() <= SLOT_SIZE, "type too large for call frame slot");
            assert!(std::mem::align_of::<T>() <= SLOT_ALIGN, "type over-aligned for call frame slot");
        }

        let value = std::ptr::addr_of!(self.ret).cast::<T>().read();
        self.ret = Slot::zeroed();
        value
    }

    fn next_index(&mut self) -> usize {
        assert!(
            self.len < MAX_ARGS,
            "call frame holds at most {MAX_ARGS} arguments"
        );

        let index = self.len;
        self.len += 1;
        index
    }
}

impl Default for CallFrame<'_> {
    fn default() -> Self {
        Self::new()
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    unsafe fn arg_at<T: Copy>(args: *const sys::GDExtensionConstTypePtr, index: usize) -> T {
        (*args.add(index)).cast::<T>().read()
    }

    #[test]
    fn mixed_arguments_keep_order() {
        let name = [1u8, 2, 3, 4, 5, 6, 7, 8];

        let mut frame = CallFrame::new();
        frame.push_value(42_i64);
        frame.push_ref(&name);
        frame.push_value(true as sys::GDExtensionBool);
        frame.push_value(2.5_f64);

        assert_eq!(frame.len(), 4);
        let args = frame.args_ptr();

        unsafe {
            assert_eq!(arg_at::<i64>(args, 0), 42);
            assert_eq!(*args.add(1), name.as_ptr() as sys::GDExtensionConstTypePtr);
            assert_eq!(arg_at::<sys::GDExtensionBool>(args, 2), 1);
            assert_eq!(arg_at::<f64>(args, 3), 2.5);
        }
    }

    #[test]
    fn return_slot_starts_zeroed() {
        let frame = CallFrame::new();

        let ptr: *mut c_void = unsafe { frame.read_return() };
        assert!(ptr.is_null());
        assert_eq!(unsafe { frame.read_return::<i64>() }, 0);
    }

    #[test]
    fn return_slot_is_written_through_pointer() {
        let mut frame = CallFrame::new();
        let ret = frame.ret_ptr();

        unsafe { ret.cast::<i64>().write(-17) };
        assert_eq!(unsafe { frame.read_return::<i64>() }, -17);

        let taken: i64 = unsafe { frame.take_return() };
        assert_eq!(taken, -17);
        assert_eq!(unsafe { frame.read_return::<i64>() }, 0);
    }

    #[test]
    fn slots_are_aligned() {
        let mut frame = CallFrame::new();
        frame.push_value(1_u8);
        frame.push_value(2_u8);
        let args = frame.args_ptr();

        for index in 0..2 {
            let addr = unsafe { *args.add(index) } as usize;
            assert_eq!(addr % SLOT_ALIGN, 0);
        }
        assert_eq!(frame.ret_ptr() as usize % SLOT_ALIGN, 0);
    }

    #[test]
    #[should_panic(expected = "call frame holds at most 16 arguments")]
    fn too_many_arguments_panics() {
        let mut frame = CallFrame::new();
        for i in 0..=MAX_ARGS {
            frame.push_value(i as i64);
        }
    }

    proptest! {
        #[test]
        fn values_are_passed_in_push_order(values in proptest::collection::vec(any::<i64>(), 0..=MAX_ARGS)) {
            let mut frame = CallFrame::new();
            for value in &values {
                frame.push_value(*value);
            }

            let args = frame.args_ptr();
            for (index, expected) in values.iter().enumerate() {
                let actual = unsafe { arg_at::<i64>(args, index) };
                prop_assert_eq!(actual, *expected);
            }
        }
    }
}

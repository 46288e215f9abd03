/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::cell::Cell;

use crate::classes::Node;
use crate::meta::error::CallError;
use crate::meta::{ClassName, FfiArg, FfiReturn, MethodBind};
use crate::obj::{mark_transferred, EngineClass, Gd, GodotClass, InstanceId, ObjectHandle, Ownership, RawGd};
use crate::{out, sys};
use sys::CallFrame;

/// How an object argument is handed to the engine, as decided by the ownership table.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ArgPassing {
    /// The engine only uses the object during the call.
    Borrowed,

    /// The engine takes over the object (e.g. a node added as child). Rust stops releasing it once the engine accepted it.
    Transferred,
}

/// Who owns an object returned from an engine call, as decided by the ownership table.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ReturnOwnership {
    /// The engine passed a reference along; Rust releases it.
    RefCounted,

    /// A fresh manually-managed object; Rust destroys it unless it is handed back to the engine.
    Owned,

    /// Valid as long as the receiver is alive (e.g. internal child nodes).
    LifetimeBound,

    /// Owned by the engine; validity is re-checked through the instance ID on every use.
    MustAssertInstanceId,

    /// Valid for the current call only.
    Borrowed,
}

/// Builder for one pointer call to an engine method, used by generated code.
///
/// Errors are sticky: the first failing step is remembered, later steps become no-ops, and `finish*` returns the error
/// without calling into the engine.
pub struct PtrCall<'a> {
    bind: &'static MethodBind,
    receiver: sys::GDExtensionObjectPtr,
    receiver_id: Option<InstanceId>,
    frame: CallFrame<'a>,
    error: Option<CallError>,

    // Arguments passed as `ArgPassing::Transferred`; marked only once the engine took them over.
    transfers: Vec<(&'a Cell<Ownership>, ObjectHandle)>,
}

impl<'a> PtrCall<'a> {
    /// Starts a call on an instance method. The receiver must be alive.
    pub fn begin(bind: &'static MethodBind, receiver: &ObjectHandle) -> Self {
        let mut call = Self::new(bind, std::ptr::null_mut(), None);

        match receiver.checked_ptr(bind.class_name().as_str(), bind.method_name()) {
            Ok(ptr) => {
                call.receiver = ptr;
                call.receiver_id = receiver.instance_id();
            }
            Err(err) => call.error = Some(err),
        }

        call
    }

    /// Starts a call on a static method or singleton-less utility.
    pub fn begin_static(bind: &'static MethodBind) -> Self {
        Self::new(bind, std::ptr::null_mut(), None)
    }

    fn new(
        bind: &'static MethodBind,
        receiver: sys::GDExtensionObjectPtr,
        receiver_id: Option<InstanceId>,
    ) -> Self {
        Self {
            bind,
            receiver,
            receiver_id,
            frame: CallFrame::new(),
            error: None,
            transfers: Vec::new(),
        }
    }

    /// Appends a plain argument.
    pub fn arg<A: FfiArg>(mut self, value: &'a A) -> Self {
        if self.error.is_none() {
            value.push_arg(&mut self.frame);
        }

        self
    }

    /// Appends an object argument, checking that it is alive.
    ///
    /// With the `debug-checks` feature, also verifies that the object is an instance of `expected`, the parameter class.
    pub fn object_arg<T: GodotClass>(
        mut self,
        arg: &'a Gd<T>,
        passing: ArgPassing,
        expected: ClassName,
    ) -> Self {
        if self.error.is_some() {
            return self;
        }

        let index = self.frame.len();
        let raw: &'a RawGd<T> = &arg.raw;

        if let Err(err) = raw.check_alive() {
            out!("PtrCall: argument #{index} rejected: {err}");
            self.error = Some(CallError::dead_argument(
                self.bind.class_name().as_str(),
                self.bind.method_name(),
                index,
                T::class_name(),
            ));
            return self;
        }

        #[cfg(feature = "debug-checks")]
        if let Err(err) = check_class(raw.handle(), expected) {
            self.error = Some(CallError::wrong_argument_class(
                self.bind.class_name().as_str(),
                self.bind.method_name(),
                index,
                err,
            ));
            return self;
        }
        #[cfg(not(feature = "debug-checks"))]
        let _ = expected;

        self.frame.push_value(raw.handle().ptr());
        if passing == ArgPassing::Transferred {
            self.transfers.push((raw.ownership_cell(), *raw.handle()));
        }

        self
    }

    /// Executes the call and reads a plain return value.
    pub fn finish<R: FfiReturn>(mut self) -> Result<R, CallError> {
        self.execute()?;

        // SAFETY: the engine wrote a value of the method's return type (or left the slot zeroed).
        Ok(unsafe { R::from_return(&mut self.frame) })
    }

    /// Executes the call and adopts the returned object according to `ownership`.
    ///
    /// A null return is `Ok(None)`.
    pub fn finish_object<C: GodotClass>(
        mut self,
        ownership: ReturnOwnership,
    ) -> Result<Option<Gd<C>>, CallError> {
        self.execute()?;

        // SAFETY: object returns are written as a single object pointer.
        let ptr = unsafe { self.frame.read_return::<sys::GDExtensionObjectPtr>() };
        if ptr.is_null() {
            return Ok(None);
        }

        let ownership = match ownership {
            ReturnOwnership::RefCounted => Ownership::RefCounted,
            ReturnOwnership::Owned => Ownership::Owned,
            ReturnOwnership::LifetimeBound => match self.receiver_id {
                Some(owner) => Ownership::LifetimeBound { owner },
                None => Ownership::MustAssertInstanceId,
            },
            ReturnOwnership::MustAssertInstanceId => Ownership::MustAssertInstanceId,
            ReturnOwnership::Borrowed => Ownership::Borrowed,
        };

        // SAFETY: the engine returned a live object of (a subclass of) the declared return class.
        let raw = unsafe { RawGd::<C>::from_return(ptr, ownership) };
        Ok(Some(Gd::from_raw(raw)))
    }

    fn execute(&mut self) -> Result<(), CallError> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }

        let bind = self.bind.get()?;
        out!(
            "PtrCall: {}::{} with {} args",
            self.bind.class_name(),
            self.bind.method_name(),
            self.frame.len()
        );

        let args = self.frame.args_ptr();
        let ret = self.frame.ret_ptr();

        // SAFETY: bind is a valid method bind, receiver was checked for liveness, args point to frame slots or to values
        // borrowed for 'a.
        unsafe {
            sys::interface_fn!(object_method_bind_ptrcall)(bind, self.receiver, args, ret);
        }

        for (tag, handle) in self.transfers.drain(..) {
            if engine_took_over(&handle) {
                mark_transferred(tag, handle.instance_id());
            } else {
                out!("PtrCall: engine rejected transfer of {:?}", handle.instance_id());
            }
        }

        Ok(())
    }
}

/// Whether the engine kept an object passed with [`ArgPassing::Transferred`].
///
/// The engine takes over nodes by adding them to a parent. A node that is still orphaned after the call was rejected (the engine
/// reported an error instead) and stays owned by Rust. Other objects are taken over by the call itself.
fn engine_took_over(handle: &ObjectHandle) -> bool {
    if !handle.is_alive() {
        return true;
    }

    // SAFETY: handle is alive; class tags are plain engine lookups.
    let node_ptr = unsafe {
        sys::interface_fn!(object_cast_to)(
            sys::to_const_ptr(handle.ptr()),
            <Node as GodotClass>::class_name().class_tag(),
        )
    };

    if node_ptr.is_null() {
        return true;
    }

    Node::__from_handle(*handle).get_parent().is_some()
}

#[cfg(feature = "debug-checks")]
fn check_class(
    handle: &ObjectHandle,
    expected: ClassName,
) -> Result<(), crate::meta::error::ConvertError> {
    use crate::meta::error::{ConvertError, ErrorKind};

    // SAFETY: handle is alive (checked by caller).
    let cast = unsafe {
        sys::interface_fn!(object_cast_to)(sys::to_const_ptr(handle.ptr()), expected.class_tag())
    };

    if cast.is_null() {
        let actual = crate::private::dynamic_class_name(handle.ptr());
        return Err(ConvertError::new(ErrorKind::WrongClass { expected, actual }));
    }

    Ok(())
}

/// Unwraps the result of a generated engine method, panicking at the caller's location on failure.
#[track_caller]
pub fn expect_call<R>(result: Result<R, CallError>) -> R {
    match result {
        Ok(value) => value,
        Err(err) => panic!("{err}"),
    }
}

/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::error::Error;
use std::fmt;

use crate::meta::error::ConvertError;
use crate::meta::ClassName;
use crate::obj::InstanceId;

/// Error raised by the binding before or instead of an engine method call.
///
/// The engine's _ptrcall_ convention has no error channel: whatever an engine method reports is part of its return value (for
/// example [`global::Error`](crate::global::Error)) and is passed through unchanged. `CallError` only covers failures detected
/// on the Rust side:
///
/// - **Null receiver**: the method was invoked on a handle that never pointed to an object.
/// - **Dead receiver or argument**: the object has been destroyed since the handle was obtained.
/// - **Missing method**: the engine does not know the method bind (class, name, hash), e.g. because the API version differs.
/// - **Wrong argument class**: the dynamic class of an object argument does not match the parameter (`debug-checks` only).
///
/// Generated engine methods panic with this error's message. It is exposed for code that calls [`PtrCall`](crate::meta::PtrCall)
/// directly and wants to handle failures.
pub struct CallError {
    // Boxed to keep Result<T, CallError> small; ptrcalls are on the hot path.
    b: Box<InnerCallError>,
}

#[derive(Debug)]
struct InnerCallError {
    kind: CallErrorKind,
    class_name: String,
    method_name: String,
    call_expr: String,
    reason: String,
    source: Option<ConvertError>,
}

/// Classification of a [`CallError`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[non_exhaustive]
pub enum CallErrorKind {
    /// Receiver handle is null.
    NullInstance,

    /// Receiver or an object argument has been destroyed.
    DeadInstance,

    /// The engine returned a null method bind.
    MissingMethod,

    /// An object argument is not an instance of the parameter class.
    WrongArgumentClass,
}

impl CallError {
    pub fn kind(&self) -> CallErrorKind {
        self.b.kind
    }

    /// Name of the class declaring the method. This is the static class, e.g. `Node` for `add_child()` called on a `Gd<Control>`.
    pub fn class_name(&self) -> &str {
        &self.b.class_name
    }

    pub fn method_name(&self) -> &str {
        &self.b.method_name
    }

    // ------------------------------------------------------------------------------------------------------------------------------------------
    // Constructors

    pub(crate) fn null_instance(class_name: &str, method_name: &str) -> Self {
        Self::new(
            CallErrorKind::NullInstance,
            class_name,
            method_name,
            "receiver is null",
            None,
        )
    }

    pub(crate) fn dead_instance(class_name: &str, method_name: &str, id: Option<InstanceId>) -> Self {
        let reason = match id {
            Some(id) => format!("receiver instance {id} has been freed"),
            None => "receiver has been freed".to_string(),
        };

        Self::new(CallErrorKind::DeadInstance, class_name, method_name, reason, None)
    }

    pub(crate) fn dead_argument(
        class_name: &str,
        method_name: &str,
        index: usize,
        arg_class: ClassName,
    ) -> Self {
        Self::new(
            CallErrorKind::DeadInstance,
            class_name,
            method_name,
            format!("argument #{index} ({arg_class}) has been freed"),
            None,
        )
    }

    pub(crate) fn missing_method(class_name: &str, method_name: &str, hash: i64) -> Self {
        Self::new(
            CallErrorKind::MissingMethod,
            class_name,
            method_name,
            format!("engine has no method bind with hash {hash}"),
            None,
        )
    }

    pub(crate) fn wrong_argument_class(
        class_name: &str,
        method_name: &str,
        index: usize,
        source: ConvertError,
    ) -> Self {
        Self::new(
            CallErrorKind::WrongArgumentClass,
            class_name,
            method_name,
            format!("argument #{index} has wrong class"),
            Some(source),
        )
    }

    fn new(
        kind: CallErrorKind,
        class_name: &str,
        method_name: &str,
        reason: impl Into<String>,
        source: Option<ConvertError>,
    ) -> Self {
        let inner = InnerCallError {
            kind,
            class_name: class_name.to_string(),
            method_name: method_name.to_string(),
            call_expr: format!("{class_name}::{method_name}()"),
            reason: reason.into(),
            source,
        };

        Self { b: Box::new(inner) }
    }

    /// Describes the error, optionally followed by the source error.
    pub fn message(&self, with_source: bool) -> String {
        let InnerCallError {
            call_expr,
            reason,
            source,
            ..
        } = &*self.b;

        match source {
            Some(source) if with_source => format!("{call_expr}: {reason}\n  Source: {source}"),
            _ => format!("{call_expr}: {reason}"),
        }
    }
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message(false))
    }
}

impl fmt::Debug for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.b)
    }
}

impl Error for CallError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.b.source.as_ref().map(|e| e as &(dyn Error + 'static))
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::error::ErrorKind;

    #[test]
    fn display_names_call_expression() {
        let err = CallError::null_instance("Node", "add_child");

        assert_eq!(err.kind(), CallErrorKind::NullInstance);
        assert_eq!(err.class_name(), "Node");
        assert_eq!(err.method_name(), "add_child");
        assert_eq!(err.to_string(), "Node::add_child(): receiver is null");
    }

    #[test]
    fn dead_instance_mentions_id() {
        let id = InstanceId::from_nonzero(1234);
        let err = CallError::dead_instance("Node", "get_name", Some(id));

        assert_eq!(err.kind(), CallErrorKind::DeadInstance);
        assert_eq!(
            err.to_string(),
            "Node::get_name(): receiver instance 1234 has been freed"
        );
    }

    #[test]
    fn wrong_class_chains_source() {
        let convert = ConvertError::new(ErrorKind::WrongClass {
            expected: ClassName::from_static("Node"),
            actual: "Resource".to_string(),
        });
        let err = CallError::wrong_argument_class("Node", "add_child", 0, convert);

        let source = err.source().expect("source error");
        assert_eq!(source.to_string(), "expected class Node, got Resource");
        assert_eq!(
            err.message(true),
            "Node::add_child(): argument #0 has wrong class\n  Source: expected class Node, got Resource"
        );
    }
}

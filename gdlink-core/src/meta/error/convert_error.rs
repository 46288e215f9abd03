/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::error::Error;
use std::fmt;

use crate::meta::ClassName;

/// Represents errors that can occur when converting engine objects into typed Rust handles.
///
/// Returned by fallible conversions such as [`Gd::try_from_instance_id()`](crate::obj::Gd::try_from_instance_id).
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ConvertError {
    kind: ErrorKind,
    value: Option<String>,
}

impl ConvertError {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, value: None }
    }

    /// Create an error that also describes the value that failed to convert.
    pub(crate) fn with_kind_value(kind: ErrorKind, value: impl fmt::Display) -> Self {
        Self {
            kind,
            value: Some(value.to_string()),
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Description of the value that failed to convert, if available.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if let Some(value) = &self.value {
            write!(f, ": {value}")?;
        }

        Ok(())
    }
}

impl Error for ConvertError {}

/// Reason for a [`ConvertError`].
#[derive(Clone, Eq, PartialEq, Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The engine returned a null object where an instance was required.
    NullObject,

    /// The object was destroyed.
    DeadObject,

    /// The object exists, but is not an instance of the requested class.
    WrongClass { expected: ClassName, actual: String },

    /// No live object has this instance ID.
    InvalidInstanceId,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NullObject => write!(f, "object is null"),
            Self::DeadObject => write!(f, "object has been freed"),
            Self::WrongClass { expected, actual } => {
                write!(f, "expected class {expected}, got {actual}")
            }
            Self::InvalidInstanceId => write!(f, "instance ID does not refer to a live object"),
        }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_appends_value() {
        let err = ConvertError::with_kind_value(ErrorKind::InvalidInstanceId, 77);

        assert_eq!(err.value(), Some("77"));
        assert_eq!(
            err.to_string(),
            "instance ID does not refer to a live object: 77"
        );
    }

    #[test]
    fn wrong_class_names_both_classes() {
        let err = ConvertError::new(ErrorKind::WrongClass {
            expected: ClassName::from_static("TabBar"),
            actual: "Control".to_string(),
        });

        assert_eq!(err.to_string(), "expected class TabBar, got Control");
        assert!(matches!(err.kind(), ErrorKind::WrongClass { .. }));
    }
}

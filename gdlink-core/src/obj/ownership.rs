/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::collections::HashSet;

use crate::obj::InstanceId;
use crate::sys::Global;

/// Objects currently owned by a Rust handle.
///
/// Ownership belongs to the object, not to the handle: passing any handle of an owned object to the engine ends it, so the
/// `Owned` handle must consult this set before destroying.
static OWNED_OBJECTS: Global<HashSet<InstanceId>> = Global::default();

/// Who is responsible for releasing the object behind a handle.
///
/// Every object pointer that crosses the ABI is tagged once, when it enters Rust (constructor, method return, virtual argument).
/// The tag decides what happens when the last Rust handle goes away, and which liveness checks are necessary:
///
/// | Tag                    | Released on drop by                 | Liveness                                 |
/// |------------------------|-------------------------------------|------------------------------------------|
/// | `Borrowed`             | nobody                              | checked by instance ID                   |
/// | `Owned`                | `object_destroy`                    | checked by instance ID                   |
/// | `RefCounted`           | `unreference`, destroy at zero      | kept alive by the reference              |
/// | `LifetimeBound`        | nobody; dies with `owner`           | object *and* owner checked by ID         |
/// | `MustAssertInstanceId` | nobody                              | checked by instance ID before every use  |
/// | `Released`             | already released                    | never used again                         |
///
/// Release happens at most once: it moves the tag to `Released`.
///
/// Transfers to the engine apply to the object: if a copy of an `Owned` handle is passed to a method taking ownership, the
/// original handle reports `MustAssertInstanceId` from then on and no longer destroys the object.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Ownership {
    /// Temporary reference handed out by the engine, only valid while the engine keeps the object alive.
    ///
    /// Not used for virtual-call arguments: those may outlive the call, so they are looked up like `Gd::try_from_instance_id()`
    /// and become `RefCounted` or `MustAssertInstanceId`.
    Borrowed,

    /// Ownership was transferred to Rust. The object is destroyed when its handle is dropped.
    Owned,

    /// Holds one engine reference of a `RefCounted` object.
    RefCounted,

    /// The object lives as long as `owner`; typically an internal child node of a container.
    LifetimeBound { owner: InstanceId },

    /// The engine owns the object and may destroy it at any time.
    MustAssertInstanceId,

    /// The handle has been released and must not release again.
    Released,
}

/// Effect of releasing a handle, as decided by its [`Ownership`].
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) enum ReleaseAction {
    Nothing,
    Destroy,
    Unreference,
}

impl Ownership {
    /// Whether dropping a handle with this tag releases the object.
    pub fn is_owning(self) -> bool {
        matches!(self, Self::Owned | Self::RefCounted)
    }

    /// Whether the handle must be re-validated through its instance ID before each use.
    pub fn requires_liveness_check(self) -> bool {
        !matches!(self, Self::RefCounted)
    }

    pub(crate) fn release_action(self) -> ReleaseAction {
        match self {
            Self::Owned => ReleaseAction::Destroy,
            Self::RefCounted => ReleaseAction::Unreference,
            Self::Borrowed
            | Self::LifetimeBound { .. }
            | Self::MustAssertInstanceId
            | Self::Released => ReleaseAction::Nothing,
        }
    }

    /// Tag after the engine took over the object passed as argument.
    ///
    /// Only `Owned` changes: Rust keeps a non-owning handle. Ref-counted objects keep their reference, the engine takes its own.
    pub(crate) fn after_transfer_to_engine(self) -> Self {
        match self {
            Self::Owned => Self::MustAssertInstanceId,
            other => other,
        }
    }

    /// Tag of a copy of a handle.
    ///
    /// Ref-counted copies take their own reference (done by the caller). Copies never own a manually managed object.
    pub(crate) fn for_clone(self) -> Self {
        match self {
            Self::RefCounted => Self::RefCounted,
            Self::LifetimeBound { owner } => Self::LifetimeBound { owner },
            Self::Released => Self::Released,
            Self::Borrowed | Self::Owned | Self::MustAssertInstanceId => Self::MustAssertInstanceId,
        }
    }
}

/// Records that a Rust handle now owns the object `id`.
pub(crate) fn register_owned(id: Option<InstanceId>) {
    if let Some(id) = id {
        OWNED_OBJECTS.lock().insert(id);
    }
}

/// Ends Rust ownership of `id`, e.g. because the engine took it over or the object was freed.
pub(crate) fn end_ownership(id: Option<InstanceId>) {
    if let Some(id) = id {
        OWNED_OBJECTS.lock().remove(&id);
    }
}

/// Whether an `Owned` handle of `id` still owns the object. Handles without instance ID rely on their tag alone.
pub(crate) fn is_still_owned(id: Option<InstanceId>) -> bool {
    match id {
        Some(id) => OWNED_OBJECTS.lock().contains(&id),
        None => true,
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> InstanceId {
        InstanceId::from_nonzero(7)
    }

    #[test]
    fn only_owning_tags_release() {
        assert_eq!(Ownership::Owned.release_action(), ReleaseAction::Destroy);
        assert_eq!(Ownership::RefCounted.release_action(), ReleaseAction::Unreference);

        for tag in [
            Ownership::Borrowed,
            Ownership::LifetimeBound { owner: owner() },
            Ownership::MustAssertInstanceId,
            Ownership::Released,
        ] {
            assert_eq!(tag.release_action(), ReleaseAction::Nothing, "{tag:?}");
            assert!(!tag.is_owning());
        }
    }

    #[test]
    fn transfer_to_engine_drops_manual_ownership() {
        assert_eq!(
            Ownership::Owned.after_transfer_to_engine(),
            Ownership::MustAssertInstanceId
        );
        assert_eq!(
            Ownership::RefCounted.after_transfer_to_engine(),
            Ownership::RefCounted
        );
        assert_eq!(
            Ownership::Borrowed.after_transfer_to_engine(),
            Ownership::Borrowed
        );
    }

    #[test]
    fn clones_never_own_manual_objects() {
        assert_eq!(Ownership::Owned.for_clone(), Ownership::MustAssertInstanceId);
        assert_eq!(Ownership::Borrowed.for_clone(), Ownership::MustAssertInstanceId);
        assert_eq!(Ownership::RefCounted.for_clone(), Ownership::RefCounted);
        assert_eq!(
            Ownership::LifetimeBound { owner: owner() }.for_clone(),
            Ownership::LifetimeBound { owner: owner() }
        );
    }

    #[test]
    fn ownership_registry_is_per_object() {
        let id = Some(InstanceId::from_nonzero(0x1234_5678));
        let other = Some(InstanceId::from_nonzero(0x1234_5679));

        register_owned(id);
        register_owned(other);
        assert!(is_still_owned(id));

        end_ownership(id);
        assert!(!is_still_owned(id));
        assert!(is_still_owned(other));

        end_ownership(other);
        assert!(is_still_owned(None));
    }

    #[test]
    fn ref_counted_handles_skip_liveness_checks() {
        assert!(!Ownership::RefCounted.requires_liveness_check());
        assert!(Ownership::Owned.requires_liveness_check());
        assert!(Ownership::MustAssertInstanceId.requires_liveness_check());
    }
}

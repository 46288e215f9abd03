/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::init::InitLevel;
use crate::meta::ClassName;
use crate::obj::{bounds, Bounds, ObjectHandle};
use crate::sys;

/// Makes `T` eligible to be managed by the engine and stored in [`Gd<T>`][crate::obj::Gd] pointers.
///
/// Normally, you don't need to implement this trait yourself; use [`#[derive(GodotClass)]`](../../gdlink_macros/derive.GodotClass.html)
/// instead.
#[diagnostic::on_unimplemented(
    message = "only classes registered with the engine are allowed in this context",
    note = "you can use `#[derive(GodotClass)]` to register your own structs"
)]
pub trait GodotClass: Bounds + 'static
where
    Self: Sized,
{
    /// The immediate superclass of `T`. This is always an engine class.
    type Base: GodotClass; // not EngineClass because it can be NoBase

    /// Initialization level, during which this class is registered with the engine.
    ///
    /// It must not be less than `Base::INIT_LEVEL`.
    const INIT_LEVEL: InitLevel;

    /// The name of the class, under which it is registered in the engine.
    fn class_name() -> ClassName;

    /// Returns whether `Self` inherits from `U`.
    ///
    /// This is reflexive, i.e `Self` inherits from itself. See also [`Inherits`] for a trait bound.
    fn inherits<U: GodotClass>() -> bool {
        if Self::class_name() == U::class_name() {
            true
        } else {
            Self::Base::inherits::<U>()
        }
    }
}

/// Type representing the absence of a base class, at the root of the hierarchy.
///
/// `NoBase` is used as the base class for exactly one class: [`Object`][crate::classes::Object].
///
/// This is an enum without any variants, as we should never construct an instance of this class.
pub enum NoBase {}

impl GodotClass for NoBase {
    type Base = NoBase;

    const INIT_LEVEL: InitLevel = InitLevel::Core; // arbitrary; never read.

    fn class_name() -> ClassName {
        ClassName::none()
    }

    fn inherits<U: GodotClass>() -> bool {
        false
    }
}

unsafe impl Bounds for NoBase {
    type Memory = bounds::MemManual;
    type DynMemory = bounds::MemManual;
    type Declarer = bounds::DeclEngine;
}

/// Non-strict inheritance relationship in the engine class hierarchy.
///
/// `Derived: Inherits<Base>` means that either `Derived` is a subclass of `Base`, or the class `Base` itself (hence "non-strict").
///
/// This trait is implemented for all engine classes and user-defined classes that derive [`GodotClass`]. Inheritance is
/// transitive across indirect base classes: `TabContainer` implements `Inherits<Container>`, `Inherits<Control>`, ...,
/// `Inherits<Object>`.
///
/// ```no_run
/// # use gdlink::prelude::*;
/// fn count_children<T>(node: &Gd<T>) -> i32
/// where
///     T: Inherits<Node>,
/// {
///     node.upcast_ref::<Node>().get_child_count(false)
/// }
/// ```
///
/// # Safety
///
/// This trait must only be implemented for subclasses of `Base`.
///
/// Importantly, this means it is always safe to upcast a value of type `Gd<Self>` to `Gd<Base>`.
pub unsafe trait Inherits<Base: GodotClass>: GodotClass {}

// SAFETY: every class inherits itself.
unsafe impl<T: GodotClass> Inherits<T> for T {}

/// Implemented for all classes provided by the engine, and not for user-declared ones.
///
/// # Safety
/// The type must be `#[repr(transparent)]` over [`ObjectHandle`], so that handles can be reinterpreted as any engine class
/// in the inheritance chain.
pub unsafe trait EngineClass: GodotClass {
    #[doc(hidden)]
    fn __handle(&self) -> &ObjectHandle;

    #[doc(hidden)]
    fn __from_handle(handle: ObjectHandle) -> Self;

    /// Raw object pointer.
    fn object_ptr(&self) -> sys::GDExtensionObjectPtr {
        self.__handle().ptr()
    }
}

/// Auto-implemented for all engine-provided enums.
///
/// Enums are newtypes around their ordinal, so values unknown to this version of the bindings (e.g. a newer engine's error
/// codes) pass through unchanged.
pub trait EngineEnum: Copy {
    /// Returns the enumerator for `ord`, or `None` if no constant has this ordinal.
    fn try_from_ord(ord: i32) -> Option<Self>;

    /// Ordinal value of the enumerator, as specified in the engine. This is not necessarily unique.
    fn ord(self) -> i32;

    #[track_caller]
    fn from_ord(ord: i32) -> Self {
        match Self::try_from_ord(ord) {
            Some(value) => value,
            None => panic!("ordinal {ord} does not map to any enumerator"),
        }
    }

    /// The name of the first enumerator with this ordinal, or the empty string for unknown values.
    fn as_str(&self) -> &'static str;
}

/// Auto-implemented for all engine-provided bitfields.
pub trait EngineBitfield: Copy {
    fn try_from_ord(ord: u64) -> Option<Self>;

    /// Ordinal value of the bit flag, as specified in the engine.
    fn ord(self) -> u64;

    #[track_caller]
    fn from_ord(ord: u64) -> Self {
        match Self::try_from_ord(ord) {
            Some(value) => value,
            None => panic!("ordinal {ord} does not map to any valid bit flag"),
        }
    }

    fn is_set(self, flag: Self) -> bool {
        self.ord() & flag.ord() != 0
    }
}

/// Trait implemented for all user-defined classes, normally through `#[derive(GodotClass)]`.
pub trait UserClass: Bounds<Declarer = bounds::DeclUser> + GodotClass {
    /// Whether the class runs its virtual methods inside the editor.
    #[doc(hidden)]
    const __IS_TOOL: bool = false;
}

/// Extension trait for all reference-counted classes.
pub trait NewGd: GodotClass {
    /// Return a new, ref-counted `Gd` containing a default-constructed instance.
    ///
    /// `MyClass::new_gd()` is equivalent to `Gd::<MyClass>::default()`.
    ///
    /// # Panics
    /// If `Self` is user-defined and its default constructor `init()` panics, that panic is propagated.
    fn new_gd() -> crate::obj::Gd<Self>;
}

impl<T> NewGd for T
where
    T: cap::GodotDefault + Bounds<Memory = bounds::MemRefCounted>,
{
    fn new_gd() -> crate::obj::Gd<Self> {
        crate::obj::Gd::new_gd()
    }
}

/// Extension trait for all manually managed classes.
pub trait NewAlloc: GodotClass {
    /// Return a new, manually-managed `Gd` containing a default-constructed instance.
    ///
    /// The result must be manually managed, e.g. by attaching it to the scene tree or calling `free()` after usage.
    #[must_use]
    fn new_alloc() -> crate::obj::Gd<Self>;
}

impl<T> NewAlloc for T
where
    T: cap::GodotDefault + Bounds<Memory = bounds::MemManual>,
{
    fn new_alloc() -> crate::obj::Gd<Self> {
        crate::obj::Gd::new_alloc()
    }
}

/// Capability traits, providing dedicated functionalities for classes.
///
/// These traits are implemented by the derive macro and `#[godot_api]`; you normally only name them in bounds.
pub mod cap {
    use super::*;
    use crate::builtin::GString;
    use crate::obj::{Base, Gd};

    /// Trait for all classes that are default-constructible from the engine.
    ///
    /// This trait is automatically implemented for the following classes:
    /// - User defined classes if either:
    ///   - they override an `init()` method
    ///   - they have `#[class(init)]` attribute
    /// - Engine classes if they are instantiable.
    #[diagnostic::on_unimplemented(
        message = "Class `{Self}` requires either an `init` constructor, or `#[class(init)]`",
        label = "needs `init`"
    )]
    pub trait GodotDefault: GodotClass {
        /// Provides a default smart pointer instance.
        ///
        /// Semantics:
        /// - For user-defined classes, this creates the base object and calls `T::init()` or the generated init-constructor.
        /// - For engine classes, this constructs the object by class name.
        #[doc(hidden)]
        fn __godot_default() -> Gd<Self> {
            <Self::Declarer as bounds::Declarer>::create_gd::<Self>()
        }

        /// Only provided for user classes.
        #[doc(hidden)]
        fn __godot_user_init(_base: Base<Self::Base>) -> Self {
            unreachable!(
                "__godot_user_init() called on engine class; must be overridden for user classes"
            )
        }
    }

    /// Implemented by `#[godot_api]` for user classes, reporting which engine virtuals are overridden.
    pub trait ImplementsVirtuals: UserClass {
        /// Trampoline for the engine virtual `name` (with leading underscore), or `None` if not overridden.
        #[doc(hidden)]
        fn __virtual_call(name: &str) -> sys::GDExtensionClassCallVirtual;
    }

    /// Implemented by `#[godot_api]` if the user overrides `to_string()`.
    pub trait GodotToString: GodotClass {
        #[doc(hidden)]
        fn __godot_to_string(&self) -> GString;
    }

    /// Implemented by `#[godot_api]` if the user overrides `on_notification()`.
    pub trait GodotNotification: GodotClass {
        #[doc(hidden)]
        fn __godot_notification(&mut self, what: i32);
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_base_inherits_nothing() {
        assert!(!NoBase::inherits::<NoBase>());
        assert_eq!(NoBase::class_name().as_str(), "");
    }
}

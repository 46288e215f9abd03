/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate as sys;

/// Step in the engine's initialization process.
///
/// Levels are loaded like a stack: `Core`, `Servers`, `Scene`, then `Editor` (editor only). Deinitialization runs in reverse.
/// Each engine class is available from one level on; extension classes are registered at the level of their base class.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum InitLevel {
    /// Builtin types are available, classes are not.
    Core,

    /// Server classes and builtins are available.
    Servers,

    /// Most classes are available, including the scene tree.
    Scene,

    /// Editor classes are available; only loaded in the editor.
    Editor,
}

impl InitLevel {
    /// All levels in initialization order.
    pub const ALL: [InitLevel; 4] = [Self::Core, Self::Servers, Self::Scene, Self::Editor];

    #[doc(hidden)]
    pub fn from_sys(level: sys::GDExtensionInitializationLevel) -> Self {
        match level {
            sys::GDEXTENSION_INITIALIZATION_CORE => Self::Core,
            sys::GDEXTENSION_INITIALIZATION_SERVERS => Self::Servers,
            sys::GDEXTENSION_INITIALIZATION_SCENE => Self::Scene,
            sys::GDEXTENSION_INITIALIZATION_EDITOR => Self::Editor,
            _ => {
                eprintln!("WARNING: unknown initialization level {level}");
                Self::Scene
            }
        }
    }

    #[doc(hidden)]
    pub fn to_sys(self) -> sys::GDExtensionInitializationLevel {
        match self {
            Self::Core => sys::GDEXTENSION_INITIALIZATION_CORE,
            Self::Servers => sys::GDEXTENSION_INITIALIZATION_SERVERS,
            Self::Scene => sys::GDEXTENSION_INITIALIZATION_SCENE,
            Self::Editor => sys::GDEXTENSION_INITIALIZATION_EDITOR,
        }
    }

    /// Parses the `api_type` of a class in `extension_api.json` ("core", "editor", ...).
    pub fn from_api_type(api_type: &str) -> Option<Self> {
        match api_type {
            "core" => Some(Self::Scene),
            "servers" => Some(Self::Servers),
            "editor" => Some(Self::Editor),
            _ => None,
        }
    }

    pub fn to_stage(self) -> InitStage {
        match self {
            Self::Core => InitStage::Core,
            Self::Servers => InitStage::Servers,
            Self::Scene => InitStage::Scene,
            Self::Editor => InitStage::Editor,
        }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

/// Initialization level, or the main loop running after all levels are loaded.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[non_exhaustive]
pub enum InitStage {
    Core,
    Servers,
    Scene,
    Editor,

    /// Fully initialized engine, before deinitialization begins.
    MainLoop,
}

impl InitStage {
    /// Returns `None` for [`InitStage::MainLoop`], which is not an engine level.
    pub fn try_to_level(self) -> Option<InitLevel> {
        match self {
            Self::Core => Some(InitLevel::Core),
            Self::Servers => Some(InitLevel::Servers),
            Self::Scene => Some(InitLevel::Scene),
            Self::Editor => Some(InitLevel::Editor),
            Self::MainLoop => None,
        }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_round_trip_through_sys() {
        for level in InitLevel::ALL {
            assert_eq!(InitLevel::from_sys(level.to_sys()), level);
            assert_eq!(level.to_stage().try_to_level(), Some(level));
        }
    }

    #[test]
    fn levels_are_ordered_like_engine_stack() {
        assert!(InitLevel::Core < InitLevel::Servers);
        assert!(InitLevel::Scene < InitLevel::Editor);
        assert!(InitStage::Editor < InitStage::MainLoop);
        assert_eq!(InitStage::MainLoop.try_to_level(), None);
    }

    #[test]
    fn api_type_maps_to_level() {
        assert_eq!(InitLevel::from_api_type("core"), Some(InitLevel::Scene));
        assert_eq!(InitLevel::from_api_type("editor"), Some(InitLevel::Editor));
        assert_eq!(InitLevel::from_api_type("gdscript"), None);
    }
}

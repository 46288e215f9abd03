/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::init::InitLevel;
use crate::meta::ClassName;

/// Static information about one engine class, as generated from the engine API.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct EngineClassInfo {
    pub name: ClassName,

    /// Direct base class; `None` for `Object`.
    pub parent: Option<ClassName>,
    pub is_refcounted: bool,
    pub is_instantiable: bool,
    pub is_singleton: bool,
    pub init_level: InitLevel,
}

/// All engine classes known to this version of the bindings.
pub fn all_engine_classes() -> &'static [EngineClassInfo] {
    super::generated::ENGINE_CLASSES
}

/// Looks up an engine class by name.
pub fn lookup(class_name: &str) -> Option<&'static EngineClassInfo> {
    all_engine_classes()
        .iter()
        .find(|info| info.name.as_str() == class_name)
}

/// Base classes of `class_name`, from the direct parent up to `Object`. Empty for unknown classes.
pub fn ancestors(class_name: &str) -> Vec<ClassName> {
    let mut result = Vec::new();
    let mut current = lookup(class_name).and_then(|info| info.parent);

    while let Some(parent) = current {
        // The generated table is acyclic; the bound only protects against a corrupt API file.
        if result.len() > all_engine_classes().len() {
            break;
        }

        result.push(parent);
        current = lookup(parent.as_str()).and_then(|info| info.parent);
    }

    result
}

/// Whether `derived` is `base` or one of its subclasses. Unknown classes are not subclasses of anything.
pub fn is_subclass_of(derived: &str, base: &str) -> bool {
    if lookup(derived).is_none() {
        return false;
    }

    derived == base || ancestors(derived).iter().any(|c| c.as_str() == base)
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ancestors_walk_up_to_object() {
        let chain: Vec<&str> = ancestors("TabContainer").iter().map(|c| c.as_str()).collect();

        assert_eq!(chain, ["Container", "Control", "CanvasItem", "Node", "Object"]);
        assert!(ancestors("Object").is_empty());
        assert!(ancestors("NoSuchClass").is_empty());
    }

    #[test]
    fn subclass_relation() {
        assert!(is_subclass_of("TabContainer", "Control"));
        assert!(is_subclass_of("Resource", "RefCounted"));
        assert!(is_subclass_of("Node", "Node"));
        assert!(!is_subclass_of("Node", "RefCounted"));
        assert!(!is_subclass_of("Control", "TabContainer"));
        assert!(!is_subclass_of("Unknown", "Unknown"));
    }

    #[test]
    fn class_flags() {
        let ref_counted = lookup("RefCounted").expect("RefCounted in table");
        assert!(ref_counted.is_refcounted);
        assert_eq!(ref_counted.parent.map(|c| c.as_str()), Some("Object"));

        let canvas_item = lookup("CanvasItem").expect("CanvasItem in table");
        assert!(!canvas_item.is_instantiable);
        assert!(!canvas_item.is_refcounted);

        let engine = lookup("Engine").expect("Engine in table");
        assert!(engine.is_singleton);
    }
}

/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::collections::{HashMap, HashSet};

use crate::models::json::{JsonClass, JsonEnum, JsonExtensionApi};

/// Lookup tables over the parsed API, shared by all generators.
pub struct Context<'a> {
    classes: HashMap<&'a str, &'a JsonClass>,
    singletons: HashSet<&'a str>,

    /// Keys are `Class.Enum` for class enums and `Enum` for global enums.
    enums: HashMap<String, &'a JsonEnum>,
}

impl<'a> Context<'a> {
    pub fn build_from_api(api: &'a JsonExtensionApi) -> Self {
        let mut ctx = Self {
            classes: HashMap::new(),
            singletons: api.singletons.iter().map(|s| s.name.as_str()).collect(),
            enums: HashMap::new(),
        };

        for enum_ in &api.global_enums {
            ctx.enums.insert(enum_.name.clone(), enum_);
        }

        for class in &api.classes {
            ctx.classes.insert(class.name.as_str(), class);

            for enum_ in class.enums.iter().flatten() {
                ctx.enums.insert(format!("{}.{}", class.name, enum_.name), enum_);
            }
        }

        ctx
    }

    pub fn get_class(&self, class_name: &str) -> Option<&'a JsonClass> {
        self.classes.get(class_name).copied()
    }

    pub fn is_engine_class(&self, class_name: &str) -> bool {
        self.classes.contains_key(class_name)
    }

    pub fn is_singleton(&self, class_name: &str) -> bool {
        self.singletons.contains(class_name)
    }

    pub fn is_refcounted(&self, class_name: &str) -> bool {
        self.get_class(class_name).is_some_and(|c| c.is_refcounted)
    }

    /// Qualified enum name as found in type strings: `Node.ProcessMode` or `Error`.
    pub fn find_enum(&self, qualified_name: &str) -> Option<&'a JsonEnum> {
        self.enums.get(qualified_name).copied()
    }

    /// Base classes of `class_name`, from the direct parent up to `Object`.
    pub fn ancestors(&self, class_name: &str) -> Vec<&'a str> {
        let mut result = Vec::new();
        let mut current = self.get_class(class_name).and_then(|c| c.inherits.as_deref());

        while let Some(base) = current {
            if result.contains(&base) {
                break; // cycle in a corrupt API file
            }

            result.push(base);
            current = self.get_class(base).and_then(|c| c.inherits.as_deref());
        }

        result
    }
}

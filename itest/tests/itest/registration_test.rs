/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use gdlink::prelude::*;
use gdlink::register::loaded_classes;
use itest::framework::expect_engine_error;
use itest::mock::{self, RegisteredConstant};
use itest::itest;

#[derive(GodotClass)]
#[class(no_init, base = Node)]
struct AbstractNode {
    base: Base<Node>,
}

#[derive(GodotClass)]
#[class(init, rename = GameRules, constants(MAX_PLAYERS = 4, START_LIVES = 3))]
struct Rules;

#[derive(GodotClass)]
#[class(init, editor_plugin, base = Node)]
struct LevelEditorPlugin {
    base: Base<Node>,
}

#[derive(GodotClass)]
#[class(init, base = Node)]
struct Spawnable {
    #[init(val = 7)]
    level: i64,

    #[base]
    base: Base<Node>,
}

itest! {
    fn registered_classes_and_parents() {
        let classes = mock::registered_classes();

        for class in ["AbstractNode", "GameRules", "LevelEditorPlugin", "Spawnable"] {
            assert!(classes.iter().any(|c| c == class), "{class} not registered: {classes:?}");
        }

        assert_eq!(mock::registered_parent("AbstractNode").as_deref(), Some("Node"));
        assert_eq!(mock::registered_parent("GameRules").as_deref(), Some("RefCounted"));
        assert_eq!(mock::registered_parent("Spawnable").as_deref(), Some("Node"));
    }
}

itest! {
    fn registration_uses_renamed_class() {
        assert!(!mock::registered_classes().iter().any(|c| c == "Rules"));

        let rules = Rules::new_gd();
        assert_eq!(rules.get_class(), "GameRules");
        assert_eq!(Rules::class_name().as_str(), "GameRules");
    }
}

itest! {
    fn registration_no_init_is_abstract() {
        assert_eq!(mock::is_class_abstract("AbstractNode"), Some(true));
        assert_eq!(mock::is_class_abstract("Spawnable"), Some(false));

        let before = mock::object_count();
        let ptr = mock::instantiate("AbstractNode");

        assert!(ptr.is_null());
        assert_eq!(mock::object_count(), before);
        expect_engine_error("is abstract");
    }
}

itest! {
    fn registration_constants() {
        let mut constants = mock::constants_of("GameRules");
        constants.sort_by(|a, b| a.name.cmp(&b.name));

        let expected = [("MAX_PLAYERS", 4), ("START_LIVES", 3)].map(|(name, value)| RegisteredConstant {
            class_name: "GameRules".to_string(),
            name: name.to_string(),
            value,
        });
        assert_eq!(constants, expected);
    }
}

itest! {
    fn registration_editor_plugin_at_editor_level() {
        assert_eq!(mock::editor_plugins(), ["LevelEditorPlugin"]);

        let editor_classes = loaded_classes(InitLevel::Editor);
        assert_eq!(editor_classes.len(), 1);
        assert_eq!(editor_classes[0].as_str(), "LevelEditorPlugin");

        let scene_classes = loaded_classes(InitLevel::Scene);
        assert!(scene_classes.iter().any(|c| c.as_str() == "Spawnable"));
        assert!(!scene_classes.iter().any(|c| c.as_str() == "LevelEditorPlugin"));

        assert!(loaded_classes(InitLevel::Core).is_empty());
    }
}

itest! {
    fn registration_engine_instantiates_user_class() {
        let before = mock::object_count();

        let ptr = mock::instantiate("Spawnable");
        assert!(!ptr.is_null());
        assert_eq!(mock::object_count(), before + 1);
        assert!(mock::object_to_string(ptr).starts_with("<Spawnable#"));

        mock::destroy(ptr);
        assert_eq!(mock::object_count(), before);
    }
}

itest! {
    fn registration_generated_init_uses_defaults() {
        let spawnable = Spawnable::new_alloc();

        assert_eq!(spawnable.bind().level, 7);
        assert_eq!(spawnable.bind().base.to_gd().instance_id(), spawnable.instance_id());

        spawnable.free();
    }
}

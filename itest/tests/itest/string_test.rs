/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use gdlink::prelude::*;
use itest::{itest, mock};
use proptest::prelude::{any, prop_assert_eq, ProptestConfig};
use proptest::test_runner::TestRunner;

itest! {
    fn string_conversions() {
        let from_str = GString::from("Hello, engine");
        let from_string = GString::from(String::from("Hello, engine"));

        assert_eq!(from_str, from_string);
        assert_eq!(from_str, "Hello, engine");
        assert_eq!(String::from(&from_str), "Hello, engine");
        assert_ne!(from_str, GString::from("hello, engine"));
    }
}

itest! {
    fn string_unicode() {
        let text = "Grüße, 世界 🦀";
        let string = GString::from(text);

        assert_eq!(string.to_string(), text);
        assert_eq!(string.clone(), string);
    }
}

itest! {
    fn string_round_trip_arbitrary_text() {
        let mut runner = TestRunner::new(ProptestConfig {
            cases: 64,
            ..ProptestConfig::default()
        });

        let result = runner.run(&any::<String>(), |text| {
            let string = GString::from(text.as_str());
            let name = StringName::from(&string);

            prop_assert_eq!(string.to_string(), text.clone());
            prop_assert_eq!(name.to_string(), text);
            Ok(())
        });

        if let Err(err) = result {
            panic!("{err}");
        }
    }
}

itest! {
    fn string_display_and_debug() {
        let string = GString::from("text");
        let name = StringName::from("node_name");

        assert_eq!(format!("{string}"), "text");
        assert_eq!(format!("{string:?}"), "\"text\"");
        assert_eq!(format!("{name}"), "node_name");
        assert_eq!(format!("{name:?}"), "&\"node_name\"");
    }
}

itest! {
    fn string_name_conversions() {
        let name = StringName::from("Player");
        let string = GString::from(&name);
        let back = StringName::from(&string);

        assert_eq!(string, "Player");
        assert_eq!(back, name);
        assert_eq!(back, "Player");
        assert!(!name.is_empty());
        assert!(StringName::from("").is_empty());
    }
}

itest! {
    fn string_empty_needs_no_engine_memory() {
        let before = mock::live_string_count();

        let empty = GString::new();
        let also_empty = GString::from("");
        assert_eq!(empty, also_empty);
        assert_eq!(empty.to_string(), "");

        assert_eq!(mock::live_string_count(), before);
    }
}

itest! {
    fn string_drop_releases_engine_memory() {
        let before = mock::live_string_count();

        let string = GString::from("temporary");
        let copy = string.clone();
        let name = StringName::from(&copy);
        assert!(mock::live_string_count() > before);

        drop(string);
        drop(copy);
        drop(name);
        assert_eq!(mock::live_string_count(), before);
    }
}

itest! {
    fn string_round_trip_through_engine() {
        let mut node = Node::new_alloc();

        node.set_name("Räuber");
        let name: StringName = node.get_name();
        assert_eq!(name, "Räuber");

        let mut resource = Resource::new_gd();
        resource.set_name(GString::from(&name));
        assert_eq!(resource.get_name().to_string(), "Räuber");

        node.free();
    }
}

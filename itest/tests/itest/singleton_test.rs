/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use gdlink::classes::all_engine_classes;
use gdlink::global::Error;
use gdlink::obj::Ownership;
use gdlink::prelude::*;
use itest::{itest, mock};

itest! {
    fn singleton_is_shared() {
        let first = Engine::singleton();
        let second = Engine::singleton();

        assert_eq!(first, second);
        assert_eq!(first.ownership(), Ownership::MustAssertInstanceId);
        assert_eq!(first.get_class(), "Engine");
    }
}

itest! {
    fn engine_frames_and_time_scale() {
        let mut engine = Engine::singleton();
        assert!(!engine.is_editor_hint());

        let frames = engine.get_frames_drawn();
        mock::process_frame(0.0);
        assert_eq!(engine.get_frames_drawn(), frames + 1);

        assert_eq!(engine.get_time_scale(), 1.0);
        engine.set_time_scale(0.5);
        assert_eq!(engine.get_time_scale(), 0.5);
        engine.set_time_scale(1.0);
    }
}

itest! {
    fn os_queries() {
        let os = OS::singleton();

        assert_eq!(os.get_name(), "Mock");
        assert!(os.get_processor_count() > 0);
    }
}

itest! {
    fn os_calls_return_error_enum() {
        let mut os = OS::singleton();

        assert_eq!(os.kill(0), Error::ERR_INVALID_PARAMETER);
        assert_eq!(os.kill(4242), Error::FAILED);

        assert_eq!(os.shell_open("https://godot-rust.github.io"), Error::OK);

        let err = os.shell_open("not a uri");
        assert_eq!(err.ord(), 31);
        assert_eq!(err.as_str(), "ERR_INVALID_PARAMETER");
    }
}

itest! {
    fn os_unknown_error_ordinal_passes_through() {
        let mut os = OS::singleton();

        let err = os.kill(4711);
        assert_eq!(err.ord(), 4711);
        assert_eq!(err.as_str(), "");
        assert_eq!(Error::try_from_ord(4711), None);
        assert_eq!(format!("{err:?}"), "Error(4711)");
    }
}

itest! {
    fn singleton_class_info() {
        let info = Engine::CLASS_INFO;

        assert_eq!(info.name.as_str(), "Engine");
        assert!(info.is_singleton);
        assert!(!info.is_instantiable);
        assert!(!info.is_refcounted);
        assert_eq!(info.parent.map(|p| p.as_str()), Some("Object"));

        let listed = all_engine_classes()
            .iter()
            .filter(|class| class.is_singleton)
            .map(|class| class.name.as_str())
            .collect::<Vec<_>>();
        assert!(listed.contains(&"Engine"));
        assert!(listed.contains(&"OS"));
    }
}

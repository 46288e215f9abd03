/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use gdlink::obj::Ownership;
use gdlink::prelude::*;
use itest::{itest, mock};

#[derive(GodotClass)]
#[class(init)]
struct Counter {
    #[init(val = 10)]
    value: i64,
}

fn engine_refcount<T: GodotClass>(obj: &Gd<T>) -> Option<u32> {
    mock::reference_count(obj.instance_id().to_u64())
}

itest! {
    fn refcounted_new_has_one_reference() {
        let obj = RefCounted::new_gd();

        assert_eq!(obj.ownership(), Ownership::RefCounted);
        assert!(obj.instance_id().is_ref_counted());
        assert_eq!(engine_refcount(&obj), Some(1));
        assert_eq!(obj.get_reference_count(), 1);
    }
}

itest! {
    fn refcounted_clone_and_drop() {
        let obj = RefCounted::new_gd();
        let id = obj.instance_id();

        let copy = obj.clone();
        assert_eq!(copy.ownership(), Ownership::RefCounted);
        assert_eq!(engine_refcount(&obj), Some(2));

        drop(obj);
        assert_eq!(mock::reference_count(id.to_u64()), Some(1));

        // Last reference destroys the object.
        drop(copy);
        assert!(!mock::is_alive(id.to_u64()));
    }
}

itest! {
    fn refcounted_lookup_takes_reference() {
        let obj = RefCounted::new_gd();
        let id = obj.instance_id();

        let found = Gd::<RefCounted>::from_instance_id(id);
        assert_eq!(found.ownership(), Ownership::RefCounted);
        assert_eq!(engine_refcount(&obj), Some(2));

        drop(obj);
        assert!(found.is_instance_valid());
        assert_eq!(found.get_reference_count(), 1);
    }
}

itest! {
    fn refcounted_upcast_keeps_reference() {
        let resource = Resource::new_gd();
        let id = resource.instance_id();

        let base: Gd<RefCounted> = resource.upcast();
        assert_eq!(mock::reference_count(id.to_u64()), Some(1));
        assert_eq!(base.ownership(), Ownership::RefCounted);

        drop(base);
        assert!(!mock::is_alive(id.to_u64()));
    }
}

itest! {
    fn resource_name_and_duplicate() {
        let mut resource = Resource::new_gd();
        resource.set_name("icon");
        resource.set_local_to_scene(true);

        assert_eq!(resource.get_name(), "icon");
        assert!(resource.is_local_to_scene());

        let copy = resource.duplicate(false).expect("duplicate() returns a new resource");
        assert_ne!(copy, resource);
        assert_eq!(copy.ownership(), Ownership::RefCounted);
        assert_eq!(engine_refcount(&copy), Some(1));
        assert_eq!(copy.get_name(), "icon");
        assert!(copy.is_local_to_scene());

        let copy_id = copy.instance_id();
        drop(copy);
        assert!(!mock::is_alive(copy_id.to_u64()));
    }
}

itest! {
    fn refcounted_user_class() {
        let mut counter = Counter::new_gd();
        let id = counter.instance_id();

        assert_eq!(mock::class_of(id.to_u64()).as_deref(), Some("Counter"));
        assert_eq!(counter.bind().value, 10);

        counter.bind_mut().value += 5;

        let copy = counter.clone();
        assert_eq!(copy.bind().value, 15);
        assert_eq!(counter.get_reference_count(), 2);

        drop(counter);
        drop(copy);
        assert!(!mock::is_alive(id.to_u64()));
    }
}

itest! {
    fn refcounted_user_class_default() {
        let counter: Gd<Counter> = Gd::default();
        assert_eq!(counter.bind().value, 10);
        assert_eq!(counter.get_class(), "Counter");
    }
}

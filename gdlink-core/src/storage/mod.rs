/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

mod instance_storage;

pub use instance_storage::InstanceStorage;
pub(crate) use instance_storage::{
    as_storage, destroy_storage, instance_storage_of, BINDING_CALLBACKS,
};

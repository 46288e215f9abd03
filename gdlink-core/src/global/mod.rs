/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Engine global enums and logging macros.
//!
//! Enums are generated from `extension_api.json` as newtypes over their ordinal: values returned by the engine pass through
//! unchanged, even if this version of the bindings does not know them.
//!
//! ```no_run
//! # use gdlink::prelude::*;
//! # use gdlink::global::Error;
//! fn report(err: Error) {
//!     match err {
//!         Error::OK => {}
//!         Error::ERR_FILE_NOT_FOUND => godot_warn!("missing file"),
//!         other => godot_error!("engine error {other:?} (ordinal {})", other.ord()),
//!     }
//! }
//! ```

mod print;

pub use crate::{godot_error, godot_print, godot_script_error, godot_warn};

include!(concat!(env!("OUT_DIR"), "/global_enums.rs"));

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obj::EngineEnum;

    #[test]
    fn error_keeps_unknown_ordinals() {
        let unknown = Error::from_ord_unchecked(4711);

        assert_eq!(unknown.ord(), 4711);
        assert_eq!(unknown.as_str(), "");
        assert_eq!(Error::try_from_ord(4711), None);
        assert_eq!(format!("{unknown:?}"), "Error(4711)");
    }

    #[test]
    fn error_known_ordinals() {
        assert_eq!(Error::OK.ord(), 0);
        assert_eq!(Error::FAILED.ord(), 1);
        assert_eq!(Error::try_from_ord(7), Some(Error::ERR_FILE_NOT_FOUND));
        assert_eq!(Error::ERR_FILE_NOT_FOUND.as_str(), "ERR_FILE_NOT_FOUND");
        assert_eq!(format!("{:?}", Error::FAILED), "FAILED");
    }
}

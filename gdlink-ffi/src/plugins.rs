/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Distributed self-registration of "plugins" without central list.
//!
//! Generated engine classes and `#[derive(GodotClass)]` expansions each add an item to a registry from a static
//! initializer placed in the platform's init section; the registry is read later, during extension initialization.

// Note: code in this file is safe, however link-section annotations fall into the "unsafe" category for lints such as
// #![forbid(unsafe_code)].

/// Declare a global registry for plugins.
#[doc(hidden)]
#[macro_export]
macro_rules! plugin_registry {
    ($vis:vis $registry:ident: $Type:ty) => {
        #[used]
        #[allow(non_upper_case_globals)]
        #[doc(hidden)]
        $vis static $registry: std::sync::Mutex<Vec<$Type>> = std::sync::Mutex::new(Vec::new());
    };
}

/// Register a plugin to a registry declared with [`plugin_registry!`]. The registry is named by path.
#[doc(hidden)]
#[macro_export]
#[allow(clippy::deprecated_cfg_attr)]
#[cfg_attr(rustfmt, rustfmt::skip)]
macro_rules! plugin_add {
    ($registry:path; $plugin:expr) => {
        const _: () = {
            #[allow(non_upper_case_globals)]
            #[used]
            // Windows:
            #[cfg_attr(target_os = "windows", link_section = ".CRT$XCU")]
            // MacOS + iOS:
            #[cfg_attr(target_os = "ios", link_section = "__DATA,__mod_init_func")]
            #[cfg_attr(target_os = "macos", link_section = "__DATA,__mod_init_func")]
            // Linux, Android, BSD:
            #[cfg_attr(target_os = "android", link_section = ".init_array")]
            #[cfg_attr(target_os = "dragonfly", link_section = ".init_array")]
            #[cfg_attr(target_os = "freebsd", link_section = ".init_array")]
            #[cfg_attr(target_os = "linux", link_section = ".init_array")]
            #[cfg_attr(target_os = "netbsd", link_section = ".init_array")]
            #[cfg_attr(target_os = "openbsd", link_section = ".init_array")]
            static __init: extern "C" fn() = {
                #[cfg_attr(target_os = "android", link_section = ".text.startup")]
                #[cfg_attr(target_os = "linux", link_section = ".text.startup")]
                extern "C" fn __inner_init() {
                    let mut guard = $registry
                        .lock()
                        .unwrap_or_else(|poisoned| poisoned.into_inner());
                    guard.push($plugin);
                }
                __inner_init
            };
        };
    };
}

/// Visit all plugins of a registry, in unspecified order.
#[doc(hidden)]
#[macro_export]
macro_rules! plugin_foreach {
    ($registry:path; $closure:expr) => {
        let guard = $registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        for e in guard.iter() {
            #[allow(clippy::redundant_closure_call)]
            $closure(e);
        }
    };
}

// ----------------------------------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    plugin_registry!(CLASSES: &'static str);

    plugin_add!(CLASSES; "TabContainer");
    plugin_add!(CLASSES; "Node");
    plugin_add!(self::CLASSES; "Resource");

    #[test]
    fn plugins_are_collected_before_main() {
        let expected = HashSet::from(["Node", "TabContainer", "Resource"]);
        let mut actual = HashSet::new();

        plugin_foreach!(CLASSES; |e: &&'static str| {
            actual.insert(*e);
        });

        assert_eq!(actual, expected);
    }
}

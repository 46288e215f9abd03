/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::collections::HashSet;
use std::panic;

use gdlink::classes::Node;
use gdlink::obj::Gd;
use gdlink::sys;

use crate::mock::{self, MessageKind};

mod runner;

pub use runner::*;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Plugin registration

// Registers all the `itest!` tests.
sys::plugin_registry!(pub __GDLINK_ITEST: RustTestCase);

/// Declares an integration test, registered for [`run_tests()`].
///
/// ```ignore
/// itest! {
///     fn node_starts_without_parent() {
///         let node = Node::new_alloc();
///         assert!(node.get_parent().is_none());
///         node.free();
///     }
/// }
///
/// itest! {
///     #[focus]
///     fn child_of_root(ctx: &TestContext) { /* ... */ }
/// }
/// ```
///
/// `#[skip]` disables a test; `#[focus]` runs only the focused tests.
#[macro_export]
macro_rules! itest {
    ($( #[$attr:ident] )* fn $name:ident() $body:block) => {
        fn $name() $body

        $crate::__itest_register!([$($attr)*] $name, {
            fn __run(_ctx: &$crate::framework::TestContext) {
                $name()
            }
            __run
        });
    };

    ($( #[$attr:ident] )* fn $name:ident($ctx:ident: &TestContext) $body:block) => {
        fn $name($ctx: &$crate::framework::TestContext) $body

        $crate::__itest_register!([$($attr)*] $name, $name);
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __itest_register {
    ([$($attr:ident)*] $name:ident, $function:expr) => {
        ::gdlink::sys::plugin_add!($crate::framework::__GDLINK_ITEST; $crate::framework::RustTestCase {
            name: stringify!($name),
            file: file!(),
            skipped: $crate::__itest_has_attr!(skip; $($attr)*),
            focused: $crate::__itest_has_attr!(focus; $($attr)*),
            line: line!(),
            function: $function,
        });
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __itest_has_attr {
    ($wanted:ident;) => { false };
    (skip; skip $($rest:ident)*) => { true };
    (focus; focus $($rest:ident)*) => { true };
    ($wanted:ident; $other:ident $($rest:ident)*) => { $crate::__itest_has_attr!($wanted; $($rest)*) };
}

/// Finds all `itest!` tests.
fn collect_rust_tests(filters: &[String]) -> (Vec<RustTestCase>, HashSet<&'static str>, bool) {
    let mut all_files = HashSet::new();
    let mut tests: Vec<RustTestCase> = vec![];
    let mut is_focus_run = false;

    sys::plugin_foreach!(__GDLINK_ITEST; |test: &RustTestCase| {
        // First time a focused test is encountered, switch to "focused" mode and throw everything away.
        if !is_focus_run && test.focused {
            tests.clear();
            all_files.clear();
            is_focus_run = true;
        }

        // Only collect tests if normal mode, or focus mode and test is focused.
        if (!is_focus_run || test.focused) && passes_filter(filters, test.name) {
            all_files.insert(test.file);
            tests.push(*test);
        }
    });

    // Registration order depends on the linker; sort for deterministic run order.
    tests.sort_by_key(|test| (test.file, test.line));

    (tests, all_files, is_focus_run)
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Shared types

#[derive(Clone)]
pub struct TestContext {
    /// Root of the mock scene tree. Nodes added below it enter the tree.
    pub root: Gd<Node>,
}

#[derive(Copy, Clone)]
pub struct RustTestCase {
    pub name: &'static str,
    pub file: &'static str,
    pub skipped: bool,
    /// If one or more tests are focused, only they will be executed. Helpful for debugging and working on specific features.
    pub focused: bool,
    pub line: u32,
    pub function: fn(&TestContext),
}

pub fn passes_filter(filters: &[String], test_name: &str) -> bool {
    filters.is_empty() || filters.iter().any(|x| test_name.contains(x))
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Toolbox for tests

/// Swaps panic hooks, to disable printing during expected panics.
pub fn suppress_panic_log<R>(callback: impl FnOnce() -> R) -> R {
    // DISABLE following lines to *temporarily* debug panics.
    let prev_hook = panic::take_hook();
    panic::set_hook(Box::new(
        |_panic_info| { /* suppress panic hook; do nothing */ },
    ));

    let res = callback();

    // DISABLE following line to *temporarily* debug panics.
    panic::set_hook(prev_hook);

    res
}

/// Runs `code` and asserts that it panics. Returns the panic message.
#[track_caller]
pub fn expect_panic(context: &str, code: impl FnOnce()) -> String {
    // Generally, types should be unwind safe, and this helps ergonomics in testing (especially around &mut in expect_panic closures).
    let code = panic::AssertUnwindSafe(code);
    let panic = suppress_panic_log(move || panic::catch_unwind(code));

    match panic {
        Ok(()) => panic!("expected panic, but none occurred: {context}"),
        Err(err) => gdlink::private::extract_panic_message(err),
    }
}

/// Takes the descriptions of all errors the engine printed since the last call.
///
/// Warnings and script errors are dropped.
pub fn take_engine_errors() -> Vec<String> {
    mock::take_messages()
        .into_iter()
        .filter(|message| message.kind == MessageKind::Error)
        .map(|message| message.description)
        .collect()
}

/// Asserts that exactly one engine error was printed since the last check, and that it contains `fragment`.
#[track_caller]
pub fn expect_engine_error(fragment: &str) {
    let errors = take_engine_errors();

    assert_eq!(
        errors.len(),
        1,
        "expected one engine error containing {fragment:?}, got {errors:#?}"
    );
    assert!(
        errors[0].contains(fragment),
        "engine error {:?} does not contain {fragment:?}",
        errors[0]
    );
}

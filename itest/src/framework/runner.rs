/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::io::Write;
use std::time::{Duration, Instant};

use gdlink::classes::Node;
use gdlink::obj::{Gd, InstanceId};

use crate::framework::{RustTestCase, TestContext};
use crate::mock::{self, EngineMessage};

/// Runs all registered tests whose name contains one of `filters` (all tests if empty). Returns whether all passed.
///
/// The extension must be loaded. Tests run sequentially on the calling thread, which must be the one that loaded it.
pub fn run_tests(filters: &[String]) -> bool {
    let mut runner = IntegrationTests::default();
    runner.run_all_tests(filters)
}

#[derive(Default, Debug)]
struct IntegrationTests {
    total: i64,
    passed: i64,
    skipped: i64,
    failed_list: Vec<String>,
    focus_run: bool,
}

impl IntegrationTests {
    fn run_all_tests(&mut self, filters: &[String]) -> bool {
        println!("{FMT_CYAN_BOLD}Run{FMT_END} gdlink integration tests...");

        let (rust_tests, rust_files, focus_run) = super::collect_rust_tests(filters);

        self.focus_run = focus_run;
        if focus_run {
            println!("  {FMT_CYAN}Focused run{FMT_END} -- execute only selected Rust tests.")
        }
        println!(
            "  Rust: found {} tests in {} files.",
            rust_tests.len(),
            rust_files.len()
        );

        let root = Gd::<Node>::from_instance_id(InstanceId::from_nonzero(mock::root_id() as i64));
        let ctx = TestContext { root };

        let clock = Instant::now();
        self.run_rust_tests(rust_tests, &ctx);
        let rust_time = clock.elapsed();

        self.conclude_tests(rust_time)
    }

    fn run_rust_tests(&mut self, tests: Vec<RustTestCase>, ctx: &TestContext) {
        let mut last_file = None;
        for test in tests {
            print_test_pre(test.name, test.file.to_string(), &mut last_file);
            let outcome = run_rust_test(&test, ctx);

            self.update_stats(&outcome, test.file, test.name);
            print_test_post(test.name, outcome);
        }
    }

    fn conclude_tests(&self, rust_time: Duration) -> bool {
        let Self {
            total,
            passed,
            skipped,
            ..
        } = *self;

        // Consider 0 tests run as a failure too, because it's probably a problem with the run itself.
        let failed = total - passed - skipped;
        let all_passed = failed == 0 && total != 0;

        let outcome = TestOutcome::from_bool(all_passed);

        let extra = if skipped > 0 {
            format!(", {skipped} skipped")
        } else if self.focus_run {
            " (focused run)".to_string()
        } else {
            "".to_string()
        };

        println!("\nTest result: {outcome}. {passed} passed; {failed} failed{extra}.");
        println!("  Time: {:.2}s.", rust_time.as_secs_f32());

        if !all_passed {
            println!("\n  Failed tests:");
            let max = 10;
            for test in self.failed_list.iter().take(max) {
                println!("  * {test}");
            }

            if self.failed_list.len() > max {
                println!("  * ... and {} more.", self.failed_list.len() - max);
            }

            println!();
        }

        all_passed
    }

    fn update_stats(&mut self, outcome: &TestOutcome, test_file: &str, test_name: &str) {
        self.total += 1;
        match outcome {
            TestOutcome::Passed => self.passed += 1,
            TestOutcome::Failed => self.failed_list.push(format!(
                "{} > {}",
                extract_file_subtitle(test_file),
                test_name
            )),
            TestOutcome::Skipped => self.skipped += 1,
        }
    }
}

// For more colors, see https://stackoverflow.com/a/54062826
const FMT_CYAN_BOLD: &str = "\x1b[36;1;1m";
const FMT_CYAN: &str = "\x1b[36m";
const FMT_GREEN: &str = "\x1b[32m";
const FMT_YELLOW: &str = "\x1b[33m";
const FMT_RED: &str = "\x1b[31m";
const FMT_END: &str = "\x1b[0m";

fn run_rust_test(test: &RustTestCase, ctx: &TestContext) -> TestOutcome {
    if test.skipped {
        return TestOutcome::Skipped;
    }

    // Messages of earlier tests must not leak into this one.
    let _ = mock::take_messages();
    let objects_before = mock::object_count();

    // Explicit type to prevent tests from returning a value
    let err_context = || format!("itest `{}` failed", test.name);
    let success: Result<(), String> = gdlink::private::handle_panic(err_context, || (test.function)(ctx));

    let leftover = mock::take_messages();
    let objects_after = mock::object_count();

    // Errors the test did not check are reported, but do not fail it.
    print_unchecked_messages(&leftover);

    if success.is_err() {
        return TestOutcome::Failed;
    }

    if objects_after != objects_before {
        println!(
            "\n   {FMT_RED}leak{FMT_END}: {objects_before} objects alive before `{}`, {objects_after} after.",
            test.name
        );
        return TestOutcome::Failed;
    }

    TestOutcome::Passed
}

fn print_unchecked_messages(messages: &[EngineMessage]) {
    for message in messages {
        print!(
            "\n      {FMT_YELLOW}{:?}{FMT_END}: {}",
            message.kind, message.description
        );
    }

    if !messages.is_empty() {
        print!("\n      ");
    }
}

fn print_test_pre(test_case: &str, test_file: String, last_file: &mut Option<String>) {
    print_file_header(test_file, last_file);

    print!("   -- {test_case} ... ");
    let _ = std::io::stdout().flush();
}

fn print_file_header(file: String, last_file: &mut Option<String>) {
    // Check if we need to open a new category for a file.
    let print_file = last_file
        .as_ref()
        .map_or(true, |last_file| last_file != &file);

    if print_file {
        println!("\n   {}:", extract_file_subtitle(&file));
    }

    // State update for file-category-print
    *last_file = Some(file);
}

fn extract_file_subtitle(file: &str) -> &str {
    if let Some(sep_pos) = file.rfind(['/', '\\']) {
        &file[sep_pos + 1..]
    } else {
        file
    }
}

/// Prints a test name and its outcome.
///
/// Note that this is run after a test run, so stdout/stderr output during the test will be printed before.
fn print_test_post(test_case: &str, outcome: TestOutcome) {
    // If test failed, something was printed (e.g. assertion), so we can print the entire line again; otherwise just outcome on same line.
    if matches!(outcome, TestOutcome::Failed) {
        println!("   -- {test_case} ... {outcome}");
    } else {
        println!("{outcome}");
    }
}

#[must_use]
enum TestOutcome {
    Passed,
    Failed,
    Skipped,
}

impl TestOutcome {
    fn from_bool(success: bool) -> Self {
        if success {
            Self::Passed
        } else {
            Self::Failed
        }
    }
}

impl std::fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let end = FMT_END;
        let (col, outcome) = match self {
            TestOutcome::Passed => (FMT_GREEN, "ok"),
            TestOutcome::Failed => (FMT_RED, "FAILED"),
            TestOutcome::Skipped => (FMT_YELLOW, "skipped"),
        };

        write!(f, "{col}{outcome}{end}")
    }
}

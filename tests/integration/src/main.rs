//! Integration Test Runner
//!
//! Runs the integration test categories one `cargo test` at a time and
//! prints a summary. Category names given on the command line select a
//! subset.
//!
//! # Usage
//!
//! ```text
//! cargo run -p integration-tests
//! cargo run -p integration-tests -- dcom stress
//! cargo test -p integration-tests --test envelope_tests
//! RUST_LOG=debug cargo test -p integration-tests --test dcom_tests
//! ```

use std::process::{Command, ExitCode};
use std::time::{Duration, Instant};

struct Category {
    key: &'static str,
    about: &'static str,
}

const CATEGORIES: &[Category] = &[
    Category {
        key: "envelope",
        about: "operation round trips, opnum dispatch, return codes",
    },
    Category {
        key: "complex_types",
        about: "NDR pointers, conformant arrays, unions, strings",
    },
    Category {
        key: "dcom",
        about: "derived interfaces, superclass binds, IPID routing",
    },
    Category {
        key: "stress",
        about: "concurrent calls on shared connections",
    },
];

struct Outcome {
    key: &'static str,
    passed: bool,
    elapsed: Duration,
    detail: String,
}

fn run(category: &Category) -> Outcome {
    let target = format!("{}_tests", category.key);
    println!("--- {} ({})", target, category.about);

    let start = Instant::now();
    let status = Command::new("cargo")
        .args(["test", "-p", "integration-tests", "--test", &target])
        .status();
    let elapsed = start.elapsed();

    let (passed, detail) = match status {
        Ok(status) if status.success() => (true, String::new()),
        Ok(status) => (false, format!("exit code {:?}", status.code())),
        Err(e) => (false, format!("could not run cargo: {}", e)),
    };
    Outcome {
        key: category.key,
        passed,
        elapsed,
        detail,
    }
}

fn main() -> ExitCode {
    let wanted: Vec<String> = std::env::args().skip(1).collect();
    let selected: Vec<&Category> = CATEGORIES
        .iter()
        .filter(|c| wanted.is_empty() || wanted.iter().any(|w| w == c.key))
        .collect();
    if selected.is_empty() {
        let known: Vec<_> = CATEGORIES.iter().map(|c| c.key).collect();
        eprintln!("no matching category; known: {}", known.join(", "));
        return ExitCode::FAILURE;
    }

    let outcomes: Vec<Outcome> = selected.into_iter().map(run).collect();

    println!();
    println!("{:<16} {:<6} {:>12}  Detail", "Category", "Result", "Time");
    for outcome in &outcomes {
        println!(
            "{:<16} {:<6} {:>12.2?}  {}",
            outcome.key,
            if outcome.passed { "ok" } else { "FAIL" },
            outcome.elapsed,
            outcome.detail
        );
    }

    let failed = outcomes.iter().filter(|o| !o.passed).count();
    println!("\n{} of {} categories passed", outcomes.len() - failed, outcomes.len());
    if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Line classification for `go test -v` output
//!
//! Every input line maps to exactly one [`LineEvent`]. The grammars are tried
//! in order and the first match wins:
//!
//! ```text
//! PASS | FAIL                          bare verdict, dropped
//! === RUN   TestName                   test started
//! --- (PASS|FAIL|SKIP): TestName (0.01s)
//! (ok|FAIL|?)  package/path  0.12s     package finished
//! ```
//!
//! Anything else is [`LineEvent::Unclassified`].

use std::sync::LazyLock;

use regex::Regex;

use crate::record::TestOutcome;

// Whitespace classes are spelled out as ASCII: `\s` in `regex` is Unicode-aware
// and would accept separators `go test` never prints.
static CRUFT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:PASS|FAIL)$").expect("cruft pattern is valid"));

static TEST_RUN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^=== RUN[\t\n\f\r ]+([^\t\n\f\r ]+)").expect("run pattern is valid")
});

static TEST_FINISH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^--- (PASS|FAIL|SKIP):[\t\n\f\r ]+([^\t\n\f\r ]+) \(([0-9.]+)s\)")
        .expect("finish pattern is valid")
});

static PACKAGE_FINISH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:ok|FAIL|\?)[\t\n\f\r ]+([^\t\n\f\r ]+)").expect("package pattern is valid")
});

/// A classified input line
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineEvent<'a> {
    /// Bare `PASS` or `FAIL` printed at the end of a package
    Cruft,
    /// `=== RUN` marker
    TestStarted {
        /// Test name
        name: &'a str,
    },
    /// `--- PASS/FAIL/SKIP` marker
    TestFinished {
        /// Verdict
        outcome: TestOutcome,
        /// Test name
        name: &'a str,
        /// Reported duration, 0.0 when the number does not parse
        duration_secs: f64,
    },
    /// `ok`/`FAIL`/`?` package summary line
    PackageFinished {
        /// Package import path
        package: &'a str,
    },
    /// Free-form output
    Unclassified(&'a str),
}

/// Classify a single line of `go test -v` output
#[must_use]
pub fn classify_line(line: &str) -> LineEvent<'_> {
    if CRUFT_PATTERN.is_match(line) {
        return LineEvent::Cruft;
    }

    if let Some(caps) = TEST_RUN_PATTERN.captures(line) {
        if let Some(name) = caps.get(1) {
            return LineEvent::TestStarted {
                name: name.as_str(),
            };
        }
    }

    if let Some(caps) = TEST_FINISH_PATTERN.captures(line) {
        if let (Some(verdict), Some(name), Some(secs)) = (caps.get(1), caps.get(2), caps.get(3)) {
            return LineEvent::TestFinished {
                outcome: parse_outcome(verdict.as_str()),
                name: name.as_str(),
                duration_secs: parse_duration(secs.as_str()),
            };
        }
    }

    if let Some(package) = PACKAGE_FINISH_PATTERN.captures(line).and_then(|c| c.get(1)) {
        return LineEvent::PackageFinished {
            package: package.as_str(),
        };
    }

    LineEvent::Unclassified(line)
}

fn parse_outcome(verdict: &str) -> TestOutcome {
    match verdict {
        "PASS" => TestOutcome::Pass,
        "SKIP" => TestOutcome::Skip,
        _ => TestOutcome::Fail,
    }
}

/// Parse the seconds literal of a finish line, swallowing malformed numbers
fn parse_duration(secs: &str) -> f64 {
    secs.parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d >= 0.0)
        .unwrap_or(0.0)
}

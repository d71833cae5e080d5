// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! gotest-report: `go test -v` output to TeamCity service messages
//!
//! This library crate classifies `go test -v` output line by line, buffers
//! test results per package, and renders each finished package as a
//! TeamCity test suite.
//!
//! # Example
//!
//! ```
//! use gotest_report::{EscapeMode, convert};
//!
//! let output = "=== RUN   TestA\n--- PASS: TestA (0.01s)\nok  \texample.com/pkg\t0.01s\n";
//! let messages = convert(output, EscapeMode::default()).unwrap();
//! assert!(messages.starts_with("##teamcity[testSuiteStarted name='example.com/pkg']"));
//!
//! // Or feed lines one at a time
//! use gotest_report::Dispatcher;
//!
//! let mut dispatcher = Dispatcher::new();
//! for line in output.lines() {
//!     dispatcher.process_line(line).unwrap();
//! }
//! ```

#![warn(missing_docs)]

pub mod classify;
pub mod dispatcher;
pub mod error;
pub mod record;
pub mod teamcity;

pub use classify::{LineEvent, classify_line};
pub use dispatcher::{Dispatcher, Emission, Finished, ReportStats, SuiteReport, convert};
pub use error::ReportError;
pub use record::{OutputLine, TestOutcome, TestRecord, TestStatus};
pub use teamcity::{EscapeMode, escape, write_suite};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::dispatcher::{Dispatcher, Emission, SuiteReport, convert};
    pub use crate::error::ReportError;
    pub use crate::record::{OutputLine, TestOutcome, TestRecord, TestStatus};
    pub use crate::teamcity::EscapeMode;
}

// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Line-by-line conversion state machine
//!
//! `go test` only names a package on its summary line, after all of the
//! package's tests have run. The [`Dispatcher`] therefore buffers test records
//! per package and releases them as one [`SuiteReport`] when the summary line
//! arrives, in the order the tests started.
//!
//! Output lines that follow a failing `--- FAIL` marker belong to that test
//! until the next `=== RUN` or package summary. Other free-form lines are
//! handed back for immediate passthrough.
//!
//! # Example
//!
//! ```
//! use gotest_report::dispatcher::{Dispatcher, Emission};
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.process_line("=== RUN   TestA").unwrap();
//! dispatcher.process_line("--- PASS: TestA (0.01s)").unwrap();
//! match dispatcher.process_line("ok  \texample.com/pkg\t0.01s").unwrap() {
//!     Emission::Suite(suite) => assert_eq!(suite.records.len(), 1),
//!     other => panic!("expected a suite, got {other:?}"),
//! }
//! ```

use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::classify::{LineEvent, classify_line};
use crate::error::ReportError;
use crate::record::{OutputLine, TestOutcome, TestRecord, TestStatus};
use crate::teamcity::{EscapeMode, render_suite, write_suite};

/// Counters accumulated over a conversion run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportStats {
    /// Suites flushed
    pub packages: usize,
    /// Tests flushed
    pub tests: usize,
    /// Tests flushed as passed
    pub passed: usize,
    /// Tests flushed as failed
    pub failed: usize,
    /// Tests flushed as skipped
    pub skipped: usize,
    /// Tests flushed without ever seeing a finish line
    pub pending: usize,
    /// Lines captured as failure output
    pub captured_lines: usize,
    /// Lines handed back for passthrough
    pub passthrough_lines: usize,
    /// Bare `PASS`/`FAIL` lines dropped
    pub cruft_lines: usize,
    /// Tests still buffered when the input ended
    pub unterminated: usize,
}

impl ReportStats {
    /// Check if every flushed test passed or was skipped
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed == 0 && self.pending == 0
    }

    fn count_flushed(&mut self, records: &[TestRecord]) {
        self.packages += 1;
        self.tests += records.len();
        for record in records {
            match record.status {
                TestStatus::Pass => self.passed += 1,
                TestStatus::Fail => self.failed += 1,
                TestStatus::Skip => self.skipped += 1,
                TestStatus::Pending => self.pending += 1,
            }
        }
    }
}

/// All test records of one finished package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Package import path
    pub package: String,
    /// Records in start order
    pub records: Vec<TestRecord>,
}

impl SuiteReport {
    /// Render the suite as service message lines
    ///
    /// Captured output that is not valid UTF-8 is decoded lossily; use
    /// [`SuiteReport::write_to`] to keep it intact.
    #[must_use]
    pub fn render(&self, mode: EscapeMode) -> Vec<String> {
        render_suite(&self.package, &self.records, mode)
    }

    /// Write the suite, one line each, captured output byte for byte
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    pub fn write_to<W: Write>(&self, writer: &mut W, mode: EscapeMode) -> io::Result<()> {
        write_suite(writer, &self.package, &self.records, mode)
    }
}

/// What a processed line produced
#[derive(Debug, Clone, PartialEq)]
pub enum Emission<'a> {
    /// Nothing to write yet
    Nothing,
    /// Write this line unchanged, byte for byte
    Passthrough(&'a [u8]),
    /// A package finished; write the whole suite
    Suite(SuiteReport),
}

/// State left over once the input is exhausted
#[derive(Debug, Clone, PartialEq)]
pub struct Finished {
    /// Records of a package whose summary line never arrived, in start order
    pub unterminated: Vec<TestRecord>,
    /// Final counters
    pub stats: ReportStats,
}

/// Streaming converter state: the current package buffer and the capturing test
#[derive(Debug, Default)]
pub struct Dispatcher {
    buffer: Vec<TestRecord>,
    /// Index into `buffer` of the failed test receiving output
    capturing: Option<usize>,
    stats: ReportStats,
}

impl Dispatcher {
    /// Create a dispatcher with an empty buffer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify and process a single line of input
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::UnknownTest`] if a finish line names a test that
    /// was never started in the current package. The dispatcher must not be
    /// used after an error.
    pub fn process_line<'a>(&mut self, line: &'a str) -> Result<Emission<'a>, ReportError> {
        self.process_event(classify_line(line))
    }

    /// Process a raw line that may not be valid UTF-8
    ///
    /// The line is classified on its lossily decoded text. Passthrough and
    /// captured output keep the original bytes.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::process_line`].
    pub fn process_bytes<'a>(&mut self, raw: &'a [u8]) -> Result<Emission<'a>, ReportError> {
        let text = String::from_utf8_lossy(raw);
        self.apply(classify_line(&text), raw)
    }

    /// Process an already classified line
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::process_line`].
    pub fn process_event<'a>(&mut self, event: LineEvent<'a>) -> Result<Emission<'a>, ReportError> {
        let raw: &'a [u8] = match event {
            LineEvent::Unclassified(line) => line.as_bytes(),
            _ => &[],
        };
        self.apply(event, raw)
    }

    /// Apply `event`; `raw` is the line as read, used for unclassified output
    fn apply<'a>(
        &mut self,
        event: LineEvent<'_>,
        raw: &'a [u8],
    ) -> Result<Emission<'a>, ReportError> {
        match event {
            LineEvent::Cruft => {
                self.stats.cruft_lines += 1;
                Ok(Emission::Nothing)
            }
            LineEvent::TestStarted { name } => {
                self.capturing = None;
                trace!(test = name, "test started");
                self.buffer.push(TestRecord::new(name));
                Ok(Emission::Nothing)
            }
            LineEvent::TestFinished {
                outcome,
                name,
                duration_secs,
            } => {
                self.finish_test(outcome, name, duration_secs)?;
                Ok(Emission::Nothing)
            }
            LineEvent::PackageFinished { package } => {
                self.capturing = None;
                Ok(Emission::Suite(self.flush(package)))
            }
            LineEvent::Unclassified(_) => match self.capturing {
                Some(index) => {
                    self.buffer[index].output.push(OutputLine::from(raw));
                    self.stats.captured_lines += 1;
                    Ok(Emission::Nothing)
                }
                None => {
                    self.stats.passthrough_lines += 1;
                    Ok(Emission::Passthrough(raw))
                }
            },
        }
    }

    fn finish_test(
        &mut self,
        outcome: TestOutcome,
        name: &str,
        duration_secs: f64,
    ) -> Result<(), ReportError> {
        let Some(index) = self.buffer.iter().position(|r| r.name == name) else {
            return Err(ReportError::UnknownTest {
                name: name.to_string(),
            });
        };

        let record = &mut self.buffer[index];
        if record.status.is_finished() {
            warn!(test = name, previous = ?record.status, "test finished twice, keeping the latest result");
        }
        record.finish(outcome, duration_secs);
        trace!(test = name, ?outcome, duration_secs, "test finished");

        self.capturing = (outcome == TestOutcome::Fail).then_some(index);
        Ok(())
    }

    fn flush(&mut self, package: &str) -> SuiteReport {
        let records = std::mem::take(&mut self.buffer);
        for record in records.iter().filter(|r| !r.status.is_finished()) {
            warn!(
                test = %record.name,
                package,
                "test has no finish line, reporting it without a result"
            );
        }
        self.stats.count_flushed(&records);
        debug!(package, tests = records.len(), "package finished");
        SuiteReport {
            package: package.to_string(),
            records,
        }
    }

    /// Name of the test currently receiving output, if any
    #[must_use]
    pub fn capturing(&self) -> Option<&str> {
        self.capturing
            .and_then(|index| self.buffer.get(index))
            .map(|record| record.name.as_str())
    }

    /// Counters so far
    #[must_use]
    pub fn stats(&self) -> &ReportStats {
        &self.stats
    }

    /// Finish the run and hand back anything still buffered
    #[must_use]
    pub fn finish(self) -> Finished {
        let mut stats = self.stats;
        stats.unterminated = self.buffer.len();
        Finished {
            unterminated: self.buffer,
            stats,
        }
    }
}

/// Convert complete `go test -v` output into service messages
///
/// Lines are split on `\n` with a trailing `\r` removed. A package without a
/// summary line at the end of `input` is dropped, as in streaming use.
///
/// # Errors
///
/// Returns [`ReportError::UnknownTest`] on a finish line without a start line.
pub fn convert(input: &str, mode: EscapeMode) -> Result<String, ReportError> {
    let mut dispatcher = Dispatcher::new();
    let mut out = String::with_capacity(input.len());

    for line in input.lines() {
        match dispatcher.process_line(line)? {
            Emission::Nothing => {}
            Emission::Passthrough(raw) => {
                out.push_str(&String::from_utf8_lossy(raw));
                out.push('\n');
            }
            Emission::Suite(suite) => {
                for rendered in suite.render(mode) {
                    out.push_str(&rendered);
                    out.push('\n');
                }
            }
        }
    }

    Ok(out)
}

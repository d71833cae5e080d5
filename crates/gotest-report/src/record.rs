//! Test record types

use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// First `Error:` line in captured output, used as a failure summary
static ERROR_LINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)Error:[\t\n\f\r ]+.+$").expect("error line pattern is valid")
});

/// Verdict carried by a `--- PASS/FAIL/SKIP` line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestOutcome {
    /// `--- PASS`
    Pass,
    /// `--- FAIL`
    Fail,
    /// `--- SKIP`
    Skip,
}

/// Status of a buffered test
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    /// Started but no finish line seen yet
    #[default]
    Pending,
    /// Test passed
    Pass,
    /// Test failed
    Fail,
    /// Test was skipped
    Skip,
}

impl From<TestOutcome> for TestStatus {
    fn from(outcome: TestOutcome) -> Self {
        match outcome {
            TestOutcome::Pass => Self::Pass,
            TestOutcome::Fail => Self::Fail,
            TestOutcome::Skip => Self::Skip,
        }
    }
}

impl TestStatus {
    /// Whether a finish line has been applied
    #[must_use]
    pub fn is_finished(self) -> bool {
        self != Self::Pending
    }
}

/// One captured output line, kept byte for byte
///
/// `go test` output is not guaranteed to be UTF-8. The original bytes are
/// written back unchanged; only the failure message works on decoded text.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputLine(Vec<u8>);

impl OutputLine {
    /// Raw bytes of the line, without line terminator
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Line as text, invalid UTF-8 replaced by U+FFFD
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl From<&[u8]> for OutputLine {
    fn from(raw: &[u8]) -> Self {
        Self(raw.to_vec())
    }
}

impl From<&str> for OutputLine {
    fn from(line: &str) -> Self {
        Self(line.as_bytes().to_vec())
    }
}

impl fmt::Debug for OutputLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.text(), f)
    }
}

/// One test case observed within a package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    /// Test name as printed after `=== RUN`
    pub name: String,
    /// Current status
    pub status: TestStatus,
    /// Duration in seconds, 0 when absent or unparsable
    pub duration_secs: f64,
    /// Output lines captured after a failing finish line, in arrival order
    pub output: Vec<OutputLine>,
}

impl TestRecord {
    /// Create a pending record with no output
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: TestStatus::Pending,
            duration_secs: 0.0,
            output: Vec::new(),
        }
    }

    /// Apply a finish line to this record
    pub fn finish(&mut self, outcome: TestOutcome, duration_secs: f64) {
        self.status = outcome.into();
        self.duration_secs = duration_secs;
    }

    /// Check if the test passed
    #[must_use]
    pub fn passed(&self) -> bool {
        self.status == TestStatus::Pass
    }

    /// Check if the test failed
    #[must_use]
    pub fn failed(&self) -> bool {
        self.status == TestStatus::Fail
    }

    /// Check if the test was skipped
    #[must_use]
    pub fn skipped(&self) -> bool {
        self.status == TestStatus::Skip
    }

    /// Duration in whole milliseconds
    ///
    /// The value is rounded to microseconds before truncating, which keeps
    /// the two-decimal durations printed by `go test` exact (`0.29s` is
    /// `290`, not `289`).
    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        if !self.duration_secs.is_finite() || self.duration_secs <= 0.0 {
            return 0;
        }
        let micros = (self.duration_secs * 1_000_000.0).round() as u64;
        micros / 1000
    }

    /// Captured output joined with newlines, decoded lossily
    #[must_use]
    pub fn joined_output(&self) -> String {
        self.output
            .iter()
            .map(OutputLine::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Short failure summary for the dashboard
    ///
    /// Uses the first `Error:` line when there is one, otherwise the first
    /// output line trimmed. Empty output gives an empty message.
    #[must_use]
    pub fn failure_message(&self) -> String {
        let joined = self.joined_output();
        if let Some(found) = ERROR_LINE_PATTERN.find(&joined) {
            return found.as_str().to_string();
        }
        self.output
            .first()
            .map(|line| line.text().trim().to_string())
            .unwrap_or_default()
    }
}

// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! TeamCity service message formatting
//!
//! Service messages are single lines of the form
//! `##teamcity[messageName attr='value' ...]`. Attribute values must escape
//! the structural characters `' | [ ]`, line breaks, and anything that is not
//! printable ASCII.
//!
//! Captured test output is written verbatim between `testStarted` and the
//! status line; it is never escaped. [`write_suite`] keeps it byte for byte,
//! the `render_*` functions decode it lossily into strings.

use std::fmt::Write as _;
use std::io::{self, Write};

use crate::record::{TestRecord, TestStatus};

/// How non-printable and non-ASCII characters are encoded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EscapeMode {
    /// One `|0xHHHH` per UTF-16 code unit, reversible by TeamCity
    #[default]
    Unicode,
    /// Only the first UTF-8 byte of a character survives as `|0x00HH`.
    /// Characters outside the Basic Multilingual Plane pass through as-is.
    /// Matches the output of older converters byte for byte.
    Legacy,
}

/// Escape a value for use inside a single-quoted attribute
#[must_use]
pub fn escape(input: &str, mode: EscapeMode) -> String {
    let mut out = String::with_capacity(input.len() + 8);
    for ch in input.chars() {
        match ch {
            '\n' => out.push_str("|n"),
            '\r' => out.push_str("|r"),
            '[' | ']' | '|' | '\'' => {
                out.push('|');
                out.push(ch);
            }
            c if u32::from(c) <= 0x20 || !c.is_ascii() => push_code_escape(&mut out, c, mode),
            c => out.push(c),
        }
    }
    out
}

fn push_code_escape(out: &mut String, ch: char, mode: EscapeMode) {
    match mode {
        EscapeMode::Unicode => {
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                let _ = write!(out, "|0x{unit:04x}");
            }
        }
        EscapeMode::Legacy if u32::from(ch) > 0xffff => out.push(ch),
        EscapeMode::Legacy => {
            let mut bytes = [0u8; 4];
            let first = ch.encode_utf8(&mut bytes).as_bytes()[0];
            let _ = write!(out, "|0x{first:04x}");
        }
    }
}

/// Build a service message line with escaped attribute values
#[must_use]
pub fn service_message(name: &str, attrs: &[(&str, &str)], mode: EscapeMode) -> String {
    let mut line = format!("##teamcity[{name}");
    for (key, value) in attrs {
        let _ = write!(line, " {key}='{}'", escape(value, mode));
    }
    line.push(']');
    line
}

/// `testSuiteStarted` line
#[must_use]
pub fn suite_started(package: &str, mode: EscapeMode) -> String {
    service_message("testSuiteStarted", &[("name", package)], mode)
}

/// `testSuiteFinished` line
#[must_use]
pub fn suite_finished(package: &str, mode: EscapeMode) -> String {
    service_message("testSuiteFinished", &[("name", package)], mode)
}

/// `testStarted` line
#[must_use]
pub fn test_started(name: &str, mode: EscapeMode) -> String {
    service_message(
        "testStarted",
        &[("name", name), ("captureStandardOutput", "true")],
        mode,
    )
}

/// `testFailed` line
#[must_use]
pub fn test_failed(name: &str, message: &str, mode: EscapeMode) -> String {
    service_message("testFailed", &[("name", name), ("message", message)], mode)
}

/// `testIgnored` line
#[must_use]
pub fn test_ignored(name: &str, mode: EscapeMode) -> String {
    service_message("testIgnored", &[("name", name)], mode)
}

/// `testFinished` line
#[must_use]
pub fn test_finished(name: &str, duration_ms: u64, mode: EscapeMode) -> String {
    let duration = duration_ms.to_string();
    service_message("testFinished", &[("name", name), ("duration", duration.as_str())], mode)
}

/// `testFailed`/`testIgnored` line for a finished record, if any
fn status_line(record: &TestRecord, mode: EscapeMode) -> Option<String> {
    match record.status {
        TestStatus::Fail => Some(test_failed(&record.name, &record.failure_message(), mode)),
        TestStatus::Skip => Some(test_ignored(&record.name, mode)),
        // TeamCity has no "passed" message; a started and finished test passed
        TestStatus::Pass | TestStatus::Pending => None,
    }
}

/// Render one test block: start, captured output, status line, finish
#[must_use]
pub fn render_test(record: &TestRecord, mode: EscapeMode) -> Vec<String> {
    let mut lines = Vec::with_capacity(record.output.len() + 3);
    lines.push(test_started(&record.name, mode));
    lines.extend(record.output.iter().map(|line| line.text().into_owned()));
    lines.extend(status_line(record, mode));
    lines.push(test_finished(&record.name, record.duration_ms(), mode));
    lines
}

/// Render a whole package as a suite, records in the given order
#[must_use]
pub fn render_suite(package: &str, records: &[TestRecord], mode: EscapeMode) -> Vec<String> {
    let mut lines = vec![suite_started(package, mode)];
    for record in records {
        lines.extend(render_test(record, mode));
    }
    lines.push(suite_finished(package, mode));
    lines
}

/// Write one test block, captured output as raw bytes
///
/// # Errors
///
/// Returns any error from the underlying writer.
pub fn write_test<W: Write>(
    writer: &mut W,
    record: &TestRecord,
    mode: EscapeMode,
) -> io::Result<()> {
    writeln!(writer, "{}", test_started(&record.name, mode))?;
    for line in &record.output {
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    if let Some(status) = status_line(record, mode) {
        writeln!(writer, "{status}")?;
    }
    writeln!(writer, "{}", test_finished(&record.name, record.duration_ms(), mode))
}

/// Write a whole package as a suite, captured output as raw bytes
///
/// # Errors
///
/// Returns any error from the underlying writer.
pub fn write_suite<W: Write>(
    writer: &mut W,
    package: &str,
    records: &[TestRecord],
    mode: EscapeMode,
) -> io::Result<()> {
    writeln!(writer, "{}", suite_started(package, mode))?;
    for record in records {
        write_test(writer, record, mode)?;
    }
    writeln!(writer, "{}", suite_finished(package, mode))
}

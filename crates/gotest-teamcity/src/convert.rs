// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Stream conversion
//!
//! This module connects a line source and a line sink to the
//! [`Dispatcher`]: it reads `go test -v` output, writes passthrough lines as
//! soon as they arrive, and writes each package as a suite once its summary
//! line has been seen.
//!
//! # Example
//!
//! ```no_run
//! use std::io;
//! use gotest_teamcity::convert::{ConvertOptions, convert_stream};
//!
//! let stats = convert_stream(io::stdin().lock(), io::stdout().lock(), &ConvertOptions::default())
//!     .expect("convert");
//! println!("{} packages", stats.packages);
//! ```

use std::io::{self, BufRead, Write};
use std::path::Path;

use gotest_report::{Dispatcher, Emission, EscapeMode, ReportError, ReportStats, SuiteReport};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Suite name used for `--flush-unterminated`
pub const UNTERMINATED_SUITE: &str = "unterminated";

// ============================================================================
// Error Types
// ============================================================================

/// Conversion errors
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Reading input or writing output failed
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The input violated the `go test -v` protocol
    #[error(transparent)]
    Report(#[from] ReportError),

    /// Serializing the run summary failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Options
// ============================================================================

/// Options for a conversion run
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertOptions {
    /// How attribute values are escaped
    pub escape_mode: EscapeMode,
    /// Emit a trailing package without summary line as [`UNTERMINATED_SUITE`]
    pub flush_unterminated: bool,
}

// ============================================================================
// Conversion
// ============================================================================

/// Convert a whole stream, returning the run statistics
///
/// The writer is flushed after every emitted line group so passthrough output
/// keeps its position relative to anything else writing to the same
/// terminal. Lines are classified on their lossily decoded text; passthrough
/// and captured output are written back byte for byte.
///
/// # Errors
///
/// Returns [`ConvertError::Report`] when a finish line names an unknown test;
/// buffered results of the current package are discarded in that case.
/// Returns [`ConvertError::Io`] when reading or writing fails.
pub fn convert_stream<R, W>(
    mut reader: R,
    mut writer: W,
    options: &ConvertOptions,
) -> Result<ReportStats, ConvertError>
where
    R: BufRead,
    W: Write,
{
    let mut dispatcher = Dispatcher::new();
    let mut buf = Vec::new();
    let mut lines = 0usize;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        lines += 1;

        match dispatcher.process_bytes(trim_line_ending(&buf))? {
            Emission::Nothing => {}
            Emission::Passthrough(raw) => {
                writer.write_all(raw)?;
                writer.write_all(b"\n")?;
                writer.flush()?;
            }
            Emission::Suite(suite) => {
                debug!(package = %suite.package, tests = suite.records.len(), "writing suite");
                suite.write_to(&mut writer, options.escape_mode)?;
                writer.flush()?;
            }
        }
    }

    let finished = dispatcher.finish();
    if !finished.unterminated.is_empty() {
        if options.flush_unterminated {
            info!(
                tests = finished.unterminated.len(),
                suite = UNTERMINATED_SUITE,
                "input ended before the package summary line, flushing buffered tests"
            );
            let suite = SuiteReport {
                package: UNTERMINATED_SUITE.to_string(),
                records: finished.unterminated,
            };
            suite.write_to(&mut writer, options.escape_mode)?;
            writer.flush()?;
        } else {
            warn!(
                tests = finished.unterminated.len(),
                "input ended before the package summary line, dropping buffered tests"
            );
        }
    }

    let stats = finished.stats;
    info!(
        lines,
        packages = stats.packages,
        tests = stats.tests,
        passed = stats.passed,
        failed = stats.failed,
        skipped = stats.skipped,
        all_passed = stats.all_passed(),
        "conversion finished"
    );
    Ok(stats)
}

/// Write run statistics as pretty JSON
///
/// # Errors
///
/// Returns an error if serialization or the file write fails.
pub fn write_summary(path: impl AsRef<Path>, stats: &ReportStats) -> Result<(), ConvertError> {
    let json = serde_json::to_string_pretty(stats)?;
    std::fs::write(path.as_ref(), json)?;
    debug!(path = %path.as_ref().display(), "wrote run summary");
    Ok(())
}

/// Strip `\n` and a preceding `\r` from a raw line
fn trim_line_ending(raw: &[u8]) -> &[u8] {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    raw.strip_suffix(b"\r").unwrap_or(raw)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;
    use std::io::Cursor;

    fn run(input: &[u8], options: &ConvertOptions) -> (Result<ReportStats, ConvertError>, String) {
        let mut out = Vec::new();
        let result = convert_stream(Cursor::new(input), &mut out, options);
        (result, String::from_utf8(out).expect("output is utf-8"))
    }

    #[test]
    fn test_trim_line_ending() {
        assert_eq!(trim_line_ending(b"abc\r\n"), b"abc");
        assert_eq!(trim_line_ending(b"abc\n"), b"abc");
        assert_eq!(trim_line_ending(b"abc"), b"abc");
        assert_eq!(trim_line_ending(b"\r"), b"");
        assert_eq!(trim_line_ending(b"a\rb\n"), b"a\rb");
    }

    #[test]
    fn test_passthrough_is_written_immediately() {
        let (result, out) = run(b"hello\n=== RUN   TestA\nworld", &ConvertOptions::default());
        let stats = result.expect("convert");
        assert_eq!(out, "hello\nworld\n");
        assert_eq!(stats.passthrough_lines, 2);
        assert_eq!(stats.unterminated, 1);
    }

    #[test]
    fn test_invalid_utf8_passthrough_is_written_unchanged() {
        let mut out = Vec::new();
        convert_stream(
            Cursor::new(&b"bin \xff\xfe data\ncaf\xe9\r\n"[..]),
            &mut out,
            &ConvertOptions::default(),
        )
        .expect("convert");
        assert_eq!(out, b"bin \xff\xfe data\ncaf\xe9\n".to_vec());
    }

    #[test]
    fn test_invalid_utf8_failure_output_is_written_unchanged() {
        let input = b"=== RUN   TestA\n--- FAIL: TestA (0.00s)\n    got \xc3\x28\nFAIL\tpkg\t0.01s\n";
        let mut out = Vec::new();
        convert_stream(Cursor::new(&input[..]), &mut out, &ConvertOptions::default())
            .expect("convert");

        let mut expected = Vec::new();
        expected.extend_from_slice(
            b"##teamcity[testSuiteStarted name='pkg']\n\
              ##teamcity[testStarted name='TestA' captureStandardOutput='true']\n\
              \x20   got \xc3\x28\n",
        );
        expected.extend_from_slice(
            b"##teamcity[testFailed name='TestA' message='got|0x0020|0xfffd(']\n\
              ##teamcity[testFinished name='TestA' duration='0']\n\
              ##teamcity[testSuiteFinished name='pkg']\n",
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn test_unknown_test_stops_without_flushing() {
        let input = b"=== RUN   TestA\n--- PASS: TestA (0.00s)\n--- PASS: TestB (0.00s)\nok  \tpkg\t0.1s\n";
        let (result, out) = run(input, &ConvertOptions::default());
        match result {
            Err(ConvertError::Report(ReportError::UnknownTest { name })) => {
                assert_eq!(name, "TestB");
            }
            other => panic!("expected unknown test error, got {other:?}"),
        }
        assert_eq!(out, "");
    }

    #[test]
    fn test_unterminated_package_dropped_by_default() {
        let input = b"=== RUN   TestA\n--- PASS: TestA (0.00s)\n";
        let (result, out) = run(input, &ConvertOptions::default());
        assert_eq!(result.expect("convert").unterminated, 1);
        assert_eq!(out, "");
    }

    #[test]
    fn test_unterminated_package_flushed_on_request() {
        let input = b"=== RUN   TestA\n--- PASS: TestA (0.25s)\n";
        let options = ConvertOptions {
            flush_unterminated: true,
            ..Default::default()
        };
        let (result, out) = run(input, &options);
        result.expect("convert");
        assert_eq!(
            out,
            "##teamcity[testSuiteStarted name='unterminated']\n\
             ##teamcity[testStarted name='TestA' captureStandardOutput='true']\n\
             ##teamcity[testFinished name='TestA' duration='250']\n\
             ##teamcity[testSuiteFinished name='unterminated']\n"
        );
    }

    #[test]
    fn test_legacy_escaping() {
        let options = ConvertOptions {
            escape_mode: EscapeMode::Legacy,
            ..Default::default()
        };

        let input = "=== RUN   Test日本\n--- PASS: Test日本 (0.00s)\nok  \tpkg\t0.1s\n";
        let (result, out) = run(input.as_bytes(), &options);
        result.expect("convert");
        assert!(out.contains("name='Test|0x00e6|0x00e6'"));
    }

    #[test]
    fn test_write_summary() {
        let path = std::env::temp_dir().join(format!(
            "gotest-teamcity-summary-{}.json",
            std::process::id()
        ));
        let stats = ReportStats {
            packages: 2,
            failed: 1,
            ..Default::default()
        };
        write_summary(&path, &stats).expect("write summary");

        let content = std::fs::read_to_string(&path).expect("read summary");
        let _ = std::fs::remove_file(&path);
        let parsed: ReportStats = serde_json::from_str(&content).expect("parse summary");
        assert_eq!(parsed, stats);
        assert!(content.contains("\"packages\": 2"));
    }
}

// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! CLI tests for the --verbose / -v and --quiet / -q flags
//!
//! These tests verify the logging level configuration behavior,
//! including flag interactions and level determination.


use clap::Parser;
use gotest_teamcity::config::Config;
use test_utils::{run_binary, sample_go_test_output};
use tracing::Level;

// ============================================================================
// --verbose flag tests
// ============================================================================

#[test]
fn test_verbose_short_flag_v() {
    let config = Config::try_parse_from(["gotest-teamcity", "-v"]).expect("parse should succeed");
    assert!(config.verbose);
    assert!(!config.quiet);
}

#[test]
fn test_verbose_long_flag() {
    let config =
        Config::try_parse_from(["gotest-teamcity", "--verbose"]).expect("parse should succeed");
    assert!(config.verbose);
    assert_eq!(config.log_level(), Level::DEBUG);
}

#[test]
fn test_verbose_flag_value_syntax_not_supported() {
    // Boolean flags are toggled by presence only
    let result = Config::try_parse_from(["gotest-teamcity", "--verbose=true"]);
    assert!(result.is_err(), "Boolean flags don't support =value syntax");
}

// ============================================================================
// --quiet flag tests
// ============================================================================

#[test]
fn test_quiet_short_flag_q() {
    let config = Config::try_parse_from(["gotest-teamcity", "-q"]).expect("parse should succeed");
    assert!(config.quiet);
    assert!(!config.verbose);
    assert_eq!(config.log_level(), Level::WARN);
}

#[test]
fn test_quiet_flag_value_false_not_supported() {
    let result = Config::try_parse_from(["gotest-teamcity", "--quiet=false"]);
    assert!(result.is_err(), "Boolean flags don't support =value syntax");
}

// ============================================================================
// Default behavior tests
// ============================================================================

#[test]
fn test_no_flags_means_info_level() {
    let config = Config::try_parse_from(["gotest-teamcity"]).expect("parse should succeed");
    assert!(!config.verbose);
    assert!(!config.quiet);
    assert_eq!(config.log_level(), Level::INFO);
}

// ============================================================================
// Flag interaction tests
// ============================================================================

#[test]
fn test_verbose_and_quiet_flags_both_parse() {
    // clap allows both flags to be set; verbose is checked first
    let config =
        Config::try_parse_from(["gotest-teamcity", "-v", "-q"]).expect("parse should succeed");
    assert!(config.verbose);
    assert!(config.quiet);
    assert_eq!(config.log_level(), Level::DEBUG);
}

// ============================================================================
// Log routing tests
// ============================================================================

#[test]
fn test_logs_never_reach_stdout() {
    let output = run_binary(&["--verbose"], sample_go_test_output());
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for line in stdout.lines() {
        assert!(
            line.starts_with("##teamcity[") || line.starts_with("    "),
            "unexpected stdout line: {line}"
        );
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("conversion finished"), "stderr: {stderr}");
}

#[test]
fn test_quiet_suppresses_info_logs() {
    let output = run_binary(&["--quiet"], sample_go_test_output());
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("conversion finished"), "stderr: {stderr}");
}

/// Drop ANSI styling sequences (`ESC [ ... m`) from log output
fn strip_ansi(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[test]
fn test_final_summary_reports_all_passed() {
    let output = run_binary(&[], sample_go_test_output());
    let stderr = strip_ansi(&String::from_utf8_lossy(&output.stderr));
    // The sample contains a failing test
    assert!(stderr.contains("all_passed=false"), "stderr: {stderr}");

    let passing = "=== RUN   TestA\n--- PASS: TestA (0.00s)\nok  \tpkg\t0.01s\n";
    let output = run_binary(&[], passing);
    let stderr = strip_ansi(&String::from_utf8_lossy(&output.stderr));
    assert!(stderr.contains("all_passed=true"), "stderr: {stderr}");
}

// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for gotest-report

use thiserror::Error;

/// Errors that can occur while converting test output
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    /// A `--- PASS/FAIL/SKIP` line named a test that has no `=== RUN` line
    /// in the current package. `go test` only prints start markers in
    /// verbose mode, so this is the usual symptom of a missing `-v`.
    #[error("Finish line for unknown test `{name}` (run `go test` with -v)")]
    UnknownTest {
        /// Name carried by the orphaned finish line
        name: String,
    },
}

//! gotest-teamcity library
//!
//! This module exports the configuration and stream conversion of
//! gotest-teamcity for use in integration tests and as a library.

pub mod config;
pub mod convert;

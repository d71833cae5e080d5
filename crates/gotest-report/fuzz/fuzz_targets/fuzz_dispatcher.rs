// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Fuzz target for the dispatcher
//!
//! Feeds arbitrary bytes through `Dispatcher` line by line and writes every
//! suite in both escaping modes.

#![no_main]

use libfuzzer_sys::fuzz_target;

use gotest_report::{Dispatcher, Emission, EscapeMode};

fuzz_target!(|data: &[u8]| {
    let mut dispatcher = Dispatcher::new();

    // Unknown tests end the run with an error, never a panic
    for line in data.split(|&b| b == b'\n') {
        match dispatcher.process_bytes(line) {
            Ok(Emission::Passthrough(raw)) => assert_eq!(raw, line),
            Ok(Emission::Suite(suite)) => {
                let mut sink = Vec::new();
                let _ = suite.write_to(&mut sink, EscapeMode::Unicode);
                let _ = suite.render(EscapeMode::Legacy);
            }
            Ok(Emission::Nothing) => {}
            Err(_) => return,
        }
    }

    let _ = dispatcher.finish();
});

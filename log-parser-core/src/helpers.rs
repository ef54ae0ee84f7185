// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! General support code for the log parser.

use std::any::Any;

/// Utilities for pluralizing various words based on count.
pub mod plural {
    /// Returns "test" if `count` is 1, otherwise "tests".
    pub fn tests_str(count: usize) -> &'static str {
        if count == 1 { "test" } else { "tests" }
    }

    /// Returns "line" if `count` is 1, otherwise "lines".
    pub fn lines_str(count: u64) -> &'static str {
        if count == 1 { "line" } else { "lines" }
    }

    /// Returns "log file" if `count` is 1, otherwise "log files".
    pub fn log_files_str(count: usize) -> &'static str {
        if count == 1 { "log file" } else { "log files" }
    }

    /// Returns "error" if `count` is 1, otherwise "errors".
    pub fn errors_str(count: usize) -> &'static str {
        if count == 1 { "error" } else { "errors" }
    }
}

/// Extracts a string message from a panic payload.
pub(crate) fn panic_payload_to_string(payload: Box<dyn Any + Send + 'static>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "(unknown panic payload)".to_owned()
    }
}

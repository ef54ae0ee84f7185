// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Splits the interleaved output of `go test -v` (as produced by terratest suites) into one log
//! file per test, plus a JUnit XML report.
//!
//! The work is done by [`log_parser_core`]; this crate parses arguments, sets up logging and maps
//! failures to exit codes.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::{Color, OutputContext};

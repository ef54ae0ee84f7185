// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for the terratest log parser.
//!
//! The parser consumes the interleaved output of `go test -v` (typically from a terratest run with
//! many parallel tests), splits it into one log file per test, and summarizes the run as a JUnit
//! report.
//!
//! The basic flow is:
//!
//! 1. [`demux::DemuxRunner`] reads the input one line at a time.
//! 2. [`classify::classify`] tags each line with the test it belongs to, if any.
//! 3. [`tracker::OutcomeTracker`] folds the tags into per-test outcomes.
//! 4. [`registry::WriterRegistry`] fans lines out to one background writer per test.
//! 5. Once every writer has closed its file, [`reporter::Report`] writes `report.xml`.

pub mod classify;
pub mod config;
pub mod demux;
pub mod errors;
pub mod fs;
pub mod helpers;
pub mod input;
pub mod registry;
pub mod reporter;
mod time;
pub mod tracker;

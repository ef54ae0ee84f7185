// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test fixtures shared by the log parser's test suites.

pub mod models;
pub mod scenarios;

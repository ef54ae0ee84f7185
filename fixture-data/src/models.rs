// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data models for fixture information.

use iddqd::{IdOrdItem, id_upcast};

/// A literal test log along with what parsing it should produce.
#[derive(Clone, Debug)]
pub struct ScenarioFixture {
    pub name: &'static str,
    pub input: &'static str,
    pub logs: Vec<LogFixture>,
    pub tests: Vec<TestCaseFixture>,
    pub suite_name: Option<&'static str>,
}

impl ScenarioFixture {
    pub fn new(name: &'static str, input: &'static str) -> Self {
        Self {
            name,
            input,
            logs: Vec::new(),
            tests: Vec::new(),
            suite_name: None,
        }
    }

    /// Expects a log file for `sink` holding exactly `lines`.
    pub fn with_log(mut self, sink: &'static str, lines: &'static [&'static str]) -> Self {
        self.logs.push(LogFixture { sink, lines });
        self
    }

    /// Expects a test case in the report, in the order these calls are made.
    pub fn with_test(mut self, name: &'static str, status: TestCaseFixtureStatus) -> Self {
        self.tests.push(TestCaseFixture { name, status });
        self
    }

    /// Expects the suite to be named after a package seen in the input.
    pub fn with_suite_name(mut self, suite_name: &'static str) -> Self {
        self.suite_name = Some(suite_name);
        self
    }

    /// Returns the input's lines, without their trailing newlines.
    pub fn input_lines(&self) -> impl Iterator<Item = &'static str> {
        self.input.lines()
    }

    /// Returns true if a `_raw` log is expected.
    pub fn expects_raw_log(&self) -> bool {
        self.logs.iter().any(|log| log.sink == "_raw")
    }
}

impl IdOrdItem for ScenarioFixture {
    type Key<'a> = &'static str;
    fn key(&self) -> Self::Key<'_> {
        self.name
    }
    id_upcast!();
}

/// The expected contents of one log file.
#[derive(Copy, Clone, Debug)]
pub struct LogFixture {
    pub sink: &'static str,
    pub lines: &'static [&'static str],
}

impl LogFixture {
    /// The file contents: every line followed by a newline.
    pub fn contents(&self) -> String {
        self.lines.iter().map(|line| format!("{line}\n")).collect()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TestCaseFixture {
    pub name: &'static str,
    pub status: TestCaseFixtureStatus,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TestCaseFixtureStatus {
    Pass,
    Fail,
    Skip,
    Panic,
    Incomplete,
}

impl TestCaseFixtureStatus {
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Fail | Self::Panic | Self::Incomplete)
    }

    /// The `message` attribute of the `<failure>` element, if any.
    pub fn failure_message(self) -> Option<&'static str> {
        match self {
            Self::Pass | Self::Skip => None,
            Self::Fail => Some("Failed"),
            Self::Panic => Some("runtime panic"),
            Self::Incomplete => Some("did not complete"),
        }
    }
}

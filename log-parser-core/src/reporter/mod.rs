// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JUnit reports built from tracked test outcomes.
//!
//! A [`Report`] is derived exactly once, after every log writer has closed its file. It holds one
//! test case per tracked test, in the order tests were first seen.

mod serialize;

use crate::{
    classify::TestName,
    errors::ReportWriteError,
    tracker::{FailureCause, TestRecord, TestState},
};
use bstr::ByteSlice;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, FixedOffset};
use std::{
    fs::File,
    io::{self, BufWriter, Write},
    time::Duration,
};

/// The file name of the JUnit report within the output directory.
pub const REPORT_FILE_NAME: &str = "report.xml";

/// A JUnit report for a single demux run.
#[derive(Clone, Debug)]
pub struct Report {
    suite_name: String,
    timestamp: DateTime<FixedOffset>,
    duration: Duration,
    tests: Vec<ReportedTest>,
}

impl Report {
    /// Builds a report from the tracker's records.
    ///
    /// The suite's duration is the larger of `wall_clock` and the latest point at which any test
    /// finished. On a tie the wall-clock value is used.
    pub fn from_records(
        suite_name: impl Into<String>,
        timestamp: DateTime<FixedOffset>,
        wall_clock: Duration,
        records: Vec<TestRecord>,
    ) -> Self {
        let latest_finish = records.iter().filter_map(TestRecord::finished_at).max();
        let duration = match latest_finish {
            Some(latest_finish) if latest_finish > wall_clock => latest_finish,
            _ => wall_clock,
        };

        let tests = records.into_iter().map(ReportedTest::from_record).collect();
        Self {
            suite_name: suite_name.into(),
            timestamp,
            duration,
            tests,
        }
    }

    /// Returns the name of the test suite.
    pub fn suite_name(&self) -> &str {
        &self.suite_name
    }

    /// Returns the time the run started.
    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    /// Returns the suite's duration.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Returns the test cases, in the order they were first seen.
    pub fn tests(&self) -> &[ReportedTest] {
        &self.tests
    }

    /// Returns counts of each outcome.
    pub fn counts(&self) -> ReportCounts {
        let mut counts = ReportCounts {
            tests: self.tests.len(),
            ..ReportCounts::default()
        };
        for test in &self.tests {
            match test.outcome {
                ReportedOutcome::Passed => counts.passed += 1,
                ReportedOutcome::Skipped => counts.skipped += 1,
                ReportedOutcome::Failed(FailureKind::DidNotComplete) => {
                    counts.failed += 1;
                    counts.incomplete += 1;
                }
                ReportedOutcome::Failed(_) => counts.failed += 1,
            }
        }
        counts
    }

    /// Serializes the report as XML to `writer`.
    pub fn serialize(&self, writer: impl io::Write) -> quick_xml::Result<()> {
        serialize::serialize_report(self, writer)
    }

    /// Serializes the report to a string.
    pub fn to_xml_string(&self) -> quick_xml::Result<String> {
        let mut buf = Vec::new();
        self.serialize(&mut buf)?;
        // Every string that goes into the report is UTF-8, so this conversion is lossless.
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Writes the report to `report.xml` within `dir`, returning the path written to.
    pub fn write_to_dir(&self, dir: &Utf8Path) -> Result<Utf8PathBuf, ReportWriteError> {
        let path = dir.join(REPORT_FILE_NAME);
        let file = File::create(&path).map_err(|error| ReportWriteError::Create {
            path: path.clone(),
            error,
        })?;

        let mut writer = BufWriter::new(file);
        self.serialize(&mut writer)
            .map_err(|error| ReportWriteError::Serialize {
                path: path.clone(),
                error,
            })?;
        writer.flush().map_err(|error| ReportWriteError::Flush {
            path: path.clone(),
            error,
        })?;

        Ok(path)
    }
}

/// Counts of each outcome in a [`Report`].
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ReportCounts {
    /// The total number of tests.
    pub tests: usize,

    /// Tests that passed.
    pub passed: usize,

    /// Tests that failed, including incomplete tests.
    pub failed: usize,

    /// Tests that were skipped.
    pub skipped: usize,

    /// Tests that never reported a status.
    pub incomplete: usize,
}

/// A single test case in a [`Report`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReportedTest {
    /// The test's name.
    pub name: TestName,

    /// The test's outcome.
    pub outcome: ReportedOutcome,

    /// The duration the test reported, or zero.
    pub time: Duration,

    /// The test's captured output, one line per line of input.
    ///
    /// Terminal escape codes and characters that can't appear in XML are removed.
    pub output: String,
}

impl ReportedTest {
    fn from_record(record: TestRecord) -> Self {
        let TestRecord {
            name,
            state,
            started_at: _,
            elapsed,
            captured_output,
        } = record;

        let outcome = match state {
            TestState::Passed => ReportedOutcome::Passed,
            TestState::Skipped => ReportedOutcome::Skipped,
            TestState::Failed(FailureCause::StatusMarker) => {
                ReportedOutcome::Failed(FailureKind::StatusMarker)
            }
            TestState::Failed(FailureCause::RuntimePanic) => {
                ReportedOutcome::Failed(FailureKind::RuntimePanic)
            }
            // Records are only created in the running state, so unseen can't happen here.
            TestState::Running | TestState::Unseen => {
                ReportedOutcome::Failed(FailureKind::DidNotComplete)
            }
        };

        Self {
            name,
            outcome,
            time: elapsed.unwrap_or_default(),
            output: clean_output(&captured_output),
        }
    }
}

/// The outcome of a [`ReportedTest`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ReportedOutcome {
    /// The test passed.
    Passed,

    /// The test failed.
    Failed(FailureKind),

    /// The test was skipped.
    Skipped,
}

/// How a test failed.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FailureKind {
    /// The test reported `--- FAIL`.
    StatusMarker,

    /// The test binary panicked while the test was running.
    RuntimePanic,

    /// The input ended before the test reported a status.
    DidNotComplete,
}

impl FailureKind {
    /// The `message` attribute written for this kind of failure.
    pub fn message(self) -> &'static str {
        match self {
            Self::StatusMarker => "Failed",
            Self::RuntimePanic => "runtime panic",
            Self::DidNotComplete => "did not complete",
        }
    }
}

fn clean_output(lines: &[Vec<u8>]) -> String {
    let joined = bstr::join(b"\n", lines);
    let stripped = strip_ansi_escapes::strip(&joined);
    stripped.to_str_lossy().replace(is_invalid_xml_char, "")
}

// XML 1.0 allows tab, newline and carriage return but no other C0 controls, and neither U+FFFE
// nor U+FFFF.
fn is_invalid_xml_char(c: char) -> bool {
    matches!(
        c,
        '\x00'..='\x08' | '\x0b' | '\x0c' | '\x0e'..='\x1f' | '\u{fffe}' | '\u{ffff}'
    )
}

// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-test outcome tracking.
//!
//! The tracker is a single-threaded state machine driven by the demultiplexer. It folds classified
//! lines into one [`TestRecord`] per test, which the reporter turns into JUnit test cases.

use crate::classify::{TestName, TestStatus};
use indexmap::IndexMap;
use std::time::Duration;
use tracing::debug;

/// The state of a single test.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TestState {
    /// The test has never been mentioned.
    Unseen,

    /// The test started (or was implied to have started) but hasn't reported a status yet.
    Running,

    /// The test passed.
    Passed,

    /// The test failed.
    Failed(FailureCause),

    /// The test was skipped.
    Skipped,
}

impl TestState {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Passed | Self::Failed(_) | Self::Skipped)
    }

    fn from_status(status: TestStatus) -> Self {
        match status {
            TestStatus::Pass => Self::Passed,
            TestStatus::Fail => Self::Failed(FailureCause::StatusMarker),
            TestStatus::Skip => Self::Skipped,
        }
    }
}

/// Why a test was marked as failed.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FailureCause {
    /// The test reported `--- FAIL`.
    StatusMarker,

    /// The test binary panicked while the test was running.
    RuntimePanic,
}

/// Everything known about a single test.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestRecord {
    /// The test's name.
    pub name: TestName,

    /// The current state. Never [`TestState::Unseen`] for a record that exists.
    pub state: TestState,

    /// The offset from the start of the run at which the test was first seen running.
    pub started_at: Option<Duration>,

    /// The duration reported by the test's status line.
    pub elapsed: Option<Duration>,

    /// Lines attributed to this test, in arrival order.
    pub captured_output: Vec<Vec<u8>>,
}

impl TestRecord {
    fn new(name: TestName, started_at: Duration) -> Self {
        Self {
            name,
            state: TestState::Running,
            started_at: Some(started_at),
            elapsed: None,
            captured_output: Vec::new(),
        }
    }

    /// Returns the offset at which the test finished, if it reported a duration.
    pub fn finished_at(&self) -> Option<Duration> {
        Some(self.started_at? + self.elapsed?)
    }
}

/// Folds classified lines into per-test records.
#[derive(Debug, Default)]
pub struct OutcomeTracker {
    records: IndexMap<TestName, TestRecord>,
}

impl OutcomeTracker {
    /// Creates a new, empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that a test started at the given run offset.
    ///
    /// Does nothing if the test is already running or has finished.
    pub fn observe_start(&mut self, name: &TestName, at: Duration) {
        if !self.records.contains_key(name) {
            self.records
                .insert(name.clone(), TestRecord::new(name.clone(), at));
        }
    }

    /// Records a test's final status.
    ///
    /// A test that reports a status without ever having started is treated as having started
    /// `duration` before `at`. Only the first status for a test is recorded.
    pub fn observe_status(
        &mut self,
        name: &TestName,
        status: TestStatus,
        duration: Duration,
        at: Duration,
    ) {
        let record = self
            .records
            .entry(name.clone())
            .or_insert_with(|| TestRecord::new(name.clone(), at.saturating_sub(duration)));

        if record.state.is_terminal() {
            debug!(
                test_name = %name,
                %status,
                "ignoring status for test that already finished ({:?})",
                record.state,
            );
            return;
        }

        record.state = TestState::from_status(status);
        record.elapsed = Some(duration);
    }

    /// Appends a line to a known test's captured output.
    ///
    /// Lines for tests that have never been seen are dropped.
    pub fn observe_payload(&mut self, name: &TestName, payload: &[u8]) {
        if let Some(record) = self.records.get_mut(name) {
            record.captured_output.push(payload.to_vec());
        }
    }

    /// Fails every running test with a runtime panic, appending the panic line to each.
    pub fn observe_panic(&mut self, payload: &[u8]) {
        for record in self.records.values_mut() {
            if record.state == TestState::Running {
                record.captured_output.push(payload.to_vec());
                record.state = TestState::Failed(FailureCause::RuntimePanic);
            }
        }
    }

    /// Returns the state of a test, [`TestState::Unseen`] if it's unknown.
    pub fn state(&self, name: &(impl AsRef<[u8]> + ?Sized)) -> TestState {
        self.records
            .get(name.as_ref())
            .map_or(TestState::Unseen, |record| record.state)
    }

    /// Returns true if the tracker has a record for this test.
    pub fn is_known(&self, name: &(impl AsRef<[u8]> + ?Sized)) -> bool {
        self.records.contains_key(name.as_ref())
    }

    /// Returns the names of all running tests, in order of first sighting.
    pub fn running_names(&self) -> impl Iterator<Item = &TestName> {
        self.records
            .values()
            .filter(|record| record.state == TestState::Running)
            .map(|record| &record.name)
    }

    /// Returns the number of tests seen so far.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no tests have been seen.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consumes the tracker, returning every record in order of first sighting.
    pub fn snapshot(self) -> Vec<TestRecord> {
        self.records.into_values().collect()
    }
}

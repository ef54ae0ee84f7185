// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The top-level pump that splits a test log into per-test files.
//!
//! The pump is the only producer: it reads the input one line at a time, classifies it, updates
//! the [`OutcomeTracker`], and hands the line to the [`WriterRegistry`]. Once the input ends, every
//! writer is shut down and only then is the report built and written.

use crate::{
    classify::{LineKind, TestName, classify},
    config::{ParserConfig, UntaggedLines},
    errors::{
        DemuxBuildError, DemuxError, DisplayErrorChain, InputOpenError, InputReadError,
        ReportWriteError, SinkError,
    },
    fs::ensure_dir,
    helpers::plural,
    input::InputSource,
    registry::{RAW_SINK_NAME, RegistryShutdown, SinkSummary, WriterRegistry},
    reporter::{Report, ReportCounts},
    time::{StopwatchStart, stopwatch},
    tracker::{OutcomeTracker, TestState},
};
use camino::{Utf8Path, Utf8PathBuf};
use debug_ignore::DebugIgnore;
use std::time::Duration;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    runtime::Runtime,
};
use tracing::{debug, error, info, trace, warn};

/// Builds a [`DemuxRunner`].
#[derive(Debug)]
pub struct DemuxRunnerBuilder {
    output_dir: Utf8PathBuf,
    config: ParserConfig,
}

impl DemuxRunnerBuilder {
    /// Creates a new builder writing to `output_dir`.
    ///
    /// `output_dir` is used as given; callers that accept relative paths should make them absolute
    /// first.
    pub fn new(output_dir: impl Into<Utf8PathBuf>, config: ParserConfig) -> Self {
        Self {
            output_dir: output_dir.into(),
            config,
        }
    }

    /// Creates the runner, along with the runtime its writers run on.
    pub fn build(self) -> Result<DemuxRunner, DemuxBuildError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("log-parser-worker")
            .build()
            .map_err(DemuxBuildError::TokioRuntimeCreate)?;

        Ok(DemuxRunner {
            output_dir: self.output_dir,
            config: self.config,
            runtime,
        })
    }
}

/// Splits a test log into per-test files and a JUnit report.
///
/// Created using [`DemuxRunnerBuilder::build`].
#[derive(Debug)]
pub struct DemuxRunner {
    output_dir: Utf8PathBuf,
    config: ParserConfig,
    runtime: Runtime,
}

impl DemuxRunner {
    /// Returns the output directory.
    pub fn output_dir(&self) -> &Utf8Path {
        &self.output_dir
    }

    /// Opens `source` for reading within this runner's runtime.
    pub fn open_input(
        &self,
        source: &InputSource,
    ) -> Result<Box<dyn AsyncRead + Send + Unpin>, InputOpenError> {
        let _guard = self.runtime.enter();
        source.open()
    }

    /// Reads `input` to the end, demultiplexing it into the output directory.
    ///
    /// Only a failure to create the output directory is returned as an error. Everything else
    /// (unwritable log files, a failed read partway through, an unwritable report) is logged and
    /// recorded in the returned [`RunSummary`].
    pub fn execute(self, input: impl AsyncRead + Unpin) -> Result<RunSummary, DemuxError> {
        let Self {
            output_dir,
            config,
            runtime,
        } = self;
        let stopwatch = stopwatch();

        let drained = runtime.block_on(async {
            ensure_dir(&output_dir)
                .await
                .map_err(|error| DemuxError::OutputDir {
                    path: output_dir.clone(),
                    error,
                })?;
            info!("writing per-test logs to `{output_dir}`");

            let mut pump = Pump::new(&output_dir, &config, &stopwatch);
            let input_error = pump.run(input).await;
            let Pump {
                tracker,
                registry,
                package,
                lines_read,
                ..
            } = pump;

            // Every writer must be closed before the report is built.
            let shutdown = registry.shutdown().await;
            Ok::<_, DemuxError>(Drained {
                tracker: DebugIgnore(tracker),
                shutdown,
                package,
                lines_read,
                input_error,
            })
        })?;

        // Reading stdin happens on a blocking thread which may outlive an input error.
        runtime.shutdown_background();

        let Drained {
            tracker,
            shutdown,
            package,
            lines_read,
            input_error,
        } = drained;
        let snapshot = stopwatch.snapshot();

        let suite_name = package.unwrap_or_else(|| config.suite_name().to_owned());
        let report = Report::from_records(
            suite_name.clone(),
            snapshot.start_time.fixed_offset(),
            snapshot.duration,
            tracker.0.snapshot(),
        );
        let counts = report.counts();
        let report = report.write_to_dir(&output_dir);
        if let Err(error) = &report {
            error!("{}", DisplayErrorChain::new(error));
        }

        let RegistryShutdown { sinks, errors } = shutdown;
        info!(
            "read {lines_read} {} from the test log: {} {}, {} {}",
            plural::lines_str(lines_read),
            counts.tests,
            plural::tests_str(counts.tests),
            sinks.len(),
            plural::log_files_str(sinks.len()),
        );

        Ok(RunSummary {
            lines_read,
            suite_name,
            counts,
            sinks,
            sink_errors: errors,
            input_error,
            report,
            duration: snapshot.duration,
        })
    }
}

/// The results of a [`DemuxRunner::execute`] call.
#[derive(Debug)]
pub struct RunSummary {
    /// The number of lines read from the input.
    pub lines_read: u64,

    /// The name of the JUnit test suite.
    pub suite_name: String,

    /// Counts of each test outcome.
    pub counts: ReportCounts,

    /// Every log writer that exited normally, in creation order.
    pub sinks: Vec<SinkSummary>,

    /// Failures reported by log writers.
    pub sink_errors: Vec<SinkError>,

    /// Set if reading the input failed before the end was reached.
    pub input_error: Option<InputReadError>,

    /// The path the report was written to, or the reason it couldn't be written.
    pub report: Result<Utf8PathBuf, ReportWriteError>,

    /// How long the run took.
    pub duration: Duration,
}

impl RunSummary {
    /// Returns true if anything went wrong while writing output or reading input.
    ///
    /// Test failures don't count.
    pub fn has_errors(&self) -> bool {
        !self.sink_errors.is_empty() || self.input_error.is_some() || self.report.is_err()
    }
}

/// One line of input, without its trailing newline.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawLine {
    /// The line's bytes, exactly as read.
    pub payload: Vec<u8>,

    /// The 1-based position of the line in the input.
    pub line_no: u64,
}

#[derive(Debug)]
struct Drained {
    // Holds the captured output of every test.
    tracker: DebugIgnore<OutcomeTracker>,
    shutdown: RegistryShutdown,
    package: Option<String>,
    lines_read: u64,
    input_error: Option<InputReadError>,
}

struct Pump<'a> {
    config: &'a ParserConfig,
    stopwatch: &'a StopwatchStart,
    tracker: OutcomeTracker,
    registry: WriterRegistry,
    raw_sink: TestName,
    // The most recent test named by a line, used for UntaggedLines::LastTest.
    last_named: Option<TestName>,
    package: Option<String>,
    lines_read: u64,
}

impl<'a> Pump<'a> {
    fn new(output_dir: &Utf8Path, config: &'a ParserConfig, stopwatch: &'a StopwatchStart) -> Self {
        Self {
            config,
            stopwatch,
            tracker: OutcomeTracker::new(),
            registry: WriterRegistry::new(output_dir, config.channel_capacity()),
            raw_sink: TestName::new(RAW_SINK_NAME),
            last_named: None,
            package: None,
            lines_read: 0,
        }
    }

    async fn run(&mut self, input: impl AsyncRead + Unpin) -> Option<InputReadError> {
        let mut reader = BufReader::new(input);
        let mut buf = Vec::new();
        loop {
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => {
                    debug!(lines_read = self.lines_read, "reached end of input");
                    return None;
                }
                Ok(_) => {
                    if buf.last() == Some(&b'\n') {
                        buf.pop();
                    }
                    self.lines_read += 1;
                    let line = RawLine {
                        payload: std::mem::take(&mut buf),
                        line_no: self.lines_read,
                    };
                    self.process_line(line).await;
                }
                Err(error) => {
                    let error = InputReadError::new(self.lines_read, error);
                    error!("{}", DisplayErrorChain::new(&error));
                    return Some(error);
                }
            }
        }
    }

    async fn process_line(&mut self, line: RawLine) {
        let RawLine { payload, line_no } = line;
        let classified = classify(&payload);
        let at = self.stopwatch.elapsed();
        trace!(
            line_no,
            kind = ?classified.kind,
            test_name = ?classified.test_name,
            "classified line",
        );

        match (&classified.kind, &classified.test_name) {
            (LineKind::TestStart(_), Some(name)) => self.tracker.observe_start(name, at),
            (LineKind::TestStatus { status, duration }, Some(name)) => {
                self.tracker.observe_status(name, *status, *duration, at)
            }
            (LineKind::TestOutput, Some(name)) => {
                // Output for a test that was never announced still gets a log file, so it must
                // also get a test case.
                if !self.tracker.is_known(name) {
                    self.tracker.observe_start(name, at);
                }
            }
            (LineKind::RuntimePanic, _) => {
                self.fan_out_panic(&payload).await;
                return;
            }
            (LineKind::PackageSummary { package }, _) => {
                if self.package.is_none() {
                    debug!(%package, "using package name as suite name");
                    self.package = Some(package.clone());
                }
            }
            _ => {}
        }

        let sink = match classified.test_name {
            Some(name) => {
                self.last_named = Some(name.clone());
                Some(name)
            }
            None => self.untagged_sink(),
        };

        match sink {
            Some(name) => {
                self.tracker.observe_payload(&name, &payload);
                self.registry.send_line(&name, payload).await;
            }
            None => {
                self.registry.send_line(&self.raw_sink, payload).await;
            }
        }
    }

    // A panic ends the test binary, so every test still running is failed and gets the line.
    async fn fan_out_panic(&mut self, payload: &[u8]) {
        let running: Vec<TestName> = self.tracker.running_names().cloned().collect();
        self.tracker.observe_panic(payload);

        if running.is_empty() {
            warn!("test binary panicked with no tests running");
            self.registry
                .send_line(&self.raw_sink, payload.to_vec())
                .await;
            return;
        }

        for name in &running {
            self.registry.send_line(name, payload.to_vec()).await;
        }
    }

    fn untagged_sink(&self) -> Option<TestName> {
        match self.config.untagged_lines() {
            UntaggedLines::Raw => None,
            UntaggedLines::LastTest => self
                .last_named
                .as_ref()
                .filter(|name| self.tracker.state(name) == TestState::Running)
                .cloned(),
        }
    }
}

// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ExpectedError, LogParserExitCode,
    output::{OutputContext, OutputOpts, clap_styles},
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use log_parser_core::{
    config::ParserConfig,
    demux::{DemuxRunnerBuilder, RunSummary},
    helpers::plural,
    input::InputSource,
};
use tracing::{info, warn};

/// Splits the interleaved output of `go test -v` into per-test log files and a JUnit report.
///
/// Each test's lines are written to `<outputdir>/<TestName>.log` (sub-tests nest into
/// directories) and a `report.xml` summarizing every test is written once the log ends. Lines
/// that can't be attributed to a test go to `_raw.log`.
#[derive(Debug, Parser)]
#[command(version, styles = clap_styles::style())]
pub struct LogParserApp {
    /// Test log to read [default: standard input]
    #[arg(long, value_name = "PATH")]
    testlog: Option<Utf8PathBuf>,

    /// Directory to write per-test logs and the report to
    #[arg(long, value_name = "DIR", default_value = "out")]
    outputdir: Utf8PathBuf,

    /// Config file layered over the built-in defaults
    #[arg(long, value_name = "PATH")]
    config: Option<Utf8PathBuf>,

    /// JUnit suite name, used when the log doesn't name its package
    #[arg(long, value_name = "NAME")]
    suite_name: Option<String>,

    #[command(flatten)]
    output: OutputOpts,
}

impl LogParserApp {
    /// Initializes logging and returns the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app, returning the process exit code.
    ///
    /// Test failures and problems writing individual outputs are logged but don't affect the exit
    /// code; only a failure to set up the run is returned as an error.
    pub fn exec(self) -> Result<i32, ExpectedError> {
        let mut config = ParserConfig::from_sources(self.config.as_deref())?;
        if let Some(suite_name) = self.suite_name {
            config.set_suite_name(suite_name);
        }

        let output_dir = make_absolute(&self.outputdir)?;
        let runner = DemuxRunnerBuilder::new(output_dir, config).build()?;

        let source = InputSource::from_path(self.testlog);
        let input = runner.open_input(&source)?;
        info!("reading test log from {source}");

        let summary = runner.execute(input)?;
        log_summary(&summary);

        Ok(LogParserExitCode::OK)
    }
}

fn make_absolute(path: &Utf8Path) -> Result<Utf8PathBuf, ExpectedError> {
    let absolute = std::path::absolute(path).map_err(|err| ExpectedError::OutputDirResolve {
        path: path.to_owned(),
        err,
    })?;
    Utf8PathBuf::try_from(absolute).map_err(|err| ExpectedError::OutputDirNotUtf8 { err })
}

// Individual failures were already logged by the runner as they happened.
fn log_summary(summary: &RunSummary) {
    if summary.input_error.is_some() {
        warn!("the test log could not be read to the end, so the report may be incomplete");
    }
    if !summary.sink_errors.is_empty() {
        warn!(
            "{} {} occurred while writing per-test logs",
            summary.sink_errors.len(),
            plural::errors_str(summary.sink_errors.len()),
        );
    }
    if let Ok(path) = &summary.report {
        let counts = &summary.counts;
        info!(
            "wrote report for suite `{}` to `{path}`: {} passed, {} failed, {} skipped",
            summary.suite_name, counts.passed, counts.failed, counts.skipped,
        );
    }
}

// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::StderrStyles;
use camino::{FromPathBufError, Utf8PathBuf};
use log_parser_core::errors::{ConfigParseError, DemuxBuildError, DemuxError, InputOpenError};
use owo_colors::OwoColorize;
use std::error::Error;
use thiserror::Error;
use tracing::error;

/// Documented exit codes for `terratest-log-parser`.
///
/// Test failures recorded in the log never affect the exit code. Unknown/unexpected failures
/// always result in exit code 1.
pub enum LogParserExitCode {}

impl LogParserExitCode {
    /// The log was read to the end and demultiplexed.
    pub const OK: i32 = 0;

    /// The input, output directory, configuration or runtime could not be set up.
    pub const SETUP_ERROR: i32 = 96;
}

// The #[error()] strings are placeholders: errors are printed with display_to_stderr, which
// colorizes them.

/// A failure that stops the parser before it can read the log.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("output directory could not be resolved")]
    OutputDirResolve {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("output directory is not valid UTF-8")]
    OutputDirNotUtf8 {
        #[source]
        err: FromPathBufError,
    },
    #[error("runner build error")]
    DemuxBuildError {
        #[from]
        err: DemuxBuildError,
    },
    #[error("input open error")]
    InputOpenError {
        #[from]
        err: InputOpenError,
    },
    #[error("demux error")]
    DemuxError {
        #[from]
        err: DemuxError,
    },
}

impl ExpectedError {
    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::ConfigParseError { .. }
            | Self::OutputDirResolve { .. }
            | Self::OutputDirNotUtf8 { .. }
            | Self::DemuxBuildError { .. }
            | Self::InputOpenError { .. }
            | Self::DemuxError { .. } => LogParserExitCode::SETUP_ERROR,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error: Option<&(dyn Error + 'static)> = match self {
            Self::ConfigParseError { err } => {
                error!(
                    "failed to parse config file `{}`",
                    err.config_file().style(styles.bold)
                );
                err.source()
            }
            Self::OutputDirResolve { path, err } => {
                error!(
                    "failed to resolve output directory `{}`",
                    path.style(styles.bold)
                );
                Some(err as &dyn Error)
            }
            Self::OutputDirNotUtf8 { err } => {
                error!(
                    "output directory `{}` is not valid UTF-8",
                    err.as_path().display().style(styles.bold)
                );
                None
            }
            Self::DemuxBuildError { err } => {
                error!("failed to set up the log parser");
                Some(err as &dyn Error)
            }
            Self::InputOpenError { err } => {
                error!(
                    "failed to open test log `{}`",
                    err.path().style(styles.bold)
                );
                err.source()
            }
            Self::DemuxError { err } => {
                error!("{err}");
                err.source()
            }
        };

        while let Some(err) = next_error {
            error!(target: crate::output::NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}

// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by the log parser.

use crate::classify::TestName;
use camino::Utf8PathBuf;
use config::ConfigError;
use std::{error, fmt, io};
use thiserror::Error;

/// An error that occurred while parsing the config.
#[derive(Debug, Error)]
#[error("failed to parse log parser config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    err: ConfigError,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, err: ConfigError) -> Self {
        Self {
            config_file: config_file.into(),
            err,
        }
    }

    /// Returns the config file for this error.
    pub fn config_file(&self) -> &Utf8PathBuf {
        &self.config_file
    }
}

/// An error that occurred while building a [`DemuxRunner`](crate::demux::DemuxRunner).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DemuxBuildError {
    /// An error occurred while creating the Tokio runtime.
    #[error("error creating Tokio runtime")]
    TokioRuntimeCreate(#[source] io::Error),
}

/// A fatal error that stopped a demux run before any input was read.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DemuxError {
    /// The output directory could not be created.
    #[error("error creating output directory `{path}`")]
    OutputDir {
        /// The directory that could not be created.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },
}

/// An error that occurred while opening the input stream.
#[derive(Debug, Error)]
#[error("error opening test log `{path}`")]
pub struct InputOpenError {
    path: Utf8PathBuf,
    #[source]
    error: io::Error,
}

impl InputOpenError {
    pub(crate) fn new(path: impl Into<Utf8PathBuf>, error: io::Error) -> Self {
        Self {
            path: path.into(),
            error,
        }
    }

    /// Returns the path that could not be opened.
    pub fn path(&self) -> &Utf8PathBuf {
        &self.path
    }
}

/// An error that occurred while reading the input stream.
///
/// Lines read before the error are still demultiplexed and reported.
#[derive(Debug, Error)]
#[error("error reading input after line {lines_read}")]
pub struct InputReadError {
    lines_read: u64,
    #[source]
    error: io::Error,
}

impl InputReadError {
    pub(crate) fn new(lines_read: u64, error: io::Error) -> Self {
        Self { lines_read, error }
    }

    /// Returns the number of lines successfully read before the error.
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }
}

/// A failure recorded by a single sink's writer.
///
/// These are never fatal: the writer logs them and keeps draining its channel.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SinkError {
    /// The directory containing the sink's file could not be created.
    #[error("[{name}] error creating directory `{path}`")]
    CreateDir {
        /// The sink's name.
        name: TestName,

        /// The directory that could not be created.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The sink's file could not be created.
    #[error("[{name}] error creating log file `{path}`")]
    CreateFile {
        /// The sink's name.
        name: TestName,

        /// The file that could not be created.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// One or more lines could not be written.
    #[error("[{name}] {count} line(s) could not be written to `{path}`")]
    Write {
        /// The sink's name.
        name: TestName,

        /// The file being written to.
        path: Utf8PathBuf,

        /// The number of lines that failed.
        count: usize,

        /// The first error that occurred.
        #[source]
        first_error: io::Error,
    },

    /// Flushing or closing the file failed.
    #[error("[{name}] error closing log file `{path}`")]
    Close {
        /// The sink's name.
        name: TestName,

        /// The file being closed.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The writer task panicked.
    #[error("[{name}] log writer panicked: {message}")]
    WriterPanic {
        /// The sink's name.
        name: TestName,

        /// The panic message, if one could be extracted.
        message: String,
    },
}

impl SinkError {
    /// Returns the name of the sink this error belongs to.
    pub fn sink_name(&self) -> &TestName {
        match self {
            Self::CreateDir { name, .. }
            | Self::CreateFile { name, .. }
            | Self::Write { name, .. }
            | Self::Close { name, .. }
            | Self::WriterPanic { name, .. } => name,
        }
    }
}

/// An error that occurred while writing `report.xml`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportWriteError {
    /// The report file could not be created.
    #[error("error creating report file `{path}`")]
    Create {
        /// The path to the report.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The report could not be serialized or written.
    #[error("error writing report to `{path}`")]
    Serialize {
        /// The path to the report.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: quick_xml::Error,
    },

    /// The report could not be flushed to disk.
    #[error("error flushing report file `{path}`")]
    Flush {
        /// The path to the report.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },
}

/// Displays an error along with its chain of sources, one per line.
pub struct DisplayErrorChain<E> {
    error: E,
}

impl<E: error::Error> DisplayErrorChain<E> {
    /// Creates a new `DisplayErrorChain`.
    pub fn new(error: E) -> Self {
        Self { error }
    }
}

impl<E: error::Error> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        let mut source = self.error.source();
        while let Some(err) = source {
            write!(f, "\n  caused by: {err}")?;
            source = err.source();
        }

        Ok(())
    }
}

// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Where the test log is read from.

use crate::errors::InputOpenError;
use camino::Utf8PathBuf;
use std::fmt;
use tokio::io::AsyncRead;

/// The source of the interleaved test log.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InputSource {
    /// Standard input.
    Stdin,

    /// A file on disk.
    File(Utf8PathBuf),
}

impl InputSource {
    /// Creates an input source from an optional path, using stdin if no path is given.
    pub fn from_path(path: Option<Utf8PathBuf>) -> Self {
        match path {
            Some(path) => Self::File(path),
            None => Self::Stdin,
        }
    }

    /// Opens the source for reading.
    ///
    /// Must be called from within a Tokio runtime context.
    pub fn open(&self) -> Result<Box<dyn AsyncRead + Send + Unpin>, InputOpenError> {
        match self {
            Self::Stdin => Ok(Box::new(tokio::io::stdin())),
            Self::File(path) => {
                // Open synchronously so a missing file is reported before any output is created.
                let file =
                    std::fs::File::open(path).map_err(|error| InputOpenError::new(path, error))?;
                Ok(Box::new(tokio::fs::File::from_std(file)))
            }
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdin => write!(f, "standard input"),
            Self::File(path) => write!(f, "`{path}`"),
        }
    }
}

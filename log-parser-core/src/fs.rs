// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filesystem access for log writers.

use camino::{Utf8Path, Utf8PathBuf};
use std::io;
use tokio::{fs::File, io::AsyncWriteExt};

/// Creates `path` and all of its parents. Succeeds if the directory already exists.
pub async fn ensure_dir(path: &Utf8Path) -> io::Result<()> {
    tokio::fs::create_dir_all(path).await
}

/// A log file owned by a single writer.
///
/// Lines are flushed one at a time, so a write error is reported by the `write_line` call for
/// the line that failed.
#[derive(Debug)]
pub struct SinkFile {
    path: Utf8PathBuf,
    file: File,
    line_buf: Vec<u8>,
}

impl SinkFile {
    /// Creates (or truncates) the file at `path`.
    pub async fn create(path: impl Into<Utf8PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let file = File::create(&path).await?;
        Ok(Self {
            path,
            file,
            line_buf: Vec::new(),
        })
    }

    /// Returns the path to the file.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Writes `payload` followed by a single newline and flushes it, returning the number of
    /// bytes written.
    pub async fn write_line(&mut self, payload: &[u8]) -> io::Result<usize> {
        self.line_buf.clear();
        self.line_buf.extend_from_slice(payload);
        self.line_buf.push(b'\n');
        self.file.write_all(&self.line_buf).await?;
        self.file.flush().await?;
        Ok(self.line_buf.len())
    }

    /// Waits for any pending writes and closes the file.
    pub async fn close(mut self) -> io::Result<()> {
        self.file.shutdown().await
    }
}

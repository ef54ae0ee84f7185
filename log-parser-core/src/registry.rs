// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-test log writers.
//!
//! Every distinct test name gets its own bounded channel and a background task that drains the
//! channel into `<output-dir>/<name>.log`. The registry is owned by the single producer, so the
//! map itself needs no locking.

use crate::{
    classify::TestName,
    errors::{DisplayErrorChain, SinkError},
    fs::{SinkFile, ensure_dir},
    helpers::panic_payload_to_string,
};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use std::{io, num::NonZeroUsize};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, error, warn};

/// The name of the catch-all sink for lines that can't be attributed to a test.
pub const RAW_SINK_NAME: &str = "_raw";

/// The extension used for per-test log files.
pub const LOG_EXTENSION: &str = "log";

/// Maps test names to their log writers.
#[derive(Debug)]
pub struct WriterRegistry {
    output_dir: Utf8PathBuf,
    capacity: NonZeroUsize,
    sinks: IndexMap<TestName, Sink>,
}

#[derive(Debug)]
struct Sink {
    path: Utf8PathBuf,
    sender: mpsc::Sender<Vec<u8>>,
    drainer: JoinHandle<DrainerOutcome>,
}

impl WriterRegistry {
    /// Creates a new registry writing to `output_dir`.
    ///
    /// Writers are spawned onto the ambient Tokio runtime, so methods that create sinks must be
    /// called from within a runtime context.
    pub fn new(output_dir: impl Into<Utf8PathBuf>, capacity: NonZeroUsize) -> Self {
        Self {
            output_dir: output_dir.into(),
            capacity,
            sinks: IndexMap::new(),
        }
    }

    /// Returns the sender for `name`, spawning a writer for it if this is the first time the name
    /// has been seen.
    pub fn get_or_create(&mut self, name: &TestName) -> &mpsc::Sender<Vec<u8>> {
        let index = match self.sinks.get_index_of(name) {
            Some(index) => index,
            None => {
                let sink = Sink::spawn(&self.output_dir, name, self.capacity);
                self.sinks.insert_full(name.clone(), sink).0
            }
        };
        &self.sinks[index].sender
    }

    /// Sends a line to the writer for `name`, waiting for buffer space if necessary.
    pub async fn send_line(&mut self, name: &TestName, payload: Vec<u8>) {
        let sender = self.get_or_create(name);
        if sender.send(payload).await.is_err() {
            // The writer only goes away early if it panicked, which shutdown() reports.
            debug!(sink = %name, "log writer exited early, dropping line");
        }
    }

    /// Returns true if a sink exists for `name`.
    pub fn contains(&self, name: &(impl AsRef<[u8]> + ?Sized)) -> bool {
        self.sinks.contains_key(name.as_ref())
    }

    /// Returns the names of all sinks, in creation order.
    pub fn names(&self) -> impl Iterator<Item = &TestName> {
        self.sinks.keys()
    }

    /// Returns the number of sinks.
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Returns true if no sinks have been created.
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Closes every channel and waits for every writer to finish.
    ///
    /// Failures from individual writers are collected rather than returned early, so every file
    /// is closed by the time this returns.
    pub async fn shutdown(self) -> RegistryShutdown {
        let mut shutdown = RegistryShutdown::default();

        // Close every channel before waiting on any writer, so writers finish in parallel.
        let pending: Vec<_> = self
            .sinks
            .into_iter()
            .map(|(name, sink)| {
                let Sink {
                    path,
                    sender,
                    drainer,
                } = sink;
                std::mem::drop(sender);
                (name, path, drainer)
            })
            .collect();

        for (name, path, drainer) in pending {
            match drainer.await {
                Ok(outcome) => {
                    debug!(
                        sink = %name,
                        lines_written = outcome.lines_written,
                        lines_discarded = outcome.lines_discarded,
                        "log writer closed",
                    );
                    shutdown.errors.extend(outcome.errors);
                    shutdown.sinks.push(SinkSummary {
                        name,
                        path,
                        lines_written: outcome.lines_written,
                        lines_discarded: outcome.lines_discarded,
                    });
                }
                Err(join_error) => {
                    let message = if join_error.is_panic() {
                        panic_payload_to_string(join_error.into_panic())
                    } else {
                        "log writer was cancelled".to_owned()
                    };
                    let error = SinkError::WriterPanic { name, message };
                    error!("{}", DisplayErrorChain::new(&error));
                    shutdown.errors.push(error);
                }
            }
        }

        shutdown
    }
}

impl Sink {
    fn spawn(output_dir: &Utf8Path, name: &TestName, capacity: NonZeroUsize) -> Self {
        let path = sink_path(output_dir, name);
        let (sender, receiver) = mpsc::channel(capacity.get());
        debug!(sink = %name, %path, "spawning log writer");
        let drainer = tokio::spawn(run_drainer(name.clone(), path.clone(), receiver));
        Self {
            path,
            sender,
            drainer,
        }
    }
}

/// What [`WriterRegistry::shutdown`] found once every writer exited.
#[derive(Debug, Default)]
pub struct RegistryShutdown {
    /// Writers that exited normally, in creation order.
    pub sinks: Vec<SinkSummary>,

    /// Every failure reported by any writer.
    pub errors: Vec<SinkError>,
}

/// A summary of what a single writer did.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SinkSummary {
    /// The sink's name.
    pub name: TestName,

    /// The path to the sink's log file.
    pub path: Utf8PathBuf,

    /// The number of lines written to the file.
    pub lines_written: u64,

    /// The number of lines received but not written.
    pub lines_discarded: u64,
}

#[derive(Debug, Default)]
struct DrainerOutcome {
    lines_written: u64,
    lines_discarded: u64,
    errors: Vec<SinkError>,
}

async fn run_drainer(
    name: TestName,
    path: Utf8PathBuf,
    mut receiver: mpsc::Receiver<Vec<u8>>,
) -> DrainerOutcome {
    let mut outcome = DrainerOutcome::default();

    let mut file = match open_sink_file(&name, &path).await {
        Ok(file) => file,
        Err(error) => {
            error!("{}", DisplayErrorChain::new(&error));
            outcome.errors.push(error);

            // Keep receiving so the producer never blocks on this sink.
            while receiver.recv().await.is_some() {
                outcome.lines_discarded += 1;
            }
            return outcome;
        }
    };

    let mut failed_writes = 0;
    let mut first_error: Option<io::Error> = None;
    while let Some(line) = receiver.recv().await {
        match file.write_line(&line).await {
            Ok(_) => outcome.lines_written += 1,
            Err(error) => {
                if first_error.is_none() {
                    warn!(sink = %name, %path, "error writing line: {error}");
                } else {
                    debug!(sink = %name, %path, "error writing line: {error}");
                }
                failed_writes += 1;
                first_error.get_or_insert(error);
                outcome.lines_discarded += 1;
            }
        }
    }

    if let Some(first_error) = first_error {
        outcome.errors.push(SinkError::Write {
            name: name.clone(),
            path: path.clone(),
            count: failed_writes,
            first_error,
        });
    }

    if let Err(error) = file.close().await {
        let error = SinkError::Close { name, path, error };
        error!("{}", DisplayErrorChain::new(&error));
        outcome.errors.push(error);
    }

    outcome
}

async fn open_sink_file(name: &TestName, path: &Utf8Path) -> Result<SinkFile, SinkError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)
            .await
            .map_err(|error| SinkError::CreateDir {
                name: name.clone(),
                path: parent.to_owned(),
                error,
            })?;
    }

    SinkFile::create(path)
        .await
        .map_err(|error| SinkError::CreateFile {
            name: name.clone(),
            path: path.to_owned(),
            error,
        })
}

/// Returns the log file path for a sink.
///
/// `/` in a test name separates sub-tests and maps to a directory. Every other byte that can't be
/// used as-is in a path component is percent-encoded, so distinct names always get distinct
/// paths:
///
/// * `%`, `\`, NUL and invalid UTF-8 become `%XX`.
/// * `.` and `..` become `%2E` and `%2E%2E`.
/// * An empty component becomes `%2F`, which can't otherwise occur.
/// * A directory component ending in `.log` has that `.` encoded, so it never shadows a log file.
pub fn sink_path(output_dir: &Utf8Path, name: &TestName) -> Utf8PathBuf {
    let mut path = output_dir.to_owned();
    let mut components = name.as_bytes().split(|&b| b == b'/').peekable();
    while let Some(component) = components.next() {
        if components.peek().is_some() {
            path.push(escape_component(component, false));
        } else {
            let component = escape_component(component, true);
            path.push(format!("{component}.{LOG_EXTENSION}"));
        }
    }
    path
}

fn escape_component(component: &[u8], is_leaf: bool) -> String {
    match component {
        b"" => return "%2F".to_owned(),
        b"." => return "%2E".to_owned(),
        b".." => return "%2E%2E".to_owned(),
        _ => {}
    }

    let mut escaped = String::with_capacity(component.len());
    for chunk in component.utf8_chunks() {
        for c in chunk.valid().chars() {
            match c {
                '%' | '\\' | '\0' => escaped.push_str(&format!("%{:02X}", c as u32)),
                c => escaped.push(c),
            }
        }
        for byte in chunk.invalid() {
            escaped.push_str(&format!("%{byte:02X}"));
        }
    }

    let log_suffix = format!(".{LOG_EXTENSION}");
    if !is_leaf && escaped.ends_with(&log_suffix) {
        escaped.truncate(escaped.len() - log_suffix.len());
        escaped.push_str("%2E");
        escaped.push_str(LOG_EXTENSION);
    }
    escaped
}

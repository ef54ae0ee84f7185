// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classification of individual lines of `go test -v` output.
//!
//! Classification is a pure function of the line's bytes. All markers are ASCII, so matching is
//! done on bytes and payloads that aren't valid UTF-8 are classified (and later written) as-is.

use bstr::ByteSlice;
use regex::bytes::Regex;
use std::{
    borrow::{Borrow, Cow},
    fmt,
    sync::LazyLock,
    time::Duration,
};

// All regexes are compiled with Unicode disabled so that `\S` matches arbitrary bytes.
static STATUS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?-u)^\s*--- (PASS|FAIL|SKIP): (\S+) \(([0-9]+(?:\.[0-9]+)?)(?:s| seconds)\)\s*$",
    )
    .expect("status regex is valid")
});

static START_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u)^\s*=== (RUN|PAUSE|CONT)\s+(\S+)\s*$").expect("start regex is valid")
});

// The prefix written by terratest's logger: `TestName 2019-01-01T00:00:00Z file.go:12: message`.
static TERRATEST_LOG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?-u)^\s*(\S+) [0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}(?:\.[0-9]+)?(?:Z|[+-][0-9]{2}:[0-9]{2}) \S+:[0-9]+: ",
    )
    .expect("terratest log regex is valid")
});

static TAGGED_OUTPUT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u)^((?:Test|Benchmark|Example|Fuzz)[^\s:]*): ")
        .expect("tagged output regex is valid")
});

static PACKAGE_SUMMARY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u)^(?:ok|FAIL)\s+(\S+)\s+(?:[0-9]+(?:\.[0-9]+)?s|\(cached\))")
        .expect("package summary regex is valid")
});

static PANIC_PREFIX: &[u8] = b"panic:";

/// The name of a test, as reported by `go test`.
///
/// Sub-tests keep their fully qualified name, e.g. `TestGroup/SubCase`. Names are kept as the raw
/// bytes from the log, so two names that differ only in invalid UTF-8 stay distinct tests.
#[derive(Clone, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TestName(Vec<u8>);

impl TestName {
    /// Creates a new test name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into().into_bytes())
    }

    /// Creates a test name from raw bytes.
    pub fn from_bytes(name: &[u8]) -> Self {
        Self(name.to_vec())
    }

    /// Returns the name's bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the name as a string, replacing invalid UTF-8 with U+FFFD.
    pub fn to_str_lossy(&self) -> Cow<'_, str> {
        self.0.to_str_lossy()
    }
}

impl AsRef<[u8]> for TestName {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Borrow<[u8]> for TestName {
    fn borrow(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for TestName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TestName").field(&self.0.as_bstr()).finish()
    }
}

impl fmt::Display for TestName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_bstr())
    }
}

/// The final status a test reports for itself.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub enum TestStatus {
    /// `--- PASS`
    Pass,
    /// `--- FAIL`
    Fail,
    /// `--- SKIP`
    Skip,
}

impl TestStatus {
    fn from_marker(marker: &[u8]) -> Option<Self> {
        match marker {
            b"PASS" => Some(Self::Pass),
            b"FAIL" => Some(Self::Fail),
            b"SKIP" => Some(Self::Skip),
            _ => None,
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
            Self::Skip => write!(f, "SKIP"),
        }
    }
}

/// Which `===` marker announced a test.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StartMarker {
    /// `=== RUN`
    Run,
    /// `=== PAUSE`: a parallel test waiting for its turn.
    Pause,
    /// `=== CONT`: a paused test resuming.
    Cont,
}

impl StartMarker {
    fn from_marker(marker: &[u8]) -> Option<Self> {
        match marker {
            b"RUN" => Some(Self::Run),
            b"PAUSE" => Some(Self::Pause),
            b"CONT" => Some(Self::Cont),
            _ => None,
        }
    }
}

/// The kind of a classified line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LineKind {
    /// A test was announced.
    TestStart(StartMarker),

    /// A test reported its final status.
    TestStatus {
        /// The reported status.
        status: TestStatus,

        /// The duration reported by the runner.
        duration: Duration,
    },

    /// The test binary panicked. No test name is attached.
    RuntimePanic,

    /// Output prefixed with the name of the test that produced it.
    TestOutput,

    /// The per-package summary line `go test` prints at the end of a package.
    PackageSummary {
        /// The package import path.
        package: String,
    },

    /// Anything else.
    Plain,
}

/// A line of input along with what the classifier made of it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClassifiedLine<'a> {
    /// The original payload, without its trailing newline.
    pub payload: &'a [u8],

    /// The kind of line.
    pub kind: LineKind,

    /// The test this line belongs to, if one could be derived from the line alone.
    pub test_name: Option<TestName>,
}

impl ClassifiedLine<'_> {
    /// Returns the reported status, if this is a status line.
    pub fn status(&self) -> Option<TestStatus> {
        match &self.kind {
            LineKind::TestStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the reported duration, if this is a status line.
    pub fn duration(&self) -> Option<Duration> {
        match &self.kind {
            LineKind::TestStatus { duration, .. } => Some(*duration),
            _ => None,
        }
    }
}

/// Classifies a single line of output.
///
/// Never fails: a line that looks like a marker but doesn't parse (for example, a status line with
/// an out-of-range duration) is classified as [`LineKind::Plain`].
pub fn classify(payload: &[u8]) -> ClassifiedLine<'_> {
    let (kind, test_name) = classify_impl(payload).unwrap_or((LineKind::Plain, None));
    ClassifiedLine {
        payload,
        kind,
        test_name,
    }
}

fn classify_impl(payload: &[u8]) -> Option<(LineKind, Option<TestName>)> {
    // Status is checked first: it wins over a start marker if both match.
    if let Some(captures) = STATUS_REGEX.captures(payload) {
        let status = TestStatus::from_marker(&captures[1])?;
        let duration = parse_duration(&captures[3])?;
        let name = TestName::from_bytes(&captures[2]);
        return Some((LineKind::TestStatus { status, duration }, Some(name)));
    }

    if let Some(captures) = START_REGEX.captures(payload) {
        let marker = StartMarker::from_marker(&captures[1])?;
        let name = TestName::from_bytes(&captures[2]);
        return Some((LineKind::TestStart(marker), Some(name)));
    }

    if payload.starts_with(PANIC_PREFIX) {
        return Some((LineKind::RuntimePanic, None));
    }

    if let Some(captures) = TERRATEST_LOG_REGEX
        .captures(payload)
        .or_else(|| TAGGED_OUTPUT_REGEX.captures(payload))
    {
        let name = TestName::from_bytes(&captures[1]);
        return Some((LineKind::TestOutput, Some(name)));
    }

    if let Some(captures) = PACKAGE_SUMMARY_REGEX.captures(payload) {
        let package = String::from_utf8_lossy(&captures[1]).into_owned();
        return Some((LineKind::PackageSummary { package }, None));
    }

    None
}

fn parse_duration(secs: &[u8]) -> Option<Duration> {
    let secs: f64 = std::str::from_utf8(secs).ok()?.parse().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}

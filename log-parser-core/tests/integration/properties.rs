// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Properties that hold for any input made up of well-formed markers and plain lines.

use crate::fixtures::*;
use log_parser_core::{classify::classify, config::ParserConfig, registry::RAW_SINK_NAME};
use pretty_assertions::assert_eq;
use proptest::arbitrary::any;
use std::collections::BTreeMap;
use test_strategy::{Arbitrary, proptest};

static NAMES: &[&str] = &["TestA", "TestB", "TestC/Sub", "TestD"];
static STATUSES: &[&str] = &["PASS", "FAIL", "SKIP"];

#[derive(Clone, Debug, Arbitrary)]
enum LineChoice {
    Run(#[strategy(0..4usize)] usize),
    Output(#[strategy(0..4usize)] usize, #[strategy(0..100u32)] u32),
    Status(
        #[strategy(0..4usize)] usize,
        #[strategy(0..3usize)] usize,
        #[strategy(0..500u32)] u32,
    ),
    Plain(#[strategy(0..100u32)] u32),
}

impl LineChoice {
    fn render(&self) -> String {
        match self {
            Self::Run(name) => format!("=== RUN   {}", NAMES[*name]),
            Self::Output(name, n) => format!("{}: output {n}", NAMES[*name]),
            Self::Status(name, status, centis) => format!(
                "--- {}: {} ({}.{:02}s)",
                STATUSES[*status],
                NAMES[*name],
                centis / 100,
                centis % 100
            ),
            Self::Plain(n) => format!("plain line {n}"),
        }
    }
}

// Every input line lands in exactly one file, in input order, and the report lists exactly the
// tests that got a log file.
#[proptest(cases = 16)]
fn lines_are_preserved_in_order(
    #[strategy(proptest::collection::vec(any::<LineChoice>(), 0..40))] lines: Vec<LineChoice>,
) {
    test_init();

    let lines: Vec<String> = lines.iter().map(LineChoice::render).collect();
    let input: String = lines.iter().map(|line| format!("{line}\n")).collect();

    let mut expected: BTreeMap<String, Vec<u8>> = BTreeMap::new();
    for line in &lines {
        let sink = classify(line.as_bytes())
            .test_name
            .map_or_else(|| RAW_SINK_NAME.to_owned(), |name| name.to_string());
        let contents = expected.entry(sink).or_default();
        contents.extend_from_slice(line.as_bytes());
        contents.push(b'\n');
    }

    let (dir, summary) =
        run_input(input, ParserConfig::default_config()).expect("run succeeded");
    assert!(!summary.has_errors(), "no errors: {summary:?}");
    assert_eq!(summary.lines_read, lines.len() as u64);

    let logs = read_logs(&output_dir(&dir)).expect("read logs");
    assert_eq!(logs, expected);

    let xml = std::fs::read_to_string(output_dir(&dir).join("report.xml")).expect("read report");
    let mut case_names: Vec<_> = parse_report(&xml)
        .expect("parsed report")
        .into_iter()
        .map(|case| case.name)
        .collect();
    case_names.sort();
    let log_names: Vec<_> = logs
        .keys()
        .filter(|name| *name != RAW_SINK_NAME)
        .cloned()
        .collect();
    assert_eq!(case_names, log_names);
}

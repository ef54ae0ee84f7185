// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use camino_tempfile::Utf8TempDir;
use color_eyre::eyre::{Result, ensure};
use fixture_data::{
    models::TestCaseFixtureStatus,
    scenarios::{
        FAIL_WITH_OUTPUT, FIRST_TERMINAL_WINS, INTERLEAVED, OUTPUT_WITHOUT_START,
        PANIC_WITH_NOTHING_RUNNING, RUNTIME_PANIC, SINGLE_PASS, SUB_TEST, TERRATEST_RUN,
        UNATTRIBUTED,
    },
};
use indoc::indoc;
use log_parser_core::{
    config::{ParserConfig, UntaggedLines},
    demux::DemuxRunnerBuilder,
    errors::{DemuxError, ReportWriteError},
};
use pretty_assertions::assert_eq;
use std::{
    collections::BTreeMap,
    io,
    pin::Pin,
    task::{Context, Poll},
};
use test_case::test_case;
use tokio::io::{AsyncRead, ReadBuf};

#[test_case(SINGLE_PASS ; "single passing test")]
#[test_case(FAIL_WITH_OUTPUT ; "failing test with output")]
#[test_case(INTERLEAVED ; "interleaved parallel tests")]
#[test_case(RUNTIME_PANIC ; "runtime panic")]
#[test_case(UNATTRIBUTED ; "unattributed lines")]
#[test_case(SUB_TEST ; "sub-test naming")]
#[test_case(TERRATEST_RUN ; "terratest run")]
#[test_case(FIRST_TERMINAL_WINS ; "first terminal wins")]
#[test_case(OUTPUT_WITHOUT_START ; "output without start")]
#[test_case(PANIC_WITH_NOTHING_RUNNING ; "panic with nothing running")]
fn scenario(name: &str) -> Result<()> {
    test_init();

    let fixture = fixture(name);
    let (dir, summary) = run_input(fixture.input, ParserConfig::default_config())?;
    check_scenario(fixture, &dir, &summary)?;

    Ok(())
}

#[test]
fn single_pass_report_contents() -> Result<()> {
    test_init();

    let fixture = fixture(SINGLE_PASS);
    let (dir, summary) = run_input(fixture.input, ParserConfig::default_config())?;
    let xml = std::fs::read_to_string(output_dir(&dir).join("report.xml"))?;
    ensure!(
        xml.contains(r#"<testcase name="TestAlpha" time="0.12">"#),
        "report contains TestAlpha:\n{xml}"
    );
    ensure!(!xml.contains("<failure"), "no failures:\n{xml}");
    assert_eq!(summary.counts.passed, 1);
    assert_eq!(summary.sinks.len(), 1);
    assert_eq!(summary.sinks[0].lines_written, 3);

    Ok(())
}

#[test]
fn failure_carries_captured_output() -> Result<()> {
    test_init();

    let fixture = fixture(FAIL_WITH_OUTPUT);
    let (dir, _) = run_input(fixture.input, ParserConfig::default_config())?;
    let xml = std::fs::read_to_string(output_dir(&dir).join("report.xml"))?;
    let cases = parse_report(&xml)?;
    assert_eq!(cases.len(), 1);
    assert_eq!(cases[0].time, "1.50");
    let failure_text = cases[0].failure_text.as_deref().unwrap_or_default();
    ensure!(
        failure_text.contains("TestBeta: starting\nTestBeta: boom"),
        "failure text contains both captured lines: {failure_text:?}"
    );

    Ok(())
}

#[test]
fn sub_test_directory_is_created() -> Result<()> {
    test_init();

    let fixture = fixture(SUB_TEST);
    let (dir, _) = run_input(fixture.input, ParserConfig::default_config())?;
    let out = output_dir(&dir);
    ensure!(out.join("TestGroup").is_dir(), "TestGroup/ is a directory");
    ensure!(out.join("TestGroup/SubCase.log").is_file(), "SubCase.log exists");
    let xml = std::fs::read_to_string(out.join("report.xml"))?;
    ensure!(
        xml.contains(r#"<testcase name="TestGroup/SubCase""#),
        "report names the sub-test:\n{xml}"
    );

    Ok(())
}

#[test]
fn untagged_lines_follow_last_test() -> Result<()> {
    test_init();

    let fixture = fixture(TERRATEST_RUN);
    let mut config = ParserConfig::default_config();
    config.set_untagged_lines(UntaggedLines::LastTest);
    let (dir, summary) = run_input(fixture.input, config)?;
    ensure!(!summary.has_errors(), "no errors: {summary:?}");

    let logs = read_logs(&output_dir(&dir))?;
    assert_eq!(
        String::from_utf8_lossy(&logs["TestTerraformSkip"]),
        indoc! {"
            === RUN   TestTerraformSkip
                basic_test.go:40: skipping in short mode
            --- SKIP: TestTerraformSkip (0.00s)
        "},
    );
    // The sub-test already passed when PASS was printed, so it and the package summary go to
    // _raw.
    assert_eq!(
        String::from_utf8_lossy(&logs["_raw"]),
        "PASS\nok  \tgithub.com/gruntwork-io/terratest/test\t2.456s\n",
    );

    Ok(())
}

#[test]
fn suite_name_falls_back_to_config() -> Result<()> {
    test_init();

    let mut config = ParserConfig::default_config();
    config.set_suite_name("infra-tests");
    let (dir, summary) = run_input(fixture(SINGLE_PASS).input, config.clone())?;
    assert_eq!(summary.suite_name, "infra-tests");
    let xml = std::fs::read_to_string(output_dir(&dir).join("report.xml"))?;
    assert_eq!(parse_suite(&xml)?.name, "infra-tests");

    // A package summary line takes precedence over the configured name.
    let (_dir, summary) = run_input(fixture(TERRATEST_RUN).input, config)?;
    assert_eq!(summary.suite_name, "github.com/gruntwork-io/terratest/test");

    Ok(())
}

#[test]
fn final_line_without_newline() -> Result<()> {
    test_init();

    let (dir, summary) = run_input(
        "=== RUN   TestTail\nTestTail: no newline at end",
        ParserConfig::default_config(),
    )?;
    assert_eq!(summary.lines_read, 2);
    let logs = read_logs(&output_dir(&dir))?;
    assert_eq!(
        String::from_utf8_lossy(&logs["TestTail"]),
        "=== RUN   TestTail\nTestTail: no newline at end\n"
    );

    Ok(())
}

#[test]
fn non_utf8_bytes_are_preserved() -> Result<()> {
    test_init();

    let input: &[u8] = b"=== RUN   TestBytes\nTestBytes: \xff\xfe\r\n\x80 orphan\n--- PASS: TestBytes (0.01s)\n";
    let (dir, _) = run_input(input, ParserConfig::default_config())?;
    let logs = read_logs(&output_dir(&dir))?;
    assert_eq!(
        logs["TestBytes"],
        b"=== RUN   TestBytes\nTestBytes: \xff\xfe\r\n--- PASS: TestBytes (0.01s)\n".to_vec()
    );
    assert_eq!(logs["_raw"], b"\x80 orphan\n".to_vec());

    Ok(())
}

#[test]
fn similar_names_keep_separate_logs() -> Result<()> {
    test_init();

    let input: &[u8] = b"=== RUN   Test\\Back\n\
        === RUN   Test_Back\n\
        === RUN   Test\xffName\n\
        === RUN   Test\xfeName\n\
        Test\\Back: backslash\n\
        Test_Back: underscore\n\
        --- PASS: Test\\Back (0.01s)\n\
        --- PASS: Test_Back (0.02s)\n\
        --- PASS: Test\xffName (0.03s)\n\
        --- FAIL: Test\xfeName (0.04s)\n";
    let (dir, summary) = run_input(input, ParserConfig::default_config())?;
    ensure!(!summary.has_errors(), "run had errors: {summary:?}");

    let logs = read_logs(&output_dir(&dir))?;
    let expected_logs: [(&str, &[u8]); 4] = [
        (
            "Test%5CBack",
            b"=== RUN   Test\\Back\nTest\\Back: backslash\n--- PASS: Test\\Back (0.01s)\n",
        ),
        (
            "Test%FEName",
            b"=== RUN   Test\xfeName\n--- FAIL: Test\xfeName (0.04s)\n",
        ),
        (
            "Test%FFName",
            b"=== RUN   Test\xffName\n--- PASS: Test\xffName (0.03s)\n",
        ),
        (
            "Test_Back",
            b"=== RUN   Test_Back\nTest_Back: underscore\n--- PASS: Test_Back (0.02s)\n",
        ),
    ];
    let expected: BTreeMap<String, Vec<u8>> = expected_logs
        .into_iter()
        .map(|(name, contents)| (name.to_owned(), contents.to_vec()))
        .collect();
    assert_eq!(logs, expected);

    let xml = std::fs::read_to_string(output_dir(&dir).join("report.xml"))?;
    let cases: Vec<_> = parse_report(&xml)?
        .into_iter()
        .map(|case| (case.name, case.status))
        .collect();
    assert_eq!(
        cases,
        [
            ("Test\\Back".to_owned(), TestCaseFixtureStatus::Pass),
            ("Test_Back".to_owned(), TestCaseFixtureStatus::Pass),
            ("Test\u{FFFD}Name".to_owned(), TestCaseFixtureStatus::Pass),
            ("Test\u{FFFD}Name".to_owned(), TestCaseFixtureStatus::Fail),
        ]
    );

    Ok(())
}

#[test]
fn empty_input() -> Result<()> {
    test_init();

    let (dir, summary) = run_input("", ParserConfig::default_config())?;
    assert_eq!(summary.lines_read, 0);
    assert!(summary.sinks.is_empty());
    assert_eq!(read_logs(&output_dir(&dir))?, BTreeMap::new());
    let xml = std::fs::read_to_string(output_dir(&dir).join("report.xml"))?;
    assert_eq!(parse_report(&xml)?, Vec::new());

    Ok(())
}

#[test]
fn output_dir_is_a_file() -> Result<()> {
    test_init();

    let dir = Utf8TempDir::new()?;
    let output_dir = dir.path().join("out");
    std::fs::write(&output_dir, "not a directory")?;

    let runner = DemuxRunnerBuilder::new(&output_dir, ParserConfig::default_config()).build()?;
    let error = runner
        .execute(io::Cursor::new(b"=== RUN   TestAlpha\n".to_vec()))
        .expect_err("output directory can't be created");
    ensure!(
        matches!(&error, DemuxError::OutputDir { path, .. } if path == &output_dir),
        "unexpected error: {error:?}"
    );

    Ok(())
}

#[test]
fn report_write_failure_is_not_fatal() -> Result<()> {
    test_init();

    let dir = Utf8TempDir::new()?;
    let output_dir = dir.path().join("out");
    // A directory where the report file needs to go.
    std::fs::create_dir_all(output_dir.join("report.xml"))?;

    let fixture = fixture(SINGLE_PASS);
    let runner = DemuxRunnerBuilder::new(&output_dir, ParserConfig::default_config()).build()?;
    let summary = runner.execute(io::Cursor::new(fixture.input.as_bytes().to_vec()))?;

    ensure!(
        matches!(summary.report, Err(ReportWriteError::Create { .. })),
        "report creation failed: {:?}",
        summary.report
    );
    ensure!(summary.has_errors());
    // The per-test logs are still complete.
    let logs = read_logs(&output_dir)?;
    assert_eq!(
        String::from_utf8_lossy(&logs["TestAlpha"]),
        fixture.logs[0].contents()
    );

    Ok(())
}

/// Returns `data`, then fails.
struct FailingReader {
    data: Option<&'static [u8]>,
}

impl AsyncRead for FailingReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.data.take() {
            Some(data) => {
                buf.put_slice(data);
                Poll::Ready(Ok(()))
            }
            None => Poll::Ready(Err(io::Error::other("connection reset"))),
        }
    }
}

#[test]
fn input_read_error_still_writes_report() -> Result<()> {
    test_init();

    let dir = Utf8TempDir::new()?;
    let output_dir = dir.path().join("out");
    let runner = DemuxRunnerBuilder::new(&output_dir, ParserConfig::default_config()).build()?;
    let summary = runner.execute(FailingReader {
        data: Some(b"=== RUN   TestCut\nTestCut: partial\n"),
    })?;

    let input_error = summary
        .input_error
        .as_ref()
        .expect("input error is recorded");
    assert_eq!(input_error.lines_read(), 2);
    assert_eq!(summary.lines_read, 2);

    let xml = std::fs::read_to_string(output_dir.join("report.xml"))?;
    let cases = parse_report(&xml)?;
    assert_eq!(cases.len(), 1);
    assert_eq!(cases[0].name, "TestCut");
    assert_eq!(
        cases[0].status,
        fixture_data::models::TestCaseFixtureStatus::Incomplete
    );

    Ok(())
}

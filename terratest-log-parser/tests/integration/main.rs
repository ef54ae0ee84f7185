// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runs the built `terratest-log-parser` binary end to end.

use camino::{Utf8Path, Utf8PathBuf};
use camino_tempfile::Utf8TempDir;
use color_eyre::eyre::{Result, ensure};
use fixture_data::scenarios::{EXPECTED_SCENARIOS, FAIL_WITH_OUTPUT, SINGLE_PASS, UNATTRIBUTED};
use indoc::indoc;
use pretty_assertions::assert_eq;
use std::{
    io::Write,
    process::{Command, Output, Stdio},
};

const SETUP_ERROR: i32 = 96;

fn fixture_input(name: &str) -> &'static str {
    EXPECTED_SCENARIOS
        .get(name)
        .unwrap_or_else(|| panic!("scenario {name} exists"))
        .input
}

fn log_parser_command(cwd: &Utf8Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_terratest-log-parser"));
    command
        .current_dir(cwd)
        .args(["--color", "never"])
        .env_remove("LOG_PARSER_LOG")
        .env_remove("LOG_PARSER_VERBOSE");
    command
}

fn run_with_stdin(mut command: Command, stdin: &str) -> Result<Output> {
    let mut child = command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stdin.as_bytes())?;
    Ok(child.wait_with_output()?)
}

fn write_testlog(dir: &Utf8TempDir, contents: &str) -> Result<Utf8PathBuf> {
    let path = dir.path().join("test.log");
    std::fs::write(&path, contents)?;
    Ok(path)
}

#[test]
fn testlog_file_to_output_dir() -> Result<()> {
    let dir = Utf8TempDir::new()?;
    let testlog = write_testlog(&dir, fixture_input(SINGLE_PASS))?;
    let output_dir = dir.path().join("logs");

    let output = log_parser_command(dir.path())
        .args(["--testlog", testlog.as_str(), "--outputdir", output_dir.as_str()])
        .output()?;
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(0), "stderr:\n{stderr}");

    assert_eq!(
        std::fs::read_to_string(output_dir.join("TestAlpha.log"))?,
        indoc! {"
            === RUN   TestAlpha
            TestAlpha: hello
            --- PASS: TestAlpha (0.12s)
        "}
    );
    let report = std::fs::read_to_string(output_dir.join("report.xml"))?;
    ensure!(
        report.contains(r#"<testcase name="TestAlpha" time="0.12">"#),
        "report names TestAlpha:\n{report}"
    );
    ensure!(
        stderr.contains("info: reading test log from"),
        "stderr logs the input:\n{stderr}"
    );

    Ok(())
}

#[test]
fn stdin_and_default_output_dir() -> Result<()> {
    let dir = Utf8TempDir::new()?;
    let output = run_with_stdin(log_parser_command(dir.path()), fixture_input(UNATTRIBUTED))?;
    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr:\n{}",
        String::from_utf8_lossy(&output.stderr)
    );

    // The default output directory is relative to the working directory.
    let out = dir.path().join("out");
    ensure!(out.join("_raw.log").is_file(), "_raw.log was written");
    let report = std::fs::read_to_string(out.join("report.xml"))?;
    ensure!(!report.contains("<testcase"), "no test cases:\n{report}");

    Ok(())
}

#[test]
fn test_failures_do_not_change_exit_code() -> Result<()> {
    let dir = Utf8TempDir::new()?;
    let output = run_with_stdin(log_parser_command(dir.path()), fixture_input(FAIL_WITH_OUTPUT))?;
    assert_eq!(output.status.code(), Some(0));
    let report = std::fs::read_to_string(dir.path().join("out/report.xml"))?;
    ensure!(
        report.contains(r#"<failure message="Failed">"#),
        "report has the failure:\n{report}"
    );

    Ok(())
}

#[test]
fn suite_name_flag() -> Result<()> {
    let dir = Utf8TempDir::new()?;
    let mut command = log_parser_command(dir.path());
    command.args(["--suite-name", "infra-tests"]);
    let output = run_with_stdin(command, fixture_input(SINGLE_PASS))?;
    assert_eq!(output.status.code(), Some(0));
    let report = std::fs::read_to_string(dir.path().join("out/report.xml"))?;
    ensure!(
        report.contains(r#"<testsuite name="infra-tests""#),
        "suite is named from the flag:\n{report}"
    );

    Ok(())
}

#[test]
fn config_file_is_applied() -> Result<()> {
    let dir = Utf8TempDir::new()?;
    let config = dir.path().join("parser.toml");
    std::fs::write(
        &config,
        indoc! {r#"
            [parser]
            untagged-lines = "last-test"
        "#},
    )?;
    let mut command = log_parser_command(dir.path());
    command.args(["--config", config.as_str()]);
    let output = run_with_stdin(
        command,
        "=== RUN   TestGamma\n    gamma_test.go:12: indented output\n--- PASS: TestGamma (0.05s)\n",
    )?;
    assert_eq!(output.status.code(), Some(0));

    let out = dir.path().join("out");
    assert_eq!(
        std::fs::read_to_string(out.join("TestGamma.log"))?,
        "=== RUN   TestGamma\n    gamma_test.go:12: indented output\n--- PASS: TestGamma (0.05s)\n",
    );
    ensure!(!out.join("_raw.log").exists(), "nothing went to _raw.log");

    Ok(())
}

#[test]
fn missing_testlog_is_a_setup_error() -> Result<()> {
    let dir = Utf8TempDir::new()?;
    let output = log_parser_command(dir.path())
        .args(["--testlog", "does-not-exist.log"])
        .output()?;
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(SETUP_ERROR), "stderr:\n{stderr}");
    ensure!(
        stderr.contains("error: failed to open test log `does-not-exist.log`"),
        "stderr names the input:\n{stderr}"
    );
    ensure!(
        !dir.path().join("out/report.xml").exists(),
        "no report is written"
    );

    Ok(())
}

#[test]
fn invalid_config_is_a_setup_error() -> Result<()> {
    let dir = Utf8TempDir::new()?;
    let config = dir.path().join("parser.toml");
    std::fs::write(&config, "[parser]\nchannel-capacity = 0\n")?;
    let output = log_parser_command(dir.path())
        .args(["--config", config.as_str()])
        .output()?;
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(SETUP_ERROR), "stderr:\n{stderr}");
    ensure!(
        stderr.contains("error: failed to parse config file"),
        "stderr explains the failure:\n{stderr}"
    );

    Ok(())
}

#[test]
fn uncreatable_output_dir_is_a_setup_error() -> Result<()> {
    let dir = Utf8TempDir::new()?;
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "a file, not a directory")?;
    // The process may exit before reading stdin, so don't pipe anything in.
    let output = log_parser_command(dir.path())
        .args(["--outputdir", blocker.as_str()])
        .output()?;
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(SETUP_ERROR), "stderr:\n{stderr}");
    ensure!(
        stderr.contains("error creating output directory"),
        "stderr explains the failure:\n{stderr}"
    );

    Ok(())
}

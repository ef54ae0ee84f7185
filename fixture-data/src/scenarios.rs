// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Literal `go test -v` logs and the per-test files and report entries they should produce.

use crate::models::{ScenarioFixture, TestCaseFixtureStatus};
use iddqd::{IdOrdMap, id_ord_map};
use std::sync::LazyLock;

pub static SINGLE_PASS: &str = "single-pass";
pub static FAIL_WITH_OUTPUT: &str = "fail-with-output";
pub static INTERLEAVED: &str = "interleaved";
pub static RUNTIME_PANIC: &str = "runtime-panic";
pub static UNATTRIBUTED: &str = "unattributed";
pub static SUB_TEST: &str = "sub-test";
pub static TERRATEST_RUN: &str = "terratest-run";
pub static FIRST_TERMINAL_WINS: &str = "first-terminal-wins";
pub static OUTPUT_WITHOUT_START: &str = "output-without-start";
pub static PANIC_WITH_NOTHING_RUNNING: &str = "panic-with-nothing-running";

pub static EXPECTED_SCENARIOS: LazyLock<IdOrdMap<ScenarioFixture>> = LazyLock::new(|| {
    id_ord_map! {
        ScenarioFixture::new(
            SINGLE_PASS,
            concat!(
                "=== RUN   TestAlpha\n",
                "TestAlpha: hello\n",
                "--- PASS: TestAlpha (0.12s)\n",
            ),
        )
        .with_log(
            "TestAlpha",
            &["=== RUN   TestAlpha", "TestAlpha: hello", "--- PASS: TestAlpha (0.12s)"],
        )
        .with_test("TestAlpha", TestCaseFixtureStatus::Pass),

        ScenarioFixture::new(
            FAIL_WITH_OUTPUT,
            concat!(
                "=== RUN   TestBeta\n",
                "TestBeta: starting\n",
                "TestBeta: boom\n",
                "--- FAIL: TestBeta (1.50s)\n",
            ),
        )
        .with_log(
            "TestBeta",
            &[
                "=== RUN   TestBeta",
                "TestBeta: starting",
                "TestBeta: boom",
                "--- FAIL: TestBeta (1.50s)",
            ],
        )
        .with_test("TestBeta", TestCaseFixtureStatus::Fail),

        ScenarioFixture::new(
            INTERLEAVED,
            concat!(
                "=== RUN   TestOne\n",
                "=== PAUSE TestOne\n",
                "=== RUN   TestTwo\n",
                "=== PAUSE TestTwo\n",
                "=== CONT  TestOne\n",
                "=== CONT  TestTwo\n",
                "TestOne: one-a\n",
                "TestTwo: two-a\n",
                "TestOne: one-b\n",
                "TestTwo: two-b\n",
                "--- PASS: TestTwo (0.20s)\n",
                "--- PASS: TestOne (0.30s)\n",
            ),
        )
        .with_log(
            "TestOne",
            &[
                "=== RUN   TestOne",
                "=== PAUSE TestOne",
                "=== CONT  TestOne",
                "TestOne: one-a",
                "TestOne: one-b",
                "--- PASS: TestOne (0.30s)",
            ],
        )
        .with_log(
            "TestTwo",
            &[
                "=== RUN   TestTwo",
                "=== PAUSE TestTwo",
                "=== CONT  TestTwo",
                "TestTwo: two-a",
                "TestTwo: two-b",
                "--- PASS: TestTwo (0.20s)",
            ],
        )
        .with_test("TestOne", TestCaseFixtureStatus::Pass)
        .with_test("TestTwo", TestCaseFixtureStatus::Pass),

        ScenarioFixture::new(
            RUNTIME_PANIC,
            concat!(
                "=== RUN TestX\n",
                "TestX: working\n",
                "=== RUN TestY\n",
                "panic: runtime error: index out of range [3] with length 3\n",
            ),
        )
        .with_log(
            "TestX",
            &[
                "=== RUN TestX",
                "TestX: working",
                "panic: runtime error: index out of range [3] with length 3",
            ],
        )
        .with_log(
            "TestY",
            &[
                "=== RUN TestY",
                "panic: runtime error: index out of range [3] with length 3",
            ],
        )
        .with_test("TestX", TestCaseFixtureStatus::Panic)
        .with_test("TestY", TestCaseFixtureStatus::Panic),

        ScenarioFixture::new(
            UNATTRIBUTED,
            concat!(
                "go: downloading github.com/stretchr/testify v1.8.4\n",
                "some build output\n",
                "\n",
                "PASS\n",
            ),
        )
        .with_log(
            "_raw",
            &[
                "go: downloading github.com/stretchr/testify v1.8.4",
                "some build output",
                "",
                "PASS",
            ],
        ),

        ScenarioFixture::new(SUB_TEST, "--- PASS: TestGroup/SubCase (0.01s)\n")
            .with_log("TestGroup/SubCase", &["--- PASS: TestGroup/SubCase (0.01s)"])
            .with_test("TestGroup/SubCase", TestCaseFixtureStatus::Pass),

        ScenarioFixture::new(
            TERRATEST_RUN,
            concat!(
                "=== RUN   TestTerraformBasic\n",
                "=== PAUSE TestTerraformBasic\n",
                "=== RUN   TestTerraformSkip\n",
                "    basic_test.go:40: skipping in short mode\n",
                "--- SKIP: TestTerraformSkip (0.00s)\n",
                "=== CONT  TestTerraformBasic\n",
                "TestTerraformBasic 2019-01-01T00:00:00Z retry.go:91: terraform [init -upgrade=false]\n",
                "TestTerraformBasic 2019-01-01T00:00:01Z logger.go:66: Terraform has been successfully initialized!\n",
                "=== RUN   TestTerraformBasic/Apply\n",
                "TestTerraformBasic/Apply 2019-01-01T00:00:02Z logger.go:66: Apply complete! Resources: 1 added, 0 changed, 0 destroyed.\n",
                "--- PASS: TestTerraformBasic (2.35s)\n",
                "    --- PASS: TestTerraformBasic/Apply (1.10s)\n",
                "PASS\n",
                "ok  \tgithub.com/gruntwork-io/terratest/test\t2.456s\n",
            ),
        )
        .with_log(
            "TestTerraformBasic",
            &[
                "=== RUN   TestTerraformBasic",
                "=== PAUSE TestTerraformBasic",
                "=== CONT  TestTerraformBasic",
                "TestTerraformBasic 2019-01-01T00:00:00Z retry.go:91: terraform [init -upgrade=false]",
                "TestTerraformBasic 2019-01-01T00:00:01Z logger.go:66: Terraform has been successfully initialized!",
                "--- PASS: TestTerraformBasic (2.35s)",
            ],
        )
        .with_log(
            "TestTerraformSkip",
            &["=== RUN   TestTerraformSkip", "--- SKIP: TestTerraformSkip (0.00s)"],
        )
        .with_log(
            "TestTerraformBasic/Apply",
            &[
                "=== RUN   TestTerraformBasic/Apply",
                "TestTerraformBasic/Apply 2019-01-01T00:00:02Z logger.go:66: Apply complete! Resources: 1 added, 0 changed, 0 destroyed.",
                "    --- PASS: TestTerraformBasic/Apply (1.10s)",
            ],
        )
        .with_log(
            "_raw",
            &[
                "    basic_test.go:40: skipping in short mode",
                "PASS",
                "ok  \tgithub.com/gruntwork-io/terratest/test\t2.456s",
            ],
        )
        .with_test("TestTerraformBasic", TestCaseFixtureStatus::Pass)
        .with_test("TestTerraformSkip", TestCaseFixtureStatus::Skip)
        .with_test("TestTerraformBasic/Apply", TestCaseFixtureStatus::Pass)
        .with_suite_name("github.com/gruntwork-io/terratest/test"),

        ScenarioFixture::new(
            FIRST_TERMINAL_WINS,
            concat!(
                "=== RUN   TestFlaky\n",
                "--- FAIL: TestFlaky (0.50s)\n",
                "--- PASS: TestFlaky (0.60s)\n",
            ),
        )
        .with_log(
            "TestFlaky",
            &[
                "=== RUN   TestFlaky",
                "--- FAIL: TestFlaky (0.50s)",
                "--- PASS: TestFlaky (0.60s)",
            ],
        )
        .with_test("TestFlaky", TestCaseFixtureStatus::Fail),

        ScenarioFixture::new(OUTPUT_WITHOUT_START, "TestOrphan: no run marker\n")
            .with_log("TestOrphan", &["TestOrphan: no run marker"])
            .with_test("TestOrphan", TestCaseFixtureStatus::Incomplete),

        ScenarioFixture::new(
            PANIC_WITH_NOTHING_RUNNING,
            concat!(
                "panic: early init failure\n",
                "goroutine 1 [running]:\n",
            ),
        )
        .with_log("_raw", &["panic: early init failure", "goroutine 1 [running]:"]),
    }
});

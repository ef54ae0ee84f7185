// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serialize a `Report` as JUnit XML.

use super::{Report, ReportedOutcome, ReportedTest, is_invalid_xml_char};
use quick_xml::{
    Writer,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};
use std::{io, time::Duration};

static TESTSUITES_TAG: &str = "testsuites";
static TESTSUITE_TAG: &str = "testsuite";
static TESTCASE_TAG: &str = "testcase";
static FAILURE_TAG: &str = "failure";
static SKIPPED_TAG: &str = "skipped";

pub(super) fn serialize_report(report: &Report, writer: impl io::Write) -> quick_xml::Result<()> {
    let mut writer = Writer::new_with_indent(writer, b' ', 4);

    let decl = BytesDecl::new("1.0", Some("UTF-8"), None);
    writer.write_event(Event::Decl(decl))?;

    serialize_empty_start_tag(TESTSUITES_TAG, &mut writer)?;
    serialize_testsuite(report, &mut writer)?;
    serialize_end_tag(TESTSUITES_TAG, &mut writer)?;

    // Add a trailing newline.
    writer.write_indent()
}

fn serialize_testsuite(report: &Report, writer: &mut Writer<impl io::Write>) -> quick_xml::Result<()> {
    // Use the destructuring syntax to ensure that all fields are handled.
    let Report {
        suite_name,
        timestamp,
        duration,
        tests,
    } = report;
    let counts = report.counts();
    let suite_name = attribute_value(suite_name);

    let mut testsuite_tag = BytesStart::new(TESTSUITE_TAG);
    testsuite_tag.extend_attributes([
        ("name", suite_name.as_str()),
        ("tests", counts.tests.to_string().as_str()),
        ("failures", counts.failed.to_string().as_str()),
        // Every failure is attributed to a test, so there are never any errors.
        ("errors", "0"),
        ("skipped", counts.skipped.to_string().as_str()),
        ("time", serialize_time(duration).as_str()),
        ("timestamp", timestamp.format("%+").to_string().as_str()),
    ]);
    writer.write_event(Event::Start(testsuite_tag))?;

    for test in tests {
        serialize_testcase(test, writer)?;
    }

    serialize_end_tag(TESTSUITE_TAG, writer)
}

fn serialize_testcase(
    test: &ReportedTest,
    writer: &mut Writer<impl io::Write>,
) -> quick_xml::Result<()> {
    let ReportedTest {
        name,
        outcome,
        time,
        output,
    } = test;

    let mut testcase_tag = BytesStart::new(TESTCASE_TAG);
    testcase_tag.extend_attributes([
        ("name", attribute_value(&name.to_str_lossy()).as_str()),
        ("time", serialize_time(time).as_str()),
    ]);
    writer.write_event(Event::Start(testcase_tag))?;

    match outcome {
        ReportedOutcome::Passed => {}
        ReportedOutcome::Skipped => {
            writer.write_event(Event::Empty(BytesStart::new(SKIPPED_TAG)))?;
        }
        ReportedOutcome::Failed(kind) => {
            let mut failure_tag = BytesStart::new(FAILURE_TAG);
            failure_tag.push_attribute(("message", kind.message()));
            writer.write_event(Event::Start(failure_tag))?;
            writer.write_event(Event::Text(BytesText::new(output)))?;
            serialize_end_tag(FAILURE_TAG, writer)?;
        }
    }

    serialize_end_tag(TESTCASE_TAG, writer)
}

fn serialize_empty_start_tag(
    tag_name: &'static str,
    writer: &mut Writer<impl io::Write>,
) -> quick_xml::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag_name)))
}

fn serialize_end_tag(
    tag_name: &'static str,
    writer: &mut Writer<impl io::Write>,
) -> quick_xml::Result<()> {
    writer.write_event(Event::End(BytesEnd::new(tag_name)))
}

// Test names are arbitrary non-space bytes, which may include controls XML 1.0 can't represent.
fn attribute_value(value: &str) -> String {
    value.replace(is_invalid_xml_char, "")
}

// Serialize time as seconds with 2 decimal points, the precision `go test` reports.
fn serialize_time(time: &Duration) -> String {
    format!("{:.2}", time.as_secs_f64())
}

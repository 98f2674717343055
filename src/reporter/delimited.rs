use crate::app::case::{TestPriority, TestStatus};
use crate::reporter::model::Report;
use crate::reporter::ReportWriteError;
use crate::time::as_millis_f64;
use serde_derive::Serialize;
use std::io::Write;

/// One flat record shape for the whole report; `record` tells which columns apply.
#[derive(Debug, Serialize, Default)]
struct Row<'a> {
    record: &'static str,
    id: Option<String>,
    run: Option<&'a str>,
    generated: Option<&'a str>,
    suite: Option<&'a str>,
    enabled: Option<bool>,
    test: Option<&'a str>,
    description: Option<&'a str>,
    priority: Option<TestPriority>,
    status: Option<TestStatus>,
    total: Option<usize>,
    passed: Option<usize>,
    failed: Option<usize>,
    skipped: Option<usize>,
    not_run: Option<usize>,
    pass_rate: Option<f64>,
    duration_ms: Option<f64>,
    measured: Option<f64>,
    expected: Option<f64>,
    tolerance: Option<f64>,
    error_message: Option<&'a str>,
    details: Option<&'a str>,
}

pub(super) fn render(report: &Report, out: &mut dyn Write) -> Result<(), ReportWriteError> {
    let mut writer = csv::Writer::from_writer(out);
    let summary = &report.summary;
    writer.serialize(Row {
        record: "summary",
        id: Some(report.uuid.to_string()),
        run: Some(&report.name),
        generated: Some(&report.generated),
        total: Some(summary.total),
        passed: Some(summary.passed),
        failed: Some(summary.failed),
        skipped: Some(summary.skipped),
        not_run: Some(summary.not_run),
        pass_rate: Some(summary.pass_rate),
        duration_ms: summary.duration.map(as_millis_f64),
        ..Row::default()
    })?;
    for suite in &report.suites {
        writer.serialize(Row {
            record: "suite",
            suite: Some(&suite.name),
            enabled: Some(suite.enabled),
            total: Some(suite.total),
            passed: Some(suite.passed),
            failed: Some(suite.failed),
            skipped: Some(suite.skipped),
            not_run: Some(suite.not_run),
            duration_ms: Some(as_millis_f64(suite.duration)),
            ..Row::default()
        })?;
        for case in &suite.tests {
            writer.serialize(Row {
                record: "test",
                suite: Some(&suite.name),
                test: Some(&case.name),
                description: Some(&case.description),
                priority: Some(case.priority),
                status: Some(case.status),
                duration_ms: case.duration.map(as_millis_f64),
                measured: Some(case.measured),
                expected: Some(case.expected),
                tolerance: Some(case.tolerance),
                error_message: case.error_message.as_deref(),
                details: Some(&case.details),
                ..Row::default()
            })?;
        }
    }
    writer.flush()?;
    Ok(())
}

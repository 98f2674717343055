use crate::app::case::TestStatus;
use crate::reporter::model::{CaseReport, Report, SuiteReport};
use crate::reporter::ReportWriteError;
use crate::time::as_millis_f64;
use std::borrow::Cow;
use std::io::Write;

const STYLE: &str = "body { font-family: Arial, sans-serif; margin: 20px; }
.pass { color: green; }
.fail { color: red; }
.error { color: darkred; font-weight: bold; }
.skip { color: orange; }
.pending { color: gray; }
table { border-collapse: collapse; width: 100%; }
th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
th { background-color: #f2f2f2; }
";

pub(super) fn render(report: &Report, out: &mut dyn Write) -> Result<(), ReportWriteError> {
    let title = escape(&report.name);
    writeln!(out, "<!DOCTYPE html>\n<html>\n<head>")?;
    writeln!(out, "<meta charset=\"utf-8\">")?;
    writeln!(out, "<title>{} Report</title>", title)?;
    writeln!(out, "<style>\n{}</style>\n</head>\n<body>", STYLE)?;
    writeln!(out, "<h1>{} Report</h1>", title)?;
    writeln!(out, "<p>Generated: {}</p>", escape(&report.generated))?;
    writeln!(out, "<p>Run: {}</p>", report.uuid)?;
    summary(report, out)?;
    for suite in &report.suites {
        suite_table(suite, out)?;
    }
    writeln!(out, "</body>\n</html>")?;
    Ok(())
}

fn summary(report: &Report, out: &mut dyn Write) -> Result<(), ReportWriteError> {
    let summary = &report.summary;
    writeln!(out, "<h2>Summary</h2>\n<table>")?;
    writeln!(out, "<tr><th>Metric</th><th>Value</th></tr>")?;
    writeln!(out, "<tr><td>Test Suites</td><td>{}</td></tr>", summary.suites)?;
    writeln!(out, "<tr><td>Total Tests</td><td>{}</td></tr>", summary.total)?;
    writeln!(out, "<tr><td>Passed</td><td class='pass'>{}</td></tr>", summary.passed)?;
    writeln!(out, "<tr><td>Failed</td><td class='fail'>{}</td></tr>", summary.failed)?;
    writeln!(out, "<tr><td>Skipped</td><td class='skip'>{}</td></tr>", summary.skipped)?;
    writeln!(out, "<tr><td>Not Run</td><td class='pending'>{}</td></tr>", summary.not_run)?;
    writeln!(out, "<tr><td>Pass Rate</td><td>{:.1}%</td></tr>", summary.pass_rate * 100.0)?;
    let duration = summary
        .duration
        .map(|d| format!("{:.3}", as_millis_f64(d)))
        .unwrap_or_else(|| "-".to_owned());
    writeln!(out, "<tr><td>Total Time (ms)</td><td>{}</td></tr>", duration)?;
    writeln!(out, "</table>")?;
    Ok(())
}

fn suite_table(suite: &SuiteReport, out: &mut dyn Write) -> Result<(), ReportWriteError> {
    let state = if suite.enabled { "" } else { " (disabled)" };
    writeln!(out, "<h2>{}{}</h2>", escape(&suite.name), state)?;
    writeln!(
        out,
        "<p>Passed {} / Failed {} / Skipped {} / Not Run {} in {:.3} ms</p>",
        suite.passed,
        suite.failed,
        suite.skipped,
        suite.not_run,
        as_millis_f64(suite.duration)
    )?;
    writeln!(out, "<table>")?;
    writeln!(
        out,
        "<tr><th>Test Name</th><th>Priority</th><th>Status</th><th>Time (ms)</th>\
         <th>Measured</th><th>Expected</th><th>Tolerance</th><th>Details</th></tr>"
    )?;
    for case in &suite.tests {
        case_row(case, out)?;
    }
    writeln!(out, "</table>")?;
    Ok(())
}

fn case_row(case: &CaseReport, out: &mut dyn Write) -> Result<(), ReportWriteError> {
    let time = case
        .duration
        .map(|d| format!("{:.3}", as_millis_f64(d)))
        .unwrap_or_else(|| "-".to_owned());
    writeln!(
        out,
        "<tr><td>{}</td><td>{}</td><td class='{}'>{}</td><td>{}</td>\
         <td>{:.3}</td><td>{:.3}</td><td>{:.3}</td><td>{}</td></tr>",
        escape(&case.name),
        case.priority,
        status_class(case.status),
        case.status,
        time,
        case.measured,
        case.expected,
        case.tolerance,
        escape(&case.details)
    )?;
    Ok(())
}

fn status_class(status: TestStatus) -> &'static str {
    match status {
        TestStatus::Passed => "pass",
        TestStatus::Failed => "fail",
        TestStatus::Error => "error",
        TestStatus::Skipped => "skip",
        TestStatus::Pending | TestStatus::Running => "pending",
    }
}

fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(|c: char| matches!(c, '<' | '>' | '&' | '"' | '\'')) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

mod delimited;
mod html;
pub mod model;
pub mod serialize;

pub use self::model::Report;

use crate::app::Framework;
use crate::time::as_millis_f64;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_REPORT_FILE: &str = "fpga_validation_report.html";

#[derive(Debug, Error)]
pub enum ReportWriteError {
    #[error("cannot open report destination {destination}: {source}")]
    Open {
        destination: String,
        #[source]
        source: io::Error,
    },
    #[error("cannot write report: {0}")]
    Io(#[from] io::Error),
    #[error("cannot serialize report: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot write csv report: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde_derive::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Html,
    Json,
    Csv,
}

impl ReportFormat {
    pub const VARIANTS: [&'static str; 3] = ["html", "json", "csv"];

    /// Guesses the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_ascii_lowercase().as_str() {
                "html" | "htm" => Some(ReportFormat::Html),
                "json" => Some(ReportFormat::Json),
                "csv" => Some(ReportFormat::Csv),
                _ => None,
            })
    }

    pub fn render(self, report: &Report, out: &mut dyn Write) -> Result<(), ReportWriteError> {
        match self {
            ReportFormat::Html => html::render(report, out),
            ReportFormat::Json => {
                serde_json::to_writer_pretty(&mut *out, report)?;
                writeln!(out)?;
                Ok(())
            }
            ReportFormat::Csv => delimited::render(report, out),
        }
    }
}

impl Default for ReportFormat {
    fn default() -> Self {
        ReportFormat::Html
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "html" => Ok(ReportFormat::Html),
            "json" => Ok(ReportFormat::Json),
            "csv" => Ok(ReportFormat::Csv),
            _ => Err(format!("Report format '{}' not supported", s)),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ReportFormat::Html => "html",
            ReportFormat::Json => "json",
            ReportFormat::Csv => "csv",
        };
        f.write_str(name)
    }
}

/// Where the finished report goes: `-` is stdout, anything else a file path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    File(PathBuf),
}

impl Destination {
    pub fn open(&self) -> Result<Box<dyn Write>, ReportWriteError> {
        match self {
            Destination::Stdout => Ok(Box::new(io::stdout())),
            Destination::File(path) => {
                let open = || -> io::Result<File> {
                    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                        fs::create_dir_all(parent)?;
                    }
                    File::create(path)
                };
                let file = open().map_err(|source| ReportWriteError::Open {
                    destination: self.to_string(),
                    source,
                })?;
                Ok(Box::new(BufWriter::new(file)))
            }
        }
    }
}

impl Default for Destination {
    fn default() -> Self {
        Destination::File(PathBuf::from(DEFAULT_REPORT_FILE))
    }
}

impl FromStr for Destination {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err("Report destination must not be empty".to_owned()),
            "-" => Ok(Destination::Stdout),
            path => Ok(Destination::File(PathBuf::from(path))),
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Destination::Stdout => f.write_str("stdout"),
            Destination::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReportTarget {
    pub destination: Destination,
    pub format: ReportFormat,
}

/// Renders the run into the destination configured for it and hands back
/// the report model. A failure here never changes the verdict of the run.
pub fn generate_report(framework: &Framework) -> Result<Report, ReportWriteError> {
    let report = Report::collect(framework);
    let target = &framework.settings().report;
    let mut out = target.destination.open()?;
    target.format.render(&report, &mut *out)?;
    out.flush()?;
    info!("Report generated: {}", target.destination);
    Ok(report)
}

/// Writes the report, then logs the closing summary. A failed write is
/// logged and the summary is taken from the run itself.
pub fn publish(framework: &Framework) -> Report {
    let report = match generate_report(framework) {
        Ok(report) => report,
        Err(e) => {
            error!("Failed to write report: {}", e);
            Report::collect(framework)
        }
    };
    log_summary(&report);
    report
}

/// Logs the closing summary of a run.
pub fn log_summary(report: &Report) {
    let summary = &report.summary;
    info!("=== Validation Framework Summary ===");
    info!("Total Test Suites: {}", summary.suites);
    info!("Total Tests: {}", summary.total);
    info!("Passed: {}", summary.passed);
    info!("Failed: {}", summary.failed);
    info!("Skipped: {}", summary.skipped);
    if summary.not_run > 0 {
        info!("Not Run: {}", summary.not_run);
    }
    info!("Pass Rate: {:.1}%", summary.pass_rate * 100.0);
    match summary.duration {
        Some(duration) => info!("Total Execution Time: {:.3} ms", as_millis_f64(duration)),
        None => info!("Total Execution Time: run not finished"),
    }
}

use crate::app::case::{TestCase, TestPriority, TestStatus};
use crate::app::suite::{Tally, TestSuite};
use crate::app::Framework;
use serde_derive::Serialize;
use std::time::Duration;

/// Snapshot of a run, everything any report format shows.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub uuid: uuid::Uuid,
    pub name: String,
    pub generated: String,
    pub summary: Summary,
    pub suites: Vec<SuiteReport>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub suites: usize,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub not_run: usize,
    pub pass_rate: f64,
    /// Wall clock time between framework start and the end of `run_all`.
    #[serde(with = "crate::reporter::serialize::optional_millis")]
    pub duration: Option<Duration>,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SuiteReport {
    pub name: String,
    pub enabled: bool,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub not_run: usize,
    #[serde(with = "crate::reporter::serialize::millis")]
    pub duration: Duration,
    pub tests: Vec<CaseReport>,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CaseReport {
    pub name: String,
    pub description: String,
    pub priority: TestPriority,
    pub status: TestStatus,
    #[serde(with = "crate::reporter::serialize::optional_millis")]
    pub duration: Option<Duration>,
    pub measured: f64,
    pub expected: f64,
    pub tolerance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub details: String,
}

impl Report {
    pub fn collect(framework: &Framework) -> Self {
        let totals = framework.totals();
        Self {
            uuid: uuid::Uuid::new_v4(),
            name: framework.settings().name.clone(),
            generated: chrono::Local::now().to_rfc3339(),
            summary: Summary::new(framework.suites().len(), totals, framework.elapsed()),
            suites: framework.suites().iter().map(SuiteReport::from).collect(),
        }
    }

    pub fn case(&self, suite: &str, name: &str) -> Option<&CaseReport> {
        self.suites
            .iter()
            .find(|s| s.name == suite)
            .and_then(|s| s.tests.iter().find(|t| t.name == name))
    }
}

impl Summary {
    fn new(suites: usize, totals: &Tally, duration: Option<Duration>) -> Self {
        Self {
            suites,
            total: totals.total,
            passed: totals.passed,
            failed: totals.failed,
            skipped: totals.skipped,
            not_run: totals.pending,
            pass_rate: totals.pass_rate(),
            duration,
        }
    }
}

impl From<&TestSuite> for SuiteReport {
    fn from(suite: &TestSuite) -> Self {
        let tally = suite.tally();
        Self {
            name: suite.name().to_owned(),
            enabled: suite.enabled(),
            total: tally.total,
            passed: tally.passed,
            failed: tally.failed,
            skipped: tally.skipped,
            not_run: tally.pending,
            duration: tally.duration,
            tests: suite.cases().map(CaseReport::from).collect(),
        }
    }
}

impl From<&TestCase> for CaseReport {
    fn from(case: &TestCase) -> Self {
        Self {
            name: case.name().to_owned(),
            description: case.description().to_owned(),
            priority: case.priority(),
            status: case.status(),
            duration: case.duration(),
            measured: case.measured(),
            expected: case.expected(),
            tolerance: case.tolerance(),
            error_message: case.error_message().map(str::to_owned),
            details: case.details().to_owned(),
        }
    }
}

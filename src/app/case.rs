use crate::app::error::{ConfigurationError, UsageError};
use serde_derive::Serialize;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Pending,
    Running,
    Passed,
    Failed,
    Skipped,
    Error,
}

impl TestStatus {
    pub fn is_terminal(self) -> bool {
        match self {
            TestStatus::Pending | TestStatus::Running => false,
            TestStatus::Passed | TestStatus::Failed | TestStatus::Skipped | TestStatus::Error => {
                true
            }
        }
    }

    /// Label used in logs and in every report format.
    pub fn label(self) -> &'static str {
        match self {
            TestStatus::Pending => "NOT RUN",
            TestStatus::Running => "RUNNING",
            TestStatus::Passed => "PASS",
            TestStatus::Failed => "FAIL",
            TestStatus::Skipped => "SKIP",
            TestStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TestPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for TestPriority {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            TestPriority::Low => "low",
            TestPriority::Medium => "medium",
            TestPriority::High => "high",
            TestPriority::Critical => "critical",
        };
        f.write_str(name)
    }
}

/// The terminal status a running test may be ended with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    Failed,
    Skipped,
    Error,
}

impl From<Verdict> for TestStatus {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Passed => TestStatus::Passed,
            Verdict::Failed => TestStatus::Failed,
            Verdict::Skipped => TestStatus::Skipped,
            Verdict::Error => TestStatus::Error,
        }
    }
}

/// Everything a check reports when it ends a test.
///
/// The framework stores these values as given; comparing measured against
/// expected within tolerance is the check's job.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct Outcome {
    pub verdict: Verdict,
    #[builder(default)]
    pub measured: f64,
    #[builder(default)]
    pub expected: f64,
    #[builder(default)]
    pub tolerance: f64,
    #[builder(setter(into), default)]
    pub message: String,
}

impl Outcome {
    pub fn builder() -> OutcomeBuilder {
        OutcomeBuilder::default()
    }

    /// Assembles an outcome from a builder, reporting a missing verdict as a
    /// configuration problem.
    pub fn build(builder: &OutcomeBuilder) -> Result<Self, ConfigurationError> {
        builder
            .build()
            .map_err(|e| ConfigurationError::Invalid(e.to_string()))
    }

    pub fn passed(measured: f64, expected: f64, tolerance: f64) -> Self {
        Self::with_verdict(Verdict::Passed, measured, expected, tolerance, String::new())
    }

    pub fn failed(
        measured: f64,
        expected: f64,
        tolerance: f64,
        message: impl Into<String>,
    ) -> Self {
        Self::with_verdict(Verdict::Failed, measured, expected, tolerance, message.into())
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::with_verdict(Verdict::Skipped, 0.0, 0.0, 0.0, reason.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::with_verdict(Verdict::Error, 0.0, 0.0, 0.0, message.into())
    }

    /// Passed when `ok`, otherwise Failed with `message`.
    pub fn judge(
        ok: bool,
        measured: f64,
        expected: f64,
        tolerance: f64,
        message: impl Into<String>,
    ) -> Self {
        if ok {
            Self::passed(measured, expected, tolerance)
        } else {
            Self::failed(measured, expected, tolerance, message)
        }
    }

    fn with_verdict(
        verdict: Verdict,
        measured: f64,
        expected: f64,
        tolerance: f64,
        message: String,
    ) -> Self {
        Self {
            verdict,
            measured,
            expected,
            tolerance,
            message,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    name: String,
    description: String,
    priority: TestPriority,
    status: TestStatus,
    started_at: Option<Duration>,
    ended_at: Option<Duration>,
    measured: f64,
    expected: f64,
    tolerance: f64,
    message: String,
}

impl TestCase {
    pub fn new(name: impl Into<String>, description: impl Into<String>, priority: TestPriority) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            priority,
            status: TestStatus::Pending,
            started_at: None,
            ended_at: None,
            measured: 0.0,
            expected: 0.0,
            tolerance: 0.0,
            message: String::new(),
        }
    }

    pub fn start(&mut self, now: Duration) -> Result<(), UsageError> {
        if self.status != TestStatus::Pending {
            return Err(UsageError::NotPending {
                name: self.name.clone(),
                status: self.status,
            });
        }
        self.status = TestStatus::Running;
        self.started_at = Some(now);
        debug!("Starting test: {}", self.name);
        Ok(())
    }

    pub fn end(&mut self, now: Duration, outcome: Outcome) -> Result<(), UsageError> {
        if self.status != TestStatus::Running {
            return Err(UsageError::NotRunning {
                name: self.name.clone(),
                status: self.status,
            });
        }
        self.status = outcome.verdict.into();
        self.ended_at = Some(now);
        self.measured = outcome.measured;
        self.expected = outcome.expected;
        self.tolerance = outcome.tolerance;
        self.message = match outcome.verdict {
            Verdict::Passed => String::new(),
            Verdict::Failed | Verdict::Skipped | Verdict::Error => {
                if outcome.message.is_empty() {
                    warn!("Test '{}' ended {} without a message", self.name, self.status);
                }
                outcome.message
            }
        };
        Ok(())
    }

    /// Forgets everything recorded by a previous run.
    pub fn reset(&mut self) {
        *self = Self::new(
            std::mem::take(&mut self.name),
            std::mem::take(&mut self.description),
            self.priority,
        );
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn priority(&self) -> TestPriority {
        self.priority
    }

    pub fn status(&self) -> TestStatus {
        self.status
    }

    pub fn started_at(&self) -> Option<Duration> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<Duration> {
        self.ended_at
    }

    /// Only defined once the test reached a terminal status.
    pub fn duration(&self) -> Option<Duration> {
        if !self.status.is_terminal() {
            return None;
        }
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => Some(end.checked_sub(start).unwrap_or_default()),
            _ => None,
        }
    }

    pub fn measured(&self) -> f64 {
        self.measured
    }

    pub fn expected(&self) -> f64 {
        self.expected
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Reason recorded with any non-passing verdict, skip reasons included.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn error_message(&self) -> Option<&str> {
        match self.status {
            TestStatus::Failed | TestStatus::Error => Some(&self.message),
            TestStatus::Pending | TestStatus::Running | TestStatus::Passed | TestStatus::Skipped => {
                None
            }
        }
    }

    /// Error text for non-passing tests when one was given, the description otherwise.
    pub fn details(&self) -> &str {
        match self.status {
            TestStatus::Failed | TestStatus::Error | TestStatus::Skipped if !self.message.is_empty() => {
                &self.message
            }
            _ => &self.description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_case_lifecycle_records_timing_and_values() {
        let mut case = TestCase::new("Pin0_High", "drive pin 0 high", TestPriority::High);
        assert_eq!(case.status(), TestStatus::Pending);
        assert_eq!(case.duration(), None);

        case.start(ms(10)).unwrap();
        assert_eq!(case.status(), TestStatus::Running);
        assert_eq!(case.duration(), None);

        case.end(ms(35), Outcome::passed(1.0, 1.0, 0.0)).unwrap();
        assert_eq!(case.status(), TestStatus::Passed);
        assert_eq!(case.duration(), Some(ms(25)));
        assert_eq!(case.measured(), 1.0);
        assert_eq!(case.error_message(), None);
        assert_eq!(case.details(), "drive pin 0 high");
    }

    #[test]
    fn test_end_on_pending_case_is_rejected() {
        let mut case = TestCase::new("never_started", "", TestPriority::Low);
        let result = case.end(ms(1), Outcome::passed(0.0, 0.0, 0.0));

        assert_eq!(
            result,
            Err(UsageError::NotRunning {
                name: "never_started".to_owned(),
                status: TestStatus::Pending
            })
        );
        assert_eq!(case.status(), TestStatus::Pending);
    }

    #[test]
    fn test_double_start_is_rejected() {
        let mut case = TestCase::new("twice", "", TestPriority::Medium);
        case.start(ms(0)).unwrap();

        assert!(matches!(case.start(ms(1)), Err(UsageError::NotPending { .. })));
        assert_eq!(case.started_at(), Some(ms(0)));
    }

    #[test]
    fn test_terminal_case_cannot_restart() {
        let mut case = TestCase::new("done", "", TestPriority::Medium);
        case.start(ms(0)).unwrap();
        case.end(ms(1), Outcome::error("bus fault")).unwrap();

        assert!(matches!(
            case.start(ms(2)),
            Err(UsageError::NotPending {
                status: TestStatus::Error,
                ..
            })
        ));
        assert!(matches!(case.end(ms(2), Outcome::passed(0.0, 0.0, 0.0)), Err(UsageError::NotRunning { .. })));
    }

    #[test]
    fn test_passed_verdict_drops_message() {
        let mut case = TestCase::new("clean", "desc", TestPriority::Low);
        case.start(ms(0)).unwrap();
        let outcome = Outcome::build(Outcome::builder().verdict(Verdict::Passed).message("noise")).unwrap();
        case.end(ms(0), outcome).unwrap();

        assert_eq!(case.message(), "");
    }

    #[test]
    fn test_failure_keeps_exact_message() {
        let mut case = TestCase::new("Pin1_Stuck", "desc", TestPriority::High);
        case.start(ms(0)).unwrap();
        case.end(ms(2), Outcome::failed(0.0, 1.0, 0.0, "readback mismatch")).unwrap();

        assert_eq!(case.error_message(), Some("readback mismatch"));
        assert_eq!(case.details(), "readback mismatch");
    }

    #[test]
    fn test_failure_without_message_is_accepted() {
        let mut case = TestCase::new("quiet", "falls back to description", TestPriority::Low);
        case.start(ms(0)).unwrap();
        case.end(ms(0), Outcome::failed(0.0, 1.0, 0.0, "")).unwrap();

        assert_eq!(case.status(), TestStatus::Failed);
        assert_eq!(case.details(), "falls back to description");
    }

    #[test]
    fn test_builder_requires_verdict() {
        let result = Outcome::build(Outcome::builder().measured(2.0));

        assert!(matches!(result, Err(ConfigurationError::Invalid(_))));
    }

    #[test]
    fn test_reset_returns_case_to_pending() {
        let mut case = TestCase::new("again", "desc", TestPriority::Critical);
        case.start(ms(3)).unwrap();
        case.end(ms(4), Outcome::skipped("not wired")).unwrap();
        case.reset();

        assert_eq!(case, TestCase::new("again", "desc", TestPriority::Critical));
    }

    #[test]
    fn test_priority_ordering() {
        assert!(TestPriority::Low < TestPriority::Medium);
        assert!(TestPriority::Medium < TestPriority::High);
        assert!(TestPriority::High < TestPriority::Critical);
    }
}

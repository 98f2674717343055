pub mod assert;
pub mod case;
pub mod error;
pub mod executor;
pub mod hooks;
pub mod suite;

use crate::app::case::{Outcome, TestCase, TestPriority, TestStatus};
use crate::app::error::{ConfigurationError, UsageError};
use crate::app::hooks::Check;
use crate::app::suite::{Tally, TestSuite};
use crate::configuration::constants::exit_code;
use crate::reporter::ReportTarget;
use crate::time::Clock;
use std::rc::Rc;
use std::time::Duration;

/// Configuration snapshot a run is created with.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct Settings {
    #[builder(setter(into), default = "String::from(\"Validation run\")")]
    pub name: String,
    #[builder(default)]
    pub report: ReportTarget,
    #[builder(default)]
    pub verbose: bool,
    #[builder(default)]
    pub stop_on_failure: bool,
}

impl Settings {
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            name: String::from("Validation run"),
            report: ReportTarget::default(),
            verbose: false,
            stop_on_failure: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SuiteId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaseId {
    suite: usize,
    index: usize,
}

impl CaseId {
    pub fn suite(&self) -> SuiteId {
        SuiteId(self.suite)
    }
}

/// Owns every suite of one validation run and the run level totals.
#[derive(Debug)]
pub struct Framework {
    settings: Settings,
    clock: Rc<dyn Clock>,
    suites: Vec<TestSuite>,
    totals: Tally,
    started_at: Duration,
    ended_at: Option<Duration>,
    halted: bool,
}

impl Framework {
    pub fn new(settings: Settings, clock: Rc<dyn Clock>) -> Self {
        info!("=== {} ===", settings.name);
        info!("Report: {} ({})", settings.report.destination, settings.report.format);
        info!("Verbose mode: {}", enabled(settings.verbose));
        info!("Stop on failure: {}", enabled(settings.stop_on_failure));
        let started_at = clock.now();
        Self {
            settings,
            clock,
            suites: Vec::new(),
            totals: Tally::default(),
            started_at,
            ended_at: None,
            halted: false,
        }
    }

    pub fn add_suite(
        &mut self,
        name: impl Into<String>,
        capacity_hint: usize,
    ) -> Result<SuiteId, ConfigurationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ConfigurationError::EmptySuiteName);
        }
        if capacity_hint == 0 {
            return Err(ConfigurationError::ZeroCapacity(name));
        }
        if self.suites.iter().any(|suite| suite.name() == name) {
            return Err(ConfigurationError::DuplicateSuite(name));
        }
        info!("Added test suite: {} (capacity: {} tests)", name, capacity_hint);
        self.suites.push(TestSuite::new(name, capacity_hint));
        Ok(SuiteId(self.suites.len() - 1))
    }

    /// Registers a test the harness drives itself through `start` and `end`.
    pub fn add_test(
        &mut self,
        suite: SuiteId,
        name: impl Into<String>,
        description: impl Into<String>,
        priority: TestPriority,
    ) -> Result<CaseId, ConfigurationError> {
        self.register(suite, TestCase::new(name, description, priority), None)
    }

    /// Registers a test whose body `run_all` executes.
    pub fn add_check(
        &mut self,
        suite: SuiteId,
        name: impl Into<String>,
        description: impl Into<String>,
        priority: TestPriority,
        check: impl Check + 'static,
    ) -> Result<CaseId, ConfigurationError> {
        let case = TestCase::new(name, description, priority);
        self.register(suite, case, Some(Box::new(check)))
    }

    fn register(
        &mut self,
        id: SuiteId,
        case: TestCase,
        check: Option<Box<dyn Check>>,
    ) -> Result<CaseId, ConfigurationError> {
        let suite = self
            .suites
            .get_mut(id.0)
            .ok_or(ConfigurationError::UnknownSuite(id.0))?;
        if case.name().trim().is_empty() {
            return Err(ConfigurationError::EmptyTestName(suite.name().to_owned()));
        }
        if suite.contains(case.name()) {
            return Err(ConfigurationError::DuplicateTest {
                suite: suite.name().to_owned(),
                name: case.name().to_owned(),
            });
        }
        if self.settings.verbose {
            info!("  Added test: {}", case.name());
        }
        let index = suite.push(case, check);
        self.rollup();
        Ok(CaseId { suite: id.0, index })
    }

    pub fn set_enabled(&mut self, id: SuiteId, enabled: bool) -> Result<(), ConfigurationError> {
        let suite = self
            .suites
            .get_mut(id.0)
            .ok_or(ConfigurationError::UnknownSuite(id.0))?;
        suite.set_enabled(enabled);
        Ok(())
    }

    pub fn start(&mut self, id: CaseId) -> Result<(), UsageError> {
        let now = self.clock.now();
        let halted = self.halted;
        let case = self.case_mut(id)?;
        if halted && case.status() == TestStatus::Pending {
            return Err(UsageError::Halted {
                name: case.name().to_owned(),
            });
        }
        case.start(now)
    }

    pub fn end(&mut self, id: CaseId, outcome: Outcome) -> Result<(), UsageError> {
        let now = self.clock.now();
        let verbose = self.settings.verbose;
        let case = self.case_mut(id)?;
        executor::finish(case, now, outcome, verbose)?;
        let status = case.status();
        if self.settings.stop_on_failure && executor::is_failure(status) {
            self.halted = true;
        }
        if let Some(suite) = self.suites.get_mut(id.suite) {
            let _ = suite.rollup();
        }
        self.rollup();
        Ok(())
    }

    /// Cooperative stop signal for harness code driving tests by hand.
    pub fn should_stop(&self) -> bool {
        self.halted
    }

    /// Recomputes run totals from the suite counters.
    pub fn rollup(&mut self) -> &Tally {
        self.totals = Tally::sum(self.suites.iter().map(TestSuite::tally));
        &self.totals
    }

    /// Puts every test back to pending for an immediate re-run.
    pub fn reset(&mut self) {
        for suite in self.suites.iter_mut() {
            suite.reset();
        }
        self.rollup();
        self.started_at = self.clock.now();
        self.ended_at = None;
        self.halted = false;
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn suites(&self) -> &[TestSuite] {
        &self.suites
    }

    pub fn suite(&self, id: SuiteId) -> Option<&TestSuite> {
        self.suites.get(id.0)
    }

    pub fn suite_by_name(&self, name: &str) -> Option<(SuiteId, &TestSuite)> {
        self.suites
            .iter()
            .enumerate()
            .find(|(_, suite)| suite.name() == name)
            .map(|(index, suite)| (SuiteId(index), suite))
    }

    pub fn case(&self, id: CaseId) -> Option<&TestCase> {
        self.suites.get(id.suite).and_then(|suite| suite.case(id.index))
    }

    fn case_mut(&mut self, id: CaseId) -> Result<&mut TestCase, UsageError> {
        self.suites
            .get_mut(id.suite)
            .and_then(|suite| suite.entry_mut(id.index))
            .map(|entry| &mut entry.case)
            .ok_or(UsageError::UnknownCase {
                suite: id.suite,
                index: id.index,
            })
    }

    pub fn totals(&self) -> &Tally {
        &self.totals
    }

    pub fn total_tests(&self) -> usize {
        self.totals.total
    }

    pub fn total_passed(&self) -> usize {
        self.totals.passed
    }

    pub fn total_failed(&self) -> usize {
        self.totals.failed
    }

    pub fn total_skipped(&self) -> usize {
        self.totals.skipped
    }

    pub fn pass_rate(&self) -> f64 {
        self.totals.pass_rate()
    }

    pub fn started_at(&self) -> Duration {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<Duration> {
        self.ended_at
    }

    /// Wall clock time of the whole run, known once `run_all` completed.
    pub fn elapsed(&self) -> Option<Duration> {
        self.ended_at
            .map(|end| end.checked_sub(self.started_at).unwrap_or_default())
    }

    /// 0 when nothing failed, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.totals.failed == 0 {
            exit_code::SUCCESS
        } else {
            exit_code::TESTS_FAILED
        }
    }

    pub(crate) fn clock(&self) -> Rc<dyn Clock> {
        Rc::clone(&self.clock)
    }
}

fn enabled(flag: bool) -> &'static str {
    if flag {
        "Enabled"
    } else {
        "Disabled"
    }
}

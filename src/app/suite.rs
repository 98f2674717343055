use crate::app::case::{TestCase, TestStatus};
use crate::app::hooks::Check;
use derivative::*;
use std::time::Duration;

/// Counters derived from a set of test cases.
///
/// `Error` verdicts are counted as failures; `pending` holds everything not
/// yet terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Tally {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub pending: usize,
    pub duration: Duration,
}

impl Tally {
    pub fn of<'a>(cases: impl IntoIterator<Item = &'a TestCase>) -> Self {
        cases.into_iter().fold(Tally::default(), |mut tally, case| {
            tally.total += 1;
            match case.status() {
                TestStatus::Passed => tally.passed += 1,
                TestStatus::Failed | TestStatus::Error => tally.failed += 1,
                TestStatus::Skipped => tally.skipped += 1,
                TestStatus::Pending | TestStatus::Running => tally.pending += 1,
            }
            tally.duration += case.duration().unwrap_or_default();
            tally
        })
    }

    pub fn sum<'a>(tallies: impl IntoIterator<Item = &'a Tally>) -> Self {
        tallies.into_iter().fold(Tally::default(), |acc, t| Tally {
            total: acc.total + t.total,
            passed: acc.passed + t.passed,
            failed: acc.failed + t.failed,
            skipped: acc.skipped + t.skipped,
            pending: acc.pending + t.pending,
            duration: acc.duration + t.duration,
        })
    }

    /// Fraction of registered tests that passed, 0.0 for an empty run.
    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.passed as f64 / self.total as f64
        }
    }
}

#[derive(Derivative)]
#[derivative(Debug)]
pub(crate) struct Entry {
    pub case: TestCase,
    #[derivative(Debug = "ignore")]
    pub check: Option<Box<dyn Check>>,
}

#[derive(Debug)]
pub struct TestSuite {
    name: String,
    enabled: bool,
    entries: Vec<Entry>,
    tally: Tally,
}

impl TestSuite {
    pub(crate) fn new(name: String, capacity: usize) -> Self {
        Self {
            name,
            enabled: true,
            entries: Vec::with_capacity(capacity),
            tally: Tally::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn cases(&self) -> impl Iterator<Item = &TestCase> {
        self.entries.iter().map(|entry| &entry.case)
    }

    pub fn case(&self, index: usize) -> Option<&TestCase> {
        self.entries.get(index).map(|entry| &entry.case)
    }

    pub fn find(&self, name: &str) -> Option<&TestCase> {
        self.cases().find(|case| case.name() == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn passed(&self) -> usize {
        self.tally.passed
    }

    pub fn failed(&self) -> usize {
        self.tally.failed
    }

    pub fn skipped(&self) -> usize {
        self.tally.skipped
    }

    pub fn duration(&self) -> Duration {
        self.tally.duration
    }

    pub fn tally(&self) -> &Tally {
        &self.tally
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub(crate) fn push(&mut self, case: TestCase, check: Option<Box<dyn Check>>) -> usize {
        self.entries.push(Entry { case, check });
        self.rollup();
        self.entries.len() - 1
    }

    pub(crate) fn entry_mut(&mut self, index: usize) -> Option<&mut Entry> {
        self.entries.get_mut(index)
    }

    pub(crate) fn entries_mut(&mut self) -> std::slice::IterMut<'_, Entry> {
        self.entries.iter_mut()
    }

    /// Recomputes the counters from the cases, discarding the previous values.
    pub(crate) fn rollup(&mut self) -> &Tally {
        self.tally = Tally::of(self.cases());
        &self.tally
    }

    pub(crate) fn reset(&mut self) {
        for entry in self.entries.iter_mut() {
            entry.case.reset();
        }
        self.rollup();
    }
}

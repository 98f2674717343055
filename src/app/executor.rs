use crate::app::case::{Outcome, TestCase, TestStatus};
use crate::app::error::UsageError;
use crate::app::hooks::Context;
use crate::app::suite::{Entry, Tally, TestSuite};
use crate::app::Framework;
use crate::device::Device;
use crate::time::{as_millis_f64, Clock};
use std::time::Duration;

pub(crate) const DISABLED_REASON: &str = "suite disabled";

/// Walks suites in registration order and tests in insertion order.
struct Executor<'a> {
    clock: &'a dyn Clock,
    device: &'a mut dyn Device,
    verbose: bool,
    stop_on_failure: bool,
    halted: bool,
}

impl<'a> Executor<'a> {
    /// Runs one suite; its counters are rolled up even when the harness broke.
    fn run_suite(&mut self, suite: &mut TestSuite) -> Result<(), UsageError> {
        let result = self.drive(suite);
        let _ = suite.rollup();
        result
    }

    fn drive(&mut self, suite: &mut TestSuite) -> Result<(), UsageError> {
        if self.halted {
            debug!("Run halted, leaving pending tests of suite '{}' untouched", suite.name());
            return ensure_none_running(suite);
        }
        if !suite.enabled() {
            info!("Suite '{}' disabled, skipping {} tests", suite.name(), suite.len());
            ensure_none_running(suite)?;
            return self.skip_pending(suite);
        }
        info!("Running suite '{}' ({} tests)", suite.name(), suite.len());
        let suite_name = suite.name().to_owned();
        for Entry { case, check } in suite.entries_mut() {
            match case.status() {
                TestStatus::Running => {
                    return Err(UsageError::StillRunning {
                        suite: suite_name,
                        name: case.name().to_owned(),
                    });
                }
                TestStatus::Passed | TestStatus::Failed | TestStatus::Skipped | TestStatus::Error => {
                    trace!("Test '{}' already {}", case.name(), case.status());
                }
                TestStatus::Pending if self.halted => {
                    trace!("Test '{}' left pending, run halted", case.name());
                    continue;
                }
                TestStatus::Pending => {
                    let check = match check.as_mut() {
                        Some(check) => check,
                        None => {
                            return Err(UsageError::NeverStarted {
                                suite: suite_name,
                                name: case.name().to_owned(),
                            })
                        }
                    };
                    case.start(self.clock.now())?;
                    let result = {
                        let mut ctx = Context::new(&mut *self.device, self.clock, self.verbose);
                        check.execute(&mut ctx)
                    };
                    let outcome = result.unwrap_or_else(|e| {
                        error!("Device error in '{}': {}", case.name(), e);
                        Outcome::error(format!("device error: {}", e))
                    });
                    finish(case, self.clock.now(), outcome, self.verbose)?;
                }
            }
            if self.stop_on_failure && is_failure(case.status()) && !self.halted {
                warn!("Stop on failure: halting after '{}'", case.name());
                self.halted = true;
            }
        }
        Ok(())
    }

    fn skip_pending(&mut self, suite: &mut TestSuite) -> Result<(), UsageError> {
        for Entry { case, .. } in suite.entries_mut() {
            if case.status() == TestStatus::Pending {
                let now = self.clock.now();
                case.start(now)?;
                finish(case, now, Outcome::skipped(DISABLED_REASON), self.verbose)?;
            }
        }
        Ok(())
    }
}

impl Framework {
    /// Executes every pending test that has a check, then rolls the counters up.
    ///
    /// Tests the harness already finished are kept as they are. A test still
    /// running, or pending without a check while the run is not halted, means
    /// the harness is broken and aborts the run.
    pub fn run_all(&mut self, device: &mut dyn Device) -> Result<Tally, UsageError> {
        info!("=== Running All Validation Tests ===");
        let clock = self.clock();
        let mut executor = Executor {
            clock: clock.as_ref(),
            device,
            verbose: self.settings.verbose,
            stop_on_failure: self.settings.stop_on_failure,
            halted: self.halted,
        };
        let mut result = Ok(());
        for suite in self.suites.iter_mut() {
            result = executor.run_suite(suite);
            if result.is_err() {
                break;
            }
        }
        self.halted = executor.halted;
        let totals = *self.rollup();
        result?;
        self.ended_at = Some(clock.now());
        debug!("Run totals {:?}", totals);
        Ok(totals)
    }
}

/// A test left running by the harness breaks the run wherever it sits.
fn ensure_none_running(suite: &TestSuite) -> Result<(), UsageError> {
    match suite.cases().find(|case| case.status() == TestStatus::Running) {
        Some(case) => Err(UsageError::StillRunning {
            suite: suite.name().to_owned(),
            name: case.name().to_owned(),
        }),
        None => Ok(()),
    }
}

pub(crate) fn is_failure(status: TestStatus) -> bool {
    match status {
        TestStatus::Failed | TestStatus::Error => true,
        TestStatus::Pending | TestStatus::Running | TestStatus::Passed | TestStatus::Skipped => false,
    }
}

/// Ends a running test and logs its verdict line.
pub(crate) fn finish(
    case: &mut TestCase,
    now: Duration,
    outcome: Outcome,
    verbose: bool,
) -> Result<(), UsageError> {
    case.end(now, outcome)?;
    let seconds = as_millis_f64(case.duration().unwrap_or_default()) / 1000.0;
    info!("[{}] {} ({:.3}s)", case.status(), case.name(), seconds);
    match case.status() {
        TestStatus::Failed | TestStatus::Error => info!("  Error: {}", case.message()),
        TestStatus::Passed if verbose => info!(
            "  Measured: {:.3}, Expected: {:.3} ± {:.3}",
            case.measured(),
            case.expected(),
            case.tolerance()
        ),
        TestStatus::Skipped => debug!("  Reason: {}", case.message()),
        TestStatus::Pending | TestStatus::Running | TestStatus::Passed => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::app::case::{Outcome, TestPriority, TestStatus};
    use crate::app::error::UsageError;
    use crate::app::hooks::{CheckResult, Context};
    use crate::app::suite::{Tally, TestSuite};
    use crate::app::{Framework, Settings};
    use crate::device::hal::Hal;
    use crate::device::simulated::SimulatedDevice;
    use crate::device::DeviceError;
    use crate::time::ManualClock;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    fn framework(stop_on_failure: bool) -> (Framework, ManualClock) {
        let clock = ManualClock::new();
        let settings = Settings {
            stop_on_failure,
            ..Settings::default()
        };
        (Framework::new(settings, Rc::new(clock.clone())), clock)
    }

    fn pass(_: &mut Context<'_>) -> Result<Outcome, DeviceError> {
        Ok(Outcome::passed(1.0, 1.0, 0.0))
    }

    fn fail(_: &mut Context<'_>) -> Result<Outcome, DeviceError> {
        Ok(Outcome::failed(0.0, 1.0, 0.0, "readback mismatch"))
    }

    #[test]
    fn test_checks_run_in_registration_order() {
        let (mut framework, _) = framework(false);
        let order = Rc::new(Cell::new(0));
        let suite = framework.add_suite("Order", 3).unwrap();
        for expected in 0..3 {
            let order = Rc::clone(&order);
            let _ = framework
                .add_check(suite, format!("step_{}", expected), "", TestPriority::Low, move |_: &mut Context<'_>| -> CheckResult {
                    let seen = order.get();
                    order.set(seen + 1);
                    Ok(Outcome::judge(seen == expected, seen as f64, expected as f64, 0.0, "out of order"))
                })
                .unwrap();
        }

        let totals = framework.run_all(&mut SimulatedDevice::default()).unwrap();

        assert_eq!(totals.passed, 3);
        assert_eq!(order.get(), 3);
    }

    #[test]
    fn test_check_drives_device_and_records_timing() {
        let (mut framework, clock) = framework(false);
        let suite = framework.add_suite("GPIO", 1).unwrap();
        let case = framework
            .add_check(suite, "Pin0_High", "", TestPriority::High, |ctx: &mut Context<'_>| -> CheckResult {
                let mut hal = ctx.hal();
                hal.gpio_write(0, true)?;
                let level = hal.gpio_read(0)?;
                ctx.delay(Duration::from_millis(5));
                Ok(Outcome::judge(level, level as u8 as f64, 1.0, 0.0, "readback mismatch"))
            })
            .unwrap();
        let mut device = SimulatedDevice::new(Rc::new(clock.clone()));

        let _ = framework.run_all(&mut device).unwrap();
        let case = framework.case(case).unwrap();

        assert_eq!(case.status(), TestStatus::Passed);
        assert_eq!(case.duration(), Some(Duration::from_millis(5)));
        assert_eq!(Hal::new(&mut device).gpio_read(0), Ok(true));
    }

    #[test]
    fn test_device_error_becomes_error_verdict() {
        let (mut framework, _) = framework(false);
        let suite = framework.add_suite("GPIO", 2).unwrap();
        let broken = framework
            .add_check(suite, "Pin40", "", TestPriority::Low, |ctx: &mut Context<'_>| -> CheckResult {
                let _ = ctx.hal().gpio_read(40)?;
                Ok(Outcome::passed(1.0, 1.0, 0.0))
            })
            .unwrap();
        let _ = framework.add_check(suite, "after", "", TestPriority::Low, pass).unwrap();

        let totals = framework.run_all(&mut SimulatedDevice::default()).unwrap();
        let broken = framework.case(broken).unwrap();

        assert_eq!(broken.status(), TestStatus::Error);
        assert!(broken.message().starts_with("device error"));
        assert_eq!(totals.failed, 1);
        assert_eq!(totals.passed, 1);
    }

    #[test]
    fn test_stop_on_failure_leaves_remaining_tests_pending() {
        let (mut framework, _) = framework(true);
        let suite = framework.add_suite("GPIO", 3).unwrap();
        let _ = framework.add_check(suite, "first", "", TestPriority::Low, pass).unwrap();
        let _ = framework.add_check(suite, "second", "", TestPriority::Low, fail).unwrap();
        let third = framework.add_check(suite, "third", "", TestPriority::Low, pass).unwrap();
        let later = framework.add_suite("Timer", 1).unwrap();
        let untouched = framework.add_check(later, "count", "", TestPriority::Low, pass).unwrap();

        let totals = framework.run_all(&mut SimulatedDevice::default()).unwrap();

        assert_eq!(framework.case(third).map(|c| c.status()), Some(TestStatus::Pending));
        assert_eq!(framework.case(untouched).map(|c| c.status()), Some(TestStatus::Pending));
        assert_eq!(totals.passed, 1);
        assert_eq!(totals.failed, 1);
        assert_eq!(totals.skipped, 0);
        assert_eq!(totals.pending, 2);
        assert!(framework.should_stop());
    }

    #[test]
    fn test_stop_on_failure_with_harness_driven_tests() {
        let (mut framework, _) = framework(true);
        let suite = framework.add_suite("GPIO", 3).unwrap();
        let ids: Vec<_> = ["first", "second", "third"]
            .iter()
            .map(|name| framework.add_test(suite, *name, "", TestPriority::Low).unwrap())
            .collect();
        let verdicts = vec![Outcome::passed(1.0, 1.0, 0.0), Outcome::failed(0.0, 1.0, 0.0, "stuck")];
        for (id, outcome) in ids.iter().zip(verdicts) {
            if framework.should_stop() {
                break;
            }
            framework.start(*id).unwrap();
            framework.end(*id, outcome).unwrap();
        }

        let _ = framework.run_all(&mut SimulatedDevice::default()).unwrap();

        assert_eq!(framework.case(ids[2]).map(|c| c.status()), Some(TestStatus::Pending));
        assert_eq!(framework.exit_code(), 1);
    }

    #[test]
    fn test_without_stop_on_failure_everything_runs() {
        let (mut framework, _) = framework(false);
        let suite = framework.add_suite("GPIO", 3).unwrap();
        let _ = framework.add_check(suite, "first", "", TestPriority::Low, fail).unwrap();
        let _ = framework.add_check(suite, "second", "", TestPriority::Low, pass).unwrap();

        let totals = framework.run_all(&mut SimulatedDevice::default()).unwrap();

        assert_eq!(totals.pending, 0);
        assert_eq!(totals.passed + totals.failed + totals.skipped, totals.total);
    }

    #[test]
    fn test_disabled_suite_is_reported_as_skipped() {
        let (mut framework, _) = framework(false);
        let suite = framework.add_suite("ADC", 2).unwrap();
        let case = framework.add_check(suite, "ADC_Channel_0", "", TestPriority::Medium, fail).unwrap();
        framework.set_enabled(suite, false).unwrap();

        let totals = framework.run_all(&mut SimulatedDevice::default()).unwrap();
        let case = framework.case(case).unwrap();

        assert_eq!(case.status(), TestStatus::Skipped);
        assert_eq!(case.message(), super::DISABLED_REASON);
        assert_eq!(totals.skipped, 1);
        assert_eq!(framework.exit_code(), 0);
    }

    #[test]
    fn test_rollup_pass_is_idempotent() {
        let (mut framework, _) = framework(false);
        let suite = framework.add_suite("GPIO", 2).unwrap();
        let _ = framework.add_check(suite, "first", "", TestPriority::Low, pass).unwrap();
        let _ = framework.add_check(suite, "second", "", TestPriority::Low, fail).unwrap();
        let mut device = SimulatedDevice::default();

        let first = framework.run_all(&mut device).unwrap();
        let second = framework.run_all(&mut device).unwrap();

        assert_eq!(first, second);
        assert_eq!(*framework.rollup(), second);
    }

    #[test]
    fn test_running_test_aborts_the_run() {
        let (mut framework, _) = framework(false);
        let suite = framework.add_suite("GPIO", 1).unwrap();
        let case = framework.add_test(suite, "Pin0", "", TestPriority::Low).unwrap();
        framework.start(case).unwrap();

        assert_eq!(
            framework.run_all(&mut SimulatedDevice::default()),
            Err(UsageError::StillRunning {
                suite: "GPIO".to_owned(),
                name: "Pin0".to_owned()
            })
        );
    }

    #[test]
    fn test_unstarted_test_without_check_aborts_the_run() {
        let (mut framework, _) = framework(false);
        let suite = framework.add_suite("GPIO", 1).unwrap();
        let _ = framework.add_test(suite, "Pin0", "", TestPriority::Low).unwrap();

        assert!(matches!(
            framework.run_all(&mut SimulatedDevice::default()),
            Err(UsageError::NeverStarted { .. })
        ));
    }

    #[test]
    fn test_aborted_run_keeps_counters_in_step() {
        let (mut framework, _) = framework(false);
        let suite = framework.add_suite("GPIO", 2).unwrap();
        let checked = framework.add_check(suite, "a", "", TestPriority::Low, pass).unwrap();
        let _ = framework.add_test(suite, "b", "", TestPriority::Low).unwrap();

        assert!(matches!(
            framework.run_all(&mut SimulatedDevice::default()),
            Err(UsageError::NeverStarted { .. })
        ));

        let fresh = Tally::of(framework.suite(suite).unwrap().cases());
        assert_eq!(framework.case(checked).map(|c| c.status()), Some(TestStatus::Passed));
        assert_eq!(framework.suite(suite).unwrap().tally(), &fresh);
        assert_eq!(framework.suite(suite).unwrap().passed(), 1);
        assert_eq!(framework.total_passed(), 1);
        assert_eq!(
            framework.totals(),
            &Tally::sum(framework.suites().iter().map(TestSuite::tally))
        );
        assert_eq!(framework.ended_at(), None);
    }

    #[test]
    fn test_running_test_after_halt_still_aborts_the_run() {
        let (mut framework, _) = framework(true);
        let first = framework.add_suite("A", 1).unwrap();
        let _ = framework.add_check(first, "a", "", TestPriority::Low, fail).unwrap();
        let second = framework.add_suite("B", 1).unwrap();
        let open = framework.add_test(second, "b", "", TestPriority::Low).unwrap();
        framework.start(open).unwrap();

        assert_eq!(
            framework.run_all(&mut SimulatedDevice::default()),
            Err(UsageError::StillRunning {
                suite: "B".to_owned(),
                name: "b".to_owned()
            })
        );
        assert!(framework.should_stop());
        assert_eq!(framework.total_failed(), 1);
    }

    #[test]
    fn test_running_test_in_disabled_suite_aborts_the_run() {
        let (mut framework, _) = framework(false);
        let suite = framework.add_suite("ADC", 1).unwrap();
        let open = framework.add_test(suite, "ADC_Channel_0", "", TestPriority::Low).unwrap();
        framework.start(open).unwrap();
        framework.set_enabled(suite, false).unwrap();

        assert!(matches!(
            framework.run_all(&mut SimulatedDevice::default()),
            Err(UsageError::StillRunning { .. })
        ));
    }
}

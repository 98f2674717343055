use crate::app::case::Outcome;
use crate::device::hal::Hal;
use crate::device::{Device, DeviceError};
use crate::time::Clock;
use std::time::Duration;

pub type CheckResult = Result<Outcome, DeviceError>;

/// What a check gets to work with while its test is running.
pub struct Context<'a> {
    device: &'a mut dyn Device,
    clock: &'a dyn Clock,
    verbose: bool,
}

impl<'a> Context<'a> {
    pub fn new(device: &'a mut dyn Device, clock: &'a dyn Clock, verbose: bool) -> Self {
        Self {
            device,
            clock,
            verbose,
        }
    }

    pub fn device(&mut self) -> &mut dyn Device {
        &mut *self.device
    }

    pub fn hal(&mut self) -> Hal<'_> {
        Hal::new(&mut *self.device)
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn delay(&self, duration: Duration) {
        self.clock.sleep(duration);
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

/// Harness supplied logic behind a single test case.
///
/// A returned `DeviceError` ends the test with an `Error` verdict; it never
/// stops the run.
pub trait Check {
    fn execute(&mut self, ctx: &mut Context<'_>) -> CheckResult;
}

impl<F> Check for F
where
    F: FnMut(&mut Context<'_>) -> CheckResult,
{
    fn execute(&mut self, ctx: &mut Context<'_>) -> CheckResult {
        self(ctx)
    }
}

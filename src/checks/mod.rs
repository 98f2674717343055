//! Built-in validation suites run against the FPGA peripherals.

pub mod adc;
pub mod gpio;
pub mod integration;
pub mod timer;
pub mod uart;

use crate::app::error::ConfigurationError;
use crate::app::Framework;
use crate::device::hal::{ADC_CHANNELS, DEFAULT_BAUDRATE};
use std::time::Duration;

/// Bench parameters the built-in checks measure against.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchSettings {
    pub adc_channels: u32,
    pub adc_reference: f64,
    pub uart_baudrate: u32,
    pub timer_settle: Duration,
    pub integration_settle: Duration,
    pub benchmark_iterations: u32,
    pub benchmark_budget: Duration,
}

impl BenchSettings {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.adc_channels == 0 || self.adc_channels > ADC_CHANNELS {
            return Err(ConfigurationError::Invalid(format!(
                "adc_channels must be between 1 and {}, got {}",
                ADC_CHANNELS, self.adc_channels
            )));
        }
        if self.adc_reference.is_nan() || self.adc_reference <= 0.0 {
            return Err(ConfigurationError::Invalid(format!(
                "adc_reference must be positive, got {}",
                self.adc_reference
            )));
        }
        let settle = self.timer_settle.as_micros();
        if settle == 0 || settle > u128::from(u32::MAX) {
            return Err(ConfigurationError::Invalid(format!(
                "timer_settle of {:?} must be at least 1us and fit the 32-bit timer",
                self.timer_settle
            )));
        }
        Ok(())
    }
}

impl Default for BenchSettings {
    fn default() -> Self {
        Self {
            adc_channels: 4,
            adc_reference: 3.3,
            uart_baudrate: DEFAULT_BAUDRATE,
            timer_settle: Duration::from_millis(100),
            integration_settle: Duration::from_millis(50),
            benchmark_iterations: 1000,
            benchmark_budget: Duration::from_secs(1),
        }
    }
}

/// Registers every built-in suite in execution order.
pub fn register_all(framework: &mut Framework, bench: &BenchSettings) -> Result<(), ConfigurationError> {
    bench.validate()?;
    let _ = gpio::register(framework)?;
    let _ = timer::register(framework, bench)?;
    let _ = adc::register(framework, bench)?;
    let _ = uart::register(framework, bench)?;
    let _ = integration::register(framework, bench)?;
    Ok(())
}

/// Timer ticks are microseconds on every supported bitstream.
pub(crate) fn micros(duration: Duration) -> f64 {
    duration.as_micros() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::case::TestStatus;
    use crate::app::Settings;
    use crate::device::simulated::SimulatedDevice;
    use crate::device::{Device, DeviceError, Peripheral, Register};
    use crate::time::ManualClock;
    use std::rc::Rc;

    /// Simulator whose timer ignores its enable bit and never counts.
    #[derive(Debug)]
    pub(crate) struct FrozenTimer(pub(crate) SimulatedDevice);

    impl Device for FrozenTimer {
        fn init(&mut self, peripheral: Peripheral) -> Result<(), DeviceError> {
            self.0.init(peripheral)
        }

        fn write(&mut self, register: Register, value: u32) -> Result<(), DeviceError> {
            match register {
                Register::TimerControl => Ok(()),
                _ => self.0.write(register, value),
            }
        }

        fn read(&mut self, register: Register) -> Result<u32, DeviceError> {
            self.0.read(register)
        }
    }

    pub(crate) fn bench_run(
        bench: &BenchSettings,
        configure: impl FnOnce(SimulatedDevice) -> SimulatedDevice,
    ) -> (Framework, SimulatedDevice) {
        let clock = ManualClock::new();
        let mut framework = Framework::new(Settings::default(), Rc::new(clock.clone()));
        register_all(&mut framework, bench).unwrap();
        let mut device = configure(SimulatedDevice::new(Rc::new(clock)));
        let _ = framework.run_all(&mut device).unwrap();
        (framework, device)
    }

    pub(crate) fn status(framework: &Framework, suite: &str, name: &str) -> Option<TestStatus> {
        framework
            .suite_by_name(suite)
            .and_then(|(_, suite)| suite.find(name))
            .map(|case| case.status())
    }

    #[test]
    fn test_healthy_bench_passes_everything() {
        let (framework, _) = bench_run(&BenchSettings::default(), |device| device);

        let names: Vec<&str> = framework.suites().iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec![
                gpio::SUITE,
                timer::SUITE,
                adc::SUITE,
                uart::SUITE,
                integration::SUITE
            ]
        );
        assert_eq!(framework.total_tests(), 13);
        assert_eq!(framework.total_passed(), 13);
        assert_eq!(framework.exit_code(), 0);
    }

    #[test]
    fn test_stuck_pin_fails_gpio_only() {
        let (framework, _) =
            bench_run(&BenchSettings::default(), |device| device.with_stuck_pin(0, false));

        assert_eq!(
            status(&framework, gpio::SUITE, "GPIO_Data_WriteRead"),
            Some(TestStatus::Failed)
        );
        assert_eq!(
            status(&framework, gpio::SUITE, "GPIO_Direction_Control"),
            Some(TestStatus::Passed)
        );
        assert_eq!(
            status(&framework, adc::SUITE, "ADC_Channel_0"),
            Some(TestStatus::Passed)
        );
        assert_eq!(framework.exit_code(), 1);
    }

    #[test]
    fn test_invalid_bench_is_rejected_before_registration() {
        let clock = ManualClock::new();
        let mut framework = Framework::new(Settings::default(), Rc::new(clock));
        let bench = BenchSettings {
            adc_channels: 9,
            ..BenchSettings::default()
        };

        assert!(matches!(
            register_all(&mut framework, &bench),
            Err(ConfigurationError::Invalid(_))
        ));
        assert!(framework.suites().is_empty());
    }

    #[test]
    fn test_zero_timer_settle_is_rejected() {
        let bench = BenchSettings {
            timer_settle: Duration::from_secs(0),
            ..BenchSettings::default()
        };

        assert!(matches!(bench.validate(), Err(ConfigurationError::Invalid(_))));
    }
}

use crate::app::error::ConfigurationError;
use crate::app::{Framework, Settings};
use crate::checks::BenchSettings;
use crate::configuration::command_line::Opt;
use crate::configuration::constants::common::{DEFAULT_RUN_NAME, ENV_PREFIX};
use crate::device::simulated::SimulatedDevice;
use crate::reporter::{Destination, ReportFormat, ReportTarget};
use crate::time::Clock;
use config::{Config, ConfigError, Environment, File};
use serde_derive::Deserialize;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Manifest {
    pub name: String,
    pub verbose: bool,
    pub stop_on_failure: bool,
    pub report: ReportEntry,
    /// When not empty, only these suites run.
    pub suites: Vec<String>,
    pub disabled_suites: Vec<String>,
    pub device: DeviceEntry,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReportEntry {
    #[serde(with = "crate::configuration::deserialize::destination")]
    pub path: Option<Destination>,
    #[serde(with = "crate::configuration::deserialize::report_format")]
    pub format: Option<ReportFormat>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DeviceEntry {
    pub adc_channels: u32,
    pub adc_reference: f64,
    pub uart_baudrate: u32,
    #[serde(with = "crate::configuration::deserialize::duration")]
    pub timer_settle: Duration,
    #[serde(with = "crate::configuration::deserialize::duration")]
    pub integration_settle: Duration,
    pub benchmark_iterations: u32,
    #[serde(with = "crate::configuration::deserialize::duration")]
    pub benchmark_budget: Duration,
    /// Raw samples the simulated ADC returns, by channel.
    pub adc_samples: Vec<u16>,
    pub stuck_pins: Vec<StuckPin>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct StuckPin {
    pub pin: u32,
    pub level: bool,
}

impl Manifest {
    pub fn from(file: &Path) -> Result<Self, ConfigError> {
        Self::load(Some(file))
    }

    /// Reads the manifest file when given, then `SILICHECK_*` environment overrides.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Config::new();
        if let Some(file) = file {
            config.merge(File::from(file))?;
        }
        config.merge(Environment::with_prefix(ENV_PREFIX))?;
        config.try_into()
    }

    /// Command line flags win over the manifest.
    pub fn apply(&mut self, opt: &Opt) {
        self.verbose |= opt.verbose;
        self.stop_on_failure |= opt.stop_on_fail;
        if let Some(destination) = &opt.report {
            self.report.path = Some(destination.clone());
        }
        if let Some(format) = opt.format {
            self.report.format = Some(format);
        }
        if !opt.suites.is_empty() {
            self.suites = opt.suites.clone();
        }
    }

    pub fn settings(&self) -> Settings {
        Settings {
            name: self.name.clone(),
            report: self.report.target(),
            verbose: self.verbose,
            stop_on_failure: self.stop_on_failure,
        }
    }

    /// Disables suites filtered out by `suites` and those listed in
    /// `disabled_suites`. Naming a suite that is not registered is an error.
    pub fn select_suites(&self, framework: &mut Framework) -> Result<(), ConfigurationError> {
        for name in self.suites.iter().chain(self.disabled_suites.iter()) {
            if framework.suite_by_name(name).is_none() {
                return Err(ConfigurationError::Invalid(format!("unknown suite '{}'", name)));
            }
        }
        let dropped: Vec<String> = framework
            .suites()
            .iter()
            .map(|suite| suite.name())
            .filter(|name| {
                let wanted = self.suites.is_empty() || self.suites.iter().any(|n| n == name);
                !wanted || self.disabled_suites.iter().any(|n| n == name)
            })
            .map(str::to_owned)
            .collect();
        for name in dropped {
            if let Some(id) = framework.suite_by_name(&name).map(|(id, _)| id) {
                info!("Suite {} disabled", name);
                framework.set_enabled(id, false)?;
            }
        }
        Ok(())
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            name: DEFAULT_RUN_NAME.to_owned(),
            verbose: false,
            stop_on_failure: false,
            report: ReportEntry::default(),
            suites: Vec::new(),
            disabled_suites: Vec::new(),
            device: DeviceEntry::default(),
        }
    }
}

impl ReportEntry {
    /// Explicit format first, then the destination's file extension, then HTML.
    pub fn target(&self) -> ReportTarget {
        let destination = self.path.clone().unwrap_or_default();
        let format = self
            .format
            .or_else(|| match &destination {
                Destination::File(path) => ReportFormat::from_path(path),
                Destination::Stdout => None,
            })
            .unwrap_or_default();
        ReportTarget {
            destination,
            format,
        }
    }
}

impl DeviceEntry {
    pub fn bench(&self) -> BenchSettings {
        BenchSettings {
            adc_channels: self.adc_channels,
            adc_reference: self.adc_reference,
            uart_baudrate: self.uart_baudrate,
            timer_settle: self.timer_settle,
            integration_settle: self.integration_settle,
            benchmark_iterations: self.benchmark_iterations,
            benchmark_budget: self.benchmark_budget,
        }
    }

    pub fn simulator(&self, clock: Rc<dyn Clock>) -> SimulatedDevice {
        let device = self
            .adc_samples
            .iter()
            .enumerate()
            .fold(SimulatedDevice::new(clock), |device, (channel, raw)| {
                device.with_adc_sample(channel as u32, *raw)
            });
        self.stuck_pins
            .iter()
            .fold(device, |device, stuck| device.with_stuck_pin(stuck.pin, stuck.level))
    }
}

impl Default for DeviceEntry {
    fn default() -> Self {
        let bench = BenchSettings::default();
        Self {
            adc_channels: bench.adc_channels,
            adc_reference: bench.adc_reference,
            uart_baudrate: bench.uart_baudrate,
            timer_settle: bench.timer_settle,
            integration_settle: bench.integration_settle,
            benchmark_iterations: bench.benchmark_iterations,
            benchmark_budget: bench.benchmark_budget,
            adc_samples: Vec::new(),
            stuck_pins: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::case::TestStatus;
    use crate::checks;
    use crate::time::ManualClock;
    use std::fs;
    use std::path::PathBuf;
    use structopt::StructOpt;

    fn write_manifest(extension: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("silicheck-{}.{}", uuid::Uuid::new_v4(), extension));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_loads_yaml_manifest() {
        let path = write_manifest(
            "yaml",
            r#"
name: Board 7
stop_on_failure: true
report:
  path: out/board7.json
disabled_suites:
  - UART Validation
device:
  adc_channels: 2
  timer_settle: 20ms
  benchmark_budget: 2s
  adc_samples: [100, 4095]
  stuck_pins:
    - pin: 3
      level: true
"#,
        );

        let manifest = Manifest::from(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(manifest.name, "Board 7");
        assert!(manifest.stop_on_failure);
        assert!(!manifest.verbose);
        assert_eq!(manifest.disabled_suites, vec!["UART Validation"]);
        assert_eq!(manifest.device.adc_channels, 2);
        assert_eq!(manifest.device.timer_settle, Duration::from_millis(20));
        assert_eq!(manifest.device.integration_settle, Duration::from_millis(50));
        assert_eq!(manifest.device.benchmark_budget, Duration::from_secs(2));
        assert_eq!(manifest.device.adc_samples, vec![100, 4095]);
        assert_eq!(manifest.device.stuck_pins, vec![StuckPin { pin: 3, level: true }]);
        let settings = manifest.settings();
        assert_eq!(
            settings.report,
            ReportTarget {
                destination: Destination::File(PathBuf::from("out/board7.json")),
                format: ReportFormat::Json,
            }
        );
    }

    #[test]
    fn test_bad_duration_is_rejected() {
        let path = write_manifest("yaml", "device:\n  timer_settle: soon\n");

        let result = Manifest::from(&path);
        let _ = fs::remove_file(&path);

        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file_is_rejected() {
        let path = std::env::temp_dir().join(format!("silicheck-{}.yaml", uuid::Uuid::new_v4()));

        assert!(Manifest::from(&path).is_err());
    }

    #[test]
    fn test_defaults_without_manifest() {
        let manifest = Manifest::default();
        let settings = manifest.settings();

        assert_eq!(settings.name, DEFAULT_RUN_NAME);
        assert_eq!(settings.report, ReportTarget::default());
        assert_eq!(manifest.device.bench(), BenchSettings::default());
    }

    #[test]
    fn test_command_line_overrides_manifest() {
        let mut manifest = Manifest::default();
        manifest.report.format = Some(ReportFormat::Csv);
        let opt = Opt::from_iter(&["silicheck", "-s", "-r", "-", "-f", "json", "-g", "ADC Validation"]);

        manifest.apply(&opt);
        let settings = manifest.settings();

        assert!(settings.stop_on_failure);
        assert_eq!(settings.report.destination, Destination::Stdout);
        assert_eq!(settings.report.format, ReportFormat::Json);
        assert_eq!(manifest.suites, vec!["ADC Validation"]);
    }

    #[test]
    fn test_select_suites_disables_the_rest() {
        let mut manifest = Manifest::default();
        manifest.suites = vec![checks::gpio::SUITE.to_owned(), checks::adc::SUITE.to_owned()];
        manifest.disabled_suites = vec![checks::adc::SUITE.to_owned()];
        let clock = ManualClock::new();
        let mut framework = Framework::new(manifest.settings(), Rc::new(clock.clone()));
        checks::register_all(&mut framework, &manifest.device.bench()).unwrap();

        manifest.select_suites(&mut framework).unwrap();
        let mut device = manifest.device.simulator(Rc::new(clock));
        let _ = framework.run_all(&mut device).unwrap();

        let enabled: Vec<&str> = framework
            .suites()
            .iter()
            .filter(|suite| suite.enabled())
            .map(|suite| suite.name())
            .collect();
        assert_eq!(enabled, vec![checks::gpio::SUITE]);
        let (_, adc) = framework.suite_by_name(checks::adc::SUITE).unwrap();
        assert!(adc.cases().all(|case| case.status() == TestStatus::Skipped));
        assert_eq!(framework.total_passed(), 3);
    }

    #[test]
    fn test_unknown_suite_is_a_configuration_error() {
        let mut manifest = Manifest::default();
        manifest.disabled_suites = vec!["Flash Validation".to_owned()];
        let mut framework = Framework::new(manifest.settings(), Rc::new(ManualClock::new()));
        checks::register_all(&mut framework, &manifest.device.bench()).unwrap();

        assert_eq!(
            manifest.select_suites(&mut framework),
            Err(ConfigurationError::Invalid("unknown suite 'Flash Validation'".to_owned()))
        );
    }

    #[test]
    fn test_simulator_applies_device_faults() {
        let mut entry = DeviceEntry::default();
        entry.stuck_pins = vec![StuckPin { pin: 0, level: false }];
        let manifest = Manifest {
            device: entry,
            ..Manifest::default()
        };
        let clock = ManualClock::new();
        let mut framework = Framework::new(manifest.settings(), Rc::new(clock.clone()));
        checks::register_all(&mut framework, &manifest.device.bench()).unwrap();

        let _ = framework.run_all(&mut manifest.device.simulator(Rc::new(clock))).unwrap();

        assert_eq!(framework.exit_code(), 1);
    }
}

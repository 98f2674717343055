use crate::configuration::constants::cargo_env::CARGO_PKG_NAME;
use crate::reporter::{Destination, ReportFormat};
use clap::arg_enum;
use log::LevelFilter;
use std::path::PathBuf;
use structopt::StructOpt;

arg_enum! {
    #[derive(Debug, Clone, Copy)]
    pub enum LogLevel {
        Off, Error, Warn, Info, Debug, Trace,
    }
}

#[derive(StructOpt, Debug)]
#[structopt(name = CARGO_PKG_NAME)]
pub struct Opt {
    /// Validation manifest. Supported: YAML, JSON, TOML, HJSON
    #[structopt(parse(from_os_str))]
    pub file: Option<PathBuf>,

    /// Sets a logging level
    #[structopt(case_insensitive = true, long, short = "L", possible_values = &LogLevel::variants(), env = "LOG_LEVEL")]
    pub logging: Option<LogLevel>,

    /// File to which application will write logs
    #[structopt(long, short = "O", env = "LOG_OUTPUT_FILE", parse(from_os_str))]
    pub log_output_file: Option<PathBuf>,

    /// Log measured values of passing tests too
    #[structopt(long, short = "v")]
    pub verbose: bool,

    /// Stop executing tests after the first failure
    #[structopt(long = "stop-on-fail", short = "s")]
    pub stop_on_fail: bool,

    /// Report destination, `-` writes to stdout
    #[structopt(long, short = "r")]
    pub report: Option<Destination>,

    /// Report format, guessed from the report file extension when omitted
    #[structopt(case_insensitive = true, long, short = "f", possible_values = &ReportFormat::VARIANTS)]
    pub format: Option<ReportFormat>,

    /// Run only defined suites, any other will be reported as disabled
    #[structopt(long = "suite", short = "g")]
    pub suites: Vec<String>,
}

impl Into<LevelFilter> for LogLevel {
    fn into(self) -> LevelFilter {
        match self {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[macro_use]
extern crate log;

use log::LevelFilter;
use signal_hook::{iterator::Signals, SIGINT};
use silicheck::app::Framework;
use silicheck::checks;
use silicheck::configuration::command_line::{LogLevel, Opt};
use silicheck::configuration::constants::exit_code;
use silicheck::configuration::manifest::Manifest;
use silicheck::reporter;
use silicheck::time::{Clock, MonotonicClock};
use silicheck::Error;
use std::path::PathBuf;
use std::rc::Rc;
use std::{process::exit, thread};
use structopt::StructOpt;

fn main() {
    let options = Opt::from_args();

    if let Err(e) = init_logging(
        options.logging.unwrap_or(LogLevel::Info).into(),
        &options.log_output_file,
    ) {
        eprintln!("Failed to initialize logging: {}", e);
        exit(exit_code::HARNESS_BROKEN);
    }

    match Signals::new(&[SIGINT]) {
        Ok(signals) => {
            thread::spawn(move || {
                for sig in signals.forever() {
                    warn!("Received signal {:?}, stopping", sig);
                    exit(exit_code::INTERRUPTED);
                }
            });
        }
        Err(e) => warn!("Cannot install SIGINT handler: {}", e),
    }

    let code = match run(&options) {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            e.exit_code()
        }
    };
    exit(code);
}

fn run(options: &Opt) -> Result<i32, Error> {
    let mut manifest = Manifest::load(options.file.as_deref())?;
    manifest.apply(options);
    debug!("Initiated configuration {:#?}", manifest);

    let clock: Rc<dyn Clock> = Rc::new(MonotonicClock::new());
    let mut framework = Framework::new(manifest.settings(), Rc::clone(&clock));
    checks::register_all(&mut framework, &manifest.device.bench())?;
    manifest.select_suites(&mut framework)?;

    let mut device = manifest.device.simulator(clock);
    let _ = framework.run_all(&mut device)?;

    let _ = reporter::publish(&framework);
    Ok(framework.exit_code())
}

fn init_logging(level: LevelFilter, output: &Option<PathBuf>) -> Result<(), fern::InitError> {
    let mut dispatcher = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}:{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record
                    .line()
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "".to_owned()),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout());

    if let Some(log_file) = output {
        dispatcher = dispatcher.chain(fern::log_file(log_file)?)
    }
    dispatcher.apply()?;
    info!("Logging level {} enabled", level);
    Ok(())
}

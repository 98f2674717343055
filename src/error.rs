use crate::app::error::{ConfigurationError, UsageError};
use crate::configuration::constants::exit_code;
use thiserror::Error;

/// Anything that stops a validation run before it can produce a verdict.
///
/// Report write failures are not part of it: they are logged and leave the
/// exit code of the run alone.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to load manifest: {0}")]
    Manifest(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("harness misuse: {0}")]
    Usage(#[from] UsageError),
}

impl Error {
    /// Process exit code for a run that ended with this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Manifest(_) | Error::Configuration(_) | Error::Usage(_) => exit_code::HARNESS_BROKEN,
        }
    }
}

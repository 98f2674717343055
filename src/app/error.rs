use crate::app::case::TestStatus;
use thiserror::Error;

/// The harness drove the framework through an impossible transition.
/// Never a test verdict: results gathered after one are unreliable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UsageError {
    #[error("cannot start test '{name}': it is {status}, expected PENDING")]
    NotPending { name: String, status: TestStatus },
    #[error("cannot end test '{name}': it is {status}, expected RUNNING")]
    NotRunning { name: String, status: TestStatus },
    #[error("test '{name}' in suite '{suite}' is still RUNNING, it must be ended before the run completes")]
    StillRunning { suite: String, name: String },
    #[error("test '{name}' in suite '{suite}' was never started and has no check to run")]
    NeverStarted { suite: String, name: String },
    #[error("cannot start test '{name}': the run was halted by stop-on-failure")]
    Halted { name: String },
    #[error("no test registered under handle {suite}:{index}")]
    UnknownCase { suite: usize, index: usize },
}

/// Rejected at registration time, before anything executes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("suite name must not be empty")]
    EmptySuiteName,
    #[error("test name in suite '{0}' must not be empty")]
    EmptyTestName(String),
    #[error("suite '{0}' is already registered")]
    DuplicateSuite(String),
    #[error("test '{name}' is already registered in suite '{suite}'")]
    DuplicateTest { suite: String, name: String },
    #[error("no suite registered under handle {0}")]
    UnknownSuite(usize),
    #[error("suite '{0}' declares a test capacity of zero")]
    ZeroCapacity(String),
    #[error("{0}")]
    Invalid(String),
}

pub mod cargo_env {
    pub const CARGO_PKG_NAME: &str = env!("CARGO_PKG_NAME");
}

pub mod common {
    pub const DEFAULT_RUN_NAME: &str = "FPGA Validation Framework";
    /// Prefix of environment variables overriding manifest keys, e.g. `SILICHECK_VERBOSE`.
    pub const ENV_PREFIX: &str = "SILICHECK";
}

pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const TESTS_FAILED: i32 = 1;
    pub const HARNESS_BROKEN: i32 = 2;
    pub const INTERRUPTED: i32 = 130;
}

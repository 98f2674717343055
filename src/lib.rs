#[macro_use]
extern crate log;

#[macro_use]
extern crate derive_builder;

pub mod app;
pub mod checks;
pub mod configuration;
pub mod device;
pub mod error;
pub mod reporter;
pub mod time;

pub use self::app::{Framework, Settings};
pub use self::error::Error;

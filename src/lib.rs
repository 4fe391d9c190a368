pub mod convert;
pub mod core;
pub mod driver;
pub mod errors;
pub mod manifest;
pub mod runner;
pub mod source;
pub mod types;
pub mod utils;

pub use crate::core::{MigrationConfig, PathConventions, RunnerConfig, ScriptConfig};
pub use driver::MigrationDriver;
pub use errors::{MigrationError, Result};
pub use manifest::ConversionManifest;
pub use runner::{run_all, ScriptRunner, TsNodeRunner};
pub use types::*;

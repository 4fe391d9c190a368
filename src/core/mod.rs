pub mod config;

pub use config::{MigrationConfig, PathConventions, RunnerConfig, ScriptConfig};

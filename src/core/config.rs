use crate::errors::{MigrationError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    pub paths: PathConventions,
    pub script: ScriptConfig,
    pub runner: RunnerConfig,
}

/// Where sources are found and where generated modules go.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConventions {
    pub input_root: PathBuf,
    /// Page-object sources, relative to `input_root`.
    pub pages_subtree: PathBuf,
    /// Test sources, relative to `input_root`.
    pub tests_subtree: PathBuf,
    /// Only page files with this directory component in their path are
    /// converted. Keeps base classes and utilities out of the page set.
    pub page_path_filter: Option<String>,
    pub test_path_filter: Option<String>,
    pub output_root: PathBuf,
    pub pages_output: PathBuf,
    pub tests_output: PathBuf,
    /// Package segment that marks an import as a page object.
    pub page_package_marker: String,
}

/// Settings baked into generated test scripts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    pub base_url: String,
    pub headless: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub command: String,
    pub args: Vec<String>,
    pub timeout_ms: u64,
}

impl Default for PathConventions {
    fn default() -> Self {
        Self {
            input_root: PathBuf::from("."),
            pages_subtree: PathBuf::from("src/main/java"),
            tests_subtree: PathBuf::from("src/test/java"),
            page_path_filter: Some("pages".to_string()),
            test_path_filter: None,
            output_root: PathBuf::from("converted"),
            pages_output: PathBuf::from("pages"),
            tests_output: PathBuf::from("tests"),
            page_package_marker: "pages".to_string(),
        }
    }
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            headless: false,
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            command: "npx".to_string(),
            args: vec!["ts-node".to_string()],
            timeout_ms: 300_000,
        }
    }
}

impl MigrationConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| MigrationError::read(path, e))?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.script.base_url)?;
        if self.runner.command.trim().is_empty() {
            return Err(MigrationError::ConfigurationError(
                "runner.command must not be empty".to_string(),
            ));
        }
        if self.runner.timeout_ms == 0 {
            return Err(MigrationError::ConfigurationError(
                "runner.timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn pages_input_dir(&self) -> PathBuf {
        self.paths.input_root.join(&self.paths.pages_subtree)
    }

    pub fn tests_input_dir(&self) -> PathBuf {
        self.paths.input_root.join(&self.paths.tests_subtree)
    }

    pub fn page_output_dir(&self) -> PathBuf {
        self.paths.output_root.join(&self.paths.pages_output)
    }

    pub fn test_output_dir(&self) -> PathBuf {
        self.paths.output_root.join(&self.paths.tests_output)
    }
}

use crate::core::RunnerConfig;
use crate::errors::{MigrationError, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct ScriptOutcome {
    pub script: PathBuf,
    pub success: bool,
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
}

/// Executes one generated script.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    async fn run(&self, script: &Path) -> Result<ScriptOutcome>;
}

/// Spawns `<command> <args..> <script>`, `npx ts-node` by default.
pub struct TsNodeRunner {
    config: RunnerConfig,
}

impl TsNodeRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ScriptRunner for TsNodeRunner {
    async fn run(&self, script: &Path) -> Result<ScriptOutcome> {
        let start = Instant::now();
        let mut child = Command::new(&self.config.command)
            .args(&self.config.args)
            .arg(script)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| MigrationError::RunnerError(format!("{}: {}", self.config.command, e)))?;

        let status = tokio::time::timeout(
            tokio::time::Duration::from_millis(self.config.timeout_ms),
            child.wait(),
        )
        .await
        .map_err(|_| MigrationError::Timeout(self.config.timeout_ms))??;

        Ok(ScriptOutcome {
            script: script.to_path_buf(),
            success: status.success(),
            exit_code: status.code(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
    pub outcomes: Vec<ScriptOutcome>,
}

impl RunSummary {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// `.ts` files directly inside `dir`, in name order.
pub fn discover_scripts(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(MigrationError::DirectoryNotFound(dir.to_path_buf()));
    }
    let mut scripts = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| MigrationError::read(dir, e))? {
        let path = entry.map_err(|e| MigrationError::read(dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "ts") {
            scripts.push(path);
        }
    }
    if scripts.is_empty() {
        return Err(MigrationError::NoScripts(dir.to_path_buf()));
    }
    scripts.sort();
    Ok(scripts)
}

/// Runs every script in `tests_dir` one after another. A script that
/// cannot be started or times out counts as failed.
pub async fn run_all(runner: &dyn ScriptRunner, tests_dir: &Path) -> Result<RunSummary> {
    let scripts = discover_scripts(tests_dir)?;
    info!("Found {} test script(s) in {}", scripts.len(), tests_dir.display());

    let mut summary = RunSummary {
        total: scripts.len(),
        ..Default::default()
    };
    for script in scripts {
        info!("Running {}", script.display());
        let result = runner.run(&script).await;
        match result {
            Ok(outcome) if outcome.success => {
                info!("PASSED {} in {}ms", script.display(), outcome.duration_ms);
                summary.passed += 1;
                summary.outcomes.push(outcome);
            }
            Ok(outcome) => {
                warn!("FAILED {} (exit code {:?})", script.display(), outcome.exit_code);
                summary.failed += 1;
                summary.outcomes.push(outcome);
            }
            Err(e) => {
                error!("Could not run {}: {}", script.display(), e);
                summary.failed += 1;
                summary.outcomes.push(ScriptOutcome {
                    script,
                    success: false,
                    exit_code: None,
                    duration_ms: 0,
                });
            }
        }
    }
    Ok(summary)
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ConvertedListing {
    pub pages: Vec<String>,
    pub tests: Vec<String>,
}

/// Module names of previously generated pages and tests. Missing
/// directories list as empty.
pub fn list_converted(pages_dir: &Path, tests_dir: &Path) -> Result<ConvertedListing> {
    Ok(ConvertedListing {
        pages: module_names(pages_dir)?,
        tests: module_names(tests_dir)?,
    })
}

fn module_names(dir: &Path) -> Result<Vec<String>> {
    match discover_scripts(dir) {
        Ok(scripts) => Ok(scripts
            .iter()
            .filter_map(|p| p.file_stem())
            .map(|s| s.to_string_lossy().into_owned())
            .collect()),
        Err(MigrationError::DirectoryNotFound(_)) | Err(MigrationError::NoScripts(_)) => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Fails any script whose name contains "Broken" and errors on "Missing".
    struct FakeRunner;

    #[async_trait]
    impl ScriptRunner for FakeRunner {
        async fn run(&self, script: &Path) -> Result<ScriptOutcome> {
            let name = script.file_name().unwrap().to_string_lossy();
            if name.contains("Missing") {
                return Err(MigrationError::RunnerError("not found".to_string()));
            }
            let success = !name.contains("Broken");
            Ok(ScriptOutcome {
                script: script.to_path_buf(),
                success,
                exit_code: Some(if success { 0 } else { 1 }),
                duration_ms: 1,
            })
        }
    }

    fn scripts_dir(names: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in names {
            fs::write(dir.path().join(name), "").unwrap();
        }
        dir
    }

    #[tokio::test]
    async fn test_run_all_counts_failures_and_runner_errors() {
        let dir = scripts_dir(&["LoginPageTest.ts", "BrokenTest.ts", "MissingTest.ts", "notes.md"]);
        let summary = run_all(&FakeRunner, dir.path()).await.unwrap();

        assert_eq!(summary.total, 3);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 2);
        assert!(!summary.all_passed());
        let order: Vec<_> = summary
            .outcomes
            .iter()
            .map(|o| o.script.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(order, vec!["BrokenTest.ts", "LoginPageTest.ts", "MissingTest.ts"]);
    }

    #[test]
    fn test_empty_directory_is_an_error() {
        let dir = scripts_dir(&["README.md"]);
        let result = tokio_test::block_on(run_all(&FakeRunner, dir.path()));
        assert!(matches!(result, Err(MigrationError::NoScripts(_))));
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = discover_scripts(&dir.path().join("tests"));
        assert!(matches!(result, Err(MigrationError::DirectoryNotFound(_))));
    }

    #[test]
    fn test_list_converted_tolerates_missing_directories() {
        let pages = scripts_dir(&["LoginPage.ts", "HomePage.ts"]);
        let listing = list_converted(pages.path(), &pages.path().join("absent")).unwrap();
        assert_eq!(listing.pages, vec!["HomePage", "LoginPage"]);
        assert!(listing.tests.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_ts_node_runner_reports_exit_status() {
        let dir = scripts_dir(&["LoginPageTest.ts"]);
        let script = dir.path().join("LoginPageTest.ts");

        let passing = TsNodeRunner::new(RunnerConfig {
            command: "true".to_string(),
            args: Vec::new(),
            timeout_ms: 5_000,
        });
        let outcome = passing.run(&script).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.exit_code, Some(0));

        let failing = TsNodeRunner::new(RunnerConfig {
            command: "false".to_string(),
            args: Vec::new(),
            timeout_ms: 5_000,
        });
        assert!(!failing.run(&script).await.unwrap().success);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_ts_node_runner_times_out() {
        let dir = scripts_dir(&["SlowTest.ts"]);
        let runner = TsNodeRunner::new(RunnerConfig {
            command: "sh".to_string(),
            args: vec!["-c".to_string(), "sleep 5".to_string()],
            timeout_ms: 100,
        });
        let result = runner.run(&dir.path().join("SlowTest.ts")).await;
        assert!(matches!(result, Err(MigrationError::Timeout(100))));
    }
}

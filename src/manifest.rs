use crate::errors::Result;
use crate::types::UnitKind;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct ManifestEntry {
    pub kind: UnitKind,
    pub input: PathBuf,
    pub output: PathBuf,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversionFailure {
    pub kind: UnitKind,
    pub input: PathBuf,
    pub message: String,
}

/// Input to output mappings for one run. Only ever appended to.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionManifest {
    pub run_id: Uuid,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub entries: Vec<ManifestEntry>,
    pub failures: Vec<ConversionFailure>,
    /// Test sources without any `@Test` method.
    pub skipped: Vec<PathBuf>,
}

impl ConversionManifest {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: chrono::Utc::now(),
            entries: Vec::new(),
            failures: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn record(&mut self, kind: UnitKind, input: PathBuf, output: PathBuf, warnings: Vec<String>) {
        self.entries.push(ManifestEntry {
            kind,
            input,
            output,
            warnings,
        });
    }

    pub fn record_failure(&mut self, kind: UnitKind, input: PathBuf, message: String) {
        self.failures.push(ConversionFailure {
            kind,
            input,
            message,
        });
    }

    pub fn record_skipped(&mut self, input: PathBuf) {
        self.skipped.push(input);
    }

    pub fn converted_count(&self) -> usize {
        self.entries.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Console report. Always lists what happened, including an explicit
    /// line when nothing was converted.
    pub fn report(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Conversion complete. Files converted:");
        for entry in &self.entries {
            let _ = writeln!(out, "- {} -> {}", entry.input.display(), entry.output.display());
            for warning in &entry.warnings {
                let _ = writeln!(out, "    warning: {}", warning);
            }
        }
        if !self.skipped.is_empty() {
            let _ = writeln!(out, "Skipped (no @Test methods):");
            for path in &self.skipped {
                let _ = writeln!(out, "- {}", path.display());
            }
        }
        if !self.failures.is_empty() {
            let _ = writeln!(out, "Failed conversions:");
            for failure in &self.failures {
                let _ = writeln!(
                    out,
                    "- [{}] {}: {}",
                    failure.kind,
                    failure.input.display(),
                    failure.message
                );
            }
        }
        if self.entries.is_empty() {
            let _ = writeln!(out, "No matching Java page/test files found for conversion.");
        }
        out
    }
}

impl Default for ConversionManifest {
    fn default() -> Self {
        Self::new()
    }
}

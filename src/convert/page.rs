//! Page object conversion.

use super::locators::{build_table, LocatorTable};
use super::translate::translate;
use crate::errors::{MigrationError, Result};
use crate::source::SourceUnit;
use crate::types::{MethodDescriptor, StatementKind, TranslatedStatement};
use crate::utils::typescript::{indent, write_module};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct PageMethod {
    pub name: String,
    pub parameter_names: Vec<String>,
    pub statements: Vec<TranslatedStatement>,
}

impl PageMethod {
    fn render(&self) -> String {
        let body: Vec<&str> = self
            .statements
            .iter()
            .map(|s| s.rendered_text.as_str())
            .collect();
        format!(
            "async {}({}) {{\n{}\n}}",
            self.name,
            self.parameter_names.join(", "),
            indent(&body.join("\n"), 1)
        )
    }
}

/// A page module ready to be written.
#[derive(Debug, Clone)]
pub struct PageModule {
    pub class_name: String,
    pub methods: Vec<PageMethod>,
    pub warnings: Vec<String>,
}

impl PageModule {
    pub fn render(&self) -> String {
        let mut members = vec!["constructor(private page: Page) {}".to_string()];
        members.extend(self.methods.iter().map(PageMethod::render));
        let body = members
            .iter()
            .map(|m| indent(m, 1))
            .collect::<Vec<_>>()
            .join("\n\n");
        format!(
            "import {{ Page }} from 'playwright';\n\nexport class {} {{\n{}\n}}\n",
            self.class_name, body
        )
    }

    pub fn file_name(&self) -> String {
        format!("{}.ts", self.class_name)
    }
}

#[derive(Debug, Clone)]
pub struct PageConversion {
    pub class_name: String,
    pub output_path: PathBuf,
    pub warnings: Vec<String>,
}

/// Method descriptors of the unit's primary class, constructors excluded.
pub fn method_descriptors(unit: &SourceUnit, class_name: &str) -> Vec<MethodDescriptor> {
    let Some(class) = unit.primary_class() else {
        return Vec::new();
    };
    class
        .methods
        .iter()
        .filter(|m| m.name != class_name && m.name != class.name)
        .filter_map(|m| {
            let body = m.body.as_ref()?;
            Some(MethodDescriptor {
                name: m.name.clone(),
                parameter_names: m.parameter_names.clone(),
                body_lines: body.iter().map(|s| s.text.clone()).collect(),
            })
        })
        .collect()
}

/// Builds the page module for already-read source text. `fallback_name` is
/// used when no `public class` declaration is found.
pub fn build_page_module(src: &str, fallback_name: &str) -> PageModule {
    let unit = SourceUnit::parse(src);
    let class_name = unit
        .public_class()
        .map(|c| c.name.clone())
        .unwrap_or_else(|| fallback_name.to_string());
    let table = build_table(&unit);

    let mut warnings = locator_warnings(&table);
    let methods: Vec<PageMethod> = method_descriptors(&unit, &class_name)
        .into_iter()
        .map(|descriptor| {
            let statements = translate(&descriptor.body_lines, &table);
            warnings.extend(statement_warnings(&descriptor.name, &statements));
            PageMethod {
                name: descriptor.name,
                parameter_names: descriptor.parameter_names,
                statements,
            }
        })
        .collect();

    PageModule {
        class_name,
        methods,
        warnings,
    }
}

fn locator_warnings(table: &LocatorTable) -> Vec<String> {
    table
        .overwrites()
        .iter()
        .map(|o| {
            format!(
                "locator '{}' on line {} overrides the declaration on line {}",
                o.name, o.current.line, o.previous.line
            )
        })
        .collect()
}

fn statement_warnings(method: &str, statements: &[TranslatedStatement]) -> Vec<String> {
    statements
        .iter()
        .filter_map(|s| match s.kind {
            StatementKind::TransitionComment => Some(format!(
                "{}: {} is emitted as a comment only; page transitions are not modeled",
                method,
                s.rendered_text.trim_start_matches("// ")
            )),
            StatementKind::ReviewComment => Some(format!(
                "{}: needs review: {}",
                method,
                s.rendered_text.trim_start_matches("// ")
            )),
            StatementKind::Pending => Some(format!("{}: no statements could be converted", method)),
            _ => None,
        })
        .collect()
}

pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn convert_page(source_path: &Path, out_dir: &Path) -> Result<PageConversion> {
    let src = std::fs::read_to_string(source_path)
        .map_err(|e| MigrationError::read(source_path, e))?;
    let module = build_page_module(&src, &file_stem(source_path));

    let output_path = out_dir.join(module.file_name());
    write_module(&output_path, &module.render())?;
    info!(
        "Converted page {} -> {} ({} methods)",
        source_path.display(),
        output_path.display(),
        module.methods.len()
    );

    Ok(PageConversion {
        class_name: module.class_name,
        output_path,
        warnings: module.warnings,
    })
}

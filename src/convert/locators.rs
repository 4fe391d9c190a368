//! Per-unit locator table.

use super::selector::{render, resolve_parts};
use crate::source::{FieldNode, SourceUnit};
use crate::types::{DeclarationShape, LocatorEntry, LocatorStrategy, Provenance, Selector};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::{debug, warn};

static BY_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:final\s+)?By\s+(\w+)\s*=\s*(By\s*\.\s*\w+\s*\(.*\))$")
        .expect("static declaration pattern")
});

static FIND_ELEMENT_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:final\s+)?WebElement\s+(\w+)\s*=\s*\w+\s*\.\s*findElement\s*\((.*)\)$")
        .expect("static declaration pattern")
});

static ANNOTATION_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\w+)\s*=\s*(?:"((?:[^"\\]|\\.)*)"|([\w.]+))"#).expect("static pair pattern")
});

/// A replaced entry, kept so redeclarations can be diagnosed after the fact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overwrite {
    pub name: String,
    pub previous: Provenance,
    pub current: Provenance,
}

/// Name to selector mapping for one source unit. Insertion is
/// last-write-wins; each replacement is recorded.
#[derive(Debug, Clone, Default)]
pub struct LocatorTable {
    entries: HashMap<String, LocatorEntry>,
    overwrites: Vec<Overwrite>,
}

impl LocatorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: LocatorEntry) -> Option<LocatorEntry> {
        let previous = self.entries.insert(entry.name.clone(), entry);
        if let Some(old) = &previous {
            let current = self.entries[&old.name].provenance;
            warn!(
                "Locator '{}' redeclared on line {} (previously line {})",
                old.name, current.line, old.provenance.line
            );
            self.overwrites.push(Overwrite {
                name: old.name.clone(),
                previous: old.provenance,
                current,
            });
        }
        previous
    }

    pub fn get(&self, name: &str) -> Option<&LocatorEntry> {
        self.entries.get(name)
    }

    pub fn selector(&self, name: &str) -> Option<&Selector> {
        self.entries.get(name).map(|e| &e.selector)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn overwrites(&self) -> &[Overwrite] {
        &self.overwrites
    }

    /// Entries ordered by declaration line.
    pub fn entries(&self) -> Vec<&LocatorEntry> {
        let mut entries: Vec<&LocatorEntry> = self.entries.values().collect();
        entries.sort_by_key(|e| (e.provenance.line, e.name.clone()));
        entries
    }
}

struct Declaration<'a> {
    line: usize,
    text: String,
    field: Option<&'a FieldNode>,
}

/// Collects locator declarations from every class in the unit, in source
/// order, and resolves each into the table. Unresolvable ones are skipped.
pub fn build_table(unit: &SourceUnit) -> LocatorTable {
    let mut declarations = Vec::new();
    for class in &unit.classes {
        for field in &class.fields {
            declarations.push(Declaration {
                line: field.line,
                text: field.declaration_text(),
                field: Some(field),
            });
        }
        for method in &class.methods {
            for statement in method.body.iter().flatten() {
                declarations.push(Declaration {
                    line: statement.line,
                    text: statement.text.clone(),
                    field: None,
                });
            }
        }
    }
    declarations.sort_by_key(|d| d.line);

    let mut table = LocatorTable::new();
    for declaration in &declarations {
        if let Some(entry) = find_by_entry(declaration) {
            table.insert(entry);
        }
        if let Some(entry) = expression_entry(declaration) {
            table.insert(entry);
        }
    }
    table
}

pub fn build_table_from_source(src: &str) -> LocatorTable {
    build_table(&SourceUnit::parse(src))
}

fn find_by_entry(declaration: &Declaration<'_>) -> Option<LocatorEntry> {
    let field = declaration.field?;
    let annotation = field.annotations.iter().find(|a| a.is("FindBy"))?;
    let arguments = annotation.arguments.as_deref().unwrap_or_default();

    let mut how = None;
    let mut using = None;
    let mut direct = None;
    for caps in ANNOTATION_PAIR.captures_iter(arguments) {
        let key = &caps[1];
        let value = caps.get(2).or_else(|| caps.get(3)).map(|m| m.as_str().to_string());
        match key {
            "how" => how = value.as_deref().and_then(LocatorStrategy::from_how),
            "using" => using = value,
            _ => {
                if direct.is_none() {
                    if let (Some(strategy), Some(value)) =
                        (LocatorStrategy::from_annotation_key(key), value)
                    {
                        direct = Some((strategy, value));
                    }
                }
            }
        }
    }

    let resolved = direct.or_else(|| how.zip(using));
    let Some((strategy, value)) = resolved else {
        debug!(
            "Skipping @FindBy({}) on '{}': unsupported strategy",
            arguments, field.name
        );
        return None;
    };
    Some(LocatorEntry {
        name: field.name.clone(),
        strategy,
        selector: render(strategy, &value),
        value,
        provenance: Provenance {
            shape: DeclarationShape::FindByField,
            line: declaration.line,
        },
    })
}

fn expression_entry(declaration: &Declaration<'_>) -> Option<LocatorEntry> {
    let (shape, caps) = if let Some(caps) = BY_DECLARATION.captures(&declaration.text) {
        (DeclarationShape::ByDeclaration, caps)
    } else if let Some(caps) = FIND_ELEMENT_DECLARATION.captures(&declaration.text) {
        (DeclarationShape::FindElementDeclaration, caps)
    } else {
        return None;
    };

    let name = caps[1].to_string();
    let Some((strategy, value, selector)) = resolve_parts(&caps[2]) else {
        debug!("Skipping locator '{}': cannot resolve {}", name, &caps[2]);
        return None;
    };
    Some(LocatorEntry {
        name,
        strategy,
        value,
        selector,
        provenance: Provenance {
            shape,
            line: declaration.line,
        },
    })
}

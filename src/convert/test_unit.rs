//! Test class conversion.
//!
//! Each `@Test` method body is rewritten into a flat action sequence inside
//! a single script that owns one browser for its whole lifetime.
//! Assertions are dropped and counted so the loss shows up in the manifest.

use super::page::file_stem;
use crate::core::config::ScriptConfig;
use crate::errors::{MigrationError, Result};
use crate::source::SourceUnit;
use crate::types::{StatementKind, TranslatedStatement};
use crate::utils::typescript::{indent, lower_camel, relative_module_path, single_quoted, write_module};
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info};

static ASSERTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:\w+\s*\.\s*)?assert\w*|Assert\s*\.\s*fail)\s*\(").expect("static assertion pattern")
});

static NAVIGATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^driver\s*\.\s*(?:get|navigate\s*\(\s*\)\s*\.\s*to)\s*\((?P<url>.*)\)$")
        .expect("static navigation pattern")
});

static TITLE_BINDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:final\s+)?String\s+(?P<var>\w+)\s*=\s*driver\s*\.\s*getTitle\s*\(\s*\)$")
        .expect("static title pattern")
});

static SLEEP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Thread\s*\.\s*sleep\s*\((?P<ms>.*)\)$").expect("static sleep pattern")
});

static PRINTLN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^System\s*\.\s*out\s*\.\s*println\s*\((?P<args>.*)\)$").expect("static println pattern")
});

static DRIVER_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^driver\s*\.").expect("static driver pattern"));

static CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?:final\s+)?(?P<ty>[\w.]+(?:\s*<.*>)?(?:\s*\[\s*\])*)\s+)?(?:(?P<var>\w+)\s*=\s*)?(?P<recv>\w+)\s*\.\s*(?P<method>\w+)\s*\((?P<args>.*)\)$",
    )
    .expect("static call pattern")
});

static PROPERTY_LOOKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\w+\s*\.\s*getProperty\s*\(\s*"([^"]*)"\s*\)"#).expect("static property pattern")
});

static CONSTRUCTOR_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bnew\s+\w+\s*\(").expect("static constructor pattern"));

static JAVA_STRING_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^"([^"\\']*)"$"#).expect("static literal pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestDetector {
    Assertion,
    Navigate,
    TitleBinding,
    Sleep,
    Println,
    DriverCall,
    Call,
}

/// Detector precedence for test bodies. Earlier entries win.
pub const TEST_DETECTORS: [TestDetector; 7] = [
    TestDetector::Assertion,
    TestDetector::Navigate,
    TestDetector::TitleBinding,
    TestDetector::Sleep,
    TestDetector::Println,
    TestDetector::DriverCall,
    TestDetector::Call,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestRewrite {
    Emit(TranslatedStatement),
    AssertionDropped,
}

/// What a test body can refer to besides its own locals.
#[derive(Debug, Clone, Default)]
pub struct TestContext {
    pub page_instances: HashSet<String>,
}

impl TestDetector {
    pub fn apply(&self, statement: &str, ctx: &TestContext) -> Option<TestRewrite> {
        let emit = |kind, text: String| Some(TestRewrite::Emit(TranslatedStatement::new(kind, text)));
        match self {
            TestDetector::Assertion => ASSERTION
                .is_match(statement)
                .then_some(TestRewrite::AssertionDropped),
            TestDetector::Navigate => {
                let caps = NAVIGATE.captures(statement)?;
                emit(
                    StatementKind::Navigate,
                    format!("await page.goto({});", script_argument(caps["url"].trim())),
                )
            }
            TestDetector::TitleBinding => {
                let caps = TITLE_BINDING.captures(statement)?;
                emit(
                    StatementKind::TitleQuery,
                    format!("const {} = await page.title();", &caps["var"]),
                )
            }
            TestDetector::Sleep => {
                let caps = SLEEP.captures(statement)?;
                emit(
                    StatementKind::RawPassthrough,
                    format!("await page.waitForTimeout({});", caps["ms"].trim()),
                )
            }
            TestDetector::Println => {
                let caps = PRINTLN.captures(statement)?;
                emit(
                    StatementKind::RawPassthrough,
                    format!("console.log({});", rewrite_arguments(caps["args"].trim())),
                )
            }
            TestDetector::DriverCall => DRIVER_CALL.is_match(statement).then(|| {
                TestRewrite::Emit(TranslatedStatement::review("Driver call not converted", statement))
            }),
            TestDetector::Call => {
                let caps = CALL.captures(statement)?;
                let args = &caps["args"];
                if !is_balanced(args) {
                    // chained call such as a.b().c()
                    return None;
                }
                let call = format!(
                    "await {}.{}({});",
                    &caps["recv"],
                    &caps["method"],
                    rewrite_arguments(args.trim())
                );
                let text = match (caps.name("ty"), caps.name("var")) {
                    (_, Some(var)) if ctx.page_instances.contains(var.as_str()) => call,
                    (Some(_), Some(var)) => format!("const {} = {}", var.as_str(), call),
                    (None, Some(var)) => format!("{} = {}", var.as_str(), call),
                    _ => call,
                };
                emit(StatementKind::MethodCall, text)
            }
        }
    }
}

/// Parentheses in `text` never close more than they open and end balanced.
fn is_balanced(text: &str) -> bool {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    for c in text.chars() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// Unwraps `new T(inner)` to `inner`, innermost last.
fn strip_constructor_calls(args: &str) -> String {
    let mut text = args.to_string();
    while let Some(m) = CONSTRUCTOR_CALL.find(&text) {
        let open = m.end();
        let mut depth = 1i32;
        let mut close = None;
        for (i, c) in text[open..].char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(open + i);
                        break;
                    }
                }
                _ => {}
            }
        }
        text = match close {
            Some(close) => format!("{}{}{}", &text[..m.start()], &text[open..close], &text[close + 1..]),
            None => format!("{}{}", &text[..m.start()], &text[open..]),
        };
    }
    text
}

/// Property lookups become the key literal; constructor wrappers are
/// stripped.
pub fn rewrite_arguments(args: &str) -> String {
    let replaced = PROPERTY_LOOKUP.replace_all(args, |caps: &regex::Captures<'_>| single_quoted(&caps[1]));
    strip_constructor_calls(&replaced)
}

fn script_argument(arg: &str) -> String {
    match JAVA_STRING_LITERAL.captures(arg) {
        Some(caps) => single_quoted(&caps[1]),
        None => rewrite_arguments(arg),
    }
}

#[derive(Debug, Clone)]
pub struct TestCase {
    pub name: String,
    pub statements: Vec<TranslatedStatement>,
    pub assertions_dropped: usize,
}

pub fn translate_test_body<S: AsRef<str>>(name: &str, body: &[S], ctx: &TestContext) -> TestCase {
    let mut statements = Vec::new();
    let mut assertions_dropped = 0;
    for line in body {
        let line = line.as_ref();
        match TEST_DETECTORS.iter().find_map(|d| d.apply(line, ctx)) {
            Some(TestRewrite::Emit(statement)) => statements.push(statement),
            Some(TestRewrite::AssertionDropped) => assertions_dropped += 1,
            None => debug!("Dropping untranslated test statement: {}", line),
        }
    }
    TestCase {
        name: name.to_string(),
        statements,
        assertions_dropped,
    }
}

/// Page modules a test script may import.
#[derive(Debug, Clone, Default)]
pub struct PageCatalog {
    /// Directory the page modules are written to.
    pub out_dir: PathBuf,
    /// Package segment that marks an import as a page object.
    pub marker: String,
    /// Page classes converted in the current run, for wildcard imports.
    pub converted: Vec<String>,
}

impl PageCatalog {
    pub fn new(out_dir: impl Into<PathBuf>, marker: impl Into<String>) -> Self {
        Self {
            out_dir: out_dir.into(),
            marker: marker.into(),
            converted: Vec::new(),
        }
    }
}

/// Page types a test class refers to: explicit imports from a package
/// segment named `catalog.marker`, plus, for wildcard imports of such a
/// package, pages converted in this run whose name the source mentions.
pub fn referenced_pages(unit: &SourceUnit, src: &str, catalog: &PageCatalog) -> Vec<String> {
    let marker = catalog.marker.as_str();
    let mut pages: Vec<String> = Vec::new();
    let mut wildcard = false;
    for import in unit.imports.iter().filter(|i| !i.is_static) {
        if !import.package_segments().any(|segment| segment == marker) {
            continue;
        }
        if import.is_wildcard() {
            wildcard = true;
        } else if !pages.iter().any(|p| p == import.simple_name()) {
            pages.push(import.simple_name().to_string());
        }
    }

    if wildcard {
        let mut converted: Vec<&String> = catalog.converted.iter().collect();
        converted.sort();
        for name in converted {
            let mentioned = Regex::new(&format!(r"\b{}\b", regex::escape(name)))
                .map(|re| re.is_match(src))
                .unwrap_or(false);
            if mentioned && !pages.contains(name) {
                pages.push(name.clone());
            }
        }
    }
    pages
}

#[derive(Debug, Clone)]
pub struct TestScript {
    pub class_name: String,
    pub pages: Vec<(String, String)>,
    pub cases: Vec<TestCase>,
    pub base_url: String,
    pub headless: bool,
}

impl TestScript {
    pub fn file_name(&self) -> String {
        format!("{}.ts", self.class_name)
    }

    pub fn assertions_dropped(&self) -> usize {
        self.cases.iter().map(|c| c.assertions_dropped).sum()
    }

    pub fn render(&self) -> String {
        let mut out = String::from("import { chromium } from 'playwright';\n");
        for (name, module) in &self.pages {
            out.push_str(&format!("import {{ {} }} from {};\n", name, single_quoted(module)));
        }

        let mut steps = vec!["const page = await browser.newPage();".to_string()];
        for (name, _) in &self.pages {
            steps.push(format!("const {} = new {}(page);", lower_camel(name), name));
        }
        steps.push("await page.goto(BASE_URL);".to_string());
        // each case gets its own block scope
        for case in &self.cases {
            let body: Vec<&str> = case.statements.iter().map(|s| s.rendered_text.as_str()).collect();
            steps.push(String::new());
            steps.push(format!("// @Test: {}", case.name));
            if !body.is_empty() {
                steps.push(format!("{{\n{}\n}}", indent(&body.join("\n"), 1)));
            }
        }
        steps.push(String::new());
        steps.push("console.log('All tests passed!');".to_string());

        let headless_default = if self.headless { "true" } else { "false" };
        out.push_str("\n(async () => {\n");
        out.push_str(&format!(
            "  const HEADLESS = (process.env.HEADLESS ?? {}) === 'true';\n",
            single_quoted(headless_default)
        ));
        out.push_str(&format!(
            "  const BASE_URL = process.env.BASE_URL ?? {};\n",
            single_quoted(&self.base_url)
        ));
        out.push_str("  const browser = await chromium.launch({ headless: HEADLESS });\n\n");
        out.push_str("  try {\n");
        out.push_str(&indent(&steps.join("\n"), 2));
        out.push_str("\n  } catch (err) {\n");
        out.push_str("    console.error('Test failed:', err);\n");
        out.push_str("    process.exitCode = 1;\n");
        out.push_str("  } finally {\n");
        out.push_str("    await browser.close();\n");
        out.push_str("  }\n");
        out.push_str("})();\n");
        out
    }
}

#[derive(Debug, Clone)]
pub struct TestConversion {
    pub class_name: String,
    pub output_path: PathBuf,
    pub test_names: Vec<String>,
    pub warnings: Vec<String>,
}

/// Builds the script for already-read source text. `None` when the class
/// has no `@Test` methods.
pub fn build_test_script(
    src: &str,
    fallback_name: &str,
    test_out_dir: &Path,
    catalog: &PageCatalog,
    script: &ScriptConfig,
) -> Option<TestScript> {
    let unit = SourceUnit::parse(src);
    let class_name = unit
        .public_class()
        .map(|c| c.name.clone())
        .unwrap_or_else(|| fallback_name.to_string());

    let tests: Vec<_> = unit
        .classes
        .iter()
        .flat_map(|c| c.methods.iter())
        .filter(|m| m.has_annotation("Test"))
        .collect();
    if tests.is_empty() {
        return None;
    }

    let page_names = referenced_pages(&unit, src, catalog);
    let ctx = TestContext {
        page_instances: page_names.iter().map(|n| lower_camel(n)).collect(),
    };
    let cases = tests
        .iter()
        .map(|method| {
            let body: Vec<&str> = method
                .body
                .iter()
                .flatten()
                .map(|s| s.text.as_str())
                .collect();
            translate_test_body(&method.name, &body, &ctx)
        })
        .collect();
    let pages = page_names
        .into_iter()
        .map(|name| {
            let module = relative_module_path(test_out_dir, &catalog.out_dir, &name);
            (name, module)
        })
        .collect();

    Some(TestScript {
        class_name,
        pages,
        cases,
        base_url: script.base_url.clone(),
        headless: script.headless,
    })
}

fn script_warnings(script: &TestScript) -> Vec<String> {
    let mut warnings = Vec::new();
    let dropped = script.assertions_dropped();
    if dropped > 0 {
        warnings.push(format!(
            "verification not ported: {} assertion(s) dropped",
            dropped
        ));
    }
    for case in &script.cases {
        for statement in case.statements.iter().filter(|s| s.kind == StatementKind::ReviewComment) {
            warnings.push(format!(
                "{}: needs review: {}",
                case.name,
                statement.rendered_text.trim_start_matches("// ")
            ));
        }
    }
    warnings
}

pub fn convert_test(
    source_path: &Path,
    test_out_dir: &Path,
    catalog: &PageCatalog,
    script: &ScriptConfig,
) -> Result<Option<TestConversion>> {
    let src = std::fs::read_to_string(source_path)
        .map_err(|e| MigrationError::read(source_path, e))?;
    let Some(test_script) = build_test_script(
        &src,
        &file_stem(source_path),
        test_out_dir,
        catalog,
        script,
    ) else {
        return Ok(None);
    };

    let output_path = test_out_dir.join(test_script.file_name());
    write_module(&output_path, &test_script.render())?;
    info!(
        "Converted test {} -> {} ({} tests)",
        source_path.display(),
        output_path.display(),
        test_script.cases.len()
    );

    Ok(Some(TestConversion {
        class_name: test_script.class_name.clone(),
        output_path,
        test_names: test_script.cases.iter().map(|c| c.name.clone()).collect(),
        warnings: script_warnings(&test_script),
    }))
}

//! Page method body translation.
//!
//! Each statement runs through [`PAGE_DETECTORS`] in order and the first
//! detector that claims it decides the output. Statements nobody claims are
//! dropped.

use super::locators::LocatorTable;
use super::selector::resolve;
use crate::types::{Selector, StatementKind, TranslatedStatement};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// Receiver of an element call: a locator name, optionally behind `this.`,
/// or an inline `driver.findElement(...)`.
const TARGET: &str = r"(?:^|[^\w.])(?:this\s*\.\s*)?(?P<target>\w+\s*\.\s*findElement\s*\(.*?\)|\w+)";

static FILL: LazyLock<Regex> = LazyLock::new(|| element_call("sendKeys", r"(?P<value>.*)"));
static CLICK: LazyLock<Regex> = LazyLock::new(|| element_call("click", r"\s*"));
static VISIBILITY: LazyLock<Regex> = LazyLock::new(|| element_call("isDisplayed", r"\s*"));

static TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^return\s+(?:this\s*\.\s*)?\w+\s*\.\s*getTitle\s*\(\s*\)").expect("static title pattern")
});

static TRANSITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^return\s+new\s+(\w+)\s*\(").expect("static transition pattern")
});

static INLINE_LOOKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\w+\s*\.\s*findElement\s*\((.*)\)$").expect("static lookup pattern")
});

fn element_call(method: &str, arguments: &str) -> Regex {
    let pattern = format!(r"{}\s*\.\s*{}\s*\({}\)", TARGET, method, arguments);
    Regex::new(&pattern).expect("static element call pattern")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageDetector {
    Fill,
    Click,
    Visibility,
    Title,
    Transition,
    ScriptEscape,
}

/// Detector precedence. Earlier entries win.
pub const PAGE_DETECTORS: [PageDetector; 6] = [
    PageDetector::Fill,
    PageDetector::Click,
    PageDetector::Visibility,
    PageDetector::Title,
    PageDetector::Transition,
    PageDetector::ScriptEscape,
];

impl PageDetector {
    pub fn name(&self) -> &'static str {
        match self {
            PageDetector::Fill => "fill",
            PageDetector::Click => "click",
            PageDetector::Visibility => "visibility",
            PageDetector::Title => "title",
            PageDetector::Transition => "transition",
            PageDetector::ScriptEscape => "script-escape",
        }
    }

    /// Returns `None` when the statement is not this detector's shape.
    pub fn apply(&self, statement: &str, table: &LocatorTable) -> Option<TranslatedStatement> {
        match self {
            PageDetector::Fill => {
                let caps = FILL.captures(statement)?;
                let value = caps["value"].trim().to_string();
                Some(with_target(&caps["target"], statement, table, |selector| {
                    TranslatedStatement::new(
                        StatementKind::Fill,
                        format!("await this.page.fill({}, {});", selector.to_ts_literal(), value),
                    )
                }))
            }
            PageDetector::Click => {
                let caps = CLICK.captures(statement)?;
                Some(with_target(&caps["target"], statement, table, |selector| {
                    TranslatedStatement::new(
                        StatementKind::Click,
                        format!("await this.page.click({});", selector.to_ts_literal()),
                    )
                }))
            }
            PageDetector::Visibility => {
                let caps = VISIBILITY.captures(statement)?;
                Some(with_target(&caps["target"], statement, table, |selector| {
                    TranslatedStatement::new(
                        StatementKind::VisibilityQuery,
                        format!("return await this.page.isVisible({});", selector.to_ts_literal()),
                    )
                }))
            }
            PageDetector::Title => {
                TITLE.is_match(statement).then(|| {
                    TranslatedStatement::new(StatementKind::TitleQuery, "return await this.page.title();")
                })
            }
            PageDetector::Transition => {
                let caps = TRANSITION.captures(statement)?;
                Some(TranslatedStatement::new(
                    StatementKind::TransitionComment,
                    format!("// Page transition to {}", &caps[1]),
                ))
            }
            PageDetector::ScriptEscape => {
                let mentions_script =
                    statement.contains("executeScript") || statement.contains("executeAsyncScript");
                mentions_script.then(|| {
                    TranslatedStatement::new(
                        StatementKind::ReviewComment,
                        "// JavaScript executor call (review manually)",
                    )
                })
            }
        }
    }
}

/// Resolves an element-call receiver, falling back to a review marker when
/// the locator is unknown.
fn with_target(
    target: &str,
    statement: &str,
    table: &LocatorTable,
    emit: impl FnOnce(&Selector) -> TranslatedStatement,
) -> TranslatedStatement {
    if let Some(caps) = INLINE_LOOKUP.captures(target) {
        return match resolve(&caps[1]) {
            Some(selector) => emit(&selector),
            None => TranslatedStatement::review("Unresolved element lookup", statement),
        };
    }
    match table.selector(target) {
        Some(selector) => emit(selector),
        None => TranslatedStatement::review(&format!("Unknown locator '{}'", target), statement),
    }
}

pub fn translate_statement(statement: &str, table: &LocatorTable) -> Option<TranslatedStatement> {
    let translated = PAGE_DETECTORS
        .iter()
        .find_map(|detector| detector.apply(statement, table));
    if translated.is_none() {
        debug!("Dropping untranslated statement: {}", statement);
    }
    translated
}

/// Translates a method body. Never returns an empty sequence: a body with
/// nothing recognizable yields a single pending marker.
pub fn translate<S: AsRef<str>>(body_lines: &[S], table: &LocatorTable) -> Vec<TranslatedStatement> {
    let statements: Vec<TranslatedStatement> = body_lines
        .iter()
        .filter_map(|line| translate_statement(line.as_ref(), table))
        .collect();
    if statements.is_empty() {
        vec![TranslatedStatement::pending()]
    } else {
        statements
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::locators::build_table_from_source;

    fn table() -> LocatorTable {
        build_table_from_source(
            r#"
class LoginPage {
    @FindBy(id = "username") WebElement username;
    @FindBy(xpath = "//input[@type='submit']") WebElement loginBtn;
    @FindBy(className = "logo") WebElement logo;
}
"#,
        )
    }

    #[test]
    fn test_fill_uses_resolved_selector_and_passes_value_through() {
        let out = translate(&["username.sendKeys(value)"], &table());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, StatementKind::Fill);
        assert_eq!(out[0].rendered_text, "await this.page.fill('#username', value);");
    }

    #[test]
    fn test_click_with_escaped_xpath_uses_backticks() {
        let out = translate(&["this.loginBtn.click()"], &table());
        assert_eq!(
            out[0].rendered_text,
            r"await this.page.click(`xpath=//input[@type=\'submit\']`);"
        );
    }

    #[test]
    fn test_visibility_and_title_are_returned() {
        let out = translate(&["return logo.isDisplayed()", "return driver.getTitle()"], &table());
        assert_eq!(out[0].kind, StatementKind::VisibilityQuery);
        assert_eq!(out[0].rendered_text, "return await this.page.isVisible('.logo');");
        assert_eq!(out[1].rendered_text, "return await this.page.title();");
    }

    #[test]
    fn test_inline_find_element_is_resolved() {
        let out = translate(&[r#"driver.findElement(By.name("q")).sendKeys("rust")"#], &table());
        assert_eq!(out[0].rendered_text, r#"await this.page.fill('[name="q"]', "rust");"#);
    }

    #[test]
    fn test_unknown_locator_becomes_review_marker() {
        let out = translate(&["password.sendKeys(pwd)"], &table());
        assert_eq!(out[0].kind, StatementKind::ReviewComment);
        assert!(out[0].rendered_text.contains("Unknown locator 'password'"));
    }

    #[test]
    fn test_order_is_preserved_with_markers_in_place() {
        let body = [
            "username.sendKeys(un)",
            "JavascriptExecutor js = (JavascriptExecutor) driver",
            "js.executeScript(\"arguments[0].click();\", loginBtn)",
            "loginBtn.click()",
            "return new HomePage()",
        ];
        let kinds: Vec<StatementKind> = translate(&body, &table()).iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                StatementKind::Fill,
                StatementKind::ReviewComment,
                StatementKind::Click,
                StatementKind::TransitionComment,
            ]
        );
    }

    #[test]
    fn test_empty_or_unrecognized_body_yields_pending_marker() {
        let empty: [&str; 0] = [];
        assert_eq!(translate(&empty, &table()), vec![TranslatedStatement::pending()]);
        let out = translate(&["int x = 1", "x++"], &table());
        assert_eq!(out, vec![TranslatedStatement::pending()]);
    }

    #[test]
    fn test_precedence_is_first_match() {
        // both a fill and a script escape; fill is earlier in the list
        let statement = "username.sendKeys(executeScriptResult)";
        let first = PAGE_DETECTORS
            .iter()
            .find(|d| d.apply(statement, &table()).is_some())
            .unwrap();
        assert_eq!(first.name(), "fill");
    }
}

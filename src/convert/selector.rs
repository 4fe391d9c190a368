//! Locator expression to Playwright selector resolution.

use crate::types::{LocatorStrategy, Selector};
use regex::Regex;
use std::sync::LazyLock;

/// Body of a Java string literal, escapes included.
const JAVA_STRING: &str = r#""((?:[^"\\]|\\.)*)""#;

static BY_CALLS: LazyLock<Vec<(LocatorStrategy, Regex)>> = LazyLock::new(|| {
    [
        (LocatorStrategy::Id, "id"),
        (LocatorStrategy::Name, "name"),
        (LocatorStrategy::ClassName, "className"),
        (LocatorStrategy::Css, "cssSelector"),
        (LocatorStrategy::XPath, "xpath"),
    ]
    .into_iter()
    .map(|(strategy, method)| {
        let pattern = format!(r"\bBy\s*\.\s*{}\s*\(\s*{}\s*\)", method, JAVA_STRING);
        (strategy, Regex::new(&pattern).expect("static locator pattern"))
    })
    .collect()
});

static BARE_STRING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""((?:[^"\\]|\\.)+)""#).expect("static string pattern"));

/// Renders a strategy and its raw value into selector syntax. This is the
/// only place XPath quotes are escaped.
pub fn render(strategy: LocatorStrategy, value: &str) -> Selector {
    let raw = match strategy {
        LocatorStrategy::Id => format!("#{}", value),
        LocatorStrategy::Name => format!("[name=\"{}\"]", value),
        LocatorStrategy::ClassName => format!(".{}", value),
        LocatorStrategy::Css | LocatorStrategy::Literal => value.to_string(),
        LocatorStrategy::XPath => format!("xpath={}", value.replace('\'', "\\'")),
    };
    Selector::new(raw)
}

/// Finds the first recognizable locator inside `expression`, returning the
/// strategy, the raw value and the rendered selector.
pub fn resolve_parts(expression: &str) -> Option<(LocatorStrategy, String, Selector)> {
    for (strategy, pattern) in BY_CALLS.iter() {
        if let Some(caps) = pattern.captures(expression) {
            let value = caps[1].to_string();
            let selector = render(*strategy, &value);
            return Some((*strategy, value, selector));
        }
    }
    let caps = BARE_STRING.captures(expression)?;
    let value = caps[1].to_string();
    let selector = render(LocatorStrategy::Literal, &value);
    Some((LocatorStrategy::Literal, value, selector))
}

/// Resolves a locator-construction expression. `None` means "could not
/// resolve"; the caller decides whether that omits or flags the statement.
pub fn resolve(expression: &str) -> Option<Selector> {
    resolve_parts(expression).map(|(_, _, selector)| selector)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_strategy_renders() {
        assert_eq!(resolve(r#"By.id("username")"#).unwrap().as_str(), "#username");
        assert_eq!(
            resolve(r#"By.name("password")"#).unwrap().as_str(),
            r#"[name="password"]"#
        );
        assert_eq!(resolve(r#"By.className("logo")"#).unwrap().as_str(), ".logo");
        assert_eq!(
            resolve(r#"By.cssSelector("div > a.nav")"#).unwrap().as_str(),
            "div > a.nav"
        );
        assert_eq!(
            resolve(r#"By.xpath("//td[text()='Deals']")"#).unwrap().as_str(),
            r"xpath=//td[text()=\'Deals\']"
        );
    }

    #[test]
    fn test_bare_string_is_used_verbatim() {
        assert_eq!(resolve(r#"By.linkText("Contacts")"#).unwrap().as_str(), "Contacts");
        assert_eq!(resolve(r##""#btn""##).unwrap().as_str(), "#btn");
    }

    #[test]
    fn test_priority_prefers_by_call_over_bare_string() {
        let (strategy, value, _) =
            resolve_parts(r#"driver.findElement(By.name("q"))"#).unwrap();
        assert_eq!(strategy, LocatorStrategy::Name);
        assert_eq!(value, "q");
    }

    #[test]
    fn test_tolerates_spacing_and_escaped_quotes() {
        let selector = resolve(r#"By . xpath ( "//a[@title=\"x\"]" )"#).unwrap();
        assert_eq!(selector.as_str(), r#"xpath=//a[@title=\"x\"]"#);
    }

    #[test]
    fn test_unresolvable_returns_none() {
        assert!(resolve("locatorFor(name)").is_none());
        assert!(resolve(r#""""#).is_none());
    }

    #[test]
    fn test_ts_literal_quoting() {
        assert_eq!(render(LocatorStrategy::Id, "a").to_ts_literal(), "'#a'");
        assert_eq!(
            render(LocatorStrategy::XPath, "//a[@id='x']").to_ts_literal(),
            r"`xpath=//a[@id=\'x\']`"
        );
    }
}

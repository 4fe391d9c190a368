use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LocatorStrategy {
    Id,
    Name,
    ClassName,
    Css,
    XPath,
    Literal,
}

impl LocatorStrategy {
    /// Strategy named by a `By.<method>(...)` factory call.
    pub fn from_by_method(method: &str) -> Option<Self> {
        match method {
            "id" => Some(Self::Id),
            "name" => Some(Self::Name),
            "className" => Some(Self::ClassName),
            "cssSelector" => Some(Self::Css),
            "xpath" => Some(Self::XPath),
            _ => None,
        }
    }

    /// Strategy named by a `@FindBy(<key> = "...")` attribute.
    pub fn from_annotation_key(key: &str) -> Option<Self> {
        match key {
            "id" => Some(Self::Id),
            "name" => Some(Self::Name),
            "className" => Some(Self::ClassName),
            "css" => Some(Self::Css),
            "xpath" => Some(Self::XPath),
            _ => None,
        }
    }

    /// Strategy named by a `How.<CONSTANT>` in `@FindBy(how = ..., using = ...)`.
    pub fn from_how(constant: &str) -> Option<Self> {
        match constant.rsplit('.').next().unwrap_or(constant) {
            "ID" => Some(Self::Id),
            "NAME" => Some(Self::Name),
            "CLASS_NAME" => Some(Self::ClassName),
            "CSS" => Some(Self::Css),
            "XPATH" => Some(Self::XPath),
            _ => None,
        }
    }
}

/// A selector in Playwright syntax. Any escaping it needs has already been
/// applied by the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selector(String);

impl Selector {
    pub(crate) fn new(raw: String) -> Self {
        Self(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// TypeScript string literal for this selector. Backticks are used when
    /// the selector holds a single quote so escaped XPath quotes survive.
    pub fn to_ts_literal(&self) -> String {
        if self.0.contains('\'') {
            format!("`{}`", self.0)
        } else {
            format!("'{}'", self.0)
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeclarationShape {
    /// `@FindBy(...) WebElement name;`
    FindByField,
    /// `By name = By.id("...");`
    ByDeclaration,
    /// `WebElement name = driver.findElement(...);`
    FindElementDeclaration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub shape: DeclarationShape,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorEntry {
    pub name: String,
    pub strategy: LocatorStrategy,
    pub value: String,
    pub selector: Selector,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    pub parameter_names: Vec<String>,
    pub body_lines: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatementKind {
    Fill,
    Click,
    VisibilityQuery,
    TitleQuery,
    TransitionComment,
    ReviewComment,
    RawPassthrough,
    Navigate,
    MethodCall,
    Pending,
}

impl StatementKind {
    pub fn is_comment(&self) -> bool {
        matches!(
            self,
            Self::TransitionComment | Self::ReviewComment | Self::Pending
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatedStatement {
    pub kind: StatementKind,
    pub rendered_text: String,
}

impl TranslatedStatement {
    pub fn new(kind: StatementKind, rendered_text: impl Into<String>) -> Self {
        Self {
            kind,
            rendered_text: rendered_text.into(),
        }
    }

    /// Review marker quoting `source`. The marker stays a single line
    /// comment even when the source spans several lines.
    pub fn review(reason: &str, source: &str) -> Self {
        let source = source.lines().map(str::trim).collect::<Vec<_>>().join(" ");
        Self::new(
            StatementKind::ReviewComment,
            format!("// {}: {} (review manually)", reason, source),
        )
    }

    pub fn pending() -> Self {
        Self::new(StatementKind::Pending, "// TODO: Add implementation")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Page,
    Test,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitKind::Page => f.write_str("page"),
            UnitKind::Test => f.write_str("test"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_marker_is_a_single_line() {
        let marker = TranslatedStatement::review(
            "Driver call not converted",
            "driver.executeScript(\"\"\"\n    return 1;\r\n  \"\"\")",
        );
        assert!(!marker.rendered_text.contains('\n'));
        assert!(!marker.rendered_text.contains('\r'));
        assert_eq!(
            marker.rendered_text,
            r#"// Driver call not converted: driver.executeScript(""" return 1; """) (review manually)"#
        );
    }
}

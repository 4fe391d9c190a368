//! Tolerant recursive-descent scanner over the token stream.
//!
//! Builds a shallow tree: unit -> classes -> (fields, methods) -> statements.
//! Nothing here fails. Unbalanced input closes whatever node is open at end
//! of input, and tokens that fit no rule are skipped.

use super::lexer::{join_tokens, tokenize, Token, TokenKind};
use serde::Serialize;

const MODIFIERS: &[&str] = &[
    "public",
    "protected",
    "private",
    "static",
    "final",
    "abstract",
    "synchronized",
    "native",
    "transient",
    "volatile",
    "strictfp",
    "default",
    "sealed",
];

const TYPE_KEYWORDS: &[&str] = &["class", "interface", "enum", "record"];

const HEADER_KEYWORDS: &[&str] = &["if", "while", "for", "switch", "synchronized", "catch"];

const PREFIX_KEYWORDS: &[&str] = &["else", "try", "finally", "do"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    pub name: String,
    /// Raw text between the parentheses, if any.
    pub arguments: Option<String>,
}

impl Annotation {
    /// Matches on the simple name, so `@org.testng.annotations.Test` is `Test`.
    pub fn is(&self, simple_name: &str) -> bool {
        self.name.rsplit('.').next() == Some(simple_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Import {
    pub path: String,
    pub is_static: bool,
}

impl Import {
    pub fn is_wildcard(&self) -> bool {
        self.path.ends_with(".*")
    }

    pub fn simple_name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }

    pub fn package_segments(&self) -> impl Iterator<Item = &str> {
        let mut parts: Vec<&str> = self.path.split('.').collect();
        parts.pop();
        parts.into_iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statement {
    pub text: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldNode {
    pub annotations: Vec<Annotation>,
    pub modifiers: Vec<String>,
    pub type_text: String,
    pub name: String,
    pub initializer: Option<String>,
    pub line: usize,
}

impl FieldNode {
    /// The declaration without modifiers or annotations, as it would read
    /// inside a method body.
    pub fn declaration_text(&self) -> String {
        match &self.initializer {
            Some(init) => format!("{} {} = {}", self.type_text, self.name, init),
            None => format!("{} {}", self.type_text, self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodNode {
    pub annotations: Vec<Annotation>,
    pub modifiers: Vec<String>,
    pub name: String,
    pub parameter_names: Vec<String>,
    pub body: Option<Vec<Statement>>,
    pub line: usize,
}

impl MethodNode {
    pub fn has_annotation(&self, simple_name: &str) -> bool {
        self.annotations.iter().any(|a| a.is(simple_name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassNode {
    pub name: String,
    pub modifiers: Vec<String>,
    pub annotations: Vec<Annotation>,
    pub fields: Vec<FieldNode>,
    pub methods: Vec<MethodNode>,
    pub nested: Vec<ClassNode>,
    pub line: usize,
}

impl ClassNode {
    pub fn is_public(&self) -> bool {
        self.modifiers.iter().any(|m| m == "public")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceUnit {
    pub package: Option<String>,
    pub imports: Vec<Import>,
    pub classes: Vec<ClassNode>,
}

impl SourceUnit {
    pub fn parse(src: &str) -> Self {
        let tokens = tokenize(src);
        Scanner {
            src,
            tokens: &tokens,
            pos: 0,
        }
        .unit()
    }

    /// First top-level `public class` declaration.
    pub fn public_class(&self) -> Option<&ClassNode> {
        self.classes.iter().find(|c| c.is_public())
    }

    /// The class a converter should work on: the public class, else the
    /// first class found.
    pub fn primary_class(&self) -> Option<&ClassNode> {
        self.public_class().or_else(|| self.classes.first())
    }
}

struct Scanner<'s, 't> {
    src: &'s str,
    tokens: &'t [Token<'s>],
    pos: usize,
}

impl<'s, 't> Scanner<'s, 't> {
    fn peek(&self) -> Option<&Token<'s>> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, ahead: usize) -> Option<&Token<'s>> {
        self.tokens.get(self.pos + ahead)
    }

    fn at_punct(&self, c: char) -> bool {
        self.peek().is_some_and(|t| t.is_punct(c))
    }

    fn line(&self) -> usize {
        self.peek()
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(1)
    }

    fn text(&self, from: usize, to: usize) -> String {
        join_tokens(self.src, &self.tokens[from..to.min(self.tokens.len())])
    }

    /// Advances past the group opened at the current token and returns the
    /// index range of its contents.
    fn balanced(&mut self, open: char, close: char) -> (usize, usize) {
        self.pos += 1;
        let start = self.pos;
        let mut depth = 1usize;
        while let Some(token) = self.peek().copied() {
            if token.is_punct(open) {
                depth += 1;
            } else if token.is_punct(close) {
                depth -= 1;
                if depth == 0 {
                    let end = self.pos;
                    self.pos += 1;
                    return (start, end);
                }
            }
            self.pos += 1;
        }
        (start, self.tokens.len())
    }

    /// Collects tokens until `;` at nesting depth zero. Stops without
    /// consuming on an unmatched `}` so the enclosing block can close.
    fn until_semicolon(&mut self) -> (usize, usize) {
        let start = self.pos;
        let mut depth = 0i32;
        while let Some(token) = self.peek().copied() {
            if token.kind == TokenKind::Punct {
                match token.text {
                    "(" | "[" | "{" => depth += 1,
                    ")" | "]" => depth -= 1,
                    "}" => {
                        if depth == 0 {
                            return (start, self.pos);
                        }
                        depth -= 1;
                    }
                    ";" if depth <= 0 => {
                        let end = self.pos;
                        self.pos += 1;
                        return (start, end);
                    }
                    _ => {}
                }
            }
            self.pos += 1;
        }
        (start, self.tokens.len())
    }

    /// `Ident ('.' (Ident | '*'))*`. Two identifiers in a row end the name.
    fn qualified_name(&mut self) -> String {
        let mut name = String::new();
        let mut want_segment = true;
        while let Some(token) = self.peek().copied() {
            let accepted = if want_segment {
                token.kind == TokenKind::Ident || (!name.is_empty() && token.is_punct('*'))
            } else {
                token.is_punct('.')
            };
            if !accepted {
                break;
            }
            name.push_str(token.text);
            want_segment = !want_segment;
            self.pos += 1;
        }
        name
    }

    fn unit(mut self) -> SourceUnit {
        let mut unit = SourceUnit::default();
        while let Some(token) = self.peek().copied() {
            if token.is_ident("package") {
                self.pos += 1;
                unit.package = Some(self.qualified_name());
                self.until_semicolon();
            } else if token.is_ident("import") {
                self.pos += 1;
                let is_static = self.peek().is_some_and(|t| t.is_ident("static"));
                if is_static {
                    self.pos += 1;
                }
                let path = self.qualified_name();
                self.until_semicolon();
                unit.imports.push(Import { path, is_static });
            } else {
                let (annotations, modifiers) = self.modifiers();
                match self.type_declaration(annotations, modifiers) {
                    Some(class) => unit.classes.push(class),
                    None => self.pos += 1,
                }
            }
        }
        unit
    }

    fn annotation(&mut self) -> Annotation {
        self.pos += 1;
        let name = self.qualified_name();
        let arguments = if self.at_punct('(') {
            let (start, end) = self.balanced('(', ')');
            Some(self.text(start, end))
        } else {
            None
        };
        Annotation { name, arguments }
    }

    fn modifiers(&mut self) -> (Vec<Annotation>, Vec<String>) {
        let mut annotations = Vec::new();
        let mut modifiers = Vec::new();
        while let Some(token) = self.peek().copied() {
            if token.is_punct('@') {
                let is_annotation_type = self.peek_at(1).is_some_and(|t| t.is_ident("interface"));
                if is_annotation_type {
                    break;
                }
                annotations.push(self.annotation());
            } else if token.kind == TokenKind::Ident && MODIFIERS.contains(&token.text) {
                modifiers.push(token.text.to_string());
                self.pos += 1;
            } else {
                break;
            }
        }
        (annotations, modifiers)
    }

    fn type_declaration(
        &mut self,
        annotations: Vec<Annotation>,
        modifiers: Vec<String>,
    ) -> Option<ClassNode> {
        if self.at_punct('@') {
            // @interface
            self.pos += 1;
        }
        let keyword = self.peek().copied()?;
        if keyword.kind != TokenKind::Ident || !TYPE_KEYWORDS.contains(&keyword.text) {
            return None;
        }
        let line = keyword.line;
        self.pos += 1;
        let name = match self.peek() {
            Some(t) if t.kind == TokenKind::Ident => t.text.to_string(),
            _ => return None,
        };
        self.pos += 1;
        while let Some(token) = self.peek().copied() {
            if token.is_punct('{') {
                break;
            }
            if token.is_punct('(') {
                // record header
                self.balanced('(', ')');
                continue;
            }
            self.pos += 1;
        }

        let mut class = ClassNode {
            name,
            modifiers,
            annotations,
            fields: Vec::new(),
            methods: Vec::new(),
            nested: Vec::new(),
            line,
        };
        if self.at_punct('{') {
            self.class_body(&mut class);
        }
        Some(class)
    }

    fn class_body(&mut self, class: &mut ClassNode) {
        self.pos += 1;
        while let Some(token) = self.peek().copied() {
            if token.is_punct('}') {
                self.pos += 1;
                return;
            }
            if token.is_punct(';') {
                self.pos += 1;
                continue;
            }
            let (annotations, modifiers) = self.modifiers();
            let starts_type = self.peek().is_some_and(|t| {
                t.is_punct('@') || (t.kind == TokenKind::Ident && TYPE_KEYWORDS.contains(&t.text))
            });
            if starts_type {
                let before = self.pos;
                match self.type_declaration(annotations, modifiers) {
                    Some(nested) => class.nested.push(nested),
                    None if self.pos == before => self.pos += 1,
                    None => {}
                }
                continue;
            }
            if self.at_punct('{') {
                // initializer block
                self.balanced('{', '}');
                continue;
            }
            self.member(class, annotations, modifiers);
        }
    }

    fn member(&mut self, class: &mut ClassNode, annotations: Vec<Annotation>, modifiers: Vec<String>) {
        let start = self.pos;
        let line = self.line();
        while let Some(token) = self.peek().copied() {
            if token.kind != TokenKind::Punct {
                self.pos += 1;
                continue;
            }
            match token.text {
                "(" => {
                    let name_index = self.pos.checked_sub(1).filter(|&i| i >= start);
                    let Some(name_token) = name_index.map(|i| self.tokens[i]) else {
                        self.balanced('(', ')');
                        continue;
                    };
                    let (p_start, p_end) = self.balanced('(', ')');
                    let parameter_names = self.parameter_names(p_start, p_end);
                    let body = self.method_tail();
                    class.methods.push(MethodNode {
                        annotations,
                        modifiers,
                        name: name_token.text.to_string(),
                        parameter_names,
                        body,
                        line,
                    });
                    return;
                }
                "=" => {
                    let name = self.name_before(start);
                    let type_text = self.text(start, self.pos.saturating_sub(1));
                    self.pos += 1;
                    let (i_start, i_end) = self.until_semicolon();
                    class.fields.push(FieldNode {
                        annotations,
                        modifiers,
                        type_text,
                        name,
                        initializer: Some(self.text(i_start, i_end)),
                        line,
                    });
                    return;
                }
                ";" => {
                    let name = self.name_before(start);
                    let type_text = self.text(start, self.pos.saturating_sub(1));
                    self.pos += 1;
                    class.fields.push(FieldNode {
                        annotations,
                        modifiers,
                        type_text,
                        name,
                        initializer: None,
                        line,
                    });
                    return;
                }
                "{" => {
                    self.balanced('{', '}');
                    return;
                }
                "}" => return,
                _ => self.pos += 1,
            }
        }
    }

    fn name_before(&self, start: usize) -> String {
        self.tokens[start..self.pos]
            .iter()
            .rev()
            .find(|t| t.kind == TokenKind::Ident)
            .map(|t| t.text.to_string())
            .unwrap_or_default()
    }

    fn parameter_names(&self, start: usize, end: usize) -> Vec<String> {
        let mut names = Vec::new();
        let mut depth = 0i32;
        let mut last_ident: Option<&str> = None;
        for token in &self.tokens[start..end] {
            if token.kind == TokenKind::Punct {
                match token.text {
                    "(" | "<" | "[" => depth += 1,
                    ")" | ">" | "]" => depth -= 1,
                    "," if depth == 0 => {
                        if let Some(name) = last_ident.take() {
                            names.push(name.to_string());
                        }
                    }
                    _ => {}
                }
            } else if token.kind == TokenKind::Ident && depth == 0 {
                last_ident = Some(token.text);
            }
        }
        if let Some(name) = last_ident {
            names.push(name.to_string());
        }
        names
    }

    /// Skips a `throws` clause and reads the body, if there is one.
    fn method_tail(&mut self) -> Option<Vec<Statement>> {
        while let Some(token) = self.peek().copied() {
            if token.is_punct('{') {
                let mut statements = Vec::new();
                self.block(&mut statements);
                return Some(statements);
            }
            if token.is_punct(';') {
                self.pos += 1;
                return None;
            }
            if token.is_punct('}') {
                return None;
            }
            self.pos += 1;
        }
        None
    }

    fn block(&mut self, out: &mut Vec<Statement>) {
        self.pos += 1;
        while let Some(token) = self.peek().copied() {
            if token.is_punct('}') {
                self.pos += 1;
                return;
            }
            self.statement(out);
        }
    }

    fn statement(&mut self, out: &mut Vec<Statement>) {
        let Some(token) = self.peek().copied() else {
            return;
        };
        if token.is_punct('{') {
            self.block(out);
            return;
        }
        if token.is_punct(';') {
            self.pos += 1;
            return;
        }
        if token.kind == TokenKind::Ident && HEADER_KEYWORDS.contains(&token.text) {
            let start = self.pos;
            self.pos += 1;
            if self.at_punct('(') {
                self.balanced('(', ')');
            }
            out.push(Statement {
                text: self.text(start, self.pos),
                line: token.line,
            });
            if self.peek().is_some_and(|t| !t.is_punct('}')) {
                self.statement(out);
            }
            return;
        }
        if token.kind == TokenKind::Ident && PREFIX_KEYWORDS.contains(&token.text) {
            self.pos += 1;
            if token.text == "try" && self.at_punct('(') {
                let (start, end) = self.balanced('(', ')');
                out.push(Statement {
                    text: self.text(start, end),
                    line: token.line,
                });
            }
            return;
        }

        let (start, end) = self.until_semicolon();
        if end > start {
            out.push(Statement {
                text: self.text(start, end),
                line: token.line,
            });
        } else if self.pos == start {
            // unmatched closer; the block loop handles `}`
            if !self.at_punct('}') {
                self.pos += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN_PAGE: &str = r#"
package com.crm.qa.pages;

import org.openqa.selenium.WebElement;
import org.openqa.selenium.support.FindBy;
import com.crm.qa.base.TestBase;

public class LoginPage extends TestBase {

    // Page Factory - OR:
    @FindBy(name = "username")
    WebElement username;

    @FindBy(xpath = "//input[@type='submit']")
    WebElement loginBtn;

    public LoginPage() {
        PageFactory.initElements(driver, this);
    }

    public String validateLoginPageTitle() {
        return driver.getTitle();
    }

    public HomePage login(String un, final String pwd) throws InterruptedException {
        username.sendKeys(un);
        if (loginBtn.isEnabled()) {
            loginBtn.click();
        }
        return new HomePage();
    }
}
"#;

    #[test]
    fn test_parses_package_imports_and_class() {
        let unit = SourceUnit::parse(LOGIN_PAGE);
        assert_eq!(unit.package.as_deref(), Some("com.crm.qa.pages"));
        assert_eq!(unit.imports.len(), 3);
        assert_eq!(unit.imports[2].simple_name(), "TestBase");

        let class = unit.public_class().unwrap();
        assert_eq!(class.name, "LoginPage");
        assert_eq!(class.fields.len(), 2);
        assert_eq!(class.fields[0].name, "username");
        assert_eq!(class.fields[0].type_text, "WebElement");
        assert!(class.fields[1].annotations[0].is("FindBy"));
        assert_eq!(
            class.fields[1].annotations[0].arguments.as_deref(),
            Some(r#"xpath = "//input[@type='submit']""#)
        );
    }

    #[test]
    fn test_methods_keep_parameter_names_and_statement_order() {
        let unit = SourceUnit::parse(LOGIN_PAGE);
        let class = unit.public_class().unwrap();
        let names: Vec<&str> = class.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["LoginPage", "validateLoginPageTitle", "login"]);

        let login = &class.methods[2];
        assert_eq!(login.parameter_names, vec!["un", "pwd"]);
        let body: Vec<&str> = login
            .body
            .as_ref()
            .unwrap()
            .iter()
            .map(|s| s.text.as_str())
            .collect();
        assert_eq!(
            body,
            vec![
                "username.sendKeys(un)",
                "if (loginBtn.isEnabled())",
                "loginBtn.click()",
                "return new HomePage()",
            ]
        );
    }

    #[test]
    fn test_generic_parameters_split_on_top_level_commas() {
        let unit = SourceUnit::parse(
            "class A { void m(Map<String, Integer> counts, @Named(\"x\") int n) { } }",
        );
        let method = &unit.classes[0].methods[0];
        assert_eq!(method.parameter_names, vec!["counts", "n"]);
        assert_eq!(method.body.as_deref(), Some(&[][..]));
    }

    #[test]
    fn test_anonymous_class_stays_inside_one_statement() {
        let unit = SourceUnit::parse(
            "class A { void m() { Runnable r = new Runnable() { public void run() { x(); } }; y(); } }",
        );
        let body = unit.classes[0].methods[0].body.clone().unwrap();
        assert_eq!(body.len(), 2);
        assert_eq!(body[1].text, "y()");
    }

    #[test]
    fn test_truncated_source_does_not_panic() {
        let unit = SourceUnit::parse("public class Broken { public void m() { a.click();");
        let class = unit.public_class().unwrap();
        assert_eq!(class.methods[0].body.as_ref().unwrap()[0].text, "a.click()");
    }

    #[test]
    fn test_bare_annotations_do_not_swallow_the_declaration() {
        let unit = SourceUnit::parse(
            "public class LoginPageTest {\n    @BeforeMethod\n    public void setUp() { init(); }\n\n    @Test\n    public void loginTest() { loginPage.login(\"u\"); }\n}",
        );
        let class = unit.public_class().unwrap();
        let names: Vec<&str> = class.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["setUp", "loginTest"]);
        assert_eq!(class.methods[0].annotations[0].name, "BeforeMethod");
        assert_eq!(class.methods[1].annotations[0].name, "Test");
        assert_eq!(class.methods[1].modifiers, vec!["public"]);
        assert!(class.methods[1].has_annotation("Test"));
    }

    #[test]
    fn test_qualified_annotation_and_wildcard_import_names() {
        let unit = SourceUnit::parse(
            "import com.crm.qa.pages.*;\nclass A { @org.testng.annotations.Test void t() { } }",
        );
        assert_eq!(unit.imports[0].path, "com.crm.qa.pages.*");
        let method = &unit.classes[0].methods[0];
        assert_eq!(method.annotations[0].name, "org.testng.annotations.Test");
        assert_eq!(method.name, "t");
    }

    #[test]
    fn test_test_annotations_are_recorded_on_methods() {
        let unit = SourceUnit::parse(
            "public class T { @Test(priority = 1) public void a() { } @BeforeMethod public void setUp() { } }",
        );
        let class = unit.public_class().unwrap();
        assert!(class.methods[0].has_annotation("Test"));
        assert!(!class.methods[1].has_annotation("Test"));
    }
}

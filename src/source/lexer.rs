//! Minimal Java tokenizer.
//!
//! Produces just enough structure for the scanner: identifiers, literals and
//! single-character punctuation, each carrying its byte span and 1-based
//! line. Comments and whitespace are skipped. Malformed input (an
//! unterminated string or comment) is tolerated by running to end of input.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Str,
    Char,
    Number,
    Punct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
    pub line: usize,
}

impl<'a> Token<'a> {
    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punct && self.text.starts_with(c)
    }

    pub fn is_ident(&self, word: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == word
    }
}

struct Lexer<'a> {
    src: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.char_indices().collect(),
            pos: 0,
            line: 1,
        }
    }

    fn peek(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).map(|&(_, c)| c)
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map(|&(i, _)| i)
            .unwrap_or(self.src.len())
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek(0)?;
        if c == '\n' {
            self.line += 1;
        }
        self.pos += 1;
        Some(c)
    }

    fn skip_trivia(&mut self) {
        loop {
            match (self.peek(0), self.peek(1)) {
                (Some(c), _) if c.is_whitespace() => {
                    self.bump();
                }
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.peek(0) {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                (Some('/'), Some('*')) => {
                    self.bump();
                    self.bump();
                    while let Some(c) = self.bump() {
                        if c == '*' && self.peek(0) == Some('/') {
                            self.bump();
                            break;
                        }
                    }
                }
                _ => return,
            }
        }
    }

    fn quoted(&mut self, quote: char) {
        self.bump();
        while let Some(c) = self.bump() {
            if c == '\\' {
                self.bump();
            } else if c == quote || (c == '\n' && quote == '\'') {
                break;
            }
        }
    }

    fn text_block(&mut self) {
        for _ in 0..3 {
            self.bump();
        }
        while self.peek(0).is_some() {
            if self.peek(0) == Some('"') && self.peek(1) == Some('"') && self.peek(2) == Some('"') {
                for _ in 0..3 {
                    self.bump();
                }
                return;
            }
            if self.peek(0) == Some('\\') {
                self.bump();
            }
            self.bump();
        }
    }

    fn next_token(&mut self) -> Option<Token<'a>> {
        self.skip_trivia();
        let c = self.peek(0)?;
        let start = self.offset();
        let line = self.line;

        let kind = if c == '"' {
            if self.peek(1) == Some('"') && self.peek(2) == Some('"') {
                self.text_block();
            } else {
                self.quoted('"');
            }
            TokenKind::Str
        } else if c == '\'' {
            self.quoted('\'');
            TokenKind::Char
        } else if c.is_alphabetic() || c == '_' || c == '$' {
            while matches!(self.peek(0), Some(c) if c.is_alphanumeric() || c == '_' || c == '$') {
                self.bump();
            }
            TokenKind::Ident
        } else if c.is_ascii_digit() {
            while matches!(self.peek(0), Some(c) if c.is_alphanumeric() || c == '_' || c == '.') {
                self.bump();
            }
            TokenKind::Number
        } else {
            self.bump();
            TokenKind::Punct
        };

        let end = self.offset();
        Some(Token {
            kind,
            text: &self.src[start..end],
            start,
            end,
            line,
        })
    }
}

pub fn tokenize(src: &str) -> Vec<Token<'_>> {
    let mut lexer = Lexer::new(src);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token() {
        tokens.push(token);
    }
    tokens
}

/// Rebuilds source text from a token run, collapsing any whitespace or
/// comment between two tokens into a single space.
pub fn join_tokens(src: &str, tokens: &[Token<'_>]) -> String {
    let mut out = String::new();
    let mut prev_end: Option<usize> = None;
    for token in tokens {
        if let Some(end) = prev_end {
            if token.start > end && !src[end..token.start].is_empty() {
                out.push(' ');
            }
        }
        out.push_str(token.text);
        prev_end = Some(token.end);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_comments_and_tracks_lines() {
        let src = "// header\nint a = 1; /* block\n comment */ b.click();";
        let tokens = tokenize(src);
        let texts: Vec<&str> = tokens.iter().map(|t| t.text).collect();
        assert_eq!(texts, vec!["int", "a", "=", "1", ";", "b", ".", "click", "(", ")", ";"]);
        assert_eq!(tokens[0].line, 2);
        assert_eq!(tokens[5].line, 3);
    }

    #[test]
    fn test_string_with_escaped_quote_is_one_token() {
        let tokens = tokenize(r#"By.xpath("//a[@title=\"x\"]")"#);
        let strings: Vec<_> = tokens.iter().filter(|t| t.kind == TokenKind::Str).collect();
        assert_eq!(strings.len(), 1);
        assert_eq!(strings[0].text, r#""//a[@title=\"x\"]""#);
    }

    #[test]
    fn test_comment_markers_inside_strings_are_kept() {
        let tokens = tokenize(r#"driver.get("http://example.com");"#);
        assert!(tokens.iter().any(|t| t.text == r#""http://example.com""#));
    }

    #[test]
    fn test_join_normalizes_multiline_expressions() {
        let src = "username\n    .sendKeys( value )";
        let tokens = tokenize(src);
        assert_eq!(join_tokens(src, &tokens), "username .sendKeys( value )");
    }

    #[test]
    fn test_unterminated_string_runs_to_end() {
        let tokens = tokenize("a = \"open");
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Str));
    }
}

use crate::error::{Error, Result};
use std::fmt;

/// Token types for the `@{...}` template syntax
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Text(String),

    // Interpolation
    Variable(String),    // @{name}
    RawVariable(String), // @{!name}

    // Control flow
    If(String), // @{if path} / @{if !path}
    Else,       // @{else}
    Fi,         // @{fi}

    // Loops
    Foreach(String, String), // @{foreach item in items}
    End,                     // @{end}
    Index,                   // @{index}

    // Layout operations
    Extend(String),  // @{extend('layout')}
    Section(String), // @{section('content')}
    Close,           // @{close}
    Show(String),    // @{show('content')}
    Partial(String), // @{partial('nav')}

    /// Anything that is not valid directive syntax; rejected by the parser
    Unknown(String),

    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize, column: usize) -> Self {
        Self { kind, line, column }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} at {}:{}", self.kind, self.line, self.column)
    }
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    fn current(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) {
        if self.current() == Some('\n') {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.position += 1;
    }

    fn is_directive_start(&self) -> bool {
        self.current() == Some('@') && self.peek() == Some('{')
    }

    fn read_text(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current() {
            if self.is_directive_start() {
                break;
            }
            result.push(ch);
            self.advance();
        }
        result
    }

    /// Read a directive body up to its closing brace, skipping braces inside quotes
    fn read_directive(&mut self, line: usize, column: usize) -> Result<String> {
        self.advance(); // @
        self.advance(); // {

        let mut content = String::new();
        let mut quote: Option<char> = None;

        while let Some(ch) = self.current() {
            match (quote, ch) {
                (None, '}') => {
                    self.advance();
                    return Ok(content);
                }
                (None, '\'' | '"') => quote = Some(ch),
                (Some(q), c) if q == c => quote = None,
                _ => {}
            }
            content.push(ch);
            self.advance();
        }

        Err(Error::template(format!(
            "Unterminated directive at {}:{}",
            line, column
        )))
    }

    pub fn next_token(&mut self) -> Result<Token> {
        let (line, column) = (self.line, self.column);

        if self.current().is_none() {
            return Ok(Token::new(TokenKind::Eof, line, column));
        }

        if self.is_directive_start() {
            let content = self.read_directive(line, column)?;
            return Ok(Token::new(parse_directive(&content), line, column));
        }

        let text = self.read_text();
        Ok(Token::new(TokenKind::Text(text), line, column))
    }

    /// Tokenize the entire input; the last token is always `Eof`
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }
}

/// Classify the inside of `@{...}`
///
/// `else`, `fi`, `end` and `close` are keywords and never read as variables. `index`
/// is the loop counter inside `foreach` and falls back to the `index` binding outside.
pub fn parse_directive(content: &str) -> TokenKind {
    let trimmed = content.trim();

    if let Some(path) = trimmed.strip_prefix('!') {
        let path = path.trim();
        return if is_path(path) {
            TokenKind::RawVariable(path.to_string())
        } else {
            TokenKind::Unknown(trimmed.to_string())
        };
    }

    if let Some(condition) = trimmed.strip_prefix("if ") {
        return TokenKind::If(condition.trim().to_string());
    }

    match trimmed {
        "else" => return TokenKind::Else,
        "fi" => return TokenKind::Fi,
        "end" => return TokenKind::End,
        "index" => return TokenKind::Index,
        "close" | "close()" => return TokenKind::Close,
        _ => {}
    }

    if let Some(rest) = trimmed.strip_prefix("foreach ") {
        if let Some((item, collection)) = rest.split_once(" in ") {
            let (item, collection) = (item.trim(), collection.trim());
            if is_identifier(item) && is_path(collection) {
                return TokenKind::Foreach(item.to_string(), collection.to_string());
            }
        }
        return TokenKind::Unknown(trimmed.to_string());
    }

    let calls: [(&str, fn(String) -> TokenKind); 4] = [
        ("extend", TokenKind::Extend),
        ("section", TokenKind::Section),
        ("show", TokenKind::Show),
        ("partial", TokenKind::Partial),
    ];
    for (name, make) in calls {
        if let Some(argument) = call_argument(trimmed, name) {
            return make(argument);
        }
    }

    if is_path(trimmed) {
        return TokenKind::Variable(trimmed.to_string());
    }

    TokenKind::Unknown(trimmed.to_string())
}

/// `name('value')` or `name("value")` -> `value`
fn call_argument(content: &str, name: &str) -> Option<String> {
    let inner = content
        .strip_prefix(name)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')?
        .trim();

    let unquoted = inner
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| inner.strip_prefix('"').and_then(|s| s.strip_suffix('"')))?;

    if unquoted.is_empty() {
        None
    } else {
        Some(unquoted.to_string())
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Dotted path such as `user.name` or `items.0.title`
pub fn is_path(s: &str) -> bool {
    !s.is_empty()
        && s.split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_alphanumeric() || c == '_'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_text_and_variables() {
        assert_eq!(
            kinds("Hello @{name}, @{! bio }"),
            vec![
                TokenKind::Text("Hello ".into()),
                TokenKind::Variable("name".into()),
                TokenKind::Text(", ".into()),
                TokenKind::RawVariable("bio".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_layout_calls() {
        assert_eq!(
            kinds("@{extend('layouts/main')}@{section(\"content\")}@{close}@{show('content')}@{partial('nav')}"),
            vec![
                TokenKind::Extend("layouts/main".into()),
                TokenKind::Section("content".into()),
                TokenKind::Close,
                TokenKind::Show("content".into()),
                TokenKind::Partial("nav".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_blocks() {
        assert_eq!(
            kinds("@{if !user.admin}@{else}@{fi}@{foreach post in posts}@{index}@{end}"),
            vec![
                TokenKind::If("!user.admin".into()),
                TokenKind::Else,
                TokenKind::Fi,
                TokenKind::Foreach("post".into(), "posts".into()),
                TokenKind::Index,
                TokenKind::End,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unknown_and_unterminated() {
        assert_eq!(
            parse_directive("user name"),
            TokenKind::Unknown("user name".into())
        );
        assert_eq!(parse_directive("section()"), TokenKind::Unknown("section()".into()));

        let err = Lexer::new("line one\n  @{name").tokenize().unwrap_err();
        assert!(err.to_string().contains("2:3"));
    }
}

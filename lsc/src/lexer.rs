//! Lexer for LSF, the console's line script notation
//!
//! Produces a lazy stream of positioned lexemes. Every character of the
//! normalized source (CRLF collapsed to LF, NUL sentinel appended) lands in
//! exactly one lexeme, so concatenating the contents rebuilds the source.

use std::fmt;

use tracing::warn;

use crate::error::{LscError, LscResult};

/// Reserved words. Only lexed; nothing evaluates them.
pub const KEYWORDS: &[&str] = &[
    "function", "true", "false", "null", "return", "if", "else", "for", "from", "to", "while",
];

const SENTINEL: char = '\0';

/// Zero-based position derived from a character offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub location: SourceLocation,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.location)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LexemeKind {
    Whitespace,
    NewLine,
    EndOfFile,

    LeftParen,  // (
    RightParen, // )
    LeftBrace,  // {
    RightBrace, // }
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    Semicolon,  // ;
    Hash,       // #
    Comma,      // ,
    Dollar,     // $
    At,         // @
    Question,   // ?
    Colon,      // :

    And,          // &
    AndAlso,      // &&
    Or,           // |
    OrElse,       // ||
    Not,          // !
    NotEqual,     // !=
    Assign,       // =
    Equal,        // ==
    Less,         // <
    LessEqual,    // <=
    Greater,      // >
    GreaterEqual, // >=

    Keyword,
    QuotedString,
    String,
}

impl fmt::Display for LexemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme {
    pub kind: LexemeKind,
    pub start: SourceLocation,
    pub end: SourceLocation,
    pub content: String,
}

impl Lexeme {
    /// The lexeme's value: quoted strings lose their quotes and escapes,
    /// everything else is returned as written.
    pub fn value(&self) -> String {
        if self.kind != LexemeKind::QuotedString {
            return self.content.clone();
        }
        let inner = &self.content[1..self.content.len() - 1];
        let mut result = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                match chars.next() {
                    Some('n') => result.push('\n'),
                    Some('t') => result.push('\t'),
                    Some('r') => result.push('\r'),
                    Some('0') => result.push('\0'),
                    Some(other) => result.push(other),
                    None => result.push('\\'),
                }
            } else {
                result.push(c);
            }
        }
        result
    }
}

fn symbol_kind(c: char) -> Option<LexemeKind> {
    let kind = match c {
        '(' => LexemeKind::LeftParen,
        ')' => LexemeKind::RightParen,
        '{' => LexemeKind::LeftBrace,
        '}' => LexemeKind::RightBrace,
        '+' => LexemeKind::Plus,
        '-' => LexemeKind::Minus,
        '*' => LexemeKind::Star,
        '/' => LexemeKind::Slash,
        ';' => LexemeKind::Semicolon,
        '#' => LexemeKind::Hash,
        ',' => LexemeKind::Comma,
        '$' => LexemeKind::Dollar,
        '@' => LexemeKind::At,
        '?' => LexemeKind::Question,
        ':' => LexemeKind::Colon,
        _ => return None,
    };
    Some(kind)
}

/// Operator characters with the second character that upgrades them.
fn operator_kinds(c: char) -> Option<(LexemeKind, char, LexemeKind)> {
    let op = match c {
        '&' => (LexemeKind::And, '&', LexemeKind::AndAlso),
        '|' => (LexemeKind::Or, '|', LexemeKind::OrElse),
        '!' => (LexemeKind::Not, '=', LexemeKind::NotEqual),
        '=' => (LexemeKind::Assign, '=', LexemeKind::Equal),
        '<' => (LexemeKind::Less, '=', LexemeKind::LessEqual),
        '>' => (LexemeKind::Greater, '=', LexemeKind::GreaterEqual),
        _ => return None,
    };
    Some(op)
}

fn is_space(c: char) -> bool {
    c != '\n' && c != SENTINEL && c.is_whitespace()
}

fn is_boundary(c: char) -> bool {
    c == '\n' || is_space(c) || symbol_kind(c).is_some() || operator_kinds(c).is_some()
}

/// Single-use lexer over one source text.
///
/// Yields `Ok(Lexeme)` items ending with `EndOfFile`. An error diagnostic
/// is yielded once as `Err(LscError::Lex)` and ends the stream.
pub struct Lexer {
    source: Vec<char>,
    newlines: Vec<usize>,
    pos: usize,
    diagnostics: Vec<Diagnostic>,
    finished: bool,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        let mut normalized = source.replace("\r\n", "\n");
        if !normalized.ends_with(SENTINEL) {
            normalized.push(SENTINEL);
        }
        let source: Vec<char> = normalized.chars().collect();
        let newlines = source
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == '\n')
            .map(|(i, _)| i)
            .collect();
        Self {
            source,
            newlines,
            pos: 0,
            diagnostics: Vec::new(),
            finished: false,
        }
    }

    /// Warnings and errors recorded so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Line and column of a character offset; columns restart on each line.
    pub fn location(&self, offset: usize) -> SourceLocation {
        let line = self.newlines.partition_point(|&nl| nl < offset);
        let line_start = if line == 0 { 0 } else { self.newlines[line - 1] + 1 };
        SourceLocation {
            line,
            column: offset - line_start,
        }
    }

    fn last_index(&self) -> usize {
        self.source.len() - 1
    }

    fn at_end(&self, index: usize) -> bool {
        index >= self.last_index()
    }

    fn char_at(&self, index: usize) -> char {
        self.source.get(index).copied().unwrap_or(SENTINEL)
    }

    fn emit(&mut self, kind: LexemeKind, end: usize) -> Lexeme {
        let start = self.pos;
        let lexeme = Lexeme {
            kind,
            start: self.location(start),
            end: self.location(end),
            content: self.source[start..end].iter().collect(),
        };
        self.pos = end;
        lexeme
    }

    fn warning(&mut self, offset: usize, message: impl Into<String>) {
        let diag = Diagnostic {
            severity: Severity::Warning,
            message: message.into(),
            location: self.location(offset),
        };
        warn!(location = %diag.location, "{}", diag.message);
        self.diagnostics.push(diag);
    }

    fn error(&mut self, offset: usize, message: impl Into<String>) -> LscError {
        let diag = Diagnostic {
            severity: Severity::Error,
            message: message.into(),
            location: self.location(offset),
        };
        self.diagnostics.push(diag.clone());
        self.finished = true;
        LscError::Lex(diag)
    }

    fn next_lexeme(&mut self) -> LscResult<Lexeme> {
        let c = self.char_at(self.pos);

        if c == SENTINEL && self.at_end(self.pos) {
            self.finished = true;
            return Ok(self.emit(LexemeKind::EndOfFile, self.pos + 1));
        }

        if c == '\n' {
            return Ok(self.emit(LexemeKind::NewLine, self.pos + 1));
        }

        if is_space(c) {
            let mut end = self.pos + 1;
            while is_space(self.char_at(end)) {
                end += 1;
            }
            return Ok(self.emit(LexemeKind::Whitespace, end));
        }

        if let Some(kind) = symbol_kind(c) {
            return Ok(self.emit(kind, self.pos + 1));
        }

        if let Some((single, pair, double)) = operator_kinds(c) {
            if self.char_at(self.pos + 1) == pair {
                return Ok(self.emit(double, self.pos + 2));
            }
            return Ok(self.emit(single, self.pos + 1));
        }

        if c == '"' || c == '\'' {
            return self.quoted(c);
        }

        self.word()
    }

    fn quoted(&mut self, quote: char) -> LscResult<Lexeme> {
        let mut i = self.pos + 1;
        loop {
            let c = self.char_at(i);
            if c == '\n' || self.at_end(i) {
                return Err(self.error(self.pos, "unterminated quoted string"));
            }
            if c == '\\' {
                let escaped = self.char_at(i + 1);
                if escaped == '\n' || self.at_end(i + 1) {
                    return Err(self.error(self.pos, "unterminated quoted string"));
                }
                if !matches!(escaped, '\\' | '"' | '\'' | 'n' | 't' | 'r' | '0' | '$') {
                    self.warning(i, format!("unrecognized escape sequence '\\{escaped}'"));
                }
                i += 2;
                continue;
            }
            if c == quote {
                return Ok(self.emit(LexemeKind::QuotedString, i + 1));
            }
            i += 1;
        }
    }

    fn word(&mut self) -> LscResult<Lexeme> {
        let mut end = self.pos;
        loop {
            let c = self.char_at(end);
            if self.at_end(end) || is_boundary(c) {
                break;
            }
            if c == SENTINEL {
                self.warning(end, "embedded NUL character");
            }
            end += 1;
        }
        let text: String = self.source[self.pos..end].iter().collect();
        let kind = if KEYWORDS.contains(&text.as_str()) {
            LexemeKind::Keyword
        } else {
            LexemeKind::String
        };
        Ok(self.emit(kind, end))
    }
}

impl Iterator for Lexer {
    type Item = LscResult<Lexeme>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        Some(self.next_lexeme())
    }
}

impl std::iter::FusedIterator for Lexer {}

/// Start lexing `source`.
pub fn lex(source: &str) -> Lexer {
    Lexer::new(source)
}

/// Lex the whole source, stopping at the first fatal diagnostic.
pub fn lex_all(source: &str) -> LscResult<Vec<Lexeme>> {
    lex(source).collect()
}

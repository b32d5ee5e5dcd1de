//! Tokens produced by the lexer

use serde::{Deserialize, Serialize};

/// Kinds of tokens recognised by the front end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    // Keywords
    If,
    Then,
    Else,
    And,
    Or,
    Not,
    Empty,

    // Reserved data selectors
    Register,
    AllColumns,
    AllRows,

    // Comparison
    Equals,
    NotEquals,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,

    // Assignment and arithmetic
    Assign,
    Plus,
    Minus,
    Multiply,
    Divide,
    Mod,

    // Structural symbols
    LParen,
    RParen,
    Comma,
    Dot,
    Colon,

    // Literals and references
    Number,
    String,
    Identifier,

    // Special
    Eof,
    Invalid,
}

impl TokenKind {
    /// Keyword lookup; `word` must already be lowercase
    pub fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "если" => TokenKind::If,
            "то" => TokenKind::Then,
            "иначе" => TokenKind::Else,
            "и" => TokenKind::And,
            "или" => TokenKind::Or,
            "не" => TokenKind::Not,
            "пусто" => TokenKind::Empty,
            "регистр" => TokenKind::Register,
            "всеграфы" => TokenKind::AllColumns,
            "всезаписи" => TokenKind::AllRows,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            TokenKind::Equals
                | TokenKind::NotEquals
                | TokenKind::Greater
                | TokenKind::GreaterOrEqual
                | TokenKind::Less
                | TokenKind::LessOrEqual
        )
    }
}

/// Immutable lexical record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// 1-based line number
    pub line: usize,
    /// Character index of the first character
    pub offset: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize, offset: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
            offset,
        }
    }

    /// Identifier carrying the cell reference prefix (`гр`, any case)
    pub fn is_cell_reference(&self) -> bool {
        self.kind == TokenKind::Identifier && has_cell_prefix(&self.text)
    }

    /// Human-friendly description used in diagnostics
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("'{}'", self.text),
        }
    }
}

/// Whether `text` starts with `гр`, ignoring case
pub fn has_cell_prefix(text: &str) -> bool {
    let mut chars = text.chars().flat_map(char::to_lowercase);
    chars.next() == Some('г') && chars.next() == Some('р')
}

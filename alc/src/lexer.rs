//! Lexical analysis: rule text -> flat token sequence
//!
//! The lexer never fails. Characters it does not recognise become `Invalid`
//! tokens so the parser can report them with full context. Two-character
//! operators are matched before their one-character prefixes.

use crate::token::{Token, TokenKind};

/// Tokenize `source`; the result always ends with exactly one `Eof` token
pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source).run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Token> {
        while let Some(c) = self.current() {
            if c.is_whitespace() {
                if c == '\n' {
                    self.line += 1;
                }
                self.pos += 1;
                continue;
            }

            if self.at_cell_prefix() {
                self.read_cell_reference();
            } else if c.is_ascii_digit() {
                self.read_number();
            } else if c.is_alphabetic() {
                self.read_word();
            } else if c == '"' || c == '\'' {
                self.read_string(c);
            } else {
                self.read_symbol(c);
            }
        }

        let eof = Token::new(TokenKind::Eof, "", self.line, self.pos);
        self.tokens.push(eof);
        self.tokens
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        let text: String = self.chars[start..self.pos].iter().collect();
        self.tokens.push(Token::new(kind, text, self.line, start));
    }

    fn advance_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.current().is_some_and(&pred) {
            self.pos += 1;
        }
    }

    fn at_cell_prefix(&self) -> bool {
        let lower = |c: Option<char>| c.and_then(|c| c.to_lowercase().next());
        lower(self.current()) == Some('г') && lower(self.peek()) == Some('р')
    }

    /// `гр` followed by any number of digits, kept whole; decoded by the parser
    fn read_cell_reference(&mut self) {
        let start = self.pos;
        self.pos += 2;
        self.advance_while(|c| c.is_ascii_digit());
        self.push(TokenKind::Identifier, start);
    }

    /// Digits with at most one decimal point; a second point ends the number
    fn read_number(&mut self) {
        let start = self.pos;
        let mut seen_dot = false;
        while let Some(c) = self.current() {
            if c == '.' {
                if seen_dot {
                    break;
                }
                seen_dot = true;
            } else if !c.is_ascii_digit() {
                break;
            }
            self.pos += 1;
        }
        self.push(TokenKind::Number, start);
    }

    fn read_word(&mut self) {
        let start = self.pos;
        self.advance_while(|c| c.is_alphanumeric() || c == '_');
        let word: String = self.chars[start..self.pos].iter().collect();
        let kind = TokenKind::keyword(&word.to_lowercase()).unwrap_or(TokenKind::Identifier);
        self.tokens.push(Token::new(kind, word, self.line, start));
    }

    /// Quoted text without the quotes; an unterminated string runs to the end
    fn read_string(&mut self, quote: char) {
        let start = self.pos;
        let line = self.line;
        self.pos += 1;
        let content_start = self.pos;
        while let Some(c) = self.current() {
            if c == quote {
                break;
            }
            if c == '\n' {
                self.line += 1;
            }
            self.pos += 1;
        }
        let text: String = self.chars[content_start..self.pos].iter().collect();
        if self.current() == Some(quote) {
            self.pos += 1;
        }
        self.tokens.push(Token::new(TokenKind::String, text, line, start));
    }

    fn read_symbol(&mut self, c: char) {
        let start = self.pos;
        let next = self.peek();

        let (kind, len) = match (c, next) {
            ('=', Some('=')) => (TokenKind::Equals, 2),
            ('!', Some('=')) => (TokenKind::NotEquals, 2),
            ('>', Some('=')) => (TokenKind::GreaterOrEqual, 2),
            ('<', Some('=')) => (TokenKind::LessOrEqual, 2),
            ('=', _) => (TokenKind::Assign, 1),
            ('>', _) => (TokenKind::Greater, 1),
            ('<', _) => (TokenKind::Less, 1),
            ('+', _) => (TokenKind::Plus, 1),
            ('-', _) => (TokenKind::Minus, 1),
            ('*', _) => (TokenKind::Multiply, 1),
            ('/', _) => (TokenKind::Divide, 1),
            ('%', _) => (TokenKind::Mod, 1),
            ('(', _) => (TokenKind::LParen, 1),
            (')', _) => (TokenKind::RParen, 1),
            (',', _) => (TokenKind::Comma, 1),
            ('.', _) => (TokenKind::Dot, 1),
            (':', _) => (TokenKind::Colon, 1),
            _ => (TokenKind::Invalid, 1),
        };

        self.pos += len;
        self.push(kind, start);
    }
}

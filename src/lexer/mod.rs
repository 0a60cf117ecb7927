//! Hand-written lexer for MiniC.
//!
//! Not part of the analysis core (see spec §1) — the core consumes a typed
//! AST regardless of how it was produced. Kept deliberately small.

use crate::ast::Location;
use crate::error::InternalError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    // Keywords
    Int,
    Bool,
    True,
    False,
    If,
    Else,
    While,
    Return,
    Print,

    // Literals / identifiers
    Ident(String),
    /// Kept as raw digits so the parser can detect overflow before truncation.
    IntLit(String),

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    Semi,
    Comma,
    Assign,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    Ne,
    AndAnd,
    OrOr,

    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpannedToken {
    pub token: Token,
    pub loc: Location,
}

pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<SpannedToken>, InternalError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let loc = self.here();
            if self.at_end() {
                tokens.push(SpannedToken { token: Token::Eof, loc });
                break;
            }
            let token = self.next_token(loc)?;
            tokens.push(SpannedToken { token, loc });
        }
        Ok(tokens)
    }

    fn here(&self) -> Location {
        Location::new(self.line, self.column)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek(&self) -> u8 {
        *self.bytes.get(self.pos).unwrap_or(&0)
    }

    fn peek_at(&self, offset: usize) -> u8 {
        *self.bytes.get(self.pos + offset).unwrap_or(&0)
    }

    fn advance(&mut self) -> u8 {
        let c = self.peek();
        self.pos += 1;
        if c == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        c
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                b' ' | b'\t' | b'\r' | b'\n' => {
                    self.advance();
                }
                b'/' if self.peek_at(1) == b'/' => {
                    while !self.at_end() && self.peek() != b'\n' {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn next_token(&mut self, loc: Location) -> Result<Token, InternalError> {
        let c = self.advance();
        let token = match c {
            b'(' => Token::LParen,
            b')' => Token::RParen,
            b'{' => Token::LBrace,
            b'}' => Token::RBrace,
            b';' => Token::Semi,
            b',' => Token::Comma,
            b'+' => Token::Plus,
            b'-' => Token::Minus,
            b'*' => Token::Star,
            b'/' => Token::Slash,
            b'%' => Token::Percent,
            b'=' => {
                if self.peek() == b'=' {
                    self.advance();
                    Token::EqEq
                } else {
                    Token::Assign
                }
            }
            b'!' => {
                if self.peek() == b'=' {
                    self.advance();
                    Token::Ne
                } else {
                    Token::Bang
                }
            }
            b'<' => {
                if self.peek() == b'=' {
                    self.advance();
                    Token::Le
                } else {
                    Token::Lt
                }
            }
            b'>' => {
                if self.peek() == b'=' {
                    self.advance();
                    Token::Ge
                } else {
                    Token::Gt
                }
            }
            b'&' if self.peek() == b'&' => {
                self.advance();
                Token::AndAnd
            }
            b'|' if self.peek() == b'|' => {
                self.advance();
                Token::OrOr
            }
            c if c.is_ascii_digit() => {
                let start = self.pos - 1;
                while self.peek().is_ascii_digit() {
                    self.advance();
                }
                Token::IntLit(self.source[start..self.pos].to_string())
            }
            c if c.is_ascii_alphabetic() || c == b'_' => {
                let start = self.pos - 1;
                while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
                    self.advance();
                }
                let word = &self.source[start..self.pos];
                match word {
                    "int" => Token::Int,
                    "bool" => Token::Bool,
                    "true" => Token::True,
                    "false" => Token::False,
                    "if" => Token::If,
                    "else" => Token::Else,
                    "while" => Token::While,
                    "return" => Token::Return,
                    "print" => Token::Print,
                    _ => Token::Ident(word.to_string()),
                }
            }
            other => {
                return Err(InternalError::Lex {
                    loc,
                    message: format!("unexpected character '{}'", other as char),
                });
            }
        };
        Ok(token)
    }
}

// SPDX-License-Identifier: MIT

//! Hand-written scanner for requirement/result expressions
//!
//! Lexical items:
//!
//! ```text
//!     Variable  ::= '$' name '$'              ($dashes$, $berries collected$)
//!     Function  ::= word '(' | Variable '('   (min(, clamp()
//!     Literal   ::= [-]? [0-9.] [^ delimiter]* (2, 0.5, -3, 1e-3)
//!     Constant  ::= word                      (true, pi)
//!     Operator  ::= longest registered match  (<=, //, &&)
//!     '(' ')' ','
//! ```
//!
//! A literal's leading `-` is only recognised where an operand is expected,
//! so the caller passes that state into [`Lexer::next_token`].

use super::diagnostics::{SyntaxError, SyntaxErrorKind};
use super::registry::Registry;

pub const SIGIL: char = '$';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Function,
    Constant,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Literal(f64),
    Symbol { name: String, kind: SymbolKind },
    Operator(String),
    LParen,
    RParen,
    Comma,
    End,
}

impl Token {
    /// Whether an operand is expected after this token
    pub fn expects_operand_after(&self) -> bool {
        match self {
            Token::Literal(_) | Token::RParen | Token::End => false,
            Token::Symbol { kind, .. } => *kind == SymbolKind::Function,
            Token::Operator(_) | Token::LParen | Token::Comma => true,
        }
    }
}

/// A token with the character index it starts at
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub index: usize,
    pub token: Token,
}

pub struct Lexer<'a> {
    chars: Vec<char>,
    pos: usize,
    registry: &'a Registry,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &str, registry: &'a Registry) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            registry,
        }
    }

    /// Scan the next token. `expect_operand` tells the scanner whether a
    /// value is expected here, which decides whether `-` starts a literal.
    pub fn next_token(&mut self, expect_operand: bool) -> Result<Spanned, SyntaxError> {
        self.skip_whitespace();

        let index = self.pos;
        let Some(c) = self.peek() else {
            return Ok(Spanned {
                index,
                token: Token::End,
            });
        };

        let token = match c {
            '(' => {
                self.pos += 1;
                Token::LParen
            }
            ')' => {
                self.pos += 1;
                Token::RParen
            }
            ',' => {
                self.pos += 1;
                Token::Comma
            }
            SIGIL => self.read_symbol(index)?,
            '-' if expect_operand && self.peek_at(index + 1).is_some_and(starts_number) => {
                self.read_word(index)?
            }
            c if self.is_operator_start(c) => self.read_operator(index)?,
            _ => self.read_word(index)?,
        };

        log::trace!("token {:?} at {}", token, index);
        Ok(Spanned { index, token })
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, index: usize) -> Option<char> {
        self.chars.get(index).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn is_operator_start(&self, c: char) -> bool {
        let mut buf = [0u8; 4];
        self.registry.has_operator_prefix(c.encode_utf8(&mut buf))
    }

    /// Whether the next non-whitespace character opens an argument list
    fn followed_by_call(&self) -> bool {
        self.chars[self.pos..]
            .iter()
            .find(|c| !c.is_whitespace())
            .is_some_and(|c| *c == '(')
    }

    /// A sigil right after a word or symbol is never valid
    fn reject_trailing_sigil(&self) -> Result<(), SyntaxError> {
        if self.peek() == Some(SIGIL) {
            return Err(SyntaxError::new(self.pos, SyntaxErrorKind::UnexpectedSigil));
        }
        Ok(())
    }

    /// `$name$`; the name runs to the next sigil and may not cross `(`, `)` or `,`
    fn read_symbol(&mut self, start: usize) -> Result<Token, SyntaxError> {
        let mut end = start + 1;
        loop {
            match self.peek_at(end) {
                Some(SIGIL) => break,
                Some('(' | ')' | ',') | None => {
                    return Err(SyntaxError::new(start, SyntaxErrorKind::UnterminatedSymbol));
                }
                Some(_) => end += 1,
            }
        }

        let name: String = self.chars[start + 1..end].iter().collect();
        let name = name.trim();
        if name.is_empty() {
            return Err(SyntaxError::new(start, SyntaxErrorKind::EmptySymbol));
        }

        self.pos = end + 1;
        self.reject_trailing_sigil()?;

        let kind = if self.followed_by_call() {
            SymbolKind::Function
        } else {
            SymbolKind::Variable
        };
        Ok(Token::Symbol {
            name: name.to_string(),
            kind,
        })
    }

    /// Bare run: a literal, a function name or a constant name
    fn read_word(&mut self, start: usize) -> Result<Token, SyntaxError> {
        let numeric = self.chars[start] == '-' || starts_number(self.chars[start]);
        let mut end = start + 1;

        while let Some(c) = self.peek_at(end) {
            let exponent_sign = numeric
                && matches!(c, '+' | '-')
                && matches!(self.chars[end - 1], 'e' | 'E');
            if !exponent_sign && is_delimiter(c, self) {
                break;
            }
            end += 1;
        }

        let word: String = self.chars[start..end].iter().collect();
        self.pos = end;
        self.reject_trailing_sigil()?;

        if numeric {
            match word.parse::<f64>() {
                Ok(value) if value.is_finite() => return Ok(Token::Literal(value)),
                _ => {}
            }
        }
        let kind = if self.followed_by_call() {
            SymbolKind::Function
        } else {
            SymbolKind::Constant
        };
        Ok(Token::Symbol { name: word, kind })
    }

    /// Greedily extend while some operator still starts with the candidate,
    /// then commit to the longest exact match seen.
    fn read_operator(&mut self, start: usize) -> Result<Token, SyntaxError> {
        let mut best = None;
        let mut candidate = String::new();

        for &c in &self.chars[start..] {
            candidate.push(c);
            if !self.registry.has_operator_prefix(&candidate) {
                break;
            }
            if self.registry.lookup_operator(&candidate).is_some() {
                best = Some(candidate.clone());
            }
        }

        let Some(symbol) = best else {
            return Err(SyntaxError::new(start, SyntaxErrorKind::UnknownOperator));
        };
        self.pos = start + symbol.chars().count();
        Ok(Token::Operator(symbol))
    }
}

fn starts_number(c: char) -> bool {
    c.is_ascii_digit() || c == '.'
}

fn is_delimiter(c: char, lexer: &Lexer<'_>) -> bool {
    c.is_whitespace() || matches!(c, SIGIL | '(' | ')' | ',') || lexer.is_operator_start(c)
}

/// Scan a whole source string, tracking operand position the same way the
/// resolver does. Mostly useful for tests and tooling.
pub fn tokenize(source: &str, registry: &Registry) -> Result<Vec<Spanned>, SyntaxError> {
    let mut lexer = Lexer::new(source, registry);
    let mut tokens = Vec::new();
    let mut expect_operand = true;

    loop {
        let spanned = lexer.next_token(expect_operand)?;
        expect_operand = spanned.token.expects_operand_after();
        let done = spanned.token == Token::End;
        tokens.push(spanned);
        if done {
            return Ok(tokens);
        }
    }
}

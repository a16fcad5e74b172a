// SPDX-License-Identifier: MIT

//! Compile-time problems reported by the expression compiler
//!
//! Syntax problems abort compilation at the first offending character.
//! Semantic problems (unknown names, wrong argument counts) are collected
//! so that a caller sees all of them in one pass.

use std::sync::Arc;
use thiserror::Error;

use super::registry::FunctionSignature;

/// What went wrong at a syntax error position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    /// `$` directly attached to a word or another symbol
    #[error("unexpected sigil '$'")]
    UnexpectedSigil,
    /// `$name` without a closing `$`
    #[error("unterminated symbol")]
    UnterminatedSymbol,
    /// `$$` or `$   $`
    #[error("empty symbol name")]
    EmptySymbol,
    /// Operator characters that match no registered operator
    #[error("unknown operator")]
    UnknownOperator,
    /// A value was expected but the expression ended or continued with an operator
    #[error("missing operand")]
    MissingOperand,
    /// A value appeared where an operator was expected
    #[error("unexpected operand")]
    UnexpectedOperand,
    /// Prefix operator in infix position, or infix operator in prefix position
    #[error("operator used in the wrong position")]
    MisplacedOperator,
    /// `(` never closed
    #[error("unmatched '('")]
    UnmatchedOpen,
    /// `)` with nothing to close
    #[error("unmatched ')'")]
    UnmatchedClose,
    /// `,` outside of a call argument list
    #[error("',' outside of a function call")]
    MisplacedComma,
    /// `()` that is not a call
    #[error("empty parentheses")]
    EmptyGroup,
    #[error("empty expression")]
    EmptyExpression,
}

/// A fatal syntax error with the character index it was detected at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{kind} at index {index}")]
pub struct SyntaxError {
    pub index: usize,
    pub kind: SyntaxErrorKind,
}

impl SyntaxError {
    pub fn new(index: usize, kind: SyntaxErrorKind) -> Self {
        Self { index, kind }
    }
}

/// A single compile problem
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Diagnostic {
    #[error("syntax error: {0}")]
    Syntax(SyntaxError),

    #[error("unknown constant '{name}' at index {index}")]
    UnknownConstant { name: String, index: usize },

    #[error("unknown function '{name}' at index {index}")]
    UnknownFunction { name: String, index: usize },

    #[error(
        "function '{name}' at index {index} expects {} argument(s), got {got}",
        .signature.arity_description()
    )]
    ArityMismatch {
        name: String,
        index: usize,
        got: usize,
        signature: Arc<FunctionSignature>,
    },
}

impl Diagnostic {
    pub fn is_syntax(&self) -> bool {
        matches!(self, Diagnostic::Syntax(_))
    }
}

/// The batch of problems that made a compilation fail
#[derive(Debug, Clone, PartialEq, Error)]
#[error("failed to compile `{input}`{}", render_problems(.problems))]
pub struct Diagnostics {
    input: String,
    problems: Vec<Diagnostic>,
}

impl Diagnostics {
    pub(crate) fn syntax(input: &str, error: SyntaxError) -> Self {
        Self {
            input: input.to_string(),
            problems: vec![Diagnostic::Syntax(error)],
        }
    }

    pub(crate) fn semantic(input: &str, problems: Vec<Diagnostic>) -> Self {
        Self {
            input: input.to_string(),
            problems,
        }
    }

    /// The expression text that failed to compile
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn problems(&self) -> &[Diagnostic] {
        &self.problems
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.problems.iter()
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    /// The syntax error that aborted compilation, if that is what happened
    pub fn syntax_error(&self) -> Option<&SyntaxError> {
        self.problems.iter().find_map(|p| match p {
            Diagnostic::Syntax(e) => Some(e),
            _ => None,
        })
    }
}

fn render_problems(problems: &[Diagnostic]) -> String {
    let mut out = String::new();
    for problem in problems {
        out.push_str("\n  - ");
        out.push_str(&problem.to_string());
    }
    out
}

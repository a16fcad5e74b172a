// SPDX-License-Identifier: MIT

//! Compiled form of an expression

use std::fmt;
use std::sync::Arc;

use super::evaluator::{self, EvalError};
use super::registry::FunctionSignature;
use crate::store::VariableStore;

/// One step of the stack machine, stored in postfix order
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Push a number
    Const(f64),
    /// Push the current value of a variable
    GetVar(String),
    /// Pop `count` values, call, push the result
    Call(Arc<FunctionSignature>, usize),
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Const(v) => write!(f, "const {v}"),
            Instruction::GetVar(name) => write!(f, "load ${name}$"),
            Instruction::Call(signature, count) => write!(f, "call {}/{count}", signature.name()),
        }
    }
}

/// A successfully compiled expression.
///
/// Immutable; evaluating it never changes it, so the same value can be
/// re-checked as often as needed.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    instructions: Vec<Instruction>,
}

impl Expression {
    pub(crate) fn new(source: impl Into<String>, instructions: Vec<Instruction>) -> Self {
        Self {
            source: source.into(),
            instructions,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Names of every variable the expression reads, in first-use order
    pub fn variables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for instruction in &self.instructions {
            if let Instruction::GetVar(name) = instruction {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    pub fn evaluate(&self, store: &VariableStore) -> Result<f64, EvalError> {
        evaluator::evaluate(self, store)
    }

    /// Evaluate and coerce: zero is false, anything else is true
    pub fn test(&self, store: &VariableStore) -> Result<bool, EvalError> {
        self.evaluate(store).map(evaluator::is_truthy)
    }

    /// One instruction per line
    pub fn disassemble(&self) -> String {
        self.instructions
            .iter()
            .enumerate()
            .map(|(i, instruction)| format!("{i:>4}  {instruction}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

//! Stack machine that runs compiled expressions

use thiserror::Error;

use super::instruction::{Expression, Instruction};
use super::registry::Args;
use crate::store::VariableStore;

/// Runtime failures of an otherwise valid expression
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("division by zero in '{operator}'")]
    DivisionByZero { operator: String },

    /// The store is not the one the expression was compiled against
    #[error("variable '{0}' is not declared in this store")]
    UndeclaredVariable(String),

    /// A native function rejected its arguments
    #[error("'{function}' failed: {message}")]
    Domain { function: String, message: String },
}

impl EvalError {
    pub fn division_by_zero(operator: impl Into<String>) -> Self {
        Self::DivisionByZero {
            operator: operator.into(),
        }
    }

    pub fn domain(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Domain {
            function: function.into(),
            message: message.into(),
        }
    }
}

/// Zero is false, everything else (negatives and NaN included) is true
pub fn is_truthy(value: f64) -> bool {
    value != 0.0
}

/// Run `expression` against `store` in a single linear pass.
///
/// Panics if the instruction sequence leaves the stack unbalanced; that can
/// only happen if the compiler emitted a broken sequence.
pub fn evaluate(expression: &Expression, store: &VariableStore) -> Result<f64, EvalError> {
    let mut stack: Vec<f64> = Vec::with_capacity(expression.len());

    for instruction in expression.instructions() {
        match instruction {
            Instruction::Const(v) => stack.push(*v),
            Instruction::GetVar(name) => {
                let value = store
                    .get(name)
                    .ok_or_else(|| EvalError::UndeclaredVariable(name.clone()))?;
                stack.push(value);
            }
            Instruction::Call(signature, count) => {
                let base = match stack.len().checked_sub(*count) {
                    Some(base) if *count >= signature.arity() => base,
                    _ => unreachable!(
                        "stack underflow in `{}`: call {}/{} with {} value(s) on the stack",
                        expression.source(),
                        signature.name(),
                        count,
                        stack.len()
                    ),
                };
                // Last pushed value is the last argument
                let (fixed, rest) = stack[base..].split_at(signature.arity());
                let output = signature.invoke(Args { fixed, rest })?;
                stack.truncate(base);
                stack.push(output.to_number());
            }
        }
    }

    match (stack.pop(), stack.is_empty()) {
        (Some(result), true) => Ok(result),
        _ => unreachable!(
            "`{}` left {} value(s) on the stack",
            expression.source(),
            stack.len() + 1
        ),
    }
}

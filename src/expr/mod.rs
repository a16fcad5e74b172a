// SPDX-License-Identifier: MIT

//! Numeric expression compiler and evaluator
//!
//! Expressions guard graph traversal and compute per-visit results:
//! - `$dashes$ >= 2`
//! - `min($stamina$, 3) > 0 && !$tired$`
//! - `$strawberries$ // 2`
//!
//! [`compile`] turns source text into an [`Expression`] (a postfix
//! instruction sequence); [`Expression::evaluate`] runs it against a
//! [`VariableStore`](crate::store::VariableStore).

mod builtins;
mod diagnostics;
mod evaluator;
mod instruction;
pub mod lexer;
mod registry;
mod resolver;

pub use builtins::rank;
pub use diagnostics::{Diagnostic, Diagnostics, SyntaxError, SyntaxErrorKind};
pub use evaluator::{evaluate, is_truthy, EvalError};
pub use instruction::{Expression, Instruction};
pub use registry::{
    Args, FunctionSignature, NativeFn, OperatorSignature, Output, Registry, RegistryError,
};
pub use resolver::compile;

// SPDX-License-Identifier: MIT

//! Numeric expression compiler and evaluator for route requirements.
//!
//! Source text such as `$dashes$ >= 2 && max($strawberries$, 3) > 4` is
//! compiled once against a [`Registry`] of functions, operators and
//! constants into a postfix [`Expression`], which is then evaluated against
//! a [`VariableStore`] as often as needed.

pub mod error;
pub mod expr;
pub mod route;
pub mod store;

pub use error::{EntryError, RouteError};
pub use expr::{compile, Diagnostics, EvalError, Expression, Registry};
pub use route::{Requirement, ResultAssignment, Session, SessionLoader};
pub use store::VariableStore;

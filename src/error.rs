// SPDX-License-Identifier: MIT

//! Typed error handling for route-expr
//!
//! Expression-level failures have their own types in [`crate::expr`]
//! (`Diagnostics` for compilation, `EvalError` for evaluation); this module
//! wraps them together with session file failures.

use thiserror::Error;

use crate::expr::{Diagnostics, EvalError};

/// Top-level error type for route-expr
#[derive(Debug, Error)]
pub enum RouteError {
    /// One or more session entries failed to compile
    #[error("{} session entries failed to compile", .0.len())]
    Entries(Vec<EntryError>),

    /// Runtime failure while evaluating
    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),

    /// Requirement not found in the session
    #[error("Requirement '{name}' not found")]
    RequirementNotFound { name: String },

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

/// Compile diagnostics for one named session entry
#[derive(Debug, Clone, Error)]
#[error("{entry}: {diagnostics}")]
pub struct EntryError {
    /// `requirements.<name>` or `results[<index>]`
    pub entry: String,
    pub diagnostics: Diagnostics,
}

impl RouteError {
    /// Create a requirement not found error
    pub fn requirement_not_found(name: impl Into<String>) -> Self {
        Self::RequirementNotFound { name: name.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{compile, Registry};
    use crate::store::VariableStore;

    #[test]
    fn test_entries_display() {
        let mut store = VariableStore::empty();
        let diags = compile("nope", &Registry::builtin(), &mut store).unwrap_err();
        let entry = EntryError {
            entry: "requirements.gap".to_string(),
            diagnostics: diags,
        };
        assert!(entry
            .to_string()
            .starts_with("requirements.gap: failed to compile `nope`"));

        let err = RouteError::Entries(vec![entry.clone(), entry]);
        assert_eq!(err.to_string(), "2 session entries failed to compile");
    }

    #[test]
    fn test_requirement_not_found() {
        assert_eq!(
            RouteError::requirement_not_found("gap").to_string(),
            "Requirement 'gap' not found"
        );
    }

    #[test]
    fn test_eval_error_conversion() {
        let err: RouteError = EvalError::division_by_zero("/").into();
        assert_eq!(
            err.to_string(),
            "Evaluation error: division by zero in '/'"
        );
    }
}

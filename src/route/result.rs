// SPDX-License-Identifier: MIT

//! Per-visit result assignments

use crate::expr::{compile, Diagnostics, EvalError, Expression, Registry};
use crate::store::VariableStore;

use super::types::ResultDef;

/// Writes the value of an expression into a variable when applied
#[derive(Debug, Clone, PartialEq)]
pub struct ResultAssignment {
    pub variable: String,
    pub expression: Expression,
}

impl ResultAssignment {
    pub fn compile(
        def: &ResultDef,
        registry: &Registry,
        store: &mut VariableStore,
    ) -> Result<Self, Diagnostics> {
        let expression = compile(&def.expression, registry, store)?;
        store.declare(&def.variable);
        Ok(Self {
            variable: def.variable.clone(),
            expression,
        })
    }

    /// Evaluate and merge the value through the variable's reducer.
    /// Returns the value now stored.
    pub fn apply(&self, store: &mut VariableStore) -> Result<f64, EvalError> {
        let value = self.expression.evaluate(store)?;
        let stored = store.update(&self.variable, value);
        log::debug!(
            "{} <- `{}` = {} (stored {})",
            self.variable,
            self.expression,
            value,
            stored
        );
        Ok(stored)
    }
}

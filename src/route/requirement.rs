// SPDX-License-Identifier: MIT

//! Traversal requirements built from compiled expressions

use crate::expr::{compile, Diagnostics, EvalError, Expression, Registry};
use crate::store::VariableStore;

use super::types::RequirementDef;

/// A compiled requirement
#[derive(Debug, Clone, PartialEq)]
pub enum Requirement {
    /// Met when the expression evaluates to non-zero
    Single(Expression),
    /// Met when every child is met (vacuously true when empty)
    All(Vec<Requirement>),
    /// Met when any child is met (false when empty)
    Any(Vec<Requirement>),
}

impl Requirement {
    /// Compile a definition, collecting the diagnostics of every nested
    /// expression rather than stopping at the first broken one
    pub fn compile(
        def: &RequirementDef,
        registry: &Registry,
        store: &mut VariableStore,
    ) -> Result<Self, Vec<Diagnostics>> {
        match def {
            RequirementDef::Single(source) => compile(source, registry, store)
                .map(Requirement::Single)
                .map_err(|d| vec![d]),
            RequirementDef::All { all } => {
                compile_children(all, registry, store).map(Requirement::All)
            }
            RequirementDef::Any { any } => {
                compile_children(any, registry, store).map(Requirement::Any)
            }
        }
    }

    /// Check the requirement against `store`.
    ///
    /// Groups evaluate every child, even once the outcome is decided; the
    /// first runtime error is returned after all children have run.
    pub fn is_met(&self, store: &VariableStore) -> Result<bool, EvalError> {
        match self {
            Requirement::Single(expr) => expr.test(store),
            Requirement::All(children) => {
                fold_children(children, store, true, |acc, met| acc && met)
            }
            Requirement::Any(children) => {
                fold_children(children, store, false, |acc, met| acc || met)
            }
        }
    }
}

fn compile_children(
    defs: &[RequirementDef],
    registry: &Registry,
    store: &mut VariableStore,
) -> Result<Vec<Requirement>, Vec<Diagnostics>> {
    let mut children = Vec::with_capacity(defs.len());
    let mut failures = Vec::new();

    for def in defs {
        match Requirement::compile(def, registry, store) {
            Ok(child) => children.push(child),
            Err(mut diags) => failures.append(&mut diags),
        }
    }

    if failures.is_empty() {
        Ok(children)
    } else {
        Err(failures)
    }
}

fn fold_children(
    children: &[Requirement],
    store: &VariableStore,
    init: bool,
    combine: impl Fn(bool, bool) -> bool,
) -> Result<bool, EvalError> {
    let mut met = init;
    let mut failure = None;

    for child in children {
        match child.is_met(store) {
            Ok(child_met) => met = combine(met, child_met),
            Err(e) => {
                failure.get_or_insert(e);
            }
        }
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(met),
    }
}

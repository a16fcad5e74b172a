// SPDX-License-Identifier: MIT

//! Compiled routing session
//!
//! A [`Session`] owns the registry, the variable store and every compiled
//! requirement and result of one route. Compilation happens once, up front;
//! checking and visiting only evaluate.

use log::{debug, error, info, warn};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{EntryError, RouteError};
use crate::expr::{compile, Diagnostics, EvalError, Expression, Registry};
use crate::store::VariableStore;

use super::loader::SessionLoader;
use super::requirement::Requirement;
use super::result::ResultAssignment;
use super::types::{RequirementDef, ResultDef, SessionDef};

pub struct Session {
    name: String,
    registry: Registry,
    store: VariableStore,
    requirements: BTreeMap<String, Requirement>,
    results: Vec<ResultAssignment>,
}

impl Session {
    pub fn new(registry: Registry, store: VariableStore) -> Self {
        Self {
            name: String::new(),
            registry,
            store,
            requirements: BTreeMap::new(),
            results: Vec::new(),
        }
    }

    /// Compile every entry of `def`.
    ///
    /// All entries are compiled even after one fails so the error lists
    /// every broken expression at once.
    pub fn from_def(def: &SessionDef, registry: Registry) -> Result<Self, RouteError> {
        let mut session = Self::new(registry, VariableStore::new(&def.variables));
        session.name = def.name.clone();

        let mut failures = Vec::new();

        for (name, req) in &def.requirements {
            if let Err(diags) = session.add_requirement(name, req) {
                failures.extend(diags.into_iter().map(|diagnostics| EntryError {
                    entry: format!("requirements.{name}"),
                    diagnostics,
                }));
            }
        }

        for (i, result) in def.results.iter().enumerate() {
            if let Err(diagnostics) = session.add_result(result) {
                failures.push(EntryError {
                    entry: format!("results[{i}]"),
                    diagnostics,
                });
            }
        }

        if !failures.is_empty() {
            for failure in &failures {
                error!("{failure}");
            }
            return Err(RouteError::Entries(failures));
        }

        info!(
            "Compiled session '{}': {} requirement(s), {} result(s), {} variable(s)",
            session.name,
            session.requirements.len(),
            session.results.len(),
            session.store.len()
        );
        Ok(session)
    }

    /// Load and compile a session file
    pub fn load<P: AsRef<Path>>(path: P, registry: Registry) -> Result<Self, RouteError> {
        let def = SessionLoader::new().load_session(path)?;
        Self::from_def(&def, registry)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Compile an ad-hoc expression against this session's registry and store
    pub fn compile(&mut self, source: &str) -> Result<Expression, Diagnostics> {
        compile(source, &self.registry, &mut self.store)
    }

    /// Compile and add (or replace) a named requirement
    pub fn add_requirement(
        &mut self,
        name: &str,
        def: &RequirementDef,
    ) -> Result<(), Vec<Diagnostics>> {
        let requirement = Requirement::compile(def, &self.registry, &mut self.store)?;
        debug!("requirement '{name}' compiled");
        self.requirements.insert(name.to_string(), requirement);
        Ok(())
    }

    /// Compile and append a result assignment
    pub fn add_result(&mut self, def: &ResultDef) -> Result<(), Diagnostics> {
        let result = ResultAssignment::compile(def, &self.registry, &mut self.store)?;
        self.results.push(result);
        Ok(())
    }

    pub fn requirement_names(&self) -> impl Iterator<Item = &str> {
        self.requirements.keys().map(String::as_str)
    }

    pub fn results(&self) -> &[ResultAssignment] {
        &self.results
    }

    /// Check a single named requirement
    pub fn check(&self, name: &str) -> Result<bool, RouteError> {
        let requirement = self
            .requirements
            .get(name)
            .ok_or_else(|| RouteError::requirement_not_found(name))?;
        Ok(self.evaluate(name, requirement)?)
    }

    /// Check every requirement, in name order
    pub fn check_all(&self) -> BTreeMap<&str, Result<bool, EvalError>> {
        self.requirements
            .iter()
            .map(|(name, req)| (name.as_str(), self.evaluate(name, req)))
            .collect()
    }

    fn evaluate(&self, name: &str, requirement: &Requirement) -> Result<bool, EvalError> {
        let outcome = requirement.is_met(&self.store);
        if let Err(e) = &outcome {
            warn!("requirement '{name}' in session '{}' failed: {e}", self.name);
        }
        outcome
    }

    /// Apply every result assignment in order.
    ///
    /// Stops at the first runtime error; assignments before it stay applied.
    pub fn visit(&mut self) -> Result<(), RouteError> {
        for result in &self.results {
            result.apply(&mut self.store)?;
        }
        debug!("visited '{}'", self.name);
        Ok(())
    }

    /// Requirement outcomes and current variable values as JSON
    pub fn report(&self) -> Value {
        let requirements: Map<String, Value> = self
            .check_all()
            .into_iter()
            .map(|(name, outcome)| {
                let value = match outcome {
                    Ok(met) => json!(met),
                    Err(e) => json!({ "error": e.to_string() }),
                };
                (name.to_string(), value)
            })
            .collect();

        json!({
            "name": self.name,
            "requirements": requirements,
            "variables": self.store.to_json(),
        })
    }

    pub fn store(&self) -> &VariableStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut VariableStore {
        &mut self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(yaml: &str) -> Result<Session, RouteError> {
        let def = SessionLoader::parse_yaml(yaml)?;
        Session::from_def(&def, Registry::builtin())
    }

    const ROUTE: &str = r#"
name: summit
variables:
  dashes:
    default: 1
  strawberries:
    reducer: sum
  best:
    default: 99
    reducer: min
requirements:
  gap: "$dashes$ >= 2"
  gate:
    any:
      - "$strawberries$ >= 2"
      - "$key$"
results:
  - variable: strawberries
    expression: "1"
  - variable: best
    expression: "$strawberries$ * 10"
"#;

    #[test]
    fn test_from_def() {
        let session = session(ROUTE).unwrap();
        assert_eq!(session.name(), "summit");
        assert_eq!(
            session.requirement_names().collect::<Vec<_>>(),
            vec!["gap", "gate"]
        );
        assert_eq!(session.results().len(), 2);
        // `key` is only mentioned in an expression
        assert_eq!(session.store().get("key"), Some(0.0));
        assert_eq!(session.store().get("dashes"), Some(1.0));
    }

    #[test]
    fn test_check() {
        let mut session = session(ROUTE).unwrap();
        assert!(!session.check("gap").unwrap());

        session.store_mut().set("dashes", 2.0);
        assert!(session.check("gap").unwrap());

        assert!(matches!(
            session.check("missing"),
            Err(RouteError::RequirementNotFound { .. })
        ));
    }

    #[test]
    fn test_visit_applies_reducers() {
        let mut session = session(ROUTE).unwrap();
        assert!(!session.check("gate").unwrap());

        session.visit().unwrap();
        assert_eq!(session.store().get("strawberries"), Some(1.0));
        assert_eq!(session.store().get("best"), Some(10.0));

        session.visit().unwrap();
        assert_eq!(session.store().get("strawberries"), Some(2.0));
        // min reducer keeps the earlier, smaller value
        assert_eq!(session.store().get("best"), Some(10.0));
        assert!(session.check("gate").unwrap());
    }

    #[test]
    fn test_visit_stops_at_runtime_error() {
        let yaml = r#"
results:
  - variable: a
    expression: "1"
  - variable: b
    expression: "1 / $zero$"
  - variable: c
    expression: "1"
"#;
        let mut session = session(yaml).unwrap();
        let err = session.visit().unwrap_err();

        assert!(matches!(err, RouteError::Eval(EvalError::DivisionByZero { .. })));
        assert_eq!(session.store().get("a"), Some(1.0));
        assert_eq!(session.store().get("c"), Some(0.0));
    }

    #[test]
    fn test_all_entry_failures_reported() {
        let yaml = r#"
requirements:
  broken: "1 +"
  fine: "1"
  nested:
    all:
      - "nope"
      - "pow(1)"
results:
  - variable: x
    expression: "unknown(1)"
"#;
        let Err(RouteError::Entries(failures)) = session(yaml) else {
            panic!("expected entry failures");
        };
        let entries: Vec<&str> = failures.iter().map(|f| f.entry.as_str()).collect();
        assert_eq!(
            entries,
            vec![
                "requirements.broken",
                "requirements.nested",
                "requirements.nested",
                "results[0]"
            ]
        );
    }

    #[test]
    fn test_runtime_failure_does_not_hide_other_requirements() {
        let yaml = r#"
requirements:
  broken: "sqrt($depth$)"
  open: "1"
"#;
        let mut session = session(yaml).unwrap();
        session.store_mut().set("depth", -4.0);

        let outcomes = session.check_all();
        assert!(matches!(outcomes["broken"], Err(EvalError::Domain { .. })));
        assert_eq!(outcomes["open"], Ok(true));
        assert!(matches!(
            session.check("broken"),
            Err(RouteError::Eval(EvalError::Domain { .. }))
        ));
        assert!(session.report()["requirements"]["broken"]["error"].is_string());
    }

    #[test]
    fn test_compile_shares_store() {
        let mut session = Session::new(Registry::builtin(), VariableStore::empty());
        let expr = session.compile("$lives$ + 1").unwrap();

        assert!(session.store().contains("lives"));
        session.store_mut().set("lives", 2.0);
        assert_eq!(expr.evaluate(session.store()), Ok(3.0));
    }

    #[test]
    fn test_report() {
        let session = session(ROUTE).unwrap();
        let report = session.report();

        assert_eq!(report["name"], "summit");
        assert_eq!(report["requirements"]["gap"], false);
        assert_eq!(report["variables"]["dashes"], 1.0);
    }
}

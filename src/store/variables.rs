// SPDX-License-Identifier: MIT

//! Runtime variable storage

use serde_json::{json, Map, Value};
use std::collections::HashMap;

use super::schema::{ReducerType, VariableSchema};

/// Name -> number mapping read and written by compiled expressions.
///
/// Compilation declares every variable it sees (value `0`), so an
/// expression compiled against a store can always be evaluated against it.
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    /// Current values
    values: HashMap<String, f64>,
    /// Reducers for each variable
    reducers: HashMap<String, ReducerType>,
}

impl VariableStore {
    /// Create a new VariableStore from a schema
    pub fn new(schema: &VariableSchema) -> Self {
        let mut values = HashMap::new();
        let mut reducers = HashMap::new();

        for (name, def) in &schema.fields {
            values.insert(name.clone(), def.default);
            reducers.insert(name.clone(), def.reducer);
        }

        Self { values, reducers }
    }

    /// Create an empty VariableStore
    pub fn empty() -> Self {
        Self::default()
    }

    /// Insert `name` with value `0` unless it already exists.
    /// Returns whether it was new.
    pub fn declare(&mut self, name: &str) -> bool {
        if self.values.contains_key(name) {
            return false;
        }
        self.values.insert(name.to_string(), 0.0);
        true
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Overwrite a value, ignoring the reducer
    pub fn set(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }

    /// Merge a value using the variable's reducer and return the stored result
    pub fn update(&mut self, name: &str, value: f64) -> f64 {
        let reducer = self.reducer(name);
        let merged = match self.values.get(name) {
            Some(current) => reducer.reduce(*current, value),
            None => value,
        };
        self.values.insert(name.to_string(), merged);
        merged
    }

    pub fn reducer(&self, name: &str) -> ReducerType {
        self.reducers.get(name).copied().unwrap_or_default()
    }

    /// Get all variable names
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Convert the store to a JSON object
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), json!(v)))
                .collect::<Map<String, Value>>(),
        )
    }
}

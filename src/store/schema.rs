// SPDX-License-Identifier: MIT

//! Variable schema definitions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Variables known before any expression is compiled
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct VariableSchema {
    /// Variable definitions
    #[serde(flatten)]
    pub fields: HashMap<String, VariableDef>,
}

/// Definition of a single variable
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct VariableDef {
    /// Starting value
    #[serde(default)]
    pub default: f64,
    /// Reducer for merging assigned values
    #[serde(default)]
    pub reducer: ReducerType,
}

/// Reducer types for merging values into the store
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReducerType {
    /// Replace the value (default)
    #[default]
    Overwrite,
    /// Keep maximum value
    Max,
    /// Keep minimum value
    Min,
    /// Add to the current value
    Sum,
}

impl ReducerType {
    pub fn reduce(self, current: f64, new: f64) -> f64 {
        match self {
            ReducerType::Overwrite => new,
            ReducerType::Max => current.max(new),
            ReducerType::Min => current.min(new),
            ReducerType::Sum => current + new,
        }
    }
}

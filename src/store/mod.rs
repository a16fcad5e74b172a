// SPDX-License-Identifier: MIT

//! Variable storage shared by every expression of a routing session
//!
//! This module provides:
//! - `VariableSchema` - declares variables up front with defaults and reducers
//! - `VariableStore` - the runtime name -> number mapping
//! - `ReducerType` - strategies for merging assigned values into the store

mod schema;
mod variables;

pub use schema::{ReducerType, VariableDef, VariableSchema};
pub use variables::VariableStore;

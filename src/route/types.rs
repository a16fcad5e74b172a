//! Session definition types
//!
//! This module defines the serde types a session file is read into. Every
//! expression is kept as source text; compiling happens in [`Session`](super::Session).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::store::VariableSchema;

/// A routing session definition
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct SessionDef {
    /// Name of the session
    #[serde(default)]
    pub name: String,
    /// Description of the session
    #[serde(default)]
    pub description: String,
    /// Variables declared up front
    #[serde(default)]
    pub variables: VariableSchema,
    /// Named traversal requirements
    #[serde(default)]
    pub requirements: BTreeMap<String, RequirementDef>,
    /// Assignments applied, in order, on every visit
    #[serde(default)]
    pub results: Vec<ResultDef>,
}

/// Requirement specification
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum RequirementDef {
    /// A single expression; met when it evaluates to non-zero
    Single(String),
    /// Met when every nested requirement is met
    All { all: Vec<RequirementDef> },
    /// Met when at least one nested requirement is met
    Any { any: Vec<RequirementDef> },
}

/// A result assignment: `variable <- expression`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ResultDef {
    /// Variable written
    pub variable: String,
    /// Expression whose value is written
    pub expression: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirement_deserialize_single() {
        let def: RequirementDef = serde_yaml::from_str(r#""$dashes$ >= 2""#).unwrap();
        assert_eq!(def, RequirementDef::Single("$dashes$ >= 2".to_string()));
    }

    #[test]
    fn test_requirement_deserialize_nested() {
        let yaml = r#"
            all:
              - "$dashes$ >= 1"
              - any:
                  - "$key$"
                  - "$strawberries$ > 3"
        "#;
        let def: RequirementDef = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            def,
            RequirementDef::All {
                all: vec![
                    RequirementDef::Single("$dashes$ >= 1".to_string()),
                    RequirementDef::Any {
                        any: vec![
                            RequirementDef::Single("$key$".to_string()),
                            RequirementDef::Single("$strawberries$ > 3".to_string()),
                        ]
                    },
                ]
            }
        );
    }

    #[test]
    fn test_session_deserialize() {
        let yaml = r#"
            name: chapter-1
            variables:
              dashes: { default: 1 }
              strawberries: { reducer: sum }
            requirements:
              gap: "$dashes$ >= 1"
            results:
              - variable: strawberries
                expression: "1"
        "#;
        let def: SessionDef = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(def.name, "chapter-1");
        assert!(def.description.is_empty());
        assert_eq!(def.variables.fields.len(), 2);
        assert_eq!(def.requirements.len(), 1);
        assert_eq!(
            def.results,
            vec![ResultDef {
                variable: "strawberries".to_string(),
                expression: "1".to_string()
            }]
        );
    }

    #[test]
    fn test_session_defaults() {
        let def: SessionDef = serde_yaml::from_str("name: empty").unwrap();
        assert!(def.variables.fields.is_empty());
        assert!(def.requirements.is_empty());
        assert!(def.results.is_empty());
    }
}

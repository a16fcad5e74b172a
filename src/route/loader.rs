//! Session loader - YAML file loading and parsing

use super::types::SessionDef;
use crate::error::RouteError;
use std::fs;
use std::path::Path;

/// Loads session definitions from YAML files
pub struct SessionLoader;

impl SessionLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a session definition from a YAML file
    pub fn load_session<P: AsRef<Path>>(&self, path: P) -> Result<SessionDef, RouteError> {
        let path = path.as_ref();
        log::debug!("loading session from {}", path.display());
        let content = fs::read_to_string(path)?;
        Self::parse_yaml(&content)
    }

    /// Parse a session definition from a YAML string
    pub fn parse_yaml(content: &str) -> Result<SessionDef, RouteError> {
        let def: SessionDef = serde_yaml::from_str(content)?;
        Ok(def)
    }
}

impl Default for SessionLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::types::RequirementDef;
    use crate::store::ReducerType;

    #[test]
    fn test_parse_session() {
        let yaml = r#"
name: forsaken-city
description: "Strawberry route through chapter 2"

variables:
  dashes:
    default: 1
  strawberries:
    reducer: sum

requirements:
  spikes: "$dashes$ >= 1"
  gate:
    any:
      - "$strawberries$ >= 5"
      - "$key$"

results:
  - variable: strawberries
    expression: "1"
"#;
        let def = SessionLoader::parse_yaml(yaml).unwrap();
        assert_eq!(def.name, "forsaken-city");
        assert_eq!(def.description, "Strawberry route through chapter 2");
        assert_eq!(def.variables.fields["dashes"].default, 1.0);
        assert_eq!(
            def.variables.fields["strawberries"].reducer,
            ReducerType::Sum
        );
        assert_eq!(
            def.requirements["spikes"],
            RequirementDef::Single("$dashes$ >= 1".to_string())
        );
        assert!(matches!(def.requirements["gate"], RequirementDef::Any { .. }));
        assert_eq!(def.results.len(), 1);
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let result = SessionLoader::parse_yaml("requirements: [unclosed");
        assert!(matches!(result, Err(RouteError::Yaml(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = SessionLoader::new().load_session("does/not/exist.yaml");
        assert!(matches!(result, Err(RouteError::Io(_))));
    }
}

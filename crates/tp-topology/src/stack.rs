// stack.rs — Stack instances and the blueprints they are built from.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A deployable instance of a blueprint.
///
/// `parameter_overrides` values may be `null`, which means "no override" and
/// lets lower-precedence sources supply the value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StackInstance {
    pub id: String,
    pub blueprint_id: String,
    #[serde(default)]
    pub label: String,
    /// Containing compartment, used for defaults and tag lookup.
    #[serde(default)]
    pub compartment_id: Option<String>,
    #[serde(default)]
    pub parameter_overrides: BTreeMap<String, Option<String>>,
    /// Ids of stacks that must be deployed before this one.
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl StackInstance {
    pub fn new(id: impl Into<String>, blueprint_id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            blueprint_id: blueprint_id.into(),
            compartment_id: None,
            parameter_overrides: BTreeMap::new(),
            depends_on: Vec::new(),
            tags: BTreeMap::new(),
        }
    }

    /// The non-null override for `name`, if any.
    pub fn override_for(&self, name: &str) -> Option<&str> {
        self.parameter_overrides
            .get(name)
            .and_then(|v| v.as_deref())
    }
}

/// A parameter declared by a blueprint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlueprintParameter {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub is_required: bool,
    /// Tag key that may satisfy this parameter.
    #[serde(default)]
    pub tag_key: Option<String>,
}

impl BlueprintParameter {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            default: None,
            is_required: false,
            tag_key: None,
        }
    }
}

/// A reusable stack template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Blueprint {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<BlueprintParameter>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_override_is_treated_as_absent() {
        let yaml = r#"
id: web
blueprint_id: web-app
parameter_overrides:
  region: eu-west-1
  size: null
"#;
        let stack: StackInstance = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(stack.override_for("region"), Some("eu-west-1"));
        assert_eq!(stack.override_for("size"), None);
        assert_eq!(stack.override_for("missing"), None);
        assert!(stack.depends_on.is_empty());
    }

    #[test]
    fn blueprint_parameter_defaults() {
        let yaml = "name: region\ntag_key: region\n";
        let p: BlueprintParameter = serde_yaml::from_str(yaml).unwrap();
        assert!(!p.is_required);
        assert_eq!(p.default, None);
        assert_eq!(p.tag_key.as_deref(), Some("region"));
    }
}

// policy.rs — Policy library definitions and statement types.
//
// A library policy is a reusable, named set of statements with typed
// variables. Compartments reference library policies by id; the variable
// defaults declared here are merged with per-attachment overrides when the
// policy is resolved.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// How serious a policy violation is. Ordered from least to most severe.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// Whether a statement grants or denies the listed actions.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    Allow,
    #[default]
    Deny,
}

/// A single access/compliance statement.
///
/// String fields may contain `${variable}` placeholders which are filled in
/// from the policy's variable map at resolution time.
///
/// ```yaml
/// sid: DenyPublicRead
/// effect: deny
/// actions: ["s3:PutBucketAcl"]
/// resources: ["arn:aws:s3:::${bucket_prefix}-*"]
/// conditions:
///   s3:x-amz-acl: public-read
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Statement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    #[serde(default)]
    pub effect: Effect,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub conditions: BTreeMap<String, String>,
}

/// The JSON type a policy variable accepts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VariableType {
    String,
    Number,
    Boolean,
    List,
}

impl VariableType {
    /// Infer a variable type from a default value. `null` has no type.
    pub fn of(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(_) => Some(VariableType::String),
            serde_json::Value::Number(_) => Some(VariableType::Number),
            serde_json::Value::Bool(_) => Some(VariableType::Boolean),
            serde_json::Value::Array(_) => Some(VariableType::List),
            serde_json::Value::Null | serde_json::Value::Object(_) => None,
        }
    }
}

impl std::fmt::Display for VariableType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VariableType::String => write!(f, "string"),
            VariableType::Number => write!(f, "number"),
            VariableType::Boolean => write!(f, "boolean"),
            VariableType::List => write!(f, "list"),
        }
    }
}

/// A declared policy variable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PolicyVariable {
    #[serde(default)]
    pub default: serde_json::Value,
    #[serde(default)]
    pub description: String,
    /// Explicit type. When absent, the type of `default` is used.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<VariableType>,
}

impl PolicyVariable {
    /// The type overrides must match, if one can be determined.
    pub fn expected_type(&self) -> Option<VariableType> {
        self.kind.or_else(|| VariableType::of(&self.default))
    }

    /// Check whether `value` is acceptable as an override for this variable.
    pub fn accepts(&self, value: &serde_json::Value) -> bool {
        match self.expected_type() {
            Some(expected) => VariableType::of(value) == Some(expected),
            None => !value.is_null(),
        }
    }
}

/// A reusable library policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicyDefinition {
    pub id: String,
    /// Human-facing name. Empty means "use the id".
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub statements: Vec<Statement>,
    #[serde(default)]
    pub variables: BTreeMap<String, PolicyVariable>,
}

impl PolicyDefinition {
    /// The name used for suppression matching and display.
    pub fn effective_name(&self) -> &str {
        if self.display_name.is_empty() {
            &self.id
        } else {
            &self.display_name
        }
    }

    /// Variable defaults as a flat map.
    pub fn default_variables(&self) -> BTreeMap<String, serde_json::Value> {
        self.variables
            .iter()
            .map(|(name, var)| (name.clone(), var.default.clone()))
            .collect()
    }
}

/// The on-disk policy library document.
///
/// ```yaml
/// policies:
///   - id: deny-public-s3
///     display_name: deny-public-s3
///     category: storage
///     severity: high
///     statements: [...]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PolicyLibrary {
    #[serde(default)]
    pub policies: Vec<PolicyDefinition>,
}

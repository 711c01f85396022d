// library.rs — Read-only policy library index and variable instantiation.
//
// The index is built once per resolution call from the loaded library and
// passed in by reference. There is no process-wide cache: two calls with
// the same library build two equal indexes.
//
// Instantiation merges an attachment's variable overrides over the
// library's declared defaults, then replaces `${name}` placeholders in every
// statement string. An override with the wrong type (or for a variable the
// policy never declared) is ignored and reported, never fatal.

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tp_topology::{PolicyDefinition, PolicyLibrary, Statement};

use crate::error::PolicyError;

/// Lookup table from policy id to definition.
#[derive(Debug, Clone, Default)]
pub struct PolicyIndex {
    policies: HashMap<String, PolicyDefinition>,
}

impl PolicyIndex {
    /// Build an index, rejecting duplicate ids.
    pub fn build(library: &PolicyLibrary) -> Result<Self, PolicyError> {
        let mut policies = HashMap::with_capacity(library.policies.len());
        for def in &library.policies {
            if policies.insert(def.id.clone(), def.clone()).is_some() {
                return Err(PolicyError::DuplicatePolicy { id: def.id.clone() });
            }
        }
        Ok(Self { policies })
    }

    pub fn get(&self, policy_id: &str) -> Option<&PolicyDefinition> {
        self.policies.get(policy_id)
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

/// An override that was dropped during variable merging.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IgnoredOverride {
    pub variable: String,
    pub reason: String,
}

/// Merge `overrides` over the definition's declared defaults.
///
/// Returns the effective variable map and any overrides that were ignored.
pub fn merge_variables(
    def: &PolicyDefinition,
    overrides: &BTreeMap<String, serde_json::Value>,
) -> (BTreeMap<String, serde_json::Value>, Vec<IgnoredOverride>) {
    let mut merged = def.default_variables();
    let mut ignored = Vec::new();

    for (name, value) in overrides {
        match def.variables.get(name) {
            None => ignored.push(IgnoredOverride {
                variable: name.clone(),
                reason: format!("policy '{}' declares no variable '{}'", def.id, name),
            }),
            Some(var) if !var.accepts(value) => ignored.push(IgnoredOverride {
                variable: name.clone(),
                reason: match var.expected_type() {
                    Some(expected) => format!("expected {}, got {}", expected, json_kind(value)),
                    None => "null is not a valid override".to_string(),
                },
            }),
            Some(_) => {
                merged.insert(name.clone(), value.clone());
            }
        }
    }

    (merged, ignored)
}

/// Instantiate statements by substituting `${name}` placeholders.
///
/// Unknown placeholders are left as written.
pub fn instantiate(
    statements: &[Statement],
    variables: &BTreeMap<String, serde_json::Value>,
) -> Vec<Statement> {
    if variables.is_empty() {
        return statements.to_vec();
    }
    statements
        .iter()
        .map(|stmt| Statement {
            sid: stmt.sid.clone(),
            effect: stmt.effect,
            actions: stmt.actions.iter().map(|s| substitute(s, variables)).collect(),
            resources: stmt
                .resources
                .iter()
                .map(|s| substitute(s, variables))
                .collect(),
            conditions: stmt
                .conditions
                .iter()
                .map(|(k, v)| (k.clone(), substitute(v, variables)))
                .collect(),
        })
        .collect()
}

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_.-]*)\}").expect("placeholder pattern is valid")
    })
}

fn substitute(text: &str, variables: &BTreeMap<String, serde_json::Value>) -> String {
    placeholder()
        .replace_all(text, |caps: &Captures| match variables.get(&caps[1]) {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "list",
        serde_json::Value::Object(_) => "object",
    }
}

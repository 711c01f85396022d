// compartment.rs — Compartments and their policy attachments.
//
// A compartment is a node in the topology's hierarchy (an environment,
// region, or account boundary). It owns the policies attached directly to
// it, a suppression list that vetoes inherited policies by name, a map of
// parameter defaults, and a tag map.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::policy::{Severity, Statement};

/// A policy attached to a compartment: either a library reference or an
/// inline definition.
///
/// ```yaml
/// policies:
///   - kind: library
///     policy_id: deny-public-s3
///     variable_overrides: { prefix: prod }
///   - kind: inline
///     name: allow-billing-read
///     inherit: false
///     statements: [...]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyAttachment {
    Library(LibraryAttachment),
    Inline(InlineAttachment),
}

/// Reference to a library policy by id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LibraryAttachment {
    pub policy_id: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variable_overrides: BTreeMap<String, serde_json::Value>,
    #[serde(default = "default_inherit")]
    pub inherit: bool,
}

/// A one-off policy defined directly on the compartment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InlineAttachment {
    pub name: String,
    #[serde(default)]
    pub statements: Vec<Statement>,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default = "default_inherit")]
    pub inherit: bool,
}

fn default_inherit() -> bool {
    true
}

impl PolicyAttachment {
    /// Whether this attachment propagates to descendant compartments.
    pub fn inherit(&self) -> bool {
        match self {
            PolicyAttachment::Library(lib) => lib.inherit,
            PolicyAttachment::Inline(inline) => inline.inherit,
        }
    }

    /// Short label for logs and traces (`library:<id>` / `inline:<name>`).
    pub fn label(&self) -> String {
        match self {
            PolicyAttachment::Library(lib) => format!("library:{}", lib.policy_id),
            PolicyAttachment::Inline(inline) => format!("inline:{}", inline.name),
        }
    }
}

/// A node in the compartment hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Compartment {
    pub id: String,
    #[serde(default)]
    pub label: String,
    /// `None` marks a root compartment.
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Directly attached policies, in attachment order.
    #[serde(default)]
    pub policies: Vec<PolicyAttachment>,
    /// Policy names this compartment refuses to inherit.
    #[serde(default)]
    pub suppressed: BTreeSet<String>,
    /// Parameter defaults offered to stacks placed in this compartment.
    #[serde(default)]
    pub defaults: BTreeMap<String, String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl Compartment {
    /// Create an empty compartment.
    pub fn new(id: impl Into<String>, parent_id: Option<&str>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            parent_id: parent_id.map(str::to_string),
            description: None,
            policies: Vec::new(),
            suppressed: BTreeSet::new(),
            defaults: BTreeMap::new(),
            tags: BTreeMap::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn is_suppressed(&self, policy_name: &str) -> bool {
        self.suppressed.contains(policy_name)
    }
}

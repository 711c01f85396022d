// resolver.rs — Compartment policy chain resolution.
//
// Computes the effective policies for a compartment by walking its
// ancestor chain from the compartment itself (distance 0) up to the root:
//
// 1. Build the chain [target, parent, ..., root] with distances.
// 2. For each compartment, visit attachments in attachment order.
// 3. Ancestor attachments with inherit = false are skipped, and they stop
//    the same policy from flowing past that compartment from further up.
// 4. Names in the *target's* suppression list are dropped. Ancestor
//    suppression lists play no part.
// 5. The first occurrence of each identity wins (smallest distance, then
//    attachment order); later occurrences are shadowed.
//
// Because the walk is already ordered by (distance, attachment order), the
// output order falls out of the walk with no sort.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tp_topology::{
    Compartment, CompartmentTree, InlineAttachment, LibraryAttachment, PolicyAttachment,
    Severity, Statement,
};

use crate::error::PolicyError;
use crate::library::{instantiate, merge_variables, IgnoredOverride, PolicyIndex};

/// Where a resolved policy came from.
///
/// There is no explicit library/inline split: an attachment on the target
/// itself is always `Explicit`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PolicySource {
    Explicit,
    InheritedLibrary,
    InheritedInline,
}

impl std::fmt::Display for PolicySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicySource::Explicit => write!(f, "explicit"),
            PolicySource::InheritedLibrary => write!(f, "inherited_library"),
            PolicySource::InheritedInline => write!(f, "inherited_inline"),
        }
    }
}

/// A policy in effect for a compartment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedPolicy {
    /// Library id, or `inline:<name>` for inline policies.
    pub policy_id: String,
    pub name: String,
    pub source: PolicySource,
    pub severity: Severity,
    pub statements: Vec<Statement>,
    /// Compartment holding the winning attachment.
    pub attached_at: String,
    /// Distance from the target to `attached_at`.
    pub distance: usize,
    /// Effective variables after overrides (library policies only).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, serde_json::Value>,
}

/// What happened to one attachment during the walk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TraceOutcome {
    /// Emitted as a resolved policy.
    Included,
    /// Emitted, but the library id is unknown so it has no statements.
    UnknownLibraryPolicy,
    /// Ancestor attachment marked non-inheritable.
    SkippedNotInheritable,
    /// A nearer non-inheritable attachment of the same policy stops it.
    Blocked { by: String },
    /// The name is in the target's suppression list.
    Suppressed,
    /// A nearer (or earlier) attachment of the same policy already won.
    Shadowed { by: String },
}

/// One visited attachment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TraceStep {
    pub compartment_id: String,
    pub distance: usize,
    /// `library:<id>` or `inline:<name>`.
    pub attachment: String,
    #[serde(flatten)]
    pub outcome: TraceOutcome,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignored_overrides: Vec<IgnoredOverride>,
}

/// Resolution result plus the decision trail that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolutionTrace {
    pub compartment_id: String,
    /// Compartment ids from the target up to its root.
    pub chain: Vec<String>,
    pub policies: Vec<ResolvedPolicy>,
    pub steps: Vec<TraceStep>,
}

/// Identity used for deduplication. Library and inline namespaces never
/// collide with each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Identity {
    Library(String),
    Inline(String),
}

/// Resolves compartment policies against a library index.
pub struct ChainResolver<'a> {
    index: &'a PolicyIndex,
}

impl<'a> ChainResolver<'a> {
    pub fn new(index: &'a PolicyIndex) -> Self {
        Self { index }
    }

    /// Resolve the compartment with id `compartment_id` in `tree`.
    pub fn resolve_by_id(
        &self,
        tree: &CompartmentTree,
        compartment_id: &str,
    ) -> Result<Vec<ResolvedPolicy>, PolicyError> {
        let target = tree
            .get(compartment_id)
            .ok_or_else(|| PolicyError::UnknownCompartment {
                compartment_id: compartment_id.to_string(),
            })?;
        Ok(self.resolve(target, tree))
    }

    /// Effective policies for `target`, ordered by (distance, attachment order).
    pub fn resolve(&self, target: &Compartment, tree: &CompartmentTree) -> Vec<ResolvedPolicy> {
        self.resolve_with_trace(target, tree).policies
    }

    /// Same as [`resolve`](Self::resolve), recording a step per attachment.
    pub fn resolve_with_trace(
        &self,
        target: &Compartment,
        tree: &CompartmentTree,
    ) -> ResolutionTrace {
        let chain = build_chain(target, tree);
        let mut policies = Vec::new();
        let mut steps = Vec::new();
        // identity → compartment whose attachment won / stopped inheritance
        let mut winners: HashMap<Identity, String> = HashMap::new();
        let mut blocked: HashMap<Identity, String> = HashMap::new();

        for &(distance, compartment) in &chain {
            for attachment in &compartment.policies {
                let identity = identity_of(attachment);
                let mut step = TraceStep {
                    compartment_id: compartment.id.clone(),
                    distance,
                    attachment: attachment.label(),
                    outcome: TraceOutcome::Included,
                    ignored_overrides: Vec::new(),
                };

                if let Some(by) = blocked.get(&identity) {
                    step.outcome = TraceOutcome::Blocked { by: by.clone() };
                    steps.push(step);
                    continue;
                }

                if distance > 0 && !attachment.inherit() {
                    tracing::debug!(
                        compartment = %compartment.id,
                        attachment = %step.attachment,
                        "skipping non-inheritable ancestor attachment"
                    );
                    if !winners.contains_key(&identity) {
                        blocked.insert(identity, compartment.id.clone());
                    }
                    step.outcome = TraceOutcome::SkippedNotInheritable;
                    steps.push(step);
                    continue;
                }

                let name = self.effective_name(attachment);
                if target.is_suppressed(&name) {
                    tracing::debug!(
                        compartment = %target.id,
                        policy = %name,
                        "policy suppressed by target compartment"
                    );
                    step.outcome = TraceOutcome::Suppressed;
                    steps.push(step);
                    continue;
                }

                if let Some(by) = winners.get(&identity) {
                    step.outcome = TraceOutcome::Shadowed { by: by.clone() };
                    steps.push(step);
                    continue;
                }

                let source = source_for(attachment, distance);
                let resolved = match attachment {
                    PolicyAttachment::Library(lib) => {
                        self.resolve_library(lib, name, source, compartment, distance, &mut step)
                    }
                    PolicyAttachment::Inline(inline) => {
                        resolve_inline(inline, source, compartment, distance)
                    }
                };

                winners.insert(identity, compartment.id.clone());
                policies.push(resolved);
                steps.push(step);
            }
        }

        tracing::debug!(
            compartment = %target.id,
            chain_len = chain.len(),
            resolved = policies.len(),
            "resolved compartment policies"
        );

        ResolutionTrace {
            compartment_id: target.id.clone(),
            chain: chain.iter().map(|(_, c)| c.id.clone()).collect(),
            policies,
            steps,
        }
    }

    /// Library display name (falling back to id), or the inline name.
    fn effective_name(&self, attachment: &PolicyAttachment) -> String {
        match attachment {
            PolicyAttachment::Library(lib) => self
                .index
                .get(&lib.policy_id)
                .map(|def| def.effective_name().to_string())
                .unwrap_or_else(|| lib.policy_id.clone()),
            PolicyAttachment::Inline(inline) => inline.name.clone(),
        }
    }

    fn resolve_library(
        &self,
        lib: &LibraryAttachment,
        name: String,
        source: PolicySource,
        compartment: &Compartment,
        distance: usize,
        step: &mut TraceStep,
    ) -> ResolvedPolicy {
        let Some(def) = self.index.get(&lib.policy_id) else {
            tracing::warn!(
                compartment = %compartment.id,
                policy_id = %lib.policy_id,
                "library policy not found; emitting empty policy"
            );
            step.outcome = TraceOutcome::UnknownLibraryPolicy;
            return ResolvedPolicy {
                policy_id: lib.policy_id.clone(),
                name,
                source,
                severity: Severity::default(),
                statements: Vec::new(),
                attached_at: compartment.id.clone(),
                distance,
                variables: BTreeMap::new(),
            };
        };

        let (variables, ignored) = merge_variables(def, &lib.variable_overrides);
        for dropped in &ignored {
            tracing::warn!(
                compartment = %compartment.id,
                policy_id = %def.id,
                variable = %dropped.variable,
                "ignoring variable override: {}",
                dropped.reason
            );
        }
        step.ignored_overrides = ignored;

        ResolvedPolicy {
            policy_id: def.id.clone(),
            name,
            source,
            severity: def.severity,
            statements: instantiate(&def.statements, &variables),
            attached_at: compartment.id.clone(),
            distance,
            variables,
        }
    }
}

/// Free-function form of [`ChainResolver::resolve`].
pub fn resolve_compartment_policies(
    target: &Compartment,
    tree: &CompartmentTree,
    index: &PolicyIndex,
) -> Vec<ResolvedPolicy> {
    ChainResolver::new(index).resolve(target, tree)
}

/// `[target, parent, ..., root]` with distances. The target itself need not
/// be a member of `tree`; its ancestors are looked up there.
fn build_chain<'t>(
    target: &'t Compartment,
    tree: &'t CompartmentTree,
) -> Vec<(usize, &'t Compartment)> {
    let mut chain = vec![(0, target)];
    if let Some(parent_id) = target.parent_id.as_deref() {
        chain.extend(
            tree.ancestor_chain(parent_id)
                .into_iter()
                .map(|(d, c)| (d + 1, c)),
        );
    }
    chain
}

fn identity_of(attachment: &PolicyAttachment) -> Identity {
    match attachment {
        PolicyAttachment::Library(lib) => Identity::Library(lib.policy_id.clone()),
        PolicyAttachment::Inline(inline) => Identity::Inline(inline.name.clone()),
    }
}

fn source_for(attachment: &PolicyAttachment, distance: usize) -> PolicySource {
    match (distance, attachment) {
        (0, _) => PolicySource::Explicit,
        (_, PolicyAttachment::Library(_)) => PolicySource::InheritedLibrary,
        (_, PolicyAttachment::Inline(_)) => PolicySource::InheritedInline,
    }
}

fn resolve_inline(
    inline: &InlineAttachment,
    source: PolicySource,
    compartment: &Compartment,
    distance: usize,
) -> ResolvedPolicy {
    ResolvedPolicy {
        policy_id: format!("inline:{}", inline.name),
        name: inline.name.clone(),
        source,
        severity: inline.severity,
        statements: inline.statements.clone(),
        attached_at: compartment.id.clone(),
        distance,
        variables: BTreeMap::new(),
    }
}

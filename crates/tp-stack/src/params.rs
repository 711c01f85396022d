// params.rs — Parameter resolution with five-tier precedence.
//
// For each blueprint parameter the tiers below are tried in order and the
// first one that yields a value wins:
//
//   explicit            stack.parameter_overrides[name] (non-null)
//   tag_ref             stack.tags[tag_key], then compartment.tags[tag_key]
//   compartment_default compartment.defaults[name]
//   blueprint_default   parameter.default
//   unresolved          nothing matched, value = None
//
// The order lives in one table (TIERS) so each tier can be tested alone.

use serde::{Deserialize, Serialize};
use tp_topology::{BlueprintParameter, Compartment, StackInstance};

/// Which tier supplied a parameter's value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ParameterSource {
    Explicit,
    TagRef,
    CompartmentDefault,
    BlueprintDefault,
    Unresolved,
}

impl std::fmt::Display for ParameterSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterSource::Explicit => write!(f, "explicit"),
            ParameterSource::TagRef => write!(f, "tag_ref"),
            ParameterSource::CompartmentDefault => write!(f, "compartment_default"),
            ParameterSource::BlueprintDefault => write!(f, "blueprint_default"),
            ParameterSource::Unresolved => write!(f, "unresolved"),
        }
    }
}

/// A parameter with its value and provenance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedParameter {
    pub name: String,
    pub display_name: String,
    pub value: Option<String>,
    pub source: ParameterSource,
    pub is_required: bool,
    pub tag_key: Option<String>,
    /// Where the value was found, e.g. `stack tag 'region'`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ResolvedParameter {
    /// Required and without a value.
    pub fn is_missing(&self) -> bool {
        self.is_required && self.source == ParameterSource::Unresolved
    }
}

/// Resolved parameters for one stack.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StackResolution {
    pub stack_id: String,
    pub stack_label: String,
    pub parameters: Vec<ResolvedParameter>,
    pub is_complete: bool,
    /// Required parameters left unresolved. Optional ones are not counted.
    pub unresolved_count: usize,
}

impl StackResolution {
    /// Names of required parameters without a value.
    pub fn missing(&self) -> impl Iterator<Item = &str> {
        self.parameters
            .iter()
            .filter(|p| p.is_missing())
            .map(|p| p.name.as_str())
    }
}

/// What a tier found: the value plus an optional provenance note.
struct Found {
    value: String,
    detail: Option<String>,
}

/// Inputs shared by every tier.
struct TierContext<'a> {
    stack: &'a StackInstance,
    compartment: Option<&'a Compartment>,
}

type Tier = fn(&TierContext<'_>, &BlueprintParameter) -> Option<Found>;

/// Precedence order, highest first.
const TIERS: &[(ParameterSource, Tier)] = &[
    (ParameterSource::Explicit, explicit),
    (ParameterSource::TagRef, tag_ref),
    (ParameterSource::CompartmentDefault, compartment_default),
    (ParameterSource::BlueprintDefault, blueprint_default),
];

fn explicit(ctx: &TierContext<'_>, param: &BlueprintParameter) -> Option<Found> {
    ctx.stack.override_for(&param.name).map(|value| Found {
        value: value.to_string(),
        detail: None,
    })
}

fn tag_ref(ctx: &TierContext<'_>, param: &BlueprintParameter) -> Option<Found> {
    let key = param.tag_key.as_deref()?;
    if let Some(value) = ctx.stack.tags.get(key) {
        return Some(Found {
            value: value.clone(),
            detail: Some(format!("stack tag '{}'", key)),
        });
    }
    let compartment = ctx.compartment?;
    compartment.tags.get(key).map(|value| Found {
        value: value.clone(),
        detail: Some(format!("compartment '{}' tag '{}'", compartment.id, key)),
    })
}

fn compartment_default(ctx: &TierContext<'_>, param: &BlueprintParameter) -> Option<Found> {
    let compartment = ctx.compartment?;
    compartment.defaults.get(&param.name).map(|value| Found {
        value: value.clone(),
        detail: Some(format!("compartment '{}'", compartment.id)),
    })
}

fn blueprint_default(_ctx: &TierContext<'_>, param: &BlueprintParameter) -> Option<Found> {
    param.default.as_ref().map(|value| Found {
        value: value.clone(),
        detail: None,
    })
}

/// Resolve one parameter against the tier table.
pub fn resolve_parameter(
    stack: &StackInstance,
    param: &BlueprintParameter,
    compartment: Option<&Compartment>,
) -> ResolvedParameter {
    let ctx = TierContext { stack, compartment };
    let (source, found) = TIERS
        .iter()
        .find_map(|(source, tier)| tier(&ctx, param).map(|found| (*source, Some(found))))
        .unwrap_or((ParameterSource::Unresolved, None));

    tracing::debug!(
        stack = %stack.id,
        parameter = %param.name,
        %source,
        "resolved parameter"
    );

    let (value, detail) = match found {
        Some(found) => (Some(found.value), found.detail),
        None => (None, None),
    };
    ResolvedParameter {
        name: param.name.clone(),
        display_name: if param.display_name.is_empty() {
            param.name.clone()
        } else {
            param.display_name.clone()
        },
        value,
        source,
        is_required: param.is_required,
        tag_key: param.tag_key.clone(),
        detail,
    }
}

/// Resolve every declared parameter for `stack`.
pub fn resolve_parameters(
    stack: &StackInstance,
    params: &[BlueprintParameter],
    compartment: Option<&Compartment>,
) -> StackResolution {
    let parameters: Vec<ResolvedParameter> = params
        .iter()
        .map(|p| resolve_parameter(stack, p, compartment))
        .collect();
    let unresolved_count = parameters.iter().filter(|p| p.is_missing()).count();

    StackResolution {
        stack_id: stack.id.clone(),
        stack_label: if stack.label.is_empty() {
            stack.id.clone()
        } else {
            stack.label.clone()
        },
        parameters,
        is_complete: unresolved_count == 0,
        unresolved_count,
    }
}

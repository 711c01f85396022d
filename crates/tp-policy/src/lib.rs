//! # tp-policy
//!
//! Compartment policy resolution for Topology Policy.
//!
//! Given a compartment, its tree, and a [`PolicyIndex`] built from the
//! policy library, the [`ChainResolver`] walks the ancestor chain and
//! returns the policies in effect, most specific first.
//!
//! ## Key invariants
//!
//! - **Suppression locality**: only the target's own suppression list
//!   applies, and it applies regardless of any ancestor's inherit flag.
//! - **Non-propagation**: an attachment with `inherit: false` affects only
//!   the compartment that holds it.
//! - **Specificity wins**: duplicates keep the nearest attachment.
//! - **Never hides**: unknown library ids and malformed variable overrides
//!   degrade to visible results instead of errors.

pub mod error;
pub mod library;
pub mod resolver;

pub use error::PolicyError;
pub use library::{instantiate, merge_variables, IgnoredOverride, PolicyIndex};
pub use resolver::{
    resolve_compartment_policies, ChainResolver, PolicySource, ResolutionTrace, ResolvedPolicy,
    TraceOutcome, TraceStep,
};

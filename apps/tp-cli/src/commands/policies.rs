// policies.rs — Show effective policies for a compartment.

use tp_engine::{Engine, ResolutionTrace, TraceOutcome};

use super::print_json_if_requested;

pub fn execute(
    engine: &Engine,
    topology_id: &str,
    compartment_id: &str,
    trace: bool,
) -> anyhow::Result<()> {
    let resolution = engine.trace_compartment_policies(topology_id, compartment_id)?;

    let printed = if trace {
        print_json_if_requested(engine, &resolution)?
    } else {
        print_json_if_requested(engine, &resolution.policies)?
    };
    if printed {
        return Ok(());
    }

    println!(
        "Compartment '{}' (chain: {})",
        resolution.compartment_id,
        resolution.chain.join(" -> ")
    );
    println!();

    if resolution.policies.is_empty() {
        println!("No policies in effect.");
    } else {
        println!(
            "{:<28} {:<18} {:<10} {:<16} STATEMENTS",
            "POLICY", "SOURCE", "SEVERITY", "ATTACHED AT"
        );
        println!("{}", "-".repeat(86));
        for policy in &resolution.policies {
            println!(
                "{:<28} {:<18} {:<10} {:<16} {}",
                policy.name,
                policy.source.to_string(),
                policy.severity.to_string(),
                policy.attached_at,
                policy.statements.len()
            );
        }
    }

    if trace {
        println!();
        print_trace(&resolution);
    }

    Ok(())
}

fn print_trace(resolution: &ResolutionTrace) {
    println!("{:<6} {:<16} {:<32} OUTCOME", "DIST", "COMPARTMENT", "ATTACHMENT");
    println!("{}", "-".repeat(86));
    for step in &resolution.steps {
        let outcome = match &step.outcome {
            TraceOutcome::Included => "included".to_string(),
            TraceOutcome::UnknownLibraryPolicy => "included (unknown library policy)".to_string(),
            TraceOutcome::SkippedNotInheritable => "skipped: not inheritable".to_string(),
            TraceOutcome::Blocked { by } => format!("blocked by non-inheritable at '{}'", by),
            TraceOutcome::Suppressed => "suppressed by target".to_string(),
            TraceOutcome::Shadowed { by } => format!("shadowed by '{}'", by),
        };
        println!(
            "{:<6} {:<16} {:<32} {}",
            step.distance, step.compartment_id, step.attachment, outcome
        );
        for ignored in &step.ignored_overrides {
            println!(
                "{:<6} {:<16} {:<32}   override '{}' ignored: {}",
                "", "", "", ignored.variable, ignored.reason
            );
        }
    }
}

// preview.rs — Deployment preview: waves plus parameter completeness.
//
// Exits non-zero when the preview is blocked, so it can gate a deploy.

use tp_engine::{Engine, ResolutionPreview};

use super::print_json_if_requested;

pub fn execute(engine: &Engine, topology_id: &str) -> anyhow::Result<()> {
    let preview = engine.preview_resolution(topology_id)?;

    if !print_json_if_requested(engine, &preview)? {
        print_preview(&preview);
    }

    if !preview.all_complete {
        for reason in preview.blocking_reasons() {
            eprintln!("blocked: {}", reason);
        }
        anyhow::bail!(
            "deployment blocked: {} required parameter(s) unresolved",
            preview.total_unresolved
        );
    }
    Ok(())
}

fn print_preview(preview: &ResolutionPreview) {
    println!("Deployment order:");
    if preview.deployment_order.is_empty() {
        println!("  (no stacks)");
    }
    for (i, wave) in preview.deployment_order.waves.iter().enumerate() {
        println!("  wave {}: {}", i + 1, wave.join(", "));
    }

    for stack in &preview.stacks {
        println!();
        let status = if stack.is_complete {
            "complete".to_string()
        } else {
            format!("{} unresolved", stack.unresolved_count)
        };
        println!("Stack {} ({}): {}", stack.stack_label, stack.stack_id, status);
        if stack.parameters.is_empty() {
            println!("  (no parameters)");
            continue;
        }
        println!(
            "  {:<20} {:<24} {:<20} {:<9} FROM",
            "PARAMETER", "VALUE", "SOURCE", "REQUIRED"
        );
        for param in &stack.parameters {
            println!(
                "  {:<20} {:<24} {:<20} {:<9} {}",
                param.display_name,
                param.value.as_deref().unwrap_or("-"),
                param.source.to_string(),
                if param.is_required { "yes" } else { "no" },
                param.detail.as_deref().unwrap_or("")
            );
        }
    }

    println!();
    if preview.all_complete {
        println!("All stacks complete.");
    } else {
        println!(
            "{} required parameter(s) unresolved.",
            preview.total_unresolved
        );
    }
}

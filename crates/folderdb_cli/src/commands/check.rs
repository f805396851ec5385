//! Check command implementation.

use super::{print_json, CommandResult, Context};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Serialize)]
struct CheckResult {
    parent_id: String,
    consistent: bool,
    in_both: BTreeSet<String>,
    flat_only: BTreeSet<String>,
    nested_only: BTreeSet<String>,
}

/// Runs the check command.
///
/// Divergence is reported, never repaired, and does not fail the command.
pub fn run(ctx: &Context, parent: &str) -> CommandResult {
    let folders = ctx.folders()?;
    let parent_path = folders.root_path(parent)?;
    let report = folders.compare_representations(&parent_path)?;

    if ctx.json() {
        return print_json(&CheckResult {
            parent_id: report.parent_id.clone(),
            consistent: report.is_consistent(),
            in_both: report.in_both,
            flat_only: report.flat_only,
            nested_only: report.nested_only,
        });
    }

    println!("{report}");
    for id in &report.flat_only {
        println!("  flat only:   {id}");
    }
    for id in &report.nested_only {
        println!("  nested only: {id}");
    }
    if report.is_consistent() {
        println!("✓ Representations agree");
    } else {
        println!("✗ Representations diverge");
    }
    Ok(())
}

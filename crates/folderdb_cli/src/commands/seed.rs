//! Seed commands implementation.

use super::{print_json, CommandResult, Context};
use folderdb_core::{sports_example, SeedPlan, SeedReport};
use serde::Serialize;

/// Seeding result.
#[derive(Debug, Serialize)]
pub struct SeedSummary {
    /// Folders written.
    pub written: usize,
    /// Transactions committed.
    pub batches: usize,
    /// Wall-clock time in milliseconds.
    pub elapsed_ms: f64,
    /// Paths written.
    pub paths: Vec<String>,
}

impl From<&SeedReport> for SeedSummary {
    fn from(report: &SeedReport) -> Self {
        Self {
            written: report.paths.len(),
            batches: report.batches,
            elapsed_ms: report.elapsed.as_secs_f64() * 1000.0,
            paths: report.paths.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Runs the seed command.
///
/// Flat seeding writes root folders with `ParentID == parent`. Nested
/// seeding writes into `folders/<parent>/folders`, or creates root
/// folders when `parent` is empty.
pub fn run(
    ctx: &Context,
    parent: &str,
    count: usize,
    nested: bool,
    batch_size: Option<usize>,
) -> CommandResult {
    ctx.warn_if_ephemeral("seed");
    let folders = ctx.folders()?;

    let mut plan = if nested {
        let parent_path = if parent.is_empty() {
            None
        } else {
            Some(folders.root_path(parent)?)
        };
        SeedPlan::nested(parent_path, count)
    } else {
        SeedPlan::flat(parent, count)
    };
    if let Some(size) = batch_size {
        plan = plan.batch_size(size);
    }

    let report = folders.seed_random(&plan)?;
    let summary = SeedSummary::from(&report);

    if ctx.json() {
        return print_json(&summary);
    }
    let layout = if nested { "nested" } else { "flat" };
    println!(
        "Seeded {} {layout} folder(s) under {parent:?} in {} batch(es), {:.2} ms",
        summary.written, summary.batches, summary.elapsed_ms
    );
    Ok(())
}

/// Runs the seed-example command.
pub fn run_example(ctx: &Context) -> CommandResult {
    ctx.warn_if_ephemeral("seed-example");
    let folders = ctx.folders()?;
    let specs = sports_example(folders.config())?;
    let report = folders.seed_batch(&specs)?;

    if ctx.json() {
        let paths: Vec<String> = report.paths.iter().map(ToString::to_string).collect();
        return print_json(&paths);
    }
    for path in &report.paths {
        println!("{path}");
    }
    println!("Committed {} folder(s) at version {}", report.paths.len(), report.commit.version);
    Ok(())
}

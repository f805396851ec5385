//! Bench command implementation.

use super::{print_json, CommandResult, Context};
use folderdb_core::IterationSummary;
use serde::Serialize;

/// One timed run.
#[derive(Debug, Serialize)]
pub struct BenchRow {
    /// Run name.
    pub name: String,
    /// Items yielded.
    pub matched: usize,
    /// Root collection size.
    pub reference_total: usize,
    /// Share of the root collection, in percent.
    pub percentage: f64,
    /// Wall-clock time in milliseconds.
    pub elapsed_ms: f64,
    /// Average `next()` latency in microseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_per_item_us: Option<f64>,
}

impl From<&IterationSummary> for BenchRow {
    fn from(summary: &IterationSummary) -> Self {
        Self {
            name: summary.name.clone(),
            matched: summary.matched,
            reference_total: summary.reference_total,
            percentage: summary.percentage,
            elapsed_ms: summary.elapsed.as_secs_f64() * 1000.0,
            avg_per_item_us: summary.avg_per_item.map(|d| d.as_secs_f64() * 1e6),
        }
    }
}

/// Runs the bench command.
pub fn run(ctx: &Context, parent: &str) -> CommandResult {
    let folders = ctx.folders()?;
    let parent_path = folders.root_path(parent)?;
    let rows: Vec<BenchRow> = folders
        .measure(&parent_path)?
        .iter()
        .map(BenchRow::from)
        .collect();

    if ctx.json() {
        return print_json(&rows);
    }

    println!(
        "{:<40} {:>10} {:>10} {:>9} {:>12} {:>12}",
        "run", "matched", "total", "percent", "elapsed ms", "us/item"
    );
    for row in &rows {
        let per_item = row
            .avg_per_item_us
            .map_or_else(|| "-".to_string(), |us| format!("{us:.2}"));
        println!(
            "{:<40} {:>10} {:>10} {:>8.2}% {:>12.3} {:>12}",
            row.name, row.matched, row.reference_total, row.percentage, row.elapsed_ms, per_item
        );
    }
    Ok(())
}

//! Negative-path probes.

use super::{CommandError, CommandResult, Context};
use folderdb_core::{CoreError, SeedPlan};
use folderdb_store::{DocumentPath, DocumentStore};
use tracing::info;

/// Parent identifier used by the limit probe's folders.
const LIMIT_PROBE_PARENT: &str = "probe-limit";

/// Deletes `path` and expects `NotFound`.
pub fn run_delete(ctx: &Context, path: &str) -> CommandResult {
    let folders = ctx.folders()?;
    let path = DocumentPath::new(path).map_err(CoreError::from)?;

    match folders.delete(&path) {
        Err(err) if err.is_not_found() => {
            println!("✓ delete {path}: {} as expected ({err})", err.kind());
            Ok(())
        }
        Err(err) => Err(err.into()),
        Ok(()) => Err(CommandError::UnexpectedOutcome {
            probe: "delete",
            expected: "NotFound".to_string(),
            actual: format!("{path} existed and was deleted"),
        }
        .into()),
    }
}

/// Writes one batch of `writes` flat folders and checks the outcome
/// against the store's transaction limit.
///
/// Above the limit the batch must fail with `TransactionLimitExceeded`
/// and leave no folder behind; at or below it every folder must land.
pub fn run_limit(ctx: &Context, writes: usize) -> CommandResult {
    let folders = ctx.folders()?;
    let limit = ctx.store.max_writes_per_transaction();
    let before = count_probe_folders(ctx)?;

    let specs = SeedPlan::flat(LIMIT_PROBE_PARENT, writes).specs(folders.config())?;
    let outcome = folders.seed_batch(&specs);
    let landed = count_probe_folders(ctx)? - before;
    info!(writes, limit, landed, "limit probe finished");

    match outcome {
        Err(CoreError::TransactionLimitExceeded { attempted, limit }) if writes > limit => {
            if landed != 0 {
                return Err(CommandError::UnexpectedOutcome {
                    probe: "limit",
                    expected: "no folders written".to_string(),
                    actual: format!("{landed} folder(s) written"),
                }
                .into());
            }
            println!("✓ {attempted} writes rejected (limit {limit}), nothing written");
            Ok(())
        }
        Ok(report) if writes <= limit && landed == writes => {
            println!(
                "✓ {} writes committed at version {} (limit {limit})",
                report.commit.writes, report.commit.version
            );
            Ok(())
        }
        Ok(_) => Err(CommandError::UnexpectedOutcome {
            probe: "limit",
            expected: format!("TransactionLimitExceeded above {limit} writes"),
            actual: format!("{writes} writes committed, {landed} landed"),
        }
        .into()),
        Err(err) => Err(err.into()),
    }
}

fn count_probe_folders(ctx: &Context) -> Result<usize, CoreError> {
    let folders = ctx.folders()?;
    let name = format!("flat ParentID == {LIMIT_PROBE_PARENT:?}");
    Ok(folders.query_by_parent(LIMIT_PROBE_PARENT)?.collect_all(&name)?.len())
}

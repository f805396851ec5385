//! Query and children commands implementation.

use super::{print_json, CommandResult, Context, FolderRow};
use folderdb_core::{CoreError, FolderIter};
use folderdb_store::DocumentPath;

/// Runs the query command: flat folders with `ParentID == parent`.
pub fn run_flat(ctx: &Context, parent: &str) -> CommandResult {
    let folders = ctx.folders()?;
    let name = format!("flat ParentID == {parent:?}");
    print_folders(ctx, &name, folders.query_by_parent(parent)?)
}

/// Runs the children command: folders nested directly under `path`.
pub fn run_children(ctx: &Context, path: &str) -> CommandResult {
    let folders = ctx.folders()?;
    let parent = DocumentPath::new(path).map_err(CoreError::from)?;
    let name = format!("children of {parent}");
    print_folders(ctx, &name, folders.list_children(&parent)?)
}

fn print_folders(ctx: &Context, name: &str, iter: FolderIter<'_>) -> CommandResult {
    let rows: Vec<FolderRow> = iter
        .collect_all(name)?
        .into_iter()
        .map(FolderRow::from)
        .collect();

    if ctx.json() {
        return print_json(&rows);
    }
    for row in &rows {
        println!("{:<48} [ID={}, ParentID={}]", row.path, row.id, row.parent_id);
    }
    println!("{name}: {} folder(s)", rows.len());
    Ok(())
}

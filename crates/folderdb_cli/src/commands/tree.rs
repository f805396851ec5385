//! Tree command implementation.

use super::{print_json, CommandResult, Context, FolderRow};
use folderdb_core::CoreError;
use folderdb_store::DocumentPath;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct TreeRow {
    depth: usize,
    #[serde(flatten)]
    folder: FolderRow,
}

/// Runs the tree command.
pub fn run(ctx: &Context, path: &str, max_depth: Option<usize>) -> CommandResult {
    let folders = ctx.folders()?;
    let root = DocumentPath::new(path).map_err(CoreError::from)?;
    let found = folders.descendants(&root, max_depth)?;

    if ctx.json() {
        let rows: Vec<TreeRow> = found
            .into_iter()
            .map(|d| TreeRow {
                depth: d.depth,
                folder: d.stored.into(),
            })
            .collect();
        return print_json(&rows);
    }

    println!("{root}");
    for descendant in &found {
        println!(
            "{}{}",
            "  ".repeat(descendant.depth),
            descendant.stored.folder
        );
    }
    println!("{} descendant(s)", found.len());
    Ok(())
}

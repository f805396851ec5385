//! folderdb CLI
//!
//! Command-line driver for seeding and querying folder hierarchies.
//!
//! # Commands
//!
//! - `seed` - Seed random folders under a parent, flat or nested
//! - `seed-example` - Write the sports/hockey/baseball tree in one batch
//! - `query` - List flat folders by `ParentID`
//! - `children` - List the folders nested under a folder
//! - `tree` - Walk every folder below a folder
//! - `check` - Compare the flat and nested children of a parent
//! - `bench` - Time a full scan, a flat query and a subcollection listing
//! - `probe-delete` - Delete a missing folder and expect `NotFound`
//! - `probe-limit` - Write one oversized batch and expect it to be rejected

mod commands;

use clap::{Parser, Subcommand};
use commands::{Context, OutputFormat};
use folderdb_core::CoreError;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// folderdb folder hierarchy tools.
#[derive(Parser, Debug)]
#[command(name = "folderdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Project identifier
    #[arg(global = true, long, env = "FOLDERDB_PROJECT", default_value = "folderdb-dev")]
    project: String,

    /// Store endpoint: `memory`, or an emulator data directory.
    /// A `memory` store starts empty and is discarded when the command exits.
    #[arg(global = true, long, env = "FOLDERDB_EMULATOR_HOST", default_value = "memory")]
    emulator_host: String,

    /// Transaction attempts before a conflict is reported
    #[arg(global = true, long, default_value_t = folderdb_store::DEFAULT_MAX_ATTEMPTS)]
    max_attempts: u32,

    /// Output format
    #[arg(global = true, short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Seed random folders under a parent
    Seed {
        /// Parent folder identifier
        #[arg(short, long)]
        parent: String,

        /// Number of folders to create
        #[arg(short, long)]
        count: usize,

        /// Store folders in the parent's subcollection instead of the flat collection
        #[arg(short, long)]
        nested: bool,

        /// Folders per transaction (defaults to the store's write limit)
        #[arg(short, long)]
        batch_size: Option<usize>,
    },

    /// Write the sports/hockey/baseball tree in one batch
    SeedExample,

    /// List flat folders whose ParentID matches
    Query {
        /// Parent folder identifier
        #[arg(short, long)]
        parent: String,
    },

    /// List the folders nested directly under a folder
    Children {
        /// Document path of the parent folder
        path: String,
    },

    /// Walk every folder nested below a folder
    Tree {
        /// Document path of the starting folder
        path: String,

        /// Maximum depth to walk
        #[arg(short, long)]
        max_depth: Option<usize>,
    },

    /// Compare the flat and nested children of a parent
    Check {
        /// Parent folder identifier
        #[arg(short, long)]
        parent: String,
    },

    /// Time a full scan, a flat query and a subcollection listing
    Bench {
        /// Parent folder identifier
        #[arg(short, long)]
        parent: String,
    },

    /// Delete a folder that should not exist and expect NotFound
    ProbeDelete {
        /// Document path of the missing folder
        path: String,
    },

    /// Write one batch and check the transaction limit outcome
    ProbeLimit {
        /// Number of writes in the batch
        #[arg(short, long, default_value_t = folderdb_store::DEFAULT_MAX_WRITES + 1)]
        writes: usize,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(err.as_ref());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::connect(&cli.project, &cli.emulator_host, cli.max_attempts, cli.format)?;

    match cli.command {
        Commands::Seed {
            parent,
            count,
            nested,
            batch_size,
        } => commands::seed::run(&ctx, &parent, count, nested, batch_size)?,
        Commands::SeedExample => commands::seed::run_example(&ctx)?,
        Commands::Query { parent } => commands::query::run_flat(&ctx, &parent)?,
        Commands::Children { path } => commands::query::run_children(&ctx, &path)?,
        Commands::Tree { path, max_depth } => commands::tree::run(&ctx, &path, max_depth)?,
        Commands::Check { parent } => commands::check::run(&ctx, &parent)?,
        Commands::Bench { parent } => commands::bench::run(&ctx, &parent)?,
        Commands::ProbeDelete { path } => commands::probe::run_delete(&ctx, &path)?,
        Commands::ProbeLimit { writes } => commands::probe::run_limit(&ctx, writes)?,
    }

    Ok(())
}

fn report(err: &(dyn std::error::Error + 'static)) {
    eprint!("{}", render_error(err));
}

/// Formats `err` as `error[Kind]: message` followed by its cause chain.
fn render_error(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = match err.downcast_ref::<CoreError>() {
        Some(core) => format!("error[{}]: {core}\n", core.kind()),
        None => format!("error: {err}\n"),
    };
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(&format!("  caused by: {cause}\n"));
        source = cause.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_seed_flags() {
        let cli = Cli::try_parse_from([
            "folderdb", "seed", "--parent", "sports", "--count", "10", "--nested",
        ])
        .unwrap();
        match cli.command {
            Commands::Seed {
                parent,
                count,
                nested,
                batch_size,
            } => {
                assert_eq!(parent, "sports");
                assert_eq!(count, 10);
                assert!(nested);
                assert_eq!(batch_size, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "folderdb",
            "query",
            "--parent",
            "sports",
            "--format",
            "json",
            "--max-attempts",
            "1",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.max_attempts, 1);
    }

    #[test]
    fn probe_limit_defaults_past_the_cap() {
        let cli = Cli::try_parse_from(["folderdb", "probe-limit"]).unwrap();
        assert!(matches!(cli.command, Commands::ProbeLimit { writes: 501 }));
    }

    #[test]
    fn invalid_path_reports_kind_and_cause() {
        let ctx = commands::memory_context(OutputFormat::Text);
        let err = commands::query::run_children(&ctx, "folders").unwrap_err();
        let rendered = render_error(err.as_ref());
        assert!(rendered.starts_with("error[InvalidInput]: "), "{rendered}");
        assert!(rendered.contains("\"folders\""), "{rendered}");
    }

    #[test]
    fn iteration_cause_is_printed_once() {
        let err = CoreError::iteration(
            "children of folders/sports",
            folderdb_store::StoreError::codec("folders/sports/folders/x is not a folder"),
        );
        let rendered = render_error(&err);
        assert!(rendered.starts_with("error[IterationError]: "), "{rendered}");
        assert_eq!(rendered.matches("is not a folder").count(), 1, "{rendered}");
    }

    #[test]
    fn seed_requires_count() {
        assert!(Cli::try_parse_from(["folderdb", "seed", "--parent", "sports"]).is_err());
    }
}

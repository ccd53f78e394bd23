//! lineage CLI tool
//!
//! Command-line interface for inspecting line-tagged family files with lineage-core.
//!
//! ## Commands
//!
//! - `parse <file>`: Parse once and report record counts and diagnostics
//! - `layout <file>`: Print the generation rows, or the full layout as JSON with `--json`
//! - `check <file>`: Referential integrity report
//! - `starter`: Print the built-in three-person tree
//!
//! Every command reads `--config <file>` (TOML) when given; a missing file means defaults.
//!
//! `check` exits with status 1 when it finds problems; `layout` exits with status 2 when the file
//! itself prevents a layout (dangling anchor line, runaway paternal walk).

use clap::{Parser, Subcommand};
use lineage_core::{
    config::{get_content, LineageConfig},
    tree::FamilyTree,
    Diagnostic,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "lineage")]
#[command(author, version, about = "A tool for parsing and laying out family trees", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a family file and display diagnostics
    Parse {
        /// Path to the family file
        path: PathBuf,
    },

    /// Lay out a family file generation by generation
    Layout {
        /// Path to the family file
        path: PathBuf,

        /// Print the layout as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check a family file for dangling links, missing back-links and ancestry cycles
    Check {
        /// Path to the family file
        path: PathBuf,
    },

    /// Print the built-in starter tree
    Starter,
}

fn load_session(path: &Path, config: LineageConfig) -> Result<FamilyTree, Box<dyn std::error::Error>> {
    let content = get_content(path)?;
    let (session, diagnostics) = FamilyTree::from_text(&content, config);
    print_diagnostics(&diagnostics);
    Ok(session)
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        if diagnostic.is_fault() {
            eprintln!("error: {}", diagnostic);
        } else {
            eprintln!("note: {}", diagnostic);
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match cli.config.as_ref() {
        Some(path) => LineageConfig::load(path)?,
        None => LineageConfig::default(),
    };

    match cli.command {
        Commands::Parse { path } => {
            let session = load_session(&path, config)?;
            println!(
                "{}: {} individuals, {} families, {} records",
                path.display(),
                session.index().individuals().len(),
                session.index().families().len(),
                session.records().len()
            );
        }

        Commands::Layout { path, json } => {
            let session = load_session(&path, config)?;
            let layout = match session.layout() {
                Ok(layout) => layout,
                // exit 2: the file needs fixing, not the invocation
                Err(err) if err.is_data_fault() => {
                    eprintln!("error: {}", err);
                    std::process::exit(2);
                }
                Err(err) => return Err(err.into()),
            };
            if json {
                println!("{}", layout.to_json()?);
            } else {
                println!("anchor: {}", layout.anchor);
                for (row, bucket) in layout.rows.iter() {
                    println!("{:>3}: {}", row, bucket.ids().join("  "));
                }
                print_diagnostics(&layout.diagnostics);
            }
        }

        Commands::Check { path } => {
            let session = load_session(&path, config)?;
            let report = session.validate();
            print_diagnostics(&report.diagnostics);
            for cycle in report.ancestry_cycles.iter() {
                eprintln!("error: ancestry cycle through {}", cycle.join(", "));
            }
            if report.is_clean() {
                println!("{}: no integrity problems", path.display());
            } else {
                std::process::exit(1);
            }
        }

        Commands::Starter => {
            print!("{}", FamilyTree::new(config).to_text());
        }
    }

    Ok(())
}

//! fsnode - snapshot, inspect and re-materialize filesystem trees.
//!
//! Usage:
//!   fsnode show [PATH]           Print a tree with sizes
//!   fsnode export [PATH]         Export a tree manifest to JSON
//!   fsnode copy SRC DEST         Snapshot SRC into memory and write it to DEST
//!   fsnode --help                Show help

use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use fsnode_core::NodeKind;
use fsnode_fs::{
    ExistingDestination, FileNode, Manifest, ReadOptions, WriteOptions, read_tree, write_tree_from,
};

#[derive(Parser)]
#[command(
    name = "fsnode",
    version,
    about = "Snapshot, inspect and re-materialize filesystem trees",
    long_about = "fsnode reads a file or directory into memory and writes it back out \
                  somewhere else, replacing whatever files are in the way."
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a tree with sizes
    Show {
        /// Path to read
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Maximum depth to display
        #[arg(short, long, default_value = "3")]
        depth: u32,

        /// Follow symlinks instead of recording them as links
        #[arg(short = 'L', long)]
        follow: bool,
    },

    /// Export a tree manifest to JSON
    Export {
        /// Path to read
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Follow symlinks instead of recording them as links
        #[arg(short = 'L', long)]
        follow: bool,
    },

    /// Snapshot SRC into memory and write it to DEST
    Copy {
        /// Source file or directory
        source: PathBuf,

        /// Destination path (its parent must exist)
        destination: PathBuf,

        /// Write files in place instead of through a temporary file
        #[arg(long)]
        direct: bool,

        /// Fail without touching DEST if a directory copy finds it occupied
        #[arg(long)]
        keep_existing: bool,

        /// Follow symlinks instead of recording them as links
        #[arg(short = 'L', long)]
        follow: bool,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Show {
            path,
            depth,
            follow,
        } => run_show(&path, depth, read_options(follow))?,
        Command::Export {
            path,
            output,
            follow,
        } => run_export(&path, output, read_options(follow))?,
        Command::Copy {
            source,
            destination,
            direct,
            keep_existing,
            follow,
        } => {
            let existing = if keep_existing {
                ExistingDestination::Keep
            } else {
                ExistingDestination::Clear
            };
            let write_options = WriteOptions {
                atomic: !direct,
                existing_directory: existing,
                ..WriteOptions::default()
            };
            run_copy(&source, &destination, read_options(follow), &write_options)?;
        }
    }

    Ok(())
}

/// Install a stderr subscriber filtered by `RUST_LOG` or the verbosity flag.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "fsnode={level},fsnode_core={level},fsnode_fs={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn read_options(follow: bool) -> ReadOptions {
    ReadOptions {
        follow_symlinks: follow,
    }
}

/// Read a tree and print it with sizes.
fn run_show(path: &Path, max_depth: u32, options: ReadOptions) -> Result<()> {
    let tree = read_tree(path, &options)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let stats = tree.stats();

    println!();
    println!("{}", "─".repeat(60));
    println!(" {} - {}", path.display(), format_size(stats.total_bytes));
    println!(
        " {} files, {} directories, {} symlinks",
        stats.files, stats.directories, stats.symlinks
    );
    if let Some((largest, size)) = &stats.largest_file {
        println!(" Largest file: {} ({})", largest.display(), format_size(*size));
    }
    println!("{}", "─".repeat(60));
    println!();

    print_node(&tree, &path.display().to_string(), 0, max_depth);

    Ok(())
}

/// Read a tree and export its manifest as JSON.
fn run_export(path: &Path, output: Option<PathBuf>, options: ReadOptions) -> Result<()> {
    let tree = read_tree(path, &options)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = tree.stored_name.clone().unwrap_or_default();
    let manifest = Manifest::from_node(name, &tree);

    let json = serde_json::to_string_pretty(&manifest)?;

    match output {
        Some(output_path) => {
            std::fs::write(&output_path, json)?;
            eprintln!("Exported to {}", output_path.display());
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}

/// Snapshot `source` and write it to `destination`.
fn run_copy(
    source: &Path,
    destination: &Path,
    read_options: ReadOptions,
    write_options: &WriteOptions,
) -> Result<()> {
    let mut tree = read_tree(source, &read_options)
        .with_context(|| format!("Failed to read {}", source.display()))?;
    let stats = tree.stats();
    info!(files = stats.files, bytes = stats.total_bytes, "snapshot complete");

    write_tree_from(&mut tree, destination, source, write_options)
        .with_context(|| format!("Failed to write {}", destination.display()))?;

    eprintln!(
        "Copied {} files ({}) to {}",
        stats.files,
        format_size(stats.total_bytes),
        destination.display()
    );

    Ok(())
}

/// Print a node and its children.
fn print_node(node: &FileNode, name: &str, depth: u32, max_depth: u32) {
    let indent = "  ".repeat(depth as usize);

    match node.kind() {
        NodeKind::File { payload } => {
            println!(
                "{}  {:<40} {:>10}",
                indent,
                truncate(name, 40),
                format_size(payload.len() as u64)
            );
        }
        NodeKind::Symlink { target } => {
            println!(
                "{}  {} -> {}",
                indent,
                truncate(name, 40),
                target.display()
            );
        }
        NodeKind::Directory { children } => {
            println!(
                "{}▼ {:<40} {:>10}",
                indent,
                truncate(&format!("{}/", name), 40),
                format_size(node.size())
            );

            if depth < max_depth {
                for (key, child) in children {
                    print_node(child, key, depth + 1, max_depth);
                }
            } else if !children.is_empty() {
                let indent = "  ".repeat((depth + 1) as usize);
                println!("{}  ... {} entries", indent, children.len());
            }
        }
    }
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Truncate a string to max length.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 1).collect();
        format!("{}…", kept)
    }
}

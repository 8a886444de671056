//! spacelens — disk space analyser CLI.
//!
//! Thin binary entry point. All logic lives in the `spacelens-core` crate;
//! this file only parses arguments, renders progress, and prints results.

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use spacelens_core::cache::CacheStore;
use spacelens_core::model::{format_count, format_size};
use spacelens_core::scanner::progress::ScanProgress;
use spacelens_core::scanner::{DEFAULT_MAX_DEPTH, PROGRESS_CHANNEL_CAPACITY};
use spacelens_core::treemap::{self, Rect};
use spacelens_core::{Engine, Node, ScanOutcome};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

#[derive(Parser)]
#[command(name = "spacelens", version, about = "Visualise where your disk space went")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a path and print its largest entries
    Scan {
        path: PathBuf,
        /// Rescan even when a valid cache entry exists
        #[arg(long)]
        force: bool,
        /// Depth down to which child entries are materialised
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        depth: usize,
    },
    /// Scan (cache-aware) and print the treemap cell list for a viewport
    Treemap {
        path: PathBuf,
        #[arg(long, default_value_t = 1200.0)]
        width: f32,
        #[arg(long, default_value_t = 800.0)]
        height: f32,
        #[arg(long)]
        force: bool,
    },
    /// Manage the on-disk scan cache
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },
    /// Open a path in the host's file browser
    Reveal { path: PathBuf },
}

#[derive(Subcommand)]
enum CacheCommand {
    /// Delete all cached scan results
    Clear,
    /// Show whether a path has a valid cache entry
    Info { path: PathBuf },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    let cli = Cli::parse();
    let cache = CacheStore::open_default().context("locating the cache directory")?;

    match cli.command {
        Command::Scan { path, force, depth } => {
            let engine = Arc::new(Engine::with_max_depth(cache, depth));
            let outcome = scan_with_bar(engine, path.clone(), force)?;
            print_summary(&path, &outcome);
        }
        Command::Treemap {
            path,
            width,
            height,
            force,
        } => {
            let engine = Arc::new(Engine::new(cache));
            let outcome = scan_with_bar(engine, path, force)?;
            print_cells(&outcome.tree, Rect::new(0.0, 0.0, width, height));
        }
        Command::Cache { command } => match command {
            CacheCommand::Clear => {
                let removed = Engine::new(cache).clear_cache()?;
                println!("removed {removed} cache entr{}", plural_y(removed));
            }
            CacheCommand::Info { path } => match Engine::new(cache).cache_info(&path) {
                Some(info) => println!("{} cached at {}", info.path, info.timestamp),
                None => println!("no valid cache entry for {}", path.display()),
            },
        },
        Command::Reveal { path } => spacelens_core::reveal::reveal(&path),
    }

    Ok(())
}

/// Run a scan on a worker thread while this thread drains progress into a
/// progress bar. Cache hits produce no progress and finish immediately.
fn scan_with_bar(engine: Arc<Engine>, path: PathBuf, force: bool) -> anyhow::Result<ScanOutcome> {
    let (tx, rx) = crossbeam_channel::bounded::<ScanProgress>(PROGRESS_CHANNEL_CAPACITY);

    let worker = {
        let engine = Arc::clone(&engine);
        thread::Builder::new()
            .name("spacelens-scanner".into())
            .spawn(move || engine.scan_with_progress(&path, force, Some(&tx)))?
    };

    let bar = ProgressBar::new(0);
    bar.set_style(ProgressStyle::with_template(
        "{bar:40.cyan/blue} {pos}/{len} entries",
    )?);
    for progress in rx {
        bar.set_length(progress.total as u64);
        bar.set_position(progress.scanned as u64);
    }
    bar.finish_and_clear();

    worker
        .join()
        .map_err(|_| anyhow!("scanner thread panicked"))?
        .map_err(Into::into)
}

fn print_summary(path: &std::path::Path, outcome: &ScanOutcome) {
    let tree = &outcome.tree;
    let provenance = if outcome.from_cache { " (cached)" } else { "" };
    println!(
        "{} — {} in {} entries{provenance}",
        path.display(),
        format_size(tree.size),
        format_count(tree.node_count() as u64),
    );

    for child in &tree.children {
        let percent = if tree.size > 0 {
            child.size as f64 / tree.size as f64 * 100.0
        } else {
            0.0
        };
        let marker = if child.is_file { "" } else { "/" };
        println!(
            "  {:>10}  {percent:5.1}%  {}{marker}",
            format_size(child.size),
            child.name,
        );
    }
}

fn print_cells(tree: &Node, viewport: Rect) {
    let cells = treemap::layout(&tree.children, viewport);
    println!(
        "{} cells in {:.0}x{:.0}",
        cells.len(),
        viewport.width,
        viewport.height
    );
    for cell in &cells {
        println!(
            "{:indent$}[{:7.1},{:7.1} {:7.1}x{:7.1}] c{}s{} {}  {}",
            "",
            cell.rect.x,
            cell.rect.y,
            cell.rect.width,
            cell.rect.height,
            cell.color,
            cell.shade,
            cell.node.name,
            format_size(cell.node.size),
            indent = cell.depth * 2,
        );
    }
}

fn plural_y(n: usize) -> &'static str {
    if n == 1 {
        "y"
    } else {
        "ies"
    }
}

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use codec::DecodeLimits;
use glob::Pattern;
use sdem_tools::{decode_demo_bytes, format_decode_pretty, inspect_demo, InspectReport};
use tracing_subscriber::EnvFilter;
use wire::Limits;

#[derive(Parser)]
#[command(name = "sdem-tools", version, about = "sdem demo inspection and decoding tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize one demo, or every demo in a directory.
    Inspect {
        /// Path to a demo file or a directory of demos.
        demo_path: PathBuf,
        /// Optional glob filter when inspecting a directory.
        #[arg(long)]
        glob: Option<String>,
        /// Sort inspected demos.
        #[arg(long, value_enum)]
        sort: Option<InspectSort>,
        /// Limit the number of inspected demos (after sorting).
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Decode a demo into its full object graph.
    Decode {
        /// Path to the demo file.
        demo_file: PathBuf,
        /// Output format.
        #[arg(long, value_enum, default_value_t = DecodeFormat::Json)]
        format: DecodeFormat,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InspectSort {
    Size,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DecodeFormat {
    Json,
    Pretty,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Inspect {
            demo_path,
            glob,
            sort,
            limit,
        } => {
            if demo_path.is_dir() {
                let entries = collect_demo_entries(&demo_path, glob.as_deref())?;
                let mut entries = maybe_sort_entries(entries, sort);
                let limit = limit.or(sort.map(|InspectSort::Size| 10));
                if let Some(limit) = limit {
                    entries.truncate(limit);
                }
                tracing::info!(dir = %demo_path.display(), demos = entries.len(), "inspecting demos");
                for entry in entries {
                    let report = inspect_file(&entry.path)?;
                    println!("== {} ({} bytes) ==", entry.path.display(), entry.size);
                    print_inspect_report(&report);
                }
            } else {
                print_inspect_report(&inspect_file(&demo_path)?);
            }
        }
        Command::Decode { demo_file, format } => {
            let bytes = fs::read(&demo_file).with_context(|| format!("read demo {}", demo_file.display()))?;
            let demo = decode_demo_bytes(&bytes, &Limits::default(), &DecodeLimits::default())?;
            tracing::info!(path = %demo_file.display(), frames = demo.frames.len(), "demo decoded");
            match format {
                DecodeFormat::Json => {
                    let json = serde_json::to_string_pretty(&demo).context("serialize json")?;
                    println!("{json}");
                }
                DecodeFormat::Pretty => {
                    print!("{}", format_decode_pretty(&demo));
                }
            }
        }
    }
    Ok(())
}

fn inspect_file(path: &Path) -> Result<InspectReport> {
    let bytes = fs::read(path).with_context(|| format!("read demo {}", path.display()))?;
    let report = inspect_demo(&bytes, &Limits::default(), &DecodeLimits::default())
        .with_context(|| format!("inspect demo {}", path.display()))?;
    if let Some(fatal) = &report.fatal {
        tracing::warn!(path = %path.display(), %fatal, "demo ended early");
    } else {
        tracing::info!(
            path = %path.display(),
            messages = report.messages,
            diagnostics = report.diagnostics.len(),
            "demo inspected"
        );
    }
    Ok(report)
}

struct DemoEntry {
    path: PathBuf,
    size: u64,
}

fn collect_demo_entries(dir: &Path, glob: Option<&str>) -> Result<Vec<DemoEntry>> {
    let mut entries = Vec::new();
    let pattern = match glob {
        Some(value) => Some(Pattern::new(value).context("invalid glob pattern")?),
        None => None,
    };

    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(pattern) = &pattern {
            let matches_path = pattern.matches_path(&path);
            let matches_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| pattern.matches(name));
            if !matches_path && !matches_name {
                continue;
            }
        }
        let size = entry.metadata()?.len();
        entries.push(DemoEntry { path, size });
    }
    Ok(entries)
}

fn maybe_sort_entries(mut entries: Vec<DemoEntry>, sort: Option<InspectSort>) -> Vec<DemoEntry> {
    match sort {
        Some(InspectSort::Size) => {
            entries.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));
        }
        None => entries.sort_by(|a, b| a.path.cmp(&b.path)),
    }
    entries
}

fn print_inspect_report(report: &InspectReport) {
    let header = &report.header;
    println!(
        "demo protocol: {} network protocol: {} game: {:?}",
        header.demo_protocol, header.network_protocol, report.settings.game
    );
    println!(
        "server: {} client: {} map: {} game dir: {}",
        header.server_name, header.client_name, header.map_name, header.game_directory
    );
    println!(
        "ticks: {} frames: {} playback: {:.2}s",
        header.tick_count, header.frame_count, header.playback_time
    );
    println!("frames:");
    for (kind, count) in &report.frames {
        println!("  {kind}: {count}");
    }
    println!(
        "messages: {} ({} streams ended in error)",
        report.messages, report.broken_streams
    );
    if !report.tables.is_empty() {
        println!("string tables:");
        for table in &report.tables {
            let state = if table.readable { "" } else { " [unreadable]" };
            println!(
                "  {}: {}/{} entries{state}",
                table.name, table.entries, table.max_entries
            );
        }
    }
    if !report.diagnostics.is_empty() {
        println!("diagnostics:");
        for diagnostic in &report.diagnostics {
            println!("  {diagnostic}");
        }
    }
    if let Some(fatal) = &report.fatal {
        println!("fatal: {fatal}");
    }
}

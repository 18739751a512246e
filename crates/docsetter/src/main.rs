use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use docsetter_core::config::DocsetConfig;
use docsetter_core::generate::generate;
use docsetter_core::index::load_stored_index_stats;
use docsetter_core::runtime::{
    PathOverrides, ResolutionContext, ResolvedPaths, inspect_runtime, resolve_runtime,
};

#[derive(Debug, Parser)]
#[command(
    name = "docsetter",
    version,
    about = "Populate a docset search index from a rendered documentation tree"
)]
struct Cli {
    #[arg(long, global = true, value_name = "PATH")]
    docset_root: Option<PathBuf>,
    #[arg(long, global = true, value_name = "PATH")]
    db_path: Option<PathBuf>,
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Print resolved runtime diagnostics")]
    diagnostics: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone)]
struct RuntimeOptions {
    docset_root: Option<PathBuf>,
    db_path: Option<PathBuf>,
    config: Option<PathBuf>,
    diagnostics: bool,
}

impl RuntimeOptions {
    fn from_cli(cli: &Cli) -> Self {
        Self {
            docset_root: cli.docset_root.clone(),
            db_path: cli.db_path.clone(),
            config: cli.config.clone(),
            diagnostics: cli.diagnostics,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Extract gallery and tutorial entries and write the search index")]
    Generate(GenerateArgs),
    #[command(about = "Inspect the resolved docset layout without touching the index")]
    Status,
    #[command(about = "Show row counts from the stored search index")]
    Stats(StatsArgs),
}

#[derive(Debug, Args)]
struct GenerateArgs {
    #[arg(long, help = "Print the generation report as JSON")]
    json: bool,
}

#[derive(Debug, Args)]
struct StatsArgs {
    #[arg(long, help = "Print stats as JSON")]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let runtime = RuntimeOptions::from_cli(&cli);

    match cli.command {
        Some(Commands::Generate(args)) => run_generate(&runtime, args),
        Some(Commands::Status) => run_status(&runtime),
        Some(Commands::Stats(args)) => run_stats(&runtime, args),
        // The tool is a one-shot script; no subcommand means generate.
        None => run_generate(&runtime, GenerateArgs { json: false }),
    }
}

fn run_generate(runtime: &RuntimeOptions, args: GenerateArgs) -> Result<()> {
    let (paths, config) = resolve(runtime)?;
    if runtime.diagnostics {
        println!("[diagnostics]\n{}\n", paths.diagnostics());
    }

    let report = generate(&paths, &config)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Search index updated");
        println!("db_path: {}", report.db_path);
        println!("samples: {}", report.samples);
        println!("guides: {}", report.guides);
        println!("inserted_rows: {}", report.inserted_rows);
        println!("skipped_rows: {}", report.skipped_rows);
    }
    Ok(())
}

fn run_status(runtime: &RuntimeOptions) -> Result<()> {
    let (paths, _config) = resolve(runtime)?;
    let status = inspect_runtime(&paths)?;

    println!("docset_root: {}", normalize_path(&paths.docset_root));
    println!("documents_dir: {}", normalize_path(&paths.documents_dir));
    println!(
        "gallery_index: {} ({})",
        normalize_path(&paths.gallery_index_path),
        format_flag(status.gallery_index_exists),
    );
    println!(
        "tutorial: {} ({})",
        normalize_path(&paths.tutorial_path),
        format_flag(status.tutorial_exists),
    );
    println!(
        "db_path: {} ({})",
        normalize_path(&paths.db_path),
        format_flag(status.db_exists),
    );
    if let Some(bytes) = status.db_size_bytes {
        println!("db_size_bytes: {bytes}");
    }
    for warning in &status.warnings {
        println!("warning: {warning}");
    }
    if runtime.diagnostics {
        println!("\n[diagnostics]\n{}", paths.diagnostics());
    }
    Ok(())
}

fn run_stats(runtime: &RuntimeOptions, args: StatsArgs) -> Result<()> {
    let (paths, _config) = resolve(runtime)?;
    let Some(stats) = load_stored_index_stats(&paths.db_path)? else {
        bail!(
            "no search index found at {}; run `docsetter generate` first",
            normalize_path(&paths.db_path),
        );
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("total_rows: {}", stats.total_rows);
        for (kind, count) in &stats.by_type {
            println!("{kind}: {count}");
        }
    }
    Ok(())
}

fn resolve(runtime: &RuntimeOptions) -> Result<(ResolvedPaths, DocsetConfig)> {
    dotenvy::dotenv().ok();

    let context = ResolutionContext::from_process()?;
    let overrides = PathOverrides {
        docset_root: runtime.docset_root.clone(),
        db_path: runtime.db_path.clone(),
        config: runtime.config.clone(),
    };
    resolve_runtime(&context, &overrides)
}

fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn format_flag(value: bool) -> &'static str {
    if value { "ok" } else { "missing" }
}

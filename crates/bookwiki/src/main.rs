use std::path::{Path, PathBuf};

use anyhow::Result;
use bookwiki_core::check::{CheckReport, run_check};
use bookwiki_core::config::WikiConfig;
use bookwiki_core::convert::{PageStatus, SyncReport, run_sync};
use bookwiki_core::runtime::{
    PathOverrides, ResolutionContext, ResolvedPaths, resolve_paths,
};
use clap::{Args, CommandFactory, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "bookwiki",
    version,
    about = "Convert mdBook documentation into a flat wiki tree"
)]
struct Cli {
    #[arg(long, global = true, value_name = "PATH")]
    project_root: Option<PathBuf>,
    #[arg(long, global = true, value_name = "PATH")]
    book_src: Option<PathBuf>,
    #[arg(long, global = true, value_name = "PATH")]
    wiki_dir: Option<PathBuf>,
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Print resolved runtime diagnostics")]
    diagnostics: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Regenerate the wiki directory from the book")]
    Sync,
    #[command(about = "Audit the book without writing any output")]
    Check(CheckArgs),
}

#[derive(Debug, Args)]
struct CheckArgs {
    #[arg(long, help = "Print the report as JSON")]
    json: bool,
}

#[derive(Debug, Clone)]
struct RuntimeOptions {
    project_root: Option<PathBuf>,
    book_src: Option<PathBuf>,
    wiki_dir: Option<PathBuf>,
    config: Option<PathBuf>,
    diagnostics: bool,
}

impl RuntimeOptions {
    fn from_cli(cli: &Cli) -> Self {
        Self {
            project_root: cli.project_root.clone(),
            book_src: cli.book_src.clone(),
            wiki_dir: cli.wiki_dir.clone(),
            config: cli.config.clone(),
            diagnostics: cli.diagnostics,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let runtime = RuntimeOptions::from_cli(&cli);

    match cli.command {
        Some(Commands::Sync) => run_sync_command(&runtime),
        Some(Commands::Check(args)) => run_check_command(&runtime, args),
        None => {
            let mut command = Cli::command();
            command.print_help()?;
            println!();
            Ok(())
        }
    }
}

fn run_sync_command(runtime: &RuntimeOptions) -> Result<()> {
    let (paths, config) = resolve_runtime_paths(runtime)?;
    if runtime.diagnostics {
        println!("[diagnostics]\n{}\n", paths.diagnostics());
    }

    let report = run_sync(&paths, &config)?;
    print_sync_report(&report);
    Ok(())
}

fn print_sync_report(report: &SyncReport) {
    println!("Found {} chapters", report.chapter_count);
    for page in &report.pages {
        match page.status {
            PageStatus::Created => {
                if let Some(output) = &page.output_path {
                    println!("Created: {output}");
                }
            }
            PageStatus::MissingSource => {
                println!("Warning: {} not found, skipping", page.source_path);
            }
        }
    }
    println!("Created: {}", report.home_path);
    println!("Created: {}", report.sidebar_path);
    println!("Wiki sync complete!");
}

fn run_check_command(runtime: &RuntimeOptions, args: CheckArgs) -> Result<()> {
    let (paths, _config) = resolve_runtime_paths(runtime)?;
    if runtime.diagnostics {
        println!("[diagnostics]\n{}\n", paths.diagnostics());
    }

    let report = run_check(&paths)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    print_check_report(&paths, &report);
    Ok(())
}

fn print_check_report(paths: &ResolvedPaths, report: &CheckReport) {
    println!("book check");
    println!("book_src: {}", normalize_path(&paths.book_src_dir));
    println!("chapters: {}", report.chapter_count);

    println!("missing_sources: {}", report.missing_sources.len());
    for path in &report.missing_sources {
        println!("  - {path}");
    }
    println!("orphan_sources: {}", report.orphan_sources.len());
    for path in &report.orphan_sources {
        println!("  - {path}");
    }

    println!("links.rewritten: {}", report.links_rewritten);
    println!("links.external: {}", report.links_external);
    println!("links.anchor: {}", report.links_anchor);
    println!("links.unresolved: {}", report.links_unresolved);
    for link in &report.unresolved_links {
        println!("  - {}: {}", link.chapter, link.target);
    }
}

fn resolve_runtime_paths(runtime: &RuntimeOptions) -> Result<(ResolvedPaths, WikiConfig)> {
    dotenvy::dotenv().ok();

    let context = ResolutionContext::from_process()?;
    let overrides = PathOverrides {
        project_root: runtime.project_root.clone(),
        book_src: runtime.book_src.clone(),
        wiki_dir: runtime.wiki_dir.clone(),
        config: runtime.config.clone(),
    };
    resolve_paths(&context, &overrides)
}

fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

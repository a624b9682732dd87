use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "blog-content")]
#[command(about = "Render blog articles written in a small markdown dialect into static HTML")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output directory for rendered files
    #[arg(short, long, global = true, default_value = "./output")]
    pub output: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render articles to HTML with their table of contents
    Render(RenderArgs),

    /// Print the table of contents of each article
    Toc(TocArgs),

    /// Analyze articles without writing output
    Analyze(AnalyzeArgs),

    /// Validate input sources
    Validate(ValidateArgs),
}

#[derive(Args)]
pub struct RenderArgs {
    /// Input sources (file paths, directories or URLs)
    #[arg(required = true, value_name = "SOURCE")]
    pub sources: Vec<String>,

    /// Use the dark palette for diagrams
    #[arg(long)]
    pub dark: bool,

    /// Give repeated heading titles distinct ids (`-2`, `-3`, ...)
    #[arg(long)]
    pub dedupe_ids: bool,

    /// Skip the per-article metadata file
    #[arg(long)]
    pub no_metadata: bool,

    /// Directory of static assets to copy next to the pages
    #[arg(long, value_name = "DIR")]
    pub assets: Option<PathBuf>,

    /// Force overwrite existing output files
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct TocArgs {
    /// Input sources (file paths, directories or URLs)
    #[arg(required = true, value_name = "SOURCE")]
    pub sources: Vec<String>,

    /// Give repeated heading titles distinct ids
    #[arg(long)]
    pub dedupe_ids: bool,

    /// Write the tables of contents to a JSON file
    #[arg(long, value_name = "FILE")]
    pub json_output: Option<PathBuf>,
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Input sources (file paths, directories or URLs)
    #[arg(required = true, value_name = "SOURCE")]
    pub sources: Vec<String>,

    /// Output analysis to JSON file
    #[arg(long, value_name = "FILE")]
    pub json_output: Option<PathBuf>,

    /// Show every segment
    #[arg(long)]
    pub detailed: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Input sources (file paths, directories or URLs)
    #[arg(required = true, value_name = "SOURCE")]
    pub sources: Vec<String>,

    /// Check if sources are accessible
    #[arg(long)]
    pub check_access: bool,
}

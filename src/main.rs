mod cli;

use anyhow::Context;
use blog_content::types::{ExportConfig, HeadingIdPolicy, RenderConfig, Theme};
use blog_content::{
    extract_toc_with, ArticleExporter, BlogContentError, ContentFetcher, ContentParser, Result,
};
use clap::Parser;
use cli::{AnalyzeArgs, Cli, Commands, RenderArgs, TocArgs, ValidateArgs};
use std::collections::HashMap;
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG takes precedence over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let result = match &cli.command {
        Commands::Render(args) => handle_render_command(args, &cli.output).await,
        Commands::Toc(args) => handle_toc_command(args).await,
        Commands::Analyze(args) => handle_analyze_command(args).await,
        Commands::Validate(args) => handle_validate_command(args).await,
    };

    if let Err(e) = result {
        error!("Operation failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn id_policy(dedupe: bool) -> HeadingIdPolicy {
    if dedupe {
        HeadingIdPolicy::Suffix
    } else {
        HeadingIdPolicy::Permissive
    }
}

async fn handle_render_command(args: &RenderArgs, output_dir: &Path) -> Result<()> {
    info!("Starting render with {} sources", args.sources.len());

    let validated_sources = ContentFetcher::validate_sources(&args.sources).await?;
    info!("Validated {} sources", validated_sources.len());

    if output_dir.exists() && !args.force {
        let entries = std::fs::read_dir(output_dir).map_err(|e| BlogContentError::OutputDirectory {
            reason: format!("Cannot read output directory: {}", e),
        })?;

        if entries.count() > 0 {
            return Err(BlogContentError::OutputDirectory {
                reason: "Output directory is not empty. Use --force to overwrite.".to_string(),
            });
        }
    }

    let config = ExportConfig {
        output_dir: output_dir.to_path_buf(),
        include_metadata: !args.no_metadata,
        assets_dir: args.assets.clone(),
        render: RenderConfig {
            theme: Theme::for_mode(args.dark),
            heading_ids: id_policy(args.dedupe_ids),
        },
    };

    let parser = ContentParser::new();
    let mut articles = Vec::with_capacity(validated_sources.len());

    for (idx, source) in validated_sources.iter().enumerate() {
        info!("Processing source {}/{}: {}", idx + 1, validated_sources.len(), source);

        let (content, metadata) = ContentFetcher::fetch_content(source).await?;
        articles.push(parser.parse_article(&content, metadata, config.render.heading_ids));
    }

    let exported = ArticleExporter::export_all(articles, &config).await?;
    for (article, result) in &exported {
        info!(
            "Rendered '{}' ({} min read, {} headings) to {}",
            article.source,
            article.reading_minutes,
            article.toc.len(),
            result.html_file.display()
        );
    }

    let index = ArticleExporter::write_index(&exported, &config).await?;
    info!("  - {} (index)", index.display());

    if let Some(assets) = &config.assets_dir {
        ArticleExporter::copy_assets(assets, &config.output_dir)?;
    }

    info!("Render completed successfully!");
    Ok(())
}

async fn handle_toc_command(args: &TocArgs) -> Result<()> {
    let validated_sources = ContentFetcher::validate_sources(&args.sources).await?;
    let policy = id_policy(args.dedupe_ids);
    let mut all_tocs = HashMap::new();

    for source in validated_sources {
        let (content, metadata) = ContentFetcher::fetch_content(&source).await?;
        let toc = extract_toc_with(&content, policy);

        println!("\n=== {} ===", metadata.filename);
        for entry in &toc {
            let indent = if u8::from(entry.level) == 3 { "    " } else { "  " };
            println!("{}{} (#{})", indent, entry.title, entry.id);
        }

        all_tocs.insert(source.clone(), toc);
    }

    if let Some(json_path) = &args.json_output {
        let json_content = serde_json::to_string_pretty(&all_tocs)
            .context("Failed to serialize table of contents")?;

        tokio::fs::write(json_path, json_content)
            .await
            .context("Failed to write JSON table of contents")?;

        info!("Table of contents written to: {}", json_path.display());
    }

    Ok(())
}

async fn handle_analyze_command(args: &AnalyzeArgs) -> Result<()> {
    info!("Starting analysis of {} sources", args.sources.len());

    let validated_sources = ContentFetcher::validate_sources(&args.sources).await?;
    let parser = ContentParser::new();

    let mut all_analyses = HashMap::new();

    for source in validated_sources {
        info!("Analyzing: {}", source);

        let (content, metadata) = ContentFetcher::fetch_content(&source).await?;
        let article = parser.parse_article(&content, metadata, HeadingIdPolicy::Permissive);
        let stats = parser.get_parsing_stats(&article);

        println!("\n=== Analysis for '{}' ===", article.source);
        println!("Source type: {:?}", article.metadata.source_type);
        println!("Total lines: {}", article.metadata.total_lines);
        println!("Segments: {}", article.segments.len());
        println!("Headings: {}", article.toc.len());
        println!("Reading time: {} min", article.reading_minutes);

        if let Some(languages) = stats.get("languages").and_then(|v| v.as_array()) {
            if !languages.is_empty() {
                let names: Vec<&str> = languages.iter().filter_map(|v| v.as_str()).collect();
                println!("Code languages: {}", names.join(", "));
            }
        }

        if args.detailed {
            println!("\nSegment Details:");
            for (idx, segment) in article.segments.iter().enumerate() {
                let language = segment
                    .language()
                    .map(|l| format!(" ({})", l))
                    .unwrap_or_default();
                println!(
                    "  Segment {}: {:?}{}, {} lines",
                    idx + 1,
                    segment.kind(),
                    language,
                    segment.raw_lines().len()
                );
            }
        }

        all_analyses.insert(
            source.clone(),
            serde_json::json!({
                "article": article,
                "stats": stats
            }),
        );
    }

    if let Some(json_path) = &args.json_output {
        let json_content = serde_json::to_string_pretty(&all_analyses)
            .context("Failed to serialize analysis results")?;

        tokio::fs::write(json_path, json_content)
            .await
            .context("Failed to write JSON analysis file")?;

        info!("Analysis results written to: {}", json_path.display());
    }

    Ok(())
}

async fn handle_validate_command(args: &ValidateArgs) -> Result<()> {
    info!("Validating {} sources", args.sources.len());

    let mut valid_sources = Vec::new();
    let mut invalid_sources = Vec::new();

    for source in &args.sources {
        match ContentFetcher::validate_sources(&[source.clone()]).await {
            Ok(expanded) => {
                info!("✓ Valid: {} ({} articles)", source, expanded.len());
                valid_sources.push(source);

                if args.check_access {
                    for article_source in &expanded {
                        match ContentFetcher::fetch_content(article_source).await {
                            Ok((content, _)) => {
                                let lines = content.lines().count();
                                info!("  {} accessible, {} lines found", article_source, lines);
                            }
                            Err(e) => {
                                error!("  Cannot access {}: {}", article_source, e);
                                invalid_sources.push((source, format!("Access error: {}", e)));
                            }
                        }
                    }
                }
            }
            Err(e) => {
                error!("✗ Invalid: {} - {}", source, e);
                invalid_sources.push((source, e.to_string()));
            }
        }
    }

    println!("\n=== Validation Summary ===");
    println!("Valid sources: {}/{}", valid_sources.len(), args.sources.len());

    if !invalid_sources.is_empty() {
        println!("Invalid sources:");
        let invalid_count = invalid_sources.len();
        for (source, error) in invalid_sources {
            println!("  - {}: {}", source, error);
        }
        return Err(BlogContentError::InvalidSource {
            reason: format!("{} sources failed validation", invalid_count),
        });
    }

    println!("All sources are valid!");
    Ok(())
}

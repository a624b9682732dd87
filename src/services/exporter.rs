use crate::error::{BlogContentError, Result};
use crate::services::renderer::{render_toc_nav, ArticleRenderer};
use crate::services::toc::SlugAllocator;
use crate::types::{Article, ExportConfig, ExportResult, HeadingIdPolicy, RenderConfig};
use html_escape::encode_text;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

pub struct ArticleExporter;

impl ArticleExporter {
    pub async fn export(article: &Article, config: &ExportConfig) -> Result<ExportResult> {
        let slug = &article.metadata.slug;
        info!("Exporting article '{}' as '{}'", article.source, slug);

        Self::ensure_output_directory(&config.output_dir).await?;

        let html_file = config.output_dir.join(format!("{}.html", slug));
        let page = Self::render_page(article, &config.render);
        Self::write_file(&html_file, page.as_bytes()).await?;

        let toc_file = config.output_dir.join(format!("{}.toc.json", slug));
        let toc_json = serde_json::to_string_pretty(&article.toc)?;
        Self::write_file(&toc_file, toc_json.as_bytes()).await?;

        let metadata_file = if config.include_metadata {
            let path = config.output_dir.join(format!("{}.meta.json", slug));
            Self::write_metadata_file(&path, article).await?;
            Some(path)
        } else {
            None
        };

        debug!(
            "Wrote {} with {} headings, {} segments",
            html_file.display(),
            article.toc.len(),
            article.segments.len()
        );

        Ok(ExportResult {
            slug: slug.clone(),
            html_file,
            toc_file,
            metadata_file,
        })
    }

    /// Export a batch of articles. Articles whose slug was already taken in
    /// this batch (`a/post.md` and `b/post.md`) are renamed `post-2`, `post-3`
    /// so no page overwrites another.
    pub async fn export_all(
        articles: Vec<Article>,
        config: &ExportConfig,
    ) -> Result<Vec<(Article, ExportResult)>> {
        let mut slugs = SlugAllocator::new(HeadingIdPolicy::Suffix);
        let mut exported = Vec::with_capacity(articles.len());

        for mut article in articles {
            let slug = slugs.allocate(&article.metadata.slug);
            if slug != article.metadata.slug {
                warn!(
                    "Slug '{}' already used, exporting '{}' as '{}'",
                    article.metadata.slug, article.source, slug
                );
                article.metadata.slug = slug;
            }

            let result = Self::export(&article, config).await?;
            exported.push((article, result));
        }

        Ok(exported)
    }

    /// Full standalone page: reading-time badge, article body and the
    /// "On this page" navigation panel.
    pub fn render_page(article: &Article, config: &RenderConfig) -> String {
        let body = ArticleRenderer::new(config.clone()).render(&article.segments);
        let nav = render_toc_nav(&article.toc, None);
        let title = Path::new(&article.source)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&article.metadata.slug);

        format!(
            concat!(
                "<!DOCTYPE html>\n",
                "<html lang=\"en\" data-theme=\"{mode}\">\n",
                "<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n",
                "<body>\n",
                "<div class=\"reading-progress\"><div class=\"reading-progress-bar\"></div></div>\n",
                "<div class=\"article-layout\">\n",
                "<article>\n",
                "<div class=\"reading-time\">{minutes} min read</div>\n",
                "<div class=\"prose\">\n{body}</div>\n",
                "<div class=\"article-end\">&#10022;</div>\n",
                "</article>\n",
                "<aside>\n{nav}</aside>\n",
                "</div>\n",
                "</body>\n</html>\n"
            ),
            mode = if config.theme.is_dark_mode { "dark" } else { "light" },
            title = encode_text(title),
            minutes = article.reading_minutes,
            body = body,
            nav = nav,
        )
    }

    /// `index.json` listing every exported article in the order given.
    pub async fn write_index(
        articles: &[(Article, ExportResult)],
        config: &ExportConfig,
    ) -> Result<PathBuf> {
        Self::ensure_output_directory(&config.output_dir).await?;

        let entries: Vec<serde_json::Value> = articles
            .iter()
            .map(|(article, result)| {
                serde_json::json!({
                    "slug": result.slug,
                    "source": article.source,
                    "reading_minutes": article.reading_minutes,
                    "headings": article.toc.len(),
                    "html_file": Self::file_name(&result.html_file),
                    "generated_at": article.metadata.generated_at,
                })
            })
            .collect();

        let index = serde_json::json!({
            "generated_at": chrono::Utc::now().to_rfc3339(),
            "total_articles": entries.len(),
            "articles": entries,
        });

        let path = config.output_dir.join("index.json");
        Self::write_file(&path, serde_json::to_string_pretty(&index)?.as_bytes()).await?;
        info!("Generated index file: {}", path.display());
        Ok(path)
    }

    /// Copy a static assets directory (images, stylesheets) into the output.
    pub fn copy_assets(assets_dir: &Path, output_dir: &Path) -> Result<u64> {
        if !assets_dir.is_dir() {
            return Err(BlogContentError::FileNotFound {
                path: assets_dir.display().to_string(),
            });
        }

        let mut options = fs_extra::dir::CopyOptions::new();
        options.overwrite = true;
        let copied = fs_extra::dir::copy(assets_dir, output_dir, &options).map_err(|e| {
            BlogContentError::OutputDirectory {
                reason: format!("Failed to copy assets from {}: {}", assets_dir.display(), e),
            }
        })?;

        info!("Copied {} bytes of assets from {}", copied, assets_dir.display());
        Ok(copied)
    }

    async fn ensure_output_directory(output_dir: &Path) -> Result<()> {
        if !output_dir.exists() {
            fs::create_dir_all(output_dir).await.map_err(|e| {
                BlogContentError::OutputDirectory {
                    reason: format!("Failed to create output directory: {}", e),
                }
            })?;
            info!("Created output directory: {}", output_dir.display());
        }
        Ok(())
    }

    async fn write_metadata_file(path: &Path, article: &Article) -> Result<()> {
        let segment_kinds: Vec<_> = article.segments.iter().map(|s| s.kind()).collect();
        let metadata = serde_json::json!({
            "source": article.source,
            "reading_minutes": article.reading_minutes,
            "segments": segment_kinds,
            "toc": article.toc,
            "document_metadata": article.metadata,
        });

        Self::write_file(path, serde_json::to_string_pretty(&metadata)?.as_bytes()).await
    }

    async fn write_file(path: &Path, content: &[u8]) -> Result<()> {
        fs::write(path, content).await.map_err(|e| BlogContentError::OutputDirectory {
            reason: format!("Failed to write {}: {}", path.display(), e),
        })
    }

    fn file_name(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

use crate::error::{BlogContentError, Result};
use crate::services::toc::slugify;
use crate::types::{ArticleMetadata, SourceType};
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};
use url::Url;
use walkdir::WalkDir;

pub struct ContentFetcher;

impl ContentFetcher {
    pub async fn fetch_content(source: &str) -> Result<(String, ArticleMetadata)> {
        if Self::is_url(source) {
            Self::fetch_from_url(source).await
        } else {
            Self::fetch_from_file(source).await
        }
    }

    async fn fetch_from_url(url: &str) -> Result<(String, ArticleMetadata)> {
        info!("Fetching article from URL: {}", url);

        let parsed_url = Url::parse(url)?;
        let client = reqwest::Client::new();
        let response = client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(BlogContentError::HttpStatus {
                status: response.status().as_u16(),
            });
        }

        let content = response.text().await?;
        let filename = Self::extract_filename_from_url(&parsed_url);
        let metadata = Self::build_metadata(filename, SourceType::Url, &content);

        Ok((content, metadata))
    }

    async fn fetch_from_file(file_path: &str) -> Result<(String, ArticleMetadata)> {
        info!("Reading article: {}", file_path);

        let path = Path::new(file_path);

        if !path.exists() {
            return Err(BlogContentError::FileNotFound {
                path: file_path.to_string(),
            });
        }

        let content = fs::read_to_string(path).await?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        let metadata = Self::build_metadata(filename, SourceType::LocalFile, &content);

        Ok((content, metadata))
    }

    fn build_metadata(filename: String, source_type: SourceType, content: &str) -> ArticleMetadata {
        ArticleMetadata {
            slug: Self::slug_for(&filename),
            filename,
            source_type,
            generated_at: chrono::Utc::now().to_rfc3339(),
            total_lines: content.lines().count(),
        }
    }

    /// Page slug from a file name: extension dropped, then slugified.
    pub fn slug_for(filename: &str) -> String {
        let stem = Path::new(filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(filename);
        let slug = slugify(stem);
        if slug.is_empty() {
            "article".to_string()
        } else {
            slug
        }
    }

    fn is_url(source: &str) -> bool {
        source.starts_with("http://") || source.starts_with("https://")
    }

    fn extract_filename_from_url(url: &Url) -> String {
        url.path_segments()
            .and_then(|segments| segments.last())
            .and_then(|name| if name.is_empty() { None } else { Some(name) })
            .unwrap_or("downloaded.md")
            .to_string()
    }

    /// Check every source and expand directories into the markdown files
    /// they contain, in path order.
    pub async fn validate_sources(sources: &[String]) -> Result<Vec<String>> {
        let mut validated = Vec::new();

        for source in sources {
            if Self::is_url(source) {
                Url::parse(source)?;
                validated.push(source.clone());
                continue;
            }

            let path = Path::new(source);
            if path.is_file() {
                validated.push(source.clone());
            } else if path.is_dir() {
                let articles = Self::collect_markdown_files(path)?;
                if articles.is_empty() {
                    return Err(BlogContentError::InvalidSource {
                        reason: format!("No markdown files found in {}", source),
                    });
                }
                debug!("Expanded {} into {} articles", source, articles.len());
                validated.extend(articles);
            } else {
                return Err(BlogContentError::FileNotFound {
                    path: source.clone(),
                });
            }
        }

        Ok(validated)
    }

    fn collect_markdown_files(dir: &Path) -> Result<Vec<String>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|e| BlogContentError::InvalidSource {
                reason: format!("Cannot walk {}: {}", dir.display(), e),
            })?;
            let is_markdown = entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("md"));
            if entry.file_type().is_file() && is_markdown {
                files.push(entry.path().to_string_lossy().into_owned());
            }
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_slug_for_file_names() {
        assert_eq!(ContentFetcher::slug_for("Self Hosting Email.md"), "self-hosting-email");
        assert_eq!(ContentFetcher::slug_for("building-orleans-search.md"), "building-orleans-search");
        assert_eq!(ContentFetcher::slug_for("!!!.md"), "article");
    }

    #[test]
    fn test_filename_from_url() {
        let url = Url::parse("https://example.com/posts/identity.md").unwrap();
        assert_eq!(ContentFetcher::extract_filename_from_url(&url), "identity.md");

        let bare = Url::parse("https://example.com/").unwrap();
        assert_eq!(ContentFetcher::extract_filename_from_url(&bare), "downloaded.md");
    }

    #[tokio::test]
    async fn test_fetch_local_file_builds_metadata() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("My Post.md");
        std::fs::write(&path, "## Intro\nHello\n").unwrap();

        let (content, metadata) = ContentFetcher::fetch_content(path.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(content, "## Intro\nHello\n");
        assert_eq!(metadata.filename, "My Post.md");
        assert_eq!(metadata.slug, "my-post");
        assert_eq!(metadata.source_type, SourceType::LocalFile);
        assert_eq!(metadata.total_lines, 2);
    }

    #[tokio::test]
    async fn test_missing_file_is_reported() {
        let err = ContentFetcher::fetch_content("/definitely/not/here.md").await.unwrap_err();
        assert!(matches!(err, BlogContentError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn test_validate_expands_directories() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.md"), "b").unwrap();
        std::fs::write(dir.path().join("a.md"), "a").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "skip").unwrap();

        let sources = vec![dir.path().to_string_lossy().into_owned()];
        let validated = ContentFetcher::validate_sources(&sources).await.unwrap();

        assert_eq!(validated.len(), 2);
        assert!(validated[0].ends_with("a.md"));
        assert!(validated[1].ends_with("b.md"));
    }

    #[tokio::test]
    async fn test_validate_rejects_bad_url_and_empty_dir() {
        let bad = vec!["https://exa mple.com/post.md".to_string()];
        assert!(ContentFetcher::validate_sources(&bad).await.is_err());

        let dir = TempDir::new().unwrap();
        let empty = vec![dir.path().to_string_lossy().into_owned()];
        let err = ContentFetcher::validate_sources(&empty).await.unwrap_err();
        assert!(matches!(err, BlogContentError::InvalidSource { .. }));
    }
}

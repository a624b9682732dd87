use crate::services::reading::estimate_reading_time;
use crate::services::toc::extract_toc_with;
use crate::types::{Article, ArticleMetadata, ContentSegment, HeadingIdPolicy, SegmentKind};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

pub const FENCE_MARKER: &str = "```";
pub const DIAGRAM_KEYWORD: &str = "mermaid";

/// Splits an article body into text, code and diagram segments.
pub struct ContentParser {
    diagram_opener: String,
}

impl ContentParser {
    pub fn new() -> Self {
        Self::with_diagram_keyword(DIAGRAM_KEYWORD)
    }

    pub fn with_diagram_keyword(keyword: &str) -> Self {
        Self {
            diagram_opener: format!("{}{}", FENCE_MARKER, keyword),
        }
    }

    /// Single line-oriented pass. Total: any input yields segments, and an
    /// unterminated fence is flushed with everything up to end of input.
    pub fn parse(&self, raw: &str) -> Vec<ContentSegment> {
        let mut segments = Vec::new();
        let mut current: Option<ContentSegment> = None;
        let mut fenced = false;

        for line in raw.split('\n') {
            let trimmed = line.trim();

            // A diagram opener wins even inside an open fence.
            if trimmed == self.diagram_opener {
                segments.extend(current.take());
                current = Some(ContentSegment::Diagram {
                    raw_lines: Vec::new(),
                });
                fenced = true;
                continue;
            }

            if !fenced && trimmed.starts_with(FENCE_MARKER) {
                segments.extend(current.take());
                let language = trimmed[FENCE_MARKER.len()..].to_string();
                current = Some(ContentSegment::Code {
                    raw_lines: Vec::new(),
                    language: if language.is_empty() { None } else { Some(language) },
                });
                fenced = true;
                continue;
            }

            if fenced && trimmed == FENCE_MARKER {
                segments.extend(current.take());
                fenced = false;
                continue;
            }

            if !fenced && !matches!(current, Some(ContentSegment::Text { .. })) {
                segments.extend(current.take());
                current = Some(ContentSegment::Text {
                    raw_lines: Vec::new(),
                });
            }

            if let Some(segment) = current.as_mut() {
                segment.raw_lines_mut().push(line.to_string());
            }
        }

        segments.extend(current);
        segments
    }

    pub fn parse_article(
        &self,
        raw: &str,
        metadata: ArticleMetadata,
        heading_ids: HeadingIdPolicy,
    ) -> Article {
        info!("Parsing article: {}", metadata.filename);

        let segments = self.parse(raw);
        let toc = extract_toc_with(raw, heading_ids);
        let reading_minutes = estimate_reading_time(raw);

        debug!(
            "Found {} segments and {} headings, ~{} min read",
            segments.len(),
            toc.len(),
            reading_minutes
        );

        Article {
            source: metadata.filename.clone(),
            segments,
            toc,
            reading_minutes,
            metadata,
        }
    }

    pub fn get_parsing_stats(&self, article: &Article) -> HashMap<String, serde_json::Value> {
        let mut stats = HashMap::new();

        let count = |kind: SegmentKind| {
            article
                .segments
                .iter()
                .filter(|s| s.kind() == kind)
                .count()
        };
        stats.insert("text_segments".to_string(), count(SegmentKind::Text).into());
        stats.insert("code_segments".to_string(), count(SegmentKind::Code).into());
        stats.insert("diagram_segments".to_string(), count(SegmentKind::Diagram).into());
        stats.insert("headings".to_string(), article.toc.len().into());
        stats.insert("total_lines".to_string(), article.metadata.total_lines.into());
        stats.insert("reading_minutes".to_string(), article.reading_minutes.into());

        let languages: BTreeSet<&str> = article
            .segments
            .iter()
            .filter_map(ContentSegment::language)
            .collect();
        stats.insert(
            "languages".to_string(),
            languages.into_iter().collect::<Vec<_>>().into(),
        );

        stats
    }
}

impl Default for ContentParser {
    fn default() -> Self {
        Self::new()
    }
}

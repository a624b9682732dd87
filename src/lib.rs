//! # Blog Content Library
//!
//! Turns blog articles written in a small markdown dialect into ordered
//! content segments, HTML blocks and a table of contents, and tracks which
//! heading is being read while the page scrolls.
//!
//! ## Example Usage
//!
//! ```rust
//! use blog_content::{extract_toc, ArticleRenderer, ContentParser};
//! use blog_content::types::RenderConfig;
//!
//! let raw = "## Intro\nHello **world**.\n\n```rust\nfn main() {}\n```";
//!
//! let segments = ContentParser::new().parse(raw);
//! let toc = extract_toc(raw);
//! let html = ArticleRenderer::new(RenderConfig::default()).render(&segments);
//!
//! assert_eq!(segments.len(), 2);
//! assert_eq!(toc[0].id, "intro");
//! assert!(html.contains("<strong>world</strong>"));
//! ```

pub mod error;
pub mod services;
pub mod types;

// Re-export main types and services for easier usage
pub use error::{BlogContentError, Result};
pub use services::reading::{estimate_reading_time, reading_progress};
pub use services::renderer::render_text;
pub use services::toc::{extract_toc, extract_toc_with, slugify};
pub use services::{
    ArticleExporter, ArticleRenderer, ContentFetcher, ContentParser, DiagramRenderer,
    MermaidEmbed, ReadingSurface, ScrollEvents, ScrollTracker, TrackerConfig, TrackerHandle,
};
pub use types::{Article, ContentSegment, HeadingLevel, ReadingState, TocEntry};

/// Parse an article body with the default diagram keyword.
pub fn parse(raw: &str) -> Vec<ContentSegment> {
    ContentParser::new().parse(raw)
}

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One contiguous unit of parsed article content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentSegment {
    Text {
        raw_lines: Vec<String>,
    },
    Code {
        raw_lines: Vec<String>,
        language: Option<String>,
    },
    Diagram {
        raw_lines: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Text,
    Code,
    Diagram,
}

impl ContentSegment {
    pub fn kind(&self) -> SegmentKind {
        match self {
            ContentSegment::Text { .. } => SegmentKind::Text,
            ContentSegment::Code { .. } => SegmentKind::Code,
            ContentSegment::Diagram { .. } => SegmentKind::Diagram,
        }
    }

    pub fn raw_lines(&self) -> &[String] {
        match self {
            ContentSegment::Text { raw_lines }
            | ContentSegment::Code { raw_lines, .. }
            | ContentSegment::Diagram { raw_lines } => raw_lines,
        }
    }

    pub(crate) fn raw_lines_mut(&mut self) -> &mut Vec<String> {
        match self {
            ContentSegment::Text { raw_lines }
            | ContentSegment::Code { raw_lines, .. }
            | ContentSegment::Diagram { raw_lines } => raw_lines,
        }
    }

    /// Segment body with line breaks reinserted.
    pub fn content(&self) -> String {
        self.raw_lines().join("\n")
    }

    pub fn language(&self) -> Option<&str> {
        match self {
            ContentSegment::Code { language, .. } => language.as_deref(),
            _ => None,
        }
    }
}

/// Heading depth tracked by the table of contents. Serialises as `2` or `3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum HeadingLevel {
    H2,
    H3,
}

impl From<HeadingLevel> for u8 {
    fn from(level: HeadingLevel) -> Self {
        match level {
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
        }
    }
}

impl TryFrom<u8> for HeadingLevel {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            2 => Ok(HeadingLevel::H2),
            3 => Ok(HeadingLevel::H3),
            other => Err(format!("unsupported heading level {}", other)),
        }
    }
}

impl HeadingLevel {
    pub fn tag(self) -> &'static str {
        match self {
            HeadingLevel::H2 => "h2",
            HeadingLevel::H3 => "h3",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    pub id: String,
    pub title: String,
    pub level: HeadingLevel,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingState {
    pub active_heading_id: Option<String>,
}

/// Vertical extent of an element relative to the viewport, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub top: f64,
    pub bottom: f64,
}

impl Bounds {
    pub fn new(top: f64, bottom: f64) -> Self {
        Self { top, bottom }
    }

    pub fn contains(&self, inner: &Bounds) -> bool {
        inner.top >= self.top && inner.bottom <= self.bottom
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceType {
    LocalFile,
    Url,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleMetadata {
    pub filename: String,
    pub slug: String,
    pub source_type: SourceType,
    pub generated_at: String,
    pub total_lines: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub source: String,
    pub segments: Vec<ContentSegment>,
    pub toc: Vec<TocEntry>,
    pub reading_minutes: u32,
    pub metadata: ArticleMetadata,
}

/// How repeated heading titles are turned into element ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingIdPolicy {
    /// Identical titles share an id.
    #[default]
    Permissive,
    /// Repeats get `-2`, `-3`, ... appended.
    Suffix,
}

/// Palette handed to the client-side diagram renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramTheme {
    pub primary_color: String,
    pub primary_text_color: String,
    pub primary_border_color: String,
    pub secondary_color: String,
    pub secondary_text_color: String,
    pub secondary_border_color: String,
    pub tertiary_color: String,
    pub tertiary_text_color: String,
    pub tertiary_border_color: String,
    pub line_color: String,
    pub text_color: String,
    pub background: String,
    pub node_border: String,
    pub cluster_bkg: String,
    pub cluster_border: String,
    pub note_bkg_color: String,
    pub note_text_color: String,
    pub note_border_color: String,
}

impl DiagramTheme {
    pub fn light() -> Self {
        Self {
            primary_color: "#eff6ff".into(),
            primary_text_color: "#1e40af".into(),
            primary_border_color: "#3b82f6".into(),
            secondary_color: "#f0fdfa".into(),
            secondary_text_color: "#0f766e".into(),
            secondary_border_color: "#14b8a6".into(),
            tertiary_color: "#faf5ff".into(),
            tertiary_text_color: "#7c3aed".into(),
            tertiary_border_color: "#a78bfa".into(),
            line_color: "#71717a".into(),
            text_color: "#3f3f46".into(),
            background: "#ffffff".into(),
            node_border: "#3b82f6".into(),
            cluster_bkg: "#fafafa".into(),
            cluster_border: "#e4e4e7".into(),
            note_bkg_color: "#fef3c7".into(),
            note_text_color: "#92400e".into(),
            note_border_color: "#f59e0b".into(),
        }
    }

    pub fn dark() -> Self {
        Self {
            primary_color: "#1e3a5f".into(),
            primary_text_color: "#93c5fd".into(),
            primary_border_color: "#3b82f6".into(),
            secondary_color: "#134e4a".into(),
            secondary_text_color: "#5eead4".into(),
            secondary_border_color: "#14b8a6".into(),
            tertiary_color: "#3b0764".into(),
            tertiary_text_color: "#c4b5fd".into(),
            tertiary_border_color: "#a78bfa".into(),
            line_color: "#a1a1aa".into(),
            text_color: "#d4d4d8".into(),
            background: "#18181b".into(),
            node_border: "#3b82f6".into(),
            cluster_bkg: "#27272a".into(),
            cluster_border: "#3f3f46".into(),
            note_bkg_color: "#422006".into(),
            note_text_color: "#fcd34d".into(),
            note_border_color: "#f59e0b".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub is_dark_mode: bool,
    pub syntax_theme: String,
    pub diagram: DiagramTheme,
}

impl Theme {
    pub fn for_mode(is_dark_mode: bool) -> Self {
        Self {
            is_dark_mode,
            syntax_theme: "one-dark".to_string(),
            diagram: if is_dark_mode {
                DiagramTheme::dark()
            } else {
                DiagramTheme::light()
            },
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::for_mode(false)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RenderConfig {
    pub theme: Theme,
    pub heading_ids: HeadingIdPolicy,
}

#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
    pub include_metadata: bool,
    pub assets_dir: Option<PathBuf>,
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportResult {
    pub slug: String,
    pub html_file: PathBuf,
    pub toc_file: PathBuf,
    pub metadata_file: Option<PathBuf>,
}

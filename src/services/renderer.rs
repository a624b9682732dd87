use crate::error::{BlogContentError, Result};
use crate::services::toc::{parse_heading, SlugAllocator};
use crate::types::{ContentSegment, DiagramTheme, HeadingLevel, RenderConfig, Theme, TocEntry};
use html_escape::{encode_double_quoted_attribute, encode_single_quoted_attribute, encode_text};
use regex::{Captures, Regex};
use std::sync::OnceLock;
use tracing::{debug, warn};

pub const DIAGRAM_ERROR_MESSAGE: &str = "Failed to render diagram";

/// Turns diagram source into markup. Failures are shown inline by
/// [`ArticleRenderer`] rather than aborting the article.
pub trait DiagramRenderer {
    fn render(&self, source: &str, theme: &DiagramTheme) -> Result<String>;
}

/// Emits the diagram source for client-side mermaid rendering, with the
/// palette attached as JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct MermaidEmbed;

impl DiagramRenderer for MermaidEmbed {
    fn render(&self, source: &str, theme: &DiagramTheme) -> Result<String> {
        if source.trim().is_empty() {
            return Err(BlogContentError::Render {
                reason: "diagram source is empty".to_string(),
            });
        }

        let palette = serde_json::to_string(theme)?;
        Ok(format!(
            "<div class=\"diagram\"><pre class=\"mermaid\" data-theme-variables='{}'>{}</pre></div>",
            encode_single_quoted_attribute(&palette),
            encode_text(source)
        ))
    }
}

struct InlinePatterns {
    bold: Regex,
    code: Regex,
    link: Regex,
    unordered_item: Regex,
    ordered_item: Regex,
}

fn patterns() -> &'static InlinePatterns {
    static PATTERNS: OnceLock<InlinePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| InlinePatterns {
        bold: Regex::new(r"\*\*(.*?)\*\*").unwrap(),
        code: Regex::new(r"`([^`]+)`").unwrap(),
        link: Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").unwrap(),
        unordered_item: Regex::new(r"^- (.*)$").unwrap(),
        ordered_item: Regex::new(r"^\d+\. (.*)$").unwrap(),
    })
}

/// Escape, then apply bold, inline code and links in that order.
/// Unbalanced markers stay as literal text.
pub fn render_inline(text: &str) -> String {
    let p = patterns();
    let escaped = encode_text(text);
    let html = p.bold.replace_all(&escaped, "<strong>$1</strong>");
    let html = p.code.replace_all(&html, "<code>$1</code>");
    let html = p.link.replace_all(&html, |caps: &Captures| {
        format!(
            "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a>",
            caps[2].replace('"', "&quot;"),
            &caps[1]
        )
    });
    html.into_owned()
}

enum Block {
    /// Raw lines; inline markup is applied to the whole paragraph so spans
    /// may cross a soft line break.
    Paragraph(Vec<String>),
    List { ordered: bool, items: Vec<String> },
}

impl Block {
    fn write_to(self, html: &mut String) {
        match self {
            Block::Paragraph(lines) => {
                html.push_str("<p>");
                html.push_str(&render_inline(&lines.join("\n")));
                html.push_str("</p>\n");
            }
            Block::List { ordered, items } => {
                let tag = if ordered { "ol" } else { "ul" };
                html.push_str(&format!("<{}>\n", tag));
                for item in items {
                    html.push_str(&format!("<li>{}</li>\n", item));
                }
                html.push_str(&format!("</{}>\n", tag));
            }
        }
    }
}

fn flush(open: &mut Option<Block>, html: &mut String) {
    if let Some(block) = open.take() {
        block.write_to(html);
    }
}

fn render_heading(level: HeadingLevel, id: &str, title: &str) -> String {
    let tag = level.tag();
    let id = encode_double_quoted_attribute(id);
    format!(
        "<{tag} id=\"{id}\" class=\"heading heading-{n}\"><a href=\"#{id}\">{title}<span class=\"heading-anchor\">#</span></a></{tag}>\n",
        tag = tag,
        id = id,
        n = u8::from(level),
        title = render_inline(title.trim()),
    )
}

/// Render prose lines as a sequence of heading, paragraph and list blocks.
pub fn render_text(lines: &[String], ids: &mut SlugAllocator) -> String {
    let p = patterns();
    let mut html = String::new();
    let mut open: Option<Block> = None;

    for line in lines {
        if let Some((level, title)) = parse_heading(line).filter(|(_, t)| !t.is_empty()) {
            flush(&mut open, &mut html);
            html.push_str(&render_heading(level, &ids.allocate(title), title));
            continue;
        }

        if line.trim().is_empty() {
            flush(&mut open, &mut html);
            continue;
        }

        let item = p
            .unordered_item
            .captures(line)
            .map(|c| (false, c))
            .or_else(|| p.ordered_item.captures(line).map(|c| (true, c)));

        match item {
            Some((ordered, caps)) => {
                let content = render_inline(&caps[1]);
                match open.as_mut() {
                    Some(Block::List { ordered: current, items }) if *current == ordered => {
                        items.push(content);
                    }
                    _ => {
                        flush(&mut open, &mut html);
                        open = Some(Block::List {
                            ordered,
                            items: vec![content],
                        });
                    }
                }
            }
            None => {
                let content = line.to_string();
                match open.as_mut() {
                    Some(Block::Paragraph(paragraph)) => paragraph.push(content),
                    _ => {
                        flush(&mut open, &mut html);
                        open = Some(Block::Paragraph(vec![content]));
                    }
                }
            }
        }
    }

    flush(&mut open, &mut html);
    html
}

pub fn normalize_language(language: Option<&str>) -> String {
    let Some(language) = language.filter(|l| !l.is_empty()) else {
        return "text".to_string();
    };
    let lowered = language.to_lowercase();
    match lowered.as_str() {
        "js" => "javascript",
        "ts" => "typescript",
        "cs" => "csharp",
        "py" => "python",
        "rb" => "ruby",
        "yml" => "yaml",
        "sh" | "shell" => "bash",
        other => other,
    }
    .to_string()
}

pub fn render_code(lines: &[String], language: Option<&str>, theme: &Theme) -> String {
    format!(
        concat!(
            "<div class=\"code-block\" data-theme=\"{theme}\">",
            "<div class=\"code-header\"><span class=\"code-language\">{label}</span>",
            "<button type=\"button\" class=\"copy-button\">Copy</button></div>",
            "<pre><code class=\"language-{lang}\">{code}</code></pre></div>\n"
        ),
        theme = encode_double_quoted_attribute(&theme.syntax_theme),
        label = encode_text(language.unwrap_or("code")),
        lang = encode_double_quoted_attribute(&normalize_language(language)),
        code = encode_text(&lines.join("\n")),
    )
}

/// Floating "On this page" panel; `active` marks the heading being read.
pub fn render_toc_nav(toc: &[TocEntry], active: Option<&str>) -> String {
    if toc.is_empty() {
        return String::new();
    }

    let mut html = String::from("<nav class=\"toc\">\n<h2 class=\"toc-title\">On this page</h2>\n<ul>\n");
    for entry in toc {
        let class = if active == Some(entry.id.as_str()) {
            "toc-link active"
        } else {
            "toc-link"
        };
        html.push_str(&format!(
            "<li class=\"toc-level-{}\"><a href=\"#{}\" class=\"{}\">{}</a></li>\n",
            u8::from(entry.level),
            encode_double_quoted_attribute(&entry.id),
            class,
            encode_text(&entry.title)
        ));
    }
    html.push_str("</ul>\n</nav>\n");
    html
}

/// Maps each segment to its block: prose, highlighted code, or diagram.
pub struct ArticleRenderer {
    config: RenderConfig,
    diagrams: Box<dyn DiagramRenderer>,
}

impl ArticleRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self::with_diagram_renderer(config, Box::new(MermaidEmbed))
    }

    pub fn with_diagram_renderer(config: RenderConfig, diagrams: Box<dyn DiagramRenderer>) -> Self {
        Self { config, diagrams }
    }

    pub fn render(&self, segments: &[ContentSegment]) -> String {
        let mut ids = SlugAllocator::new(self.config.heading_ids);
        let mut html = String::new();

        for segment in segments {
            match segment {
                ContentSegment::Text { raw_lines } => {
                    html.push_str(&render_text(raw_lines, &mut ids));
                }
                ContentSegment::Code { raw_lines, language } => {
                    raw_lines.iter().for_each(|line| ids.observe_line(line));
                    html.push_str(&render_code(raw_lines, language.as_deref(), &self.config.theme));
                }
                ContentSegment::Diagram { raw_lines } => {
                    raw_lines.iter().for_each(|line| ids.observe_line(line));
                    html.push_str(&self.render_diagram(&segment.content()));
                }
            }
        }

        debug!("Rendered {} segments into {} bytes", segments.len(), html.len());
        html
    }

    fn render_diagram(&self, source: &str) -> String {
        match self.diagrams.render(source, &self.config.theme.diagram) {
            Ok(markup) => markup + "\n",
            Err(e) => {
                warn!("Diagram rendering failed: {}", e);
                format!(
                    "<div class=\"diagram-error\" role=\"alert\">{}</div>\n",
                    DIAGRAM_ERROR_MESSAGE
                )
            }
        }
    }
}

use crate::types::{HeadingIdPolicy, HeadingLevel, TocEntry};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;
use tracing::debug;

fn heading_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(#{2,3}) (.*)$").unwrap())
}

fn separator_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^a-z0-9]+").unwrap())
}

/// Matches `## title` / `### title` at the very start of a line.
/// The returned title may be empty; callers decide whether that counts.
pub fn parse_heading(line: &str) -> Option<(HeadingLevel, &str)> {
    let captures = heading_pattern().captures(line)?;
    let level = match captures.get(1)?.as_str().len() {
        2 => HeadingLevel::H2,
        _ => HeadingLevel::H3,
    };
    Some((level, captures.get(2)?.as_str()))
}

/// Derive an anchor id: lowercase, collapse every run outside `[a-z0-9]`
/// into one hyphen, then trim hyphens from both ends.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    separator_pattern()
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// Hands out heading ids in document order under a [`HeadingIdPolicy`].
///
/// The TOC extractor and the text renderer each run their own allocator over
/// the same headings in the same order, so both sides agree on every id.
#[derive(Debug, Default)]
pub struct SlugAllocator {
    policy: HeadingIdPolicy,
    seen: HashMap<String, usize>,
    issued: HashSet<String>,
}

impl SlugAllocator {
    pub fn new(policy: HeadingIdPolicy) -> Self {
        Self {
            policy,
            seen: HashMap::new(),
            issued: HashSet::new(),
        }
    }

    /// Under `Suffix`, a repeat gets `-2`, `-3`, ... skipping any candidate
    /// already issued, including another heading's own slug.
    pub fn allocate(&mut self, title: &str) -> String {
        let base = slugify(title);
        match self.policy {
            HeadingIdPolicy::Permissive => base,
            HeadingIdPolicy::Suffix => {
                let mut occurrence = self.seen.get(&base).copied().unwrap_or(0) + 1;
                let mut candidate = Self::disambiguate(&base, occurrence);
                while self.issued.contains(&candidate) {
                    occurrence += 1;
                    candidate = Self::disambiguate(&base, occurrence);
                }
                self.seen.insert(base, occurrence);
                self.issued.insert(candidate.clone());
                candidate
            }
        }
    }

    fn disambiguate(base: &str, occurrence: usize) -> String {
        if occurrence <= 1 {
            base.to_string()
        } else {
            format!("{}-{}", base, occurrence)
        }
    }

    /// Advance the allocator past a heading-shaped line without emitting it.
    pub fn observe_line(&mut self, line: &str) {
        if let Some((_, title)) = parse_heading(line) {
            if !title.is_empty() {
                self.allocate(title);
            }
        }
    }
}

pub fn extract_toc(raw: &str) -> Vec<TocEntry> {
    extract_toc_with(raw, HeadingIdPolicy::Permissive)
}

/// Scan every line of the raw article, fenced or not, for level-2/3 headings.
pub fn extract_toc_with(raw: &str, policy: HeadingIdPolicy) -> Vec<TocEntry> {
    let mut ids = SlugAllocator::new(policy);
    let entries: Vec<TocEntry> = raw
        .split('\n')
        .filter_map(parse_heading)
        .filter(|(_, title)| !title.is_empty())
        .map(|(level, title)| TocEntry {
            id: ids.allocate(title),
            title: title.to_string(),
            level,
        })
        .collect();

    debug!("Extracted {} headings", entries.len());
    entries
}

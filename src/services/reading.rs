use crate::services::parser::ContentParser;
use crate::types::ContentSegment;

pub const WORDS_PER_MINUTE: usize = 200;

/// Whole minutes needed to read the prose of an article, at least one.
/// Fenced code and diagrams are not counted, including an unterminated fence.
pub fn estimate_reading_time(raw: &str) -> u32 {
    let words: usize = ContentParser::new()
        .parse(raw)
        .iter()
        .filter(|segment| matches!(segment, ContentSegment::Text { .. }))
        .flat_map(|segment| segment.raw_lines())
        .map(|line| line.split_whitespace().count())
        .sum();

    words.div_ceil(WORDS_PER_MINUTE).max(1) as u32
}

/// Percentage of the scrollable document already scrolled past, in `[0, 100]`.
pub fn reading_progress(scroll_top: f64, document_height: f64, viewport_height: f64) -> f64 {
    let scrollable = document_height - viewport_height;
    if scrollable <= 0.0 {
        return 0.0;
    }
    (scroll_top / scrollable * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prose(words: usize) -> String {
        vec!["word"; words].join(" ")
    }

    #[test]
    fn test_minimum_is_one_minute() {
        assert_eq!(estimate_reading_time(""), 1);
        assert_eq!(estimate_reading_time("just a few words"), 1);
    }

    #[test]
    fn test_rounds_up_partial_minutes() {
        assert_eq!(estimate_reading_time(&prose(200)), 1);
        assert_eq!(estimate_reading_time(&prose(201)), 2);
        assert_eq!(estimate_reading_time(&prose(1000)), 5);
    }

    #[test]
    fn test_code_is_not_counted() {
        let code = format!("```rust\n{}\n```", prose(1000));
        let raw = format!("{}\n{}", prose(150), code);
        assert_eq!(estimate_reading_time(&raw), 1);
    }

    #[test]
    fn test_unterminated_fence_is_not_counted() {
        let raw = format!("{}\n```\n{}", prose(10), prose(5000));
        assert_eq!(estimate_reading_time(&raw), 1);
    }

    #[test]
    fn test_doubling_prose_never_decreases_estimate() {
        let code = format!("```mermaid\n{}\n```", prose(300));
        for words in [1, 50, 199, 200, 333, 1024] {
            let single = format!("{}\n{}", prose(words), code);
            let double = format!("{}\n{}\n{}", prose(words), code, prose(words));
            assert!(estimate_reading_time(&double) >= estimate_reading_time(&single));
        }
    }

    #[test]
    fn test_reading_progress_bounds() {
        assert_eq!(reading_progress(0.0, 3000.0, 1000.0), 0.0);
        assert_eq!(reading_progress(1000.0, 3000.0, 1000.0), 50.0);
        assert_eq!(reading_progress(2000.0, 3000.0, 1000.0), 100.0);
        assert_eq!(reading_progress(2500.0, 3000.0, 1000.0), 100.0);
        assert_eq!(reading_progress(100.0, 800.0, 1000.0), 0.0);
    }
}

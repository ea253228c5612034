use regex::Regex;
use std::sync::LazyLock;
use tracing::trace;

use crate::model::DEFAULT_WEIGHT;

/// `W::text::`
static WEIGHTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\d.]+)::(.+)::$").expect("valid weight pattern"));

/// Legacy `text (×W)` suffix.
static LEGACY_WEIGHTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)\s*\(×([\d.]+)\)$").expect("valid legacy pattern"));

/// Delimiter convention of an editable tag text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// One tag per line.
    #[default]
    Line,
    /// Tags separated by commas or newlines.
    Comma,
}

impl Dialect {
    /// Separator used when rendering tags in this dialect.
    pub fn separator(self) -> &'static str {
        match self {
            Dialect::Line => "\n",
            Dialect::Comma => ", ",
        }
    }
}

/// Split raw editor text into trimmed, non-empty segments.
pub fn split_segments(text: &str, dialect: Dialect) -> Vec<&str> {
    let pieces: Box<dyn Iterator<Item = &str>> = match dialect {
        Dialect::Line => Box::new(text.split('\n')),
        Dialect::Comma => Box::new(text.split([',', '\n'])),
    };
    pieces.filter_map(clean_segment).collect()
}

/// Trim a segment, returning `None` when nothing remains.
pub fn clean_segment(segment: &str) -> Option<&str> {
    let cleaned = segment.trim();
    if cleaned.is_empty() {
        trace!(?segment, "Dropping empty segment");
        None
    } else {
        Some(cleaned)
    }
}

/// Split a trimmed segment into its text and weight.
///
/// Tries `W::text::` first, then the legacy `text (×W)` suffix. A weight that
/// fails to parse falls back to 1.0. Returns `None` when the text part is
/// empty after trimming.
pub fn parse_weighted(segment: &str) -> Option<(String, f64)> {
    let (text, weight) = if let Some(caps) = WEIGHTED.captures(segment) {
        let text = caps.get(2).map_or("", |m| m.as_str()).trim();
        (text, parse_weight(caps.get(1).map_or("", |m| m.as_str())))
    } else if let Some(caps) = LEGACY_WEIGHTED.captures(segment) {
        let text = caps.get(1).map_or("", |m| m.as_str()).trim();
        (text, parse_weight(caps.get(2).map_or("", |m| m.as_str())))
    } else {
        (segment.trim(), DEFAULT_WEIGHT)
    };

    if text.is_empty() {
        trace!(?segment, "Weighted segment has no text");
        return None;
    }
    trace!(text, weight, "Parsed segment");
    Some((text.to_string(), weight))
}

fn parse_weight(raw: &str) -> f64 {
    match raw.parse::<f64>() {
        Ok(w) if w.is_finite() => w,
        _ => {
            trace!(raw, "Malformed weight, using default");
            DEFAULT_WEIGHT
        }
    }
}

/// Render `text` with a one-decimal weight annotation.
pub fn format_weighted(text: &str, weight: f64) -> String {
    format!("{weight:.1}::{text}::")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_line_dialect_keeps_commas() {
        assert_eq!(
            split_segments("red eyes, smile\n\n  hat ", Dialect::Line),
            vec!["red eyes, smile", "hat"]
        );
    }

    #[test]
    fn split_comma_dialect_drops_blanks() {
        assert_eq!(split_segments("a,, ,b", Dialect::Comma), vec!["a", "b"]);
        assert_eq!(split_segments("a\nb,c", Dialect::Comma), vec!["a", "b", "c"]);
    }

    #[test]
    fn parse_weighted_primary_grammar() {
        assert_eq!(
            parse_weighted("1.5:: silver hair ::"),
            Some(("silver hair".to_string(), 1.5))
        );
    }

    #[test]
    fn parse_weighted_legacy_grammar() {
        assert_eq!(
            parse_weighted("silver hair (×1.2)"),
            Some(("silver hair".to_string(), 1.2))
        );
    }

    #[test]
    fn parse_weighted_malformed_weight_defaults() {
        assert_eq!(
            parse_weighted("1.2.3::glow::"),
            Some(("glow".to_string(), 1.0))
        );
    }

    #[test]
    fn parse_weighted_plain_text() {
        assert_eq!(
            parse_weighted("night sky"),
            Some(("night sky".to_string(), 1.0))
        );
        assert_eq!(
            parse_weighted("1.5::x"),
            Some(("1.5::x".to_string(), 1.0))
        );
    }

    #[test]
    fn parse_weighted_empty_inner_text() {
        assert_eq!(parse_weighted("1.5::  ::"), None);
    }

    #[test]
    fn format_weighted_one_decimal() {
        assert_eq!(format_weighted("glow", 1.26), "1.3::glow::");
        assert_eq!(format_weighted("glow", 2.0), "2.0::glow::");
    }
}

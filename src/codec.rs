//! Conversion between editable tag text and structured tags.
//!
//! Text uses the inline `W::text::` weight syntax. Parsing reuses the ids of
//! tags whose text is unchanged so selection survives a re-parse.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::model::{is_default_weight, Tag, TagId};
use crate::text_utils::{format_weighted, parse_weighted, split_segments};

pub use crate::text_utils::Dialect;

/// Parse raw editor text into tags.
///
/// `previous` is the tag list the text was edited from; a parsed tag whose
/// text matches one of them keeps that tag's id. Each previous id is handed
/// out at most once, so repeated lines still get distinct ids.
pub fn parse(raw: &str, dialect: Dialect, previous: &[Tag]) -> Vec<Tag> {
    let mut claimed: HashSet<&TagId> = HashSet::new();
    let tags: Vec<Tag> = split_segments(raw, dialect)
        .into_iter()
        .filter_map(parse_weighted)
        .map(|(text, weight)| {
            let id = previous
                .iter()
                .find(|t| t.text == text && !claimed.contains(&t.id))
                .map(|t| {
                    claimed.insert(&t.id);
                    t.id.clone()
                })
                .unwrap_or_else(TagId::new);
            Tag::with_id(id, text, weight)
        })
        .collect();
    debug!(count = tags.len(), ?dialect, "Parsed tag text");
    tags
}

/// Render a single tag as it appears in editor text and prompts.
pub fn format_tag(tag: &Tag) -> String {
    if is_default_weight(tag.weight) {
        tag.text.clone()
    } else {
        format_weighted(&tag.text, tag.weight)
    }
}

/// Render every non-empty tag, hidden ones included.
pub fn serialize(tags: &[Tag], dialect: Dialect) -> String {
    render(tags.iter(), dialect)
}

/// Render the text shown in a module's editor.
///
/// Hidden tags are left out here even though they still take part in prompt
/// assembly.
pub fn editor_text(tags: &[Tag], dialect: Dialect) -> String {
    render(tags.iter().filter(|t| !t.hidden), dialect)
}

fn render<'a>(tags: impl Iterator<Item = &'a Tag>, dialect: Dialect) -> String {
    let rendered: Vec<String> = tags
        .filter(|t| !t.text.trim().is_empty())
        .map(format_tag)
        .collect();
    trace!(count = rendered.len(), "Rendered tags");
    rendered.join(dialect.separator())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reuses_ids_for_unchanged_text() {
        let previous = vec![Tag::plain("red eyes"), Tag::new("smile", 1.5)];
        let tags = parse("red eyes\n2.0::smile::\nhat", Dialect::Line, &previous);
        assert_eq!(tags.len(), 3);
        assert_eq!(tags[0].id, previous[0].id);
        assert_eq!(tags[1].id, previous[1].id);
        assert_eq!(tags[1].weight, 2.0);
        assert!(previous.iter().all(|p| p.id != tags[2].id));
    }

    #[test]
    fn parse_repeated_text_keeps_ids_distinct() {
        let first = parse("a\na", Dialect::Line, &[]);
        assert_ne!(first[0].id, first[1].id);

        let second = parse("a\na\na", Dialect::Line, &first);
        assert_eq!(second[0].id, first[0].id);
        assert_eq!(second[1].id, first[1].id);
        assert!(first.iter().all(|p| p.id != second[2].id));
    }

    #[test]
    fn parse_clamps_out_of_range_annotation() {
        let tags = parse("9.0::glow::", Dialect::Line, &[]);
        assert_eq!(tags[0].weight, 5.0);
    }

    #[test]
    fn serialize_skips_empty_text() {
        let mut blank = Tag::plain("x");
        blank.text = "   ".to_string();
        let tags = vec![Tag::plain("a"), blank, Tag::new("b", 1.5)];
        assert_eq!(serialize(&tags, Dialect::Comma), "a, 1.5::b::");
    }

    #[test]
    fn editor_text_hides_hidden_tags() {
        let tags = vec![Tag::plain("a"), Tag::plain("secret").hidden()];
        assert_eq!(editor_text(&tags, Dialect::Line), "a");
        assert_eq!(serialize(&tags, Dialect::Line), "a\nsecret");
    }

    #[test]
    fn near_default_weight_renders_bare() {
        let tag = Tag::new("a", 1.005);
        assert_eq!(format_tag(&tag), "a");
    }
}

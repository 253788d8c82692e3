//! Turning free-text review fields into displayable items
//!
//! The service answers with plain strings. Narrative fields are shown as-is;
//! enumerated fields (bugs, suggestions) usually arrive as a numbered or
//! bulleted block and are split into one item per finding.

use regex::Regex;
use std::sync::LazyLock;

static NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+\.(?:\s+|$)").expect("numbered marker regex"));
static ASTERISK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\*(?:\s+|$)").expect("asterisk marker regex"));
static HYPHEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*-(?:\s+|$)").expect("hyphen marker regex"));

/// How a review field should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Narrative,
    EnumeratedList,
}

/// Line markers that start a new list item, highest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Numbered,
    Asterisk,
    Hyphen,
}

impl Marker {
    const PRECEDENCE: [Marker; 3] = [Marker::Numbered, Marker::Asterisk, Marker::Hyphen];

    fn pattern(self) -> &'static Regex {
        match self {
            Marker::Numbered => &NUMBERED,
            Marker::Asterisk => &ASTERISK,
            Marker::Hyphen => &HYPHEN,
        }
    }
}

/// Normalize a field for display.
///
/// Blank input always yields an empty vec so callers can show "no items"
/// instead of an empty bullet. Narrative text is returned untouched as a
/// single element.
pub fn normalize(text: &str, mode: Mode) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    match mode {
        Mode::Narrative => vec![text.to_string()],
        Mode::EnumeratedList => split_items(text),
    }
}

/// Split an enumerated block into items.
///
/// Only the highest-precedence marker kind present in the text starts new
/// items; any other non-blank line continues the current item. Without any
/// marker every non-blank line is an item.
pub fn split_items(text: &str) -> Vec<String> {
    let Some(marker) = detect_marker(text) else {
        return text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();
    };

    let pattern = marker.pattern();
    let mut items: Vec<String> = Vec::new();
    let mut current: Option<String> = None;

    for line in text.lines() {
        if let Some(m) = pattern.find(line) {
            if let Some(done) = current.take() {
                items.push(done);
            }
            current = Some(line[m.end()..].trim().to_string());
            continue;
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match current.as_mut() {
            Some(item) => {
                if !item.is_empty() {
                    item.push(' ');
                }
                item.push_str(line);
            }
            // Text before the first marker stands on its own
            None => current = Some(line.to_string()),
        }
    }

    if let Some(done) = current {
        items.push(done);
    }
    items.retain(|item| !item.is_empty());
    items
}

fn detect_marker(text: &str) -> Option<Marker> {
    Marker::PRECEDENCE
        .into_iter()
        .find(|marker| text.lines().any(|line| marker.pattern().is_match(line)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(text: &str) -> Vec<String> {
        normalize(text, Mode::EnumeratedList)
    }

    #[test]
    fn test_plain_lines_pass_through() {
        assert_eq!(list("Item one\nItem two"), vec!["Item one", "Item two"]);
    }

    #[test]
    fn test_numbered_markers_stripped() {
        assert_eq!(
            list("1. First bug\n2. Second bug"),
            vec!["First bug", "Second bug"]
        );
    }

    #[test]
    fn test_asterisk_markers_stripped() {
        assert_eq!(list("* A\n* B"), vec!["A", "B"]);
    }

    #[test]
    fn test_hyphen_markers_stripped() {
        assert_eq!(list("- one\n  - two\n-three"), vec!["one", "two -three"]);
    }

    #[test]
    fn test_empty_text_yields_no_items() {
        assert!(list("").is_empty());
        assert!(list("  \n\t\n").is_empty());
        assert!(normalize("   ", Mode::Narrative).is_empty());
    }

    #[test]
    fn test_single_line_without_markers() {
        assert_eq!(list("  No obvious bugs.  "), vec!["No obvious bugs."]);
    }

    #[test]
    fn test_numbered_takes_precedence_over_bullets() {
        let text = "1. Off-by-one in loop\n   * index starts at 1\n2. Unused import";
        assert_eq!(
            list(text),
            vec!["Off-by-one in loop * index starts at 1", "Unused import"]
        );
    }

    #[test]
    fn test_continuation_lines_join_item() {
        let text = "* Division by zero when\n  the list is empty\n\n* Shadowed variable";
        assert_eq!(
            list(text),
            vec!["Division by zero when the list is empty", "Shadowed variable"]
        );
    }

    #[test]
    fn test_preamble_kept_as_first_item() {
        let text = "Found two issues:\n1. Leak\n2. Race";
        assert_eq!(list(text), vec!["Found two issues:", "Leak", "Race"]);
    }

    #[test]
    fn test_empty_markers_discarded() {
        assert_eq!(list("1.\n2. Real item\n3. "), vec!["Real item"]);
    }

    #[test]
    fn test_bold_text_is_not_a_bullet() {
        assert_eq!(list("**Note** keep\nsecond"), vec!["**Note** keep", "second"]);
    }

    #[test]
    fn test_decimal_is_not_a_marker() {
        assert_eq!(list("1.5x slower\nfine"), vec!["1.5x slower", "fine"]);
    }

    #[test]
    fn test_crlf_line_endings() {
        assert_eq!(list("1. a\r\n2. b\r\n"), vec!["a", "b"]);
    }

    #[test]
    fn test_narrative_keeps_line_breaks() {
        let text = "First paragraph.\n\nSecond paragraph.";
        assert_eq!(normalize(text, Mode::Narrative), vec![text.to_string()]);
    }
}

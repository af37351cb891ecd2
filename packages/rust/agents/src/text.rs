//! Plain-text helpers shared by the writer and the fact checker.
//!
//! Everything here is total: empty input yields empty output, never an error.

use std::sync::LazyLock;

use regex::Regex;

/// Collapse every whitespace run into a single space and trim the ends.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut `text` to at most `max_chars` characters, backing off to the last
/// space inside the kept prefix. Falls back to a hard cut when the prefix
/// has no usable space.
pub(crate) fn truncate_at_word(text: &str, max_chars: usize) -> &str {
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text;
    };
    let prefix = &text[..cut];
    match prefix.rsplit_once(' ') {
        Some((head, _)) if !head.is_empty() => head,
        _ => prefix,
    }
}

/// First `max_chars` characters of `text`.
pub(crate) fn take_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}

/// Strip leading bullet markers (`-`, `*`, `•`, repeated) and the whitespace
/// after them.
pub(crate) fn strip_bullet_marker(line: &str) -> &str {
    static BULLET_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^[-*\x{2022}]+\s*").expect("valid regex"));

    match BULLET_RE.find(line) {
        Some(m) => &line[m.end()..],
        None => line,
    }
}

/// Split `text` on every line boundary: `\n`, `\r\n`, a bare `\r`, and the
/// Unicode separators (`\x0b`, `\x0c`, `\x1c`..`\x1e`, NEL, LS, PS).
///
/// A trailing separator does not produce an empty final line.
pub(crate) fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    static LINE_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\r\n|[\n\r\x0b\x0c\x1c-\x1e\x{85}\x{2028}\x{2029}]").expect("valid regex")
    });

    let mut lines: Vec<&str> = LINE_BREAK_RE.split(text).collect();
    if lines.last().is_some_and(|last| last.is_empty()) {
        lines.pop();
    }
    lines.into_iter()
}

/// Non-blank lines of `text`, trimmed and with bullet markers removed.
///
/// Lines that consist only of markers are dropped.
pub(crate) fn bullet_lines(text: &str) -> impl Iterator<Item = &str> {
    split_lines(text)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(strip_bullet_marker)
        .filter(|line| !line.is_empty())
}

/// Split `text` into trimmed, non-blank sentences.
///
/// A boundary is a whitespace run directly preceded by `.`, `!` or `?`; the
/// punctuation stays with its sentence.
pub(crate) fn split_sentences(text: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut prev: Option<char> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if ch.is_whitespace() && matches!(prev, Some('.' | '!' | '?')) {
            let mut end = idx + ch.len_utf8();
            while let Some(&(next_idx, next)) = chars.peek() {
                if !next.is_whitespace() {
                    break;
                }
                end = next_idx + next.len_utf8();
                chars.next();
            }
            segments.push(&text[start..idx]);
            start = end;
            prev = None;
            continue;
        }
        prev = Some(ch);
    }
    segments.push(&text[start..]);

    segments
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapse_whitespace_joins_runs() {
        assert_eq!(collapse_whitespace("  a \n\t b   c "), "a b c");
        assert_eq!(collapse_whitespace(" \n "), "");
    }

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate_at_word("short text", 320), "short text");
    }

    #[test]
    fn truncate_backs_off_to_word_boundary() {
        assert_eq!(truncate_at_word("alpha beta gamma", 13), "alpha beta");
    }

    #[test]
    fn truncate_hard_cuts_without_spaces() {
        assert_eq!(truncate_at_word("abcdefghij", 4), "abcd");
    }

    #[test]
    fn truncate_counts_characters_not_bytes() {
        assert_eq!(truncate_at_word("ééé ééé", 5), "ééé");
    }

    #[test]
    fn take_chars_respects_char_boundaries() {
        assert_eq!(take_chars("naïve approach", 4), "naïv");
        assert_eq!(take_chars("ab", 80), "ab");
    }

    #[test]
    fn strip_bullet_marker_variants() {
        assert_eq!(strip_bullet_marker("- item"), "item");
        assert_eq!(strip_bullet_marker("** item"), "item");
        assert_eq!(strip_bullet_marker("\u{2022}item"), "item");
        assert_eq!(strip_bullet_marker("-*- mixed"), "mixed");
        assert_eq!(strip_bullet_marker("plain"), "plain");
    }

    #[test]
    fn bullet_lines_skips_blank_and_marker_only_lines() {
        let lines: Vec<&str> = bullet_lines("- one\n\n  * two  \n---\nthree").collect();
        assert_eq!(lines, vec!["one", "two", "three"]);
    }

    #[test]
    fn split_lines_breaks_on_every_line_boundary() {
        let text = "a\r\nb\rc\nd\x0be\x0cf\x1cg\u{85}h\u{2028}i\u{2029}j\n";
        let lines: Vec<&str> = split_lines(text).collect();
        assert_eq!(lines, vec!["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"]);
        assert_eq!(split_lines("").count(), 0);
        assert_eq!(split_lines("a\n\nb").collect::<Vec<_>>(), vec!["a", "", "b"]);
    }

    #[test]
    fn bullet_lines_handles_carriage_return_only_text() {
        let lines: Vec<&str> =
            bullet_lines("- Panel efficiency\r- Storage upgrade\r- Market timing").collect();
        assert_eq!(lines, vec!["Panel efficiency", "Storage upgrade", "Market timing"]);
    }

    #[test]
    fn split_sentences_on_terminal_punctuation() {
        let sentences = split_sentences("First insight. Second detail!  Third?\nFourth");
        assert_eq!(
            sentences,
            vec!["First insight.", "Second detail!", "Third?", "Fourth"]
        );
    }

    #[test]
    fn split_sentences_ignores_inner_periods() {
        assert_eq!(split_sentences("v1.2 ships soon."), vec!["v1.2 ships soon."]);
        assert!(split_sentences("   ").is_empty());
    }
}

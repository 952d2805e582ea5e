//! Literal span detection.
//!
//! Fenced code blocks and inline code spans display directive syntax as
//! documentation, so markers inside them must never be expanded. Spans are
//! located textually, before any directive scanning.

use std::ops::Range;

/// Tracks code fence state during line-by-line processing.
///
/// Code fences can use backticks or tildes (three or more). The closing
/// fence must use the same character and be at least as long as the
/// opening fence.
#[derive(Debug, Default)]
struct FenceTracker {
    /// Character used for the current fence (backtick or tilde).
    fence_char: Option<char>,
    /// Length of the opening fence (minimum length for closing).
    fence_len: usize,
}

impl FenceTracker {
    fn in_fence(&self) -> bool {
        self.fence_char.is_some()
    }

    /// Update fence state based on a line. Returns `true` if the line is
    /// a fence marker (opening or closing).
    fn update(&mut self, line: &str) -> bool {
        let trimmed = line.trim_start();

        if let Some(fence_char) = self.fence_char {
            if is_closing_fence(trimmed, fence_char, self.fence_len) {
                self.fence_char = None;
                self.fence_len = 0;
                return true;
            }
            false
        } else if let Some((ch, len)) = detect_fence(trimmed) {
            self.fence_char = Some(ch);
            self.fence_len = len;
            true
        } else {
            false
        }
    }
}

/// Detect if a line opens a code fence.
///
/// A backtick fence whose info string contains a backtick is inline code
/// (```` ```code``` ````), not a fence.
fn detect_fence(trimmed: &str) -> Option<(char, usize)> {
    let first = trimmed.chars().next()?;
    if first != '`' && first != '~' {
        return None;
    }

    let count = trimmed.chars().take_while(|&c| c == first).count();
    if count < 3 {
        return None;
    }
    if first == '`' && trimmed[count..].contains('`') {
        return None;
    }
    Some((first, count))
}

/// Check if a line closes the current fence: same character, at least as
/// long as the opening, nothing but whitespace after.
fn is_closing_fence(trimmed: &str, expected_char: char, min_len: usize) -> bool {
    if !trimmed.starts_with(expected_char) {
        return false;
    }

    let count = trimmed.chars().take_while(|&c| c == expected_char).count();
    count >= min_len && trimmed[count..].chars().all(char::is_whitespace)
}

/// Byte ranges of a text that hold literal content.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LiteralSpans {
    ranges: Vec<Range<usize>>,
}

impl LiteralSpans {
    /// Locate fenced code blocks and inline code spans in `text`.
    ///
    /// An unterminated fence extends to the end of the text. An inline span
    /// opened by a run of N backticks is closed by the next run of exactly N
    /// backticks within the same paragraph; an unmatched run is plain text.
    #[must_use]
    pub fn scan(text: &str) -> Self {
        let mut ranges = Vec::new();
        let mut fence = FenceTracker::default();
        let mut fence_start = None;
        let mut prose_start = 0;
        let mut offset = 0;

        for line in text.split_inclusive('\n') {
            let line_end = offset + line.len();
            let was_in_fence = fence.in_fence();
            let is_marker = fence.update(line.trim_end_matches(['\n', '\r']));

            if !was_in_fence && is_marker {
                scan_inline(text, prose_start..offset, &mut ranges);
                fence_start = Some(offset);
            } else if was_in_fence
                && is_marker
                && let Some(start) = fence_start.take()
            {
                ranges.push(start..line_end);
                prose_start = line_end;
            }
            offset = line_end;
        }

        if let Some(start) = fence_start {
            ranges.push(start..text.len());
        } else {
            scan_inline(text, prose_start..text.len(), &mut ranges);
        }

        ranges.sort_by_key(|r| r.start);
        Self { ranges }
    }

    /// Whether byte position `pos` falls inside a literal span.
    #[must_use]
    pub fn contains(&self, pos: usize) -> bool {
        let idx = self.ranges.partition_point(|r| r.end <= pos);
        self.ranges.get(idx).is_some_and(|r| r.start <= pos)
    }

    /// Literal ranges in document order.
    #[must_use]
    pub fn ranges(&self) -> &[Range<usize>] {
        &self.ranges
    }

    /// Whether the text has no literal spans.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

/// Find inline code spans in `text[region]`.
fn scan_inline(text: &str, region: Range<usize>, ranges: &mut Vec<Range<usize>>) {
    let bytes = text.as_bytes();
    let end = region.end;
    let mut i = region.start;

    while i < end {
        if bytes[i] != b'`' {
            i += 1;
            continue;
        }

        let open_start = i;
        while i < end && bytes[i] == b'`' {
            i += 1;
        }
        let run = i - open_start;
        let limit = text[i..end].find("\n\n").map_or(end, |p| i + p);

        let mut j = i;
        while j < limit {
            if bytes[j] == b'`' {
                let close_start = j;
                while j < limit && bytes[j] == b'`' {
                    j += 1;
                }
                if j - close_start == run {
                    ranges.push(open_start..j);
                    i = j;
                    break;
                }
            } else {
                j += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn literal_texts(text: &str) -> Vec<&str> {
        LiteralSpans::scan(text)
            .ranges()
            .iter()
            .map(|r| &text[r.clone()])
            .collect()
    }

    #[test]
    fn test_backtick_fence() {
        let mut tracker = FenceTracker::default();

        assert!(tracker.update("```rust"));
        assert!(tracker.in_fence());
        assert!(!tracker.update("fn main() {}"));
        assert!(tracker.update("```"));
        assert!(!tracker.in_fence());
    }

    #[test]
    fn test_shorter_fence_not_closing() {
        let mut tracker = FenceTracker::default();

        assert!(tracker.update("````"));
        assert!(!tracker.update("```"));
        assert!(tracker.in_fence());
        assert!(tracker.update("````"));
        assert!(!tracker.in_fence());
    }

    #[test]
    fn test_mixed_fence_chars() {
        let mut tracker = FenceTracker::default();

        assert!(tracker.update("~~~"));
        assert!(!tracker.update("```"));
        assert!(tracker.in_fence());
        assert!(tracker.update("~~~"));
    }

    #[test]
    fn test_single_line_triple_backticks_not_fence() {
        let mut tracker = FenceTracker::default();
        assert!(!tracker.update("```code```"));
        assert!(!tracker.in_fence());
    }

    #[test]
    fn test_fenced_block_span() {
        let text = "before\n```\n<!-- include:\"a.md\" -->\n```\nafter\n";
        assert_eq!(
            literal_texts(text),
            vec!["```\n<!-- include:\"a.md\" -->\n```\n"]
        );
    }

    #[test]
    fn test_unterminated_fence_runs_to_end() {
        let text = "intro\n~~~\ncode\nmore";
        assert_eq!(literal_texts(text), vec!["~~~\ncode\nmore"]);
    }

    #[test]
    fn test_inline_spans() {
        let text = "Use `<!-- TOC -->` or ``a ` b`` here";
        assert_eq!(literal_texts(text), vec!["`<!-- TOC -->`", "``a ` b``"]);
    }

    #[test]
    fn test_unmatched_backtick_is_text() {
        let text = "It`s fine\n\nNext `paragraph`";
        assert_eq!(literal_texts(text), vec!["`paragraph`"]);
    }

    #[test]
    fn test_inline_span_does_not_cross_paragraphs() {
        let text = "open `here\n\nclose` there";
        assert!(LiteralSpans::scan(text).is_empty());
    }

    #[test]
    fn test_inline_before_and_after_fence() {
        let text = "`a`\n```\nx\n```\n`b`";
        assert_eq!(literal_texts(text), vec!["`a`", "```\nx\n```\n", "`b`"]);
    }

    #[test]
    fn test_contains() {
        let text = "ab `cd` ef";
        let spans = LiteralSpans::scan(text);
        assert!(!spans.contains(2));
        assert!(spans.contains(3));
        assert!(spans.contains(6));
        assert!(!spans.contains(7));
    }
}

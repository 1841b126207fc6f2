//! Byte-range edits against the original source text.
//!
//! The engine never mutates the tree. It plans [`TextEdit`]s, accepts them
//! group by group into an [`EditSet`] (rejecting groups that overlap an
//! accepted one) and splices the survivors in one forward pass. Text
//! outside edited ranges is copied byte-for-byte.

use std::ops::Range;

/// Replace `range` with `replacement`; an empty range is an insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    /// Byte range in the original text.
    pub range: Range<usize>,
    /// Replacement text.
    pub replacement: String,
}

impl TextEdit {
    /// Creates a replacement.
    pub fn replace(range: Range<usize>, replacement: impl Into<String>) -> Self {
        Self {
            range,
            replacement: replacement.into(),
        }
    }

    /// Creates an insertion before `at`.
    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::replace(at..at, text)
    }

    /// Creates a deletion.
    pub fn delete(range: Range<usize>) -> Self {
        Self::replace(range, String::new())
    }

    fn overlaps(&self, other: &Range<usize>) -> bool {
        let (a, b) = (self.range.start, self.range.end);
        let (c, d) = (other.start, other.end);
        (a < d && c < b) || (a == b && c == d && a == c)
    }
}

/// Accepted edits for one file.
#[derive(Debug, Default)]
pub struct EditSet {
    edits: Vec<TextEdit>,
}

impl EditSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `range` touches no accepted edit.
    pub fn is_free(&self, range: &Range<usize>) -> bool {
        !self.edits.iter().any(|e| e.overlaps(range))
    }

    /// Accepts `group` if none of its edits, nor `anchor`, overlap an
    /// accepted edit. Returns whether the group was accepted.
    pub fn try_accept(&mut self, anchor: &Range<usize>, group: Vec<TextEdit>) -> bool {
        if !self.is_free(anchor) || !group.iter().all(|e| self.is_free(&e.range)) {
            return false;
        }
        self.edits.extend(group);
        true
    }

    /// Number of accepted edits.
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Returns `true` if nothing was accepted.
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Splices the accepted edits into `source`.
    pub fn apply(mut self, source: &str) -> String {
        self.edits
            .sort_by_key(|e| (e.range.start, e.range.end));
        let mut out = String::with_capacity(source.len() + 256);
        let mut cursor = 0;
        for edit in &self.edits {
            if edit.range.start < cursor {
                continue;
            }
            out.push_str(source.get(cursor..edit.range.start).unwrap_or_default());
            out.push_str(&edit.replacement);
            cursor = edit.range.end;
        }
        out.push_str(source.get(cursor..).unwrap_or_default());
        out
    }
}

/// Byte range of the full line(s) holding `range` when nothing else shares
/// them, including the trailing newline; otherwise `range` itself.
pub fn line_extent(source: &str, range: &Range<usize>) -> Range<usize> {
    let line_start = source
        .get(..range.start)
        .and_then(|s| s.rfind('\n'))
        .map_or(0, |i| i + 1);
    let rest = source.get(range.end..).unwrap_or_default();
    let line_end = rest.find('\n').map_or(source.len(), |i| range.end + i + 1);

    let before = source.get(line_start..range.start).unwrap_or_default();
    let after = source.get(range.end..line_end).unwrap_or_default();
    if before.trim().is_empty() && after.trim().is_empty() {
        line_start..line_end
    } else {
        range.clone()
    }
}

/// Leading whitespace of the line containing `at`.
pub fn indentation(source: &str, at: usize) -> &str {
    let line_start = source
        .get(..at)
        .and_then(|s| s.rfind('\n'))
        .map_or(0, |i| i + 1);
    let line = source.get(line_start..).unwrap_or_default();
    let width = line.len() - line.trim_start_matches([' ', '\t']).len();
    &line[..width]
}

//! Immutable view over the template text.
//!
//! [`SourceText`] owns nothing but the text and a line-start index, so byte
//! access is O(1) and line/column lookup is a binary search.

use rowan::{TextRange, TextSize};

/// A zero-based line and column. The column counts bytes from the line start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

impl std::fmt::Display for LineCol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Humans count from one.
        write!(f, "{}:{}", self.line + 1, self.col + 1)
    }
}

/// The original source with a precomputed line index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText<'a> {
    text: &'a str,
    line_starts: Vec<TextSize>,
}

impl<'a> SourceText<'a> {
    pub fn new(text: &'a str) -> Self {
        assert!(
            u32::try_from(text.len()).is_ok(),
            "sources larger than 4GiB are not supported"
        );
        let bytes = text.as_bytes();
        let mut line_starts = vec![TextSize::from(0)];
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\r' if bytes.get(i + 1) == Some(&b'\n') => {
                    line_starts.push(TextSize::from((i + 2) as u32));
                    i += 2;
                    continue;
                }
                b'\r' | b'\n' => line_starts.push(TextSize::from((i + 1) as u32)),
                _ => {}
            }
            i += 1;
        }
        Self { text, line_starts }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The byte at `offset`, if any.
    pub fn byte_at(&self, offset: usize) -> Option<u8> {
        self.text.as_bytes().get(offset).copied()
    }

    /// The character starting at `offset`, if `offset` is on a char boundary.
    pub fn char_at(&self, offset: usize) -> Option<char> {
        self.text.get(offset..)?.chars().next()
    }

    /// Text covered by `range`.
    pub fn slice(&self, range: TextRange) -> &'a str {
        &self.text[range]
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Line and column of `offset`. Offsets past the end clamp to the end.
    pub fn line_col(&self, offset: TextSize) -> LineCol {
        let offset = offset.min(TextSize::of(self.text));
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        LineCol {
            line: line as u32,
            col: u32::from(offset - self.line_starts[line]),
        }
    }

    /// Inverse of [`line_col`](Self::line_col), if the position exists.
    pub fn offset(&self, pos: LineCol) -> Option<TextSize> {
        let start = *self.line_starts.get(pos.line as usize)?;
        let end = self
            .line_starts
            .get(pos.line as usize + 1)
            .copied()
            .unwrap_or_else(|| TextSize::of(self.text));
        let offset = start + TextSize::from(pos.col);
        (offset <= end).then_some(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn empty_source_has_one_line() {
        let source = SourceText::new("");
        assert_eq!(source.line_count(), 1);
        assert_eq!(source.line_col(TextSize::from(0)), LineCol { line: 0, col: 0 });
    }

    #[rstest]
    #[case(0, 0, 0)]
    #[case(2, 0, 2)]
    #[case(3, 0, 3)]
    #[case(4, 1, 0)]
    #[case(6, 1, 2)]
    #[case(8, 2, 0)]
    #[case(9, 3, 0)]
    #[case(10, 3, 1)]
    fn line_col_lookup(#[case] offset: u32, #[case] line: u32, #[case] col: u32) {
        // "abc\n" "de\r\n" "\r" "f"
        let source = SourceText::new("abc\nde\r\n\rf");
        assert_eq!(source.line_col(offset.into()), LineCol { line, col });
    }

    #[test]
    fn line_col_clamps_past_end() {
        let source = SourceText::new("ab\ncd");
        assert_eq!(source.line_col(TextSize::from(100)), LineCol { line: 1, col: 2 });
    }

    #[test]
    fn offset_roundtrip() {
        let source = SourceText::new("one\ntwo\nthree");
        for offset in 0..=source.len() as u32 {
            let pos = source.line_col(offset.into());
            assert_eq!(source.offset(pos), Some(offset.into()));
        }
        assert_eq!(source.offset(LineCol { line: 7, col: 0 }), None);
    }

    #[test]
    fn byte_and_char_access() {
        let source = SourceText::new("aé@");
        assert_eq!(source.byte_at(0), Some(b'a'));
        assert_eq!(source.char_at(1), Some('é'));
        assert_eq!(source.char_at(2), None);
        assert_eq!(source.char_at(3), Some('@'));
        assert_eq!(source.byte_at(4), None);
    }

    #[test]
    fn display_is_one_based() {
        assert_eq!(LineCol { line: 0, col: 4 }.to_string(), "1:5");
    }

    #[test]
    fn slice_by_range() {
        let source = SourceText::new("hello world");
        let range = TextRange::new(TextSize::from(6), TextSize::from(11));
        assert_eq!(source.slice(range), "world");
    }
}

//! Conversion between byte offsets and 1-based line/column positions.

use text_size::{TextRange, TextSize};

use super::position::{LineCol, LineColRange};

/// Line start table for one text.
///
/// The index does not own the text; every query takes the same text the index
/// was built from. Columns are counted in chars so that non-ASCII identifiers
/// line up with what an editor shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<TextSize>,
    len: TextSize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::new(0)];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(TextSize::new(i as u32 + 1));
            }
        }
        Self {
            line_starts,
            len: TextSize::of(text),
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    pub fn len(&self) -> TextSize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == TextSize::new(0)
    }

    /// Position of a byte offset. Offsets past the end clamp to the end.
    pub fn line_col(&self, text: &str, offset: TextSize) -> LineCol {
        let offset = offset.min(self.len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let start = self.line_starts[line];
        let column = text[usize::from(start)..usize::from(offset)].chars().count();
        LineCol::new(line as u32 + 1, column as u32 + 1)
    }

    /// Byte offset of a position.
    ///
    /// Lines past the end clamp to the end of the text, columns past the end of
    /// a line clamp to the line end (before its newline).
    pub fn offset(&self, text: &str, position: LineCol) -> TextSize {
        let line = position.line.max(1) as usize - 1;
        let Some(&start) = self.line_starts.get(line) else {
            return self.len;
        };
        let line_end = self.line_end(line);
        let line_text = &text[usize::from(start)..usize::from(line_end)];

        let wanted = position.column.max(1) as usize - 1;
        let byte = line_text
            .char_indices()
            .nth(wanted)
            .map(|(i, _)| i)
            .unwrap_or(line_text.len());
        start + TextSize::new(byte as u32)
    }

    pub fn to_line_col_range(&self, text: &str, range: TextRange) -> LineColRange {
        LineColRange::new(
            self.line_col(text, range.start()),
            self.line_col(text, range.end()),
        )
    }

    /// Offsets of a line/column range. A reversed range collapses to its start.
    pub fn to_text_range(&self, text: &str, range: LineColRange) -> TextRange {
        let start = self.offset(text, range.start);
        let end = self.offset(text, range.end).max(start);
        TextRange::new(start, end)
    }

    /// End of a line's content, excluding the newline.
    fn line_end(&self, line: usize) -> TextSize {
        match self.line_starts.get(line + 1) {
            Some(next) => *next - TextSize::new(1),
            None => self.len,
        }
    }
}

//! Line/column positions as exchanged with the GUI and the engine.
//!
//! Both lines and columns are 1-based. A range's end column is exclusive, so a
//! one-character diagnostic at the start of a text is `1:1..1:2`.

use serde::{Deserialize, Serialize};

/// A position in a text (1-based line and column, columns counted in chars)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LineCol {
    pub line: u32,
    pub column: u32,
}

/// A range of [`LineCol`] positions, end exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineColRange {
    pub start: LineCol,
    pub end: LineCol,
}

impl LineCol {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// The first position of any text.
    pub fn origin() -> Self {
        Self::new(1, 1)
    }
}

impl LineColRange {
    pub fn new(start: LineCol, end: LineCol) -> Self {
        Self { start, end }
    }

    /// Create a range from line/column coordinates
    pub fn from_coords(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start: LineCol::new(start_line, start_col),
            end: LineCol::new(end_line, end_col),
        }
    }

    /// Zero-width range at a position.
    pub fn empty(at: LineCol) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Check if a position falls within this range (end exclusive)
    pub fn contains(&self, position: LineCol) -> bool {
        self.start <= position && position < self.end
    }
}

impl std::fmt::Display for LineCol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl std::fmt::Display for LineColRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

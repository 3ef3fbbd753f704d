//! Back-maps: translating ranges of rewritten text onto the original text.
//!
//! Every edit yields a [`SimpleBackMap`] pairing the original range it
//! replaced with the range its new text occupies. A position outside all
//! edits is shifted by the length deltas of the edits before it; a position
//! inside an edit's new text snaps to that edit's original range. Advanced
//! maps, declared on individual edits, take precedence over this.

use text_size::{TextRange, TextSize};

use crate::base::{LineColRange, LineIndex};
use crate::diagnostics::Diagnostic;

/// Result of back-mapping one diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackMapOutcome {
    /// The diagnostic was changed.
    Applied,
    /// Nothing about the diagnostic needed to change.
    Unchanged,
    /// The diagnostic should be dropped.
    Discard,
}

/// Original and rewritten range of one edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimpleBackMap {
    pub original: TextRange,
    pub rewritten: TextRange,
}

impl SimpleBackMap {
    /// How much longer the rewritten range is than the original one.
    pub fn delta(&self) -> i64 {
        i64::from(u32::from(self.rewritten.len())) - i64::from(u32::from(self.original.len()))
    }
}

/// Original offset of a rewritten start position.
pub(crate) fn map_start(maps: &[SimpleBackMap], at: TextSize) -> TextSize {
    if let Some(map) = maps
        .iter()
        .find(|m| m.rewritten.start() <= at && at < m.rewritten.end())
    {
        return map.original.start();
    }
    let shift: i64 = maps
        .iter()
        .filter(|m| m.rewritten.end() <= at)
        .map(SimpleBackMap::delta)
        .sum();
    shifted(at, shift)
}

/// Original offset of a rewritten (exclusive) end position.
pub(crate) fn map_end(maps: &[SimpleBackMap], at: TextSize) -> TextSize {
    if let Some(map) = maps
        .iter()
        .find(|m| m.rewritten.start() < at && at <= m.rewritten.end())
    {
        return map.original.end();
    }
    let shift: i64 = maps
        .iter()
        .filter(|m| m.rewritten.end() < at)
        .map(SimpleBackMap::delta)
        .sum();
    shifted(at, shift)
}

/// Fold every simple map over `range`.
pub(crate) fn map_range(maps: &[SimpleBackMap], range: TextRange) -> TextRange {
    let start = map_start(maps, range.start());
    if range.is_empty() {
        return TextRange::empty(start);
    }
    let end = map_end(maps, range.end()).max(start);
    TextRange::new(start, end)
}

fn shifted(at: TextSize, shift: i64) -> TextSize {
    let offset = i64::from(u32::from(at)) - shift;
    TextSize::new(offset.max(0) as u32)
}

// ============================================================================
// CONTEXT FOR ADVANCED MAPS
// ============================================================================

/// Everything an advanced back-map's override functions can look at.
pub struct BackMapContext<'a> {
    pub(crate) diagnostic: &'a Diagnostic,
    pub(crate) error: TextRange,
    pub(crate) activation: TextRange,
    pub(crate) edit: SimpleBackMap,
    pub(crate) original: &'a str,
    pub(crate) original_index: &'a LineIndex,
    pub(crate) rewritten: &'a str,
}

impl<'a> BackMapContext<'a> {
    /// The diagnostic as reported against the rewritten text.
    pub fn diagnostic(&self) -> &'a Diagnostic {
        self.diagnostic
    }

    /// Error range in the rewritten text.
    pub fn error_range(&self) -> TextRange {
        self.error
    }

    /// Activation range in the rewritten text.
    pub fn activation_range(&self) -> TextRange {
        self.activation
    }

    /// Error range relative to the start of the edit's new text, clamped to it.
    pub fn relative_error_range(&self) -> TextRange {
        let new_text = self.edit.rewritten;
        let start = self.error.start().clamp(new_text.start(), new_text.end());
        let end = self.error.end().clamp(start, new_text.end());
        TextRange::new(start - new_text.start(), end - new_text.start())
    }

    /// The original text the edit covered.
    pub fn edit_original_range(&self) -> TextRange {
        self.edit.original
    }

    /// The range the edit's new text occupies in the rewritten text.
    pub fn edit_rewritten_range(&self) -> TextRange {
        self.edit.rewritten
    }

    pub fn original_text(&self) -> &'a str {
        self.original
    }

    pub fn rewritten_text(&self) -> &'a str {
        self.rewritten
    }

    /// The rewritten text the error covers.
    pub fn error_text(&self) -> &'a str {
        &self.rewritten[self.error]
    }

    /// Line/column form of a range of the original text.
    pub fn original_line_col(&self, range: TextRange) -> LineColRange {
        self.original_index.to_line_col_range(self.original, range)
    }

    /// Line/column range of the original text the edit covered.
    pub fn edit_line_col(&self) -> LineColRange {
        self.original_line_col(self.edit.original)
    }
}

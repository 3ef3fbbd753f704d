//! Error types for rewriting.

use text_size::{TextRange, TextSize};
use thiserror::Error;

use super::edit::EditSpan;

/// Errors raised by a [`Rewriter`](super::Rewriter).
///
/// All of them indicate a bug in the code driving the rewriter rather than a
/// problem with the text being rewritten.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RewriteError {
    #[error(transparent)]
    Overlap(#[from] OverlapViolation),

    /// The edit does not lie on character boundaries of the original text.
    #[error("edit {range:?} is outside the original text (length {len:?})")]
    OutOfBounds { range: TextRange, len: TextSize },

    /// An advanced back-map's activation range exceeds the edit's new text.
    #[error("activation {range:?} is outside the edit's new text (length {len:?})")]
    ActivationOutOfBounds { range: TextRange, len: TextSize },

    /// Back-mapping was requested with edits registered after the last compile.
    #[error("edits are pending since the last compile")]
    NotCompiled,
}

/// Two edits on the same text collide.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("{attempted} overlaps existing {existing}")]
pub struct OverlapViolation {
    pub existing: EditSpan,
    pub attempted: EditSpan,
}

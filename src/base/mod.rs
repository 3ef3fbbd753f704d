//! Foundation types for the mapper.
//!
//! This module provides the coordinate types used throughout the crate:
//! - [`TextRange`], [`TextSize`] - Byte offsets into a single text
//! - [`LineCol`], [`LineColRange`] - 1-based line/column positions as the GUI and engine see them
//! - [`LineIndex`] - Conversion between the two
//!
//! This module has NO dependencies on other mapper modules.

mod line_index;
mod position;

pub use line_index::LineIndex;
pub use position::{LineCol, LineColRange};

// Re-export text-size types for convenience
pub use text_size::{self, TextRange, TextSize};

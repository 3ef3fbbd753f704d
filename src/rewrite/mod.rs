//! Text rewriting with back-maps.
//!
//! A [`Rewriter`] owns one original text and collects insert, replace and
//! append edits against it. Edits may not overlap; a colliding edit is
//! rejected before anything changes. Compiling applies all edits at once and
//! derives back-maps, which translate diagnostics about the rewritten text
//! into diagnostics about the original:
//!
//! - a *simple* map per edit shifts ranges past the edit and snaps ranges
//!   inside its new text onto the text it replaced;
//! - *advanced* maps, declared on an edit with [`Edit::add_back_map`], match
//!   an activation range by an [`ActivationRule`] and can override the range,
//!   path, message and context of a diagnostic, or discard it.
//!
//! Diagnostics that land entirely in appended text keep their message with a
//! "generated code" caveat and point at the end of the original text.

mod back_map;
mod edit;
mod error;
mod rewriter;

pub use back_map::{BackMapContext, BackMapOutcome, SimpleBackMap};
pub use edit::{ActivationRule, AdvancedBackMap, Edit, EditSpan};
pub use error::{OverlapViolation, RewriteError};
pub use rewriter::{DEFAULT_GENERATED_CODE_NOTE, Rewriter};

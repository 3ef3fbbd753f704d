//! Edits and the advanced back-maps attached to them.

use std::fmt;

use text_size::{TextRange, TextSize};

use super::back_map::BackMapContext;
use super::error::RewriteError;
use crate::base::LineColRange;

pub(crate) type RangeFn = Box<dyn Fn(&BackMapContext<'_>) -> LineColRange>;
pub(crate) type TextFn = Box<dyn Fn(&BackMapContext<'_>) -> String>;
pub(crate) type PredicateFn = Box<dyn Fn(&BackMapContext<'_>) -> bool>;

// ============================================================================
// EDIT SPANS
// ============================================================================

/// Where an edit applies in the original text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditSpan {
    Insert(TextSize),
    Replace(TextRange),
    /// After the end of the text.
    Append,
}

impl EditSpan {
    /// The original text the edit covers; `len` is the original text length.
    pub fn original_range(&self, len: TextSize) -> TextRange {
        match *self {
            EditSpan::Insert(at) => TextRange::empty(at),
            EditSpan::Replace(range) => range,
            EditSpan::Append => TextRange::empty(len),
        }
    }

    /// Whether two edits may not both be applied.
    ///
    /// Inserts collide only with a replace that strictly contains them; an
    /// insert on a replace boundary lands before or after the replacement.
    /// Appends never collide.
    pub fn overlaps(&self, other: &EditSpan) -> bool {
        match (*self, *other) {
            (EditSpan::Append, _) | (_, EditSpan::Append) => false,
            (EditSpan::Insert(_), EditSpan::Insert(_)) => false,
            (EditSpan::Insert(at), EditSpan::Replace(range))
            | (EditSpan::Replace(range), EditSpan::Insert(at)) => range.start() < at && at < range.end(),
            (EditSpan::Replace(a), EditSpan::Replace(b)) => a.start() < b.end() && b.start() < a.end(),
        }
    }
}

impl fmt::Display for EditSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditSpan::Insert(at) => write!(f, "insert at {}", u32::from(*at)),
            EditSpan::Replace(range) => write!(f, "replace {range:?}"),
            EditSpan::Append => f.write_str("append"),
        }
    }
}

// ============================================================================
// ACTIVATION RULES
// ============================================================================

/// Geometric test deciding whether an advanced back-map applies to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivationRule {
    /// The error range equals the activation range.
    Exact,
    ErrorContainsActivation,
    ActivationContainsError,
    EitherContainsOther,
    /// The ranges share at least one position. An empty range intersects a
    /// range that contains its position.
    Intersects,
}

impl ActivationRule {
    pub fn applies(&self, activation: TextRange, error: TextRange) -> bool {
        match self {
            ActivationRule::Exact => activation == error,
            ActivationRule::ErrorContainsActivation => error.contains_range(activation),
            ActivationRule::ActivationContainsError => activation.contains_range(error),
            ActivationRule::EitherContainsOther => {
                error.contains_range(activation) || activation.contains_range(error)
            }
            ActivationRule::Intersects => intersects(activation, error),
        }
    }
}

fn intersects(a: TextRange, b: TextRange) -> bool {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => a == b,
        (true, false) => b.contains(a.start()),
        (false, true) => a.contains(b.start()),
        (false, false) => a.start() < b.end() && b.start() < a.end(),
    }
}

// ============================================================================
// ADVANCED BACK-MAPS
// ============================================================================

/// An explicit back-map attached to an edit.
///
/// The activation range is relative to the edit's new text and becomes
/// absolute when the rewriter compiles. Among the maps whose rule applies to a
/// diagnostic, the highest priority wins; on a tie the one registered first
/// wins.
pub struct AdvancedBackMap {
    pub(crate) activation: TextRange,
    pub(crate) rule: ActivationRule,
    pub(crate) priority: i32,
    pub(crate) range: RangeFn,
    pub(crate) path: Option<TextFn>,
    pub(crate) message: Option<TextFn>,
    pub(crate) context: Option<TextFn>,
    pub(crate) discard: Option<PredicateFn>,
}

impl AdvancedBackMap {
    pub fn activation(&self) -> TextRange {
        self.activation
    }

    pub fn rule(&self) -> ActivationRule {
        self.rule
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn with_priority(&mut self, priority: i32) -> &mut Self {
        self.priority = priority;
        self
    }

    pub fn override_error_path(
        &mut self,
        path: impl Fn(&BackMapContext<'_>) -> String + 'static,
    ) -> &mut Self {
        self.path = Some(Box::new(path));
        self
    }

    pub fn override_error_message(
        &mut self,
        message: impl Fn(&BackMapContext<'_>) -> String + 'static,
    ) -> &mut Self {
        self.message = Some(Box::new(message));
        self
    }

    pub fn override_error_context(
        &mut self,
        context: impl Fn(&BackMapContext<'_>) -> String + 'static,
    ) -> &mut Self {
        self.context = Some(Box::new(context));
        self
    }

    /// Drop matching diagnostics for which `predicate` holds.
    pub fn discard_error(
        &mut self,
        predicate: impl Fn(&BackMapContext<'_>) -> bool + 'static,
    ) -> &mut Self {
        self.discard = Some(Box::new(predicate));
        self
    }
}

impl fmt::Debug for AdvancedBackMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdvancedBackMap")
            .field("activation", &self.activation)
            .field("rule", &self.rule)
            .field("priority", &self.priority)
            .field("overrides_path", &self.path.is_some())
            .field("overrides_message", &self.message.is_some())
            .field("overrides_context", &self.context.is_some())
            .field("discards", &self.discard.is_some())
            .finish()
    }
}

// ============================================================================
// EDITS
// ============================================================================

/// One registered edit. Returned by the rewriter so back-maps can be attached.
#[derive(Debug)]
pub struct Edit {
    pub(crate) span: EditSpan,
    pub(crate) text: String,
    pub(crate) back_maps: Vec<AdvancedBackMap>,
}

impl Edit {
    pub(crate) fn new(span: EditSpan, text: String) -> Self {
        Self {
            span,
            text,
            back_maps: Vec::new(),
        }
    }

    pub fn span(&self) -> EditSpan {
        self.span
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn back_maps(&self) -> &[AdvancedBackMap] {
        &self.back_maps
    }

    /// Attach an advanced back-map activated on `activation`, a range of this
    /// edit's new text. `range` computes the mapped error range.
    pub fn add_back_map(
        &mut self,
        activation: TextRange,
        rule: ActivationRule,
        range: impl Fn(&BackMapContext<'_>) -> LineColRange + 'static,
    ) -> Result<&mut AdvancedBackMap, RewriteError> {
        let len = TextSize::of(self.text.as_str());
        if activation.end() > len {
            return Err(RewriteError::ActivationOutOfBounds {
                range: activation,
                len,
            });
        }
        self.back_maps.push(AdvancedBackMap {
            activation,
            rule,
            priority: 0,
            range: Box::new(range),
            path: None,
            message: None,
            context: None,
            discard: None,
        });
        let last = self.back_maps.len() - 1;
        Ok(&mut self.back_maps[last])
    }
}

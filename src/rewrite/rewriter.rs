use text_size::{TextRange, TextSize};

use super::back_map::{self, BackMapContext, BackMapOutcome, SimpleBackMap};
use super::edit::{Edit, EditSpan};
use super::error::{OverlapViolation, RewriteError};
use crate::base::{LineColRange, LineIndex};
use crate::diagnostics::Diagnostic;

/// Caveat added to diagnostics that land in appended text.
pub const DEFAULT_GENERATED_CODE_NOTE: &str = "(in generated code)";

/// Batch editor over one immutable original text.
///
/// Edits are validated against each other when registered and applied
/// together when the rewritten text is requested. Compiling also derives the
/// back-maps used by [`Rewriter::back_map_diagnostic`].
#[derive(Debug)]
pub struct Rewriter {
    original: String,
    original_index: LineIndex,
    edits: Vec<Edit>,
    compiled: Compiled,
    pending: bool,
    generated_code_note: String,
}

#[derive(Debug)]
struct Compiled {
    text: String,
    index: LineIndex,
    /// Per edit, in rewritten order.
    maps: Vec<SimpleBackMap>,
    /// Start of appended text, if anything was appended.
    appended: Option<TextSize>,
    anchors: Vec<Anchor>,
}

/// An advanced back-map resolved to absolute coordinates.
#[derive(Debug, Clone, Copy)]
struct Anchor {
    edit: usize,
    map: usize,
    activation: TextRange,
    edit_map: SimpleBackMap,
}

impl Compiled {
    fn identity(original: &str, index: &LineIndex) -> Self {
        Self {
            text: original.to_string(),
            index: index.clone(),
            maps: Vec::new(),
            appended: None,
            anchors: Vec::new(),
        }
    }
}

impl Rewriter {
    pub fn new(original: impl Into<String>) -> Self {
        let original = original.into();
        let original_index = LineIndex::new(&original);
        let compiled = Compiled::identity(&original, &original_index);
        Self {
            original,
            original_index,
            edits: Vec::new(),
            compiled,
            pending: false,
            generated_code_note: DEFAULT_GENERATED_CODE_NOTE.to_string(),
        }
    }

    pub fn with_generated_code_note(mut self, note: impl Into<String>) -> Self {
        self.generated_code_note = note.into();
        self
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    pub fn has_edits(&self) -> bool {
        !self.edits.is_empty()
    }

    /// Whether the last compile reflects every registered edit.
    pub fn is_compiled(&self) -> bool {
        !self.pending
    }

    // ========================================================================
    // EDITS
    // ========================================================================

    /// Insert `text` before the original offset `at`.
    pub fn insert(&mut self, at: TextSize, text: impl Into<String>) -> Result<&mut Edit, RewriteError> {
        self.check_bounds(TextRange::empty(at))?;
        self.register(EditSpan::Insert(at), text.into())
    }

    /// Replace the original `range` with `text`.
    pub fn replace(&mut self, range: TextRange, text: impl Into<String>) -> Result<&mut Edit, RewriteError> {
        self.check_bounds(range)?;
        self.register(EditSpan::Replace(range), text.into())
    }

    /// Add `text` after the end of the original text. Appends never overlap.
    pub fn append(&mut self, text: impl Into<String>) -> &mut Edit {
        self.push(EditSpan::Append, text.into())
    }

    fn check_bounds(&self, range: TextRange) -> Result<(), RewriteError> {
        let len = TextSize::of(self.original.as_str());
        let on_boundary = |at: TextSize| self.original.is_char_boundary(usize::from(at));
        if range.end() > len || !on_boundary(range.start()) || !on_boundary(range.end()) {
            return Err(RewriteError::OutOfBounds { range, len });
        }
        Ok(())
    }

    fn register(&mut self, span: EditSpan, text: String) -> Result<&mut Edit, RewriteError> {
        if let Some(existing) = self.edits.iter().find(|edit| edit.span.overlaps(&span)) {
            let violation = OverlapViolation {
                existing: existing.span,
                attempted: span,
            };
            tracing::warn!(%violation, "overlapping edit rejected");
            return Err(violation.into());
        }
        Ok(self.push(span, text))
    }

    fn push(&mut self, span: EditSpan, text: String) -> &mut Edit {
        self.pending = true;
        self.edits.push(Edit::new(span, text));
        let last = self.edits.len() - 1;
        &mut self.edits[last]
    }

    // ========================================================================
    // COMPILATION
    // ========================================================================

    /// The rewritten text, compiling pending edits first.
    pub fn rewritten_text(&mut self) -> &str {
        if self.pending {
            self.compile();
        }
        &self.compiled.text
    }

    fn compile(&mut self) {
        let len = TextSize::of(self.original.as_str());

        let mut order: Vec<usize> = (0..self.edits.len())
            .filter(|&i| self.edits[i].span != EditSpan::Append)
            .collect();
        order.sort_by_key(|&i| {
            let range = self.edits[i].span.original_range(len);
            (range.start(), range.end(), i)
        });

        let mut text = String::with_capacity(self.original.len());
        let mut maps = Vec::with_capacity(self.edits.len());
        let mut anchors = Vec::new();
        let mut pos = TextSize::new(0);

        for &i in &order {
            let edit = &self.edits[i];
            let original = edit.span.original_range(len);
            text.push_str(&self.original[TextRange::new(pos, original.start())]);
            let map = place(&mut text, edit, original);
            maps.push(map);
            anchors.extend(resolve_anchors(i, edit, map));
            pos = original.end();
        }
        text.push_str(&self.original[TextRange::new(pos, len)]);

        let appended_start = TextSize::of(text.as_str());
        for (i, edit) in self.edits.iter().enumerate() {
            if edit.span == EditSpan::Append {
                let map = place(&mut text, edit, TextRange::empty(len));
                maps.push(map);
                anchors.extend(resolve_anchors(i, edit, map));
            }
        }
        let appended = (TextSize::of(text.as_str()) > appended_start).then_some(appended_start);

        tracing::trace!(edits = self.edits.len(), "rewriter compiled");
        self.compiled = Compiled {
            index: LineIndex::new(&text),
            text,
            maps,
            appended,
            anchors,
        };
        self.pending = false;
    }

    // ========================================================================
    // BACK-MAPPING
    // ========================================================================

    /// Map a range of the compiled text onto the original text using only the
    /// simple back-maps.
    pub fn map_range(&self, range: TextRange) -> Result<TextRange, RewriteError> {
        self.ensure_compiled()?;
        Ok(back_map::map_range(&self.compiled.maps, range))
    }

    /// Translate a diagnostic about the compiled text into one about the
    /// original text, in place.
    pub fn back_map_diagnostic(&self, diagnostic: &mut Diagnostic) -> Result<BackMapOutcome, RewriteError> {
        self.ensure_compiled()?;
        let compiled = &self.compiled;
        let error = compiled.index.to_text_range(&compiled.text, diagnostic.range);

        if let Some(anchor) = self.select_anchor(error) {
            let map = &self.edits[anchor.edit].back_maps[anchor.map];
            let context = BackMapContext {
                diagnostic: &*diagnostic,
                error,
                activation: anchor.activation,
                edit: anchor.edit_map,
                original: &self.original,
                original_index: &self.original_index,
                rewritten: &compiled.text,
            };
            if map.discard.as_ref().is_some_and(|discard| discard(&context)) {
                return Ok(BackMapOutcome::Discard);
            }
            let range = (map.range)(&context);
            let path = map.path.as_ref().map(|f| f(&context));
            let message = map.message.as_ref().map(|f| f(&context));
            let note = map.context.as_ref().map(|f| f(&context));

            diagnostic.range = range;
            if let Some(path) = path {
                diagnostic.path = path;
            }
            if let Some(message) = message {
                diagnostic.message = message;
            }
            if let Some(note) = note {
                diagnostic.context = note;
            }
            return Ok(BackMapOutcome::Applied);
        }

        if let Some(start) = compiled.appended {
            if error.start() >= start && error.end() > start {
                let end = self
                    .original_index
                    .line_col(&self.original, TextSize::of(self.original.as_str()));
                diagnostic.range = LineColRange::empty(end);
                if !diagnostic.message.is_empty() {
                    diagnostic.message.push(' ');
                }
                diagnostic.message.push_str(&self.generated_code_note);
                return Ok(BackMapOutcome::Applied);
            }
        }

        let mapped = back_map::map_range(&compiled.maps, error);
        let range = self.original_index.to_line_col_range(&self.original, mapped);
        if range == diagnostic.range {
            return Ok(BackMapOutcome::Unchanged);
        }
        diagnostic.range = range;
        Ok(BackMapOutcome::Applied)
    }

    fn ensure_compiled(&self) -> Result<(), RewriteError> {
        if self.pending {
            tracing::warn!("back-map requested against a stale compile");
            return Err(RewriteError::NotCompiled);
        }
        Ok(())
    }

    /// Highest-priority applicable advanced map; ties go to the first registered.
    fn select_anchor(&self, error: TextRange) -> Option<Anchor> {
        let mut best: Option<(Anchor, i32)> = None;
        for anchor in &self.compiled.anchors {
            let map = &self.edits[anchor.edit].back_maps[anchor.map];
            if !map.rule.applies(anchor.activation, error) {
                continue;
            }
            let better = match best {
                None => true,
                Some((current, priority)) => {
                    map.priority > priority
                        || (map.priority == priority && (anchor.edit, anchor.map) < (current.edit, current.map))
                }
            };
            if better {
                best = Some((*anchor, map.priority));
            }
        }
        best.map(|(anchor, _)| anchor)
    }
}

/// Append an edit's text and return its map.
fn place(text: &mut String, edit: &Edit, original: TextRange) -> SimpleBackMap {
    let start = TextSize::of(text.as_str());
    text.push_str(&edit.text);
    SimpleBackMap {
        original,
        rewritten: TextRange::new(start, TextSize::of(text.as_str())),
    }
}

fn resolve_anchors(edit_index: usize, edit: &Edit, map: SimpleBackMap) -> impl Iterator<Item = Anchor> + '_ {
    edit.back_maps.iter().enumerate().map(move |(i, back_map)| Anchor {
        edit: edit_index,
        map: i,
        activation: back_map.activation + map.rewritten.start(),
        edit_map: map,
    })
}

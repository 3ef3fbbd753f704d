//! What a phase callback sees of the element it visits.

use indexmap::IndexMap;
use text_size::TextRange;

use crate::base::{LineColRange, LineIndex};
use crate::diagnostics::{Diagnostic, ElementKind, ElementPath, Severity};
use crate::document::Element;
use crate::grammar::{Matcher, ParseTree};
use crate::rewrite::Rewriter;

use super::error::VisitError;

pub type VisitResult = Result<(), VisitError>;

/// Pass-wide settings handed to every visit.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PassOptions<'a> {
    pub(crate) generated_code_note: &'a str,
    pub(crate) max_match_depth: Option<usize>,
}

/// One element visit.
///
/// The element's text is read-only here; edits go through
/// [`Visit::rewriter`] and become the element's new text once every callback
/// for the element has run.
pub struct Visit<'a> {
    path: &'a ElementPath,
    element: &'a Element,
    rewriters: &'a mut IndexMap<String, Rewriter>,
    diagnostics: &'a mut Vec<Diagnostic>,
    phase_index: usize,
    options: PassOptions<'a>,
}

impl<'a> Visit<'a> {
    pub(crate) fn new(
        path: &'a ElementPath,
        element: &'a Element,
        rewriters: &'a mut IndexMap<String, Rewriter>,
        diagnostics: &'a mut Vec<Diagnostic>,
        phase_index: usize,
        options: PassOptions<'a>,
    ) -> Self {
        Self {
            path,
            element,
            rewriters,
            diagnostics,
            phase_index,
            options,
        }
    }

    pub fn path(&self) -> &ElementPath {
        self.path
    }

    pub fn kind(&self) -> ElementKind {
        self.element.kind()
    }

    pub fn element(&self) -> &Element {
        self.element
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.element.attribute(key)
    }

    /// The element's text as this phase received it.
    pub fn text(&self) -> &str {
        &self.element.text
    }

    pub fn phase_index(&self) -> usize {
        self.phase_index
    }

    /// The rewriter for this element, created on first use.
    pub fn rewriter(&mut self) -> &mut Rewriter {
        let element = self.element;
        let note = self.options.generated_code_note;
        self.rewriters
            .entry(self.path.key())
            .or_insert_with(|| Rewriter::new(element.text.as_str()).with_generated_code_note(note))
    }

    /// Line/column form of a range of [`Visit::text`].
    pub fn line_col_range(&self, range: TextRange) -> LineColRange {
        let text = self.text();
        LineIndex::new(text).to_line_col_range(text, range)
    }

    /// A diagnostic about `range` of this element's text.
    pub fn diagnostic(&self, severity: Severity, range: TextRange, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(severity, self.path.key(), self.line_col_range(range), message)
            .with_phase_index(self.phase_index)
    }

    /// Record a diagnostic without stopping the visit.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        let diagnostic = self.adopt(diagnostic);
        self.diagnostics.push(diagnostic);
    }

    /// Match the whole text with `matcher`, under the configured depth
    /// bound if there is one. A failure becomes a rejection at the furthest token the match
    /// reached.
    pub fn parse(&self, matcher: &Matcher<'_>, severity: Severity) -> Result<ParseTree, Diagnostic> {
        let text = self.text();
        let matcher = match self.options.max_match_depth {
            Some(depth) => matcher.with_max_depth(depth),
            None => *matcher,
        };
        matcher.try_match(text).map_err(|range| {
            let message = if range.is_empty() {
                format!("expected {} but the text ended", matcher.rule_name())
            } else {
                format!("unexpected `{}` in {}", &text[range], matcher.rule_name())
            };
            self.diagnostic(severity, range, message)
        })
    }

    /// Stamp a diagnostic with this phase and, when it has none, this path.
    pub(crate) fn adopt(&self, diagnostic: Diagnostic) -> Diagnostic {
        let diagnostic = diagnostic.with_phase_index(self.phase_index);
        if diagnostic.path.is_empty() {
            diagnostic.with_path(self.path.key())
        } else {
            diagnostic
        }
    }
}

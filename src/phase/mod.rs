//! Phases: ordered, self-contained transformation steps.
//!
//! A model phase registers callbacks for element kinds in a
//! [`VisitorTable`]. The mapper walks the document once per phase and calls
//! every matching callback with a [`Visit`]. A phase owns one
//! [`Rewriter`] per element path it edits, and later uses those rewriters to
//! map diagnostics about its output back onto its input.
//!
//! ```rust,ignore
//! struct Channels;
//!
//! impl ModelPhase for Channels {
//!     fn name(&self) -> &str {
//!         "channels"
//!     }
//!
//!     fn visitors(&self) -> VisitorTable<Self> {
//!         VisitorTable::new()
//!             .on(ElementKind::Declaration, Channels::declaration)
//!             .on_filtered(ElementKind::Label, PathFilter::ParentIs(ElementKind::Transition), Channels::label)
//!     }
//! }
//! ```

mod context;
mod error;
mod query;
mod visitor;

pub(crate) use context::PassOptions;
pub use context::{Visit, VisitResult};
pub use error::{MapperError, VisitError};
pub use query::{QUERY_PATH, QueryPhase, SimulatorPhase};
pub use visitor::{PathFilter, VisitFn, VisitorTable};

use std::fmt;

use indexmap::IndexMap;

use crate::diagnostics::{Diagnostic, ElementPath};
use crate::document::Element;
use crate::rewrite::{BackMapOutcome, RewriteError, Rewriter};

/// A transformation over the model document.
pub trait ModelPhase: 'static {
    fn name(&self) -> &str;

    /// Callbacks for this phase. Read once, when the phase is registered.
    fn visitors(&self) -> VisitorTable<Self>
    where
        Self: Sized;

    /// Called before each pass. Phases drop per-pass state here.
    fn begin_pass(&mut self) {}
}

/// A registered model phase with its callbacks and per-pass rewriters.
pub struct PhaseHandle {
    slot: Box<dyn ErasedPhase>,
}

impl PhaseHandle {
    pub fn new<P: ModelPhase>(phase: P) -> Self {
        let table = phase.visitors();
        Self {
            slot: Box::new(PhaseSlot {
                phase,
                table,
                index: 0,
                rewriters: IndexMap::new(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        self.slot.name()
    }

    pub fn index(&self) -> usize {
        self.slot.index()
    }

    /// The rewriter this phase used for the element at `path`, if any.
    pub fn rewriter(&self, path: &str) -> Option<&Rewriter> {
        self.slot.rewriter(path)
    }

    pub(crate) fn begin_pass(&mut self, index: usize) {
        self.slot.begin_pass(index);
    }

    /// Run every matching callback on one element, then replace its text
    /// with the rewritten text.
    pub(crate) fn visit(
        &mut self,
        path: &ElementPath,
        element: &mut Element,
        diagnostics: &mut Vec<Diagnostic>,
        options: PassOptions<'_>,
    ) -> Result<(), MapperError> {
        self.slot.visit(path, element, diagnostics, options)
    }

    /// Map a diagnostic about this phase's output onto its input.
    pub(crate) fn back_map(&self, diagnostic: &mut Diagnostic) -> Result<BackMapOutcome, RewriteError> {
        match self.slot.rewriter(&diagnostic.path) {
            Some(rewriter) => rewriter.back_map_diagnostic(diagnostic),
            None => Ok(BackMapOutcome::Unchanged),
        }
    }

    pub(crate) fn invalidate(&mut self) {
        self.slot.invalidate();
    }
}

impl fmt::Debug for PhaseHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhaseHandle")
            .field("name", &self.slot.name())
            .field("index", &self.slot.index())
            .finish()
    }
}

trait ErasedPhase {
    fn name(&self) -> &str;
    fn index(&self) -> usize;
    fn rewriter(&self, path: &str) -> Option<&Rewriter>;
    fn begin_pass(&mut self, index: usize);
    fn visit(
        &mut self,
        path: &ElementPath,
        element: &mut Element,
        diagnostics: &mut Vec<Diagnostic>,
        options: PassOptions<'_>,
    ) -> Result<(), MapperError>;
    fn invalidate(&mut self);
}

struct PhaseSlot<P> {
    phase: P,
    table: VisitorTable<P>,
    index: usize,
    rewriters: IndexMap<String, Rewriter>,
}

impl<P: ModelPhase> ErasedPhase for PhaseSlot<P> {
    fn name(&self) -> &str {
        self.phase.name()
    }

    fn index(&self) -> usize {
        self.index
    }

    fn rewriter(&self, path: &str) -> Option<&Rewriter> {
        self.rewriters.get(path)
    }

    fn begin_pass(&mut self, index: usize) {
        self.index = index;
        self.rewriters.clear();
        self.phase.begin_pass();
    }

    fn visit(
        &mut self,
        path: &ElementPath,
        element: &mut Element,
        diagnostics: &mut Vec<Diagnostic>,
        options: PassOptions<'_>,
    ) -> Result<(), MapperError> {
        let kind = element.kind();
        let mut callbacks = self.table.callbacks(kind, path).peekable();
        if callbacks.peek().is_none() {
            return Ok(());
        }

        {
            let mut visit = Visit::new(
                path,
                element,
                &mut self.rewriters,
                diagnostics,
                self.index,
                options,
            );
            for callback in callbacks {
                match callback(&mut self.phase, &mut visit) {
                    Ok(()) => {}
                    Err(VisitError::Rejected(diagnostic)) => {
                        let fatal = diagnostic.is_unrecoverable();
                        visit.report(diagnostic);
                        if fatal {
                            break;
                        }
                    }
                    Err(VisitError::Fault(error)) => return Err(error),
                }
            }
        }

        if let Some(rewriter) = self.rewriters.get_mut(&path.key()) {
            if rewriter.has_edits() {
                element.text = rewriter.rewritten_text().to_string();
            }
        }
        Ok(())
    }

    fn invalidate(&mut self) {
        self.rewriters.clear();
    }
}

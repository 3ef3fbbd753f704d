//! Errors raised while phases run.

use thiserror::Error;

use crate::diagnostics::Diagnostic;
use crate::document::DocumentError;
use crate::grammar::GrammarCompileError;
use crate::rewrite::RewriteError;

/// A fault: something went wrong that no diagnostic can describe. Faults
/// abort the pass and invalidate every phase's state.
#[derive(Debug, Error)]
pub enum MapperError {
    #[error("rewrite failed: {0}")]
    Rewrite(#[from] RewriteError),

    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    #[error("grammar error: {0}")]
    Grammar(#[from] GrammarCompileError),

    #[error("phase `{phase}` failed: {message}")]
    Runtime { phase: String, message: String },
}

impl MapperError {
    pub fn runtime(phase: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Runtime {
            phase: phase.into(),
            message: message.into(),
        }
    }
}

/// Why a visit did not complete.
#[derive(Debug, Error)]
pub enum VisitError {
    /// The phase could not understand its input. Reported as a diagnostic.
    #[error("{0}")]
    Rejected(Diagnostic),

    #[error(transparent)]
    Fault(#[from] MapperError),
}

impl From<Diagnostic> for VisitError {
    fn from(diagnostic: Diagnostic) -> Self {
        Self::Rejected(diagnostic)
    }
}

impl From<RewriteError> for VisitError {
    fn from(error: RewriteError) -> Self {
        Self::Fault(error.into())
    }
}

use thiserror::Error;

use crate::diagnostics::Diagnostic;

/// A query could not be translated. The diagnostic is already mapped back
/// onto the query as the user wrote it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("query rejected: {diagnostic}")]
pub struct QueryRejection {
    pub diagnostic: Diagnostic,
}

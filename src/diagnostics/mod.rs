//! Diagnostics: errors and warnings about a model or query.
//!
//! A [`Diagnostic`] is plain data. Phases produce them when they reject input,
//! the engine produces them about translated text, and the mapper folds every
//! one of them back onto the user's original text. The [`ElementPath`] in a
//! diagnostic ties it to the document element whose text it is about.

mod path;

pub use path::{ElementKind, ElementPath, PathSegment};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::base::LineColRange;

/// Phase index carried by diagnostics that come from the engine. It is larger
/// than every real phase index, so every phase maps them back.
pub const ENGINE_PHASE_INDEX: usize = usize::MAX;

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// How a diagnostic affects the pass that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational.
    Warning,
    /// An error that still lets the pass continue.
    NonBreaking,
    /// Stops the remaining phases; the engine is not invoked.
    Unrecoverable,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Warning => "warning",
            Severity::NonBreaking => "error",
            Severity::Unrecoverable => "fatal",
        })
    }
}

/// A diagnostic about a range of one element's text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Canonical [`ElementPath`] string of the element the range refers to.
    pub path: String,
    /// 1-based, end-exclusive range within the element's text.
    pub range: LineColRange,
    pub message: String,
    pub context: String,
    pub severity: Severity,
    /// Index of the phase that introduced the diagnostic.
    pub phase_index: usize,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        path: impl Into<String>,
        range: LineColRange,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            range,
            message: message.into(),
            context: String::new(),
            severity,
            phase_index: ENGINE_PHASE_INDEX,
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(path: impl Into<String>, range: LineColRange, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, path, range, message)
    }

    /// Create a new error diagnostic that lets the pass continue.
    pub fn non_breaking(path: impl Into<String>, range: LineColRange, message: impl Into<String>) -> Self {
        Self::new(Severity::NonBreaking, path, range, message)
    }

    /// Create a new error diagnostic that aborts the pass.
    pub fn unrecoverable(path: impl Into<String>, range: LineColRange, message: impl Into<String>) -> Self {
        Self::new(Severity::Unrecoverable, path, range, message)
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn with_phase_index(mut self, phase_index: usize) -> Self {
        self.phase_index = phase_index;
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_range(mut self, range: LineColRange) -> Self {
        self.range = range;
        self
    }

    pub fn is_unrecoverable(&self) -> bool {
        self.severity == Severity::Unrecoverable
    }

    pub fn is_from_engine(&self) -> bool {
        self.phase_index == ENGINE_PHASE_INDEX
    }
}

/// `severity path:line:col: message`
impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}:{}: {}",
            self.severity, self.path, self.range.start, self.message
        )
    }
}

// ============================================================================
// WIRE FORMAT
// ============================================================================

/// The diagnostic shape exchanged with the GUI and the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDiagnostic {
    pub path: String,
    pub begin_line: u32,
    pub begin_column: u32,
    pub end_line: u32,
    /// Exclusive.
    pub end_column: u32,
    pub message: String,
    pub context: String,
}

impl Diagnostic {
    pub fn to_wire(&self) -> WireDiagnostic {
        WireDiagnostic {
            path: self.path.clone(),
            begin_line: self.range.start.line,
            begin_column: self.range.start.column,
            end_line: self.range.end.line,
            end_column: self.range.end.column,
            message: self.message.clone(),
            context: self.context.clone(),
        }
    }

    /// An engine diagnostic received over the wire.
    pub fn from_wire(wire: WireDiagnostic) -> Self {
        let range = LineColRange::from_coords(
            wire.begin_line,
            wire.begin_column,
            wire.end_line,
            wire.end_column,
        );
        Self::new(Severity::NonBreaking, wire.path, range, wire.message).with_context(wire.context)
    }

    pub fn to_wire_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_wire())
    }
}

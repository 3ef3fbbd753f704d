//! # sugar-mapper
//!
//! Translation layer between a modeling-tool GUI and its verification engine.
//! Sugared model and query syntax is rewritten into the engine's native syntax,
//! and every diagnostic the engine reports is mapped back onto the text the
//! user actually wrote.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! mapper      → Orchestrator: plugins, model/query passes, session, fault dumps
//!   ↓
//! phase       → Model/query/simulator phases, visitor tables, visit context
//!   ↓
//! document    → Element tree, XML reader/writer, pre-order walk
//!   ↓
//! rewrite     → Rewriter, simple and advanced back-maps
//!   ↓
//! diagnostics → Diagnostic, Severity, ElementPath
//!   ↓
//! grammar     → EBNF-like grammar compiler, tokenizer, matcher, ParseTree
//!   ↓
//! base        → Primitives (TextRange, LineCol, LineIndex)
//! ```

// ============================================================================
// MODULES (dependency order: base → grammar → diagnostics → rewrite → document → phase → mapper)
// ============================================================================

/// Foundation types: TextRange, LineCol, LineIndex
pub mod base;

/// Grammar engine: compile a grammar description, match and search text
pub mod grammar;

/// Diagnostics and element paths
pub mod diagnostics;

/// Batch text rewriting with back-maps
pub mod rewrite;

/// Structured model document
pub mod document;

/// Transformation phases and visitor dispatch
pub mod phase;

/// Orchestrator: runs phases and folds diagnostics back
pub mod mapper;

// Re-export foundation types
pub use base::{LineCol, LineColRange, LineIndex, TextRange, TextSize};
pub use diagnostics::{Diagnostic, ElementKind, ElementPath, Severity};
pub use document::Document;
pub use grammar::{Grammar, GrammarCompileError, ParseTree};
pub use mapper::{Mapper, MapperConfig, MapperError, ModelOutcome, Plugin, QueryRejection};
pub use phase::{ModelPhase, PathFilter, PhaseHandle, QueryPhase, SimulatorPhase, Visit, VisitResult, VisitorTable};
pub use rewrite::{ActivationRule, BackMapOutcome, RewriteError, Rewriter};

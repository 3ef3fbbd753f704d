//! Grammar engine.
//!
//! A grammar description is compiled once into an immutable [`Grammar`] and
//! then used to match text exactly, to find the next match, or to iterate over
//! all matches:
//!
//! ```text
//! // rules: Name :== expr .
//! Sum :== INT '+' INT .
//! // terminals: NAME = 'literal' or NAME = regex
//! INT = [0-9]+
//! ```
//!
//! Expressions are sequences (juxtaposition), choices (`|`), optionals
//! (`[ ]`), repetitions (`{ }`), groups (`( )`), terminal and rule names, and
//! quoted inline literals. The meta-syntax itself is read by a bootstrap
//! grammar built with the same engine.
//!
//! Matching is LL(1)-guided recursive descent: optional and repeated elements
//! only try their body when the next token can start it, and choices try their
//! branches in order. Left-recursive grammars are rejected at compile time.

mod analysis;
mod bootstrap;
mod compile;
mod error;
mod lexer;
mod matcher;
mod syntax;
mod tree;

pub use error::GrammarCompileError;
pub use lexer::{Token, TokenKind, UNKNOWN_TOKEN};
pub use matcher::{MatchIter, Matcher, Matches};
pub use syntax::{Expectation, Expr, ExprId, Grammar, Pattern, Rule, RuleId, Terminal, TerminalId};
pub use tree::{Leaf, Node, NodeKind, ParseTree, PostOrder, PreOrder};

//! Errors raised while compiling a grammar description.

use thiserror::Error;

/// A grammar description could not be compiled.
///
/// Line and column numbers are 1-based and refer to the grammar source.
#[derive(Debug, Error)]
pub enum GrammarCompileError {
    /// The meta-syntax could not be parsed.
    #[error("malformed grammar at {line}:{column}: {message}")]
    Malformed {
        line: u32,
        column: u32,
        message: String,
    },

    /// A rule body refers to a name that is neither a terminal nor a rule.
    #[error("undefined non-terminal `{name}` (line {line})")]
    UndefinedNonTerminal { name: String, line: u32 },

    #[error("duplicate terminal `{name}` (line {line})")]
    DuplicateTerminal { name: String, line: u32 },

    #[error("duplicate rule `{name}` (line {line})")]
    DuplicateNonTerminal { name: String, line: u32 },

    /// A regex terminal failed to compile.
    #[error("invalid regex for terminal `{name}` (line {line}): {source}")]
    InvalidRegex {
        name: String,
        line: u32,
        #[source]
        source: Box<regex_automata::dfa::dense::BuildError>,
    },

    /// A rule can reach itself without consuming a token.
    #[error("rule `{name}` is left-recursive")]
    LeftRecursion { name: String },

    #[error("grammar defines no rules")]
    Empty,
}

impl GrammarCompileError {
    /// Create a malformed-syntax error.
    pub fn malformed(line: u32, column: u32, message: impl Into<String>) -> Self {
        Self::Malformed {
            line,
            column,
            message: message.into(),
        }
    }
}

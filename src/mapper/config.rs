//! Mapper options

use std::path::PathBuf;

use crate::rewrite::DEFAULT_GENERATED_CODE_NOTE;

/// Environment variable naming the fault dump directory.
pub const DUMP_DIR_ENV: &str = "SUGAR_MAPPER_DUMP_DIR";

/// Options for a [`Mapper`](super::Mapper).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapperConfig {
    /// Where fault dumps are written. `None` disables dumps.
    pub dump_directory: Option<PathBuf>,
    /// Caveat added to diagnostics that land in appended text
    pub generated_code_note: String,
    /// Recursion bound for grammar matchers run through `Visit::parse`.
    /// `None` bounds by grammar and input size.
    pub max_match_depth: Option<usize>,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            dump_directory: None,
            generated_code_note: DEFAULT_GENERATED_CODE_NOTE.to_string(),
            max_match_depth: None,
        }
    }
}

impl MapperConfig {
    /// Defaults, with the dump directory taken from `SUGAR_MAPPER_DUMP_DIR`.
    pub fn from_env() -> Self {
        let dump_directory = std::env::var_os(DUMP_DIR_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        Self {
            dump_directory,
            ..Self::default()
        }
    }

    pub fn with_dump_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.dump_directory = Some(directory.into());
        self
    }

    pub fn with_generated_code_note(mut self, note: impl Into<String>) -> Self {
        self.generated_code_note = note.into();
        self
    }

    pub fn with_max_match_depth(mut self, depth: usize) -> Self {
        self.max_match_depth = Some(depth);
        self
    }
}

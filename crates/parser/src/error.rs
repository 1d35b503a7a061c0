//! # Error Types
//!
//! Errors surfaced by the parser crate. Search failures are not errors: a
//! sentence with no derivation within budget yields an empty result.

use ccg_core::CcgError;
use thiserror::Error;

/// Errors from parser construction, configuration, and input validation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParserError {
    /// The grammar could not be read or compiled.
    #[error("Grammar error: {0}")]
    Grammar(#[from] CcgError),

    /// A configuration value is out of range.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Words and part-of-speech tags differ in length.
    #[error("Sentence has {words} words but {tags} part-of-speech tags")]
    MismatchedTags { words: usize, tags: usize },

    /// A worker pool could not be created.
    #[error("Thread pool error: {message}")]
    ThreadPool { message: String },

    /// A gold syntax tree string could not be parsed.
    #[error("Malformed syntax tree '{input}': {reason}")]
    MalformedTree { input: String, reason: String },
}

impl ParserError {
    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        ParserError::InvalidConfig {
            message: message.into(),
        }
    }

    pub(crate) fn malformed_tree(input: &str, reason: impl Into<String>) -> Self {
        ParserError::MalformedTree {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ParserError::MismatchedTags { words: 3, tags: 2 };
        assert_eq!(
            err.to_string(),
            "Sentence has 3 words but 2 part-of-speech tags"
        );

        let err = ParserError::invalid_config("beam_size must be positive");
        assert!(err.to_string().contains("beam_size"));
    }

    #[test]
    fn test_from_grammar_error() {
        let err: ParserError = CcgError::UnknownCategory {
            category: "S".to_string(),
        }
        .into();
        assert!(matches!(err, ParserError::Grammar(_)));
    }
}

//! # Error Types
//!
//! Errors raised while reading grammar text or compiling a grammar.
//!
//! These are structural configuration errors: a lexicon or rule set that
//! produces one of them cannot be used for parsing at all. Ordinary search
//! failures (no derivation, a timeout) are never reported through this type.

use thiserror::Error;

/// Structural errors in a CCG grammar.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CcgError {
    /// A category string could not be parsed.
    #[error("Malformed category '{input}': {reason}")]
    MalformedCategory { input: String, reason: String },

    /// A lexicon line could not be parsed.
    #[error("Malformed lexicon entry '{line}': {reason}")]
    MalformedLexiconEntry { line: String, reason: String },

    /// A binary or unary rule line could not be parsed.
    #[error("Malformed rule '{line}': {reason}")]
    MalformedRule { line: String, reason: String },

    /// A rule mentions a feature value that no lexicon category declares.
    #[error("Rule '{rule}' references undeclared feature value '{feature}'")]
    UndeclaredFeature { feature: String, rule: String },

    /// The sides of a rule cannot be reconciled with each other.
    #[error("Irreconcilable rule '{rule}': {reason}")]
    IrreconcilableRule { rule: String, reason: String },

    /// A category is not part of the compiled grammar.
    #[error("Unknown category: {category}")]
    UnknownCategory { category: String },
}

impl CcgError {
    pub(crate) fn malformed_category(input: &str, reason: impl Into<String>) -> Self {
        CcgError::MalformedCategory {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

//! # CCG Parser - Weighted Chart Parsing
//!
//! This crate parses tagged sentences with a [`ccg_core::CompiledGrammar`]
//! and returns weighted derivations, best first.
//!
//! - **Sentences**: Words with part-of-speech tags
//! - **Scoring**: Lexicon, dependency, and syntax weights as traits
//! - **Chart**: Inclusive spans, bounded beams, integer backpointers
//! - **Inference**: CKY beam search, exact CKY, and shift-reduce
//! - **Constraints**: Gold trees, supertags, gold dependencies, and
//!   caller checks on decoded parses
//! - **Derivations**: [`CcgParse`] trees with heads, dependencies, and
//!   probabilities
//! - **Hooks**: Observers for parse events and phase timings
//!
//! ## Example
//!
//! ```rust
//! use ccg_core::CompileOptions;
//! use ccg_parser::{CcgParser, Lexicon, ParserConfig, TaggedSentence};
//!
//! let lexicon = Lexicon::parse_lines(["dog,N,", "barks,S\\N,barks 1 ?1"]).unwrap();
//! let parser = CcgParser::from_lexicon(lexicon, Vec::new(), Vec::new(), &CompileOptions::default()).unwrap();
//!
//! let sentence = TaggedSentence::untagged(["dog", "barks"]);
//! let parses = parser.parse(&sentence, &ParserConfig::default()).unwrap();
//! assert_eq!(parses[0].to_string(), "<S <N dog> <(S\\N) barks>>");
//! ```
//!
//! ## Failure
//!
//! Grammar and configuration problems are [`ParserError`]s. Failing to find
//! a derivation (within the beam, the time budget, or the chart budget) is
//! an empty result.

pub mod chart;
pub mod config;
mod error;
pub mod filter;
pub mod hooks;
pub mod inference;
pub mod parse;
pub mod parser;
pub mod scoring;
pub mod sentence;
pub mod syntax_tree;
pub mod trace;

pub use chart::{Beam, Chart, ChartEntry, EntryPointer};
pub use config::{ParserConfig, Strategy};
pub use error::ParserError;
pub use filter::{ChartCost, CompositeCost, SupertagChartFilter, SyntacticChartFilter};
pub use hooks::{CompositeHook, LoggingHook, NullHook, ParseHook};
pub use inference::{
    AbortReason, CcgBeamSearchInference, CcgExactInference, CcgInference, ParseConstraints,
    Parallelism, SearchLimits, ShiftReduceInference,
};
pub use parse::{CcgParse, DerivationNode, UnaryApplication};
pub use parser::CcgParser;
pub use scoring::{
    DependencyScorer, DependencyWeights, Lexicon, SyntaxScorer, SyntaxWeights, TerminalScorer,
    UniformDependencyScorer, UniformSyntaxScorer, WeightedEntry,
};
pub use sentence::TaggedSentence;
pub use syntax_tree::CcgSyntaxTree;
pub use trace::{TimingHook, TraceNode};

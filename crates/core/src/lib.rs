//! # CCG Core - Category Algebra and Grammar Compilation
//!
//! This crate provides the grammar-side abstractions of a combinatory
//! categorial grammar:
//!
//! - **Syntax**: Syntactic categories with feature unification
//! - **Headed categories**: Categories annotated with semantic head variables
//! - **Dependencies**: Predicate-argument templates, unfilled and filled
//! - **Lexicon**: Lexical categories with predicate assignments
//! - **Rules**: Custom binary and unary rules
//! - **Combinators**: Application, composition, and rule instances over a
//!   category inventory
//! - **Compilation**: The closed inventory and its search-move table
//!
//! ## Design Philosophy
//!
//! All unification happens at compile time. A parser built on a
//! [`CompiledGrammar`] only looks up integer category ids and applies
//! precomputed variable relabelings.

pub mod category;
pub mod combinator;
pub mod compile;
pub mod dependency;
mod error;
pub mod headed;
pub mod rules;
pub mod syntax;

pub use category::{CcgCategory, LexicalDependencies, LexiconEntry};
pub use combinator::{
    CategoryId, Combinator, CombinatorId, CombinatorType, MoveId, SearchMove, UnaryCombinator,
    UnaryId,
};
pub use compile::{CompilationMode, CompileOptions, CompiledGrammar};
pub use dependency::{
    Argument, DependencyStructure, DependencyTemplate, IndexedPredicate, UnfilledDependency,
};
pub use error::CcgError;
pub use headed::HeadedSyntacticCategory;
pub use rules::{CcgBinaryRule, CcgRuleSchema, CcgUnaryRule};
pub use syntax::{Direction, Feature, FeatureUnification, SyntacticCategory, UNBOUND};

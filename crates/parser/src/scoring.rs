//! # Scoring Collaborators
//!
//! The chart treats its weights as opaque oracles behind three traits:
//!
//! - [`TerminalScorer`]: which lexicon entries a word span may take, and
//!   their prior probabilities
//! - [`DependencyScorer`]: the weight of a filled dependency
//! - [`SyntaxScorer`]: weights of combinators, unary rules, and root
//!   categories
//!
//! Reference implementations are table-driven ([`Lexicon`],
//! [`DependencyWeights`], [`SyntaxWeights`]) or uniform.

use std::collections::HashMap;
use std::sync::Arc;

use ccg_core::{
    CategoryId, CcgError, CcgRuleSchema, Combinator, CompiledGrammar, DependencyStructure,
    HeadedSyntacticCategory, LexiconEntry, UnaryCombinator,
};

use crate::sentence::TaggedSentence;

/// Prefix of lexicon words that stand for unknown words with a given tag.
pub const UNKNOWN_WORD_PREFIX: &str = "UNK-";

// ============================================================================
// Terminal Scoring
// ============================================================================

/// A lexicon entry with its prior probability.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedEntry {
    pub entry: Arc<LexiconEntry>,
    pub probability: f64,
}

/// Proposes lexicon entries for word spans.
pub trait TerminalScorer: Send + Sync {
    /// Entries for the inclusive word span `start..=end`.
    fn lexicon_entries(&self, sentence: &TaggedSentence, start: usize, end: usize) -> Vec<WeightedEntry>;

    /// Longest span, in words, any entry can cover.
    fn max_span_length(&self) -> usize {
        1
    }
}

/// A lexicon keyed by lower-cased word sequences.
///
/// Entries whose single word is `UNK-<POS>` are used for words that have no
/// entry of their own.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    entries: Vec<WeightedEntry>,
    by_words: HashMap<Vec<String>, Vec<usize>>,
    unknown_by_pos: HashMap<String, Vec<usize>>,
    max_span_length: usize,
}

impl Lexicon {
    pub fn new() -> Self {
        Self::default()
    }

    /// A lexicon where every entry has probability 1.
    pub fn from_entries(entries: impl IntoIterator<Item = LexiconEntry>) -> Self {
        entries
            .into_iter()
            .fold(Self::new(), |lexicon, entry| lexicon.with_entry(entry, 1.0))
    }

    /// Parse lexicon lines, giving every entry probability 1.
    pub fn parse_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Result<Self, CcgError> {
        Ok(Self::from_entries(LexiconEntry::parse_lines(lines)?))
    }

    pub fn with_entry(mut self, entry: LexiconEntry, probability: f64) -> Self {
        self.add(entry, probability);
        self
    }

    pub fn add(&mut self, entry: LexiconEntry, probability: f64) {
        let index = self.entries.len();
        let key: Vec<String> = entry.words.iter().map(|w| w.to_lowercase()).collect();
        match entry.words.as_slice() {
            [word] if word.starts_with(UNKNOWN_WORD_PREFIX) => {
                let pos = word[UNKNOWN_WORD_PREFIX.len()..].to_string();
                self.unknown_by_pos.entry(pos).or_default().push(index);
            }
            _ => {
                self.max_span_length = self.max_span_length.max(key.len());
                self.by_words.entry(key).or_default().push(index);
            }
        }
        self.entries.push(WeightedEntry {
            entry: Arc::new(entry),
            probability,
        });
    }

    pub fn entries(&self) -> &[WeightedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Syntactic categories of every entry, for grammar compilation.
    pub fn categories(&self) -> impl Iterator<Item = &HeadedSyntacticCategory> {
        self.entries.iter().map(|e| e.entry.category.syntax().as_ref())
    }

    fn collect(&self, indices: Option<&Vec<usize>>) -> Vec<WeightedEntry> {
        indices
            .into_iter()
            .flatten()
            .map(|i| self.entries[*i].clone())
            .collect()
    }
}

impl TerminalScorer for Lexicon {
    fn lexicon_entries(&self, sentence: &TaggedSentence, start: usize, end: usize) -> Vec<WeightedEntry> {
        let key: Vec<String> = sentence
            .span_words(start, end)
            .iter()
            .map(|w| w.to_lowercase())
            .collect();
        if key.is_empty() || key.len() > self.max_span_length.max(1) {
            return Vec::new();
        }
        let found = self.collect(self.by_words.get(&key));
        if found.is_empty() && start == end {
            let pos = sentence.pos(start).unwrap_or_default();
            return self.collect(self.unknown_by_pos.get(pos));
        }
        found
    }

    fn max_span_length(&self) -> usize {
        self.max_span_length.max(1)
    }
}

// ============================================================================
// Dependency Scoring
// ============================================================================

/// Weights filled dependencies.
pub trait DependencyScorer: Send + Sync {
    /// Unnormalized weight of `dependency`, given the tags of its two words.
    fn dependency_weight(&self, dependency: &DependencyStructure, head_pos: &str, object_pos: &str) -> f64;
}

/// Every dependency has weight 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformDependencyScorer;

impl DependencyScorer for UniformDependencyScorer {
    fn dependency_weight(&self, _dependency: &DependencyStructure, _head_pos: &str, _object_pos: &str) -> f64 {
        1.0
    }
}

/// Table of dependency weights with a part-of-speech backoff.
///
/// Lookup order: `(head, argNum, object)` predicates, then
/// `(head POS, argNum, object POS)`, then the default weight.
#[derive(Debug, Clone)]
pub struct DependencyWeights {
    by_predicate: HashMap<(String, usize, String), f64>,
    by_pos: HashMap<(String, usize, String), f64>,
    default_weight: f64,
}

impl Default for DependencyWeights {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl DependencyWeights {
    pub fn new(default_weight: f64) -> Self {
        Self {
            by_predicate: HashMap::new(),
            by_pos: HashMap::new(),
            default_weight,
        }
    }

    pub fn with_weight(mut self, head: &str, arg_num: usize, object: &str, weight: f64) -> Self {
        self.by_predicate
            .insert((head.to_string(), arg_num, object.to_string()), weight);
        self
    }

    pub fn with_pos_weight(mut self, head_pos: &str, arg_num: usize, object_pos: &str, weight: f64) -> Self {
        self.by_pos
            .insert((head_pos.to_string(), arg_num, object_pos.to_string()), weight);
        self
    }
}

impl DependencyScorer for DependencyWeights {
    fn dependency_weight(&self, dependency: &DependencyStructure, head_pos: &str, object_pos: &str) -> f64 {
        let key = (
            dependency.head.predicate.to_string(),
            dependency.arg_num,
            dependency.object.predicate.to_string(),
        );
        if let Some(weight) = self.by_predicate.get(&key) {
            return *weight;
        }
        let key = (head_pos.to_string(), dependency.arg_num, object_pos.to_string());
        self.by_pos.get(&key).copied().unwrap_or(self.default_weight)
    }
}

// ============================================================================
// Syntax Scoring
// ============================================================================

/// Weights the syntactic side of a derivation.
pub trait SyntaxScorer: Send + Sync {
    fn binary_weight(&self, _grammar: &CompiledGrammar, _combinator: &Combinator) -> f64 {
        1.0
    }

    fn unary_weight(&self, _grammar: &CompiledGrammar, _unary: &UnaryCombinator) -> f64 {
        1.0
    }

    fn root_weight(&self, _grammar: &CompiledGrammar, _category: CategoryId) -> f64 {
        1.0
    }
}

/// Every combinator, unary rule, and root has weight 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformSyntaxScorer;

impl SyntaxScorer for UniformSyntaxScorer {}

/// Table-driven syntax weights.
///
/// Binary weights are keyed by rule schema, unary weights by the rule as
/// written, and root weights by the feature-free root category.
#[derive(Debug, Clone)]
pub struct SyntaxWeights {
    binary: HashMap<CcgRuleSchema, f64>,
    unary: HashMap<String, f64>,
    root: HashMap<String, f64>,
    default_weight: f64,
}

impl Default for SyntaxWeights {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl SyntaxWeights {
    pub fn new(default_weight: f64) -> Self {
        Self {
            binary: HashMap::new(),
            unary: HashMap::new(),
            root: HashMap::new(),
            default_weight,
        }
    }

    pub fn with_binary_weight(mut self, schema: CcgRuleSchema, weight: f64) -> Self {
        self.binary.insert(schema, weight);
        self
    }

    pub fn with_unary_weight(mut self, rule: &str, weight: f64) -> Self {
        self.unary.insert(rule.to_string(), weight);
        self
    }

    pub fn with_root_weight(mut self, category: &str, weight: f64) -> Self {
        self.root.insert(category.to_string(), weight);
        self
    }
}

impl SyntaxScorer for SyntaxWeights {
    fn binary_weight(&self, grammar: &CompiledGrammar, combinator: &Combinator) -> f64 {
        let schema = CcgRuleSchema::new(
            grammar.category(combinator.left).syntax(),
            grammar.category(combinator.right).syntax(),
            grammar.category(combinator.result).syntax(),
        );
        self.binary.get(&schema).copied().unwrap_or(self.default_weight)
    }

    fn unary_weight(&self, _grammar: &CompiledGrammar, unary: &UnaryCombinator) -> f64 {
        self.unary
            .get(unary.rule.source())
            .copied()
            .unwrap_or(self.default_weight)
    }

    fn root_weight(&self, grammar: &CompiledGrammar, category: CategoryId) -> f64 {
        let key = grammar.category(category).syntax().without_features().to_string();
        self.root.get(&key).copied().unwrap_or(self.default_weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccg_core::IndexedPredicate;

    fn lexicon() -> Lexicon {
        Lexicon::parse_lines(["dog,N,", "Dog food,N,", "UNK-NN,N,"]).unwrap()
    }

    #[test]
    fn test_lexicon_lookup_is_case_insensitive() {
        let sentence = TaggedSentence::new(["DOG"], ["NN"]).unwrap();
        let entries = lexicon().lexicon_entries(&sentence, 0, 0);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].entry.words, vec!["dog"]);
    }

    #[test]
    fn test_lexicon_multiword_span() {
        let sentence = TaggedSentence::new(["dog", "food"], ["NN", "NN"]).unwrap();
        let lexicon = lexicon();
        assert_eq!(lexicon.max_span_length(), 2);
        assert_eq!(lexicon.lexicon_entries(&sentence, 0, 1).len(), 1);
    }

    #[test]
    fn test_lexicon_unknown_fallback() {
        let sentence = TaggedSentence::new(["cat", "cat"], ["NN", "VB"]).unwrap();
        let lexicon = lexicon();
        let entries = lexicon.lexicon_entries(&sentence, 0, 0);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].entry.words, vec!["UNK-NN"]);
        assert!(lexicon.lexicon_entries(&sentence, 1, 1).is_empty());
    }

    #[test]
    fn test_dependency_weights_backoff() {
        let weights = DependencyWeights::new(0.5)
            .with_weight("barks", 1, "dog", 0.9)
            .with_pos_weight("VBZ", 1, "NN", 0.7);
        let dep = |head: &str, object: &str| {
            DependencyStructure::new(IndexedPredicate::new(head, 1), 1, IndexedPredicate::new(object, 0))
        };
        assert_eq!(weights.dependency_weight(&dep("barks", "dog"), "VBZ", "NN"), 0.9);
        assert_eq!(weights.dependency_weight(&dep("barks", "cat"), "VBZ", "NN"), 0.7);
        assert_eq!(weights.dependency_weight(&dep("barks", "cat"), "VB", "NN"), 0.5);
    }
}

//! # Constraint and Observability Tests
//!
//! Tests for conditional parsing and parse events:
//! - Gold trees, supertags, gold dependencies, and logical-form checks
//! - Gold-reachability diagnostics
//! - Hooks and timers
//! - JSON configuration driving a parse

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ccg_core::{
    CcgBinaryRule, CompileOptions, DependencyStructure, IndexedPredicate, LexiconEntry,
    SyntacticCategory,
};
use ccg_parser::{
    AbortReason, CcgParser, CcgSyntaxTree, CompositeHook, Lexicon, ParseConstraints, ParseHook,
    ParserConfig, Strategy, SupertagChartFilter, SyntaxWeights, TaggedSentence, TimingHook,
};

const PROB_TOLERANCE: f64 = 1e-9;

fn parser(lines: &[&str]) -> CcgParser {
    let lexicon = Lexicon::parse_lines(lines.iter().copied()).unwrap();
    CcgParser::from_lexicon(lexicon, Vec::<CcgBinaryRule>::new(), Vec::new(), &CompileOptions::default()).unwrap()
}

fn transitive_parser() -> CcgParser {
    parser(&[
        "the,(N{1}/N{1}){0},the 1 ?1",
        "dog,N,",
        "cat,N,",
        "saw,(S\\N)/N,saw 1 ?1#saw 2 ?2",
    ])
}

fn two_senses_parser() -> CcgParser {
    let lexicon = Lexicon::new()
        .with_entry(LexiconEntry::parse("dog,N,").unwrap(), 1.0)
        .with_entry(LexiconEntry::parse("cat,N,").unwrap(), 1.0)
        .with_entry(LexiconEntry::parse("saw,(S\\N)/N,saw 1 ?1#saw 2 ?2").unwrap(), 0.7)
        .with_entry(LexiconEntry::parse("saw,(S\\N)/N,cut 1 ?1#cut 2 ?2").unwrap(), 0.3);
    CcgParser::from_lexicon(lexicon, Vec::new(), Vec::new(), &CompileOptions::default()).unwrap()
}

fn cat(s: &str) -> SyntacticCategory {
    SyntacticCategory::parse(s).unwrap()
}

fn dependency(head: &str, head_index: usize, arg_num: usize, object: &str, object_index: usize) -> DependencyStructure {
    DependencyStructure::new(
        IndexedPredicate::new(head, head_index),
        arg_num,
        IndexedPredicate::new(object, object_index),
    )
}

// ============================================================================
// Conditional Parsing Tests
// ============================================================================

#[test]
fn test_gold_tree_selects_matching_derivation() {
    let parser = transitive_parser();
    let sentence = TaggedSentence::untagged(["the", "dog", "saw", "the", "cat"]);
    let config = ParserConfig::default().with_strategy(Strategy::Exact);
    let unconstrained = parser.parse(&sentence, &config).unwrap();
    assert!(unconstrained.len() > 1);

    let gold = CcgSyntaxTree::parse_bracketed(
        "<S <N <(N/N) the> <N dog>> <(S\\N) <((S\\N)/N) saw> <N <(N/N) the> <N cat>>>>",
    )
    .unwrap();
    let constraints = ParseConstraints::new().with_gold_tree(&gold);
    for strategy in [Strategy::Beam, Strategy::Exact, Strategy::ShiftReduce] {
        let config = ParserConfig::default().with_strategy(strategy);
        let parses = parser
            .parse_with(&sentence, &config, &constraints, &ccg_parser::NullHook)
            .unwrap();
        assert_eq!(parses.len(), 1, "{:?}", strategy);
        assert_eq!(parses[0].to_syntax_tree().to_string(), gold.to_string());
    }
}

#[test]
fn test_gold_dependencies_filter() {
    let parser = two_senses_parser();
    let sentence = TaggedSentence::untagged(["dog", "saw", "cat"]);
    let constraints = ParseConstraints::new()
        .with_gold_dependencies([dependency("cut", 1, 1, "dog", 0), dependency("cut", 1, 2, "cat", 2)]);

    let parses = parser
        .parse_with(&sentence, &ParserConfig::default(), &constraints, &ccg_parser::NullHook)
        .unwrap();
    assert_eq!(parses.len(), 1);
    assert!((parses[0].subtree_probability() - 0.3).abs() < PROB_TOLERANCE);

    let partial = ParseConstraints::new().with_gold_dependencies([dependency("cut", 1, 1, "dog", 0)]);
    assert!(parser
        .parse_with(&sentence, &ParserConfig::default(), &partial, &ccg_parser::NullHook)
        .unwrap()
        .is_empty());
}

#[test]
fn test_logical_form_check() {
    let parser = two_senses_parser();
    let sentence = TaggedSentence::untagged(["dog", "saw", "cat"]);
    let constraints = ParseConstraints::new()
        .with_logical_form(|parse| parse.semantic_heads().iter().any(|h| h.predicate.as_ref() == "saw"));
    let parses = parser
        .parse_with(&sentence, &ParserConfig::default(), &constraints, &ccg_parser::NullHook)
        .unwrap();
    // Both senses keep the word itself as the verb's head.
    assert_eq!(parses.len(), 2);

    let rejects_all = ParseConstraints::new().with_logical_form(|_| false);
    assert!(parser
        .parse_with(&sentence, &ParserConfig::default(), &rejects_all, &ccg_parser::NullHook)
        .unwrap()
        .is_empty());
}

#[test]
fn test_supertag_filter() {
    let parser = parser(&["dog,N,", "fish,N,", "fish,S\\N,fish 1 ?1"]);
    let sentence = TaggedSentence::untagged(["dog", "fish"]);
    let config = ParserConfig::default();
    assert_eq!(parser.parse(&sentence, &config).unwrap().len(), 1);

    let nouns = ParseConstraints::new().with_chart_cost(SupertagChartFilter::new(vec![vec![], vec![cat("N")]]));
    assert!(parser
        .parse_with(&sentence, &config, &nouns, &ccg_parser::NullHook)
        .unwrap()
        .is_empty());

    let verbs = ParseConstraints::new().with_chart_cost(SupertagChartFilter::new(vec![vec![], vec![cat("S\\N")]]));
    assert_eq!(
        parser
            .parse_with(&sentence, &config, &verbs, &ccg_parser::NullHook)
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn test_root_weights() {
    let lexicon = Lexicon::parse_lines(["dog,N,", "barks,S\\N,barks 1 ?1"]).unwrap();
    let parser = CcgParser::from_lexicon(lexicon, Vec::new(), Vec::new(), &CompileOptions::default())
        .unwrap()
        .with_syntax_scorer(SyntaxWeights::new(1.0).with_root_weight("S", 0.5));
    let sentence = TaggedSentence::untagged(["dog", "barks"]);
    let parse = parser.best_parse(&sentence, &ParserConfig::default()).unwrap().unwrap();
    assert!((parse.subtree_probability() - 0.5).abs() < PROB_TOLERANCE);
}

// ============================================================================
// Diagnostic Tests
// ============================================================================

#[test]
fn test_possible_lexicon_entry() {
    let parser = transitive_parser();
    let sentence = TaggedSentence::untagged(["the", "dog", "saw"]);
    let dog = LexiconEntry::parse("dog,N,").unwrap();
    let verb_dog = LexiconEntry::parse("dog,S\\N,").unwrap();
    assert!(parser.is_possible_lexicon_entry(&sentence, 1, 1, &dog));
    assert!(!parser.is_possible_lexicon_entry(&sentence, 1, 1, &verb_dog));
    assert!(!parser.is_possible_lexicon_entry(&sentence, 0, 0, &dog));
}

#[test]
fn test_possible_binary_rule() {
    let parser = transitive_parser();
    assert!(parser.is_possible_binary_rule(&cat("(S\\N)/N"), &cat("N"), &cat("S\\N")));
    assert!(parser.is_possible_binary_rule(&cat("N"), &cat("S\\N"), &cat("S")));
    assert!(!parser.is_possible_binary_rule(&cat("N"), &cat("N"), &cat("N")));
}

#[test]
fn test_possible_syntax_tree() {
    let parser = transitive_parser();
    let sentence = TaggedSentence::untagged(["dog", "saw", "cat"]);
    let good = CcgSyntaxTree::parse_bracketed("<S <N dog> <(S\\N) <((S\\N)/N) saw> <N cat>>>").unwrap();
    let bad = CcgSyntaxTree::parse_bracketed("<S <(S/N) <N dog> <((S\\N)/N) saw>> <N cat>>").unwrap();
    assert!(parser.is_possible_syntax_tree(&sentence, &good, 10));
    assert!(!parser.is_possible_syntax_tree(&sentence, &bad, 10));
}

#[test]
fn test_possible_dependency() {
    let parser = transitive_parser();
    let sentence = TaggedSentence::untagged(["dog", "saw", "cat"]);
    assert!(parser.is_possible_dependency(&sentence, &dependency("saw", 1, 2, "cat", 2)));
    assert!(!parser.is_possible_dependency(&sentence, &dependency("saw", 1, 3, "cat", 2)));
    assert!(!parser.is_possible_dependency(&sentence, &dependency("dog", 0, 1, "saw", 1)));
}

// ============================================================================
// Hook Tests
// ============================================================================

#[derive(Clone, Default)]
struct CountingHook {
    levels: Arc<AtomicUsize>,
    spans: Arc<AtomicUsize>,
    aborts: Arc<AtomicUsize>,
    parses: Arc<AtomicUsize>,
}

impl ParseHook for CountingHook {
    fn on_span_complete(&self, _start: usize, _end: usize, _num_entries: usize) {
        self.spans.fetch_add(1, Ordering::SeqCst);
    }

    fn on_level_complete(&self, _level: usize, _chart_size: usize) {
        self.levels.fetch_add(1, Ordering::SeqCst);
    }

    fn on_abort(&self, reason: AbortReason) {
        assert_eq!(reason, AbortReason::Timeout);
        self.aborts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_parse_end(&self, num_parses: usize) {
        self.parses.fetch_add(num_parses, Ordering::SeqCst);
    }
}

#[test]
fn test_hooks_observe_cky() {
    let parser = transitive_parser();
    let sentence = TaggedSentence::untagged(["the", "dog", "saw", "the", "cat"]);
    let counter = CountingHook::default();
    let parses = parser
        .parse_with(&sentence, &ParserConfig::default(), &ParseConstraints::new(), &counter)
        .unwrap();

    assert_eq!(counter.levels.load(Ordering::SeqCst), 4);
    // 4 + 3 + 2 + 1 spans of two or more words.
    assert_eq!(counter.spans.load(Ordering::SeqCst), 10);
    assert_eq!(counter.parses.load(Ordering::SeqCst), parses.len());
    assert_eq!(counter.aborts.load(Ordering::SeqCst), 0);
}

#[test]
fn test_hooks_observe_abort() {
    let parser = transitive_parser();
    let sentence = TaggedSentence::untagged(["the", "dog", "saw", "the", "cat"]);
    let counter = CountingHook::default();
    let config = ParserConfig::default().with_max_parse_time_millis(0);
    let parses = parser
        .parse_with(&sentence, &config, &ParseConstraints::new(), &counter)
        .unwrap();
    assert!(parses.is_empty());
    assert_eq!(counter.aborts.load(Ordering::SeqCst), 1);
}

#[test]
fn test_timing_hook_records_phases() {
    let parser = transitive_parser();
    let sentence = TaggedSentence::untagged(["the", "dog", "saw", "the", "cat"]);
    let timing = Arc::new(TimingHook::new());

    struct Shared(Arc<TimingHook>);
    impl ParseHook for Shared {
        fn on_timer_start(&self, name: &str) {
            self.0.on_timer_start(name);
        }
        fn on_timer_stop(&self, name: &str) {
            self.0.on_timer_stop(name);
        }
    }

    let hook = CompositeHook::new().with(Shared(Arc::clone(&timing)));
    parser
        .parse_with(&sentence, &ParserConfig::default(), &ParseConstraints::new(), &hook)
        .unwrap();
    let names: Vec<String> = timing.traces().into_iter().map(|t| t.name).collect();
    assert_eq!(
        names,
        vec!["ccg_parse/initialize_chart", "ccg_parse/calculate_inside_beam", "ccg_parse/decode"]
    );

    timing.reset();
    let config = ParserConfig::default().with_strategy(Strategy::ShiftReduce);
    parser
        .parse_with(&sentence, &config, &ParseConstraints::new(), &hook)
        .unwrap();
    assert!(timing.traces().iter().any(|t| t.name == "ccg_parse/shift_reduce"));
}

// ============================================================================
// Configuration Tests
// ============================================================================

#[test]
fn test_json_config_drives_strategy() {
    let parser = transitive_parser();
    let sentence = TaggedSentence::untagged(["the", "dog", "saw", "the", "cat"]);
    let config = ParserConfig::from_json(r#"{"strategy": "shift_reduce", "beam_size": 50}"#).unwrap();
    let parses = parser.parse(&sentence, &config).unwrap();
    assert!(!parses.is_empty());
    assert_eq!(parses[0].syntax().syntax().to_string(), "S");

    let round_trip = ParserConfig::from_json(&config.to_json().unwrap()).unwrap();
    assert_eq!(round_trip, config);
}

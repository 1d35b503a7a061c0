//! # Grammar Tests
//!
//! Tests for the grammar layer as seen from outside the crate:
//! - Category parsing and display round trips
//! - Canonical forms and unification laws
//! - Lexicon and rule files compiled into a search-move table
//! - Structural errors surfaced at compile time

use std::collections::BTreeSet;

use ccg_core::{
    CcgBinaryRule, CcgError, CcgUnaryRule, CombinatorType, CompileOptions, CompiledGrammar,
    HeadedSyntacticCategory, LexiconEntry, SyntacticCategory,
};

const LEXICON: &[&str] = &[
    "# toy grammar",
    "the,(N{1}/N{1}){1},the 1 ?1",
    "dog,N,",
    "cat,N,",
    "saw,(S\\N)/N,saw 1 ?1#saw 2 ?2",
    "barks,S\\N,barks 1 ?1",
    "and,conj,",
];

const BINARY: &[&str] = &["conj{2} N{1} (N{1}\\N{1}){1}###F###T###and###and 1 ?1"];

const UNARY: &[&str] = &["N{0} (S{1}/(S{1}\\N{0}){1}){1}"];

fn compiled(options: &CompileOptions) -> CompiledGrammar {
    let lexicon = LexiconEntry::parse_lines(LEXICON.iter().copied()).unwrap();
    CompiledGrammar::compile(
        lexicon.iter().map(|e| e.category.syntax().as_ref()),
        CcgBinaryRule::parse_lines(BINARY.iter().copied()).unwrap(),
        CcgUnaryRule::parse_lines(UNARY.iter().copied()).unwrap(),
        options,
    )
    .unwrap()
}

// ============================================================================
// Category Tests
// ============================================================================

#[test]
fn test_syntax_display_round_trip() {
    for text in ["N", "S[dcl]", "(S\\N)", "((S[dcl]\\N)/N[nb])", "(N[1]/N[1])"] {
        let parsed = SyntacticCategory::parse(text).unwrap();
        let reparsed = SyntacticCategory::parse(&parsed.to_string()).unwrap();
        assert_eq!(parsed, reparsed, "round trip of {}", text);
    }
}

#[test]
fn test_headed_display_round_trip() {
    let category = HeadedSyntacticCategory::parse("((S{0}\\N{1}){0}/N{2}){0}").unwrap();
    assert_eq!(
        HeadedSyntacticCategory::parse(&category.to_string()).unwrap(),
        category
    );
}

#[test]
fn test_canonical_form_idempotent() {
    for text in ["((S{5}\\N{3}){5}/N{9}){5}", "(N[4]{2}/N[4]{2}){2}", "conj{7}"] {
        let canonical = HeadedSyntacticCategory::parse(text).unwrap().canonical_form();
        assert!(canonical.is_canonical());
        assert_eq!(canonical.canonical_form(), canonical);
    }
}

#[test]
fn test_unification_symmetric() {
    let pairs = [
        ("N[nb]", "N[1]"),
        ("N[nb]", "N[dcl]"),
        ("(S[1]\\N[1])", "(S[dcl]\\N[nb])"),
        ("(S\\N)", "(S/N)"),
    ];
    for (a, b) in pairs {
        let a = SyntacticCategory::parse(a).unwrap();
        let b = SyntacticCategory::parse(b).unwrap();
        assert_eq!(a.is_unifiable_with(&b), b.is_unifiable_with(&a));
    }
}

#[test]
fn test_malformed_category() {
    for text in ["(N", "N/", "S\\", ""] {
        assert!(
            matches!(
                SyntacticCategory::parse(text),
                Err(CcgError::MalformedCategory { .. })
            ),
            "{} should fail",
            text
        );
    }
}

// ============================================================================
// Compilation Tests
// ============================================================================

#[test]
fn test_compile_toy_grammar() {
    let grammar = compiled(&CompileOptions::default());

    let np_mod = grammar.category_id_of("(N{0}/N{0}){0}").unwrap();
    let n = grammar.category_id_of("N{0}").unwrap();
    let tv = grammar.category_id_of("((S{0}\\N{1}){0}/N{2}){0}").unwrap();
    let vp = grammar.category_id_of("(S{0}\\N{1}){0}").unwrap();

    let kinds = |left, right| -> BTreeSet<CombinatorType> {
        grammar
            .moves_for(left, right)
            .iter()
            .map(|m| grammar.combinator(grammar.search_move(*m).combinator).kind)
            .collect()
    };
    assert!(kinds(np_mod, n).contains(&CombinatorType::ForwardApplication));
    assert!(kinds(tv, n).contains(&CombinatorType::ForwardApplication));
    assert!(kinds(n, vp).contains(&CombinatorType::BackwardApplication));
    assert!(kinds(np_mod, np_mod).contains(&CombinatorType::ForwardComposition));
}

#[test]
fn test_compile_is_deterministic() {
    let a = compiled(&CompileOptions::default());
    let b = compiled(&CompileOptions::default());
    assert_eq!(a.num_categories(), b.num_categories());
    assert_eq!(a.num_moves(), b.num_moves());
    for id in 0..a.num_categories() {
        assert_eq!(a.category(id), b.category(id));
    }
}

#[test]
fn test_compile_without_composition() {
    let with = compiled(&CompileOptions::default());
    let without = compiled(&CompileOptions::default().without_composition());
    assert!(without.num_moves() < with.num_moves());
    assert!(without.combinators().iter().all(|c| c.depth == 0));
}

#[test]
fn test_every_move_keys_on_its_inputs() {
    let grammar = compiled(&CompileOptions::default());
    for id in 0..grammar.num_moves() {
        let search_move = grammar.search_move(id);
        let combinator = grammar.combinator(search_move.combinator);
        let left = search_move
            .left_unary
            .map_or(combinator.left, |u| grammar.unary_combinator(u).input);
        let right = search_move
            .right_unary
            .map_or(combinator.right, |u| grammar.unary_combinator(u).input);
        assert!(grammar.moves_for(left, right).contains(&id));
    }
}

#[test]
fn test_compile_rejects_undeclared_feature() {
    let lexicon = LexiconEntry::parse_lines(["dog,N,"]).unwrap();
    let result = CompiledGrammar::compile(
        lexicon.iter().map(|e| e.category.syntax().as_ref()),
        CcgBinaryRule::parse_lines(["N[conj]{0} N{1} N{1}###F###T"]).unwrap(),
        Vec::new(),
        &CompileOptions::default(),
    );
    assert!(matches!(
        result,
        Err(CcgError::UndeclaredFeature { ref feature, .. }) if feature == "conj"
    ));
}

#[test]
fn test_malformed_lexicon_line() {
    assert!(matches!(
        LexiconEntry::parse("dog"),
        Err(CcgError::MalformedLexiconEntry { .. })
    ));
    assert!(matches!(
        LexiconEntry::parse("dog,(N,"),
        Err(CcgError::MalformedCategory { .. })
    ));
}

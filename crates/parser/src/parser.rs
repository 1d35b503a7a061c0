//! # CCG Parser
//!
//! [`CcgParser`] binds a [`CompiledGrammar`] to its scoring collaborators and
//! implements the chart operations every inference strategy shares:
//!
//! - placing lexicon entries in the chart
//! - combining two entries through a precompiled search move
//! - weighting whole-sentence entries and applying root unary rules
//! - decoding a [`CcgParse`] from backpointers
//!
//! Move, unary, and root weights are computed once when the parser is built.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use ccg_core::{
    Argument, CcgBinaryRule, CcgRuleSchema, CcgUnaryRule, CompileOptions, CompiledGrammar,
    DependencyStructure, IndexedPredicate, LexiconEntry, MoveId, SyntacticCategory,
    UnfilledDependency,
};

use crate::chart::{Backpointer, Beam, Chart, ChartEntry, EntryPointer};
use crate::config::ParserConfig;
use crate::error::ParserError;
use crate::filter::{ChartCost, SyntacticChartFilter};
use crate::hooks::{NullHook, ParseHook};
use crate::inference::{CcgInference, ParseConstraints, DECODE_TIMER};
use crate::parse::CcgParse;
use crate::scoring::{
    DependencyScorer, Lexicon, SyntaxScorer, TerminalScorer, UniformDependencyScorer,
    UniformSyntaxScorer,
};
use crate::sentence::TaggedSentence;
use crate::syntax_tree::CcgSyntaxTree;

/// A compiled grammar with its weights.
pub struct CcgParser {
    grammar: Arc<CompiledGrammar>,
    terminals: Arc<dyn TerminalScorer>,
    dependencies: Arc<dyn DependencyScorer>,
    syntax: Arc<dyn SyntaxScorer>,
    move_weights: Vec<f64>,
    unary_weights: Vec<f64>,
    root_weights: Vec<f64>,
    /// Inference built for the last config, reused while it is unchanged.
    inference: Mutex<Option<(ParserConfig, Arc<dyn CcgInference>)>>,
}

impl CcgParser {
    /// A parser with uniform dependency and syntax weights.
    pub fn new(grammar: Arc<CompiledGrammar>, terminals: impl TerminalScorer + 'static) -> Self {
        let mut parser = Self {
            grammar,
            terminals: Arc::new(terminals),
            dependencies: Arc::new(UniformDependencyScorer),
            syntax: Arc::new(UniformSyntaxScorer),
            move_weights: Vec::new(),
            unary_weights: Vec::new(),
            root_weights: Vec::new(),
            inference: Mutex::new(None),
        };
        parser.compute_syntax_weights();
        parser
    }

    /// Compile a grammar from a lexicon and rules.
    pub fn from_lexicon(
        lexicon: Lexicon,
        binary_rules: Vec<CcgBinaryRule>,
        unary_rules: Vec<CcgUnaryRule>,
        options: &CompileOptions,
    ) -> Result<Self, ParserError> {
        let grammar = CompiledGrammar::compile(lexicon.categories(), binary_rules, unary_rules, options)?;
        Ok(Self::new(Arc::new(grammar), lexicon))
    }

    pub fn with_dependency_scorer(mut self, scorer: impl DependencyScorer + 'static) -> Self {
        self.dependencies = Arc::new(scorer);
        self
    }

    pub fn with_syntax_scorer(mut self, scorer: impl SyntaxScorer + 'static) -> Self {
        self.syntax = Arc::new(scorer);
        self.compute_syntax_weights();
        self
    }

    fn compute_syntax_weights(&mut self) {
        let grammar = self.grammar.as_ref();
        self.unary_weights = grammar
            .unary_combinators()
            .iter()
            .map(|u| self.syntax.unary_weight(grammar, u))
            .collect();
        self.move_weights = (0..grammar.num_moves())
            .map(|id| {
                let search_move = grammar.search_move(id);
                let combinator = grammar.combinator(search_move.combinator);
                let unary: f64 = [search_move.left_unary, search_move.right_unary]
                    .into_iter()
                    .flatten()
                    .map(|u| self.unary_weights[u])
                    .product();
                self.syntax.binary_weight(grammar, combinator) * unary
            })
            .collect();
        self.root_weights = (0..grammar.num_categories())
            .map(|id| self.syntax.root_weight(grammar, id))
            .collect();
    }

    pub fn grammar(&self) -> &Arc<CompiledGrammar> {
        &self.grammar
    }

    pub fn terminal_scorer(&self) -> &dyn TerminalScorer {
        self.terminals.as_ref()
    }

    /// Weight of a search move, including its unary rules.
    pub fn move_weight(&self, id: MoveId) -> f64 {
        self.move_weights.get(id).copied().unwrap_or(0.0)
    }

    // ========================================================================
    // Parsing
    // ========================================================================

    /// Parse with the strategy and budgets of `config`.
    pub fn parse(&self, sentence: &TaggedSentence, config: &ParserConfig) -> Result<Vec<CcgParse>, ParserError> {
        self.parse_with(sentence, config, &ParseConstraints::default(), &NullHook)
    }

    /// Parse under constraints, reporting to `hook`.
    pub fn parse_with(
        &self,
        sentence: &TaggedSentence,
        config: &ParserConfig,
        constraints: &ParseConstraints,
        hook: &dyn ParseHook,
    ) -> Result<Vec<CcgParse>, ParserError> {
        let inference = self.inference_for(config)?;
        Ok(inference.beam_search(self, sentence, constraints, hook))
    }

    /// The inference for `config`. Worker pools live as long as the config
    /// stays the same across calls.
    fn inference_for(&self, config: &ParserConfig) -> Result<Arc<dyn CcgInference>, ParserError> {
        let mut cached = self.inference.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some((cached_config, inference)) = cached.as_ref() {
            if cached_config == config {
                return Ok(Arc::clone(inference));
            }
        }
        let inference: Arc<dyn CcgInference> = Arc::from(config.build_inference()?);
        *cached = Some((config.clone(), Arc::clone(&inference)));
        Ok(inference)
    }

    /// The best parse under `config`, if any.
    pub fn best_parse(&self, sentence: &TaggedSentence, config: &ParserConfig) -> Result<Option<CcgParse>, ParserError> {
        Ok(self.parse(sentence, config)?.into_iter().next())
    }

    // ========================================================================
    // Chart Operations
    // ========================================================================

    /// Lexical entries for every span, each cell best first.
    pub(crate) fn initialize_chart(&self, chart: &mut Chart, sentence: &TaggedSentence, cost: Option<&dyn ChartCost>) {
        let n = sentence.len();
        let max_span = self.terminals.max_span_length().max(1);
        for start in 0..n {
            for end in start..n.min(start + max_span) {
                let mut beam = Beam::new(chart.beam_size());
                for weighted in self.terminals.lexicon_entries(sentence, start, end) {
                    if let Some(entry) = self.terminal_entry(sentence, start, end, &weighted.entry, weighted.probability, cost) {
                        beam.offer(entry.probability, entry);
                    }
                }
                chart.set_entries(start, end, beam.into_sorted_vec());
            }
        }
    }

    fn terminal_entry(
        &self,
        sentence: &TaggedSentence,
        start: usize,
        end: usize,
        entry: &Arc<LexiconEntry>,
        lexical_probability: f64,
        cost: Option<&dyn ChartCost>,
    ) -> Option<ChartEntry> {
        let category = self.grammar.category_id(entry.category.syntax())?;
        let mut probability = lexical_probability;
        if let Some(cost) = cost {
            probability *= cost.terminal_cost(start, end, entry);
        }
        if probability <= 0.0 {
            return None;
        }
        let lexical = entry.category.create_unfilled_dependencies(end);
        for dependency in &lexical.filled {
            probability *= self.dependency_weight(sentence, dependency);
        }
        Some(ChartEntry {
            category,
            root_unary: None,
            assignments: entry.category.indexed_assignments(end),
            unfilled: lexical.unfilled.into_values().flatten().collect(),
            filled: lexical.filled,
            backpointer: Backpointer::Terminal {
                entry: Arc::clone(entry),
                lexical_probability,
            },
            probability,
        })
    }

    fn dependency_weight(&self, sentence: &TaggedSentence, dependency: &DependencyStructure) -> f64 {
        let head_pos = sentence.pos(dependency.head.word_index).unwrap_or_default();
        let object_pos = sentence.pos(dependency.object.word_index).unwrap_or_default();
        self.dependencies
            .dependency_weight(dependency, head_pos, object_pos)
    }

    /// Entries for the span `start..=end` built from smaller, complete spans.
    ///
    /// Entries already in the cell (multi-word lexical entries) compete in
    /// the same beam.
    pub(crate) fn fill_cell(
        &self,
        chart: &Chart,
        sentence: &TaggedSentence,
        start: usize,
        end: usize,
        cost: Option<&dyn ChartCost>,
    ) -> Vec<ChartEntry> {
        let mut beam = Beam::new(chart.beam_size());
        for entry in chart.entries(start, end) {
            beam.offer(entry.probability, entry.clone());
        }
        for split in start..end {
            let lefts = chart.entries(start, split);
            let rights = chart.entries(split + 1, end);
            for (left_index, left) in lefts.iter().enumerate() {
                for (right_index, right) in rights.iter().enumerate() {
                    for &move_id in self.grammar.moves_for(left.category, right.category) {
                        let left_pointer = EntryPointer::new(start, split, left_index);
                        let right_pointer = EntryPointer::new(split + 1, end, right_index);
                        if let Some(entry) = self.combine(sentence, left_pointer, left, right_pointer, right, move_id, cost) {
                            beam.offer(entry.probability, entry);
                        }
                    }
                }
            }
        }
        beam.into_sorted_vec()
    }

    /// Combine two adjacent entries with a search move.
    ///
    /// Dependencies whose pending variable resolves to a head in the joint
    /// space are filled and weighted here; the rest are carried into the
    /// result's variables, or dropped if their variable does not survive.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn combine(
        &self,
        sentence: &TaggedSentence,
        left_pointer: EntryPointer,
        left: &ChartEntry,
        right_pointer: EntryPointer,
        right: &ChartEntry,
        move_id: MoveId,
        cost: Option<&dyn ChartCost>,
    ) -> Option<ChartEntry> {
        let search_move = self.grammar.search_move(move_id);
        let combinator = self.grammar.combinator(search_move.combinator);
        let mut probability = left.probability * right.probability * self.move_weight(move_id);

        if let Some(cost) = cost {
            let unary_result = |unary: Option<usize>| {
                unary.map(|u| self.grammar.category(self.grammar.unary_combinator(u).result).as_ref())
            };
            probability *= cost.unary_cost(left_pointer.start, left_pointer.end, unary_result(search_move.left_unary));
            probability *= cost.unary_cost(right_pointer.start, right_pointer.end, unary_result(search_move.right_unary));
            probability *= cost.span_cost(left_pointer.start, right_pointer.end, self.grammar.category(combinator.result));
        }
        if probability <= 0.0 {
            return None;
        }

        let head_index = right_pointer.end;
        let mut joint: BTreeMap<i32, Vec<IndexedPredicate>> = BTreeMap::new();
        for (var, predicate) in &left.assignments {
            if let Some(j) = search_move.left_variable(*var) {
                joint.entry(j).or_default().push(predicate.clone());
            }
        }
        for (var, predicate) in &right.assignments {
            if let Some(j) = search_move.right_variable(*var) {
                joint.entry(j).or_default().push(predicate.clone());
            }
        }
        for (var, predicate) in &combinator.heads {
            joint
                .entry(*var)
                .or_default()
                .push(IndexedPredicate::new(predicate.as_str(), head_index));
        }

        let mut pending: Vec<UnfilledDependency> = Vec::new();
        pending.extend(
            left.unfilled
                .iter()
                .filter_map(|d| d.relabel(|v| search_move.left_variable(v))),
        );
        pending.extend(
            right
                .unfilled
                .iter()
                .filter_map(|d| d.relabel(|v| search_move.right_variable(v))),
        );
        for template in &combinator.dependencies {
            let side = |arg: &Argument<String>| match arg {
                Argument::Predicate(p) => Argument::Predicate(IndexedPredicate::new(p.as_str(), head_index)),
                Argument::Variable(v) => Argument::Variable(*v),
            };
            pending.push(UnfilledDependency {
                subject: side(&template.subject),
                subject_syntax: None,
                arg_num: template.arg_num,
                object: side(&template.object),
            });
        }

        let mut filled = Vec::new();
        let mut unfilled = Vec::new();
        for dependency in pending {
            for resolved in resolve(&dependency, &joint) {
                match resolved.to_filled() {
                    Some(structure) => {
                        probability *= self.dependency_weight(sentence, &structure);
                        filled.push(structure);
                    }
                    None => {
                        if let Some(carried) = resolved.relabel(|v| combinator.result_variable(v)) {
                            unfilled.push(carried);
                        }
                    }
                }
            }
        }

        let assignments = joint
            .into_iter()
            .filter_map(|(var, predicates)| combinator.result_variable(var).map(|r| (r, predicates)))
            .flat_map(|(r, predicates)| predicates.into_iter().map(move |p| (r, p)))
            .collect();

        Some(ChartEntry {
            category: combinator.result,
            root_unary: None,
            assignments,
            unfilled,
            filled,
            backpointer: Backpointer::Binary {
                left: left_pointer,
                right: right_pointer,
                search_move: move_id,
            },
            probability,
        })
    }

    /// Root-weighted entries for an entry spanning the sentence: the entry
    /// itself and one per applicable unary rule.
    pub(crate) fn root_entries(&self, entry: &ChartEntry, num_words: usize, cost: Option<&dyn ChartCost>) -> Vec<ChartEntry> {
        let end = num_words.saturating_sub(1);
        let mut out = Vec::new();

        let mut plain = entry.clone();
        plain.probability *= self.root_weights.get(entry.category).copied().unwrap_or(0.0);
        if let Some(cost) = cost {
            plain.probability *= cost.unary_cost(0, end, None);
        }
        if plain.probability > 0.0 {
            out.push(plain);
        }

        for &unary_id in self.grammar.unary_rules_for(entry.category) {
            let unary = self.grammar.unary_combinator(unary_id);
            let mut probability = entry.probability * self.unary_weights[unary_id] * self.root_weights[unary.result];
            if let Some(cost) = cost {
                probability *= cost.unary_cost(0, end, Some(self.grammar.category(unary.result)));
            }
            if probability <= 0.0 {
                continue;
            }
            out.push(ChartEntry {
                category: unary.result,
                root_unary: Some(unary_id),
                assignments: entry
                    .assignments
                    .iter()
                    .filter_map(|(v, p)| unary.result_variable(*v).map(|r| (r, p.clone())))
                    .collect(),
                unfilled: entry
                    .unfilled
                    .iter()
                    .filter_map(|d| d.relabel(|v| unary.result_variable(v)))
                    .collect(),
                filled: entry.filled.clone(),
                backpointer: entry.backpointer.clone(),
                probability,
            });
        }
        out
    }

    /// Fill the chart's root list from its whole-sentence cell.
    pub(crate) fn finish_root(&self, chart: &mut Chart, cost: Option<&dyn ChartCost>) {
        let n = chart.num_words();
        if n == 0 {
            return;
        }
        let mut beam = Beam::new(chart.beam_size());
        for entry in chart.entries(0, n - 1) {
            for root in self.root_entries(entry, n, cost) {
                beam.offer(root.probability, root);
            }
        }
        chart.set_root_entries(beam.into_sorted_vec());
    }

    // ========================================================================
    // Decoding
    // ========================================================================

    /// Decode the best `limit` root entries, applying post-filters.
    pub(crate) fn decode_roots(
        &self,
        chart: &Chart,
        sentence: &TaggedSentence,
        roots: &[ChartEntry],
        constraints: &ParseConstraints,
        limit: Option<usize>,
        hook: &dyn ParseHook,
    ) -> Vec<CcgParse> {
        hook.on_timer_start(DECODE_TIMER);
        let end = chart.num_words().saturating_sub(1);
        let parses: Vec<CcgParse> = roots
            .iter()
            .filter_map(|root| self.decode_entry(chart, sentence, root, 0, end))
            .filter(|parse| constraints.accepts(parse))
            .take(limit.unwrap_or(usize::MAX))
            .collect();
        hook.on_timer_stop(DECODE_TIMER);
        parses
    }

    /// Reconstruct the derivation below a chart entry over `start..=end`.
    pub fn decode_entry(
        &self,
        chart: &Chart,
        sentence: &TaggedSentence,
        entry: &ChartEntry,
        start: usize,
        end: usize,
    ) -> Option<CcgParse> {
        let parse = match &entry.backpointer {
            Backpointer::Terminal {
                entry: lexicon_entry,
                lexical_probability,
            } => {
                let base = match entry.root_unary {
                    Some(u) => self.grammar.unary_combinator(u).input,
                    None => entry.category,
                };
                CcgParse::terminal(
                    Arc::clone(self.grammar.category(base)),
                    Arc::clone(lexicon_entry),
                    sentence.span_words(start, end).to_vec(),
                    sentence.span_pos_tags(start, end).to_vec(),
                    start,
                    self.base_heads(entry),
                    entry.filled.clone(),
                    *lexical_probability,
                    entry.probability,
                )
            }
            Backpointer::Binary {
                left,
                right,
                search_move,
            } => {
                let search_move = self.grammar.search_move(*search_move);
                let combinator = self.grammar.combinator(search_move.combinator);
                let left_parse = self.decode_child(chart, sentence, *left, search_move.left_unary)?;
                let right_parse = self.decode_child(chart, sentence, *right, search_move.right_unary)?;
                let children = left_parse.subtree_probability() * right_parse.subtree_probability();
                let node_probability = if children > 0.0 {
                    entry.probability / children
                } else {
                    0.0
                };
                CcgParse::binary(
                    Arc::clone(self.grammar.category(combinator.result)),
                    Arc::clone(combinator),
                    left_parse,
                    right_parse,
                    self.base_heads(entry),
                    entry.filled.clone(),
                    node_probability,
                )
            }
        };
        Some(match entry.root_unary {
            Some(u) => {
                let combinator = self.grammar.unary_combinator(u);
                let result = self.grammar.category(combinator.result);
                let heads = entry.predicates_for(result.head_variable()).cloned().collect();
                parse.with_unary(Arc::clone(combinator), Arc::clone(result), heads)
            }
            None => parse,
        })
    }

    fn decode_child(
        &self,
        chart: &Chart,
        sentence: &TaggedSentence,
        pointer: EntryPointer,
        unary: Option<usize>,
    ) -> Option<CcgParse> {
        let entry = chart.entry(pointer)?;
        let parse = self.decode_entry(chart, sentence, entry, pointer.start, pointer.end)?;
        Some(match unary {
            Some(u) => {
                let combinator = self.grammar.unary_combinator(u);
                let result = self.grammar.category(combinator.result);
                let head = result.head_variable();
                let heads = entry
                    .assignments
                    .iter()
                    .filter(|(v, _)| combinator.result_variable(*v) == Some(head))
                    .map(|(_, p)| p.clone())
                    .collect();
                parse.with_unary(Arc::clone(combinator), Arc::clone(result), heads)
            }
            None => parse,
        })
    }

    /// Heads of an entry's category before any root unary rule.
    fn base_heads(&self, entry: &ChartEntry) -> Vec<IndexedPredicate> {
        let head = match entry.root_unary {
            // Root entries hold assignments over the unary result's variables.
            Some(u) => {
                let combinator = self.grammar.unary_combinator(u);
                let input_head = self.grammar.category(combinator.input).head_variable();
                match combinator.result_variable(input_head) {
                    Some(head) => head,
                    None => return Vec::new(),
                }
            }
            None => self.grammar.category(entry.category).head_variable(),
        };
        entry.predicates_for(head).cloned().collect()
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Whether the lexicon offers `entry`'s category for the span.
    pub fn is_possible_lexicon_entry(
        &self,
        sentence: &TaggedSentence,
        start: usize,
        end: usize,
        entry: &LexiconEntry,
    ) -> bool {
        self.grammar.category_id(entry.category.syntax()).is_some()
            && self
                .terminals
                .lexicon_entries(sentence, start, end)
                .iter()
                .any(|w| w.entry.category.syntax() == entry.category.syntax())
    }

    /// Whether some compiled combinator rewrites `left right` as `parent`,
    /// comparing categories with features stripped.
    pub fn is_possible_binary_rule(
        &self,
        left: &SyntacticCategory,
        right: &SyntacticCategory,
        parent: &SyntacticCategory,
    ) -> bool {
        let wanted = CcgRuleSchema::new(left, right, parent);
        let grammar = self.grammar.as_ref();
        grammar.combinators().iter().any(|c| {
            CcgRuleSchema::new(
                grammar.category(c.left).syntax(),
                grammar.category(c.right).syntax(),
                grammar.category(c.result).syntax(),
            ) == wanted
        })
    }

    /// Whether a derivation matching `tree` survives a beam of `beam_size`.
    pub fn is_possible_syntax_tree(&self, sentence: &TaggedSentence, tree: &CcgSyntaxTree, beam_size: usize) -> bool {
        let constraints = ParseConstraints::new().with_chart_cost(SyntacticChartFilter::new(tree));
        let config = ParserConfig::default().with_beam_size(beam_size);
        self.parse_with(sentence, &config, &constraints, &NullHook)
            .map(|parses| !parses.is_empty())
            .unwrap_or(false)
    }

    /// Whether a lexicon entry of the head word projects `dependency`'s
    /// predicate and argument slot.
    pub fn is_possible_dependency(&self, sentence: &TaggedSentence, dependency: &DependencyStructure) -> bool {
        let end = dependency.head.word_index;
        let max_span = self.terminals.max_span_length().max(1);
        (end.saturating_sub(max_span - 1)..=end).any(|start| {
            self.terminals
                .lexicon_entries(sentence, start, end)
                .iter()
                .any(|weighted| {
                    let lexical = weighted.entry.category.create_unfilled_dependencies(end);
                    let projects = |head: &IndexedPredicate, arg_num: usize| {
                        head.predicate == dependency.head.predicate && arg_num == dependency.arg_num
                    };
                    lexical.filled.iter().any(|d| projects(&d.head, d.arg_num))
                        || lexical
                            .unfilled
                            .values()
                            .flatten()
                            .any(|d| d.subject.predicate().is_some_and(|p| projects(p, d.arg_num)))
                })
        })
    }
}

/// Expand variable sides bound in the joint space into concrete predicates.
fn resolve(dependency: &UnfilledDependency, joint: &BTreeMap<i32, Vec<IndexedPredicate>>) -> Vec<UnfilledDependency> {
    let expand = |side: &Argument<IndexedPredicate>| -> Vec<Argument<IndexedPredicate>> {
        match side {
            Argument::Variable(v) => match joint.get(v) {
                Some(predicates) if !predicates.is_empty() => {
                    predicates.iter().cloned().map(Argument::Predicate).collect()
                }
                _ => vec![side.clone()],
            },
            Argument::Predicate(_) => vec![side.clone()],
        }
    };
    let subjects = expand(&dependency.subject);
    let objects = expand(&dependency.object);
    let mut out = Vec::with_capacity(subjects.len() * objects.len());
    for subject in &subjects {
        for object in &objects {
            out.push(UnfilledDependency {
                subject: subject.clone(),
                subject_syntax: dependency.subject_syntax.clone(),
                arg_num: dependency.arg_num,
                object: object.clone(),
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccg_core::CcgUnaryRule;

    fn parser(unary: &[&str]) -> CcgParser {
        let lexicon = Lexicon::parse_lines(["dog,N,", "barks,S\\N,barks 1 ?1"]).unwrap();
        let unary = CcgUnaryRule::parse_lines(unary.iter().copied()).unwrap();
        CcgParser::from_lexicon(lexicon, Vec::new(), unary, &CompileOptions::default()).unwrap()
    }

    fn initialized(parser: &CcgParser, sentence: &TaggedSentence) -> Chart {
        let mut chart = Chart::new(sentence.len(), Some(10));
        parser.initialize_chart(&mut chart, sentence, None);
        chart
    }

    #[test]
    fn test_inference_reused_across_calls() {
        let parser = parser(&[]);
        let config = ParserConfig::default().with_num_threads(Some(2));
        let first = parser.inference_for(&config).unwrap();
        let second = parser.inference_for(&config).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let sentence = TaggedSentence::untagged(["dog", "barks"]);
        assert_eq!(parser.parse(&sentence, &config).unwrap().len(), 1);
        assert!(Arc::ptr_eq(&first, &parser.inference_for(&config).unwrap()));

        let rebuilt = parser.inference_for(&config.clone().with_beam_size(5)).unwrap();
        assert!(!Arc::ptr_eq(&first, &rebuilt));
    }

    #[test]
    fn test_terminal_entries() {
        let parser = parser(&[]);
        let sentence = TaggedSentence::untagged(["dog", "barks"]);
        let chart = initialized(&parser, &sentence);
        assert_eq!(chart.num_entries(), 2);

        let barks = &chart.entries(1, 1)[0];
        assert_eq!(barks.unfilled.len(), 1);
        assert_eq!(barks.predicates_for(0).next().map(|p| p.word_index), Some(1));
    }

    #[test]
    fn test_combine_fills_dependency() {
        let parser = parser(&[]);
        let sentence = TaggedSentence::untagged(["dog", "barks"]);
        let chart = initialized(&parser, &sentence);
        let (dog, barks) = (&chart.entries(0, 0)[0], &chart.entries(1, 1)[0]);

        let moves = parser.grammar().moves_for(dog.category, barks.category);
        assert_eq!(moves.len(), 1);
        let entry = parser
            .combine(
                &sentence,
                EntryPointer::new(0, 0, 0),
                dog,
                EntryPointer::new(1, 1, 0),
                barks,
                moves[0],
                None,
            )
            .unwrap();
        assert_eq!(entry.filled.len(), 1);
        let expected = DependencyStructure::new(IndexedPredicate::new("barks", 1), 1, IndexedPredicate::new("dog", 0));
        assert_eq!(entry.filled[0].predication(), expected.predication());
        assert!(entry.unfilled.is_empty());
        let head = parser.grammar().category(entry.category).head_variable();
        assert_eq!(entry.predicates_for(head).next().map(|p| p.predicate.as_ref()), Some("barks"));
    }

    #[test]
    fn test_vetoed_combination() {
        struct Veto;
        impl ChartCost for Veto {
            fn span_cost(&self, start: usize, end: usize, _category: &ccg_core::HeadedSyntacticCategory) -> f64 {
                if start == end {
                    1.0
                } else {
                    0.0
                }
            }
        }
        let parser = parser(&[]);
        let sentence = TaggedSentence::untagged(["dog", "barks"]);
        let chart = initialized(&parser, &sentence);
        assert!(parser.fill_cell(&chart, &sentence, 0, 1, Some(&Veto)).is_empty());
        assert_eq!(parser.fill_cell(&chart, &sentence, 0, 1, None).len(), 1);
    }

    #[test]
    fn test_root_entries_apply_unary() {
        let parser = parser(&["N{0} (S{1}/(S{1}\\N{0}){1}){1}"]);
        let sentence = TaggedSentence::untagged(["dog"]);
        let chart = initialized(&parser, &sentence);
        let roots = parser.root_entries(&chart.entries(0, 0)[0], 1, None);
        assert_eq!(roots.len(), 2);
        assert!(roots[0].root_unary.is_none());
        assert!(roots[1].root_unary.is_some());
        // The raised noun keeps its predicate on the inner argument.
        assert_eq!(roots[1].assignments.len(), 1);
    }

    #[test]
    fn test_move_weights_include_unary() {
        let weights = crate::scoring::SyntaxWeights::new(1.0)
            .with_unary_weight("N{0} (S{1}/(S{1}\\N{0}){1}){1}", 0.5);
        let parser = parser(&["N{0} (S{1}/(S{1}\\N{0}){1}){1}"]).with_syntax_scorer(weights);
        let grammar = Arc::clone(parser.grammar());
        for id in 0..grammar.num_moves() {
            let search_move = grammar.search_move(id);
            let unaries = [search_move.left_unary, search_move.right_unary].iter().flatten().count();
            assert_eq!(parser.move_weight(id), 0.5f64.powi(unaries as i32));
        }
    }
}

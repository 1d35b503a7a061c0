//! Shift-reduce search over chart entries.
//!
//! A state is a stack of chart entries plus the next uncovered word. Each
//! round pops every queued state and:
//!
//! - SHIFT: pushes a lexical entry starting at the next word
//! - REDUCE: repeatedly combines the top two frames of the shifted stack,
//!   queueing every intermediate state
//!
//! The queue keeps the `beam_size` most probable states that still have
//! words to shift. Chart cells fill first come, up to `beam_size` entries. A state holding one frame over the whole sentence
//! contributes root entries instead of being queued; search ends when the
//! queue is empty.

use std::collections::{HashMap, HashSet};

use ccg_core::MoveId;

use crate::chart::{Backpointer, Beam, Chart, ChartEntry, EntryPointer};
use crate::filter::ChartCost;
use crate::hooks::ParseHook;
use crate::parse::CcgParse;
use crate::parser::CcgParser;
use crate::sentence::TaggedSentence;

use super::{
    run_search, AbortReason, Budget, CcgInference, ParseConstraints, SearchLimits,
    INITIALIZE_TIMER, SHIFT_REDUCE_TIMER,
};

/// Beam search over parser stacks.
#[derive(Debug, Clone)]
pub struct ShiftReduceInference {
    beam_size: usize,
    max_stack_size: Option<usize>,
    limits: SearchLimits,
}

#[derive(Debug, Clone)]
struct State {
    stack: Vec<EntryPointer>,
    next_word: usize,
}

type ReduceKey = (EntryPointer, EntryPointer, MoveId);

impl ShiftReduceInference {
    pub fn new(beam_size: usize) -> Self {
        Self {
            beam_size,
            max_stack_size: None,
            limits: SearchLimits::default(),
        }
    }

    /// Drop states whose stack would grow past `max_stack_size` frames.
    /// Defaults to one more than the sentence length.
    pub fn with_max_stack_size(mut self, max_stack_size: Option<usize>) -> Self {
        self.max_stack_size = max_stack_size;
        self
    }

    pub fn with_limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }

    fn search(
        &self,
        parser: &CcgParser,
        sentence: &TaggedSentence,
        constraints: &ParseConstraints,
        hook: &dyn ParseHook,
    ) -> Result<Vec<CcgParse>, AbortReason> {
        let chart = self.fill_chart(parser, sentence, constraints, hook)?;
        Ok(parser.decode_roots(
            &chart,
            sentence,
            chart.root_entries(),
            constraints,
            Some(self.beam_size),
            hook,
        ))
    }

    /// Run every round and return the chart with its root entries set.
    fn fill_chart(
        &self,
        parser: &CcgParser,
        sentence: &TaggedSentence,
        constraints: &ParseConstraints,
        hook: &dyn ParseHook,
    ) -> Result<Chart, AbortReason> {
        let budget = self.limits.start();
        let cost = constraints.chart_cost();
        let mut chart = Chart::new(sentence.len(), Some(self.beam_size));

        hook.on_timer_start(INITIALIZE_TIMER);
        parser.initialize_chart(&mut chart, sentence, cost);
        hook.on_timer_stop(INITIALIZE_TIMER);
        hook.on_terminals(chart.num_entries());
        budget.check(chart.num_entries())?;

        hook.on_timer_start(SHIFT_REDUCE_TIMER);
        let roots = self.run_rounds(parser, sentence, &mut chart, &budget, cost, hook);
        hook.on_timer_stop(SHIFT_REDUCE_TIMER);
        chart.set_root_entries(roots?);
        Ok(chart)
    }

    fn run_rounds(
        &self,
        parser: &CcgParser,
        sentence: &TaggedSentence,
        chart: &mut Chart,
        budget: &Budget,
        cost: Option<&dyn ChartCost>,
        hook: &dyn ParseHook,
    ) -> Result<Vec<ChartEntry>, AbortReason> {
        let n = sentence.len();
        let max_stack_size = self.max_stack_size.unwrap_or(n + 1);
        let mut reductions: HashMap<ReduceKey, Option<EntryPointer>> = HashMap::new();
        let mut completed: HashSet<EntryPointer> = HashSet::new();
        let mut roots = Beam::new(Some(self.beam_size));

        let mut queue = Beam::new(Some(self.beam_size));
        queue.offer(
            1.0,
            State {
                stack: Vec::new(),
                next_word: 0,
            },
        );
        let mut round = 0;

        while !queue.is_empty() {
            budget.check(chart.num_entries())?;
            let mut next = Beam::new(Some(self.beam_size));

            for state in queue.into_sorted_vec() {
                if budget.timed_out() {
                    return Err(AbortReason::Timeout);
                }
                if state.stack.len() >= max_stack_size {
                    continue;
                }
                for shifted in shift(chart, &state) {
                    let mut frontier = vec![shifted];
                    while let Some(current) = frontier.pop() {
                        frontier.extend(self.reduce(parser, sentence, chart, &current, &mut reductions, cost));
                        if current.next_word < n {
                            next.offer(stack_probability(chart, &current), current);
                        } else if let [frame] = current.stack.as_slice() {
                            if completed.insert(*frame) {
                                if let Some(entry) = chart.entry(*frame) {
                                    for root in parser.root_entries(entry, n, cost) {
                                        roots.offer(root.probability, root);
                                    }
                                }
                            }
                        }
                    }
                }
            }

            round += 1;
            hook.on_level_complete(round, chart.num_entries());
            queue = next;
        }

        Ok(roots.into_sorted_vec())
    }

    /// States reached by one REDUCE of `state`'s top two frames.
    fn reduce(
        &self,
        parser: &CcgParser,
        sentence: &TaggedSentence,
        chart: &mut Chart,
        state: &State,
        reductions: &mut HashMap<ReduceKey, Option<EntryPointer>>,
        cost: Option<&dyn ChartCost>,
    ) -> Vec<State> {
        let [.., left_pointer, right_pointer] = state.stack.as_slice() else {
            return Vec::new();
        };
        let (left_pointer, right_pointer) = (*left_pointer, *right_pointer);
        let (Some(left), Some(right)) = (chart.entry(left_pointer), chart.entry(right_pointer)) else {
            return Vec::new();
        };
        let moves = parser.grammar().moves_for(left.category, right.category).to_vec();

        let mut out = Vec::new();
        for move_id in moves {
            let key = (left_pointer, right_pointer, move_id);
            let pointer = match reductions.get(&key) {
                Some(pointer) => *pointer,
                None => {
                    let combined = match (chart.entry(left_pointer), chart.entry(right_pointer)) {
                        (Some(left), Some(right)) => {
                            parser.combine(sentence, left_pointer, left, right_pointer, right, move_id, cost)
                        }
                        _ => None,
                    };
                    let pointer = combined
                        .and_then(|entry| chart.push_entry(left_pointer.start, right_pointer.end, entry));
                    reductions.insert(key, pointer);
                    pointer
                }
            };
            if let Some(pointer) = pointer {
                let mut stack = state.stack[..state.stack.len() - 2].to_vec();
                stack.push(pointer);
                out.push(State {
                    stack,
                    next_word: state.next_word,
                });
            }
        }
        out
    }
}

/// States reached by pushing a lexical entry that starts at the next word.
fn shift(chart: &Chart, state: &State) -> Vec<State> {
    let start = state.next_word;
    let mut out = Vec::new();
    for end in start..chart.num_words() {
        for (index, entry) in chart.entries(start, end).iter().enumerate() {
            if !matches!(entry.backpointer, Backpointer::Terminal { .. }) {
                continue;
            }
            let mut stack = state.stack.clone();
            stack.push(EntryPointer::new(start, end, index));
            out.push(State {
                stack,
                next_word: end + 1,
            });
        }
    }
    out
}

fn stack_probability(chart: &Chart, state: &State) -> f64 {
    state
        .stack
        .iter()
        .map(|p| chart.entry(*p).map_or(0.0, |e| e.probability))
        .product()
}

impl CcgInference for ShiftReduceInference {
    fn beam_search(
        &self,
        parser: &CcgParser,
        sentence: &TaggedSentence,
        constraints: &ParseConstraints,
        hook: &dyn ParseHook,
    ) -> Vec<CcgParse> {
        run_search(sentence, hook, || self.search(parser, sentence, constraints, hook))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::NullHook;
    use crate::scoring::Lexicon;
    use ccg_core::{CcgBinaryRule, CcgUnaryRule, CompileOptions};

    fn parser() -> CcgParser {
        let lexicon = Lexicon::parse_lines(["dog,N,", "barks,S\\N,barks 1 ?1"]).unwrap();
        CcgParser::from_lexicon(lexicon, Vec::<CcgBinaryRule>::new(), Vec::new(), &CompileOptions::default()).unwrap()
    }

    #[test]
    fn test_shift_pushes_terminals_only() {
        let parser = parser();
        let sentence = TaggedSentence::untagged(["dog", "barks"]);
        let mut chart = Chart::new(2, Some(4));
        parser.initialize_chart(&mut chart, &sentence, None);
        let initial = State {
            stack: Vec::new(),
            next_word: 0,
        };
        let shifted = shift(&chart, &initial);
        assert_eq!(shifted.len(), 1);
        assert_eq!(shifted[0].next_word, 1);
        assert_eq!(shifted[0].stack, vec![EntryPointer::new(0, 0, 0)]);
    }

    #[test]
    fn test_shift_reduce_parses() {
        let parser = parser();
        let sentence = TaggedSentence::untagged(["dog", "barks"]);
        let parses =
            ShiftReduceInference::new(10).beam_search(&parser, &sentence, &ParseConstraints::new(), &NullHook);
        assert_eq!(parses.len(), 1);
        assert_eq!(parses[0].syntax().syntax().to_string(), "S");
    }

    #[test]
    fn test_cells_respect_beam_size() {
        let lexicon = Lexicon::parse_lines([
            "the,(N{1}/N{1}){0},the 1 ?1",
            "big,(N{1}/N{1}){0},big 1 ?1",
            "red,(N{1}/N{1}){0},red 1 ?1",
            "dog,N,",
            "cat,N,",
            "saw,(S\\N)/N,saw 1 ?1#saw 2 ?2",
        ])
        .unwrap();
        let unary = CcgUnaryRule::parse_lines(["N{0} (S{1}/(S{1}\\N{0}){1}){1}"]).unwrap();
        let parser = CcgParser::from_lexicon(lexicon, Vec::new(), unary, &CompileOptions::default()).unwrap();
        let sentence = TaggedSentence::untagged(["the", "big", "red", "dog", "saw", "the", "big", "cat"]);

        let beam_size = 2;
        let chart = ShiftReduceInference::new(beam_size)
            .fill_chart(&parser, &sentence, &ParseConstraints::new(), &NullHook)
            .unwrap();
        assert!(chart.num_entries() > sentence.len());
        for start in 0..sentence.len() {
            for end in start..sentence.len() {
                assert!(chart.entries(start, end).len() <= beam_size, "cell {}..={}", start, end);
            }
        }
    }

    #[test]
    fn test_stack_limit_blocks_parse() {
        let parser = parser();
        let sentence = TaggedSentence::untagged(["dog", "barks"]);
        let parses = ShiftReduceInference::new(10)
            .with_max_stack_size(Some(1))
            .beam_search(&parser, &sentence, &ParseConstraints::new(), &NullHook);
        assert!(parses.is_empty());
    }
}

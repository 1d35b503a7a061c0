//! CKY chart filling, shared by exact and beam inference.
//!
//! Spans are filled by increasing length. Cells of one length depend only on
//! shorter spans, so each level is computed against a frozen chart (possibly
//! in parallel) and written back before the next level starts.

use crate::chart::Chart;
use crate::filter::ChartCost;
use crate::hooks::ParseHook;
use crate::parse::CcgParse;
use crate::parser::CcgParser;
use crate::sentence::TaggedSentence;

use super::{
    run_search, AbortReason, Budget, CcgInference, ParseConstraints, Parallelism, SearchLimits,
    INITIALIZE_TIMER, INSIDE_TIMER,
};

/// Fill a chart whose cells hold at most `beam_size` entries, then its
/// root list.
#[allow(clippy::too_many_arguments)]
pub(crate) fn fill_chart(
    parser: &CcgParser,
    sentence: &TaggedSentence,
    beam_size: Option<usize>,
    limits: &SearchLimits,
    parallelism: &Parallelism,
    cost: Option<&dyn ChartCost>,
    hook: &dyn ParseHook,
) -> Result<Chart, AbortReason> {
    let budget = limits.start();
    let mut chart = Chart::new(sentence.len(), beam_size);

    hook.on_timer_start(INITIALIZE_TIMER);
    parser.initialize_chart(&mut chart, sentence, cost);
    hook.on_timer_stop(INITIALIZE_TIMER);
    hook.on_terminals(chart.num_entries());
    budget.check(chart.num_entries())?;

    hook.on_timer_start(INSIDE_TIMER);
    let filled = fill_levels(parser, sentence, &mut chart, &budget, parallelism, cost, hook);
    hook.on_timer_stop(INSIDE_TIMER);
    filled?;

    parser.finish_root(&mut chart, cost);
    Ok(chart)
}

fn fill_levels(
    parser: &CcgParser,
    sentence: &TaggedSentence,
    chart: &mut Chart,
    budget: &Budget,
    parallelism: &Parallelism,
    cost: Option<&dyn ChartCost>,
    hook: &dyn ParseHook,
) -> Result<(), AbortReason> {
    let n = chart.num_words();
    for length in 1..n {
        let frozen: &Chart = chart;
        let cells = parallelism.map(0..n - length, |start| {
            if budget.timed_out() {
                return None;
            }
            let end = start + length;
            let entries = parser.fill_cell(frozen, sentence, start, end, cost);
            hook.on_span_complete(start, end, entries.len());
            Some(entries)
        });
        for (start, entries) in cells.into_iter().enumerate() {
            let entries = entries.ok_or(AbortReason::Timeout)?;
            chart.set_entries(start, start + length, entries);
        }
        hook.on_level_complete(length, chart.num_entries());
        budget.check(chart.num_entries())?;
    }
    Ok(())
}

// ============================================================================
// Exact Inference
// ============================================================================

/// CKY without a beam: every entry of every cell is kept.
///
/// Returns every root derivation, best first. Only the chart-size budget
/// bounds the work.
#[derive(Debug, Clone, Default)]
pub struct CcgExactInference {
    limits: SearchLimits,
    parallelism: Parallelism,
}

impl CcgExactInference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// The filled chart, for inspection.
    pub fn fill_chart(
        &self,
        parser: &CcgParser,
        sentence: &TaggedSentence,
        constraints: &ParseConstraints,
        hook: &dyn ParseHook,
    ) -> Result<Chart, AbortReason> {
        fill_chart(
            parser,
            sentence,
            None,
            &self.limits,
            &self.parallelism,
            constraints.chart_cost(),
            hook,
        )
    }
}

impl CcgInference for CcgExactInference {
    fn beam_search(
        &self,
        parser: &CcgParser,
        sentence: &TaggedSentence,
        constraints: &ParseConstraints,
        hook: &dyn ParseHook,
    ) -> Vec<CcgParse> {
        run_search(sentence, hook, || {
            let chart = self.fill_chart(parser, sentence, constraints, hook)?;
            Ok(parser.decode_roots(&chart, sentence, chart.root_entries(), constraints, None, hook))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::NullHook;
    use crate::scoring::Lexicon;
    use ccg_core::{CcgBinaryRule, CompileOptions};

    fn parser() -> CcgParser {
        let lexicon = Lexicon::parse_lines([
            "big,(N{1}/N{1}){0},big 1 ?1",
            "red,(N{1}/N{1}){0},red 1 ?1",
            "dog,N,",
        ])
        .unwrap();
        CcgParser::from_lexicon(lexicon, Vec::<CcgBinaryRule>::new(), Vec::new(), &CompileOptions::default()).unwrap()
    }

    #[test]
    fn test_fill_chart_levels() {
        let parser = parser();
        let sentence = TaggedSentence::untagged(["big", "red", "dog"]);
        let chart = CcgExactInference::new()
            .fill_chart(&parser, &sentence, &ParseConstraints::new(), &NullHook)
            .unwrap();
        assert_eq!(chart.entries(0, 0).len(), 1);
        assert!(!chart.entries(1, 2).is_empty());
        assert!(!chart.entries(0, 2).is_empty());
        assert!(!chart.root_entries().is_empty());
    }

    #[test]
    fn test_fill_chart_chart_size_abort() {
        let parser = parser();
        let sentence = TaggedSentence::untagged(["big", "red", "dog"]);
        let inference = CcgExactInference::new().with_limits(SearchLimits {
            max_parse_time_millis: None,
            max_chart_size: Some(2),
        });
        let result = inference.fill_chart(&parser, &sentence, &ParseConstraints::new(), &NullHook);
        assert_eq!(result.err(), Some(AbortReason::ChartSizeExceeded));
    }

    #[test]
    fn test_exact_parses_modifier_chain() {
        let parser = parser();
        let sentence = TaggedSentence::untagged(["big", "red", "dog"]);
        let parses = CcgExactInference::new().beam_search(&parser, &sentence, &ParseConstraints::new(), &NullHook);
        assert!(!parses.is_empty());
        for parse in &parses {
            assert_eq!(parse.syntax().syntax().to_string(), "N");
        }
        let best = &parses[0];
        let heads: Vec<String> = best
            .all_dependencies()
            .iter()
            .map(|d| format!("{} {} {}", d.head.predicate, d.arg_num, d.object.predicate))
            .collect();
        assert!(heads.contains(&"red 1 dog".to_string()));
    }
}

//! CKY beam search.

use crate::hooks::ParseHook;
use crate::parse::CcgParse;
use crate::parser::CcgParser;
use crate::sentence::TaggedSentence;

use super::cky::fill_chart;
use super::{run_search, CcgInference, ParseConstraints, Parallelism, SearchLimits};

/// CKY keeping the `beam_size` best entries of every cell.
///
/// Returns up to `beam_size` derivations that pass the constraints' post
/// filters, best first.
#[derive(Debug, Clone)]
pub struct CcgBeamSearchInference {
    beam_size: usize,
    limits: SearchLimits,
    parallelism: Parallelism,
}

impl CcgBeamSearchInference {
    pub fn new(beam_size: usize) -> Self {
        Self {
            beam_size,
            limits: SearchLimits::default(),
            parallelism: Parallelism::default(),
        }
    }

    pub fn with_limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub fn beam_size(&self) -> usize {
        self.beam_size
    }
}

impl CcgInference for CcgBeamSearchInference {
    fn beam_search(
        &self,
        parser: &CcgParser,
        sentence: &TaggedSentence,
        constraints: &ParseConstraints,
        hook: &dyn ParseHook,
    ) -> Vec<CcgParse> {
        run_search(sentence, hook, || {
            let chart = fill_chart(
                parser,
                sentence,
                Some(self.beam_size),
                &self.limits,
                &self.parallelism,
                constraints.chart_cost(),
                hook,
            )?;
            Ok(parser.decode_roots(
                &chart,
                sentence,
                chart.root_entries(),
                constraints,
                Some(self.beam_size),
                hook,
            ))
        })
    }
}

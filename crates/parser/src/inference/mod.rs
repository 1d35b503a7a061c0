//! # Inference Strategies
//!
//! Every strategy implements [`CcgInference`]: given a [`CcgParser`] and a
//! tagged sentence, produce derivations best first. Search failures (no
//! derivation, exhausted budget, unsatisfiable constraints) yield an empty
//! list, never an error.
//!
//! ## Strategies
//!
//! - [`CcgBeamSearchInference`]: CKY with a bounded beam per cell
//! - [`CcgExactInference`]: CKY with unbounded cells
//! - [`ShiftReduceInference`]: a beam over stacks of chart entries
//!
//! ## Budgets
//!
//! A wall-clock deadline is checked before every cell and at every level or
//! round boundary; the chart size is checked at every boundary. Either one
//! running out aborts the parse with an empty result and reports an
//! [`AbortReason`] to the hook.

mod beam;
mod cky;
mod shift_reduce;

pub use beam::CcgBeamSearchInference;
pub use cky::CcgExactInference;
pub use shift_reduce::ShiftReduceInference;

use std::collections::HashSet;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ccg_core::{DependencyStructure, IndexedPredicate};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::ParserError;
use crate::filter::{ChartCost, CompositeCost, SyntacticChartFilter};
use crate::hooks::ParseHook;
use crate::parse::CcgParse;
use crate::parser::CcgParser;
use crate::sentence::TaggedSentence;
use crate::syntax_tree::CcgSyntaxTree;

pub(crate) const INITIALIZE_TIMER: &str = "ccg_parse/initialize_chart";
pub(crate) const INSIDE_TIMER: &str = "ccg_parse/calculate_inside_beam";
pub(crate) const DECODE_TIMER: &str = "ccg_parse/decode";
pub(crate) const SHIFT_REDUCE_TIMER: &str = "ccg_parse/shift_reduce";

// ============================================================================
// Inference Trait
// ============================================================================

/// A search strategy over a compiled grammar.
pub trait CcgInference: Send + Sync {
    /// Derivations of `sentence` satisfying `constraints`, best first.
    fn beam_search(
        &self,
        parser: &CcgParser,
        sentence: &TaggedSentence,
        constraints: &ParseConstraints,
        hook: &dyn ParseHook,
    ) -> Vec<CcgParse>;

    /// The single best derivation, if any.
    fn best_parse(
        &self,
        parser: &CcgParser,
        sentence: &TaggedSentence,
        constraints: &ParseConstraints,
        hook: &dyn ParseHook,
    ) -> Option<CcgParse> {
        self.beam_search(parser, sentence, constraints, hook)
            .into_iter()
            .next()
    }
}

/// Why a parse stopped before completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// The wall-clock budget ran out.
    Timeout,
    /// The chart grew past its size budget.
    ChartSizeExceeded,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::Timeout => write!(f, "time budget exceeded"),
            AbortReason::ChartSizeExceeded => write!(f, "chart size budget exceeded"),
        }
    }
}

/// Report the parse lifecycle to `hook` around a search.
pub(crate) fn run_search(
    sentence: &TaggedSentence,
    hook: &dyn ParseHook,
    search: impl FnOnce() -> Result<Vec<CcgParse>, AbortReason>,
) -> Vec<CcgParse> {
    hook.on_parse_start(sentence);
    let parses = if sentence.is_empty() {
        Vec::new()
    } else {
        search().unwrap_or_else(|reason| {
            hook.on_abort(reason);
            Vec::new()
        })
    };
    hook.on_parse_end(parses.len());
    parses
}

// ============================================================================
// Budgets
// ============================================================================

/// Time and size limits shared by all strategies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchLimits {
    pub max_parse_time_millis: Option<u64>,
    pub max_chart_size: Option<usize>,
}

impl SearchLimits {
    /// Start the clock.
    pub(crate) fn start(&self) -> Budget {
        Budget {
            deadline: self
                .max_parse_time_millis
                .map(|ms| Instant::now() + Duration::from_millis(ms)),
            max_chart_size: self.max_chart_size,
        }
    }
}

/// Limits of one running parse.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Budget {
    deadline: Option<Instant>,
    max_chart_size: Option<usize>,
}

impl Budget {
    pub(crate) fn timed_out(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Check both limits at a level or round boundary.
    pub(crate) fn check(&self, chart_size: usize) -> Result<(), AbortReason> {
        if self.timed_out() {
            return Err(AbortReason::Timeout);
        }
        match self.max_chart_size {
            Some(max) if chart_size > max => Err(AbortReason::ChartSizeExceeded),
            _ => Ok(()),
        }
    }
}

// ============================================================================
// Parallelism
// ============================================================================

/// Where the cells of a chart level are computed.
#[derive(Debug, Clone, Default)]
pub enum Parallelism {
    /// On the calling thread.
    #[default]
    Sequential,
    /// On the global rayon pool.
    Global,
    /// On a dedicated pool.
    Pool(Arc<ThreadPool>),
}

impl Parallelism {
    /// `Some(1)` is sequential, `None` uses the global pool, and any other
    /// count builds a dedicated pool.
    pub fn from_num_threads(num_threads: Option<usize>) -> Result<Self, ParserError> {
        match num_threads {
            Some(0) => Err(ParserError::invalid_config("num_threads must be positive")),
            Some(1) => Ok(Parallelism::Sequential),
            Some(n) => ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map(|pool| Parallelism::Pool(Arc::new(pool)))
                .map_err(|e| ParserError::ThreadPool {
                    message: e.to_string(),
                }),
            None => Ok(Parallelism::Global),
        }
    }

    /// Apply `f` to every index of `range`, keeping order.
    pub(crate) fn map<T, F>(&self, range: Range<usize>, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize) -> T + Send + Sync,
    {
        match self {
            Parallelism::Sequential => range.map(f).collect(),
            Parallelism::Global => range.into_par_iter().map(f).collect(),
            Parallelism::Pool(pool) => pool.install(|| range.into_par_iter().map(f).collect()),
        }
    }
}

// ============================================================================
// Constraints
// ============================================================================

type Predication = (IndexedPredicate, usize, IndexedPredicate);

/// External constraints on a parse.
///
/// A chart cost acts while the chart is filled. Gold dependencies and the
/// logical form check filter decoded parses.
#[derive(Clone, Default)]
pub struct ParseConstraints {
    chart_cost: Option<Arc<dyn ChartCost>>,
    gold_dependencies: Option<HashSet<Predication>>,
    logical_form: Option<Arc<dyn Fn(&CcgParse) -> bool + Send + Sync>>,
}

impl ParseConstraints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a chart cost, multiplying it with any cost already present.
    pub fn with_chart_cost(mut self, cost: impl ChartCost + 'static) -> Self {
        self.chart_cost = Some(match self.chart_cost.take() {
            Some(existing) => Arc::new(CompositeCost::new().with_shared(existing).with(cost)),
            None => Arc::new(cost),
        });
        self
    }

    /// Only allow derivations with the constituents of `tree`.
    pub fn with_gold_tree(self, tree: &CcgSyntaxTree) -> Self {
        self.with_chart_cost(SyntacticChartFilter::new(tree))
    }

    /// Only accept parses whose dependencies are exactly `dependencies`,
    /// ignoring head categories.
    pub fn with_gold_dependencies(mut self, dependencies: impl IntoIterator<Item = DependencyStructure>) -> Self {
        self.gold_dependencies = Some(dependencies.into_iter().map(|d| d.predication()).collect());
        self
    }

    /// Only accept parses for which `check` holds.
    pub fn with_logical_form(mut self, check: impl Fn(&CcgParse) -> bool + Send + Sync + 'static) -> Self {
        self.logical_form = Some(Arc::new(check));
        self
    }

    pub fn chart_cost(&self) -> Option<&dyn ChartCost> {
        self.chart_cost.as_deref()
    }

    /// Whether any constraint is set.
    pub fn is_conditional(&self) -> bool {
        self.chart_cost.is_some() || self.gold_dependencies.is_some() || self.logical_form.is_some()
    }

    /// Whether a decoded parse passes the post-filters.
    pub fn accepts(&self, parse: &CcgParse) -> bool {
        if let Some(gold) = &self.gold_dependencies {
            let found: HashSet<Predication> = parse
                .all_dependencies()
                .into_iter()
                .map(|d| d.predication())
                .collect();
            if &found != gold {
                return false;
            }
        }
        match &self.logical_form {
            Some(check) => check(parse),
            None => true,
        }
    }
}

impl fmt::Debug for ParseConstraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseConstraints")
            .field("chart_cost", &self.chart_cost.is_some())
            .field("gold_dependencies", &self.gold_dependencies)
            .field("logical_form", &self.logical_form.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_without_limits() {
        let budget = SearchLimits::default().start();
        assert!(!budget.timed_out());
        assert_eq!(budget.check(usize::MAX), Ok(()));
    }

    #[test]
    fn test_budget_zero_time() {
        let limits = SearchLimits {
            max_parse_time_millis: Some(0),
            max_chart_size: None,
        };
        assert_eq!(limits.start().check(0), Err(AbortReason::Timeout));
    }

    #[test]
    fn test_budget_chart_size() {
        let limits = SearchLimits {
            max_parse_time_millis: None,
            max_chart_size: Some(10),
        };
        let budget = limits.start();
        assert_eq!(budget.check(10), Ok(()));
        assert_eq!(budget.check(11), Err(AbortReason::ChartSizeExceeded));
    }

    #[test]
    fn test_parallelism_from_num_threads() {
        assert!(matches!(Parallelism::from_num_threads(Some(1)), Ok(Parallelism::Sequential)));
        assert!(matches!(Parallelism::from_num_threads(None), Ok(Parallelism::Global)));
        assert!(matches!(Parallelism::from_num_threads(Some(2)), Ok(Parallelism::Pool(_))));
        assert!(matches!(
            Parallelism::from_num_threads(Some(0)),
            Err(ParserError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_parallel_map_keeps_order() {
        let expected: Vec<usize> = (0..50).map(|i| i * i).collect();
        for parallelism in [Parallelism::Sequential, Parallelism::Global] {
            assert_eq!(parallelism.map(0..50, |i| i * i), expected);
        }
    }

    #[test]
    fn test_abort_reason_display() {
        assert_eq!(AbortReason::Timeout.to_string(), "time budget exceeded");
    }

    #[test]
    fn test_constraints_default_is_unconditional() {
        let constraints = ParseConstraints::new();
        assert!(!constraints.is_conditional());
        assert!(constraints.chart_cost().is_none());
    }
}

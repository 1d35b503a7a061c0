//! # Chart Costs
//!
//! A [`ChartCost`] rescales or vetoes chart entries before they are offered
//! to a beam. A cost of `0.0` removes the entry; any other value multiplies
//! its probability. Costs implement gold-tree and gold-supertag constraints
//! and external decoding penalties.
//!
//! Categories are compared structurally with features stripped, so a gold
//! `S[dcl]` matches a grammar `S[0]` or plain `S`.

use std::collections::HashMap;
use std::sync::Arc;

use ccg_core::{HeadedSyntacticCategory, LexiconEntry, SyntacticCategory};

use crate::syntax_tree::CcgSyntaxTree;

/// Multiplicative weights applied while the chart is filled.
///
/// Spans are inclusive word ranges. A unary check is made for every child of
/// a combination and for the root; `result` is `None` when no unary rule is
/// applied there.
pub trait ChartCost: Send + Sync {
    /// Weight of a lexicon entry over a span.
    fn terminal_cost(&self, start: usize, end: usize, entry: &LexiconEntry) -> f64 {
        self.span_cost(start, end, entry.category.syntax())
    }

    /// Weight of an entry with `category` over a span, before any unary rule.
    fn span_cost(&self, _start: usize, _end: usize, _category: &HeadedSyntacticCategory) -> f64 {
        1.0
    }

    /// Weight of applying (or not applying) a unary rule over a span.
    fn unary_cost(&self, _start: usize, _end: usize, _result: Option<&HeadedSyntacticCategory>) -> f64 {
        1.0
    }
}

fn same_shape(a: &SyntacticCategory, b: &SyntacticCategory) -> bool {
    a.without_features() == b.without_features()
}

// ============================================================================
// Gold Syntax Tree
// ============================================================================

#[derive(Debug, Clone)]
struct GoldSpan {
    syntax: SyntacticCategory,
    pre_unary: Option<SyntacticCategory>,
}

/// Restricts the chart to entries consistent with a gold syntax tree.
///
/// Entries over spans that are not constituents of the tree are vetoed, as
/// are entries whose category differs from the gold category of their span.
#[derive(Debug, Clone)]
pub struct SyntacticChartFilter {
    spans: HashMap<(usize, usize), GoldSpan>,
}

impl SyntacticChartFilter {
    pub fn new(tree: &CcgSyntaxTree) -> Self {
        let spans = tree
            .spans()
            .into_iter()
            .map(|(span, node)| {
                (
                    span,
                    GoldSpan {
                        syntax: node.syntax().clone(),
                        pre_unary: node.pre_unary().cloned(),
                    },
                )
            })
            .collect();
        Self { spans }
    }
}

impl ChartCost for SyntacticChartFilter {
    fn span_cost(&self, start: usize, end: usize, category: &HeadedSyntacticCategory) -> f64 {
        match self.spans.get(&(start, end)) {
            Some(gold) => {
                let expected = gold.pre_unary.as_ref().unwrap_or(&gold.syntax);
                if same_shape(expected, category.syntax()) {
                    1.0
                } else {
                    0.0
                }
            }
            None => 0.0,
        }
    }

    fn unary_cost(&self, start: usize, end: usize, result: Option<&HeadedSyntacticCategory>) -> f64 {
        let Some(gold) = self.spans.get(&(start, end)) else {
            return 0.0;
        };
        let consistent = match (&gold.pre_unary, result) {
            (None, None) => true,
            (Some(_), Some(result)) => same_shape(&gold.syntax, result.syntax()),
            _ => false,
        };
        if consistent {
            1.0
        } else {
            0.0
        }
    }
}

// ============================================================================
// Supertags
// ============================================================================

/// Restricts each word to a set of lexical categories.
///
/// Words with no listed supertags are unrestricted. Multi-word lexicon
/// entries are not filtered.
#[derive(Debug, Clone, Default)]
pub struct SupertagChartFilter {
    supertags: Vec<Vec<SyntacticCategory>>,
}

impl SupertagChartFilter {
    pub fn new(supertags: Vec<Vec<SyntacticCategory>>) -> Self {
        Self { supertags }
    }

    /// Use the lexical categories of a gold tree.
    pub fn from_tree(tree: &CcgSyntaxTree) -> Self {
        let mut supertags = vec![Vec::new(); tree.span_end() + 1];
        for (start, end, syntax) in tree.lexical_categories() {
            if start == end {
                supertags[start].push(syntax.clone());
            }
        }
        Self { supertags }
    }

    pub fn supertags(&self, word: usize) -> &[SyntacticCategory] {
        self.supertags.get(word).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl ChartCost for SupertagChartFilter {
    fn terminal_cost(&self, start: usize, end: usize, entry: &LexiconEntry) -> f64 {
        let allowed = self.supertags(start);
        if start != end || allowed.is_empty() {
            return 1.0;
        }
        let syntax = entry.category.syntax().syntax();
        if allowed.iter().any(|tag| same_shape(tag, syntax)) {
            1.0
        } else {
            0.0
        }
    }
}

// ============================================================================
// Composite
// ============================================================================

/// The product of several costs.
#[derive(Clone, Default)]
pub struct CompositeCost {
    costs: Vec<Arc<dyn ChartCost>>,
}

impl CompositeCost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a cost to the product.
    pub fn with<C: ChartCost + 'static>(mut self, cost: C) -> Self {
        self.costs.push(Arc::new(cost));
        self
    }

    pub fn with_shared(mut self, cost: Arc<dyn ChartCost>) -> Self {
        self.costs.push(cost);
        self
    }
}

impl ChartCost for CompositeCost {
    fn terminal_cost(&self, start: usize, end: usize, entry: &LexiconEntry) -> f64 {
        self.costs
            .iter()
            .map(|c| c.terminal_cost(start, end, entry))
            .product()
    }

    fn span_cost(&self, start: usize, end: usize, category: &HeadedSyntacticCategory) -> f64 {
        self.costs
            .iter()
            .map(|c| c.span_cost(start, end, category))
            .product()
    }

    fn unary_cost(&self, start: usize, end: usize, result: Option<&HeadedSyntacticCategory>) -> f64 {
        self.costs
            .iter()
            .map(|c| c.unary_cost(start, end, result))
            .product()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headed(s: &str) -> HeadedSyntacticCategory {
        HeadedSyntacticCategory::parse_with_default_heads(s).unwrap()
    }

    fn tree() -> CcgSyntaxTree {
        CcgSyntaxTree::parse_bracketed("<S[dcl] <NP <N dogs>> <(S[dcl]\\NP) bark>>").unwrap()
    }

    #[test]
    fn test_syntactic_filter_spans() {
        let filter = SyntacticChartFilter::new(&tree());
        assert_eq!(filter.span_cost(0, 1, &headed("S")), 1.0);
        assert_eq!(filter.span_cost(0, 0, &headed("N")), 1.0);
        assert_eq!(filter.span_cost(0, 0, &headed("NP")), 0.0);
        assert_eq!(filter.span_cost(1, 1, &headed("S\\N")), 0.0);
        assert_eq!(filter.span_cost(1, 1, &headed("S[1]\\NP")), 1.0);
    }

    #[test]
    fn test_syntactic_filter_unary() {
        let filter = SyntacticChartFilter::new(&tree());
        assert_eq!(filter.unary_cost(0, 0, Some(&headed("NP"))), 1.0);
        assert_eq!(filter.unary_cost(0, 0, None), 0.0);
        assert_eq!(filter.unary_cost(1, 1, None), 1.0);
        assert_eq!(filter.unary_cost(1, 1, Some(&headed("NP"))), 0.0);
    }

    #[test]
    fn test_supertag_filter() {
        let filter = SupertagChartFilter::from_tree(&tree());
        let noun = LexiconEntry::parse("dogs,N,").unwrap();
        let verb = LexiconEntry::parse("dogs,S\\NP,").unwrap();
        assert_eq!(filter.terminal_cost(0, 0, &noun), 1.0);
        assert_eq!(filter.terminal_cost(0, 0, &verb), 0.0);
        assert_eq!(filter.terminal_cost(5, 5, &verb), 1.0);
    }

    #[test]
    fn test_composite_cost_multiplies() {
        let filter = CompositeCost::new()
            .with(SyntacticChartFilter::new(&tree()))
            .with(SupertagChartFilter::from_tree(&tree()));
        let verb = LexiconEntry::parse("bark,S\\NP,").unwrap();
        assert_eq!(filter.terminal_cost(1, 1, &verb), 1.0);
        assert_eq!(filter.span_cost(0, 1, &headed("NP")), 0.0);
    }
}

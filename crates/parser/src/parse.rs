//! # Derivations
//!
//! A [`CcgParse`] is an immutable binary derivation decoded from a chart.
//! Every node records its category, its semantic heads, the dependencies
//! first filled there, and two probabilities:
//!
//! - `node_probability`: the weight contributed at this node alone
//! - `subtree_probability`: the product of node probabilities in the subtree
//!
//! A unary rule is stored on the node it rewrites; it is not a separate node.

use std::fmt;
use std::sync::Arc;

use ccg_core::{
    Combinator, CombinatorType, DependencyStructure, HeadedSyntacticCategory, IndexedPredicate,
    LexiconEntry, UnaryCombinator,
};
use petgraph::graph::{DiGraph, NodeIndex};
use serde_json::{json, Value};

use crate::syntax_tree::CcgSyntaxTree;

#[derive(Debug, Clone, PartialEq)]
enum ParseNode {
    Terminal {
        entry: Arc<LexiconEntry>,
        words: Vec<String>,
        pos_tags: Vec<String>,
        lexical_probability: f64,
    },
    Binary {
        combinator: Arc<Combinator>,
        left: Box<CcgParse>,
        right: Box<CcgParse>,
    },
}

/// A unary rule applied to a derivation node.
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryApplication {
    pub combinator: Arc<UnaryCombinator>,
    /// The node's category before the rule.
    pub input: Arc<HeadedSyntacticCategory>,
}

/// A weighted CCG derivation.
#[derive(Debug, Clone, PartialEq)]
pub struct CcgParse {
    syntax: Arc<HeadedSyntacticCategory>,
    unary: Option<UnaryApplication>,
    heads: Vec<IndexedPredicate>,
    dependencies: Vec<DependencyStructure>,
    node_probability: f64,
    subtree_probability: f64,
    span_start: usize,
    span_end: usize,
    node: ParseNode,
}

/// One node of [`CcgParse::to_graph`].
#[derive(Debug, Clone, PartialEq)]
pub struct DerivationNode {
    pub syntax: String,
    pub span_start: usize,
    pub span_end: usize,
    /// The words of a terminal, or the combinator of an internal node.
    pub label: String,
    pub node_probability: f64,
}

impl CcgParse {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn terminal(
        syntax: Arc<HeadedSyntacticCategory>,
        entry: Arc<LexiconEntry>,
        words: Vec<String>,
        pos_tags: Vec<String>,
        span_start: usize,
        heads: Vec<IndexedPredicate>,
        dependencies: Vec<DependencyStructure>,
        lexical_probability: f64,
        node_probability: f64,
    ) -> Self {
        let span_end = span_start + words.len().saturating_sub(1);
        Self {
            syntax,
            unary: None,
            heads,
            dependencies,
            node_probability,
            subtree_probability: node_probability,
            span_start,
            span_end,
            node: ParseNode::Terminal {
                entry,
                words,
                pos_tags,
                lexical_probability,
            },
        }
    }

    pub(crate) fn binary(
        syntax: Arc<HeadedSyntacticCategory>,
        combinator: Arc<Combinator>,
        left: CcgParse,
        right: CcgParse,
        heads: Vec<IndexedPredicate>,
        dependencies: Vec<DependencyStructure>,
        node_probability: f64,
    ) -> Self {
        let subtree_probability =
            left.subtree_probability * right.subtree_probability * node_probability;
        Self {
            syntax,
            unary: None,
            heads,
            dependencies,
            node_probability,
            subtree_probability,
            span_start: left.span_start,
            span_end: right.span_end,
            node: ParseNode::Binary {
                combinator,
                left: Box::new(left),
                right: Box::new(right),
            },
        }
    }

    /// Rewrite this node's category with a unary rule.
    pub(crate) fn with_unary(
        mut self,
        combinator: Arc<UnaryCombinator>,
        result: Arc<HeadedSyntacticCategory>,
        heads: Vec<IndexedPredicate>,
    ) -> Self {
        let input = std::mem::replace(&mut self.syntax, result);
        self.unary = Some(UnaryApplication { combinator, input });
        self.heads = heads;
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Category of this node, after any unary rule.
    pub fn syntax(&self) -> &Arc<HeadedSyntacticCategory> {
        &self.syntax
    }

    /// Category produced by the lexicon or combinator, before any unary rule.
    pub fn base_syntax(&self) -> &Arc<HeadedSyntacticCategory> {
        self.unary.as_ref().map_or(&self.syntax, |u| &u.input)
    }

    pub fn unary(&self) -> Option<&UnaryApplication> {
        self.unary.as_ref()
    }

    pub fn combinator(&self) -> Option<&Arc<Combinator>> {
        match &self.node {
            ParseNode::Binary { combinator, .. } => Some(combinator),
            ParseNode::Terminal { .. } => None,
        }
    }

    pub fn combinator_type(&self) -> Option<CombinatorType> {
        self.combinator().map(|c| c.kind)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.node, ParseNode::Terminal { .. })
    }

    pub fn left(&self) -> Option<&CcgParse> {
        match &self.node {
            ParseNode::Binary { left, .. } => Some(left),
            ParseNode::Terminal { .. } => None,
        }
    }

    pub fn right(&self) -> Option<&CcgParse> {
        match &self.node {
            ParseNode::Binary { right, .. } => Some(right),
            ParseNode::Terminal { .. } => None,
        }
    }

    /// The lexicon entry of a terminal node.
    pub fn lexicon_entry(&self) -> Option<&Arc<LexiconEntry>> {
        match &self.node {
            ParseNode::Terminal { entry, .. } => Some(entry),
            ParseNode::Binary { .. } => None,
        }
    }

    /// Prior probability of a terminal's lexicon entry.
    pub fn lexical_probability(&self) -> Option<f64> {
        match &self.node {
            ParseNode::Terminal {
                lexical_probability, ..
            } => Some(*lexical_probability),
            ParseNode::Binary { .. } => None,
        }
    }

    pub fn span_start(&self) -> usize {
        self.span_start
    }

    pub fn span_end(&self) -> usize {
        self.span_end
    }

    pub fn node_probability(&self) -> f64 {
        self.node_probability
    }

    pub fn subtree_probability(&self) -> f64 {
        self.subtree_probability
    }

    /// Predicates heading this node.
    pub fn semantic_heads(&self) -> &[IndexedPredicate] {
        &self.heads
    }

    /// Dependencies first filled at this node.
    pub fn node_dependencies(&self) -> &[DependencyStructure] {
        &self.dependencies
    }

    /// Every dependency in the derivation, depth first.
    pub fn all_dependencies(&self) -> Vec<&DependencyStructure> {
        let mut out = Vec::new();
        self.visit(&mut |node| out.extend(node.dependencies.iter()));
        out
    }

    /// Words spanned by this node.
    pub fn spanned_words(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.visit(&mut |node| {
            if let ParseNode::Terminal { words, .. } = &node.node {
                out.extend(words.iter().map(String::as_str));
            }
        });
        out
    }

    /// Part-of-speech tags spanned by this node.
    pub fn spanned_pos_tags(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.visit(&mut |node| {
            if let ParseNode::Terminal { pos_tags, .. } = &node.node {
                out.extend(pos_tags.iter().map(String::as_str));
            }
        });
        out
    }

    /// Lexicon entries of the terminals, left to right.
    pub fn spanned_lexicon_entries(&self) -> Vec<&Arc<LexiconEntry>> {
        let mut out = Vec::new();
        self.visit(&mut |node| out.extend(node.lexicon_entry()));
        out
    }

    /// Pre-order traversal.
    fn visit<'a>(&'a self, f: &mut impl FnMut(&'a CcgParse)) {
        f(self);
        if let ParseNode::Binary { left, right, .. } = &self.node {
            left.visit(f);
            right.visit(f);
        }
    }

    // ========================================================================
    // Conversions
    // ========================================================================

    /// The syntactic skeleton of this derivation.
    pub fn to_syntax_tree(&self) -> CcgSyntaxTree {
        let base = self.base_syntax().syntax().clone();
        let tree = match &self.node {
            ParseNode::Terminal {
                words, pos_tags, ..
            } => CcgSyntaxTree::terminal(base, words.clone(), pos_tags.clone(), self.span_start),
            ParseNode::Binary { left, right, .. } => {
                CcgSyntaxTree::binary(base, left.to_syntax_tree(), right.to_syntax_tree())
            }
        };
        match &self.unary {
            Some(_) => tree.with_unary(self.syntax.syntax().clone()),
            None => tree,
        }
    }

    /// The derivation as a graph with edges from parents to children.
    pub fn to_graph(&self) -> (DiGraph<DerivationNode, ()>, NodeIndex) {
        let mut graph = DiGraph::new();
        let root = self.add_to_graph(&mut graph);
        (graph, root)
    }

    fn add_to_graph(&self, graph: &mut DiGraph<DerivationNode, ()>) -> NodeIndex {
        let label = match &self.node {
            ParseNode::Terminal { words, .. } => words.join(" "),
            ParseNode::Binary { combinator, .. } => combinator.kind.to_string(),
        };
        let index = graph.add_node(DerivationNode {
            syntax: self.syntax.syntax().to_string(),
            span_start: self.span_start,
            span_end: self.span_end,
            label,
            node_probability: self.node_probability,
        });
        if let ParseNode::Binary { left, right, .. } = &self.node {
            let left_index = left.add_to_graph(graph);
            let right_index = right.add_to_graph(graph);
            graph.add_edge(index, left_index, ());
            graph.add_edge(index, right_index, ());
        }
        index
    }

    /// A JSON rendering of the derivation.
    pub fn to_json(&self) -> Value {
        let mut value = json!({
            "syntax": self.syntax.to_string(),
            "span": [self.span_start, self.span_end],
            "heads": self.heads.iter().map(|h| h.to_string()).collect::<Vec<_>>(),
            "dependencies": self.dependencies.iter().map(|d| d.to_string()).collect::<Vec<_>>(),
            "node_probability": self.node_probability,
            "subtree_probability": self.subtree_probability,
        });
        if let Some(unary) = &self.unary {
            value["unary"] = json!({
                "rule": unary.combinator.rule.source(),
                "input": unary.input.to_string(),
            });
        }
        match &self.node {
            ParseNode::Terminal {
                entry,
                words,
                pos_tags,
                lexical_probability,
            } => {
                value["words"] = json!(words);
                value["pos_tags"] = json!(pos_tags);
                value["lexicon_entry"] = json!(entry.to_string());
                value["lexical_probability"] = json!(lexical_probability);
            }
            ParseNode::Binary {
                combinator,
                left,
                right,
            } => {
                value["combinator"] = json!(combinator.kind.to_string());
                value["children"] = json!([left.to_json(), right.to_json()]);
            }
        }
        value
    }
}

impl fmt::Display for CcgParse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_syntax_tree())
    }
}

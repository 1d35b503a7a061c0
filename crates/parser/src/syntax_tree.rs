//! # Gold Syntax Trees
//!
//! A [`CcgSyntaxTree`] is a derivation's syntactic skeleton: categories and
//! words, without heads or dependencies. Trees come from annotated data and
//! are used to constrain or check a parse; the search never produces one
//! directly, though a [`CcgParse`](crate::parse::CcgParse) can be converted.
//!
//! ## Formats
//!
//! ```text
//! <S <N dog> <(S\N) barks>>                          bracketed
//! <NP <N dogs>>                                       a unary rule N => NP
//! (<T S 1 2> (<L N NN NN dog N>) (<L S\N VBZ VBZ barks S\N>))   CCGbank
//! ```

use std::collections::HashMap;
use std::fmt;

use ccg_core::{CcgRuleSchema, SyntacticCategory};

use crate::error::ParserError;

#[derive(Debug, Clone, PartialEq)]
enum TreeNode {
    Terminal {
        words: Vec<String>,
        pos_tags: Vec<String>,
    },
    Binary {
        left: Box<CcgSyntaxTree>,
        right: Box<CcgSyntaxTree>,
    },
}

/// A syntactic derivation over an inclusive word span.
#[derive(Debug, Clone, PartialEq)]
pub struct CcgSyntaxTree {
    syntax: SyntacticCategory,
    pre_unary: Option<SyntacticCategory>,
    span_start: usize,
    span_end: usize,
    node: TreeNode,
}

impl CcgSyntaxTree {
    pub fn terminal(
        syntax: SyntacticCategory,
        words: Vec<String>,
        pos_tags: Vec<String>,
        span_start: usize,
    ) -> Self {
        let span_end = span_start + words.len().saturating_sub(1);
        Self {
            syntax,
            pre_unary: None,
            span_start,
            span_end,
            node: TreeNode::Terminal { words, pos_tags },
        }
    }

    pub fn binary(syntax: SyntacticCategory, left: CcgSyntaxTree, right: CcgSyntaxTree) -> Self {
        Self {
            syntax,
            pre_unary: None,
            span_start: left.span_start,
            span_end: right.span_end,
            node: TreeNode::Binary {
                left: Box::new(left),
                right: Box::new(right),
            },
        }
    }

    /// Rewrite this node's category with a unary rule.
    pub fn with_unary(mut self, result: SyntacticCategory) -> Self {
        let before = std::mem::replace(&mut self.syntax, result);
        self.pre_unary.get_or_insert(before);
        self
    }

    /// Category of this node, after any unary rule.
    pub fn syntax(&self) -> &SyntacticCategory {
        &self.syntax
    }

    /// Category before a unary rule rewrote this node.
    pub fn pre_unary(&self) -> Option<&SyntacticCategory> {
        self.pre_unary.as_ref()
    }

    /// Category produced by the node's lexical entry or combinator.
    pub fn base_syntax(&self) -> &SyntacticCategory {
        self.pre_unary.as_ref().unwrap_or(&self.syntax)
    }

    pub fn span_start(&self) -> usize {
        self.span_start
    }

    pub fn span_end(&self) -> usize {
        self.span_end
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.node, TreeNode::Terminal { .. })
    }

    pub fn left(&self) -> Option<&CcgSyntaxTree> {
        match &self.node {
            TreeNode::Binary { left, .. } => Some(left),
            TreeNode::Terminal { .. } => None,
        }
    }

    pub fn right(&self) -> Option<&CcgSyntaxTree> {
        match &self.node {
            TreeNode::Binary { right, .. } => Some(right),
            TreeNode::Terminal { .. } => None,
        }
    }

    /// Words spanned by this node.
    pub fn words(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.visit_terminals(&mut |words, _| out.extend(words.iter().map(String::as_str)));
        out
    }

    /// Part-of-speech tags spanned by this node.
    pub fn pos_tags(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.visit_terminals(&mut |_, tags| out.extend(tags.iter().map(String::as_str)));
        out
    }

    fn visit_terminals<'a>(&'a self, visit: &mut impl FnMut(&'a [String], &'a [String])) {
        match &self.node {
            TreeNode::Terminal { words, pos_tags } => visit(words.as_slice(), pos_tags.as_slice()),
            TreeNode::Binary { left, right } => {
                left.visit_terminals(visit);
                right.visit_terminals(visit);
            }
        }
    }

    /// Lexical categories of the terminals, left to right, with their spans.
    pub fn lexical_categories(&self) -> Vec<(usize, usize, &SyntacticCategory)> {
        let mut out = Vec::new();
        self.collect_nodes(&mut |node| {
            if node.is_terminal() {
                out.push((node.span_start, node.span_end, node.base_syntax()));
            }
        });
        out
    }

    /// Every node indexed by its span.
    pub fn spans(&self) -> HashMap<(usize, usize), &CcgSyntaxTree> {
        let mut out = HashMap::new();
        self.collect_nodes(&mut |node| {
            out.insert((node.span_start, node.span_end), node);
        });
        out
    }

    fn collect_nodes<'a>(&'a self, visit: &mut impl FnMut(&'a CcgSyntaxTree)) {
        visit(self);
        if let TreeNode::Binary { left, right } = &self.node {
            left.collect_nodes(visit);
            right.collect_nodes(visit);
        }
    }

    /// The binary rule schemas used by this tree.
    pub fn rule_schemas(&self) -> Vec<CcgRuleSchema> {
        let mut out = Vec::new();
        self.collect_nodes(&mut |node| {
            if let TreeNode::Binary { left, right } = &node.node {
                out.push(CcgRuleSchema::new(left.syntax(), right.syntax(), node.base_syntax()));
            }
        });
        out
    }

    // ========================================================================
    // Parsing
    // ========================================================================

    /// Parse the bracketed `<S <N dog> <(S\N) barks>>` format.
    pub fn parse_bracketed(input: &str) -> Result<Self, ParserError> {
        let mut cursor = Cursor::new(input);
        let mut next_word = 0;
        let tree = parse_bracketed_node(&mut cursor, &mut next_word)?;
        cursor.expect_end()?;
        Ok(tree)
    }

    /// Parse a CCGbank `(<T cat head n> ...)` derivation.
    pub fn parse_ccgbank(input: &str) -> Result<Self, ParserError> {
        let mut cursor = Cursor::new(input);
        let mut next_word = 0;
        let tree = parse_ccgbank_node(&mut cursor, &mut next_word)?;
        cursor.expect_end()?;
        Ok(tree)
    }
}

impl fmt::Display for CcgSyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(pre_unary) = &self.pre_unary {
            write!(f, "<{} ", self.syntax)?;
            write_node(f, pre_unary, &self.node)?;
            return write!(f, ">");
        }
        write_node(f, &self.syntax, &self.node)
    }
}

fn write_node(f: &mut fmt::Formatter<'_>, syntax: &SyntacticCategory, node: &TreeNode) -> fmt::Result {
    match node {
        TreeNode::Terminal { words, .. } => write!(f, "<{} {}>", syntax, words.join(" ")),
        TreeNode::Binary { left, right } => write!(f, "<{} {} {}>", syntax, left, right),
    }
}

// ============================================================================
// Readers
// ============================================================================

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn error(&self, reason: impl Into<String>) -> ParserError {
        ParserError::malformed_tree(self.input, reason)
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.input[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.input[self.pos..].chars().next()
    }

    fn expect(&mut self, expected: char) -> Result<(), ParserError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += c.len_utf8();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{}' at {}, found '{}'", expected, self.pos, c))),
            None => Err(self.error(format!("expected '{}' at end of input", expected))),
        }
    }

    /// Read up to whitespace or one of `stops`.
    fn token(&mut self, stops: &[char]) -> &'a str {
        self.skip_whitespace();
        let rest = &self.input[self.pos..];
        let len = rest
            .find(|c: char| c.is_whitespace() || stops.contains(&c))
            .unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    /// Read everything up to (not including) `stop`.
    fn until(&mut self, stop: char) -> Result<&'a str, ParserError> {
        let rest = &self.input[self.pos..];
        let len = rest
            .find(stop)
            .ok_or_else(|| self.error(format!("missing '{}'", stop)))?;
        self.pos += len;
        Ok(&rest[..len])
    }

    fn expect_end(&mut self) -> Result<(), ParserError> {
        match self.peek() {
            None => Ok(()),
            Some(c) => Err(self.error(format!("unexpected '{}' after tree", c))),
        }
    }
}

fn parse_category(cursor: &Cursor<'_>, text: &str) -> Result<SyntacticCategory, ParserError> {
    SyntacticCategory::parse(text).map_err(|e| cursor.error(e.to_string()))
}

fn parse_bracketed_node(cursor: &mut Cursor<'_>, next_word: &mut usize) -> Result<CcgSyntaxTree, ParserError> {
    cursor.expect('<')?;
    let category_text = cursor.token(&['<', '>']);
    if category_text.is_empty() {
        return Err(cursor.error("missing category"));
    }
    let syntax = parse_category(cursor, category_text)?;

    let mut children = Vec::new();
    let mut words = Vec::new();
    loop {
        match cursor.peek() {
            Some('<') => children.push(parse_bracketed_node(cursor, next_word)?),
            Some('>') => {
                cursor.expect('>')?;
                break;
            }
            Some(_) => words.push(cursor.token(&['<', '>']).to_string()),
            None => return Err(cursor.error("unterminated node")),
        }
    }

    match (children.len(), words.is_empty()) {
        (0, false) => {
            let start = *next_word;
            *next_word += words.len();
            let tags = vec![String::new(); words.len()];
            Ok(CcgSyntaxTree::terminal(syntax, words, tags, start))
        }
        (1, true) => {
            let child = children.remove(0);
            if child.pre_unary.is_some() {
                return Err(cursor.error("nested unary rules are not supported"));
            }
            Ok(child.with_unary(syntax))
        }
        (2, true) => {
            let right = children.remove(1);
            let left = children.remove(0);
            Ok(CcgSyntaxTree::binary(syntax, left, right))
        }
        _ => Err(cursor.error(format!("node '{}' must have words, one child, or two children", category_text))),
    }
}

fn parse_ccgbank_node(cursor: &mut Cursor<'_>, next_word: &mut usize) -> Result<CcgSyntaxTree, ParserError> {
    cursor.expect('(')?;
    cursor.expect('<')?;
    let header = cursor.until('>')?;
    cursor.expect('>')?;
    let fields: Vec<&str> = header.split_whitespace().collect();

    let tree = match fields.as_slice() {
        ["L", category, _modified_pos, original_pos, word, ..] => {
            let syntax = parse_category(cursor, category)?;
            let start = *next_word;
            *next_word += 1;
            CcgSyntaxTree::terminal(syntax, vec![word.to_string()], vec![original_pos.to_string()], start)
        }
        ["T", category, _head, count] => {
            let syntax = parse_category(cursor, category)?;
            match *count {
                "1" => {
                    let child = parse_ccgbank_node(cursor, next_word)?;
                    if child.pre_unary.is_some() {
                        return Err(cursor.error("nested unary rules are not supported"));
                    }
                    child.with_unary(syntax)
                }
                "2" => {
                    let left = parse_ccgbank_node(cursor, next_word)?;
                    let right = parse_ccgbank_node(cursor, next_word)?;
                    CcgSyntaxTree::binary(syntax, left, right)
                }
                other => return Err(cursor.error(format!("invalid child count '{}'", other))),
            }
        }
        _ => return Err(cursor.error(format!("invalid node header '<{}>'", header))),
    };
    cursor.expect(')')?;
    Ok(tree)
}

//! # Grammar Rules
//!
//! Custom binary and unary rules extend the universal CCG combinators
//! (application and composition) with grammar-specific combinations, e.g.
//! coordination or type changing.
//!
//! ## Rule Line Formats
//!
//! ```text
//! left right parent###T|F###T|F###heads###subj argNum obj,...
//! input result[,logicalForm]
//! ```
//!
//! The three categories of a binary rule share one variable space. When a
//! category carries no `{n}` annotations it receives default heads, and the
//! `T|F` flags decide whether the parent is headed by the left or the right
//! input. The older comma form `left right parent,subj argNum obj` is also
//! accepted.

use std::collections::BTreeSet;
use std::fmt;

use crate::combinator::CombinatorType;
use crate::dependency::DependencyTemplate;
use crate::error::CcgError;
use crate::headed::HeadedSyntacticCategory;
use crate::syntax::{SyntacticCategory, UNBOUND};

const FIELD_DELIMITER: &str = "###";
const CONJUNCTION: &str = "conj";

fn rule_error(line: &str, reason: impl Into<String>) -> CcgError {
    CcgError::MalformedRule {
        line: line.to_string(),
        reason: reason.into(),
    }
}

fn irreconcilable(line: &str, reason: impl Into<String>) -> CcgError {
    CcgError::IrreconcilableRule {
        rule: line.to_string(),
        reason: reason.into(),
    }
}

fn parse_flag(line: &str, text: Option<&str>) -> Result<bool, CcgError> {
    match text.map(str::trim) {
        None | Some("") => Ok(false),
        Some("T") | Some("t") | Some("true") => Ok(true),
        Some("F") | Some("f") | Some("false") => Ok(false),
        Some(other) => Err(rule_error(line, format!("invalid head flag '{}'", other))),
    }
}

fn next_variable(categories: &[&HeadedSyntacticCategory]) -> i32 {
    categories
        .iter()
        .filter_map(|c| c.max_variable())
        .max()
        .map_or(0, |m| m + 1)
}

// ============================================================================
// Binary Rules
// ============================================================================

/// A grammar-specific binary combination `left right -> parent`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CcgBinaryRule {
    left: HeadedSyntacticCategory,
    right: HeadedSyntacticCategory,
    parent: HeadedSyntacticCategory,
    heads: Vec<String>,
    dependencies: Vec<DependencyTemplate>,
    kind: CombinatorType,
    source: String,
}

impl CcgBinaryRule {
    /// Build a rule from categories sharing a single variable space.
    pub fn new(
        left: HeadedSyntacticCategory,
        right: HeadedSyntacticCategory,
        parent: HeadedSyntacticCategory,
        heads: Vec<String>,
        dependencies: Vec<DependencyTemplate>,
    ) -> Result<Self, CcgError> {
        let source = format!("{} {} {}", left, right, parent);
        Self::validated(left, right, parent, heads, dependencies, source)
    }

    fn validated(
        left: HeadedSyntacticCategory,
        right: HeadedSyntacticCategory,
        parent: HeadedSyntacticCategory,
        heads: Vec<String>,
        dependencies: Vec<DependencyTemplate>,
        source: String,
    ) -> Result<Self, CcgError> {
        let mut vars: BTreeSet<i32> = BTreeSet::new();
        for category in [&left, &right, &parent] {
            vars.extend(category.unique_variables());
        }
        for dep in &dependencies {
            if let Some(var) = dep.variables().find(|v| !vars.contains(v)) {
                return Err(irreconcilable(
                    &source,
                    format!("dependency '{}' uses variable ?{} not present in the rule", dep, var),
                ));
            }
        }

        let mut input_features = left.syntax().feature_variables();
        input_features.extend(right.syntax().feature_variables());
        if let Some(var) = parent
            .syntax()
            .feature_variables()
            .into_iter()
            .find(|v| !input_features.contains(v))
        {
            return Err(irreconcilable(
                &source,
                format!("parent feature variable [{}] is not bound by either input", var),
            ));
        }

        let is_conj = |c: &HeadedSyntacticCategory| c.syntax().value() == Some(CONJUNCTION);
        let kind = if is_conj(&left) || is_conj(&right) {
            CombinatorType::Conjunction
        } else {
            CombinatorType::Other
        };

        Ok(Self {
            left,
            right,
            parent,
            heads,
            dependencies,
            kind,
            source,
        })
    }

    /// Parse a binary rule line.
    pub fn parse(line: &str) -> Result<Self, CcgError> {
        let line = line.trim();
        let (categories, left_head, right_head, heads, deps): (&str, _, _, Vec<String>, Vec<&str>) =
            if line.contains(FIELD_DELIMITER) {
                let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();
                let heads = fields
                    .get(3)
                    .map(|h| h.split_whitespace().map(str::to_string).collect())
                    .unwrap_or_default();
                let deps = fields
                    .get(4)
                    .map(|d| d.split([',', '#']).collect())
                    .unwrap_or_default();
                (
                    fields[0],
                    parse_flag(line, fields.get(1).copied())?,
                    parse_flag(line, fields.get(2).copied())?,
                    heads,
                    deps,
                )
            } else {
                let mut fields = line.split(',');
                let categories = fields.next().unwrap_or_default();
                (categories, false, false, Vec::new(), fields.collect())
            };

        let names: Vec<&str> = categories.split_whitespace().collect();
        if names.len() != 3 {
            return Err(rule_error(line, "expected 'left right parent' categories"));
        }
        let left = HeadedSyntacticCategory::parse(names[0])?;
        let right = HeadedSyntacticCategory::parse(names[1])?;
        let parent = HeadedSyntacticCategory::parse(names[2])?;

        let first_fresh = next_variable(&[&left, &right, &parent]);
        let left = left.fill_missing_variables_from(first_fresh);
        let right = right.fill_missing_variables_from(next_variable(&[&left]).max(first_fresh));
        let mut parent = parent;
        if parent.head_variable() == UNBOUND {
            if left_head {
                parent = parent.with_head_variable(left.head_variable());
            } else if right_head {
                parent = parent.with_head_variable(right.head_variable());
            }
        }
        let parent = parent.fill_missing_variables_from(next_variable(&[&left, &right, &parent]));

        let dependencies = deps
            .into_iter()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(|d| DependencyTemplate::parse(d).map_err(|reason| rule_error(line, reason)))
            .collect::<Result<Vec<_>, _>>()?;

        Self::validated(left, right, parent, heads, dependencies, line.to_string())
    }

    /// Parse many rule lines, skipping blank lines and `#` comments.
    pub fn parse_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Result<Vec<Self>, CcgError> {
        lines
            .into_iter()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(Self::parse)
            .collect()
    }

    pub fn left(&self) -> &HeadedSyntacticCategory {
        &self.left
    }

    pub fn right(&self) -> &HeadedSyntacticCategory {
        &self.right
    }

    pub fn parent(&self) -> &HeadedSyntacticCategory {
        &self.parent
    }

    /// Predicates assigned to the parent's head variable.
    pub fn heads(&self) -> &[String] {
        &self.heads
    }

    pub fn dependencies(&self) -> &[DependencyTemplate] {
        &self.dependencies
    }

    pub fn kind(&self) -> CombinatorType {
        self.kind
    }

    /// The rule as written.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Concrete feature values mentioned by the rule, excluding the default.
    pub fn feature_values(&self) -> BTreeSet<String> {
        let mut values = BTreeSet::new();
        for category in [&self.left, &self.right, &self.parent] {
            category.syntax().feature_values(&mut values);
        }
        values.remove("");
        values
    }
}

impl fmt::Display for CcgBinaryRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} -> {}", self.left, self.right, self.parent)
    }
}

// ============================================================================
// Unary Rules
// ============================================================================

/// A grammar-specific single-category rewrite `input -> result`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CcgUnaryRule {
    input: HeadedSyntacticCategory,
    result: HeadedSyntacticCategory,
    logical_form: Option<String>,
    source: String,
}

impl CcgUnaryRule {
    pub fn new(
        input: HeadedSyntacticCategory,
        result: HeadedSyntacticCategory,
        logical_form: Option<String>,
    ) -> Self {
        let source = format!("{} {}", input, result);
        Self {
            input,
            result,
            logical_form,
            source,
        }
    }

    /// Parse `input result[,logicalForm]`. An unannotated result is headed
    /// by the input's head.
    pub fn parse(line: &str) -> Result<Self, CcgError> {
        let line = line.trim();
        let (categories, logical_form) = match line.split_once(',') {
            Some((c, lf)) if !lf.trim().is_empty() => (c, Some(lf.trim().to_string())),
            Some((c, _)) => (c, None),
            None => (line, None),
        };
        let names: Vec<&str> = categories.split_whitespace().collect();
        if names.len() != 2 {
            return Err(rule_error(line, "expected 'input result' categories"));
        }
        let input = HeadedSyntacticCategory::parse(names[0])?;
        let result = HeadedSyntacticCategory::parse(names[1])?;

        let input = input.fill_missing_variables_from(next_variable(&[&input, &result]));
        let mut result = result;
        if result.head_variable() == UNBOUND {
            result = result.with_head_variable(input.head_variable());
        }
        let result = result.fill_missing_variables_from(next_variable(&[&input, &result]));

        Ok(Self {
            input,
            result,
            logical_form,
            source: line.to_string(),
        })
    }

    pub fn parse_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Result<Vec<Self>, CcgError> {
        lines
            .into_iter()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(Self::parse)
            .collect()
    }

    pub fn input(&self) -> &HeadedSyntacticCategory {
        &self.input
    }

    pub fn result(&self) -> &HeadedSyntacticCategory {
        &self.result
    }

    /// Opaque logical form attached to the rule.
    pub fn logical_form(&self) -> Option<&str> {
        self.logical_form.as_deref()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Concrete feature values mentioned by the rule, excluding the default.
    pub fn feature_values(&self) -> BTreeSet<String> {
        let mut values = BTreeSet::new();
        self.input.syntax().feature_values(&mut values);
        self.result.syntax().feature_values(&mut values);
        values.remove("");
        values
    }
}

impl fmt::Display for CcgUnaryRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.input, self.result)
    }
}

// ============================================================================
// Rule Schemas
// ============================================================================

/// An observed `left right -> parent` combination with features removed.
///
/// Schemas restrict grammar compilation to category pairs seen in data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CcgRuleSchema {
    pub left: String,
    pub right: String,
    pub parent: String,
}

impl CcgRuleSchema {
    pub fn new(left: &SyntacticCategory, right: &SyntacticCategory, parent: &SyntacticCategory) -> Self {
        Self {
            left: left.without_features().to_string(),
            right: right.without_features().to_string(),
            parent: parent.without_features().to_string(),
        }
    }

    /// True if the feature-free forms of the arguments match this schema.
    pub fn matches(&self, left: &SyntacticCategory, right: &SyntacticCategory) -> bool {
        self.left == left.without_features().to_string()
            && self.right == right.without_features().to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::Argument;

    #[test]
    fn test_parse_binary_rule_annotated() {
        let rule = CcgBinaryRule::parse(
            "N{0} (N{1}\\N{1}){1} N{1}###F###T###of###?1 1 ?0",
        )
        .unwrap();
        assert_eq!(rule.parent().head_variable(), 1);
        assert_eq!(rule.heads(), &["of".to_string()]);
        assert_eq!(rule.dependencies().len(), 1);
        assert_eq!(rule.kind(), CombinatorType::Other);
    }

    #[test]
    fn test_parse_binary_rule_default_heads() {
        let rule = CcgBinaryRule::parse("conj N N###F###T").unwrap();
        assert_eq!(rule.kind(), CombinatorType::Conjunction);
        assert_eq!(rule.left().head_variable(), 0);
        assert_eq!(rule.right().head_variable(), 1);
        assert_eq!(rule.parent().head_variable(), 1);
    }

    #[test]
    fn test_parse_binary_rule_legacy_format() {
        let rule = CcgBinaryRule::parse("N{0} N{1} N{1},?1 1 0").unwrap();
        assert_eq!(rule.dependencies()[0].subject, Argument::Variable(1));
        assert_eq!(rule.dependencies()[0].object, Argument::Variable(0));
    }

    #[test]
    fn test_binary_rule_errors() {
        assert!(matches!(
            CcgBinaryRule::parse("N N"),
            Err(CcgError::MalformedRule { .. })
        ));
        assert!(matches!(
            CcgBinaryRule::parse("N N N###X"),
            Err(CcgError::MalformedRule { .. })
        ));
        assert!(matches!(
            CcgBinaryRule::parse("N{0} N{1} N{1}###F###T######?5 1 ?0"),
            Err(CcgError::IrreconcilableRule { .. })
        ));
        assert!(matches!(
            CcgBinaryRule::parse("N[1]{0} N{1} S[2]{1}"),
            Err(CcgError::IrreconcilableRule { .. })
        ));
    }

    #[test]
    fn test_parse_unary_rule() {
        let rule = CcgUnaryRule::parse("N NP,(lambda x x)").unwrap();
        assert_eq!(rule.input().head_variable(), rule.result().head_variable());
        assert_eq!(rule.logical_form(), Some("(lambda x x)"));

        let raise = CcgUnaryRule::parse("N{0} (S{1}/(S{1}\\N{0}){1}){1}").unwrap();
        assert_eq!(raise.result().head_variable(), 1);
        assert!(raise.logical_form().is_none());
    }

    #[test]
    fn test_rule_feature_values() {
        let rule = CcgUnaryRule::parse("S[dcl]\\N N\\N").unwrap();
        assert_eq!(rule.feature_values().into_iter().collect::<Vec<_>>(), vec!["dcl"]);
    }

    #[test]
    fn test_rule_schema_ignores_features() {
        let schema = CcgRuleSchema::new(
            &SyntacticCategory::parse("N[nb]").unwrap(),
            &SyntacticCategory::parse("S[dcl]\\N").unwrap(),
            &SyntacticCategory::parse("S[dcl]").unwrap(),
        );
        assert!(schema.matches(
            &SyntacticCategory::parse("N").unwrap(),
            &SyntacticCategory::parse("S[1]\\N[2]").unwrap()
        ));
        assert_eq!(schema.parent, "S");
    }
}

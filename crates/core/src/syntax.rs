//! # Syntactic Categories
//!
//! A CCG syntactic category is a functional type built from atomic
//! categories (`N`, `S`, `NP`, ...) with the slashes `/` and `\`.
//!
//! ## Key Concepts
//!
//! - **Atomic**: a named leaf such as `N`
//! - **Functional**: `(X/Y)` consumes a `Y` on its right and returns `X`;
//!   `(X\Y)` consumes a `Y` on its left
//! - **Features**: every node may carry a feature, either a concrete value
//!   (`S[dcl]`) or a numbered feature variable (`S[1]`) that unification
//!   may bind
//!
//! ## Example
//!
//! ```rust
//! use ccg_core::syntax::{Direction, SyntacticCategory};
//!
//! let verb = SyntacticCategory::parse("(S[dcl]\\N)/N").unwrap();
//! assert_eq!(verb.direction(), Some(Direction::Right));
//! assert_eq!(verb.to_string(), "((S[dcl]\\N)/N)");
//! assert_eq!(SyntacticCategory::parse(&verb.to_string()).unwrap(), verb);
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::error::CcgError;

/// Semantic variable id marking "no variable".
pub const UNBOUND: i32 = -1;

/// The feature value meaning "no feature".
pub const DEFAULT_FEATURE: &str = "";

// ============================================================================
// Direction and Feature
// ============================================================================

/// The side on which a functional category takes its argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    /// `\`: the argument is to the left.
    Left,
    /// `/`: the argument is to the right.
    Right,
}

impl Direction {
    pub fn slash(&self) -> char {
        match self {
            Direction::Left => '\\',
            Direction::Right => '/',
        }
    }

    fn from_slash(c: char) -> Option<Direction> {
        match c {
            '\\' => Some(Direction::Left),
            '/' => Some(Direction::Right),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slash())
    }
}

/// The feature carried by a category node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feature {
    /// A concrete value; the empty string means "no feature".
    Value(String),
    /// A feature variable that unification may bind.
    Variable(usize),
}

impl Feature {
    pub fn none() -> Self {
        Feature::Value(DEFAULT_FEATURE.to_string())
    }

    pub fn variable(&self) -> Option<usize> {
        match self {
            Feature::Variable(v) => Some(*v),
            Feature::Value(_) => None,
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Feature::Value(v) => Some(v),
            Feature::Variable(_) => None,
        }
    }

    fn parse(text: &str) -> Feature {
        match text.trim().parse::<usize>() {
            Ok(var) => Feature::Variable(var),
            Err(_) => Feature::Value(text.trim().to_string()),
        }
    }
}

impl Default for Feature {
    fn default() -> Self {
        Feature::none()
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feature::Value(v) if v.is_empty() => Ok(()),
            Feature::Value(v) => write!(f, "[{}]", v),
            Feature::Variable(var) => write!(f, "[{}]", var),
        }
    }
}

// ============================================================================
// Feature Unification
// ============================================================================

/// The bindings forced by unifying two categories.
///
/// `assigned` binds feature variables of the left category, `other_assigned`
/// binds variables of the right category, and `relabeled` merges a left
/// variable into a right variable. `relabeled` is always one-to-one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureUnification {
    pub assigned: BTreeMap<usize, String>,
    pub other_assigned: BTreeMap<usize, String>,
    pub relabeled: BTreeMap<usize, usize>,
}

impl FeatureUnification {
    pub fn new() -> Self {
        Self::default()
    }

    /// The same bindings seen from the other category's side.
    pub fn reversed(&self) -> FeatureUnification {
        FeatureUnification {
            assigned: self.other_assigned.clone(),
            other_assigned: self.assigned.clone(),
            relabeled: self.relabeled.iter().map(|(k, v)| (*v, *k)).collect(),
        }
    }

    fn unify_features(&mut self, mine: &Feature, other: &Feature) -> bool {
        match (mine, other) {
            (Feature::Variable(m), Feature::Variable(o)) => {
                if self.assigned.contains_key(m) || self.other_assigned.contains_key(o) {
                    return false;
                }
                match self.relabeled.get(m) {
                    Some(existing) => *existing == *o,
                    None => {
                        if self.relabeled.values().any(|v| v == o) {
                            return false;
                        }
                        self.relabeled.insert(*m, *o);
                        true
                    }
                }
            }
            (Feature::Value(value), Feature::Variable(o)) => {
                if self.relabeled.values().any(|v| v == o) {
                    return false;
                }
                match self.other_assigned.get(o) {
                    Some(existing) => existing == value,
                    None => {
                        self.other_assigned.insert(*o, value.clone());
                        true
                    }
                }
            }
            (Feature::Variable(m), Feature::Value(value)) => {
                if self.relabeled.contains_key(m) {
                    return false;
                }
                match self.assigned.get(m) {
                    Some(existing) => existing == value,
                    None => {
                        self.assigned.insert(*m, value.clone());
                        true
                    }
                }
            }
            (Feature::Value(a), Feature::Value(b)) => a == b,
        }
    }
}

// ============================================================================
// Syntactic Category
// ============================================================================

/// An immutable CCG syntactic category.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SyntacticCategory {
    Atomic {
        value: String,
        feature: Feature,
    },
    Functional {
        direction: Direction,
        ret: Arc<SyntacticCategory>,
        arg: Arc<SyntacticCategory>,
        feature: Feature,
    },
}

impl SyntacticCategory {
    /// Create an atomic category with no feature.
    pub fn atomic(value: impl Into<String>) -> Self {
        SyntacticCategory::Atomic {
            value: value.into(),
            feature: Feature::none(),
        }
    }

    /// Create a functional category with no feature on its root.
    pub fn functional(
        direction: Direction,
        ret: SyntacticCategory,
        arg: SyntacticCategory,
    ) -> Self {
        SyntacticCategory::Functional {
            direction,
            ret: Arc::new(ret),
            arg: Arc::new(arg),
            feature: Feature::none(),
        }
    }

    /// Parse a category such as `(S\N)/N` or `S[dcl]/N[1]`.
    ///
    /// Any `{n}` semantic-variable annotations are accepted and ignored.
    pub fn parse(input: &str) -> Result<Self, CcgError> {
        parse_annotated(input).map(|(syntax, _)| syntax)
    }

    pub fn is_atomic(&self) -> bool {
        matches!(self, SyntacticCategory::Atomic { .. })
    }

    /// The name of an atomic category.
    pub fn value(&self) -> Option<&str> {
        match self {
            SyntacticCategory::Atomic { value, .. } => Some(value),
            SyntacticCategory::Functional { .. } => None,
        }
    }

    /// The feature on the root node.
    pub fn feature(&self) -> &Feature {
        match self {
            SyntacticCategory::Atomic { feature, .. } => feature,
            SyntacticCategory::Functional { feature, .. } => feature,
        }
    }

    pub fn direction(&self) -> Option<Direction> {
        match self {
            SyntacticCategory::Functional { direction, .. } => Some(*direction),
            SyntacticCategory::Atomic { .. } => None,
        }
    }

    pub fn return_type(&self) -> Option<&SyntacticCategory> {
        match self {
            SyntacticCategory::Functional { ret, .. } => Some(ret),
            SyntacticCategory::Atomic { .. } => None,
        }
    }

    pub fn argument_type(&self) -> Option<&SyntacticCategory> {
        match self {
            SyntacticCategory::Functional { arg, .. } => Some(arg),
            SyntacticCategory::Atomic { .. } => None,
        }
    }

    /// True if this is a function taking its argument from `direction`.
    pub fn accepts_argument_on(&self, direction: Direction) -> bool {
        self.direction() == Some(direction)
    }

    /// Replace the feature on the root node.
    pub fn with_feature(&self, feature: Feature) -> Self {
        match self {
            SyntacticCategory::Atomic { value, .. } => SyntacticCategory::Atomic {
                value: value.clone(),
                feature,
            },
            SyntacticCategory::Functional {
                direction,
                ret,
                arg,
                ..
            } => SyntacticCategory::Functional {
                direction: *direction,
                ret: Arc::clone(ret),
                arg: Arc::clone(arg),
                feature,
            },
        }
    }

    /// `(self <direction> argument)`.
    pub fn add_argument(&self, argument: SyntacticCategory, direction: Direction) -> Self {
        SyntacticCategory::functional(direction, self.clone(), argument)
    }

    /// Number of nodes in the category tree.
    pub fn num_subcategories(&self) -> usize {
        match self {
            SyntacticCategory::Atomic { .. } => 1,
            SyntacticCategory::Functional { ret, arg, .. } => {
                1 + ret.num_subcategories() + arg.num_subcategories()
            }
        }
    }

    /// Number of nodes in the return type; also the in-order index of the root.
    pub fn num_return_subcategories(&self) -> usize {
        self.return_type().map_or(0, |r| r.num_subcategories())
    }

    pub fn num_argument_subcategories(&self) -> usize {
        self.argument_type().map_or(0, |a| a.num_subcategories())
    }

    /// Check whether feature variables can be bound to make both categories equal.
    pub fn is_unifiable_with(&self, other: &SyntacticCategory) -> bool {
        self.unify(other).is_some()
    }

    /// Unify with `other`, returning the forced bindings.
    pub fn unify(&self, other: &SyntacticCategory) -> Option<FeatureUnification> {
        let mut bindings = FeatureUnification::new();
        if self.unify_into(other, &mut bindings) {
            Some(bindings)
        } else {
            None
        }
    }

    /// Unify on top of existing bindings. `bindings` is left untouched on failure.
    pub fn unify_with_bindings(
        &self,
        other: &SyntacticCategory,
        bindings: &mut FeatureUnification,
    ) -> bool {
        let mut scratch = bindings.clone();
        if self.unify_into(other, &mut scratch) {
            *bindings = scratch;
            true
        } else {
            false
        }
    }

    fn unify_into(&self, other: &SyntacticCategory, bindings: &mut FeatureUnification) -> bool {
        if !bindings.unify_features(self.feature(), other.feature()) {
            return false;
        }
        match (self, other) {
            (
                SyntacticCategory::Atomic { value: a, .. },
                SyntacticCategory::Atomic { value: b, .. },
            ) => a == b,
            (
                SyntacticCategory::Functional {
                    direction: d1,
                    ret: r1,
                    arg: a1,
                    ..
                },
                SyntacticCategory::Functional {
                    direction: d2,
                    ret: r2,
                    arg: a2,
                    ..
                },
            ) => d1 == d2 && a1.unify_into(a2, bindings) && r1.unify_into(r2, bindings),
            _ => false,
        }
    }

    /// Assign values to, or relabel, feature variables.
    pub fn assign_features(
        &self,
        assigned: &BTreeMap<usize, String>,
        relabeled: &BTreeMap<usize, usize>,
    ) -> Self {
        let feature = match self.feature() {
            Feature::Variable(var) => match (assigned.get(var), relabeled.get(var)) {
                (Some(value), _) => Feature::Value(value.clone()),
                (None, Some(new_var)) => Feature::Variable(*new_var),
                (None, None) => Feature::Variable(*var),
            },
            value => value.clone(),
        };
        match self {
            SyntacticCategory::Atomic { value, .. } => SyntacticCategory::Atomic {
                value: value.clone(),
                feature,
            },
            SyntacticCategory::Functional {
                direction,
                ret,
                arg,
                ..
            } => SyntacticCategory::Functional {
                direction: *direction,
                ret: Arc::new(ret.assign_features(assigned, relabeled)),
                arg: Arc::new(arg.assign_features(assigned, relabeled)),
                feature,
            },
        }
    }

    /// Assign `value` to every feature variable.
    pub fn assign_all_features(&self, value: &str) -> Self {
        let assigned = self
            .feature_variables()
            .into_iter()
            .map(|var| (var, value.to_string()))
            .collect();
        self.assign_features(&assigned, &BTreeMap::new())
    }

    /// The same category with every feature removed.
    pub fn without_features(&self) -> Self {
        match self {
            SyntacticCategory::Atomic { value, .. } => SyntacticCategory::atomic(value.clone()),
            SyntacticCategory::Functional {
                direction,
                ret,
                arg,
                ..
            } => SyntacticCategory::functional(
                *direction,
                ret.without_features(),
                arg.without_features(),
            ),
        }
    }

    /// All feature variables mentioned anywhere in the category.
    pub fn feature_variables(&self) -> BTreeSet<usize> {
        let mut vars = BTreeSet::new();
        self.collect_feature_variables(&mut vars);
        vars
    }

    fn collect_feature_variables(&self, vars: &mut BTreeSet<usize>) {
        if let Some(var) = self.feature().variable() {
            vars.insert(var);
        }
        if let SyntacticCategory::Functional { ret, arg, .. } = self {
            arg.collect_feature_variables(vars);
            ret.collect_feature_variables(vars);
        }
    }

    /// All concrete feature values, including the default empty value.
    pub fn feature_values(&self, values: &mut BTreeSet<String>) {
        if let Some(value) = self.feature().value() {
            values.insert(value.to_string());
        }
        if let SyntacticCategory::Functional { ret, arg, .. } = self {
            ret.feature_values(values);
            arg.feature_values(values);
        }
    }

    /// Add `offset` to every feature variable.
    pub fn shift_feature_variables(&self, offset: usize) -> Self {
        let relabeled = self
            .feature_variables()
            .into_iter()
            .map(|var| (var, var + offset))
            .collect();
        self.assign_features(&BTreeMap::new(), &relabeled)
    }

    /// Renumber feature variables in first-seen order (return type, root, argument).
    pub fn canonical_form(&self) -> Self {
        self.canonical_form_with_relabeling().0
    }

    /// Canonical form plus the old-to-new feature variable map.
    pub fn canonical_form_with_relabeling(&self) -> (Self, BTreeMap<usize, usize>) {
        let mut relabeling = BTreeMap::new();
        let canonical = self.canonicalize(&mut relabeling);
        (canonical, relabeling)
    }

    fn canonicalize(&self, relabeling: &mut BTreeMap<usize, usize>) -> Self {
        let ret = self.return_type().map(|r| r.canonicalize(relabeling));
        let feature = match self.feature() {
            Feature::Variable(var) => {
                let next = relabeling.len();
                Feature::Variable(*relabeling.entry(*var).or_insert(next))
            }
            value => value.clone(),
        };
        match (self, ret) {
            (SyntacticCategory::Functional { direction, arg, .. }, Some(ret)) => {
                let arg = arg.canonicalize(relabeling);
                SyntacticCategory::Functional {
                    direction: *direction,
                    ret: Arc::new(ret),
                    arg: Arc::new(arg),
                    feature,
                }
            }
            _ => self.with_feature(feature),
        }
    }

    /// Every category obtained by assigning some of the feature variables
    /// to values from `feature_values`. Includes `self`.
    pub fn subcategories(&self, feature_values: &BTreeSet<String>) -> Vec<SyntacticCategory> {
        let mut assignments: Vec<BTreeMap<usize, String>> = vec![BTreeMap::new()];
        for var in self.feature_variables() {
            let mut extended = Vec::with_capacity(assignments.len() * (feature_values.len() + 1));
            for assignment in &assignments {
                extended.push(assignment.clone());
                for value in feature_values {
                    let mut next = assignment.clone();
                    next.insert(var, value.clone());
                    extended.push(next);
                }
            }
            assignments = extended;
        }

        let mut result: Vec<SyntacticCategory> = Vec::new();
        for assignment in assignments {
            let category = self.assign_features(&assignment, &BTreeMap::new());
            if !result.contains(&category) {
                result.push(category);
            }
        }
        result
    }

    /// The innermost return category reached by following return types.
    pub fn final_return_type(&self) -> &SyntacticCategory {
        match self {
            SyntacticCategory::Functional { ret, .. } => ret.final_return_type(),
            SyntacticCategory::Atomic { .. } => self,
        }
    }
}

impl fmt::Display for SyntacticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntacticCategory::Atomic { value, feature } => write!(f, "{}{}", value, feature),
            SyntacticCategory::Functional {
                direction,
                ret,
                arg,
                feature,
            } => write!(f, "({}{}{}){}", ret, direction, arg, feature),
        }
    }
}

// ============================================================================
// Category Strings
// ============================================================================

/// Parse a category string, returning the syntax and the `{n}` annotation
/// of every node in in-order traversal order ([`UNBOUND`] where absent).
pub(crate) fn parse_annotated(input: &str) -> Result<(SyntacticCategory, Vec<i32>), CcgError> {
    check_balanced(input)?;
    parse_node(input, input)
}

fn check_balanced(input: &str) -> Result<(), CcgError> {
    let mut stack = Vec::new();
    for c in input.chars() {
        match c {
            '(' | '[' | '{' => stack.push(c),
            ')' | ']' | '}' => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if stack.pop() != Some(expected) {
                    return Err(CcgError::malformed_category(input, "unbalanced brackets"));
                }
            }
            _ => {}
        }
    }
    if stack.is_empty() {
        Ok(())
    } else {
        Err(CcgError::malformed_category(input, "unbalanced brackets"))
    }
}

/// Index of the leftmost slash at parenthesis depth zero.
fn find_top_level_slash(s: &str) -> Option<(usize, Direction)> {
    let mut depth = 0i32;
    for (i, c) in s.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            _ => {
                if depth == 0 {
                    if let Some(direction) = Direction::from_slash(c) {
                        return Some((i, direction));
                    }
                }
            }
        }
    }
    None
}

/// Index of the parenthesis closing the one opened at byte 0.
fn matching_paren(s: &str) -> Option<usize> {
    let mut depth = 0i32;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_node(s: &str, full: &str) -> Result<(SyntacticCategory, Vec<i32>), CcgError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(CcgError::malformed_category(full, "empty category"));
    }

    if let Some((idx, direction)) = find_top_level_slash(s) {
        let (ret, mut vars) = parse_node(&s[..idx], full)?;
        let (arg, arg_vars) = parse_node(&s[idx + 1..], full)?;
        vars.push(UNBOUND);
        vars.extend(arg_vars);
        return Ok((SyntacticCategory::functional(direction, ret, arg), vars));
    }

    let mut body = s;
    let mut var: Option<i32> = None;
    let mut feature: Option<Feature> = None;
    loop {
        if var.is_none() && body.ends_with('}') {
            let open = body
                .rfind('{')
                .ok_or_else(|| CcgError::malformed_category(full, "unbalanced braces"))?;
            let text = body[open + 1..body.len() - 1].trim();
            let parsed = text.parse::<i32>().map_err(|_| {
                CcgError::malformed_category(full, format!("invalid variable '{}'", text))
            })?;
            var = Some(parsed);
            body = body[..open].trim_end();
        } else if feature.is_none() && body.ends_with(']') {
            let open = body
                .rfind('[')
                .ok_or_else(|| CcgError::malformed_category(full, "unbalanced brackets"))?;
            feature = Some(Feature::parse(&body[open + 1..body.len() - 1]));
            body = body[..open].trim_end();
        } else {
            break;
        }
    }

    if body.starts_with('(') && matching_paren(body) == Some(body.len() - 1) {
        let (mut syntax, mut vars) = parse_node(&body[1..body.len() - 1], full)?;
        if let Some(feature) = feature {
            syntax = syntax.with_feature(feature);
        }
        if let Some(var) = var {
            let root = syntax.num_return_subcategories();
            vars[root] = var;
        }
        return Ok((syntax, vars));
    }

    if body.is_empty() {
        return Err(CcgError::malformed_category(full, "empty atomic category"));
    }
    if body
        .chars()
        .any(|c| c.is_whitespace() || "()[]{}/\\".contains(c))
    {
        return Err(CcgError::malformed_category(
            full,
            format!("invalid atomic category '{}'", body),
        ));
    }
    Ok((
        SyntacticCategory::Atomic {
            value: body.to_string(),
            feature: feature.unwrap_or_default(),
        },
        vec![var.unwrap_or(UNBOUND)],
    ))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cat(s: &str) -> SyntacticCategory {
        SyntacticCategory::parse(s).unwrap()
    }

    #[test]
    fn test_parse_atomic() {
        let n = cat("N");
        assert!(n.is_atomic());
        assert_eq!(n.value(), Some("N"));
        assert_eq!(n.to_string(), "N");
    }

    #[test]
    fn test_parse_functional_leftmost_slash() {
        let c = cat("S\\N/N");
        assert_eq!(c.direction(), Some(Direction::Left));
        assert_eq!(c.return_type().unwrap(), &cat("S"));
        assert_eq!(c.argument_type().unwrap(), &cat("N/N"));
    }

    #[test]
    fn test_parse_parenthesized() {
        let c = cat("(S\\N)/N");
        assert_eq!(c.direction(), Some(Direction::Right));
        assert_eq!(c.return_type().unwrap(), &cat("S\\N"));
        assert_eq!(c.num_subcategories(), 5);
        assert_eq!(c.num_return_subcategories(), 3);
        assert_eq!(c.num_argument_subcategories(), 1);
    }

    #[test]
    fn test_parse_features() {
        let c = cat("S[dcl]\\N[1]");
        assert_eq!(c.return_type().unwrap().feature(), &Feature::Value("dcl".into()));
        assert_eq!(c.argument_type().unwrap().feature(), &Feature::Variable(1));
        assert_eq!(c.to_string(), "(S[dcl]\\N[1])");

        let rooted = cat("(S\\N)[b]");
        assert_eq!(rooted.feature(), &Feature::Value("b".into()));
    }

    #[test]
    fn test_parse_ignores_semantic_annotations() {
        assert_eq!(cat("((S{0}\\N{1}){0}/N{2}){0}"), cat("(S\\N)/N"));
    }

    #[test]
    fn test_parse_malformed() {
        for bad in ["", "(S\\N", "S\\", "/N", "S\\N)", "N[x", "(S\\N){a}"] {
            assert!(
                matches!(
                    SyntacticCategory::parse(bad),
                    Err(CcgError::MalformedCategory { .. })
                ),
                "expected failure for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_unify_assigns_variables() {
        let a = cat("S[1]\\N");
        let b = cat("S[dcl]\\N");
        let bindings = a.unify(&b).unwrap();
        assert_eq!(bindings.assigned.get(&1).map(String::as_str), Some("dcl"));
        assert!(bindings.other_assigned.is_empty());
    }

    #[test]
    fn test_unify_relabels_variables() {
        let bindings = cat("S[1]/S[1]").unify(&cat("S[2]/S[2]")).unwrap();
        assert_eq!(bindings.relabeled.get(&1), Some(&2));
    }

    #[test]
    fn test_unify_conflict() {
        assert!(!cat("S[1]/S[1]").is_unifiable_with(&cat("S[dcl]/S[b]")));
        assert!(!cat("S/N").is_unifiable_with(&cat("S\\N")));
        assert!(!cat("S").is_unifiable_with(&cat("N")));
        assert!(!cat("S").is_unifiable_with(&cat("S/N")));
    }

    #[test]
    fn test_unify_with_bindings_untouched_on_failure() {
        let mut bindings = FeatureUnification::new();
        assert!(cat("N[1]").unify_with_bindings(&cat("N[nb]"), &mut bindings));
        let before = bindings.clone();
        assert!(!cat("N[1]").unify_with_bindings(&cat("N[b]"), &mut bindings));
        assert_eq!(bindings, before);
    }

    #[test]
    fn test_canonical_form() {
        let c = cat("(S[5]\\N[3])/N[5]");
        let (canonical, relabeling) = c.canonical_form_with_relabeling();
        assert_eq!(canonical, cat("(S[0]\\N[1])/N[0]"));
        assert_eq!(relabeling.get(&5), Some(&0));
        assert_eq!(relabeling.get(&3), Some(&1));
        assert_eq!(canonical.canonical_form(), canonical);
    }

    #[test]
    fn test_assign_all_features() {
        assert_eq!(cat("S[1]\\N[2]").assign_all_features("dcl"), cat("S[dcl]\\N[dcl]"));
    }

    #[test]
    fn test_subcategories() {
        let values: BTreeSet<String> = ["".to_string(), "dcl".to_string()].into_iter().collect();
        let subs = cat("S[1]\\N").subcategories(&values);
        assert_eq!(subs.len(), 3);
        assert!(subs.contains(&cat("S[1]\\N")));
        assert!(subs.contains(&cat("S\\N")));
        assert!(subs.contains(&cat("S[dcl]\\N")));
    }

    #[test]
    fn test_shift_feature_variables() {
        assert_eq!(cat("S[0]/S[1]").shift_feature_variables(3), cat("S[3]/S[4]"));
    }
}

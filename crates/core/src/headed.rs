//! # Headed Syntactic Categories
//!
//! A [`HeadedSyntacticCategory`] pairs a syntactic category with one
//! semantic variable per node. Variables say which word heads each part of
//! the category. In `((S{0}\N{1}){0}/N{2}){0}` the sentence is headed by
//! the verb (variable 0), while the subject and object are headed by
//! whatever fills variables 1 and 2.
//!
//! ## Key Concepts
//!
//! - **In-order layout**: variables are stored in in-order traversal order
//!   (return type, root, argument), so the root sits at index
//!   `num_return_subcategories()`
//! - **Canonical form**: variables renumbered `0..` in first-seen array
//!   order. Structurally identical categories are only equal once canonical.
//! - **Relabeling arrays**: index-aligned maps from one variable space to
//!   another, produced by [`HeadedSyntacticCategory::unify_variables`]

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::CcgError;
use crate::syntax::{parse_annotated, Direction, FeatureUnification, SyntacticCategory, UNBOUND};

/// A syntactic category with a semantic variable on every node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HeadedSyntacticCategory {
    syntax: SyntacticCategory,
    semantic_variables: Vec<i32>,
    root_index: usize,
}

impl HeadedSyntacticCategory {
    /// Create a headed category; `semantic_variables` must have one entry per node.
    pub fn new(syntax: SyntacticCategory, semantic_variables: Vec<i32>) -> Result<Self, CcgError> {
        if semantic_variables.len() != syntax.num_subcategories() {
            return Err(CcgError::malformed_category(
                &syntax.to_string(),
                format!(
                    "expected {} semantic variables, got {}",
                    syntax.num_subcategories(),
                    semantic_variables.len()
                ),
            ));
        }
        Ok(Self::from_parts(syntax, semantic_variables))
    }

    fn from_parts(syntax: SyntacticCategory, semantic_variables: Vec<i32>) -> Self {
        let root_index = syntax.num_return_subcategories();
        Self {
            syntax,
            semantic_variables,
            root_index,
        }
    }

    /// Parse a category with `{n}` annotations. Unannotated nodes get [`UNBOUND`].
    pub fn parse(input: &str) -> Result<Self, CcgError> {
        let (syntax, vars) = parse_annotated(input)?;
        Ok(Self::from_parts(syntax, vars))
    }

    /// Parse and fill any missing annotations with [`Self::fill_missing_variables`].
    pub fn parse_with_default_heads(input: &str) -> Result<Self, CcgError> {
        Self::parse(input).map(|c| c.fill_missing_variables())
    }

    pub fn syntax(&self) -> &SyntacticCategory {
        &self.syntax
    }

    pub fn semantic_variables(&self) -> &[i32] {
        &self.semantic_variables
    }

    pub fn root_index(&self) -> usize {
        self.root_index
    }

    /// The variable on the root node.
    pub fn head_variable(&self) -> i32 {
        self.semantic_variables[self.root_index]
    }

    pub fn is_atomic(&self) -> bool {
        self.syntax.is_atomic()
    }

    pub fn direction(&self) -> Option<Direction> {
        self.syntax.direction()
    }

    /// True if some node has no variable.
    pub fn has_unbound_variables(&self) -> bool {
        self.semantic_variables.contains(&UNBOUND)
    }

    /// Replace every [`UNBOUND`] with the conventional head assignment.
    ///
    /// An unannotated root takes the first annotated variable down its return
    /// chain, or a fresh one. An unannotated return child inherits its
    /// parent's variable. An unannotated argument child starts a fresh head.
    pub fn fill_missing_variables(&self) -> Self {
        self.fill_missing_variables_from(0)
    }

    /// Like [`Self::fill_missing_variables`], but fresh variables are never
    /// smaller than `first_fresh`.
    pub fn fill_missing_variables_from(&self, first_fresh: i32) -> Self {
        let mut vars = self.semantic_variables.clone();
        let mut next = self.max_variable().map_or(0, |m| m + 1).max(first_fresh);
        fill_node(&self.syntax, &mut vars, None, &mut next);
        Self::from_parts(self.syntax.clone(), vars)
    }

    /// Set the root variable, keeping every other node as it is.
    pub fn with_head_variable(&self, var: i32) -> Self {
        let mut vars = self.semantic_variables.clone();
        vars[self.root_index] = var;
        Self::from_parts(self.syntax.clone(), vars)
    }

    /// Renumber semantic variables in first-seen order and canonicalize features.
    pub fn canonical_form(&self) -> Self {
        self.canonical_form_with_relabeling().0
    }

    /// Canonical form plus the old-to-new semantic variable map.
    pub fn canonical_form_with_relabeling(&self) -> (Self, BTreeMap<i32, i32>) {
        let mut relabeling = BTreeMap::new();
        let vars = canonical_variables(&self.semantic_variables, &mut relabeling);
        let syntax = self.syntax.canonical_form();
        (Self::from_parts(syntax, vars), relabeling)
    }

    pub fn is_canonical(&self) -> bool {
        *self == self.canonical_form()
    }

    /// The argument type, with its slice of variables.
    pub fn argument_type(&self) -> Option<Self> {
        self.syntax.argument_type().map(|arg| {
            Self::from_parts(
                arg.clone(),
                self.semantic_variables[self.root_index + 1..].to_vec(),
            )
        })
    }

    /// The return type, with its slice of variables.
    pub fn return_type(&self) -> Option<Self> {
        self.syntax.return_type().map(|ret| {
            Self::from_parts(ret.clone(), self.semantic_variables[..self.root_index].to_vec())
        })
    }

    /// `(self <direction> argument){root_var}`.
    pub fn add_argument(&self, argument: &Self, direction: Direction, root_var: i32) -> Self {
        let syntax = self.syntax.add_argument(argument.syntax.clone(), direction);
        let mut vars = self.semantic_variables.clone();
        vars.push(root_var);
        vars.extend_from_slice(&argument.semantic_variables);
        Self::from_parts(syntax, vars)
    }

    /// Replace each variable `current[i]` with `relabeled[i]`.
    /// Variables absent from `current` become [`UNBOUND`].
    pub fn relabel_variables(&self, current: &[i32], relabeled: &[i32]) -> Self {
        let vars = self
            .semantic_variables
            .iter()
            .map(|var| {
                current
                    .iter()
                    .position(|c| c == var)
                    .and_then(|i| relabeled.get(i).copied())
                    .unwrap_or(UNBOUND)
            })
            .collect();
        Self::from_parts(self.syntax.clone(), vars)
    }

    /// Sorted, distinct semantic variables (excluding [`UNBOUND`]).
    pub fn unique_variables(&self) -> Vec<i32> {
        let set: BTreeSet<i32> = self
            .semantic_variables
            .iter()
            .copied()
            .filter(|v| *v != UNBOUND)
            .collect();
        set.into_iter().collect()
    }

    pub fn max_variable(&self) -> Option<i32> {
        self.semantic_variables.iter().copied().filter(|v| *v != UNBOUND).max()
    }

    /// Map each of `unique_vars` onto the variables of `target` by aligning
    /// this category's variable array with `target`'s.
    ///
    /// Returns `None` if one variable would map to two targets, or two
    /// variables to the same target. Variables with no counterpart receive
    /// fresh ids above both `assigned_vars` and `target`'s variables.
    pub fn unify_variables(
        &self,
        unique_vars: &[i32],
        target: &Self,
        assigned_vars: &[i32],
    ) -> Option<Vec<i32>> {
        if target.semantic_variables.len() != self.semantic_variables.len() {
            return None;
        }

        let mut mapping = vec![UNBOUND; unique_vars.len()];
        for (var, target_var) in self
            .semantic_variables
            .iter()
            .zip(target.semantic_variables.iter())
        {
            if *var == UNBOUND || *target_var == UNBOUND {
                continue;
            }
            let index = unique_vars.iter().position(|u| u == var)?;
            if mapping[index] == UNBOUND {
                mapping[index] = *target_var;
            } else if mapping[index] != *target_var {
                return None;
            }
        }

        let mut seen = BTreeSet::new();
        for var in mapping.iter().filter(|v| **v != UNBOUND) {
            if !seen.insert(*var) {
                return None;
            }
        }

        let max_assigned = assigned_vars.iter().copied().max().unwrap_or(0);
        let max_target = target.max_variable().unwrap_or(0);
        let mut next = max_assigned.max(max_target) + 1;
        for slot in mapping.iter_mut().filter(|v| **v == UNBOUND) {
            *slot = next;
            next += 1;
        }
        Some(mapping)
    }

    /// Check unifiability: same root position, unifiable syntax, and the
    /// same variable sharing pattern.
    pub fn is_unifiable_with(&self, other: &Self) -> bool {
        self.unify(other).is_some()
    }

    /// Unify with `other`, returning the forced feature bindings.
    pub fn unify(&self, other: &Self) -> Option<FeatureUnification> {
        if self.root_index != other.root_index
            || self.semantic_variables.len() != other.semantic_variables.len()
        {
            return None;
        }
        let mut mine = BTreeMap::new();
        let mut theirs = BTreeMap::new();
        if canonical_variables(&self.semantic_variables, &mut mine)
            != canonical_variables(&other.semantic_variables, &mut theirs)
        {
            return None;
        }
        self.syntax.unify(&other.syntax)
    }

    pub fn assign_features(
        &self,
        assigned: &BTreeMap<usize, String>,
        relabeled: &BTreeMap<usize, usize>,
    ) -> Self {
        Self::from_parts(
            self.syntax.assign_features(assigned, relabeled),
            self.semantic_variables.clone(),
        )
    }

    pub fn assign_all_features(&self, value: &str) -> Self {
        Self::from_parts(
            self.syntax.assign_all_features(value),
            self.semantic_variables.clone(),
        )
    }

    pub fn shift_feature_variables(&self, offset: usize) -> Self {
        Self::from_parts(
            self.syntax.shift_feature_variables(offset),
            self.semantic_variables.clone(),
        )
    }

    /// Feature-assignment variants of this category (including itself).
    pub fn subcategories(&self, feature_values: &BTreeSet<String>) -> Vec<Self> {
        self.syntax
            .subcategories(feature_values)
            .into_iter()
            .map(|syntax| Self::from_parts(syntax, self.semantic_variables.clone()))
            .collect()
    }

    fn write_node(
        f: &mut fmt::Formatter<'_>,
        syntax: &SyntacticCategory,
        vars: &[i32],
    ) -> fmt::Result {
        match syntax {
            SyntacticCategory::Atomic { value, feature } => {
                write!(f, "{}{}{{{}}}", value, feature, vars[0])
            }
            SyntacticCategory::Functional {
                direction,
                ret,
                arg,
                feature,
            } => {
                let root = syntax.num_return_subcategories();
                write!(f, "(")?;
                Self::write_node(f, ret, &vars[..root])?;
                write!(f, "{}", direction)?;
                Self::write_node(f, arg, &vars[root + 1..])?;
                write!(f, "){}{{{}}}", feature, vars[root])
            }
        }
    }
}

impl fmt::Display for HeadedSyntacticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Self::write_node(f, &self.syntax, &self.semantic_variables)
    }
}

fn canonical_variables(vars: &[i32], relabeling: &mut BTreeMap<i32, i32>) -> Vec<i32> {
    vars.iter()
        .map(|var| {
            if *var == UNBOUND {
                UNBOUND
            } else {
                let next = relabeling.len() as i32;
                *relabeling.entry(*var).or_insert(next)
            }
        })
        .collect()
}

fn return_chain_variable(syntax: &SyntacticCategory, vars: &[i32]) -> Option<i32> {
    let root = syntax.num_return_subcategories();
    if vars[root] != UNBOUND {
        return Some(vars[root]);
    }
    syntax
        .return_type()
        .and_then(|ret| return_chain_variable(ret, &vars[..root]))
}

fn fill_node(syntax: &SyntacticCategory, vars: &mut [i32], inherited: Option<i32>, next: &mut i32) {
    let root = syntax.num_return_subcategories();
    if vars[root] == UNBOUND {
        vars[root] = match inherited.or_else(|| return_chain_variable(syntax, vars)) {
            Some(var) => var,
            None => {
                let fresh = *next;
                *next += 1;
                fresh
            }
        };
    }
    if let SyntacticCategory::Functional { ret, arg, .. } = syntax {
        let head = vars[root];
        let (ret_vars, rest) = vars.split_at_mut(root);
        fill_node(ret, ret_vars, Some(head), next);
        fill_node(arg, &mut rest[1..], None, next);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn headed(s: &str) -> HeadedSyntacticCategory {
        HeadedSyntacticCategory::parse(s).unwrap()
    }

    #[test]
    fn test_parse_annotations() {
        let c = headed("((S{0}\\N{1}){0}/N{2}){0}");
        assert_eq!(c.semantic_variables(), &[0, 0, 1, 0, 2]);
        assert_eq!(c.root_index(), 3);
        assert_eq!(c.head_variable(), 0);
        assert_eq!(c.to_string(), "((S{0}\\N{1}){0}/N{2}){0}");
    }

    #[test]
    fn test_parse_unannotated_is_unbound() {
        let c = headed("S\\N");
        assert_eq!(c.semantic_variables(), &[UNBOUND, UNBOUND, UNBOUND]);
        assert!(c.has_unbound_variables());
    }

    #[test]
    fn test_fill_missing_variables() {
        let c = headed("S\\N").fill_missing_variables();
        assert_eq!(c.to_string(), "(S{0}\\N{1}){0}");

        let tv = headed("(S\\N)/N").fill_missing_variables();
        assert_eq!(tv.to_string(), "((S{0}\\N{1}){0}/N{2}){0}");

        let modifier = headed("(N{3}/N{3})").fill_missing_variables();
        assert_eq!(modifier.semantic_variables(), &[3, 3, 3]);
    }

    #[test]
    fn test_canonical_form() {
        let c = headed("((S{4}\\N{7}){4}/N{2}){4}");
        let (canonical, relabeling) = c.canonical_form_with_relabeling();
        assert_eq!(canonical, headed("((S{0}\\N{1}){0}/N{2}){0}"));
        assert_eq!(relabeling.get(&7), Some(&1));
        assert!(canonical.is_canonical());
        assert!(!c.is_canonical());
    }

    #[test]
    fn test_argument_and_return_types() {
        let c = headed("((S{0}\\N{1}){0}/N{2}){0}");
        assert_eq!(c.argument_type().unwrap(), headed("N{2}"));
        assert_eq!(c.return_type().unwrap(), headed("(S{0}\\N{1}){0}"));
        assert!(headed("N{0}").argument_type().is_none());
    }

    #[test]
    fn test_add_argument() {
        let c = headed("(S{0}\\N{1}){0}").add_argument(&headed("N{2}"), Direction::Right, 0);
        assert_eq!(c, headed("((S{0}\\N{1}){0}/N{2}){0}"));
    }

    #[test]
    fn test_relabel_variables() {
        let c = headed("(S{0}\\N{1}){0}").relabel_variables(&[0, 1], &[5, 6]);
        assert_eq!(c, headed("(S{5}\\N{6}){5}"));
    }

    #[test]
    fn test_unify_variables() {
        let function = headed("((S{0}\\N{1}){0}/N{2}){0}");
        let argument = headed("N{0}");
        let relabeling = argument
            .unify_variables(&argument.unique_variables(), &function.argument_type().unwrap(), &function.unique_variables())
            .unwrap();
        assert_eq!(relabeling, vec![2]);
    }

    #[test]
    fn test_unify_variables_fresh_and_conflict() {
        let a = headed("(N{0}/N{1}){0}");
        let b = headed("(N{3}/N{3}){3}");
        assert!(a.unify_variables(&a.unique_variables(), &b, &[]).is_none());

        let c = headed("(S{0}\\N{1}){0}");
        let d = headed("(S{4}\\N{-1}){4}");
        assert_eq!(c.unify_variables(&c.unique_variables(), &d, &[]), Some(vec![4, 5]));
    }

    #[test]
    fn test_headed_unification_requires_same_pattern() {
        let a = headed("(N{0}/N{0}){0}");
        let b = headed("(N{0}/N{1}){0}");
        assert!(!a.is_unifiable_with(&b));
        assert!(a.is_unifiable_with(&headed("(N{5}/N{5}){5}")));
        assert!(headed("S[1]{0}").is_unifiable_with(&headed("S[dcl]{0}")));
    }
}

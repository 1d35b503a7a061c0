//! # Combinators
//!
//! A [`Combinator`] is a precompiled instruction for combining a left and a
//! right category into a parent. Compilation does all unification up front,
//! so at parse time combining two chart entries only requires renaming
//! semantic variables through integer arrays.
//!
//! ## Variable Spaces
//!
//! Each combination happens in a *joint* variable space:
//!
//! - `left_relabeling[v]` is the joint variable for left variable `v`
//! - `right_relabeling[v]` is the joint variable for right variable `v`
//! - `result_relabeling[j]` is the result variable for joint variable `j`,
//!   or [`UNBOUND`] if the result drops it
//!
//! A [`SearchMove`] folds optional unary rules on either input into the same
//! arrays, so "type-raise then combine" is a single table lookup.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::dependency::DependencyTemplate;
use crate::headed::HeadedSyntacticCategory;
use crate::rules::{CcgBinaryRule, CcgUnaryRule};
use crate::syntax::{Direction, FeatureUnification, UNBOUND};

/// Dense id of a category in a compiled grammar.
pub type CategoryId = usize;
/// Index of a [`Combinator`] in a compiled grammar.
pub type CombinatorId = usize;
/// Index of a [`UnaryCombinator`] in a compiled grammar.
pub type UnaryId = usize;
/// Index of a [`SearchMove`] in a compiled grammar.
pub type MoveId = usize;

/// How a combinator was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CombinatorType {
    ForwardApplication,
    BackwardApplication,
    ForwardComposition,
    BackwardComposition,
    /// Crossed composition or a custom binary rule.
    Other,
    Conjunction,
}

impl fmt::Display for CombinatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CombinatorType::ForwardApplication => ">",
            CombinatorType::BackwardApplication => "<",
            CombinatorType::ForwardComposition => ">B",
            CombinatorType::BackwardComposition => "<B",
            CombinatorType::Other => "rule",
            CombinatorType::Conjunction => "conj",
        };
        write!(f, "{}", name)
    }
}

/// A precompiled binary combination.
#[derive(Debug, Clone, PartialEq)]
pub struct Combinator {
    pub left: CategoryId,
    pub right: CategoryId,
    pub result: CategoryId,
    pub kind: CombinatorType,
    pub left_relabeling: Vec<i32>,
    pub left_inverse: Vec<i32>,
    pub right_relabeling: Vec<i32>,
    pub right_inverse: Vec<i32>,
    pub result_relabeling: Vec<i32>,
    pub result_inverse: Vec<i32>,
    /// Predicates introduced by a rule, keyed by joint variable.
    pub heads: Vec<(i32, String)>,
    /// Dependency templates introduced by a rule, in the joint space.
    pub dependencies: Vec<DependencyTemplate>,
    pub argument_on_left: bool,
    /// Return-chain depth for composition; 0 otherwise.
    pub depth: usize,
    pub rule: Option<Arc<CcgBinaryRule>>,
}

impl Combinator {
    /// The result variable for a joint variable, if it survives.
    pub fn result_variable(&self, joint: i32) -> Option<i32> {
        lookup(&self.result_relabeling, joint)
    }
}

/// A precompiled unary rule application.
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryCombinator {
    pub input: CategoryId,
    pub result: CategoryId,
    /// Input variable to result variable.
    pub relabeling: Vec<i32>,
    /// Result variable to input variable.
    pub inverse: Vec<i32>,
    pub rule: Arc<CcgUnaryRule>,
}

impl UnaryCombinator {
    pub fn result_variable(&self, input: i32) -> Option<i32> {
        lookup(&self.relabeling, input)
    }
}

/// A combinator with optional unary rules applied to its inputs first.
///
/// The relabelings map the variables of the chart entries being combined
/// (before any unary rule) into the combinator's joint space.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchMove {
    pub combinator: CombinatorId,
    pub left_unary: Option<UnaryId>,
    pub right_unary: Option<UnaryId>,
    pub left_relabeling: Vec<i32>,
    pub left_inverse: Vec<i32>,
    pub right_relabeling: Vec<i32>,
    pub right_inverse: Vec<i32>,
}

impl SearchMove {
    pub fn new(
        combinator_id: CombinatorId,
        combinator: &Combinator,
        left_unary: Option<(UnaryId, &UnaryCombinator)>,
        right_unary: Option<(UnaryId, &UnaryCombinator)>,
    ) -> Self {
        let side = |unary: Option<(UnaryId, &UnaryCombinator)>, relabeling: &[i32], inverse: &[i32]| {
            match unary {
                Some((_, u)) => (
                    compose_relabelings(&u.relabeling, relabeling),
                    compose_relabelings(inverse, &u.inverse),
                ),
                None => (relabeling.to_vec(), inverse.to_vec()),
            }
        };
        let (left_relabeling, left_inverse) =
            side(left_unary, &combinator.left_relabeling, &combinator.left_inverse);
        let (right_relabeling, right_inverse) =
            side(right_unary, &combinator.right_relabeling, &combinator.right_inverse);
        Self {
            combinator: combinator_id,
            left_unary: left_unary.map(|(id, _)| id),
            right_unary: right_unary.map(|(id, _)| id),
            left_relabeling,
            left_inverse,
            right_relabeling,
            right_inverse,
        }
    }

    /// Joint variable of a variable of the left chart entry.
    pub fn left_variable(&self, var: i32) -> Option<i32> {
        lookup(&self.left_relabeling, var)
    }

    /// Joint variable of a variable of the right chart entry.
    pub fn right_variable(&self, var: i32) -> Option<i32> {
        lookup(&self.right_relabeling, var)
    }
}

// ============================================================================
// Relabeling Arrays
// ============================================================================

fn lookup(relabeling: &[i32], var: i32) -> Option<i32> {
    if var < 0 {
        return None;
    }
    relabeling
        .get(var as usize)
        .copied()
        .filter(|v| *v != UNBOUND)
}

/// `result[i] = second[first[i]]`, or [`UNBOUND`] where either is undefined.
pub fn compose_relabelings(first: &[i32], second: &[i32]) -> Vec<i32> {
    first
        .iter()
        .map(|v| lookup(second, *v).unwrap_or(UNBOUND))
        .collect()
}

/// Invert a one-to-one relabeling array.
pub fn invert_relabeling(relabeling: &[i32]) -> Vec<i32> {
    let size = relabeling.iter().copied().max().map_or(0, |m| (m + 1).max(0)) as usize;
    let mut inverse = vec![UNBOUND; size];
    for (i, v) in relabeling.iter().enumerate() {
        if *v >= 0 {
            inverse[*v as usize] = i as i32;
        }
    }
    inverse
}

/// Relabeling array for a canonical category: `v -> mapping[position of v]`.
fn dense_relabeling(category: &HeadedSyntacticCategory, mapping: &[i32]) -> Vec<i32> {
    let size = category.max_variable().map_or(0, |m| m + 1) as usize;
    let mut dense = vec![UNBOUND; size];
    for (var, target) in category.unique_variables().iter().zip(mapping) {
        if *var >= 0 {
            dense[*var as usize] = *target;
        }
    }
    dense
}

fn identity_relabeling(category: &HeadedSyntacticCategory) -> Vec<i32> {
    let vars = category.unique_variables();
    dense_relabeling(category, &vars)
}

// ============================================================================
// Combinator Construction
// ============================================================================

/// Category lookup used while building combinators.
pub type CategoryLookup<'a> = dyn Fn(&HeadedSyntacticCategory) -> Option<CategoryId> + 'a;

struct Draft {
    left: CategoryId,
    right: CategoryId,
    kind: CombinatorType,
    left_relabeling: Vec<i32>,
    right_relabeling: Vec<i32>,
    result: HeadedSyntacticCategory,
    heads: Vec<(i32, String)>,
    dependencies: Vec<DependencyTemplate>,
    argument_on_left: bool,
    depth: usize,
    rule: Option<Arc<CcgBinaryRule>>,
}

impl Draft {
    /// Canonicalize the joint-space result and look it up in the inventory.
    fn finish(self, lookup_category: &CategoryLookup<'_>) -> Option<Combinator> {
        let (canonical, result_map) = self.result.canonical_form_with_relabeling();
        let result = lookup_category(&canonical)?;

        let mut joint_max = UNBOUND;
        let mut extend = |v: i32| joint_max = joint_max.max(v);
        self.left_relabeling.iter().copied().for_each(&mut extend);
        self.right_relabeling.iter().copied().for_each(&mut extend);
        result_map.keys().copied().for_each(&mut extend);
        self.heads.iter().map(|(v, _)| *v).for_each(&mut extend);
        self.dependencies
            .iter()
            .flat_map(|d| d.variables())
            .for_each(&mut extend);

        let result_relabeling: Vec<i32> = (0..=joint_max)
            .map(|j| result_map.get(&j).copied().unwrap_or(UNBOUND))
            .collect();

        Some(Combinator {
            left: self.left,
            right: self.right,
            result,
            kind: self.kind,
            left_inverse: invert_relabeling(&self.left_relabeling),
            right_inverse: invert_relabeling(&self.right_relabeling),
            left_relabeling: self.left_relabeling,
            right_relabeling: self.right_relabeling,
            result_inverse: invert_relabeling(&result_relabeling),
            result_relabeling,
            heads: self.heads,
            dependencies: self.dependencies,
            argument_on_left: self.argument_on_left,
            depth: self.depth,
            rule: self.rule,
        })
    }
}

/// Feature variables of `argument` moved above every feature variable of `function`.
fn separate_features(
    function: &HeadedSyntacticCategory,
    argument: &HeadedSyntacticCategory,
) -> HeadedSyntacticCategory {
    let offset = function
        .syntax()
        .feature_variables()
        .into_iter()
        .max()
        .map_or(0, |m| m + 1);
    argument.shift_feature_variables(offset)
}

/// Function application: `function` consumes `argument` whole.
///
/// The function's direction decides the side: a rightward function sits on
/// the left (forward application), a leftward one on the right.
pub fn application(
    function_id: CategoryId,
    function: &HeadedSyntacticCategory,
    argument_id: CategoryId,
    argument: &HeadedSyntacticCategory,
    lookup_category: &CategoryLookup<'_>,
) -> Option<Combinator> {
    let direction = function.direction()?;
    let function_arg = function.argument_type()?;
    let shifted = separate_features(function, argument);
    let bindings = function_arg.unify(&shifted)?;

    let function_vars = function.unique_variables();
    let argument_mapping =
        argument.unify_variables(&argument.unique_variables(), &function_arg, &function_vars)?;
    let argument_relabeling = dense_relabeling(argument, &argument_mapping);
    let function_relabeling = identity_relabeling(function);

    let result = function
        .assign_features(&bindings.assigned, &bindings.relabeled)
        .return_type()?;

    let argument_on_left = direction == Direction::Left;
    let (left, right, left_relabeling, right_relabeling, kind) = if argument_on_left {
        (
            argument_id,
            function_id,
            argument_relabeling,
            function_relabeling,
            CombinatorType::BackwardApplication,
        )
    } else {
        (
            function_id,
            argument_id,
            function_relabeling,
            argument_relabeling,
            CombinatorType::ForwardApplication,
        )
    };

    Draft {
        left,
        right,
        kind,
        left_relabeling,
        right_relabeling,
        result,
        heads: Vec::new(),
        dependencies: Vec::new(),
        argument_on_left,
        depth: 0,
        rule: None,
    }
    .finish(lookup_category)
}

/// Function composition at every depth of `argument`'s return chain.
///
/// At each depth where the function's argument unifies, the argument is
/// tried as the head of the result first and the function second; the
/// first result present in the inventory is kept.
pub fn compositions(
    function_id: CategoryId,
    function: &HeadedSyntacticCategory,
    argument_id: CategoryId,
    argument: &HeadedSyntacticCategory,
    lookup_category: &CategoryLookup<'_>,
) -> Vec<Combinator> {
    let mut combinators = Vec::new();
    if function.is_atomic() {
        return combinators;
    }
    let shifted = separate_features(function, argument);
    let mut return_type = shifted.clone();
    let mut depth = 0;
    while let Some(next) = return_type.return_type() {
        return_type = next;
        depth += 1;
        // Argument as head first in both directions.
        for argument_as_head in [true, false] {
            if let Some(c) = composition(
                function_id,
                function,
                argument_id,
                &shifted,
                &return_type,
                depth,
                argument_as_head,
                lookup_category,
            ) {
                combinators.push(c);
                break;
            }
        }
    }
    combinators
}

#[allow(clippy::too_many_arguments)]
fn composition(
    function_id: CategoryId,
    function: &HeadedSyntacticCategory,
    argument_id: CategoryId,
    argument: &HeadedSyntacticCategory,
    argument_return: &HeadedSyntacticCategory,
    depth: usize,
    argument_as_head: bool,
    lookup_category: &CategoryLookup<'_>,
) -> Option<Combinator> {
    let direction = function.direction()?;
    let function_arg = function.argument_type()?;
    let bindings: FeatureUnification = function_arg.unify(argument_return)?;

    let function_vars = function.unique_variables();
    let argument_vars = argument.unique_variables();
    let argument_mapping =
        argument_return.unify_variables(&argument_vars, &function_arg, &function_vars)?;
    let relabeled_argument = argument
        .relabel_variables(&argument_vars, &argument_mapping)
        .assign_features(&bindings.other_assigned, &Default::default());
    let function_assigned = function.assign_features(&bindings.assigned, &bindings.relabeled);
    let mut result = function_assigned.return_type()?;

    // Chain of argument return types: levels[i] is the argument at depth i.
    let mut levels = vec![relabeled_argument.clone()];
    for _ in 1..depth {
        let next = levels.last().and_then(|c| c.return_type())?;
        levels.push(next);
    }

    let mut first_direction = None;
    for i in (0..depth).rev() {
        let level = &levels[i];
        let head = if i == 0 {
            if argument_as_head {
                relabeled_argument.head_variable()
            } else {
                function.head_variable()
            }
        } else {
            level.head_variable()
        };
        let level_direction = level.direction()?;
        first_direction.get_or_insert(level_direction);
        result = result.add_argument(&level.argument_type()?, level_direction, head);
    }

    let argument_on_left = direction == Direction::Left;
    let kind = match (first_direction == Some(direction), argument_on_left) {
        (true, true) => CombinatorType::BackwardComposition,
        (true, false) => CombinatorType::ForwardComposition,
        (false, _) => CombinatorType::Other,
    };

    let argument_relabeling = dense_relabeling(argument, &argument_mapping);
    let function_relabeling = identity_relabeling(function);
    let (left, right, left_relabeling, right_relabeling) = if argument_on_left {
        (argument_id, function_id, argument_relabeling, function_relabeling)
    } else {
        (function_id, argument_id, function_relabeling, argument_relabeling)
    };

    Draft {
        left,
        right,
        kind,
        left_relabeling,
        right_relabeling,
        result,
        heads: Vec::new(),
        dependencies: Vec::new(),
        argument_on_left,
        depth,
        rule: None,
    }
    .finish(lookup_category)
}

fn rule_variables(categories: &[&HeadedSyntacticCategory]) -> Vec<i32> {
    let vars: BTreeSet<i32> = categories
        .iter()
        .flat_map(|c| c.unique_variables())
        .collect();
    vars.into_iter().collect()
}

/// A custom binary rule instantiated on concrete inventory categories.
///
/// Returns `None` if either side fails to unify with the rule or the two
/// sides force different values onto the same feature variable.
pub fn binary_rule(
    rule: &Arc<CcgBinaryRule>,
    left_id: CategoryId,
    left: &HeadedSyntacticCategory,
    right_id: CategoryId,
    right: &HeadedSyntacticCategory,
    lookup_category: &CategoryLookup<'_>,
) -> Option<Combinator> {
    let left_bindings = rule.left().unify(left)?;
    let right_bindings = rule.right().unify(right)?;
    let mut assigned = left_bindings.assigned.clone();
    for (var, value) in &right_bindings.assigned {
        match assigned.get(var) {
            Some(existing) if existing != value => return None,
            _ => {
                assigned.insert(*var, value.clone());
            }
        }
    }

    let rule_vars = rule_variables(&[rule.left(), rule.right(), rule.parent()]);
    let left_mapping = left.unify_variables(&left.unique_variables(), rule.left(), &rule_vars)?;
    let mut used = rule_vars.clone();
    used.extend(left_mapping.iter().copied());
    let right_mapping = right.unify_variables(&right.unique_variables(), rule.right(), &used)?;

    let parent = rule.parent().assign_features(&assigned, &Default::default());
    let head = rule.parent().head_variable();

    Draft {
        left: left_id,
        right: right_id,
        kind: rule.kind(),
        left_relabeling: dense_relabeling(left, &left_mapping),
        right_relabeling: dense_relabeling(right, &right_mapping),
        result: parent,
        heads: rule.heads().iter().map(|h| (head, h.clone())).collect(),
        dependencies: rule.dependencies().to_vec(),
        argument_on_left: false,
        depth: 0,
        rule: Some(Arc::clone(rule)),
    }
    .finish(lookup_category)
}

/// A unary rule instantiated on a concrete inventory category.
pub fn unary_rule(
    rule: &Arc<CcgUnaryRule>,
    input_id: CategoryId,
    input: &HeadedSyntacticCategory,
    lookup_category: &CategoryLookup<'_>,
) -> Option<UnaryCombinator> {
    let bindings = rule.input().unify(input)?;
    let rule_vars = rule_variables(&[rule.input(), rule.result()]);
    let mapping = input.unify_variables(&input.unique_variables(), rule.input(), &rule_vars)?;

    let result = rule
        .result()
        .assign_features(&bindings.assigned, &Default::default());
    let (canonical, result_map) = result.canonical_form_with_relabeling();
    let result_id = lookup_category(&canonical)?;

    let to_rule = dense_relabeling(input, &mapping);
    let relabeling: Vec<i32> = to_rule
        .iter()
        .map(|v| result_map.get(v).copied().unwrap_or(UNBOUND))
        .collect();

    Some(UnaryCombinator {
        input: input_id,
        result: result_id,
        inverse: invert_relabeling(&relabeling),
        relabeling,
        rule: Arc::clone(rule),
    })
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

    fn inventory(cats: &[&str]) -> Vec<HeadedSyntacticCategory> {
        cats.iter().map(|c| headed(c).canonical_form()).collect()
    }

    fn finder(cats: &[HeadedSyntacticCategory]) -> impl Fn(&HeadedSyntacticCategory) -> Option<CategoryId> + '_ {
        move |c| cats.iter().position(|x| x == c)
    }

    #[test]
    fn test_relabeling_helpers() {
        assert_eq!(compose_relabelings(&[1, 0, -1], &[5, 6]), vec![6, 5, -1]);
        assert_eq!(invert_relabeling(&[2, 0]), vec![1, -1, 0]);
    }

    #[test]
    fn test_backward_application() {
        let cats = inventory(&["N{0}", "S{0}", "(S{0}\\N{1}){0}"]);
        let lookup = finder(&cats);
        let c = application(2, &cats[2], 0, &cats[0], &lookup).unwrap();
        assert_eq!(c.kind, CombinatorType::BackwardApplication);
        assert_eq!((c.left, c.right, c.result), (0, 2, 1));
        assert!(c.argument_on_left);
        assert_eq!(c.left_relabeling, vec![1]);
        assert_eq!(c.right_relabeling, vec![0, 1]);
        assert_eq!(c.result_relabeling, vec![0, -1]);
    }

    #[test]
    fn test_application_propagates_features() {
        let cats = inventory(&["N[nb]{0}", "S[nb]{0}", "(S[1]{0}/N[1]{1}){0}"]);
        let lookup = finder(&cats);
        let c = application(2, &cats[2], 0, &cats[0], &lookup).unwrap();
        assert_eq!(c.kind, CombinatorType::ForwardApplication);
        assert_eq!(c.result, 1);
        assert!(!c.argument_on_left);
    }

    #[test]
    fn test_application_missing_result() {
        let cats = inventory(&["N{0}", "(S{0}\\N{1}){0}"]);
        let lookup = finder(&cats);
        assert!(application(1, &cats[1], 0, &cats[0], &lookup).is_none());
    }

    #[test]
    fn test_forward_composition() {
        let cats = inventory(&[
            "((S{0}\\N{1}){0}/(S{2}\\N{1}){2}){0}",
            "((S{0}\\N{1}){0}/N{2}){0}",
            "((S{0}\\N{1}){0}/N{2}){0}",
        ]);
        let lookup = finder(&cats);
        let combinators = compositions(0, &cats[0], 1, &cats[1], &lookup);
        assert_eq!(combinators.len(), 1);
        assert_eq!(combinators[0].kind, CombinatorType::ForwardComposition);
        assert_eq!(combinators[0].depth, 1);
    }

    #[test]
    fn test_unary_rule() {
        let rule = Arc::new(CcgUnaryRule::parse("N{0} (S{1}/(S{1}\\N{0}){1}){1}").unwrap());
        let cats = inventory(&["N{0}", "(S{0}/(S{0}\\N{1}){0}){0}"]);
        let lookup = finder(&cats);
        let u = unary_rule(&rule, 0, &cats[0], &lookup).unwrap();
        assert_eq!(u.result, 1);
        assert_eq!(u.relabeling, vec![1]);
        assert_eq!(u.inverse, vec![-1, 0]);
    }

    #[test]
    fn test_binary_rule_feature_conflict() {
        let rule = Arc::new(CcgBinaryRule::parse("N[1]{0} N[1]{1} N[1]{1}###F###T").unwrap());
        let cats = inventory(&["N[a]{0}", "N[b]{0}", "N[1]{0}"]);
        let lookup = finder(&cats);
        assert!(binary_rule(&rule, 0, &cats[0], 1, &cats[1], &lookup).is_none());
        let same = binary_rule(&rule, 0, &cats[0], 0, &cats[0], &lookup).unwrap();
        assert_eq!(same.result, 0);
        assert_eq!(same.kind, CombinatorType::Other);
    }

    #[test]
    fn test_search_move_composes_unary() {
        let rule = Arc::new(CcgUnaryRule::parse("N{0} (S{1}/(S{1}\\N{0}){1}){1}").unwrap());
        let cats = inventory(&["N{0}", "(S{0}/(S{0}\\N{1}){0}){0}", "(S{0}\\N{1}){0}", "S{0}"]);
        let lookup = finder(&cats);
        let u = unary_rule(&rule, 0, &cats[0], &lookup).unwrap();
        let c = application(1, &cats[1], 2, &cats[2], &lookup).unwrap();
        let m = SearchMove::new(0, &c, Some((0, &u)), None);
        assert_eq!(m.left_relabeling, compose_relabelings(&u.relabeling, &c.left_relabeling));
        assert_eq!(m.left_unary, Some(0));
        assert_eq!(m.right_relabeling, c.right_relabeling);
    }
}

//! # Grammar Compilation
//!
//! Compilation turns a lexicon's categories and a set of rules into a
//! [`CompiledGrammar`]: a dense category inventory plus a table from
//! `(left category, right category)` to every [`SearchMove`] that can
//! combine them. Parsing never unifies categories; it only looks moves up.
//!
//! ## Steps
//!
//! 1. Collect feature values declared by the lexicon; rules may only use those
//! 2. Close the inventory under return types, argument types, and feature
//!    assignments
//! 3. Build application, composition, and rule combinators for every
//!    category pair (or only pairs matching observed [`CcgRuleSchema`]s)
//! 4. Fold unary rules into search moves
//!
//! ```rust
//! use ccg_core::category::LexiconEntry;
//! use ccg_core::compile::{CompiledGrammar, CompileOptions};
//!
//! let lexicon = LexiconEntry::parse_lines(["dog,N,", "barks,S\\N,barks 1 ?1"]).unwrap();
//! let grammar = CompiledGrammar::compile(
//!     lexicon.iter().map(|e| e.category.syntax().as_ref()),
//!     Vec::new(),
//!     Vec::new(),
//!     &CompileOptions::default(),
//! )
//! .unwrap();
//!
//! let n = grammar.category_id_of("N{0}").unwrap();
//! let vp = grammar.category_id_of("(S{0}\\N{1}){0}").unwrap();
//! assert_eq!(grammar.moves_for(n, vp).len(), 1);
//! ```

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use crate::combinator::{
    application, binary_rule, compositions, unary_rule, CategoryId, CategoryLookup, Combinator,
    CombinatorId, MoveId, SearchMove, UnaryCombinator, UnaryId,
};
use crate::error::CcgError;
use crate::headed::HeadedSyntacticCategory;
use crate::rules::{CcgBinaryRule, CcgRuleSchema, CcgUnaryRule};

/// Which category pairs to build combinators for.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CompilationMode {
    /// Every pair of inventory categories.
    #[default]
    Unrestricted,
    /// Only `(left, right)` pairs matching an observed schema, compared
    /// without features. Binary rules are always built.
    Restricted(Vec<CcgRuleSchema>),
}

/// Options for [`CompiledGrammar::compile`].
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOptions {
    pub allow_composition: bool,
    pub mode: CompilationMode,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            allow_composition: true,
            mode: CompilationMode::Unrestricted,
        }
    }
}

impl CompileOptions {
    pub fn without_composition(mut self) -> Self {
        self.allow_composition = false;
        self
    }

    pub fn restricted(mut self, schemas: Vec<CcgRuleSchema>) -> Self {
        self.mode = CompilationMode::Restricted(schemas);
        self
    }
}

/// A grammar ready for chart parsing.
#[derive(Debug, Clone)]
pub struct CompiledGrammar {
    categories: Vec<Arc<HeadedSyntacticCategory>>,
    category_index: HashMap<HeadedSyntacticCategory, CategoryId>,
    combinators: Vec<Arc<Combinator>>,
    unary: Vec<Arc<UnaryCombinator>>,
    moves: Vec<SearchMove>,
    move_table: HashMap<(CategoryId, CategoryId), Vec<MoveId>>,
    unary_table: HashMap<CategoryId, Vec<UnaryId>>,
    feature_values: BTreeSet<String>,
    binary_rules: Vec<Arc<CcgBinaryRule>>,
    unary_rules: Vec<Arc<CcgUnaryRule>>,
}

impl CompiledGrammar {
    /// Compile a grammar from lexical categories and rules.
    pub fn compile<'a>(
        lexicon_categories: impl IntoIterator<Item = &'a HeadedSyntacticCategory>,
        binary_rules: Vec<CcgBinaryRule>,
        unary_rules: Vec<CcgUnaryRule>,
        options: &CompileOptions,
    ) -> Result<Self, CcgError> {
        let lexicon: Vec<HeadedSyntacticCategory> = lexicon_categories
            .into_iter()
            .map(|c| c.fill_missing_variables().canonical_form())
            .collect();

        let mut feature_values = BTreeSet::new();
        feature_values.insert(String::new());
        for category in &lexicon {
            category.syntax().feature_values(&mut feature_values);
        }
        for rule in &binary_rules {
            check_features(&feature_values, rule.feature_values(), rule.source())?;
        }
        for rule in &unary_rules {
            check_features(&feature_values, rule.feature_values(), rule.source())?;
        }

        let mut seeds = lexicon;
        for rule in &binary_rules {
            seeds.extend([rule.left(), rule.right(), rule.parent()].map(|c| c.canonical_form()));
        }
        for rule in &unary_rules {
            seeds.extend([rule.input(), rule.result()].map(|c| c.canonical_form()));
        }

        let mut grammar = Self {
            categories: Vec::new(),
            category_index: HashMap::new(),
            combinators: Vec::new(),
            unary: Vec::new(),
            moves: Vec::new(),
            move_table: HashMap::new(),
            unary_table: HashMap::new(),
            feature_values,
            binary_rules: binary_rules.into_iter().map(Arc::new).collect(),
            unary_rules: unary_rules.into_iter().map(Arc::new).collect(),
        };
        grammar.close_inventory(seeds);
        grammar.build_combinators(options);
        grammar.build_unary_combinators();
        grammar.build_moves();
        Ok(grammar)
    }

    fn close_inventory(&mut self, seeds: Vec<HeadedSyntacticCategory>) {
        let mut queue: VecDeque<HeadedSyntacticCategory> = seeds.into();
        while let Some(category) = queue.pop_front() {
            if self.category_index.contains_key(&category) {
                continue;
            }
            for sub in category.subcategories(&self.feature_values) {
                queue.push_back(sub.canonical_form());
            }
            if let Some(ret) = category.return_type() {
                queue.push_back(ret.canonical_form());
            }
            if let Some(arg) = category.argument_type() {
                queue.push_back(arg.canonical_form());
            }
            self.category_index
                .insert(category.clone(), self.categories.len());
            self.categories.push(Arc::new(category));
        }
    }

    fn build_combinators(&mut self, options: &CompileOptions) {
        let index = &self.category_index;
        let lookup = |c: &HeadedSyntacticCategory| index.get(c).copied();

        let mut by_shape: HashMap<String, Vec<CategoryId>> = HashMap::new();
        for (id, category) in self.categories.iter().enumerate() {
            by_shape
                .entry(category.syntax().without_features().to_string())
                .or_default()
                .push(id);
        }

        let mut combinators = match &options.mode {
            CompilationMode::Unrestricted => self.all_pair_combinators(&by_shape, options, &lookup),
            CompilationMode::Restricted(schemas) => {
                let mut seen = HashSet::new();
                let mut combinators = Vec::new();
                for schema in schemas {
                    if !seen.insert((schema.left.as_str(), schema.right.as_str())) {
                        continue;
                    }
                    for &left_id in by_shape.get(&schema.left).into_iter().flatten() {
                        for &right_id in by_shape.get(&schema.right).into_iter().flatten() {
                            combinators.extend(self.pair_combinators(left_id, right_id, options, &lookup));
                        }
                    }
                }
                combinators
            }
        };

        for rule in &self.binary_rules {
            let lefts = self.unifiable_with(rule.left());
            let rights = self.unifiable_with(rule.right());
            for &left_id in &lefts {
                for &right_id in &rights {
                    combinators.extend(binary_rule(
                        rule,
                        left_id,
                        &self.categories[left_id],
                        right_id,
                        &self.categories[right_id],
                        &lookup,
                    ));
                }
            }
        }

        self.combinators = combinators.into_iter().map(Arc::new).collect();
    }

    /// Application and composition over every category pair.
    fn all_pair_combinators(
        &self,
        by_shape: &HashMap<String, Vec<CategoryId>>,
        options: &CompileOptions,
        lookup: &CategoryLookup<'_>,
    ) -> Vec<Combinator> {
        let functional: Vec<CategoryId> = (0..self.categories.len())
            .filter(|id| !self.categories[*id].is_atomic())
            .collect();

        let mut combinators = Vec::new();
        for &function_id in &functional {
            let function = &self.categories[function_id];
            let Some(argument_shape) = function
                .syntax()
                .argument_type()
                .map(|a| a.without_features().to_string())
            else {
                continue;
            };
            for &argument_id in by_shape.get(&argument_shape).into_iter().flatten() {
                combinators.extend(application(
                    function_id,
                    function,
                    argument_id,
                    &self.categories[argument_id],
                    lookup,
                ));
            }
            if options.allow_composition {
                for &argument_id in &functional {
                    combinators.extend(compositions(
                        function_id,
                        function,
                        argument_id,
                        &self.categories[argument_id],
                        lookup,
                    ));
                }
            }
        }
        combinators
    }

    /// Application and composition placing `left_id` on the left and
    /// `right_id` on the right, with either side as the function.
    fn pair_combinators(
        &self,
        left_id: CategoryId,
        right_id: CategoryId,
        options: &CompileOptions,
        lookup: &CategoryLookup<'_>,
    ) -> Vec<Combinator> {
        let (left, right) = (&self.categories[left_id], &self.categories[right_id]);
        let mut candidates: Vec<Combinator> = [
            application(left_id, left, right_id, right, lookup),
            application(right_id, right, left_id, left, lookup),
        ]
        .into_iter()
        .flatten()
        .collect();
        if options.allow_composition {
            candidates.extend(compositions(left_id, left, right_id, right, lookup));
            candidates.extend(compositions(right_id, right, left_id, left, lookup));
        }
        candidates.retain(|c| c.left == left_id && c.right == right_id);
        candidates
    }

    fn unifiable_with(&self, pattern: &HeadedSyntacticCategory) -> Vec<CategoryId> {
        (0..self.categories.len())
            .filter(|id| pattern.is_unifiable_with(&self.categories[*id]))
            .collect()
    }

    fn build_unary_combinators(&mut self) {
        let index = &self.category_index;
        let lookup = |c: &HeadedSyntacticCategory| index.get(c).copied();
        let mut unary = Vec::new();
        for rule in &self.unary_rules {
            for input_id in self.unifiable_with(rule.input()) {
                unary.extend(unary_rule(rule, input_id, &self.categories[input_id], &lookup));
            }
        }
        for (id, u) in unary.iter().enumerate() {
            self.unary_table.entry(u.input).or_default().push(id);
        }
        self.unary = unary.into_iter().map(Arc::new).collect();
    }

    fn build_moves(&mut self) {
        let mut by_result: HashMap<CategoryId, Vec<UnaryId>> = HashMap::new();
        for (id, u) in self.unary.iter().enumerate() {
            by_result.entry(u.result).or_default().push(id);
        }

        let mut moves = Vec::new();
        let mut table: HashMap<(CategoryId, CategoryId), Vec<MoveId>> = HashMap::new();
        for (combinator_id, combinator) in self.combinators.iter().enumerate() {
            let lefts: Vec<Option<UnaryId>> = std::iter::once(None)
                .chain(by_result.get(&combinator.left).into_iter().flatten().map(|u| Some(*u)))
                .collect();
            let rights: Vec<Option<UnaryId>> = std::iter::once(None)
                .chain(by_result.get(&combinator.right).into_iter().flatten().map(|u| Some(*u)))
                .collect();
            for left_unary in &lefts {
                for right_unary in &rights {
                    let left_key = left_unary.map_or(combinator.left, |u| self.unary[u].input);
                    let right_key = right_unary.map_or(combinator.right, |u| self.unary[u].input);
                    let search_move = SearchMove::new(
                        combinator_id,
                        combinator,
                        left_unary.map(|u| (u, self.unary[u].as_ref())),
                        right_unary.map(|u| (u, self.unary[u].as_ref())),
                    );
                    table.entry((left_key, right_key)).or_default().push(moves.len());
                    moves.push(search_move);
                }
            }
        }
        self.moves = moves;
        self.move_table = table;
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    pub fn num_categories(&self) -> usize {
        self.categories.len()
    }

    pub fn categories(&self) -> &[Arc<HeadedSyntacticCategory>] {
        &self.categories
    }

    pub fn category(&self, id: CategoryId) -> &Arc<HeadedSyntacticCategory> {
        &self.categories[id]
    }

    /// Id of a category, after canonicalization.
    pub fn category_id(&self, category: &HeadedSyntacticCategory) -> Option<CategoryId> {
        self.category_index
            .get(&category.fill_missing_variables().canonical_form())
            .copied()
    }

    /// Id of a category given as a string.
    pub fn category_id_of(&self, category: &str) -> Result<CategoryId, CcgError> {
        let parsed = HeadedSyntacticCategory::parse(category)?;
        self.category_id(&parsed)
            .ok_or_else(|| CcgError::UnknownCategory {
                category: category.to_string(),
            })
    }

    pub fn combinators(&self) -> &[Arc<Combinator>] {
        &self.combinators
    }

    pub fn combinator(&self, id: CombinatorId) -> &Arc<Combinator> {
        &self.combinators[id]
    }

    pub fn unary_combinators(&self) -> &[Arc<UnaryCombinator>] {
        &self.unary
    }

    pub fn unary_combinator(&self, id: UnaryId) -> &Arc<UnaryCombinator> {
        &self.unary[id]
    }

    pub fn num_moves(&self) -> usize {
        self.moves.len()
    }

    pub fn search_move(&self, id: MoveId) -> &SearchMove {
        &self.moves[id]
    }

    /// Moves combining an entry of category `left` with one of category `right`.
    pub fn moves_for(&self, left: CategoryId, right: CategoryId) -> &[MoveId] {
        self.move_table
            .get(&(left, right))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Unary rules applicable to a category.
    pub fn unary_rules_for(&self, category: CategoryId) -> &[UnaryId] {
        self.unary_table
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Feature values observed in the lexicon, including the default value.
    pub fn feature_values(&self) -> &BTreeSet<String> {
        &self.feature_values
    }

    pub fn binary_rules(&self) -> &[Arc<CcgBinaryRule>] {
        &self.binary_rules
    }

    pub fn unary_rules(&self) -> &[Arc<CcgUnaryRule>] {
        &self.unary_rules
    }
}

fn check_features(
    declared: &BTreeSet<String>,
    used: BTreeSet<String>,
    rule: &str,
) -> Result<(), CcgError> {
    match used.into_iter().find(|f| !declared.contains(f)) {
        Some(feature) => Err(CcgError::UndeclaredFeature {
            feature,
            rule: rule.to_string(),
        }),
        None => Ok(()),
    }
}

// ============================================================================
// Tests
// ============================================================================

//! # Lexical Categories
//!
//! A [`CcgCategory`] is what the lexicon assigns to a word: a headed
//! syntactic category, the predicates heading each semantic variable, and
//! the dependencies the word projects. A [`LexiconEntry`] pairs a category
//! with the word sequence it applies to.
//!
//! ## Lexicon Line Format
//!
//! ```text
//! words,syntax,part#part#...
//! ```
//!
//! Each part is either a dependency `subject argNum object` (variables are
//! written `?N`) or an assignment `N predicate` binding variable `N`. If no
//! assignment is given, the words joined with `_` head the category.
//!
//! ```rust
//! use ccg_core::category::LexiconEntry;
//!
//! let entry = LexiconEntry::parse("barks,S\\N,barks 1 ?1").unwrap();
//! assert_eq!(entry.category.syntax().to_string(), "(S{0}\\N{1}){0}");
//! assert_eq!(entry.category.semantic_heads(), vec!["barks"]);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::dependency::{Argument, DependencyStructure, DependencyTemplate, IndexedPredicate, UnfilledDependency};
use crate::error::CcgError;
use crate::headed::HeadedSyntacticCategory;

/// The syntax and semantics a lexicon assigns to a word sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CcgCategory {
    syntax: Arc<HeadedSyntacticCategory>,
    assignments: BTreeMap<i32, Vec<String>>,
    dependencies: Vec<DependencyTemplate>,
}

/// Dependencies projected by a lexical category at a particular word.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LexicalDependencies {
    /// Dependencies with both sides bound inside the entry.
    pub filled: Vec<DependencyStructure>,
    /// Dependencies keyed by the variable they are waiting on.
    pub unfilled: BTreeMap<i32, Vec<UnfilledDependency>>,
}

impl CcgCategory {
    /// Build a category, filling missing head annotations and canonicalizing.
    ///
    /// Variables in `assignments` and `dependencies` refer to `syntax` as
    /// given and are relabeled along with it.
    pub fn new(
        syntax: HeadedSyntacticCategory,
        assignments: BTreeMap<i32, Vec<String>>,
        dependencies: Vec<DependencyTemplate>,
    ) -> Result<Self, String> {
        let filled = syntax.fill_missing_variables();
        let (canonical, relabeling) = filled.canonical_form_with_relabeling();
        let relabel = |var: i32| -> Result<i32, String> {
            relabeling
                .get(&var)
                .copied()
                .ok_or_else(|| format!("variable ?{} does not occur in {}", var, filled))
        };

        let mut relabeled_assignments: BTreeMap<i32, Vec<String>> = BTreeMap::new();
        for (var, predicates) in assignments {
            relabeled_assignments
                .entry(relabel(var)?)
                .or_default()
                .extend(predicates);
        }

        let mut relabeled_dependencies = Vec::with_capacity(dependencies.len());
        for dep in &dependencies {
            for var in dep.variables() {
                relabel(var)?;
            }
            relabeled_dependencies.push(dep.relabel(|v| relabeling.get(&v).copied()));
        }

        Ok(Self {
            syntax: Arc::new(canonical),
            assignments: relabeled_assignments,
            dependencies: relabeled_dependencies,
        })
    }

    pub fn syntax(&self) -> &Arc<HeadedSyntacticCategory> {
        &self.syntax
    }

    pub fn assignments(&self) -> &BTreeMap<i32, Vec<String>> {
        &self.assignments
    }

    pub fn dependencies(&self) -> &[DependencyTemplate] {
        &self.dependencies
    }

    /// Predicates heading the whole category.
    pub fn semantic_heads(&self) -> Vec<&str> {
        self.assignments
            .get(&self.syntax.head_variable())
            .map(|preds| preds.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Variable assignments instantiated at `word_index`.
    pub fn indexed_assignments(&self, word_index: usize) -> Vec<(i32, IndexedPredicate)> {
        self.assignments
            .iter()
            .flat_map(|(var, preds)| {
                preds
                    .iter()
                    .map(move |p| (*var, IndexedPredicate::new(p.as_str(), word_index)))
            })
            .collect()
    }

    /// Instantiate the dependency templates at `word_index`.
    ///
    /// A variable side with an assignment in this category counts as bound.
    pub fn create_unfilled_dependencies(&self, word_index: usize) -> LexicalDependencies {
        let mut result = LexicalDependencies::default();
        for template in &self.dependencies {
            let subjects = self.resolve(&template.subject, word_index);
            let objects = self.resolve(&template.object, word_index);
            for subject in &subjects {
                for object in &objects {
                    let dep = UnfilledDependency {
                        subject: subject.clone(),
                        subject_syntax: Some(Arc::clone(&self.syntax)),
                        arg_num: template.arg_num,
                        object: object.clone(),
                    };
                    match (dep.to_filled(), dep.pending_variable()) {
                        (Some(filled), _) => result.filled.push(filled),
                        (None, Some(var)) => result.unfilled.entry(var).or_default().push(dep),
                        (None, None) => {}
                    }
                }
            }
        }
        result
    }

    fn resolve(&self, side: &Argument<String>, word_index: usize) -> Vec<Argument<IndexedPredicate>> {
        match side {
            Argument::Predicate(p) => {
                vec![Argument::Predicate(IndexedPredicate::new(p.as_str(), word_index))]
            }
            Argument::Variable(var) => match self.assignments.get(var) {
                Some(preds) if !preds.is_empty() => preds
                    .iter()
                    .map(|p| Argument::Predicate(IndexedPredicate::new(p.as_str(), word_index)))
                    .collect(),
                _ => vec![Argument::Variable(*var)],
            },
        }
    }
}

impl fmt::Display for CcgCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.syntax)?;
        for (var, preds) in &self.assignments {
            for pred in preds {
                write!(f, " {}={}", var, pred)?;
            }
        }
        for dep in &self.dependencies {
            write!(f, " [{}]", dep)?;
        }
        Ok(())
    }
}

// ============================================================================
// Lexicon Entries
// ============================================================================

/// A word sequence and the category it can take.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LexiconEntry {
    pub words: Vec<String>,
    pub category: CcgCategory,
}

impl LexiconEntry {
    pub fn new(words: Vec<String>, category: CcgCategory) -> Self {
        Self { words, category }
    }

    /// Parse a `words,syntax,dep#dep` lexicon line.
    pub fn parse(line: &str) -> Result<Self, CcgError> {
        let error = |reason: String| CcgError::MalformedLexiconEntry {
            line: line.to_string(),
            reason,
        };

        let mut fields = line.split(',');
        let words: Vec<String> = fields
            .next()
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        if words.is_empty() {
            return Err(error("no words".to_string()));
        }
        let syntax_text = fields
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| error("missing syntactic category".to_string()))?;
        let syntax = HeadedSyntacticCategory::parse(syntax_text)?.fill_missing_variables();

        let mut assignments: BTreeMap<i32, Vec<String>> = BTreeMap::new();
        let mut dependencies = Vec::new();
        for part in fields.flat_map(|f| f.split('#')).map(str::trim).filter(|p| !p.is_empty()) {
            let tokens: Vec<&str> = part.split_whitespace().collect();
            match tokens.len() {
                2 => {
                    let var_text = tokens[0].trim_start_matches('?');
                    let var = var_text
                        .parse::<i32>()
                        .map_err(|_| error(format!("invalid assignment '{}'", part)))?;
                    assignments.entry(var).or_default().push(tokens[1].to_string());
                }
                3 => dependencies.push(DependencyTemplate::parse(part).map_err(error)?),
                _ => return Err(error(format!("unrecognized field '{}'", part))),
            }
        }
        if assignments.is_empty() {
            assignments.insert(syntax.head_variable(), vec![words.join("_")]);
        }

        let category = CcgCategory::new(syntax, assignments, dependencies).map_err(error)?;
        Ok(Self::new(words, category))
    }

    /// Parse many lines, skipping blank lines and `#` comments.
    pub fn parse_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Result<Vec<Self>, CcgError> {
        lines
            .into_iter()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(Self::parse)
            .collect()
    }
}

impl fmt::Display for LexiconEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} := {}", self.words.join(" "), self.category)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_noun() {
        let entry = LexiconEntry::parse("dog,N,").unwrap();
        assert_eq!(entry.words, vec!["dog"]);
        assert_eq!(entry.category.syntax().to_string(), "N{0}");
        assert_eq!(entry.category.semantic_heads(), vec!["dog"]);
        assert!(entry.category.dependencies().is_empty());
    }

    #[test]
    fn test_parse_annotated_verb() {
        let entry = LexiconEntry::parse("saw,((S{0}\\N{1}){0}/N{2}){0},saw 1 ?1#saw 2 ?2").unwrap();
        assert_eq!(entry.category.dependencies().len(), 2);
        assert_eq!(entry.category.dependencies()[1].object, Argument::Variable(2));
    }

    #[test]
    fn test_parse_relabels_to_canonical() {
        let entry = LexiconEntry::parse("likes,((S{3}\\N{5}){3}/N{4}){3},likes 2 ?4").unwrap();
        assert_eq!(entry.category.syntax().to_string(), "((S{0}\\N{1}){0}/N{2}){0}");
        assert_eq!(entry.category.dependencies()[0].object, Argument::Variable(2));
        assert_eq!(entry.category.semantic_heads(), vec!["likes"]);
    }

    #[test]
    fn test_parse_multiword_and_assignment() {
        let entry = LexiconEntry::parse("new york,N{0},0 new_york_city").unwrap();
        assert_eq!(entry.words, vec!["new", "york"]);
        assert_eq!(entry.category.semantic_heads(), vec!["new_york_city"]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            LexiconEntry::parse(",N,"),
            Err(CcgError::MalformedLexiconEntry { .. })
        ));
        assert!(matches!(
            LexiconEntry::parse("dog"),
            Err(CcgError::MalformedLexiconEntry { .. })
        ));
        assert!(matches!(
            LexiconEntry::parse("dog,(N,"),
            Err(CcgError::MalformedCategory { .. })
        ));
        assert!(matches!(
            LexiconEntry::parse("barks,S\\N,barks 1 ?7"),
            Err(CcgError::MalformedLexiconEntry { .. })
        ));
    }

    #[test]
    fn test_create_unfilled_dependencies() {
        let entry = LexiconEntry::parse("barks,S\\N,barks 1 ?1").unwrap();
        let deps = entry.category.create_unfilled_dependencies(1);
        assert!(deps.filled.is_empty());
        let pending = &deps.unfilled[&1];
        assert_eq!(pending.len(), 1);
        assert_eq!(
            pending[0].subject,
            Argument::Predicate(IndexedPredicate::new("barks", 1))
        );
    }

    #[test]
    fn test_create_filled_dependency_inside_entry() {
        let entry = LexiconEntry::parse("itself,N{0},0 it#it 1 ?0").unwrap();
        let deps = entry.category.create_unfilled_dependencies(4);
        assert!(deps.unfilled.is_empty());
        assert_eq!(deps.filled.len(), 1);
        assert_eq!(deps.filled[0].object, IndexedPredicate::new("it", 4));
    }

    #[test]
    fn test_parse_lines_skips_comments() {
        let entries = LexiconEntry::parse_lines(["# nouns", "dog,N,", "", "cat,N,"]).unwrap();
        assert_eq!(entries.len(), 2);
    }
}

//! # Predicate-Argument Dependencies
//!
//! Dependencies record that argument slot `arg_num` of a head predicate is
//! filled by another predicate, e.g. `(barks, 1, dog)`. During parsing a
//! dependency starts out *unfilled*. Its object (or subject) is still a
//! semantic variable, and it becomes a [`DependencyStructure`] once
//! combination binds that variable to a word.

use std::fmt;
use std::sync::Arc;

use crate::headed::HeadedSyntacticCategory;

/// A predicate tagged with the index of the word that introduced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexedPredicate {
    pub predicate: Arc<str>,
    pub word_index: usize,
}

impl IndexedPredicate {
    pub fn new(predicate: impl Into<Arc<str>>, word_index: usize) -> Self {
        Self {
            predicate: predicate.into(),
            word_index,
        }
    }
}

impl fmt::Display for IndexedPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.predicate, self.word_index)
    }
}

/// One side of a dependency: either bound to a predicate or still a variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Argument<P> {
    Predicate(P),
    Variable(i32),
}

impl<P> Argument<P> {
    pub fn variable(&self) -> Option<i32> {
        match self {
            Argument::Variable(v) => Some(*v),
            Argument::Predicate(_) => None,
        }
    }

    pub fn predicate(&self) -> Option<&P> {
        match self {
            Argument::Predicate(p) => Some(p),
            Argument::Variable(_) => None,
        }
    }
}

impl<P: fmt::Display> fmt::Display for Argument<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Predicate(p) => write!(f, "{}", p),
            Argument::Variable(v) => write!(f, "?{}", v),
        }
    }
}

/// A dependency as written in a lexicon entry or rule, e.g. `barks 1 ?1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyTemplate {
    pub subject: Argument<String>,
    pub arg_num: usize,
    pub object: Argument<String>,
}

impl DependencyTemplate {
    pub fn new(subject: Argument<String>, arg_num: usize, object: Argument<String>) -> Self {
        Self {
            subject,
            arg_num,
            object,
        }
    }

    /// Parse `subject argNum object`.
    ///
    /// A side written `?N` is variable `N`; a bare integer object is also a
    /// variable. Anything else is a predicate.
    pub fn parse(text: &str) -> Result<Self, String> {
        let parts: Vec<&str> = text.split_whitespace().collect();
        if parts.len() != 3 {
            return Err(format!(
                "dependency '{}' must have the form 'subject argNum object'",
                text
            ));
        }
        let arg_num = parts[1]
            .parse::<usize>()
            .map_err(|_| format!("invalid argument number '{}'", parts[1]))?;
        let subject = parse_side(parts[0], false)?;
        let object = parse_side(parts[2], true)?;
        Ok(Self::new(subject, arg_num, object))
    }

    /// Semantic variables mentioned by this template.
    pub fn variables(&self) -> impl Iterator<Item = i32> + '_ {
        self.subject
            .variable()
            .into_iter()
            .chain(self.object.variable())
    }

    /// Rename variables through `relabel`; unmapped variables keep their id.
    pub fn relabel(&self, relabel: impl Fn(i32) -> Option<i32>) -> Self {
        let map = |side: &Argument<String>| match side {
            Argument::Variable(v) => Argument::Variable(relabel(*v).unwrap_or(*v)),
            other => other.clone(),
        };
        Self::new(map(&self.subject), self.arg_num, map(&self.object))
    }
}

impl fmt::Display for DependencyTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.arg_num, self.object)
    }
}

fn parse_side(token: &str, bare_int_is_variable: bool) -> Result<Argument<String>, String> {
    if let Some(var) = token.strip_prefix('?') {
        return var
            .parse::<i32>()
            .map(Argument::Variable)
            .map_err(|_| format!("invalid variable '{}'", token));
    }
    if bare_int_is_variable {
        if let Ok(var) = token.parse::<i32>() {
            return Ok(Argument::Variable(var));
        }
    }
    Ok(Argument::Predicate(token.to_string()))
}

/// A parse-time dependency with at least one side still a variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnfilledDependency {
    pub subject: Argument<IndexedPredicate>,
    /// Lexical category of the subject's word, when known.
    pub subject_syntax: Option<Arc<HeadedSyntacticCategory>>,
    pub arg_num: usize,
    pub object: Argument<IndexedPredicate>,
}

impl UnfilledDependency {
    /// The variable this dependency is waiting on: the object if unresolved,
    /// otherwise the subject.
    pub fn pending_variable(&self) -> Option<i32> {
        self.object.variable().or_else(|| self.subject.variable())
    }

    /// Rename both sides' variables; `None` if a variable has no image.
    pub fn relabel(&self, relabel: impl Fn(i32) -> Option<i32>) -> Option<Self> {
        let map = |side: &Argument<IndexedPredicate>| match side {
            Argument::Variable(v) => relabel(*v).map(Argument::Variable),
            other => Some(other.clone()),
        };
        Some(Self {
            subject: map(&self.subject)?,
            subject_syntax: self.subject_syntax.clone(),
            arg_num: self.arg_num,
            object: map(&self.object)?,
        })
    }

    /// Convert to a filled dependency if both sides are concrete.
    pub fn to_filled(&self) -> Option<DependencyStructure> {
        match (&self.subject, &self.object) {
            (Argument::Predicate(head), Argument::Predicate(object)) => Some(DependencyStructure {
                head: head.clone(),
                head_syntax: self.subject_syntax.clone(),
                arg_num: self.arg_num,
                object: object.clone(),
            }),
            _ => None,
        }
    }
}

impl fmt::Display for UnfilledDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {})", self.subject, self.arg_num, self.object)
    }
}

/// A fully instantiated predicate-argument dependency.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyStructure {
    pub head: IndexedPredicate,
    pub head_syntax: Option<Arc<HeadedSyntacticCategory>>,
    pub arg_num: usize,
    pub object: IndexedPredicate,
}

impl DependencyStructure {
    pub fn new(head: IndexedPredicate, arg_num: usize, object: IndexedPredicate) -> Self {
        Self {
            head,
            head_syntax: None,
            arg_num,
            object,
        }
    }

    /// The dependency without the head's syntax, for comparing against gold data.
    pub fn predication(&self) -> (IndexedPredicate, usize, IndexedPredicate) {
        (self.head.clone(), self.arg_num, self.object.clone())
    }
}

impl fmt::Display for DependencyStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {})", self.head, self.arg_num, self.object)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_template() {
        let dep = DependencyTemplate::parse("barks 1 ?1").unwrap();
        assert_eq!(dep.subject, Argument::Predicate("barks".to_string()));
        assert_eq!(dep.arg_num, 1);
        assert_eq!(dep.object, Argument::Variable(1));
        assert_eq!(dep.to_string(), "barks 1 ?1");
    }

    #[test]
    fn test_parse_template_bare_object_variable() {
        let dep = DependencyTemplate::parse("?0 2 3").unwrap();
        assert_eq!(dep.subject, Argument::Variable(0));
        assert_eq!(dep.object, Argument::Variable(3));
        assert_eq!(dep.variables().collect::<Vec<_>>(), vec![0, 3]);
    }

    #[test]
    fn test_parse_template_errors() {
        assert!(DependencyTemplate::parse("barks 1").is_err());
        assert!(DependencyTemplate::parse("barks x ?1").is_err());
        assert!(DependencyTemplate::parse("barks 1 ?x").is_err());
    }

    #[test]
    fn test_unfilled_to_filled() {
        let unfilled = UnfilledDependency {
            subject: Argument::Predicate(IndexedPredicate::new("barks", 1)),
            subject_syntax: None,
            arg_num: 1,
            object: Argument::Variable(1),
        };
        assert_eq!(unfilled.pending_variable(), Some(1));
        assert!(unfilled.to_filled().is_none());
        assert!(unfilled.relabel(|_| None).is_none());

        let filled = UnfilledDependency {
            object: Argument::Predicate(IndexedPredicate::new("dog", 0)),
            ..unfilled
        }
        .to_filled()
        .unwrap();
        assert_eq!(filled.to_string(), "(barks:1 1 dog:0)");
    }
}

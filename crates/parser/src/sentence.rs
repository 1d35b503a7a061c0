//! Part-of-speech tagged input sentences.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ParserError;

/// Words paired with their part-of-speech tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedSentence {
    words: Vec<String>,
    pos_tags: Vec<String>,
}

impl TaggedSentence {
    pub fn new<W, T>(words: W, pos_tags: T) -> Result<Self, ParserError>
    where
        W: IntoIterator,
        W::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        let words: Vec<String> = words.into_iter().map(Into::into).collect();
        let pos_tags: Vec<String> = pos_tags.into_iter().map(Into::into).collect();
        if words.len() != pos_tags.len() {
            return Err(ParserError::MismatchedTags {
                words: words.len(),
                tags: pos_tags.len(),
            });
        }
        Ok(Self { words, pos_tags })
    }

    /// A sentence whose tags are all empty.
    pub fn untagged<W>(words: W) -> Self
    where
        W: IntoIterator,
        W::Item: Into<String>,
    {
        let words: Vec<String> = words.into_iter().map(Into::into).collect();
        let pos_tags = vec![String::new(); words.len()];
        Self { words, pos_tags }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn pos_tags(&self) -> &[String] {
        &self.pos_tags
    }

    pub fn word(&self, index: usize) -> Option<&str> {
        self.words.get(index).map(String::as_str)
    }

    pub fn pos(&self, index: usize) -> Option<&str> {
        self.pos_tags.get(index).map(String::as_str)
    }

    /// Words of the inclusive span `start..=end`.
    pub fn span_words(&self, start: usize, end: usize) -> &[String] {
        self.words.get(start..=end).unwrap_or(&[])
    }

    /// Tags of the inclusive span `start..=end`.
    pub fn span_pos_tags(&self, start: usize, end: usize) -> &[String] {
        self.pos_tags.get(start..=end).unwrap_or(&[])
    }
}

impl fmt::Display for TaggedSentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens: Vec<String> = self
            .words
            .iter()
            .zip(&self.pos_tags)
            .map(|(w, t)| {
                if t.is_empty() {
                    w.clone()
                } else {
                    format!("{}/{}", w, t)
                }
            })
            .collect();
        write!(f, "{}", tokens.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatched_tags() {
        let result = TaggedSentence::new(["dog", "barks"], ["NN"]);
        assert_eq!(result, Err(ParserError::MismatchedTags { words: 2, tags: 1 }));
    }

    #[test]
    fn test_spans() {
        let sentence = TaggedSentence::new(["the", "dog", "barks"], ["DT", "NN", "VBZ"]).unwrap();
        assert_eq!(sentence.span_words(1, 2), ["dog", "barks"]);
        assert_eq!(sentence.span_pos_tags(0, 0), ["DT"]);
        assert!(sentence.span_words(2, 5).is_empty());
        assert_eq!(sentence.to_string(), "the/DT dog/NN barks/VBZ");
    }
}

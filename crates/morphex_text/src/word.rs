//! Words: a surface string plus its annotation list.

use morphex_base::OrderedSet;
use regex::Regex;

use crate::annotation::Annotation;
use crate::restriction::AttributesRestriction;

/// Index into a word's annotation list.
pub type AnnotationIndex = u8;

/// A word carries at most this many annotations.
pub const MAX_ANNOTATION: AnnotationIndex = u8::MAX;

/// A sorted set of annotation indices.
pub type AnnotationIndices = OrderedSet<AnnotationIndex>;

/// One token of the annotated text.
#[derive(Debug, Clone)]
pub struct Word {
    text: String,
    annotations: Vec<Annotation>,
}

impl Word {
    pub fn new(text: String, annotations: Vec<Annotation>) -> Self {
        debug_assert!(!annotations.is_empty());
        debug_assert!(annotations.len() <= MAX_ANNOTATION as usize + 1);
        Self { text, annotations }
    }

    /// The surface form.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// The full index set `{0, …, len-1}`.
    pub fn annotation_indices(&self) -> AnnotationIndices {
        (0..self.annotations.len() as AnnotationIndex).collect()
    }

    /// Whole-word regex match against the surface form.
    pub fn match_word(&self, word_regex: &Regex) -> bool {
        word_regex
            .find(&self.text)
            .is_some_and(|m| m.start() == 0 && m.end() == self.text.len())
    }

    /// Collects the indices of annotations satisfying `restriction`.
    ///
    /// Returns `true` iff at least one annotation passed.
    pub fn match_attributes(
        &self,
        restriction: &AttributesRestriction,
        indices: &mut AnnotationIndices,
    ) -> bool {
        debug_assert!(indices.is_empty());
        for (i, annotation) in self.annotations.iter().enumerate() {
            if restriction.check(annotation.attributes()) {
                indices.add(i as AnnotationIndex);
            }
        }
        !indices.is_empty()
    }
}

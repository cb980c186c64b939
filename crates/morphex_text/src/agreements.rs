//! The pairwise agreement cache.
//!
//! For a fixed pair of words and one attribute, the set of annotation pairs
//! that agree never changes, so the index sets can be computed once and
//! reused across every probe position and every variant. The cache is filled
//! lazily on first lookup and identical queries return identical results.

use rustc_hash::FxHashMap;

use crate::annotation::AgreementPower;
use crate::attributes::Attribute;
use crate::word::{AnnotationIndex, AnnotationIndices, Word};

/// Index sets `(in first word, in second word)` of annotations that
/// participate in at least one agreeing pair.
pub type AgreementPair = (AnnotationIndices, AnnotationIndices);

/// Cache key: two word positions (first < second) and the attribute.
pub type AgreementKey = (usize, usize, Attribute);

/// Lazily-filled `(word, word, attribute) → (strong, weak)` table.
///
/// The weak pair is a superset of the strong pair: strongly agreeing
/// annotations also agree weakly.
#[derive(Debug, Default)]
pub struct Agreements {
    cache: FxHashMap<AgreementKey, (AgreementPair, AgreementPair)>,
}

impl Agreements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the strong or weak agreement pair for `key`, computing and
    /// caching both on first use.
    pub fn agreement(
        &mut self,
        words: &[Word],
        agreement_begin: Attribute,
        key: AgreementKey,
        strong: bool,
    ) -> &AgreementPair {
        debug_assert!(key.0 < key.1);
        let entry = self.cache.entry(key).or_insert_with(|| {
            let mut strong_pair = AgreementPair::default();
            let mut weak_pair = AgreementPair::default();

            let annotations1 = words[key.0].annotations();
            let annotations2 = words[key.1].annotations();
            for (i1, a1) in annotations1.iter().enumerate() {
                for (i2, a2) in annotations2.iter().enumerate() {
                    match a1.agreement(a2, key.2, agreement_begin) {
                        AgreementPower::None => {}
                        AgreementPower::Strong => {
                            strong_pair.0.add(i1 as AnnotationIndex);
                            strong_pair.1.add(i2 as AnnotationIndex);
                            weak_pair.0.add(i1 as AnnotationIndex);
                            weak_pair.1.add(i2 as AnnotationIndex);
                        }
                        AgreementPower::Weak => {
                            weak_pair.0.add(i1 as AnnotationIndex);
                            weak_pair.1.add(i2 as AnnotationIndex);
                        }
                    }
                }
            }
            (strong_pair, weak_pair)
        });
        if strong {
            &entry.0
        } else {
            &entry.1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Annotation;
    use crate::attributes::Attributes;

    fn word(text: &str, readings: &[&[u32]]) -> Word {
        let annotations = readings
            .iter()
            .map(|values| {
                let mut attributes = Attributes::new(values.len() as Attribute);
                for (i, v) in values.iter().enumerate() {
                    attributes.set(i as Attribute, *v);
                }
                Annotation::new(attributes)
            })
            .collect();
        Word::new(text.to_owned(), annotations)
    }

    #[test]
    fn second_sets_come_from_the_second_word() {
        // The first word has one reading, the second has three; if the
        // computation confused the two, the result shapes would coincide.
        let words = vec![
            word("red", &[&[1, 5]]),
            word("car", &[&[2, 5], &[2, 6], &[2, 0]]),
        ];
        let mut agreements = Agreements::new();
        let (in1, in2) = agreements.agreement(&words, 1, (0, 1, 1), false).clone();
        assert_eq!(in1.as_slice(), &[0]);
        assert_eq!(in2.as_slice(), &[0, 2]);
    }

    #[test]
    fn strong_pair_excludes_wildcard_matches() {
        let words = vec![word("a", &[&[1, 5]]), word("b", &[&[2, 5], &[2, 0]])];
        let mut agreements = Agreements::new();
        let strong = agreements.agreement(&words, 1, (0, 1, 1), true).clone();
        assert_eq!(strong.1.as_slice(), &[0]);
        let weak = agreements.agreement(&words, 1, (0, 1, 1), false).clone();
        assert_eq!(weak.1.as_slice(), &[0, 1]);
    }

    #[test]
    fn identical_queries_return_identical_results() {
        let words = vec![word("a", &[&[1, 5], &[1, 6]]), word("b", &[&[2, 5]])];
        let mut agreements = Agreements::new();
        let first = agreements.agreement(&words, 1, (0, 1, 1), false).clone();
        let second = agreements.agreement(&words, 1, (0, 1, 1), false).clone();
        assert_eq!(first, second);
    }

    #[test]
    fn disagreeing_words_yield_empty_pairs() {
        let words = vec![word("a", &[&[1, 5]]), word("b", &[&[2, 6]])];
        let mut agreements = Agreements::new();
        let (in1, in2) = agreements.agreement(&words, 1, (0, 1, 1), false).clone();
        assert!(in1.is_empty());
        assert!(in2.is_empty());
    }
}

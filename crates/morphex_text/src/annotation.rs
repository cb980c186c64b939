//! Annotations and the three-valued agreement verdict.

use crate::attributes::{Attribute, Attributes, MAIN_ATTRIBUTE, NULL_ATTRIBUTE_VALUE};

/// How well two annotations agree on an attribute range.
///
/// *Strong* means every compared value is equal; *weak* tolerates mismatches
/// where either side left the attribute unset (the null value acts as a
/// wildcard); *none* is any other mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AgreementPower {
    None,
    Weak,
    Strong,
}

/// One morphological reading of a word: a full attribute-value vector.
///
/// Invariant: the main attribute is never null.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    attributes: Attributes,
}

impl Annotation {
    pub fn new(attributes: Attributes) -> Self {
        debug_assert!(attributes.get(MAIN_ATTRIBUTE) != NULL_ATTRIBUTE_VALUE);
        Self { attributes }
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Agreement between two annotations on `attribute`.
    ///
    /// For a specific attribute only that slot is compared. For the main
    /// attribute the scan covers `[agreement_begin, N)` — every
    /// agreement-eligible attribute at once.
    pub fn agreement(
        &self,
        other: &Annotation,
        attribute: Attribute,
        agreement_begin: Attribute,
    ) -> AgreementPower {
        debug_assert_eq!(self.attributes.size(), other.attributes.size());

        let (begin, end) = if attribute == MAIN_ATTRIBUTE {
            (agreement_begin, self.attributes.size())
        } else {
            (attribute, attribute + 1)
        };

        let mut power = AgreementPower::Strong;
        for a in begin..end {
            let v1 = self.attributes.get(a);
            let v2 = other.attributes.get(a);
            if v1 != v2 {
                if v1 == NULL_ATTRIBUTE_VALUE || v2 == NULL_ATTRIBUTE_VALUE {
                    power = AgreementPower::Weak;
                } else {
                    return AgreementPower::None;
                }
            }
        }
        power
    }
}

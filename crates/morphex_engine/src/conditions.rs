//! Alternative conditions and their lowering onto variant words.
//!
//! A condition written after an alternative constrains the *variant*, not a
//! single word, so once expansion has produced a concrete word list the
//! condition must be pinned down: find every word position its arguments
//! select, anchor the condition on the last such position, and record the
//! backwards offsets to the earlier ones. The offsets survive concatenation
//! and repetition because they are relative.
//!
//! Lowering result per condition:
//!
//! - *agreement*: one [`WordCondition::Agreement`] on the anchor word with
//!   offsets to every earlier selected position (a single-argument condition
//!   is always strong),
//! - *dictionary*: one [`WordCondition::Dictionary`] on the anchor word,
//!   argument groups separated by the reserved maximal offset.

use morphex_text::{Attribute, MAIN_ATTRIBUTE};

use crate::ir::{PatternArgument, Patterns};
use crate::variants::{PatternVariant, WordCondition, CONDITION_SEPARATOR};

/// One agreement or dictionary condition of an alternative.
#[derive(Debug, Clone)]
pub struct Condition {
    strong: bool,
    dictionary: Option<String>,
    arguments: Vec<PatternArgument>,
}

impl Condition {
    pub fn agreement(strong: bool, arguments: Vec<PatternArgument>) -> Self {
        debug_assert!(!arguments.is_empty());
        Self {
            strong,
            dictionary: None,
            arguments,
        }
    }

    pub fn dictionary(name: String, arguments: Vec<PatternArgument>) -> Self {
        debug_assert!(!name.is_empty());
        debug_assert!(!arguments.is_empty());
        Self {
            strong: false,
            dictionary: Some(name),
            arguments,
        }
    }

    pub fn is_agreement(&self) -> bool {
        self.dictionary.is_none()
    }

    /// A single-argument agreement: every selected word agrees with every
    /// other, strongly.
    pub fn is_self_agreement(&self) -> bool {
        self.is_agreement() && self.arguments.len() == 1
    }

    pub fn arguments(&self) -> &[PatternArgument] {
        &self.arguments
    }

    /// The attribute the agreement runs on; the main attribute stands for
    /// "every agreement-eligible attribute".
    fn attribute(&self) -> Attribute {
        self.arguments
            .iter()
            .find(|a| a.has_sign())
            .map_or(MAIN_ATTRIBUTE, |a| a.sign)
    }

    fn apply_agreement(&self, variant: &mut PatternVariant) {
        let mut positions: Vec<usize> = Vec::new();
        for (position, word) in variant.words.iter().enumerate() {
            if self
                .arguments
                .iter()
                .any(|argument| argument.matches_word(&word.id))
            {
                positions.push(position);
            }
        }
        if positions.len() < 2 {
            return;
        }

        let anchor = *positions.last().expect("at least two positions");
        let offsets: Vec<u8> = positions[..positions.len() - 1]
            .iter()
            .map(|&p| {
                debug_assert!(anchor - p < CONDITION_SEPARATOR as usize);
                (anchor - p) as u8
            })
            .collect();
        variant.words[anchor].conditions.push(WordCondition::Agreement {
            attribute: self.attribute(),
            strong: self.strong || self.is_self_agreement(),
            offsets,
        });
    }

    fn apply_dictionary(&self, variant: &mut PatternVariant) {
        let mut groups: Vec<Vec<usize>> = vec![Vec::new()];
        for argument in &self.arguments {
            if !argument.defined() {
                groups.push(Vec::new());
                continue;
            }
            for (position, word) in variant.words.iter().enumerate() {
                if argument.matches_word(&word.id) {
                    groups.last_mut().expect("one group is open").push(position);
                }
            }
        }
        groups.retain(|group| !group.is_empty());
        if groups.is_empty() {
            return;
        }

        let anchor = groups
            .iter()
            .flatten()
            .copied()
            .max()
            .expect("groups are non-empty");
        let mut offsets = Vec::new();
        for (gi, group) in groups.iter().enumerate() {
            if gi > 0 {
                offsets.push(CONDITION_SEPARATOR);
            }
            for &position in group {
                debug_assert!(anchor - position < CONDITION_SEPARATOR as usize);
                offsets.push((anchor - position) as u8);
            }
        }
        variant.words[anchor].conditions.push(WordCondition::Dictionary {
            name: self.dictionary.clone().expect("dictionary condition"),
            offsets,
        });
    }

    pub fn print(&self, patterns: &Patterns) -> String {
        match &self.dictionary {
            None => {
                let sign = if self.strong { "==" } else { "=" };
                let parts: Vec<String> = self
                    .arguments
                    .iter()
                    .map(|a| a.print(patterns))
                    .collect();
                parts.join(sign)
            }
            Some(name) => {
                let mut out = format!("{}(", name);
                let mut first = true;
                for argument in &self.arguments {
                    if !argument.defined() {
                        out.push_str(", ");
                        first = true;
                        continue;
                    }
                    if !first {
                        out.push(' ');
                    }
                    first = false;
                    out.push_str(&argument.print(patterns));
                }
                out.push(')');
                out
            }
        }
    }
}

/// The condition list of one alternative.
#[derive(Debug, Clone, Default)]
pub struct Conditions {
    data: Vec<Condition>,
}

impl Conditions {
    pub fn new(data: Vec<Condition>) -> Self {
        Self { data }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Lowers every condition onto the words of `variant`.
    pub fn apply(&self, variant: &mut PatternVariant) {
        for condition in &self.data {
            if condition.is_agreement() {
                condition.apply_agreement(variant);
            } else {
                condition.apply_dictionary(variant);
            }
        }
    }

    pub fn print(&self, patterns: &Patterns) -> String {
        if self.data.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = self.data.iter().map(|c| c.print(patterns)).collect();
        format!("<<{}>>", parts.join(","))
    }
}

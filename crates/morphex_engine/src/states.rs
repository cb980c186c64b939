//! The nondeterministic state machine and its compilation from variants.
//!
//! Every variant becomes a chain of transitions, one per word; variants
//! sharing a printed prefix share the corresponding chain prefix, so the
//! machine is a trie over printed words. State 0 is initial; a state with no
//! outgoing transitions is terminal. Emission is not special-cased: it is
//! an action on the state reached by a complete variant, which lets a short
//! variant emit and a longer one continue through the same state.
//!
//! Conditions lowered onto a word run *after* that word is consumed: they
//! become actions on the target state of the word's transition.

use log::debug;

use morphex_text::{
    AnnotationIndices, Attribute, AttributesRestriction, Word,
};
use regex::Regex;

use crate::ir::Patterns;
use crate::variants::{PatternVariants, WordCondition};

/// Index into [`States`].
pub type StateIndex = usize;

/// A single-word test attached to an outgoing arc.
#[derive(Debug)]
pub enum Transition {
    /// Surface-form regexp; passing yields every annotation index.
    Word { regex: Regex, next: StateIndex },
    /// Attribute predicate; yields the indices of passing annotations.
    Attributes {
        restriction: AttributesRestriction,
        next: StateIndex,
    },
}

impl Transition {
    pub fn next(&self) -> StateIndex {
        match self {
            Transition::Word { next, .. } | Transition::Attributes { next, .. } => *next,
        }
    }

    /// Tests `word`, filling `indices` with the annotation indices that
    /// passed. Every returned index refers into `word.annotations()`.
    pub fn matches(&self, word: &Word, indices: &mut AnnotationIndices) -> bool {
        match self {
            Transition::Word { regex, .. } => {
                if !word.match_word(regex) {
                    return false;
                }
                *indices = word.annotation_indices();
                true
            }
            Transition::Attributes { restriction, .. } => {
                word.match_attributes(restriction, indices)
            }
        }
    }
}

/// An operation run when a state is entered, before its transitions.
#[derive(Debug)]
pub enum Action {
    /// Enforce agreement between the word just consumed and earlier words.
    Agreement {
        attribute: Attribute,
        strong: bool,
        offsets: Vec<u8>,
    },
    /// Report the dictionary phrase assembled from earlier words.
    Dictionary { name: String, offsets: Vec<u8> },
    /// Emit the span from the initial word to the word just consumed.
    Save,
}

/// One state: its action list and outgoing transitions.
#[derive(Debug, Default)]
pub struct State {
    pub actions: Vec<Action>,
    pub transitions: Vec<Transition>,
}

/// The compiled machine. State 0 is initial.
#[derive(Debug)]
pub struct States {
    states: Vec<State>,
}

impl States {
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state(&self, index: StateIndex) -> &State {
        &self.states[index]
    }

    /// Compiles a variant list.
    ///
    /// The list is sorted and deduplicated first: sorted order puts shared
    /// prefixes next to each other, which the prefix table below turns into
    /// shared chains.
    pub fn compile(variants: &PatternVariants, patterns: &Patterns) -> States {
        let mut sorted = variants.clone();
        sorted.sort_and_remove_duplicates(patterns);

        let mut states = vec![State::default()];
        // Printed word and target state of every chain link of the
        // previously compiled variant.
        let mut last_variant: Vec<(String, StateIndex)> = Vec::new();

        for variant in &sorted.variants {
            if variant.is_empty() {
                debug!("skipping an empty variant");
                continue;
            }

            let printed: Vec<String> = variant
                .words
                .iter()
                .map(|word| word.print(patterns))
                .collect();

            let mut shared = 0;
            let mut state = 0;
            while shared < printed.len()
                && shared < last_variant.len()
                && last_variant[shared].0 == printed[shared]
            {
                state = last_variant[shared].1;
                shared += 1;
            }
            last_variant.truncate(shared);

            for position in shared..variant.len() {
                let word = &variant.words[position];
                let next = states.len();
                states.push(State::default());

                let transition = match &word.regexp {
                    Some(regexp) => Transition::Word {
                        regex: regexp.regex().clone(),
                        next,
                    },
                    None => Transition::Attributes {
                        restriction: word
                            .signs
                            .build(patterns.configuration(), word.id.element),
                        next,
                    },
                };
                states[state].transitions.push(transition);

                for condition in &word.conditions {
                    states[next].actions.push(match condition {
                        WordCondition::Agreement {
                            attribute,
                            strong,
                            offsets,
                        } => Action::Agreement {
                            attribute: *attribute,
                            strong: *strong,
                            offsets: offsets.clone(),
                        },
                        WordCondition::Dictionary { name, offsets } => Action::Dictionary {
                            name: name.clone(),
                            offsets: offsets.clone(),
                        },
                    });
                }

                last_variant.push((printed[position].clone(), next));
                state = next;
            }

            states[state].actions.push(Action::Save);
        }

        debug!(
            "compiled {} variants into {} states",
            sorted.len(),
            states.len()
        );
        States { states }
    }
}

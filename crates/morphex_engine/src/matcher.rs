//! The matching executor.
//!
//! A depth-first walk over the compiled state machine. Each recursion level
//! owns one *frame* of `data`: the set of annotation indices still viable
//! for the word consumed at that position, plus that word's agreement-graph
//! edges. Actions narrow frames; transitions extend the walk by one word.
//!
//! # Rollback
//!
//! Every `match_state` call opens an *editor scope*. The first time a frame
//! other than the last is mutated inside the scope, its previous value is
//! snapshotted; when the scope closes — on every exit path — the snapshots
//! are written back. The last frame is never snapshotted: its owner
//! overwrites it before each transition and pops it afterwards, and no code
//! mutates it after the last child recursion returns.
//!
//! # Agreement graph
//!
//! Frames are vertices keyed by `(frame, annotation index)`; an edge records
//! that two annotations agree on an attribute. Edges are stored in both
//! endpoint frames, ordered by `(own index, other frame, attribute, other
//! index)`, so "does this vertex keep any support under (frame, attribute)"
//! is a neighbour check in the sorted order. Removing a vertex cascades:
//! counterpart edges lose support and may remove their own vertices; a frame
//! whose index set empties fails the whole action.

use std::collections::BTreeSet;
use std::ops::Bound;

use log::debug;
use rustc_hash::FxHashMap;

use morphex_text::{
    AgreementPower, AnnotationIndex, AnnotationIndices, Attribute, Text,
};

use crate::states::{Action, State, States};
use crate::variants::CONDITION_SEPARATOR;

/// One agreement-graph edge as stored in the frame of its first endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Edge {
    /// Annotation index in the owning frame.
    pub index1: AnnotationIndex,
    /// Frame of the other endpoint.
    pub word2: u8,
    pub attribute: Attribute,
    /// Annotation index in the other frame.
    pub index2: AnnotationIndex,
}

/// Per-position match state: viable annotation indices plus graph edges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub indices: AnnotationIndices,
    pub edges: BTreeSet<Edge>,
}

/// An emitted match: inclusive word range of the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchedSpan {
    pub begin: usize,
    pub end: usize,
}

type EditorScope = FxHashMap<usize, Frame>;

/// One matching session over a `(text, states)` pair.
///
/// Repeated [`MatchContext::match_from`] calls are independent: the walk
/// leaves `data` and the editor stack empty on return, so probing every
/// start position reuses one context.
pub struct MatchContext<'a> {
    text: &'a Text,
    states: &'a States,
    initial_word: usize,
    data: Vec<Frame>,
    editors: Vec<EditorScope>,
    found: Vec<MatchedSpan>,
}

impl<'a> MatchContext<'a> {
    pub fn new(text: &'a Text, states: &'a States) -> Self {
        Self {
            text,
            states,
            initial_word: 0,
            data: Vec::with_capacity(32),
            editors: Vec::with_capacity(32),
            found: Vec::new(),
        }
    }

    /// Explores every match starting at `initial_word`.
    pub fn match_from(&mut self, initial_word: usize) {
        debug_assert!(self.data.is_empty());
        debug_assert!(self.editors.is_empty());
        self.initial_word = initial_word;
        self.match_state(0);
        debug_assert!(self.data.is_empty());
        debug_assert!(self.editors.is_empty());
    }

    /// Spans emitted so far.
    pub fn found(&self) -> &[MatchedSpan] {
        &self.found
    }

    pub fn take_found(&mut self) -> Vec<MatchedSpan> {
        std::mem::take(&mut self.found)
    }

    /// Zero-based position, within the current span, of the word last
    /// consumed.
    fn shift(&self) -> usize {
        debug_assert!(!self.data.is_empty());
        self.data.len() - 1
    }

    /// Text index of the word last consumed.
    fn word_index(&self) -> usize {
        self.initial_word + self.shift()
    }

    fn match_state(&mut self, state_index: usize) {
        let states: &'a States = self.states;
        let state = states.state(state_index);

        self.editors.push(EditorScope::default());

        if !self.run_actions(state) // conditions are not met
            || state.transitions.is_empty() // leaf
            || self.initial_word + self.data.len() >= self.text.len()
        {
            self.pop_editor();
            return;
        }

        self.data.push(Frame::default());
        let text: &'a Text = self.text;
        let word = text.word(self.initial_word + self.data.len() - 1);
        for transition in &state.transitions {
            let mut indices = AnnotationIndices::new();
            if transition.matches(word, &mut indices) {
                *self.data.last_mut().expect("frame was pushed") = Frame {
                    indices,
                    edges: BTreeSet::new(),
                };
                self.match_state(transition.next());
            }
        }
        self.data.pop();
        self.pop_editor();
    }

    fn run_actions(&mut self, state: &State) -> bool {
        for action in &state.actions {
            match action {
                Action::Agreement {
                    attribute,
                    strong,
                    offsets,
                } => {
                    if !self.agreement_run(*attribute, *strong, offsets) {
                        return false;
                    }
                }
                Action::Dictionary { name, offsets } => self.dictionary_run(name, offsets),
                Action::Save => self.save_run(),
            }
        }
        true
    }

    // ------------------------------------------------------------------
    // Editor scopes
    // ------------------------------------------------------------------

    /// Mutable access to a frame, snapshotting every frame but the last on
    /// first touch within the current scope.
    fn get_for_edit(&mut self, index: usize) -> &mut Frame {
        debug_assert!(index < self.data.len());
        if index + 1 < self.data.len() {
            let scope = self.editors.last_mut().expect("a scope is open");
            if !scope.contains_key(&index) {
                scope.insert(index, self.data[index].clone());
            }
        }
        &mut self.data[index]
    }

    /// Closes the current scope, restoring every snapshotted frame.
    fn pop_editor(&mut self) {
        let scope = self.editors.pop().expect("a scope is open");
        for (index, frame) in scope {
            debug_assert!(index < self.data.len());
            self.data[index] = frame;
        }
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    fn agreement_run(&mut self, attribute: Attribute, strong: bool, offsets: &[u8]) -> bool {
        let word2 = self.shift();
        for &offset in offsets {
            debug_assert!(offset > 0);
            debug_assert!(offset as usize <= word2);
            if !self.agree(word2 - offset as usize, word2, attribute, strong) {
                return false;
            }
        }
        true
    }

    /// Builds agreement edges between frames `word1` and `word2` and prunes
    /// annotations left without support.
    fn agree(&mut self, word1: usize, word2: usize, attribute: Attribute, strong: bool) -> bool {
        debug_assert!(word1 < word2);

        let text: &'a Text = self.text;
        let agreement_begin = text.agreement_begin();
        let annotations1 = text.word(self.initial_word + word1).annotations();
        let annotations2 = text.word(self.initial_word + word2).annotations();

        let indices1 = self.data[word1].indices.clone();
        let indices2 = self.data[word2].indices.clone();
        let mut unused1 = indices1.clone();
        let mut unused2 = indices2.clone();

        let mut added = false;
        for &index1 in indices1.iter() {
            for &index2 in indices2.iter() {
                let power = annotations1[index1 as usize].agreement(
                    &annotations2[index2 as usize],
                    attribute,
                    agreement_begin,
                );
                match power {
                    AgreementPower::None => continue,
                    AgreementPower::Strong => {}
                    AgreementPower::Weak => {
                        if strong {
                            continue;
                        }
                    }
                }
                added = true;
                unused1.erase(&index1);
                unused2.erase(&index2);
                self.add_edge(word1, index1, word2, index2, attribute);
            }
        }

        if !added {
            return false;
        }

        for &index in unused1.iter() {
            if !self.remove_vertex(word1, index) {
                return false;
            }
        }
        for &index in unused2.iter() {
            if !self.remove_vertex(word2, index) {
                return false;
            }
        }
        true
    }

    fn dictionary_run(&mut self, name: &str, offsets: &[u8]) {
        let text = self.text;
        let mut phrases: Vec<String> = vec![String::new()];
        for &offset in offsets {
            if offset == CONDITION_SEPARATOR {
                phrases.push(String::new());
                continue;
            }
            debug_assert!(offset as usize <= self.shift());
            let word = self.word_index() - offset as usize;
            let phrase = phrases.last_mut().expect("one phrase is open");
            if !phrase.is_empty() {
                phrase.push(' ');
            }
            phrase.push_str(text.word(word).text());
        }
        debug!("dictionary{{{}}}({})", name, phrases.join(","));
    }

    fn save_run(&mut self) {
        self.found.push(MatchedSpan {
            begin: self.initial_word,
            end: self.word_index(),
        });
    }

    // ------------------------------------------------------------------
    // Agreement graph
    // ------------------------------------------------------------------

    fn add_edge(
        &mut self,
        word1: usize,
        index1: AnnotationIndex,
        word2: usize,
        index2: AnnotationIndex,
        attribute: Attribute,
    ) {
        let forward = Edge {
            index1,
            word2: word2 as u8,
            attribute,
            index2,
        };
        let frame1 = self.get_for_edit(word1);
        debug_assert!(frame1.indices.has(&index1));
        if !frame1.edges.insert(forward) {
            // Already recorded by an earlier action on the same pair.
            return;
        }

        let mirror = Edge {
            index1: index2,
            word2: word1 as u8,
            attribute,
            index2: index1,
        };
        let frame2 = self.get_for_edit(word2);
        debug_assert!(frame2.indices.has(&index2));
        let inserted = frame2.edges.insert(mirror);
        debug_assert!(inserted);
    }

    /// Removes an annotation from a frame, cascading through its edges.
    /// `false` when some frame's index set became empty.
    fn remove_vertex(&mut self, word: usize, index: AnnotationIndex) -> bool {
        let frame = self.get_for_edit(word);
        if !frame.indices.has(&index) {
            return true;
        }
        frame.indices.erase(&index);
        if frame.indices.is_empty() {
            return false;
        }

        let low = Edge {
            index1: index,
            word2: 0,
            attribute: 0,
            index2: 0,
        };
        let high = Edge {
            index1: index,
            word2: u8::MAX,
            attribute: u8::MAX,
            index2: u8::MAX,
        };
        let outgoing: Vec<Edge> = frame.edges.range(low..=high).copied().collect();
        for edge in &outgoing {
            frame.edges.remove(edge);
        }

        for edge in outgoing {
            if !self.remove_edge(
                edge.word2 as usize,
                edge.index2,
                word as u8,
                index,
                edge.attribute,
            ) {
                return false;
            }
        }
        true
    }

    /// Removes one edge record from `word1`'s frame. When the record was
    /// the vertex's last support under `(word2, attribute)` — neither the
    /// previous nor the next record in the sorted order shares that key —
    /// the vertex itself goes.
    fn remove_edge(
        &mut self,
        word1: usize,
        index1: AnnotationIndex,
        word2: u8,
        index2: AnnotationIndex,
        attribute: Attribute,
    ) -> bool {
        let edge = Edge {
            index1,
            word2,
            attribute,
            index2,
        };
        let frame = self.get_for_edit(word1);
        if !frame.edges.contains(&edge) {
            return true;
        }

        let same_support = |candidate: &Edge| {
            candidate.index1 == index1
                && candidate.word2 == word2
                && candidate.attribute == attribute
        };
        let mut remove_vertex = true;
        if let Some(previous) = frame.edges.range(..edge).next_back() {
            if same_support(previous) {
                remove_vertex = false;
            }
        }
        if remove_vertex {
            if let Some(next) = frame
                .edges
                .range((Bound::Excluded(edge), Bound::Unbounded))
                .next()
            {
                if same_support(next) {
                    remove_vertex = false;
                }
            }
        }

        frame.edges.remove(&edge);
        if remove_vertex {
            return self.remove_vertex(word1, index1);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use morphex_text::{Annotation, Attributes, Configuration, Word};
    use std::sync::Arc;

    use crate::ir::{PatternArgument, Patterns, SignRestrictions};
    use crate::variants::{PatternVariant, PatternVariants, PatternWord, WordCondition};
    use rustc_hash::FxHashMap;
    use morphex_text::StringStore;

    fn configuration() -> Arc<Configuration> {
        Arc::new(
            Configuration::from_json(
                r#"{ "word_signs": [
                    { "names": ["pos"], "type": "main", "values": ["A", "N", "V"] },
                    { "names": ["num"], "type": "enum", "values": ["sg", "pl"], "consistent": true },
                    { "names": ["case"], "type": "enum", "values": ["nom", "gen"], "consistent": true }
                ] }"#,
            )
            .unwrap(),
        )
    }

    fn patterns(configuration: Arc<Configuration>) -> Patterns {
        Patterns::new(
            configuration,
            Vec::new(),
            FxHashMap::default(),
            StringStore::new(),
        )
    }

    /// `readings`: per annotation `[pos, num, case]`, 0 meaning unset.
    fn word(text: &str, readings: &[[u32; 3]]) -> Word {
        let annotations = readings
            .iter()
            .map(|values| {
                let mut attributes = Attributes::new(3);
                for (i, v) in values.iter().enumerate() {
                    attributes.set(i as u8, *v);
                }
                Annotation::new(attributes)
            })
            .collect();
        Word::new(text.to_owned(), annotations)
    }

    fn variant(elements: &[usize]) -> PatternVariant {
        let mut v = PatternVariant::new();
        for &e in elements {
            v.words
                .push(PatternWord::new(PatternArgument::element(e), SignRestrictions::new()));
        }
        v
    }

    fn spans(found: &[MatchedSpan]) -> Vec<(usize, usize)> {
        found.iter().map(|s| (s.begin, s.end)).collect()
    }

    #[test]
    fn plain_chain_matches_and_emits() {
        let configuration = configuration();
        let patterns = patterns(configuration.clone());
        // A(1) N(2)
        let mut variants = PatternVariants::new();
        variants.variants.push(variant(&[1, 2]));
        let states = crate::states::States::compile(&variants, &patterns);

        let text = Text::new(
            configuration,
            vec![
                word("red", &[[1, 1, 0]]),
                word("cat", &[[2, 1, 0]]),
                word("runs", &[[3, 1, 0]]),
            ],
        );

        let mut context = MatchContext::new(&text, &states);
        for start in 0..text.len() {
            context.match_from(start);
        }
        assert_eq!(spans(context.found()), vec![(0, 1)]);
    }

    #[test]
    fn agreement_action_prunes_and_matches() {
        let configuration = configuration();
        let patterns = patterns(configuration.clone());

        let mut v = variant(&[1, 2]);
        v.words[1].conditions.push(WordCondition::Agreement {
            attribute: 1,
            strong: true,
            offsets: vec![1],
        });
        let mut variants = PatternVariants::new();
        variants.variants.push(v);
        let states = crate::states::States::compile(&variants, &patterns);

        // "red" is ambiguous in number; only the plural reading survives
        // next to "cats".
        let text = Text::new(
            configuration,
            vec![
                word("red", &[[1, 1, 0], [1, 2, 0]]),
                word("cats", &[[2, 2, 0]]),
            ],
        );

        let mut context = MatchContext::new(&text, &states);
        context.match_from(0);
        assert_eq!(spans(context.found()), vec![(0, 1)]);
    }

    #[test]
    fn failed_agreement_blocks_emission() {
        let configuration = configuration();
        let patterns = patterns(configuration.clone());

        let mut v = variant(&[1, 2]);
        v.words[1].conditions.push(WordCondition::Agreement {
            attribute: 1,
            strong: true,
            offsets: vec![1],
        });
        let mut variants = PatternVariants::new();
        variants.variants.push(v);
        let states = crate::states::States::compile(&variants, &patterns);

        let text = Text::new(
            configuration,
            vec![word("red", &[[1, 1, 0]]), word("cats", &[[2, 2, 0]])],
        );

        let mut context = MatchContext::new(&text, &states);
        context.match_from(0);
        assert!(context.found().is_empty());
    }

    #[test]
    fn weak_agreement_passes_unless_strong_is_required() {
        let configuration = configuration();
        let patterns = patterns(configuration.clone());

        for (strong, expected) in [(true, 0), (false, 1)] {
            let mut v = variant(&[1, 2]);
            v.words[1].conditions.push(WordCondition::Agreement {
                attribute: 1,
                strong,
                offsets: vec![1],
            });
            let mut variants = PatternVariants::new();
            variants.variants.push(v);
            let states = crate::states::States::compile(&variants, &patterns);

            // The adjective has no number at all: a wildcard.
            let text = Text::new(
                configuration.clone(),
                vec![word("red", &[[1, 0, 0]]), word("cats", &[[2, 2, 0]])],
            );

            let mut context = MatchContext::new(&text, &states);
            context.match_from(0);
            assert_eq!(context.found().len(), expected, "strong = {}", strong);
        }
    }

    #[test]
    fn backtracking_restores_frames_exactly() {
        let configuration = configuration();
        let patterns = patterns(configuration.clone());

        // Two variants share the A-prefix; the first runs an agreement that
        // narrows the shared frame, the second must see it untouched.
        let mut strict = variant(&[1, 2]);
        strict.words[1].conditions.push(WordCondition::Agreement {
            attribute: 1,
            strong: true,
            offsets: vec![1],
        });
        let loose = variant(&[1, 3]);
        let mut variants = PatternVariants::new();
        variants.variants.push(strict);
        variants.variants.push(loose);
        let states = crate::states::States::compile(&variants, &patterns);

        let text = Text::new(
            configuration,
            vec![
                word("red", &[[1, 1, 0], [1, 2, 0]]),
                word("x", &[[2, 2, 0], [3, 1, 0]]),
            ],
        );

        let mut context = MatchContext::new(&text, &states);
        context.match_from(0);
        let first = spans(&context.take_found());

        let mut fresh = MatchContext::new(&text, &states);
        fresh.match_from(0);
        assert_eq!(first, spans(fresh.found()));
        // Both variants match: agreement narrows one path, the other path
        // still sees both readings of "red".
        assert_eq!(first, vec![(0, 1), (0, 1)]);
    }

    #[test]
    fn repeated_match_calls_are_idempotent() {
        let configuration = configuration();
        let patterns = patterns(configuration.clone());

        let mut v = variant(&[1, 2]);
        v.words[1].conditions.push(WordCondition::Agreement {
            attribute: 1,
            strong: true,
            offsets: vec![1],
        });
        let mut variants = PatternVariants::new();
        variants.variants.push(v);
        let states = crate::states::States::compile(&variants, &patterns);

        let text = Text::new(
            configuration,
            vec![
                word("red", &[[1, 1, 0], [1, 2, 0]]),
                word("cats", &[[2, 2, 0]]),
            ],
        );

        let mut context = MatchContext::new(&text, &states);
        context.match_from(0);
        let first = spans(&context.take_found());
        context.match_from(0);
        let second = spans(&context.take_found());
        assert_eq!(first, second);
    }

    #[test]
    fn dictionary_action_never_blocks() {
        let configuration = configuration();
        let patterns = patterns(configuration.clone());

        let mut v = variant(&[1, 2]);
        v.words[1].conditions.push(WordCondition::Dictionary {
            name: "TermDict".to_owned(),
            offsets: vec![1, CONDITION_SEPARATOR, 0],
        });
        let mut variants = PatternVariants::new();
        variants.variants.push(v);
        let states = crate::states::States::compile(&variants, &patterns);

        let text = Text::new(
            configuration,
            vec![word("red", &[[1, 1, 0]]), word("cat", &[[2, 1, 0]])],
        );

        let mut context = MatchContext::new(&text, &states);
        context.match_from(0);
        assert_eq!(spans(context.found()), vec![(0, 1)]);
    }

    #[test]
    fn three_word_agreement_cascades_through_the_graph() {
        let configuration = configuration();
        let patterns = patterns(configuration.clone());

        // A A N with one action on the last word agreeing with both
        // adjectives on case.
        let mut v = variant(&[1, 1, 2]);
        v.words[2].conditions.push(WordCondition::Agreement {
            attribute: 2,
            strong: true,
            offsets: vec![2, 1],
        });
        let mut variants = PatternVariants::new();
        variants.variants.push(v);
        let states = crate::states::States::compile(&variants, &patterns);

        // first adjective: nom or gen; second: gen only; noun: gen only.
        let text = Text::new(
            configuration,
            vec![
                word("big", &[[1, 0, 1], [1, 0, 2]]),
                word("red", &[[1, 0, 2]]),
                word("cat", &[[2, 0, 2]]),
            ],
        );

        let mut context = MatchContext::new(&text, &states);
        context.match_from(0);
        assert_eq!(spans(context.found()), vec![(0, 2)]);
    }

    #[test]
    fn agreement_with_no_pairs_fails() {
        let configuration = configuration();
        let patterns = patterns(configuration.clone());

        let mut v = variant(&[1, 2]);
        v.words[1].conditions.push(WordCondition::Agreement {
            attribute: 2,
            strong: true,
            offsets: vec![1],
        });
        let mut variants = PatternVariants::new();
        variants.variants.push(v);
        let states = crate::states::States::compile(&variants, &patterns);

        let text = Text::new(
            configuration,
            vec![word("big", &[[1, 0, 1]]), word("cat", &[[2, 0, 2]])],
        );

        let mut context = MatchContext::new(&text, &states);
        context.match_from(0);
        assert!(context.found().is_empty());
    }
}

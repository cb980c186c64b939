//! Linear variants and the expansion context.
//!
//! Variant expansion unrolls a pattern tree into flat word sequences. A
//! [`PatternWord`] is either a surface regexp or an element carrying its
//! restrictions, its (possibly cleared) argument identifier, and any
//! conditions lowered onto it. A [`PatternVariant`] is one such sequence;
//! [`PatternVariants`] is the working list with printed-form deduplication.
//!
//! The [`PatternBuildContext`] carries everything expansion needs across
//! recursive pattern references: the per-name max-size stacks that bound
//! recursion, the cartesian-product helper, and the transposition swap
//! cache.

use rustc_hash::FxHashMap;

use morphex_text::Attribute;

use crate::ir::{PatternArgument, Patterns, SignRestrictions, WordRegexp};
use crate::transposition::{Swap, TranspositionSupport};
use std::rc::Rc;

/// Group separator inside dictionary condition offsets; also the exclusive
/// upper bound on variant length.
pub const CONDITION_SEPARATOR: u8 = u8::MAX;

/// A condition pinned onto one variant word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordCondition {
    /// The word must agree with the words `offsets` back.
    Agreement {
        attribute: Attribute,
        strong: bool,
        offsets: Vec<u8>,
    },
    /// Report the phrase groups assembled from the words `offsets` back;
    /// groups are separated by [`CONDITION_SEPARATOR`].
    Dictionary { name: String, offsets: Vec<u8> },
}

impl WordCondition {
    fn print(&self, patterns: &Patterns) -> String {
        match self {
            WordCondition::Agreement {
                attribute,
                strong,
                offsets,
            } => {
                let rendered: Vec<String> =
                    offsets.iter().map(|o| o.to_string()).collect();
                format!(
                    "{}{}{}",
                    patterns.sign_name(*attribute),
                    if *strong { "==" } else { "=" },
                    rendered.join(",")
                )
            }
            WordCondition::Dictionary { name, offsets } => {
                let mut out = format!("{}(", name);
                let mut first = true;
                for &offset in offsets {
                    if offset == CONDITION_SEPARATOR {
                        out.push(',');
                        first = true;
                        continue;
                    }
                    if !first {
                        out.push(' ');
                    }
                    first = false;
                    out.push_str(&offset.to_string());
                }
                out.push(')');
                out
            }
        }
    }
}

/// One word of a variant.
#[derive(Debug, Clone)]
pub struct PatternWord {
    /// Argument identity; cleared to `None` when the word is not exposed,
    /// but the element encoding survives for class lookup and printing.
    pub id: PatternArgument,
    pub regexp: Option<WordRegexp>,
    pub signs: SignRestrictions,
    pub conditions: Vec<WordCondition>,
}

impl PatternWord {
    pub fn regexp(regexp: WordRegexp) -> Self {
        Self {
            id: PatternArgument::none(),
            regexp: Some(regexp),
            signs: SignRestrictions::new(),
            conditions: Vec::new(),
        }
    }

    pub fn new(id: PatternArgument, signs: SignRestrictions) -> Self {
        debug_assert!(id.defined());
        Self {
            id,
            regexp: None,
            signs,
            conditions: Vec::new(),
        }
    }

    /// The stable printed form used for deduplication and traces.
    pub fn print(&self, patterns: &Patterns) -> String {
        if let Some(regexp) = &self.regexp {
            return format!("\"{}\"", regexp.source());
        }
        let mut out = if self.id.defined() {
            self.id.print(patterns)
        } else {
            patterns.element_name(self.id.element)
        };
        out.push_str(&self.signs.print(patterns));
        if !self.conditions.is_empty() {
            let parts: Vec<String> = self
                .conditions
                .iter()
                .map(|c| c.print(patterns))
                .collect();
            out.push_str(&format!("<<{}>>", parts.join(",")));
        }
        out
    }
}

/// One fully-unrolled word sequence.
#[derive(Debug, Clone, Default)]
pub struct PatternVariant {
    pub words: Vec<PatternWord>,
}

impl PatternVariant {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Concatenates another variant's words onto this one.
    pub fn append(&mut self, other: &PatternVariant) {
        self.words.extend(other.words.iter().cloned());
    }

    pub fn print(&self, patterns: &Patterns) -> String {
        let mut out = String::new();
        for word in &self.words {
            out.push(' ');
            out.push_str(&word.print(patterns));
        }
        out
    }
}

/// The working list of variants.
#[derive(Debug, Clone, Default)]
pub struct PatternVariants {
    pub variants: Vec<PatternVariant>,
}

impl PatternVariants {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Sorts by printed form and drops duplicates. The printed form is an
    /// injection on the survivors, so equality of strings is equality of
    /// variants.
    pub fn sort_and_remove_duplicates(&mut self, patterns: &Patterns) {
        let mut printed: Vec<(String, PatternVariant)> = std::mem::take(&mut self.variants)
            .into_iter()
            .map(|variant| (variant.print(patterns), variant))
            .collect();
        printed.sort_by(|a, b| a.0.cmp(&b.0));
        printed.dedup_by(|a, b| a.0 == b.0);
        self.variants = printed.into_iter().map(|(_, variant)| variant).collect();
    }

    pub fn print(&self, patterns: &Patterns) -> String {
        let mut out = String::new();
        for variant in &self.variants {
            out.push_str(&variant.print(patterns));
            out.push('\n');
        }
        out
    }
}

/// Shared state of one expansion run.
pub struct PatternBuildContext<'a> {
    patterns: &'a Patterns,
    named_max_sizes: FxHashMap<String, Vec<usize>>,
    transpositions: TranspositionSupport,
}

impl<'a> PatternBuildContext<'a> {
    pub fn new(patterns: &'a Patterns) -> Self {
        Self {
            patterns,
            named_max_sizes: FxHashMap::default(),
            transpositions: TranspositionSupport::new(),
        }
    }

    pub fn patterns(&self) -> &'a Patterns {
        self.patterns
    }

    /// Enters pattern `name` with the requested bound and returns the
    /// effective one. Re-entering a pattern without shrinking the bound
    /// shrinks it by one, so mutually recursive references terminate while
    /// admissible sizes are preserved.
    pub fn push_max_size(&mut self, name: &str, max_size: usize) -> usize {
        let stack = self.named_max_sizes.entry(name.to_owned()).or_default();
        let effective = match stack.last() {
            None => max_size,
            Some(&top) if max_size < top => max_size,
            Some(&top) => top.saturating_sub(1),
        };
        stack.push(effective);
        effective
    }

    /// Leaves pattern `name`, returning the bound that was in effect.
    pub fn pop_max_size(&mut self, name: &str) -> usize {
        let stack = self
            .named_max_sizes
            .get_mut(name)
            .expect("pop follows push");
        stack.pop().expect("pop follows push")
    }

    /// The transposition swap list for `size` parts.
    pub fn swaps(&mut self, size: usize) -> Rc<Vec<Swap>> {
        self.transpositions.swaps(size)
    }

    /// Emits every combination of one variant per sub-list, skipping
    /// combinations longer than `max_size`.
    pub fn add_variants(
        all_sub_variants: &[PatternVariants],
        variants: &mut PatternVariants,
        max_size: usize,
    ) {
        debug_assert!(all_sub_variants.iter().all(|sub| !sub.is_empty()));
        let mut indices = vec![0usize; all_sub_variants.len()];
        loop {
            let mut variant = PatternVariant::new();
            for (i, &index) in indices.iter().enumerate() {
                variant.append(&all_sub_variants[i].variants[index]);
            }
            if variant.len() <= max_size {
                variants.variants.push(variant);
            }
            if !Self::next_indices(all_sub_variants, &mut indices) {
                break;
            }
        }
    }

    fn next_indices(all_sub_variants: &[PatternVariants], indices: &mut [usize]) -> bool {
        for pos in (0..indices.len()).rev() {
            if indices[pos] + 1 < all_sub_variants[pos].variants.len() {
                indices[pos] += 1;
                return true;
            }
            indices[pos] = 0;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use morphex_text::{Configuration, StringStore};
    use std::sync::Arc;

    fn empty_patterns() -> Patterns {
        let configuration = Arc::new(
            Configuration::from_json(
                r#"{ "word_signs": [
                    { "names": ["pos"], "type": "main", "values": ["N", "V"] }
                ] }"#,
            )
            .unwrap(),
        );
        Patterns::new(
            configuration,
            Vec::new(),
            FxHashMap::default(),
            StringStore::new(),
        )
    }

    #[test]
    fn budget_push_uses_requested_when_smaller() {
        let patterns = empty_patterns();
        let mut context = PatternBuildContext::new(&patterns);
        assert_eq!(context.push_max_size("P", 5), 5);
        assert_eq!(context.push_max_size("P", 3), 3);
        assert_eq!(context.pop_max_size("P"), 3);
        assert_eq!(context.pop_max_size("P"), 5);
    }

    #[test]
    fn budget_reentry_shrinks_by_one() {
        let patterns = empty_patterns();
        let mut context = PatternBuildContext::new(&patterns);
        assert_eq!(context.push_max_size("P", 4), 4);
        assert_eq!(context.push_max_size("P", 4), 3);
        assert_eq!(context.push_max_size("P", 7), 2);
        assert_eq!(context.push_max_size("P", 0), 0);
    }

    #[test]
    fn next_indices_walks_the_full_product() {
        let make = |n: usize| {
            let mut variants = PatternVariants::new();
            for _ in 0..n {
                variants.variants.push(PatternVariant::new());
            }
            variants
        };
        let lists = vec![make(2), make(3)];
        let mut indices = vec![0, 0];
        let mut count = 1;
        while PatternBuildContext::next_indices(&lists, &mut indices) {
            count += 1;
        }
        assert_eq!(count, 6);
    }
}

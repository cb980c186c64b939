//! The pattern intermediate representation.
//!
//! A checked pattern set is a forest of [`PatternBase`] trees plus the name
//! tables that make element and reference identifiers printable. The trees
//! are frozen after semantic checking; everything downstream (variant
//! expansion, state compilation) only reads them.
//!
//! # Identifier encodings
//!
//! Both elements and references carry an optional decimal index so one word
//! class or pattern can occur several times in a definition (`N`, `N2`).
//! The encodings fold the index in:
//!
//! - element id = `main value index + index · main_size`
//! - reference id = `pattern index + index · pattern count`
//!
//! where `main_size` counts the main attribute's values (with the reserved
//! empty value) and decoding is the matching div/mod.

use std::fmt::Write as _;
use std::sync::Arc;

use morphex_base::OrderedSet;
use regex::Regex;
use rustc_hash::FxHashMap;

use morphex_text::{
    Attribute, AttributeValue, AttributesRestriction, AttributesRestrictionBuilder, AttributeType,
    Configuration, StringStore, MAIN_ATTRIBUTE,
};

use crate::conditions::Conditions;
use crate::variants::{PatternBuildContext, PatternVariant, PatternVariants, PatternWord};

/// Encoded element identifier.
pub type TElement = usize;

/// Encoded pattern-reference identifier.
pub type TReference = usize;

/// Marker element matching every word; used by whole-alternative agreement.
pub const ANY_ELEMENT: TElement = TElement::MAX;

// ============================================================================
// Indexed names
// ============================================================================

/// A name with its optional trailing decimal index: `N2` is `(N, 2)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedName {
    pub name: String,
    pub index: usize,
}

impl IndexedName {
    /// Splits a trailing decimal index off `text`. The second result is
    /// `true` when an explicit index was present.
    pub fn parse(text: &str) -> (IndexedName, bool) {
        let split = text
            .rfind(|c: char| !c.is_ascii_digit())
            .map_or(0, |pos| pos + c_len(text, pos));
        let (name, digits) = text.split_at(split);
        if digits.is_empty() {
            (
                IndexedName {
                    name: name.to_owned(),
                    index: 0,
                },
                false,
            )
        } else {
            (
                IndexedName {
                    name: name.to_owned(),
                    index: digits.parse().unwrap_or(usize::MAX),
                },
                true,
            )
        }
    }

    /// Re-attaches a nonzero index.
    pub fn normalize(&self) -> String {
        if self.index > 0 {
            format!("{}{}", self.name, self.index)
        } else {
            self.name.clone()
        }
    }
}

fn c_len(text: &str, pos: usize) -> usize {
    text[pos..].chars().next().map_or(1, char::len_utf8)
}

// ============================================================================
// Pattern arguments
// ============================================================================

/// What a [`PatternArgument`] refers to.
///
/// With `Sample( A7, N7.c, Sub.Pa, SubSub.c )`:
/// `A7` is an element, `N7.c` an element with an attribute, `Sub.Pa` an
/// argument of a referenced pattern, `SubSub.c` an attribute of a referenced
/// pattern's head argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgumentKind {
    /// Separator inside dictionary argument lists.
    #[default]
    None,
    Element,
    ElementSign,
    ReferenceElement,
    ReferenceElementSign,
}

/// A reference path used by conditions and formal argument lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PatternArgument {
    pub kind: ArgumentKind,
    pub element: TElement,
    pub reference: TReference,
    pub sign: Attribute,
}

impl PatternArgument {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn element(element: TElement) -> Self {
        Self {
            kind: ArgumentKind::Element,
            element,
            reference: 0,
            sign: MAIN_ATTRIBUTE,
        }
    }

    pub fn element_sign(element: TElement, sign: Attribute) -> Self {
        Self {
            kind: ArgumentKind::ElementSign,
            element,
            reference: 0,
            sign,
        }
    }

    pub fn reference_element(reference: TReference, element: TElement) -> Self {
        Self {
            kind: ArgumentKind::ReferenceElement,
            element,
            reference,
            sign: MAIN_ATTRIBUTE,
        }
    }

    pub fn reference_element_sign(
        reference: TReference,
        element: TElement,
        sign: Attribute,
    ) -> Self {
        Self {
            kind: ArgumentKind::ReferenceElementSign,
            element,
            reference,
            sign,
        }
    }

    /// The catch-all argument of whole-alternative agreement: matches every
    /// word and names only an attribute.
    pub fn any_sign(sign: Attribute) -> Self {
        Self {
            kind: ArgumentKind::ElementSign,
            element: ANY_ELEMENT,
            reference: 0,
            sign,
        }
    }

    pub fn defined(&self) -> bool {
        self.kind != ArgumentKind::None
    }

    pub fn has_sign(&self) -> bool {
        matches!(
            self.kind,
            ArgumentKind::ElementSign | ArgumentKind::ReferenceElementSign
        )
    }

    pub fn has_reference(&self) -> bool {
        matches!(
            self.kind,
            ArgumentKind::ReferenceElement | ArgumentKind::ReferenceElementSign
        )
    }

    /// The same path without its attribute component.
    pub fn without_sign(&self) -> PatternArgument {
        let mut stripped = *self;
        stripped.sign = MAIN_ATTRIBUTE;
        stripped.kind = match self.kind {
            ArgumentKind::ElementSign => ArgumentKind::Element,
            ArgumentKind::ReferenceElementSign => ArgumentKind::ReferenceElement,
            other => other,
        };
        stripped
    }

    /// Two condition arguments disagree when only one carries an attribute
    /// or their attributes differ.
    pub fn inconsistent(&self, other: &PatternArgument) -> bool {
        if !self.defined() || !other.defined() {
            return false;
        }
        if self.has_sign() != other.has_sign() {
            return true;
        }
        self.sign != other.sign
    }

    /// Does this argument select the word identified by `id`?
    pub fn matches_word(&self, id: &PatternArgument) -> bool {
        if self.element == ANY_ELEMENT {
            return true;
        }
        let stripped = self.without_sign();
        match stripped.kind {
            ArgumentKind::Element => {
                id.kind == ArgumentKind::Element && id.element == stripped.element
            }
            ArgumentKind::ReferenceElement => {
                id.kind == ArgumentKind::ReferenceElement
                    && id.element == stripped.element
                    && id.reference == stripped.reference
            }
            _ => false,
        }
    }

    pub fn print(&self, patterns: &Patterns) -> String {
        if self.element == ANY_ELEMENT {
            return patterns.sign_name(self.sign).to_owned();
        }
        let mut out = String::new();
        if self.has_reference() {
            let _ = write!(out, "{}.", patterns.reference_name(self.reference));
        }
        out.push_str(&patterns.element_name(self.element));
        if self.has_sign() {
            let _ = write!(out, ".{}", patterns.sign_name(self.sign));
        }
        out
    }
}

// ============================================================================
// Sign restrictions
// ============================================================================

/// Sorted value set of one sign restriction.
pub type SignValues = OrderedSet<AttributeValue>;

/// One `<sign=v|w>` or `<sign!=v>` clause bound to an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignRestriction {
    element: TElement,
    sign: Attribute,
    exclude: bool,
    values: SignValues,
}

impl SignRestriction {
    pub fn new(element: TElement, sign: Attribute, values: SignValues, exclude: bool) -> Self {
        debug_assert!(!values.is_empty());
        Self {
            element,
            sign,
            exclude,
            values,
        }
    }

    pub fn sign(&self) -> Attribute {
        self.sign
    }

    pub fn element(&self) -> TElement {
        self.element
    }

    /// Narrows `self` to annotations passing both restrictions.
    pub fn intersect(&mut self, other: &SignRestriction) {
        debug_assert_eq!(self.sign, other.sign);
        let (values, exclude) = match (self.exclude, other.exclude) {
            (false, false) => (SignValues::intersection(&self.values, &other.values), false),
            (false, true) => (SignValues::difference(&self.values, &other.values), false),
            (true, false) => (SignValues::difference(&other.values, &self.values), false),
            (true, true) => (SignValues::union(&self.values, &other.values), true),
        };
        self.values = values;
        self.exclude = exclude;
    }

    /// An inclusion restriction with no values left admits nothing.
    pub fn is_unsatisfiable(&self) -> bool {
        !self.exclude && self.values.is_empty()
    }

    fn build(&self, builder: &mut AttributesRestrictionBuilder) {
        builder.add_attribute(self.sign, self.exclude);
        for value in self.values.iter() {
            builder.add_value(*value);
        }
    }

    pub fn print(&self, patterns: &Patterns) -> String {
        let mut out = String::new();
        out.push_str(patterns.sign_name(self.sign));
        out.push_str(if self.exclude { "!=" } else { "=" });
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                out.push('|');
            }
            out.push_str(&patterns.sign_value(self.sign, *value));
        }
        out
    }
}

/// The restrictions of one pattern word, sorted by sign.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignRestrictions {
    data: Vec<SignRestriction>,
}

impl SignRestrictions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Inserts a restriction; `false` if the sign is already restricted.
    pub fn add(&mut self, restriction: SignRestriction) -> bool {
        let position = self
            .data
            .binary_search_by_key(&restriction.sign, SignRestriction::sign);
        match position {
            Ok(_) => false,
            Err(position) => {
                self.data.insert(position, restriction);
                true
            }
        }
    }

    /// Intersects `other`'s restrictions into `self`, rebinding them to
    /// `element`. `false` when some restriction became unsatisfiable.
    pub fn intersect_into(&mut self, other: &SignRestrictions, element: TElement) -> bool {
        for restriction in &other.data {
            let mut rebound = restriction.clone();
            rebound.element = element;
            match self
                .data
                .binary_search_by_key(&rebound.sign, SignRestriction::sign)
            {
                Ok(position) => self.data[position].intersect(&rebound),
                Err(position) => self.data.insert(position, rebound),
            }
        }
        !self.data.iter().any(SignRestriction::is_unsatisfiable)
    }

    /// Compiles the word-class clause plus every sign clause into the flat
    /// predicate evaluated by transitions.
    pub fn build(
        &self,
        configuration: &Configuration,
        element: TElement,
    ) -> AttributesRestriction {
        let mut builder = AttributesRestrictionBuilder::new(configuration.attributes().size());
        builder.add_attribute(MAIN_ATTRIBUTE, false);
        builder.add_value((element % configuration.main_size()) as AttributeValue);
        for restriction in &self.data {
            debug_assert!(restriction.sign > MAIN_ATTRIBUTE);
            restriction.build(&mut builder);
        }
        builder.build()
    }

    pub fn print(&self, patterns: &Patterns) -> String {
        if self.data.is_empty() {
            return String::new();
        }
        let mut out = String::from("<");
        for (i, restriction) in self.data.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&restriction.print(patterns));
        }
        out.push('>');
        out
    }
}

// ============================================================================
// Regexp words
// ============================================================================

/// A word-level regular expression, kept with its source for printing.
/// The compiled form is anchored so matching is whole-word.
#[derive(Debug, Clone)]
pub struct WordRegexp {
    source: String,
    regex: Regex,
}

impl WordRegexp {
    pub fn compile(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{})$", source))?;
        Ok(Self {
            source: source.to_owned(),
            regex,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

// ============================================================================
// Pattern nodes
// ============================================================================

/// A node of the checked pattern tree.
#[derive(Debug)]
pub enum PatternBase {
    /// Concatenation; with `transposition` the parts may swap order.
    Sequence {
        elements: Vec<PatternBase>,
        transposition: bool,
    },
    /// Disjunction of alternatives.
    Alternatives(Vec<PatternBase>),
    /// An alternative body with its trailing conditions.
    Alternative {
        element: Box<PatternBase>,
        conditions: Conditions,
    },
    /// Counted repetition; `min_count = 0, max_count = 1` is `[ … ]`.
    Repeating {
        element: Box<PatternBase>,
        min_count: usize,
        max_count: usize,
    },
    /// A surface-form regular expression.
    Regexp(WordRegexp),
    /// A word-class element with its restrictions.
    Element {
        element: TElement,
        signs: SignRestrictions,
    },
    /// An inlined reference to another pattern.
    Reference {
        reference: TReference,
        signs: SignRestrictions,
    },
}

impl PatternBase {
    /// The smallest number of words any variant of this node can cover.
    pub fn min_size(&self) -> usize {
        match self {
            PatternBase::Sequence { elements, .. } => {
                elements.iter().map(PatternBase::min_size).sum()
            }
            PatternBase::Alternatives(alternatives) => alternatives
                .iter()
                .map(PatternBase::min_size)
                .min()
                .unwrap_or(0),
            PatternBase::Alternative { element, .. } => element.min_size(),
            PatternBase::Repeating { min_count, .. } => *min_count,
            PatternBase::Regexp(_) | PatternBase::Element { .. } | PatternBase::Reference { .. } => {
                1
            }
        }
    }

    /// Expands this node into every linear variant of at most `max_size`
    /// words.
    pub fn build(&self, context: &mut PatternBuildContext<'_>, max_size: usize) -> PatternVariants {
        match self {
            PatternBase::Sequence {
                elements,
                transposition,
            } => self.build_sequence(elements, *transposition, context, max_size),
            PatternBase::Alternatives(alternatives) => {
                let mut variants = PatternVariants::new();
                for alternative in alternatives {
                    variants
                        .variants
                        .extend(alternative.build(context, max_size).variants);
                }
                variants
            }
            PatternBase::Alternative {
                element,
                conditions,
            } => {
                let mut variants = element.build(context, max_size);
                for variant in &mut variants.variants {
                    conditions.apply(variant);
                }
                variants.sort_and_remove_duplicates(context.patterns());
                variants
            }
            PatternBase::Repeating {
                element,
                min_count,
                max_count,
            } => Self::build_repeating(element, *min_count, *max_count, context, max_size),
            PatternBase::Regexp(regexp) => {
                let mut variants = PatternVariants::new();
                if max_size > 0 {
                    let mut variant = PatternVariant::new();
                    variant.words.push(PatternWord::regexp(regexp.clone()));
                    variants.variants.push(variant);
                }
                variants
            }
            PatternBase::Element { element, signs } => {
                let mut variants = PatternVariants::new();
                if max_size > 0 {
                    let mut variant = PatternVariant::new();
                    variant.words.push(PatternWord::new(
                        PatternArgument::element(*element),
                        signs.clone(),
                    ));
                    variants.variants.push(variant);
                }
                variants
            }
            PatternBase::Reference { reference, signs } => {
                Self::build_reference(*reference, signs, context, max_size)
            }
        }
    }

    fn build_sequence(
        &self,
        elements: &[PatternBase],
        transposition: bool,
        context: &mut PatternBuildContext<'_>,
        max_size: usize,
    ) -> PatternVariants {
        let mut variants = PatternVariants::new();
        let Some(mut all_sub_variants) = collect_sub_variants(elements, context, max_size) else {
            return variants;
        };
        debug_assert_eq!(all_sub_variants.len(), elements.len());
        PatternBuildContext::add_variants(&all_sub_variants, &mut variants, max_size);

        if !transposition {
            return variants;
        }

        let swaps = context.swaps(all_sub_variants.len());
        for swap in swaps.iter() {
            swap.apply(&mut all_sub_variants);
            PatternBuildContext::add_variants(&all_sub_variants, &mut variants, max_size);
        }
        variants
    }

    fn build_repeating(
        element: &PatternBase,
        min_count: usize,
        max_count: usize,
        context: &mut PatternBuildContext<'_>,
        max_size: usize,
    ) -> PatternVariants {
        debug_assert!(min_count <= max_count);
        debug_assert!(max_count > 0);

        let mut variants = PatternVariants::new();
        if min_count == 0 {
            variants.variants.push(PatternVariant::new());
        }
        if max_size == 0 {
            return variants;
        }

        let start = min_count.max(1);
        let element_min = element.min_size().max(1);
        let start_min = element_min * start;
        if start_min > max_size {
            return variants;
        }

        let finish = max_count.min(max_size / element_min);
        let element_max = max_size - start_min + element_min;

        let sub_variants = element.build(context, element_max);
        if sub_variants.variants.is_empty() {
            return variants;
        }

        let all_sub_variants = vec![sub_variants.clone(); start];
        PatternBuildContext::add_variants(&all_sub_variants, &mut variants, max_size);

        for _count in start + 1..=finish {
            let variants_size = variants.variants.len();
            for vi in 0..variants_size {
                for sub_variant in &sub_variants.variants {
                    let variant = &variants.variants[vi];
                    if variant.len() + sub_variant.len() <= max_size {
                        let mut extended = variant.clone();
                        extended.append(sub_variant);
                        variants.variants.push(extended);
                    }
                }
            }
        }
        variants
    }

    fn build_reference(
        reference: TReference,
        signs: &SignRestrictions,
        context: &mut PatternBuildContext<'_>,
        max_size: usize,
    ) -> PatternVariants {
        // A reference covers at least one word; a zero budget cannot be
        // split any further and degenerate self-references must bottom out.
        if max_size == 0 {
            return PatternVariants::new();
        }
        let pattern = context.patterns().resolve_reference(reference);
        let mut variants = pattern.build(context, max_size);

        for variant in &mut variants.variants {
            for word in &mut variant.words {
                if word.id.kind == ArgumentKind::ReferenceElement {
                    word.id.reference = reference;
                } else {
                    debug_assert_eq!(word.id.kind, ArgumentKind::None);
                }
            }
        }

        if !signs.is_empty() {
            variants.variants.retain_mut(|variant| {
                for word in &mut variant.words {
                    if word.id.kind == ArgumentKind::ReferenceElement
                        && !word.signs.intersect_into(signs, word.id.element)
                    {
                        return false;
                    }
                }
                true
            });
        }
        variants
    }

    pub fn print(&self, patterns: &Patterns) -> String {
        match self {
            PatternBase::Sequence {
                elements,
                transposition,
            } => {
                let parts: Vec<String> = elements.iter().map(|e| e.print(patterns)).collect();
                parts.join(if *transposition { " ~ " } else { " " })
            }
            PatternBase::Alternatives(alternatives) => {
                let parts: Vec<String> = alternatives.iter().map(|a| a.print(patterns)).collect();
                format!("( {} )", parts.join(" | "))
            }
            PatternBase::Alternative {
                element,
                conditions,
            } => format!("{}{}", element.print(patterns), conditions.print(patterns)),
            PatternBase::Repeating {
                element,
                min_count,
                max_count,
            } => {
                if *max_count == usize::MAX {
                    format!("{{ {} }}<{}>", element.print(patterns), min_count)
                } else {
                    format!(
                        "{{ {} }}<{},{}>",
                        element.print(patterns),
                        min_count,
                        max_count
                    )
                }
            }
            PatternBase::Regexp(regexp) => format!("\"{}\"", regexp.source()),
            PatternBase::Element { element, signs } => {
                format!("{}{}", patterns.element_name(*element), signs.print(patterns))
            }
            PatternBase::Reference { reference, signs } => format!(
                "{}{}",
                patterns.reference_name(*reference),
                signs.print(patterns)
            ),
        }
    }
}

fn collect_sub_variants(
    elements: &[PatternBase],
    context: &mut PatternBuildContext<'_>,
    max_size: usize,
) -> Option<Vec<PatternVariants>> {
    if max_size == 0 {
        return None;
    }
    let min_size: usize = elements.iter().map(PatternBase::min_size).sum();
    if min_size > max_size {
        return None;
    }

    let mut all_sub_variants = Vec::with_capacity(elements.len());
    for element in elements {
        let element_max = max_size - min_size + element.min_size();
        let sub_variants = element.build(context, element_max);
        if sub_variants.variants.is_empty() {
            return None;
        }
        all_sub_variants.push(sub_variants);
    }
    Some(all_sub_variants)
}

// ============================================================================
// Patterns
// ============================================================================

/// One named pattern.
#[derive(Debug)]
pub struct Pattern {
    name: String,
    root: PatternBase,
    arguments: Vec<PatternArgument>,
}

impl Pattern {
    pub fn new(name: String, root: PatternBase, arguments: Vec<PatternArgument>) -> Self {
        debug_assert!(!name.is_empty());
        Self {
            name,
            root,
            arguments,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arguments(&self) -> &[PatternArgument] {
        &self.arguments
    }

    pub fn min_size(&self) -> usize {
        self.root.min_size()
    }

    /// Expands the pattern under its per-name recursion budget, then
    /// rewrites word identifiers so only argument-bound words stay visible
    /// to callers, re-encoded by argument position.
    pub fn build(&self, context: &mut PatternBuildContext<'_>, max_size: usize) -> PatternVariants {
        let correct_max_size = context.push_max_size(&self.name, max_size);
        let mut variants = self.root.build(context, correct_max_size);
        let top_max_size = context.pop_max_size(&self.name);
        debug_assert_eq!(top_max_size, correct_max_size);

        let main_size = context.patterns().configuration().main_size();
        for variant in &mut variants.variants {
            for word in &mut variant.words {
                if word.id.kind != ArgumentKind::Element {
                    word.id.kind = ArgumentKind::None;
                    continue;
                }
                for (i, argument) in self.arguments.iter().enumerate() {
                    if word.id.element == argument.element {
                        word.id.kind = ArgumentKind::ReferenceElement;
                        word.id.element = word.id.element % main_size + i * main_size;
                        break;
                    }
                }
                if word.id.kind == ArgumentKind::Element {
                    word.id.kind = ArgumentKind::None;
                }
            }
        }
        variants
    }

    pub fn print(&self, patterns: &Patterns) -> String {
        let mut out = self.name.clone();
        if !self.arguments.is_empty() {
            let parts: Vec<String> = self
                .arguments
                .iter()
                .map(|a| a.print(patterns))
                .collect();
            let _ = write!(out, "( {} )", parts.join(", "));
        }
        let _ = write!(out, " = {}", self.root.print(patterns));
        out
    }
}

/// The checked pattern set with its name tables and string store.
pub struct Patterns {
    configuration: Arc<Configuration>,
    patterns: Vec<Pattern>,
    names: FxHashMap<String, usize>,
    strings: StringStore,
}

impl Patterns {
    pub fn new(
        configuration: Arc<Configuration>,
        patterns: Vec<Pattern>,
        names: FxHashMap<String, usize>,
        strings: StringStore,
    ) -> Self {
        Self {
            configuration,
            patterns,
            names,
            strings,
        }
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn shared_configuration(&self) -> Arc<Configuration> {
        self.configuration.clone()
    }

    pub fn strings(&self) -> &StringStore {
        &self.strings
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn pattern(&self, index: usize) -> &Pattern {
        &self.patterns[index]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Pattern> {
        self.patterns.iter()
    }

    /// Decodes an element identifier into its printable name.
    pub fn element_name(&self, element: TElement) -> String {
        let main = self.configuration.attributes().main();
        let main_size = self.configuration.main_size();
        IndexedName {
            name: main.value_name((element % main_size) as AttributeValue).to_owned(),
            index: element / main_size,
        }
        .normalize()
    }

    /// Decodes a reference identifier into its printable name.
    pub fn reference_name(&self, reference: TReference) -> String {
        IndexedName {
            name: self.patterns[reference % self.patterns.len()].name.clone(),
            index: reference / self.patterns.len(),
        }
        .normalize()
    }

    /// The canonical name of an attribute.
    pub fn sign_name(&self, sign: Attribute) -> &str {
        self.configuration.attributes().get(sign).name()
    }

    /// Renders one attribute value, resolving string values through the
    /// shared store.
    pub fn sign_value(&self, sign: Attribute, value: AttributeValue) -> String {
        let attribute = self.configuration.attributes().get(sign);
        match attribute.kind {
            AttributeType::String => self.strings.value(value),
            AttributeType::Main | AttributeType::Enum => attribute.value_name(value).to_owned(),
        }
    }

    /// Interns a string-attribute value.
    pub fn string_index(&self, value: &str) -> AttributeValue {
        self.strings.index_of(value)
    }

    /// Resolves a pattern name (+ explicit index) to a reference id.
    pub fn pattern_reference(&self, name: &str, name_index: usize) -> Option<TReference> {
        self.names
            .get(name)
            .map(|&index| index + name_index * self.patterns.len())
    }

    pub fn resolve_reference(&self, reference: TReference) -> &Pattern {
        &self.patterns[reference % self.patterns.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexed_name_splits_trailing_digits() {
        let (name, explicit) = IndexedName::parse("N2");
        assert_eq!(name.name, "N");
        assert_eq!(name.index, 2);
        assert!(explicit);

        let (name, explicit) = IndexedName::parse("Verb");
        assert_eq!(name.name, "Verb");
        assert_eq!(name.index, 0);
        assert!(!explicit);
    }

    #[test]
    fn indexed_name_keeps_inner_digits() {
        let (name, explicit) = IndexedName::parse("X2y10");
        assert_eq!(name.name, "X2y");
        assert_eq!(name.index, 10);
        assert!(explicit);
    }

    #[test]
    fn indexed_name_handles_multibyte_names() {
        let (name, explicit) = IndexedName::parse("Сущ3");
        assert_eq!(name.name, "Сущ");
        assert_eq!(name.index, 3);
        assert!(explicit);
    }

    #[test]
    fn normalize_reattaches_nonzero_index() {
        assert_eq!(
            IndexedName {
                name: "N".to_owned(),
                index: 2
            }
            .normalize(),
            "N2"
        );
        assert_eq!(
            IndexedName {
                name: "N".to_owned(),
                index: 0
            }
            .normalize(),
            "N"
        );
    }

    #[test]
    fn argument_sign_stripping() {
        let arg = PatternArgument::element_sign(5, 3);
        let stripped = arg.without_sign();
        assert_eq!(stripped.kind, ArgumentKind::Element);
        assert_eq!(stripped.element, 5);
        assert!(!stripped.has_sign());
    }

    #[test]
    fn argument_consistency() {
        let signed = PatternArgument::element_sign(1, 2);
        let also_signed = PatternArgument::element_sign(7, 2);
        let other_sign = PatternArgument::element_sign(1, 3);
        let plain = PatternArgument::element(1);

        assert!(!signed.inconsistent(&also_signed));
        assert!(signed.inconsistent(&other_sign));
        assert!(signed.inconsistent(&plain));
        assert!(!plain.inconsistent(&PatternArgument::element(9)));
        assert!(!plain.inconsistent(&PatternArgument::none()));
    }

    #[test]
    fn argument_word_matching() {
        let word_id = PatternArgument::element(4);
        assert!(PatternArgument::element(4).matches_word(&word_id));
        assert!(PatternArgument::element_sign(4, 2).matches_word(&word_id));
        assert!(!PatternArgument::element(5).matches_word(&word_id));
        assert!(PatternArgument::any_sign(2).matches_word(&word_id));
        assert!(PatternArgument::any_sign(2).matches_word(&PatternArgument::none()));

        let ref_id = PatternArgument::reference_element(3, 4);
        assert!(PatternArgument::reference_element(3, 4).matches_word(&ref_id));
        assert!(!PatternArgument::reference_element(2, 4).matches_word(&ref_id));
        assert!(!PatternArgument::element(4).matches_word(&ref_id));
    }

    #[test]
    fn sign_restriction_intersections() {
        let include = |values: &[u32]| {
            SignRestriction::new(0, 1, values.iter().copied().collect(), false)
        };
        let exclude = |values: &[u32]| {
            SignRestriction::new(0, 1, values.iter().copied().collect(), true)
        };

        let mut r = include(&[1, 2, 3]);
        r.intersect(&include(&[2, 3, 4]));
        assert_eq!(r, include(&[2, 3]));

        let mut r = include(&[1, 2, 3]);
        r.intersect(&exclude(&[2]));
        assert_eq!(r, include(&[1, 3]));

        let mut r = exclude(&[2]);
        r.intersect(&include(&[1, 2, 3]));
        assert_eq!(r, include(&[1, 3]));

        let mut r = exclude(&[1]);
        r.intersect(&exclude(&[2]));
        assert_eq!(r, exclude(&[1, 2]));

        let mut r = include(&[1]);
        r.intersect(&include(&[2]));
        assert!(r.is_unsatisfiable());
    }

    #[test]
    fn sign_restrictions_reject_duplicate_signs() {
        let mut signs = SignRestrictions::new();
        assert!(signs.add(SignRestriction::new(0, 2, [1u32].into_iter().collect(), false)));
        assert!(!signs.add(SignRestriction::new(0, 2, [5u32].into_iter().collect(), true)));
        assert!(signs.add(SignRestriction::new(0, 1, [1u32].into_iter().collect(), false)));
    }

    #[test]
    fn word_regexp_matches_whole_words_only() {
        let regexp = WordRegexp::compile("a|aa").unwrap();
        assert!(regexp.regex().is_match("aa"));
        assert!(regexp.regex().is_match("a"));
        assert!(!regexp.regex().is_match("aaa"));
        assert_eq!(regexp.source(), "a|aa");
    }
}

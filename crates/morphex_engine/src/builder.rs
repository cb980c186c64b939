//! Semantic checking: parsed definitions → the pattern IR.
//!
//! The builder runs in three stages over a whole pattern file:
//!
//! 1. *registration* — every definition's name is recorded first, so bodies
//!    may reference patterns defined later (including themselves),
//! 2. *argument resolution* — formal argument lists are resolved in
//!    definition order; an argument that names another pattern's argument
//!    requires that pattern to be defined earlier,
//! 3. *body checking* — each definition's tree is translated, resolving
//!    word classes, restrictions and conditions against the configuration.
//!
//! All violations are reported through the shared [`ErrorProcessor`]; the
//! builder keeps going after an error so one run reports everything, and
//! the driver refuses to match when any error was recorded.

use std::path::Path;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use morphex_base::Span;
use morphex_language::ast::{
    Alternative, AlternativeCondition, ElementCondition, ExtendedName, PatternDef, PatternNode,
};
use morphex_language::errors::{ErrorProcessor, ParseError, Severity};
use morphex_language::reader::PatternsReader;
use morphex_language::parser::PatternParser;
use morphex_language::token::Token;
use morphex_text::{AttributeType, AttributeValue, Configuration, StringStore, MAIN_ATTRIBUTE};

use crate::conditions::{Condition, Conditions};
use crate::ir::{
    IndexedName, Pattern, PatternArgument, PatternBase, Patterns, SignRestriction,
    SignRestrictions, SignValues, TElement, TReference, WordRegexp,
};
use crate::transposition::MAX_TRANSPOSITION_SIZE;
use morphex_text::restriction::MAX_CLAUSE_VALUES;

/// Builds a checked [`Patterns`] set from parsed definitions.
pub struct PatternsBuilder<'a> {
    configuration: Arc<Configuration>,
    errors: &'a mut ErrorProcessor,
    defs: Vec<PatternDef>,
    names: FxHashMap<String, usize>,
    resolved_arguments: Vec<Vec<PatternArgument>>,
    checked: Vec<Pattern>,
    strings: StringStore,
    /// Elements seen in the definition currently being checked.
    elements: FxHashSet<String>,
    pattern_count: usize,
}

impl<'a> PatternsBuilder<'a> {
    pub fn new(configuration: Arc<Configuration>, errors: &'a mut ErrorProcessor) -> Self {
        Self {
            configuration,
            errors,
            defs: Vec::new(),
            names: FxHashMap::default(),
            resolved_arguments: Vec::new(),
            checked: Vec::new(),
            strings: StringStore::new(),
            elements: FxHashSet::default(),
            pattern_count: 0,
        }
    }

    /// Reads and parses a pattern file, collecting definitions.
    pub fn read_file(&mut self, path: &Path) {
        let mut reader = PatternsReader::open(path, self.errors);
        self.read_from(&mut reader);
    }

    /// Reads and parses in-memory pattern source.
    pub fn read_source(&mut self, source: &str) {
        let mut reader = PatternsReader::from_source(source, self.errors);
        self.read_from(&mut reader);
    }

    fn read_from(&mut self, reader: &mut PatternsReader) {
        while reader.has_more() {
            let tokens = reader.read_pattern(self.errors);
            if let Some(def) = PatternParser::new(&tokens, self.errors).parse() {
                self.add_definition(def);
            }
        }
    }

    fn add_definition(&mut self, def: PatternDef) {
        let text = def.name.text.clone();
        let (indexed, explicit) = IndexedName::parse(&text);
        if explicit && indexed.index == 0 {
            self.error_at(&def.name, "name index must be positive (1, 2, 3, etc.)");
        }
        if self.main_value(&indexed.name).is_some() {
            self.error_at(
                &def.name,
                format!("pattern name '{}' coincides with a word class", text),
            );
            return;
        }
        if self.names.contains_key(&text) {
            self.error_at(&def.name, format!("redefinition of pattern '{}'", text));
            return;
        }
        self.names.insert(text, self.defs.len());
        self.defs.push(def);
    }

    /// Checks every collected definition.
    pub fn check(&mut self) {
        let defs = std::mem::take(&mut self.defs);
        self.pattern_count = defs.len();

        for def in &defs {
            let mut arguments = Vec::with_capacity(def.arguments.len());
            for name in &def.arguments {
                arguments.push(
                    self.check_extended_name(name, false)
                        .unwrap_or_else(PatternArgument::none),
                );
            }
            self.resolved_arguments.push(arguments);
        }

        for (index, def) in defs.iter().enumerate() {
            let pattern = self.check_definition(index, def);
            self.checked.push(pattern);
        }
    }

    /// Hands the checked pattern set over. Only meaningful when the error
    /// processor recorded nothing.
    pub fn finish(self) -> Patterns {
        Patterns::new(self.configuration, self.checked, self.names, self.strings)
    }

    // ------------------------------------------------------------------
    // Definitions
    // ------------------------------------------------------------------

    fn check_definition(&mut self, index: usize, def: &PatternDef) -> Pattern {
        self.elements.clear();
        let root = self
            .check_alternatives(&def.alternatives)
            .unwrap_or_else(never_matching_root);
        Pattern::new(
            def.name.text.clone(),
            root,
            self.resolved_arguments[index].clone(),
        )
    }

    fn check_alternatives(&mut self, alternatives: &[Alternative]) -> Option<PatternBase> {
        let mut children = Vec::with_capacity(alternatives.len());
        let mut failed = false;
        for alternative in alternatives {
            let Some(node) = self.check_node(&alternative.node) else {
                failed = true;
                continue;
            };
            let conditions = self.check_conditions(&alternative.conditions);
            children.push(PatternBase::Alternative {
                element: Box::new(node),
                conditions,
            });
        }
        if failed {
            return None;
        }
        if children.len() == 1 {
            children.pop()
        } else {
            Some(PatternBase::Alternatives(children))
        }
    }

    fn check_node(&mut self, node: &PatternNode) -> Option<PatternBase> {
        match node {
            PatternNode::Regexp(token) => match WordRegexp::compile(&token.text) {
                Ok(regexp) => Some(PatternBase::Regexp(regexp)),
                Err(error) => {
                    self.error_at(token, format!("invalid regular expression: {}", error));
                    None
                }
            },
            PatternNode::Element { name, conditions } => self.check_element(name, conditions),
            PatternNode::Sequence(children) => {
                let elements = self.check_all(children)?;
                Some(PatternBase::Sequence {
                    elements,
                    transposition: false,
                })
            }
            PatternNode::Transposition(parts) => {
                if parts.len() > MAX_TRANSPOSITION_SIZE {
                    self.errors.add_error(ParseError::bare(
                        format!(
                            "transposition is too long (at most {} parts)",
                            MAX_TRANSPOSITION_SIZE
                        ),
                        Severity::Error,
                    ));
                    return None;
                }
                let elements = self.check_all(parts)?;
                Some(PatternBase::Sequence {
                    elements,
                    transposition: true,
                })
            }
            PatternNode::Alternatives(alternatives) => self.check_alternatives(alternatives),
            PatternNode::Repeating {
                node,
                min_count,
                max_count,
            } => {
                if *max_count == 0 || min_count > max_count {
                    // Reported by the parser; the node cannot be built.
                    return None;
                }
                let element = self.check_node(node)?;
                Some(PatternBase::Repeating {
                    element: Box::new(element),
                    min_count: *min_count,
                    max_count: *max_count,
                })
            }
        }
    }

    fn check_all(&mut self, nodes: &[PatternNode]) -> Option<Vec<PatternBase>> {
        let mut checked = Vec::with_capacity(nodes.len());
        let mut failed = false;
        for node in nodes {
            match self.check_node(node) {
                Some(built) => checked.push(built),
                None => failed = true,
            }
        }
        (!failed).then_some(checked)
    }

    fn check_element(
        &mut self,
        name: &Token,
        conditions: &[ElementCondition],
    ) -> Option<PatternBase> {
        let (indexed, explicit) = IndexedName::parse(&name.text);
        if explicit && indexed.index == 0 {
            self.error_at(name, "name index must be positive (1, 2, 3, etc.)");
            return None;
        }

        if let Some(value) = self.main_value(&indexed.name) {
            let element = value as TElement + indexed.index * self.main_size();
            self.elements.insert(indexed.normalize());
            let signs = self.check_element_conditions(conditions, element);
            return Some(PatternBase::Element { element, signs });
        }

        if let Some(reference) = self.lookup_reference(&name.text) {
            // Restriction element slots are rebound to each inlined word.
            let signs = self.check_element_conditions(conditions, 0);
            return Some(PatternBase::Reference { reference, signs });
        }

        self.error_at(
            name,
            format!("undefined word class or pattern '{}'", name.text),
        );
        None
    }

    fn check_element_conditions(
        &mut self,
        conditions: &[ElementCondition],
        element: TElement,
    ) -> SignRestrictions {
        let mut signs = SignRestrictions::new();
        for condition in conditions {
            let Some(sign) = self.configuration.attributes().find(&condition.name.text) else {
                self.error_at(
                    &condition.name,
                    format!("unknown word sign name '{}'", condition.name.text),
                );
                continue;
            };
            if sign == MAIN_ATTRIBUTE {
                self.error_at(
                    &condition.name,
                    "the main word sign is determined by the element itself",
                );
                continue;
            }

            let mut values = SignValues::new();
            for token in &condition.values {
                let Some(value) = self.sign_value(sign, token) else {
                    continue;
                };
                if !values.add(value) {
                    self.error_at(token, format!("repeated value '{}'", token.text));
                }
            }
            if values.is_empty() {
                continue;
            }
            if values.len() > MAX_CLAUSE_VALUES {
                self.error_at(
                    &condition.name,
                    format!(
                        "too many values in one restriction (at most {})",
                        MAX_CLAUSE_VALUES
                    ),
                );
                continue;
            }

            if !signs.add(SignRestriction::new(element, sign, values, condition.exclude)) {
                self.error_at(
                    &condition.name,
                    format!(
                        "duplicate restriction for word sign '{}'",
                        condition.name.text
                    ),
                );
            }
        }
        signs
    }

    /// Resolves one value token of a `<sign=…>` restriction.
    fn sign_value(&mut self, sign: u8, token: &Token) -> Option<AttributeValue> {
        let attribute = self.configuration.attributes().get(sign);
        match attribute.kind {
            AttributeType::String => Some(self.strings.index_of(&token.text)),
            AttributeType::Main | AttributeType::Enum => match attribute.find_value(&token.text) {
                Some(value) if value != 0 => Some(value),
                _ => {
                    self.error_at(
                        token,
                        format!(
                            "unknown value '{}' of word sign '{}'",
                            token.text,
                            attribute.name()
                        ),
                    );
                    None
                }
            },
        }
    }

    // ------------------------------------------------------------------
    // Conditions
    // ------------------------------------------------------------------

    fn check_conditions(&mut self, conditions: &[AlternativeCondition]) -> Conditions {
        let mut checked = Vec::with_capacity(conditions.len());
        for condition in conditions {
            let built = match condition {
                AlternativeCondition::Agreement { names, strong } => {
                    self.check_agreement_condition(names, *strong)
                }
                AlternativeCondition::Dictionary { name, groups } => {
                    self.check_dictionary_condition(name, groups)
                }
            };
            if let Some(built) = built {
                checked.push(built);
            }
        }
        Conditions::new(checked)
    }

    fn check_agreement_condition(
        &mut self,
        names: &[ExtendedName],
        strong: bool,
    ) -> Option<Condition> {
        // `<<num==>>`: one attribute name alone means the whole alternative
        // agrees on that attribute.
        if names.len() == 1 && names[0].sub.is_none() {
            if let Some(sign) = self.configuration.attributes().find(&names[0].name.text) {
                return Some(Condition::agreement(true, vec![PatternArgument::any_sign(sign)]));
            }
        }

        let mut arguments = Vec::with_capacity(names.len());
        for name in names {
            arguments.push(self.check_extended_name(name, true)?);
        }
        for pair in arguments.windows(2) {
            if pair[0].inconsistent(&pair[1]) {
                self.complex_error(names, "inconsistent arguments of the agreement condition");
                return None;
            }
        }
        Some(Condition::agreement(strong, arguments))
    }

    fn check_dictionary_condition(
        &mut self,
        name: &Token,
        groups: &[Vec<ExtendedName>],
    ) -> Option<Condition> {
        let mut arguments = Vec::new();
        for (index, group) in groups.iter().enumerate() {
            if index > 0 {
                arguments.push(PatternArgument::none());
            }
            for extended in group {
                let Some(argument) = self.check_extended_name(extended, true) else {
                    continue;
                };
                if argument.has_sign() {
                    self.error_at(
                        &extended.name,
                        "dictionary arguments must not carry word sign names",
                    );
                    continue;
                }
                arguments.push(argument);
            }
        }
        if arguments.iter().all(|argument| !argument.defined()) {
            return None;
        }
        Some(Condition::dictionary(name.text.clone(), arguments))
    }

    // ------------------------------------------------------------------
    // Extended names
    // ------------------------------------------------------------------

    /// Resolves `Name` / `Name.Sub` to an argument path.
    ///
    /// With `require_element` the element must occur in the definition being
    /// checked; formal argument lists are resolved without that requirement
    /// because they are read before the body.
    fn check_extended_name(
        &mut self,
        extended: &ExtendedName,
        require_element: bool,
    ) -> Option<PatternArgument> {
        let (indexed, explicit) = IndexedName::parse(&extended.name.text);
        if explicit && indexed.index == 0 {
            self.error_at(&extended.name, "name index must be positive (1, 2, 3, etc.)");
            return None;
        }

        if let Some(value) = self.main_value(&indexed.name) {
            let element = value as TElement + indexed.index * self.main_size();
            if require_element && !self.elements.contains(&indexed.normalize()) {
                self.error_at(
                    &extended.name,
                    format!("undefined element '{}'", extended.name.text),
                );
            }
            return match &extended.sub {
                None => Some(PatternArgument::element(element)),
                Some(sub) => match self.configuration.attributes().find(&sub.text) {
                    Some(sign) => Some(PatternArgument::element_sign(element, sign)),
                    None => {
                        self.error_at(sub, format!("unknown word sign name '{}'", sub.text));
                        None
                    }
                },
            };
        }

        if let Some((pattern_index, reference)) = self.lookup_pattern(&extended.name.text) {
            if pattern_index >= self.resolved_arguments.len() {
                self.error_at(
                    &extended.name,
                    format!(
                        "pattern '{}' must be defined before it is used in an argument list",
                        extended.name.text
                    ),
                );
                return None;
            }
            let callee: &[PatternArgument] = &self.resolved_arguments[pattern_index];

            let Some(sub) = &extended.sub else {
                self.error_at(
                    &extended.name,
                    "word class of the referenced pattern expected (Pattern.Class)",
                );
                return None;
            };

            if let Some(sign) = self.configuration.attributes().find(&sub.text) {
                let Some(first) = callee.first().copied() else {
                    self.error_at(
                        &extended.name,
                        format!("pattern '{}' has no arguments", extended.name.text),
                    );
                    return None;
                };
                if first.has_sign() && first.sign != sign {
                    self.error_at(sub, "argument sign mismatch between caller and callee");
                    return None;
                }
                return Some(PatternArgument::reference_element_sign(
                    reference,
                    first.element % self.main_size(),
                    sign,
                ));
            }

            if let Some(value) = self.main_value(&sub.text) {
                let main_size = self.main_size();
                for (position, argument) in callee.iter().enumerate() {
                    if argument.defined() && argument.element % main_size == value as TElement {
                        let element = value as TElement + position * main_size;
                        return Some(if argument.has_sign() {
                            PatternArgument::reference_element_sign(
                                reference,
                                element,
                                argument.sign,
                            )
                        } else {
                            PatternArgument::reference_element(reference, element)
                        });
                    }
                }
                self.error_at(
                    sub,
                    format!(
                        "'{}' is not an argument of pattern '{}'",
                        sub.text, extended.name.text
                    ),
                );
                return None;
            }

            self.error_at(sub, format!("unknown word class or sign name '{}'", sub.text));
            return None;
        }

        self.error_at(
            &extended.name,
            format!("undefined word class or pattern '{}'", extended.name.text),
        );
        None
    }

    // ------------------------------------------------------------------
    // Lookups and reporting
    // ------------------------------------------------------------------

    /// The main-attribute value index of a word-class name, if it is one.
    fn main_value(&self, name: &str) -> Option<AttributeValue> {
        self.configuration
            .attributes()
            .main()
            .find_value(name)
            .filter(|&value| value != 0)
    }

    fn main_size(&self) -> usize {
        self.configuration.main_size()
    }

    /// Resolves a possibly-indexed pattern name to `(pattern index,
    /// reference id)`. The literal name wins over base-plus-index.
    fn lookup_pattern(&self, text: &str) -> Option<(usize, TReference)> {
        if let Some(&index) = self.names.get(text) {
            return Some((index, index));
        }
        let (indexed, explicit) = IndexedName::parse(text);
        if explicit {
            if let Some(&index) = self.names.get(&indexed.name) {
                return Some((index, index + indexed.index * self.pattern_count));
            }
        }
        None
    }

    fn lookup_reference(&self, text: &str) -> Option<TReference> {
        self.lookup_pattern(text).map(|(_, reference)| reference)
    }

    fn error_at(&mut self, token: &Token, message: impl Into<String>) {
        self.errors.add_error(ParseError::in_line(
            token.line.clone(),
            vec![token.span],
            message,
            Severity::Error,
        ));
    }

    /// Reports one message over several names, highlighting each of them.
    fn complex_error(&mut self, names: &[ExtendedName], message: &str) {
        let Some(first) = names.first() else {
            return;
        };
        let line = first.name.line.clone();
        let segments: Vec<Span> = names
            .iter()
            .filter(|n| n.name.line.number() == line.number())
            .map(|n| n.name.span)
            .collect();
        self.errors.add_error(ParseError::in_line(
            line,
            segments,
            message,
            Severity::Error,
        ));
    }
}

/// Placeholder root for definitions that failed checking; it can never
/// match, and the recorded errors keep the driver from matching anyway.
fn never_matching_root() -> PatternBase {
    PatternBase::Regexp(WordRegexp::compile("[^\\s\\S]").expect("fallback regex is well-formed"))
}

/// Parses, checks and builds a pattern file against `configuration`.
pub fn build_patterns_from_file(
    configuration: Arc<Configuration>,
    path: &Path,
    errors: &mut ErrorProcessor,
) -> Patterns {
    let mut builder = PatternsBuilder::new(configuration, errors);
    builder.read_file(path);
    builder.check();
    builder.finish()
}

/// Parses, checks and builds in-memory pattern source against
/// `configuration`.
pub fn build_patterns_from_source(
    configuration: Arc<Configuration>,
    source: &str,
    errors: &mut ErrorProcessor,
) -> Patterns {
    let mut builder = PatternsBuilder::new(configuration, errors);
    builder.read_source(source);
    builder.check();
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configuration() -> Arc<Configuration> {
        Arc::new(
            Configuration::from_json(
                r#"{ "word_signs": [
                    { "names": ["pos"], "type": "main", "values": ["A", "N", "V", "Pa", "Pn"] },
                    { "names": ["lemma", "h"], "type": "string" },
                    { "names": ["num"], "type": "enum", "values": ["sg", "pl"], "consistent": true },
                    { "names": ["c", "case"], "type": "enum", "values": ["nom", "gen"], "consistent": true }
                ] }"#,
            )
            .unwrap(),
        )
    }

    fn build(source: &str) -> (Patterns, ErrorProcessor) {
        let mut errors = ErrorProcessor::new();
        let patterns = build_patterns_from_source(configuration(), source, &mut errors);
        (patterns, errors)
    }

    fn build_ok(source: &str) -> Patterns {
        let (patterns, errors) = build(source);
        if errors.has_any_errors() {
            let mut out = Vec::new();
            errors.print_errors(&mut out, "test").unwrap();
            panic!("unexpected errors:\n{}", String::from_utf8_lossy(&out));
        }
        patterns
    }

    #[test]
    fn builds_a_simple_pattern() {
        let patterns = build_ok("P = N V\n");
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns.pattern(0).name(), "P");
        assert_eq!(patterns.pattern(0).min_size(), 2);
    }

    #[test]
    fn forward_references_resolve() {
        let patterns = build_ok("P = Q V\nQ( N ) = A N\n");
        assert_eq!(patterns.len(), 2);
    }

    #[test]
    fn self_reference_resolves() {
        let patterns = build_ok("P = N | N P\n");
        assert_eq!(patterns.len(), 1);
    }

    #[test]
    fn indexed_elements_are_distinct() {
        let patterns = build_ok("P = N1 N2\n");
        let printed = patterns.pattern(0).print(&patterns);
        assert!(printed.contains("N1 N2"), "got {printed}");
    }

    #[test]
    fn restrictions_resolve_values() {
        let patterns = build_ok("P = N<c=nom|gen,num=sg> V\n");
        let printed = patterns.pattern(0).print(&patterns);
        assert!(printed.contains("c=nom|gen"), "got {printed}");
        assert!(printed.contains("num=sg"), "got {printed}");
    }

    #[test]
    fn string_restrictions_intern_their_values() {
        let patterns = build_ok("P = N<lemma=cat|dog>\n");
        let printed = patterns.pattern(0).print(&patterns);
        assert!(printed.contains("lemma="), "got {printed}");
        // Interned values render back through the shared store.
        assert!(printed.contains("cat"), "got {printed}");
    }

    #[test]
    fn undefined_class_is_reported() {
        let (_, errors) = build("P = N X\n");
        assert!(errors.has_any_errors());
    }

    #[test]
    fn unknown_sign_is_reported() {
        let (_, errors) = build("P = N<tense=sg>\n");
        assert!(errors.has_any_errors());
    }

    #[test]
    fn unknown_value_is_reported() {
        let (_, errors) = build("P = N<num=dual>\n");
        assert!(errors.has_any_errors());
    }

    #[test]
    fn main_sign_restriction_is_reported() {
        let (_, errors) = build("P = N<pos=V>\n");
        assert!(errors.has_any_errors());
    }

    #[test]
    fn duplicate_sign_restriction_is_reported() {
        let (_, errors) = build("P = N<num=sg,num=pl>\n");
        assert!(errors.has_any_errors());
    }

    #[test]
    fn redefinition_is_reported() {
        let (_, errors) = build("P = N\nP = V\n");
        assert!(errors.has_any_errors());
    }

    #[test]
    fn pattern_named_after_class_is_reported() {
        let (_, errors) = build("N = A\n");
        assert!(errors.has_any_errors());
    }

    #[test]
    fn agreement_condition_arguments_resolve() {
        let patterns = build_ok("P = A N <<A.c=N.c>>\n");
        let printed = patterns.pattern(0).print(&patterns);
        assert!(printed.contains("A.c=N.c"), "got {printed}");
    }

    #[test]
    fn global_agreement_form_resolves() {
        let patterns = build_ok("P = A ~ N <<num==>>\n");
        let printed = patterns.pattern(0).print(&patterns);
        assert!(printed.contains("num"), "got {printed}");
    }

    #[test]
    fn inconsistent_agreement_arguments_are_reported() {
        let (_, errors) = build("P = A N <<A.c=N.num>>\n");
        assert!(errors.has_any_errors());
    }

    #[test]
    fn mixed_signed_and_plain_arguments_are_reported() {
        let (_, errors) = build("P = A N <<A.c=N>>\n");
        assert!(errors.has_any_errors());
    }

    #[test]
    fn condition_on_absent_element_is_reported() {
        let (_, errors) = build("P = A N <<A.c=V.c>>\n");
        assert!(errors.has_any_errors());
    }

    #[test]
    fn dictionary_condition_arguments_resolve() {
        let patterns = build_ok("P = A1 N1 N2 <<TermDict(A1 N1, N2)>>\n");
        let printed = patterns.pattern(0).print(&patterns);
        assert!(printed.contains("TermDict"), "got {printed}");
    }

    #[test]
    fn signed_dictionary_argument_is_reported() {
        let (_, errors) = build("P = A1 N1 <<TermDict(A1.c N1)>>\n");
        assert!(errors.has_any_errors());
    }

    #[test]
    fn reference_argument_sign_resolves() {
        // `Sub.c` names the case of the referenced pattern's head argument.
        let patterns = build_ok("Sub( Pa ) = Pa\nP = N Sub <<N.c=Sub.c>>\n");
        let printed = patterns.pattern(1).print(&patterns);
        assert!(printed.contains("Sub.Pa.c"), "got {printed}");
    }

    #[test]
    fn reference_argument_by_class_resolves() {
        let patterns = build_ok("Sub( Pa, Pn ) = Pa Pn\nP = N Sub <<N=Sub.Pn>>\n");
        let printed = patterns.pattern(1).print(&patterns);
        assert!(printed.contains("Sub.Pn"), "got {printed}");
    }

    #[test]
    fn missing_reference_argument_is_reported() {
        let (_, errors) = build("Sub( Pa ) = Pa\nP = N Sub <<N=Sub.Pn>>\n");
        assert!(errors.has_any_errors());
    }

    #[test]
    fn bad_regexp_is_reported() {
        let (_, errors) = build("P = \"[unclosed\" N\n");
        assert!(errors.has_any_errors());
    }

    #[test]
    fn zero_name_index_is_reported() {
        let (_, errors) = build("P = N0\n");
        assert!(errors.has_any_errors());
    }
}

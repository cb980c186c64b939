//! End-to-end checks of the compile-and-match pipeline: configuration and
//! text documents go in, spans come out.

use std::sync::Arc;

use morphex_engine::builder::build_patterns_from_source;
use morphex_engine::ir::{PatternBase, Patterns, SignRestrictions};
use morphex_engine::matcher::MatchContext;
use morphex_engine::states::States;
use morphex_engine::variants::{PatternBuildContext, PatternVariants};
use morphex_language::errors::ErrorProcessor;
use morphex_text::loader::words_from_json;
use morphex_text::{Configuration, Text};

const CONFIG: &str = r#"{ "word_signs": [
    { "names": ["pos"], "type": "main", "values": ["A", "N", "V"] },
    { "names": ["num"], "type": "enum", "values": ["sg", "pl"], "consistent": true }
] }"#;

fn configuration() -> Arc<Configuration> {
    Arc::new(Configuration::from_json(CONFIG).unwrap())
}

fn patterns(source: &str) -> Patterns {
    let mut errors = ErrorProcessor::new();
    let patterns = build_patterns_from_source(configuration(), source, &mut errors);
    if errors.has_any_errors() {
        let mut out = Vec::new();
        errors.print_errors(&mut out, "patterns").unwrap();
        panic!("pattern errors:\n{}", String::from_utf8_lossy(&out));
    }
    patterns
}

fn expand(patterns: &Patterns, index: usize, max_size: usize) -> PatternVariants {
    let mut context = PatternBuildContext::new(patterns);
    let mut variants = patterns.pattern(index).build(&mut context, max_size);
    variants.sort_and_remove_duplicates(patterns);
    variants
}

fn text_of(patterns: &Patterns, json: &str) -> Text {
    let words = words_from_json(patterns.configuration(), patterns.strings(), json).unwrap();
    Text::new(patterns.shared_configuration(), words)
}

/// Matches pattern `index` at every start position; returns inclusive spans.
fn match_all(patterns: &Patterns, index: usize, text: &Text, max_size: usize) -> Vec<(usize, usize)> {
    let variants = expand(patterns, index, max_size);
    let states = States::compile(&variants, patterns);
    let mut context = MatchContext::new(text, &states);
    for start in 0..text.len() {
        context.match_from(start);
    }
    context
        .found()
        .iter()
        .map(|span| (span.begin, span.end))
        .collect()
}

#[test]
fn noun_verb_sequence_matches_once() {
    let patterns = patterns("P = N V\n");
    let text = text_of(
        &patterns,
        r#"{ "text": [
            { "word": "cats", "annotations": [ { "pos": "N", "num": "pl" } ] },
            { "word": "run", "annotations": [ { "pos": "V", "num": "pl" } ] }
        ] }"#,
    );
    assert_eq!(match_all(&patterns, 0, &text, 12), vec![(0, 1)]);
}

#[test]
fn restriction_blocks_the_match() {
    let patterns = patterns("P = N<num=sg> V\n");
    let text = text_of(
        &patterns,
        r#"{ "text": [
            { "word": "cats", "annotations": [ { "pos": "N", "num": "pl" } ] },
            { "word": "run", "annotations": [ { "pos": "V", "num": "pl" } ] }
        ] }"#,
    );
    assert!(match_all(&patterns, 0, &text, 12).is_empty());
}

#[test]
fn bounded_repetition_expands_to_three_variants() {
    let patterns = patterns("P = {A}<1,3> N\n");
    let variants = expand(&patterns, 0, 5);
    let mut lengths: Vec<usize> = variants.variants.iter().map(|v| v.len()).collect();
    lengths.sort_unstable();
    assert_eq!(lengths, vec![2, 3, 4]);
}

#[test]
fn transposition_probes_both_orderings() {
    let patterns = patterns("P = A ~ N <<num==>>\n");

    let variants = expand(&patterns, 0, 12);
    assert_eq!(variants.len(), 2);

    let text = text_of(
        &patterns,
        r#"{ "text": [
            { "word": "red", "annotations": [ { "pos": "A", "num": "sg" } ] },
            { "word": "car", "annotations": [ { "pos": "N", "num": "sg" } ] }
        ] }"#,
    );
    assert_eq!(match_all(&patterns, 0, &text, 12), vec![(0, 1)]);

    // The swapped ordering matches the swapped text just as well.
    let swapped = text_of(
        &patterns,
        r#"{ "text": [
            { "word": "car", "annotations": [ { "pos": "N", "num": "sg" } ] },
            { "word": "red", "annotations": [ { "pos": "A", "num": "sg" } ] }
        ] }"#,
    );
    assert_eq!(match_all(&patterns, 0, &swapped, 12), vec![(0, 1)]);
}

#[test]
fn transposition_agreement_still_binds() {
    let patterns = patterns("P = A ~ N <<num==>>\n");
    let text = text_of(
        &patterns,
        r#"{ "text": [
            { "word": "red", "annotations": [ { "pos": "A", "num": "sg" } ] },
            { "word": "cars", "annotations": [ { "pos": "N", "num": "pl" } ] }
        ] }"#,
    );
    assert!(match_all(&patterns, 0, &text, 12).is_empty());
}

#[test]
fn self_reference_expands_to_all_admissible_lengths() {
    let patterns = patterns("P = N | N P\n");
    let variants = expand(&patterns, 0, 4);
    let mut lengths: Vec<usize> = variants.variants.iter().map(|v| v.len()).collect();
    lengths.sort_unstable();
    assert_eq!(lengths, vec![1, 2, 3, 4]);
}

#[test]
fn self_reference_matches_every_noun_run() {
    let patterns = patterns("P = N | N P\n");
    let text = text_of(
        &patterns,
        r#"{ "text": [
            { "word": "cats", "annotations": [ { "pos": "N", "num": "pl" } ] },
            { "word": "dogs", "annotations": [ { "pos": "N", "num": "pl" } ] },
            { "word": "run", "annotations": [ { "pos": "V", "num": "pl" } ] }
        ] }"#,
    );
    let mut spans = match_all(&patterns, 0, &text, 4);
    spans.sort_unstable();
    assert_eq!(spans, vec![(0, 0), (0, 1), (1, 1)]);
}

#[test]
fn failed_agreement_leaves_the_matcher_reusable() {
    let patterns = patterns("P = A N <<A.num==N.num>>\n");
    let text = text_of(
        &patterns,
        r#"{ "text": [
            { "word": "red", "annotations": [ { "pos": "A", "num": "sg" } ] },
            { "word": "cars", "annotations": [ { "pos": "N", "num": "pl" } ] }
        ] }"#,
    );

    let variants = expand(&patterns, 0, 12);
    let states = States::compile(&variants, &patterns);

    let mut context = MatchContext::new(&text, &states);
    context.match_from(0);
    assert!(context.found().is_empty());

    // The same context probes again with identical results; a fresh one
    // agrees.
    context.match_from(0);
    let mut fresh = MatchContext::new(&text, &states);
    fresh.match_from(0);
    assert_eq!(context.found(), fresh.found());
}

#[test]
fn variants_never_exceed_the_bound() {
    let patterns = patterns("P = N | N P | {A}<1,5> N\n");
    for k in 0..8 {
        let variants = expand(&patterns, 0, k);
        assert!(
            variants.variants.iter().all(|v| v.len() <= k),
            "bound {} violated",
            k
        );
    }
}

#[test]
fn mutual_references_terminate() {
    let patterns = patterns("P = N | A Q\nQ = V | N P\n");
    for k in 0..10 {
        let _ = expand(&patterns, 0, k);
        let _ = expand(&patterns, 1, k);
    }
}

#[test]
fn printed_forms_are_unique_after_dedup() {
    let patterns = patterns("P = N | N | ( N ) | {A}<1,2> N\n");
    let variants = expand(&patterns, 0, 4);
    let mut printed: Vec<String> = variants
        .variants
        .iter()
        .map(|v| v.print(&patterns))
        .collect();
    let total = printed.len();
    printed.sort();
    printed.dedup();
    assert_eq!(printed.len(), total);
}

// ---------------------------------------------------------------------------
// Structural laws
// ---------------------------------------------------------------------------

fn lengths(variants: &PatternVariants) -> Vec<usize> {
    let mut lengths: Vec<usize> = variants.variants.iter().map(|v| v.len()).collect();
    lengths.sort_unstable();
    lengths
}

#[test]
fn optional_repetition_equals_empty_or_one() {
    let patterns = patterns("P = [A]\n");
    let variants = expand(&patterns, 0, 3);
    assert_eq!(lengths(&variants), vec![0, 1]);
}

#[test]
fn transposing_a_single_part_changes_nothing() {
    let patterns = patterns("P = A N\n");
    let element = |element| PatternBase::Element {
        element,
        signs: SignRestrictions::new(),
    };

    let plain = PatternBase::Sequence {
        elements: vec![element(1), element(2)],
        transposition: false,
    };
    let single_transposed = PatternBase::Sequence {
        elements: vec![PatternBase::Sequence {
            elements: vec![element(1), element(2)],
            transposition: false,
        }],
        transposition: true,
    };

    let mut context = PatternBuildContext::new(&patterns);
    let mut a = plain.build(&mut context, 5);
    let mut b = single_transposed.build(&mut context, 5);
    a.sort_and_remove_duplicates(&patterns);
    b.sort_and_remove_duplicates(&patterns);
    assert_eq!(a.print(&patterns), b.print(&patterns));
}

#[test]
fn nested_sequences_flatten() {
    let patterns = patterns("P = A N V\n");
    let element = |element| PatternBase::Element {
        element,
        signs: SignRestrictions::new(),
    };

    let nested = PatternBase::Sequence {
        elements: vec![
            PatternBase::Sequence {
                elements: vec![element(1), element(2)],
                transposition: false,
            },
            element(3),
        ],
        transposition: false,
    };
    let flat = PatternBase::Sequence {
        elements: vec![element(1), element(2), element(3)],
        transposition: false,
    };

    let mut context = PatternBuildContext::new(&patterns);
    let a = nested.build(&mut context, 6);
    let b = flat.build(&mut context, 6);
    assert_eq!(a.print(&patterns), b.print(&patterns));
}

#[test]
fn transposition_length_three_visits_all_orders() {
    let patterns = patterns("P = A ~ N ~ V\n");
    let variants = expand(&patterns, 0, 12);
    assert_eq!(variants.len(), 6);
}

#[test]
fn conditions_bind_across_a_reference() {
    // `Sub.N` addresses the argument-bound word of the inlined pattern.
    let patterns = patterns("Sub( N ) = A N\nP = Sub N2 <<Sub.N=N2>>\n");

    let agreeing = text_of(
        &patterns,
        r#"{ "text": [
            { "word": "big", "annotations": [ { "pos": "A", "num": "pl" } ] },
            { "word": "cats", "annotations": [ { "pos": "N", "num": "pl" } ] },
            { "word": "dogs", "annotations": [ { "pos": "N", "num": "pl" } ] }
        ] }"#,
    );
    assert_eq!(match_all(&patterns, 1, &agreeing, 12), vec![(0, 2)]);

    let disagreeing = text_of(
        &patterns,
        r#"{ "text": [
            { "word": "big", "annotations": [ { "pos": "A", "num": "pl" } ] },
            { "word": "cats", "annotations": [ { "pos": "N", "num": "pl" } ] },
            { "word": "dog", "annotations": [ { "pos": "N", "num": "sg" } ] }
        ] }"#,
    );
    assert!(match_all(&patterns, 1, &disagreeing, 12).is_empty());
}

#[test]
fn reference_restrictions_narrow_inlined_words() {
    // The restriction written on the reference lands on the argument-bound
    // inlined word.
    let patterns = patterns("Sub( N ) = A N\nP = Sub<num=sg> V\n");

    let text = text_of(
        &patterns,
        r#"{ "text": [
            { "word": "big", "annotations": [ { "pos": "A", "num": "sg" } ] },
            { "word": "cats", "annotations": [ { "pos": "N", "num": "pl" } ] },
            { "word": "run", "annotations": [ { "pos": "V", "num": "pl" } ] }
        ] }"#,
    );
    assert!(match_all(&patterns, 1, &text, 12).is_empty());

    let singular = text_of(
        &patterns,
        r#"{ "text": [
            { "word": "big", "annotations": [ { "pos": "A", "num": "sg" } ] },
            { "word": "cat", "annotations": [ { "pos": "N", "num": "sg" } ] },
            { "word": "runs", "annotations": [ { "pos": "V", "num": "sg" } ] }
        ] }"#,
    );
    assert_eq!(match_all(&patterns, 1, &singular, 12), vec![(0, 2)]);
}

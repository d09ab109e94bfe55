use super::*;
use crate::alignment::align_words;
use crate::types::CrossValidation;

fn timed(items: &[(&str, f64, f64)]) -> Vec<HypothesisWord> {
    items
        .iter()
        .map(|(w, s, e)| HypothesisWord::new(*w, *s, *e))
        .collect()
}

fn evenly(texts: &[&str]) -> Vec<HypothesisWord> {
    texts
        .iter()
        .enumerate()
        .map(|(i, w)| HypothesisWord::new(*w, i as f64 * 0.5, i as f64 * 0.5 + 0.4))
        .collect()
}

fn annotate(reference: &str, words: &[HypothesisWord]) -> StruggleAnnotated {
    StruggleAnnotated::annotate(
        align_words(reference, words),
        words,
        &DiagnosticThresholds::default(),
    )
}

fn kinds(annotated: &StruggleAnnotated) -> Vec<&'static str> {
    annotated.entries().iter().map(|e| e.kind()).collect()
}

fn paths_of(entry: &AlignmentEntry) -> Vec<StrugglePath> {
    match entry {
        AlignmentEntry::Struggle { paths, .. } => paths.clone(),
        _ => Vec::new(),
    }
}

#[test]
fn near_miss_helper() {
    let th = DiagnosticThresholds::default();
    assert!(is_near_miss("sta", "station", &th));
    assert!(is_near_miss("staion", "station", &th));
    assert!(is_near_miss("varall", "overall", &th));
    assert!(!is_near_miss("var", "overall", &th));
    assert!(!is_near_miss("st", "station", &th));
    assert!(!is_near_miss("dog", "cat", &th));
}

#[test]
fn inflection_helper() {
    assert_eq!(inflectional_suffix("jumped", "jump"), Some("ed"));
    assert_eq!(inflectional_suffix("dog", "dogs"), Some("s"));
    assert_eq!(inflectional_suffix("quick", "quickly"), Some("ly"));
    assert_eq!(inflectional_suffix("is", "ises"), None);
    assert_eq!(inflectional_suffix("jump", "jumble"), None);
    assert_eq!(inflectional_suffix("jump", "jump"), None);
}

#[test]
fn near_miss_insertion_upgrades_substitution_to_decoding_struggle() {
    let words = evenly(&["the", "sta", "staion", "was", "busy"]);
    let annotated = annotate("the station was busy", &words);
    assert_eq!(
        kinds(&annotated),
        vec!["correct", "struggle", "insertion", "correct", "correct"]
    );
    assert_eq!(paths_of(&annotated.entries()[1]), vec![StrugglePath::Decoding]);
    assert!(annotated.notes()[2].part_of_struggle);
    assert_eq!(annotated.notes()[1].near_miss_evidence, vec!["staion"]);

    let attempt = annotated.notes()[1].full_attempt.as_ref().expect("full attempt");
    assert_eq!(attempt.parts, vec!["sta", "staion"]);
    assert_eq!(attempt.joined, "stastaion");
}

#[test]
fn false_start_before_correct_word_is_a_self_correction() {
    let words = evenly(&["the", "cat", "fact", "faced", "the", "wall"]);
    let annotated = annotate("the cat faced the wall", &words);
    assert_eq!(
        kinds(&annotated),
        vec!["correct", "correct", "insertion", "correct", "correct", "correct"]
    );
    assert!(annotated.notes()[2].self_correction);
    assert!(!annotated.notes()[2].part_of_struggle);
    assert_eq!(annotated.notes()[3].near_miss_evidence, vec!["fact"]);
}

#[test]
fn long_pause_before_substitution_is_a_hesitation_struggle() {
    let words = timed(&[("the", 0.0, 0.3), ("elephant", 3.5, 4.0), ("dog", 4.2, 4.5)]);
    let annotated = annotate("the enormous dog", &words);
    assert_eq!(kinds(&annotated), vec!["correct", "struggle", "correct"]);
    assert_eq!(paths_of(&annotated.entries()[1]), vec![StrugglePath::Hesitation]);
    assert_eq!(annotated.notes()[1].pause_before, Some(3.2));
}

#[test]
fn short_reference_word_needs_more_than_a_pause() {
    let words = timed(&[("the", 0.0, 0.3), ("bat", 3.5, 4.0)]);
    let annotated = annotate("the cat", &words);
    assert_eq!(kinds(&annotated), vec!["correct", "substitution"]);
}

#[test]
fn unconfirmed_partial_attempt_is_abandoned() {
    let mut words = evenly(&["the", "cont", "was", "new"]);
    words[1].cross_validation = Some(CrossValidation::Unconfirmed);
    let annotated = annotate("the content was new", &words);
    assert_eq!(paths_of(&annotated.entries()[1]), vec![StrugglePath::Abandoned]);

    words[1].cross_validation = Some(CrossValidation::Confirmed);
    let annotated = annotate("the content was new", &words);
    assert_eq!(kinds(&annotated)[1], "substitution");
}

#[test]
fn paths_stack_on_one_entry() {
    let mut words = timed(&[("the", 0.0, 0.3), ("cont", 3.5, 3.8), ("was", 4.0, 4.2)]);
    words[1].cross_validation = Some(CrossValidation::Unconfirmed);
    let annotated = annotate("the content was", &words);
    assert_eq!(
        paths_of(&annotated.entries()[1]),
        vec![StrugglePath::Hesitation, StrugglePath::Abandoned]
    );
}

#[test]
fn inflection_only_substitution_is_forgiven() {
    let words = evenly(&["he", "jump", "high"]);
    let annotated = annotate("he jumped high", &words);
    assert_eq!(kinds(&annotated), vec!["correct", "substitution", "correct"]);
    assert!(annotated.notes()[1].forgiven);
    assert_eq!(annotated.notes()[1].inflection, Some("ed"));
    assert!(annotated.is_correct_reading(1));
}

#[test]
fn fragments_concatenate_into_full_attempt() {
    let words = evenly(&["the", "bar", "ac", "oda", "swam"]);
    let annotated = annotate("the barracuda swam", &words);
    assert_eq!(
        kinds(&annotated),
        vec!["correct", "struggle", "insertion", "insertion", "correct"]
    );
    let notes = &annotated.notes()[1];
    assert_eq!(notes.concat_attempt.as_deref(), Some("baracoda"));
    assert_eq!(notes.near_miss_evidence, vec!["ac", "oda"]);
    let attempt = notes.full_attempt.as_ref().expect("full attempt");
    assert_eq!(attempt.parts, vec!["bar", "ac", "oda"]);
    assert!(attempt.ratio > 0.7);
}

#[test]
fn short_fragment_inside_alternate_window_is_absorbed() {
    let mut words = timed(&[
        ("the", 0.0, 0.3),
        ("plaform", 0.4, 0.9),
        ("fo", 1.0, 1.2),
        ("was", 1.5, 1.8),
    ]);
    let annotated = annotate("the platform was", &words);
    assert_eq!(
        kinds(&annotated),
        vec!["correct", "substitution", "insertion", "correct"]
    );
    assert!(!annotated.notes()[2].part_of_struggle);

    words[1].alt_start_time = Some(0.4);
    words[1].alt_end_time = Some(1.3);
    let annotated = annotate("the platform was", &words);
    assert!(annotated.notes()[2].part_of_struggle);
}

#[test]
fn hyp_to_ref_maps_contractions_to_later_word() {
    let words = evenly(&["you'll", "go"]);
    let annotated = annotate("you will go", &words);
    let map = annotated.hyp_to_ref();
    assert_eq!(map.get(&0), Some(&1));
    assert_eq!(map.get(&1), Some(&2));
}

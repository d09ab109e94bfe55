//! Left-to-right repair passes over the base alignment. Each pass consumes
//! the previous entry list and never drops a reference word or a token.

use super::{AlignmentEntry, HypToken, MergeKind, RefWord};
use crate::config::DiagnosticThresholds;
use crate::diagnostics::is_near_miss;
use crate::text::{comparison_key, decimal_to_word_forms, number_to_word_forms};

/// Spoken expansions of period-stripped abbreviations.
const ABBREVIATION_EXPANSIONS: &[(&str, &[&[&str]])] = &[
    ("ie", &[&["that", "is"]]),
    ("eg", &[&["for", "example"]]),
    ("etc", &[&["et", "cetera"]]),
    ("aka", &[&["also", "known", "as"]]),
    ("diy", &[&["do", "it", "yourself"]]),
    ("rsvp", &[&["please", "respond"]]),
    ("ps", &[&["post", "script"]]),
    ("am", &[&["in", "the", "morning"]]),
    ("pm", &[&["in", "the", "afternoon"], &["in", "the", "evening"]]),
    ("bc", &[&["before", "christ"]]),
    ("ad", &[&["anno", "domini"]]),
    ("bce", &[&["before", "common", "era"]]),
    ("ce", &[&["common", "era"]]),
    ("us", &[&["united", "states"]]),
    ("usa", &[&["united", "states", "of", "america"]]),
    ("uk", &[&["united", "kingdom"]]),
    ("dc", &[&["district", "of", "columbia"]]),
    ("nyc", &[&["new", "york", "city"]]),
    ("un", &[&["united", "nations"]]),
    ("eu", &[&["european", "union"]]),
    ("mph", &[&["miles", "per", "hour"]]),
    ("kph", &[&["kilometers", "per", "hour"]]),
    ("wwi", &[&["world", "war", "one"], &["world", "war", "i"]]),
    ("wwii", &[&["world", "war", "two"], &["world", "war", "ii"]]),
];

fn abbreviation_forms(word: &str) -> Vec<Vec<String>> {
    ABBREVIATION_EXPANSIONS
        .iter()
        .find(|(abbr, _)| *abbr == word)
        .map(|(_, forms)| {
            forms
                .iter()
                .map(|form| form.iter().map(|w| w.to_string()).collect())
                .collect()
        })
        .unwrap_or_default()
}

fn spoken_number_forms(word: &str) -> Vec<Vec<String>> {
    if word.contains('.') {
        decimal_to_word_forms(word)
    } else {
        number_to_word_forms(word)
    }
}

fn insertion_token(entry: &AlignmentEntry) -> Option<&HypToken> {
    match entry {
        AlignmentEntry::Insertion { hyp, filler: false } => Some(hyp),
        _ => None,
    }
}

fn substitution(entry: &AlignmentEntry) -> Option<(&RefWord, &HypToken)> {
    match entry {
        AlignmentEntry::Substitution { reference, hyp } => Some((reference, hyp)),
        _ => None,
    }
}

fn merged(reference: &RefWord, tokens: Vec<HypToken>, kind: MergeKind) -> AlignmentEntry {
    AlignmentEntry::Correct {
        reference: reference.clone(),
        hyp: tokens,
        merge: Some(kind),
    }
}

/// Substitution plus following insertions whose concatenation matches the
/// reference word ("hot" + "dog" for "hotdog"). The smallest span wins.
///
/// Base decoding emits a hunk's substitutions before its insertions, so a
/// split word always surfaces with its first fragment as the substitution.
pub(super) fn compound_words(entries: Vec<AlignmentEntry>) -> Vec<AlignmentEntry> {
    let mut out = Vec::with_capacity(entries.len());
    let mut i = 0;
    while i < entries.len() {
        if let Some((reference, hyp)) = substitution(&entries[i]) {
            let target = comparison_key(&reference.text);
            let mut combined = hyp.text.clone();
            let mut tokens = vec![hyp.clone()];
            let mut consumed = None;
            for (offset, entry) in entries[i + 1..].iter().enumerate() {
                let Some(token) = insertion_token(entry) else { break };
                combined.push_str(&token.text);
                tokens.push(token.clone());
                if comparison_key(&combined) == target {
                    consumed = Some(offset + 1);
                    break;
                }
            }
            if let Some(count) = consumed {
                out.push(merged(reference, tokens, compound_kind(&combined, reference)));
                i += 1 + count;
                continue;
            }
        }
        out.push(entries[i].clone());
        i += 1;
    }
    out
}

fn compound_kind(combined: &str, reference: &RefWord) -> MergeKind {
    if combined == reference.text {
        MergeKind::Compound
    } else {
        MergeKind::Abbreviation
    }
}

pub(super) fn abbreviation_expansions(entries: Vec<AlignmentEntry>) -> Vec<AlignmentEntry> {
    expansion_pass(entries, MergeKind::Abbreviation, abbreviation_forms)
}

pub(super) fn number_expansions(entries: Vec<AlignmentEntry>) -> Vec<AlignmentEntry> {
    expansion_pass(entries, MergeKind::Number, |word| {
        let numeric = !word.is_empty()
            && word.bytes().all(|b| b.is_ascii_digit() || b == b'.')
            && word.bytes().any(|b| b.is_ascii_digit());
        if numeric {
            spoken_number_forms(word)
        } else {
            Vec::new()
        }
    })
}

/// Substitution whose hypothesis starts a known multi-word reading of the
/// reference word, with the rest of the reading in the insertions after it.
fn expansion_pass(
    entries: Vec<AlignmentEntry>,
    kind: MergeKind,
    forms_of: impl Fn(&str) -> Vec<Vec<String>>,
) -> Vec<AlignmentEntry> {
    let mut out = Vec::with_capacity(entries.len());
    let mut i = 0;
    while i < entries.len() {
        if let Some((reference, hyp)) = substitution(&entries[i]) {
            let forms = forms_of(&reference.text);
            let matched = forms.iter().find_map(|form| {
                let (first, rest) = form.split_first()?;
                if *first != hyp.text {
                    return None;
                }
                let following = entries.get(i + 1..i + 1 + rest.len())?;
                let tokens: Vec<&HypToken> = following.iter().filter_map(insertion_token).collect();
                let all_match = tokens.len() == rest.len()
                    && tokens.iter().zip(rest).all(|(t, w)| t.text == *w);
                all_match.then(|| {
                    let mut parts = vec![hyp.clone()];
                    parts.extend(tokens.into_iter().cloned());
                    parts
                })
            });
            if let Some(parts) = matched {
                let consumed = parts.len();
                out.push(merged(reference, parts, kind));
                i += consumed;
                continue;
            }
        }
        out.push(entries[i].clone());
        i += 1;
    }
    out
}

/// Substitution next to an omission where the two reference words, spaced or
/// fused, mean the substitution's hypothesis ("you will" read as "you'll",
/// "long term" transcribed as "longterm").
pub(super) fn contractions(entries: Vec<AlignmentEntry>) -> Vec<AlignmentEntry> {
    let mut out = Vec::with_capacity(entries.len());
    let mut i = 0;
    while i < entries.len() {
        let pair = entries.get(i + 1).and_then(|next| match (&entries[i], next) {
            (
                AlignmentEntry::Substitution { reference, hyp },
                AlignmentEntry::Omission { reference: omitted },
            ) => Some((reference, omitted, hyp)),
            (
                AlignmentEntry::Omission { reference: omitted },
                AlignmentEntry::Substitution { reference, hyp },
            ) => Some((omitted, reference, hyp)),
            _ => None,
        });
        if let Some((first, second, hyp)) = pair {
            if fuses_into(&first.text, &second.text, &hyp.text) {
                for reference in [first, second] {
                    out.push(merged(reference, vec![hyp.clone()], MergeKind::Contraction));
                }
                i += 2;
                continue;
            }
        }
        out.push(entries[i].clone());
        i += 1;
    }
    out
}

fn fuses_into(first: &str, second: &str, spoken: &str) -> bool {
    let target = comparison_key(spoken);
    comparison_key(&format!("{first} {second}")) == target
        || comparison_key(&format!("{first}{second}")) == target
}

/// Substitutions holding the tail of the previous word ("beauti" "fulsun"
/// read for "beautiful sunny"). When a candidate's hypothesis is no attempt
/// at its own reference word but completes a near miss for the preceding
/// substitution's word, its token becomes an insertion and its reference word
/// an omission. Candidates chain: the first run whose concatenation matches
/// is taken.
pub(super) fn spillover_fragments(
    entries: Vec<AlignmentEntry>,
    thresholds: &DiagnosticThresholds,
) -> Vec<AlignmentEntry> {
    let anchored: Vec<usize> = entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.reference().is_some())
        .map(|(at, _)| at)
        .collect();

    let mut targets = vec![false; entries.len()];
    for pair in 1..anchored.len() {
        let anchor_at = anchored[pair - 1];
        let anchor = &entries[anchor_at];
        if targets[anchor_at] || !anchor.is_substitution_like() {
            continue;
        }
        let (Some(anchor_ref), Some(mut concat)) = (anchor.reference(), anchor.hyp_text()) else {
            continue;
        };
        for (offset, &at) in anchored[pair..].iter().enumerate() {
            let Some((reference, hyp)) = substitution(&entries[at]) else { break };
            if is_near_miss(&hyp.text, &reference.text, thresholds) {
                break;
            }
            concat.push_str(&hyp.text);
            if is_near_miss(&concat, &anchor_ref.text, thresholds) {
                for &target in &anchored[pair..=pair + offset] {
                    targets[target] = true;
                }
                break;
            }
        }
    }

    let converted = targets.iter().filter(|t| **t).count();
    if converted == 0 {
        return entries;
    }
    tracing::debug!(converted, "alignment: spillover fragments released");

    let mut out = Vec::with_capacity(entries.len() + converted);
    let mut released: Option<RefWord> = None;
    for (entry, target) in entries.into_iter().zip(targets) {
        // The omission waits for any insertions already following the fragment.
        if !matches!(entry, AlignmentEntry::Insertion { .. }) {
            if let Some(reference) = released.take() {
                out.push(AlignmentEntry::Omission { reference });
            }
        }
        match entry {
            AlignmentEntry::Substitution { reference, hyp } if target => {
                out.push(AlignmentEntry::Insertion { hyp, filler: false });
                released = Some(reference);
            }
            other => out.push(other),
        }
    }
    if let Some(reference) = released {
        out.push(AlignmentEntry::Omission { reference });
    }
    out
}

/// Puts filler tokens back in front of the first entry spoken after them.
pub(super) fn reinject_fillers(
    mut entries: Vec<AlignmentEntry>,
    fillers: Vec<HypToken>,
) -> Vec<AlignmentEntry> {
    for filler in fillers {
        let at = entries
            .iter()
            .position(|e| e.first_hyp_index().is_some_and(|idx| idx > filler.index))
            .unwrap_or(entries.len());
        entries.insert(
            at,
            AlignmentEntry::Insertion {
                hyp: filler,
                filler: true,
            },
        );
    }
    entries
}

//! Near-miss and struggle resolution over a merged alignment.
//!
//! Evidence is collected per entry in an [`EntryNotes`] side table. Once every
//! pass has run, substitutions that gathered evidence are rebuilt as
//! `struggle` entries; nothing is ever removed.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use strsim::normalized_levenshtein;

use super::morphology::{letters, shared_prefix_len, shared_suffix_len};
use super::stats::round_to;
use super::timing::{effective_gaps, pause_before};
use crate::alignment::{AlignmentEntry, MergedAlignment, RefWord, StrugglePath};
use crate::config::DiagnosticThresholds;
use crate::types::HypothesisWord;

/// Suffixes a reader may add or drop without the word counting as an error.
const INFLECTIONAL_SUFFIXES: [&str; 8] = ["s", "es", "ed", "d", "ing", "er", "est", "ly"];
const MIN_INFLECTION_BASE: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullAttempt {
    pub parts: Vec<String>,
    pub joined: String,
    /// Levenshtein similarity of `joined` to the reference word.
    pub ratio: f64,
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntryNotes {
    /// Substitution that only differs from the reference by an inflection.
    #[serde(skip_serializing_if = "is_false")]
    pub forgiven: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inflection: Option<&'static str>,
    /// Insertion that belongs to a neighbouring struggle.
    #[serde(skip_serializing_if = "is_false")]
    pub part_of_struggle: bool,
    /// Insertion that was a false start on the following correct word.
    #[serde(skip_serializing_if = "is_false")]
    pub self_correction: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub near_miss_evidence: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concat_attempt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_attempt: Option<FullAttempt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pause_before: Option<f64>,
}

impl EntryNotes {
    fn is_claimed(&self) -> bool {
        self.part_of_struggle || self.self_correction
    }
}

/// Whether `attempt` looks like a try at `target`: both at least three
/// characters and sharing a three character prefix or suffix, or close in
/// Levenshtein ratio.
pub fn is_near_miss(attempt: &str, target: &str, thresholds: &DiagnosticThresholds) -> bool {
    let a = letters(attempt);
    let b = letters(target);
    let min = thresholds.near_miss_min_affix;
    if a.chars().count() < min || b.chars().count() < min {
        return false;
    }
    shared_prefix_len(&a, &b) >= min
        || shared_suffix_len(&a, &b) >= min
        || normalized_levenshtein(&a, &b) >= thresholds.near_miss_min_ratio
}

/// Suffix separating `spoken` from `reference` when one is the other plus an
/// inflectional ending.
pub fn inflectional_suffix(reference: &str, spoken: &str) -> Option<&'static str> {
    let r = letters(reference);
    let s = letters(spoken);
    let (base, long) = if r.len() < s.len() { (&r, &s) } else { (&s, &r) };
    if base == long || base.chars().count() < MIN_INFLECTION_BASE || !long.starts_with(base.as_str()) {
        return None;
    }
    let rest = &long[base.len()..];
    INFLECTIONAL_SUFFIXES.iter().copied().find(|suffix| *suffix == rest)
}

/// Alignment after near-miss resolution and struggle detection.
#[derive(Debug, Clone)]
pub struct StruggleAnnotated {
    reference: Vec<RefWord>,
    entries: Vec<AlignmentEntry>,
    notes: Vec<EntryNotes>,
}

impl StruggleAnnotated {
    pub fn annotate(
        alignment: MergedAlignment,
        words: &[HypothesisWord],
        thresholds: &DiagnosticThresholds,
    ) -> Self {
        let (reference, entries) = alignment.into_parts();
        let mut notes = vec![EntryNotes::default(); entries.len()];
        let mut paths: Vec<BTreeSet<StrugglePath>> = entries
            .iter()
            .map(|entry| match entry {
                AlignmentEntry::Struggle { paths, .. } => paths.iter().copied().collect(),
                _ => BTreeSet::new(),
            })
            .collect();

        mark_inflections(&entries, &mut notes);
        resolve_near_misses(&entries, &mut notes, thresholds);
        concatenate_fragments(&entries, &mut notes, thresholds);
        for (index, note) in notes.iter().enumerate() {
            if entries[index].is_substitution_like() && !note.near_miss_evidence.is_empty() {
                paths[index].insert(StrugglePath::Decoding);
            }
        }

        let pauses = pause_before(&effective_gaps(words));
        for (index, entry) in entries.iter().enumerate() {
            let (target, hyp) = match entry {
                AlignmentEntry::Substitution { reference, hyp }
                | AlignmentEntry::Struggle { reference, hyp, .. } => (reference, hyp),
                _ => continue,
            };
            let pause = pauses.get(&hyp.index).copied();
            notes[index].pause_before = pause.map(|p| round_to(p, 3));
            if pause.is_some_and(|p| p >= thresholds.struggle_pause_sec)
                && letters(&target.text).chars().count() > thresholds.struggle_min_ref_chars
            {
                paths[index].insert(StrugglePath::Hesitation);
            }
            let unconfirmed = words.get(hyp.index).is_some_and(HypothesisWord::is_unconfirmed);
            if unconfirmed && is_near_miss(&hyp.text, &target.text, thresholds) {
                paths[index].insert(StrugglePath::Abandoned);
            }
        }

        absorb_fragments(&entries, words, &mut notes, thresholds);

        let entries: Vec<AlignmentEntry> = entries
            .into_iter()
            .zip(paths)
            .map(|(entry, paths)| match entry {
                AlignmentEntry::Substitution { reference, hyp } if !paths.is_empty() => {
                    AlignmentEntry::Struggle {
                        reference,
                        hyp,
                        paths: paths.into_iter().collect(),
                    }
                }
                AlignmentEntry::Struggle { reference, hyp, .. } => AlignmentEntry::Struggle {
                    reference,
                    hyp,
                    paths: paths.into_iter().collect(),
                },
                other => other,
            })
            .collect();
        for (entry, note) in entries.iter().zip(notes.iter_mut()) {
            if matches!(entry, AlignmentEntry::Struggle { .. }) {
                note.forgiven = false;
                note.inflection = None;
            }
        }
        reconstruct_full_attempts(&entries, &mut notes);

        tracing::debug!(
            entries = entries.len(),
            struggles = entries
                .iter()
                .filter(|e| matches!(e, AlignmentEntry::Struggle { .. }))
                .count(),
            absorbed = notes.iter().filter(|n| n.part_of_struggle).count(),
            forgiven = notes.iter().filter(|n| n.forgiven).count(),
            "struggle: entries annotated"
        );

        Self {
            reference,
            entries,
            notes,
        }
    }

    pub fn reference(&self) -> &[RefWord] {
        &self.reference
    }

    pub fn entries(&self) -> &[AlignmentEntry] {
        &self.entries
    }

    pub fn notes(&self) -> &[EntryNotes] {
        &self.notes
    }

    /// Passage word each hypothesis word was aligned to. A word covering two
    /// passage words maps to the later one.
    pub fn hyp_to_ref(&self) -> HashMap<usize, usize> {
        let mut map = HashMap::new();
        for entry in &self.entries {
            if let Some(reference) = entry.reference() {
                for token in entry.hyp_tokens() {
                    map.insert(token.index, reference.index);
                }
            }
        }
        map
    }

    /// Whether the entry counts as read correctly.
    pub fn is_correct_reading(&self, index: usize) -> bool {
        self.entries[index].is_correct() || self.notes[index].forgiven
    }
}

fn mark_inflections(entries: &[AlignmentEntry], notes: &mut [EntryNotes]) {
    for (entry, note) in entries.iter().zip(notes.iter_mut()) {
        if let AlignmentEntry::Substitution { reference, hyp } = entry {
            if let Some(suffix) = inflectional_suffix(&reference.text, &hyp.text) {
                note.forgiven = true;
                note.inflection = Some(suffix);
            }
        }
    }
}

fn spoken_insertion(entry: &AlignmentEntry) -> Option<&str> {
    match entry {
        AlignmentEntry::Insertion { hyp, filler: false } => Some(hyp.text.as_str()),
        _ => None,
    }
}

/// Per insertion, in priority order: a near miss of the next correct word is a
/// self-correction, otherwise a near miss of the next or the previous
/// substitution is evidence of a struggle.
fn resolve_near_misses(entries: &[AlignmentEntry], notes: &mut [EntryNotes], thresholds: &DiagnosticThresholds) {
    let is_anchor = |e: &AlignmentEntry| !matches!(e, AlignmentEntry::Insertion { .. });
    for index in 0..entries.len() {
        let Some(text) = spoken_insertion(&entries[index]) else {
            continue;
        };
        let next = (index + 1..entries.len()).find(|&j| is_anchor(&entries[j]));
        let previous = (0..index).rev().find(|&j| is_anchor(&entries[j]));
        let near = |j: usize| {
            entries[j]
                .reference()
                .is_some_and(|r| is_near_miss(text, &r.text, thresholds))
        };

        if let Some(n) = next.filter(|&n| entries[n].is_correct() && near(n)) {
            notes[index].self_correction = true;
            notes[n].near_miss_evidence.push(text.to_string());
            continue;
        }
        let target = next
            .filter(|&n| entries[n].is_substitution_like() && near(n))
            .or_else(|| previous.filter(|&p| entries[p].is_substitution_like() && near(p)));
        if let Some(t) = target {
            notes[index].part_of_struggle = true;
            notes[t].near_miss_evidence.push(text.to_string());
        }
    }
}

/// Second chance for fragments that failed individually: up to a few
/// unclaimed insertions next to a substitution, glued to its hypothesis,
/// may together be a near miss. The closest combination wins, and it must
/// beat the hypothesis alone.
fn concatenate_fragments(entries: &[AlignmentEntry], notes: &mut [EntryNotes], thresholds: &DiagnosticThresholds) {
    for index in 0..entries.len() {
        let (reference, hyp) = match &entries[index] {
            AlignmentEntry::Substitution { reference, hyp }
            | AlignmentEntry::Struggle { reference, hyp, .. } => (reference, hyp),
            _ => continue,
        };
        let usable = |j: usize| {
            spoken_insertion(&entries[j])
                .filter(|t| !notes[j].is_claimed() && letters(t).chars().count() >= thresholds.concat_min_chars)
                .is_some()
        };
        let before: Vec<usize> = (0..index)
            .rev()
            .take_while(|&j| usable(j))
            .take(thresholds.concat_max_insertions)
            .collect();
        let after: Vec<usize> = (index + 1..entries.len())
            .take_while(|&j| usable(j))
            .take(thresholds.concat_max_insertions)
            .collect();

        let max_len = letters(&reference.text).chars().count() * 2;
        let baseline = normalized_levenshtein(&letters(&hyp.text), &letters(&reference.text));
        let text_of = |j: usize| spoken_insertion(&entries[j]).unwrap_or_default();

        let mut spans: Vec<Vec<usize>> = (1..=before.len())
            .map(|span| {
                let mut lead = before[..span].to_vec();
                lead.reverse();
                lead
            })
            .collect();
        spans.extend((1..=after.len()).map(|span| after[..span].to_vec()));

        let mut found: Option<(Vec<usize>, String)> = None;
        let mut best = baseline;
        for span in spans {
            let fragments = span.iter().map(|&j| text_of(j));
            let combined: String = if span.first().is_some_and(|&j| j < index) {
                fragments.chain([hyp.text.as_str()]).collect()
            } else {
                [hyp.text.as_str()].into_iter().chain(fragments).collect()
            };
            let joined = letters(&combined);
            if joined.chars().count() > max_len || !is_near_miss(&joined, &reference.text, thresholds) {
                continue;
            }
            let score = normalized_levenshtein(&joined, &letters(&reference.text));
            if score > best {
                best = score;
                found = Some((span, combined));
            }
        }

        if let Some((claimed, combined)) = found {
            for &j in &claimed {
                notes[j].part_of_struggle = true;
                notes[index].near_miss_evidence.push(text_of(j).to_string());
            }
            notes[index].concat_attempt = Some(combined);
        }
    }
}

/// Short insertions spoken inside the time window of a neighbouring
/// substitution belong to that attempt.
fn absorb_fragments(
    entries: &[AlignmentEntry],
    words: &[HypothesisWord],
    notes: &mut [EntryNotes],
    thresholds: &DiagnosticThresholds,
) {
    let tolerance = thresholds.absorption_tolerance_sec;
    for index in 0..entries.len() {
        let AlignmentEntry::Insertion { hyp, filler: false } = &entries[index] else {
            continue;
        };
        if notes[index].is_claimed() || letters(&hyp.text).chars().count() > thresholds.absorption_max_chars {
            continue;
        }
        let Some(fragment) = words.get(hyp.index) else {
            continue;
        };
        let mut candidates: Vec<usize> = (0..entries.len())
            .filter(|&j| entries[j].is_substitution_like())
            .filter(|&j| {
                entries[j]
                    .first_hyp_index()
                    .is_some_and(|h| h.abs_diff(hyp.index) <= 1)
            })
            .collect();
        candidates.sort_by_key(|&j| j.abs_diff(index));
        let inside = candidates.into_iter().any(|j| {
            let Some(word) = entries[j].first_hyp_index().and_then(|h| words.get(h)) else {
                return false;
            };
            let (start, end) = match (word.alt_start_time, word.alt_end_time) {
                (Some(start), Some(end)) => (start, end),
                _ => (word.start_time, word.end_time),
            };
            fragment.start_time >= start - tolerance && fragment.end_time <= end + tolerance
        });
        if inside {
            notes[index].part_of_struggle = true;
        }
    }
}

/// Everything the reader produced for a struggled word: adjacent claimed
/// insertions around the entry plus its own hypothesis.
fn reconstruct_full_attempts(entries: &[AlignmentEntry], notes: &mut [EntryNotes]) {
    for index in 0..entries.len() {
        let AlignmentEntry::Struggle { reference, hyp, .. } = &entries[index] else {
            continue;
        };
        let claimed = |j: usize| -> Option<String> {
            match &entries[j] {
                AlignmentEntry::Insertion { hyp, .. } if notes[j].part_of_struggle => Some(hyp.text.clone()),
                _ => None,
            }
        };
        let mut parts: Vec<String> = (0..index).rev().map_while(claimed).collect();
        parts.reverse();
        parts.push(hyp.text.clone());
        parts.extend((index + 1..entries.len()).map_while(claimed));
        let joined: String = parts.concat();
        let ratio = round_to(normalized_levenshtein(&letters(&joined), &letters(&reference.text)), 3);
        notes[index].full_attempt = Some(FullAttempt { parts, joined, ratio });
    }
}

#[cfg(test)]
mod tests;

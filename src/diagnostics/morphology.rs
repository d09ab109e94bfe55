use serde::Serialize;

use crate::alignment::AlignmentEntry;
use crate::config::DiagnosticThresholds;

use super::struggle::EntryNotes;

/// Lowercase letters and digits only, for affix comparisons.
pub(crate) fn letters(word: &str) -> String {
    word.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

pub(crate) fn shared_prefix_len(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}

pub(crate) fn shared_suffix_len(a: &str, b: &str) -> usize {
    a.chars()
        .rev()
        .zip(b.chars().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MorphologicalError {
    pub entry_index: usize,
    pub reference: String,
    pub hyp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_suffix: Option<String>,
}

/// Same root, wrong affix: a substitution or struggle sharing a long prefix
/// or suffix with its reference word while still differing by more than a
/// single character. Forgiven inflections are not reported.
pub fn detect_morphological_errors(
    entries: &[AlignmentEntry],
    notes: &[EntryNotes],
    thresholds: &DiagnosticThresholds,
) -> Vec<MorphologicalError> {
    let mut out = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        let (reference, hyp) = match entry {
            AlignmentEntry::Substitution { reference, hyp }
            | AlignmentEntry::Struggle { reference, hyp, .. } => (reference, hyp),
            _ => continue,
        };
        if notes.get(index).is_some_and(|n| n.forgiven) {
            continue;
        }
        let r = letters(&reference.text);
        let h = letters(&hyp.text);
        if r == h {
            continue;
        }
        let prefix = shared_prefix_len(&r, &h);
        let suffix = shared_suffix_len(&r, &h);
        let min = thresholds.morphological_min_affix;
        if prefix < min && suffix < min {
            continue;
        }
        let common = prefix.max(suffix);
        let diff = (r.chars().count() - common) + (h.chars().count() - common);
        if diff < thresholds.morphological_min_diff {
            continue;
        }
        out.push(MorphologicalError {
            entry_index: index,
            reference: reference.text.clone(),
            hyp: hyp.text.clone(),
            shared_prefix: (prefix >= min).then(|| r.chars().take(prefix).collect()),
            shared_suffix: (suffix >= min).then(|| {
                let skip = r.chars().count() - suffix;
                r.chars().skip(skip).collect()
            }),
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::{HypToken, RefWord};

    fn substitution(reference: &str, hyp: &str) -> AlignmentEntry {
        AlignmentEntry::Substitution {
            reference: RefWord {
                index: 0,
                text: reference.to_string(),
                punctuation: None,
            },
            hyp: HypToken {
                index: 0,
                text: hyp.to_string(),
            },
        }
    }

    fn detect(pairs: &[(&str, &str)]) -> Vec<MorphologicalError> {
        let entries: Vec<_> = pairs.iter().map(|(r, h)| substitution(r, h)).collect();
        let notes = vec![EntryNotes::default(); entries.len()];
        detect_morphological_errors(&entries, &notes, &DiagnosticThresholds::default())
    }

    #[test]
    fn wrong_ending_and_wrong_beginning() {
        let found = detect(&[("running", "runned"), ("unhappy", "happy")]);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].shared_prefix.as_deref(), Some("runn"));
        assert_eq!(found[1].shared_suffix.as_deref(), Some("happy"));
        assert_eq!(found[1].shared_prefix, None);
    }

    #[test]
    fn single_character_difference_is_ignored() {
        assert!(detect(&[("formats", "format")]).is_empty());
    }

    #[test]
    fn unrelated_words_are_ignored() {
        assert!(detect(&[("house", "garden"), ("cat", "cab")]).is_empty());
    }

    #[test]
    fn forgiven_entries_are_skipped() {
        let entries = vec![substitution("jumping", "jumped")];
        let mut notes = vec![EntryNotes::default()];
        notes[0].forgiven = true;
        let found = detect_morphological_errors(&entries, &notes, &DiagnosticThresholds::default());
        assert!(found.is_empty());
    }

    #[test]
    fn affix_helpers() {
        assert_eq!(shared_prefix_len("station", "sta"), 3);
        assert_eq!(shared_suffix_len("overall", "varall"), 4);
        assert_eq!(letters("Don't!"), "dont");
    }
}

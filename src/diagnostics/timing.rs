use std::collections::HashMap;

use serde::Serialize;

use super::stats::round_to;
use crate::alignment::RefWord;
use crate::config::DiagnosticThresholds;
use crate::text::Punctuation;
use crate::types::HypothesisWord;

/// Silence between a word and the nearest earlier word the cross-validator
/// did not reject.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Gap {
    pub previous: usize,
    pub next: usize,
    pub seconds: f64,
}

/// Inter-word gaps, reconciled against the alternate timestamps when both
/// words carry them (the shorter gap wins). The first word has no gap.
pub fn effective_gaps(words: &[HypothesisWord]) -> Vec<Gap> {
    let mut gaps = Vec::with_capacity(words.len().saturating_sub(1));
    for next in 1..words.len() {
        let Some(previous) = (0..next).rev().find(|&j| !words[j].is_unconfirmed()) else {
            continue;
        };
        let primary = words[next].start_time - words[previous].end_time;
        let alternate = match (words[next].alt_start_time, words[previous].alt_end_time) {
            (Some(start), Some(end)) => start - end,
            _ => primary,
        };
        gaps.push(Gap {
            previous,
            next,
            seconds: primary.min(alternate),
        });
    }
    gaps
}

/// Gap ending at each word, keyed by the word's index.
pub(crate) fn pause_before(gaps: &[Gap]) -> HashMap<usize, f64> {
    gaps.iter().map(|g| (g.next, g.seconds)).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OnsetDelay {
    pub word_index: usize,
    pub word: String,
    pub gap: f64,
    pub threshold: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub punctuation: Option<Punctuation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongPause {
    pub after_word_index: usize,
    pub gap: f64,
}

/// Punctuation trailing the passage word a hypothesis word was aligned to.
pub(crate) fn punctuation_after(
    hyp_index: usize,
    hyp_to_ref: &HashMap<usize, usize>,
    reference: &[RefWord],
) -> Option<Punctuation> {
    hyp_to_ref
        .get(&hyp_index)
        .and_then(|&r| reference.get(r))
        .and_then(|r| r.punctuation)
}

pub(crate) fn hesitation_threshold(punctuation: Option<Punctuation>, thresholds: &DiagnosticThresholds) -> f64 {
    match punctuation {
        Some(Punctuation::Period) => thresholds.period_hesitation_sec,
        Some(Punctuation::Comma) => thresholds.comma_hesitation_sec,
        None => thresholds.hesitation_sec,
    }
}

/// Hesitations: gaps at or above the punctuation-aware threshold but short
/// of a long pause.
pub fn detect_onset_delays(
    words: &[HypothesisWord],
    gaps: &[Gap],
    hyp_to_ref: &HashMap<usize, usize>,
    reference: &[RefWord],
    thresholds: &DiagnosticThresholds,
) -> Vec<OnsetDelay> {
    gaps.iter()
        .filter_map(|gap| {
            let punctuation = punctuation_after(gap.previous, hyp_to_ref, reference);
            let threshold = hesitation_threshold(punctuation, thresholds);
            (gap.seconds >= threshold && gap.seconds < thresholds.long_pause_sec).then(|| OnsetDelay {
                word_index: gap.next,
                word: words[gap.next].word.clone(),
                gap: round_to(gap.seconds, 3),
                threshold,
                punctuation,
            })
        })
        .collect()
}

pub fn detect_long_pauses(gaps: &[Gap], thresholds: &DiagnosticThresholds) -> Vec<LongPause> {
    gaps.iter()
        .filter(|gap| gap.seconds >= thresholds.long_pause_sec)
        .map(|gap| LongPause {
            after_word_index: gap.previous,
            gap: round_to(gap.seconds, 1),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CrossValidation;

    fn timed(items: &[(&str, f64, f64)]) -> Vec<HypothesisWord> {
        items
            .iter()
            .map(|(w, s, e)| HypothesisWord::new(*w, *s, *e))
            .collect()
    }

    fn reference(items: &[(&str, Option<Punctuation>)]) -> Vec<RefWord> {
        items
            .iter()
            .enumerate()
            .map(|(index, (text, punctuation))| RefWord {
                index,
                text: text.to_string(),
                punctuation: *punctuation,
            })
            .collect()
    }

    fn identity(n: usize) -> HashMap<usize, usize> {
        (0..n).map(|i| (i, i)).collect()
    }

    #[test]
    fn long_pause_between_confirmed_words() {
        let words = timed(&[("the", 0.0, 0.5), ("dog", 3.9, 4.3)]);
        let gaps = effective_gaps(&words);
        let pauses = detect_long_pauses(&gaps, &DiagnosticThresholds::default());
        assert_eq!(pauses.len(), 1);
        assert_eq!(pauses[0].after_word_index, 0);
        assert_eq!(pauses[0].gap, 3.4);
    }

    #[test]
    fn unconfirmed_words_are_skipped_as_previous() {
        let mut words = timed(&[("the", 0.0, 0.5), ("uh", 0.6, 0.8), ("dog", 1.0, 1.3)]);
        words[1].cross_validation = Some(CrossValidation::Unconfirmed);
        let gaps = effective_gaps(&words);
        assert_eq!(gaps.len(), 2);
        assert_eq!(gaps[1].previous, 0);
        assert!((gaps[1].seconds - 0.5).abs() < 1e-9);
    }

    #[test]
    fn alternate_timestamps_shorten_gaps() {
        let mut words = timed(&[("the", 0.0, 0.5), ("dog", 1.5, 1.8)]);
        words[0].alt_end_time = Some(0.9);
        words[1].alt_start_time = Some(1.2);
        let gaps = effective_gaps(&words);
        assert!((gaps[0].seconds - 0.3).abs() < 1e-9);
    }

    #[test]
    fn onset_threshold_follows_punctuation() {
        let th = DiagnosticThresholds::default();
        let words = timed(&[
            ("end", 0.0, 0.3),
            ("then", 1.2, 1.5),
            ("we", 2.1, 2.3),
            ("ran", 2.5, 2.8),
        ]);
        let refs = reference(&[
            ("end", Some(Punctuation::Period)),
            ("then", Some(Punctuation::Comma)),
            ("we", None),
            ("ran", None),
        ]);
        let gaps = effective_gaps(&words);
        let delays = detect_onset_delays(&words, &gaps, &identity(4), &refs, &th);
        // 0.9 s after a period and 0.2 s mid-phrase stay quiet; 0.6 s after a
        // comma is still below the comma threshold.
        assert!(delays.is_empty());

        let words = timed(&[("end", 0.0, 0.3), ("then", 1.6, 1.9), ("we", 2.8, 3.0)]);
        let gaps = effective_gaps(&words);
        let delays = detect_onset_delays(&words, &gaps, &identity(3), &refs, &th);
        assert_eq!(delays.len(), 2);
        assert_eq!(delays[0].threshold, 1.2);
        assert_eq!(delays[0].punctuation, Some(Punctuation::Period));
        assert_eq!(delays[1].threshold, 0.8);
        assert_eq!(delays[1].word, "we");
    }

    #[test]
    fn long_pause_is_not_a_hesitation() {
        let words = timed(&[("a", 0.0, 0.2), ("b", 3.5, 3.7)]);
        let gaps = effective_gaps(&words);
        let delays = detect_onset_delays(
            &words,
            &gaps,
            &HashMap::new(),
            &[],
            &DiagnosticThresholds::default(),
        );
        assert!(delays.is_empty());
    }
}

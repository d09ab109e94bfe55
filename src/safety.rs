use serde::Serialize;

use crate::config::SafetyThresholds;
use crate::confidence::ReferenceSet;
use crate::types::{HypothesisWord, Source, TrustLevel, WordFlag};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateAnomaly {
    pub window_index: usize,
    /// Words per second, rounded to 2 decimals.
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UncorroboratedRun {
    /// Indices of the flagged words.
    pub words: Vec<usize>,
    pub in_reference: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollapseStatus {
    pub collapsed: bool,
    pub flagged_words: usize,
    pub total_words: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafetyReport {
    pub rate_anomalies: Vec<RateAnomaly>,
    pub uncorroborated_runs: Vec<UncorroboratedRun>,
    /// Words whose safety flags were cleared by strong two-engine agreement.
    pub overrides: usize,
    pub collapse: CollapseStatus,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Flags every word of a sliding window that is read faster than humanly
/// possible. Windows touching the audio edges are skipped.
pub fn detect_rate_anomalies(
    words: &mut [HypothesisWord],
    audio_duration_sec: f64,
    thresholds: &SafetyThresholds,
) -> Vec<RateAnomaly> {
    let size = thresholds.rate_window_size;
    let mut anomalies = Vec::new();
    if size == 0 || words.len() < size {
        return anomalies;
    }
    let audio_ms = audio_duration_sec * 1000.0;
    for i in 0..=words.len() - size {
        let start = words[i].start_time;
        let end = words[i + size - 1].end_time;
        if start * 1000.0 < thresholds.edge_tolerance_ms
            || end * 1000.0 > audio_ms - thresholds.edge_tolerance_ms
        {
            continue;
        }
        let duration = end - start;
        if duration <= 0.0 {
            continue;
        }
        let rate = size as f64 / duration;
        if rate > thresholds.max_words_per_second {
            for word in &mut words[i..i + size] {
                word.flags.insert(WordFlag::RateAnomaly);
            }
            anomalies.push(RateAnomaly {
                window_index: i,
                rate: round2(rate),
            });
        }
    }
    anomalies
}

#[derive(Default)]
struct Run {
    words: Vec<usize>,
}

impl Run {
    fn flush(
        &mut self,
        min_len: usize,
        in_reference: bool,
        words: &mut [HypothesisWord],
        out: &mut Vec<UncorroboratedRun>,
    ) {
        let run = std::mem::take(&mut self.words);
        if run.len() >= min_len {
            for &i in &run {
                words[i].flags.insert(WordFlag::UncorroboratedSequence);
            }
            out.push(UncorroboratedRun {
                words: run,
                in_reference,
            });
        }
    }
}

/// Long stretches heard only by the secondary engine. In-reference and
/// out-of-reference words are counted separately; a word both engines heard
/// ends both runs.
pub fn detect_uncorroborated_sequences(
    words: &mut [HypothesisWord],
    reference: &ReferenceSet,
    thresholds: &SafetyThresholds,
) -> Vec<UncorroboratedRun> {
    let mut runs = Vec::new();
    let mut in_ref = Run::default();
    let mut not_in_ref = Run::default();
    for i in 0..words.len() {
        match words[i].effective_source() {
            Source::LatestOnly => {
                if reference.contains(&words[i].word) {
                    in_ref.words.push(i);
                } else {
                    not_in_ref.words.push(i);
                }
            }
            Source::Both => {
                in_ref.flush(thresholds.uncorroborated_in_reference, true, words, &mut runs);
                not_in_ref.flush(thresholds.uncorroborated_not_in_reference, false, words, &mut runs);
            }
            Source::DefaultOnly => {}
        }
    }
    in_ref.flush(thresholds.uncorroborated_in_reference, true, words, &mut runs);
    not_in_ref.flush(thresholds.uncorroborated_not_in_reference, false, words, &mut runs);
    runs.sort_by_key(|run| run.words.first().copied());
    runs
}

/// Clears rate and corroboration flags on words both engines agree on with
/// high confidence. Ghost flags stay.
pub fn apply_corroboration_override(words: &mut [HypothesisWord], thresholds: &SafetyThresholds) -> usize {
    let mut overrides = 0;
    for word in words.iter_mut() {
        let corroborated = word.effective_source() == Source::Both
            && word
                .confidence
                .is_some_and(|c| c >= thresholds.strong_corroboration);
        if !corroborated {
            continue;
        }
        let rate = word.flags.remove(&WordFlag::RateAnomaly);
        let uncorroborated = word.flags.remove(&WordFlag::UncorroboratedSequence);
        if rate || uncorroborated {
            overrides += 1;
        }
    }
    overrides
}

/// A transcript is collapsed when too many of its words carry no trust or
/// some safety flag.
pub fn detect_collapse(words: &[HypothesisWord], thresholds: &SafetyThresholds) -> CollapseStatus {
    let total_words = words.len();
    let flagged_words = words
        .iter()
        .filter(|w| w.trust_level == Some(TrustLevel::Unknown) || !w.flags.is_empty())
        .count();
    let percent = if total_words == 0 {
        0.0
    } else {
        round2(flagged_words as f64 * 100.0 / total_words as f64)
    };
    CollapseStatus {
        collapsed: total_words > 0 && percent > thresholds.collapse_percent,
        flagged_words,
        total_words,
        percent,
    }
}

/// Runs every safety check in place. The audio duration defaults to the end
/// of the last word.
pub fn check(
    words: &mut [HypothesisWord],
    reference: &ReferenceSet,
    audio_duration_sec: Option<f64>,
    thresholds: &SafetyThresholds,
) -> SafetyReport {
    let duration = audio_duration_sec
        .unwrap_or_else(|| words.iter().map(|w| w.end_time).fold(0.0, f64::max));
    let rate_anomalies = detect_rate_anomalies(words, duration, thresholds);
    let uncorroborated_runs = detect_uncorroborated_sequences(words, reference, thresholds);
    let overrides = apply_corroboration_override(words, thresholds);
    let collapse = detect_collapse(words, thresholds);

    if collapse.collapsed {
        tracing::warn!(
            flagged = collapse.flagged_words,
            total = collapse.total_words,
            percent = collapse.percent,
            "safety: transcript collapsed"
        );
    }
    tracing::debug!(
        rate_anomalies = rate_anomalies.len(),
        uncorroborated_runs = uncorroborated_runs.len(),
        overrides,
        "safety: checks applied"
    );

    SafetyReport {
        rate_anomalies,
        uncorroborated_runs,
        overrides,
        collapse,
    }
}

use std::collections::HashMap;

use serde::Serialize;

use super::stats::{median_sorted, round_to, sorted, UpperFence};
use super::timing::{punctuation_after, Gap};
use crate::alignment::{AlignmentEntry, RefWord};
use crate::config::DiagnosticThresholds;
use crate::pipeline::traits::PhonemeCounter;
use crate::text::{count_syllables, Punctuation};
use crate::types::HypothesisWord;

const QUICK_RATIO: f64 = 0.75;
const STEADY_RATIO: f64 = 1.25;
const SLOW_RATIO: f64 = 1.75;
const STRUGGLING_RATIO: f64 = 2.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WordSpeed {
    Quick,
    Steady,
    Slow,
    Struggling,
    Stalled,
    Omitted,
}

impl WordSpeed {
    fn from_ratio(ratio: f64) -> Self {
        if ratio < QUICK_RATIO {
            Self::Quick
        } else if ratio < STEADY_RATIO {
            Self::Steady
        } else if ratio < SLOW_RATIO {
            Self::Slow
        } else if ratio < STRUGGLING_RATIO {
            Self::Struggling
        } else {
            Self::Stalled
        }
    }
}

/// Dictionary phoneme count, else a syllable-based estimate.
pub fn phoneme_count(counter: &dyn PhonemeCounter, word: &str, thresholds: &DiagnosticThresholds) -> f64 {
    match counter.lookup(word) {
        Some(count) if count > 0 => f64::from(count),
        _ => f64::from(count_syllables(word).max(1)) * thresholds.phonemes_per_syllable,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordDuration {
    pub entry_index: usize,
    pub reference_index: usize,
    pub word: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phonemes: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ms_per_phoneme: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pause_inclusive_ms_per_phoneme: Option<f64>,
    pub outlier: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<WordSpeed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pause_inclusive_speed: Option<WordSpeed>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationAnalysis {
    pub words: Vec<WordDuration>,
    pub median_ms_per_phoneme: Option<f64>,
    pub pause_inclusive_median_ms_per_phoneme: Option<f64>,
    /// Upper fence on milliseconds per phoneme.
    pub outlier_fence: Option<f64>,
    pub outlier_count: usize,
    pub at_pace_percent: Option<f64>,
    pub insufficient_sample: bool,
}

/// One timed span per distinct hypothesis span; a contraction read for two
/// passage words is measured once against its spoken form.
struct Span<'a> {
    entry_index: usize,
    reference: &'a RefWord,
    words: Vec<&'a str>,
    first: usize,
    last: usize,
    spoken: Option<String>,
}

/// Phoneme-normalized word durations, outliers against the reader's own
/// distribution, and speed tiers relative to their own median.
pub fn analyze_durations(
    entries: &[AlignmentEntry],
    words: &[HypothesisWord],
    gaps: &[Gap],
    hyp_to_ref: &HashMap<usize, usize>,
    reference: &[RefWord],
    counter: &dyn PhonemeCounter,
    thresholds: &DiagnosticThresholds,
) -> DurationAnalysis {
    let mut out: Vec<WordDuration> = Vec::new();
    let mut spans: Vec<Span> = Vec::new();
    for (entry_index, entry) in entries.iter().enumerate() {
        let Some(reference) = entry.reference() else {
            continue;
        };
        let (Some(first), Some(last)) = (entry.first_hyp_index(), entry.last_hyp_index()) else {
            out.push(WordDuration {
                entry_index,
                reference_index: reference.index,
                word: reference.text.clone(),
                duration_ms: None,
                phonemes: None,
                ms_per_phoneme: None,
                pause_inclusive_ms_per_phoneme: None,
                outlier: false,
                speed: Some(WordSpeed::Omitted),
                pause_inclusive_speed: None,
            });
            continue;
        };
        if let Some(span) = spans.last_mut().filter(|s| s.first == first && s.last == last) {
            span.words.push(reference.text.as_str());
            span.spoken = entry.hyp_text();
            continue;
        }
        spans.push(Span {
            entry_index,
            reference,
            words: vec![reference.text.as_str()],
            first,
            last,
            spoken: None,
        });
    }

    let mut gap_before: HashMap<usize, &Gap> = HashMap::new();
    for gap in gaps {
        gap_before.insert(gap.next, gap);
    }

    for span in &spans {
        let (Some(start), Some(end)) = (words.get(span.first), words.get(span.last)) else {
            continue;
        };
        let seconds = end.end_time - start.start_time;
        let phoneme_text = span.spoken.as_deref().unwrap_or(&span.reference.text);
        let phonemes = phoneme_count(counter, phoneme_text, thresholds);
        let duration_ms = seconds * 1000.0;
        let valid = seconds > 0.0 && phonemes > 0.0;
        let pause = gap_before
            .get(&span.first)
            .filter(|gap| punctuation_after(gap.previous, hyp_to_ref, reference) != Some(Punctuation::Period))
            .map(|gap| gap.seconds.max(0.0))
            .unwrap_or(0.0);
        out.push(WordDuration {
            entry_index: span.entry_index,
            reference_index: span.reference.index,
            word: span.words.join(" "),
            duration_ms: Some(round_to(duration_ms, 1)),
            phonemes: Some(round_to(phonemes, 2)),
            ms_per_phoneme: valid.then(|| duration_ms / phonemes),
            pause_inclusive_ms_per_phoneme: valid.then(|| (duration_ms + pause * 1000.0) / phonemes),
            outlier: false,
            speed: None,
            pause_inclusive_speed: None,
        });
    }
    out.sort_by_key(|w| w.entry_index);
    let timed: Vec<usize> = out
        .iter()
        .enumerate()
        .filter(|(_, w)| w.ms_per_phoneme.is_some())
        .map(|(i, _)| i)
        .collect();

    let normalized = sorted(&timed.iter().filter_map(|&i| out[i].ms_per_phoneme).collect::<Vec<_>>());
    let inclusive = sorted(
        &timed
            .iter()
            .filter_map(|&i| out[i].pause_inclusive_ms_per_phoneme)
            .collect::<Vec<_>>(),
    );
    let median = median_sorted(&normalized);
    let inclusive_median = median_sorted(&inclusive);
    let insufficient_sample = normalized.len() < thresholds.min_outlier_sample || median <= 0.0;

    let mut analysis = DurationAnalysis {
        words: Vec::new(),
        median_ms_per_phoneme: None,
        pause_inclusive_median_ms_per_phoneme: None,
        outlier_fence: None,
        outlier_count: 0,
        at_pace_percent: None,
        insufficient_sample,
    };
    if insufficient_sample {
        for word in &mut out {
            round_word(word);
        }
        analysis.words = out;
        return analysis;
    }

    let fence = UpperFence::from_sorted(&normalized, thresholds.duration_iqr_floor_ms).fence;
    let mut steady = 0;
    for &i in &timed {
        let word = &mut out[i];
        let Some(value) = word.ms_per_phoneme else {
            continue;
        };
        word.outlier = value > fence;
        let speed = WordSpeed::from_ratio(value / median);
        if speed == WordSpeed::Steady {
            steady += 1;
        }
        word.speed = Some(speed);
        if inclusive_median > 0.0 {
            word.pause_inclusive_speed = word
                .pause_inclusive_ms_per_phoneme
                .map(|v| WordSpeed::from_ratio(v / inclusive_median));
        }
    }
    for word in &mut out {
        round_word(word);
    }

    analysis.outlier_count = out.iter().filter(|w| w.outlier).count();
    analysis.words = out;
    analysis.median_ms_per_phoneme = Some(round_to(median, 1));
    analysis.pause_inclusive_median_ms_per_phoneme = (inclusive_median > 0.0).then(|| round_to(inclusive_median, 1));
    analysis.outlier_fence = Some(round_to(fence, 1));
    analysis.at_pace_percent = Some(round_to(steady as f64 / timed.len() as f64 * 100.0, 1));
    tracing::debug!(
        timed = timed.len(),
        outliers = analysis.outlier_count,
        "duration: word speeds classified"
    );
    analysis
}

fn round_word(word: &mut WordDuration) {
    word.ms_per_phoneme = word.ms_per_phoneme.map(|v| round_to(v, 1));
    word.pause_inclusive_ms_per_phoneme = word.pause_inclusive_ms_per_phoneme.map(|v| round_to(v, 1));
}

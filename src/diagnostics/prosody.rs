//! Phrasing, punctuation and pace analyzers built on inter-word gaps.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::stats::{mean, median_sorted, round_to, sorted, std_dev, UpperFence};
use super::timing::{hesitation_threshold, punctuation_after, Gap};
use crate::alignment::{AlignmentEntry, RefWord};
use crate::config::DiagnosticThresholds;
use crate::text::{is_filler, Punctuation};
use crate::types::HypothesisWord;

const WORD_BY_WORD_MEDIAN_GAP_SEC: f64 = 0.350;
const CHOPPY_MEDIAN_GAP_SEC: f64 = 0.250;
const PHRASE_LEVEL_MEDIAN_GAP_SEC: f64 = 0.150;

const CONSISTENT_CV: f64 = 0.15;
const MOSTLY_STEADY_CV: f64 = 0.30;
const VARIABLE_CV: f64 = 0.50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BreakKind {
    LongPause,
    Hesitation,
    MediumPause,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhraseBreak {
    pub after_word_index: usize,
    pub gap: f64,
    pub kind: BreakKind,
    pub at_punctuation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadingPattern {
    WordByWord,
    Choppy,
    PhraseLevel,
    Connected,
}

impl ReadingPattern {
    fn from_median_gap(median: f64) -> Self {
        if median > WORD_BY_WORD_MEDIAN_GAP_SEC {
            Self::WordByWord
        } else if median > CHOPPY_MEDIAN_GAP_SEC {
            Self::Choppy
        } else if median > PHRASE_LEVEL_MEDIAN_GAP_SEC {
            Self::PhraseLevel
        } else {
            Self::Connected
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhrasingQuality {
    pub breaks: Vec<PhraseBreak>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medium_pause_threshold: Option<f64>,
    pub words_per_phrase: Option<f64>,
    pub words_per_phrase_unexpected: Option<f64>,
    pub median_gap: Option<f64>,
    pub reading_pattern: Option<ReadingPattern>,
    pub insufficient_sample: bool,
}

/// Non-negative gaps, sorted; the student's own pause baseline.
fn baseline(gaps: &[Gap]) -> Vec<f64> {
    let values: Vec<f64> = gaps.iter().map(|g| g.seconds).filter(|s| *s >= 0.0).collect();
    sorted(&values)
}

/// Every gap that splits the reading into phrases: long pauses, hesitations,
/// and statistically long gaps above the student's own upper fence.
pub fn analyze_phrasing(
    words: &[HypothesisWord],
    gaps: &[Gap],
    hyp_to_ref: &HashMap<usize, usize>,
    reference: &[RefWord],
    thresholds: &DiagnosticThresholds,
) -> PhrasingQuality {
    let base = baseline(gaps);
    let insufficient_sample = base.len() < thresholds.min_outlier_sample;
    let medium_pause_threshold = (!insufficient_sample).then(|| {
        UpperFence::from_sorted(&base, 0.0)
            .fence
            .max(thresholds.medium_pause_floor_sec)
    });

    let breaks: Vec<PhraseBreak> = gaps
        .iter()
        .filter_map(|gap| {
            let punctuation = punctuation_after(gap.previous, hyp_to_ref, reference);
            let kind = if gap.seconds >= thresholds.long_pause_sec {
                BreakKind::LongPause
            } else if gap.seconds >= hesitation_threshold(punctuation, thresholds) {
                BreakKind::Hesitation
            } else if medium_pause_threshold.is_some_and(|fence| gap.seconds > fence) {
                BreakKind::MediumPause
            } else {
                return None;
            };
            Some(PhraseBreak {
                after_word_index: gap.previous,
                gap: round_to(gap.seconds, 3),
                kind,
                at_punctuation: punctuation.is_some(),
            })
        })
        .collect();

    let spoken = words.iter().filter(|w| !is_filler(&w.word)).count();
    let unexpected = breaks.iter().filter(|b| !b.at_punctuation).count();
    let per_phrase = |count: usize| (spoken > 0).then(|| round_to(spoken as f64 / (count + 1) as f64, 2));
    let median_gap = (!base.is_empty()).then(|| median_sorted(&base));

    PhrasingQuality {
        words_per_phrase: per_phrase(breaks.len()),
        words_per_phrase_unexpected: per_phrase(unexpected),
        median_gap: median_gap.map(|m| round_to(m, 3)),
        reading_pattern: median_gap.map(ReadingPattern::from_median_gap),
        medium_pause_threshold: medium_pause_threshold.map(|t| round_to(t, 3)),
        breaks,
        insufficient_sample,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PunctuationAwareness {
    pub encountered: usize,
    pub covered: usize,
    pub coverage: Option<f64>,
    pub breaks_at_punctuation: usize,
    pub total_breaks: usize,
    pub precision: Option<f64>,
}

/// How often the reader pauses where the passage punctuates, and how often
/// their pauses land on punctuation.
pub fn analyze_punctuation(
    entries: &[AlignmentEntry],
    gaps: &[Gap],
    phrasing: &PhrasingQuality,
    thresholds: &DiagnosticThresholds,
) -> PunctuationAwareness {
    // Punctuated passage words that were read, keyed by passage index, mapped to
    // the last hypothesis word that covered them.
    let mut read: BTreeMap<usize, (Punctuation, usize)> = BTreeMap::new();
    let mut last_read_ref = None;
    for entry in entries {
        let (Some(reference), Some(last)) = (entry.reference(), entry.last_hyp_index()) else {
            continue;
        };
        last_read_ref = Some(reference.index);
        if let Some(punctuation) = reference.punctuation {
            read.insert(reference.index, (punctuation, last));
        }
    }
    if let Some(final_ref) = last_read_ref {
        read.remove(&final_ref);
    }

    let base = baseline(gaps);
    let comma_gap = (thresholds.comma_gap_multiplier * median_sorted(&base)).max(thresholds.comma_gap_floor_sec);
    let mut gap_after: HashMap<usize, f64> = HashMap::new();
    for gap in gaps {
        gap_after.entry(gap.previous).or_insert(gap.seconds);
    }

    let covered = read
        .values()
        .filter(|(punctuation, hyp)| {
            let broke = phrasing.breaks.iter().any(|b| b.after_word_index == *hyp);
            let long_comma = *punctuation == Punctuation::Comma
                && gap_after.get(hyp).is_some_and(|g| *g >= comma_gap);
            broke || long_comma
        })
        .count();
    let encountered = read.len();
    let breaks_at_punctuation = phrasing.breaks.iter().filter(|b| b.at_punctuation).count();
    let total_breaks = phrasing.breaks.len();

    PunctuationAwareness {
        encountered,
        covered,
        coverage: (encountered > 0).then(|| round_to(covered as f64 / encountered as f64, 3)),
        breaks_at_punctuation,
        total_breaks,
        precision: (total_breaks > 0).then(|| round_to(breaks_at_punctuation as f64 / total_breaks as f64, 3)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaceClass {
    Consistent,
    MostlySteady,
    Variable,
    HighlyVariable,
}

impl PaceClass {
    fn from_cv(cv: f64) -> Self {
        if cv < CONSISTENT_CV {
            Self::Consistent
        } else if cv < MOSTLY_STEADY_CV {
            Self::MostlySteady
        } else if cv < VARIABLE_CV {
            Self::Variable
        } else {
            Self::HighlyVariable
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaceConsistency {
    pub phrases: usize,
    pub mean_wpm: Option<f64>,
    pub coefficient_of_variation: Option<f64>,
    pub classification: Option<PaceClass>,
    pub insufficient_sample: bool,
}

/// Coefficient of variation of words-per-minute across phrases.
pub fn analyze_pace(words: &[HypothesisWord], phrasing: &PhrasingQuality, thresholds: &DiagnosticThresholds) -> PaceConsistency {
    let mut rates = Vec::new();
    let mut start = 0;
    let mut boundaries: Vec<usize> = phrasing.breaks.iter().map(|b| b.after_word_index + 1).collect();
    boundaries.push(words.len());
    boundaries.sort_unstable();
    boundaries.dedup();
    for end in boundaries {
        if end <= start || end > words.len() {
            continue;
        }
        let phrase = &words[start..end];
        let count = phrase.iter().filter(|w| !is_filler(&w.word)).count();
        let duration = phrase[phrase.len() - 1].end_time - phrase[0].start_time;
        if count > 0 && duration > 0.0 {
            rates.push(count as f64 / duration * 60.0);
        }
        start = end;
    }

    let m = mean(&rates);
    if rates.len() < thresholds.min_pace_phrases || m <= 0.0 {
        return PaceConsistency {
            phrases: rates.len(),
            mean_wpm: (m > 0.0).then(|| round_to(m, 1)),
            coefficient_of_variation: None,
            classification: None,
            insufficient_sample: true,
        };
    }
    let cv = std_dev(&rates) / m;
    PaceConsistency {
        phrases: rates.len(),
        mean_wpm: Some(round_to(m, 1)),
        coefficient_of_variation: Some(round_to(cv, 3)),
        classification: Some(PaceClass::from_cv(cv)),
        insufficient_sample: false,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProsodyProxy {
    /// Mean pause at punctuation over mean pause mid-sentence.
    pub ratio: Option<f64>,
    pub avg_pause_at_punctuation: f64,
    pub avg_pause_mid_sentence: f64,
    pub punctuation_pauses: usize,
    pub mid_sentence_pauses: usize,
}

pub fn prosody_proxy(gaps: &[Gap], hyp_to_ref: &HashMap<usize, usize>, reference: &[RefWord]) -> ProsodyProxy {
    let mut at_punctuation = Vec::new();
    let mut mid_sentence = Vec::new();
    for gap in gaps.iter().filter(|g| g.seconds >= 0.0) {
        if punctuation_after(gap.previous, hyp_to_ref, reference).is_some() {
            at_punctuation.push(gap.seconds);
        } else {
            mid_sentence.push(gap.seconds);
        }
    }
    let punct = mean(&at_punctuation);
    let mid = mean(&mid_sentence);
    ProsodyProxy {
        ratio: (mid > 0.0).then(|| round_to(punct / mid, 2)),
        avg_pause_at_punctuation: round_to(punct, 3),
        avg_pause_mid_sentence: round_to(mid, 3),
        punctuation_pauses: at_punctuation.len(),
        mid_sentence_pauses: mid_sentence.len(),
    }
}

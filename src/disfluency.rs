use std::collections::HashSet;

use serde::Serialize;

use crate::config::DisfluencyThresholds;
use crate::text::normalize;
use crate::types::{Attempt, AttemptKind, DisfluencyMark, HypothesisWord, Severity};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DisfluencySummary {
    pub none: usize,
    pub minor: usize,
    pub moderate: usize,
    pub significant: usize,
    pub total_words_with_disfluency: usize,
}

impl DisfluencySummary {
    fn record(&mut self, severity: Severity) {
        match severity {
            Severity::None => self.none += 1,
            Severity::Minor => self.minor += 1,
            Severity::Moderate => self.moderate += 1,
            Severity::Significant => self.significant += 1,
        }
        if severity != Severity::None {
            self.total_words_with_disfluency += 1;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisfluencyOutcome {
    pub words: Vec<HypothesisWord>,
    pub summary: DisfluencySummary,
    pub fragments_removed: usize,
}

fn clean(word: &str) -> String {
    word.to_lowercase()
        .chars()
        .filter(|c| c.is_alphabetic() || *c == '\'' || *c == '-')
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Whether `fragment` can be an earlier, partial or repeated attempt at
/// `target`.
pub fn is_merge_eligible(fragment: &str, target: &str, thresholds: &DisfluencyThresholds) -> bool {
    let f = clean(fragment);
    let t = clean(target);
    let Some(first) = f.chars().next() else {
        return false;
    };
    if !t.starts_with(first) {
        return false;
    }
    let len = f.chars().count();
    if len <= thresholds.short_fragment_max_chars {
        return t.starts_with(f.as_str());
    }
    f == t || (len >= thresholds.long_prefix_min_chars && t.starts_with(f.as_str()))
}

/// Count-first severity with a duration override.
pub fn calculate_severity(
    attempts: u32,
    total_duration: f64,
    max_pause: f64,
    thresholds: &DisfluencyThresholds,
) -> Severity {
    if attempts <= 1 {
        Severity::None
    } else if attempts >= thresholds.significant_attempts
        || total_duration >= thresholds.significant_duration_sec
    {
        Severity::Significant
    } else if max_pause >= thresholds.moderate_pause_sec && attempts >= 2 {
        Severity::Moderate
    } else if attempts >= thresholds.moderate_attempts {
        Severity::Moderate
    } else if attempts == thresholds.minor_attempts {
        Severity::Minor
    } else {
        Severity::None
    }
}

/// Exact unigrams and bigrams of the passage, for fragment protection.
struct ReferenceGrams {
    unigrams: HashSet<String>,
    bigrams: HashSet<(String, String)>,
}

impl ReferenceGrams {
    fn build(reference_text: &str) -> Self {
        let words: Vec<String> = normalize(reference_text)
            .into_iter()
            .map(|t| clean(&t.text))
            .filter(|w| !w.is_empty())
            .collect();
        let bigrams = words
            .windows(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect();
        Self {
            unigrams: words.into_iter().collect(),
            bigrams,
        }
    }

    fn protects(&self, words: &[HypothesisWord], index: usize, thresholds: &DisfluencyThresholds) -> bool {
        let current = clean(&words[index].word);
        if let Some(next) = words.get(index + 1) {
            if self.bigrams.contains(&(current.clone(), clean(&next.word))) {
                return true;
            }
        }
        self.unigrams.contains(&current)
            && words[index]
                .debug
                .is_some_and(|c| c >= thresholds.unigram_protection)
    }
}

/// Contiguous index ranges separated by silences longer than the group gap.
fn partition(words: &[HypothesisWord], gap_sec: f64) -> Vec<std::ops::Range<usize>> {
    let mut groups = Vec::new();
    let mut start = 0;
    for i in 1..words.len() {
        if words[i].start_time - words[i - 1].end_time > gap_sec {
            groups.push(start..i);
            start = i;
        }
    }
    if !words.is_empty() {
        groups.push(start..words.len());
    }
    groups
}

/// Collapses stutters and false starts into the word they lead up to.
pub fn detect(
    words: Vec<HypothesisWord>,
    reference_text: &str,
    thresholds: &DisfluencyThresholds,
) -> DisfluencyOutcome {
    if words.is_empty() {
        return DisfluencyOutcome {
            words,
            summary: DisfluencySummary::default(),
            fragments_removed: 0,
        };
    }

    let grams = ReferenceGrams::build(reference_text);
    // target[i] = Some(j): word i is an earlier attempt at word j.
    let mut target: Vec<Option<usize>> = vec![None; words.len()];

    for group in partition(&words, thresholds.group_gap_sec) {
        for i in group.clone() {
            if grams.protects(&words, i, thresholds) {
                continue;
            }
            if words[i]
                .debug
                .is_some_and(|c| c >= thresholds.confidence_protection)
            {
                continue;
            }
            let horizon = (i + 1 + thresholds.max_lookahead).min(group.end);
            target[i] = (i + 1..horizon)
                .find(|&j| is_merge_eligible(&words[i].word, &words[j].word, thresholds));
        }
    }

    // Chains resolve into the last word they reach.
    let root = |mut i: usize| {
        while let Some(next) = target[i] {
            i = next;
        }
        i
    };
    let mut attempts_of: Vec<Vec<usize>> = vec![Vec::new(); words.len()];
    for i in 0..words.len() {
        if target[i].is_some() {
            attempts_of[root(i)].push(i);
        }
    }

    let fragments_removed = target.iter().filter(|t| t.is_some()).count();
    let mut summary = DisfluencySummary::default();
    let mut processed = Vec::with_capacity(words.len() - fragments_removed);

    for (i, mut word) in words.iter().cloned().enumerate() {
        if target[i].is_some() {
            continue;
        }
        let earlier = &attempts_of[i];
        if !earlier.is_empty() {
            let fragments: Vec<Attempt> = earlier
                .iter()
                .map(|&f| {
                    let w = &words[f];
                    let kind = if clean(&w.word) == clean(&word.word) {
                        AttemptKind::Repetition
                    } else {
                        AttemptKind::Fragment
                    };
                    Attempt {
                        word: w.word.clone(),
                        start_time: w.start_time,
                        end_time: w.end_time,
                        kind,
                    }
                })
                .collect();
            let mut times: Vec<(f64, f64)> = fragments
                .iter()
                .map(|a| (a.start_time, a.end_time))
                .chain(std::iter::once((word.start_time, word.end_time)))
                .collect();
            times.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
            let total_duration = round2(times[times.len() - 1].1 - times[0].0);
            let max_pause = round2(
                times
                    .windows(2)
                    .map(|pair| (pair[1].0 - pair[0].1).max(0.0))
                    .fold(0.0, f64::max),
            );
            let attempts = times.len() as u32;
            word.disfluency = Some(DisfluencyMark {
                attempts,
                severity: calculate_severity(attempts, total_duration, max_pause, thresholds),
                total_duration,
                max_pause,
                fragments,
            });
        }
        summary.record(word.severity());
        processed.push(word);
    }

    tracing::debug!(
        words = processed.len(),
        fragments_removed,
        with_disfluency = summary.total_words_with_disfluency,
        "disfluency: attempts collapsed"
    );

    DisfluencyOutcome {
        words: processed,
        summary,
        fragments_removed,
    }
}

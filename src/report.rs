use serde::Serialize;

use crate::alignment::AlignmentEntry;
use crate::diagnostics::stats::{mean, percentile_sorted, round_to, sorted};
use crate::diagnostics::{Diagnostics, EntryNotes};
use crate::disfluency::DisfluencySummary;
use crate::pipeline::runtime::Assessment;
use crate::safety::SafetyReport;
use crate::types::HypothesisWord;

pub const SCHEMA_VERSION: u32 = 1;
const OUTLIER_TOP_N: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub schema_version: u32,
    pub meta: Meta,
    pub cases: Vec<CaseReport>,
    pub aggregates: AggregateReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct Meta {
    pub generated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
    pub case_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AccuracySummary {
    pub reference_words: usize,
    pub correct: usize,
    /// Inflectional substitutions counted as correct.
    pub forgiven: usize,
    pub substitutions: usize,
    pub omissions: usize,
    pub struggles: usize,
    /// Inserted words, fillers excluded.
    pub insertions: usize,
    pub fillers: usize,
    pub accuracy_percent: Option<f64>,
}

impl AccuracySummary {
    pub fn from_entries(entries: &[AlignmentEntry], notes: &[EntryNotes]) -> Self {
        let mut summary = Self::default();
        for (index, entry) in entries.iter().enumerate() {
            if entry.reference().is_some() {
                summary.reference_words += 1;
            }
            let forgiven = notes.get(index).is_some_and(|n| n.forgiven);
            match entry {
                AlignmentEntry::Correct { .. } => summary.correct += 1,
                AlignmentEntry::Substitution { .. } if forgiven => {
                    summary.correct += 1;
                    summary.forgiven += 1;
                }
                AlignmentEntry::Substitution { .. } => summary.substitutions += 1,
                AlignmentEntry::Omission { .. } => summary.omissions += 1,
                AlignmentEntry::Struggle { .. } => summary.struggles += 1,
                AlignmentEntry::Insertion { filler: true, .. } => summary.fillers += 1,
                AlignmentEntry::Insertion { .. } => summary.insertions += 1,
            }
        }
        summary.accuracy_percent = (summary.reference_words > 0)
            .then(|| round_to(summary.correct as f64 / summary.reference_words as f64 * 100.0, 1));
        summary
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryReport {
    #[serde(flatten)]
    pub entry: AlignmentEntry,
    #[serde(flatten)]
    pub notes: EntryNotes,
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
    pub id: String,
    pub accuracy: AccuracySummary,
    pub entries: Vec<EntryReport>,
    pub words: Vec<HypothesisWord>,
    pub disfluency: DisfluencySummary,
    pub fragments_removed: usize,
    pub safety: SafetyReport,
    pub diagnostics: Diagnostics,
    pub notes: Vec<String>,
}

pub fn compute_case_report(id: &str, assessment: Assessment) -> CaseReport {
    let Assessment {
        classified,
        safety,
        disfluency,
        fragments_removed,
        alignment,
        diagnostics,
        ..
    } = assessment;

    let accuracy = AccuracySummary::from_entries(alignment.entries(), alignment.notes());
    let mut notes = Vec::new();
    if accuracy.reference_words == 0 {
        notes.push("empty reference text".to_string());
    }
    if classified.is_empty() {
        notes.push("no hypothesis words".to_string());
    }
    if safety.collapse.collapsed {
        notes.push(format!(
            "transcript collapsed: {}% of words untrusted or flagged",
            safety.collapse.percent
        ));
    }
    if diagnostics.durations.insufficient_sample {
        notes.push("too few timed words for duration outliers".to_string());
    }

    let entries = alignment
        .entries()
        .iter()
        .zip(alignment.notes())
        .map(|(entry, notes)| EntryReport {
            entry: entry.clone(),
            notes: notes.clone(),
        })
        .collect();

    CaseReport {
        id: id.to_string(),
        accuracy,
        entries,
        words: classified,
        disfluency,
        fragments_removed,
        safety,
        diagnostics,
        notes,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateReport {
    pub counts: AggregateCounts,
    pub metrics: AggregateMetrics,
    pub lowest_accuracy: Vec<OutlierEntry>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregateCounts {
    pub total: usize,
    pub collapsed: usize,
    pub with_disfluency: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregateMetrics {
    pub accuracy_percent: Option<MetricDistribution>,
    pub median_ms_per_phoneme: Option<MetricDistribution>,
    pub words_per_phrase: Option<MetricDistribution>,
    pub pace_cv: Option<MetricDistribution>,
    pub prosody_ratio: Option<MetricDistribution>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDistribution {
    pub mean: f64,
    pub p50: f64,
    pub p90: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierEntry {
    pub id: String,
    pub value: f64,
}

pub fn aggregate_reports(cases: &[CaseReport]) -> AggregateReport {
    let collect = |f: fn(&CaseReport) -> Option<f64>| cases.iter().filter_map(f).collect::<Vec<f64>>();

    let mut lowest: Vec<OutlierEntry> = cases
        .iter()
        .filter_map(|c| {
            c.accuracy.accuracy_percent.map(|value| OutlierEntry {
                id: c.id.clone(),
                value,
            })
        })
        .collect();
    lowest.sort_by(|a, b| a.value.total_cmp(&b.value).then_with(|| a.id.cmp(&b.id)));
    lowest.truncate(OUTLIER_TOP_N);

    AggregateReport {
        counts: AggregateCounts {
            total: cases.len(),
            collapsed: cases.iter().filter(|c| c.safety.collapse.collapsed).count(),
            with_disfluency: cases
                .iter()
                .filter(|c| c.disfluency.total_words_with_disfluency > 0)
                .count(),
        },
        metrics: AggregateMetrics {
            accuracy_percent: distribution_or_none(&collect(|c| c.accuracy.accuracy_percent)),
            median_ms_per_phoneme: distribution_or_none(&collect(|c| c.diagnostics.durations.median_ms_per_phoneme)),
            words_per_phrase: distribution_or_none(&collect(|c| c.diagnostics.phrasing.words_per_phrase)),
            pace_cv: distribution_or_none(&collect(|c| c.diagnostics.pace.coefficient_of_variation)),
            prosody_ratio: distribution_or_none(&collect(|c| c.diagnostics.prosody.ratio)),
        },
        lowest_accuracy: lowest,
    }
}

fn distribution_or_none(values: &[f64]) -> Option<MetricDistribution> {
    if values.is_empty() {
        return None;
    }
    let sorted = sorted(values);
    Some(MetricDistribution {
        mean: round_to(mean(&sorted), 3),
        p50: round_to(percentile_sorted(&sorted, 0.5), 3),
        p90: round_to(percentile_sorted(&sorted, 0.9), 3),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::pipeline::builder::FluencyEngineBuilder;
    use crate::types::AssessmentInput;

    fn case(id: &str, reference: &str, spoken: &[&str]) -> CaseReport {
        let engine = FluencyEngineBuilder::new(EngineConfig::default())
            .build()
            .expect("default engine");
        let words = spoken
            .iter()
            .enumerate()
            .map(|(i, w)| HypothesisWord::new(*w, i as f64 * 0.5, i as f64 * 0.5 + 0.4))
            .collect();
        let input = AssessmentInput {
            reference_text: reference.to_string(),
            words,
            audio_duration_sec: None,
        };
        compute_case_report(id, engine.assess(&input))
    }

    #[test]
    fn accuracy_counts_forgiven_inflections_as_correct() {
        let report = case("a", "the dog jumped over it", &["the", "dog", "jump", "over", "um", "it"]);
        assert_eq!(report.accuracy.reference_words, 5);
        assert_eq!(report.accuracy.forgiven, 1);
        assert_eq!(report.accuracy.correct, 5);
        assert_eq!(report.accuracy.fillers, 1);
        assert_eq!(report.accuracy.accuracy_percent, Some(100.0));
    }

    #[test]
    fn empty_case_is_noted() {
        let report = case("empty", "", &[]);
        assert_eq!(report.accuracy.accuracy_percent, None);
        assert!(report.notes.iter().any(|n| n == "empty reference text"));
    }

    #[test]
    fn aggregate_ranks_lowest_accuracy_first() {
        let cases = vec![
            case("good", "the cat sat", &["the", "cat", "sat"]),
            case("poor", "the cat sat", &["the", "dog"]),
        ];
        let aggregates = aggregate_reports(&cases);
        assert_eq!(aggregates.counts.total, 2);
        assert_eq!(aggregates.lowest_accuracy[0].id, "poor");
        assert_eq!(aggregates.lowest_accuracy[0].value, 33.3);
        let accuracy = aggregates.metrics.accuracy_percent.expect("accuracy distribution");
        assert_eq!(accuracy.p50, 66.65);
    }

    #[test]
    fn entries_serialize_with_their_notes() {
        let report = case("a", "the dog jumped", &["the", "dog", "jump"]);
        let json = serde_json::to_value(&report.entries[2]).expect("serialize entry");
        assert_eq!(json["type"], "substitution");
        assert_eq!(json["forgiven"], true);
        assert_eq!(json["inflection"], "ed");
    }
}

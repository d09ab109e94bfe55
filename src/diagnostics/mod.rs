//! Fluency diagnostics over a struggle-annotated alignment.
//!
//! Every analyzer is a pure function of the annotated alignment and the
//! timed hypothesis words it was built from.

pub mod duration;
pub mod morphology;
pub mod prosody;
pub mod self_correction;
pub(crate) mod stats;
pub mod struggle;
pub mod tiers;
pub mod timing;

use serde::Serialize;

use crate::config::DiagnosticThresholds;
use crate::pipeline::traits::{PhonemeCounter, WordTierAnnotator};
use crate::types::HypothesisWord;

pub use duration::{analyze_durations, phoneme_count, DurationAnalysis, WordDuration, WordSpeed};
pub use morphology::{detect_morphological_errors, MorphologicalError};
pub use prosody::{
    analyze_pace, analyze_phrasing, analyze_punctuation, prosody_proxy, BreakKind, PaceClass, PaceConsistency,
    PhraseBreak, PhrasingQuality, ProsodyProxy, PunctuationAwareness, ReadingPattern,
};
pub use self_correction::{detect_self_corrections, SelfCorrection, SelfCorrectionKind};
pub use struggle::{inflectional_suffix, is_near_miss, EntryNotes, FullAttempt, StruggleAnnotated};
pub use tiers::{tier_breakdown, TierBreakdown, TierCounts};
pub use timing::{detect_long_pauses, detect_onset_delays, effective_gaps, Gap, LongPause, OnsetDelay};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostics {
    pub onset_delays: Vec<OnsetDelay>,
    pub long_pauses: Vec<LongPause>,
    pub self_corrections: Vec<SelfCorrection>,
    pub morphological_errors: Vec<MorphologicalError>,
    pub phrasing: PhrasingQuality,
    pub punctuation: PunctuationAwareness,
    pub pace: PaceConsistency,
    pub prosody: ProsodyProxy,
    pub durations: DurationAnalysis,
    pub tiers: TierBreakdown,
}

/// Runs every analyzer. `words` must be the list the alignment was built
/// from, since hypothesis indices point into it.
pub fn run_diagnostics(
    annotated: &StruggleAnnotated,
    words: &[HypothesisWord],
    phonemes: &dyn PhonemeCounter,
    tiers: &dyn WordTierAnnotator,
    thresholds: &DiagnosticThresholds,
) -> Diagnostics {
    let entries = annotated.entries();
    let reference = annotated.reference();
    let hyp_to_ref = annotated.hyp_to_ref();
    let gaps = effective_gaps(words);

    let phrasing = analyze_phrasing(words, &gaps, &hyp_to_ref, reference, thresholds);
    let punctuation = analyze_punctuation(entries, &gaps, &phrasing, thresholds);
    let pace = analyze_pace(words, &phrasing, thresholds);

    let diagnostics = Diagnostics {
        onset_delays: detect_onset_delays(words, &gaps, &hyp_to_ref, reference, thresholds),
        long_pauses: detect_long_pauses(&gaps, thresholds),
        self_corrections: detect_self_corrections(words, annotated),
        morphological_errors: detect_morphological_errors(entries, annotated.notes(), thresholds),
        prosody: prosody_proxy(&gaps, &hyp_to_ref, reference),
        durations: analyze_durations(entries, words, &gaps, &hyp_to_ref, reference, phonemes, thresholds),
        tiers: tier_breakdown(entries, annotated.notes(), tiers),
        phrasing,
        punctuation,
        pace,
    };
    tracing::debug!(
        onset_delays = diagnostics.onset_delays.len(),
        long_pauses = diagnostics.long_pauses.len(),
        self_corrections = diagnostics.self_corrections.len(),
        morphological_errors = diagnostics.morphological_errors.len(),
        breaks = diagnostics.phrasing.breaks.len(),
        "diagnostics: analyzers complete"
    );
    diagnostics
}

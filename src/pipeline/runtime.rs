use crate::alignment::align_words_with;
use crate::config::EngineConfig;
use crate::confidence::{classify_words, ReferenceSet};
use crate::diagnostics::{run_diagnostics, Diagnostics, StruggleAnnotated};
use crate::disfluency::{self, DisfluencySummary};
use crate::pipeline::traits::{PhonemeCounter, SequenceAligner, WordTierAnnotator};
use crate::safety::{self, SafetyReport};
use crate::types::{AssessmentInput, HypothesisWord, TrustLevel};

/// Everything produced for one reading.
#[derive(Debug, Clone)]
pub struct Assessment {
    /// Every input word after confidence classification and safety tagging.
    pub classified: Vec<HypothesisWord>,
    /// Words the alignment was built from: ghosts removed, stutters collapsed.
    pub spoken: Vec<HypothesisWord>,
    pub safety: SafetyReport,
    pub disfluency: DisfluencySummary,
    pub fragments_removed: usize,
    pub alignment: StruggleAnnotated,
    pub diagnostics: Diagnostics,
}

/// Reusable, stateless assessment engine. Build it with
/// [`FluencyEngineBuilder`](crate::pipeline::builder::FluencyEngineBuilder).
pub struct FluencyEngine {
    config: EngineConfig,
    sequence_aligner: Box<dyn SequenceAligner>,
    phoneme_counter: Box<dyn PhonemeCounter>,
    tier_annotator: Box<dyn WordTierAnnotator>,
}

pub(crate) struct FluencyEngineParts {
    pub config: EngineConfig,
    pub sequence_aligner: Box<dyn SequenceAligner>,
    pub phoneme_counter: Box<dyn PhonemeCounter>,
    pub tier_annotator: Box<dyn WordTierAnnotator>,
}

impl FluencyEngine {
    pub(crate) fn from_parts(parts: FluencyEngineParts) -> Self {
        Self {
            config: parts.config,
            sequence_aligner: parts.sequence_aligner,
            phoneme_counter: parts.phoneme_counter,
            tier_annotator: parts.tier_annotator,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn assess(&self, input: &AssessmentInput) -> Assessment {
        let reference_set = ReferenceSet::build(&input.reference_text);
        let mut words = input.words.clone();
        classify_words(&mut words, &reference_set, &self.config.confidence);

        // Safety tags are reported alongside the reading but never steer it.
        let mut classified = words.clone();
        let safety = safety::check(
            &mut classified,
            &reference_set,
            input.audio_duration_sec,
            &self.config.safety,
        );

        let audible: Vec<HypothesisWord> = words
            .into_iter()
            .filter(|w| w.trust_level != Some(TrustLevel::Ghost))
            .collect();
        let ghosts = classified.len() - audible.len();

        let outcome = disfluency::detect(audible, &input.reference_text, &self.config.disfluency);
        let merged = align_words_with(
            &input.reference_text,
            &outcome.words,
            self.sequence_aligner.as_ref(),
            &self.config.diagnostics,
        );
        let alignment = StruggleAnnotated::annotate(merged, &outcome.words, &self.config.diagnostics);
        let diagnostics = run_diagnostics(
            &alignment,
            &outcome.words,
            self.phoneme_counter.as_ref(),
            self.tier_annotator.as_ref(),
            &self.config.diagnostics,
        );

        tracing::debug!(
            words = classified.len(),
            ghosts,
            fragments_removed = outcome.fragments_removed,
            entries = alignment.entries().len(),
            "engine: assessment complete"
        );

        Assessment {
            classified,
            spoken: outcome.words,
            safety,
            disfluency: outcome.summary,
            fragments_removed: outcome.fragments_removed,
            alignment,
            diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::AlignmentEntry;
    use crate::pipeline::builder::FluencyEngineBuilder;
    use crate::types::{Severity, Source, WordFlag};

    fn engine() -> FluencyEngine {
        FluencyEngineBuilder::new(EngineConfig::default())
            .build()
            .expect("default engine")
    }

    fn input(reference: &str, words: Vec<HypothesisWord>) -> AssessmentInput {
        AssessmentInput {
            reference_text: reference.to_string(),
            words,
            audio_duration_sec: None,
        }
    }

    #[test]
    fn engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FluencyEngine>();
    }

    #[test]
    fn ghost_words_never_reach_the_alignment() {
        let mut ghost = HypothesisWord::new("dog", 0.5, 0.8).with_source(Source::Both);
        ghost.flags.insert(WordFlag::VadGhost);
        let words = vec![
            HypothesisWord::new("the", 0.0, 0.3).with_source(Source::Both).with_confidence(0.95),
            ghost,
        ];
        let assessment = engine().assess(&input("the dog", words));
        assert_eq!(assessment.classified.len(), 2);
        assert_eq!(assessment.classified[1].trust_level, Some(TrustLevel::Ghost));
        assert_eq!(assessment.spoken.len(), 1);
        let kinds: Vec<&str> = assessment.alignment.entries().iter().map(AlignmentEntry::kind).collect();
        assert_eq!(kinds, vec!["correct", "omission"]);
    }

    #[test]
    fn stutter_collapses_before_alignment() {
        let words = vec![
            HypothesisWord::new("p", 0.0, 0.1),
            HypothesisWord::new("p", 0.2, 0.3),
            HypothesisWord::new("please", 0.4, 1.0),
        ];
        let assessment = engine().assess(&input("please", words));
        assert_eq!(assessment.fragments_removed, 2);
        assert_eq!(assessment.spoken.len(), 1);
        assert_eq!(assessment.spoken[0].attempts(), 3);
        assert_eq!(assessment.spoken[0].severity(), Severity::Moderate);
        assert_eq!(assessment.alignment.entries().len(), 1);
        assert!(assessment.alignment.entries()[0].is_correct());
    }

    #[test]
    fn empty_reading_is_empty() {
        let assessment = engine().assess(&input("", Vec::new()));
        assert!(assessment.alignment.entries().is_empty());
        assert!(assessment.classified.is_empty());
        assert!(!assessment.safety.collapse.collapsed);
    }
}

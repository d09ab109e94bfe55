use crate::config::EngineConfig;
use crate::error::FluencyError;
use crate::pipeline::defaults::{DictionaryPhonemeCounter, MyersSequenceAligner, SyllableEstimate, UnannotatedTiers};
use crate::pipeline::runtime::{FluencyEngine, FluencyEngineParts};
use crate::pipeline::traits::{PhonemeCounter, SequenceAligner, WordTierAnnotator};

pub struct FluencyEngineBuilder {
    config: EngineConfig,
    sequence_aligner: Option<Box<dyn SequenceAligner>>,
    phoneme_counter: Option<Box<dyn PhonemeCounter>>,
    tier_annotator: Option<Box<dyn WordTierAnnotator>>,
}

impl FluencyEngineBuilder {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            sequence_aligner: None,
            phoneme_counter: None,
            tier_annotator: None,
        }
    }

    pub fn with_sequence_aligner(mut self, sequence_aligner: Box<dyn SequenceAligner>) -> Self {
        self.sequence_aligner = Some(sequence_aligner);
        self
    }

    /// Overrides the dictionary named by `phoneme_dictionary_path`.
    pub fn with_phoneme_counter(mut self, phoneme_counter: Box<dyn PhonemeCounter>) -> Self {
        self.phoneme_counter = Some(phoneme_counter);
        self
    }

    pub fn with_tier_annotator(mut self, tier_annotator: Box<dyn WordTierAnnotator>) -> Self {
        self.tier_annotator = Some(tier_annotator);
        self
    }

    pub fn build(self) -> Result<FluencyEngine, FluencyError> {
        self.config.validate()?;

        let phoneme_counter: Box<dyn PhonemeCounter> = match (self.phoneme_counter, &self.config.phoneme_dictionary_path) {
            (Some(counter), _) => counter,
            (None, Some(path)) => Box::new(DictionaryPhonemeCounter::load(path)?),
            (None, None) => Box::new(SyllableEstimate),
        };

        Ok(FluencyEngine::from_parts(FluencyEngineParts {
            config: self.config,
            sequence_aligner: self
                .sequence_aligner
                .unwrap_or_else(|| Box::new(MyersSequenceAligner)),
            phoneme_counter,
            tier_annotator: self
                .tier_annotator
                .unwrap_or_else(|| Box::new(UnannotatedTiers)),
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::alignment::EditOp;
    use crate::types::{AssessmentInput, HypothesisWord};

    /// Reports every position as an edit, so equal words pair up as
    /// substitutions.
    struct NeverMatches;

    impl SequenceAligner for NeverMatches {
        fn edit_script(&self, reference: &[u32], hypothesis: &[u32]) -> Vec<EditOp> {
            let mut ops = vec![EditOp::Delete; reference.len()];
            ops.extend(std::iter::repeat(EditOp::Insert).take(hypothesis.len()));
            ops
        }
    }

    #[test]
    fn build_with_defaults() {
        let engine = FluencyEngineBuilder::new(EngineConfig::default()).build();
        assert!(engine.is_ok());
    }

    #[test]
    fn build_rejects_inverted_confidence_thresholds() {
        let mut config = EngineConfig::default();
        config.confidence.medium = 0.9;
        config.confidence.high = 0.7;
        let result = FluencyEngineBuilder::new(config).build();
        assert!(matches!(result, Err(FluencyError::InvalidInput { .. })));
    }

    #[test]
    fn build_fails_on_missing_dictionary() {
        let config = EngineConfig {
            phoneme_dictionary_path: Some(PathBuf::from("/nonexistent/phonemes.json")),
            ..EngineConfig::default()
        };
        let result = FluencyEngineBuilder::new(config).build();
        assert!(matches!(result, Err(FluencyError::Io { .. })));
    }

    #[test]
    fn explicit_counter_wins_over_dictionary_path() {
        let config = EngineConfig {
            phoneme_dictionary_path: Some(PathBuf::from("/nonexistent/phonemes.json")),
            ..EngineConfig::default()
        };
        let result = FluencyEngineBuilder::new(config)
            .with_phoneme_counter(Box::new(SyllableEstimate))
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn custom_sequence_aligner_is_used() {
        let engine = FluencyEngineBuilder::new(EngineConfig::default())
            .with_sequence_aligner(Box::new(NeverMatches))
            .build()
            .expect("engine builds");
        let input = AssessmentInput {
            reference_text: "cat".to_string(),
            words: vec![HypothesisWord::new("cat", 0.0, 0.4)],
            audio_duration_sec: None,
        };
        let assessment = engine.assess(&input);
        let kinds: Vec<&str> = assessment.alignment.entries().iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec!["substitution"]);
    }
}

use std::collections::HashMap;
use std::path::Path;

use crate::alignment::diff::shortest_edit_script;
use crate::alignment::EditOp;
use crate::error::FluencyError;
use crate::pipeline::traits::{PhonemeCounter, SequenceAligner, WordTierAnnotator};
use crate::types::WordTier;

pub struct MyersSequenceAligner;

impl SequenceAligner for MyersSequenceAligner {
    fn edit_script(&self, reference: &[u32], hypothesis: &[u32]) -> Vec<EditOp> {
        shortest_edit_script(reference, hypothesis)
    }
}

/// Knows no words; every phoneme count comes from the syllable estimate.
pub struct SyllableEstimate;

impl PhonemeCounter for SyllableEstimate {
    fn lookup(&self, _word: &str) -> Option<u32> {
        None
    }
}

/// Phoneme counts from a JSON `{ "word": count }` dictionary.
#[derive(Debug, Clone, Default)]
pub struct DictionaryPhonemeCounter {
    counts: HashMap<String, u32>,
}

impl DictionaryPhonemeCounter {
    pub fn from_map(counts: HashMap<String, u32>) -> Self {
        Self {
            counts: counts
                .into_iter()
                .map(|(word, count)| (word.to_lowercase(), count))
                .collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, FluencyError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| FluencyError::io("read phoneme dictionary", e))?;
        let raw: HashMap<String, serde_json::Value> = serde_json::from_str(&data)
            .map_err(|e| FluencyError::json("parse phoneme dictionary", e))?;

        let mut counts = HashMap::with_capacity(raw.len());
        let mut skipped = 0usize;
        for (word, value) in raw {
            match value.as_u64().and_then(|n| u32::try_from(n).ok()) {
                Some(count) if count > 0 => {
                    counts.insert(word, count);
                }
                _ => skipped += 1,
            }
        }
        if skipped > 0 {
            tracing::warn!(skipped, path = %path.display(), "phoneme dictionary: unreadable entries ignored");
        }
        tracing::debug!(entries = counts.len(), "phoneme dictionary: loaded");
        Ok(Self::from_map(counts))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl PhonemeCounter for DictionaryPhonemeCounter {
    fn lookup(&self, word: &str) -> Option<u32> {
        self.counts.get(&word.to_lowercase()).copied()
    }
}

pub struct UnannotatedTiers;

impl WordTierAnnotator for UnannotatedTiers {
    fn tier(&self, _reference_index: usize, _word: &str) -> Option<WordTier> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn myers_sequence_aligner_edit_script() {
        let aligner = MyersSequenceAligner;
        let reference = [1, 2, 3];
        let hypothesis = [1, 4, 3];
        assert_eq!(
            aligner.edit_script(&reference, &hypothesis),
            shortest_edit_script(&reference, &hypothesis)
        );
    }

    #[test]
    fn syllable_estimate_knows_no_words() {
        assert_eq!(SyllableEstimate.lookup("elephant"), None);
    }

    #[test]
    fn dictionary_lookup_is_case_insensitive() {
        let counter = DictionaryPhonemeCounter::from_map(HashMap::from([("Cat".to_string(), 3)]));
        assert_eq!(counter.lookup("cat"), Some(3));
        assert_eq!(counter.lookup("CAT"), Some(3));
        assert_eq!(counter.lookup("dog"), None);
    }

    #[test]
    fn dictionary_load_skips_unreadable_entries() {
        let path = std::env::temp_dir().join("orf_fluency_phoneme_dictionary.json");
        std::fs::write(&path, r#"{"cat": 3, "dog": "three", "bird": 0, "elephant": 7}"#)
            .expect("write dictionary");
        let counter = DictionaryPhonemeCounter::load(&path).expect("load dictionary");
        assert_eq!(counter.len(), 2);
        assert_eq!(counter.lookup("elephant"), Some(7));
        assert_eq!(counter.lookup("dog"), None);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn dictionary_load_fails_on_missing_file() {
        let result = DictionaryPhonemeCounter::load(Path::new("/nonexistent/phonemes.json"));
        assert!(matches!(result, Err(FluencyError::Io { .. })));
    }

    #[test]
    fn unannotated_tiers_returns_none() {
        assert_eq!(UnannotatedTiers.tier(0, "the"), None);
    }
}

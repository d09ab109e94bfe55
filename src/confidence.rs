use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use crate::config::ConfidenceThresholds;
use crate::text::{all_equivalents, canonical_form, normalize};
use crate::types::{HypothesisWord, Source, TrustLevel, WordFlag};

/// Every surface form a passage word may legitimately be heard as.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSet {
    forms: HashSet<String>,
}

fn strip_word(word: &str) -> String {
    word.to_lowercase()
        .trim_matches(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '-'))
        .to_string()
}

impl ReferenceSet {
    pub fn build(reference_text: &str) -> Self {
        let mut forms = HashSet::new();
        let raw = reference_text.split_whitespace().map(strip_word);
        let tokens = normalize(reference_text).into_iter().map(|t| t.text);
        for word in raw.chain(tokens) {
            if word.is_empty() {
                continue;
            }
            forms.insert(canonical_form(&word));
            for form in all_equivalents(&word) {
                if form.contains('\'') {
                    forms.insert(form.replace('\'', ""));
                }
                forms.insert(form);
            }
            if word.contains('-') {
                forms.insert(word.replace('-', ""));
                forms.extend(
                    word.split('-')
                        .filter(|p| !p.is_empty())
                        .map(str::to_string),
                );
            }
            forms.insert(word);
        }
        Self { forms }
    }

    pub fn contains(&self, word: &str) -> bool {
        let w = strip_word(word);
        if w.is_empty() {
            return false;
        }
        self.forms.contains(&w)
            || self.forms.contains(&canonical_form(&w))
            || (w.contains('\'') && self.forms.contains(&w.replace('\'', "")))
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub confidence: Option<f64>,
    pub trust_level: TrustLevel,
    pub flags: BTreeSet<WordFlag>,
}

/// Maps a numeric confidence onto the trust ladder; both bounds inclusive.
pub fn trust_from_confidence(confidence: f64, thresholds: &ConfidenceThresholds) -> TrustLevel {
    if confidence >= thresholds.high {
        TrustLevel::High
    } else if confidence >= thresholds.medium {
        TrustLevel::Medium
    } else {
        TrustLevel::Low
    }
}

/// Applies the multi-engine trust policy to one word.
pub fn classify(
    word: &HypothesisWord,
    reference: &ReferenceSet,
    thresholds: &ConfidenceThresholds,
) -> Classification {
    let mut flags = word.flags.clone();

    if flags.contains(&WordFlag::VadGhost) {
        return Classification {
            confidence: Some(0.0),
            trust_level: TrustLevel::Ghost,
            flags,
        };
    }

    let (confidence, trust_level) = match word.effective_source() {
        Source::Both => (
            word.confidence,
            word.confidence
                .map_or(TrustLevel::Unknown, |c| trust_from_confidence(c, thresholds)),
        ),
        Source::LatestOnly => {
            if reference.contains(&word.word) {
                let c = thresholds.valid_mumble;
                (Some(c), trust_from_confidence(c, thresholds))
            } else {
                flags.insert(WordFlag::PossibleInsertion);
                let c = thresholds.hallucination_risk;
                (Some(c), trust_from_confidence(c, thresholds))
            }
        }
        Source::DefaultOnly => {
            if reference.contains(&word.word) {
                let trust = word.confidence.map_or(TrustLevel::Unknown, |c| {
                    trust_from_confidence(c, thresholds).min(TrustLevel::Medium)
                });
                (word.confidence, trust)
            } else {
                flags.insert(WordFlag::DefaultOnlyNotInRef);
                (word.confidence, TrustLevel::Low)
            }
        }
    };

    Classification {
        confidence,
        trust_level,
        flags,
    }
}

/// Classifies every word in place.
pub fn classify_words(
    words: &mut [HypothesisWord],
    reference: &ReferenceSet,
    thresholds: &ConfidenceThresholds,
) {
    for word in words.iter_mut() {
        let result = classify(word, reference, thresholds);
        word.confidence = result.confidence;
        word.trust_level = Some(result.trust_level);
        word.flags = result.flags;
    }
    tracing::debug!(
        words = words.len(),
        ghosts = words
            .iter()
            .filter(|w| w.trust_level == Some(TrustLevel::Ghost))
            .count(),
        low = words
            .iter()
            .filter(|w| w.trust_level == Some(TrustLevel::Low))
            .count(),
        "confidence: words classified"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, confidence: Option<f64>, source: Option<Source>) -> HypothesisWord {
        let mut w = HypothesisWord::new(text, 0.0, 0.3);
        w.confidence = confidence;
        w.source = source;
        w
    }

    fn thresholds() -> ConfidenceThresholds {
        ConfidenceThresholds::default()
    }

    #[test]
    fn reference_set_expands_equivalents_and_hyphens() {
        let set = ReferenceSet::build("The well-known dog won two prizes, you'll see.");
        assert!(set.contains("dog"));
        assert!(set.contains("Prizes"));
        assert!(set.contains("wellknown"));
        assert!(set.contains("known"));
        assert!(set.contains("1"));
        assert!(set.contains("one"));
        assert!(set.contains("2"));
        assert!(set.contains("you will"));
        assert!(set.contains("youll"));
        assert!(!set.contains("cat"));
        assert!(!set.contains("..."));
    }

    #[test]
    fn default_only_in_reference_is_capped_at_medium() {
        let set = ReferenceSet::build("the cat sat");
        let result = classify(
            &word("cat", Some(0.95), Some(Source::DefaultOnly)),
            &set,
            &thresholds(),
        );
        assert_eq!(result.trust_level, TrustLevel::Medium);
        assert_eq!(result.confidence, Some(0.95));
        assert!(result.flags.is_empty());
    }

    #[test]
    fn default_only_outside_reference_is_forced_low() {
        let set = ReferenceSet::build("the cat sat");
        let result = classify(
            &word("zebra", Some(0.99), Some(Source::DefaultOnly)),
            &set,
            &thresholds(),
        );
        assert_eq!(result.trust_level, TrustLevel::Low);
        assert!(result.flags.contains(&WordFlag::DefaultOnlyNotInRef));
    }

    #[test]
    fn latest_only_depends_on_reference_membership() {
        let set = ReferenceSet::build("the cat sat");
        let found = classify(&word("sat", None, Some(Source::LatestOnly)), &set, &thresholds());
        assert_eq!(found.confidence, Some(ConfidenceThresholds::VALID_MUMBLE));
        assert_eq!(found.trust_level, TrustLevel::Medium);

        let missing = classify(&word("mat", Some(0.99), Some(Source::LatestOnly)), &set, &thresholds());
        assert_eq!(missing.confidence, Some(ConfidenceThresholds::HALLUCINATION_RISK));
        assert_eq!(missing.trust_level, TrustLevel::Low);
        assert!(missing.flags.contains(&WordFlag::PossibleInsertion));
    }

    #[test]
    fn ghost_flag_overrides_everything() {
        let set = ReferenceSet::build("the cat sat");
        let mut w = word("cat", Some(0.99), Some(Source::Both));
        w.flags.insert(WordFlag::VadGhost);
        let result = classify(&w, &set, &thresholds());
        assert_eq!(result.trust_level, TrustLevel::Ghost);
        assert_eq!(result.confidence, Some(0.0));
    }

    #[test]
    fn missing_confidence_and_source() {
        let set = ReferenceSet::build("the cat sat");
        let result = classify(&word("cat", None, None), &set, &thresholds());
        assert_eq!(result.trust_level, TrustLevel::Unknown);
        let result = classify(&word("cat", Some(0.8), None), &set, &thresholds());
        assert_eq!(result.trust_level, TrustLevel::Medium);
    }

    #[test]
    fn both_source_trust_is_monotonic_with_inclusive_bounds() {
        let t = thresholds();
        assert_eq!(trust_from_confidence(0.93, &t), TrustLevel::High);
        assert_eq!(trust_from_confidence(0.9299, &t), TrustLevel::Medium);
        assert_eq!(trust_from_confidence(0.70, &t), TrustLevel::Medium);
        assert_eq!(trust_from_confidence(0.6999, &t), TrustLevel::Low);

        let set = ReferenceSet::default();
        let mut previous = TrustLevel::Ghost;
        for step in 0..=100 {
            let c = f64::from(step) / 100.0;
            let level = classify(&word("x", Some(c), Some(Source::Both)), &set, &t).trust_level;
            assert!(level >= previous, "trust dropped at confidence {c}");
            previous = level;
        }
    }

    #[test]
    fn classify_words_writes_back_in_place() {
        let set = ReferenceSet::build("the cat");
        let mut words = vec![
            word("the", Some(0.97), Some(Source::Both)),
            word("dog", None, Some(Source::LatestOnly)),
        ];
        classify_words(&mut words, &set, &thresholds());
        assert_eq!(words[0].trust_level, Some(TrustLevel::High));
        assert_eq!(words[1].trust_level, Some(TrustLevel::Low));
        assert!(words[1].flags.contains(&WordFlag::PossibleInsertion));
    }
}

use std::collections::BTreeMap;

use serde::Serialize;

use super::struggle::EntryNotes;
use crate::alignment::AlignmentEntry;
use crate::pipeline::traits::WordTierAnnotator;
use crate::types::WordTier;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierCounts {
    pub correct: usize,
    pub errors: usize,
}

/// Correct and error counts per word tier. Insertions carry no passage word
/// and are not counted; unannotated words fall back to the function tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TierBreakdown(pub BTreeMap<WordTier, TierCounts>);

impl TierBreakdown {
    pub fn get(&self, tier: WordTier) -> TierCounts {
        self.0.get(&tier).copied().unwrap_or_default()
    }
}

pub fn tier_breakdown(
    entries: &[AlignmentEntry],
    notes: &[EntryNotes],
    annotator: &dyn WordTierAnnotator,
) -> TierBreakdown {
    let mut counts: BTreeMap<WordTier, TierCounts> = WordTier::ALL.iter().map(|t| (*t, TierCounts::default())).collect();
    for (index, entry) in entries.iter().enumerate() {
        let Some(reference) = entry.reference() else {
            continue;
        };
        let tier = annotator.tier(reference.index, &reference.text).unwrap_or_default();
        let slot = counts.entry(tier).or_default();
        if entry.is_correct() || notes.get(index).is_some_and(|n| n.forgiven) {
            slot.correct += 1;
        } else {
            slot.errors += 1;
        }
    }
    TierBreakdown(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::align_words;
    use crate::pipeline::defaults::UnannotatedTiers;
    use crate::types::HypothesisWord;

    struct Capitalized;

    impl WordTierAnnotator for Capitalized {
        fn tier(&self, _reference_index: usize, word: &str) -> Option<WordTier> {
            (word == "sam").then_some(WordTier::Proper)
        }
    }

    fn entries(reference: &str, texts: &[&str]) -> Vec<AlignmentEntry> {
        let words: Vec<HypothesisWord> = texts
            .iter()
            .enumerate()
            .map(|(i, w)| HypothesisWord::new(*w, i as f64, i as f64 + 0.5))
            .collect();
        align_words(reference, &words).into_parts().1
    }

    #[test]
    fn unannotated_words_count_as_function() {
        let entries = entries("sam ran home", &["sam", "run", "home", "fast"]);
        let notes = vec![EntryNotes::default(); entries.len()];
        let breakdown = tier_breakdown(&entries, &notes, &UnannotatedTiers);
        assert_eq!(breakdown.get(WordTier::Function), TierCounts { correct: 2, errors: 1 });
        assert_eq!(breakdown.get(WordTier::Sight), TierCounts::default());
    }

    #[test]
    fn annotator_assigns_tiers_and_forgiveness_counts_correct() {
        let entries = entries("sam jumped home", &["sam", "jump", "home"]);
        let mut notes = vec![EntryNotes::default(); entries.len()];
        notes[1].forgiven = true;
        let breakdown = tier_breakdown(&entries, &notes, &Capitalized);
        assert_eq!(breakdown.get(WordTier::Proper), TierCounts { correct: 1, errors: 0 });
        assert_eq!(breakdown.get(WordTier::Function), TierCounts { correct: 2, errors: 0 });
    }
}

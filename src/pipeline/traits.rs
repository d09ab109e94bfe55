use crate::alignment::EditOp;
use crate::types::WordTier;

/// Computes a minimal edit script between two interned word sequences.
pub trait SequenceAligner: Send + Sync {
    fn edit_script(&self, reference: &[u32], hypothesis: &[u32]) -> Vec<EditOp>;
}

/// Phoneme count for a word, or `None` when the word is unknown and the
/// syllable estimate should be used instead.
pub trait PhonemeCounter: Send + Sync {
    fn lookup(&self, word: &str) -> Option<u32>;
}

/// Lexical tier of a passage word. `None` falls back to the function tier.
pub trait WordTierAnnotator: Send + Sync {
    fn tier(&self, reference_index: usize, word: &str) -> Option<WordTier>;
}

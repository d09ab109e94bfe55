use std::collections::HashMap;

use serde::Serialize;

use crate::config::DiagnosticThresholds;
use crate::pipeline::defaults::MyersSequenceAligner;
use crate::pipeline::traits::SequenceAligner;
use crate::text::{comparison_key, is_filler, normalize, Punctuation};
use crate::types::HypothesisWord;

pub mod diff;
mod merge;

pub use diff::EditOp;

/// Normalized passage word, identified by its position in the passage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefWord {
    pub index: usize,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub punctuation: Option<Punctuation>,
}

/// Normalized hypothesis token. `index` points back into the word list the
/// alignment was built from; a hyphenated word yields several tokens sharing
/// one index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HypToken {
    pub index: usize,
    pub text: String,
}

/// How a `correct` entry spanning more than one token was recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeKind {
    /// ASR split one reference word ("hot" + "dog" for "hotdog").
    Compound,
    /// Abbreviation read as its expansion ("that is" for "ie").
    Abbreviation,
    /// Digits read as words ("twenty fourteen" for "2014").
    Number,
    /// Two reference words spoken or transcribed as one ("you'll").
    Contraction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StrugglePath {
    Hesitation,
    Decoding,
    Abandoned,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AlignmentEntry {
    Correct {
        reference: RefWord,
        hyp: Vec<HypToken>,
        #[serde(skip_serializing_if = "Option::is_none")]
        merge: Option<MergeKind>,
    },
    Substitution {
        reference: RefWord,
        hyp: HypToken,
    },
    Omission {
        reference: RefWord,
    },
    Insertion {
        hyp: HypToken,
        filler: bool,
    },
    Struggle {
        reference: RefWord,
        hyp: HypToken,
        paths: Vec<StrugglePath>,
    },
}

impl AlignmentEntry {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Correct { .. } => "correct",
            Self::Substitution { .. } => "substitution",
            Self::Omission { .. } => "omission",
            Self::Insertion { .. } => "insertion",
            Self::Struggle { .. } => "struggle",
        }
    }

    pub fn reference(&self) -> Option<&RefWord> {
        match self {
            Self::Correct { reference, .. }
            | Self::Substitution { reference, .. }
            | Self::Omission { reference }
            | Self::Struggle { reference, .. } => Some(reference),
            Self::Insertion { .. } => None,
        }
    }

    pub fn hyp_tokens(&self) -> &[HypToken] {
        match self {
            Self::Correct { hyp, .. } => hyp,
            Self::Substitution { hyp, .. }
            | Self::Insertion { hyp, .. }
            | Self::Struggle { hyp, .. } => std::slice::from_ref(hyp),
            Self::Omission { .. } => &[],
        }
    }

    pub fn first_hyp_index(&self) -> Option<usize> {
        self.hyp_tokens().first().map(|t| t.index)
    }

    pub fn last_hyp_index(&self) -> Option<usize> {
        self.hyp_tokens().last().map(|t| t.index)
    }

    /// Spoken text of the entry, parts joined without separators for
    /// compounds and with spaces for expansions.
    pub fn hyp_text(&self) -> Option<String> {
        let tokens = self.hyp_tokens();
        if tokens.is_empty() {
            return None;
        }
        let sep = match self {
            Self::Correct {
                merge: Some(MergeKind::Abbreviation | MergeKind::Number),
                ..
            } => " ",
            _ => "",
        };
        let mut text = String::new();
        let mut last_index = None;
        for token in tokens {
            // Tokens of one hyphenated word were already joined by the speaker.
            if !text.is_empty() && last_index != Some(token.index) {
                text.push_str(sep);
            }
            text.push_str(&token.text);
            last_index = Some(token.index);
        }
        Some(text)
    }

    pub fn is_compound(&self) -> bool {
        matches!(self, Self::Correct { merge: Some(_), .. })
    }

    /// Hypothesis fragments of a merged entry; empty for single-token entries.
    pub fn parts(&self) -> Vec<&str> {
        match self {
            Self::Correct { hyp, merge: Some(kind), .. } if *kind != MergeKind::Contraction => {
                hyp.iter().map(|t| t.text.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn is_correct(&self) -> bool {
        matches!(self, Self::Correct { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::Substitution { .. } | Self::Omission { .. } | Self::Struggle { .. }
        )
    }

    pub fn is_substitution_like(&self) -> bool {
        matches!(self, Self::Substitution { .. } | Self::Struggle { .. })
    }

    pub fn is_filler(&self) -> bool {
        matches!(self, Self::Insertion { filler: true, .. })
    }
}

pub fn tokenize_reference(reference_text: &str) -> Vec<RefWord> {
    normalize(reference_text)
        .into_iter()
        .enumerate()
        .map(|(index, token)| RefWord {
            index,
            text: token.text,
            punctuation: token.punctuation,
        })
        .collect()
}

/// Splits hypothesis words into spoken tokens and filler tokens.
pub fn tokenize_hypothesis(words: &[HypothesisWord]) -> (Vec<HypToken>, Vec<HypToken>) {
    let mut spoken = Vec::new();
    let mut fillers = Vec::new();
    for (index, word) in words.iter().enumerate() {
        let tokens = normalize(&word.word);
        if tokens.is_empty() {
            continue;
        }
        if is_filler(&word.word) {
            let text = tokens
                .iter()
                .map(|t| t.text.as_str())
                .collect::<Vec<_>>()
                .join("-");
            fillers.push(HypToken { index, text });
            continue;
        }
        for token in tokens {
            let hyp = HypToken {
                index,
                text: token.text,
            };
            if is_filler(&hyp.text) {
                fillers.push(hyp);
            } else {
                spoken.push(hyp);
            }
        }
    }
    (spoken, fillers)
}

/// Base alignment straight out of the edit script, before any merge pass.
#[derive(Debug, Clone)]
pub struct RawAlignment {
    reference: Vec<RefWord>,
    entries: Vec<AlignmentEntry>,
    fillers: Vec<HypToken>,
}

impl RawAlignment {
    pub fn build(
        reference: Vec<RefWord>,
        hypothesis: Vec<HypToken>,
        fillers: Vec<HypToken>,
        aligner: &dyn SequenceAligner,
    ) -> Self {
        if reference.is_empty() && hypothesis.is_empty() {
            return Self {
                reference,
                entries: Vec::new(),
                fillers,
            };
        }

        let mut symbols: HashMap<String, u32> = HashMap::new();
        let mut intern = |text: &str| {
            let next = symbols.len() as u32;
            *symbols.entry(comparison_key(text)).or_insert(next)
        };
        let ref_symbols: Vec<u32> = reference.iter().map(|w| intern(&w.text)).collect();
        let hyp_symbols: Vec<u32> = hypothesis.iter().map(|t| intern(&t.text)).collect();

        let ops = aligner.edit_script(&ref_symbols, &hyp_symbols);
        let entries = decode(&ops, &reference, &hypothesis);
        tracing::debug!(
            reference_words = reference.len(),
            hypothesis_tokens = hypothesis.len(),
            symbols = symbols.len(),
            entries = entries.len(),
            "alignment: base edit script decoded"
        );

        Self {
            reference,
            entries,
            fillers,
        }
    }

    pub fn entries(&self) -> &[AlignmentEntry] {
        &self.entries
    }

    /// Runs every merge pass in order and re-inserts filler tokens.
    /// `thresholds` decide what counts as a near miss when spillover
    /// fragments are handed back to the word they were split from.
    pub fn merge(self, thresholds: &DiagnosticThresholds) -> MergedAlignment {
        let before = self.entries.len();
        let entries = merge::compound_words(self.entries);
        let entries = merge::abbreviation_expansions(entries);
        let entries = merge::number_expansions(entries);
        let entries = merge::contractions(entries);
        let entries = merge::spillover_fragments(entries, thresholds);
        let entries = merge::reinject_fillers(entries, self.fillers);
        tracing::debug!(
            before,
            after = entries.len(),
            merged = entries.iter().filter(|e| e.is_compound()).count(),
            "alignment: merge passes applied"
        );
        MergedAlignment {
            reference: self.reference,
            entries,
        }
    }
}

fn decode(ops: &[EditOp], reference: &[RefWord], hypothesis: &[HypToken]) -> Vec<AlignmentEntry> {
    let mut entries = Vec::with_capacity(reference.len().max(hypothesis.len()));
    let mut ri = 0;
    let mut hi = 0;
    let mut deleted: Vec<&RefWord> = Vec::new();
    let mut inserted: Vec<&HypToken> = Vec::new();

    for op in ops {
        match op {
            EditOp::Equal => {
                flush_hunk(&mut deleted, &mut inserted, &mut entries);
                if let (Some(r), Some(h)) = (reference.get(ri), hypothesis.get(hi)) {
                    entries.push(AlignmentEntry::Correct {
                        reference: r.clone(),
                        hyp: vec![h.clone()],
                        merge: None,
                    });
                }
                ri += 1;
                hi += 1;
            }
            EditOp::Delete => {
                if let Some(r) = reference.get(ri) {
                    deleted.push(r);
                }
                ri += 1;
            }
            EditOp::Insert => {
                if let Some(h) = hypothesis.get(hi) {
                    inserted.push(h);
                }
                hi += 1;
            }
        }
    }
    flush_hunk(&mut deleted, &mut inserted, &mut entries);
    entries
}

/// A run of non-equal edits: paired positions become substitutions, the
/// excess on either side omissions or insertions.
fn flush_hunk(
    deleted: &mut Vec<&RefWord>,
    inserted: &mut Vec<&HypToken>,
    entries: &mut Vec<AlignmentEntry>,
) {
    let paired = deleted.len().min(inserted.len());
    for (r, h) in deleted.iter().zip(inserted.iter()) {
        entries.push(AlignmentEntry::Substitution {
            reference: (*r).clone(),
            hyp: (*h).clone(),
        });
    }
    for r in deleted.iter().skip(paired) {
        entries.push(AlignmentEntry::Omission {
            reference: (*r).clone(),
        });
    }
    for h in inserted.iter().skip(paired) {
        entries.push(AlignmentEntry::Insertion {
            hyp: (*h).clone(),
            filler: false,
        });
    }
    deleted.clear();
    inserted.clear();
}

/// Alignment after compound, abbreviation, number and contraction merges and
/// spillover consolidation.
#[derive(Debug, Clone)]
pub struct MergedAlignment {
    reference: Vec<RefWord>,
    entries: Vec<AlignmentEntry>,
}

impl MergedAlignment {
    pub fn reference(&self) -> &[RefWord] {
        &self.reference
    }

    pub fn entries(&self) -> &[AlignmentEntry] {
        &self.entries
    }

    pub fn into_parts(self) -> (Vec<RefWord>, Vec<AlignmentEntry>) {
        (self.reference, self.entries)
    }
}

pub fn align_words(reference_text: &str, words: &[HypothesisWord]) -> MergedAlignment {
    align_words_with(
        reference_text,
        words,
        &MyersSequenceAligner,
        &DiagnosticThresholds::default(),
    )
}

pub fn align_words_with(
    reference_text: &str,
    words: &[HypothesisWord],
    aligner: &dyn SequenceAligner,
    thresholds: &DiagnosticThresholds,
) -> MergedAlignment {
    let reference = tokenize_reference(reference_text);
    let (spoken, fillers) = tokenize_hypothesis(words);
    RawAlignment::build(reference, spoken, fillers, aligner).merge(thresholds)
}

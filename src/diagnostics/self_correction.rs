use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::struggle::StruggleAnnotated;
use crate::alignment::{AlignmentEntry, RefWord};
use crate::text::comparison_key;
use crate::types::HypothesisWord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelfCorrectionKind {
    PhraseRepeat,
    WordRepeat,
    /// False start that was followed by the correct word.
    NearMiss,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelfCorrection {
    pub kind: SelfCorrectionKind,
    pub start_index: usize,
    pub words: String,
    pub count: usize,
}

/// Repeats that are legitimate because the passage itself repeats at those
/// positions.
fn repeats_in_reference(
    pairs: &[(usize, usize)],
    hyp_to_ref: &HashMap<usize, usize>,
    reference: &[RefWord],
) -> bool {
    pairs.iter().all(|&(a, b)| {
        match (hyp_to_ref.get(&a), hyp_to_ref.get(&b)) {
            (Some(&ra), Some(&rb)) => {
                rb > ra
                    && reference
                        .get(ra)
                        .zip(reference.get(rb))
                        .is_some_and(|(x, y)| comparison_key(&x.text) == comparison_key(&y.text))
            }
            _ => false,
        }
    })
}

/// Immediately repeated two-word phrases first, then single-word repeats
/// with their run length, then near-miss false starts.
pub fn detect_self_corrections(words: &[HypothesisWord], annotated: &StruggleAnnotated) -> Vec<SelfCorrection> {
    let hyp_to_ref = annotated.hyp_to_ref();
    let reference = annotated.reference();
    let keys: Vec<String> = words.iter().map(|w| comparison_key(&w.word)).collect();
    let mut used: HashSet<usize> = HashSet::new();
    let mut out = Vec::new();

    for i in 0..keys.len().saturating_sub(3) {
        if used.contains(&i) || keys[i].is_empty() {
            continue;
        }
        if keys[i] == keys[i + 2] && keys[i + 1] == keys[i + 3] {
            if repeats_in_reference(&[(i, i + 2), (i + 1, i + 3)], &hyp_to_ref, reference) {
                continue;
            }
            out.push(SelfCorrection {
                kind: SelfCorrectionKind::PhraseRepeat,
                start_index: i,
                words: format!("{} {}", keys[i], keys[i + 1]),
                count: 2,
            });
            used.extend(i..i + 4);
        }
    }

    let mut i = 0;
    while i + 1 < keys.len() {
        if used.contains(&i) || keys[i].is_empty() || keys[i] != keys[i + 1] {
            i += 1;
            continue;
        }
        if repeats_in_reference(&[(i, i + 1)], &hyp_to_ref, reference) {
            i += 1;
            continue;
        }
        let mut j = i + 1;
        while j < keys.len() && keys[j] == keys[i] && !used.contains(&j) {
            j += 1;
        }
        out.push(SelfCorrection {
            kind: SelfCorrectionKind::WordRepeat,
            start_index: i,
            words: keys[i].clone(),
            count: j - i,
        });
        used.extend(i..j);
        i = j;
    }

    for (entry, note) in annotated.entries().iter().zip(annotated.notes()) {
        if let AlignmentEntry::Insertion { hyp, .. } = entry {
            if note.self_correction {
                out.push(SelfCorrection {
                    kind: SelfCorrectionKind::NearMiss,
                    start_index: hyp.index,
                    words: hyp.text.clone(),
                    count: 1,
                });
            }
        }
    }

    out.sort_by_key(|c| c.start_index);
    out
}

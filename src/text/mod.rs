//! Word-level text handling shared by every stage: tokenization, equivalence
//! classes, spoken number forms and syllable estimates.

pub mod equivalence;
pub mod normalize;
pub mod number_words;
pub mod syllables;

pub use equivalence::{all_equivalents, canonical_form, comparison_key};
pub use normalize::{is_filler, normalize, Punctuation, Token};
pub use number_words::{decimal_to_word_forms, number_to_word_forms};
pub use syllables::count_syllables;

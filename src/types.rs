use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};

/// Which ASR engine(s) produced a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Both,
    LatestOnly,
    DefaultOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossValidation {
    Confirmed,
    Disagreed,
    Unconfirmed,
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustLevel {
    Ghost,
    /// No usable confidence was available for the word.
    #[serde(rename = "none")]
    Unknown,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordFlag {
    VadGhost,
    PossibleInsertion,
    DefaultOnlyNotInRef,
    RateAnomaly,
    UncorroboratedSequence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    None,
    Minor,
    Moderate,
    Significant,
}

/// Lexical class of a passage word, as supplied by an external annotator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordTier {
    Sight,
    Academic,
    Proper,
    #[default]
    Function,
}

impl WordTier {
    pub const ALL: [WordTier; 4] = [Self::Sight, Self::Academic, Self::Proper, Self::Function];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptKind {
    Fragment,
    Repetition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attempt {
    pub word: String,
    pub start_time: f64,
    pub end_time: f64,
    pub kind: AttemptKind,
}

/// Stutter metadata attached to the word that survived a disfluency collapse.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisfluencyMark {
    pub attempts: u32,
    pub severity: Severity,
    pub total_duration: f64,
    pub max_pause: f64,
    pub fragments: Vec<Attempt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HypothesisWord {
    pub word: String,
    #[serde(default, alias = "start_time", deserialize_with = "deserialize_seconds")]
    pub start_time: f64,
    #[serde(default, alias = "end_time", deserialize_with = "deserialize_seconds")]
    pub end_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    /// Raw confidence reported by the secondary engine, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<f64>,
    /// Timestamps from the cross-validating engine.
    #[serde(
        default,
        alias = "alt_start_time",
        deserialize_with = "deserialize_optional_seconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub alt_start_time: Option<f64>,
    #[serde(
        default,
        alias = "alt_end_time",
        deserialize_with = "deserialize_optional_seconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub alt_end_time: Option<f64>,
    #[serde(default, alias = "cross_validation", skip_serializing_if = "Option::is_none")]
    pub cross_validation: Option<CrossValidation>,
    #[serde(default, alias = "trust_level", skip_serializing_if = "Option::is_none")]
    pub trust_level: Option<TrustLevel>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub flags: BTreeSet<WordFlag>,
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub disfluency: Option<DisfluencyMark>,
}

impl HypothesisWord {
    pub fn new(word: impl Into<String>, start_time: f64, end_time: f64) -> Self {
        Self {
            word: word.into(),
            start_time,
            end_time,
            confidence: None,
            source: None,
            debug: None,
            alt_start_time: None,
            alt_end_time: None,
            cross_validation: None,
            trust_level: None,
            flags: BTreeSet::new(),
            disfluency: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    pub fn effective_source(&self) -> Source {
        self.source.unwrap_or(Source::Both)
    }

    pub fn is_unconfirmed(&self) -> bool {
        self.cross_validation == Some(CrossValidation::Unconfirmed)
    }

    pub fn duration(&self) -> f64 {
        (self.end_time - self.start_time).max(0.0)
    }

    /// Number of attempts this word represents; 1 for a clean read.
    pub fn attempts(&self) -> u32 {
        self.disfluency.as_ref().map_or(1, |mark| mark.attempts)
    }

    pub fn severity(&self) -> Severity {
        self.disfluency
            .as_ref()
            .map_or(Severity::None, |mark| mark.severity)
    }
}

/// Everything the engine needs for one assessment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentInput {
    #[serde(alias = "reference_text")]
    pub reference_text: String,
    #[serde(default)]
    pub words: Vec<HypothesisWord>,
    /// Recording length; defaults to the end of the last word.
    #[serde(default, alias = "audio_duration_sec")]
    pub audio_duration_sec: Option<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Number(f64),
    Text(String),
    Parts {
        #[serde(default)]
        seconds: Option<NumberOrText>,
        #[serde(default)]
        nanos: Option<f64>,
    },
}

impl RawTimestamp {
    fn seconds(self) -> f64 {
        match self {
            Self::Number(value) => finite_or_zero(value),
            Self::Text(text) => parse_time_text(&text),
            Self::Parts { seconds, nanos } => {
                let whole = match seconds {
                    Some(NumberOrText::Number(value)) => finite_or_zero(value),
                    Some(NumberOrText::Text(text)) => parse_time_text(&text),
                    None => 0.0,
                };
                whole + finite_or_zero(nanos.unwrap_or(0.0)) / 1e9
            }
        }
    }
}

/// Parses `"1.200s"`-style timestamps. Unparsable text yields 0.0.
pub fn parse_time_text(text: &str) -> f64 {
    let trimmed = text.trim().trim_end_matches('s').trim();
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            tracing::warn!(value = text, "types: unparsable timestamp treated as 0s");
            0.0
        }
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn deserialize_seconds<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawTimestamp>::deserialize(deserializer)?;
    Ok(raw.map_or(0.0, RawTimestamp::seconds))
}

fn deserialize_optional_seconds<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawTimestamp>::deserialize(deserializer)?;
    Ok(raw.map(RawTimestamp::seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_accept_number_string_and_parts() {
        let json = r#"[
            {"word": "a", "startTime": 1.25, "endTime": "1.500s"},
            {"word": "b", "startTime": {"seconds": "2", "nanos": 500000000}, "endTime": {"seconds": 3}}
        ]"#;
        let words: Vec<HypothesisWord> = serde_json::from_str(json).expect("valid words");
        assert_eq!(words[0].start_time, 1.25);
        assert_eq!(words[0].end_time, 1.5);
        assert!((words[1].start_time - 2.5).abs() < 1e-9);
        assert_eq!(words[1].end_time, 3.0);
    }

    #[test]
    fn garbage_timestamp_becomes_zero() {
        let json = r#"{"word": "a", "startTime": "soon", "endTime": null}"#;
        let word: HypothesisWord = serde_json::from_str(json).expect("valid word");
        assert_eq!(word.start_time, 0.0);
        assert_eq!(word.end_time, 0.0);
    }

    #[test]
    fn source_and_cross_validation_parse() {
        let json = r#"{
            "word": "dog", "startTime": 0, "endTime": 0.4,
            "source": "latest_only", "crossValidation": "unconfirmed",
            "altStartTime": "0.05s", "flags": ["vad_ghost"]
        }"#;
        let word: HypothesisWord = serde_json::from_str(json).expect("valid word");
        assert_eq!(word.source, Some(Source::LatestOnly));
        assert!(word.is_unconfirmed());
        assert_eq!(word.alt_start_time, Some(0.05));
        assert!(word.flags.contains(&WordFlag::VadGhost));
    }

    #[test]
    fn missing_source_is_treated_as_both() {
        let word = HypothesisWord::new("x", 0.0, 0.1);
        assert_eq!(word.effective_source(), Source::Both);
        assert_eq!(word.attempts(), 1);
        assert_eq!(word.severity(), Severity::None);
    }

    #[test]
    fn trust_level_serializes_unknown_as_none() {
        let json = serde_json::to_string(&TrustLevel::Unknown).expect("serialize");
        assert_eq!(json, "\"none\"");
    }
}

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::FluencyError;

/// Tunables for every stage of an assessment. All sections fall back to their
/// defaults when missing from a config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub confidence: ConfidenceThresholds,
    pub disfluency: DisfluencyThresholds,
    pub safety: SafetyThresholds,
    pub diagnostics: DiagnosticThresholds,
    /// JSON object mapping lowercase words to phoneme counts.
    pub phoneme_dictionary_path: Option<PathBuf>,
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self, FluencyError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| FluencyError::io("read engine config", e))?;
        serde_json::from_str(&data).map_err(|e| FluencyError::json("parse engine config", e))
    }

    pub(crate) fn validate(&self) -> Result<(), FluencyError> {
        let c = &self.confidence;
        if !(0.0..=1.0).contains(&c.medium) || !(0.0..=1.0).contains(&c.high) {
            return Err(FluencyError::invalid_input(format!(
                "confidence thresholds must lie in [0, 1] (medium={}, high={})",
                c.medium, c.high
            )));
        }
        if c.medium >= c.high {
            return Err(FluencyError::invalid_input(format!(
                "medium confidence threshold {} must be below high threshold {}",
                c.medium, c.high
            )));
        }
        if self.safety.rate_window_size == 0 {
            return Err(FluencyError::invalid_input("safety.rate_window_size must be >= 1"));
        }
        let d = &self.diagnostics;
        if d.hesitation_sec > d.long_pause_sec {
            return Err(FluencyError::invalid_input(format!(
                "hesitation threshold {} exceeds long pause threshold {}",
                d.hesitation_sec, d.long_pause_sec
            )));
        }
        if d.phonemes_per_syllable <= 0.0 {
            return Err(FluencyError::invalid_input(
                "diagnostics.phonemes_per_syllable must be positive",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConfidenceThresholds {
    /// Inclusive lower bound of the `high` trust level.
    pub high: f64,
    /// Inclusive lower bound of the `medium` trust level.
    pub medium: f64,
    /// Assigned to `latest_only` words found in the reference.
    pub valid_mumble: f64,
    /// Assigned to `latest_only` words missing from the reference.
    pub hallucination_risk: f64,
}

impl ConfidenceThresholds {
    pub const HIGH: f64 = 0.93;
    pub const MEDIUM: f64 = 0.70;
    pub const VALID_MUMBLE: f64 = 0.85;
    pub const HALLUCINATION_RISK: f64 = 0.50;
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            high: Self::HIGH,
            medium: Self::MEDIUM,
            valid_mumble: Self::VALID_MUMBLE,
            hallucination_risk: Self::HALLUCINATION_RISK,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisfluencyThresholds {
    /// Silence longer than this starts a new attempt group.
    pub group_gap_sec: f64,
    pub max_lookahead: usize,
    pub short_fragment_max_chars: usize,
    pub long_prefix_min_chars: usize,
    pub significant_attempts: u32,
    pub significant_duration_sec: f64,
    pub moderate_pause_sec: f64,
    pub moderate_attempts: u32,
    pub minor_attempts: u32,
    /// Secondary-engine confidence at which a word can no longer be a fragment.
    pub confidence_protection: f64,
    /// Secondary-engine confidence needed for a reference unigram to be protected.
    pub unigram_protection: f64,
}

impl Default for DisfluencyThresholds {
    fn default() -> Self {
        Self {
            group_gap_sec: 2.0,
            max_lookahead: 2,
            short_fragment_max_chars: 3,
            long_prefix_min_chars: 4,
            significant_attempts: 5,
            significant_duration_sec: 2.0,
            moderate_pause_sec: 0.5,
            moderate_attempts: 3,
            minor_attempts: 2,
            confidence_protection: 0.93,
            unigram_protection: 0.8,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SafetyThresholds {
    pub max_words_per_second: f64,
    pub rate_window_size: usize,
    pub edge_tolerance_ms: f64,
    pub uncorroborated_in_reference: usize,
    pub uncorroborated_not_in_reference: usize,
    pub strong_corroboration: f64,
    pub collapse_percent: f64,
}

impl Default for SafetyThresholds {
    fn default() -> Self {
        Self {
            max_words_per_second: 5.0,
            rate_window_size: 3,
            edge_tolerance_ms: 300.0,
            uncorroborated_in_reference: 7,
            uncorroborated_not_in_reference: 3,
            strong_corroboration: 0.93,
            collapse_percent: 40.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiagnosticThresholds {
    pub hesitation_sec: f64,
    pub comma_hesitation_sec: f64,
    pub period_hesitation_sec: f64,
    pub long_pause_sec: f64,
    pub near_miss_min_affix: usize,
    pub near_miss_min_ratio: f64,
    pub morphological_min_affix: usize,
    pub morphological_min_diff: usize,
    pub struggle_pause_sec: f64,
    /// Reference words must be longer than this for the hesitation path.
    pub struggle_min_ref_chars: usize,
    pub absorption_tolerance_sec: f64,
    pub absorption_max_chars: usize,
    pub concat_max_insertions: usize,
    pub concat_min_chars: usize,
    pub medium_pause_floor_sec: f64,
    pub comma_gap_multiplier: f64,
    pub comma_gap_floor_sec: f64,
    pub duration_iqr_floor_ms: f64,
    pub phonemes_per_syllable: f64,
    pub min_outlier_sample: usize,
    pub min_pace_phrases: usize,
}

impl Default for DiagnosticThresholds {
    fn default() -> Self {
        Self {
            hesitation_sec: 0.5,
            comma_hesitation_sec: 0.8,
            period_hesitation_sec: 1.2,
            long_pause_sec: 3.0,
            near_miss_min_affix: 3,
            near_miss_min_ratio: 0.4,
            morphological_min_affix: 3,
            morphological_min_diff: 2,
            struggle_pause_sec: 3.0,
            struggle_min_ref_chars: 3,
            absorption_tolerance_sec: 0.15,
            absorption_max_chars: 4,
            concat_max_insertions: 3,
            concat_min_chars: 2,
            medium_pause_floor_sec: 0.2,
            comma_gap_multiplier: 1.5,
            comma_gap_floor_sec: 0.1,
            duration_iqr_floor_ms: 50.0,
            phonemes_per_syllable: 2.5837,
            min_outlier_sample: 4,
            min_pace_phrases: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_config_default() {
        let config = EngineConfig::default();
        assert_eq!(config.confidence.high, ConfidenceThresholds::HIGH);
        assert_eq!(config.confidence.medium, 0.70);
        assert_eq!(config.disfluency.group_gap_sec, 2.0);
        assert_eq!(config.safety.rate_window_size, 3);
        assert_eq!(config.diagnostics.long_pause_sec, 3.0);
        assert!(config.phoneme_dictionary_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults_for_missing_fields() {
        let json = r#"{
            "confidence": { "high": 0.9 },
            "diagnostics": { "long_pause_sec": 2.5 }
        }"#;
        let config: EngineConfig = serde_json::from_str(json).expect("valid config json");
        assert_eq!(config.confidence.high, 0.9);
        assert_eq!(config.confidence.medium, ConfidenceThresholds::MEDIUM);
        assert_eq!(config.diagnostics.long_pause_sec, 2.5);
        assert_eq!(config.diagnostics.hesitation_sec, 0.5);
        assert_eq!(config.safety.collapse_percent, 40.0);
    }

    #[test]
    fn validate_rejects_inverted_confidence_thresholds() {
        let mut config = EngineConfig::default();
        config.confidence.medium = 0.95;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = EngineConfig::load(Path::new("/nonexistent/engine.json")).unwrap_err();
        assert!(matches!(err, FluencyError::Io { .. }));
    }

    #[test]
    fn load_parses_file_from_disk() {
        let path = std::env::temp_dir().join("orf_fluency_config_load.json");
        std::fs::write(&path, r#"{"safety": {"collapse_percent": 55.0}}"#).expect("write config");
        let config = EngineConfig::load(&path).expect("config should load");
        assert_eq!(config.safety.collapse_percent, 55.0);
        let _ = std::fs::remove_file(&path);
    }
}

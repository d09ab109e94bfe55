pub mod alignment;
pub mod confidence;
pub mod config;
pub mod diagnostics;
pub mod disfluency;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod safety;
pub mod text;
pub mod types;

pub use alignment::{align_words, AlignmentEntry, MergeKind, MergedAlignment, RawAlignment, RefWord, StrugglePath};
pub use config::{ConfidenceThresholds, DiagnosticThresholds, DisfluencyThresholds, EngineConfig, SafetyThresholds};
pub use diagnostics::{run_diagnostics, Diagnostics, EntryNotes, StruggleAnnotated};
pub use error::FluencyError;
pub use pipeline::builder::FluencyEngineBuilder;
pub use pipeline::runtime::{Assessment, FluencyEngine};
pub use pipeline::traits::{PhonemeCounter, SequenceAligner, WordTierAnnotator};
pub use report::{aggregate_reports, compute_case_report, CaseReport, Meta, Report};
pub use types::{AssessmentInput, HypothesisWord, Severity, Source, TrustLevel, WordFlag, WordTier};

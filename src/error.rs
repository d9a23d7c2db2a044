//! Error types for each pipeline stage.
//!
//! Every variant carries enough context (label, counts present and required) for the caller to
//! fix the data and retry. Nothing here is fatal to the process.

use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// Session rejected before feature extraction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Typed text is too far from the canonical prompt
    #[error("typed text matches the prompt at {similarity:.2}, need at least {required:.2}")]
    PromptMismatch { similarity: f64, required: f64 },

    /// Not enough key events for flight-time features
    #[error("need at least {need} key events, have {have}")]
    TooFewEvents { have: usize, need: usize },

    /// Timestamps out of order, negative dwell, or non-finite values
    #[error("key event {index} is malformed: {reason}")]
    MalformedEvents { index: usize, reason: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractionError {
    /// Flight features need two consecutive key-downs
    #[error("need at least 2 key events to extract flight features, have {have}")]
    InsufficientEvents { have: usize },

    /// Negative dwell or out-of-order presses would poison the statistics
    #[error("key event {index} is malformed: {reason}")]
    MalformedEvents { index: usize, reason: String },

    #[error("feature {name} is not finite")]
    NonFiniteFeature { name: String },

    #[error(transparent)]
    Schema(#[from] SchemaMismatch),
}

/// Feature layout differs between a model and the running extractor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("feature order mismatch: model expects v{expected_version} ({expected}), extractor is v{found_version} ({found})")]
pub struct SchemaMismatch {
    pub expected_version: u8,
    pub expected: String,
    pub found_version: u8,
    pub found: String,
}

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("need at least {need} distinct labels to train, have {have}")]
    InsufficientLabels { have: usize, need: usize },

    #[error("need {need} sessions for label {label:?}, have {have}")]
    InsufficientSessions {
        label: String,
        have: usize,
        need: usize,
        counts: BTreeMap<String, usize>,
    },

    #[error("invalid training configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

#[derive(Debug, Error)]
pub enum PredictionError {
    #[error(transparent)]
    FeatureOrderMismatch(#[from] SchemaMismatch),

    #[error("no trained model found in {0}; collect sessions and run training first")]
    ModelNotTrained(PathBuf),

    #[error("model cannot be used for prediction: {0}")]
    InvalidModel(String),

    #[error(transparent)]
    Extraction(ExtractionError),

    #[error(transparent)]
    Artifact(ArtifactError),
}

impl From<ExtractionError> for PredictionError {
    fn from(e: ExtractionError) -> Self {
        match e {
            ExtractionError::Schema(m) => PredictionError::FeatureOrderMismatch(m),
            other => PredictionError::Extraction(other),
        }
    }
}

impl From<ArtifactError> for PredictionError {
    fn from(e: ArtifactError) -> Self {
        match e {
            ArtifactError::NotFound(dir) => PredictionError::ModelNotTrained(dir),
            other => PredictionError::Artifact(other),
        }
    }
}

/// Model artifact load/save failures.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("no model artifact in {0}")]
    NotFound(PathBuf),

    #[error("corrupt model artifact in {dir}: {reason}")]
    CorruptArtifact { dir: PathBuf, reason: String },

    #[error("model artifact I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("model artifact serialization: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("session store serialization: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("session store database: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("session payload could not be decrypted: {0}")]
    Crypto(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

//! Pipeline configuration. Every section has defaults so a missing file still yields a
//! working setup.

use crate::error::ConfigError;
use crate::session::{HARD_MIN_EVENTS, HARD_MIN_SIMILARITY};
use crate::train::{HARD_MIN_LABELS, HARD_MIN_SESSIONS_PER_LABEL};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_PROMPT: &str = "the quick brown fox jumps over the lazy dog";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeystyleConfig {
    /// Canonical prompt every session must reproduce
    pub prompt: String,
    /// Session store backend and location
    pub store: StoreConfig,
    /// Directory holding classifier.json + feature_order.json
    pub model_dir: PathBuf,
    /// Session acceptance gate
    pub validation: ValidationConfig,
    /// Data-sufficiency gates and forest parameters
    pub training: TrainingConfig,
    /// Confidence band thresholds for predictions
    pub confidence: ConfidenceConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Flat JSON array of sessions
    Json,
    /// SQLite with encrypted payloads
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub path: PathBuf,
    /// Environment variable holding the store secret (sqlite backend only)
    pub secret_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Minimum normalized similarity between typed text and prompt (0.0–1.0)
    pub min_similarity: f64,
    /// Minimum key events per session; never below 2
    pub min_events: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub min_sessions_per_label: usize,
    pub min_labels: usize,
    /// Held-out share per label
    pub test_fraction: f64,
    /// Seed for the split and every tree's bootstrap
    pub seed: u64,
    pub forest: ForestConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub n_trees: usize,
    /// None grows trees until leaves are pure
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Candidate features per split; None means sqrt(feature count)
    pub max_features: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    /// Confidence at or above this is a high-confidence match
    pub high_threshold: f64,
    /// Confidence at or above this is medium
    pub medium_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("keystyle"))
        .unwrap_or_else(|| PathBuf::from(".keystyle"))
}

impl Default for KeystyleConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            store: StoreConfig {
                path: data_dir.join("sessions.json"),
                ..StoreConfig::default()
            },
            model_dir: data_dir.join("artifacts"),
            validation: ValidationConfig::default(),
            training: TrainingConfig::default(),
            confidence: ConfidenceConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Json,
            path: PathBuf::from("data/sessions.json"),
            secret_env: "KEYSTYLE_STORE_SECRET".to_string(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_similarity: 0.8,
            min_events: 2,
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            min_sessions_per_label: 10,
            min_labels: 2,
            test_fraction: 0.2,
            seed: 42,
            forest: ForestConfig::default(),
        }
    }
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            max_features: None,
        }
    }
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            high_threshold: 0.7,
            medium_threshold: 0.5,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl KeystyleConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &std::path::Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(data) => match serde_json::from_str::<KeystyleConfig>(&data) {
                    Ok(c) => return c,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "config unparsable; using defaults")
                    }
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "config unreadable; using defaults")
                }
            }
        }
        Self::default()
    }

    /// Reject values that would make the pipeline meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        let v = &self.validation;
        if !(v.min_similarity >= HARD_MIN_SIMILARITY && v.min_similarity <= 1.0) {
            return Err(invalid(
                "validation.min_similarity",
                &format!("must be in [{}, 1]", HARD_MIN_SIMILARITY),
            ));
        }
        if v.min_events < HARD_MIN_EVENTS {
            return Err(invalid(
                "validation.min_events",
                &format!("must be at least {}", HARD_MIN_EVENTS),
            ));
        }
        if self.prompt.trim().is_empty() {
            return Err(invalid("prompt", "must not be empty"));
        }

        let t = &self.training;
        if !(t.test_fraction > 0.0 && t.test_fraction < 1.0) {
            return Err(invalid("training.test_fraction", "must be in (0, 1)"));
        }
        if t.min_labels < HARD_MIN_LABELS {
            return Err(invalid(
                "training.min_labels",
                &format!("must be at least {}", HARD_MIN_LABELS),
            ));
        }
        if t.min_sessions_per_label < HARD_MIN_SESSIONS_PER_LABEL {
            return Err(invalid(
                "training.min_sessions_per_label",
                &format!("must be at least {}", HARD_MIN_SESSIONS_PER_LABEL),
            ));
        }
        if t.forest.n_trees == 0 {
            return Err(invalid("training.forest.n_trees", "must be positive"));
        }
        if t.forest.min_samples_split < 2 {
            return Err(invalid("training.forest.min_samples_split", "must be at least 2"));
        }
        if t.forest.max_features == Some(0) {
            return Err(invalid("training.forest.max_features", "must be positive"));
        }

        let c = &self.confidence;
        if c.medium_threshold > c.high_threshold {
            return Err(invalid(
                "confidence.medium_threshold",
                "must not exceed high_threshold",
            ));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

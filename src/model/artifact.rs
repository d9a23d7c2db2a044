//! Model artifact on disk: `classifier.json` (forest, labels, metrics) next to
//! `feature_order.json` (schema). Written to temp files and renamed into place. Both files carry
//! the same per-save run id, so a half-replaced pair is caught on load even when the schema did
//! not change.

use super::{Model, RandomForest};
use crate::error::ArtifactError;
use crate::features::FeatureSchema;
use crate::train::TrainingMetrics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

pub const CLASSIFIER_FILE: &str = "classifier.json";
pub const SCHEMA_FILE: &str = "feature_order.json";

const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct ClassifierFile {
    format_version: u32,
    run_id: String,
    /// Must equal the fingerprint in feature_order.json
    schema_fingerprint: String,
    labels: Vec<String>,
    forest: RandomForest,
    metrics: TrainingMetrics,
    trained_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
struct SchemaFile {
    run_id: String,
    schema: FeatureSchema,
}

#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn classifier_path(&self) -> PathBuf {
        self.dir.join(CLASSIFIER_FILE)
    }

    pub fn schema_path(&self) -> PathBuf {
        self.dir.join(SCHEMA_FILE)
    }

    /// Replace any existing artifact with `model`.
    pub fn save(&self, model: &Model) -> Result<(), ArtifactError> {
        std::fs::create_dir_all(&self.dir)?;
        let run_id = Uuid::new_v4().to_string();
        let classifier = ClassifierFile {
            format_version: FORMAT_VERSION,
            run_id: run_id.clone(),
            schema_fingerprint: model.schema().fingerprint.clone(),
            labels: model.labels().to_vec(),
            forest: model.forest().clone(),
            metrics: model.metrics().clone(),
            trained_at: model.trained_at(),
        };
        let schema_json = serde_json::to_vec_pretty(&SchemaFile {
            run_id,
            schema: model.schema().clone(),
        })?;
        let classifier_json = serde_json::to_vec(&classifier)?;

        let schema_tmp = self.dir.join(format!("{}.tmp", SCHEMA_FILE));
        let classifier_tmp = self.dir.join(format!("{}.tmp", CLASSIFIER_FILE));
        std::fs::write(&schema_tmp, schema_json)?;
        std::fs::write(&classifier_tmp, classifier_json)?;
        std::fs::rename(&schema_tmp, self.schema_path())?;
        std::fs::rename(&classifier_tmp, self.classifier_path())?;

        info!(
            dir = %self.dir.display(),
            labels = model.labels().len(),
            trees = model.forest().n_trees(),
            "model artifact saved"
        );
        Ok(())
    }

    /// Load both halves. Neither present is [`ArtifactError::NotFound`]; anything partial,
    /// unparsable, or inconsistent is [`ArtifactError::CorruptArtifact`].
    pub fn load(&self) -> Result<Model, ArtifactError> {
        let classifier_path = self.classifier_path();
        let schema_path = self.schema_path();
        match (classifier_path.exists(), schema_path.exists()) {
            (false, false) => return Err(ArtifactError::NotFound(self.dir.clone())),
            (true, false) => return Err(self.corrupt(format!("{} is missing", SCHEMA_FILE))),
            (false, true) => return Err(self.corrupt(format!("{} is missing", CLASSIFIER_FILE))),
            (true, true) => {}
        }

        let schema_file: SchemaFile = serde_json::from_slice(&std::fs::read(&schema_path)?)
            .map_err(|e| self.corrupt(format!("{}: {}", SCHEMA_FILE, e)))?;
        let classifier: ClassifierFile = serde_json::from_slice(&std::fs::read(&classifier_path)?)
            .map_err(|e| self.corrupt(format!("{}: {}", CLASSIFIER_FILE, e)))?;

        if classifier.format_version != FORMAT_VERSION {
            return Err(self.corrupt(format!(
                "unsupported format version {}",
                classifier.format_version
            )));
        }
        let schema = schema_file.schema;
        if !schema.is_consistent() {
            return Err(self.corrupt("feature order fingerprint does not match its names".into()));
        }
        if classifier.run_id != schema_file.run_id || classifier.schema_fingerprint != schema.fingerprint {
            return Err(self.corrupt(
                "classifier and feature order come from different training runs".into(),
            ));
        }
        if classifier.labels.len() < 2 || classifier.labels.len() != classifier.forest.n_classes() {
            return Err(self.corrupt(format!(
                "{} labels for a forest with {} classes",
                classifier.labels.len(),
                classifier.forest.n_classes()
            )));
        }
        if classifier.forest.n_features() != schema.len() || !classifier.forest.is_well_formed() {
            return Err(self.corrupt("forest structure does not fit the feature schema".into()));
        }

        Ok(Model::new(
            classifier.forest,
            schema,
            classifier.labels,
            classifier.metrics,
            classifier.trained_at,
        ))
    }

    fn corrupt(&self, reason: String) -> ArtifactError {
        ArtifactError::CorruptArtifact {
            dir: self.dir.clone(),
            reason,
        }
    }
}

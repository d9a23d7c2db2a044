//! Trained classifier artifact: forest + feature schema + label set.

mod artifact;
mod forest;
mod tree;

pub use artifact::{ModelStore, CLASSIFIER_FILE, SCHEMA_FILE};
pub use forest::RandomForest;
pub use tree::{DecisionTree, Node, TreeParams};

use crate::features::{FeatureSchema, FeatureVector};
use crate::train::TrainingMetrics;
use chrono::{DateTime, Utc};

/// Immutable result of one training run. Superseded, never mutated, by the next run.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    forest: RandomForest,
    schema: FeatureSchema,
    labels: Vec<String>,
    metrics: TrainingMetrics,
    trained_at: DateTime<Utc>,
}

impl Model {
    /// `labels[i]` names forest class `i`.
    pub fn new(
        forest: RandomForest,
        schema: FeatureSchema,
        labels: Vec<String>,
        metrics: TrainingMetrics,
        trained_at: DateTime<Utc>,
    ) -> Self {
        Self {
            forest,
            schema,
            labels,
            metrics,
            trained_at,
        }
    }

    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    /// Probability per label, in `labels()` order.
    pub fn predict_proba(&self, vector: &FeatureVector) -> Vec<f64> {
        self.forest.predict_proba(vector.as_slice())
    }

    pub fn predict_label(&self, vector: &FeatureVector) -> &str {
        &self.labels[self.forest.predict(vector.as_slice())]
    }
}

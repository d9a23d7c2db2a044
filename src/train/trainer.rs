//! Fits a [`Model`] from a [`Dataset`] and scores it on the held-out partition.

use super::split::stratified_split;
use crate::config::TrainingConfig;
use crate::dataset::Dataset;
use crate::error::TrainingError;
use crate::features::FeatureVector;
use crate::model::{Model, RandomForest};
use chrono::Utc;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    /// Held-out accuracy (0.0–1.0)
    pub accuracy: f64,
    /// Sessions per label in the dataset
    pub label_counts: BTreeMap<String, usize>,
    /// Held-out recall per label
    pub label_recall: BTreeMap<String, f64>,
    pub train_size: usize,
    pub test_size: usize,
    pub seed: u64,
}

/// Fewest distinct labels a model can separate; configuration can only raise it.
pub const HARD_MIN_LABELS: usize = 2;

/// Fewest sessions per label worth training on; configuration can only raise it.
pub const HARD_MIN_SESSIONS_PER_LABEL: usize = 10;

pub struct Trainer {
    config: TrainingConfig,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    /// Refuse datasets too small to train on: too few labels first, then the first label (in
    /// sorted order) short of the per-label minimum.
    pub fn check_sufficiency(&self, dataset: &Dataset) -> Result<(), TrainingError> {
        let counts = dataset.label_counts();
        let min_labels = self.min_labels();
        if counts.len() < min_labels {
            return Err(TrainingError::InsufficientLabels {
                have: counts.len(),
                need: min_labels,
            });
        }
        let need = self.min_sessions_per_label();
        if let Some((label, &have)) = counts.iter().find(|(_, n)| **n < need) {
            return Err(TrainingError::InsufficientSessions {
                label: label.clone(),
                have,
                need,
                counts: counts.clone(),
            });
        }
        Ok(())
    }

    pub fn min_labels(&self) -> usize {
        self.config.min_labels.max(HARD_MIN_LABELS)
    }

    pub fn min_sessions_per_label(&self) -> usize {
        self.config.min_sessions_per_label.max(HARD_MIN_SESSIONS_PER_LABEL)
    }

    /// Same dataset and seed always yield the same forest, metrics, and predictions.
    pub fn train(&self, dataset: &Dataset) -> Result<Model, TrainingError> {
        if !(self.config.test_fraction > 0.0 && self.config.test_fraction < 1.0) {
            return Err(TrainingError::InvalidConfig(format!(
                "test_fraction {} must be in (0, 1)",
                self.config.test_fraction
            )));
        }
        if self.config.forest.n_trees == 0 {
            return Err(TrainingError::InvalidConfig("n_trees must be positive".into()));
        }
        self.check_sufficiency(dataset)?;

        let labels = dataset.labels();
        let split = stratified_split(dataset, self.config.test_fraction, self.config.seed);
        let (x, y) = design_matrix(&split.train);
        let forest = RandomForest::fit(&x, &y, labels.len(), &self.config.forest, self.config.seed);

        let mut hits = vec![0usize; labels.len()];
        let mut totals = vec![0usize; labels.len()];
        for (class, vector) in &split.test {
            totals[*class] += 1;
            if forest.predict(vector.as_slice()) == *class {
                hits[*class] += 1;
            }
        }
        let correct: usize = hits.iter().sum();
        let accuracy = correct as f64 / split.test.len().max(1) as f64;
        let label_recall = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), hits[i] as f64 / totals[i].max(1) as f64))
            .collect();

        let metrics = TrainingMetrics {
            accuracy,
            label_counts: dataset.label_counts(),
            label_recall,
            train_size: split.train.len(),
            test_size: split.test.len(),
            seed: self.config.seed,
        };
        info!(
            accuracy = metrics.accuracy,
            train_size = metrics.train_size,
            test_size = metrics.test_size,
            labels = labels.len(),
            trees = forest.n_trees(),
            "model trained"
        );

        Ok(Model::new(forest, dataset.schema().clone(), labels, metrics, Utc::now()))
    }
}

fn design_matrix(rows: &[(usize, FeatureVector)]) -> (Array2<f64>, Vec<usize>) {
    let n_features = rows.first().map_or(0, |(_, v)| v.as_slice().len());
    let x = Array2::from_shape_fn((rows.len(), n_features), |(i, j)| rows[i].1.values[j]);
    let y = rows.iter().map(|(class, _)| *class).collect();
    (x, y)
}

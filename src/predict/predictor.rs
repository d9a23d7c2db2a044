//! Stateless scoring of one validated session against a borrowed [`Model`].

use super::{ConfidenceBand, ConfidenceScorer};
use crate::error::PredictionError;
use crate::features::{FeatureExtractor, FeatureVector};
use crate::model::Model;
use crate::session::ValidatedSession;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelProbability {
    pub label: String,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Top-ranked label
    pub label: String,
    /// Probability mass assigned to `label`
    pub confidence: f64,
    pub band: ConfidenceBand,
    /// One entry per trained label, highest first, ties by label name
    pub probabilities: Vec<LabelProbability>,
}

pub struct Predictor<'m> {
    model: &'m Model,
    extractor: FeatureExtractor,
    scorer: ConfidenceScorer,
}

impl<'m> Predictor<'m> {
    /// Fails with `FeatureOrderMismatch` when the model was trained on a different layout.
    pub fn new(model: &'m Model) -> Result<Self, PredictionError> {
        if model.labels().is_empty() || model.labels().len() != model.forest().n_classes() {
            return Err(PredictionError::InvalidModel(format!(
                "{} labels for a forest with {} classes",
                model.labels().len(),
                model.forest().n_classes()
            )));
        }
        let extractor = FeatureExtractor::for_schema(model.schema())?;
        Ok(Self {
            model,
            extractor,
            scorer: ConfidenceScorer::default(),
        })
    }

    pub fn with_scorer(mut self, scorer: ConfidenceScorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn predict(&self, session: &ValidatedSession) -> Result<PredictionResult, PredictionError> {
        let vector = self.extractor.extract(session)?;
        let result = self.predict_vector(&vector);
        debug!(
            session_id = %session.id,
            label = %result.label,
            confidence = result.confidence,
            "session scored"
        );
        Ok(result)
    }

    /// Score a vector already laid out in the model's schema order.
    pub fn predict_vector(&self, vector: &FeatureVector) -> PredictionResult {
        let proba = self.model.predict_proba(vector);
        let mut probabilities: Vec<LabelProbability> = self
            .model
            .labels()
            .iter()
            .zip(proba)
            .map(|(label, probability)| LabelProbability {
                label: label.clone(),
                probability,
            })
            .collect();
        probabilities.sort_by(|a, b| {
            b.probability
                .total_cmp(&a.probability)
                .then_with(|| a.label.cmp(&b.label))
        });

        let top = &probabilities[0];
        PredictionResult {
            label: top.label.clone(),
            confidence: top.probability,
            band: self.scorer.band(top.probability),
            probabilities,
        }
    }
}

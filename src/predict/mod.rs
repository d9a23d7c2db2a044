//! Scoring new sessions against a trained model.

mod confidence;
mod predictor;

pub use confidence::{ConfidenceBand, ConfidenceScorer};
pub use predictor::{LabelProbability, PredictionResult, Predictor};

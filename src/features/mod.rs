//! Keystroke timing feature extraction.

mod layout;
mod pipeline;
mod timing;

pub use layout::{compute_fingerprint, FeatureSchema, FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION};
pub use pipeline::FeatureExtractor;
pub use timing::{SummaryStats, TimingStats};

use serde::{Deserialize, Serialize};

/// Fixed-size feature vector, values in [`FEATURE_LAYOUT`] order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        Self { values }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

//! Training: data-sufficiency gates, deterministic stratified split, forest fit, evaluation.

mod split;
mod trainer;

pub use split::{stratified_split, Split};
pub use trainer::{Trainer, TrainingMetrics, HARD_MIN_LABELS, HARD_MIN_SESSIONS_PER_LABEL};

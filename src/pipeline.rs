//! Entry points the surrounding application calls: validate, extract, train, predict, plus
//! enrollment into the session store.

use crate::config::{KeystyleConfig, ValidationConfig};
use crate::dataset::{Dataset, SkippedSession};
use crate::error::{ExtractionError, PredictionError, StoreError, TrainingError, ValidationError};
use crate::features::{FeatureExtractor, FeatureVector};
use crate::model::{Model, ModelStore};
use crate::predict::{ConfidenceScorer, PredictionResult, Predictor};
use crate::session::{Session, SessionValidator, ValidatedSession};
use crate::storage::SessionStore;
use crate::train::Trainer;
use std::collections::BTreeMap;
use tracing::info;

/// Outcome of a training run that reached the store.
#[derive(Debug)]
pub struct TrainingReport {
    pub model: Model,
    pub skipped: Vec<SkippedSession>,
}

/// Validate with the default thresholds (similarity 0.80, two events).
pub fn validate_session(session: Session, prompt: &str) -> Result<ValidatedSession, ValidationError> {
    SessionValidator::new(prompt, &ValidationConfig::default()).validate(session)
}

/// Features in the current schema order.
pub fn extract_features(session: &Session) -> Result<FeatureVector, ExtractionError> {
    FeatureExtractor::new().extract(session)
}

/// Load every stored session, build a dataset, train, and replace the persisted model.
/// Nothing is written unless training succeeds.
pub fn train(
    store: &dyn SessionStore,
    model_store: &ModelStore,
    config: &KeystyleConfig,
) -> Result<TrainingReport, TrainingError> {
    config
        .validate()
        .map_err(|e| TrainingError::InvalidConfig(e.to_string()))?;
    let sessions = store.load_all()?;
    info!(sessions = sessions.len(), "sessions loaded");

    let validator = SessionValidator::new(config.prompt.clone(), &config.validation);
    let (dataset, skipped) = Dataset::from_sessions(sessions, &validator, &FeatureExtractor::new());
    let model = Trainer::new(config.training.clone()).train(&dataset)?;
    model_store.save(&model)?;

    Ok(TrainingReport { model, skipped })
}

/// Score one session against an already-loaded model.
pub fn predict(model: &Model, session: &ValidatedSession) -> Result<PredictionResult, PredictionError> {
    Predictor::new(model)?.predict(session)
}

/// Same as [`predict`] with confidence bands from `config`.
pub fn predict_with(
    model: &Model,
    session: &ValidatedSession,
    config: &KeystyleConfig,
) -> Result<PredictionResult, PredictionError> {
    Predictor::new(model)?
        .with_scorer(ConfidenceScorer::new(config.confidence.clone()))
        .predict(session)
}

/// `ModelNotTrained` when the store holds no artifact yet.
pub fn load_model(model_store: &ModelStore) -> Result<Model, PredictionError> {
    Ok(model_store.load()?)
}

#[derive(Debug, thiserror::Error)]
pub enum EnrollError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Validate, check that features can be extracted, then append. Returns the label's new
/// session count.
pub fn enroll(
    store: &dyn SessionStore,
    validator: &SessionValidator,
    session: Session,
) -> Result<usize, EnrollError> {
    let validated = validator.validate(session)?;
    FeatureExtractor::new().extract(&validated)?;
    store.append(&validated)?;
    let count = store
        .label_counts()?
        .get(&validated.label)
        .copied()
        .unwrap_or(0);
    info!(label = %validated.label, count, "session enrolled");
    Ok(count)
}

pub fn label_counts(store: &dyn SessionStore) -> Result<BTreeMap<String, usize>, StoreError> {
    store.label_counts()
}

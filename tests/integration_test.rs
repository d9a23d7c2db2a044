//! Integration test: config load, enroll through a store, train, persist, load, predict.

mod common;

use common::{session, sessions, FAST, SLOW};
use keystyle::config::{KeystyleConfig, StoreBackend};
use keystyle::error::TrainingError;
use keystyle::logging::{AuditRecord, StructuredLogger};
use keystyle::predict::ConfidenceBand;
use keystyle::storage::{JsonSessionStore, SessionStore};
use keystyle::{pipeline, ModelStore, SessionValidator};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::Path;

#[test]
fn config_load_default() {
    let c = KeystyleConfig::load(Path::new("nonexistent.json"));
    assert_eq!(c.validation.min_similarity, 0.8);
    assert_eq!(c.training.min_sessions_per_label, 10);
    assert_eq!(c.training.seed, 42);
    assert_eq!(c.store.backend, StoreBackend::Json);
    assert!(c.validate().is_ok());
}

#[test]
fn partial_config_keeps_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keystyle.json");
    std::fs::write(&path, r#"{"training": {"seed": 7}, "log": {"json": true}}"#).unwrap();
    let c = KeystyleConfig::load(&path);
    assert_eq!(c.training.seed, 7);
    assert_eq!(c.training.forest.n_trees, 100);
    assert!(c.log.json);
    assert_eq!(c.log.level, "info");
}

#[test]
fn config_validation_rejects_nonsense() {
    let mut c = KeystyleConfig::default();
    c.validation.min_events = 1;
    assert!(c.validate().is_err());

    let mut c = KeystyleConfig::default();
    c.training.forest.n_trees = 0;
    assert!(c.validate().is_err());

    let mut c = KeystyleConfig::default();
    c.confidence.medium_threshold = 0.9;
    assert!(c.validate().is_err());
}

#[test]
fn config_validation_rejects_loosened_gates() {
    let mut c = KeystyleConfig::default();
    c.validation.min_similarity = 0.3;
    assert!(c.validate().is_err());

    let mut c = KeystyleConfig::default();
    c.training.min_sessions_per_label = 2;
    assert!(c.validate().is_err());

    let mut c = KeystyleConfig::default();
    c.training.min_labels = 1;
    assert!(c.validate().is_err());

    let mut c = KeystyleConfig::default();
    c.validation.min_similarity = 0.9;
    c.training.min_sessions_per_label = 15;
    assert!(c.validate().is_ok());
}

fn config_in(dir: &Path) -> KeystyleConfig {
    let mut c = KeystyleConfig::default();
    c.store.path = dir.join("sessions.json");
    c.model_dir = dir.join("artifacts");
    c
}

#[test]
fn enroll_train_predict_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let store = JsonSessionStore::new(&config.store.path);
    let model_store = ModelStore::new(&config.model_dir);
    let validator = SessionValidator::new(config.prompt.clone(), &config.validation);

    assert!(matches!(
        pipeline::load_model(&model_store),
        Err(keystyle::error::PredictionError::ModelNotTrained(_))
    ));

    for s in sessions("alice", FAST, 12, 1) {
        pipeline::enroll(&store, &validator, s).unwrap();
    }
    let mut last = 0;
    for s in sessions("bob", SLOW, 12, 2) {
        last = pipeline::enroll(&store, &validator, s).unwrap();
    }
    assert_eq!(last, 12);

    // Written behind the validator's back; training must skip it
    let mut bad = sessions("bob", SLOW, 1, 3).remove(0);
    bad.typed_text = "nothing like the prompt".into();
    store.append(&bad).unwrap();

    let report = pipeline::train(&store, &model_store, &config).unwrap();
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.model.metrics().label_counts.get("bob"), Some(&12));

    let model = pipeline::load_model(&model_store).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(77);
    let fresh = validator.validate(session("?", SLOW, &mut rng)).unwrap();
    let result = pipeline::predict_with(&model, &fresh, &config).unwrap();
    assert_eq!(result.label, "bob");
    assert_eq!(result.band, ConfidenceBand::High);

    let mut line = Vec::new();
    StructuredLogger::emit_json(&AuditRecord::predicted(&fresh.id, &result), &mut line).unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&line).unwrap();
    assert_eq!(parsed["event"], "predicted");
    assert_eq!(parsed["label"], "bob");
}

#[test]
fn enroll_refuses_invalid_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonSessionStore::new(dir.path().join("sessions.json"));
    let validator = SessionValidator::new(common::PROMPT, &Default::default());

    let mut s = sessions("alice", FAST, 1, 1).remove(0);
    s.events.truncate(1);
    assert!(pipeline::enroll(&store, &validator, s).is_err());
    assert!(store.load_all().unwrap().is_empty());
}

#[test]
fn training_failure_leaves_previous_model_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let store = JsonSessionStore::new(&config.store.path);
    let model_store = ModelStore::new(&config.model_dir);
    let validator = SessionValidator::new(config.prompt.clone(), &config.validation);

    for s in sessions("alice", FAST, 10, 1).into_iter().chain(sessions("bob", SLOW, 10, 2)) {
        pipeline::enroll(&store, &validator, s).unwrap();
    }
    let first = pipeline::train(&store, &model_store, &config).unwrap().model;

    for s in sessions("carol", FAST, 4, 3) {
        pipeline::enroll(&store, &validator, s).unwrap();
    }
    match pipeline::train(&store, &model_store, &config) {
        Err(TrainingError::InsufficientSessions { label, have, .. }) => {
            assert_eq!((label.as_str(), have), ("carol", 4))
        }
        other => panic!("expected InsufficientSessions, got {other:?}"),
    }
    assert_eq!(pipeline::load_model(&model_store).unwrap(), first);
}

#[test]
fn single_label_training_is_refused_even_when_configured() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    let store = JsonSessionStore::new(&config.store.path);
    let model_store = ModelStore::new(&config.model_dir);
    let validator = SessionValidator::new(config.prompt.clone(), &config.validation);

    for s in sessions("alice", FAST, 10, 1).into_iter().chain(sessions("bob", SLOW, 10, 2)) {
        pipeline::enroll(&store, &validator, s).unwrap();
    }
    let first = pipeline::train(&store, &model_store, &config).unwrap().model;

    let solo_dir = tempfile::tempdir().unwrap();
    let solo = JsonSessionStore::new(solo_dir.path().join("sessions.json"));
    for s in sessions("alice", FAST, 12, 4) {
        pipeline::enroll(&solo, &validator, s).unwrap();
    }
    config.training.min_labels = 1;
    assert!(matches!(
        pipeline::train(&solo, &model_store, &config),
        Err(TrainingError::InvalidConfig(_))
    ));
    assert_eq!(pipeline::load_model(&model_store).unwrap(), first);
}

#[test]
fn store_label_counts() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonSessionStore::new(dir.path().join("sessions.json"));
    for s in sessions("alice", FAST, 3, 1) {
        store.append(&s).unwrap();
    }
    let counts = pipeline::label_counts(&store).unwrap();
    assert_eq!(counts.get("alice"), Some(&3));
}

//! Trainer gates, determinism, and the separated-typists scenario.

mod common;

use common::{dataset, session, FAST, SLOW};
use keystyle::config::{ForestConfig, TrainingConfig};
use keystyle::error::TrainingError;
use keystyle::model::{DecisionTree, TreeParams};
use keystyle::train::stratified_split;
use keystyle::{pipeline, FeatureExtractor, Predictor, SessionValidator, Trainer};
use ndarray::Array2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn trainer() -> Trainer {
    Trainer::new(TrainingConfig::default())
}

#[test]
fn nine_sessions_for_one_label_is_insufficient() {
    let ds = dataset(&[("A", FAST, 10), ("B", SLOW, 9)]);
    match trainer().train(&ds).unwrap_err() {
        TrainingError::InsufficientSessions {
            label,
            have,
            need,
            counts,
        } => {
            assert_eq!(label, "B");
            assert_eq!((have, need), (9, 10));
            assert_eq!(counts.get("A"), Some(&10));
        }
        other => panic!("expected InsufficientSessions, got {other:?}"),
    }
}

#[test]
fn ten_sessions_per_label_trains() {
    let ds = dataset(&[("A", FAST, 10), ("B", SLOW, 10)]);
    let model = trainer().train(&ds).unwrap();
    assert_eq!(model.labels(), ["A".to_string(), "B".to_string()]);
    assert_eq!(model.metrics().train_size + model.metrics().test_size, 20);
}

#[test]
fn one_label_is_insufficient() {
    let ds = dataset(&[("A", FAST, 15)]);
    assert!(matches!(
        trainer().train(&ds),
        Err(TrainingError::InsufficientLabels { have: 1, need: 2 })
    ));
}

#[test]
fn configured_gates_never_drop_below_floor() {
    let loose = Trainer::new(TrainingConfig {
        min_labels: 1,
        min_sessions_per_label: 2,
        ..TrainingConfig::default()
    });
    assert!(matches!(
        loose.train(&dataset(&[("A", FAST, 15)])),
        Err(TrainingError::InsufficientLabels { have: 1, need: 2 })
    ));
    assert!(matches!(
        loose.train(&dataset(&[("A", FAST, 12), ("B", SLOW, 4)])),
        Err(TrainingError::InsufficientSessions { have: 4, need: 10, .. })
    ));

    let strict = Trainer::new(TrainingConfig {
        min_sessions_per_label: 12,
        ..TrainingConfig::default()
    });
    assert!(matches!(
        strict.train(&dataset(&[("A", FAST, 12), ("B", SLOW, 11)])),
        Err(TrainingError::InsufficientSessions { have: 11, need: 12, .. })
    ));
}

#[test]
fn empty_dataset_reports_labels() {
    let ds = dataset(&[]);
    assert!(matches!(
        trainer().train(&ds),
        Err(TrainingError::InsufficientLabels { have: 0, .. })
    ));
}

#[test]
fn insufficient_sessions_message_is_actionable() {
    let ds = dataset(&[("A", FAST, 12), ("B", SLOW, 6)]);
    let msg = trainer().train(&ds).unwrap_err().to_string();
    assert_eq!(msg, "need 10 sessions for label \"B\", have 6");
}

#[test]
fn split_is_stratified_and_reproducible() {
    let ds = dataset(&[("A", FAST, 15), ("B", SLOW, 10)]);
    let a = stratified_split(&ds, 0.2, 42);
    let b = stratified_split(&ds, 0.2, 42);
    assert_eq!(a.test, b.test);
    assert_eq!(a.train, b.train);

    let test_a = a.test.iter().filter(|(c, _)| *c == 0).count();
    let test_b = a.test.iter().filter(|(c, _)| *c == 1).count();
    assert_eq!((test_a, test_b), (3, 2));
    assert_eq!(a.train.len(), 20);
}

#[test]
fn same_dataset_and_seed_reproduce_forest_and_predictions() {
    let ds = dataset(&[("A", FAST, 15), ("B", SLOW, 15)]);
    let first = trainer().train(&ds).unwrap();
    let second = trainer().train(&ds).unwrap();
    assert_eq!(first.forest(), second.forest());
    assert_eq!(first.metrics(), second.metrics());

    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let validator = SessionValidator::new(common::PROMPT, &Default::default());
    let p1 = Predictor::new(&first).unwrap();
    let p2 = Predictor::new(&second).unwrap();
    for typist in [FAST, SLOW, FAST] {
        let s = validator.validate(session("?", typist, &mut rng)).unwrap();
        assert_eq!(p1.predict(&s).unwrap(), p2.predict(&s).unwrap());
    }
}

#[test]
fn different_seed_still_trains() {
    let ds = dataset(&[("A", FAST, 15), ("B", SLOW, 15)]);
    let config = TrainingConfig {
        seed: 7,
        ..TrainingConfig::default()
    };
    let model = Trainer::new(config).train(&ds).unwrap();
    assert_eq!(model.metrics().seed, 7);
}

#[test]
fn separated_typists_are_told_apart() {
    let ds = dataset(&[("A", FAST, 15), ("B", SLOW, 15)]);
    let model = trainer().train(&ds).unwrap();
    assert!(model.metrics().accuracy > 0.99);

    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let fresh = pipeline::validate_session(session("?", FAST, &mut rng), common::PROMPT).unwrap();
    let result = pipeline::predict(&model, &fresh).unwrap();
    assert_eq!(result.label, "A");
    assert!(result.confidence > 0.7, "confidence {}", result.confidence);
}

#[test]
fn three_labels_train_with_shallow_trees() {
    let medium = common::Typist {
        dwell: 115.0,
        ..FAST
    };
    let ds = dataset(&[("A", FAST, 12), ("B", SLOW, 12), ("C", medium, 12)]);
    let config = TrainingConfig {
        forest: ForestConfig {
            n_trees: 25,
            max_depth: Some(3),
            ..ForestConfig::default()
        },
        ..TrainingConfig::default()
    };
    let model = Trainer::new(config).train(&ds).unwrap();
    assert_eq!(model.forest().n_trees(), 25);
    assert_eq!(model.labels().len(), 3);
    assert_eq!(model.metrics().label_recall.len(), 3);
}

#[test]
fn invalid_test_fraction_is_refused() {
    let ds = dataset(&[("A", FAST, 10), ("B", SLOW, 10)]);
    let config = TrainingConfig {
        test_fraction: 1.0,
        ..TrainingConfig::default()
    };
    assert!(matches!(
        Trainer::new(config).train(&ds),
        Err(TrainingError::InvalidConfig(_))
    ));
}

#[test]
fn dataset_from_sessions_skips_invalid_ones() {
    let mut sessions = common::sessions("A", FAST, 3, 5);
    sessions[1].typed_text = "something else entirely".into();
    sessions[2].events.truncate(1);
    let validator = SessionValidator::new(common::PROMPT, &Default::default());
    let (ds, skipped) = keystyle::Dataset::from_sessions(sessions, &validator, &FeatureExtractor::new());
    assert_eq!(ds.len(), 1);
    assert_eq!(skipped.len(), 2);
    assert!(skipped.iter().all(|s| s.label == "A"));
}

#[test]
fn constant_sampled_features_do_not_stop_the_split_search() {
    // Only the last column separates the classes
    let x = Array2::from_shape_fn((20, 6), |(i, j)| if j == 5 { i as f64 } else { 1.0 });
    let y: Vec<usize> = (0..20).map(|i| usize::from(i >= 10)).collect();
    let rows: Vec<usize> = (0..20).collect();
    let params = TreeParams {
        max_depth: None,
        min_samples_split: 2,
        max_features: 1,
    };

    for seed in 0..12 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let tree = DecisionTree::fit(x.view(), &y, &rows, 2, params, &mut rng);
        assert_eq!(tree.predict_proba(&[1.0, 1.0, 1.0, 1.0, 1.0, 2.0]), [1.0, 0.0], "seed {seed}");
        assert_eq!(tree.predict_proba(&[1.0, 1.0, 1.0, 1.0, 1.0, 17.0]), [0.0, 1.0], "seed {seed}");
    }
}

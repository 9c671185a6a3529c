mod common;

use std::fs;

use limbic::{ArtifactStore, ModelKind, PredictionMode, Trainer};

#[test]
fn test_training_persists_every_artifact() {
    common::init();
    let dir = tempfile::tempdir().unwrap();
    let config = common::test_config(dir.path());
    let trainer = Trainer::new(config.clone());

    let report = trainer.train_on(&common::toy_examples()).unwrap();
    assert_eq!(report.samples, 48);
    assert_eq!(report.test_size, 10);
    assert_eq!(report.train_size, 38);
    assert!(report.vocabulary_size > 6);
    assert_eq!(
        report.scores.iter().map(|s| s.model).collect::<Vec<_>>(),
        ModelKind::ALL.to_vec()
    );

    let best = report.best.expect("a best model is chosen");
    assert_eq!(
        common::model_files(&config.model_dir),
        vec![
            "best_model.json",
            "best_model.txt",
            "decision_tree.json",
            "log_reg.json",
            "naive_bayes.json",
            "random_forest.json",
            "svm.json",
            "vectorizer.json",
            "xgboost.json",
        ]
    );
    let best_name = fs::read_to_string(config.model_dir.join("best_model.txt")).unwrap();
    assert_eq!(best_name, best.model.name());
}

#[test]
fn test_first_top_scorer_is_best() {
    let dir = tempfile::tempdir().unwrap();
    let trainer = Trainer::new(common::test_config(dir.path()));
    let report = trainer.train_on(&common::toy_examples()).unwrap();

    let top = report
        .scores
        .iter()
        .map(|s| s.accuracy)
        .fold(0.0, f64::max);
    let first_top = report.scores.iter().find(|s| s.accuracy == top).copied();
    assert_eq!(report.best, first_top);
}

#[test]
fn test_retraining_is_reproducible() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    let examples = common::toy_examples();

    let a = Trainer::new(common::test_config(first.path()))
        .train_on(&examples)
        .unwrap();
    let b = Trainer::new(common::test_config(second.path()))
        .train_on(&examples)
        .unwrap();
    assert_eq!(a, b);
    assert_eq!(
        fs::read(first.path().join("models/random_forest.json")).unwrap(),
        fs::read(second.path().join("models/random_forest.json")).unwrap()
    );
}

#[test]
fn test_without_holdout_no_best_model() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::test_config(dir.path()).with_holdout_fraction(0.0);
    let report = Trainer::new(config.clone())
        .train_on(&common::toy_examples())
        .unwrap();

    assert_eq!(report.train_size, 48);
    assert_eq!(report.test_size, 0);
    assert!(report.scores.is_empty());
    assert!(report.best.is_none());

    let store = ArtifactStore::new(&config.model_dir);
    assert!(store.has_artifacts(PredictionMode::All));
    assert!(!store.has_artifacts(PredictionMode::Best));
    assert!(!store.best_model_path().exists());
    assert!(!store.best_name_path().exists());
}

#[test]
fn test_train_reads_configured_dataset() {
    let dir = tempfile::tempdir().unwrap();
    common::write_toy_csv(dir.path());
    let trainer = Trainer::new(common::test_config(dir.path()));

    let report = tokio_test::block_on(trainer.train()).unwrap();
    assert_eq!(report.samples, 48);
    assert!(trainer.store().has_artifacts(PredictionMode::Best));
}

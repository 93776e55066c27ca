//! Alignment Tests
//!
//! Strict and relaxed tag/step policies over in-memory run stores.

use tensorboard_reducer::align::{AlignPolicy, AlignmentEngine};
use tensorboard_reducer::run::{RunScalars, RunStore};
use tensorboard_reducer::Error;

fn store(runs: Vec<RunScalars>) -> RunStore {
    runs.into_iter().collect()
}

// =============================================================================
// Strict policy
// =============================================================================

#[test]
fn test_matrix_columns_follow_run_order() {
    let store = store(vec![
        RunScalars::builder("runs/b").series("loss", &[1.0, 5.0]).build(),
        RunScalars::builder("runs/a").series("loss", &[3.0, 7.0]).build(),
    ]);

    let events = AlignmentEngine::default().align(&store).unwrap();
    let loss = events.get("loss").unwrap();

    assert_eq!(loss.runs(), &["runs/b".to_string(), "runs/a".to_string()]);
    assert_eq!(loss.column(0), Some(vec![1.0, 5.0]));
    assert_eq!(loss.column(2), None);
    assert_eq!(loss.row(0), &[1.0, 3.0]);
}

#[test]
fn test_strict_tags_reports_every_missing_tag() {
    let store = store(vec![
        RunScalars::builder("a").series("loss", &[1.0]).build(),
        RunScalars::builder("b")
            .series("loss", &[1.0])
            .series("acc", &[0.5])
            .build(),
    ]);

    match AlignmentEngine::default().align(&store) {
        Err(Error::TagMismatch { missing }) => {
            assert_eq!(missing, vec![("a".to_string(), vec!["acc".to_string()])]);
        }
        other => panic!("expected TagMismatch, got {other:?}"),
    }
}

#[test]
fn test_strict_steps_rejects_different_step_values() {
    let store = store(vec![
        RunScalars::builder("a")
            .scalar("loss", 0, 1.0)
            .scalar("loss", 10, 2.0)
            .build(),
        RunScalars::builder("b")
            .scalar("loss", 0, 1.0)
            .scalar("loss", 20, 2.0)
            .build(),
    ]);

    match AlignmentEngine::default().align(&store) {
        Err(Error::StepMismatch { tag, detail, .. }) => {
            assert_eq!(tag, "loss");
            assert!(detail.contains("index 1"), "detail: {detail}");
        }
        other => panic!("expected StepMismatch, got {other:?}"),
    }
}

#[test]
fn test_strict_steps_reports_lengths() {
    let store = store(vec![
        RunScalars::builder("a").series("loss", &[0.0; 10]).build(),
        RunScalars::builder("b").series("loss", &[0.0; 12]).build(),
    ]);

    match AlignmentEngine::default().align(&store) {
        Err(Error::StepMismatch { lengths, .. }) => {
            assert_eq!(lengths, vec![("a".to_string(), 10), ("b".to_string(), 12)]);
        }
        other => panic!("expected StepMismatch, got {other:?}"),
    }
}

// =============================================================================
// Relaxed policy
// =============================================================================

#[test]
fn test_relaxed_tags_uses_union() {
    let store = store(vec![
        RunScalars::builder("a").series("loss", &[1.0, 2.0]).build(),
        RunScalars::builder("b")
            .series("loss", &[3.0, 4.0])
            .series("acc", &[0.5, 0.6])
            .build(),
    ]);

    let policy = AlignPolicy {
        strict_tags: false,
        strict_steps: true,
    };
    let events = AlignmentEngine::new(policy).align(&store).unwrap();

    assert_eq!(events.tags().collect::<Vec<_>>(), vec!["acc", "loss"]);
    assert_eq!(events.get("acc").unwrap().n_runs(), 1);
    assert_eq!(events.get("acc").unwrap().runs(), &["b".to_string()]);
    assert_eq!(events.get("loss").unwrap().n_runs(), 2);
    assert_eq!(events.n_runs(), 2);
}

#[test]
fn test_relaxed_steps_truncates_to_shortest() {
    let store = store(vec![
        RunScalars::builder("a").series("loss", &[0.0; 10]).build(),
        RunScalars::builder("b").series("loss", &[1.0; 12]).build(),
    ]);

    let events = AlignmentEngine::new(AlignPolicy::relaxed())
        .align(&store)
        .unwrap();
    let loss = events.get("loss").unwrap();

    assert_eq!(loss.shape(), (10, 2));
    assert_eq!(loss.steps(), (0..10).collect::<Vec<i64>>().as_slice());
}

#[test]
fn test_relaxed_steps_takes_step_axis_from_first_run() {
    let store = store(vec![
        RunScalars::builder("a")
            .scalar("loss", 0, 1.0)
            .scalar("loss", 5, 2.0)
            .build(),
        RunScalars::builder("b")
            .scalar("loss", 1, 3.0)
            .scalar("loss", 6, 4.0)
            .scalar("loss", 9, 5.0)
            .build(),
    ]);

    let events = AlignmentEngine::new(AlignPolicy::relaxed())
        .align(&store)
        .unwrap();
    let loss = events.get("loss").unwrap();

    assert_eq!(loss.steps(), &[0, 5]);
    assert_eq!(loss.row(1), &[2.0, 4.0]);
}

#[test]
fn test_relaxed_never_pads() {
    let store = store(vec![
        RunScalars::builder("a").series("loss", &[1.0, 2.0, 3.0]).build(),
        RunScalars::builder("b").series("loss", &[4.0]).build(),
    ]);

    let events = AlignmentEngine::new(AlignPolicy::relaxed())
        .align(&store)
        .unwrap();
    let loss = events.get("loss").unwrap();

    assert_eq!(loss.n_steps(), 1);
    assert!(loss.rows().flatten().all(|v| v.is_finite()));
}

// =============================================================================
// Empty input
// =============================================================================

#[test]
fn test_empty_store_is_rejected() {
    assert!(matches!(
        AlignmentEngine::default().align(&RunStore::new()),
        Err(Error::EmptyInput(_))
    ));
}

#[test]
fn test_runs_without_scalars_are_rejected() {
    let store = store(vec![RunScalars::builder("a").build()]);
    assert!(matches!(
        AlignmentEngine::new(AlignPolicy::relaxed()).align(&store),
        Err(Error::EmptyInput(_))
    ));
}

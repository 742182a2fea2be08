//! Failure-injection tests for bulk moves and the candidate removal cascade.
//!
//! # Properties Tested
//!
//! 1. **Independent bulk moves**: one candidate's failed write never blocks
//!    the others, and the failure is reported per candidate
//! 2. **Ordered removal**: responses, then events, then the candidate
//! 3. **Visible partial removal**: a failure partway leaves earlier steps
//!    committed and a repeated call finishes the job

mod common;

use common::*;
use hireflow::tracker::RemovalStep;
use hireflow::{PipelineError, PipelineStore, ScheduleRequest};

fn seed_three(harness: &TestHarness) {
    harness.seed_stages(&three_stage_job());
    for (id, minutes) in [("a", 3), ("b", 2), ("c", 1)] {
        harness.seed_candidate(
            CandidateBuilder::new(id)
                .at_stage("screening")
                .applied_minutes_ago(minutes)
                .build(),
        );
    }
}

/// Candidate with two events (screening passed, technical pending) and three
/// responses.
async fn seed_interviewed(harness: &TestHarness) -> Vec<String> {
    harness.seed_stages(&three_stage_job());
    harness.seed_candidate(CandidateBuilder::new("c1").build());
    let tracker = harness.tracker();

    let request =
        ScheduleRequest::new("c1", "screening", tomorrow(), "https://meet.example/room-1");
    tracker.schedule_stage(request).await.unwrap();
    tracker.advance_to_next_stage("c1").await.unwrap();

    let events = harness.events("c1").await;
    assert_eq!(events.len(), 2);
    harness.record_response(&events[0].id, "I like the product");
    harness.record_response(&events[0].id, "Five years of Rust");
    harness.record_response(&events[1].id, "Whiteboard answer");
    events.into_iter().map(|e| e.id).collect()
}

// ============================================================================
// Bulk move
// ============================================================================

#[tokio::test]
async fn test_bulk_move_reports_the_failed_candidate() {
    let harness = TestHarness::new();
    seed_three(&harness);
    harness.store.fail_commit_for("b", Fault::Unavailable);
    let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];

    let report = harness.tracker().bulk_move(&ids, "technical").await;

    assert!(!report.is_complete());
    assert_eq!(report.succeeded().collect::<Vec<_>>(), vec!["a", "c"]);
    let failed: Vec<&str> = report.failed().map(|(id, _)| id).collect();
    assert_eq!(failed, vec!["b"]);
    assert!(matches!(
        report.failed().next().unwrap().1,
        PipelineError::Store(_)
    ));

    for (id, expected) in [("a", "technical"), ("b", "screening"), ("c", "technical")] {
        let candidate = harness.candidate(id).await.unwrap();
        assert_eq!(candidate.current_stage_id.as_deref(), Some(expected), "{}", id);
    }

    let err = report.into_result().unwrap_err();
    assert!(err.is_partial());
    let PipelineError::PartialBulkFailure { failed, succeeded } = err else {
        panic!("expected a partial bulk failure");
    };
    assert_eq!(failed, vec!["b".to_string()]);
    assert_eq!(succeeded, vec!["a".to_string(), "c".to_string()]);
}

#[tokio::test]
async fn test_bulk_move_all_succeed() {
    let harness = TestHarness::new();
    seed_three(&harness);
    let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];

    let moved = harness
        .tracker()
        .bulk_move(&ids, "hr")
        .await
        .into_result()
        .unwrap();

    assert_eq!(moved.len(), 3);
    assert!(moved.iter().all(|c| c.is_at("hr")));
}

#[tokio::test]
async fn test_bulk_move_reports_unknown_candidates() {
    let harness = TestHarness::new();
    seed_three(&harness);
    let ids = vec!["a".to_string(), "ghost".to_string()];

    let report = harness.tracker().bulk_move(&ids, "technical").await;
    let failed: Vec<(&str, &PipelineError)> = report.failed().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].0, "ghost");
    assert!(matches!(failed[0].1, PipelineError::NotFound { .. }));
    assert_eq!(report.succeeded().count(), 1);
}

// ============================================================================
// Removal cascade
// ============================================================================

#[tokio::test]
async fn test_remove_candidate_deletes_everything() {
    let harness = TestHarness::new();
    let event_ids = seed_interviewed(&harness).await;
    let token = harness
        .sqlite
        .invitation_for_event(&event_ids[0])
        .await
        .unwrap()
        .unwrap()
        .token;
    assert_eq!(harness.sqlite.responses_for_candidate("c1").await.unwrap().len(), 3);

    let report = harness.tracker().remove_candidate("c1").await.unwrap();

    assert_eq!(report.responses_removed, 3);
    assert_eq!(report.events_removed, 2);
    assert!(report.candidate_removed);
    assert!(harness.candidate("c1").await.is_none());
    assert!(harness.events("c1").await.is_empty());
    assert!(harness
        .sqlite
        .responses_for_candidate("c1")
        .await
        .unwrap()
        .is_empty());
    assert!(harness.sqlite.invitation_by_token(&token).await.unwrap().is_none());
}

#[tokio::test]
async fn test_removal_failure_at_events_keeps_responses_deleted() {
    let harness = TestHarness::new();
    seed_interviewed(&harness).await;
    harness.store.fail_step(RemovalStep::Events);
    let tracker = harness.tracker();

    let err = tracker.remove_candidate("c1").await.unwrap_err();
    assert!(err.is_partial());
    let PipelineError::CascadeFailure {
        candidate_id,
        completed,
        failed_step,
        ..
    } = err
    else {
        panic!("expected a cascade failure");
    };
    assert_eq!(candidate_id, "c1");
    assert_eq!(completed, vec![RemovalStep::Responses]);
    assert_eq!(failed_step, RemovalStep::Events);

    assert!(harness
        .sqlite
        .responses_for_candidate("c1")
        .await
        .unwrap()
        .is_empty());
    assert_eq!(harness.events("c1").await.len(), 2);
    assert!(harness.candidate("c1").await.is_some());

    let report = tracker.remove_candidate("c1").await.unwrap();
    assert_eq!(report.responses_removed, 0);
    assert_eq!(report.events_removed, 2);
    assert!(report.candidate_removed);
    assert!(harness.candidate("c1").await.is_none());
}

#[tokio::test]
async fn test_removal_failure_at_candidate_step() {
    let harness = TestHarness::new();
    seed_interviewed(&harness).await;
    harness.store.fail_step(RemovalStep::Candidate);

    let err = harness.tracker().remove_candidate("c1").await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::CascadeFailure {
            failed_step: RemovalStep::Candidate,
            ..
        }
    ));
    assert!(err.to_string().contains("delete responses, delete events"));
    assert!(harness.events("c1").await.is_empty());
    assert!(harness.candidate("c1").await.is_some());
}

#[tokio::test]
async fn test_removal_failure_at_first_step_changes_nothing() {
    let harness = TestHarness::new();
    seed_interviewed(&harness).await;
    harness.store.fail_step(RemovalStep::Responses);

    let err = harness.tracker().remove_candidate("c1").await.unwrap_err();
    assert!(matches!(err, PipelineError::Store(_)));
    assert!(!err.is_partial());
    assert_eq!(harness.sqlite.responses_for_candidate("c1").await.unwrap().len(), 3);
    assert_eq!(harness.events("c1").await.len(), 2);
}

#[tokio::test]
async fn test_remove_unknown_candidate_is_not_found() {
    let harness = TestHarness::new();
    let err = harness.tracker().remove_candidate("ghost").await.unwrap_err();
    assert!(matches!(err, PipelineError::NotFound { entity: "candidate", .. }));
}

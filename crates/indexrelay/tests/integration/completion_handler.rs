/*
 *  Copyright 2025-2026 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Completion handler behaviour against a scripted indexer and in-memory queue.

use chrono::{Duration, Utc};
use indexrelay::{ErrorCode, HandlerError, HandlerOutcome, IndexerState, Payload, Task};
use indexrelay_testing::{LoopbackHarness, RunBehavior};

use crate::fixtures::{completion_payload, reference_time, single_message, INDEXER};

async fn handle(harness: &LoopbackHarness, retries: u32) -> Result<HandlerOutcome, HandlerError> {
    let payload = completion_payload(reference_time(), retries);
    harness.dispatcher().handle(payload.into()).await
}

#[tokio::test]
async fn test_stale_success_escalates_to_trigger_queue() {
    let harness = LoopbackHarness::new();
    harness.indexer.set_state(
        INDEXER,
        IndexerState::Success,
        Some(reference_time() - Duration::minutes(1)),
    );

    let before = Utc::now();
    handle(&harness, 4).await.unwrap();
    let after = Utc::now();

    let (message, payload) = single_message(&harness);
    assert_eq!(message.queue, "pending_index_trigger");
    assert_eq!(payload.kind(), Task::PendingIndexTrigger);
    assert_eq!(payload.header().task, Task::PendingIndexTrigger);
    assert_eq!(payload.header().retries_remaining, 3);
    assert_eq!(payload.errors().len(), 1);
    assert_eq!(
        payload.errors()[0].error_code(),
        Some(ErrorCode::IndexerNotTriggered)
    );

    let visible_after = message.visible_after.expect("escalation must be delayed");
    assert!(visible_after >= before + Duration::minutes(128));
    assert!(visible_after <= after + Duration::minutes(128));
    assert!(message.body.contains("\"task\":\"pending_index_trigger\""));
    assert!(!message.body.contains("indexer_start_time"));
}

#[tokio::test]
async fn test_fresh_success_completes_without_publishing() {
    let harness = LoopbackHarness::new();
    harness.indexer.set_state(
        INDEXER,
        IndexerState::Success,
        Some(reference_time() + Duration::minutes(1)),
    );

    let outcome = handle(&harness, 0).await.unwrap();

    assert_eq!(
        outcome,
        HandlerOutcome::Completed {
            indexer: INDEXER.to_string()
        }
    );
    assert!(outcome.messages().is_empty());
    assert!(harness.queue.is_empty());
}

#[tokio::test]
async fn test_transient_failure_counts_as_success() {
    let harness = LoopbackHarness::new();
    harness
        .indexer
        .set_transient_failure(INDEXER, reference_time() + Duration::minutes(1));

    let outcome = handle(&harness, 2).await.unwrap();

    assert!(outcome.is_completed());
    assert!(harness.queue.is_empty());
}

#[tokio::test]
async fn test_running_keeps_waiting_on_completion_queue() {
    let harness = LoopbackHarness::new();
    harness.indexer.set_state(
        INDEXER,
        IndexerState::Running,
        Some(reference_time() + Duration::minutes(1)),
    );

    let before = Utc::now();
    handle(&harness, 1).await.unwrap();

    let (message, payload) = single_message(&harness);
    assert_eq!(message.queue, "pending_index_completion");
    assert_eq!(payload.header().retries_remaining, 0);
    assert_eq!(
        payload.errors()[0].error_code(),
        Some(ErrorCode::IndexerNotCompleted)
    );
    let visible_after = message.visible_after.expect("re-queue must be delayed");
    assert!(visible_after >= before + Duration::minutes(1024));
    assert_eq!(harness.indexer.run_count(INDEXER), 0);
}

#[tokio::test]
async fn test_failed_run_is_retriggered_and_awaited() {
    let harness = LoopbackHarness::new();
    let created = reference_time();
    harness.indexer.set_state(
        INDEXER,
        IndexerState::Retrigger,
        Some(created + Duration::minutes(1)),
    );
    let payload = completion_payload(created, 6);
    let start_time = payload.body.indexer_start_time;

    harness.dispatcher().handle(payload.into()).await.unwrap();

    assert_eq!(harness.indexer.run_count(INDEXER), 1);
    let (message, payload) = single_message(&harness);
    assert_eq!(message.queue, "pending_index_completion");
    assert_eq!(payload.header().retries_remaining, 5);
    assert_eq!(payload.header().creation_timestamp, created);
    assert_eq!(
        payload.errors()[0].error_code(),
        Some(ErrorCode::IndexerNotCompleted)
    );
    match payload {
        Payload::Completion(p) => assert_eq!(p.body.indexer_start_time, start_time),
        other => panic!("expected completion payload, got {:?}", other.kind()),
    }
}

#[tokio::test]
async fn test_failed_restart_is_recorded() {
    let harness = LoopbackHarness::new();
    harness.indexer.on_run(RunBehavior::Fail);
    harness.indexer.set_state(
        INDEXER,
        IndexerState::Retrigger,
        Some(reference_time() + Duration::minutes(1)),
    );

    handle(&harness, 6).await.unwrap();

    assert_eq!(harness.indexer.run_count(INDEXER), 0);
    let (message, payload) = single_message(&harness);
    assert_eq!(message.queue, "pending_index_completion");
    assert_eq!(payload.header().retries_remaining, 5);
    let codes: Vec<_> = payload.errors().iter().map(|e| e.error_code()).collect();
    assert_eq!(
        codes,
        vec![
            Some(ErrorCode::IndexerNotCompleted),
            Some(ErrorCode::IndexerNotTriggered)
        ]
    );
}

#[tokio::test]
async fn test_exhausted_budget_fails_with_error_trail() {
    let harness = LoopbackHarness::new();
    harness.indexer.set_state(
        INDEXER,
        IndexerState::Running,
        Some(reference_time() + Duration::minutes(1)),
    );
    let mut payload = completion_payload(reference_time(), 0);
    payload.push_error(ErrorCode::IndexerNotCompleted, "still running");
    payload.push_error(ErrorCode::IndexerNotCompleted, "still running");

    let err = harness
        .dispatcher()
        .handle(payload.into())
        .await
        .unwrap_err();

    assert!(err.is_terminal());
    match err {
        HandlerError::DelayProcessing {
            indexer,
            task,
            errors,
        } => {
            assert_eq!(indexer, INDEXER);
            assert_eq!(task, Task::PendingIndexCompletion);
            assert_eq!(errors.len(), 2);
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(harness.queue.is_empty());
}

#[tokio::test]
async fn test_stale_success_without_budget_fails() {
    let harness = LoopbackHarness::new();
    harness.indexer.set_state(
        INDEXER,
        IndexerState::Success,
        Some(reference_time() - Duration::minutes(1)),
    );

    let err = handle(&harness, 0).await.unwrap_err();

    assert!(err.is_terminal());
    assert!(harness.queue.is_empty());
}

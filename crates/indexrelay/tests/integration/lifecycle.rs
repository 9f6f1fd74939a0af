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

//! End-to-end request lifecycles driven through the loopback harness.

use chrono::Duration;
use indexrelay::{
    ErrorCode, HandlerError, IndexRelayConfig, IndexerState, PendingIndexRequest, Task,
};
use indexrelay_testing::{LoopbackHarness, RunBehavior};

use crate::fixtures::{reference_time, BLOB_URL, INDEXER};

fn request() -> PendingIndexRequest {
    PendingIndexRequest::new(INDEXER, BLOB_URL).id(7, "contract_id")
}

#[tokio::test]
async fn test_busy_indexer_spends_whole_budget_then_fails() {
    let harness = LoopbackHarness::new();
    harness.indexer.set_state(
        INDEXER,
        IndexerState::Running,
        Some(reference_time() - Duration::days(1)),
    );
    harness.submit(request()).await.unwrap();

    let mut previous_backoff = None;
    for expected in (0..10u32).rev() {
        let outcome = harness.step().await.expect("a message is pending").unwrap();
        assert_eq!(outcome.messages().len(), 1);

        let messages = harness.queue.messages();
        assert_eq!(messages.len(), 1);
        let payload = messages[0].payload().unwrap();
        let header = payload.header();

        assert_eq!(payload.kind(), Task::PendingIndexTrigger);
        assert_eq!(header.retries_remaining, expected);
        assert_eq!(payload.errors().len(), (10 - expected) as usize);
        assert!(header.last_processed_timestamp >= header.creation_timestamp);

        let backoff = messages[0].visible_after.unwrap() - header.last_processed_timestamp;
        if let Some(previous) = previous_backoff {
            assert!(backoff > previous);
        }
        previous_backoff = Some(backoff);
    }

    let err = harness.step().await.expect("a message is pending").unwrap_err();
    match err {
        HandlerError::DelayProcessing { task, errors, .. } => {
            assert_eq!(task, Task::PendingIndexTrigger);
            assert_eq!(errors.len(), 10);
            assert!(errors
                .iter()
                .all(|e| e.error_code() == Some(ErrorCode::IndexerAlreadyRunning)));
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(harness.queue.is_empty());
    assert_eq!(harness.indexer.run_count(INDEXER), 0);
}

#[tokio::test]
async fn test_triggered_run_is_followed_to_completion() {
    let harness = LoopbackHarness::new();
    harness.indexer.on_run(RunBehavior::StartRun);
    harness.submit(request()).await.unwrap();

    // Never run: trigger and hand off.
    harness.step().await.unwrap().unwrap();
    assert_eq!(harness.indexer.run_count(INDEXER), 1);
    assert_eq!(harness.queue.messages_on("pending_index_completion").len(), 1);

    // Run in progress: keep waiting.
    harness.step().await.unwrap().unwrap();
    let waiting = harness.queue.messages()[0].payload().unwrap();
    assert_eq!(waiting.kind(), Task::PendingIndexCompletion);
    assert_eq!(waiting.header().retries_remaining, 9);

    let (_, run_started) = harness.indexer.runs()[0].clone();
    harness
        .indexer
        .set_state(INDEXER, IndexerState::Success, Some(run_started));

    let outcome = harness.step().await.unwrap().unwrap();
    assert!(outcome.is_completed());
    assert!(harness.queue.is_empty());
    assert_eq!(harness.indexer.run_count(INDEXER), 1);
}

#[tokio::test]
async fn test_ignored_triggers_bounce_between_queues_until_exhausted() {
    let config = IndexRelayConfig::builder().initial_retry_budget(2).build();
    let harness = LoopbackHarness::with_config(config);
    harness.indexer.set_state(
        INDEXER,
        IndexerState::Success,
        Some(reference_time() - Duration::days(1)),
    );
    harness.submit(request()).await.unwrap();

    let mut visited = Vec::new();
    let mut results = Vec::new();
    while let Some(message) = harness.queue.messages().first().cloned() {
        visited.push(message.payload().unwrap().kind());
        results.push(harness.step().await.expect("a message is pending"));
        assert!(visited.len() <= 10, "loop did not settle");
    }

    assert_eq!(
        visited,
        vec![
            Task::PendingIndexTrigger,
            Task::PendingIndexCompletion,
            Task::PendingIndexTrigger,
            Task::PendingIndexCompletion,
            Task::PendingIndexTrigger,
            Task::PendingIndexCompletion,
        ]
    );
    assert!(results[..5].iter().all(|r| r.is_ok()));
    match results.pop() {
        Some(Err(HandlerError::DelayProcessing { task, errors, .. })) => {
            assert_eq!(task, Task::PendingIndexCompletion);
            assert_eq!(errors.len(), 2);
            assert!(errors
                .iter()
                .all(|e| e.error_code() == Some(ErrorCode::IndexerNotTriggered)));
        }
        other => panic!("expected terminal failure, got {:?}", other),
    }
    assert_eq!(harness.indexer.run_count(INDEXER), 3);
}

#[tokio::test]
async fn test_run_until_settled_stops_at_step_limit() {
    let harness = LoopbackHarness::new();
    harness.indexer.set_state(
        INDEXER,
        IndexerState::Running,
        Some(reference_time() - Duration::days(1)),
    );
    harness.submit(request()).await.unwrap();

    let results = harness.run_until_settled(3).await;

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(harness.queue.len(), 1);
}

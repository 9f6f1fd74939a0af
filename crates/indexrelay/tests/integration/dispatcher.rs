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

//! Routing of raw message bodies.

use indexrelay::{
    codec, CodecError, HandlerError, IndexRelayConfig, IndexerState, PendingIndexRequest, Task,
};
use indexrelay_testing::LoopbackHarness;

use crate::fixtures::{reference_time, single_message, trigger_payload, BLOB_URL, INDEXER};

const RAW_TRIGGER: &str = r#"{
    "header": {
        "creation_timestamp": "2024-03-01T10:00:00Z",
        "last_processed_timestamp": "2024-03-01T10:00:00Z",
        "retries_remaining": 10,
        "data_type": "contract",
        "task": "pending_index_trigger"
    },
    "body": {
        "indexer": "docs-indexer",
        "blob_storage_url": "https://acct.blob.core.windows.net/docs/contract-7.pdf",
        "id_field": 7,
        "id_name": "contract_id"
    },
    "errors": []
}"#;

#[tokio::test]
async fn test_dispatch_routes_raw_trigger() {
    let harness = LoopbackHarness::new();

    harness.dispatcher().dispatch(RAW_TRIGGER).await.unwrap();

    assert_eq!(harness.indexer.run_count(INDEXER), 1);
    let (message, payload) = single_message(&harness);
    assert_eq!(message.queue, "pending_index_completion");
    assert_eq!(payload.kind(), Task::PendingIndexCompletion);
    assert_eq!(payload.header().data_type.as_deref(), Some("contract"));
    assert!(message.body.contains("\"id_name\":\"contract_id\""));
    assert!(message.body.contains("\"indexer_start_time\""));
}

#[tokio::test]
async fn test_dispatch_routes_encoded_completion() {
    let harness = LoopbackHarness::new();
    let started = reference_time() + chrono::Duration::minutes(1);
    harness
        .indexer
        .set_state(INDEXER, IndexerState::Success, Some(started));
    let completion = trigger_payload(reference_time(), 3).into_completion(started);
    let raw = codec::encode(&completion.into()).unwrap();

    let outcome = harness.dispatcher().dispatch(&raw).await.unwrap();

    assert!(outcome.is_completed());
}

#[tokio::test]
async fn test_dispatch_rejects_invalid_json() {
    let harness = LoopbackHarness::new();

    let err = harness.dispatcher().dispatch("not json").await.unwrap_err();

    assert!(matches!(err, HandlerError::Codec(CodecError::Json(_))));
    assert!(err.is_terminal());
    assert!(harness.queue.is_empty());
    assert_eq!(harness.indexer.run_count(INDEXER), 0);
}

#[tokio::test]
async fn test_dispatch_rejects_completion_without_start_time() {
    let harness = LoopbackHarness::new();
    let raw = RAW_TRIGGER.replace("pending_index_trigger", "pending_index_completion");

    let err = harness.dispatcher().dispatch(&raw).await.unwrap_err();

    assert!(err.is_terminal());
    match err {
        HandlerError::Codec(CodecError::Body { task, .. }) => {
            assert_eq!(task, Task::PendingIndexCompletion)
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_submit_publishes_initial_trigger() {
    let config = IndexRelayConfig::builder()
        .trigger_queue("adi-trigger")
        .completion_queue("adi-completion")
        .initial_retry_budget(6)
        .build();
    let harness = LoopbackHarness::with_config(config);

    let sent = harness
        .submit(PendingIndexRequest::new(INDEXER, BLOB_URL).data_type("contract"))
        .await
        .unwrap();

    assert!(!sent.retry);
    let (message, payload) = single_message(&harness);
    assert_eq!(message.queue, "adi-trigger");
    assert_eq!(message.visible_after, None);
    assert_eq!(payload.kind(), Task::PendingIndexTrigger);
    assert_eq!(payload.header().retries_remaining, 6);
    assert_eq!(payload.blob_storage_url(), BLOB_URL);
    assert!(payload.errors().is_empty());
}

#[tokio::test]
async fn test_configured_queue_names_are_used_for_hand_off() {
    let config = IndexRelayConfig::builder()
        .trigger_queue("adi-trigger")
        .completion_queue("adi-completion")
        .build();
    let harness = LoopbackHarness::with_config(config);

    harness.dispatcher().dispatch(RAW_TRIGGER).await.unwrap();

    assert_eq!(harness.queue.messages_on("adi-completion").len(), 1);
    assert!(harness.queue.messages_on("pending_index_completion").is_empty());
}

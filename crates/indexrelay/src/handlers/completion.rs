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

//! Handler for `pending_index_completion` messages.
//!
//! Waits for the indexer run started on behalf of the request to finish.
//! Staleness is measured against the header's `creation_timestamp`, i.e. the
//! original request, not the moment of the hand-off.

use chrono::Utc;
use tracing::{error, info, warn};

use super::{forward, HandlerOutcome};
use crate::error::HandlerError;
use crate::indexer::{IndexerState, IndexerStatus, IndexerStatusProbe};
use crate::models::{CompletionPayload, ErrorCode, Header, Task};
use crate::queue::{MessageQueueClient, OutgoingMessage};
use crate::retry::RetryPolicy;

/// What the completion handler does with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionDecision {
    /// A run that started after the request finished successfully.
    Done,
    /// The last run failed hard; start it again and keep waiting.
    RetriggerAndWait,
    /// A run is still going; check again later.
    KeepWaiting,
    /// The last successful run predates the request, so the trigger never
    /// took effect. Go back to the trigger queue.
    EscalateToTrigger,
    /// The budget is spent.
    Exhausted,
}

/// Decides how to handle a completion message.
pub fn decide(header: &Header, status: &IndexerStatus) -> CompletionDecision {
    match status.state {
        IndexerState::Success if status.started_after(header.creation_timestamp) => {
            CompletionDecision::Done
        }
        _ if !header.has_retries() => CompletionDecision::Exhausted,
        IndexerState::Retrigger => CompletionDecision::RetriggerAndWait,
        IndexerState::Running => CompletionDecision::KeepWaiting,
        IndexerState::Success => CompletionDecision::EscalateToTrigger,
    }
}

/// Handles messages from the completion queue.
#[derive(Clone)]
pub struct PendingIndexCompletionHandler {
    probe: IndexerStatusProbe,
    queue: MessageQueueClient,
    policy: RetryPolicy,
}

impl PendingIndexCompletionHandler {
    pub fn new(probe: IndexerStatusProbe, queue: MessageQueueClient) -> Self {
        let policy = queue.config().retry_policy();
        Self {
            probe,
            queue,
            policy,
        }
    }

    /// Handles one completion message.
    ///
    /// Returns [`HandlerOutcome::Completed`] once a fresh successful run is
    /// observed.
    ///
    /// # Errors
    ///
    /// - [`HandlerError::DelayProcessing`] when the run has not completed and
    ///   the budget is spent. Nothing is published.
    /// - [`HandlerError::Publish`] when the re-queued message could not be
    ///   published.
    pub async fn handle(
        &self,
        mut payload: CompletionPayload,
    ) -> Result<HandlerOutcome, HandlerError> {
        let indexer = payload.body.indexer.clone();
        let status = self.probe.get_status(&indexer).await;
        let decision = decide(&payload.header, &status);
        let remaining = payload.header.retries_remaining;

        info!(
            indexer = %indexer,
            state = %status.state,
            decision = ?decision,
            retries_remaining = remaining,
            "Handling pending index completion"
        );

        let enqueue_time = self.policy.scheduled_time(remaining, Utc::now());
        let message = match decision {
            CompletionDecision::Done => {
                info!(
                    indexer = %indexer,
                    blob_storage_url = %payload.body.blob_storage_url,
                    errors = payload.errors.len(),
                    "Indexer run covering the request completed"
                );
                return Ok(HandlerOutcome::Completed { indexer });
            }
            CompletionDecision::RetriggerAndWait => {
                warn!(indexer = %indexer, "Indexer run failed; retriggering");
                payload.push_error(
                    ErrorCode::IndexerNotCompleted,
                    format!("Indexer '{}' run failed; retriggered", indexer),
                );
                if let Err(e) = self.probe.trigger(&indexer).await {
                    payload.push_error(
                        ErrorCode::IndexerNotTriggered,
                        format!("Failed to restart indexer '{}': {}", indexer, e),
                    );
                }
                OutgoingMessage::retry_at(payload.into(), enqueue_time)
            }
            CompletionDecision::KeepWaiting => {
                payload.push_error(
                    ErrorCode::IndexerNotCompleted,
                    format!("Indexer '{}' is still running", indexer),
                );
                OutgoingMessage::retry_at(payload.into(), enqueue_time)
            }
            CompletionDecision::EscalateToTrigger => {
                warn!(
                    indexer = %indexer,
                    "Last successful run predates the request; returning to trigger queue"
                );
                payload.push_error(
                    ErrorCode::IndexerNotTriggered,
                    format!(
                        "Indexer '{}' has not run since the request was created",
                        indexer
                    ),
                );
                OutgoingMessage::retry_at(
                    payload.into_trigger().into(),
                    enqueue_time,
                )
            }
            CompletionDecision::Exhausted => {
                error!(
                    indexer = %indexer,
                    state = %status.state,
                    errors = payload.errors.len(),
                    "Maximum retries exceeded waiting for indexer completion"
                );
                return Err(HandlerError::DelayProcessing {
                    indexer,
                    task: Task::PendingIndexCompletion,
                    errors: payload.errors,
                });
            }
        };

        forward(&self.queue, vec![message]).await
    }
}

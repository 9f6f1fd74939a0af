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

//! Handler for `pending_index_trigger` messages.
//!
//! Makes sure an indexer run covering the request has been started, then
//! hands the request to the completion queue. The request time is the
//! header's `last_processed_timestamp`: a run counts as covering the request
//! only if it started after the message was last sent.

use chrono::Utc;
use tracing::{error, info, warn};

use super::{forward, HandlerOutcome};
use crate::error::HandlerError;
use crate::indexer::{IndexerState, IndexerStatus, IndexerStatusProbe};
use crate::models::{ErrorCode, Header, Task, TriggerPayload};
use crate::queue::{MessageQueueClient, OutgoingMessage};
use crate::retry::RetryPolicy;

/// What the trigger handler does with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerDecision {
    /// A successful run started after the request; wait for nothing more
    /// than its confirmation.
    HandOffFresh,
    /// Start the indexer, then hand off. `record_failure` is set when the
    /// last run failed hard.
    TriggerAndHandOff { record_failure: bool },
    /// A run that started after the request is already in flight.
    HandOffInFlight,
    /// An older run is still in flight; try again later.
    RequeueTrigger,
    /// The budget is spent.
    Exhausted,
}

/// Decides how to handle a trigger message. First matching rule wins.
pub fn decide(header: &Header, status: &IndexerStatus) -> TriggerDecision {
    let fresh = status.started_after(header.last_processed_timestamp);

    match status.state {
        IndexerState::Success if fresh => TriggerDecision::HandOffFresh,
        IndexerState::Retrigger => TriggerDecision::TriggerAndHandOff {
            record_failure: true,
        },
        IndexerState::Success => TriggerDecision::TriggerAndHandOff {
            record_failure: false,
        },
        IndexerState::Running if fresh => TriggerDecision::HandOffInFlight,
        IndexerState::Running if header.has_retries() => TriggerDecision::RequeueTrigger,
        IndexerState::Running => TriggerDecision::Exhausted,
    }
}

/// Handles messages from the trigger queue.
#[derive(Clone)]
pub struct PendingIndexTriggerHandler {
    probe: IndexerStatusProbe,
    queue: MessageQueueClient,
    policy: RetryPolicy,
}

impl PendingIndexTriggerHandler {
    pub fn new(probe: IndexerStatusProbe, queue: MessageQueueClient) -> Self {
        let policy = queue.config().retry_policy();
        Self {
            probe,
            queue,
            policy,
        }
    }

    /// Handles one trigger message.
    ///
    /// # Errors
    ///
    /// - [`HandlerError::DelayProcessing`] when an older run is still in
    ///   flight and the budget is spent. Nothing is published.
    /// - [`HandlerError::Publish`] when the follow-up message could not be
    ///   published.
    pub async fn handle(&self, mut payload: TriggerPayload) -> Result<HandlerOutcome, HandlerError> {
        let indexer = payload.body.indexer.clone();
        let status = self.probe.get_status(&indexer).await;
        let decision = decide(&payload.header, &status);

        info!(
            indexer = %indexer,
            state = %status.state,
            decision = ?decision,
            retries_remaining = payload.header.retries_remaining,
            "Handling pending index trigger"
        );

        let message = match decision {
            TriggerDecision::HandOffFresh | TriggerDecision::HandOffInFlight => {
                let started = status.last_start_time.unwrap_or_else(Utc::now);
                OutgoingMessage::immediate(payload.into_completion(started).into())
            }
            TriggerDecision::TriggerAndHandOff { record_failure } => {
                if record_failure {
                    warn!(indexer = %indexer, "Indexer last run failed; retriggering");
                    payload.push_error(
                        ErrorCode::IndexerNotCompleted,
                        format!("Indexer '{}' last run did not complete; retriggered", indexer),
                    );
                }
                let triggered_at = Utc::now();
                let started = match self.probe.trigger(&indexer).await {
                    Ok(()) => triggered_at,
                    Err(e) => {
                        payload.push_error(
                            ErrorCode::IndexerNotTriggered,
                            format!("Failed to start indexer '{}': {}", indexer, e),
                        );
                        // No run was started; record the last known one.
                        status
                            .last_start_time
                            .unwrap_or(payload.header.creation_timestamp)
                    }
                };
                OutgoingMessage::immediate(payload.into_completion(started).into())
            }
            TriggerDecision::RequeueTrigger => {
                let remaining = payload.header.retries_remaining;
                warn!(
                    indexer = %indexer,
                    retries_remaining = remaining,
                    start_time = ?status.last_start_time,
                    "Indexer busy with an older run; re-queueing trigger"
                );
                let message = match status.last_start_time {
                    Some(_) => format!(
                        "Indexer '{}' was already running a run that predates the request",
                        indexer
                    ),
                    None => format!(
                        "Indexer '{}' reported as running with an unknown start time; \
                         status could not be confirmed",
                        indexer
                    ),
                };
                payload.push_error(ErrorCode::IndexerAlreadyRunning, message);
                let enqueue_time = self.policy.scheduled_time(remaining, Utc::now());
                OutgoingMessage::retry_at(payload.into(), enqueue_time)
            }
            TriggerDecision::Exhausted => {
                error!(
                    indexer = %indexer,
                    errors = payload.errors.len(),
                    "Maximum retries exceeded waiting to trigger indexer"
                );
                return Err(HandlerError::DelayProcessing {
                    indexer,
                    task: Task::PendingIndexTrigger,
                    errors: payload.errors,
                });
            }
        };

        forward(&self.queue, vec![message]).await
    }
}

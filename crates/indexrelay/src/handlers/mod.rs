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

//! Pending-index message handlers.
//!
//! The two handlers form a closed loop driven by scheduled delivery:
//!
//! ```text
//!            re-queue (backoff)                  re-queue (backoff)
//!              ┌──────────┐                        ┌──────────┐
//!              ▼          │      hand-off          ▼          │
//!   ──▶  pending_index_trigger  ─────────▶  pending_index_completion ──▶ done
//!                    ▲                                 │
//!                    └──────── stale success ──────────┘
//! ```
//!
//! Each handler splits into a pure `decide` function, which maps the header
//! and probed [`IndexerStatus`](crate::indexer::IndexerStatus) to a decision,
//! and an async `handle` method that carries the decision out. A handler
//! invocation either publishes its follow-up messages, finishes cleanly, or
//! fails; it never does more than one of these.

pub mod completion;
pub mod trigger;

pub use completion::{CompletionDecision, PendingIndexCompletionHandler};
pub use trigger::{PendingIndexTriggerHandler, TriggerDecision};

use crate::error::HandlerError;
use crate::queue::{MessageQueueClient, OutgoingMessage};

/// Successful result of a handler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// Follow-up messages were published
    Forwarded(Vec<OutgoingMessage>),
    /// The indexer finished a run covering the request; nothing was queued
    Completed { indexer: String },
}

impl HandlerOutcome {
    /// Messages published by the invocation.
    pub fn messages(&self) -> &[OutgoingMessage] {
        match self {
            HandlerOutcome::Forwarded(messages) => messages,
            HandlerOutcome::Completed { .. } => &[],
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, HandlerOutcome::Completed { .. })
    }
}

/// Publishes a handler's follow-up messages as one batch.
async fn forward(
    queue: &MessageQueueClient,
    messages: Vec<OutgoingMessage>,
) -> Result<HandlerOutcome, HandlerError> {
    let sent = queue.send_batch(messages).await?;
    Ok(HandlerOutcome::Forwarded(sent))
}

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

//! Entry point for queue-triggered invocations.
//!
//! The queue runtime hands [`PendingIndexDispatcher::dispatch`] the raw body
//! of each delivered message. The dispatcher decodes it and routes it to the
//! handler matching `header.task`.
//!
//! # Acknowledgement
//!
//! ```rust,ignore
//! match dispatcher.dispatch(&body).await {
//!     Ok(_) => receiver.complete(message).await?,
//!     Err(e) if e.is_terminal() => receiver.dead_letter(message, &e.to_string()).await?,
//!     Err(_) => receiver.abandon(message).await?, // redelivered later
//! }
//! ```

use std::sync::Arc;
use tracing::{debug, error};

use crate::codec;
use crate::config::IndexRelayConfig;
use crate::error::HandlerError;
use crate::handlers::{HandlerOutcome, PendingIndexCompletionHandler, PendingIndexTriggerHandler};
use crate::indexer::{IndexerStatusProbe, IndexerStatusService};
use crate::models::Payload;
use crate::queue::{MessageQueueClient, QueuePublisher};

/// Routes pending-index messages to their handlers.
#[derive(Clone)]
pub struct PendingIndexDispatcher {
    queue: MessageQueueClient,
    trigger: PendingIndexTriggerHandler,
    completion: PendingIndexCompletionHandler,
}

impl PendingIndexDispatcher {
    /// Wires both handlers to the given services.
    pub fn new(
        indexers: Arc<dyn IndexerStatusService>,
        publisher: Arc<dyn QueuePublisher>,
        config: IndexRelayConfig,
    ) -> Self {
        let probe = IndexerStatusProbe::new(indexers);
        let queue = MessageQueueClient::new(publisher, config);
        Self {
            trigger: PendingIndexTriggerHandler::new(probe.clone(), queue.clone()),
            completion: PendingIndexCompletionHandler::new(probe, queue.clone()),
            queue,
        }
    }

    /// The queue client shared by both handlers.
    pub fn queue(&self) -> &MessageQueueClient {
        &self.queue
    }

    /// Decodes and handles one raw message body.
    pub async fn dispatch(&self, raw: &str) -> Result<HandlerOutcome, HandlerError> {
        let payload = codec::decode(raw).map_err(|e| {
            error!(error = %e, "Rejecting undecodable message");
            HandlerError::from(e)
        })?;
        self.handle(payload).await
    }

    /// Handles an already decoded payload.
    pub async fn handle(&self, payload: Payload) -> Result<HandlerOutcome, HandlerError> {
        debug!(
            task = %payload.kind(),
            indexer = payload.indexer(),
            "Dispatching pending index message"
        );
        match payload {
            Payload::Trigger(p) => self.trigger.handle(p).await,
            Payload::Completion(p) => self.completion.handle(p).await,
        }
    }
}

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

//! Loopback harness that feeds published messages back into the dispatcher.

use indexrelay::{
    HandlerError, HandlerOutcome, IndexRelayConfig, OutgoingMessage, PendingIndexDispatcher,
    PendingIndexRequest, QueueError,
};
use std::sync::Arc;

use crate::indexer::ScriptedIndexer;
use crate::queue::InMemoryQueue;

/// A dispatcher wired to an [`InMemoryQueue`] and a [`ScriptedIndexer`].
///
/// Delayed delivery is not simulated: [`LoopbackHarness::step`] delivers the
/// oldest message regardless of its `visible_after`.
pub struct LoopbackHarness {
    pub queue: Arc<InMemoryQueue>,
    pub indexer: Arc<ScriptedIndexer>,
    dispatcher: PendingIndexDispatcher,
}

impl Default for LoopbackHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackHarness {
    pub fn new() -> Self {
        Self::with_config(IndexRelayConfig::default())
    }

    pub fn with_config(config: IndexRelayConfig) -> Self {
        let queue = Arc::new(InMemoryQueue::new());
        let indexer = Arc::new(ScriptedIndexer::new());
        let dispatcher = PendingIndexDispatcher::new(indexer.clone(), queue.clone(), config);
        Self {
            queue,
            indexer,
            dispatcher,
        }
    }

    pub fn dispatcher(&self) -> &PendingIndexDispatcher {
        &self.dispatcher
    }

    /// Publishes the initial trigger message for `request`.
    pub async fn submit(&self, request: PendingIndexRequest) -> Result<OutgoingMessage, QueueError> {
        request.submit(self.dispatcher.queue()).await
    }

    /// Delivers the oldest pending message. Returns `None` when the queue is
    /// empty.
    pub async fn step(&self) -> Option<Result<HandlerOutcome, HandlerError>> {
        let message = self.queue.pop()?;
        Some(self.dispatcher.dispatch(&message.body).await)
    }

    /// Delivers messages until the queue is empty or `max_steps` deliveries
    /// have been made.
    pub async fn run_until_settled(
        &self,
        max_steps: usize,
    ) -> Vec<Result<HandlerOutcome, HandlerError>> {
        let mut results = Vec::new();
        while results.len() < max_steps {
            match self.step().await {
                Some(result) => results.push(result),
                None => break,
            }
        }
        results
    }
}

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

//! In-memory [`QueuePublisher`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexrelay::{codec, CodecError, Payload, QueueError, QueuePublisher};
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};

/// A message captured by [`InMemoryQueue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub queue: String,
    pub body: String,
    pub visible_after: Option<DateTime<Utc>>,
}

impl PublishedMessage {
    /// Decodes the captured body.
    pub fn payload(&self) -> Result<Payload, CodecError> {
        codec::decode(&self.body)
    }
}

/// Records every publish in FIFO order.
///
/// Queues can be marked as failing to exercise publish error paths.
#[derive(Debug, Default)]
pub struct InMemoryQueue {
    messages: Mutex<VecDeque<PublishedMessage>>,
    failing: Mutex<HashSet<String>>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every publish to `queue` fail until [`InMemoryQueue::recover`].
    pub fn fail_queue(&self, queue: impl Into<String>) {
        self.failing.lock().insert(queue.into());
    }

    pub fn recover(&self, queue: &str) {
        self.failing.lock().remove(queue);
    }

    /// Snapshot of all pending messages, oldest first.
    pub fn messages(&self) -> Vec<PublishedMessage> {
        self.messages.lock().iter().cloned().collect()
    }

    /// Pending messages published to `queue`.
    pub fn messages_on(&self, queue: &str) -> Vec<PublishedMessage> {
        self.messages
            .lock()
            .iter()
            .filter(|m| m.queue == queue)
            .cloned()
            .collect()
    }

    /// Removes and returns the oldest message, ignoring `visible_after`.
    pub fn pop(&self) -> Option<PublishedMessage> {
        self.messages.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }

    pub fn clear(&self) {
        self.messages.lock().clear();
    }
}

#[async_trait]
impl QueuePublisher for InMemoryQueue {
    async fn publish(
        &self,
        queue: &str,
        body: String,
        visible_after: Option<DateTime<Utc>>,
    ) -> Result<(), QueueError> {
        if self.failing.lock().contains(queue) {
            return Err(QueueError::Publish {
                queue: queue.to_string(),
                message: "queue marked as failing".to_string(),
            });
        }
        tracing::debug!(queue, ?visible_after, "In-memory publish");
        self.messages.lock().push_back(PublishedMessage {
            queue: queue.to_string(),
            body,
            visible_after,
        });
        Ok(())
    }
}

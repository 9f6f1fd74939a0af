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

//! Publishing payloads to the pending-index queues.
//!
//! [`QueuePublisher`] abstracts the managed message queue. It must honour
//! `visible_after` as delayed delivery: consumers never see the message
//! before that instant.
//!
//! [`MessageQueueClient`] owns the header bookkeeping so that it happens in
//! exactly one place: every send stamps `last_processed_timestamp`, sets the
//! task tag, and spends one retry when the send is a re-queue.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::codec;
use crate::config::IndexRelayConfig;
use crate::error::QueueError;
use crate::models::{Payload, Task};

/// A message queue with delayed-visibility delivery.
#[async_trait]
pub trait QueuePublisher: Send + Sync {
    async fn publish(
        &self,
        queue: &str,
        body: String,
        visible_after: Option<DateTime<Utc>>,
    ) -> Result<(), QueueError>;
}

/// A payload together with how it should be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub task: Task,
    pub payload: Payload,
    /// Delivery is delayed until this instant when set
    pub enqueue_time: Option<DateTime<Utc>>,
    /// Whether sending spends one retry
    pub retry: bool,
}

impl OutgoingMessage {
    /// A hand-off delivered right away without touching the budget.
    pub fn immediate(payload: Payload) -> Self {
        Self {
            task: payload.kind(),
            payload,
            enqueue_time: None,
            retry: false,
        }
    }

    /// A re-queue that spends one retry and becomes visible at `enqueue_time`.
    pub fn retry_at(payload: Payload, enqueue_time: DateTime<Utc>) -> Self {
        Self {
            task: payload.kind(),
            payload,
            enqueue_time: Some(enqueue_time),
            retry: true,
        }
    }
}

/// Sends payloads to the queue configured for their task.
#[derive(Clone)]
pub struct MessageQueueClient {
    publisher: Arc<dyn QueuePublisher>,
    config: Arc<IndexRelayConfig>,
}

impl MessageQueueClient {
    pub fn new(publisher: Arc<dyn QueuePublisher>, config: IndexRelayConfig) -> Self {
        Self {
            publisher,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &IndexRelayConfig {
        &self.config
    }

    /// Sends `payload` to the queue for `task`.
    ///
    /// Updates the header before encoding: `last_processed_timestamp` is set
    /// to now, `task` to the destination, and when `retry` is set one retry
    /// is spent. A retry send with an empty budget is refused without
    /// touching the payload; the caller is expected to have checked first.
    pub async fn send(
        &self,
        task: Task,
        payload: &mut Payload,
        enqueue_time: Option<DateTime<Utc>>,
        retry: bool,
    ) -> Result<(), QueueError> {
        if payload.kind() != task {
            return Err(QueueError::TaskMismatch {
                task,
                payload: payload.kind(),
            });
        }

        let header = payload.header_mut();
        if retry && !header.has_retries() {
            return Err(QueueError::RetryBudgetExhausted { task });
        }
        header.stamp(task, Utc::now());
        if retry {
            header.consume_retry();
        }
        let retries_remaining = header.retries_remaining;

        let body = codec::encode(payload)?;
        let queue = self.config.queue_for(task);

        debug!(
            queue,
            %task,
            retries_remaining,
            enqueue_time = ?enqueue_time,
            "Publishing message"
        );

        self.publisher.publish(queue, body, enqueue_time).await?;

        info!(
            queue,
            indexer = payload.indexer(),
            retries_remaining,
            enqueue_time = ?enqueue_time,
            "Message published"
        );
        Ok(())
    }

    /// Sends a prepared message, returning it with its updated payload.
    pub async fn deliver(&self, mut message: OutgoingMessage) -> Result<OutgoingMessage, QueueError> {
        self.send(
            message.task,
            &mut message.payload,
            message.enqueue_time,
            message.retry,
        )
        .await?;
        Ok(message)
    }

    /// Sends every message concurrently and waits for all of them.
    ///
    /// Ordering between the messages is not defined. If any send fails the
    /// whole batch is reported as failed with the first error, after every
    /// other send has finished.
    pub async fn send_batch(
        &self,
        messages: Vec<OutgoingMessage>,
    ) -> Result<Vec<OutgoingMessage>, QueueError> {
        let total = messages.len();
        let results =
            futures::future::join_all(messages.into_iter().map(|m| self.deliver(m))).await;

        let mut sent = Vec::with_capacity(total);
        let mut first_error = None;
        let mut failed = 0usize;

        for result in results {
            match result {
                Ok(message) => sent.push(message),
                Err(e) => {
                    failed += 1;
                    error!(error = %e, "Failed to publish message");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => {
                error!(failed, total, "Message batch partially failed");
                Err(e)
            }
            None => Ok(sent),
        }
    }
}

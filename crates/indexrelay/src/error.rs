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

//! Error types for indexrelay.
//!
//! Errors are split by the collaborator that produced them:
//!
//! - [`IndexerError`] - the external search-indexer control API
//! - [`QueueError`] - publishing to the message queue
//! - [`CodecError`] - decoding and encoding the wire envelope
//! - [`ConfigError`] - loading [`IndexRelayConfig`](crate::IndexRelayConfig)
//! - [`HandlerError`] - the outcome of a failed handler invocation
//!
//! [`HandlerError::DelayProcessing`] and [`HandlerError::Codec`] are terminal:
//! the message goes to the dead-letter queue. A publish failure means "do not
//! acknowledge this message" so the queue runtime redelivers it.

use thiserror::Error;

use crate::models::{PayloadError, Task};

/// Errors reported by an [`IndexerStatusService`](crate::indexer::IndexerStatusService).
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("Indexer not found: {0}")]
    NotFound(String),

    #[error("Indexer service request failed: {0}")]
    Service(String),
}

/// Errors that can occur while publishing a payload.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Failed to publish to queue '{queue}': {message}")]
    Publish { queue: String, message: String },

    #[error("Retry budget exhausted for {task} message; refusing to re-queue")]
    RetryBudgetExhausted { task: Task },

    #[error("Payload of kind {payload} cannot be sent as {task}")]
    TaskMismatch { task: Task, payload: Task },

    #[error("Failed to encode payload: {0}")]
    Encode(#[from] CodecError),
}

/// Errors that can occur while converting between payloads and wire JSON.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Invalid message JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Message body does not match task '{task}': {source}")]
    Body {
        task: Task,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Errors returned by the pending-index handlers.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The retry budget is spent and no rule can make progress. The message
    /// must be dead-lettered; `errors` carries the accumulated trail.
    #[error("Maximum retries exceeded for indexer '{indexer}' while handling {task}")]
    DelayProcessing {
        indexer: String,
        task: Task,
        errors: Vec<PayloadError>,
    },

    #[error("Failed to publish follow-up message: {0}")]
    Publish(#[from] QueueError),

    #[error("Failed to decode message: {0}")]
    Codec(#[from] CodecError),
}

impl HandlerError {
    /// Returns true when redelivering the message cannot succeed and it
    /// should be dead-lettered: the retry budget is spent, or the body does
    /// not decode.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            HandlerError::DelayProcessing { .. } | HandlerError::Codec(_)
        )
    }
}
